use memory::Value;
use vm::{RuntimeError, MULTRET, VM};

fn num(n: f64) -> Value {
    Value::number(n)
}

/// Returns (a + b, a * b).
fn sum_and_product(vm: &mut VM) -> Result<usize, RuntimeError> {
    let a = vm.check_number(1)?;
    let b = vm.check_number(2)?;
    vm.push(Value::number(a + b))?;
    vm.push(Value::number(a * b))?;
    Ok(2)
}

/// Returns its first upvalue.
fn get_upvalue(vm: &mut VM) -> Result<usize, RuntimeError> {
    let v = vm.upvalue(1);
    vm.push(v)?;
    Ok(1)
}

fn failing(vm: &mut VM) -> Result<usize, RuntimeError> {
    vm.push(Value::bool(true))?;
    Err(vm.raise("exploded"))
}

/// Calls its first argument with no arguments.
fn call_first(vm: &mut VM) -> Result<usize, RuntimeError> {
    let f = vm.value_at(1);
    vm.push(f)?;
    vm.call(0, MULTRET)?;
    Ok(vm.top() - 1)
}

#[test]
fn test_push_pop_and_indices() {
    let mut vm = VM::new();
    for i in 1..=3 {
        vm.push(num(i as f64)).unwrap();
    }
    assert_eq!(vm.top(), 3);
    assert_eq!(vm.value_at(1), num(1.0));
    assert_eq!(vm.value_at(-1), num(3.0));
    assert_eq!(vm.value_at(-3), num(1.0));
    assert!(vm.value_at(4).is_nil());
    assert!(vm.value_at(-4).is_nil());
    assert_eq!(vm.abs_index(0), Err(RuntimeError::InvalidIndex(0)));

    assert_eq!(vm.pop().unwrap(), num(3.0));
    assert_eq!(vm.top(), 2);
}

#[test]
fn test_pop_empty_underflows() {
    let mut vm = VM::new();
    assert_eq!(vm.pop(), Err(RuntimeError::StackUnderflow));
}

#[test]
fn test_remove_insert_replace() {
    let mut vm = VM::new();
    for i in 1..=4 {
        vm.push(num(i as f64)).unwrap();
    }
    // [1 2 3 4] -> remove 2 -> [1 3 4]
    assert_eq!(vm.remove(2).unwrap(), num(2.0));
    assert_eq!(vm.top(), 3);
    assert_eq!(vm.value_at(2), num(3.0));

    // push 9, insert at 1 -> [9 1 3 4]
    vm.push(num(9.0)).unwrap();
    vm.insert(1).unwrap();
    assert_eq!(vm.value_at(1), num(9.0));
    assert_eq!(vm.value_at(2), num(1.0));
    assert_eq!(vm.value_at(-1), num(4.0));

    // push 7, replace -3 -> [9 1 7 4]
    vm.push(num(7.0)).unwrap();
    vm.replace(-3).unwrap();
    assert_eq!(vm.value_at(3), num(7.0));
    assert_eq!(vm.top(), 4);
}

#[test]
fn test_set_top() {
    let mut vm = VM::new();
    vm.push(num(1.0)).unwrap();
    vm.set_top(3).unwrap();
    assert_eq!(vm.top(), 3);
    assert!(vm.value_at(3).is_nil());
    vm.set_top(-2).unwrap();
    assert_eq!(vm.top(), 2);
    vm.set_top(-1).unwrap();
    assert_eq!(vm.top(), 2);
    vm.set_top(0).unwrap();
    assert_eq!(vm.top(), 0);
    assert_eq!(vm.set_top(-2), Err(RuntimeError::InvalidIndex(-2)));
}

#[test]
fn test_call_adjusts_results() {
    let mut vm = VM::new();
    let f = vm.new_native("sum_and_product", sum_and_product, Vec::new());

    vm.push(f).unwrap();
    vm.push(num(3.0)).unwrap();
    vm.push(num(4.0)).unwrap();
    vm.call(2, MULTRET).unwrap();
    assert_eq!(vm.top(), 2);
    assert_eq!(vm.value_at(1), num(7.0));
    assert_eq!(vm.value_at(2), num(12.0));

    vm.set_top(0).unwrap();
    vm.push(f).unwrap();
    vm.push(num(3.0)).unwrap();
    vm.push(num(4.0)).unwrap();
    vm.call(2, 1).unwrap();
    assert_eq!(vm.top(), 1);
    assert_eq!(vm.value_at(1), num(7.0));

    vm.set_top(0).unwrap();
    vm.push(f).unwrap();
    vm.push(num(1.0)).unwrap();
    vm.push(num(1.0)).unwrap();
    vm.call(2, 4).unwrap();
    assert_eq!(vm.top(), 4);
    assert!(vm.value_at(3).is_nil());
    assert!(vm.value_at(4).is_nil());
}

#[test]
fn test_call_bad_argument() {
    let mut vm = VM::new();
    let f = vm.new_native("sum_and_product", sum_and_product, Vec::new());
    let t = vm.new_table(0);
    vm.push(f).unwrap();
    vm.push(t).unwrap();
    let err = vm.call(1, 1).unwrap_err();
    assert_eq!(
        err.to_string(),
        "bad argument #1 to 'sum_and_product' (number expected, got table)"
    );
    assert_eq!(vm.top(), 0);
}

#[test]
fn test_call_non_function() {
    let mut vm = VM::new();
    vm.push(num(1.0)).unwrap();
    assert_eq!(vm.call(0, 0), Err(RuntimeError::NotCallable("number")));
}

#[test]
fn test_nested_calls_use_their_own_frames() {
    let mut vm = VM::new();
    let inner = vm.new_native("get_upvalue", get_upvalue, vec![num(42.0)]);
    let outer = vm.new_native("call_first", call_first, Vec::new());
    vm.push(num(-1.0)).unwrap();
    vm.push(outer).unwrap();
    vm.push(inner).unwrap();
    vm.call(1, MULTRET).unwrap();
    assert_eq!(vm.top(), 2);
    assert_eq!(vm.value_at(1), num(-1.0));
    assert_eq!(vm.value_at(2), num(42.0));
    // outside any native there is no upvalue
    assert!(vm.upvalue(1).is_nil());
}

#[test]
fn test_pcall_unwinds_and_pushes_message() {
    let mut vm = VM::new();
    let f = vm.new_native("failing", failing, Vec::new());
    vm.push(num(5.0)).unwrap();
    vm.push(f).unwrap();
    vm.push(num(1.0)).unwrap();
    let err = vm.pcall(1, 1).unwrap_err();
    assert_eq!(err, RuntimeError::Custom("failing: exploded".into()));
    assert_eq!(vm.top(), 2);
    assert_eq!(vm.value_at(1), num(5.0));
    let msg = vm.value_at(2);
    assert_eq!(vm.str_of(msg), Some("failing: exploded"));
    assert_eq!(vm.frames.len(), 1);
}

#[test]
fn test_raise_outside_native_is_unprefixed() {
    let vm = VM::new();
    assert_eq!(vm.raise("plain"), RuntimeError::Custom("plain".into()));
}

#[test]
fn test_stack_overflow() {
    let mut vm = VM::new();
    vm.set_top(vm::STACK_MAX as i32).unwrap();
    assert_eq!(vm.push(Value::nil()), Err(RuntimeError::StackOverflow));
    vm.reset();
    assert_eq!(vm.top(), 0);
}

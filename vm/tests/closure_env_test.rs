use memory::Value;
use vm::{RuntimeError, VM};

/// Builds a chain of `depth + 1` environments on the stack, root first.
fn build_chain(vm: &mut VM, depth: usize) {
    vm.push(Value::nil()).unwrap();
    vm.new_closure_env(-1).unwrap();
    vm.remove(-2).unwrap();
    for _ in 0..depth {
        vm.new_closure_env(-1).unwrap();
    }
}

#[test]
fn test_root_env_has_nil_parent() {
    let mut vm = VM::new();
    build_chain(&mut vm, 0);
    let env = vm.value_at(-1);
    assert!(env.is_env());
    vm.push_captured(-1, 0, 0).unwrap();
    assert!(vm.value_at(-1).is_nil());
}

#[test]
fn test_capture_visible_through_child() {
    let mut vm = VM::new();
    build_chain(&mut vm, 1);
    // root is at 1, child at 2
    vm.push(Value::number(10.0)).unwrap();
    vm.store_captured(1, 0, 1).unwrap();

    vm.push_captured(2, 1, 1).unwrap();
    assert_eq!(vm.value_at(-1), Value::number(10.0));
    vm.pop().unwrap();

    // a write through the child lands in the root
    vm.push(Value::number(11.0)).unwrap();
    vm.store_captured(2, 1, 1).unwrap();
    vm.push_captured(1, 0, 1).unwrap();
    assert_eq!(vm.value_at(-1), Value::number(11.0));
}

#[test]
fn test_sibling_closures_share_parent() {
    let mut vm = VM::new();
    build_chain(&mut vm, 0);
    vm.new_closure_env(1).unwrap(); // sibling a at 2
    vm.new_closure_env(1).unwrap(); // sibling b at 3

    vm.push(Value::bool(true)).unwrap();
    vm.store_captured(2, 1, 3).unwrap();
    vm.push_captured(3, 1, 3).unwrap();
    assert_eq!(vm.value_at(-1), Value::bool(true));
    // siblings keep private slots
    vm.push(Value::number(1.0)).unwrap();
    vm.store_captured(2, 0, 1).unwrap();
    vm.push_captured(3, 0, 1).unwrap();
    assert!(vm.value_at(-1).is_nil());
}

#[test]
fn test_store_resolves_index_before_pop() {
    let mut vm = VM::new();
    build_chain(&mut vm, 0);
    vm.push(Value::number(5.0)).unwrap();
    // -2 is the env while the value is still on the stack
    vm.store_captured(-2, 0, 1).unwrap();
    assert_eq!(vm.top(), 1);
    vm.push_captured(-1, 0, 1).unwrap();
    assert_eq!(vm.value_at(-1), Value::number(5.0));
}

#[test]
fn test_non_env_rejected() {
    let mut vm = VM::new();
    vm.push(Value::number(1.0)).unwrap();
    assert!(matches!(
        vm.new_closure_env(-1),
        Err(RuntimeError::TypeMismatch(_))
    ));
    assert!(matches!(
        vm.push_captured(-1, 0, 1),
        Err(RuntimeError::TypeMismatch(_))
    ));
}

#[test]
fn test_env_reachable_from_native_upvalue_survives_gc() {
    use vm::GarbageCollector;

    let mut vm = VM::new();
    build_chain(&mut vm, 1);
    let inner = vm.value_at(-1);
    let root = vm.value_at(1);
    vm.push(Value::number(3.0)).unwrap();
    vm.store_captured(1, 0, 1).unwrap();

    fn noop(_: &mut VM) -> Result<usize, RuntimeError> {
        Ok(0)
    }
    vm.new_native("closure", noop, vec![inner]);
    vm.set_top(0).unwrap();
    vm.collect_garbage();

    let root_idx = root.as_handle().unwrap();
    assert!(!vm.heap.is_env_free(root_idx));
    assert_eq!(vm.heap.env_get(inner.as_handle().unwrap(), 1, 1), Value::number(3.0));
}

#[test]
fn test_unreferenced_env_is_collected() {
    use vm::GarbageCollector;

    let mut vm = VM::new();
    build_chain(&mut vm, 0);
    let env = vm.value_at(-1).as_handle().unwrap();
    vm.set_top(0).unwrap();
    vm.collect_garbage();
    assert!(vm.heap.is_env_free(env));
}

mod prop {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn set_then_get_at_every_level(depth in 0usize..8, slot in 1usize..6, v in -1e9f64..1e9) {
            let mut vm = VM::new();
            build_chain(&mut vm, depth);
            for level in 0..=depth {
                let value = Value::number(v + level as f64);
                vm.push(value).unwrap();
                vm.store_captured(-2, level, slot).unwrap();
                vm.push_captured(-1, level, slot).unwrap();
                prop_assert_eq!(vm.pop().unwrap(), value);

                // the same slot seen directly from the ancestor
                let ancestor = (depth - level + 1) as i32;
                vm.push_captured(ancestor, 0, slot).unwrap();
                prop_assert_eq!(vm.pop().unwrap(), value);
            }
        }
    }
}

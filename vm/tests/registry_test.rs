use memory::Value;
use vm::{RuntimeError, VM};

fn answer(vm: &mut VM) -> Result<usize, RuntimeError> {
    vm.push(Value::number(42.0))?;
    Ok(1)
}

fn loaded_entry(vm: &mut VM, name: &str) -> Value {
    let loaded = vm.registry_get("_LOADED");
    let key = vm.intern(name);
    vm.raw_get(loaded, key)
}

#[test]
fn test_register_twice_returns_same_table() {
    let mut vm = VM::new();
    let first = vm.register_library("mylib", 4).unwrap();
    let second = vm.register_library("mylib", 4).unwrap();
    assert!(first.is_table());
    assert_eq!(first, second);
    // each registration leaves the table on the stack
    assert_eq!(vm.top(), 2);
    assert_eq!(vm.value_at(-1), first);
    assert_eq!(vm.get_global("mylib"), first);
    assert_eq!(loaded_entry(&mut vm, "mylib"), first);
}

#[test]
fn test_non_table_global_conflicts() {
    let mut vm = VM::new();
    vm.set_global("m", Value::number(1.0)).unwrap();
    let err = vm.register_library("m", 0).unwrap_err();
    assert_eq!(err, RuntimeError::NameConflict("m".into()));
    assert_eq!(err.to_string(), "name conflict for module 'm'");
    assert!(loaded_entry(&mut vm, "m").is_nil());
    assert_eq!(vm.top(), 0);
}

#[test]
fn test_existing_global_table_is_reused() {
    let mut vm = VM::new();
    let existing = vm.new_table(0);
    let key = vm.intern("keep");
    vm.raw_set(existing, key, Value::bool(true)).unwrap();
    vm.set_global("ext", existing).unwrap();

    let table = vm.register_library("ext", 8).unwrap();
    assert_eq!(table, existing);
    assert_eq!(vm.raw_get(table, key), Value::bool(true));
}

#[test]
fn test_loaded_entry_wins_over_globals() {
    let mut vm = VM::new();
    let table = vm.register_library("lib", 0).unwrap();
    // user code later clobbers the global
    vm.set_global("lib", Value::number(3.0)).unwrap();
    assert_eq!(vm.register_library("lib", 0).unwrap(), table);
}

#[test]
fn test_dotted_names_create_nested_tables() {
    let mut vm = VM::new();
    let http = vm.register_library("net.http", 2).unwrap();
    let net = vm.get_global("net");
    assert!(net.is_table());
    let key = vm.intern("http");
    assert_eq!(vm.raw_get(net, key), http);
    assert_eq!(loaded_entry(&mut vm, "net.http"), http);

    vm.set_global("bad", Value::bool(false)).unwrap();
    assert_eq!(
        vm.register_library("bad.inner", 0),
        Err(RuntimeError::NameConflict("bad.inner".into()))
    );
}

#[test]
fn test_define_library_populates_functions() {
    let mut vm = VM::new();
    let lib = vm.define_library("demo", &[("answer", answer)]).unwrap();
    let key = vm.intern("answer");
    let f = vm.raw_get(lib, key);
    assert!(f.is_function());

    vm.push(f).unwrap();
    vm.call(0, 1).unwrap();
    assert_eq!(vm.value_at(-1), Value::number(42.0));
    assert_eq!(vm.val_to_string(&f), "<function demo.answer>");
}

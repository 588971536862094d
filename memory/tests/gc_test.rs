use memory::Heap;
use memory::Value;

#[test]
fn test_gc_alloc_reuse_string() {
    let mut heap = Heap::new();

    let idx1 = heap.intern("Hello");

    heap.trace(vec![]); // trace nothing
    heap.sweep();

    assert!(heap.is_string_free(idx1));
    // interning again must not hand back the dead entry by content
    assert_eq!(heap.find_interned("Hello"), None);

    let idx2 = heap.intern("World");
    assert_eq!(idx1, idx2, "Heap should reuse freed index");
    assert_eq!(heap.get_string(idx2).unwrap(), b"World");
}

#[test]
fn test_byte_strings_are_interned() {
    let mut heap = Heap::new();
    let a = heap.intern_bytes(&[0xFF, 0x00]);
    let b = heap.intern_bytes(&[0xFF, 0x00]);
    assert_eq!(a, b);
    assert_eq!(heap.get_string(a).unwrap(), &[0xFFu8, 0x00][..]);
    // UTF-8 text and its bytes share one entry
    assert_eq!(heap.intern("ok"), heap.intern_bytes(b"ok"));
}

#[test]
fn test_interning_is_identity() {
    let mut heap = Heap::new();
    let a = heap.intern("abs");
    let b = heap.intern("abs");
    let c = heap.intern("floor");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(heap.strings.live(), 2);
}

#[test]
fn test_gc_cycle_collection() {
    let mut heap = Heap::new();

    let a_idx = heap.alloc_table(0);
    let b_idx = heap.alloc_table(0);
    let val_a = Value::table(a_idx);
    let val_b = Value::table(b_idx);
    let key = Value::string(heap.intern("other"));

    // A -> B, B -> A
    heap.get_table_mut(a_idx).unwrap().set(key, val_b);
    heap.get_table_mut(b_idx).unwrap().set(key, val_a);

    heap.trace(vec![val_a]);
    heap.sweep();
    assert!(!heap.is_table_free(a_idx));
    assert!(!heap.is_table_free(b_idx));

    heap.trace(vec![]);
    heap.sweep();
    assert!(heap.is_table_free(a_idx));
    assert!(heap.is_table_free(b_idx));
}

#[test]
fn test_table_keys_normalize_zero() {
    let mut heap = Heap::new();
    let t = heap.alloc_table(4);
    let table = heap.get_table_mut(t).unwrap();
    table.set(Value::number(-0.0), Value::bool(true));
    assert_eq!(table.get(Value::number(0.0)), Value::bool(true));
    table.set(Value::number(0.0), Value::nil());
    assert!(table.hash.is_empty());
}

#[test]
fn test_table_border() {
    let mut heap = Heap::new();
    let t = heap.alloc_table(0);
    let table = heap.get_table_mut(t).unwrap();
    for i in 1..=3 {
        table.set(Value::number(i as f64), Value::number(i as f64 * 10.0));
    }
    table.set(Value::number(5.0), Value::bool(true));
    assert_eq!(table.border(), 3);
}

#[test]
fn test_env_chain_keeps_parent_alive() {
    let mut heap = Heap::new();
    let root = heap.alloc_env(None);
    let child = heap.alloc_env(Some(root));
    let s = heap.intern("captured");
    heap.get_env_mut(root).unwrap().set(1, Value::string(s));

    assert_eq!(heap.get_env(child).unwrap().parent(), Some(root));
    assert_eq!(heap.get_env(root).unwrap().parent(), None);

    // only the child is a root: parent link and its captures survive
    heap.trace(vec![Value::env(child)]);
    heap.sweep();
    assert!(!heap.is_env_free(root));
    assert!(!heap.is_string_free(s));

    heap.trace(vec![]);
    heap.sweep();
    assert!(heap.is_env_free(root));
    assert!(heap.is_env_free(child));
}

#[test]
fn test_env_slots_grow_with_nil() {
    let mut heap = Heap::new();
    let e = heap.alloc_env(None);
    let env = heap.get_env_mut(e).unwrap();
    env.set(4, Value::number(1.0));
    assert_eq!(env.slots.len(), 5);
    assert!(env.get(2).is_nil());
    assert!(env.get(99).is_nil());
}

#[test]
fn test_metafield_lookup() {
    let mut heap = Heap::new();
    let mt = heap.alloc_table(1);
    let t = heap.alloc_table(0);
    let event = heap.intern("__add");
    heap.get_table_mut(mt)
        .unwrap()
        .set(Value::string(event), Value::function(0));

    assert!(heap.metafield(Value::table(t), "__add").is_nil());
    assert!(heap.set_metatable(Value::table(t), Some(mt)));
    assert_eq!(heap.metafield(Value::table(t), "__add"), Value::function(0));
    // never interned, so absent
    assert!(heap.metafield(Value::table(t), "__sub").is_nil());
    // numbers carry no metatable
    assert!(!heap.set_metatable(Value::number(1.0), Some(mt)));
}

#[test]
fn test_userdata_metatable_survives_via_userdata() {
    let mut heap = Heap::new();
    let mt = heap.alloc_table(0);
    let u = heap.alloc_userdata(Box::new(42u32), Some(mt));
    assert_eq!(heap.metatable_of(Value::handle(u)), Some(mt));

    heap.trace(vec![Value::handle(u)]);
    heap.sweep();
    assert!(!heap.is_table_free(mt));
    let payload = heap.get_userdata(u).unwrap().payload.downcast_ref::<u32>();
    assert_eq!(payload, Some(&42));
}

#[test]
fn test_env_get_set_walks_levels() {
    let mut heap = Heap::new();
    let outer = heap.new_env(None);
    let middle = heap.new_env(Some(outer));
    let inner = heap.new_env(Some(middle));

    heap.env_set(inner, 2, 1, Value::number(7.0));
    heap.env_set(inner, 0, 1, Value::number(9.0));

    assert_eq!(heap.env_get(outer, 0, 1), Value::number(7.0));
    assert_eq!(heap.env_get(middle, 1, 1), Value::number(7.0));
    assert_eq!(heap.env_get(inner, 0, 1), Value::number(9.0));
    // slot 0 is the parent link
    assert_eq!(heap.env_get(inner, 0, 0), Value::env(middle));
}

use crate::error::RuntimeError;
use crate::native::{NativeFn, NativeObj};
use memory::{Heap, Value};

use super::frame::CallFrame;

/// Registry key holding the table of loaded libraries.
pub const LOADED_KEY: &str = "_LOADED";

/// The Virtual Machine struct
pub struct VM {
    pub heap: Heap,
    // SAFETY: Box<[Value]> guarantees stable address (no reallocation)
    pub stack: Box<[Value]>,
    /// First free slot of `stack`.
    pub stack_top: usize,
    pub frames: Vec<CallFrame>,
    pub natives: Vec<NativeObj>,

    /// Global namespace table (heap handle)
    pub globals: u32,
    /// Host-private registry table (heap handle)
    pub registry: u32,

    /// If true, GC will run on every possible occasion (for testing)
    pub stress_mode: bool,
}

pub const STACK_MAX: usize = 65_536;

/// Maximum nesting of native calls.
pub const MAX_CALL_DEPTH: usize = 200;

impl Default for VM {
    fn default() -> Self {
        Self::new()
    }
}

impl VM {
    /// Create a new VM instance with empty globals and a registry holding `_LOADED`
    pub fn new() -> Self {
        // Pre-allocate fixed-size stack and PIN it via Box
        let stack = vec![Value::nil(); STACK_MAX].into_boxed_slice();

        let mut heap = Heap::new();
        let globals = heap.alloc_table(64);
        let registry = heap.alloc_table(4);
        let loaded = heap.alloc_table(16);
        let loaded_key = Value::string(heap.intern(LOADED_KEY));
        if let Some(reg) = heap.get_table_mut(registry) {
            reg.set(loaded_key, Value::table(loaded));
        }

        Self {
            heap,
            stack,
            stack_top: 0,
            frames: vec![CallFrame::host()],
            natives: Vec::new(),
            globals,
            registry,
            stress_mode: false,
        }
    }

    /// Soft Reset: clears the stack and any frames left by an aborted call.
    pub fn reset(&mut self) {
        self.frames.truncate(1);
        self.stack_top = 0;

        // Zero stack in debug builds to prevent stale values leaking
        #[cfg(debug_assertions)]
        self.stack.fill(Value::nil());
    }

    // --- Strings ---

    /// Interned string value for `s`.
    pub fn intern(&mut self, s: &str) -> Value {
        Value::string(self.heap.intern(s))
    }

    pub fn intern_bytes(&mut self, bytes: &[u8]) -> Value {
        Value::string(self.heap.intern_bytes(bytes))
    }

    /// Raw contents of a string value.
    pub fn bytes_of(&self, v: Value) -> Option<&[u8]> {
        if !v.is_string() {
            return None;
        }
        self.heap.get_string(v.as_handle()?)
    }

    /// Contents of a string value holding UTF-8 text.
    pub fn str_of(&self, v: Value) -> Option<&str> {
        self.bytes_of(v).and_then(|b| std::str::from_utf8(b).ok())
    }

    // --- Tables ---

    pub fn new_table(&mut self, size_hint: usize) -> Value {
        Value::table(self.heap.alloc_table(size_hint))
    }

    /// Raw read `t[key]`; nil when `t` is not a table.
    pub fn raw_get(&self, t: Value, key: Value) -> Value {
        if !t.is_table() {
            return Value::nil();
        }
        t.as_handle()
            .and_then(|h| self.heap.get_table(h))
            .map(|table| table.get(key))
            .unwrap_or_else(Value::nil)
    }

    /// Raw write `t[key] = value`.
    pub fn raw_set(&mut self, t: Value, key: Value, value: Value) -> Result<(), RuntimeError> {
        if key.is_nil() || key.as_number().is_some_and(f64::is_nan) {
            return Err(RuntimeError::TypeMismatch("table index is nil or NaN".into()));
        }
        let table = t
            .as_handle()
            .filter(|_| t.is_table())
            .and_then(|h| self.heap.get_table_mut(h))
            .ok_or_else(|| {
                RuntimeError::TypeMismatch(format!("attempt to index a {} value", t.type_name()))
            })?;
        table.set(key, value);
        Ok(())
    }

    pub fn get_global(&mut self, name: &str) -> Value {
        let key = self.intern(name);
        self.raw_get(Value::table(self.globals), key)
    }

    pub fn set_global(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let key = self.intern(name);
        self.raw_set(Value::table(self.globals), key, value)
    }

    /// Raw read from the registry table.
    pub fn registry_get(&mut self, key: &str) -> Value {
        let key = self.intern(key);
        self.raw_get(Value::table(self.registry), key)
    }

    // --- Metatables ---

    pub fn set_metatable(&mut self, v: Value, metatable: Value) -> Result<(), RuntimeError> {
        let mt = if metatable.is_nil() {
            None
        } else if metatable.is_table() {
            metatable.as_handle()
        } else {
            return Err(RuntimeError::TypeMismatch("metatable must be a table or nil".into()));
        };
        if self.heap.set_metatable(v, mt) {
            Ok(())
        } else {
            Err(RuntimeError::TypeMismatch(format!(
                "cannot set metatable of a {} value",
                v.type_name()
            )))
        }
    }

    /// Opaque host object carrying `metatable`.
    pub fn new_userdata<T: 'static>(&mut self, payload: T, metatable: Value) -> Value {
        let mt = metatable.as_handle().filter(|_| metatable.is_table());
        Value::handle(self.heap.alloc_userdata(Box::new(payload), mt))
    }

    // --- Natives ---

    /// Function value for `func` carrying `upvalues`.
    pub fn new_native(&mut self, name: &str, func: NativeFn, upvalues: Vec<Value>) -> Value {
        self.natives.push(NativeObj {
            upvalues,
            ..NativeObj::new(name, func)
        });
        Value::function((self.natives.len() - 1) as u32)
    }

    /// Name of the native currently running, if any.
    pub fn current_native_name(&self) -> Option<&str> {
        let idx = self.frames.last()?.native?;
        self.natives.get(idx as usize).map(|n| n.name.as_str())
    }

    /// Helper to format values for display (Clean UX)
    pub fn val_to_string(&self, val: &Value) -> String {
        match val {
            v if v.is_string() => self
                .bytes_of(*v)
                .map(|b| String::from_utf8_lossy(b).into_owned())
                .unwrap_or_else(|| "<bad string>".to_string()),
            v if v.is_number() => {
                let n = v.as_number().unwrap_or(f64::NAN);
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", n as i64)
                } else {
                    format!("{}", n)
                }
            }
            v if v.is_bool() => format!("{}", !v.is_falsey()),
            v if v.is_nil() => "nil".to_string(),
            v if v.is_function() => {
                let name = v
                    .as_handle()
                    .and_then(|h| self.natives.get(h as usize))
                    .map(|n| n.name.as_str())
                    .unwrap_or("?");
                format!("<function {}>", name)
            }
            v => format!("{}: {:?}", v.type_name(), v), // Fallback
        }
    }
}

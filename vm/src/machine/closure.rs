use crate::error::RuntimeError;
use memory::Value;

use super::vm::VM;

// Closure environments for natively-compiled functions. Generated code keeps
// the innermost environment in a stack slot (or a native upvalue) and reaches
// captured variables by (level, slot) pairs: `level` parent hops, then a slot
// index. Slot 0 always holds the parent link.
impl VM {
    fn env_handle(&self, v: Value) -> Result<u32, RuntimeError> {
        v.as_handle().filter(|_| v.is_env()).ok_or_else(|| {
            RuntimeError::TypeMismatch(format!("expected closure environment, got {}", v.type_name()))
        })
    }

    /// Pushes a new environment whose parent is the environment at `idx`
    /// (nil at `idx` makes a root environment).
    pub fn new_closure_env(&mut self, idx: i32) -> Result<(), RuntimeError> {
        let parent = self.value_at(idx);
        let parent = if parent.is_nil() {
            None
        } else {
            Some(self.env_handle(parent)?)
        };
        let env = self.heap.new_env(parent);
        self.push(Value::env(env))
    }

    /// Pushes captured variable (`level`, `slot`) of the environment at `idx`.
    pub fn push_captured(&mut self, idx: i32, level: usize, slot: usize) -> Result<(), RuntimeError> {
        let env = self.env_handle(self.value_at(idx))?;
        let v = self.heap.env_get(env, level, slot);
        self.push(v)
    }

    /// Pops the top value into captured variable (`level`, `slot`) of the
    /// environment at `idx`. `idx` is resolved before the pop.
    pub fn store_captured(&mut self, idx: i32, level: usize, slot: usize) -> Result<(), RuntimeError> {
        let env = self.env_handle(self.value_at(idx))?;
        let v = self.pop()?;
        self.heap.env_set(env, level, slot, v);
        Ok(())
    }
}

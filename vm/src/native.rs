use crate::error::RuntimeError;
use crate::machine::VM;
use memory::Value;

// The unified signature for ALL natives (library functions and operator handlers).
// Arguments sit on the stack at indices 1..=top of the callee frame.
// Return: the number of results left on top of the stack.
pub type NativeFn = fn(vm: &mut VM) -> Result<usize, RuntimeError>;

#[derive(Clone)]
pub struct NativeObj {
    pub name: String,
    pub func: NativeFn,
    /// Values captured at creation, read back with `VM::upvalue`.
    pub upvalues: Vec<Value>,
}

impl NativeObj {
    pub fn new(name: impl Into<String>, func: NativeFn) -> Self {
        Self {
            name: name.into(),
            func,
            upvalues: Vec::new(),
        }
    }
}

pub mod builtins;
pub mod error;
pub mod machine;
pub mod native;
pub mod opcode;

pub use builtins::{BuiltinFunction, NO_FAST_CALL};
pub use error::RuntimeError;
pub use machine::{
    ArithOp, ArithmeticOps, CallFrame, GarbageCollector, Operand, MULTRET, STACK_MAX, VM,
};
pub use native::{NativeFn, NativeObj};
pub use opcode::OpCode;

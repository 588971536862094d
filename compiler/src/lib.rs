pub mod builtins;
pub mod codegen;
pub mod error;
pub mod globals;
pub mod options;
pub mod variables;

pub use builtins::{builtin_function_id, fast_call_id, resolve_builtin, Builtin};
pub use codegen::{CallLowering, CallSite, CompiledUnit, Compiler};
pub use error::CompilerError;
pub use globals::{GlobalState, GlobalTracker};
pub use options::CompileOptions;
pub use variables::{Variable, VariableTracker};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("stack overflow")]
    StackOverflow,
    #[error("stack underflow")]
    StackUnderflow,
    #[error("invalid stack index {0}")]
    InvalidIndex(i32),
    #[error("invalid opcode {0}")]
    InvalidOpcode(u8),
    #[error("attempt to perform arithmetic")]
    Arithmetic,
    #[error("attempt to compare")]
    Compare,
    #[error("attempt to call a {0} value")]
    NotCallable(&'static str),
    #[error("name conflict for module '{0}'")]
    NameConflict(String),
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("bad argument #{arg} to '{func}' ({message})")]
    BadArgument {
        arg: usize,
        func: String,
        message: String,
    },
    #[error("{0}")]
    Custom(String),
}

impl From<String> for RuntimeError {
    fn from(s: String) -> Self {
        RuntimeError::Custom(s)
    }
}

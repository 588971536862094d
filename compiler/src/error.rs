use thiserror::Error;
use tidal_syntax::ParseError;

#[derive(Debug, Clone, Error)]
pub enum CompilerError {
    #[error(transparent)]
    ParseError(#[from] ParseError),
    #[error("invalid compile options: {0}")]
    InvalidOptions(String),
    #[error("register overflow at line {line}")]
    RegisterOverflow { line: usize },
}

impl From<toml::de::Error> for CompilerError {
    fn from(e: toml::de::Error) -> Self {
        CompilerError::InvalidOptions(e.to_string())
    }
}

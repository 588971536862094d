pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod visit;

pub use error::ParseError;
/// Re-export the hand-written parser as the primary API.
pub use parser::parse_program;

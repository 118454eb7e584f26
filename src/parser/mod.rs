// Scalar token parsing

pub mod lexer;
pub mod scalar;

// Public API re-exports
pub use scalar::{parse_bool, parse_integer, parse_number};

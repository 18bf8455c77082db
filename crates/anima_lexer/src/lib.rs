//!
//!
mod keywords;
mod lexer;

pub use keywords::KEYWORDS;
pub use lexer::{LexResult, Lexer};

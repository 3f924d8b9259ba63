pub mod ast;
pub mod lexer;
pub mod normalize;
pub mod parser;

pub use ast::{Constraint, Direction, Program, Relation};
pub use lexer::{Lexer, Span, Token, TokenKind};
pub use normalize::{load_file, load_str, tableau_matrix, LoadError};
pub use parser::{ParseError, Parser};

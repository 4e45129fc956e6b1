#[cfg(test)]
extern crate quickcheck;

#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

mod ast;
mod error;
mod normalize;
mod parser;
mod tokenizer;

pub use ast::{IntegerValue, Kind, Literal, Node, Pattern};
pub use error::Error;
pub use normalize::{denormalize, normalize};
pub use parser::{parse, read};
pub use tokenizer::{tokenize, Position, State, Token, TokenKind};

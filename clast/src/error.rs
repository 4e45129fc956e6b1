use thiserror::Error;

use crate::tokenizer::{Position, State};

#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    #[error("Invalid character \"{character}\" in {state}.")]
    InvalidCharacter {
        character: char,
        state: State,
        position: Position,
    },
    #[error("Invalid character \"{0}\" in not an anonymous function.")]
    NotAnonymousFunction(String),
    #[error("Unclosed delimiter \"{delimiter}\".")]
    Unclosed { delimiter: char, position: Position },
}

impl Error {
    pub(crate) fn invalid_character(character: char, state: State, position: Position) -> Self {
        Error::InvalidCharacter {
            character,
            state,
            position,
        }
    }

    /// Whether appending more text could still turn the input into a valid
    /// program: an open string or an open collection.
    pub fn is_incomplete(&self) -> bool {
        match self {
            Error::InvalidCharacter {
                character: '"',
                state: State::String,
                ..
            } => true,
            Error::Unclosed { .. } => true,
            _ => false,
        }
    }
}

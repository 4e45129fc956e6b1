use std::{borrow::Cow, fmt};

use lazy_static::lazy_static;
use log::{debug, trace};
use nom::{character::complete::anychar, error::ErrorKind};
use nom_locate::LocatedSpan;
use regex::Regex;

use crate::error::Error;

type Span<'a> = LocatedSpan<&'a str>;

lazy_static! {
    static ref LINE_ENDING: Regex = Regex::new(r"\r\n?").unwrap();
}

const DELIMITERS: &[char] = &[
    '(', ')', '[', ']', '{', '}', '#', '"', '\'', '`', ',', ':', ';', '|',
];

const SPACES: &[char] = &['\t', '\n', '\x0C', ' '];

pub(crate) fn is_symbol_char(ch: char) -> bool {
    !(DELIMITERS.contains(&ch) || ch.is_whitespace())
}

fn is_space(ch: char) -> bool {
    SPACES.contains(&ch)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: usize,
}

impl Position {
    fn of(span: &Span<'_>) -> Self {
        Position {
            line: span.line,
            column: span.get_utf8_column(),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Expression,
    String,
    Comment,
    Symbol,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Expression => "expression",
            State::String => "string",
            State::Comment => "comment",
            State::Symbol => "symbol",
        };

        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Dispatch,
    Meta,
    Quote,
    Deref,
    OpenParen,
    OpenBracket,
    OpenBrace,
    CloseDelimiter,
    String,
    Comment,
    Keyword,
    Rest,
    Symbol,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Dispatch => "dispatch",
            TokenKind::Meta => "meta",
            TokenKind::Quote => "quote",
            TokenKind::Deref => "deref",
            TokenKind::OpenParen => "open-paren",
            TokenKind::OpenBracket => "open-bracket",
            TokenKind::OpenBrace => "open-brace",
            TokenKind::CloseDelimiter => "close-delimiter",
            TokenKind::String => "string",
            TokenKind::Comment => "comment",
            TokenKind::Keyword => "keyword",
            TokenKind::Rest => "rest",
            TokenKind::Symbol => "symbol",
        };

        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: Option<String>,
    pub position: Position,
}

impl Token {
    fn new(kind: TokenKind, text: Option<String>, position: Position) -> Self {
        Token {
            kind,
            text,
            position,
        }
    }

    fn delimiter(ch: char, position: Position) -> Self {
        Token::new(TokenKind::CloseDelimiter, Some(ch.to_string()), position)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.text {
            Some(text) => write!(f, "{}@{} {:?}", self.kind, self.position, text),
            None => write!(f, "{}@{}", self.kind, self.position),
        }
    }
}

/// Character-at-a-time scanner. `last` remembers the kind of token the
/// previous character produced, if any, which is all the lookback the
/// dispatch and meta sigils need.
struct Tokenizer<'a> {
    input: Span<'a>,
    state: State,
    token: Option<Token>,
    last: Option<TokenKind>,
    tokens: Vec<Token>,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Tokenizer {
            input: Span::new(input),
            state: State::Expression,
            token: None,
            last: None,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, Error> {
        while let Ok((rest, ch)) = anychar::<_, (Span<'a>, ErrorKind)>(self.input) {
            let position = Position::of(&self.input);

            self.input = rest;
            self.last = self.lex(ch, position)?;
        }

        self.finish()
    }

    fn lex(&mut self, ch: char, at: Position) -> Result<Option<TokenKind>, Error> {
        match self.state {
            State::Expression => self.expression(ch, at),
            State::String => Ok(self.string(ch)),
            State::Comment => Ok(self.comment(ch)),
            State::Symbol => self.symbol(ch, at),
        }
    }

    fn expression(&mut self, ch: char, at: Position) -> Result<Option<TokenKind>, Error> {
        let after_dispatch = self.last == Some(TokenKind::Dispatch);

        let kind = match ch {
            '#' if after_dispatch => return Err(self.invalid(ch, at)),
            '^' if self.last == Some(TokenKind::Meta) => return Err(self.invalid(ch, at)),
            '[' | ')' | '}' | ']' if after_dispatch => return Err(self.invalid(ch, at)),
            '#' => TokenKind::Dispatch,
            '^' => TokenKind::Meta,
            '\'' => TokenKind::Quote,
            '@' => TokenKind::Deref,
            '&' => TokenKind::Rest,
            '(' => TokenKind::OpenParen,
            '[' => TokenKind::OpenBracket,
            '{' => TokenKind::OpenBrace,
            ')' | '}' | ']' => {
                self.emit(Token::delimiter(ch, at));

                return Ok(Some(TokenKind::CloseDelimiter));
            }
            '"' => return Ok(Some(self.begin(TokenKind::String, State::String, at))),
            ';' => return Ok(Some(self.begin(TokenKind::Comment, State::Comment, at))),
            // The keyword accumulator is already in symbol state when `#:` is rejected.
            ':' if after_dispatch => {
                return Err(Error::invalid_character(ch, State::Symbol, at));
            }
            ':' => return Ok(Some(self.begin(TokenKind::Keyword, State::Symbol, at))),
            _ if after_dispatch => return Err(self.invalid(ch, at)),
            _ if is_symbol_char(ch) => {
                let kind = self.begin(TokenKind::Symbol, State::Symbol, at);
                self.push_char(ch);

                return Ok(Some(kind));
            }
            _ if is_space(ch) => return Ok(None),
            _ => return Err(self.invalid(ch, at)),
        };

        self.emit(Token::new(kind, None, at));

        Ok(Some(kind))
    }

    fn string(&mut self, ch: char) -> Option<TokenKind> {
        if ch == '"' {
            self.close_token();
        } else {
            self.push_char(ch);
        }

        None
    }

    fn comment(&mut self, ch: char) -> Option<TokenKind> {
        if ch == '\n' || ch == '\r' {
            self.close_token();
        } else {
            self.push_char(ch);
        }

        None
    }

    fn symbol(&mut self, ch: char, at: Position) -> Result<Option<TokenKind>, Error> {
        match ch {
            ')' | '}' | ']' => {
                self.close_token();
                self.emit(Token::delimiter(ch, at));

                Ok(Some(TokenKind::CloseDelimiter))
            }
            _ if is_space(ch) => {
                self.close_token();

                Ok(None)
            }
            _ if is_symbol_char(ch) => {
                self.push_char(ch);

                Ok(None)
            }
            _ => Err(self.invalid(ch, at)),
        }
    }

    fn begin(&mut self, kind: TokenKind, state: State, at: Position) -> TokenKind {
        self.state = state;
        self.token = Some(Token::new(kind, Some(String::new()), at));

        kind
    }

    fn push_char(&mut self, ch: char) {
        if let Some(text) = self.token.as_mut().and_then(|token| token.text.as_mut()) {
            text.push(ch);
        }
    }

    fn close_token(&mut self) {
        self.state = State::Expression;

        if let Some(token) = self.token.take() {
            self.emit(token);
        }
    }

    fn emit(&mut self, token: Token) {
        trace!("token {}", token);

        self.tokens.push(token);
    }

    fn invalid(&self, ch: char, at: Position) -> Error {
        Error::invalid_character(ch, self.state, at)
    }

    fn finish(mut self) -> Result<Vec<Token>, Error> {
        if self.state == State::String {
            let at = self.token.as_ref().map(|token| token.position).unwrap_or_default();

            return Err(Error::invalid_character('"', State::String, at));
        }

        self.close_token();

        debug!("tokenized {} tokens", self.tokens.len());

        Ok(self.tokens)
    }
}

fn unify_line_endings(input: &str) -> Cow<'_, str> {
    LINE_ENDING.replace_all(input, "\n")
}

/// Scans `input` into tokens, failing on the first character no rule accepts.
pub fn tokenize(input: &str) -> Result<Vec<Token>, Error> {
    let source = unify_line_endings(input);

    Tokenizer::new(&source).run()
}

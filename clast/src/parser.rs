use std::collections::BTreeSet;

use lazy_static::lazy_static;
use log::{debug, trace};
use regex::Regex;

use crate::{
    ast::{IntegerValue, Literal, Node, Pattern},
    error::Error,
    normalize::normalize,
    tokenizer::{tokenize, Position, State, Token, TokenKind},
};

lazy_static! {
    static ref FLOAT: Regex = Regex::new(r"^[-+]?[0-9]+\.[0-9]*$").unwrap();
    static ref INTEGER: Regex = Regex::new(r"^[-+]?[0-9]+$").unwrap();
    static ref ANONYMOUS_ARGUMENT: Regex = Regex::new(r"^%[0-9]?$").unwrap();
}

fn identifier(name: &str) -> Node {
    Node::Identifier(normalize(name))
}

fn symbol(name: &str) -> Node {
    match name {
        "nil" => Node::Literal(Literal::Nil),
        "true" => Node::Literal(Literal::Boolean(true)),
        "false" => Node::Literal(Literal::Boolean(false)),
        _ => identifier(name),
    }
}

fn with_meta(meta: Node) -> Node {
    Node::List(vec![identifier("with-meta"), meta])
}

fn number(text: String) -> Node {
    if FLOAT.is_match(&text) {
        let value = text.parse::<f64>().unwrap_or(f64::NAN);

        Node::Float { value, raw: text }
    } else {
        let value = IntegerValue::parse(&text);

        Node::Integer { value, raw: text }
    }
}

fn is_head(items: &[Node], names: &[&str]) -> bool {
    match items.first() {
        Some(Node::Identifier(name)) => names.contains(&name.as_str()),
        _ => false,
    }
}

/// `(with_meta {...})`: metadata still waiting for its value.
fn is_meta(items: &[Node]) -> bool {
    items.len() == 2 && is_head(items, &["with_meta"])
}

/// `(quote)` or `(deref)`: a wrapper still waiting for its argument.
fn is_wrapping(items: &[Node]) -> bool {
    items.len() == 1 && is_head(items, &["quote", "deref"])
}

/// Rewrites the body of `#(...)` into `(fn [%1 ... %N] (body...))`, where `N`
/// comes from the highest placeholder used. A bare `%` counts as `%1`.
fn anonymous_fn(body: Vec<Node>, placeholders: &BTreeSet<String>) -> Node {
    let arity = placeholders
        .iter()
        .next_back()
        .map(|max| max.trim_start_matches('%').parse::<usize>().unwrap_or(1))
        .unwrap_or(0);
    let params = (1..=arity)
        .map(|index| identifier(&format!("%{}", index)))
        .collect();

    Node::List(vec![
        identifier("fn"),
        Node::Vector(params),
        Node::List(body),
    ])
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Collection {
    List,
    AnonymousFn,
    Vector,
    Map,
    MetaMap,
    Set,
}

impl Collection {
    fn opener(self) -> char {
        match self {
            Collection::List | Collection::AnonymousFn => '(',
            Collection::Vector => '[',
            Collection::Map | Collection::MetaMap | Collection::Set => '{',
        }
    }
}

/// A collection still being read.
///
/// Whether a value fills a wrapper is decided by the shape of the last
/// child alone, so a hand-written `(quote)` or `(with-meta m)` takes the next
/// value just like one produced by `'` or `^`.
#[derive(Debug)]
struct Context {
    collection: Collection,
    position: Position,
    children: Vec<Node>,
}

impl Context {
    fn new(collection: Collection, position: Position) -> Self {
        Context {
            collection,
            position,
            children: Vec::new(),
        }
    }

    /// Adds a value. A waiting `(with_meta {...})` gets it in front of the
    /// metadata, a waiting `(quote)` or `(deref)` gets it as its argument,
    /// anything else gets it as a new sibling.
    fn attach(&mut self, node: Node) {
        if let Some(Node::List(items)) = self.children.last_mut() {
            if is_meta(items) {
                items.insert(1, node);
                return;
            }

            if is_wrapping(items) {
                items.push(node);
                return;
            }
        }

        self.children.push(node);
    }
}

struct Reader<I> {
    tokens: I,
    root: Context,
    contexts: Vec<Context>,
    anonymous: Vec<BTreeSet<String>>,
    last: Option<TokenKind>,
}

impl<I: Iterator<Item = Token>> Reader<I> {
    fn new(tokens: I) -> Self {
        Reader {
            tokens,
            root: Context::new(Collection::List, Position::default()),
            contexts: Vec::new(),
            anonymous: Vec::new(),
            last: None,
        }
    }

    fn current(&mut self) -> &mut Context {
        match self.contexts.last_mut() {
            Some(context) => context,
            None => &mut self.root,
        }
    }

    fn run(mut self) -> Result<Vec<Node>, Error> {
        while let Some(token) = self.tokens.next() {
            let kind = token.kind;

            self.read(token)?;
            self.last = Some(kind);
        }

        if let Some(context) = self.contexts.pop() {
            return Err(Error::Unclosed {
                delimiter: context.collection.opener(),
                position: context.position,
            });
        }

        debug!("read {} top-level forms", self.root.children.len());

        Ok(self.root.children)
    }

    fn read(&mut self, token: Token) -> Result<(), Error> {
        let Token {
            kind,
            text,
            position,
        } = token;
        let text = text.unwrap_or_default();

        match kind {
            TokenKind::Dispatch | TokenKind::Meta => {}
            TokenKind::Comment => self.current().attach(Node::Comment(text)),
            TokenKind::OpenParen if self.last == Some(TokenKind::Dispatch) => {
                self.anonymous.push(BTreeSet::new());
                self.open(Collection::AnonymousFn, position);
            }
            TokenKind::OpenParen => self.open(Collection::List, position),
            TokenKind::OpenBracket => self.open(Collection::Vector, position),
            TokenKind::OpenBrace => match self.last {
                Some(TokenKind::Dispatch) => self.open(Collection::Set, position),
                Some(TokenKind::Meta) => self.open(Collection::MetaMap, position),
                _ => self.open(Collection::Map, position),
            },
            TokenKind::CloseDelimiter => self.close(&text, position)?,
            TokenKind::Rest => self.rest(position)?,
            TokenKind::Quote => self.current().attach(Node::List(vec![identifier("quote")])),
            TokenKind::Deref => self.current().attach(Node::List(vec![identifier("deref")])),
            TokenKind::Keyword if self.last == Some(TokenKind::Meta) => {
                let meta = Node::Map(vec![
                    Node::Keyword(text),
                    Node::Literal(Literal::Boolean(true)),
                ]);

                self.current().attach(with_meta(meta));
            }
            TokenKind::Keyword => self.current().attach(Node::Keyword(text)),
            TokenKind::String if self.last == Some(TokenKind::Dispatch) => {
                self.current().attach(Node::Regexp(Pattern::new(text)))
            }
            TokenKind::String => self.current().attach(Node::String(text)),
            TokenKind::Symbol => {
                let node = self.symbol(text)?;

                self.current().attach(node);
            }
        }

        Ok(())
    }

    fn open(&mut self, collection: Collection, position: Position) {
        trace!("open {:?} at {}", collection, position);

        self.contexts.push(Context::new(collection, position));
    }

    fn close(&mut self, delimiter: &str, position: Position) -> Result<(), Error> {
        let context = match self.contexts.pop() {
            Some(context) => context,
            None => {
                let character = delimiter.chars().next().unwrap_or(')');

                return Err(Error::invalid_character(
                    character,
                    State::Expression,
                    position,
                ));
            }
        };

        trace!("close {:?} opened at {}", context.collection, context.position);

        let children = context.children;

        match context.collection {
            Collection::List => self.current().attach(Node::List(children)),
            Collection::Vector => self.current().attach(Node::Vector(children)),
            Collection::Map => self.current().attach(Node::Map(children)),
            Collection::Set => self.current().attach(Node::Set(children)),
            Collection::MetaMap => self.current().attach(with_meta(Node::Map(children))),
            Collection::AnonymousFn => {
                let placeholders = self.anonymous.pop().unwrap_or_default();
                let node = anonymous_fn(children, &placeholders);

                self.current().attach(node);
            }
        }

        Ok(())
    }

    fn rest(&mut self, position: Position) -> Result<(), Error> {
        match self.tokens.next() {
            Some(Token {
                kind: TokenKind::Symbol,
                text: Some(name),
                ..
            }) => {
                self.current().attach(Node::Rest(normalize(&name)));

                Ok(())
            }
            _ => Err(Error::invalid_character('&', State::Expression, position)),
        }
    }

    fn symbol(&mut self, text: String) -> Result<Node, Error> {
        if FLOAT.is_match(&text) || INTEGER.is_match(&text) {
            return Ok(number(text));
        }

        if ANONYMOUS_ARGUMENT.is_match(&text) {
            return match self.anonymous.last_mut() {
                Some(placeholders) => {
                    let node = identifier(&text);
                    placeholders.insert(text);

                    Ok(node)
                }
                None => Err(Error::NotAnonymousFunction(text)),
            };
        }

        Ok(symbol(&text))
    }
}

/// Builds the tree for an already tokenized program.
pub fn read<T: IntoIterator<Item = Token>>(tokens: T) -> Result<Vec<Node>, Error> {
    Reader::new(tokens.into_iter()).run()
}

/// Parses a whole program into its top-level forms.
pub fn parse(input: &str) -> Result<Vec<Node>, Error> {
    read(tokenize(input)?)
}


#[cfg(test)]
mod properties {
    use quickcheck::{Arbitrary, Gen, TestResult};

    use super::*;

    #[quickcheck]
    fn integers_parse_to_their_value(value: i64) -> bool {
        match parse(&value.to_string()).as_deref() {
            Ok([Node::Integer { value: parsed, .. }]) => *parsed == IntegerValue::Exact(value),
            _ => false,
        }
    }

    #[quickcheck]
    fn decimals_parse_to_floats(value: f64) -> TestResult {
        if !value.is_finite() {
            return TestResult::discard();
        }

        let text = format!("{:.3}", value);
        let expected = text.parse::<f64>().unwrap();

        TestResult::from_bool(match parse(&text).as_deref() {
            Ok([Node::Float { value, raw }]) => *value == expected && *raw == text,
            _ => false,
        })
    }

    #[quickcheck]
    fn bare_words_become_normalized_identifiers(word: String) -> TestResult {
        let plain = !word.is_empty()
            && word
                .chars()
                .all(|ch| ch.is_ascii_alphabetic() || "!*+/<=>?-".contains(ch));

        if !plain || ["nil", "true", "false"].contains(&word.as_str()) {
            return TestResult::discard();
        }

        TestResult::from_bool(parse(&word) == Ok(vec![Node::Identifier(normalize(&word))]))
    }

    fn name<G: Gen>(g: &mut G) -> String {
        let size = 1 + usize::arbitrary(g) % 8;
        let name = (0..size)
            .map(|_| (b'a' + u8::arbitrary(g) % 26) as char)
            .collect::<String>();

        match name.as_str() {
            "nil" | "true" | "false" | "quote" | "deref" => format!("{}_", name),
            _ => name,
        }
    }

    fn nodes<G: Gen>(g: &mut G) -> Vec<Node> {
        let size = u8::arbitrary(g) % 5;

        if size <= 2 {
            Vec::default()
        } else {
            (0..(size - 2)).map(|_| Node::arbitrary(g)).collect()
        }
    }

    impl Arbitrary for Node {
        fn arbitrary<G: Gen>(g: &mut G) -> Self {
            match u8::arbitrary(g) % 12 {
                0 => {
                    let value = i64::arbitrary(g);

                    Node::Integer {
                        value: IntegerValue::Exact(value),
                        raw: value.to_string(),
                    }
                }
                1 => {
                    let raw = format!("{:.2}", f64::from(i32::arbitrary(g)) / 8.0);

                    Node::Float {
                        value: raw.parse().unwrap(),
                        raw,
                    }
                }
                2 | 3 => Node::Identifier(name(g)),
                4 => Node::Keyword(name(g)),
                5 => Node::String(String::arbitrary(g).replace('"', "'").replace('\r', "")),
                6 => Node::Literal(Literal::Boolean(bool::arbitrary(g))),
                7 => Node::List(nodes(g)),
                8 => Node::Vector(nodes(g)),
                9 => Node::Map(nodes(g)),
                10 => Node::Set(nodes(g)),
                11 => Node::Rest(name(g)),
                _ => panic!("Should not happen"),
            }
        }
    }

    #[quickcheck]
    fn displayed_forms_read_back(node: Node) -> bool {
        parse(&node.to_string()) == Ok(vec![node])
    }
}

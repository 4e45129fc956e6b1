use std::{borrow::Cow, fmt};

use fancy_regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    List,
    Vector,
    Map,
    Set,
    Comment,
    String,
    Keyword,
    Regexp,
    Float,
    Integer,
    Literal,
    Identifier,
    Rest,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::List => "list",
            Kind::Vector => "vector",
            Kind::Map => "map",
            Kind::Set => "set",
            Kind::Comment => "comment",
            Kind::String => "string",
            Kind::Keyword => "keyword",
            Kind::Regexp => "regexp",
            Kind::Float => "float",
            Kind::Integer => "integer",
            Kind::Literal => "literal",
            Kind::Identifier => "identifier",
            Kind::Rest => "rest",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Literal {
    Nil,
    Boolean(bool),
}

impl Literal {
    pub fn raw(self) -> &'static str {
        match self {
            Literal::Nil => "null",
            Literal::Boolean(true) => "true",
            Literal::Boolean(false) => "false",
        }
    }
}

/// Source of a `#"..."` literal. Reading never compiles it; `compile` does so
/// on demand, with lookaround and backreferences available.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern(String);

impl Pattern {
    pub fn new<S: Into<String>>(source: S) -> Self {
        Pattern(source.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn compile(&self) -> Result<Regex, fancy_regex::Error> {
        Regex::new(&self.0)
    }
}

/// Decoded value of an integer literal. Digit runs outside the `i64` range
/// keep an approximation only; the node's `raw` text stays exact.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum IntegerValue {
    Exact(i64),
    Approximate(f64),
}

impl IntegerValue {
    pub(crate) fn parse(text: &str) -> Self {
        match text.parse::<i64>() {
            Ok(value) => IntegerValue::Exact(value),
            Err(_) => IntegerValue::Approximate(text.parse::<f64>().unwrap_or(f64::NAN)),
        }
    }
}

impl Serialize for IntegerValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            IntegerValue::Exact(value) => serializer.serialize_i64(value),
            IntegerValue::Approximate(value) => serializer.serialize_f64(value),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    List(Vec<Node>),
    Vector(Vec<Node>),
    Map(Vec<Node>),
    Set(Vec<Node>),
    Comment(String),
    String(String),
    Keyword(String),
    Regexp(Pattern),
    Float { value: f64, raw: String },
    Integer { value: IntegerValue, raw: String },
    Literal(Literal),
    Identifier(String),
    Rest(String),
}

impl Node {
    pub fn kind(&self) -> Kind {
        match self {
            Node::List(_) => Kind::List,
            Node::Vector(_) => Kind::Vector,
            Node::Map(_) => Kind::Map,
            Node::Set(_) => Kind::Set,
            Node::Comment(_) => Kind::Comment,
            Node::String(_) => Kind::String,
            Node::Keyword(_) => Kind::Keyword,
            Node::Regexp(_) => Kind::Regexp,
            Node::Float { .. } => Kind::Float,
            Node::Integer { .. } => Kind::Integer,
            Node::Literal(_) => Kind::Literal,
            Node::Identifier(_) => Kind::Identifier,
            Node::Rest(_) => Kind::Rest,
        }
    }

    /// Surface text of a literal, kept for code generators that want to emit
    /// it back verbatim. Collections, comments, identifiers and rest
    /// parameters have none.
    pub fn raw(&self) -> Option<Cow<'_, str>> {
        match self {
            Node::String(text) | Node::Keyword(text) => Some(Cow::Owned(format!("\"{}\"", text))),
            Node::Regexp(pattern) => Some(Cow::Owned(format!("/{}/", pattern.as_str()))),
            Node::Float { raw, .. } | Node::Integer { raw, .. } => Some(Cow::Borrowed(raw.as_str())),
            Node::Literal(literal) => Some(Cow::Borrowed(literal.raw())),
            _ => None,
        }
    }

    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::List(nodes) | Node::Vector(nodes) | Node::Map(nodes) | Node::Set(nodes) => {
                Some(nodes)
            }
            _ => None,
        }
    }
}

fn format_nodes(nodes: &[Node]) -> String {
    nodes
        .iter()
        .map(|node| format!("{}", node))
        .collect::<Vec<String>>()
        .join(" ")
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            Node::List(nodes) => write!(f, "({})", format_nodes(nodes)),
            Node::Vector(nodes) => write!(f, "[{}]", format_nodes(nodes)),
            Node::Map(nodes) => write!(f, "{{{}}}", format_nodes(nodes)),
            Node::Set(nodes) => write!(f, "#{{{}}}", format_nodes(nodes)),
            Node::Comment(text) => write!(f, ";{}", text),
            Node::String(text) => write!(f, "\"{}\"", text),
            Node::Keyword(name) => write!(f, ":{}", name),
            Node::Regexp(pattern) => write!(f, "/{}/", pattern.as_str()),
            Node::Float { raw, .. } | Node::Integer { raw, .. } => write!(f, "{}", raw),
            Node::Literal(literal) => write!(f, "{}", literal.raw()),
            Node::Identifier(name) => write!(f, "{}", name),
            Node::Rest(name) => write!(f, "&{}", name),
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = self.raw();
        let mut map = serializer.serialize_map(Some(if raw.is_some() { 3 } else { 2 }))?;

        map.serialize_entry("kind", self.kind().name())?;

        match self {
            Node::List(nodes) | Node::Vector(nodes) | Node::Map(nodes) | Node::Set(nodes) => {
                map.serialize_entry("value", nodes)?
            }
            Node::Comment(text)
            | Node::String(text)
            | Node::Keyword(text)
            | Node::Identifier(text)
            | Node::Rest(text) => map.serialize_entry("value", text)?,
            Node::Regexp(pattern) => map.serialize_entry("value", pattern.as_str())?,
            Node::Float { value, .. } => map.serialize_entry("value", value)?,
            Node::Integer { value, .. } => map.serialize_entry("value", value)?,
            Node::Literal(Literal::Nil) => map.serialize_entry("value", &())?,
            Node::Literal(Literal::Boolean(value)) => map.serialize_entry("value", value)?,
        }

        if let Some(raw) = raw {
            map.serialize_entry("raw", raw.as_ref())?;
        }

        map.end()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn integer(value: i64) -> Node {
        Node::Integer {
            value: IntegerValue::Exact(value),
            raw: value.to_string(),
        }
    }

    #[test]
    fn raw_text_is_kept_for_literals_only() {
        assert_eq!(Some("\"yolo\""), Node::String("yolo".into()).raw().as_deref());
        assert_eq!(Some("\"a\""), Node::Keyword("a".into()).raw().as_deref());
        assert_eq!(Some("null"), Node::Literal(Literal::Nil).raw().as_deref());
        assert_eq!(Some("-1"), integer(-1).raw().as_deref());
        assert_eq!(None, Node::Identifier("x".into()).raw());
        assert_eq!(None, Node::List(vec![]).raw());
        assert_eq!(None, Node::Comment(" c".into()).raw());
    }

    #[test]
    fn display_reads_like_source() {
        let node = Node::List(vec![
            Node::Identifier("fn".into()),
            Node::Vector(vec![Node::Rest("xs".into())]),
            Node::Set(vec![integer(1), Node::Keyword("k".into())]),
            Node::Map(vec![Node::String("s".into()), Node::Literal(Literal::Boolean(false))]),
            Node::Regexp(Pattern::new("a+")),
        ]);

        assert_eq!("(fn [&xs] #{1 :k} {\"s\" false} /a+/)", node.to_string());
    }

    #[test]
    fn json_shape_has_kind_value_and_raw() {
        let node = Node::Vector(vec![
            integer(4),
            Node::Identifier("x".into()),
            Node::Literal(Literal::Nil),
            Node::Float {
                value: 1.5,
                raw: "1.50".into(),
            },
        ]);

        assert_eq!(
            json!({
                "kind": "vector",
                "value": [
                    { "kind": "integer", "value": 4, "raw": "4" },
                    { "kind": "identifier", "value": "x" },
                    { "kind": "literal", "value": null, "raw": "null" },
                    { "kind": "float", "value": 1.5, "raw": "1.50" },
                ]
            }),
            serde_json::to_value(&node).unwrap()
        );
    }

    #[test]
    fn patterns_compare_by_source() {
        let a = Pattern::new(".*");
        let b = Pattern::new(".*".to_string());

        assert_eq!(a, b);
        assert_eq!(Kind::Regexp, Node::Regexp(a).kind());
    }

    #[test]
    fn patterns_compile_with_lookaround_and_backreferences() {
        let lookahead = Pattern::new("a(?=b)").compile().unwrap();
        assert!(lookahead.is_match("ab").unwrap());
        assert!(!lookahead.is_match("ac").unwrap());

        let repeated = Pattern::new(r"(\w)\1").compile().unwrap();
        assert!(repeated.is_match("xx").unwrap());
        assert!(!repeated.is_match("xy").unwrap());

        assert!(Pattern::new("(").compile().is_err());
    }

    #[test]
    fn integers_outside_i64_are_approximated() {
        assert_eq!(IntegerValue::Exact(-42), IntegerValue::parse("-42"));
        assert_eq!(
            IntegerValue::Approximate(12345678901234567890.0),
            IntegerValue::parse("12345678901234567890")
        );

        let node = Node::Integer {
            value: IntegerValue::parse("+99999999999999999999"),
            raw: "+99999999999999999999".into(),
        };
        assert_eq!(
            json!({ "kind": "integer", "value": 1e20, "raw": "+99999999999999999999" }),
            serde_json::to_value(&node).unwrap()
        );
    }
}

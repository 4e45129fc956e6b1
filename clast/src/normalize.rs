use nom::{
    branch::alt,
    bytes::complete::tag,
    combinator::value,
    error::{ErrorKind, ParseError},
    IResult,
};

const FIRST_ANONYMOUS_ARGUMENT: &str = "%";

fn special_name(ch: char) -> Option<&'static str> {
    match ch {
        '!' => Some("_BANG_"),
        '%' => Some("_PERCENT_"),
        '*' => Some("_STAR_"),
        '+' => Some("_PLUS_"),
        '/' => Some("_SLASH_"),
        '<' => Some("_LT_"),
        '=' => Some("_EQ_"),
        '>' => Some("_GT_"),
        '?' => Some("_QMARK_"),
        '-' => Some("_"),
        _ => None,
    }
}

fn special_char<'a, E: ParseError<&'a str>>(i: &'a str) -> IResult<&'a str, char, E> {
    alt((
        value('!', tag("_BANG_")),
        value('%', tag("_PERCENT_")),
        value('*', tag("_STAR_")),
        value('+', tag("_PLUS_")),
        value('/', tag("_SLASH_")),
        value('<', tag("_LT_")),
        value('=', tag("_EQ_")),
        value('>', tag("_GT_")),
        value('?', tag("_QMARK_")),
        value('-', tag("_")),
    ))(i)
}

/// Rewrites symbolic characters into identifier-safe names, `yolo->` becoming
/// `yolo__GT_`. A lone `%` is the first anonymous argument and becomes
/// `_PERCENT_1`.
pub fn normalize(name: &str) -> String {
    let name = if name == FIRST_ANONYMOUS_ARGUMENT {
        "_PERCENT_1"
    } else {
        name
    };

    name.chars().fold(String::with_capacity(name.len()), |mut out, ch| {
        match special_name(ch) {
            Some(special) => out.push_str(special),
            None => out.push(ch),
        }

        out
    })
}

/// Inverse of [`normalize`] for the names it produces.
pub fn denormalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut rest = name;

    while let Some(ch) = rest.chars().next() {
        match special_char::<(&str, ErrorKind)>(rest) {
            Ok((remaining, original)) => {
                out.push(original);
                rest = remaining;
            }
            Err(_) => {
                out.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }

    out
}

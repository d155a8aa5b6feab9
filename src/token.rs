use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;

/// The token classes of the filter language, in match priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    /// An identifier, keyword, or bare `*`, optionally prefixed by `-`.
    Ident,
    /// A parenthesized value list with no nested parentheses.
    List,
    /// A single- or double-quoted literal, quotes included.
    QuotedLiteral,
    /// A floating point numeric constant.
    Float,
    /// An integer numeric constant.
    Int,
    /// A run of operator symbols (`! ~ = : < > .`).
    OperatorSymbols,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) text: String,
    pub(crate) pos: usize,
}

static TOKEN_RULES: LazyLock<Vec<(TokenKind, Regex)>> = LazyLock::new(|| {
    vec![
        (TokenKind::Ident, Regex::new(r"^(?:-?[A-Za-z*]+|\*)").unwrap()),
        (TokenKind::List, Regex::new(r"^\([^()]*\)").unwrap()),
        (
            TokenKind::QuotedLiteral,
            Regex::new(r#"^(?:"[^"]*"|'[^']*')"#).unwrap(),
        ),
        (
            TokenKind::Float,
            Regex::new(r"^[-+]?(?:\d+\.\d*|\.\d+)(?:[eE][-+]?\d+)?").unwrap(),
        ),
        (TokenKind::Int, Regex::new(r"^[-+]?\d+").unwrap()),
        (TokenKind::OperatorSymbols, Regex::new(r"^[!~=:<>.]+").unwrap()),
    ]
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s+").unwrap());

/// Lex the (already pre-tokenized) input. At each position the token
/// classes are tried in priority order and the first match wins;
/// whitespace is elided.
pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, Error> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < input.len() {
        let rest = &input[pos..];
        if let Some(matched) = WHITESPACE.find(rest) {
            pos += matched.end();
            continue;
        }
        let Some((kind, matched)) = TOKEN_RULES
            .iter()
            .find_map(|(kind, pattern)| pattern.find(rest).map(|matched| (*kind, matched)))
        else {
            let ch = rest.chars().next().unwrap_or_default();
            return Err(Error::UnsupportedCharacter { ch, pos });
        };
        tokens.push(Token {
            kind,
            text: matched.as_str().to_string(),
            pos,
        });
        pos += matched.end();
    }
    Ok(tokens)
}

fn is_operator(ch: char) -> bool {
    matches!(ch, ':' | '=' | '<' | '>' | '~' | '(')
}

/// Wrap bare right-hand-side values in double quotes so the lexer sees a
/// uniform shape, e.g. `name:appgate*` becomes `name:"appgate*"`.
///
/// Values that already start with a quote, a sign, a digit or `*` are left
/// alone; spaces between an operator and its value are dropped. Idempotent
/// on already-quoted input.
pub(crate) fn quote_string_values(filter: &str) -> String {
    let mut out = String::with_capacity(filter.len() + 64);
    let mut wrap = false;
    let mut operator = false;
    let mut in_quotes = false;
    let last = filter.char_indices().last().map(|(i, _)| i).unwrap_or(0);
    for (i, ch) in filter.char_indices() {
        if ch == '\'' || ch == '"' {
            in_quotes = !in_quotes;
        }

        if in_quotes {
            out.push(ch);
            continue;
        }

        if is_operator(ch) {
            operator = true;
            out.push(ch);
        } else if operator {
            if ch == ' ' && !wrap {
                continue;
            }
            if ch == '*' || ch == '\'' || ch == '"' || ch == '-' || ch == '+' || ch.is_numeric() {
                out.push(ch);
            } else {
                out.push('"');
                out.push(ch);
                wrap = true;
            }
            operator = false;
        } else if wrap {
            if ch == ' ' {
                out.push('"');
                out.push(ch);
                wrap = false;
            } else if i == last {
                out.push(ch);
                out.push('"');
                wrap = false;
            } else {
                out.push(ch);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

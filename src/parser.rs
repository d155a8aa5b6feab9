use crate::{
    error::Error,
    filter::{Filter, LogicalOp, Operand, Operator, Term, ValuesList},
    token::{Token, TokenKind},
    value::{unquote, Value},
};

/// Separators tried against a list body, in order. The first one that
/// splits the body into more than one token wins.
const LIST_SEPARATORS: [char; 4] = ['\t', '\n', ' ', ','];

pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// ```text
    /// <filter> = <term>+
    /// ```
    pub(crate) fn parse_filter(&mut self) -> Result<Filter, Error> {
        let mut terms = vec![self.parse_term()?];
        while self.peek().is_some() {
            terms.push(self.parse_term()?);
        }
        Ok(Filter { terms })
    }

    /// ```text
    /// <term> = (['NOT'] <ident> ['.' <ident>] <operator> (<list> | <value>)
    ///          | 'true' | 'false')
    ///          ['AND' | 'OR']
    /// ```
    fn parse_term(&mut self) -> Result<Term, Error> {
        let Some(token) = self.peek().cloned() else {
            return Err(Error::Parse("expected a term, found end of input".to_string()));
        };
        if token.kind != TokenKind::Ident {
            return Err(Error::Parse(format!(
                "expected a key at position {}, found {:?}",
                token.pos, token.text
            )));
        }
        self.advance();

        let mut negation = false;
        let mut key = token.text;
        if key == "NOT" {
            negation = true;
            key = match self.peek() {
                Some(token) if token.kind == TokenKind::Ident => {
                    let text = token.text.clone();
                    self.advance();
                    text
                }
                _ => return Err(Error::Parse("expected a key after NOT".to_string())),
            };
        }

        // A bare boolean that is not used as a key is the substituted result
        // of an already-evaluated sub-expression.
        if !negation
            && (key == "true" || key == "false")
            && !matches!(self.peek(), Some(token) if token.kind == TokenKind::OperatorSymbols)
        {
            let logical = self.parse_logical_op();
            return Ok(Term {
                negation: false,
                key: String::new(),
                attribute_key: None,
                operator: None,
                operand: Operand::SubResult(key == "true"),
                logical,
            });
        }

        let mut attribute_key = None;
        if matches!(self.peek(), Some(token) if token.kind == TokenKind::OperatorSymbols && token.text == ".")
        {
            self.advance();
            attribute_key = match self.peek() {
                Some(token) if token.kind == TokenKind::Ident => {
                    let text = token.text.clone();
                    self.advance();
                    Some(text)
                }
                _ => {
                    return Err(Error::Parse(format!(
                        "expected an attribute key after '.' for key {key:?}"
                    )));
                }
            };
        }

        let operator = match self.peek() {
            Some(token) if token.kind == TokenKind::OperatorSymbols => {
                let Some(operator) = Operator::from_symbol(&token.text) else {
                    return Err(Error::Parse(format!(
                        "invalid operator {:?} at position {}",
                        token.text, token.pos
                    )));
                };
                self.advance();
                operator
            }
            Some(token) => {
                return Err(Error::Parse(format!(
                    "expected an operator at position {}, found {:?}",
                    token.pos, token.text
                )));
            }
            None => {
                return Err(Error::Parse(format!("expected an operator after key {key:?}")));
            }
        };

        let operand = match self.peek().cloned() {
            Some(token) if token.kind == TokenKind::List => {
                self.advance();
                Operand::List(capture_list(&token.text))
            }
            Some(token) if matches!(token.kind, TokenKind::Ident | TokenKind::QuotedLiteral) => {
                self.advance();
                Operand::Single(Value::Literal(token.text))
            }
            Some(token) if matches!(token.kind, TokenKind::Float | TokenKind::Int) => {
                let number = token.text.parse::<f64>().map_err(|err| {
                    Error::Parse(format!("parse number {:?}: {err}", token.text))
                })?;
                self.advance();
                Operand::Single(Value::Number(number))
            }
            Some(token) => {
                return Err(Error::Parse(format!(
                    "expected a value at position {}, found {:?}",
                    token.pos, token.text
                )));
            }
            None => {
                return Err(Error::Parse(format!("expected a value for key {key:?}")));
            }
        };

        let logical = self.parse_logical_op();
        Ok(Term {
            negation,
            key,
            attribute_key,
            operator: Some(operator),
            operand,
            logical,
        })
    }

    fn parse_logical_op(&mut self) -> LogicalOp {
        let logical = match self.peek() {
            Some(token) if token.kind == TokenKind::Ident && token.text == "AND" => LogicalOp::And,
            Some(token) if token.kind == TokenKind::Ident && token.text == "OR" => LogicalOp::Or,
            _ => return LogicalOp::None,
        };
        self.advance();
        logical
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }
}

/// Split a `(...)` list token into its element values.
///
/// The separator is the first of tab, newline, space, comma that yields
/// more than one token; quoted regions are opaque to the split, so
/// `"Intel Skylake" 'foo' 54` is three tokens. Each token is unquoted if
/// fully quoted, parsed as a number if it parses, and kept as a verbatim
/// literal otherwise.
fn capture_list(token_text: &str) -> ValuesList {
    let body = &token_text[1..token_text.len() - 1];
    let mut tokens = Vec::new();
    for sep in LIST_SEPARATORS {
        tokens = split_outside_quotes(body, sep);
        if tokens.len() > 1 {
            break;
        }
    }
    let values = tokens
        .into_iter()
        .map(|token| {
            if let Some(unquoted) = unquote(&token) {
                Value::Literal(unquoted)
            } else if let Ok(number) = token.parse::<f64>() {
                Value::Number(number)
            } else {
                Value::Literal(token)
            }
        })
        .collect();
    ValuesList { values }
}

fn split_outside_quotes(body: &str, sep: char) -> Vec<String> {
    let chars: Vec<char> = body.chars().collect();
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        if ch == '"' || ch == '\'' {
            // A closed quoted region is one fragment, separators included.
            if let Some(end) = chars[i + 1..].iter().position(|&c| c == ch) {
                current.extend(&chars[i..=i + 1 + end]);
                i += end + 2;
                continue;
            }
        }
        if ch == sep {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            current.push(ch);
        }
        i += 1;
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

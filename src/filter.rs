use std::fmt::{self, Display};

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    parser::Parser,
    token::{quote_string_values, tokenize},
    value::{unquote, wildcard_to_regexp, Value},
};

/// A parsed filter: an ordered, non-empty sequence of terms.
///
/// Insertion order is significant; the evaluator scans left to right. The
/// tree is compiled in place right after parsing and not mutated during
/// evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub(crate) terms: Vec<Term>,
}

impl Filter {
    /// Parse and compile one parenthesis-free filter fragment.
    ///
    /// The input is pre-tokenized first, so bare right-hand-side values are
    /// accepted:
    ///
    /// ```rust
    /// use gcloud_filter::Filter;
    ///
    /// let filter = Filter::parse("labels.volume:medium OR labels.color:red").unwrap();
    /// assert_eq!(filter.terms().len(), 2);
    /// ```
    pub fn parse(input: &str) -> Result<Self, Error> {
        let tokens = tokenize(&quote_string_values(input))?;
        let mut filter = Parser::new(tokens).parse_filter()?;
        filter.compile();
        Ok(filter)
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Normalize the parsed terms in place: hoist `-key` negations, strip
    /// quotes from single values, and expand `:` operands into anchored
    /// regexes.
    fn compile(&mut self) {
        for term in &mut self.terms {
            if matches!(term.operand, Operand::SubResult(_)) {
                continue;
            }
            if let Some(key) = term.key.strip_prefix('-') {
                term.key = key.to_string();
                term.negation = !term.negation;
            }
            term.unquote();
            term.expand_simple_patterns();
        }
    }
}

/// Renders the canonical JSON form of the compiled filter.
impl Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(err) => write!(f, "{err}"),
        }
    }
}

/// One `key op value` unit with optional leading negation and trailing
/// logical connective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    /// True if the term was prefixed by `NOT` or the key began with `-`.
    /// The two compose; doubled negation cancels.
    #[serde(default, skip_serializing_if = "is_false")]
    pub(crate) negation: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub(crate) key: String,
    /// The sub-key after a dot: `labels.color` has key `labels` and
    /// attribute key `color`.
    #[serde(
        rename = "attribute-key",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub(crate) attribute_key: Option<String>,
    /// Present on every term except substituted sub-expression results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) operator: Option<Operator>,
    #[serde(flatten)]
    pub(crate) operand: Operand,
    #[serde(
        rename = "logical-operator",
        default,
        skip_serializing_if = "LogicalOp::is_none"
    )]
    pub(crate) logical: LogicalOp,
}

fn is_false(value: &bool) -> bool {
    !value
}

impl Term {
    pub fn negation(&self) -> bool {
        self.negation
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn attribute_key(&self) -> Option<&str> {
        self.attribute_key.as_deref()
    }

    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    pub fn logical(&self) -> LogicalOp {
        self.logical
    }

    /// The operand values in source order; empty for substituted
    /// sub-expression results.
    pub fn operand_values(&self) -> &[Value] {
        match &self.operand {
            Operand::Single(value) => std::slice::from_ref(value),
            Operand::List(list) => &list.values,
            Operand::SubResult(_) => &[],
        }
    }

    /// The leading operand value, for adapters that project a record
    /// differently for literal and numeric filters.
    pub fn first_operand_value(&self) -> Option<&Value> {
        self.operand_values().first()
    }

    /// True for the `mapKey.subKey:*` form that tests for presence of a
    /// sub-key independent of its value.
    pub fn is_existence_check(&self) -> bool {
        matches!(&self.operand, Operand::Single(Value::Literal(literal)) if literal == "*")
    }

    /// Compare a record projection against each operand value, true on the
    /// first match. The record side is parsed numerically when the filter
    /// value is numeric.
    pub fn evaluate(&self, record_value: &str) -> Result<bool, Error> {
        let Some(operator) = self.operator else {
            return Err(Error::InvalidOperand(
                "term has no comparison operator".to_string(),
            ));
        };
        let mut result = false;
        for filter_value in self.operand_values() {
            let record = match filter_value {
                Value::Number(_) => {
                    let number = record_value.parse::<f64>().map_err(|_| {
                        Error::InvalidOperand(format!(
                            "cannot compare {record_value:?} against a numeric value"
                        ))
                    })?;
                    Value::Number(number)
                }
                Value::Literal(_) => Value::Literal(record_value.to_string()),
            };
            result = record.compare(operator, filter_value)?;
            if result {
                break;
            }
        }
        Ok(result)
    }

    /// Like [`Term::evaluate`] for time-typed keys. Every filter value must
    /// be a literal in RFC 3339 form; the comparison itself stays textual,
    /// since RFC 3339 strings order chronologically.
    pub fn evaluate_timestamp(&self, record_time: &str) -> Result<bool, Error> {
        let Some(operator) = self.operator else {
            return Err(Error::InvalidOperand(
                "term has no comparison operator".to_string(),
            ));
        };
        let record = Value::Literal(record_time.to_string());
        let mut result = false;
        for filter_value in self.operand_values() {
            let Value::Literal(literal) = filter_value else {
                return Err(Error::InvalidOperand(
                    "timestamps can only be compared with RFC3339 time literals".to_string(),
                ));
            };
            DateTime::parse_from_rfc3339(literal).map_err(|err| {
                Error::InvalidOperand(format!("parse {literal:?} as RFC3339: {err}"))
            })?;
            result = record.compare(operator, filter_value)?;
            if result {
                break;
            }
        }
        Ok(result)
    }

    fn unquote(&mut self) {
        // List elements are already unquoted at capture time.
        if let Operand::Single(Value::Literal(literal)) = &mut self.operand {
            if let Some(unquoted) = unquote(literal) {
                *literal = unquoted;
            }
        }
    }

    fn expand_simple_patterns(&mut self) {
        if self.operator != Some(Operator::Colon) {
            return;
        }
        for value in self.operand_values_mut() {
            if let Value::Literal(literal) = value {
                // A bare `*` is the existence sentinel; leave it alone.
                if literal != "*" {
                    *literal = wildcard_to_regexp(literal);
                }
            }
        }
    }

    fn operand_values_mut(&mut self) -> &mut [Value] {
        match &mut self.operand {
            Operand::Single(value) => std::slice::from_mut(value),
            Operand::List(list) => &mut list.values,
            Operand::SubResult(_) => &mut [],
        }
    }
}

/// The right-hand side of a term: a single value, a parenthesized value
/// list, or the substituted result of an already-evaluated sub-expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    #[serde(rename = "value")]
    Single(Value),
    #[serde(rename = "values")]
    List(ValuesList),
    #[serde(rename = "subexpression-result")]
    SubResult(bool),
}

/// A parenthesized list of values. A term with a list operand is true when
/// any element compares true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuesList {
    pub(crate) values: Vec<Value>,
}

impl ValuesList {
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    /// `:`, the case-insensitive simple-pattern match.
    #[serde(rename = ":")]
    Colon,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = ">")]
    Gt,
    /// `~`, the case-sensitive regex match.
    #[serde(rename = "~")]
    Regex,
    /// `!~`, the negated case-sensitive regex match.
    #[serde(rename = "!~")]
    NotRegex,
}

impl Operator {
    pub(crate) fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            ":" => Self::Colon,
            "=" => Self::Eq,
            "!=" => Self::Ne,
            "<" => Self::Lt,
            "<=" => Self::Le,
            ">=" => Self::Ge,
            ">" => Self::Gt,
            "~" => Self::Regex,
            "!~" => Self::NotRegex,
            _ => return None,
        })
    }
}

/// The connector between a term and its right neighbor. `None` both on the
/// final term and on implicit juxtaposition, which denotes conjunction but
/// binds looser than an explicit `OR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogicalOp {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl LogicalOp {
    pub fn is_none(&self) -> bool {
        *self == LogicalOp::None
    }
}

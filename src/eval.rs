use crate::{
    error::Error,
    filter::{Filter, LogicalOp, Operand},
    resources::Resource,
};

/// Find the innermost parenthesized sub-expression.
///
/// Value lists (a `(` immediately following `:` or `=`) and anything inside
/// quotes are not expression groups. Returns `None` when no grouping
/// parentheses remain.
pub(crate) fn extract_innermost_expression(filter: &str) -> Result<Option<String>, Error> {
    let mut open = Vec::new();
    let mut close = Vec::new();
    let mut list_value = false;
    let mut quoted = false;
    let mut prev = None;
    for (i, ch) in filter.char_indices() {
        match ch {
            '(' => {
                if matches!(prev, Some(':') | Some('=')) {
                    list_value = true;
                } else if !quoted {
                    open.push(i);
                }
            }
            ')' => {
                if list_value {
                    list_value = false;
                } else if !quoted {
                    close.push(i);
                }
            }
            '"' | '\'' => quoted = !quoted,
            _ => {}
        }
        prev = Some(ch);
    }

    if open.is_empty() && close.is_empty() {
        return Ok(None);
    }
    if open.len() != close.len() {
        return Err(Error::UnbalancedParentheses);
    }
    let innermost_open = open[open.len() - 1];
    for &innermost_close in &close {
        if innermost_close > innermost_open {
            return Ok(Some(
                filter[innermost_open + 1..innermost_close].to_string(),
            ));
        }
    }
    Err(Error::UnbalancedParentheses)
}

/// Evaluate a complete filter string against one record.
///
/// Parenthesized sub-expressions are resolved innermost first: each one is
/// evaluated on its own and the literal `true`/`false` is substituted back
/// into the filter string, until none remain.
pub(crate) fn filter_record<R: Resource + ?Sized>(record: &R, filter: &str) -> Result<bool, Error> {
    let mut filter = filter.to_string();
    while let Some(sub_expression) = extract_innermost_expression(&filter)? {
        let result = eval_fragment(record, &sub_expression)?;
        let wrapped = format!("({sub_expression})");
        filter = filter.replacen(&wrapped, if result { "true" } else { "false" }, 1);
    }
    eval_fragment(record, &filter)
}

/// Evaluate one parenthesis-free fragment: parse, compile, evaluate each
/// term through the resource adapter, and combine the results.
fn eval_fragment<R: Resource + ?Sized>(record: &R, fragment: &str) -> Result<bool, Error> {
    let filter = Filter::parse(fragment)?;
    let mut term_results = Vec::with_capacity(filter.terms().len());
    for term in filter.terms() {
        let result = match term.operand() {
            Operand::SubResult(result) => *result,
            _ => {
                let mut result = record.filter_term(term)?;
                if term.negation() {
                    result = !result;
                }
                result
            }
        };
        term_results.push((result, term.logical()));
    }
    Ok(combine_terms(term_results))
}

/// Combine term results left to right.
///
/// Explicit `OR` and `AND` fold immediately and adopt the right term's
/// connector. Juxtaposition also conjoins, except that a juxtaposed term
/// followed by an `OR` run starts a new group; the groups are conjoined at
/// the end, so conjunction binds looser than `OR` and `a OR b c OR d` reads
/// as `(a OR b) AND (c OR d)`.
fn combine_terms(term_results: Vec<(bool, LogicalOp)>) -> bool {
    let mut term_results = term_results.into_iter();
    let Some(mut left) = term_results.next() else {
        return false;
    };
    let mut groups = Vec::new();
    for right in term_results {
        match left.1 {
            LogicalOp::Or => left = (left.0 || right.0, right.1),
            LogicalOp::And => left = (left.0 && right.0, right.1),
            LogicalOp::None if right.1 != LogicalOp::Or => left = (left.0 && right.0, right.1),
            LogicalOp::None => {
                groups.push(left.0);
                left = right;
            }
        }
    }
    groups.into_iter().fold(left.0, |result, group| result && group)
}

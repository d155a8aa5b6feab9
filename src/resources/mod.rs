mod forwarding_rules;
mod instances;
mod projects;

use std::collections::HashMap;

use crate::{error::Error, eval::filter_record, filter::Term};

pub use forwarding_rules::{filter_forwarding_rules, ForwardingRule};
pub use instances::{filter_instances, DisplayDevice, Instance, Scheduling};
pub use projects::{filter_projects, Project, ProjectState};

/// A resource adapter: maps a term's key (and optional attribute key) to a
/// string projection of the record and delegates the comparison back to
/// [`Term::evaluate`].
///
/// Implementations return the raw term result; the evaluator applies the
/// term's negation afterwards.
pub trait Resource {
    fn filter_term(&self, term: &Term) -> Result<bool, Error>;
}

/// Filter records with a gcloud filter expression, keeping the records the
/// filter matches, in input order.
///
/// The first parse or evaluation error fails the whole call; partial
/// results are never returned.
pub fn filter_resources<R: Resource>(records: Vec<R>, filter: &str) -> Result<Vec<R>, Error> {
    let mut kept = Vec::with_capacity(records.len());
    for record in records {
        if filter_record(&record, filter)? {
            kept.push(record);
        }
    }
    Ok(kept)
}

/// Evaluate a term against a label map: `labels.color:*` is an existence
/// check, `labels.color:red` compares the label value, and an absent label
/// key is simply a non-match.
pub(crate) fn filter_labels(
    labels: &HashMap<String, String>,
    term: &Term,
) -> Result<bool, Error> {
    for (label_key, label_value) in labels {
        if Some(label_key.as_str()) == term.attribute_key() {
            if term.is_existence_check() {
                return Ok(true);
            }
            return term.evaluate(label_value);
        }
    }
    Ok(false)
}

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    filter::Term,
    resources::{filter_labels, filter_resources, Resource},
    value::Value,
};

/// A resource-manager project, shaped like the projects API response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub name: String,
    /// `organizations/<id>` or `folders/<id>`.
    pub parent: String,
    pub project_id: String,
    pub state: ProjectState,
    pub display_name: String,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
    pub delete_time: Option<DateTime<Utc>>,
    pub etag: String,
    pub labels: HashMap<String, String>,
}

/// The lifecycle state of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectState {
    #[default]
    #[serde(rename = "STATE_UNSPECIFIED")]
    Unspecified,
    Active,
    DeleteRequested,
}

impl ProjectState {
    /// The state name, as the API spells it.
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectState::Unspecified => "STATE_UNSPECIFIED",
            ProjectState::Active => "ACTIVE",
            ProjectState::DeleteRequested => "DELETE_REQUESTED",
        }
    }

    /// The numeric form of the state.
    pub fn number(self) -> i32 {
        match self {
            ProjectState::Unspecified => 0,
            ProjectState::Active => 1,
            ProjectState::DeleteRequested => 2,
        }
    }
}

impl Resource for Project {
    fn filter_term(&self, term: &Term) -> Result<bool, Error> {
        // Project keys are case insensitive.
        let key = term.key().to_ascii_lowercase();
        match key.as_str() {
            "parent" => {
                let attribute_key = term.attribute_key().map(str::to_ascii_lowercase);
                match attribute_key.as_deref() {
                    // e.g. parent:folders/123
                    None => term.evaluate(&self.parent),
                    // e.g. parent.type:organizations
                    Some("type") => {
                        term.evaluate(self.parent.split('/').next().unwrap_or_default())
                    }
                    // e.g. parent.id:123
                    Some("id") => {
                        let mut parts = self.parent.splitn(2, '/');
                        parts.next();
                        let Some(parent_id) = parts.next() else {
                            return Err(Error::InvalidResource(format!(
                                "invalid project parent {:?}",
                                self.parent
                            )));
                        };
                        term.evaluate(parent_id)
                    }
                    Some(_) => Err(Error::UnknownAttributeKey {
                        key: term.attribute_key().unwrap_or_default().to_string(),
                    }),
                }
            }
            // e.g. id:appgate-dev
            "id" | "projectid" => term.evaluate(&self.project_id),
            "state" | "lifecyclestate" => match term.first_operand_value() {
                // e.g. state=ACTIVE
                Some(Value::Literal(_)) => term.evaluate(self.state.as_str()),
                // e.g. state>=1
                _ => term.evaluate(&self.state.number().to_string()),
            },
            "displayname" | "name" => term.evaluate(&self.display_name),
            "createtime" => term.evaluate_timestamp(&rfc3339(self.create_time)),
            "updatetime" => term.evaluate_timestamp(&rfc3339(self.update_time)),
            "deletetime" => term.evaluate_timestamp(&rfc3339(self.delete_time)),
            "etag" => term.evaluate(&self.etag),
            // e.g. labels.color:red, labels.color:*, -labels.color:red
            "labels" => filter_labels(&self.labels, term),
            _ => Err(Error::UnknownKey {
                key: term.key().to_string(),
            }),
        }
    }
}

fn rfc3339(time: Option<DateTime<Utc>>) -> String {
    time.unwrap_or(DateTime::UNIX_EPOCH)
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Filter projects with a gcloud filter expression.
///
/// The grammar and syntax are specified at
/// <https://cloud.google.com/sdk/gcloud/reference/topic/filters>.
pub fn filter_projects(projects: Vec<Project>, filter: &str) -> Result<Vec<Project>, Error> {
    filter_resources(projects, filter)
}

//! Filter cloud resources with the gcloud CLI filter expression language.
//!
//! The grammar and semantics follow the gcloud `topic filters` reference:
//! terms of the form `key operator value`, negation with `NOT` or a leading
//! `-`, parenthesized value lists and sub-expressions, and `AND`/`OR`
//! connectives where implicit conjunction binds looser than an explicit
//! `OR`.
//!
//! ```rust
//! use gcloud_filter::{filter_projects, Project};
//!
//! let projects = vec![
//!     Project {
//!         project_id: "appgate-dev".to_string(),
//!         ..Project::default()
//!     },
//!     Project {
//!         project_id: "devops-test".to_string(),
//!         ..Project::default()
//!     },
//! ];
//! let kept = filter_projects(projects, "id:appgate*").unwrap();
//! assert_eq!(kept.len(), 1);
//! assert_eq!(kept[0].project_id, "appgate-dev");
//! ```

mod error;
mod eval;
mod filter;
mod parser;
mod resources;
mod token;
mod value;

pub use error::Error;
pub use filter::{Filter, LogicalOp, Operand, Operator, Term, ValuesList};
pub use resources::{
    filter_forwarding_rules, filter_instances, filter_projects, filter_resources, DisplayDevice,
    ForwardingRule, Instance, Project, ProjectState, Resource, Scheduling,
};
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;

    /// A minimal adapter showing how user-defined resource types plug in.
    struct Bucket {
        name: String,
        location: String,
    }

    impl Resource for Bucket {
        fn filter_term(&self, term: &Term) -> Result<bool, Error> {
            match term.key().to_ascii_lowercase().as_str() {
                "name" => term.evaluate(&self.name),
                "location" => term.evaluate(&self.location),
                _ => Err(Error::UnknownKey {
                    key: term.key().to_string(),
                }),
            }
        }
    }

    #[test]
    fn test_filter_resources_with_a_custom_adapter() {
        let buckets = vec![
            Bucket {
                name: "cold-archive".to_string(),
                location: "europe-west1".to_string(),
            },
            Bucket {
                name: "hot-cache".to_string(),
                location: "us-central1".to_string(),
            },
        ];
        let kept =
            filter_resources(buckets, "location ~ europe* OR name:hot*").unwrap();
        let names: Vec<&str> = kept.iter().map(|bucket| bucket.name.as_str()).collect();
        assert_eq!(names, vec!["cold-archive", "hot-cache"]);

        let buckets = vec![Bucket {
            name: "cold-archive".to_string(),
            location: "europe-west1".to_string(),
        }];
        assert!(matches!(
            filter_resources(buckets, "size>5"),
            Err(Error::UnknownKey { .. })
        ));
    }

    #[test]
    fn test_negation_involution() {
        let projects = vec![Project {
            project_id: "appgate-dev".to_string(),
            labels: std::collections::HashMap::from([(
                "volume".to_string(),
                "big".to_string(),
            )]),
            ..Project::default()
        }];

        let positive = filter_projects(projects.clone(), "labels.volume:*").unwrap();
        let double_negative = filter_projects(projects.clone(), "NOT -labels.volume:*").unwrap();
        assert_eq!(positive, double_negative);

        let negative = filter_projects(projects.clone(), "-labels.volume:*").unwrap();
        assert!(negative.is_empty());
        let spelled_out = filter_projects(projects, "NOT labels.volume:*").unwrap();
        assert_eq!(negative, spelled_out);
    }

    #[test]
    fn test_list_operands_match_their_spelled_out_disjunction() {
        let projects: Vec<Project> = ["red", "blue", "green"]
            .iter()
            .map(|color| Project {
                project_id: format!("{color}-project"),
                labels: std::collections::HashMap::from([(
                    "color".to_string(),
                    color.to_string(),
                )]),
                ..Project::default()
            })
            .collect();

        let with_list = filter_projects(projects.clone(), "labels.color:(red blue)").unwrap();
        let spelled_out =
            filter_projects(projects, "labels.color:red OR labels.color:blue").unwrap();
        assert_eq!(with_list, spelled_out);
        assert_eq!(with_list.len(), 2);
    }
}

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    filter::Term,
    resources::{filter_labels, filter_resources, Resource},
};

/// A forwarding rule, shaped like the forwarding-rules API response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForwardingRule {
    pub name: String,
    pub id: u64,
    pub kind: String,
    pub description: String,
    #[serde(rename = "IPProtocol")]
    pub ip_protocol: String,
    pub ip_version: String,
    pub backend_service: String,
    pub creation_timestamp: String,
    pub fingerprint: String,
    pub label_fingerprint: String,
    pub labels: HashMap<String, String>,
    pub load_balancing_scheme: String,
    pub network: String,
    pub network_tier: String,
    pub port_range: String,
    pub ports: Vec<String>,
    pub region: String,
    pub self_link: String,
    pub subnetwork: String,
    pub target: String,
}

/// Forwarding-rule keys are case sensitive, as the compute API spells them.
impl Resource for ForwardingRule {
    fn filter_term(&self, term: &Term) -> Result<bool, Error> {
        match term.key() {
            "ipProtocol" => term.evaluate(&self.ip_protocol),
            "backendService" => term.evaluate(&self.backend_service),
            "creationTimestamp" => term.evaluate(&self.creation_timestamp),
            "description" => term.evaluate(&self.description),
            "fingerprint" => term.evaluate(&self.fingerprint),
            "id" => term.evaluate(&self.id.to_string()),
            "ipVersion" => term.evaluate(&self.ip_version),
            "kind" => term.evaluate(&self.kind),
            "labelFingerprint" => term.evaluate(&self.label_fingerprint),
            "labels" => filter_labels(&self.labels, term),
            "loadBalancingScheme" => term.evaluate(&self.load_balancing_scheme),
            "name" => term.evaluate(&self.name),
            "networkTier" => term.evaluate(&self.network_tier),
            "portRange" => term.evaluate(&self.port_range),
            "ports" => {
                if self.ports.len() == 1 {
                    return term.evaluate(&self.ports[0]);
                }
                Err(Error::InvalidResource(format!(
                    "expected 1 port, found {:?}",
                    self.ports
                )))
            }
            "region" => term.evaluate(&self.region),
            "selfLink" => term.evaluate(&self.self_link),
            "subnetwork" => term.evaluate(&self.subnetwork),
            "target" => term.evaluate(&self.target),
            _ => Err(Error::UnknownKey {
                key: term.key().to_string(),
            }),
        }
    }
}

/// Filter forwarding rules with a gcloud filter expression.
pub fn filter_forwarding_rules(
    forwarding_rules: Vec<ForwardingRule>,
    filter: &str,
) -> Result<Vec<ForwardingRule>, Error> {
    filter_resources(forwarding_rules, filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_forwarding_rules() -> Vec<ForwardingRule> {
        vec![
            ForwardingRule {
                ip_protocol: "UDP".to_string(),
                backend_service:
                    "https://www.googleapis.com/compute/v1/projects/appgate-dev/regions/europe-west1/backendServices/lbudp"
                        .to_string(),
                creation_timestamp: "2023-12-01T03:52:49.415-08:00".to_string(),
                description: "Foo".to_string(),
                fingerprint: "A71Q0eYvEDM=".to_string(),
                id: 5457014917771327486,
                ip_version: "IPV4".to_string(),
                kind: "compute#forwardingRule".to_string(),
                label_fingerprint: "42WmSpB8rSM=".to_string(),
                load_balancing_scheme: "INTERNAL".to_string(),
                name: "lbudp-forwarding-rule-2".to_string(),
                region:
                    "https://www.googleapis.com/compute/v1/projects/appgate-dev/regions/europe-west1"
                        .to_string(),
                ports: vec!["8081".to_string()],
                network:
                    "https://www.googleapis.com/compute/v1/projects/appgate-dev/global/networks/default"
                        .to_string(),
                network_tier: "PREMIUM".to_string(),
                labels: HashMap::from([
                    ("foo".to_string(), "boo".to_string()),
                    ("color".to_string(), "green".to_string()),
                ]),
                ..ForwardingRule::default()
            },
            ForwardingRule {
                ip_protocol: "TCP".to_string(),
                target:
                    "https://www.googleapis.com/compute/v1/projects/appgate-dev/global/targetHttpProxies/testlbhttp-target-proxy"
                        .to_string(),
                creation_timestamp: "2023-10-24T02:06:40.108-07:00".to_string(),
                description: "Boo".to_string(),
                fingerprint: "t3mSldSZEF8=".to_string(),
                id: 1360066178417571791,
                ip_version: "IPV4".to_string(),
                kind: "compute#forwardingRule".to_string(),
                label_fingerprint: "42WmSpB8rSM=".to_string(),
                load_balancing_scheme: "EXTERNAL_MANAGED".to_string(),
                name: "testlbip".to_string(),
                port_range: "80-80".to_string(),
                network_tier: "PREMIUM".to_string(),
                labels: HashMap::from([
                    ("goo".to_string(), "koo".to_string()),
                    ("color".to_string(), "purple".to_string()),
                ]),
                ..ForwardingRule::default()
            },
        ]
    }

    fn rule_names(rules: &[ForwardingRule]) -> Vec<&str> {
        rules.iter().map(|rule| rule.name.as_str()).collect()
    }

    #[test]
    fn test_filter_forwarding_rules() {
        let cases: Vec<(&str, &str, Vec<&str>)> = vec![
            (
                "complex with nested subexpressions",
                r#"labels.goo:foo OR ((((true))) id:"1360066178417571791" ipVersion:"IPV4" AND portRange:"80-80") ipProtocol:"TCP*" labels.color:purple name:testlb* AND NOT labels.smell:* labels.goo:*"#,
                vec!["testlbip"],
            ),
            (
                "protocol and scheme",
                "ipProtocol=UDP AND loadBalancingScheme=INTERNAL networkTier:PREMIUM",
                vec!["lbudp-forwarding-rule-2"],
            ),
            (
                "region wildcard",
                r#"region:"*europe-west1*""#,
                vec!["lbudp-forwarding-rule-2"],
            ),
        ];
        for (name, filter, want) in cases {
            let got = filter_forwarding_rules(test_forwarding_rules(), filter)
                .unwrap_or_else(|err| panic!("{name}: {err}"));
            assert_eq!(rule_names(&got), want, "{name}");
        }
    }

    #[test]
    fn test_filter_forwarding_rules_single_port_rule() {
        // The second rule carries no ports, so a ports term fails the batch.
        let err = filter_forwarding_rules(test_forwarding_rules(), "ports:8081").unwrap_err();
        assert!(matches!(err, Error::InvalidResource(_)));

        let rules: Vec<ForwardingRule> = test_forwarding_rules().into_iter().take(1).collect();
        let got = filter_forwarding_rules(rules, "ports:8081").unwrap();
        assert_eq!(rule_names(&got), vec!["lbudp-forwarding-rule-2"]);
    }

    #[test]
    fn test_filter_forwarding_rules_unknown_key() {
        let err = filter_forwarding_rules(test_forwarding_rules(), "portrange:80-80").unwrap_err();
        assert!(matches!(err, Error::UnknownKey { key } if key == "portrange"));
    }
}

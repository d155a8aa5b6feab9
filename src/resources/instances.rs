use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    filter::Term,
    resources::{filter_labels, filter_resources, Resource},
};

/// A compute instance, shaped like the instances API response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Instance {
    pub name: String,
    pub id: u64,
    pub kind: String,
    pub description: String,
    pub can_ip_forward: bool,
    pub cpu_platform: String,
    pub creation_timestamp: String,
    pub deletion_protection: bool,
    pub display_device: Option<DisplayDevice>,
    pub fingerprint: String,
    pub label_fingerprint: String,
    pub labels: HashMap<String, String>,
    pub last_start_timestamp: String,
    pub last_stop_timestamp: String,
    pub machine_type: String,
    pub scheduling: Option<Scheduling>,
    pub self_link: String,
    pub start_restricted: bool,
    pub status: String,
    pub zone: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplayDevice {
    pub enable_display: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scheduling {
    pub on_host_maintenance: String,
    pub provisioning_model: String,
    pub automatic_restart: bool,
    pub preemptible: bool,
}

/// Instance keys are case sensitive, as the compute API spells them.
impl Resource for Instance {
    fn filter_term(&self, term: &Term) -> Result<bool, Error> {
        match term.key() {
            "canIpForward" => term.evaluate(&self.can_ip_forward.to_string()),
            "cpuPlatform" => term.evaluate(&self.cpu_platform),
            "creationTimestamp" => term.evaluate(&self.creation_timestamp),
            "deletionProtection" => term.evaluate(&self.deletion_protection.to_string()),
            "description" => term.evaluate(&self.description),
            "displayDevice" => {
                if term.attribute_key() != Some("enableDisplay") {
                    return Err(Error::UnknownAttributeKey {
                        key: term.attribute_key().unwrap_or_default().to_string(),
                    });
                }
                if term.is_existence_check() {
                    return Ok(true);
                }
                let enable_display = self
                    .display_device
                    .as_ref()
                    .is_some_and(|device| device.enable_display);
                term.evaluate(&enable_display.to_string())
            }
            "fingerprint" => term.evaluate(&self.fingerprint),
            "id" => term.evaluate(&self.id.to_string()),
            "kind" => term.evaluate(&self.kind),
            "labelFingerprint" => term.evaluate(&self.label_fingerprint),
            "labels" => filter_labels(&self.labels, term),
            "lastStartTimestamp" => term.evaluate(&self.last_start_timestamp),
            "lastStopTimestamp" => term.evaluate(&self.last_stop_timestamp),
            "machineType" => term.evaluate(&self.machine_type),
            "name" => term.evaluate(&self.name),
            "scheduling" => {
                let scheduling = self.scheduling.clone().unwrap_or_default();
                let value = match term.attribute_key() {
                    Some("onHostMaintenance") => scheduling.on_host_maintenance,
                    Some("provisioningModel") => scheduling.provisioning_model,
                    Some("automaticRestart") => scheduling.automatic_restart.to_string(),
                    Some("preemptible") => scheduling.preemptible.to_string(),
                    _ => {
                        return Err(Error::UnknownAttributeKey {
                            key: term.attribute_key().unwrap_or_default().to_string(),
                        });
                    }
                };
                if term.is_existence_check() {
                    return Ok(true);
                }
                term.evaluate(&value)
            }
            "selfLink" => term.evaluate(&self.self_link),
            "startRestricted" => term.evaluate(&self.start_restricted.to_string()),
            "status" => term.evaluate(&self.status),
            "zone" => term.evaluate(&self.zone),
            _ => Err(Error::UnknownKey {
                key: term.key().to_string(),
            }),
        }
    }
}

/// Filter compute instances with a gcloud filter expression.
pub fn filter_instances(instances: Vec<Instance>, filter: &str) -> Result<Vec<Instance>, Error> {
    filter_resources(instances, filter)
}

// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Status conditions keyed by type.
//!
//! `ConditionList::update` reports whether anything changed, which is what
//! decides if a status write is needed.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, schemars::JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
}

impl From<bool> for ConditionStatus {
    fn from(value: bool) -> Self {
        if value {
            ConditionStatus::True
        } else {
            ConditionStatus::False
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: ConditionStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub last_update_time: Option<Time>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub last_transition_time: Option<Time>,
}

impl Condition {
    pub fn is_true(&self) -> bool {
        self.status == ConditionStatus::True
    }

    fn matches(&self, status: ConditionStatus, reason: &str, message: &str) -> bool {
        self.status == status && self.reason == reason && self.message == message
    }
}

/// Conditions of a resource, at most one per type, serialized as a list ordered by type
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(from = "Vec<Condition>", into = "Vec<Condition>")]
pub struct ConditionList {
    by_type: BTreeMap<String, Condition>,
}

impl ConditionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the condition of the given type. Returns true when the stored
    /// condition was added or any of status, reason or message changed.
    pub fn update(&mut self, condition_type: &str, is_true: bool, reason: &str, message: &str) -> bool {
        let status = ConditionStatus::from(is_true);
        let now = Time(chrono::Utc::now());

        match self.by_type.get_mut(condition_type) {
            Some(existing) if existing.matches(status, reason, message) => false,
            Some(existing) => {
                if existing.status != status {
                    existing.last_transition_time = Some(now.clone());
                }
                existing.status = status;
                existing.reason = reason.to_string();
                existing.message = message.to_string();
                existing.last_update_time = Some(now);
                true
            }
            None => {
                self.by_type.insert(
                    condition_type.to_string(),
                    Condition {
                        condition_type: condition_type.to_string(),
                        status,
                        reason: reason.to_string(),
                        message: message.to_string(),
                        last_update_time: Some(now.clone()),
                        last_transition_time: Some(now),
                    },
                );
                true
            }
        }
    }

    pub fn get(&self, condition_type: &str) -> Option<&Condition> {
        self.by_type.get(condition_type)
    }

    pub fn is_true(&self, condition_type: &str) -> bool {
        self.get(condition_type).is_some_and(Condition::is_true)
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}

impl From<Vec<Condition>> for ConditionList {
    fn from(conditions: Vec<Condition>) -> Self {
        Self {
            by_type: conditions
                .into_iter()
                .map(|c| (c.condition_type.clone(), c))
                .collect(),
        }
    }
}

impl From<ConditionList> for Vec<Condition> {
    fn from(list: ConditionList) -> Self {
        list.by_type.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_unseen_type_reports_change() {
        let mut conditions = ConditionList::new();
        assert!(conditions.update("Configured", true, "Active", "all good"));
        assert!(conditions.is_true("Configured"));
    }

    #[test]
    fn test_identical_update_is_noop() {
        let mut conditions = ConditionList::new();
        conditions.update("Configured", false, "Inactive", "not yet");
        let before = conditions.clone();

        assert!(!conditions.update("Configured", false, "Inactive", "not yet"));
        assert_eq!(conditions, before);
    }

    #[test]
    fn test_reason_change_reports_change_without_transition() {
        let mut conditions = ConditionList::new();
        conditions.update("Configured", false, "Inactive", "not yet");
        let transition = conditions.get("Configured").unwrap().last_transition_time.clone();

        assert!(conditions.update("Configured", false, "Invalid", "wrong source"));

        let condition = conditions.get("Configured").unwrap();
        assert_eq!(condition.reason, "Invalid");
        assert_eq!(condition.last_transition_time, transition);
    }

    #[test]
    fn test_message_change_reports_change() {
        let mut conditions = ConditionList::new();
        conditions.update("Configured", true, "Active", "one");
        assert!(conditions.update("Configured", true, "Active", "two"));
    }

    #[test]
    fn test_status_flip_reports_change() {
        let mut conditions = ConditionList::new();
        conditions.update("Configured", true, "Active", "ok");
        assert!(conditions.update("Configured", false, "Active", "ok"));
        assert!(!conditions.is_true("Configured"));
    }

    #[test]
    fn test_types_are_independent() {
        let mut conditions = ConditionList::new();
        conditions.update("Configured", true, "Active", "ok");
        assert!(conditions.update("Ready", true, "Ready", "ok"));
        assert!(conditions.is_true("Configured"));
        assert_eq!(conditions.get("Ready").map(|c| c.reason.as_str()), Some("Ready"));
    }

    #[test]
    fn test_serializes_as_list_ordered_by_type() {
        let mut conditions = ConditionList::new();
        conditions.update("Zeta", true, "", "");
        conditions.update("Alpha", false, "Because", "");

        let json = serde_json::to_value(&conditions).unwrap();
        let types: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["type"].as_str().unwrap())
            .collect();
        assert_eq!(types, vec!["Alpha", "Zeta"]);
        assert_eq!(json[0]["status"], "False");
    }

    #[test]
    fn test_deserializes_from_list() {
        let json = serde_json::json!([
            {"type": "Configured", "status": "True", "reason": "Active", "message": "ok"}
        ]);
        let conditions: ConditionList = serde_json::from_value(json).unwrap();
        assert!(conditions.is_true("Configured"));
        assert_eq!(conditions.get("Configured").unwrap().reason, "Active");
    }
}

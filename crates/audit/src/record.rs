//! Decision records for the audit log.

use access::{Action, Decision, Resource, Role, Subject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique identifier for an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the evaluator answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Allow,
    Deny { reason: String },
}

impl Outcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Outcome::Allow)
    }
}

impl From<&Decision> for Outcome {
    fn from(decision: &Decision) -> Self {
        match decision {
            Decision::Allow => Outcome::Allow,
            Decision::Deny { reason } => Outcome::Deny {
                reason: reason.to_string(),
            },
        }
    }
}

/// One permission check as it was decided.
///
/// Resource and action are kept as the labels the caller sent, so requests
/// naming an unknown resource type or action are recorded too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub id: RecordId,
    pub timestamp: DateTime<Utc>,
    pub subject_id: String,
    pub role: Role,
    pub resource: String,
    pub action: String,
    pub outcome: Outcome,
}

impl DecisionRecord {
    pub fn new(
        subject: &Subject,
        resource: &Resource,
        action: Action,
        decision: &Decision,
    ) -> Self {
        Self::with_labels(subject, resource.kind.as_str(), action.as_str(), decision.into())
    }

    /// A denial for a request that could not be evaluated, such as one
    /// naming an unknown resource type or action.
    pub fn rejected(
        subject: &Subject,
        resource: &str,
        action: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::with_labels(
            subject,
            resource,
            action,
            Outcome::Deny {
                reason: reason.into(),
            },
        )
    }

    fn with_labels(subject: &Subject, resource: &str, action: &str, outcome: Outcome) -> Self {
        Self {
            id: RecordId::new(),
            timestamp: Utc::now(),
            subject_id: subject.id.clone(),
            role: subject.role,
            resource: resource.to_string(),
            action: action.to_string(),
            outcome,
        }
    }
}

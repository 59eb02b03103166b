//! Policy rules and the conditions attached to them.

use crate::{Action, Environment, Error, Resource, ResourceType, Result, Role, Subject};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A condition a rule may attach on top of its role set.
///
/// One variant per condition shape the policy uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Admins always pass; anyone else must share the resource's department.
    AdminOrSameDepartment,
    /// Admins and faculty always pass; anyone else must own the resource.
    PrivilegedOrOwner,
}

impl Condition {
    pub const ALL: [Condition; 2] = [
        Condition::AdminOrSameDepartment,
        Condition::PrivilegedOrOwner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::AdminOrSameDepartment => "admin_or_same_department",
            Condition::PrivilegedOrOwner => "privileged_or_owner",
        }
    }

    /// Evaluate the condition for one request.
    ///
    /// A missing attribute on either side never satisfies an equality test.
    pub fn evaluate(&self, subject: &Subject, resource: &Resource, _env: &Environment) -> bool {
        match self {
            Condition::AdminOrSameDepartment => {
                subject.role == Role::Admin
                    || matches!(
                        (&subject.department, &resource.department_id),
                        (Some(ours), Some(theirs)) if ours == theirs
                    )
            }
            Condition::PrivilegedOrOwner => {
                matches!(subject.role, Role::Admin | Role::Faculty)
                    || resource.owner_id.as_deref() == Some(subject.id.as_str())
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|condition| condition.as_str() == s)
            .ok_or_else(|| Error::UnknownLabel {
                kind: "condition",
                label: s.to_string(),
            })
    }
}

/// A single grant: these roles may take this action on this resource type,
/// optionally subject to a condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub resource: ResourceType,
    pub action: Action,
    pub roles: Vec<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

impl Rule {
    pub fn new(resource: ResourceType, action: Action, roles: &[Role]) -> Self {
        Self {
            resource,
            action,
            roles: roles.to_vec(),
            condition: None,
        }
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Whether this rule applies to the request at all.
    pub fn matches(&self, role: Role, resource: ResourceType, action: Action) -> bool {
        self.resource == resource && self.action == action && self.roles.contains(&role)
    }

    /// Whether a matching rule grants. Unconditional rules always grant.
    pub fn grants(&self, subject: &Subject, resource: &Resource, env: &Environment) -> bool {
        self.condition
            .is_none_or(|condition| condition.evaluate(subject, resource, env))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let roles: Vec<&str> = self.roles.iter().map(Role::as_str).collect();
        write!(f, "{} {} [{}]", self.resource, self.action, roles.join(", "))?;
        if let Some(condition) = &self.condition {
            write!(f, " when {condition}")?;
        }
        Ok(())
    }
}

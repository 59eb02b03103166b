//! Protected resources and the actions taken on them.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Protected resource categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Dashboard,
    Courses,
    Students,
    Faculty,
    Grades,
    Analytics,
    Settings,
    Calendar,
}

impl ResourceType {
    pub const ALL: [ResourceType; 8] = [
        ResourceType::Dashboard,
        ResourceType::Courses,
        ResourceType::Students,
        ResourceType::Faculty,
        ResourceType::Grades,
        ResourceType::Analytics,
        ResourceType::Settings,
        ResourceType::Calendar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Dashboard => "dashboard",
            ResourceType::Courses => "courses",
            ResourceType::Students => "students",
            ResourceType::Faculty => "faculty",
            ResourceType::Grades => "grades",
            ResourceType::Analytics => "analytics",
            ResourceType::Settings => "settings",
            ResourceType::Calendar => "calendar",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::UnknownLabel {
                kind: "resource",
                label: s.to_string(),
            })
    }
}

/// Actions a subject can take on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
    Approve,
    Reject,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::View,
        Action::Create,
        Action::Update,
        Action::Delete,
        Action::Approve,
        Action::Reject,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Approve => "approve",
            Action::Reject => "reject",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| Error::UnknownLabel {
                kind: "action",
                label: s.to_string(),
            })
    }
}

/// A resource descriptor built by a call site right before a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub kind: ResourceType,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub department_id: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

impl Resource {
    pub fn new(kind: ResourceType) -> Self {
        Self {
            kind,
            owner_id: None,
            department_id: None,
            is_public: None,
        }
    }

    pub fn owned_by(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn in_department(mut self, department_id: impl Into<String>) -> Self {
        self.department_id = Some(department_id.into());
        self
    }

    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = Some(is_public);
        self
    }

    pub fn courses() -> Self {
        Self::new(ResourceType::Courses)
    }

    pub fn grades() -> Self {
        Self::new(ResourceType::Grades)
    }

    pub fn settings() -> Self {
        Self::new(ResourceType::Settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_parse() {
        assert_eq!("grades".parse::<ResourceType>().unwrap(), ResourceType::Grades);
        assert_eq!("approve".parse::<Action>().unwrap(), Action::Approve);
    }

    #[test]
    fn test_unknown_labels_rejected() {
        assert!("library".parse::<ResourceType>().is_err());
        assert!("Grades".parse::<ResourceType>().is_err());
        assert!("publish".parse::<Action>().is_err());
    }

    #[test]
    fn test_serde_labels_match_display() {
        for kind in ResourceType::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
        for action in Action::ALL {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{action}\""));
        }
    }

    #[test]
    fn test_descriptor_builders() {
        let resource = Resource::grades().owned_by("student-1").public(false);
        assert_eq!(resource.kind, ResourceType::Grades);
        assert_eq!(resource.owner_id.as_deref(), Some("student-1"));
        assert_eq!(resource.department_id, None);
        assert_eq!(resource.is_public, Some(false));
    }
}

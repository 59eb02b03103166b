//! Policy table and permission evaluation.

use crate::{
    Action, Condition, Environment, Error, Resource, ResourceType, Result, Role, Rule, Subject,
};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// An ordered, read-only set of grants.
///
/// Evaluation scans every rule; the outcome is the OR of all rules that
/// match the request, so rule order never changes a decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTable {
    #[serde(default, rename = "rule")]
    rules: Vec<Rule>,
}

/// Result of a permission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { reason: DenyReason },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Allow => f.write_str("allow"),
            Decision::Deny { reason } => write!(f, "deny: {reason}"),
        }
    }
}

/// Why a request was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// No rule covers this role, resource type and action.
    NoMatchingRule {
        role: Role,
        resource: ResourceType,
        action: Action,
    },
    /// Rules matched, but each one carried a condition that did not hold.
    ConditionFailed { conditions: Vec<Condition> },
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::NoMatchingRule {
                role,
                resource,
                action,
            } => write!(f, "no rule grants {role} {action} on {resource}"),
            DenyReason::ConditionFailed { conditions } => {
                let names: Vec<&str> = conditions.iter().map(Condition::as_str).collect();
                write!(f, "condition not met ({})", names.join(", "))
            }
        }
    }
}

static STANDARD: Lazy<PolicyTable> = Lazy::new(PolicyTable::build_standard);

impl PolicyTable {
    /// Build a table from rules, rejecting rules that can never match.
    pub fn new(rules: Vec<Rule>) -> Result<Self> {
        let table = Self { rules };
        table.validate()?;
        Ok(table)
    }

    /// A table with no rules. Denies everything.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in university policy, shared for the life of the process.
    pub fn standard() -> &'static PolicyTable {
        &STANDARD
    }

    /// Load a table from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let table = Self::parse(&content)?;
        tracing::info!(path = %path.display(), rules = table.len(), "loaded policy table");
        Ok(table)
    }

    /// Parse a table from a TOML string.
    pub fn parse(toml: &str) -> Result<Self> {
        let table: Self = toml::from_str(toml).map_err(|e| Error::Parse(e.to_string()))?;
        table.validate()?;
        Ok(table)
    }

    /// Render the table in the same TOML format `parse` accepts.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Invalid(e.to_string()))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn validate(&self) -> Result<()> {
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.roles.is_empty() {
                return Err(Error::Invalid(format!(
                    "rule {index} ({} {}) grants no roles",
                    rule.resource, rule.action
                )));
            }
        }
        Ok(())
    }

    /// Decide a request, explaining a denial.
    pub fn evaluate(
        &self,
        subject: &Subject,
        resource: &Resource,
        action: Action,
        env: Option<&Environment>,
    ) -> Decision {
        let empty = Environment::default();
        let env = env.unwrap_or(&empty);

        let mut failed = Vec::new();
        let mut matched = false;
        for rule in &self.rules {
            if !rule.matches(subject.role, resource.kind, action) {
                continue;
            }
            matched = true;
            if rule.grants(subject, resource, env) {
                tracing::debug!(
                    subject = %subject.id,
                    role = %subject.role,
                    resource = %resource.kind,
                    %action,
                    "permission granted"
                );
                return Decision::Allow;
            }
            if let Some(condition) = rule.condition {
                failed.push(condition);
            }
        }

        let reason = if matched {
            DenyReason::ConditionFailed { conditions: failed }
        } else {
            DenyReason::NoMatchingRule {
                role: subject.role,
                resource: resource.kind,
                action,
            }
        };
        tracing::debug!(
            subject = %subject.id,
            role = %subject.role,
            resource = %resource.kind,
            %action,
            %reason,
            "permission denied"
        );
        Decision::Deny { reason }
    }

    /// Decide a request.
    pub fn check(
        &self,
        subject: &Subject,
        resource: &Resource,
        action: Action,
        env: Option<&Environment>,
    ) -> bool {
        self.evaluate(subject, resource, action, env).is_allowed()
    }

    /// Every action the subject may take on this resource.
    pub fn permitted_actions(
        &self,
        subject: &Subject,
        resource: &Resource,
        env: Option<&Environment>,
    ) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|action| self.check(subject, resource, *action, env))
            .collect()
    }

    fn build_standard() -> Self {
        use Action::*;
        use Condition::*;
        use ResourceType::*;
        use Role::{Admin, Faculty, Student};

        let everyone = &[Admin, Faculty, Student][..];
        let staff = &[Admin, Faculty][..];
        let admin = &[Admin][..];

        let rules = vec![
            Rule::new(Dashboard, View, everyone),
            Rule::new(Courses, View, everyone),
            Rule::new(Courses, Create, admin),
            Rule::new(Courses, Update, staff).when(AdminOrSameDepartment),
            Rule::new(Courses, Delete, admin),
            Rule::new(Students, View, staff),
            Rule::new(Students, Create, admin),
            Rule::new(Students, Update, admin),
            Rule::new(Students, Delete, admin),
            Rule::new(ResourceType::Faculty, View, admin),
            Rule::new(ResourceType::Faculty, Create, admin),
            Rule::new(ResourceType::Faculty, Update, admin),
            Rule::new(ResourceType::Faculty, Delete, admin),
            Rule::new(Grades, View, everyone).when(PrivilegedOrOwner),
            Rule::new(Grades, Create, staff),
            Rule::new(Grades, Update, staff).when(AdminOrSameDepartment),
            Rule::new(Grades, Approve, admin),
            Rule::new(Grades, Reject, admin),
            Rule::new(Analytics, View, staff),
            Rule::new(Settings, View, admin),
            Rule::new(Settings, Update, admin),
            Rule::new(Calendar, View, everyone),
            Rule::new(Calendar, Create, staff),
            Rule::new(Calendar, Update, staff),
            Rule::new(Calendar, Delete, admin),
        ];
        Self { rules }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(role: Role) -> Subject {
        Subject::new(format!("{role}-1"), role).with_department("Computer Science")
    }

    #[test]
    fn test_empty_table_denies() {
        let table = PolicyTable::empty();
        let decision =
            table.evaluate(&subject(Role::Admin), &Resource::settings(), Action::View, None);
        assert_eq!(
            decision,
            Decision::Deny {
                reason: DenyReason::NoMatchingRule {
                    role: Role::Admin,
                    resource: ResourceType::Settings,
                    action: Action::View,
                }
            }
        );
    }

    #[test]
    fn test_guest_holds_no_grants() {
        let table = PolicyTable::standard();
        let guest = Subject::new("guest", Role::Guest);
        for kind in ResourceType::ALL {
            let resource = Resource::new(kind).public(true);
            assert!(table.permitted_actions(&guest, &resource, None).is_empty());
        }
    }

    #[test]
    fn test_disjunction_over_matching_rules() {
        let table = PolicyTable::new(vec![
            Rule::new(ResourceType::Courses, Action::Update, &[Role::Faculty])
                .when(Condition::AdminOrSameDepartment),
            Rule::new(ResourceType::Courses, Action::Update, &[Role::Faculty]),
        ])
        .unwrap();
        let outsider = Subject::new("faculty-9", Role::Faculty).with_department("Mechanical");
        let course = Resource::courses().in_department("Computer Science");
        assert!(table.check(&outsider, &course, Action::Update, None));

        // Order does not matter.
        let mut reversed = table.rules().to_vec();
        reversed.reverse();
        let table = PolicyTable::new(reversed).unwrap();
        assert!(table.check(&outsider, &course, Action::Update, None));
    }

    #[test]
    fn test_failed_conditions_reported() {
        let table = PolicyTable::standard();
        let outsider = Subject::new("faculty-9", Role::Faculty).with_department("Mechanical");
        let course = Resource::courses().in_department("Computer Science");
        let decision = table.evaluate(&outsider, &course, Action::Update, None);
        assert_eq!(
            decision,
            Decision::Deny {
                reason: DenyReason::ConditionFailed {
                    conditions: vec![Condition::AdminOrSameDepartment]
                }
            }
        );
        assert_eq!(
            decision.to_string(),
            "deny: condition not met (admin_or_same_department)"
        );
    }

    #[test]
    fn test_inactive_flag_not_consulted() {
        let table = PolicyTable::standard();
        let admin = subject(Role::Admin).inactive();
        assert!(table.check(&admin, &Resource::settings(), Action::Update, None));
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[[rule]]
resource = "courses"
action = "update"
roles = ["admin", "faculty"]
condition = "admin_or_same_department"

[[rule]]
resource = "calendar"
action = "view"
roles = ["guest"]
"#;
        let table = PolicyTable::parse(toml).unwrap();
        assert_eq!(table.len(), 2);

        let guest = Subject::new("guest", Role::Guest);
        let calendar = Resource::new(ResourceType::Calendar);
        assert!(table.check(&guest, &calendar, Action::View, None));
        assert!(!table.check(&guest, &calendar, Action::Create, None));

        let course = Resource::courses().in_department("Computer Science");
        assert!(table.check(&subject(Role::Faculty), &course, Action::Update, None));
    }

    #[test]
    fn test_parse_empty_file() {
        let table = PolicyTable::parse("").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_parse_rejects_unknown_labels() {
        let toml = r#"
[[rule]]
resource = "library"
action = "view"
roles = ["student"]
"#;
        assert!(matches!(PolicyTable::parse(toml), Err(Error::Parse(_))));

        let toml = r#"
[[rule]]
resource = "grades"
action = "view"
roles = ["student"]
condition = "same_building"
"#;
        assert!(matches!(PolicyTable::parse(toml), Err(Error::Parse(_))));
    }

    #[test]
    fn test_parse_rejects_empty_roles() {
        let toml = r#"
[[rule]]
resource = "grades"
action = "view"
roles = []
"#;
        assert!(matches!(PolicyTable::parse(toml), Err(Error::Invalid(_))));
    }

    #[test]
    fn test_standard_table_survives_toml() {
        let standard = PolicyTable::standard();
        let rendered = standard.to_toml().unwrap();
        let reparsed = PolicyTable::parse(&rendered).unwrap();
        assert_eq!(&reparsed, standard);
    }
}

//! Attribute-based access control for the campus administration front end.
//!
//! Core principle: **anything not explicitly granted is denied.**
//!
//! A [`PolicyTable`] holds grants of the form *these roles may take this
//! action on this resource type*, optionally narrowed by a [`Condition`] on
//! the subject, the resource and the [`Environment`]. A request is allowed
//! when at least one matching grant holds.
//!
//! ```
//! use access::{check_permission, get_user_from_role, Action, Resource};
//!
//! let faculty = get_user_from_role(Some("faculty"));
//! let course = Resource::courses().in_department("Computer Science");
//! assert!(check_permission(&faculty, &course, Action::Update, None));
//!
//! let student = get_user_from_role(Some("student"));
//! assert!(!check_permission(&student, &course, Action::Update, None));
//! ```

mod error;
mod policy;
mod resolver;
mod resource;
mod rule;
mod subject;

pub use error::{Error, Result};
pub use policy::{Decision, DenyReason, PolicyTable};
pub use resolver::{RoleLabelResolver, SubjectResolver, get_user_from_role};
pub use resource::{Action, Resource, ResourceType};
pub use rule::{Condition, Rule};
pub use subject::{Environment, Role, Subject};

/// Check a request against the standard policy table.
pub fn check_permission(
    subject: &Subject,
    resource: &Resource,
    action: Action,
    env: Option<&Environment>,
) -> bool {
    PolicyTable::standard().check(subject, resource, action, env)
}

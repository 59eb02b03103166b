//! Turning a caller's role label into a [`Subject`].
//!
//! **The built-in resolver is a placeholder.** It trusts whatever role label
//! it is handed and fills in synthetic ids and a fixed department. It is not
//! an identity source: a deployment should implement [`SubjectResolver`]
//! against its authenticated sessions instead.

use crate::{Role, Subject};

const DEFAULT_DEPARTMENT: &str = "Computer Science";

/// Produces the subject a permission check is made for.
pub trait SubjectResolver {
    fn resolve(&self, label: Option<&str>) -> Subject;
}

/// Fixed label-to-subject lookup. Unknown or missing labels become a guest.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleLabelResolver;

impl SubjectResolver for RoleLabelResolver {
    fn resolve(&self, label: Option<&str>) -> Subject {
        match label {
            Some("admin") => Subject::new("admin-1", Role::Admin),
            Some("faculty") => {
                Subject::new("faculty-1", Role::Faculty).with_department(DEFAULT_DEPARTMENT)
            }
            Some("student") => {
                Subject::new("student-1", Role::Student).with_department(DEFAULT_DEPARTMENT)
            }
            _ => Subject::new("guest", Role::Guest),
        }
    }
}

/// Resolve a role label with [`RoleLabelResolver`].
pub fn get_user_from_role(label: Option<&str>) -> Subject {
    RoleLabelResolver.resolve(label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels() {
        let admin = get_user_from_role(Some("admin"));
        assert_eq!(admin.id, "admin-1");
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.department, None);
        assert!(admin.active);

        let faculty = get_user_from_role(Some("faculty"));
        assert_eq!(faculty.id, "faculty-1");
        assert_eq!(faculty.department.as_deref(), Some("Computer Science"));

        let student = get_user_from_role(Some("student"));
        assert_eq!(student.id, "student-1");
        assert_eq!(student.role, Role::Student);
        assert_eq!(student.department.as_deref(), Some("Computer Science"));
    }

    #[test]
    fn test_unknown_labels_become_guest() {
        for label in [None, Some("unknown-string"), Some(""), Some("Admin"), Some("guest")] {
            let subject = get_user_from_role(label);
            assert_eq!(subject.role, Role::Guest, "label {label:?}");
            assert_eq!(subject.department, None);
        }
    }
}

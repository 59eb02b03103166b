//! End-to-end checks against the standard policy table.

use access::{
    Action, Condition, Environment, PolicyTable, Resource, ResourceType, Role, Rule, Subject,
    check_permission, get_user_from_role,
};

#[test]
fn admin_can_update_settings() {
    let admin = get_user_from_role(Some("admin"));
    assert!(check_permission(&admin, &Resource::settings(), Action::Update, None));
}

#[test]
fn student_cannot_view_faculty() {
    let student = get_user_from_role(Some("student"));
    let faculty = Resource::new(ResourceType::Faculty);
    assert!(!check_permission(&student, &faculty, Action::View, None));
}

#[test]
fn faculty_updates_course_in_own_department() {
    let faculty = get_user_from_role(Some("faculty"));
    let course = Resource::courses().in_department("Computer Science");
    assert!(check_permission(&faculty, &course, Action::Update, None));
}

#[test]
fn faculty_cannot_update_course_in_other_department() {
    let faculty = get_user_from_role(Some("faculty"));
    let faculty = Subject {
        department: Some("Mechanical".to_string()),
        ..faculty
    };
    let course = Resource::courses().in_department("Computer Science");
    assert!(!check_permission(&faculty, &course, Action::Update, None));
}

#[test]
fn student_views_own_grades() {
    let student = get_user_from_role(Some("student"));
    let grades = Resource::grades().owned_by("student-1");
    assert!(check_permission(&student, &grades, Action::View, None));

    let someone_else = Resource::grades().owned_by("student-2");
    assert!(!check_permission(&student, &someone_else, Action::View, None));
}

#[test]
fn unknown_roles_are_guests_and_denied() {
    let env = Environment::now();
    for label in [None, Some("unknown-string")] {
        let guest = get_user_from_role(label);
        assert_eq!(guest.role, Role::Guest);
        for kind in ResourceType::ALL {
            for action in Action::ALL {
                assert!(!check_permission(&guest, &Resource::new(kind), action, Some(&env)));
            }
        }
    }
}

#[test]
fn unconditional_rules_ignore_resource_and_environment() {
    let admin = get_user_from_role(Some("admin"));
    let env = Environment::now().with_origin("192.0.2.10".parse().unwrap());
    let odd = Resource::settings()
        .owned_by("nobody")
        .in_department("Nowhere")
        .public(true);
    assert!(check_permission(&admin, &odd, Action::Update, Some(&env)));
    assert!(check_permission(&admin, &odd, Action::View, None));
}

#[test]
fn no_grant_without_a_rule() {
    // Exhaustively: anything allowed must be backed by a matching rule.
    let table = PolicyTable::standard();
    for label in ["admin", "faculty", "student"] {
        let subject = get_user_from_role(Some(label));
        for kind in ResourceType::ALL {
            let resource = Resource::new(kind)
                .owned_by(subject.id.clone())
                .in_department("Computer Science");
            for action in Action::ALL {
                let backed = table
                    .rules()
                    .iter()
                    .any(|rule| rule.matches(subject.role, kind, action));
                if !backed {
                    assert!(!table.check(&subject, &resource, action, None));
                }
            }
        }
    }
}

#[test]
fn unconditional_rule_wins_over_failing_condition() {
    let table = PolicyTable::new(vec![
        Rule::new(ResourceType::Grades, Action::View, &[Role::Student])
            .when(Condition::PrivilegedOrOwner),
        Rule::new(ResourceType::Grades, Action::View, &[Role::Student]),
    ])
    .unwrap();
    let student = get_user_from_role(Some("student"));
    let grades = Resource::grades().owned_by("student-2");
    assert!(table.check(&student, &grades, Action::View, None));

    let conditional_only = PolicyTable::new(table.rules()[..1].to_vec()).unwrap();
    assert!(!conditional_only.check(&student, &grades, Action::View, None));
}

#[test]
fn evaluation_is_deterministic() {
    let faculty = get_user_from_role(Some("faculty"));
    let course = Resource::courses().in_department("Physics");
    let first = PolicyTable::standard().evaluate(&faculty, &course, Action::Update, None);
    for _ in 0..10 {
        assert_eq!(
            PolicyTable::standard().evaluate(&faculty, &course, Action::Update, None),
            first
        );
    }
}

#[test]
fn standard_table_is_shared_across_threads() {
    let handles: Vec<_> = ["admin", "faculty", "student"]
        .into_iter()
        .map(|label| {
            std::thread::spawn(move || {
                let subject = get_user_from_role(Some(label));
                let dashboard = Resource::new(ResourceType::Dashboard);
                check_permission(&subject, &dashboard, Action::View, None)
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

//! Property-based tests for the view model and HTML escaping.
//!
//! Uses proptest to verify:
//! 1. Every joined task gets its assignee's name or "Unassigned".
//! 2. The member order is sorted by status rank, then due date, undated last.
//! 3. Status counts always add up to the task total.
//! 4. Escaped text never contains raw markup characters.

use std::cmp::Ordering;

use proptest::prelude::*;
use taskdesk::render::escape_html;
use taskdesk::view::{self, UNASSIGNED};
use taskdesk_proto::model::{Priority, Role, Task, TaskId, TaskStatus, User, UserId};

// --- Strategies ---

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop::sample::select(TaskStatus::ALL.to_vec())
}

/// Due dates drawn from a small range, plus absent and unparsable values.
fn arb_due() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("not a date".to_string())),
        (1u32..=12, 1u32..=28).prop_map(|(m, d)| Some(format!("2024-{m:02}-{d:02}"))),
    ]
}

fn arb_task(id: i64) -> impl Strategy<Value = Task> {
    (arb_status(), arb_due(), prop::option::of(1i64..=6)).prop_map(move |(status, due, to)| Task {
        id: TaskId(id),
        title: format!("task {id}"),
        description: None,
        status,
        priority: Priority::Medium,
        assigned_to: to.map(UserId),
        assigned_by: Some(UserId(100)),
        due_date: due,
        result: None,
        created_at: "2024-01-01T00:00:00".to_string(),
        completed_at: None,
        completed: status.is_done(),
        approved: status == TaskStatus::Approved,
    })
}

fn arb_tasks() -> impl Strategy<Value = Vec<Task>> {
    (0i64..24).prop_flat_map(|n| (0..n).map(arb_task).collect::<Vec<_>>())
}

/// Users with ids 1..=3 so some assignees are missing.
fn users() -> Vec<User> {
    (1..=3)
        .map(|id| User {
            id: UserId(id),
            username: format!("user{id}"),
            full_name: format!("User {id}"),
            email: format!("user{id}@example.com"),
            role: Role::Member,
            created_at: None,
        })
        .collect()
}

proptest! {
    #[test]
    fn join_names_every_assignee(tasks in arb_tasks()) {
        let users = users();
        let joined = view::join(&tasks, &users);
        prop_assert_eq!(joined.len(), tasks.len());
        for row in &joined {
            let expected = row
                .task
                .assigned_to
                .and_then(|id| users.iter().find(|u| u.id == id))
                .map_or(UNASSIGNED, |u| u.full_name.as_str());
            prop_assert_eq!(row.assignee_name, expected);
        }
    }

    #[test]
    fn member_order_is_sorted(tasks in arb_tasks()) {
        let sorted = view::sort_for_member(&tasks);
        prop_assert_eq!(sorted.len(), tasks.len());
        for pair in sorted.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            prop_assert!(a.status.rank() <= b.status.rank());
            if a.status.rank() == b.status.rank() {
                let ordered = match (a.due_at(), b.due_at()) {
                    (Some(x), Some(y)) => x.cmp(&y) != Ordering::Greater,
                    (Some(_) | None, None) => true,
                    (None, Some(_)) => false,
                };
                prop_assert!(ordered, "{:?} before {:?}", a.due_date, b.due_date);
            }
        }
    }

    #[test]
    fn counts_add_up(tasks in arb_tasks()) {
        let counts = view::aggregate(&tasks);
        prop_assert_eq!(counts.total(), tasks.len());
        prop_assert_eq!(counts.open() + counts.done(), tasks.len());
    }

    #[test]
    fn escaped_text_has_no_markup(raw in ".{0,64}") {
        let escaped = escape_html(&raw);
        prop_assert!(!escaped.contains('<'));
        prop_assert!(!escaped.contains('>'));
        prop_assert!(!escaped.contains('"'));
        prop_assert!(!escaped.contains('\''));
    }
}

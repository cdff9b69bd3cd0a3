//! Pure derivations over fetched collections.
//!
//! Nothing here performs I/O or keeps state. The dashboard recomputes
//! every value after each successful fetch.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDateTime;

use taskdesk_proto::model::{Notification, Task, TaskStatus, User, UserId};

/// Assignee label for tasks whose assignee is unknown.
pub const UNASSIGNED: &str = "Unassigned";

/// A task joined with its assignee's display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichedTask<'a> {
    /// The task.
    pub task: &'a Task,
    /// `full_name` of the assignee, or [`UNASSIGNED`].
    pub assignee_name: &'a str,
}

/// Left-joins tasks to users on `assigned_to`.
#[must_use]
pub fn join<'a>(tasks: &'a [Task], users: &'a [User]) -> Vec<EnrichedTask<'a>> {
    let by_id: HashMap<UserId, &User> = users.iter().map(|u| (u.id, u)).collect();
    tasks
        .iter()
        .map(|task| EnrichedTask {
            task,
            assignee_name: task
                .assigned_to
                .and_then(|id| by_id.get(&id).copied())
                .map_or(UNASSIGNED, |u| u.full_name.as_str()),
        })
        .collect()
}

/// Task counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    /// Pending tasks.
    pub pending: usize,
    /// In-progress tasks.
    pub in_progress: usize,
    /// Completed, not yet approved.
    pub completed: usize,
    /// Approved.
    pub approved: usize,
}

impl StatusCounts {
    /// All tasks.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.pending + self.in_progress + self.completed + self.approved
    }

    /// Pending plus in progress.
    #[must_use]
    pub const fn open(&self) -> usize {
        self.pending + self.in_progress
    }

    /// Completed plus approved.
    #[must_use]
    pub const fn done(&self) -> usize {
        self.completed + self.approved
    }
}

/// Counts tasks by status.
#[must_use]
pub fn aggregate(tasks: &[Task]) -> StatusCounts {
    tasks
        .iter()
        .fold(StatusCounts::default(), |mut counts, task| {
            match task.status {
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
                TaskStatus::Completed => counts.completed += 1,
                TaskStatus::Approved => counts.approved += 1,
            }
            counts
        })
}

/// Figures shown on the lead dashboard's stat cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeadStats {
    /// Team members.
    pub members: usize,
    /// Tasks created by the lead.
    pub total: usize,
    /// Pending or in progress.
    pub open: usize,
    /// Completed or approved.
    pub done: usize,
}

impl LeadStats {
    /// Derives the lead figures.
    #[must_use]
    pub fn compute(members: &[User], tasks: &[Task]) -> Self {
        let counts = aggregate(tasks);
        Self {
            members: members.len(),
            total: counts.total(),
            open: counts.open(),
            done: counts.done(),
        }
    }
}

/// Figures shown on the member dashboard's stat cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberStats {
    /// Tasks assigned to the member.
    pub total: usize,
    /// Not started.
    pub pending: usize,
    /// Being worked on.
    pub in_progress: usize,
    /// Completed or approved.
    pub done: usize,
}

impl MemberStats {
    /// Derives the member figures.
    #[must_use]
    pub fn compute(tasks: &[Task]) -> Self {
        let counts = aggregate(tasks);
        Self {
            total: counts.total(),
            pending: counts.pending,
            in_progress: counts.in_progress,
            done: counts.done(),
        }
    }
}

/// Orders due dates ascending with undated entries last.
fn cmp_due(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Member dashboard order: status rank, then due date ascending, undated
/// (or unparsable) last. Equal keys keep their fetched order.
#[must_use]
pub fn sort_for_member(tasks: &[Task]) -> Vec<&Task> {
    let mut keyed: Vec<(u8, Option<NaiveDateTime>, &Task)> = tasks
        .iter()
        .map(|t| (t.status.rank(), t.due_at(), t))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| cmp_due(a.1, b.1)));
    keyed.into_iter().map(|(_, _, t)| t).collect()
}

/// Number of tasks assigned to each member, in member order.
#[must_use]
pub fn tasks_per_member<'a>(tasks: &[Task], members: &'a [User]) -> Vec<(&'a User, usize)> {
    let mut counts: HashMap<UserId, usize> = HashMap::new();
    for id in tasks.iter().filter_map(|t| t.assigned_to) {
        *counts.entry(id).or_default() += 1;
    }
    members
        .iter()
        .map(|m| (m, counts.get(&m.id).copied().unwrap_or(0)))
        .collect()
}

/// Notifications not yet read.
#[must_use]
pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.read).count()
}

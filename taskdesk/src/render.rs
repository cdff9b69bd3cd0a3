//! HTML projection of the dashboard state.
//!
//! Every function here is pure and returns a `String` fragment. User
//! supplied text passes through [`Escaped`] before it reaches markup.
//! Actionable elements carry `data-action` and `data-id` attributes
//! instead of inline script, so a host page registers one listener per
//! action name and reads the entity id from the element.

use std::fmt;

use chrono::NaiveDateTime;

use taskdesk_proto::model::{Notification, Task, TaskStatus, User};

use crate::dispatch::ActionKind;
use crate::session::CurrentUser;
use crate::toast::Toast;
use crate::view::{EnrichedTask, LeadStats, MemberStats, UNASSIGNED};

/// `data-action` value of the buttons that open a task's details.
pub const VIEW_TASK: &str = "view-task";

/// Default `strftime` pattern for dates.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Default `strftime` pattern for date-times.
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

// ---------------------------------------------------------------------------
// Escaping
// ---------------------------------------------------------------------------

/// Display adapter that HTML-escapes its contents.
#[derive(Debug, Clone, Copy)]
pub struct Escaped<'a>(pub &'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.0;
        while let Some(pos) = rest.find(['&', '<', '>', '"', '\'']) {
            f.write_str(&rest[..pos])?;
            let entity = match rest.as_bytes()[pos] {
                b'&' => "&amp;",
                b'<' => "&lt;",
                b'>' => "&gt;",
                b'"' => "&quot;",
                _ => "&#39;",
            };
            f.write_str(entity)?;
            rest = &rest[pos + 1..];
        }
        f.write_str(rest)
    }
}

/// Escapes `& < > " '` for use in element text and attribute values.
#[must_use]
pub fn escape_html(raw: &str) -> String {
    Escaped(raw).to_string()
}

/// `data-action`/`data-id` attribute pair.
fn action_attrs(action: &str, id: impl fmt::Display) -> String {
    format!(r#"data-action="{action}" data-id="{id}""#)
}

fn button(class: &str, action: &str, id: impl fmt::Display, label: &str) -> String {
    format!(
        r#"<button class="{class}" {}>{label}</button>"#,
        action_attrs(action, id)
    )
}

fn status_badge(status: TaskStatus) -> String {
    format!(
        r#"<span class="status-badge status-{}">{}</span>"#,
        status.as_str(),
        status.label()
    )
}

fn priority_badge(task: &Task) -> String {
    let priority = task.priority.as_str();
    format!(r#"<span class="priority-badge priority-{priority}">{priority}</span>"#)
}

fn stat_card(label: &str, value: usize) -> String {
    format!(
        r#"<div class="stat-card"><span class="stat-value">{value}</span><span class="stat-label">{label}</span></div>"#
    )
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Renders fragments with configured date formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renderer {
    date_format: String,
    datetime_format: String,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMAT, DEFAULT_DATETIME_FORMAT)
    }
}

impl Renderer {
    /// Creates a renderer with `strftime` patterns for dates and
    /// date-times.
    #[must_use]
    pub fn new(date_format: impl Into<String>, datetime_format: impl Into<String>) -> Self {
        Self {
            date_format: date_format.into(),
            datetime_format: datetime_format.into(),
        }
    }

    fn date(&self, at: Option<NaiveDateTime>) -> String {
        at.map_or_else(
            || "No due date".to_string(),
            |at| at.format(&self.date_format).to_string(),
        )
    }

    fn datetime(&self, at: Option<NaiveDateTime>, fallback: &str) -> String {
        at.map_or_else(
            || fallback.to_string(),
            |at| at.format(&self.datetime_format).to_string(),
        )
    }

    /// `Welcome back, {name}!`
    #[must_use]
    pub fn welcome(&self, user: &CurrentUser) -> String {
        format!(
            r#"<h1 class="welcome">Welcome back, {}!</h1>"#,
            Escaped(user.display_name())
        )
    }

    /// Lead stat cards.
    #[must_use]
    pub fn lead_stats(&self, stats: &LeadStats) -> String {
        format!(
            r#"<section class="stats">{}{}{}{}</section>"#,
            stat_card("Team Members", stats.members),
            stat_card("Total Tasks", stats.total),
            stat_card("Pending Tasks", stats.open),
            stat_card("Completed Tasks", stats.done),
        )
    }

    /// Member stat cards.
    #[must_use]
    pub fn member_stats(&self, stats: &MemberStats) -> String {
        format!(
            r#"<section class="stats">{}{}{}{}</section>"#,
            stat_card("Total Tasks", stats.total),
            stat_card("Pending", stats.pending),
            stat_card("In Progress", stats.in_progress),
            stat_card("Completed", stats.done),
        )
    }

    /// Body rows of the lead's task table. Approve is offered only for
    /// completed tasks.
    #[must_use]
    pub fn lead_tasks_table(&self, tasks: &[EnrichedTask<'_>]) -> String {
        if tasks.is_empty() {
            return r#"<tr><td colspan="6" class="empty-state"><p>No tasks yet. Create your first task!</p></td></tr>"#
                .to_string();
        }
        let mut out = String::new();
        for entry in tasks {
            let task = entry.task;
            let mut actions = button("btn-action btn-view", VIEW_TASK, task.id, "View");
            if task.can_approve() {
                actions.push_str(&button(
                    "btn-action btn-approve",
                    ActionKind::ApproveTask.as_str(),
                    task.id,
                    "Approve",
                ));
            }
            actions.push_str(&button(
                "btn-action btn-delete",
                ActionKind::DeleteTask.as_str(),
                task.id,
                "Delete",
            ));
            out.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{actions}</td></tr>",
                Escaped(&task.title),
                Escaped(entry.assignee_name),
                priority_badge(task),
                status_badge(task.status),
                self.date(task.due_at()),
            ));
        }
        out
    }

    /// Body rows of the lead's member table.
    #[must_use]
    pub fn members_table(&self, members: &[(&User, usize)]) -> String {
        if members.is_empty() {
            return r#"<tr><td colspan="5" class="empty-state"><p>No team members yet. Create your first team member!</p></td></tr>"#
                .to_string();
        }
        let mut out = String::new();
        for (member, count) in members {
            out.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{count}</td><td>{}</td></tr>",
                Escaped(&member.username),
                Escaped(&member.full_name),
                Escaped(&member.email),
                button(
                    "btn-action btn-delete",
                    ActionKind::DeleteUser.as_str(),
                    member.id,
                    "Delete"
                ),
            ));
        }
        out
    }

    /// `<option>` list for the assign form's member selector, starting
    /// with an empty placeholder.
    #[must_use]
    pub fn assignee_options(&self, members: &[User]) -> String {
        let mut out = r#"<option value="">Select team member</option>"#.to_string();
        for member in members {
            out.push_str(&format!(
                r#"<option value="{}">{} ({})</option>"#,
                member.id,
                Escaped(&member.full_name),
                Escaped(&member.username),
            ));
        }
        out
    }

    /// Member task cards, in the order given.
    #[must_use]
    pub fn member_task_cards(&self, tasks: &[&Task]) -> String {
        if tasks.is_empty() {
            return r#"<div class="empty-state"><p>No tasks assigned yet</p></div>"#.to_string();
        }
        let mut out = String::new();
        for task in tasks {
            let description = task
                .description
                .as_deref()
                .filter(|d| !d.is_empty())
                .unwrap_or("No description provided");
            out.push_str(&format!(
                concat!(
                    r#"<div class="task-card" data-id="{id}">"#,
                    r#"<div class="task-card-header"><h3 class="task-card-title">{title}</h3>{priority}</div>"#,
                    r#"<div class="task-card-body"><p>{description}</p><div class="task-meta"><span>{due}</span></div></div>"#,
                    r#"<div class="task-card-footer">{status}<div>{actions}</div></div>"#,
                    "</div>"
                ),
                id = task.id,
                title = Escaped(&task.title),
                priority = priority_badge(task),
                description = Escaped(description),
                due = self.date(task.due_at()),
                status = status_badge(task.status),
                actions = member_task_actions(task),
            ));
        }
        out
    }

    /// Details panel for one task. `assignee` is shown on the lead view.
    #[must_use]
    pub fn task_details(&self, task: &Task, assignee: Option<&str>) -> String {
        let mut out = format!(
            r#"<div class="task-details" data-id="{}"><h3>{}</h3>"#,
            task.id,
            Escaped(&task.title)
        );
        out.push_str(&format!(
            "<p><strong>Status:</strong> {}</p><p><strong>Priority:</strong> {}</p>",
            status_badge(task.status),
            priority_badge(task),
        ));
        if let Some(name) = assignee {
            out.push_str(&format!(
                "<p><strong>Assigned To:</strong> {}</p>",
                Escaped(name)
            ));
        }
        let description = task
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or("No description");
        out.push_str(&format!(
            "<p><strong>Description:</strong> {}</p>",
            Escaped(description)
        ));
        out.push_str(&format!(
            "<p><strong>Due Date:</strong> {}</p><p><strong>Created:</strong> {}</p>",
            self.datetime(task.due_at(), "No due date"),
            self.datetime(task.created_at(), "Unknown"),
        ));
        if task.completed_at.is_some() {
            out.push_str(&format!(
                "<p><strong>Completed:</strong> {}</p>",
                self.datetime(task.completed_at(), "Unknown")
            ));
        }
        if let Some(result) = task.result.as_deref().filter(|r| !r.is_empty()) {
            out.push_str(&format!(
                r#"<div class="task-result"><strong>Result:</strong><pre>{}</pre></div>"#,
                Escaped(result)
            ));
        }
        if task.status == TaskStatus::Approved {
            out.push_str(
                r#"<p class="approved">This task has been approved by your team lead</p>"#,
            );
        }
        out.push_str("</div>");
        out
    }

    /// Notification list, newest first as fetched.
    #[must_use]
    pub fn notifications(&self, notifications: &[Notification]) -> String {
        if notifications.is_empty() {
            return r#"<p class="empty-state">No notifications</p>"#.to_string();
        }
        let mut out = String::new();
        for notification in notifications {
            let (class, marker) = if notification.read {
                ("read", "")
            } else {
                ("unread", r#"<span class="new-marker">NEW</span>"#)
            };
            out.push_str(&format!(
                r#"<div class="notification-item {class}" {}><div><p>{}</p><small>{}</small></div>{marker}</div>"#,
                action_attrs(ActionKind::MarkNotificationRead.as_str(), notification.id),
                Escaped(&notification.message),
                self.datetime(notification.created_at(), ""),
            ));
        }
        out
    }

    /// Unread counter; empty when nothing is unread.
    #[must_use]
    pub fn unread_badge(&self, unread: usize) -> String {
        if unread == 0 {
            return String::new();
        }
        format!(r#"<span class="notification-badge">{unread}</span>"#)
    }

    /// Toast stack.
    #[must_use]
    pub fn toasts<'a>(&self, toasts: impl IntoIterator<Item = &'a Toast>) -> String {
        let items: String = toasts
            .into_iter()
            .map(|t| {
                format!(
                    r#"<div class="toast toast-{}">{}</div>"#,
                    t.kind.as_str(),
                    Escaped(&t.message)
                )
            })
            .collect();
        if items.is_empty() {
            return String::new();
        }
        format!(r#"<div class="toast-container">{items}</div>"#)
    }

    /// Lead view body: stats, task table, member table, assign form options.
    #[must_use]
    pub fn lead_body(
        &self,
        stats: &LeadStats,
        tasks: &[EnrichedTask<'_>],
        members: &[(&User, usize)],
        options: &[User],
    ) -> String {
        format!(
            concat!(
                "{stats}",
                r#"<section class="tasks"><h2>Tasks</h2><table><thead><tr><th>Title</th><th>Assigned To</th><th>Priority</th><th>Status</th><th>Due Date</th><th>Actions</th></tr></thead><tbody>{tasks}</tbody></table></section>"#,
                r#"<section class="members"><h2>Team Members</h2><table><thead><tr><th>Username</th><th>Full Name</th><th>Email</th><th>Tasks</th><th>Actions</th></tr></thead><tbody>{members}</tbody></table></section>"#,
                r#"<form class="assign-task" data-action="{assign}"><select name="assigned_to">{options}</select></form>"#,
            ),
            stats = self.lead_stats(stats),
            tasks = self.lead_tasks_table(tasks),
            members = self.members_table(members),
            assign = ActionKind::AssignTask.as_str(),
            options = self.assignee_options(options),
        )
    }

    /// Member view body: stats and ordered task cards.
    #[must_use]
    pub fn member_body(&self, stats: &MemberStats, tasks: &[&Task]) -> String {
        format!(
            r#"{}<section class="tasks"><h2>My Tasks</h2>{}</section>"#,
            self.member_stats(stats),
            self.member_task_cards(tasks),
        )
    }

    /// Standalone HTML document.
    #[must_use]
    pub fn page(&self, title: &str, header: &str, body: &str) -> String {
        format!(
            concat!(
                "<!DOCTYPE html>\n",
                r#"<html lang="en"><head><meta charset="utf-8"><title>{title}</title></head>"#,
                "<body><header>{header}</header><main>{body}</main></body></html>\n"
            ),
            title = Escaped(title),
            header = header,
            body = body,
        )
    }
}

fn member_task_actions(task: &Task) -> String {
    let mut actions = button("btn-secondary", VIEW_TASK, task.id, "View Details");
    match task.status {
        TaskStatus::Pending | TaskStatus::InProgress => actions.push_str(&button(
            "btn-primary",
            ActionKind::CompleteTask.as_str(),
            task.id,
            "Complete Task",
        )),
        TaskStatus::Completed => {
            actions.push_str(r#"<span class="awaiting-approval">Awaiting Approval</span>"#);
        }
        TaskStatus::Approved => actions.push_str(r#"<span class="approved">Approved</span>"#),
    }
    actions
}

/// Assignee label for a details panel: the joined name when known.
#[must_use]
pub fn assignee_label<'a>(task: &Task, members: &'a [User]) -> &'a str {
    task.assigned_to
        .and_then(|id| members.iter().find(|m| m.id == id))
        .map_or(UNASSIGNED, |m| m.full_name.as_str())
}

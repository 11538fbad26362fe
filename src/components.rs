//! HTML fragments returned by the routes.
//!
//! Every fragment is an askama template under `templates/`; values are
//! HTML-escaped by the engine, and already rendered fragments are embedded
//! with the `safe` filter.

use std::fmt;

use askama::Template;
use chrono::Local;
use uuid::Uuid;

use crate::models::{Task, TaskStatus};
use crate::validation::parse_due_date;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertType {
    Success,
    Danger,
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AlertType::Success => "success",
            AlertType::Danger => "danger",
        })
    }
}

/// Short-lived status message shown after an operation.
#[derive(Debug, Clone, Template)]
#[template(path = "components/alert.html")]
pub struct Alert {
    pub id: String,
    pub alert_type: AlertType,
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(alert_type: AlertType, title: impl Into<String>, message: impl Into<String>) -> Self {
        Alert {
            id: format!("alert-{}", Uuid::new_v4().simple()),
            alert_type,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(AlertType::Success, title, message)
    }

    pub fn danger(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(AlertType::Danger, title, message)
    }
}

#[derive(Template)]
#[template(path = "components/task_card.html")]
pub struct TaskCard<'a> {
    pub task: &'a Task,
    pub due_day: String,
    pub due_time: String,
}

impl<'a> TaskCard<'a> {
    pub fn new(task: &'a Task) -> Self {
        let (due_day, due_time) = match parse_due_date(&task.due_date) {
            Some(due) => {
                let local = due.with_timezone(&Local);
                (local.format("%Y-%m-%d").to_string(), local.format("%H:%M").to_string())
            }
            None => (task.due_date.clone(), String::new()),
        };
        TaskCard { task, due_day, due_time }
    }
}

/// `<option>` entry for the status select.
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn status_options(current: Option<TaskStatus>) -> Vec<StatusOption> {
    TaskStatus::ALL
        .iter()
        .map(|status| StatusOption {
            value: status.as_str(),
            label: status.label(),
            selected: Some(*status) == current,
        })
        .collect()
}

#[derive(Template)]
#[template(path = "forms/create_task_form.html")]
pub struct CreateTaskForm {
    pub statuses: Vec<StatusOption>,
}

impl CreateTaskForm {
    pub fn new() -> Self {
        CreateTaskForm {
            statuses: status_options(None),
        }
    }
}

impl Default for CreateTaskForm {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Template)]
#[template(path = "forms/update_task_form.html")]
pub struct UpdateTaskForm<'a> {
    pub task: &'a Task,
    pub due_value: String,
    pub statuses: Vec<StatusOption>,
}

impl<'a> UpdateTaskForm<'a> {
    pub fn new(task: &'a Task) -> Self {
        let due_value = parse_due_date(&task.due_date)
            .map(|due| due.with_timezone(&Local).format("%Y-%m-%dT%H:%M").to_string())
            .unwrap_or_else(|| task.due_date.clone());
        UpdateTaskForm {
            task,
            due_value,
            statuses: status_options(Some(task.status)),
        }
    }
}

#[derive(Template)]
#[template(path = "forms/delete_task_form.html")]
pub struct DeleteTaskForm {
    pub task_id: i64,
}

#[derive(Template)]
#[template(path = "forms/search_tasks_form.html")]
pub struct SearchTasksForm;

/// Out-of-band alert slot followed by the main fragment.
#[derive(Template)]
#[template(path = "responses/fragment.html")]
pub struct FragmentResponse {
    pub alert_html: String,
    pub body_html: String,
}

impl FragmentResponse {
    pub fn render_parts(alert: Option<&Alert>, body: Option<String>) -> askama::Result<String> {
        let alert_html = match alert {
            Some(alert) => alert.render()?,
            None => String::new(),
        };
        FragmentResponse {
            alert_html,
            body_html: body.unwrap_or_default(),
        }
        .render()
    }
}

/// Alert plus the task card, when there is a task.
pub fn task_response(alert: Option<&Alert>, task: Option<&Task>) -> askama::Result<String> {
    let body = task.map(|task| TaskCard::new(task).render()).transpose()?;
    FragmentResponse::render_parts(alert, body)
}

/// Concatenated cards, no separator.
pub fn task_list(tasks: &[Task]) -> askama::Result<String> {
    tasks.iter().map(|task| TaskCard::new(task).render()).collect()
}

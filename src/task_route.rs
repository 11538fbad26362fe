// src/task_route.rs

use actix_web::{http::header::ContentType, web, HttpResponse};
use askama::Template;
use log::{debug, error, info};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::components::{task_list, task_response, Alert};
use crate::error::AppError;
use crate::models::{NewTask, Task};
use crate::validation::TaskValidator;

pub const HX_TRIGGER: &str = "HX-Trigger";
pub const TASK_DELETED_EVENT: &str = "taskDeleted";
pub const TASK_SEARCH_FAILED_EVENT: &str = "taskSearchFailed";

/// Form-encoded body of create and update requests.
#[derive(Debug, Deserialize)]
pub struct TaskForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, rename = "dueDate", alias = "due_date")]
    pub due_date: String,
}

impl TaskForm {
    fn description(&self) -> Option<&str> {
        Some(self.description.as_str()).filter(|d| !d.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub id: String,
}

pub(crate) fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

pub(crate) fn html(body: String) -> HttpResponse {
    HttpResponse::Ok().content_type(ContentType::html()).body(body)
}

fn validation_failure(validity: &TaskValidator) -> Result<HttpResponse, AppError> {
    debug!("Validation failed: {}", validity.messages());
    let alert = Alert::danger("Validation Error", validity.messages());
    Ok(html(task_response(Some(&alert), None)?))
}

/// Keeps the card in place: the update form swaps the response over `#task-{id}`.
async fn rejected_update(
    data: &web::Data<AppState>,
    raw_id: &str,
    validity: &TaskValidator,
) -> Result<HttpResponse, AppError> {
    debug!("Validation failed: {}", validity.messages());
    let current = match parse_id(raw_id) {
        Some(id) => {
            let repository = data.task_repository()?;
            web::block(move || repository.read(id)).await??
        }
        None => None,
    };
    let alert = Alert::danger("Validation Error", validity.messages());
    Ok(html(task_response(Some(&alert), current.as_ref())?))
}

/// POST /task
pub async fn create_task(
    data: web::Data<AppState>,
    form: web::Form<TaskForm>,
) -> Result<HttpResponse, AppError> {
    info!("Creating task...");
    let form = form.into_inner();
    let validity = TaskValidator::for_create(&form.title, form.description(), &form.due_date, &form.status);
    let status = match validity.status() {
        Some(status) if validity.is_valid() => status,
        _ => return validation_failure(&validity),
    };

    let new_task = NewTask {
        description: form.description().map(str::to_string),
        title: form.title,
        status,
        due_date: form.due_date,
    };
    let repository = data.task_repository()?;

    match web::block(move || repository.create(new_task)).await? {
        Ok(Some(task)) => {
            let alert = Alert::success("Task Created", format!("Task \"{}\" created successfully!", task.title));
            Ok(html(task_response(Some(&alert), Some(&task))?))
        }
        Ok(None) => {
            error!("Task insert returned no identifier");
            let alert = Alert::danger("Error", "Failed to create task");
            Ok(html(task_response(Some(&alert), None)?))
        }
        Err(e) => {
            error!("Error creating task: {}", e);
            let alert = Alert::danger("Error", "Failed to create task");
            Ok(HttpResponse::InternalServerError()
                .content_type(ContentType::html())
                .body(task_response(Some(&alert), None)?))
        }
    }
}

/// GET /task/{id}
pub async fn get_task_by_id(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let raw_id = path.into_inner();
    info!("Fetching task {}", raw_id);
    let repository = data.task_repository()?;

    let task = match parse_id(&raw_id) {
        Some(id) => web::block(move || repository.read(id)).await??,
        None => None,
    };
    let alert = task
        .is_none()
        .then(|| Alert::danger("Error", format!("No task found with ID {}", raw_id)));

    Ok(html(task_response(alert.as_ref(), task.as_ref())?))
}

/// GET /task
pub async fn get_all_tasks(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    info!("Fetching all tasks...");
    let repository = data.task_repository()?;
    let tasks = web::block(move || repository.read_all()).await??;
    debug!("Found {} tasks", tasks.len());

    Ok(html(task_list(&tasks)?))
}

/// POST /task/search
///
/// Adds `HX-Trigger: taskSearchFailed` whenever an alert is rendered.
pub async fn search_tasks(
    data: web::Data<AppState>,
    form: web::Form<SearchForm>,
) -> Result<HttpResponse, AppError> {
    let raw_id = form.id.trim().to_string();
    info!("Searching for task by ID {}", raw_id);

    let (task, alert) = match parse_id(&raw_id) {
        Some(id) => {
            let repository = data.task_repository()?;
            let task = web::block(move || repository.read(id)).await??;
            let alert = task
                .is_none()
                .then(|| Alert::danger("Not Found", format!("No task found with ID {}.", id)));
            (task, alert)
        }
        None => (
            None,
            Some(Alert::danger(
                "Validation Error",
                format!("Invalid ID {} provided for search.", raw_id),
            )),
        ),
    };

    let mut response = HttpResponse::Ok();
    response.content_type(ContentType::html());
    if alert.is_some() {
        response.insert_header((HX_TRIGGER, TASK_SEARCH_FAILED_EVENT));
    }
    Ok(response.body(task_response(alert.as_ref(), task.as_ref())?))
}

/// PUT /task/{id}
///
/// Past due dates are accepted here so overdue tasks remain editable.
pub async fn update_task(
    data: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Form<TaskForm>,
) -> Result<HttpResponse, AppError> {
    let raw_id = path.into_inner();
    info!("Updating task {}", raw_id);
    let form = form.into_inner();
    let validity = TaskValidator::for_update(&form.title, form.description(), &form.due_date, &form.status);
    let status = match validity.status() {
        Some(status) if validity.is_valid() => status,
        _ => return rejected_update(&data, &raw_id, &validity).await,
    };

    let failure = Alert::danger("Error", format!("Failed to update task with ID {}", raw_id));
    let Some(id) = parse_id(&raw_id) else {
        return Ok(html(task_response(Some(&failure), None)?));
    };

    let task = Task {
        id,
        description: form.description().map(str::to_string),
        title: form.title,
        status,
        due_date: form.due_date,
    };
    let repository = data.task_repository()?;
    let updated = web::block(move || repository.update(task)).await??;

    let alert = match &updated {
        Some(task) => Alert::success("Task Updated", format!("Task \"{}\" updated successfully!", task.title)),
        None => failure,
    };
    Ok(html(task_response(Some(&alert), updated.as_ref())?))
}

/// DELETE /task/{id}
///
/// `HX-Trigger: taskDeleted` is sent whether or not a row was removed.
pub async fn delete_task(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let raw_id = path.into_inner();
    info!("Deleting task {}", raw_id);

    let deleted = match parse_id(&raw_id) {
        Some(id) => {
            let repository = data.task_repository()?;
            web::block(move || repository.delete(id)).await??
        }
        None => false,
    };

    let alert = if deleted {
        Alert::success("Task Deleted", format!("Task with ID {} has been deleted successfully.", raw_id))
    } else {
        Alert::danger("Error", format!("Failed to delete task with ID {}", raw_id))
    };

    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .insert_header((HX_TRIGGER, TASK_DELETED_EVENT))
        .body(alert.render()?))
}

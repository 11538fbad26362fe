// src/form_route.rs

use actix_web::{web, HttpResponse};
use askama::Template;
use log::info;

use crate::app_state::AppState;
use crate::components::{Alert, CreateTaskForm, DeleteTaskForm, FragmentResponse, SearchTasksForm, UpdateTaskForm};
use crate::error::AppError;
use crate::models::Task;
use crate::task_route::{html, parse_id};

async fn load_task(data: &AppState, raw_id: &str) -> Result<Option<Task>, AppError> {
    let Some(id) = parse_id(raw_id) else {
        return Ok(None);
    };
    let repository = data.task_repository()?;
    Ok(web::block(move || repository.read(id)).await??)
}

fn load_failure(raw_id: &str) -> Result<HttpResponse, AppError> {
    let alert = Alert::danger("Error", format!("Failed to load task with ID {}", raw_id));
    Ok(html(FragmentResponse::render_parts(Some(&alert), None)?))
}

/// GET /form/create
pub async fn get_create_task_form() -> Result<HttpResponse, AppError> {
    Ok(html(CreateTaskForm::new().render()?))
}

/// GET /form/search
pub async fn get_search_tasks_form() -> Result<HttpResponse, AppError> {
    Ok(html(SearchTasksForm.render()?))
}

/// GET /form/update/{id}
pub async fn get_update_task_form(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let raw_id = path.into_inner();
    info!("Loading update form for task {}", raw_id);

    match load_task(&data, &raw_id).await? {
        Some(task) => {
            let form = UpdateTaskForm::new(&task).render()?;
            Ok(html(FragmentResponse::render_parts(None, Some(form))?))
        }
        None => load_failure(&raw_id),
    }
}

/// GET /form/delete/{id}
pub async fn get_delete_task_form(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let raw_id = path.into_inner();
    info!("Loading delete form for task {}", raw_id);

    match load_task(&data, &raw_id).await? {
        Some(task) => {
            let form = DeleteTaskForm { task_id: task.id }.render()?;
            Ok(html(FragmentResponse::render_parts(None, Some(form))?))
        }
        None => load_failure(&raw_id),
    }
}

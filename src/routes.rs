use actix_web::web;

use crate::form_route::{get_create_task_form, get_delete_task_form, get_search_tasks_form, get_update_task_form};
use crate::task_route::{create_task, delete_task, get_all_tasks, get_task_by_id, search_tasks, update_task};

/// Mounts the `/task` and `/form` scopes. Shared by `main` and the tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // TASKS
        .service(
            web::scope("/task")
                .route("", web::post().to(create_task))
                .route("", web::get().to(get_all_tasks))
                .route("/search", web::post().to(search_tasks))
                .route("/{id}", web::get().to(get_task_by_id))
                .route("/{id}", web::put().to(update_task))
                .route("/{id}", web::delete().to(delete_task)),
        )
        // FORMS
        .service(
            web::scope("/form")
                .route("/create", web::get().to(get_create_task_form))
                .route("/search", web::get().to(get_search_tasks_form))
                .route("/update/{id}", web::get().to(get_update_task_form))
                .route("/delete/{id}", web::get().to(get_delete_task_form)),
        );
}

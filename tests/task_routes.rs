use std::sync::Arc;

use actix_web::{body::MessageBody, dev::ServiceResponse, http::StatusCode, test, web, App};
use taskline::app_state::AppState;
use taskline::container::{Container, DependencyOverrides};
use taskline::db_context::IN_MEMORY_PATH;
use taskline::error::StorageError;
use taskline::models::{NewTask, Task, TaskStatus};
use taskline::repository::{Repository, SharedTaskRepository};
use taskline::routes;

fn test_state(overrides: DependencyOverrides) -> AppState {
    let container = Container::create_test_container(IN_MEMORY_PATH, overrides).unwrap();
    AppState::new(Arc::new(container))
}

fn repository(state: &AppState) -> SharedTaskRepository {
    state.task_repository().unwrap()
}

fn seed(state: &AppState, title: &str, due_date: &str) -> Task {
    repository(state)
        .create(NewTask {
            title: title.to_string(),
            description: Some("Seeded".to_string()),
            status: TaskStatus::Overdue,
            due_date: due_date.to_string(),
        })
        .unwrap()
        .unwrap()
}

async fn body_text<B: MessageBody>(response: ServiceResponse<B>) -> String {
    let bytes = test::read_body(response).await;
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn hx_trigger<B>(response: &ServiceResponse<B>) -> Option<String> {
    response
        .headers()
        .get("HX-Trigger")
        .map(|value| value.to_str().unwrap().to_string())
}

/// Repository double whose every call fails, or whose create yields no row.
struct BrokenRepository {
    create_yields_nothing: bool,
}

impl Repository<Task> for BrokenRepository {
    type New = NewTask;

    fn init(&self) -> Result<(), StorageError> {
        Ok(())
    }

    fn create(&self, _entity: NewTask) -> Result<Option<Task>, StorageError> {
        if self.create_yields_nothing {
            Ok(None)
        } else {
            Err(StorageError::Closed)
        }
    }

    fn read(&self, _id: i64) -> Result<Option<Task>, StorageError> {
        Err(StorageError::Closed)
    }

    fn read_all(&self) -> Result<Vec<Task>, StorageError> {
        Err(StorageError::Closed)
    }

    fn update(&self, _entity: Task) -> Result<Option<Task>, StorageError> {
        Err(StorageError::Closed)
    }

    fn delete(&self, _id: i64) -> Result<bool, StorageError> {
        Err(StorageError::Closed)
    }
}

fn broken(create_yields_nothing: bool) -> DependencyOverrides {
    DependencyOverrides {
        task_repository: Some(Arc::new(BrokenRepository { create_yields_nothing })),
    }
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .configure(routes::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn test_create_task_renders_alert_and_card() {
    let state = test_state(DependencyOverrides::default());
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/task")
        .set_form(vec![
            ("title", "Integration Test Task"),
            ("description", "Testing integration"),
            ("status", "overdue"),
            ("dueDate", "2099-12-31"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("Task Created"));
    assert!(html.contains("created successfully!"));
    assert!(html.contains("Integration Test Task"));
    assert!(html.contains("hx-swap-oob=\"beforeend:#alerts\""));

    let tasks = repository(&state).read_all().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Integration Test Task");
    assert_eq!(tasks[0].status, TaskStatus::Overdue);
    assert!(html.contains(&format!("id=\"task-{}\"", tasks[0].id)));
}

#[actix_web::test]
async fn test_create_accepts_snake_case_due_date() {
    let state = test_state(DependencyOverrides::default());
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/task")
        .set_form(vec![
            ("title", "Legacy form"),
            ("status", "completed"),
            ("due_date", "2099-01-01T10:00"),
        ])
        .to_request();
    let html = body_text(test::call_service(&app, req).await).await;

    assert!(html.contains("Task Created"));
    let tasks = repository(&state).read_all().unwrap();
    assert_eq!(tasks[0].due_date, "2099-01-01T10:00");
    assert_eq!(tasks[0].description, None);
}

#[actix_web::test]
async fn test_invalid_create_is_not_persisted() {
    let state = test_state(DependencyOverrides::default());
    let app = init_app!(state);

    let long_description = "a".repeat(1001);
    let req = test::TestRequest::post()
        .uri("/task")
        .set_form(vec![
            ("title", ""),
            ("description", long_description.as_str()),
            ("status", "invalid-status"),
            ("dueDate", "invalid-date"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("Validation Error"));
    assert!(html.contains(
        "Title is required, Description must be less than 1000 characters, Invalid date format, Invalid task status"
    ));
    assert!(repository(&state).read_all().unwrap().is_empty());
}

#[actix_web::test]
async fn test_create_rejects_past_due_date() {
    let state = test_state(DependencyOverrides::default());
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/task")
        .set_form(vec![("title", "Too late"), ("status", "overdue"), ("dueDate", "2000-01-01")])
        .to_request();
    let html = body_text(test::call_service(&app, req).await).await;

    assert!(html.contains("Due date cannot be in the past"));
    assert!(repository(&state).read_all().unwrap().is_empty());
}

#[actix_web::test]
async fn test_create_reports_missing_row() {
    let state = test_state(broken(true));
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/task")
        .set_form(vec![("title", "Lost"), ("status", "overdue"), ("dueDate", "2099-01-01")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Failed to create task"));
}

#[actix_web::test]
async fn test_create_storage_failure_is_500_with_alert() {
    let state = test_state(broken(false));
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/task")
        .set_form(vec![("title", "Doomed"), ("status", "overdue"), ("dueDate", "2099-01-01")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(resp).await.contains("Failed to create task"));
}

#[actix_web::test]
async fn test_other_storage_failures_are_500() {
    let state = test_state(broken(false));
    let app = init_app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/task").to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/task/1").to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn test_get_task_by_id() {
    let state = test_state(DependencyOverrides::default());
    let task = seed(&state, "Find me", "2099-12-31");
    let app = init_app!(state);

    let req = test::TestRequest::get().uri(&format!("/task/{}", task.id)).to_request();
    let html = body_text(test::call_service(&app, req).await).await;
    assert!(html.contains("Find me"));
    assert!(!html.contains("alert-danger"));

    let req = test::TestRequest::get().uri("/task/999").to_request();
    let html = body_text(test::call_service(&app, req).await).await;
    assert!(html.contains("No task found with ID 999"));
    assert!(!html.contains("class=\"card\""));

    let req = test::TestRequest::get().uri("/task/abc").to_request();
    let html = body_text(test::call_service(&app, req).await).await;
    assert!(html.contains("No task found with ID abc"));
}

#[actix_web::test]
async fn test_get_all_tasks_concatenates_cards() {
    let state = test_state(DependencyOverrides::default());
    let app = init_app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/task").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "");

    let first = seed(&state, "First task", "2099-01-01");
    let second = seed(&state, "Second task", "2099-01-02");

    let resp = test::call_service(&app, test::TestRequest::get().uri("/task").to_request()).await;
    let html = body_text(resp).await;
    assert_eq!(html.matches("class=\"card\"").count(), 2);
    assert!(html.contains(&format!("id=\"task-{}\"", first.id)));
    assert!(html.contains(&format!("id=\"task-{}\"", second.id)));
    assert!(!html.contains("alert"));
}

#[actix_web::test]
async fn test_search_found_has_no_trigger() {
    let state = test_state(DependencyOverrides::default());
    let task = seed(&state, "Searchable", "2099-12-31");
    let app = init_app!(state);

    let id = task.id.to_string();
    let req = test::TestRequest::post()
        .uri("/task/search")
        .set_form(vec![("id", id.as_str())])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(hx_trigger(&resp), None);
    assert!(body_text(resp).await.contains("Searchable"));
}

#[actix_web::test]
async fn test_search_missing_signals_failure() {
    let state = test_state(DependencyOverrides::default());
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/task/search")
        .set_form(vec![("id", "42")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(hx_trigger(&resp).as_deref(), Some("taskSearchFailed"));
    let html = body_text(resp).await;
    assert!(html.contains("Not Found"));
    assert!(html.contains("No task found with ID 42."));
}

#[actix_web::test]
async fn test_search_invalid_id_signals_failure() {
    let state = test_state(DependencyOverrides::default());
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/task/search")
        .set_form(vec![("id", "abc")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(hx_trigger(&resp).as_deref(), Some("taskSearchFailed"));
    let html = body_text(resp).await;
    assert!(html.contains("Validation Error"));
    assert!(html.contains("Invalid ID abc provided for search."));
}

#[actix_web::test]
async fn test_update_allows_past_due_date() {
    let state = test_state(DependencyOverrides::default());
    let task = seed(&state, "Before update", "2099-12-31");
    let app = init_app!(state);

    let req = test::TestRequest::put()
        .uri(&format!("/task/{}", task.id))
        .set_form(vec![
            ("title", "After update"),
            ("description", ""),
            ("status", "completed"),
            ("dueDate", "2000-01-01T08:00"),
        ])
        .to_request();
    let html = body_text(test::call_service(&app, req).await).await;

    assert!(html.contains("Task Updated"));
    assert!(html.contains("After update"));

    let stored = repository(&state).read(task.id).unwrap().unwrap();
    assert_eq!(stored.title, "After update");
    assert_eq!(stored.description, None);
    assert_eq!(stored.status, TaskStatus::Completed);
    assert_eq!(stored.due_date, "2000-01-01T08:00");
}

#[actix_web::test]
async fn test_update_missing_task() {
    let state = test_state(DependencyOverrides::default());
    let existing = seed(&state, "Untouched", "2099-12-31");
    let app = init_app!(state);

    let req = test::TestRequest::put()
        .uri("/task/999")
        .set_form(vec![("title", "Ghost"), ("status", "overdue"), ("dueDate", "2099-01-01")])
        .to_request();
    let html = body_text(test::call_service(&app, req).await).await;

    assert!(html.contains("Failed to update task with ID 999"));
    assert_eq!(repository(&state).read_all().unwrap(), vec![existing]);
}

#[actix_web::test]
async fn test_invalid_update_is_not_persisted() {
    let state = test_state(DependencyOverrides::default());
    let existing = seed(&state, "Stays the same", "2099-12-31");
    let app = init_app!(state);

    let req = test::TestRequest::put()
        .uri(&format!("/task/{}", existing.id))
        .set_form(vec![("title", "ab"), ("status", "pending"), ("dueDate", "2099-01-01")])
        .to_request();
    let html = body_text(test::call_service(&app, req).await).await;

    assert!(html.contains("Validation Error"));
    assert!(html.contains("Title must be at least 3 characters, Invalid task status"));
    assert_eq!(repository(&state).read(existing.id).unwrap(), Some(existing));
}

#[actix_web::test]
async fn test_rejected_update_keeps_current_card() {
    let state = test_state(DependencyOverrides::default());
    let existing = seed(&state, "Still here", "2099-12-31");
    let app = init_app!(state);

    let req = test::TestRequest::put()
        .uri(&format!("/task/{}", existing.id))
        .set_form(vec![("title", "ab"), ("status", "completed"), ("dueDate", "2099-01-01")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("Title must be at least 3 characters"));
    assert!(html.contains(&format!("id=\"task-{}\"", existing.id)));
    assert!(html.contains("Still here"));
    assert_eq!(html.matches("class=\"card\"").count(), 1);
}

#[actix_web::test]
async fn test_update_with_non_numeric_id() {
    let state = test_state(DependencyOverrides::default());
    let existing = seed(&state, "Untouched", "2099-12-31");
    let app = init_app!(state);

    let req = test::TestRequest::put()
        .uri("/task/abc")
        .set_form(vec![("title", "Valid title"), ("status", "overdue"), ("dueDate", "2099-01-01")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("Failed to update task with ID abc"));
    assert!(!html.contains("class=\"card\""));
    assert_eq!(repository(&state).read_all().unwrap(), vec![existing]);
}

#[actix_web::test]
async fn test_delete_always_triggers_event() {
    let state = test_state(DependencyOverrides::default());
    let task = seed(&state, "Delete me", "2099-12-31");
    let app = init_app!(state);
    let uri = format!("/task/{}", task.id);

    let resp = test::call_service(&app, test::TestRequest::delete().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(hx_trigger(&resp).as_deref(), Some("taskDeleted"));
    let html = body_text(resp).await;
    assert!(html.contains(&format!("Task with ID {} has been deleted successfully.", task.id)));
    assert!(repository(&state).read_all().unwrap().is_empty());

    // Second delete fails but still notifies the client
    let resp = test::call_service(&app, test::TestRequest::delete().uri(&uri).to_request()).await;
    assert_eq!(hx_trigger(&resp).as_deref(), Some("taskDeleted"));
    let html = body_text(resp).await;
    assert!(html.contains(&format!("Failed to delete task with ID {}", task.id)));
    assert!(html.contains("alert-danger"));
}

#[actix_web::test]
async fn test_delete_with_non_numeric_id_still_triggers_event() {
    let state = test_state(DependencyOverrides::default());
    let existing = seed(&state, "Survivor", "2099-12-31");
    let app = init_app!(state);

    let resp = test::call_service(&app, test::TestRequest::delete().uri("/task/abc").to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(hx_trigger(&resp).as_deref(), Some("taskDeleted"));
    let html = body_text(resp).await;
    assert!(html.contains("Failed to delete task with ID abc"));
    assert!(html.contains("alert-danger"));
    assert_eq!(repository(&state).read_all().unwrap(), vec![existing]);
}

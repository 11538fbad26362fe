use std::sync::Arc;

use log::{debug, info};

use crate::db_context::DbContext;
use crate::error::StorageError;
use crate::models::{NewTask, Task, TaskStatus};

/// CRUD capability over one entity type.
///
/// Absence is reported as `None`/`false`, never as an error.
pub trait Repository<E>: Send + Sync {
    type New;

    /// Creates the backing table if it is missing.
    fn init(&self) -> Result<(), StorageError>;
    fn create(&self, entity: Self::New) -> Result<Option<E>, StorageError>;
    fn read(&self, id: i64) -> Result<Option<E>, StorageError>;
    fn read_all(&self) -> Result<Vec<E>, StorageError>;
    fn update(&self, entity: E) -> Result<Option<E>, StorageError>;
    fn delete(&self, id: i64) -> Result<bool, StorageError>;
}

/// How handlers hold the task repository, so a test double can stand in.
pub type SharedTaskRepository = Arc<dyn Repository<Task, New = NewTask>>;

pub struct TaskRepository {
    db: Arc<DbContext>,
}

impl TaskRepository {
    pub fn new(db: Arc<DbContext>) -> Self {
        TaskRepository { db }
    }

    /// Opens `path`, creating the tasks table on the way.
    pub fn open(path: &str) -> Result<Self, StorageError> {
        let repository = TaskRepository::new(Arc::new(DbContext::open(path)?));
        repository.init()?;
        Ok(repository)
    }

    pub fn db(&self) -> &DbContext {
        &self.db
    }

    pub fn close(&self) -> Result<(), StorageError> {
        self.db.close()
    }
}

fn stored_description(description: &Option<String>) -> Option<&str> {
    description.as_deref().filter(|d| !d.is_empty())
}

impl Repository<Task> for TaskRepository {
    type New = NewTask;

    fn init(&self) -> Result<(), StorageError> {
        self.db.execute(&format!(
            "CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT,
                status TEXT NOT NULL CHECK (status IN ({})),
                due_date TEXT NOT NULL
            );",
            TaskStatus::sql_list()
        ))
    }

    fn create(&self, entity: NewTask) -> Result<Option<Task>, StorageError> {
        self.db.transaction(|| {
            self.db.execute_with(
                "INSERT INTO tasks (title, description, status, due_date)
                 VALUES ($title, $description, $status, $due_date);",
                &[
                    ("$title", &entity.title),
                    ("$description", &stored_description(&entity.description)),
                    ("$status", &entity.status),
                    ("$due_date", &entity.due_date),
                ],
            )?;

            let Some(id) = self.db.last_inserted_id()? else {
                return Ok(None);
            };
            info!("Task created with id {}", id);
            self.read(id)
        })
    }

    fn read(&self, id: i64) -> Result<Option<Task>, StorageError> {
        self.db.query_one("SELECT * FROM tasks WHERE id = $id;", &[("$id", &id)])
    }

    fn read_all(&self) -> Result<Vec<Task>, StorageError> {
        self.db.query("SELECT * FROM tasks;", &[])
    }

    fn update(&self, entity: Task) -> Result<Option<Task>, StorageError> {
        self.db.transaction(|| {
            if self.read(entity.id)?.is_none() {
                debug!("Update skipped, task {} does not exist", entity.id);
                return Ok(None);
            }

            self.db.execute_with(
                "UPDATE tasks SET
                    title = $title,
                    description = $description,
                    status = $status,
                    due_date = $due_date
                 WHERE id = $id;",
                &[
                    ("$id", &entity.id),
                    ("$title", &entity.title),
                    ("$description", &stored_description(&entity.description)),
                    ("$status", &entity.status),
                    ("$due_date", &entity.due_date),
                ],
            )?;

            self.read(entity.id)
        })
    }

    fn delete(&self, id: i64) -> Result<bool, StorageError> {
        self.db.transaction(|| {
            if self.read(id)?.is_none() {
                debug!("Delete skipped, task {} does not exist", id);
                return Ok(false);
            }

            self.db.execute_with("DELETE FROM tasks WHERE id = $id;", &[("$id", &id)])?;

            Ok(self.read(id)?.is_none())
        })
    }
}

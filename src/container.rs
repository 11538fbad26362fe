use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info};
use parking_lot::RwLock;

use crate::error::ContainerError;
use crate::repository::{SharedTaskRepository, TaskRepository};

pub const TASK_REPOSITORY: &str = "taskRepository";

type Registration = Box<dyn Any + Send + Sync>;

/// Typed view over the registrations handlers need.
#[derive(Clone)]
pub struct Dependencies {
    pub task_repository: SharedTaskRepository,
}

/// Registrations that replace the defaults in a test container.
#[derive(Default)]
pub struct DependencyOverrides {
    pub task_repository: Option<SharedTaskRepository>,
}

/// Registry that maps dependency names to shared instances.
///
/// One container is built in `main` and handed to the routes through
/// `web::Data`; tests build their own with [`Container::create_test_container`].
pub struct Container {
    database_path: String,
    dependencies: RwLock<HashMap<String, Registration>>,
}

impl Container {
    pub fn new(database_path: impl Into<String>) -> Result<Self, ContainerError> {
        let container = Container {
            database_path: database_path.into(),
            dependencies: RwLock::new(HashMap::new()),
        };
        container.register_defaults()?;
        Ok(container)
    }

    fn register_defaults(&self) -> Result<(), ContainerError> {
        let repository: SharedTaskRepository = Arc::new(TaskRepository::open(&self.database_path)?);
        self.set(TASK_REPOSITORY, repository);
        info!("Registered default dependencies for {}", self.database_path);
        Ok(())
    }

    /// Looks up a registration by key. Fails when the key was never registered
    /// or was registered with another type.
    pub fn get<T: Clone + 'static>(&self, key: &str) -> Result<T, ContainerError> {
        let dependencies = self.dependencies.read();
        let registration = dependencies
            .get(key)
            .ok_or_else(|| ContainerError::NotFound(key.to_string()))?;
        registration
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| ContainerError::TypeMismatch(key.to_string()))
    }

    pub fn set<T: Send + Sync + 'static>(&self, key: &str, value: T) {
        debug!("Registering dependency '{}'", key);
        self.dependencies.write().insert(key.to_string(), Box::new(value));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.dependencies.read().contains_key(key)
    }

    pub fn dependencies(&self) -> Result<Dependencies, ContainerError> {
        Ok(Dependencies {
            task_repository: self.get(TASK_REPOSITORY)?,
        })
    }

    /// Drops every registration and registers the defaults again.
    pub fn reset(&self) -> Result<(), ContainerError> {
        self.dependencies.write().clear();
        self.register_defaults()
    }

    /// Builds an independent container seeded with the defaults, then the overrides.
    pub fn create_test_container(
        database_path: impl Into<String>,
        overrides: DependencyOverrides,
    ) -> Result<Self, ContainerError> {
        let container = Container::new(database_path)?;
        if let Some(repository) = overrides.task_repository {
            container.set(TASK_REPOSITORY, repository);
        }
        Ok(container)
    }
}

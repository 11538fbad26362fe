use crate::container::Container;
use crate::error::ContainerError;
use crate::repository::SharedTaskRepository;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub container: Arc<Container>,
}

impl AppState {
    pub fn new(container: Arc<Container>) -> Self {
        AppState { container }
    }

    pub fn task_repository(&self) -> Result<SharedTaskRepository, ContainerError> {
        Ok(self.container.dependencies()?.task_repository)
    }
}

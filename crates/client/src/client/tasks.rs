//! Task API client methods

use super::{ApiClient, ClientError};
use crate::types::{CompletionPatch, NewTask, Task, TaskUpdate};

impl ApiClient {
    /// List the caller's tasks
    pub async fn list_tasks(&self) -> Result<Vec<Task>, ClientError> {
        self.get("tasks/").await
    }

    /// Get a single task
    pub async fn get_task(&self, id: u64) -> Result<Task, ClientError> {
        self.get(&format!("tasks/{id}/")).await
    }

    /// Create a task
    pub async fn create_task(&self, task: &NewTask) -> Result<Task, ClientError> {
        self.post("tasks/", task).await
    }

    /// Replace a task's title and deadline
    pub async fn update_task(&self, id: u64, update: &TaskUpdate) -> Result<Task, ClientError> {
        self.put(&format!("tasks/{id}/"), update).await
    }

    /// Mark a task completed or pending
    pub async fn set_completed(&self, id: u64, completed: bool) -> Result<Task, ClientError> {
        self.patch(&format!("tasks/{id}/"), &CompletionPatch { completed })
            .await
    }

    /// Delete a task
    pub async fn delete_task(&self, id: u64) -> Result<(), ClientError> {
        self.delete(&format!("tasks/{id}/")).await
    }
}

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::db::DocumentStore;
use crate::error::AppError;
use crate::models::{EmpId, Employee, Task, TaskList};

#[derive(Clone)]
pub struct EmployeeRepository {
    store: Arc<dyn DocumentStore>,
    timeout: Duration,
}

impl EmployeeRepository {
    pub fn new(store: Arc<dyn DocumentStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn find_by_id(&self, emp_id: EmpId) -> Result<Employee, AppError> {
        self.bounded(emp_id, self.store.find_employee(emp_id))
            .await?
            .ok_or_else(|| not_found(emp_id))
    }

    pub async fn find_all_tasks(&self, emp_id: EmpId) -> Result<TaskList, AppError> {
        self.bounded(emp_id, self.store.find_tasks(emp_id))
            .await?
            .ok_or_else(|| not_found(emp_id))
    }

    /// Pushes a new task onto the employee's `todo` list and returns its id.
    pub async fn append_task(&self, emp_id: EmpId, text: &str) -> Result<String, AppError> {
        let text = text.trim();
        if text.is_empty() {
            warn!("rejected empty task text for employee {}", emp_id);
            return Err(AppError::InvalidArgument(
                "Task text must not be empty".to_string(),
            ));
        }

        let task = Task {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
        };

        let pushed = self.bounded(emp_id, self.store.push_todo(emp_id, &task)).await?;
        if !pushed {
            return Err(not_found(emp_id));
        }

        info!("created task {} for employee {}", task.id, emp_id);
        Ok(task.id)
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        match tokio::time::timeout(self.timeout, self.store.ping()).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Unavailable("health check timed out".to_string())),
        }
    }

    pub async fn close(&self) {
        self.store.close().await;
    }

    async fn bounded<T, F>(&self, emp_id: EmpId, call: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        let result = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Unavailable(format!(
                "store did not answer within {:?}",
                self.timeout
            ))),
        };

        result.map_err(|e| {
            let unreachable = matches!(
                e,
                AppError::Database(
                    sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
                )
            );
            let e = if unreachable {
                AppError::Unavailable(e.to_string())
            } else {
                e
            };
            if matches!(e, AppError::Unavailable(_) | AppError::Database(_)) {
                error!("store call failed for employee {}: {}", emp_id, e);
            }
            e
        })
    }
}

fn not_found(emp_id: EmpId) -> AppError {
    warn!("employee not found: {}", emp_id);
    AppError::NotFound("Employee not found".to_string())
}

use std::sync::Arc;

use tracing::warn;

use crate::client::session::{self, MarkerJar};
use crate::client::{ClientError, TaskApi};
use crate::models::{EmpId, Task};

pub const SIGN_IN_PROMPT: &str = "Please sign in to view your tasks.";
pub const LOAD_FAILURE_MESSAGE: &str = "Unable to load your tasks, please try again.";
pub const CREATE_FAILURE_MESSAGE: &str = "Unable to create the task, please try again.";

#[derive(Debug, Clone, PartialEq)]
pub enum BoardView {
    /// No usable session marker; the user has to sign in first.
    SignedOut,
    Ready {
        emp_id: EmpId,
        todo: Vec<Task>,
        done: Vec<Task>,
    },
    Failed {
        emp_id: EmpId,
        message: String,
    },
}

/// Two-column task board scoped to the employee named by the session marker.
pub struct TaskBoard {
    api: Arc<dyn TaskApi>,
    view: BoardView,
    notice: Option<String>,
}

impl TaskBoard {
    /// Reads the session marker and fetches that employee's tasks. The marker
    /// is not re-validated up front; a stale one shows up as a failed load.
    pub async fn load(api: Arc<dyn TaskApi>, jar: &MarkerJar) -> Self {
        let Some(emp_id) = session::current_emp_id(jar) else {
            warn!("task board opened without a usable session marker");
            return Self {
                api,
                view: BoardView::SignedOut,
                notice: Some(SIGN_IN_PROMPT.to_string()),
            };
        };

        let view = match api.find_all_tasks(emp_id).await {
            Ok(tasks) => BoardView::Ready {
                emp_id,
                todo: tasks.todo,
                done: tasks.done,
            },
            Err(e) => {
                warn!("unable to get task data for employee {}: {}", emp_id, e);
                BoardView::Failed {
                    emp_id,
                    message: e.server_message().unwrap_or(LOAD_FAILURE_MESSAGE).to_string(),
                }
            }
        };

        Self {
            api,
            view,
            notice: None,
        }
    }

    pub fn view(&self) -> &BoardView {
        &self.view
    }

    /// Last user-facing problem, if any.
    pub fn notice(&self) -> Option<&str> {
        match &self.view {
            BoardView::Failed { message, .. } => Some(message.as_str()),
            _ => self.notice.as_deref(),
        }
    }

    pub fn todo(&self) -> &[Task] {
        match &self.view {
            BoardView::Ready { todo, .. } => todo.as_slice(),
            _ => &[],
        }
    }

    pub fn done(&self) -> &[Task] {
        match &self.view {
            BoardView::Ready { done, .. } => done.as_slice(),
            _ => &[],
        }
    }

    /// Creates a task on the server and shows it in the `todo` column using
    /// the returned id.
    pub async fn create_task(&mut self, text: &str) -> Result<String, ClientError> {
        let emp_id = match &self.view {
            BoardView::Ready { emp_id, .. } => *emp_id,
            BoardView::Failed { message, .. } => {
                return Err(ClientError::NotLoaded(message.clone()));
            }
            BoardView::SignedOut => {
                self.notice = Some(SIGN_IN_PROMPT.to_string());
                return Err(ClientError::SignedOut);
            }
        };

        match self.api.create_task(emp_id, text).await {
            Ok(created) => {
                if let BoardView::Ready { todo, .. } = &mut self.view {
                    todo.push(Task {
                        id: created.id.clone(),
                        text: text.trim().to_string(),
                    });
                }
                self.notice = None;
                Ok(created.id)
            }
            Err(e) => {
                warn!("unable to create task for employee {}: {}", emp_id, e);
                self.notice = Some(
                    e.server_message()
                        .unwrap_or(CREATE_FAILURE_MESSAGE)
                        .to_string(),
                );
                Err(e)
            }
        }
    }
}

pub mod board;
pub mod session;
pub mod signin;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::error::ErrorResponse;
use crate::models::{CreatedTask, EmpId, Employee, NewTaskRequest, TaskList};

pub use board::{BoardView, TaskBoard};
pub use session::MarkerJar;
pub use signin::{SignIn, SignInState};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed with status {status}")]
    Api { status: u16, message: Option<String> },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("no employee is signed in")]
    SignedOut,

    #[error("the task board did not load: {0}")]
    NotLoaded(String),
}

impl ClientError {
    /// The message the server attached to the failure, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Api { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The employee/task endpoints as seen from the client.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn find_employee_by_id(&self, emp_id: EmpId) -> Result<Employee, ClientError>;
    async fn find_all_tasks(&self, emp_id: EmpId) -> Result<TaskList, ClientError>;
    async fn create_task(&self, emp_id: EmpId, text: &str) -> Result<CreatedTask, ClientError>;
}

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    async fn read<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let message = response
            .json::<ErrorResponse>()
            .await
            .ok()
            .map(|body| body.message)
            .filter(|m| !m.is_empty());

        tracing::debug!("api call failed: {} {:?}", status, message);
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl TaskApi for ApiClient {
    async fn find_employee_by_id(&self, emp_id: EmpId) -> Result<Employee, ClientError> {
        let url = format!("{}/employees/{}", self.base_url, emp_id);
        let response = self.client.get(&url).send().await?;
        Self::read(response).await
    }

    async fn find_all_tasks(&self, emp_id: EmpId) -> Result<TaskList, ClientError> {
        let url = format!("{}/employees/{}/tasks", self.base_url, emp_id);
        let response = self.client.get(&url).send().await?;
        Self::read(response).await
    }

    async fn create_task(&self, emp_id: EmpId, text: &str) -> Result<CreatedTask, ClientError> {
        let url = format!("{}/employees/{}/tasks", self.base_url, emp_id);
        let body = NewTaskRequest {
            text: text.to_string(),
        };
        let response = self.client.post(&url).json(&body).send().await?;
        Self::read(response).await
    }
}

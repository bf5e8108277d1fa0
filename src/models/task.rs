use serde::{Deserialize, Serialize};

use crate::models::EmpId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub text: String,
}

/// The `{ empId, todo, done }` projection of an employee document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    pub emp_id: EmpId,
    pub todo: Vec<Task>,
    pub done: Vec<Task>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTaskRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedTask {
    pub id: String,
}

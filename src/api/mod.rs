use axum::Json;
use axum::extract::Path;
use axum::extract::rejection::JsonRejection;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use tracing::warn;

use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/employees/{emp_id}", get(find_employee_by_id))
        .route("/employees/{emp_id}/tasks", get(find_all_tasks).post(create_task))
        .with_state(state)
}

fn parse_emp_id(raw: &str) -> Result<EmpId, AppError> {
    raw.parse::<EmpId>().inspect_err(|_| {
        warn!("rejected non-numeric employee id: {:?}", raw);
    })
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.employees.ping().await?;
    Ok(StatusCode::OK)
}

async fn find_employee_by_id(
    State(state): State<AppState>,
    Path(emp_id): Path<String>,
) -> Result<Json<Employee>, AppError> {
    let emp_id = parse_emp_id(&emp_id)?;
    let employee = state.employees.find_by_id(emp_id).await?;
    Ok(Json(employee))
}

async fn find_all_tasks(
    State(state): State<AppState>,
    Path(emp_id): Path<String>,
) -> Result<Json<TaskList>, AppError> {
    let emp_id = parse_emp_id(&emp_id)?;
    let tasks = state.employees.find_all_tasks(emp_id).await?;
    Ok(Json(tasks))
}

async fn create_task(
    State(state): State<AppState>,
    Path(emp_id): Path<String>,
    body: Result<Json<NewTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedTask>), AppError> {
    let emp_id = parse_emp_id(&emp_id)?;
    let Json(req) = body.map_err(|rejection| {
        warn!("rejected task body for employee {}: {}", emp_id, rejection.body_text());
        AppError::InvalidArgument("Request body must be JSON with a text field".to_string())
    })?;
    let id = state.employees.append_task(emp_id, &req.text).await?;
    Ok((StatusCode::CREATED, Json(CreatedTask { id })))
}

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::types::Json;
use sqlx::{FromRow, SqlitePool};

use crate::error::AppError;
use crate::models::{EmpId, Employee, Task, TaskList};

/// Access to the employee collection.
///
/// Implementations must apply `push_todo` as a single atomic document update
/// so that concurrent appends for one employee never lose a task.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_employee(&self, emp_id: EmpId) -> Result<Option<Employee>, AppError>;

    async fn find_tasks(&self, emp_id: EmpId) -> Result<Option<TaskList>, AppError>;

    /// Appends `task` to the employee's `todo` list. Returns `false` when no
    /// employee matches `emp_id`.
    async fn push_todo(&self, emp_id: EmpId, task: &Task) -> Result<bool, AppError>;

    /// Inserts a new employee document. Returns `false` if `empId` is taken.
    async fn insert_employee(&self, employee: &Employee) -> Result<bool, AppError>;

    async fn ping(&self) -> Result<(), AppError>;

    async fn close(&self);
}

#[derive(FromRow)]
struct EmployeeRow {
    emp_id: i64,
    first_name: String,
    last_name: String,
    todo: Json<Vec<Task>>,
    done: Json<Vec<Task>>,
}

impl EmployeeRow {
    fn into_employee(self) -> Result<Employee, AppError> {
        Ok(Employee {
            emp_id: EmpId::new(self.emp_id)?,
            first_name: self.first_name,
            last_name: self.last_name,
            todo: self.todo.0,
            done: self.done.0,
        })
    }
}

#[derive(FromRow)]
struct TaskListRow {
    emp_id: i64,
    todo: Json<Vec<Task>>,
    done: Json<Vec<Task>>,
}

/// SQLite-backed store; each employee is one row whose task lists are JSON
/// array columns.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    db: SqlitePool,
}

impl SqliteDocumentStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Opens a pool against `database_url` and runs migrations.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::Database(e.into()))?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn find_employee(&self, emp_id: EmpId) -> Result<Option<Employee>, AppError> {
        let row = sqlx::query_as::<_, EmployeeRow>(
            "SELECT emp_id, first_name, last_name, todo, done FROM employees WHERE emp_id = ?",
        )
        .bind(emp_id.value())
        .fetch_optional(&self.db)
        .await?;

        row.map(EmployeeRow::into_employee).transpose()
    }

    async fn find_tasks(&self, emp_id: EmpId) -> Result<Option<TaskList>, AppError> {
        let row = sqlx::query_as::<_, TaskListRow>(
            "SELECT emp_id, todo, done FROM employees WHERE emp_id = ?",
        )
        .bind(emp_id.value())
        .fetch_optional(&self.db)
        .await?;

        row.map(|r| {
            Ok(TaskList {
                emp_id: EmpId::new(r.emp_id)?,
                todo: r.todo.0,
                done: r.done.0,
            })
        })
        .transpose()
    }

    async fn push_todo(&self, emp_id: EmpId, task: &Task) -> Result<bool, AppError> {
        let affected = sqlx::query(
            r#"
            UPDATE employees
            SET todo = json_insert(todo, '$[#]', json_object('id', ?1, 'text', ?2))
            WHERE emp_id = ?3
            "#,
        )
        .bind(&task.id)
        .bind(&task.text)
        .bind(emp_id.value())
        .execute(&self.db)
        .await?
        .rows_affected();

        Ok(affected > 0)
    }

    async fn insert_employee(&self, employee: &Employee) -> Result<bool, AppError> {
        let affected = sqlx::query(
            r#"
            INSERT INTO employees (emp_id, first_name, last_name, todo, done)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(emp_id) DO NOTHING
            "#,
        )
        .bind(employee.emp_id.value())
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(Json(&employee.todo))
        .bind(Json(&employee.done))
        .execute(&self.db)
        .await?
        .rows_affected();

        Ok(affected > 0)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("select 1").execute(&self.db).await?;
        Ok(())
    }

    async fn close(&self) {
        self.db.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test_store() -> SqliteDocumentStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test db");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        SqliteDocumentStore::new(pool)
    }

    fn han_solo() -> Employee {
        Employee {
            emp_id: EmpId::new(1007).unwrap(),
            first_name: "Han".to_string(),
            last_name: "Solo".to_string(),
            todo: Vec::new(),
            done: vec![Task { id: "t-0".to_string(), text: "Kessel run".to_string() }],
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_employee() {
        let store = setup_test_store().await;
        let employee = han_solo();

        assert!(store.insert_employee(&employee).await.unwrap());
        // second insert with the same empId is ignored
        assert!(!store.insert_employee(&employee).await.unwrap());

        let found = store
            .find_employee(employee.emp_id)
            .await
            .expect("Failed to query")
            .expect("Employee not found");
        assert_eq!(found, employee);

        let missing = store.find_employee(EmpId::new(9999).unwrap()).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_push_todo_appends_in_order() {
        let store = setup_test_store().await;
        let employee = han_solo();
        store.insert_employee(&employee).await.unwrap();

        for (id, text) in [("a", "Fix hyperdrive"), ("b", "Pay Jabba")] {
            let task = Task { id: id.to_string(), text: text.to_string() };
            assert!(store.push_todo(employee.emp_id, &task).await.unwrap());
        }

        let tasks = store.find_tasks(employee.emp_id).await.unwrap().unwrap();
        let ids: Vec<&str> = tasks.todo.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(tasks.done.len(), 1);
    }

    #[tokio::test]
    async fn test_push_todo_unknown_employee() {
        let store = setup_test_store().await;
        let task = Task { id: "x".to_string(), text: "Nothing".to_string() };

        let pushed = store.push_todo(EmpId::new(42).unwrap(), &task).await.unwrap();
        assert!(!pushed);
        assert!(store.find_employee(EmpId::new(42).unwrap()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_text_with_quotes_is_stored_verbatim() {
        let store = setup_test_store().await;
        let employee = han_solo();
        store.insert_employee(&employee).await.unwrap();

        let text = r#"Tell "Chewie" it's {fine}"#;
        let task = Task { id: "q".to_string(), text: text.to_string() };
        store.push_todo(employee.emp_id, &task).await.unwrap();

        let tasks = store.find_tasks(employee.emp_id).await.unwrap().unwrap();
        assert_eq!(tasks.todo[0].text, text);
    }
}

use std::collections::HashSet;
use std::env;
use std::time::Duration;

use dotenvy::dotenv;
use nodebucket::db::{DocumentStore, SqliteDocumentStore};
use nodebucket::error::AppError;
use nodebucket::models::Employee;

fn is_dry_run() -> bool {
    !env::args().any(|a| a == "--apply")
}

fn input_path() -> String {
    env::args()
        .skip(1)
        .find(|a| !a.starts_with("--"))
        .unwrap_or_else(|| "employees.json".to_string())
}

#[derive(Debug, Default, PartialEq)]
struct SeedStats {
    inserted: usize,
    skipped: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let database_url = env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://nodebucket.db".to_string());
    let path = input_path();

    let raw = std::fs::read_to_string(&path)?;
    let employees: Vec<Employee> = serde_json::from_str(&raw)?;
    check_unique(&employees)?;

    let store = SqliteDocumentStore::connect(&database_url, 1, Duration::from_secs(5)).await?;
    let dry_run = is_dry_run();

    let stats = seed(&store, &employees, dry_run).await?;

    println!(
        "Employees {}: {} / {} (skipped {})",
        if dry_run { "to insert" } else { "inserted" },
        stats.inserted,
        employees.len(),
        stats.skipped
    );

    store.close().await;
    Ok(())
}

/// Inserts every employee not already in the store. With `dry_run` nothing
/// is written; the returned counts say what would have happened.
async fn seed(
    store: &dyn DocumentStore,
    employees: &[Employee],
    dry_run: bool,
) -> Result<SeedStats, AppError> {
    let mut stats = SeedStats::default();

    for employee in employees {
        if store.find_employee(employee.emp_id).await?.is_some() {
            println!("Skipping {} ({}): already present", employee.emp_id, employee.display_name());
            stats.skipped += 1;
            continue;
        }

        if dry_run {
            println!("[DRY RUN] Would insert {} ({})", employee.emp_id, employee.display_name());
        } else {
            store.insert_employee(employee).await?;
            println!("Inserted {} ({})", employee.emp_id, employee.display_name());
        }

        stats.inserted += 1;
    }

    Ok(stats)
}

/// Rejects files that list the same empId twice or reuse a task id within
/// one employee.
fn check_unique(employees: &[Employee]) -> Result<(), String> {
    let mut emp_ids = HashSet::new();

    for employee in employees {
        if !emp_ids.insert(employee.emp_id) {
            return Err(format!("duplicate empId {} in input", employee.emp_id));
        }

        let mut task_ids = HashSet::new();
        for task in employee.todo.iter().chain(employee.done.iter()) {
            if !task_ids.insert(task.id.as_str()) {
                return Err(format!(
                    "task id {} appears twice for employee {}",
                    task.id, employee.emp_id
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodebucket::models::{EmpId, Task};

    fn employee(emp_id: i64, first_name: &str) -> Employee {
        Employee {
            emp_id: EmpId::new(emp_id).unwrap(),
            first_name: first_name.to_string(),
            last_name: "Test".to_string(),
            todo: Vec::new(),
            done: Vec::new(),
        }
    }

    async fn setup_test_store() -> SqliteDocumentStore {
        SqliteDocumentStore::connect("sqlite::memory:", 1, Duration::from_secs(5))
            .await
            .expect("Failed to create test store")
    }

    #[test]
    fn test_check_unique_rejects_duplicate_emp_id() {
        let employees = vec![employee(1007, "Han"), employee(1007, "Leia")];

        let err = check_unique(&employees).unwrap_err();
        assert!(err.contains("duplicate empId 1007"), "{err}");
    }

    #[test]
    fn test_check_unique_rejects_duplicate_task_id() {
        let mut han = employee(1007, "Han");
        han.todo.push(Task { id: "t-1".to_string(), text: "Fix hyperdrive".to_string() });
        han.done.push(Task { id: "t-1".to_string(), text: "Kessel run".to_string() });

        let err = check_unique(&[han]).unwrap_err();
        assert!(err.contains("task id t-1"), "{err}");
    }

    #[test]
    fn test_check_unique_accepts_distinct_ids() {
        let mut han = employee(1007, "Han");
        han.todo.push(Task { id: "t-1".to_string(), text: "Fix hyperdrive".to_string() });
        // same task id under a different employee is fine
        let mut leia = employee(1008, "Leia");
        leia.todo.push(Task { id: "t-1".to_string(), text: "Find Luke".to_string() });

        assert!(check_unique(&[han, leia]).is_ok());
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let store = setup_test_store().await;
        let employees = vec![employee(1007, "Han"), employee(1008, "Leia")];

        let stats = seed(&store, &employees, true).await.expect("seed failed");
        assert_eq!(stats, SeedStats { inserted: 2, skipped: 0 });

        for employee in &employees {
            assert!(store.find_employee(employee.emp_id).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_apply_inserts_and_skips_existing() {
        let store = setup_test_store().await;
        store.insert_employee(&employee(1007, "Existing")).await.unwrap();

        let employees = vec![employee(1007, "Han"), employee(1008, "Leia")];
        let stats = seed(&store, &employees, false).await.expect("seed failed");
        assert_eq!(stats, SeedStats { inserted: 1, skipped: 1 });

        let kept = store.find_employee(EmpId::new(1007).unwrap()).await.unwrap().unwrap();
        assert_eq!(kept.first_name, "Existing");
        let added = store.find_employee(EmpId::new(1008).unwrap()).await.unwrap().unwrap();
        assert_eq!(added.first_name, "Leia");

        // running again finds everyone already present
        let stats = seed(&store, &employees, false).await.expect("seed failed");
        assert_eq!(stats, SeedStats { inserted: 0, skipped: 2 });
    }
}

pub mod repository;
pub mod store;

pub use repository::EmployeeRepository;
pub use store::{DocumentStore, SqliteDocumentStore};

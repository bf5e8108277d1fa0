pub mod employee;
pub mod task;

pub use employee::{EmpId, Employee};
pub use task::{CreatedTask, NewTaskRequest, Task, TaskList};

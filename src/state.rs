use crate::db::EmployeeRepository;

#[derive(Clone)]
pub struct AppState {
    pub employees: EmployeeRepository,
}

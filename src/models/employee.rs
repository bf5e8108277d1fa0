use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::Task;

/// Externally assigned employee identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct EmpId(i64);

impl EmpId {
    pub fn new(value: i64) -> Result<Self, AppError> {
        if value < 0 {
            return Err(AppError::InvalidArgument(
                "Employee ID must be a number".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for EmpId {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EmpId> for i64 {
    fn from(emp_id: EmpId) -> Self {
        emp_id.0
    }
}

impl FromStr for EmpId {
    type Err = AppError;

    /// Only plain ASCII digits are accepted; signs, whitespace and
    /// trailing garbage are rejected.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::InvalidArgument("Employee ID must be a number".to_string());

        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        raw.parse::<i64>().map(Self).map_err(|_| invalid())
    }
}

impl fmt::Display for EmpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub emp_id: EmpId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub todo: Vec<Task>,
    #[serde(default)]
    pub done: Vec<Task>,
}

impl Employee {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

//! Client-held session markers.
//!
//! The server keeps no session table. Who is signed in is recorded in two
//! expiring key/value markers, `session_user` and `session_name`, that the
//! client treats as an untrusted hint: every task request is still checked
//! against the store by the server.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{EmpId, Employee};

pub const SESSION_USER: &str = "session_user";
pub const SESSION_NAME: &str = "session_name";

/// Lifetime of both markers.
pub fn marker_lifetime() -> TimeDelta {
    TimeDelta::days(1)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Marker {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Expiring key/value store, cookie-jar style.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkerJar {
    markers: HashMap<String, Marker>,
}

impl MarkerJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>, lifetime: TimeDelta) {
        self.set_at(key, value, lifetime, Utc::now());
    }

    pub fn set_at(
        &mut self,
        key: &str,
        value: impl Into<String>,
        lifetime: TimeDelta,
        now: DateTime<Utc>,
    ) {
        self.markers.insert(
            key.to_string(),
            Marker {
                value: value.into(),
                expires_at: now + lifetime,
            },
        );
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_at(key, Utc::now())
    }

    /// Expired markers read as absent.
    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<&str> {
        self.markers
            .get(key)
            .filter(|m| m.expires_at > now)
            .map(|m| m.value.as_str())
    }

    pub fn remove(&mut self, key: &str) {
        self.markers.remove(key);
    }
}

/// Records `employee` as the signed-in user.
pub fn issue(jar: &mut MarkerJar, employee: &Employee) {
    issue_at(jar, employee, Utc::now());
}

pub fn issue_at(jar: &mut MarkerJar, employee: &Employee, now: DateTime<Utc>) {
    jar.set_at(SESSION_USER, employee.emp_id.to_string(), marker_lifetime(), now);
    jar.set_at(SESSION_NAME, employee.display_name(), marker_lifetime(), now);
}

/// Ends the session by discarding both markers.
pub fn sign_out(jar: &mut MarkerJar) {
    jar.remove(SESSION_USER);
    jar.remove(SESSION_NAME);
}

/// The signed-in employee id, if the marker is present, fresh and numeric.
pub fn current_emp_id(jar: &MarkerJar) -> Option<EmpId> {
    current_emp_id_at(jar, Utc::now())
}

pub fn current_emp_id_at(jar: &MarkerJar, now: DateTime<Utc>) -> Option<EmpId> {
    jar.get_at(SESSION_USER, now)?.parse::<EmpId>().ok()
}

pub fn display_name(jar: &MarkerJar) -> Option<&str> {
    jar.get(SESSION_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn han_solo() -> Employee {
        Employee {
            emp_id: EmpId::new(1007).unwrap(),
            first_name: "Han".to_string(),
            last_name: "Solo".to_string(),
            todo: Vec::new(),
            done: Vec::new(),
        }
    }

    #[test]
    fn test_issue_sets_both_markers() {
        let mut jar = MarkerJar::new();
        issue(&mut jar, &han_solo());

        assert_eq!(jar.get(SESSION_USER), Some("1007"));
        assert_eq!(display_name(&jar), Some("Han Solo"));
        assert_eq!(current_emp_id(&jar), Some(EmpId::new(1007).unwrap()));
    }

    #[test]
    fn test_markers_expire_after_a_day() {
        let mut jar = MarkerJar::new();
        let signed_in_at = Utc::now();
        issue_at(&mut jar, &han_solo(), signed_in_at);

        let later = signed_in_at + TimeDelta::hours(23);
        assert!(current_emp_id_at(&jar, later).is_some());

        let next_day = signed_in_at + marker_lifetime();
        assert!(current_emp_id_at(&jar, next_day).is_none());
        assert!(jar.get_at(SESSION_NAME, next_day).is_none());
    }

    #[test]
    fn test_unparsable_marker_is_no_session() {
        let mut jar = MarkerJar::new();
        jar.set(SESSION_USER, "not-a-number", marker_lifetime());
        assert!(current_emp_id(&jar).is_none());
    }

    #[test]
    fn test_sign_out_discards_markers() {
        let mut jar = MarkerJar::new();
        issue(&mut jar, &han_solo());
        sign_out(&mut jar);

        assert!(current_emp_id(&jar).is_none());
        assert!(display_name(&jar).is_none());
    }
}

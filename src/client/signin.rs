use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::client::{TaskApi, session};
use crate::client::session::MarkerJar;
use crate::models::EmpId;

pub const INVALID_ID_MESSAGE: &str = "The employee ID is invalid, please try again.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Unable to sign in right now, please try again.";

#[derive(Debug, Clone, PartialEq)]
pub enum SignInState {
    Idle { error: Option<String> },
    Validating,
    Resolving,
    Authenticated {
        emp_id: EmpId,
        display_name: String,
        redirect: String,
    },
}

impl SignInState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SignInState::Validating | SignInState::Resolving)
    }
}

/// Drives sign-in: local validation, one lookup, then marker issuance.
///
/// Every transition is published on a watch channel, so a view can follow
/// `Validating` and `Resolving` while `submit` is still running.
pub struct SignIn {
    api: Arc<dyn TaskApi>,
    state: watch::Sender<SignInState>,
}

impl SignIn {
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        let (state, _) = watch::channel(SignInState::Idle { error: None });
        Self { api, state }
    }

    pub fn state(&self) -> SignInState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SignInState> {
        self.state.subscribe()
    }

    fn enter(&self, next: SignInState) -> SignInState {
        self.state.send_replace(next.clone());
        next
    }

    pub async fn submit(
        &self,
        input: &str,
        return_url: Option<&str>,
        jar: &mut MarkerJar,
    ) -> SignInState {
        self.enter(SignInState::Validating);

        let emp_id = match input.parse::<EmpId>() {
            Ok(emp_id) => emp_id,
            Err(_) => {
                warn!("sign-in rejected locally: {:?}", input);
                return self.enter(SignInState::Idle {
                    error: Some(INVALID_ID_MESSAGE.to_string()),
                });
            }
        };

        self.enter(SignInState::Resolving);

        let next = match self.api.find_employee_by_id(emp_id).await {
            Ok(employee) => {
                session::issue(jar, &employee);
                let redirect = return_url
                    .filter(|url| !url.is_empty())
                    .unwrap_or("/")
                    .to_string();
                info!("employee {} signed in", emp_id);
                SignInState::Authenticated {
                    emp_id,
                    display_name: employee.display_name(),
                    redirect,
                }
            }
            Err(e) => {
                warn!("sign-in failed for employee {}: {}", emp_id, e);
                let message = e
                    .server_message()
                    .unwrap_or(GENERIC_FAILURE_MESSAGE)
                    .to_string();
                SignInState::Idle {
                    error: Some(message),
                }
            }
        };

        self.enter(next)
    }
}

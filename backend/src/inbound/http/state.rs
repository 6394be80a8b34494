//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{AccountRegistration, UsersQuery};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Account creation use-case.
    pub accounts: Arc<dyn AccountRegistration>,
    /// User lookup use-case.
    pub users: Arc<dyn UsersQuery>,
}

impl HttpState {
    /// Construct state from the driving ports.
    pub fn new(accounts: Arc<dyn AccountRegistration>, users: Arc<dyn UsersQuery>) -> Self {
        Self { accounts, users }
    }
}

//! Driving port for account creation.
//!
//! Inbound adapters hand over the raw sign-up fields; the domain validates
//! them, assigns a username, and persists the user.

use async_trait::async_trait;

use crate::domain::{Error, User};

/// Raw sign-up input as received from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    /// Display name supplied at sign-up.
    pub name: String,
    /// Account email.
    pub email: String,
}

/// Domain use-case port for registering accounts.
#[async_trait]
pub trait AccountRegistration: Send + Sync {
    /// Create a user with a freshly assigned unique username.
    async fn register(&self, account: NewAccount) -> Result<User, Error>;
}

//! Existence oracle consulted while probing username candidates.
//!
//! The lookup reads committed state only. It is not a reservation: another
//! registration may claim a candidate between the check and the insert.

use async_trait::async_trait;

use crate::domain::Username;

use super::UserPersistenceError;

/// Driven port answering whether a username is already in use.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsernameLookup: Send + Sync {
    /// Return `true` when a user with exactly this username exists.
    async fn is_username_taken(&self, username: &Username) -> Result<bool, UserPersistenceError>;
}

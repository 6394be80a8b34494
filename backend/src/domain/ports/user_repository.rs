//! Port abstraction for user persistence adapters and their errors.
//!
//! Adapters must surface uniqueness rejections as the dedicated
//! [`UserPersistenceError::UsernameTaken`] and
//! [`UserPersistenceError::EmailTaken`] variants: account registration treats
//! a username rejection as a retryable conflict.

use async_trait::async_trait;

use crate::domain::{User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// The username uniqueness constraint rejected the insert.
        UsernameTaken { username: String } => "username already taken: {username}",
        /// The email uniqueness constraint rejected the insert.
        EmailTaken { email: String } => "email already registered: {email}",
    }
}

/// Driven port for user storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user record.
    ///
    /// Fails with `UsernameTaken` or `EmailTaken` when the record collides
    /// with an existing user.
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;
}

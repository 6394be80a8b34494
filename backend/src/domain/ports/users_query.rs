//! Driving port for user-facing queries.

use async_trait::async_trait;

use crate::domain::{Error, User, UserId};

/// Domain use-case port for reading users.
#[async_trait]
pub trait UsersQuery: Send + Sync {
    /// Return the user with `id`, or a `NotFound` error.
    async fn find_user(&self, id: &UserId) -> Result<User, Error>;
}

//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use chatroom_backend::domain::{CorsOriginPolicy, UsernameResolver};
use chatroom_backend::outbound::persistence::DbPool;

/// Validated runtime configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) cors_policy: CorsOriginPolicy,
    pub(crate) resolver: UsernameResolver,
    pub(crate) db_pool: DbPool,
}

impl ServerConfig {
    /// Construct a server configuration from validated settings.
    #[must_use]
    pub fn new(
        bind_addr: SocketAddr,
        cors_policy: CorsOriginPolicy,
        resolver: UsernameResolver,
        db_pool: DbPool,
    ) -> Self {
        Self {
            bind_addr,
            cors_policy,
            resolver,
            db_pool,
        }
    }
}

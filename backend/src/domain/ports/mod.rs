//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports (`AccountRegistration`, `UsersQuery`) are called by inbound
//! adapters; driven ports (`UserRepository`, `UsernameLookup`) are
//! implemented by outbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod account_registration;
mod user_repository;
mod username_lookup;
mod users_query;

pub use account_registration::{AccountRegistration, NewAccount};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
#[cfg(test)]
pub use username_lookup::MockUsernameLookup;
pub use username_lookup::UsernameLookup;
pub use users_query::UsersQuery;

//! Domain primitives, services and ports.
//!
//! Purpose: Define strongly typed domain entities and the use-cases built on
//! them. Types are immutable once constructed; invariants and serialisation
//! contracts (serde) are documented on each type.
//!
//! Public surface:
//! - Error (alias to `error::Error`) — API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`) — stable error identifier.
//! - User (alias to `user::User`) — registered account with its username.
//! - UsernameResolver — smallest free suffix search over a lookup port.
//! - CorsOriginPolicy — selection of the origin echoed to browsers.
//! - AccountService — registration and user lookup use-cases.

pub mod account_service;
pub mod error;
pub mod origin;
pub mod ports;
pub mod trace_id;
pub mod user;
pub mod username;

pub use self::account_service::{AccountService, MAX_REGISTRATION_ATTEMPTS};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::origin::{CorsOriginPolicy, Origin, OriginParseError};
pub use self::trace_id::TraceId;
pub use self::user::{
    DisplayName, Email, USER_ID_PREFIX, User, UserId, UserParts, UserValidationError, Username,
};
pub use self::username::{
    BaseUsername, DEFAULT_MAX_ATTEMPTS, FALLBACK_USERNAME, UsernameResolutionError,
    UsernameResolver,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use chatroom_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;

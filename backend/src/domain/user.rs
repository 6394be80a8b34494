//! User data model.
//!
//! A user is identified by a generated opaque [`UserId`], keyed externally by
//! their [`Email`], and addressed by other users through a unique
//! [`Username`] assigned once at account creation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Prefix applied to every generated user identifier.
pub const USER_ID_PREFIX: &str = "user_";

/// Validation errors returned by the user value constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// Identifier was empty.
    #[error("user id must not be empty")]
    EmptyId,
    /// Identifier did not match `user_<uuid>`.
    #[error("user id must be `{USER_ID_PREFIX}` followed by a UUID")]
    InvalidId,
    /// Email was empty once trimmed.
    #[error("email must not be empty")]
    EmptyEmail,
    /// Email lacked an `@` separator or a domain part.
    #[error("email must contain `@` followed by a domain")]
    InvalidEmail,
    /// Display name was empty once trimmed.
    #[error("name must not be empty")]
    EmptyName,
    /// Username was empty once trimmed.
    #[error("username must not be empty")]
    EmptyUsername,
}

/// Stable user identifier of the form `user_<uuid>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a fresh, time-ordered identifier.
    pub fn generate() -> Self {
        Self(format!("{USER_ID_PREFIX}{}", Uuid::now_v7()))
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        let uuid = id
            .strip_prefix(USER_ID_PREFIX)
            .ok_or(UserValidationError::InvalidId)?;
        Uuid::parse_str(uuid).map_err(|_| UserValidationError::InvalidId)?;
        Ok(Self(id))
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Email address used as the external account key.
///
/// Only the shape needed for username derivation is enforced: the value is
/// trimmed and must contain an `@` followed by a non-empty domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and construct an [`Email`].
    pub fn new(email: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(email.into())
    }

    fn from_owned(email: String) -> Result<Self, UserValidationError> {
        let trimmed = email.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        match trimmed.split_once('@') {
            Some((_, domain)) if !domain.is_empty() => Ok(Self(trimmed.to_owned())),
            _ => Err(UserValidationError::InvalidEmail),
        }
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Name shown alongside the username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`].
    pub fn new(name: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(name.into())
    }

    fn from_owned(name: String) -> Result<Self, UserValidationError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyName);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Unique, human-facing handle.
///
/// Usernames are compared byte for byte; derivation lowercases them, so the
/// persisted set only ever contains lowercase handles produced here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`].
    pub fn new(username: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(username.into())
    }

    fn from_owned(username: String) -> Result<Self, UserValidationError> {
        if username.trim().is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        Ok(Self(username))
    }

    /// Wrap a handle produced by username derivation, which is never blank.
    pub(crate) fn derived(handle: String) -> Self {
        debug_assert!(!handle.trim().is_empty(), "derived usernames are non-empty");
        Self(handle)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Components used to rehydrate a [`User`] from storage.
#[derive(Debug, Clone)]
pub struct UserParts {
    /// Stable identifier.
    pub id: UserId,
    /// Display name.
    pub name: DisplayName,
    /// Account email.
    pub email: Email,
    /// Assigned username.
    pub username: Username,
    /// Whether the email has been verified by the auth service.
    pub email_verified: bool,
    /// Optional avatar URL.
    pub image: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Application user.
///
/// ## Invariants
/// - `username` is unique across all users and never changes once assigned.
/// - `email` is unique across all users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(value_type = String, example = "user_01928c5e-8f4a-7cc1-9a52-3e0d2b0f6f11")]
    id: UserId,
    #[schema(value_type = String, example = "Alice Liddell")]
    name: DisplayName,
    #[schema(value_type = String, example = "alice@example.com")]
    email: Email,
    #[schema(value_type = String, example = "alice")]
    username: Username,
    email_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Build a freshly registered, unverified user stamped at `now`.
    pub fn register(
        name: DisplayName,
        email: Email,
        username: Username,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::generate(),
            name,
            email,
            username,
            email_verified: false,
            image: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stable user identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &DisplayName {
        &self.name
    }

    /// Account email.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Assigned username.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Whether the email has been verified.
    pub fn email_verified(&self) -> bool {
        self.email_verified
    }

    /// Optional avatar URL.
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last modification timestamp.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl From<UserParts> for User {
    fn from(parts: UserParts) -> Self {
        let UserParts {
            id,
            name,
            email,
            username,
            email_verified,
            image,
            created_at,
            updated_at,
        } = parts;
        Self {
            id,
            name,
            email,
            username,
            email_verified,
            image,
            created_at,
            updated_at,
        }
    }
}

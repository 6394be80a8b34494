//! Username derivation and availability search.
//!
//! A base handle is derived from the email local part, then candidates
//! `base`, `base1`, `base2`, ... are probed against the [`UsernameLookup`]
//! port until one is reported free. The probe is bounded by
//! [`UsernameResolver::max_attempts`].
//!
//! Resolution is read-only. Two concurrent registrations with the same base
//! can both observe the same candidate as free; the loser's insert is
//! rejected by the storage uniqueness constraint and the caller resolves
//! again (see [`crate::domain::AccountService`]).

use std::fmt;
use std::num::NonZeroU32;

use tracing::debug;

use crate::domain::Username;
use crate::domain::ports::{UserPersistenceError, UsernameLookup};

/// Base handle used when the email yields an empty local part.
pub const FALLBACK_USERNAME: &str = "user";

/// Default bound on the number of candidates probed per resolution.
pub const DEFAULT_MAX_ATTEMPTS: NonZeroU32 = match NonZeroU32::new(1000) {
    Some(value) => value,
    None => panic!("default attempt bound must be non-zero"),
};

/// Lowercase, trimmed email local part, or [`FALLBACK_USERNAME`].
///
/// # Examples
/// ```
/// use chatroom_backend::domain::BaseUsername;
///
/// assert_eq!(BaseUsername::from_email(Some("Alice@Example.com")).as_ref(), "alice");
/// assert_eq!(BaseUsername::from_email(None).as_ref(), "user");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUsername(String);

impl BaseUsername {
    /// Derive the base handle from an optional email address.
    ///
    /// Everything before the first `@` is kept (the whole value when there
    /// is none), trimmed and lowercased.
    pub fn from_email(email: Option<&str>) -> Self {
        let local_part = email
            .and_then(|value| value.split('@').next())
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        if local_part.is_empty() {
            Self(FALLBACK_USERNAME.to_owned())
        } else {
            Self(local_part)
        }
    }

    /// Candidate for `suffix`: the bare base for 0, `base{suffix}` otherwise.
    pub fn candidate(&self, suffix: u32) -> Username {
        if suffix == 0 {
            Username::derived(self.0.clone())
        } else {
            Username::derived(format!("{}{suffix}", self.0))
        }
    }
}

impl AsRef<str> for BaseUsername {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for BaseUsername {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failures raised while searching for a free username.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsernameResolutionError {
    /// The existence check failed; propagated without retry.
    #[error("username lookup failed: {0}")]
    Lookup(#[from] UserPersistenceError),
    /// Every candidate within the bound was taken.
    #[error("no free username for base `{base}` within {attempts} attempts")]
    Exhausted {
        /// Base handle that was probed.
        base: String,
        /// Number of candidates checked.
        attempts: u32,
    },
}

/// Linear probe over numeric suffixes with a bounded attempt count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsernameResolver {
    max_attempts: NonZeroU32,
}

impl Default for UsernameResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl UsernameResolver {
    /// Create a resolver probing at most `max_attempts` candidates.
    pub fn new(max_attempts: NonZeroU32) -> Self {
        Self { max_attempts }
    }

    /// Maximum number of candidates probed per resolution.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.get()
    }

    /// Return the first candidate the lookup reports as free.
    ///
    /// Candidates are probed in suffix order, so the result is the smallest
    /// free suffix within the bound. A candidate reported taken is never
    /// returned.
    ///
    /// # Errors
    ///
    /// - [`UsernameResolutionError::Lookup`] when the lookup fails.
    /// - [`UsernameResolutionError::Exhausted`] when all
    ///   [`Self::max_attempts`] candidates are taken.
    pub async fn resolve<L>(
        &self,
        lookup: &L,
        base: &BaseUsername,
    ) -> Result<Username, UsernameResolutionError>
    where
        L: UsernameLookup + ?Sized,
    {
        let attempts = self.max_attempts.get();
        for suffix in 0..attempts {
            let candidate = base.candidate(suffix);
            if !lookup.is_username_taken(&candidate).await? {
                debug!(%base, username = %candidate, suffix, "username candidate available");
                return Ok(candidate);
            }
        }

        Err(UsernameResolutionError::Exhausted {
            base: base.to_string(),
            attempts,
        })
    }
}

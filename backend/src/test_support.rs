//! Test utilities for the backend crate.
//!
//! Compiled for unit tests and, via the `test-support` feature, for the
//! integration suites under `tests/`.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use mockable::Clock;

use crate::domain::ports::{UserPersistenceError, UserRepository, UsernameLookup};
use crate::domain::{User, UserId, Username};

#[derive(Default)]
struct Store {
    users: Vec<User>,
    seeded: HashSet<String>,
    hidden: HashSet<String>,
}

impl Store {
    fn username_in_use(&self, username: &str) -> bool {
        self.seeded.contains(username)
            || self.hidden.contains(username)
            || self
                .users
                .iter()
                .any(|user| user.username().as_ref() == username)
    }
}

/// In-memory user store implementing both persistence ports.
///
/// Uniqueness of usernames and emails is enforced on insert, mirroring the
/// database constraints. Usernames added with
/// [`Self::claim_concurrently`] are invisible to the lookup until an insert
/// collides with them, reproducing a registration that commits between the
/// availability check and the insert.
#[derive(Default)]
pub struct InMemoryUserRepository {
    store: Mutex<Store>,
    lookups: AtomicUsize,
}

impl InMemoryUserRepository {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark `username` as already taken.
    pub fn seed_username(&self, username: impl Into<String>) {
        self.store().seeded.insert(username.into());
    }

    /// Take `username` without the lookup noticing until an insert collides.
    pub fn claim_concurrently(&self, username: impl Into<String>) {
        self.store().hidden.insert(username.into());
    }

    /// Snapshot of inserted users in insertion order.
    pub fn users(&self) -> Vec<User> {
        self.store().users.clone()
    }

    /// Number of availability checks served so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut store = self.store();
        let username = user.username().as_ref();
        if store.username_in_use(username) {
            if store.hidden.remove(username) {
                store.seeded.insert(username.to_owned());
            }
            return Err(UserPersistenceError::username_taken(username));
        }
        if store.users.iter().any(|existing| existing.email() == user.email()) {
            return Err(UserPersistenceError::email_taken(user.email().as_ref()));
        }
        store.users.push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .store()
            .users
            .iter()
            .find(|user| user.id() == id)
            .cloned())
    }
}

#[async_trait]
impl UsernameLookup for InMemoryUserRepository {
    async fn is_username_taken(&self, username: &Username) -> Result<bool, UserPersistenceError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let store = self.store();
        let candidate = username.as_ref();
        Ok(store.seeded.contains(candidate)
            || store
                .users
                .iter()
                .any(|user| user.username().as_ref() == candidate))
    }
}

/// Clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

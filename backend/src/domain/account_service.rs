//! Account registration and user lookup service.
//!
//! Registration validates the sign-up fields, derives a base handle from the
//! email, resolves the first free username candidate and inserts the user.
//! Resolution only reads committed state, so a concurrent registration can
//! claim the same candidate first. The storage uniqueness constraint rejects
//! the loser's insert with `UsernameTaken` and the service resolves again,
//! up to [`MAX_REGISTRATION_ATTEMPTS`] times.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{error, info, warn};

use crate::domain::ports::{
    AccountRegistration, NewAccount, UserPersistenceError, UserRepository, UsernameLookup,
    UsersQuery,
};
use crate::domain::{
    BaseUsername, DisplayName, Email, Error, User, UserId, UserValidationError,
    UsernameResolutionError, UsernameResolver,
};

/// Number of resolve-then-insert rounds before registration gives up.
pub const MAX_REGISTRATION_ATTEMPTS: u32 = 3;

/// Domain service implementing [`AccountRegistration`] and [`UsersQuery`].
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    usernames: Arc<dyn UsernameLookup>,
    clock: Arc<dyn Clock>,
    resolver: UsernameResolver,
}

impl AccountService {
    /// Create a service over the given repositories.
    pub fn new(
        users: Arc<dyn UserRepository>,
        usernames: Arc<dyn UsernameLookup>,
        clock: Arc<dyn Clock>,
        resolver: UsernameResolver,
    ) -> Self {
        Self {
            users,
            usernames,
            clock,
            resolver,
        }
    }
}

fn invalid_field(field: &str, err: UserValidationError) -> Error {
    let code = match err {
        UserValidationError::EmptyEmail | UserValidationError::EmptyName => "empty",
        _ => "invalid",
    };
    Error::invalid_request(err.to_string()).with_details(json!({
        "field": field,
        "code": code,
    }))
}

fn map_persistence_error(err: UserPersistenceError) -> Error {
    match err {
        UserPersistenceError::Connection { message } => {
            error!(%message, "user store unreachable");
            Error::service_unavailable("user store is temporarily unavailable")
        }
        UserPersistenceError::Query { message } => {
            error!(%message, "user store query failed");
            Error::internal("failed to access user store")
        }
        UserPersistenceError::EmailTaken { email } => {
            Error::conflict("email is already registered").with_details(json!({
                "field": "email",
                "value": email,
            }))
        }
        UserPersistenceError::UsernameTaken { username } => {
            Error::conflict("username is already taken").with_details(json!({
                "field": "username",
                "value": username,
            }))
        }
    }
}

fn map_resolution_error(err: UsernameResolutionError) -> Error {
    match err {
        UsernameResolutionError::Lookup(inner) => map_persistence_error(inner),
        UsernameResolutionError::Exhausted { base, attempts } => {
            error!(%base, attempts, "no free username candidate");
            Error::conflict("no username is available for this email").with_details(json!({
                "base": base,
                "attempts": attempts,
            }))
        }
    }
}

#[async_trait]
impl AccountRegistration for AccountService {
    async fn register(&self, account: NewAccount) -> Result<User, Error> {
        let NewAccount { name, email } = account;
        let name = DisplayName::new(name).map_err(|err| invalid_field("name", err))?;
        let email = Email::new(email).map_err(|err| invalid_field("email", err))?;
        let base = BaseUsername::from_email(Some(email.as_ref()));

        for attempt in 1..=MAX_REGISTRATION_ATTEMPTS {
            let username = self
                .resolver
                .resolve(self.usernames.as_ref(), &base)
                .await
                .map_err(map_resolution_error)?;
            let user = User::register(name.clone(), email.clone(), username, self.clock.utc());

            match self.users.insert(&user).await {
                Ok(()) => {
                    info!(
                        user_id = %user.id(),
                        username = %user.username(),
                        "account registered"
                    );
                    return Ok(user);
                }
                Err(UserPersistenceError::UsernameTaken { username }) => {
                    warn!(%username, attempt, "username claimed concurrently; resolving again");
                }
                Err(other) => return Err(map_persistence_error(other)),
            }
        }

        error!(
            %base,
            attempts = MAX_REGISTRATION_ATTEMPTS,
            "username kept colliding on insert"
        );
        Err(
            Error::conflict("could not assign a unique username; retry the request")
                .with_details(json!({ "base": base.as_ref() })),
        )
    }
}

#[async_trait]
impl UsersQuery for AccountService {
    async fn find_user(&self, id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_persistence_error)?
            .ok_or_else(|| {
                Error::not_found(format!("user {id} not found"))
                    .with_details(json!({ "userId": id.as_ref() }))
            })
    }
}

#[cfg(test)]
mod tests {
    //! Service tests drive the ports through mocks and a fixed clock.

    use chrono::{DateTime, Local, TimeZone, Utc};
    use mockall::Sequence;
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{MockUserRepository, MockUsernameLookup};

    struct FixtureClock(DateTime<Utc>);

    impl Clock for FixtureClock {
        fn local(&self) -> DateTime<Local> {
            self.0.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7)
            .single()
            .expect("valid timestamp")
    }

    fn service(
        users: MockUserRepository,
        usernames: MockUsernameLookup,
        now: DateTime<Utc>,
    ) -> AccountService {
        AccountService::new(
            Arc::new(users),
            Arc::new(usernames),
            Arc::new(FixtureClock(now)),
            UsernameResolver::default(),
        )
    }

    fn alice() -> NewAccount {
        NewAccount {
            name: "Alice Liddell".to_owned(),
            email: "Alice@Example.com".to_owned(),
        }
    }

    fn taken(names: &'static [&'static str]) -> MockUsernameLookup {
        let mut lookup = MockUsernameLookup::new();
        lookup
            .expect_is_username_taken()
            .returning(move |candidate| Ok(names.contains(&candidate.as_ref())));
        lookup
    }

    #[rstest]
    #[tokio::test]
    async fn registers_with_first_free_username(now: DateTime<Utc>) {
        let mut users = MockUserRepository::new();
        users
            .expect_insert()
            .withf(|user| user.username().as_ref() == "alice1")
            .times(1)
            .returning(|_| Ok(()));

        let user = service(users, taken(&["alice"]), now)
            .register(alice())
            .await
            .expect("registration succeeds");

        assert_eq!(user.username().as_ref(), "alice1");
        assert_eq!(user.email().as_ref(), "Alice@Example.com");
        assert_eq!(user.created_at(), now);
        assert!(!user.email_verified());
    }

    #[rstest]
    #[tokio::test]
    async fn retries_when_insert_loses_username_race(now: DateTime<Utc>) {
        let mut lookup = MockUsernameLookup::new();
        let mut sequence = Sequence::new();
        lookup
            .expect_is_username_taken()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(false));
        lookup
            .expect_is_username_taken()
            .withf(|candidate| candidate.as_ref() == "alice")
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(true));
        lookup
            .expect_is_username_taken()
            .withf(|candidate| candidate.as_ref() == "alice1")
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(false));

        let mut users = MockUserRepository::new();
        let mut inserts = Sequence::new();
        users
            .expect_insert()
            .times(1)
            .in_sequence(&mut inserts)
            .returning(|user| Err(UserPersistenceError::username_taken(user.username().as_ref())));
        users
            .expect_insert()
            .withf(|user| user.username().as_ref() == "alice1")
            .times(1)
            .in_sequence(&mut inserts)
            .returning(|_| Ok(()));

        let user = service(users, lookup, now)
            .register(alice())
            .await
            .expect("second round succeeds");

        assert_eq!(user.username().as_ref(), "alice1");
    }

    #[rstest]
    #[tokio::test]
    async fn gives_up_after_repeated_insert_collisions(now: DateTime<Utc>) {
        let mut users = MockUserRepository::new();
        users
            .expect_insert()
            .times(MAX_REGISTRATION_ATTEMPTS as usize)
            .returning(|user| Err(UserPersistenceError::username_taken(user.username().as_ref())));

        let err = service(users, taken(&[]), now)
            .register(alice())
            .await
            .expect_err("registration gives up");

        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[case::blank_name("  ", "alice@example.com", "name")]
    #[case::blank_email("Alice", " ", "email")]
    #[case::missing_domain("Alice", "alice@", "email")]
    #[tokio::test]
    async fn rejects_invalid_fields_before_touching_storage(
        now: DateTime<Utc>,
        #[case] name: &str,
        #[case] email: &str,
        #[case] field: &str,
    ) {
        let account = NewAccount {
            name: name.to_owned(),
            email: email.to_owned(),
        };

        let err = service(MockUserRepository::new(), MockUsernameLookup::new(), now)
            .register(account)
            .await
            .expect_err("validation fails");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        let details = err.details().expect("field details");
        assert_eq!(details["field"], field);
    }

    #[rstest]
    #[tokio::test]
    async fn empty_local_part_uses_fallback_handle(now: DateTime<Utc>) {
        let mut users = MockUserRepository::new();
        users.expect_insert().times(1).returning(|_| Ok(()));
        let account = NewAccount {
            name: "Anonymous".to_owned(),
            email: "@example.com".to_owned(),
        };

        let user = service(users, taken(&["user"]), now)
            .register(account)
            .await
            .expect("registration succeeds");

        assert_eq!(user.username().as_ref(), "user1");
    }

    #[rstest]
    #[case::connection(UserPersistenceError::connection("refused"), ErrorCode::ServiceUnavailable)]
    #[case::query(UserPersistenceError::query("syntax"), ErrorCode::InternalError)]
    #[tokio::test]
    async fn lookup_failures_map_to_error_codes(
        now: DateTime<Utc>,
        #[case] failure: UserPersistenceError,
        #[case] expected: ErrorCode,
    ) {
        let mut lookup = MockUsernameLookup::new();
        lookup
            .expect_is_username_taken()
            .times(1)
            .returning(move |_| Err(failure.clone()));

        let err = service(MockUserRepository::new(), lookup, now)
            .register(alice())
            .await
            .expect_err("lookup failure surfaces");

        assert_eq!(err.code(), expected);
    }

    #[rstest]
    #[tokio::test]
    async fn exhausted_candidates_map_to_conflict(now: DateTime<Utc>) {
        let service = AccountService::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(taken(&["alice", "alice1"])),
            Arc::new(FixtureClock(now)),
            UsernameResolver::new(std::num::NonZeroU32::new(2).expect("non-zero")),
        );

        let err = service
            .register(alice())
            .await
            .expect_err("no candidate is free");

        assert_eq!(err.code(), ErrorCode::Conflict);
        let details = err.details().expect("exhaustion details");
        assert_eq!(details["base"], "alice");
        assert_eq!(details["attempts"], 2);
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_email_is_a_conflict(now: DateTime<Utc>) {
        let mut users = MockUserRepository::new();
        users
            .expect_insert()
            .times(1)
            .returning(|user| Err(UserPersistenceError::email_taken(user.email().as_ref())));

        let err = service(users, taken(&[]), now)
            .register(alice())
            .await
            .expect_err("email collision");

        assert_eq!(err.code(), ErrorCode::Conflict);
        assert_eq!(err.details().expect("details")["field"], "email");
    }

    #[rstest]
    #[tokio::test]
    async fn find_user_reports_missing_users(now: DateTime<Utc>) {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().times(1).returning(|_| Ok(None));
        let id = UserId::generate();

        let err = service(users, MockUsernameLookup::new(), now)
            .find_user(&id)
            .await
            .expect_err("user is absent");

        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn find_user_returns_stored_user(now: DateTime<Utc>) {
        let stored = User::register(
            DisplayName::new("Bob").expect("valid name"),
            Email::new("bob@example.com").expect("valid email"),
            crate::domain::Username::new("bob").expect("valid username"),
            now,
        );
        let expected = stored.clone();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));

        let user = service(users, MockUsernameLookup::new(), now)
            .find_user(expected.id())
            .await
            .expect("user exists");

        assert_eq!(user, expected);
    }
}

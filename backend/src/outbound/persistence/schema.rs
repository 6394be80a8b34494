//! Diesel table definitions.
//!
//! Kept in sync with `backend/migrations` by hand.

diesel::table! {
    /// Registered users with their assigned usernames.
    users (id) {
        /// Primary key: `user_<uuid>`.
        id -> Text,
        name -> Text,
        /// Unique (`users_email_key`).
        email -> Text,
        email_verified -> Bool,
        image -> Nullable<Text>,
        /// Unique (`users_username_key`).
        username -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

/// Unique constraint guarding `users.email`.
pub(crate) const USERS_EMAIL_KEY: &str = "users_email_key";
/// Unique constraint guarding `users.username`.
pub(crate) const USERS_USERNAME_KEY: &str = "users_username_key";

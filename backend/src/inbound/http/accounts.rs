//! Account registration handler.
//!
//! ```text
//! POST /api/v1/accounts {"name":"Alice","email":"alice@example.com"}
//! ```

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::ports::NewAccount;
use crate::domain::{Error, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Sign-up request body for `POST /api/v1/accounts`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    /// Display name.
    #[schema(example = "Alice Liddell")]
    pub name: String,
    /// Account email; its local part seeds the username.
    #[schema(example = "alice@example.com")]
    pub email: String,
}

impl From<CreateAccountRequest> for NewAccount {
    fn from(value: CreateAccountRequest) -> Self {
        Self {
            name: value.name,
            email: value.email,
        }
    }
}

/// Create an account and assign it a unique username.
#[utoipa::path(
    post,
    path = "/api/v1/accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = User),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email taken or no username available", body = Error),
        (status = 503, description = "User store unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "createAccount",
    security([])
)]
#[post("/accounts")]
pub async fn create_account(
    state: web::Data<HttpState>,
    payload: web::Json<CreateAccountRequest>,
) -> ApiResult<HttpResponse> {
    let user = state.accounts.register(payload.into_inner().into()).await?;
    Ok(HttpResponse::Created().json(user))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::Value;

    use super::*;
    use crate::domain::ports::{AccountRegistration, UsersQuery};
    use crate::domain::{DisplayName, Email, UserId, Username};
    use crate::inbound::http::error::json_config;

    struct StubAccounts(Result<User, Error>);

    #[async_trait]
    impl AccountRegistration for StubAccounts {
        async fn register(&self, _account: NewAccount) -> Result<User, Error> {
            self.0.clone()
        }
    }

    struct NoUsers;

    #[async_trait]
    impl UsersQuery for NoUsers {
        async fn find_user(&self, _id: &UserId) -> Result<User, Error> {
            Err(Error::not_found("missing"))
        }
    }

    fn alice() -> User {
        User::register(
            DisplayName::new("Alice").expect("valid name"),
            Email::new("alice@example.com").expect("valid email"),
            Username::new("alice").expect("valid username"),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
                .single()
                .expect("valid timestamp"),
        )
    }

    async fn post_account(outcome: Result<User, Error>, body: Value) -> (StatusCode, Value) {
        let state = HttpState::new(Arc::new(StubAccounts(outcome)), Arc::new(NoUsers));
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .app_data(json_config())
                .service(web::scope("/api/v1").service(create_account)),
        )
        .await;
        let req = actix_test::TestRequest::post()
            .uri("/api/v1/accounts")
            .set_json(body)
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        let status = res.status();
        let value: Value = actix_test::read_body_json(res).await;
        (status, value)
    }

    #[actix_web::test]
    async fn created_account_is_returned_as_camel_case_json() {
        let (status, value) = post_account(
            Ok(alice()),
            serde_json::json!({"name": "Alice", "email": "alice@example.com"}),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(value["username"], "alice");
        assert_eq!(value["emailVerified"], false);
        assert!(value.get("email_verified").is_none());
    }

    #[rstest]
    #[case(Error::conflict("email is already registered"), StatusCode::CONFLICT, "conflict")]
    #[case(
        Error::service_unavailable("down"),
        StatusCode::SERVICE_UNAVAILABLE,
        "service_unavailable"
    )]
    #[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST, "invalid_request")]
    #[actix_web::test]
    async fn domain_errors_map_to_statuses(
        #[case] error: Error,
        #[case] expected: StatusCode,
        #[case] code: &str,
    ) {
        let (status, value) = post_account(
            Err(error),
            serde_json::json!({"name": "Alice", "email": "alice@example.com"}),
        )
        .await;

        assert_eq!(status, expected);
        assert_eq!(value["code"], code);
    }

    #[actix_web::test]
    async fn missing_fields_are_rejected_before_the_domain() {
        let (status, value) =
            post_account(Ok(alice()), serde_json::json!({"name": "Alice"})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["code"], "invalid_request");
    }
}

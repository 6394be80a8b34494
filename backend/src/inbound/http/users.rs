//! Users API handlers.
//!
//! ```text
//! GET /api/v1/users/{id}
//! ```

use actix_web::{get, web};
use serde_json::json;

use crate::domain::{Error, User, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Fetch a user by identifier.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use chatroom_backend::inbound::http::users::get_user;
///
/// let app = App::new().service(get_user);
/// ```
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User identifier (`user_<uuid>`)")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 400, description = "Invalid identifier", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 503, description = "User store unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser",
    security([])
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<User>> {
    let raw = path.into_inner();
    let id = UserId::new(&raw).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({ "field": "id", "value": raw }))
    })?;
    let user = state.users.find_user(&id).await?;
    Ok(web::Json(user))
}

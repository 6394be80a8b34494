//! HTTP inbound adapter exposing REST endpoints.

pub mod accounts;
pub mod cors;
pub mod error;
pub mod health;
pub mod state;
pub mod users;

use actix_web::web;

pub use error::ApiResult;

/// Register the versioned API scope together with its extractor settings.
///
/// Health probes and documentation are mounted by the server alongside this
/// scope; only domain endpoints live here.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use chatroom_backend::inbound::http::configure_api;
///
/// let _app = App::new().configure(configure_api);
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .app_data(error::json_config())
            .app_data(error::path_config())
            .service(accounts::create_account)
            .service(users::get_user),
    );
}

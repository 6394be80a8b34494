//! Behavioural tests for CORS origin selection on the assembled app.

use std::sync::Arc;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{StatusCode, header};
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use chatroom_backend::Trace;
use chatroom_backend::domain::{AccountService, CorsOriginPolicy, TRACE_ID_HEADER, UsernameResolver};
use chatroom_backend::inbound::http::configure_api;
use chatroom_backend::inbound::http::cors::Cors;
use chatroom_backend::inbound::http::health::root;
use chatroom_backend::inbound::http::state::HttpState;
use chatroom_backend::test_support::{FixedClock, InMemoryUserRepository};
use chrono::{TimeZone, Utc};
use rstest::rstest;

const WEB_ORIGIN: &str = "https://web.example.com";
const API_BASE_URL: &str = "https://auth.example.com/api";

fn http_state() -> HttpState {
    let repository = Arc::new(InMemoryUserRepository::new());
    let clock = FixedClock(
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp"),
    );
    let service = Arc::new(AccountService::new(
        repository.clone(),
        repository,
        Arc::new(clock),
        UsernameResolver::default(),
    ));
    HttpState::new(service.clone(), service)
}

async fn init_app() -> impl Service<
    Request,
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
> {
    let policy = CorsOriginPolicy::new(WEB_ORIGIN, API_BASE_URL).expect("valid CORS policy");
    test::init_service(
        App::new()
            .app_data(web::Data::new(http_state()))
            .configure(configure_api)
            .service(root)
            .wrap(Cors::new(policy))
            .wrap(Trace),
    )
    .await
}

fn allow_origin<B>(res: &ServiceResponse<B>) -> Option<&str> {
    res.headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .and_then(|value| value.to_str().ok())
}

#[rstest]
#[case::configured_front_end(Some(WEB_ORIGIN), WEB_ORIGIN)]
#[case::api_origin(Some("https://auth.example.com"), "https://auth.example.com")]
#[case::same_origin_as_request(Some("http://api.example.com"), "http://api.example.com")]
#[case::untrusted_origin(Some("https://example.com"), WEB_ORIGIN)]
#[case::missing_origin(None, "http://api.example.com")]
#[actix_web::test]
async fn root_echoes_the_resolved_origin(
    #[case] origin: Option<&str>,
    #[case] expected: &str,
) {
    let app = init_app().await;
    let mut req = TestRequest::get()
        .uri("/")
        .insert_header((header::HOST, "api.example.com"));
    if let Some(origin) = origin {
        req = req.insert_header((header::ORIGIN, origin));
    }

    let res = test::call_service(&app, req.to_request()).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(allow_origin(&res), Some(expected));
    assert_eq!(
        res.headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .and_then(|value| value.to_str().ok()),
        Some("true")
    );
    let body = test::read_body(res).await;
    assert_eq!(body.as_ref(), b"OK");
}

#[actix_web::test]
async fn unknown_paths_still_carry_cors_headers() {
    let app = init_app().await;
    let req = TestRequest::get()
        .uri("/reference")
        .insert_header((header::HOST, "api.example.com"))
        .to_request();

    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(allow_origin(&res), Some("http://api.example.com"));
}

#[actix_web::test]
async fn preflight_lists_allowed_methods() {
    let app = init_app().await;
    let req = TestRequest::default()
        .method(actix_web::http::Method::OPTIONS)
        .uri("/api/v1/accounts")
        .insert_header((header::HOST, "api.example.com"))
        .insert_header((header::ORIGIN, WEB_ORIGIN))
        .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
        .to_request();

    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(allow_origin(&res), Some(WEB_ORIGIN));
    let methods = res
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .and_then(|value| value.to_str().ok())
        .expect("allow-methods header");
    assert!(methods.contains("POST"));
}

#[actix_web::test]
async fn malformed_request_host_is_a_traced_bad_request() {
    let app = init_app().await;
    let req = TestRequest::get()
        .uri("/")
        .insert_header((header::HOST, "exa mple.com"))
        .to_request();

    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.headers().contains_key(TRACE_ID_HEADER));
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["code"], "invalid_request");
    assert!(body["traceId"].is_string(), "error body carries the trace id");
}

//! CORS middleware driven by [`CorsOriginPolicy`].
//!
//! Every response carries `Access-Control-Allow-Origin` set to the origin the
//! policy selects for the request, together with credential support and
//! `Vary: Origin`. Every `OPTIONS` request is treated as a preflight and
//! answered here without reaching the routed handlers.

use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::Method;
use actix_web::http::header::{self, HeaderMap, HeaderValue};
use actix_web::{HttpResponse, ResponseError};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::{CorsOriginPolicy, Error};

/// Methods advertised to preflight requests.
pub const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
/// Request headers advertised to preflight requests.
pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

/// Middleware factory applying the configured origin policy.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use chatroom_backend::domain::CorsOriginPolicy;
/// use chatroom_backend::inbound::http::cors::Cors;
///
/// let policy = CorsOriginPolicy::new("https://web.example.com", "https://auth.example.com")?;
/// let _app = App::new().wrap(Cors::new(policy));
/// # Ok::<(), chatroom_backend::domain::OriginParseError>(())
/// ```
#[derive(Clone, Debug)]
pub struct Cors {
    policy: Arc<CorsOriginPolicy>,
}

impl Cors {
    /// Wrap `policy` for use as Actix middleware.
    pub fn new(policy: CorsOriginPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Cors
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = CorsMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CorsMiddleware {
            service: Rc::new(service),
            policy: Arc::clone(&self.policy),
        }))
    }
}

/// Service wrapper produced by [`Cors`].
pub struct CorsMiddleware<S> {
    service: Rc<S>,
    policy: Arc<CorsOriginPolicy>,
}

/// Absolute URL the request was addressed to, as seen by the client.
///
/// Scheme and host honour `Forwarded` / `X-Forwarded-*` headers so the
/// origin matches what a browser behind a proxy sent.
fn request_url(req: &ServiceRequest) -> String {
    let info = req.connection_info();
    let path = req
        .uri()
        .path_and_query()
        .map_or("/", |path_and_query| path_and_query.as_str());
    format!("{}://{}{}", info.scheme(), info.host(), path)
}

fn invalid_origin_header(message: &str) -> Error {
    Error::invalid_request(message).with_details(json!({ "header": "origin" }))
}

fn declared_origin(req: &ServiceRequest) -> Result<Option<&str>, Error> {
    let mut values = req.headers().get_all(header::ORIGIN);
    let Some(value) = values.next() else {
        return Ok(None);
    };
    if values.next().is_some() {
        warn!("multiple Origin headers on request");
        return Err(invalid_origin_header("multiple Origin headers"));
    }
    value
        .to_str()
        .map(Some)
        .map_err(|_| invalid_origin_header("Origin header is not valid ASCII"))
}

fn allowed_origin(policy: &CorsOriginPolicy, req: &ServiceRequest) -> Result<HeaderValue, Error> {
    let declared = declared_origin(req)?;
    let url = request_url(req);
    let origin = policy.resolve(declared, &url).map_err(|err| {
        warn!(error = %err, "request URL could not be parsed for CORS");
        Error::invalid_request("request URL is malformed")
            .with_details(json!({ "url": err.value() }))
    })?;
    debug!(declared = ?declared, %origin, "selected CORS origin");
    HeaderValue::from_str(&origin)
        .map_err(|_| Error::invalid_request("selected origin is not a valid header value"))
}

fn is_preflight(req: &ServiceRequest) -> bool {
    req.method() == Method::OPTIONS
}

fn apply_cors_headers(headers: &mut HeaderMap, origin: HeaderValue) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
}

impl<S, B> Service<ServiceRequest> for CorsMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let origin = match allowed_origin(&self.policy, &req) {
            Ok(origin) => origin,
            Err(err) => {
                let response = err.error_response();
                return Box::pin(ready(Ok(req.into_response(response).map_into_right_body())));
            }
        };

        if is_preflight(&req) {
            let mut response = HttpResponse::NoContent().finish();
            let headers = response.headers_mut();
            apply_cors_headers(headers, origin);
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOWED_METHODS),
            );
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(ALLOWED_HEADERS),
            );
            return Box::pin(ready(Ok(req.into_response(response).map_into_right_body())));
        }

        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let mut res = service.call(req).await?;
            apply_cors_headers(res.headers_mut(), origin);
            Ok(res.map_into_left_body())
        })
    }
}

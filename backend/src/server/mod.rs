//! Server construction and middleware wiring.

mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_web::dev::{Server, ServerHandle, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::DefaultClock;
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use chatroom_backend::Trace;
use chatroom_backend::doc::ApiDoc;
use chatroom_backend::domain::AccountService;
use chatroom_backend::inbound::http::configure_api;
use chatroom_backend::inbound::http::cors::Cors;
use chatroom_backend::inbound::http::health::{HealthState, live, ready, root};
use chatroom_backend::inbound::http::state::HttpState;
use chatroom_backend::outbound::persistence::DieselUserRepository;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    cors: Cors,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        cors,
    } = deps;

    // Trace wraps Cors so CORS rejections carry the request's trace id.
    App::new()
        .app_data(health_state)
        .app_data(http_state)
        .configure(configure_api)
        .service(root)
        .service(ready)
        .service(live)
        .service(web::redirect("/reference", "/reference/"))
        .service(
            SwaggerUi::new("/reference/{_:.*}").url("/reference/openapi.json", ApiDoc::openapi()),
        )
        .wrap(cors)
        .wrap(Trace)
}

async fn interrupt() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM.
async fn termination_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    () = interrupt() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(error) => {
                warn!(%error, "failed to listen for SIGTERM");
                interrupt().await;
            }
        }
    }
    #[cfg(not(unix))]
    interrupt().await;
}

/// Fail liveness once `signal` resolves, then stop the server gracefully.
async fn drain_on<F>(signal: F, health_state: web::Data<HealthState>, handle: ServerHandle)
where
    F: Future<Output = ()>,
{
    signal.await;
    info!("shutdown requested, draining connections");
    health_state.mark_unhealthy();
    handle.stop(true).await;
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// The Diesel repository backs both persistence ports, and a single
/// [`AccountService`] serves registration and lookups for every worker.
///
/// Termination signals are handled here rather than by Actix so liveness
/// probes fail while in-flight requests drain.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        bind_addr,
        cors_policy,
        resolver,
        db_pool,
    } = config;

    let repository = Arc::new(DieselUserRepository::new(db_pool));
    let service = Arc::new(AccountService::new(
        repository.clone(),
        repository,
        Arc::new(DefaultClock),
        resolver,
    ));
    let http_state = web::Data::new(HttpState::new(service.clone(), service));
    let cors = Cors::new(cors_policy);
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            cors: cors.clone(),
        })
    })
    .disable_signals()
    .bind(bind_addr)?
    .run();

    actix_web::rt::spawn(drain_on(
        termination_signal(),
        health_state.clone(),
        server.handle(),
    ));
    info!(%bind_addr, "server listening");
    health_state.mark_ready();
    Ok(server)
}

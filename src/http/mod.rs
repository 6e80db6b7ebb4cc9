//! HTTP transport for the order service.
//!
//! Requires the `http` feature. Uses axum for routing and tower-http for
//! CORS, request tracing and panic recovery.
//!
//! ## Routes
//!
//! - `GET /orders`, `POST /orders` - list and create.
//! - `GET|PUT|DELETE /orders/:id` - read, replace and delete one order.
//! - `GET /orders/stream` - SSE feed of the full order list.
//! - `POST /login` - Basic credential check.
//! - `GET /health` - store reachability.
//!
//! Everything under `/orders` requires HTTP Basic auth.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use web_orders::{http, Config, OrderService, SqliteOrderStore};
//!
//! let config = Config::load()?;
//! let store = SqliteOrderStore::open(&config.database)?;
//! let service = Arc::new(OrderService::with_settings(store, config.service_settings()));
//!
//! // Get the router to compose with other axum routes
//! let app = http::router(service.clone(), &config);
//!
//! // Or serve directly
//! http::serve(service, &config).await?;
//! ```

pub mod auth;
pub mod dto;
pub mod error;
mod handlers;
pub mod rate_limit;
mod stream;
pub mod validation;

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::FromRef;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::service::{CancelSignal, Cancellation, OrderService, ServiceError};
use crate::store::OrderStore;

use auth::BasicAuthenticator;
use error::{ApiError, ErrorResponse};
use rate_limit::{FixedWindowLimiter, RateLimitState};

/// Shared handler state.
pub struct AppState<S> {
    pub service: Arc<OrderService<S>>,
    pub auth: Arc<BasicAuthenticator>,
    /// Include error messages and cause chains in 500 bodies.
    pub verbose_errors: bool,
    /// Fires on server shutdown; ends open streams.
    pub shutdown: CancelSignal,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            auth: Arc::clone(&self.auth),
            verbose_errors: self.verbose_errors,
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<S> AppState<S> {
    fn internal(&self, source: ServiceError) -> ApiError {
        ApiError::Internal {
            source,
            verbose: self.verbose_errors,
        }
    }
}

impl<S> FromRef<AppState<S>> for Arc<BasicAuthenticator> {
    fn from_ref(state: &AppState<S>) -> Self {
        Arc::clone(&state.auth)
    }
}

/// Build an axum `Router` serving the orders API.
///
/// Open streams run until their client disconnects.
pub fn router<S: OrderStore + 'static>(service: Arc<OrderService<S>>, config: &Config) -> Router {
    app(service, config, CancelSignal::never())
}

fn app<S: OrderStore + 'static>(
    service: Arc<OrderService<S>>,
    config: &Config,
    shutdown: CancelSignal,
) -> Router {
    let authenticator = Arc::new(BasicAuthenticator::new(config.auth.clone()));
    let limits = RateLimitState {
        limiter: Arc::new(FixedWindowLimiter::new(&config.rate_limit)),
        auth: Arc::clone(&authenticator),
    };
    let state = AppState {
        service,
        auth: Arc::clone(&authenticator),
        verbose_errors: config.environment.is_development(),
        shutdown,
    };

    let orders = Router::new()
        .route("/orders", get(handlers::list::<S>).post(handlers::create::<S>))
        .route("/orders/stream", get(stream::orders::<S>))
        .route(
            "/orders/:id",
            get(handlers::get::<S>)
                .put(handlers::update::<S>)
                .delete(handlers::delete::<S>),
        )
        .route_layer(middleware::from_fn_with_state(authenticator, auth::require_basic_auth));

    let permissive = CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods(cors::Any)
        .allow_headers(cors::Any);

    Router::new()
        .merge(orders)
        .route("/login", post(auth::login))
        .route("/health", get(handlers::health::<S>))
        .layer(middleware::from_fn_with_state(limits, rate_limit::limit_requests))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(permissive)
        .with_state(state)
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = message, "handler panicked");
    ErrorResponse::internal().into_response()
}

/// Serve the API at `config.addr` until Ctrl+C or SIGTERM.
///
/// On shutdown, open streams are cancelled so in-flight requests can drain.
pub async fn serve<S: OrderStore + 'static>(
    service: Arc<OrderService<S>>,
    config: &Config,
) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(config.addr).await?;
    serve_on(listener, service, config).await
}

/// Like [`serve`], on an already bound listener.
pub async fn serve_on<S: OrderStore + 'static>(
    listener: TcpListener,
    service: Arc<OrderService<S>>,
    config: &Config,
) -> Result<(), std::io::Error> {
    let cancellation = Cancellation::new();
    let app = app(service, config, cancellation.signal());

    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        cancellation.cancel();
    })
    .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the public form endpoints
//! - Wire the security gate onto those endpoints (transport, then rate limit)
//! - Wire up outer middleware (request id, tracing, metrics, headers, limits)
//! - Serve on a plain listener or directly over TLS
//! - Run the rate-limit sweeper until shutdown

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio::net::TcpListener;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::error::INTERNAL_ERROR_BODY;
use crate::http::handlers;
use crate::http::request::{request_id_of, UuidRequestId, X_REQUEST_ID};
use crate::lifecycle::Shutdown;
use crate::mail::{DeliveryAdapter, Mailer};
use crate::observability::metrics;
use crate::security::{
    headers::apply_security_headers,
    rate_limit::{rate_limit_middleware, run_sweeper},
    transport::enforce_https,
    AntiForgery, RateLimitGate, RateLimiter, SaltedTokens, TransportPolicy,
};

/// How long in-flight requests get to finish over TLS after shutdown.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub csrf: Arc<dyn AntiForgery>,
    pub delivery: Arc<DeliveryAdapter>,
}

impl AppState {
    pub fn new(config: Arc<GatewayConfig>, mailer: Arc<dyn Mailer>) -> Self {
        let delivery = DeliveryAdapter::new(mailer, config.mail.destination.clone());
        Self {
            config,
            csrf: Arc::new(SaltedTokens),
            delivery: Arc::new(delivery),
        }
    }
}

/// HTTP server for the form relay.
pub struct RelayServer {
    router: Router,
    config: Arc<GatewayConfig>,
    limiter: Option<Arc<RateLimiter>>,
}

impl RelayServer {
    /// Create a new server with the given configuration and mail backend.
    pub fn new(config: GatewayConfig, mailer: Arc<dyn Mailer>) -> Self {
        let config = Arc::new(config);
        let limiter = config
            .rate_limit
            .enabled
            .then(|| Arc::new(RateLimiter::from_config(&config.rate_limit)));

        let state = AppState::new(config.clone(), mailer);
        let router = build_router(state, limiter.clone());
        Self {
            router,
            config,
            limiter,
        }
    }

    /// The fully layered router, for serving or for driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn limiter(&self) -> Option<&Arc<RateLimiter>> {
        self.limiter.as_ref()
    }

    fn spawn_background(&self, shutdown: &Shutdown) {
        if let Some(limiter) = &self.limiter {
            tokio::spawn(run_sweeper(limiter.clone(), shutdown.subscribe()));
        }
    }

    /// Serve plain HTTP until shutdown is triggered.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, tls = false, "HTTP server starting");

        self.spawn_background(shutdown);
        let mut stop = shutdown.subscribe();

        let app = self
            .router
            .layer(GlobalConcurrencyLimitLayer::new(self.config.listener.max_connections))
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS directly until shutdown is triggered.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        shutdown: &Shutdown,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, tls = true, "HTTP server starting");

        self.spawn_background(shutdown);
        let handle = Handle::new();
        let mut stop = shutdown.subscribe();
        let drain = handle.clone();
        tokio::spawn(async move {
            let _ = stop.recv().await;
            drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        let app = self
            .router
            .layer(GlobalConcurrencyLimitLayer::new(self.config.listener.max_connections))
            .into_make_service_with_connect_info::<SocketAddr>();

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
///
/// Layer order, outermost first: request id, trace, id propagation, metrics,
/// security headers, panic catcher, timeout, body limit. The form routes add
/// the transport check and then the rate limiter; `/health` skips both.
#[allow(deprecated)]
pub fn build_router(state: AppState, limiter: Option<Arc<RateLimiter>>) -> Router {
    let config = state.config.clone();
    let policy = TransportPolicy {
        enforce: config.security.enforce_https,
        listener_tls: config.listener.tls.is_some(),
        trust_proxy_hops: config.security.trust_proxy_hops,
    };

    let mut forms = Router::new()
        .route("/csrf-token", get(handlers::issue_csrf_token))
        .route("/submit-form", post(handlers::submit_contact))
        .route("/work-application", post(handlers::submit_application));

    if let Some(limiter) = limiter {
        let gate = RateLimitGate {
            limiter,
            trust_proxy_hops: config.security.trust_proxy_hops,
        };
        forms = forms.route_layer(middleware::from_fn_with_state(gate, rate_limit_middleware));
    }

    let mut app = forms
        .route_layer(middleware::from_fn_with_state(policy, enforce_https))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(CatchPanicLayer::custom(handle_panic));

    if config.security.enable_headers {
        app = app.layer(middleware::map_response(apply_security_headers));
    }

    app.layer(middleware::from_fn(metrics::track_requests))
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id = %request_id_of(request),
            )
        }))
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    tracing::error!(panic = %detail, "Request handler panicked");
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY).into_response()
}

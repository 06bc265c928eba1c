//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the shared upstream client
//! - Create the Axum Router with both endpoints
//! - Wire up middleware (request ID, tracing)
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::{any, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{AllowList, ProxyConfig, SecretToken, TimeoutConfig};
use crate::contact::ContactRelay;
use crate::http::request::{self, BodyLimits, InboundRequest, MakeRequestUuidV4, X_REQUEST_ID};
use crate::lifecycle::shutdown;
use crate::tabular::TabularProxy;

pub const TABULAR_ROUTE: &str = "/api/airtable";
pub const CONTACT_ROUTE: &str = "/api/contact";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub tabular: Arc<TabularProxy>,
    pub contact: Arc<ContactRelay>,
    pub body_limits: BodyLimits,
}

/// HTTP server hosting both edge functions.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server. `token` is the upstream credential, if any.
    pub fn new(config: ProxyConfig, token: Option<SecretToken>) -> Result<Self, reqwest::Error> {
        let client = build_client(&config.timeouts)?;
        let allow_list = Arc::new(AllowList::embedded());

        let state = AppState {
            tabular: Arc::new(TabularProxy::new(
                &config,
                allow_list,
                client.clone(),
                token,
            )),
            contact: Arc::new(ContactRelay::new(&config.contact, client)),
            body_limits: BodyLimits {
                max_bytes: config.security.max_body_size,
                read_timeout: Duration::from_secs(config.timeouts.request_secs),
            },
        };

        let router = Self::build_router(state.clone());
        Ok(Self {
            router,
            config,
            state,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// No timeout layer: slow bodies end at [`BodyLimits::read_timeout`] and
    /// upstream calls at the client timeouts, so every response carries CORS.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route(TABULAR_ROUTE, any(tabular_handler))
            .route(CONTACT_ROUTE, post(contact_handler).options(contact_preflight))
            .with_state(state)
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    path = %req.uri().path(),
                    request_id = %request::request_id(req.headers()),
                )
            }))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// One pooled client for both upstreams. Transport timeouts surface as
/// ordinary transport errors.
fn build_client(timeouts: &TimeoutConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .timeout(Duration::from_secs(timeouts.upstream_secs))
        .user_agent(concat!("edge-proxy/", env!("CARGO_PKG_VERSION")))
        .build()
}

async fn tabular_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let inbound = InboundRequest::from_request(request, state.body_limits);
    state.tabular.handle(inbound).await
}

async fn contact_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let inbound = InboundRequest::from_request(request, state.body_limits);
    state.contact.relay(inbound).await
}

async fn contact_preflight() -> Response {
    ContactRelay::preflight()
}

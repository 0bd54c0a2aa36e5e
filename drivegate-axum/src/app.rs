use std::collections::HashMap;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method, Request};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, Span};

use crate::params::FileAccessParams;
use crate::{GateAxumError, GateState};

pub const DEFAULT_ROUTE: &str = "/api/raw";

#[derive(Clone)]
pub struct AxumGate {
    pub router: Router<()>,
}

impl AxumGate {
    pub fn new(state: GateState, route: &str) -> Self {
        Self {
            router: router(state, route),
        }
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "listening");
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}

/// The file access endpoint (GET, and HEAD through axum's GET routing)
/// mounted at `route`, with CORS, request ids and request tracing.
pub fn router(state: GateState, route: &str) -> Router<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD])
        .allow_headers(Any);

    Router::new()
        .route(route, get(file_access))
        .with_state(state)
        .layer(cors)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

async fn file_access(
    State(state): State<GateState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, GateAxumError> {
    let params = FileAccessParams::from_parts(&headers, query);
    state.handler.handle(&params).await.map_err(|e| state.error(e))
}

// Path only: the query carries the hash and possibly a credential.
fn request_span(req: &Request<Body>) -> Span {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    info_span!(
        "request",
        method = %req.method(),
        path = %req.uri().path(),
        request_id = %request_id,
    )
}

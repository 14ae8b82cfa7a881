use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Method},
    response::{IntoResponse, Json, Response},
    Router,
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, Instrument};
use uuid::Uuid;

use crate::app::{IngestOutcome, SaleIngestHandler, WebhookRequest};
use crate::constants::WEBHOOK_SECRET_HEADER;
use crate::error::IngestError;

/// Shared across all requests; holds nothing mutable
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<SaleIngestHandler>,
}

impl AppState {
    pub fn new(handler: SaleIngestHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}

impl IntoResponse for IngestOutcome {
    fn into_response(self) -> Response {
        match self {
            IngestOutcome::Inserted(rows) => Json(json!({ "ok": true, "inserted": rows })).into_response(),
            IngestOutcome::Duplicate { txn } => Json(json!({
                "ok": true,
                "message": "Duplicate txn ignored",
                "txn": txn
            }))
            .into_response(),
        }
    }
}

/// The webhook endpoint. Mounted as the fallback, so every path and method lands here.
pub async fn sale_webhook(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("ingest", %request_id, %method);

    let secret = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let request = WebhookRequest { method, secret, body };
    match state.handler.handle(request).instrument(span).await {
        Ok(outcome) => outcome.into_response(),
        Err(e) => e.into_response(),
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("Unhandled error: {}", detail);
    IngestError::Internal(detail).into_response()
}

/// Build the router around an already-configured handler
pub fn create_server(state: AppState) -> Router {
    Router::new()
        .fallback(sale_webhook)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(handle_panic)),
        )
}

/// Serve until ctrl-c
pub async fn start_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_server(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Sale webhook listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;
    Ok(())
}

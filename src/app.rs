use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    http::{Request, Response, StatusCode, Uri},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::Span;

use crate::logs;
use crate::state::AppState;

pub fn build_app(state: AppState) -> Router {
    let api = Router::new()
        .merge(logs::router())
        .route("/health", get(|| async { "ok" }));

    Router::new()
        .nest("/api/v1", api)
        .fallback(not_found)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<_>| {
                    tracing::info_span!(
                        "carblog_request",
                        method = %req.method(),
                        path = %req.uri().path(),
                        status = tracing::field::Empty,
                    )
                })
                .on_response(log_response),
        )
}

fn log_response<B>(res: &Response<B>, latency: Duration, span: &Span) {
    let status = res.status();
    span.record("status", status.as_u16());
    let ms = latency.as_millis() as u64;
    match status {
        s if s.is_server_error() => tracing::error!(%status, ms, "request failed"),
        StatusCode::NOT_FOUND => tracing::debug!(ms, "no route"),
        _ => tracing::info!(%status, ms, "request done"),
    }
}

async fn not_found(uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("no route for {}", uri.path()) })),
    )
}

pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "carblog listening");
    axum::serve(listener, app).await?;
    Ok(())
}

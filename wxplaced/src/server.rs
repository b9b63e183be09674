//! HTTP responder.
//!
//! Any path returns the current placefile, `/status` returns the state of the engine.  Until a
//! first document exists we answer `300` with an empty body, which the plotting client treats
//! as "try again later".
//!

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use eyre::Result;
use tokio::net::TcpListener;
use tracing::{info, trace};

use wxplace_engine::{RefreshState, StatusReport};

pub fn router(state: Arc<RefreshState>) -> Router {
    Router::new()
        .route("/status", get(status))
        .fallback(placefile)
        .with_state(state)
}

async fn status(State(state): State<Arc<RefreshState>>) -> Json<StatusReport> {
    Json(state.status())
}

async fn placefile(State(state): State<Arc<RefreshState>>) -> Response {
    let doc = state.document();
    if doc.is_empty() {
        trace!("not ready");
        return StatusCode::MULTIPLE_CHOICES.into_response();
    }
    (
        [(header::CONTENT_TYPE, "text/plain")],
        doc.as_str().to_owned(),
    )
        .into_response()
}

/// Serve until the listener fails.
///
#[tracing::instrument(skip(state))]
pub async fn serve(state: Arc<RefreshState>, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {addr}");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

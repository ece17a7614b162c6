// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Quill save daemon: the HTTP persistence endpoint for one document
//! instance.
//!
//! Serves `POST /save` with the full document text as the body and an
//! optional `X-Filename` header carrying the client's belief about which
//! document it is saving. The daemon answers cross-origin requests with a
//! wildcard origin so the document opened straight from disk (`file://`)
//! can reach it.
//!
//! The [`DocumentStore`] sits behind a mutex: requests may arrive
//! concurrently, but the backup-then-write sequence runs one save at a time
//! per document.

use anyhow::{Context, Result};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderMap, HeaderName, Method, StatusCode};
use axum::routing::post;
use axum::Router;
use clap::Parser;
use quill_core::{DocumentStore, InstanceConfig, SaveError};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Request header carrying the client's claimed document filename.
const DOC_NAME_HEADER: HeaderName = HeaderName::from_static("x-filename");

#[derive(Parser, Debug)]
#[command(author, version, about = "Quill save daemon")]
struct Args {
    /// Instance config written by quill-deploy (e.g. svr_notes.json)
    #[arg(long, default_value = "quill.json")]
    config: PathBuf,
    /// Override the listen address from the config (e.g. 127.0.0.1:3000)
    #[arg(long)]
    listen: Option<SocketAddr>,
    /// Maximum accepted request body in bytes
    #[arg(long, default_value_t = 50 * 1024 * 1024)]
    max_body_bytes: usize,
}

struct AppState {
    /// Serializes backup-then-write per document.
    store: Mutex<DocumentStore>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = InstanceConfig::load(&args.config)
        .with_context(|| format!("load instance config {}", args.config.display()))?;
    let listen = args.listen.unwrap_or(config.listen);

    std::fs::create_dir_all(&config.backup_dir).with_context(|| {
        format!("create backup directory {}", config.backup_dir.display())
    })?;

    let store = DocumentStore::new(config.document, config.backup_dir, config.retention);
    info!(
        document = %store.document().display(),
        policy = ?store.policy(),
        "quill saver starting"
    );

    let state = Arc::new(AppState {
        store: Mutex::new(store),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, DOC_NAME_HEADER]);

    let app = Router::new()
        .route("/save", post(save_handler))
        .layer(DefaultBodyLimit::max(args.max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("bind {listen}"))?;
    info!("saver listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "failed to install ctrl-c handler");
        // No signal source; keep serving rather than shutting down at once.
        std::future::pending::<()>().await;
    }
}

async fn save_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let claimed = claimed_name(&headers);

    let store = state.store.lock().await;
    match store.save(&body, claimed) {
        Ok(receipt) => {
            info!(
                bytes = body.len(),
                backup = receipt.backup.is_some(),
                pruned = receipt.pruned,
                "document saved"
            );
            (StatusCode::OK, "document saved".to_owned())
        }
        Err(err) => {
            match &err {
                SaveError::EmptyContent => {}
                SaveError::IdentityMismatch { .. } => warn!(%err, "save rejected"),
                SaveError::Backup(_) | SaveError::Write(_) => error!(%err, "save failed"),
            }
            response_for(&err)
        }
    }
}

/// Extract the client's claimed filename, if the header is present and
/// non-empty.
fn claimed_name(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(DOC_NAME_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

/// Map a pipeline error to the wire response. Validation failures get
/// descriptive bodies; I/O failures get a generic body — the detail belongs
/// in the operator log, not on the wire.
fn response_for(err: &SaveError) -> (StatusCode, String) {
    match err {
        SaveError::EmptyContent => (StatusCode::BAD_REQUEST, "no content received".to_owned()),
        SaveError::IdentityMismatch { .. } => (StatusCode::FORBIDDEN, err.to_string()),
        SaveError::Backup(_) | SaveError::Write(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "error saving document".to_owned(),
        ),
    }
}

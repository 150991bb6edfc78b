//! Result relay: accepts finalized calculations over HTTP and emails them,
//! and serves the static web bundle with an `index.html` fallback.

pub mod mailer;
pub mod routes;
pub mod types;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{info, warn};

use crate::config::RelayConfig;

pub use self::mailer::{compose, Mailer, OutgoingMail, SmtpMailer};
pub use self::routes::RelayState;
pub use self::types::ApiReply;

/// Largest accepted request body.
pub const BODY_LIMIT: usize = 200 * 1024;
const INDEX_FILE: &str = "index.html";

pub fn router<M: Mailer>(mailer: Option<M>, static_dir: &Path) -> Router {
    let state = RelayState {
        mailer: mailer.map(Arc::new),
    };
    let spa = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join(INDEX_FILE)));

    Router::new()
        .route("/health", get(routes::health))
        .route(
            "/send-result",
            post(routes::send_result::<M>).fallback(routes::method_not_allowed),
        )
        .with_state(state)
        .fallback_service(spa)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(CorsLayer::permissive())
}

/// Run the relay on `0.0.0.0:{port}` until the process exits.
pub async fn serve(config: RelayConfig) -> anyhow::Result<()> {
    let mailer = match &config.mail {
        Some(mail) => Some(SmtpMailer::new(mail).map_err(anyhow::Error::msg)?),
        None => {
            warn!("Mail credentials missing; /send-result will answer 500");
            None
        }
    };

    if !config.static_dir.join(INDEX_FILE).exists() {
        warn!(
            "No {} in {:?}; static routes will answer 404",
            INDEX_FILE, config.static_dir
        );
    }

    let app = router(mailer, &config.static_dir);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind relay to {}", addr))?;

    info!("Relay listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await.context("Relay server failed")?;
    Ok(())
}

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use tracing::{error, info, warn};

use super::mailer::{compose, Mailer};
use super::types::{field_text, ApiReply, ResultPayload};

/// Shared handler state. `mailer` is `None` when credentials are missing.
pub struct RelayState<M> {
    pub mailer: Option<Arc<M>>,
}

impl<M> Clone for RelayState<M> {
    fn clone(&self) -> Self {
        Self {
            mailer: self.mailer.clone(),
        }
    }
}

type Reply = (StatusCode, Json<ApiReply>);

fn reply(status: StatusCode, body: ApiReply) -> Reply {
    (status, Json(body))
}

pub async fn health() -> Json<ApiReply> {
    Json(ApiReply::ok())
}

pub async fn send_result<M: Mailer>(State(state): State<RelayState<M>>, body: Bytes) -> Reply {
    let payload = ResultPayload::from_body(&body);
    if !payload.has_result() {
        warn!("Rejected /send-result without a result");
        return reply(StatusCode::BAD_REQUEST, ApiReply::error("Missing result"));
    }

    let Some(mailer) = state.mailer.as_deref() else {
        error!("Cannot send result email: mail credentials are not configured");
        return reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiReply::error("Missing env vars"),
        );
    };

    let mode = field_text(&payload.mode);
    let mail = compose(
        &field_text(&payload.expression),
        &field_text(&payload.result),
        &mode,
        Utc::now(),
    );

    match mailer.send(mail).await {
        Ok(()) => {
            info!("Relayed {} result", if payload.is_ai() { "AI" } else { "standard" });
            reply(StatusCode::OK, ApiReply::ok())
        }
        Err(e) => {
            error!("Failed to relay result: {}", e);
            reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiReply::error("Send failed"),
            )
        }
    }
}

pub async fn method_not_allowed() -> Reply {
    reply(
        StatusCode::METHOD_NOT_ALLOWED,
        ApiReply::error("Method not allowed"),
    )
}

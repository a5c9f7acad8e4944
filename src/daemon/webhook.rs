use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use std::sync::Arc;

use crate::daemon::dispatch::{self, Action, EventKind};
use crate::daemon::protocol::{AckResponse, ErrorResponse};
use crate::daemon::scheduler::Job;
use crate::daemon::DaemonState;
use crate::models::deploy::DeployTrigger;
use crate::models::events::PushSummary;

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";
pub const EVENT_HEADER: &str = "x-github-event";
pub const DELIVERY_HEADER: &str = "x-github-delivery";

pub async fn handle_webhook(
    State(state): State<Arc<DaemonState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AckResponse>, (StatusCode, Json<ErrorResponse>)> {
    let delivery = header_str(&headers, DELIVERY_HEADER).unwrap_or("-");

    // Verify against the untouched body bytes
    let signature = header_str(&headers, SIGNATURE_HEADER);
    if !state.verifier.verify(&body, signature) {
        if signature.is_none() {
            tracing::warn!("Webhook rejected (delivery: {}): missing signature", delivery);
        } else {
            tracing::warn!("Webhook rejected (delivery: {}): invalid signature", delivery);
        }
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "invalid signature".to_string(),
            }),
        ));
    }

    let kind = EventKind::parse(header_str(&headers, EVENT_HEADER));
    let action = dispatch::dispatch(&kind);

    match action {
        Action::Deploy => {
            let trigger = DeployTrigger::from_push(
                header_str(&headers, DELIVERY_HEADER).map(str::to_string),
                PushSummary::from_payload(&body),
            );
            tracing::info!("Push received ({}), queueing deploy", trigger);

            if state
                .scheduler_tx
                .send(Job::Deploy { trigger })
                .await
                .is_err()
            {
                tracing::error!(
                    "Deploy scheduler is not running, push (delivery: {}) dropped",
                    delivery
                );
                return Err((
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(ErrorResponse {
                        error: "deploy unavailable".to_string(),
                    }),
                ));
            }
        }
        Action::Ignore => {
            tracing::info!("Ignoring '{}' event (delivery: {})", kind, delivery);
        }
    }

    Ok(Json(AckResponse::new(&kind, action)))
}

/// Non-UTF-8 header values count as absent
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

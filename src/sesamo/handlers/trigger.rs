//! Trigger dispatch endpoint.
//!
//! The identity provider posts one challenge event per lifecycle trigger.
//! Normal completion returns the mutated event; the two terminal denials are
//! surfaced as `401` so the provider denies the login instead of retrying.

use crate::challenge::{event::ChallengeEvent, notifier::Notifier, orchestrator};
use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

#[utoipa::path(
    post,
    path = "/v1/trigger",
    request_body = ChallengeEvent,
    responses(
        (status = 200, description = "Challenge event processed", body = ChallengeEvent, content_type = "application/json"),
        (status = 400, description = "Missing payload", body = String),
        (status = 401, description = "Authentication denied, do not retry", body = String),
    ),
    tag = "sesamo"
)]
#[instrument(skip_all)]
pub async fn trigger(
    notifier: Extension<Arc<dyn Notifier>>,
    payload: Option<Json<ChallengeEvent>>,
) -> impl IntoResponse {
    let mut event: ChallengeEvent = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    // Passcodes ride in the event, keep it out of info-level logs.
    debug!(event = ?event, "received trigger event");

    match orchestrator::dispatch(&mut event, notifier.0.as_ref()) {
        Ok(()) => {
            debug!(event = ?event, "returned trigger event");
            Json(event).into_response()
        }
        Err(deny) => {
            warn!(%deny, "authentication denied");
            (StatusCode::UNAUTHORIZED, deny.to_string()).into_response()
        }
    }
}

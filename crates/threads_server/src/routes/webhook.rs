use crate::catchers::{ErrorMessage, ThreadsResponse};
use crate::config::CONFIG;
use crate::guards::WebhookHeaders;
use crate::mongo::ThreadsDB;
use crate::webhook::{verify_signature, WebhookEvent};
use rocket::data::{Data, ToByteUnit};
use rocket::serde::json::{json, Json, Value};
use rocket::State;
use threads_common::errors::ThreadsServerError;

/// Largest webhook body accepted, in kibibytes
const MAX_WEBHOOK_BODY_KIB: u64 = 512;

/**
 * Receive organization events from the auth provider
 *
 * @param headers - svix id, timestamp and signature of the delivery
 * @param body - raw event json; the signature covers the exact bytes
 * @return status:
 *             * 200 if the event was applied or ignored
 *             * 400 if svix headers are missing or the event is malformed
 *             * 401 if the signature does not verify
 *             * 404 if the community or user an event names does not exist
 *             * 409 if a membership or community username already exists
 *             * 413 if the body is too large
 *             * 500 if the webhook secret is not configured or db fails
 */
#[post("/auth", data = "<body>")]
pub async fn auth_webhook(
    headers: WebhookHeaders,
    body: Data<'_>,
    db: &State<ThreadsDB>,
) -> Result<Json<Value>, ThreadsResponse> {
    let body = match body.open(MAX_WEBHOOK_BODY_KIB.kibibytes()).into_string().await {
        Ok(body) if body.is_complete() => body.into_inner(),
        Ok(_) => {
            return Err(ThreadsResponse::TooLarge(format!(
                "Webhook body exceeds {} KiB",
                MAX_WEBHOOK_BODY_KIB
            )))
        }
        Err(e) => {
            return Err(ThreadsResponse::BadRequest(ErrorMessage(Some(
                ThreadsServerError::SerdeError(e.to_string()),
            ))))
        }
    };

    let secret = match &CONFIG.webhook_secret {
        Some(secret) => secret,
        None => {
            return Err(ThreadsServerError::ConfigError(String::from(
                "THREADS_WEBHOOK_SECRET is not set",
            ))
            .into())
        }
    };
    verify_signature(
        secret,
        &headers.id,
        &headers.timestamp,
        &headers.signature,
        &body,
        chrono::Utc::now().timestamp(),
    )?;

    let event = WebhookEvent::parse(&body)?;
    let message = event.apply(db).await?;
    tracing::info!("Webhook {}: {}", headers.id, message);
    Ok(Json(json!({ "message": message })))
}

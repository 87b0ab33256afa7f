//! Contact form submission

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use pkv_common::contact::ContactSubmission;
use serde::Serialize;
use uuid::Uuid;

use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub id: Uuid,
    pub received_at: DateTime<Utc>,
}

/// POST /api/contact
///
/// 201 with the stored message id, 422 listing every invalid field, or 503
/// when the contact form is disabled.
pub async fn submit_contact(
    State(state): State<AppState>,
    body: Result<Json<ContactSubmission>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ContactResponse>)> {
    let inbox = state
        .contact
        .clone()
        .ok_or_else(|| ApiError::Unavailable("Contact form is disabled".to_string()))?;

    let Json(submission) = body?;
    let submission = submission.normalized();
    submission.validate().map_err(ApiError::Validation)?;

    let message = inbox.store(submission).await?;
    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            id: message.id,
            received_at: message.received_at,
        }),
    ))
}

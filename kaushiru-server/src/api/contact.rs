//! Contact form endpoint

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Serialize;

use crate::error::ApiResult;
use crate::store::contacts::{self, NewContact};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub id: String,
    /// Whether a notification mail was attempted
    pub mail_enabled: bool,
}

/// POST /api/contact
///
/// The message is stored first; the notification mail is best effort.
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(input): Json<NewContact>,
) -> ApiResult<(StatusCode, Json<ContactResponse>)> {
    let contact = contacts::save_contact(&state.db, &input).await?;
    state.mailer.notify_contact(&contact).await;

    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            id: contact.id,
            mail_enabled: state.mailer.is_enabled(),
        }),
    ))
}

pub fn contact_routes() -> Router<AppState> {
    Router::new().route("/api/contact", post(submit_contact))
}

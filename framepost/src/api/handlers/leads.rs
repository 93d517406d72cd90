//! Handlers for lead capture and history.

use axum::{Json, extract::State};
use tracing::{info, instrument};

use crate::AppState;
use crate::api::models::leads::{LeadPayload, LeadResponse, LeadsResponse};
use crate::db::errors::DbError;
use crate::db::handlers::{Leads, Repository};
use crate::db::models::leads::NewLead;
use crate::errors::{Error, Result};

/// How much history the dashboard sees.
const LEAD_HISTORY_LIMIT: i64 = 200;

#[utoipa::path(
    post,
    path = "/save_lead",
    tag = "leads",
    summary = "Save a lead",
    description = "Store a contact-form submission. `name` and `email` must be non-empty.",
    request_body = LeadPayload,
    responses(
        (status = 200, description = "Lead stored", body = LeadResponse),
        (status = 400, description = "Missing name or email"),
        (status = 500, description = "Internal server error")
    )
)]
#[instrument(skip_all)]
pub async fn save_lead(
    State(state): State<AppState>,
    Json(payload): Json<LeadPayload>,
) -> Result<Json<LeadResponse>> {
    let name = payload.name.trim();
    let email = payload.email.trim();
    if name.is_empty() || email.is_empty() {
        return Err(Error::BadRequest {
            message: "Lead name and email are required".to_string(),
        });
    }

    let request = NewLead {
        name: name.to_string(),
        email: email.to_string(),
        phone: payload.phone,
        service: payload.service,
        message: payload.message,
    };
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let lead = Leads::new(&mut conn).create(&request).await?;
    info!(lead_id = lead.id, "Captured lead");

    Ok(Json(LeadResponse {
        status: "ok".to_string(),
        lead,
    }))
}

#[utoipa::path(
    get,
    path = "/leads",
    tag = "leads",
    summary = "Lead history",
    responses(
        (status = 200, description = "The latest 200 leads, newest first", body = LeadsResponse),
        (status = 500, description = "Internal server error")
    )
)]
#[instrument(skip_all)]
pub async fn list_leads(State(state): State<AppState>) -> Result<Json<LeadsResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let leads = Leads::new(&mut conn).recent(LEAD_HISTORY_LIMIT).await?;
    Ok(Json(LeadsResponse { leads }))
}

//! Wire models for lead capture.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::leads::Lead;

/// A contact-form submission. `name` and `email` must be non-empty after
/// trimming.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LeadPayload {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub service: Option<String>,
    pub message: Option<String>,
}

/// Confirmation wrapping the stored lead.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeadResponse {
    /// Always `"ok"`
    pub status: String,
    pub lead: Lead,
}

/// Lead history, newest first.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeadsResponse {
    pub leads: Vec<Lead>,
}

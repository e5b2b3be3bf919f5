use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::ticket_entity;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClaimTicketRequest {
    #[schema(example = "123456789015")]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TicketResponse {
    pub id: String,
    pub token: String,
    pub prize: Option<String>,
    pub credential_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<ticket_entity::Model> for TicketResponse {
    fn from(m: ticket_entity::Model) -> Self {
        TicketResponse {
            id: m.id,
            token: m.token,
            prize: m.prize,
            credential_id: m.credential_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Filter applied when counting tickets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub prize: Option<String>,
}

/// Ticket about to be inserted by hydration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDraft {
    pub token: String,
    pub prize: String,
}

/// Outcome of a hydration pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HydrationReport {
    pub existing: u64,
    pub created: u64,
}

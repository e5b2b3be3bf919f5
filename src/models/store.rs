use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{caisse_entity, store_entity};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CaisseCreateRequest {
    #[schema(example = "440763b8-b8d9-4b36-9cc6-545a2c03071c")]
    pub store_id: String,
}

/// Moves a cash register to another store.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CaisseUpdateRequest {
    pub store_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CaisseResponse {
    pub id: String,
    pub store_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<caisse_entity::Model> for CaisseResponse {
    fn from(m: caisse_entity::Model) -> Self {
        CaisseResponse {
            id: m.id,
            store_id: m.store_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoreResponse {
    pub id: String,
    pub label: String,
    pub is_online: bool,
    pub caisses: Vec<CaisseResponse>,
}

impl StoreResponse {
    pub fn new(store: store_entity::Model, caisses: Vec<caisse_entity::Model>) -> Self {
        StoreResponse {
            id: store.id,
            label: store.label,
            is_online: store.is_online,
            caisses: caisses.into_iter().map(Into::into).collect(),
        }
    }
}

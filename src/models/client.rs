use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{client_entity, credential_entity};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClientRegisterRequest {
    #[schema(example = "user-thetiptop@yopmail.com")]
    pub email: String,
    #[schema(example = "Aa1@azetyuiop")]
    pub password: String,
    /// Terms of use, must be accepted
    pub cgu: Option<bool>,
    pub newsletter: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClientUpdateRequest {
    pub id: String,
    pub newsletter: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClientResponse {
    pub id: String,
    pub email: Option<String>,
    pub cgu: bool,
    pub newsletter: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ClientResponse {
    pub fn new(client: client_entity::Model, credential: Option<&credential_entity::Model>) -> Self {
        ClientResponse {
            id: client.id,
            email: credential.map(|c| c.email.clone()),
            cgu: client.cgu,
            newsletter: client.newsletter,
            created_at: client.created_at,
            updated_at: client.updated_at,
        }
    }
}

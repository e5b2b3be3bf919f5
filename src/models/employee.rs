use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{credential_entity, employee_entity};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EmployeeRegisterRequest {
    #[schema(example = "employee-thetiptop@yopmail.com")]
    pub email: String,
    #[schema(example = "Aa1@azetyuiop")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EmployeeUpdateRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmployeeResponse {
    pub id: String,
    pub email: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl EmployeeResponse {
    pub fn new(
        employee: employee_entity::Model,
        credential: Option<&credential_entity::Model>,
    ) -> Self {
        EmployeeResponse {
            id: employee.id,
            email: credential.map(|c| c.email.clone()),
            created_at: employee.created_at,
            updated_at: employee.updated_at,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::validation_entity::{self, ValidationType};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Employee,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Client => write!(f, "client"),
            Role::Employee => write!(f, "employee"),
        }
    }
}

/// Authenticated caller, stored in request extensions by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub credential_id: String,
    pub user_id: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_employee(&self) -> bool {
        self.role == Role::Employee
    }

    /// A resource is reachable by the credential owning it or by any employee.
    pub fn can_access(&self, owner_credential_id: Option<&str>) -> bool {
        self.is_employee() || owner_credential_id == Some(self.credential_id.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "user-thetiptop@yopmail.com")]
    pub email: String,
    #[schema(example = "Aa1@azetyuiop")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub role: Role,
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidationRecoverRequest {
    #[schema(example = "user-thetiptop@yopmail.com")]
    pub email: String,
    #[serde(rename = "type")]
    #[schema(example = "mail")]
    pub validation_type: ValidationType,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PasswordUpdateRequest {
    #[schema(example = "user-thetiptop@yopmail.com")]
    pub email: String,
    #[schema(example = "Aa1@azetyuiop")]
    pub password: String,
    #[schema(example = "123455")]
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MailValidationRequest {
    #[schema(example = "user-thetiptop@yopmail.com")]
    pub email: String,
    #[schema(example = "123455")]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidationResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub validation_type: ValidationType,
    pub validated: bool,
    pub client_id: Option<String>,
    pub employee_id: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl From<validation_entity::Model> for ValidationResponse {
    fn from(m: validation_entity::Model) -> Self {
        ValidationResponse {
            id: m.id,
            validation_type: m.validation_type,
            validated: m.validated,
            client_id: m.client_id,
            employee_id: m.employee_id,
            expires_at: m.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            credential_id: "cred-1".to_string(),
            user_id: "user-1".to_string(),
            role,
        }
    }

    #[test]
    fn test_owner_can_access() {
        assert!(user(Role::Client).can_access(Some("cred-1")));
        assert!(!user(Role::Client).can_access(Some("cred-2")));
        assert!(!user(Role::Client).can_access(None));
    }

    #[test]
    fn test_employee_can_access_anything() {
        assert!(user(Role::Employee).can_access(Some("cred-2")));
        assert!(user(Role::Employee).can_access(None));
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Employee).unwrap(), "\"employee\"");
        let role: Role = serde_json::from_str("\"client\"").unwrap();
        assert_eq!(role, Role::Client);
    }

    #[test]
    fn test_recover_request_uses_type_field() {
        let req: ValidationRecoverRequest =
            serde_json::from_str(r#"{"email":"a@b.fr","type":"password"}"#).unwrap();
        assert_eq!(req.validation_type, ValidationType::Password);
    }
}

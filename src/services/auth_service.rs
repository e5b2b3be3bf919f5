use crate::entities::validation_entity::ValidationType;
use crate::entities::{
    client_entity as clients, credential_entity as credentials, employee_entity as employees,
    validation_entity as validations,
};
use crate::error::{AppError, AppResult};
use crate::external::MailService;
use crate::models::*;
use crate::utils::*;
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set,
};

/// Client or employee attached to a credential.
#[derive(Debug, Clone)]
pub enum UserAccount {
    Client(clients::Model),
    Employee(employees::Model),
}

impl UserAccount {
    pub fn id(&self) -> &str {
        match self {
            UserAccount::Client(c) => &c.id,
            UserAccount::Employee(e) => &e.id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            UserAccount::Client(_) => Role::Client,
            UserAccount::Employee(_) => Role::Employee,
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
    mail_service: MailService,
    validation_expire: i64,
}

impl AuthService {
    pub fn new(
        pool: DatabaseConnection,
        jwt_service: JwtService,
        mail_service: MailService,
        validation_expire: i64,
    ) -> Self {
        Self {
            pool,
            jwt_service,
            mail_service,
            validation_expire,
        }
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&request.email);
        validate_email(&email)?;

        let credential = self
            .find_credential(&email)
            .await?
            .ok_or_else(|| AppError::AuthError("credential.not_found".to_string()))?;

        if !verify_password(&email, &request.password, &credential.password_hash)? {
            return Err(AppError::AuthError("credential.not_found".to_string()));
        }

        let account = self.find_account(&credential.id).await?;
        log::info!("User logged in: {} ({})", account.id(), account.role());
        self.issue_tokens(&credential.id, &account)
    }

    /// New token pair from a refresh token. Role and user id are reloaded so a
    /// deleted account cannot renew.
    pub async fn renew(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;
        let account = match self.find_account(&claims.sub).await {
            Err(AppError::NotFound(msg)) => return Err(AppError::AuthError(msg)),
            other => other?,
        };
        self.issue_tokens(&claims.sub, &account)
    }

    pub async fn mail_validation(
        &self,
        request: MailValidationRequest,
    ) -> AppResult<ValidationResponse> {
        let email = normalize_email(&request.email);
        validate_email(&email)?;
        check_validation_token(&request.token)?;

        let validation = self
            .consume_validation(&email, &request.token, ValidationType::Mail)
            .await?;
        Ok(validation.into())
    }

    /// Issues a fresh validation of the requested type. Phone codes are not
    /// mailed.
    pub async fn validation_recover(&self, request: ValidationRecoverRequest) -> AppResult<()> {
        let email = normalize_email(&request.email);
        validate_email(&email)?;

        let credential = self
            .find_credential(&email)
            .await?
            .ok_or_else(|| AppError::NotFound("user.not_found".to_string()))?;
        let account = self.find_account(&credential.id).await?;

        let validation =
            create_validation(&self.pool, &account, request.validation_type, self.validation_expire)
                .await?;

        if validation.validation_type != ValidationType::Phone {
            self.spawn_validation_mail(credential.email, &validation);
        }
        Ok(())
    }

    pub async fn password_update(
        &self,
        request: PasswordUpdateRequest,
    ) -> AppResult<ValidationResponse> {
        let email = normalize_email(&request.email);
        validate_email(&email)?;
        validate_password(&request.password)?;
        check_validation_token(&request.token)?;

        let validation = self
            .consume_validation(&email, &request.token, ValidationType::Password)
            .await?;

        let credential = self
            .find_credential(&email)
            .await?
            .ok_or_else(|| AppError::NotFound("user.not_found".to_string()))?;
        let password_hash = hash_password(&credential.email, &request.password)?;

        let mut am = credential.into_active_model();
        am.password_hash = Set(password_hash);
        am.update(&self.pool).await?;

        log::info!("Password updated for validation {}", validation.id);
        Ok(validation.into())
    }

    pub fn validation_expire(&self) -> i64 {
        self.validation_expire
    }

    /// Sends the validation token by mail on a detached task.
    pub fn spawn_validation_mail(&self, email: String, validation: &validations::Model) {
        let mail_service = self.mail_service.clone();
        let kind = validation.validation_type;
        let token = validation.token.clone();
        tokio::spawn(async move {
            if let Err(e) = mail_service.send_validation(&email, kind, &token).await {
                log::error!("Validation mail to {email} failed: {e}");
            }
        });
    }

    pub async fn find_credential(&self, email: &str) -> AppResult<Option<credentials::Model>> {
        Ok(credentials::Entity::find()
            .filter(credentials::Column::Email.eq(email))
            .one(&self.pool)
            .await?)
    }

    pub async fn find_account(&self, credential_id: &str) -> AppResult<UserAccount> {
        if let Some(client) = clients::Entity::find()
            .filter(clients::Column::CredentialId.eq(credential_id))
            .one(&self.pool)
            .await?
        {
            return Ok(UserAccount::Client(client));
        }

        employees::Entity::find()
            .filter(employees::Column::CredentialId.eq(credential_id))
            .one(&self.pool)
            .await?
            .map(UserAccount::Employee)
            .ok_or_else(|| AppError::NotFound("user.not_found".to_string()))
    }

    fn issue_tokens(&self, credential_id: &str, account: &UserAccount) -> AppResult<AuthResponse> {
        let role = account.role();
        let access_token =
            self.jwt_service
                .generate_access_token(credential_id, account.id(), role)?;
        let refresh_token =
            self.jwt_service
                .generate_refresh_token(credential_id, account.id(), role)?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
            role,
            user_id: account.id().to_string(),
        })
    }

    /// Marks the latest validation of `kind` matching `token` for the owner
    /// of `email` as used.
    async fn consume_validation(
        &self,
        email: &str,
        token: &str,
        kind: ValidationType,
    ) -> AppResult<validations::Model> {
        let not_found = || AppError::NotFound("validation.not_found".to_string());

        let credential = self.find_credential(email).await?.ok_or_else(not_found)?;
        let account = match self.find_account(&credential.id).await {
            Err(AppError::NotFound(_)) => return Err(not_found()),
            other => other?,
        };

        let owner = match &account {
            UserAccount::Client(c) => validations::Column::ClientId.eq(c.id.as_str()),
            UserAccount::Employee(e) => validations::Column::EmployeeId.eq(e.id.as_str()),
        };

        let validation = validations::Entity::find()
            .filter(owner)
            .filter(validations::Column::Token.eq(token))
            .filter(validations::Column::ValidationType.eq(kind))
            .order_by_desc(validations::Column::CreatedAt)
            .one(&self.pool)
            .await?
            .ok_or_else(not_found)?;

        check_validation_state(&validation)?;

        let mut am = validation.into_active_model();
        am.validated = Set(true);
        Ok(am.update(&self.pool).await?)
    }
}

/// Inserts a new validation for `account`, valid for `expire` seconds.
pub async fn create_validation<C>(
    db: &C,
    account: &UserAccount,
    kind: ValidationType,
    expire: i64,
) -> AppResult<validations::Model>
where
    C: ConnectionTrait,
{
    let (client_id, employee_id) = match account {
        UserAccount::Client(c) => (Some(c.id.clone()), None),
        UserAccount::Employee(e) => (None, Some(e.id.clone())),
    };

    let validation = validations::ActiveModel {
        token: Set(LuhnToken::generate(VALIDATION_TOKEN_LENGTH).into_string()),
        validation_type: Set(kind),
        validated: Set(false),
        client_id: Set(client_id),
        employee_id: Set(employee_id),
        expires_at: Set(Utc::now() + Duration::seconds(expire)),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(validation)
}

fn check_validation_token(token: &str) -> AppResult<()> {
    if token.len() != VALIDATION_TOKEN_LENGTH {
        return Err(AppError::ValidationError(format!(
            "token must have {VALIDATION_TOKEN_LENGTH} digits"
        )));
    }
    LuhnToken::new(token)
        .validate()
        .map_err(|e| AppError::ValidationError(format!("invalid token: {e}")))
}

/// Expiry wins over the validated flag.
fn check_validation_state(validation: &validations::Model) -> AppResult<()> {
    if validation.has_expired() {
        return Err(AppError::Gone("validation.expired".to_string()));
    }
    if validation.validated {
        return Err(AppError::Conflict("validation.already_validated".to_string()));
    }
    Ok(())
}

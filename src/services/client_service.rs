use crate::entities::validation_entity::ValidationType;
use crate::entities::{client_entity as clients, credential_entity as credentials};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::{AuthService, UserAccount, create_validation};
use crate::utils::*;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    ModelTrait, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};

#[derive(Clone)]
pub struct ClientService {
    pool: DatabaseConnection,
    auth_service: AuthService,
}

impl ClientService {
    pub fn new(pool: DatabaseConnection, auth_service: AuthService) -> Self {
        Self { pool, auth_service }
    }

    /// Creates the credential, the client and a mail validation in one
    /// transaction, then mails the validation token in the background.
    pub async fn register(&self, request: ClientRegisterRequest) -> AppResult<ClientResponse> {
        let email = normalize_email(&request.email);
        validate_email(&email)?;
        validate_password(&request.password)?;

        let newsletter = request
            .newsletter
            .ok_or_else(|| AppError::ValidationError("newsletter is required".to_string()))?;
        match request.cgu {
            None => {
                return Err(AppError::ValidationError("cgu is required".to_string()));
            }
            Some(false) => {
                return Err(AppError::ValidationError("cgu must be accepted".to_string()));
            }
            Some(true) => {}
        }

        if self.auth_service.find_credential(&email).await?.is_some() {
            return Err(AppError::Conflict("client.already_exists".to_string()));
        }

        let password_hash = hash_password(&email, &request.password)?;

        let txn = self.pool.begin().await?;

        let credential = credentials::ActiveModel {
            email: Set(email.clone()),
            password_hash: Set(password_hash),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| already_exists(e, "client.already_exists"))?;

        let client = clients::ActiveModel {
            credential_id: Set(Some(credential.id.clone())),
            cgu: Set(true),
            newsletter: Set(newsletter),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let account = UserAccount::Client(client.clone());
        let validation = create_validation(
            &txn,
            &account,
            ValidationType::Mail,
            self.auth_service.validation_expire(),
        )
        .await?;

        txn.commit().await?;

        log::info!("Client registered: {}", client.id);
        self.auth_service
            .spawn_validation_mail(credential.email.clone(), &validation);

        Ok(ClientResponse::new(client, Some(&credential)))
    }

    pub async fn get(&self, id: &str, caller: &AuthUser) -> AppResult<ClientResponse> {
        let client = self.find_accessible(id, caller).await?;
        let credential = self.credential_of(&client).await?;
        Ok(ClientResponse::new(client, credential.as_ref()))
    }

    pub async fn update(
        &self,
        request: ClientUpdateRequest,
        caller: &AuthUser,
    ) -> AppResult<ClientResponse> {
        let client = self.find_accessible(&request.id, caller).await?;

        let client = match request.newsletter {
            Some(newsletter) => {
                let mut am = client.into_active_model();
                am.newsletter = Set(newsletter);
                am.update(&self.pool).await?
            }
            None => client,
        };

        let credential = self.credential_of(&client).await?;
        Ok(ClientResponse::new(client, credential.as_ref()))
    }

    /// Deletes the client and its credential. Validations go with the client;
    /// claimed tickets keep their owner reference.
    pub async fn delete(&self, id: &str, caller: &AuthUser) -> AppResult<()> {
        let client = self.find_accessible(id, caller).await?;
        let credential_id = client.credential_id.clone();

        let txn = self.pool.begin().await?;
        client.delete(&txn).await?;
        if let Some(credential_id) = credential_id {
            credentials::Entity::delete_by_id(credential_id)
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;

        log::info!("Client deleted: {id}");
        Ok(())
    }

    /// Every client with its email. Employees only.
    pub async fn export(&self, caller: &AuthUser) -> AppResult<Vec<ClientResponse>> {
        if !caller.is_employee() {
            return Err(AppError::Forbidden);
        }

        let list = clients::Entity::find()
            .order_by_asc(clients::Column::CreatedAt)
            .all(&self.pool)
            .await?;

        let credential_ids: Vec<String> =
            list.iter().filter_map(|c| c.credential_id.clone()).collect();
        let credentials = credentials::Entity::find()
            .filter(credentials::Column::Id.is_in(credential_ids))
            .all(&self.pool)
            .await?;

        Ok(list
            .into_iter()
            .map(|client| {
                let credential = credentials
                    .iter()
                    .find(|c| client.credential_id.as_deref() == Some(c.id.as_str()));
                ClientResponse::new(client, credential)
            })
            .collect())
    }

    async fn find_accessible(&self, id: &str, caller: &AuthUser) -> AppResult<clients::Model> {
        let client = clients::Entity::find_by_id(id.to_string())
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("client.not_found".to_string()))?;

        if !caller.can_access(client.credential_id.as_deref()) {
            return Err(AppError::Forbidden);
        }
        Ok(client)
    }

    async fn credential_of(
        &self,
        client: &clients::Model,
    ) -> AppResult<Option<credentials::Model>> {
        match &client.credential_id {
            Some(id) => Ok(credentials::Entity::find_by_id(id.clone())
                .one(&self.pool)
                .await?),
            None => Ok(None),
        }
    }
}

/// Maps the email unique index violation, hit when two registrations race, to
/// a conflict.
pub(crate) fn already_exists(err: DbErr, code: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(code.to_string()),
        _ => AppError::DatabaseError(err),
    }
}

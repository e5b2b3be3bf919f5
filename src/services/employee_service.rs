use crate::entities::validation_entity::ValidationType;
use crate::entities::{credential_entity as credentials, employee_entity as employees};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::client_service::already_exists;
use crate::services::{AuthService, UserAccount, create_validation};
use crate::utils::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait, Set,
    TransactionTrait,
};

#[derive(Clone)]
pub struct EmployeeService {
    pool: DatabaseConnection,
    auth_service: AuthService,
}

impl EmployeeService {
    pub fn new(pool: DatabaseConnection, auth_service: AuthService) -> Self {
        Self { pool, auth_service }
    }

    pub async fn register(
        &self,
        request: EmployeeRegisterRequest,
    ) -> AppResult<EmployeeResponse> {
        let email = normalize_email(&request.email);
        validate_email(&email)?;
        validate_password(&request.password)?;

        if self.auth_service.find_credential(&email).await?.is_some() {
            return Err(AppError::Conflict("employee.already_exists".to_string()));
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
        .map_err(|e| already_exists(e, "employee.already_exists"))?;

        let employee = employees::ActiveModel {
            credential_id: Set(Some(credential.id.clone())),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let account = UserAccount::Employee(employee.clone());
        let validation = create_validation(
            &txn,
            &account,
            ValidationType::Mail,
            self.auth_service.validation_expire(),
        )
        .await?;

        txn.commit().await?;

        log::info!("Employee registered: {}", employee.id);
        self.auth_service
            .spawn_validation_mail(credential.email.clone(), &validation);

        Ok(EmployeeResponse::new(employee, Some(&credential)))
    }

    pub async fn get(&self, id: &str, caller: &AuthUser) -> AppResult<EmployeeResponse> {
        let employee = self.find_accessible(id, caller).await?;
        let credential = self.credential_of(&employee).await?;
        Ok(EmployeeResponse::new(employee, credential.as_ref()))
    }

    /// Employees carry no editable field yet; the update only refreshes
    /// `updated_at`.
    pub async fn update(
        &self,
        request: EmployeeUpdateRequest,
        caller: &AuthUser,
    ) -> AppResult<EmployeeResponse> {
        let employee = self.find_accessible(&request.id, caller).await?;
        let mut am = employee.into_active_model();
        am.updated_at = Set(Some(Utc::now()));
        let employee = am.update(&self.pool).await?;
        let credential = self.credential_of(&employee).await?;
        Ok(EmployeeResponse::new(employee, credential.as_ref()))
    }

    pub async fn delete(&self, id: &str, caller: &AuthUser) -> AppResult<()> {
        let employee = self.find_accessible(id, caller).await?;
        let credential_id = employee.credential_id.clone();

        let txn = self.pool.begin().await?;
        employee.delete(&txn).await?;
        if let Some(credential_id) = credential_id {
            credentials::Entity::delete_by_id(credential_id)
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;

        log::info!("Employee deleted: {id}");
        Ok(())
    }

    async fn find_accessible(&self, id: &str, caller: &AuthUser) -> AppResult<employees::Model> {
        let employee = employees::Entity::find_by_id(id.to_string())
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("employee.not_found".to_string()))?;

        if !caller.can_access(employee.credential_id.as_deref()) {
            return Err(AppError::Forbidden);
        }
        Ok(employee)
    }

    async fn credential_of(
        &self,
        employee: &employees::Model,
    ) -> AppResult<Option<credentials::Model>> {
        match &employee.credential_id {
            Some(id) => Ok(credentials::Entity::find_by_id(id.clone())
                .one(&self.pool)
                .await?),
            None => Ok(None),
        }
    }
}

use crate::entities::ticket_entity as tickets;
use crate::error::{AppError, AppResult};
use crate::models::{AuthUser, TicketResponse};
use crate::utils::{LuhnToken, TICKET_TOKEN_LENGTH};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter, QueryOrder, UpdateResult,
};

#[derive(Clone)]
pub struct GameService {
    pool: DatabaseConnection,
}

impl GameService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// One unclaimed ticket picked at random.
    pub async fn random_ticket(&self) -> AppResult<TicketResponse> {
        let ticket = tickets::Entity::find()
            .filter(tickets::Column::CredentialId.is_null())
            .order_by(Expr::cust("RANDOM()"), Order::Asc)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("ticket.not_found".to_string()))?;
        Ok(ticket.into())
    }

    pub async fn my_tickets(&self, caller: &AuthUser) -> AppResult<Vec<TicketResponse>> {
        let list = tickets::Entity::find()
            .filter(tickets::Column::CredentialId.eq(caller.credential_id.as_str()))
            .order_by_desc(tickets::Column::UpdatedAt)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    pub async fn get_ticket(&self, id: &str, caller: &AuthUser) -> AppResult<TicketResponse> {
        let ticket = tickets::Entity::find_by_id(id.to_string())
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("ticket.not_found".to_string()))?;

        if !caller.can_access(ticket.credential_id.as_deref()) {
            return Err(AppError::Forbidden);
        }
        Ok(ticket.into())
    }

    /// Assigns the ticket carrying `token` to the caller.
    ///
    /// The owner is set with a single conditional update on
    /// `credential_id IS NULL`, so of two concurrent claims only one wins.
    pub async fn claim_ticket(&self, token: &str, caller: &AuthUser) -> AppResult<TicketResponse> {
        check_ticket_token(token)?;

        let result: UpdateResult = tickets::Entity::update_many()
            .col_expr(
                tickets::Column::CredentialId,
                Expr::value(caller.credential_id.clone()),
            )
            .col_expr(tickets::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(tickets::Column::Token.eq(token))
            .filter(tickets::Column::CredentialId.is_null())
            .exec(&self.pool)
            .await?;

        let ticket = tickets::Entity::find()
            .filter(tickets::Column::Token.eq(token))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("ticket.not_found".to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::Conflict("ticket.already_claimed".to_string()));
        }

        log::info!(
            "Ticket {} claimed by {} ({})",
            ticket.id,
            caller.user_id,
            caller.role
        );
        Ok(ticket.into())
    }
}

fn check_ticket_token(token: &str) -> AppResult<()> {
    if token.len() != TICKET_TOKEN_LENGTH {
        return Err(AppError::ValidationError(format!(
            "token must have {TICKET_TOKEN_LENGTH} digits"
        )));
    }
    LuhnToken::new(token)
        .validate()
        .map_err(|e| AppError::ValidationError(format!("invalid token: {e}")))
}

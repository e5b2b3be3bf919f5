use crate::entities::ticket_entity as tickets;
use crate::error::AppResult;
use crate::models::{TicketDraft, TicketFilter};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect, Set,
};
use uuid::Uuid;

/// Storage used by ticket hydration.
///
/// `create_tickets_batch` reports a token collision with
/// `AppError::DuplicateToken`; every other failure is returned as is.
#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn count_tickets(&self, filter: &TicketFilter) -> AppResult<u64>;

    async fn read_all_tokens(&self) -> AppResult<Vec<String>>;

    async fn create_tickets_batch(&self, drafts: Vec<TicketDraft>) -> AppResult<()>;
}

#[derive(Clone)]
pub struct SeaOrmTicketRepository {
    pool: DatabaseConnection,
}

impl SeaOrmTicketRepository {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketRepository for SeaOrmTicketRepository {
    async fn count_tickets(&self, filter: &TicketFilter) -> AppResult<u64> {
        let mut query = tickets::Entity::find();
        if let Some(prize) = &filter.prize {
            query = query.filter(tickets::Column::Prize.eq(prize.as_str()));
        }
        Ok(query.count(&self.pool).await?)
    }

    async fn read_all_tokens(&self) -> AppResult<Vec<String>> {
        let tokens = tickets::Entity::find()
            .select_only()
            .column(tickets::Column::Token)
            .into_tuple::<String>()
            .all(&self.pool)
            .await?;
        Ok(tokens)
    }

    async fn create_tickets_batch(&self, drafts: Vec<TicketDraft>) -> AppResult<()> {
        if drafts.is_empty() {
            return Ok(());
        }

        // DbErr -> AppError maps the token unique index violation to DuplicateToken
        tickets::Entity::insert_many(draft_models(drafts, Utc::now()))
            .exec_without_returning(&self.pool)
            .await?;
        Ok(())
    }
}

/// Rows for a hydration batch. New tickets have no owner.
fn draft_models(drafts: Vec<TicketDraft>, now: DateTime<Utc>) -> Vec<tickets::ActiveModel> {
    drafts
        .into_iter()
        .map(|draft| tickets::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            token: Set(draft.token),
            prize: Set(Some(draft.prize)),
            credential_id: Set(None),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;

    fn draft(token: &str, prize: &str) -> TicketDraft {
        TicketDraft {
            token: token.to_string(),
            prize: prize.to_string(),
        }
    }

    #[test]
    fn test_draft_models_have_no_owner() {
        let now = Utc::now();
        let models = draft_models(
            vec![draft("123456789015", "Infuseur"), draft("000000000000", "Coffret")],
            now,
        );

        assert_eq!(models.len(), 2);
        assert_eq!(models[0].token, Set("123456789015".to_string()));
        assert_eq!(models[1].prize, Set(Some("Coffret".to_string())));
        for model in &models {
            assert_eq!(model.credential_id, Set(None));
            assert_eq!(model.created_at, Set(Some(now)));
        }
        assert_ne!(models[0].id, models[1].id);
    }

    #[tokio::test]
    async fn test_count_tickets_by_prize() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[BTreeMap::from([("num_items", Value::BigInt(Some(42)))])]])
            .append_query_results([[BTreeMap::from([("num_items", Value::BigInt(Some(100)))])]])
            .into_connection();
        let repo = SeaOrmTicketRepository::new(db);

        let filter = TicketFilter {
            prize: Some("Infuseur".to_string()),
        };
        assert_eq!(repo.count_tickets(&filter).await.unwrap(), 42);
        assert_eq!(repo.count_tickets(&TicketFilter::default()).await.unwrap(), 100);

        let log = repo.pool.into_transaction_log();
        assert_eq!(log.len(), 2);
        let filtered = format!("{:?}", log[0]);
        assert!(filtered.contains("WHERE"));
        assert!(filtered.contains("Infuseur"));
        assert!(!format!("{:?}", log[1]).contains("WHERE"));
    }

    #[tokio::test]
    async fn test_read_all_tokens() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[
                BTreeMap::from([("token", Value::from("123456789015"))]),
                BTreeMap::from([("token", Value::from("000000000000"))]),
            ]])
            .into_connection();
        let repo = SeaOrmTicketRepository::new(db);

        let tokens = repo.read_all_tokens().await.unwrap();
        assert_eq!(tokens, vec!["123456789015", "000000000000"]);
    }

    #[tokio::test]
    async fn test_create_tickets_batch_inserts_unowned_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            }])
            .into_connection();
        let repo = SeaOrmTicketRepository::new(db);

        repo.create_tickets_batch(vec![
            draft("123456789015", "Infuseur"),
            draft("000000000000", "Infuseur"),
        ])
        .await
        .unwrap();

        let log = repo.pool.into_transaction_log();
        assert_eq!(log.len(), 1);
        let insert = format!("{:?}", log[0]);
        assert!(insert.contains("INSERT INTO"));
        assert!(insert.contains("123456789015"));
        assert!(insert.contains("000000000000"));
        // one null credential_id per row
        assert_eq!(insert.matches("String(None)").count(), 2);
    }

    #[tokio::test]
    async fn test_empty_batch_is_not_sent() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let repo = SeaOrmTicketRepository::new(db);

        repo.create_tickets_batch(Vec::new()).await.unwrap();
        assert!(repo.pool.into_transaction_log().is_empty());
    }
}

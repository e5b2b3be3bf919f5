use crate::entities::{caisse_entity as caisses, store_entity as stores};
use crate::error::{AppError, AppResult};
use crate::models::{
    AuthUser, CaisseCreateRequest, CaisseResponse, CaisseUpdateRequest, StoreResponse,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

/// Stores every deployment carries, as `(label, is_online)`.
pub const DEFAULT_STORES: [(&str, bool); 2] = [("DigitalStore", true), ("PhysicalStore", false)];

/// Cash registers opened with each new store.
pub const CAISSES_PER_STORE: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSyncReport {
    pub added: usize,
    pub removed: usize,
}

/// Labels to create and store ids to drop so that `existing` matches
/// `DEFAULT_STORES`.
fn plan_store_sync(existing: &[stores::Model]) -> (Vec<(&'static str, bool)>, Vec<String>) {
    let to_add = DEFAULT_STORES
        .iter()
        .copied()
        .filter(|(label, _)| !existing.iter().any(|s| s.label == *label))
        .collect();
    let to_remove = existing
        .iter()
        .filter(|s| !DEFAULT_STORES.iter().any(|(label, _)| s.label == *label))
        .map(|s| s.id.clone())
        .collect();
    (to_add, to_remove)
}

/// Brings the store table in line with `DEFAULT_STORES`. Missing stores are
/// created with `CAISSES_PER_STORE` cash registers, unknown ones are removed
/// and their registers detached. Running it twice changes nothing.
pub async fn sync_stores(pool: &DatabaseConnection) -> AppResult<StoreSyncReport> {
    let existing = stores::Entity::find().all(pool).await?;
    let (to_add, to_remove) = plan_store_sync(&existing);
    let report = StoreSyncReport {
        added: to_add.len(),
        removed: to_remove.len(),
    };

    if to_add.is_empty() && to_remove.is_empty() {
        log::info!("{} stores are already in place", existing.len());
        return Ok(report);
    }

    let txn = pool.begin().await?;
    for (label, is_online) in to_add {
        let store = stores::ActiveModel {
            label: Set(label.to_string()),
            is_online: Set(is_online),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for _ in 0..CAISSES_PER_STORE {
            caisses::ActiveModel {
                store_id: Set(Some(store.id.clone())),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
        log::info!("Store {label} added with {CAISSES_PER_STORE} caisses");
    }

    if !to_remove.is_empty() {
        stores::Entity::delete_many()
            .filter(stores::Column::Id.is_in(to_remove))
            .exec(&txn)
            .await?;
    }
    txn.commit().await?;

    log::info!(
        "Store synchronization done: {} added, {} removed",
        report.added,
        report.removed
    );
    Ok(report)
}

fn require_employee(caller: &AuthUser) -> AppResult<()> {
    if caller.is_employee() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

#[derive(Clone)]
pub struct StoreService {
    pool: DatabaseConnection,
}

impl StoreService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// Every store with its cash registers.
    pub async fn list_stores(&self) -> AppResult<Vec<StoreResponse>> {
        let list = stores::Entity::find()
            .order_by_asc(stores::Column::Label)
            .all(&self.pool)
            .await?;
        let registers = caisses::Entity::find()
            .filter(caisses::Column::StoreId.is_not_null())
            .order_by_asc(caisses::Column::CreatedAt)
            .all(&self.pool)
            .await?;

        Ok(list
            .into_iter()
            .map(|store| {
                let own: Vec<caisses::Model> = registers
                    .iter()
                    .filter(|c| c.store_id.as_deref() == Some(store.id.as_str()))
                    .cloned()
                    .collect();
                StoreResponse::new(store, own)
            })
            .collect())
    }

    pub async fn get_caisse(&self, id: &str, caller: &AuthUser) -> AppResult<CaisseResponse> {
        require_employee(caller)?;
        Ok(self.find_caisse(id).await?.into())
    }

    pub async fn caisses_by_store(
        &self,
        store_id: &str,
        caller: &AuthUser,
    ) -> AppResult<Vec<CaisseResponse>> {
        require_employee(caller)?;
        self.find_store(store_id).await?;

        let list = caisses::Entity::find()
            .filter(caisses::Column::StoreId.eq(store_id))
            .order_by_asc(caisses::Column::CreatedAt)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    pub async fn create_caisse(
        &self,
        request: CaisseCreateRequest,
        caller: &AuthUser,
    ) -> AppResult<CaisseResponse> {
        require_employee(caller)?;
        let store = self.find_store(&request.store_id).await?;

        let caisse = caisses::ActiveModel {
            store_id: Set(Some(store.id)),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Caisse {} created by {}", caisse.id, caller.user_id);
        Ok(caisse.into())
    }

    pub async fn update_caisse(
        &self,
        id: &str,
        request: CaisseUpdateRequest,
        caller: &AuthUser,
    ) -> AppResult<CaisseResponse> {
        require_employee(caller)?;
        let caisse = self.find_caisse(id).await?;
        let store = self.find_store(&request.store_id).await?;

        let mut am = caisse.into_active_model();
        am.store_id = Set(Some(store.id));
        Ok(am.update(&self.pool).await?.into())
    }

    pub async fn delete_caisse(&self, id: &str, caller: &AuthUser) -> AppResult<()> {
        require_employee(caller)?;

        let result = caisses::Entity::delete_by_id(id.to_string())
            .exec(&self.pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("caisse.not_found".to_string()));
        }

        log::info!("Caisse deleted: {id}");
        Ok(())
    }

    async fn find_store(&self, id: &str) -> AppResult<stores::Model> {
        stores::Entity::find_by_id(id.to_string())
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("store.not_found".to_string()))
    }

    async fn find_caisse(&self, id: &str) -> AppResult<caisses::Model> {
        caisses::Entity::find_by_id(id.to_string())
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("caisse.not_found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn caller(role: Role) -> AuthUser {
        AuthUser {
            credential_id: "cred-1".to_string(),
            user_id: "user-1".to_string(),
            role,
        }
    }

    fn store(id: &str, label: &str, is_online: bool) -> stores::Model {
        stores::Model {
            id: id.to_string(),
            label: label.to_string(),
            is_online,
            created_at: None,
            updated_at: None,
        }
    }

    fn caisse(id: &str, store_id: Option<&str>) -> caisses::Model {
        caisses::Model {
            id: id.to_string(),
            store_id: store_id.map(str::to_string),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_plan_on_empty_table_adds_defaults() {
        let (to_add, to_remove) = plan_store_sync(&[]);
        assert_eq!(to_add, DEFAULT_STORES.to_vec());
        assert!(to_remove.is_empty());
    }

    #[test]
    fn test_plan_is_idempotent() {
        let existing = vec![
            store("s-1", "DigitalStore", true),
            store("s-2", "PhysicalStore", false),
        ];
        let (to_add, to_remove) = plan_store_sync(&existing);
        assert!(to_add.is_empty());
        assert!(to_remove.is_empty());
    }

    #[test]
    fn test_plan_drops_unknown_stores() {
        let existing = vec![
            store("s-1", "DigitalStore", true),
            store("s-9", "PopUpStore", false),
        ];
        let (to_add, to_remove) = plan_store_sync(&existing);
        assert_eq!(to_add, vec![("PhysicalStore", false)]);
        assert_eq!(to_remove, vec!["s-9".to_string()]);
    }

    #[tokio::test]
    async fn test_sync_with_stores_in_place_writes_nothing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                store("s-1", "DigitalStore", true),
                store("s-2", "PhysicalStore", false),
            ]])
            .into_connection();

        let report = sync_stores(&db).await.unwrap();
        assert_eq!(report, StoreSyncReport::default());
        assert_eq!(db.into_transaction_log().len(), 1);
    }

    #[tokio::test]
    async fn test_caisse_routes_are_employee_only() {
        // no queued results: any query would fail with a database error
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = StoreService::new(db);
        let client = caller(Role::Client);

        assert!(matches!(
            service.get_caisse("c-1", &client).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            service.caisses_by_store("s-1", &client).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            service
                .create_caisse(
                    CaisseCreateRequest {
                        store_id: "s-1".to_string()
                    },
                    &client
                )
                .await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            service
                .update_caisse(
                    "c-1",
                    CaisseUpdateRequest {
                        store_id: "s-1".to_string()
                    },
                    &client
                )
                .await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            service.delete_caisse("c-1", &client).await,
            Err(AppError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_create_caisse_in_known_store() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![store("s-1", "PhysicalStore", false)]])
            .append_query_results([vec![caisse("c-1", Some("s-1"))]])
            .into_connection();
        let service = StoreService::new(db);

        let created = service
            .create_caisse(
                CaisseCreateRequest {
                    store_id: "s-1".to_string(),
                },
                &caller(Role::Employee),
            )
            .await
            .unwrap();
        assert_eq!(created.id, "c-1");
        assert_eq!(created.store_id.as_deref(), Some("s-1"));
    }

    #[tokio::test]
    async fn test_create_caisse_in_unknown_store() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<stores::Model>::new()])
            .into_connection();
        let service = StoreService::new(db);

        let err = service
            .create_caisse(
                CaisseCreateRequest {
                    store_id: "missing".to_string(),
                },
                &caller(Role::Employee),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(code) if code == "store.not_found"));
    }

    #[tokio::test]
    async fn test_delete_unknown_caisse() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let service = StoreService::new(db);

        let err = service
            .delete_caisse("missing", &caller(Role::Employee))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(code) if code == "caisse.not_found"));
    }

    #[tokio::test]
    async fn test_list_stores_groups_caisses() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                store("s-1", "DigitalStore", true),
                store("s-2", "PhysicalStore", false),
            ]])
            .append_query_results([vec![
                caisse("c-1", Some("s-2")),
                caisse("c-2", Some("s-2")),
                caisse("c-3", Some("s-1")),
            ]])
            .into_connection();
        let service = StoreService::new(db);

        let list = service.list_stores().await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].label, "DigitalStore");
        assert!(list[0].is_online);
        assert_eq!(list[0].caisses.len(), 1);
        assert_eq!(list[1].caisses.len(), 2);
        assert!(list[1].caisses.iter().all(|c| c.store_id.as_deref() == Some("s-2")));
    }
}

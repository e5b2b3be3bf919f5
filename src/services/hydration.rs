//! Ticket hydration: tops the ticket store up to `require` tickets, split
//! across prizes by percentage.
//!
//! A pass is idempotent. Quotas already met are skipped and only the per
//! prize shortfall is generated, so calling it again with the same
//! arguments creates nothing.

use crate::error::{AppError, AppResult};
use crate::models::{HydrationReport, TicketDraft, TicketFilter};
use crate::repositories::TicketRepository;
use crate::utils::{LuhnToken, TICKET_TOKEN_LENGTH};
use std::collections::{BTreeMap, HashSet};

pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Upper bound on rows per insert. A ticket row binds 6 parameters and
/// Postgres accepts at most 65535 per statement.
pub const MAX_BATCH_SIZE: usize = 10_000;

/// Attempts per batch when the store rejects a token as duplicate.
const MAX_INSERT_ATTEMPTS: usize = 3;

/// Number of tickets a prize should hold: `round(require * pct / 100)`,
/// half away from zero.
pub fn expected_tickets(require: u64, percent: u32) -> i64 {
    (require as f64 * f64::from(percent) / 100.0).round() as i64
}

pub async fn hydrate_tickets<R>(
    repo: &R,
    require: u64,
    dispatch: &BTreeMap<String, u32>,
    batch_size: usize,
) -> AppResult<HydrationReport>
where
    R: TicketRepository + ?Sized,
{
    let batch_size = match batch_size {
        0 => DEFAULT_BATCH_SIZE,
        n if n > MAX_BATCH_SIZE => {
            log::warn!("Batch size {n} is above {MAX_BATCH_SIZE}, using {MAX_BATCH_SIZE}");
            MAX_BATCH_SIZE
        }
        n => n,
    };

    let mut tokens: HashSet<String> = repo.read_all_tokens().await?.into_iter().collect();

    let mut existing_counts = Vec::with_capacity(dispatch.len());
    for (prize, percent) in dispatch {
        let filter = TicketFilter {
            prize: Some(prize.clone()),
        };
        let count = repo.count_tickets(&filter).await?;
        existing_counts.push((prize, *percent, count));
    }

    let total_existing: u64 = existing_counts.iter().map(|(_, _, count)| count).sum();
    if total_existing >= require {
        log::info!("{total_existing} tickets are already ready");
        return Ok(HydrationReport {
            existing: total_existing,
            created: 0,
        });
    }

    log::info!(
        "Hydrating tickets: {} required, {} existing",
        require,
        total_existing
    );

    let mut created: u64 = 0;
    for (prize, percent, existing) in existing_counts {
        let to_create = expected_tickets(require, percent) - existing as i64;
        log::info!("{to_create} tickets for {prize}, {existing} already exist");
        if to_create <= 0 {
            continue;
        }

        let mut batch = Vec::with_capacity(batch_size.min(to_create as usize));
        for _ in 0..to_create {
            batch.push(TicketDraft {
                token: unique_token(&mut tokens),
                prize: prize.clone(),
            });

            if batch.len() >= batch_size {
                created += insert_batch(repo, std::mem::take(&mut batch), &mut tokens).await?;
                log::info!("Inserted {created} tickets");
            }
        }

        if !batch.is_empty() {
            created += insert_batch(repo, batch, &mut tokens).await?;
            log::info!("Inserted {created} tickets");
        }
    }

    log::info!(
        "{} tickets are ready ({} created)",
        total_existing + created,
        created
    );

    Ok(HydrationReport {
        existing: total_existing,
        created,
    })
}

/// Draws tokens until one is not in `tokens`, then records it there.
fn unique_token(tokens: &mut HashSet<String>) -> String {
    loop {
        let token = LuhnToken::generate(TICKET_TOKEN_LENGTH).into_string();
        if tokens.insert(token.clone()) {
            return token;
        }
    }
}

/// Inserts one batch. On a duplicate token rejection the known token set is
/// reloaded from storage and the batch tokens are drawn again.
async fn insert_batch<R>(
    repo: &R,
    mut batch: Vec<TicketDraft>,
    tokens: &mut HashSet<String>,
) -> AppResult<u64>
where
    R: TicketRepository + ?Sized,
{
    let mut attempt = 1;
    loop {
        match repo.create_tickets_batch(batch.clone()).await {
            Ok(()) => return Ok(batch.len() as u64),
            Err(AppError::DuplicateToken(detail)) if attempt < MAX_INSERT_ATTEMPTS => {
                log::warn!(
                    "Ticket batch rejected on attempt {attempt}/{MAX_INSERT_ATTEMPTS}: {detail}"
                );
                *tokens = repo.read_all_tokens().await?.into_iter().collect();
                for draft in batch.iter_mut() {
                    draft.token = unique_token(tokens);
                }
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sea_orm::DbErr;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryTicketRepository {
        tickets: Mutex<Vec<TicketDraft>>,
        batch_sizes: Mutex<Vec<usize>>,
        /// Next N inserts fail as if another process had stored the token first
        collisions: Mutex<usize>,
        fail_inserts: bool,
    }

    impl InMemoryTicketRepository {
        fn with_tickets(prize: &str, count: usize) -> Self {
            let repo = Self::default();
            {
                let mut tickets = repo.tickets.lock().unwrap();
                for i in 0..count {
                    tickets.push(TicketDraft {
                        token: format!("seed-{i}"),
                        prize: prize.to_string(),
                    });
                }
            }
            repo
        }

        fn count(&self, prize: &str) -> usize {
            self.tickets
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.prize == prize)
                .count()
        }

        fn len(&self) -> usize {
            self.tickets.lock().unwrap().len()
        }

        fn all_unique(&self) -> bool {
            let tickets = self.tickets.lock().unwrap();
            let set: HashSet<&str> = tickets.iter().map(|t| t.token.as_str()).collect();
            set.len() == tickets.len()
        }
    }

    #[async_trait]
    impl TicketRepository for InMemoryTicketRepository {
        async fn count_tickets(&self, filter: &TicketFilter) -> AppResult<u64> {
            let tickets = self.tickets.lock().unwrap();
            let count = tickets
                .iter()
                .filter(|t| filter.prize.as_deref().is_none_or(|p| p == t.prize))
                .count();
            Ok(count as u64)
        }

        async fn read_all_tokens(&self) -> AppResult<Vec<String>> {
            Ok(self
                .tickets
                .lock()
                .unwrap()
                .iter()
                .map(|t| t.token.clone())
                .collect())
        }

        async fn create_tickets_batch(&self, drafts: Vec<TicketDraft>) -> AppResult<()> {
            if self.fail_inserts {
                return Err(DbErr::Custom("connection reset".into()).into());
            }

            let mut tickets = self.tickets.lock().unwrap();
            let mut collisions = self.collisions.lock().unwrap();
            if *collisions > 0 {
                *collisions -= 1;
                // a concurrent writer grabbed the first token of the batch
                tickets.push(TicketDraft {
                    token: drafts[0].token.clone(),
                    prize: "concurrent".to_string(),
                });
                return Err(AppError::DuplicateToken(format!(
                    "idx_tickets_token_unique: {}",
                    drafts[0].token
                )));
            }

            let known: HashSet<&str> = tickets.iter().map(|t| t.token.as_str()).collect();
            if let Some(dup) = drafts.iter().find(|d| known.contains(d.token.as_str())) {
                return Err(AppError::DuplicateToken(dup.token.clone()));
            }

            self.batch_sizes.lock().unwrap().push(drafts.len());
            tickets.extend(drafts);
            Ok(())
        }
    }

    fn dispatch(entries: &[(&str, u32)]) -> BTreeMap<String, u32> {
        entries
            .iter()
            .map(|(label, pct)| (label.to_string(), *pct))
            .collect()
    }

    #[test]
    fn test_expected_tickets_rounding() {
        assert_eq!(expected_tickets(1000, 50), 500);
        assert_eq!(expected_tickets(1_500_000, 6), 90_000);
        assert_eq!(expected_tickets(10, 5), 1); // 0.5 rounds away from zero
        assert_eq!(expected_tickets(10, 4), 0);
    }

    #[tokio::test]
    async fn test_quota_split_by_percentage() {
        let repo = InMemoryTicketRepository::default();
        let report = hydrate_tickets(&repo, 1000, &dispatch(&[("A", 50), ("B", 50)]), 100)
            .await
            .unwrap();

        assert_eq!(report.existing, 0);
        assert_eq!(report.created, 1000);
        assert_eq!(repo.count("A"), 500);
        assert_eq!(repo.count("B"), 500);
        assert!(repo.all_unique());
    }

    #[tokio::test]
    async fn test_tokens_are_valid_luhn() {
        let repo = InMemoryTicketRepository::default();
        hydrate_tickets(&repo, 50, &dispatch(&[("A", 100)]), 10)
            .await
            .unwrap();

        for ticket in repo.tickets.lock().unwrap().iter() {
            assert_eq!(ticket.token.len(), TICKET_TOKEN_LENGTH);
            assert!(LuhnToken::new(ticket.token.clone()).is_valid());
        }
    }

    #[tokio::test]
    async fn test_second_pass_creates_nothing() {
        let repo = InMemoryTicketRepository::default();
        let table = dispatch(&[("A", 60), ("B", 40)]);

        hydrate_tickets(&repo, 200, &table, 1000).await.unwrap();
        let report = hydrate_tickets(&repo, 200, &table, 1000).await.unwrap();

        assert_eq!(report.created, 0);
        assert_eq!(report.existing, 200);
        assert_eq!(repo.len(), 200);
    }

    #[tokio::test]
    async fn test_incremental_top_up() {
        let repo = InMemoryTicketRepository::with_tickets("A", 100);
        let before: HashSet<String> = repo.read_all_tokens().await.unwrap().into_iter().collect();

        let report = hydrate_tickets(&repo, 200, &dispatch(&[("A", 100)]), 1000)
            .await
            .unwrap();

        assert_eq!(report.existing, 100);
        assert_eq!(report.created, 100);
        assert_eq!(repo.count("A"), 200);
        assert!(repo.all_unique());

        let added = repo.tickets.lock().unwrap()[100..]
            .iter()
            .filter(|t| before.contains(&t.token))
            .count();
        assert_eq!(added, 0);
    }

    #[tokio::test]
    async fn test_larger_require_creates_only_shortfall() {
        let repo = InMemoryTicketRepository::default();
        let table = dispatch(&[("A", 50), ("B", 50)]);

        hydrate_tickets(&repo, 100, &table, 1000).await.unwrap();
        let report = hydrate_tickets(&repo, 300, &table, 1000).await.unwrap();

        assert_eq!(report.created, 200);
        assert_eq!(repo.count("A"), 150);
        assert_eq!(repo.count("B"), 150);
        assert!(repo.all_unique());
    }

    #[tokio::test]
    async fn test_zero_rounding_label_creates_nothing() {
        let repo = InMemoryTicketRepository::default();
        let report = hydrate_tickets(&repo, 10, &dispatch(&[("A", 100), ("B", 4)]), 1000)
            .await
            .unwrap();

        assert_eq!(report.created, 10);
        assert_eq!(repo.count("A"), 10);
        assert_eq!(repo.count("B"), 0);
    }

    #[tokio::test]
    async fn test_batches_flush_per_label() {
        let repo = InMemoryTicketRepository::default();
        hydrate_tickets(&repo, 25, &dispatch(&[("A", 100)]), 10)
            .await
            .unwrap();

        assert_eq!(*repo.batch_sizes.lock().unwrap(), vec![10, 10, 5]);
    }

    #[tokio::test]
    async fn test_oversized_batch_is_capped() {
        let repo = InMemoryTicketRepository::default();
        hydrate_tickets(&repo, 12_000, &dispatch(&[("A", 100)]), 50_000)
            .await
            .unwrap();

        assert_eq!(*repo.batch_sizes.lock().unwrap(), vec![MAX_BATCH_SIZE, 2_000]);
        assert_eq!(repo.count("A"), 12_000);
    }

    #[tokio::test]
    async fn test_zero_batch_size_uses_default() {
        let repo = InMemoryTicketRepository::default();
        hydrate_tickets(&repo, 1_500, &dispatch(&[("A", 100)]), 0)
            .await
            .unwrap();

        assert_eq!(*repo.batch_sizes.lock().unwrap(), vec![DEFAULT_BATCH_SIZE, 500]);
    }

    #[tokio::test]
    async fn test_duplicate_token_is_retried() {
        let repo = InMemoryTicketRepository::default();
        *repo.collisions.lock().unwrap() = 2;

        let report = hydrate_tickets(&repo, 30, &dispatch(&[("A", 100)]), 10)
            .await
            .unwrap();

        assert_eq!(report.created, 30);
        assert_eq!(repo.count("A"), 30);
        assert_eq!(repo.count("concurrent"), 2);
        assert!(repo.all_unique());
    }

    #[tokio::test]
    async fn test_duplicate_token_gives_up_after_max_attempts() {
        let repo = InMemoryTicketRepository::default();
        *repo.collisions.lock().unwrap() = MAX_INSERT_ATTEMPTS;

        let err = hydrate_tickets(&repo, 30, &dispatch(&[("A", 100)]), 10)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::DuplicateToken(_)));
        assert_eq!(repo.count("A"), 0);
    }

    #[tokio::test]
    async fn test_persistence_error_aborts() {
        let repo = InMemoryTicketRepository {
            fail_inserts: true,
            ..Default::default()
        };

        let err = hydrate_tickets(&repo, 30, &dispatch(&[("A", 50), ("B", 50)]), 10)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::DatabaseError(_)));
        assert_eq!(repo.len(), 0);
    }

    #[tokio::test]
    async fn test_uniqueness_across_passes() {
        let repo = InMemoryTicketRepository::default();
        let table = dispatch(&[("A", 70), ("B", 30)]);
        for require in [100, 250, 400] {
            hydrate_tickets(&repo, require, &table, 64).await.unwrap();
        }

        assert_eq!(repo.len(), 400);
        assert!(repo.all_unique());
    }
}

use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Tickets {
    Table,
    Id,
    Token,
    Prize,
    CredentialId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Game tickets.
///
/// - token: 12 digit Luhn number, unique for the lifetime of the game
/// - prize: prize label assigned at hydration time
/// - credential_id: owner, NULL until the ticket is claimed
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tickets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tickets::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tickets::Token).string_len(16).not_null())
                    .col(ColumnDef::new(Tickets::Prize).string_len(255).null())
                    .col(ColumnDef::new(Tickets::CredentialId).string_len(36).null())
                    .col(
                        ColumnDef::new(Tickets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Tickets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // Storage-level guard: concurrent hydrations cannot insert the same token twice
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tickets_token_unique")
                    .table(Tickets::Table)
                    .col(Tickets::Token)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tickets_prize")
                    .table(Tickets::Table)
                    .col(Tickets::Prize)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tickets_credential")
                    .table(Tickets::Table)
                    .col(Tickets::CredentialId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(Tickets::Table).to_owned())
            .await?;
        Ok(())
    }
}

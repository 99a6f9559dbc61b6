use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AccountDeleteArchives::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccountDeleteArchives::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AccountDeleteArchives::AccountId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccountDeleteArchives::Snapshot)
                            .json_binary()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AccountDeleteArchives::Reason).text())
                    .col(
                        ColumnDef::new(AccountDeleteArchives::RequestedAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(AccountDeleteArchives::ConfirmedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccountDeleteArchives::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                AccountDeleteArchives::Table,
                                AccountDeleteArchives::AccountId,
                            )
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(AccountDeleteArchives::Table)
                    .col(AccountDeleteArchives::AccountId)
                    .name("idx_account_delete_archives_account_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AccountDeleteArchives::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AccountDeleteArchives {
    Table,
    Id,
    AccountId,
    Snapshot,
    Reason,
    RequestedAt,
    ConfirmedAt,
    CreatedAt,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
}

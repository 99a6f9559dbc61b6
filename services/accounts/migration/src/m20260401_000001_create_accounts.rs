use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Accounts::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Accounts::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Accounts::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::Role)
                            .small_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Accounts::AccountStatus)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Accounts::LoginDisabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Accounts::SessionEpoch)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Accounts::FullName).string())
                    .col(ColumnDef::new(Accounts::Bio).text())
                    .col(ColumnDef::new(Accounts::Gender).string())
                    .col(ColumnDef::new(Accounts::StudentNo).string().unique_key())
                    .col(ColumnDef::new(Accounts::EmployeeNo).string().unique_key())
                    .col(ColumnDef::new(Accounts::AvatarUrl).string())
                    .col(ColumnDef::new(Accounts::DeleteRequestedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Accounts::DeleteReason).text())
                    .col(
                        ColumnDef::new(Accounts::DeleteRequestId)
                            .string()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Accounts::DeleteRequestIp).string())
                    .col(ColumnDef::new(Accounts::DeleteRequestUa).string())
                    .col(ColumnDef::new(Accounts::DeleteOtpDigest).string())
                    .col(ColumnDef::new(Accounts::DeleteOtpExpiresAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Accounts::AnonymizedSlug)
                            .string()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Accounts::SanitizedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Accounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Accounts::Table)
                    .col(Accounts::AccountStatus)
                    .name("idx_accounts_account_status")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    Email,
    Username,
    PasswordHash,
    Role,
    AccountStatus,
    LoginDisabled,
    SessionEpoch,
    FullName,
    Bio,
    Gender,
    StudentNo,
    EmployeeNo,
    AvatarUrl,
    DeleteRequestedAt,
    DeleteReason,
    DeleteRequestId,
    DeleteRequestIp,
    DeleteRequestUa,
    DeleteOtpDigest,
    DeleteOtpExpiresAt,
    AnonymizedSlug,
    SanitizedAt,
    CreatedAt,
    UpdatedAt,
}

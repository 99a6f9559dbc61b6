use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VerificationCodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VerificationCodes::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VerificationCodes::Email).string().not_null())
                    .col(
                        ColumnDef::new(VerificationCodes::Purpose)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(VerificationCodes::Code).string().not_null())
                    .col(
                        ColumnDef::new(VerificationCodes::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VerificationCodes::Consumed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(VerificationCodes::VerifiedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(VerificationCodes::Attempts)
                            .small_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(VerificationCodes::CreatedIp).string())
                    .col(ColumnDef::new(VerificationCodes::CreatedUa).string())
                    .col(
                        ColumnDef::new(VerificationCodes::TicketDigest)
                            .string()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(VerificationCodes::TicketExpiresAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(VerificationCodes::TicketConsumedAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(VerificationCodes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Serves the per-email hourly cap, cooldown, and latest-active lookups.
        manager
            .create_index(
                Index::create()
                    .table(VerificationCodes::Table)
                    .col(VerificationCodes::Email)
                    .col(VerificationCodes::Purpose)
                    .col(VerificationCodes::CreatedAt)
                    .name("idx_verification_codes_email_purpose_created_at")
                    .to_owned(),
            )
            .await?;

        // Serves the per-IP hourly cap.
        manager
            .create_index(
                Index::create()
                    .table(VerificationCodes::Table)
                    .col(VerificationCodes::CreatedIp)
                    .col(VerificationCodes::Purpose)
                    .col(VerificationCodes::CreatedAt)
                    .name("idx_verification_codes_created_ip_purpose_created_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VerificationCodes::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum VerificationCodes {
    Table,
    Id,
    Email,
    Purpose,
    Code,
    ExpiresAt,
    Consumed,
    VerifiedAt,
    Attempts,
    CreatedIp,
    CreatedUa,
    TicketDigest,
    TicketExpiresAt,
    TicketConsumedAt,
    CreatedAt,
}

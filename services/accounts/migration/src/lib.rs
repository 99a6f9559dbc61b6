use sea_orm_migration::prelude::*;

mod m20260401_000001_create_accounts;
mod m20260401_000002_create_verification_codes;
mod m20260401_000003_create_account_delete_archives;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260401_000001_create_accounts::Migration),
            Box::new(m20260401_000002_create_verification_codes::Migration),
            Box::new(m20260401_000003_create_account_delete_archives::Migration),
        ]
    }
}

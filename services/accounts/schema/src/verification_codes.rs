use sea_orm::entity::prelude::*;

/// One row per OTP issuance, keyed by (email, purpose). Rows are never
/// deleted — expiry is enforced by timestamp comparison and the `consumed`
/// flag, so the table doubles as the rate-limit ledger and audit trail.
///
/// The ticket columns are written once, at OTP verification; after that the
/// only permitted mutation is setting `ticket_consumed_at`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "verification_codes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub email: String,
    pub purpose: String,
    /// 4-digit numeric code.
    pub code: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub consumed: bool,
    pub verified_at: Option<chrono::DateTime<chrono::Utc>>,
    pub attempts: i16,
    pub created_ip: Option<String>,
    pub created_ua: Option<String>,
    /// Hex SHA-256 of the raw 10-digit ticket; the ticket itself is never stored.
    #[sea_orm(unique)]
    pub ticket_digest: Option<String>,
    pub ticket_expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub ticket_consumed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

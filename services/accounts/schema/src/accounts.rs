use sea_orm::entity::prelude::*;

/// Account record. Identity, credential, lifecycle status, and — only while a
/// deletion is pending — the deletion-request block (`delete_*` columns).
///
/// Invariant: the `delete_*` columns are populated together when status enters
/// `delete_requested` and cleared together when it leaves. After anonymization
/// the row keeps only placeholder identity plus `anonymized_slug`/`sanitized_at`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(unique)]
    pub username: String,
    pub password_hash: String,
    pub role: i16,
    pub account_status: String,
    pub login_disabled: bool,
    /// Bumping this invalidates every outstanding session token.
    pub session_epoch: i32,

    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub gender: Option<String>,
    #[sea_orm(unique)]
    pub student_no: Option<String>,
    #[sea_orm(unique)]
    pub employee_no: Option<String>,
    pub avatar_url: Option<String>,

    pub delete_requested_at: Option<chrono::DateTime<chrono::Utc>>,
    pub delete_reason: Option<String>,
    #[sea_orm(unique)]
    pub delete_request_id: Option<String>,
    pub delete_request_ip: Option<String>,
    pub delete_request_ua: Option<String>,
    pub delete_otp_digest: Option<String>,
    pub delete_otp_expires_at: Option<chrono::DateTime<chrono::Utc>>,

    #[sea_orm(unique)]
    pub anonymized_slug: Option<String>,
    pub sanitized_at: Option<chrono::DateTime<chrono::Utc>>,

    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::account_delete_archives::Entity")]
    DeleteArchives,
}

impl Related<super::account_delete_archives::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeleteArchives.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

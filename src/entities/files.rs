use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "files")]
pub struct Model {
    /// UUID v4, assigned at upload
    #[sea_orm(primary_key, auto_increment = false)]
    pub file_id: String,

    pub original_file_name: String,

    pub content: Vec<u8>,

    #[sea_orm(indexed)]
    pub owner_user_id: String,

    /// Argon2id hash; `None` means the file is not password protected
    pub password_hash: Option<String>,

    /// `None` means unlimited downloads
    pub download_limit: Option<i32>,

    pub download_count: i32,

    /// `None` means the file never expires
    pub expiry_date: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerUserId",
        to = "super::users::Column::UserId",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: Option<String>,

    /// Unique login identity, stored trimmed and lowercased.
    #[sea_orm(unique)]
    pub email: String,

    /// 10-digit mobile number.
    pub phone_number: Option<String>,

    pub city_id: Option<i32>,

    /// Argon2id password hash
    pub password_hash: String,

    /// Random API key (64-char hex string)
    pub api_key: String,

    /// Grants access to catalog and slot write endpoints.
    pub is_staff: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cities::Entity",
        from = "Column::CityId",
        to = "super::cities::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Cities,
    #[sea_orm(has_many = "super::bookings::Entity")]
    Bookings,
}

impl Related<super::cities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cities.def()
    }
}

impl Related<super::bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

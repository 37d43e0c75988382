use sea_orm::entity::prelude::*;

/// Passenger holding one or more transit cards.
/// `session_active` flips to true after a successful 2FA verification.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "passengers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub surname_1: String,
    pub surname_2: Option<String>,
    #[sea_orm(unique)]
    pub document: String,
    #[sea_orm(unique)]
    pub email: String,
    pub session_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cards::Entity")]
    Cards,
}

impl Related<super::cards::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cards.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

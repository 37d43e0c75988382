use sea_orm::entity::prelude::*;

/// Physical transit card. `profile` and `status` hold the Catalan wire labels.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "cards")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub passenger_id: i64,
    #[sea_orm(unique)]
    pub code: String,
    pub profile: String,
    pub balance_cents: i64,
    pub status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::passengers::Entity",
        from = "Column::PassengerId",
        to = "super::passengers::Column::Id",
        on_delete = "Restrict"
    )]
    Passenger,
}

impl Related<super::passengers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Passenger.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

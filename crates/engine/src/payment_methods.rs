//! Payment methods (cash, transfer, card, ...).

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;
use uuid::Uuid;

pub(crate) const DEFAULT_ICON: &str = "💰";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaymentMethod {
    pub id: Uuid,
    pub name: String,
    pub icon: String,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payment_methods")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub icon: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for PaymentMethod {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            icon: model.icon,
        }
    }
}

impl ActiveModel {
    pub(crate) fn named(name: &str) -> Self {
        Self {
            id: ActiveValue::Set(Uuid::new_v4()),
            name: ActiveValue::Set(name.to_string()),
            icon: ActiveValue::Set(DEFAULT_ICON.to_string()),
        }
    }
}

//! Expense categories.
//!
//! Names are unique; free-text names typed on an expense form become new rows
//! with the default icon and colour.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;
use uuid::Uuid;

pub(crate) const DEFAULT_ICON: &str = "📦";
pub(crate) const DEFAULT_COLOR: &str = "gray";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub icon: String,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub icon: String,
    pub color: String,
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

impl From<Model> for Category {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            icon: model.icon,
            color: model.color,
        }
    }
}

impl ActiveModel {
    pub(crate) fn named(name: &str) -> Self {
        Self {
            id: ActiveValue::Set(Uuid::new_v4()),
            name: ActiveValue::Set(name.to_string()),
            icon: ActiveValue::Set(DEFAULT_ICON.to_string()),
            color: ActiveValue::Set(DEFAULT_COLOR.to_string()),
        }
    }
}

//! Expense requests.
//!
//! An `Expense` is a single spend request moving through the
//! [`ExpenseStatus`] lifecycle. Amounts are positive satang.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, ExpenseStatus, Money};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Expense {
    pub id: Uuid,
    pub date: NaiveDate,
    pub amount: Money,
    pub category_id: Uuid,
    pub department_id: Uuid,
    pub payment_method_id: Uuid,
    pub vendor: Option<String>,
    pub description: String,
    pub note_internal: Option<String>,
    pub status: ExpenseStatus,
    pub created_by_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub date: Date,
    pub amount_minor: i64,
    pub category_id: Uuid,
    pub department_id: Uuid,
    pub payment_method_id: Uuid,
    pub vendor: Option<String>,
    pub description: String,
    pub note_internal: Option<String>,
    pub status: String,
    pub created_by_name: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::departments::Entity",
        from = "Column::DepartmentId",
        to = "super::departments::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Department,
    #[sea_orm(
        belongs_to = "super::payment_methods::Entity",
        from = "Column::PaymentMethodId",
        to = "super::payment_methods::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    PaymentMethod,
    #[sea_orm(has_many = "super::attachments::Entity")]
    Attachments,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::departments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl Related<super::payment_methods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentMethod.def()
    }
}

impl Related<super::attachments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            date: model.date,
            amount: Money::new(model.amount_minor),
            category_id: model.category_id,
            department_id: model.department_id,
            payment_method_id: model.payment_method_id,
            vendor: model.vendor,
            description: model.description,
            note_internal: model.note_internal,
            status: ExpenseStatus::try_from(model.status.as_str())?,
            created_by_name: model.created_by_name,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

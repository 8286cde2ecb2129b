//! Monthly spending caps per category or department.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, Money};

pub(crate) const DEFAULT_ALERT_THRESHOLD: i32 = 80;

/// What a budget (or a budget check) applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "budget_type", content = "scope_id", rename_all = "snake_case")]
pub enum BudgetScope {
    Category(Uuid),
    Department(Uuid),
}

impl BudgetScope {
    pub fn type_str(self) -> &'static str {
        match self {
            Self::Category(_) => "category",
            Self::Department(_) => "department",
        }
    }

    pub fn id(self) -> Uuid {
        match self {
            Self::Category(id) | Self::Department(id) => id,
        }
    }
}

/// Spending level of a budget relative to its threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetHealth {
    Safe,
    Warning,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Budget {
    pub id: Uuid,
    #[serde(flatten)]
    pub scope: BudgetScope,
    /// `YYYY-MM`.
    pub month: String,
    pub amount: Money,
    /// Percentage (1..=100) at which the budget starts warning.
    pub alert_threshold: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub budget_type: String,
    pub category_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub month: String,
    pub amount_minor: i64,
    pub alert_threshold: i32,
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
        on_delete = "Cascade"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::departments::Entity",
        from = "Column::DepartmentId",
        to = "super::departments::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Department,
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

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub(crate) fn scope(&self) -> Result<BudgetScope, EngineError> {
        match (self.budget_type.as_str(), self.category_id, self.department_id) {
            ("category", Some(id), _) => Ok(BudgetScope::Category(id)),
            ("department", _, Some(id)) => Ok(BudgetScope::Department(id)),
            (other, _, _) => Err(EngineError::InvalidInput(format!(
                "budget {} has no valid {other} scope",
                self.id
            ))),
        }
    }
}

impl TryFrom<Model> for Budget {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            scope: model.scope()?,
            month: model.month,
            amount: Money::new(model.amount_minor),
            alert_threshold: model.alert_threshold,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

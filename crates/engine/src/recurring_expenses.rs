//! Recurring expense templates (rent, subscriptions, ...).
//!
//! The scheduler only ever moves `next_due_date` forward; `start_date` is
//! kept as entered.

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// The occurrence one period after `date`.
    ///
    /// Months and years are calendar steps clamped to the last day of the
    /// target month (Jan 31 → Feb 28/29, Feb 29 → Feb 28).
    pub fn next_occurrence(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Weekly => date.checked_add_days(Days::new(7)),
            Self::Monthly => date.checked_add_months(Months::new(1)),
            Self::Yearly => date.checked_add_months(Months::new(12)),
        }
    }
}

impl TryFrom<&str> for Frequency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(EngineError::InvalidInput(format!(
                "invalid frequency: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecurringExpense {
    pub id: Uuid,
    pub description: String,
    pub amount: Money,
    pub category_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub payment_method_id: Option<Uuid>,
    pub vendor: Option<String>,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub next_due_date: NaiveDate,
    pub active: bool,
    pub created_by_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recurring_expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub description: String,
    pub amount_minor: i64,
    pub category_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub payment_method_id: Option<Uuid>,
    pub vendor: Option<String>,
    pub frequency: String,
    pub start_date: Date,
    pub next_due_date: Date,
    pub active: bool,
    pub created_by_name: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for RecurringExpense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            description: model.description,
            amount: Money::new(model.amount_minor),
            category_id: model.category_id,
            department_id: model.department_id,
            payment_method_id: model.payment_method_id,
            vendor: model.vendor,
            frequency: Frequency::try_from(model.frequency.as_str())?,
            start_date: model.start_date,
            next_due_date: model.next_due_date,
            active: model.active,
            created_by_name: model.created_by_name,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

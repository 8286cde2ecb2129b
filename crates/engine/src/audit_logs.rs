//! Append-only history of expense changes.
//!
//! `expense_id` is not a foreign key: the entry written by a delete outlives
//! its expense.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ExpenseStatus};

pub(crate) const DEFAULT_ACTOR_ROLE: &str = "User";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Approve,
    Reject,
    Pay,
    Comment,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Pay => "pay",
            Self::Comment => "comment",
        }
    }
}

impl TryFrom<&str> for AuditAction {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "pay" => Ok(Self::Pay),
            "comment" => Ok(Self::Comment),
            other => Err(EngineError::InvalidInput(format!(
                "invalid audit action: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub expense_id: Uuid,
    pub action: AuditAction,
    pub old_status: Option<ExpenseStatus>,
    pub new_status: Option<ExpenseStatus>,
    pub comment: Option<String>,
    pub actor_name: String,
    pub actor_role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expense_audit_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub expense_id: Uuid,
    pub action: String,
    pub old_status: Option<String>,
    pub new_status: Option<String>,
    pub comment: Option<String>,
    pub actor_name: String,
    pub actor_role: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn optional_status(value: Option<String>) -> Result<Option<ExpenseStatus>, EngineError> {
    value
        .as_deref()
        .map(ExpenseStatus::try_from)
        .transpose()
}

impl TryFrom<Model> for AuditLogEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            expense_id: model.expense_id,
            action: AuditAction::try_from(model.action.as_str())?,
            old_status: optional_status(model.old_status)?,
            new_status: optional_status(model.new_status)?,
            comment: model.comment,
            actor_name: model.actor_name,
            actor_role: model.actor_role,
            created_at: model.created_at,
        })
    }
}

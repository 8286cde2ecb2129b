use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{Actor, AuditAction, AuditLogEntry, ExpenseStatus, ResultEngine, audit_logs};

use super::Engine;

/// One audit line about to be written.
pub(super) struct AuditRecord<'a> {
    pub expense_id: Uuid,
    pub action: AuditAction,
    pub old_status: Option<ExpenseStatus>,
    pub new_status: Option<ExpenseStatus>,
    pub comment: Option<&'a str>,
    pub actor_name: &'a str,
    pub actor_role: &'a str,
}

impl<'a> AuditRecord<'a> {
    pub(super) fn new(expense_id: Uuid, action: AuditAction, actor: &'a Actor) -> Self {
        Self {
            expense_id,
            action,
            old_status: None,
            new_status: None,
            comment: None,
            actor_name: &actor.name,
            actor_role: &actor.role,
        }
    }

    pub(super) fn statuses(
        mut self,
        old_status: Option<ExpenseStatus>,
        new_status: Option<ExpenseStatus>,
    ) -> Self {
        self.old_status = old_status;
        self.new_status = new_status;
        self
    }

    pub(super) fn comment(mut self, comment: &'a str) -> Self {
        self.comment = Some(comment);
        self
    }
}

impl Engine {
    /// Appends an audit entry. Callers treat this as best effort.
    pub(super) async fn record_audit(&self, record: AuditRecord<'_>) -> ResultEngine<()> {
        audit_logs::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            expense_id: ActiveValue::Set(record.expense_id),
            action: ActiveValue::Set(record.action.as_str().to_string()),
            old_status: ActiveValue::Set(record.old_status.map(|s| s.as_str().to_string())),
            new_status: ActiveValue::Set(record.new_status.map(|s| s.as_str().to_string())),
            comment: ActiveValue::Set(record.comment.map(ToString::to_string)),
            actor_name: ActiveValue::Set(record.actor_name.to_string()),
            actor_role: ActiveValue::Set(record.actor_role.to_string()),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(&self.database)
        .await?;
        Ok(())
    }

    /// Audit trail of an expense, oldest first. Entries outlive the expense.
    pub async fn audit_history(&self, expense_id: Uuid) -> ResultEngine<Vec<AuditLogEntry>> {
        audit_logs::Entity::find()
            .filter(audit_logs::Column::ExpenseId.eq(expense_id))
            .order_by_asc(audit_logs::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(AuditLogEntry::try_from)
            .collect()
    }
}

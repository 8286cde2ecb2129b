use chrono::Utc;
use sea_orm::{
    ActiveValue, Condition, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{Notification, NotificationKind, ResultEngine, notifications};

use super::Engine;

/// Role that reviews and pays expenses.
pub const ADMIN_ROLE: &str = "admin";
/// Role of people who submit expenses.
pub const USER_ROLE: &str = "user";

/// A notification about to be emitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    /// `None` reaches every role.
    pub target_role: Option<String>,
}

impl NewNotification {
    #[must_use]
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            link: None,
            target_role: None,
        }
    }

    #[must_use]
    pub fn link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    #[must_use]
    pub fn target_role(mut self, role: impl Into<String>) -> Self {
        self.target_role = Some(role.into());
        self
    }
}

/// Notifications visible to `role`: the ones targeted at it plus untargeted
/// ones. No role means every notification.
fn visible_to(role: Option<&str>) -> Condition {
    match role {
        Some(role) => Condition::any()
            .add(notifications::Column::TargetRole.eq(role))
            .add(notifications::Column::TargetRole.is_null()),
        None => Condition::all(),
    }
}

impl Engine {
    /// Stores an unread notification.
    pub async fn notify(&self, notification: NewNotification) -> ResultEngine<()> {
        notifications::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            kind: ActiveValue::Set(notification.kind.as_str().to_string()),
            title: ActiveValue::Set(notification.title),
            message: ActiveValue::Set(notification.message),
            link: ActiveValue::Set(notification.link),
            target_role: ActiveValue::Set(notification.target_role),
            is_read: ActiveValue::Set(false),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(&self.database)
        .await?;
        Ok(())
    }

    /// Newest first.
    pub async fn list_notifications(
        &self,
        role: Option<&str>,
        limit: u64,
    ) -> ResultEngine<Vec<Notification>> {
        notifications::Entity::find()
            .filter(visible_to(role))
            .order_by_desc(notifications::Column::CreatedAt)
            .limit(limit)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Notification::try_from)
            .collect()
    }

    pub async fn unread_notifications(&self, role: Option<&str>) -> ResultEngine<u64> {
        let count = notifications::Entity::find()
            .filter(visible_to(role))
            .filter(notifications::Column::IsRead.eq(false))
            .count(&self.database)
            .await?;
        Ok(count)
    }

    /// Marks the given notifications read and returns how many rows changed.
    pub async fn mark_notifications_read(&self, ids: &[Uuid]) -> ResultEngine<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .filter(notifications::Column::Id.is_in(ids.to_vec()))
            .exec(&self.database)
            .await?;
        Ok(result.rows_affected)
    }
}

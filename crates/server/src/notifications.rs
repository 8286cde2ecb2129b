//! Notification API endpoints

use api_types::notification::{MarkRead, MarkedRead, NotificationQuery};
use axum::{
    Json,
    extract::{Query, State},
};
use engine::Notification;
use serde::Serialize;

use crate::{ServerError, server::ServerState};

const DEFAULT_LIMIT: u64 = 50;

#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
    pub unread: u64,
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<NotificationsResponse>, ServerError> {
    let role = query.role.as_deref();
    let notifications = state
        .engine
        .list_notifications(role, query.limit.unwrap_or(DEFAULT_LIMIT))
        .await?;
    let unread = state.engine.unread_notifications(role).await?;
    Ok(Json(NotificationsResponse {
        notifications,
        unread,
    }))
}

pub async fn mark_read(
    State(state): State<ServerState>,
    Json(payload): Json<MarkRead>,
) -> Result<Json<MarkedRead>, ServerError> {
    let updated = state.engine.mark_notifications_read(&payload.ids).await?;
    Ok(Json(MarkedRead { updated }))
}

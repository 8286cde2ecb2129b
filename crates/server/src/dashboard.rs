use api_types::dashboard::DashboardQuery;
use axum::{
    Json,
    extract::{Query, State},
};
use engine::Dashboard;

use crate::{ServerError, server::ServerState};

pub async fn get(
    State(state): State<ServerState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Dashboard>, ServerError> {
    let today = query.date.unwrap_or_else(|| state.today());
    Ok(Json(state.engine.dashboard(today).await?))
}

//! Lookup API endpoints

use api_types::lookup::DepartmentNew;
use axum::{Json, extract::State, http::StatusCode};
use engine::{Department, Lookups};

use crate::{ServerError, server::ServerState};

pub async fn list(State(state): State<ServerState>) -> Result<Json<Lookups>, ServerError> {
    Ok(Json(state.engine.lookups().await?))
}

pub async fn department_new(
    State(state): State<ServerState>,
    Json(payload): Json<DepartmentNew>,
) -> Result<(StatusCode, Json<Department>), ServerError> {
    let department = state.engine.create_department(&payload.name).await?;
    Ok((StatusCode::CREATED, Json(department)))
}

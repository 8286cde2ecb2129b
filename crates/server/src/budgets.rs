//! Budget API endpoints

use api_types::budget::{BudgetCheckRequest, BudgetNew, BudgetUpdate, MonthQuery};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{
    Budget, BudgetAlert, BudgetCheck, BudgetCheckCmd, BudgetCmd, BudgetScope, BudgetUsage,
    EngineError, FieldErrors, aggregation,
};
use uuid::Uuid;

use crate::{ServerError, parse_amount, server::ServerState};

fn scope(payload: &BudgetNew) -> Result<BudgetScope, ServerError> {
    let missing = |field: &str, message: &str| {
        let mut errors = FieldErrors::new();
        errors.insert(field, message);
        ServerError::from(EngineError::Validation(errors))
    };
    match payload.budget_type.as_str() {
        "category" => payload
            .category_id
            .map(BudgetScope::Category)
            .ok_or_else(|| missing("category_id", "กรุณาเลือกหมวดหมู่")),
        "department" => payload
            .department_id
            .map(BudgetScope::Department)
            .ok_or_else(|| missing("department_id", "กรุณาเลือกแผนก")),
        other => Err(EngineError::InvalidInput(format!("invalid budget type: {other}")).into()),
    }
}

pub async fn check(
    State(state): State<ServerState>,
    Json(payload): Json<BudgetCheckRequest>,
) -> Result<Json<BudgetCheck>, ServerError> {
    let check = state
        .engine
        .check_budget(BudgetCheckCmd {
            amount: parse_amount(&payload.amount),
            date: payload.date,
            category_id: payload.category_id,
            department_id: payload.department_id,
        })
        .await?;
    Ok(Json(check))
}

/// Budgets of a month with their usage; the current month by default.
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<BudgetUsage>>, ServerError> {
    let month = query
        .month
        .unwrap_or_else(|| aggregation::month_key(state.today()));
    Ok(Json(state.engine.budgets_with_usage(&month).await?))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<BudgetNew>,
) -> Result<(StatusCode, Json<Budget>), ServerError> {
    let mut cmd = BudgetCmd::new(scope(&payload)?, payload.month, parse_amount(&payload.amount));
    cmd.alert_threshold = payload.alert_threshold;
    let budget = state.engine.create_budget(cmd).await?;
    Ok((StatusCode::CREATED, Json(budget)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BudgetUpdate>,
) -> Result<Json<Budget>, ServerError> {
    let budget = state
        .engine
        .update_budget(id, parse_amount(&payload.amount), payload.alert_threshold)
        .await?;
    Ok(Json(budget))
}

pub async fn remove(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_budget(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn alerts(State(state): State<ServerState>) -> Result<Json<Vec<BudgetAlert>>, ServerError> {
    Ok(Json(state.engine.budget_alerts(state.today()).await?))
}

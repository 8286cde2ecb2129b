//! Recurring expense API endpoints

use api_types::recurring::{RecurringCheck, RecurringChecked, RecurringForm};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Frequency, RecurringCmd, RecurringExpense};
use uuid::Uuid;

use crate::{ServerError, parse_amount, server::ServerState};

fn recurring_cmd(form: RecurringForm) -> Result<RecurringCmd, ServerError> {
    Ok(RecurringCmd {
        description: form.description,
        amount: parse_amount(&form.amount),
        category_id: form.category_id,
        department_id: form.department_id,
        payment_method_id: form.payment_method_id,
        vendor: form.vendor,
        frequency: Frequency::try_from(form.frequency.as_str())?,
        start_date: form.start_date,
        created_by_name: form.created_by_name,
        active: form.active.unwrap_or(true),
    })
}

pub async fn list(
    State(state): State<ServerState>,
) -> Result<Json<Vec<RecurringExpense>>, ServerError> {
    Ok(Json(state.engine.list_recurring().await?))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RecurringExpense>, ServerError> {
    Ok(Json(state.engine.recurring(id).await?))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<RecurringForm>,
) -> Result<(StatusCode, Json<RecurringExpense>), ServerError> {
    let template = state.engine.create_recurring(recurring_cmd(payload)?).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecurringForm>,
) -> Result<Json<RecurringExpense>, ServerError> {
    let template = state
        .engine
        .update_recurring(id, recurring_cmd(payload)?)
        .await?;
    Ok(Json(template))
}

pub async fn remove(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_recurring(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Runs the scheduler, as of today unless the body names a day.
pub async fn check(
    State(state): State<ServerState>,
    payload: Option<Json<RecurringCheck>>,
) -> Result<Json<RecurringChecked>, ServerError> {
    let date = payload
        .and_then(|Json(check)| check.date)
        .unwrap_or_else(|| state.today());
    let processed = state.engine.check_recurring(date).await?;
    Ok(Json(RecurringChecked { date, processed }))
}

//! Expense API endpoints

use api_types::expense::{
    AttachmentUpload, ExpenseCreated, ExpenseEdit, ExpenseForm, ExpenseQuery, StatusUpdate,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use engine::{
    Actor, AttachmentType, AuditLogEntry, EditExpenseCmd, Expense, ExpenseCmd, ExpenseDetail,
    ExpenseListFilter, ExpensePage, ExpenseStatus, LookupRef, Upload,
};
use uuid::Uuid;

use crate::{ServerError, parse_amount, server::ServerState};

fn lookup(id: Option<Uuid>, name: Option<String>) -> Option<LookupRef> {
    id.map(LookupRef::Id).or_else(|| name.map(LookupRef::Name))
}

fn upload(attachment: AttachmentUpload) -> Result<Upload, ServerError> {
    let attachment_type = AttachmentType::try_from(attachment.attachment_type.as_str())?;
    let bytes = STANDARD.decode(attachment.data.as_bytes()).map_err(|_| {
        ServerError::Generic(format!("invalid attachment data: {}", attachment.file_name))
    })?;
    Ok(Upload::new(
        attachment_type,
        attachment.file_name,
        attachment.content_type,
        bytes,
    ))
}

fn expense_cmd(form: ExpenseForm) -> Result<ExpenseCmd, ServerError> {
    let status = form
        .status
        .as_deref()
        .map(ExpenseStatus::try_from)
        .transpose()?;
    let uploads = form
        .attachments
        .into_iter()
        .map(upload)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ExpenseCmd {
        date: form.date,
        amount: parse_amount(&form.amount),
        category: lookup(form.category_id, form.category_name),
        payment_method: lookup(form.payment_method_id, form.payment_method_name),
        department_id: form.department_id,
        vendor: form.vendor,
        description: form.description,
        note_internal: form.note_internal,
        created_by_name: form.created_by_name,
        status,
        uploads,
    })
}

fn list_filter(query: &ExpenseQuery) -> Result<ExpenseListFilter, ServerError> {
    let status = query
        .status
        .as_deref()
        .filter(|status| !status.is_empty())
        .map(ExpenseStatus::try_from)
        .transpose()?;
    Ok(ExpenseListFilter {
        search: query.search.clone(),
        category_id: query.category_id,
        department_id: query.department_id,
        status,
        from: query.from,
        to: query.to,
    })
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ExpenseQuery>,
) -> Result<Json<ExpensePage>, ServerError> {
    let filter = list_filter(&query)?;
    let page = state
        .engine
        .list_expenses(&filter, query.page.unwrap_or(1))
        .await?;
    Ok(Json(page))
}

pub async fn create(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseForm>,
) -> Result<(StatusCode, Json<ExpenseCreated>), ServerError> {
    let cmd = expense_cmd(payload)?;
    let id = state.engine.create_expense(cmd, &actor).await?;
    Ok((StatusCode::CREATED, Json(ExpenseCreated { id })))
}

pub async fn detail(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExpenseDetail>, ServerError> {
    Ok(Json(state.engine.expense_detail(id).await?))
}

pub async fn edit(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExpenseEdit>,
) -> Result<Json<Expense>, ServerError> {
    let cmd = EditExpenseCmd {
        fields: expense_cmd(payload.form)?,
        delete_attachment_ids: payload.delete_attachment_ids,
    };
    Ok(Json(state.engine.edit_expense(id, cmd, &actor).await?))
}

pub async fn remove(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_expense(id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_status(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusUpdate>,
) -> Result<Json<Expense>, ServerError> {
    let expense = state
        .engine
        .update_status(id, &payload.status, payload.comment.as_deref(), &actor)
        .await?;
    Ok(Json(expense))
}

pub async fn audit(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AuditLogEntry>>, ServerError> {
    Ok(Json(state.engine.audit_history(id).await?))
}

/// CSV download of the expenses matching the list filters.
pub async fn export(
    State(state): State<ServerState>,
    Query(query): Query<ExpenseQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let filter = list_filter(&query)?;
    let csv = state.engine.export_expenses(&filter).await?;
    let file_name = format!("expenses-{}.csv", state.today());
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        csv,
    ))
}

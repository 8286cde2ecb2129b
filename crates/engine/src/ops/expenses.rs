//! Expense lifecycle: create, status changes, edit, delete, listing, detail
//! and export.
//!
//! The primary write of every operation either succeeds or fails the call.
//! Audit entries, notifications and attachment handling run afterwards and
//! are best effort.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveValue, Condition, PaginatorTrait, QueryFilter, QueryOrder, Select,
    prelude::*,
    sea_query::{Expr, Func},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    Actor, Attachment, AttachmentType, AuditAction, Category, Department, EditExpenseCmd, EngineError, Expense,
    ExpenseCmd, ExpenseListFilter, ExpenseStatus, FieldErrors, LookupRef, NotificationKind,
    PaymentMethod, ResultEngine, attachments, categories, departments, expenses, payment_methods,
    report::{self, ExportRow},
    status::ensure_transition,
    storage::{self, PREVIEW_WIDTH, THUMBNAIL_SIZE},
    util::{best_effort, normalize_optional_text, normalize_required_text},
};

use super::{
    ADMIN_ROLE, Engine, NewNotification, USER_ROLE,
    audit::AuditRecord,
};

pub const EXPENSE_PAGE_SIZE: u64 = 20;

const REQUESTER_ROLE: &str = "Requester";

const DATE_REQUIRED: &str = "กรุณาระบุวันที่";
const AMOUNT_POSITIVE: &str = "จำนวนเงินต้องเป็นตัวเลขมากกว่า 0";
const AMOUNT_TOO_LARGE: &str = "จำนวนเงินเกินวงเงินสูงสุดที่รองรับ";
const CATEGORY_REQUIRED: &str = "กรุณาเลือกหมวดหมู่หรือพิมพ์ชื่อหมวดหมู่";
const PAYMENT_METHOD_REQUIRED: &str = "กรุณาเลือกวิธีชำระเงินหรือพิมพ์ชื่อวิธีชำระเงิน";
const DESCRIPTION_REQUIRED: &str = "กรุณาระบุรายละเอียด";
const CREATED_BY_REQUIRED: &str = "กรุณาระบุชื่อผู้ทำรายการ";
const DEPARTMENT_REQUIRED: &str = "กรุณาเลือกแผนก";
const CATEGORY_NOT_FOUND: &str = "ไม่พบหมวดหมู่ที่เลือก";
const PAYMENT_METHOD_NOT_FOUND: &str = "ไม่พบวิธีชำระเงินที่เลือก";
const DEPARTMENT_NOT_FOUND: &str = "ไม่พบแผนกที่เลือก";
const EXPENSE_NOT_FOUND: &str = "ไม่พบรายการนี้";

const CREATE_COMMENT: &str = "สร้างรายการขอเบิกใหม่";
const EDIT_COMMENT: &str = "แก้ไขรายการ";
const DELETE_COMMENT: &str = "deleted";

/// An expense with its lookups resolved.
#[derive(Clone, Debug, Serialize)]
pub struct ExpenseSummary {
    #[serde(flatten)]
    pub expense: Expense,
    pub category: Option<Category>,
    pub department: Option<Department>,
    pub payment_method: Option<PaymentMethod>,
    /// Type of each attachment, in upload order.
    pub attachment_types: Vec<AttachmentType>,
}

/// One page of the expense list.
#[derive(Clone, Debug, Serialize)]
pub struct ExpensePage {
    pub expenses: Vec<ExpenseSummary>,
    /// Rows matching the filter across all pages.
    pub total: u64,
    /// 1-based.
    pub page: u64,
    pub total_pages: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct AttachmentView {
    #[serde(flatten)]
    pub attachment: Attachment,
    pub url: String,
    pub is_image: bool,
    /// Set for images only.
    pub thumbnail_url: Option<String>,
    pub preview_url: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ExpenseDetail {
    #[serde(flatten)]
    pub summary: ExpenseSummary,
    pub attachments: Vec<AttachmentView>,
}

/// Form fields that passed validation.
struct ValidExpense<'a> {
    date: NaiveDate,
    category: &'a LookupRef,
    payment_method: &'a LookupRef,
    department_id: Uuid,
    description: String,
    created_by_name: String,
    vendor: Option<String>,
    note_internal: Option<String>,
}

fn lookup_given(lookup: &LookupRef) -> bool {
    match lookup {
        LookupRef::Id(_) => true,
        LookupRef::Name(name) => !name.trim().is_empty(),
    }
}

/// Lookup rows keyed by id, for attaching names to expense rows.
pub(super) struct LookupMaps {
    pub(super) categories: HashMap<Uuid, Category>,
    pub(super) departments: HashMap<Uuid, Department>,
    pub(super) payment_methods: HashMap<Uuid, PaymentMethod>,
}

impl LookupMaps {
    pub(super) fn summarize(&self, expense: Expense) -> ExpenseSummary {
        ExpenseSummary {
            category: self.categories.get(&expense.category_id).cloned(),
            department: self.departments.get(&expense.department_id).cloned(),
            payment_method: self.payment_methods.get(&expense.payment_method_id).cloned(),
            attachment_types: Vec::new(),
            expense,
        }
    }
}

fn filtered(filter: &ExpenseListFilter) -> Select<expenses::Entity> {
    let mut query = expenses::Entity::find();
    if let Some(search) = normalize_optional_text(filter.search.as_deref()) {
        let pattern = format!("%{}%", search.to_lowercase());
        query = query.filter(
            Condition::any()
                .add(
                    Expr::expr(Func::lower(Expr::col(expenses::Column::Description)))
                        .like(pattern.clone()),
                )
                .add(Expr::expr(Func::lower(Expr::col(expenses::Column::Vendor))).like(pattern)),
        );
    }
    if let Some(category_id) = filter.category_id {
        query = query.filter(expenses::Column::CategoryId.eq(category_id));
    }
    if let Some(department_id) = filter.department_id {
        query = query.filter(expenses::Column::DepartmentId.eq(department_id));
    }
    if let Some(status) = filter.status {
        query = query.filter(expenses::Column::Status.eq(status.as_str()));
    }
    if let Some(from) = filter.from {
        query = query.filter(expenses::Column::Date.gte(from));
    }
    if let Some(to) = filter.to {
        query = query.filter(expenses::Column::Date.lte(to));
    }
    query
        .order_by_desc(expenses::Column::Date)
        .order_by_desc(expenses::Column::CreatedAt)
}

impl Engine {
    async fn validate_expense<'a>(&self, cmd: &'a ExpenseCmd) -> ResultEngine<ValidExpense<'a>> {
        let mut errors = FieldErrors::new();

        if cmd.date.is_none() {
            errors.insert("date", DATE_REQUIRED);
        }
        if !cmd.amount.is_positive() {
            errors.insert("amount", AMOUNT_POSITIVE);
        } else if cmd.amount.exceeds_limit() {
            errors.insert("amount", AMOUNT_TOO_LARGE);
        }
        let category = cmd.category.as_ref().filter(|c| lookup_given(c));
        if category.is_none() {
            errors.insert("category_id", CATEGORY_REQUIRED);
        }
        let payment_method = cmd.payment_method.as_ref().filter(|p| lookup_given(p));
        if payment_method.is_none() {
            errors.insert("payment_method_id", PAYMENT_METHOD_REQUIRED);
        }
        let description = normalize_required_text(&cmd.description);
        if description.is_none() {
            errors.insert("description", DESCRIPTION_REQUIRED);
        }
        let created_by_name = normalize_required_text(&cmd.created_by_name);
        if created_by_name.is_none() {
            errors.insert("created_by_name", CREATED_BY_REQUIRED);
        }
        if cmd.department_id.is_none() {
            errors.insert("department_id", DEPARTMENT_REQUIRED);
        }

        if let Some(LookupRef::Id(id)) = category
            && !self.category_exists(*id).await?
        {
            errors.insert("category_id", CATEGORY_NOT_FOUND);
        }
        if let Some(LookupRef::Id(id)) = payment_method
            && !self.payment_method_exists(*id).await?
        {
            errors.insert("payment_method_id", PAYMENT_METHOD_NOT_FOUND);
        }
        if let Some(id) = cmd.department_id
            && !self.department_exists(id).await?
        {
            errors.insert("department_id", DEPARTMENT_NOT_FOUND);
        }

        match (
            cmd.date,
            category,
            payment_method,
            cmd.department_id,
            description,
            created_by_name,
        ) {
            (
                Some(date),
                Some(category),
                Some(payment_method),
                Some(department_id),
                Some(description),
                Some(created_by_name),
            ) if errors.is_empty() => Ok(ValidExpense {
                date,
                category,
                payment_method,
                department_id,
                description,
                created_by_name,
                vendor: normalize_optional_text(cmd.vendor.as_deref()),
                note_internal: normalize_optional_text(cmd.note_internal.as_deref()),
            }),
            _ => Err(EngineError::Validation(errors)),
        }
    }

    async fn expense_model(&self, id: Uuid) -> ResultEngine<expenses::Model> {
        expenses::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(EXPENSE_NOT_FOUND.to_string()))
    }

    pub(super) async fn lookup_maps(&self) -> ResultEngine<LookupMaps> {
        let categories = categories::Entity::find().all(&self.database).await?;
        let departments = departments::Entity::find().all(&self.database).await?;
        let payment_methods = payment_methods::Entity::find().all(&self.database).await?;
        Ok(LookupMaps {
            categories: categories.into_iter().map(|m| (m.id, m.into())).collect(),
            departments: departments.into_iter().map(|m| (m.id, m.into())).collect(),
            payment_methods: payment_methods
                .into_iter()
                .map(|m| (m.id, m.into()))
                .collect(),
        })
    }

    /// Validates and stores a new expense, then records the audit entry,
    /// notifies admins and stores the uploads.
    ///
    /// Free-text lookups are created before the expense row; if that fails
    /// nothing is written.
    pub async fn create_expense(&self, cmd: ExpenseCmd, actor: &Actor) -> ResultEngine<Uuid> {
        let valid = self.validate_expense(&cmd).await?;
        let category_id = self.resolve_category(valid.category).await?;
        let payment_method_id = self.resolve_payment_method(valid.payment_method).await?;

        let id = Uuid::new_v4();
        let status = cmd.status.unwrap_or_default();
        let now = Utc::now();
        expenses::ActiveModel {
            id: ActiveValue::Set(id),
            date: ActiveValue::Set(valid.date),
            amount_minor: ActiveValue::Set(cmd.amount.minor()),
            category_id: ActiveValue::Set(category_id),
            department_id: ActiveValue::Set(valid.department_id),
            payment_method_id: ActiveValue::Set(payment_method_id),
            vendor: ActiveValue::Set(valid.vendor),
            description: ActiveValue::Set(valid.description),
            note_internal: ActiveValue::Set(valid.note_internal),
            status: ActiveValue::Set(status.as_str().to_string()),
            created_by_name: ActiveValue::Set(valid.created_by_name.clone()),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        }
        .insert(&self.database)
        .await?;
        tracing::info!(expense_id = %id, actor = %actor.name, status = status.as_str(), "expense created");

        let requester = Actor::new(valid.created_by_name.as_str(), REQUESTER_ROLE);
        best_effort(
            "create audit",
            self.record_audit(
                AuditRecord::new(id, AuditAction::Create, &requester)
                    .statuses(None, Some(status))
                    .comment(CREATE_COMMENT),
            )
            .await,
        );
        best_effort(
            "create notification",
            self.notify(
                NewNotification::new(
                    NotificationKind::Info,
                    "มีรายการเบิกใหม่",
                    format!(
                        "{} ได้สร้างรายการเบิกใหม่ {}",
                        valid.created_by_name, cmd.amount
                    ),
                )
                .link(format!("/expenses/{id}"))
                .target_role(ADMIN_ROLE),
            )
            .await,
        );

        self.store_uploads(id, cmd.uploads).await;
        Ok(id)
    }

    /// Moves an expense to `status` (`draft`, `approved`, `rejected` or
    /// `paid`), audits the change and notifies the requester side.
    pub async fn update_status(
        &self,
        id: Uuid,
        status: &str,
        comment: Option<&str>,
        actor: &Actor,
    ) -> ResultEngine<Expense> {
        let new_status = ExpenseStatus::try_from(status.trim())?;
        let model = self.expense_model(id).await?;
        let old_status = ExpenseStatus::try_from(model.status.as_str())?;
        ensure_transition(old_status, new_status)?;

        let description = model.description.clone();
        let mut active: expenses::ActiveModel = model.into();
        active.status = ActiveValue::Set(new_status.as_str().to_string());
        active.updated_at = ActiveValue::Set(Utc::now());
        let updated = active.update(&self.database).await?;
        tracing::info!(
            expense_id = %id,
            from = old_status.as_str(),
            to = new_status.as_str(),
            actor = %actor.name,
            "expense status changed"
        );

        let effects = new_status.effects();
        let comment = normalize_optional_text(comment);
        best_effort(
            "status audit",
            self.record_audit(
                AuditRecord::new(id, effects.action, actor)
                    .statuses(Some(old_status), Some(new_status))
                    .comment(comment.as_deref().unwrap_or(effects.default_comment)),
            )
            .await,
        );
        if let Some(notice) = effects.notification {
            best_effort(
                "status notification",
                self.notify(
                    NewNotification::new(notice.kind, notice.title, notice.message(&description))
                        .link(format!("/expenses/{id}"))
                        .target_role(USER_ROLE),
                )
                .await,
            );
        }

        Expense::try_from(updated)
    }

    /// Replaces the form fields of an expense, removes the selected
    /// attachments and stores new uploads.
    ///
    /// A form without a status keeps the current one.
    pub async fn edit_expense(
        &self,
        id: Uuid,
        cmd: EditExpenseCmd,
        actor: &Actor,
    ) -> ResultEngine<Expense> {
        let model = self.expense_model(id).await?;
        let old_status = ExpenseStatus::try_from(model.status.as_str())?;

        let EditExpenseCmd {
            fields,
            delete_attachment_ids,
        } = cmd;
        let valid = self.validate_expense(&fields).await?;
        let new_status = fields.status.unwrap_or(old_status);
        if new_status != old_status {
            ensure_transition(old_status, new_status)?;
        }
        let category_id = self.resolve_category(valid.category).await?;
        let payment_method_id = self.resolve_payment_method(valid.payment_method).await?;

        let mut active: expenses::ActiveModel = model.into();
        active.date = ActiveValue::Set(valid.date);
        active.amount_minor = ActiveValue::Set(fields.amount.minor());
        active.category_id = ActiveValue::Set(category_id);
        active.department_id = ActiveValue::Set(valid.department_id);
        active.payment_method_id = ActiveValue::Set(payment_method_id);
        active.vendor = ActiveValue::Set(valid.vendor);
        active.description = ActiveValue::Set(valid.description);
        active.note_internal = ActiveValue::Set(valid.note_internal);
        active.created_by_name = ActiveValue::Set(valid.created_by_name);
        active.status = ActiveValue::Set(new_status.as_str().to_string());
        active.updated_at = ActiveValue::Set(Utc::now());
        let updated = active.update(&self.database).await?;
        tracing::info!(expense_id = %id, actor = %actor.name, "expense edited");

        if !delete_attachment_ids.is_empty() {
            match attachments::Entity::find()
                .filter(attachments::Column::ExpenseId.eq(id))
                .filter(attachments::Column::Id.is_in(delete_attachment_ids))
                .all(&self.database)
                .await
            {
                Ok(rows) => self.remove_attachments(rows).await,
                Err(err) => best_effort("attachment lookup", Err(err.into())),
            }
        }
        self.store_uploads(id, fields.uploads).await;

        best_effort(
            "edit audit",
            self.record_audit(
                AuditRecord::new(id, AuditAction::Update, actor)
                    .statuses(Some(old_status), Some(new_status))
                    .comment(EDIT_COMMENT),
            )
            .await,
        );

        Expense::try_from(updated)
    }

    /// Removes the attachments (objects, then rows), then the expense itself.
    /// The audit entry and the admin notification survive the expense.
    pub async fn delete_expense(&self, id: Uuid, actor: &Actor) -> ResultEngine<()> {
        let model = self.expense_model(id).await?;
        let old_status = ExpenseStatus::try_from(model.status.as_str())?;

        let rows = attachments::Entity::find()
            .filter(attachments::Column::ExpenseId.eq(id))
            .all(&self.database)
            .await?;
        let attachment_count = rows.len();
        self.remove_attachments(rows).await;

        expenses::Entity::delete_by_id(id)
            .exec(&self.database)
            .await?;
        tracing::info!(expense_id = %id, attachments = attachment_count, actor = %actor.name, "expense deleted");

        best_effort(
            "delete audit",
            self.record_audit(
                AuditRecord::new(id, AuditAction::Update, actor)
                    .statuses(Some(old_status), None)
                    .comment(DELETE_COMMENT),
            )
            .await,
        );
        best_effort(
            "delete notification",
            self.notify(
                NewNotification::new(
                    NotificationKind::Warning,
                    "ลบรายการเบิก",
                    format!("{} ได้ลบรายการ \"{}\"", actor.name, model.description),
                )
                .link("/expenses")
                .target_role(ADMIN_ROLE),
            )
            .await,
        );
        Ok(())
    }

    /// Sets `attachment_types` on each summary with one query.
    pub(super) async fn fill_attachment_types(
        &self,
        summaries: &mut [ExpenseSummary],
    ) -> ResultEngine<()> {
        if summaries.is_empty() {
            return Ok(());
        }
        let ids: Vec<Uuid> = summaries.iter().map(|s| s.expense.id).collect();
        let rows = attachments::Entity::find()
            .filter(attachments::Column::ExpenseId.is_in(ids))
            .order_by_asc(attachments::Column::UploadedAt)
            .all(&self.database)
            .await?;

        let mut by_expense: HashMap<Uuid, Vec<AttachmentType>> = HashMap::new();
        for row in rows {
            let attachment_type = AttachmentType::try_from(row.attachment_type.as_str())?;
            by_expense.entry(row.expense_id).or_default().push(attachment_type);
        }
        for summary in summaries {
            if let Some(types) = by_expense.remove(&summary.expense.id) {
                summary.attachment_types = types;
            }
        }
        Ok(())
    }

    /// One page (1-based) of expenses matching `filter`, newest date first.
    pub async fn list_expenses(
        &self,
        filter: &ExpenseListFilter,
        page: u64,
    ) -> ResultEngine<ExpensePage> {
        let page = page.max(1);
        let paginator = filtered(filter).paginate(&self.database, EXPENSE_PAGE_SIZE);
        let counts = paginator.num_items_and_pages().await?;
        let rows = paginator.fetch_page(page - 1).await?;

        let maps = self.lookup_maps().await?;
        let mut expenses = rows
            .into_iter()
            .map(|row| Expense::try_from(row).map(|expense| maps.summarize(expense)))
            .collect::<ResultEngine<Vec<_>>>()?;
        self.fill_attachment_types(&mut expenses).await?;

        Ok(ExpensePage {
            expenses,
            total: counts.number_of_items,
            page,
            total_pages: counts.number_of_pages,
        })
    }

    /// The expense with its lookups and attachment URLs.
    pub async fn expense_detail(&self, id: Uuid) -> ResultEngine<ExpenseDetail> {
        let model = self.expense_model(id).await?;
        let category = model
            .find_related(categories::Entity)
            .one(&self.database)
            .await?
            .map(Category::from);
        let department = model
            .find_related(departments::Entity)
            .one(&self.database)
            .await?
            .map(Department::from);
        let payment_method = model
            .find_related(payment_methods::Entity)
            .one(&self.database)
            .await?
            .map(PaymentMethod::from);
        let attachment_rows = model
            .find_related(attachments::Entity)
            .all(&self.database)
            .await?;

        let mut attachments: Vec<AttachmentView> = Vec::with_capacity(attachment_rows.len());
        for row in attachment_rows {
            let attachment = Attachment::try_from(row)?;
            let url = self.objects.public_url(&attachment.file_path);
            let is_image = storage::is_image_path(&attachment.file_path);
            attachments.push(AttachmentView {
                thumbnail_url: is_image.then(|| storage::thumbnail_url(&url, THUMBNAIL_SIZE)),
                preview_url: is_image.then(|| storage::preview_url(&url, PREVIEW_WIDTH)),
                is_image,
                url,
                attachment,
            });
        }

        Ok(ExpenseDetail {
            summary: ExpenseSummary {
                expense: Expense::try_from(model)?,
                category,
                department,
                payment_method,
                attachment_types: attachments
                    .iter()
                    .map(|view| view.attachment.attachment_type)
                    .collect(),
            },
            attachments,
        })
    }

    /// CSV report of every expense matching `filter`.
    pub async fn export_expenses(&self, filter: &ExpenseListFilter) -> ResultEngine<Vec<u8>> {
        let rows = filtered(filter).all(&self.database).await?;
        let maps = self.lookup_maps().await?;

        let export_rows = rows
            .into_iter()
            .map(|row| {
                let summary = maps.summarize(Expense::try_from(row)?);
                let expense = summary.expense;
                Ok(ExportRow {
                    date: expense.date,
                    description: expense.description,
                    category: summary.category.map(|c| c.name),
                    department: summary.department.map(|d| d.name),
                    amount: expense.amount,
                    payment_method: summary.payment_method.map(|p| p.name),
                    vendor: expense.vendor,
                    status: expense.status,
                    created_by_name: expense.created_by_name,
                    note_internal: expense.note_internal,
                })
            })
            .collect::<ResultEngine<Vec<_>>>()?;
        tracing::debug!(rows = export_rows.len(), "exporting expenses");

        report::expenses_csv(&export_rows)
    }
}

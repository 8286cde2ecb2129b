//! Recurring expense templates and the due-date scheduler.

use chrono::{Days, NaiveDate, Utc};
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, FieldErrors, Frequency, NotificationKind, RecurringCmd, RecurringExpense, ResultEngine,
    recurring_expenses,
    util::{best_effort, normalize_optional_text, normalize_required_text},
};

use super::{ADMIN_ROLE, Engine, NewNotification};

/// How far ahead the upcoming reminder fires.
const REMINDER_LEAD_DAYS: u64 = 7;
const RECURRING_LINK: &str = "/recurring";

const DESCRIPTION_REQUIRED: &str = "กรุณาระบุรายละเอียด";
const AMOUNT_POSITIVE: &str = "จำนวนเงินต้องมากกว่า 0";
const AMOUNT_TOO_LARGE: &str = "จำนวนเงินเกินวงเงินสูงสุดที่รองรับ";
const CREATED_BY_REQUIRED: &str = "กรุณาระบุชื่อผู้ทำรายการ";
const CATEGORY_NOT_FOUND: &str = "ไม่พบหมวดหมู่ที่เลือก";
const DEPARTMENT_NOT_FOUND: &str = "ไม่พบแผนกที่เลือก";
const PAYMENT_METHOD_NOT_FOUND: &str = "ไม่พบวิธีชำระเงินที่เลือก";
const RECURRING_NOT_FOUND: &str = "Recurring expense not found";

/// Validated text fields of a template.
struct ValidRecurring {
    description: String,
    created_by_name: String,
    vendor: Option<String>,
}

impl Engine {
    async fn validate_recurring(&self, cmd: &RecurringCmd) -> ResultEngine<ValidRecurring> {
        let mut errors = FieldErrors::new();
        let description = normalize_required_text(&cmd.description);
        if description.is_none() {
            errors.insert("description", DESCRIPTION_REQUIRED);
        }
        if !cmd.amount.is_positive() {
            errors.insert("amount", AMOUNT_POSITIVE);
        } else if cmd.amount.exceeds_limit() {
            errors.insert("amount", AMOUNT_TOO_LARGE);
        }
        let created_by_name = normalize_required_text(&cmd.created_by_name);
        if created_by_name.is_none() {
            errors.insert("created_by_name", CREATED_BY_REQUIRED);
        }
        if let Some(id) = cmd.category_id
            && !self.category_exists(id).await?
        {
            errors.insert("category_id", CATEGORY_NOT_FOUND);
        }
        if let Some(id) = cmd.department_id
            && !self.department_exists(id).await?
        {
            errors.insert("department_id", DEPARTMENT_NOT_FOUND);
        }
        if let Some(id) = cmd.payment_method_id
            && !self.payment_method_exists(id).await?
        {
            errors.insert("payment_method_id", PAYMENT_METHOD_NOT_FOUND);
        }

        match (description, created_by_name) {
            (Some(description), Some(created_by_name)) if errors.is_empty() => Ok(ValidRecurring {
                description,
                created_by_name,
                vendor: normalize_optional_text(cmd.vendor.as_deref()),
            }),
            _ => Err(EngineError::Validation(errors)),
        }
    }

    async fn recurring_model(&self, id: Uuid) -> ResultEngine<recurring_expenses::Model> {
        recurring_expenses::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(RECURRING_NOT_FOUND.to_string()))
    }

    /// Creates an active template first due on its start date.
    pub async fn create_recurring(&self, cmd: RecurringCmd) -> ResultEngine<RecurringExpense> {
        let valid = self.validate_recurring(&cmd).await?;
        let now = Utc::now();
        let model = recurring_expenses::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            description: ActiveValue::Set(valid.description),
            amount_minor: ActiveValue::Set(cmd.amount.minor()),
            category_id: ActiveValue::Set(cmd.category_id),
            department_id: ActiveValue::Set(cmd.department_id),
            payment_method_id: ActiveValue::Set(cmd.payment_method_id),
            vendor: ActiveValue::Set(valid.vendor),
            frequency: ActiveValue::Set(cmd.frequency.as_str().to_string()),
            start_date: ActiveValue::Set(cmd.start_date),
            next_due_date: ActiveValue::Set(cmd.start_date),
            active: ActiveValue::Set(true),
            created_by_name: ActiveValue::Set(valid.created_by_name),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        }
        .insert(&self.database)
        .await?;
        tracing::info!(recurring_id = %model.id, frequency = %model.frequency, "recurring expense created");
        RecurringExpense::try_from(model)
    }

    /// Rewrites the template fields. The schedule (`next_due_date`) is kept.
    pub async fn update_recurring(
        &self,
        id: Uuid,
        cmd: RecurringCmd,
    ) -> ResultEngine<RecurringExpense> {
        let valid = self.validate_recurring(&cmd).await?;
        let model = self.recurring_model(id).await?;

        let mut active: recurring_expenses::ActiveModel = model.into();
        active.description = ActiveValue::Set(valid.description.clone());
        active.amount_minor = ActiveValue::Set(cmd.amount.minor());
        active.category_id = ActiveValue::Set(cmd.category_id);
        active.department_id = ActiveValue::Set(cmd.department_id);
        active.payment_method_id = ActiveValue::Set(cmd.payment_method_id);
        active.vendor = ActiveValue::Set(valid.vendor);
        active.frequency = ActiveValue::Set(cmd.frequency.as_str().to_string());
        active.start_date = ActiveValue::Set(cmd.start_date);
        active.active = ActiveValue::Set(cmd.active);
        active.created_by_name = ActiveValue::Set(valid.created_by_name);
        active.updated_at = ActiveValue::Set(Utc::now());
        let updated = active.update(&self.database).await?;

        best_effort(
            "recurring update notification",
            self.notify(
                NewNotification::new(
                    NotificationKind::Info,
                    "แก้ไขรายจ่ายประจำ",
                    format!("แก้ไขรายการรายจ่ายประจำ: {}", valid.description),
                )
                .link(RECURRING_LINK)
                .target_role(ADMIN_ROLE),
            )
            .await,
        );
        RecurringExpense::try_from(updated)
    }

    pub async fn delete_recurring(&self, id: Uuid) -> ResultEngine<()> {
        let result = recurring_expenses::Entity::delete_by_id(id)
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound(RECURRING_NOT_FOUND.to_string()));
        }

        best_effort(
            "recurring delete notification",
            self.notify(
                NewNotification::new(
                    NotificationKind::Warning,
                    "ลบรายจ่ายประจำ",
                    "มีการลบรายการรายจ่ายประจำ",
                )
                .link(RECURRING_LINK)
                .target_role(ADMIN_ROLE),
            )
            .await,
        );
        Ok(())
    }

    /// Every template, soonest due first.
    pub async fn list_recurring(&self) -> ResultEngine<Vec<RecurringExpense>> {
        recurring_expenses::Entity::find()
            .order_by_asc(recurring_expenses::Column::NextDueDate)
            .all(&self.database)
            .await?
            .into_iter()
            .map(RecurringExpense::try_from)
            .collect()
    }

    pub async fn recurring(&self, id: Uuid) -> ResultEngine<RecurringExpense> {
        RecurringExpense::try_from(self.recurring_model(id).await?)
    }

    /// Runs the scheduler for `today` and returns how many reminders and
    /// advancements it made.
    ///
    /// Active templates due exactly [`REMINDER_LEAD_DAYS`] days ahead get an
    /// upcoming reminder and are left untouched. Active templates due today or
    /// earlier get a due notification and move forward by one period only,
    /// so a template several periods behind catches up over several runs.
    pub async fn check_recurring(&self, today: NaiveDate) -> ResultEngine<u64> {
        let mut processed = 0;

        if let Some(reminder_day) = today.checked_add_days(Days::new(REMINDER_LEAD_DAYS)) {
            let upcoming = recurring_expenses::Entity::find()
                .filter(recurring_expenses::Column::Active.eq(true))
                .filter(recurring_expenses::Column::NextDueDate.eq(reminder_day))
                .all(&self.database)
                .await?;
            for template in upcoming {
                best_effort(
                    "upcoming reminder",
                    self.notify(
                        NewNotification::new(
                            NotificationKind::Warning,
                            "แจ้งเตือนล่วงหน้า 7 วัน",
                            format!(
                                "รายการ \"{}\" จะครบกำหนดในวันที่ {}",
                                template.description, template.next_due_date
                            ),
                        )
                        .link(RECURRING_LINK),
                    )
                    .await,
                );
                processed += 1;
            }
        }

        let due = recurring_expenses::Entity::find()
            .filter(recurring_expenses::Column::Active.eq(true))
            .filter(recurring_expenses::Column::NextDueDate.lte(today))
            .all(&self.database)
            .await?;
        for template in due {
            best_effort(
                "due notification",
                self.notify(
                    NewNotification::new(
                        NotificationKind::Error,
                        "รายจ่ายประจำครบกำหนด",
                        format!(
                            "รายการ \"{}\" ครบกำหนดชำระวันนี้ ({})",
                            template.description, template.next_due_date
                        ),
                    )
                    .link(RECURRING_LINK),
                )
                .await,
            );

            let id = template.id;
            let frequency = match Frequency::try_from(template.frequency.as_str()) {
                Ok(frequency) => frequency,
                Err(err) => {
                    tracing::warn!(recurring_id = %id, error = %err, "skipping template");
                    continue;
                }
            };
            let Some(next_due) = frequency.next_occurrence(template.next_due_date) else {
                tracing::warn!(recurring_id = %id, "next due date out of range");
                continue;
            };

            let mut active: recurring_expenses::ActiveModel = template.into();
            active.next_due_date = ActiveValue::Set(next_due);
            active.updated_at = ActiveValue::Set(Utc::now());
            match active.update(&self.database).await {
                Ok(_) => {
                    tracing::debug!(recurring_id = %id, %next_due, "advanced recurring expense");
                    processed += 1;
                }
                Err(err) => {
                    tracing::warn!(recurring_id = %id, error = %err, "failed to advance recurring expense");
                }
            }
        }

        tracing::info!(%today, processed, "recurring check finished");
        Ok(processed)
    }
}

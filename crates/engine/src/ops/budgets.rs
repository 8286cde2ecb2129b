//! Monthly budgets per category or department.
//!
//! A budget check is advisory: it reports how a prospective amount would
//! land against the budgets of its scopes and never blocks a write.

use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, Statement, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    Budget, BudgetAlert, BudgetCheckCmd, BudgetCmd, BudgetHealth, BudgetScope, EngineError,
    ExpenseStatus, FieldErrors, Money, ResultEngine,
    aggregation::{self, BudgetUse},
    budgets::{self, DEFAULT_ALERT_THRESHOLD},
    categories, departments,
    util::is_unique_violation,
};

use super::Engine;

const INCOMPLETE_DATA: &str = "Incomplete data";
const DUPLICATE_BUDGET: &str = "มีงบประมาณสำหรับรายการนี้ในเดือนนี้แล้ว";
const BUDGET_NOT_FOUND: &str = "ไม่พบงบประมาณ";
const MONTH_INVALID: &str = "รูปแบบเดือนไม่ถูกต้อง (YYYY-MM)";
const AMOUNT_POSITIVE: &str = "จำนวนเงินต้องมากกว่า 0";
const AMOUNT_TOO_LARGE: &str = "จำนวนเงินเกินวงเงินสูงสุดที่รองรับ";
const TOTAL_OUT_OF_RANGE: &str = "projected total out of range";
const THRESHOLD_RANGE: &str = "เปอร์เซ็นต์แจ้งเตือนต้องอยู่ระหว่าง 1-100";
const CATEGORY_REQUIRED: &str = "กรุณาเลือกหมวดหมู่";
const DEPARTMENT_REQUIRED: &str = "กรุณาเลือกแผนก";
const DEPARTMENT_ICON: &str = "🏢";
const UNKNOWN_SCOPE: &str = "Unknown";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetCheckStatus {
    Ok,
    Warning,
    Error,
}

/// Outcome of a budget check. `message` joins every scope's finding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BudgetCheck {
    pub status: BudgetCheckStatus,
    pub message: Option<String>,
}

impl BudgetCheck {
    fn ok() -> Self {
        Self {
            status: BudgetCheckStatus::Ok,
            message: None,
        }
    }
}

/// A budget with the month's actual spend against it.
#[derive(Clone, Debug, Serialize)]
pub struct BudgetUsage {
    #[serde(flatten)]
    pub budget: Budget,
    /// Category or department name.
    pub scope_name: Option<String>,
    pub used: Money,
    pub remaining: Money,
    pub percentage: f64,
    pub status: BudgetHealth,
}

/// Name and icon shown for a scope.
struct ScopeInfo {
    name: String,
    icon: String,
}

fn validate_threshold(threshold: Option<i32>, errors: &mut FieldErrors) -> i32 {
    let threshold = threshold.unwrap_or(DEFAULT_ALERT_THRESHOLD);
    if !(1..=100).contains(&threshold) {
        errors.insert("alert_threshold", THRESHOLD_RANGE);
    }
    threshold
}

impl Engine {
    async fn scope_info(&self, scope: BudgetScope) -> ResultEngine<Option<ScopeInfo>> {
        let info = match scope {
            BudgetScope::Category(id) => categories::Entity::find_by_id(id)
                .one(&self.database)
                .await?
                .map(|c| ScopeInfo {
                    name: c.name,
                    icon: c.icon,
                }),
            BudgetScope::Department(id) => departments::Entity::find_by_id(id)
                .one(&self.database)
                .await?
                .map(|d| ScopeInfo {
                    name: d.name,
                    icon: DEPARTMENT_ICON.to_string(),
                }),
        };
        Ok(info)
    }

    /// Sum of expenses in `scope` dated within `from..=to`.
    async fn scope_spend(
        &self,
        scope: BudgetScope,
        from: NaiveDate,
        to: NaiveDate,
        exclude_rejected: bool,
    ) -> ResultEngine<Money> {
        let column = match scope {
            BudgetScope::Category(_) => "category_id",
            BudgetScope::Department(_) => "department_id",
        };
        let status_cond = if exclude_rejected {
            " AND status <> ?"
        } else {
            ""
        };
        let mut values: Vec<sea_orm::Value> = vec![scope.id().into(), from.into(), to.into()];
        if exclude_rejected {
            values.push(ExpenseStatus::Rejected.as_str().into());
        }
        let stmt = Statement::from_sql_and_values(
            self.database.get_database_backend(),
            format!(
                "SELECT COALESCE(SUM(amount_minor), 0) AS sum \
                 FROM expenses \
                 WHERE {column} = ? AND date >= ? AND date <= ?{status_cond}"
            ),
            values,
        );
        let row = self.database.query_one(stmt).await?;
        let sum: i64 = match row {
            Some(row) => row.try_get("", "sum")?,
            None => 0,
        };
        Ok(Money::new(sum))
    }

    async fn budget_for(
        &self,
        scope: BudgetScope,
        month: &str,
    ) -> ResultEngine<Option<budgets::Model>> {
        let query = budgets::Entity::find()
            .filter(budgets::Column::BudgetType.eq(scope.type_str()))
            .filter(budgets::Column::Month.eq(month));
        let query = match scope {
            BudgetScope::Category(id) => query.filter(budgets::Column::CategoryId.eq(id)),
            BudgetScope::Department(id) => query.filter(budgets::Column::DepartmentId.eq(id)),
        };
        Ok(query.one(&self.database).await?)
    }

    /// How adding `cmd.amount` on `cmd.date` would land against the budgets
    /// of the given category and department. Rejected expenses do not count.
    pub async fn check_budget(&self, cmd: BudgetCheckCmd) -> ResultEngine<BudgetCheck> {
        if !cmd.amount.is_positive() {
            return Ok(BudgetCheck {
                status: BudgetCheckStatus::Ok,
                message: Some(INCOMPLETE_DATA.to_string()),
            });
        }
        if cmd.amount.exceeds_limit() {
            return Err(EngineError::InvalidInput(AMOUNT_TOO_LARGE.to_string()));
        }
        let month = aggregation::month_key(cmd.date);
        let Some((from, to)) = aggregation::month_bounds(cmd.date) else {
            return Ok(BudgetCheck::ok());
        };

        let scopes = [
            cmd.category_id.map(BudgetScope::Category),
            cmd.department_id.map(BudgetScope::Department),
        ];

        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        for scope in scopes.into_iter().flatten() {
            let Some(info) = self.scope_info(scope).await? else {
                continue;
            };
            let Some(budget) = self.budget_for(scope, &month).await? else {
                continue;
            };
            let label = match scope {
                BudgetScope::Category(_) => format!("หมวดหมู่ {}", info.name),
                BudgetScope::Department(_) => format!("แผนก {}", info.name),
            };

            let budget_amount = Money::new(budget.amount_minor);
            let projected = self
                .scope_spend(scope, from, to, true)
                .await?
                .checked_add(cmd.amount)
                .ok_or_else(|| EngineError::InvalidInput(TOTAL_OUT_OF_RANGE.to_string()))?;
            let percentage = aggregation::usage_percentage(projected, budget_amount);

            if projected > budget_amount {
                errors.push(format!(
                    "ยอดรวม ({}) เกินงบประมาณของ {label} ({})",
                    projected.grouped(),
                    budget_amount.grouped()
                ));
            } else if percentage >= f64::from(budget.alert_threshold) {
                warnings.push(format!(
                    "ยอดรวม ({}) ใกล้เต็มงบประมาณของ {label} ({percentage:.1}%)",
                    projected.grouped()
                ));
            }
        }

        let check = if !errors.is_empty() {
            BudgetCheck {
                status: BudgetCheckStatus::Error,
                message: Some(errors.join(", ")),
            }
        } else if !warnings.is_empty() {
            BudgetCheck {
                status: BudgetCheckStatus::Warning,
                message: Some(warnings.join(", ")),
            }
        } else {
            BudgetCheck::ok()
        };
        Ok(check)
    }

    /// Creates the budget of a scope for a month. A scope has at most one
    /// budget per month.
    pub async fn create_budget(&self, cmd: BudgetCmd) -> ResultEngine<Budget> {
        let mut errors = FieldErrors::new();
        if aggregation::parse_month(&cmd.month).is_none() {
            errors.insert("month", MONTH_INVALID);
        }
        if !cmd.amount.is_positive() {
            errors.insert("amount", AMOUNT_POSITIVE);
        } else if cmd.amount.exceeds_limit() {
            errors.insert("amount", AMOUNT_TOO_LARGE);
        }
        let alert_threshold = validate_threshold(cmd.alert_threshold, &mut errors);
        match cmd.scope {
            BudgetScope::Category(id) if !self.category_exists(id).await? => {
                errors.insert("category_id", CATEGORY_REQUIRED);
            }
            BudgetScope::Department(id) if !self.department_exists(id).await? => {
                errors.insert("department_id", DEPARTMENT_REQUIRED);
            }
            _ => {}
        }
        errors.into_result()?;

        let (category_id, department_id) = match cmd.scope {
            BudgetScope::Category(id) => (Some(id), None),
            BudgetScope::Department(id) => (None, Some(id)),
        };
        let now = Utc::now();
        let model = budgets::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            budget_type: ActiveValue::Set(cmd.scope.type_str().to_string()),
            category_id: ActiveValue::Set(category_id),
            department_id: ActiveValue::Set(department_id),
            month: ActiveValue::Set(cmd.month),
            amount_minor: ActiveValue::Set(cmd.amount.minor()),
            alert_threshold: ActiveValue::Set(alert_threshold),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        }
        .insert(&self.database)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                EngineError::ConstraintViolation(DUPLICATE_BUDGET.to_string())
            } else {
                err.into()
            }
        })?;
        tracing::info!(budget_id = %model.id, scope = cmd.scope.type_str(), month = %model.month, "budget created");
        Budget::try_from(model)
    }

    /// Changes the amount and threshold. Scope and month are fixed.
    pub async fn update_budget(
        &self,
        id: Uuid,
        amount: Money,
        alert_threshold: Option<i32>,
    ) -> ResultEngine<Budget> {
        let mut errors = FieldErrors::new();
        if !amount.is_positive() {
            errors.insert("amount", AMOUNT_POSITIVE);
        } else if amount.exceeds_limit() {
            errors.insert("amount", AMOUNT_TOO_LARGE);
        }
        let alert_threshold = validate_threshold(alert_threshold, &mut errors);
        errors.into_result()?;

        let model = budgets::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(BUDGET_NOT_FOUND.to_string()))?;
        let mut active: budgets::ActiveModel = model.into();
        active.amount_minor = ActiveValue::Set(amount.minor());
        active.alert_threshold = ActiveValue::Set(alert_threshold);
        active.updated_at = ActiveValue::Set(Utc::now());
        let updated = active.update(&self.database).await?;
        Budget::try_from(updated)
    }

    pub async fn delete_budget(&self, id: Uuid) -> ResultEngine<()> {
        let result = budgets::Entity::delete_by_id(id)
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound(BUDGET_NOT_FOUND.to_string()));
        }
        Ok(())
    }

    /// Budgets of `month` (`YYYY-MM`), newest first, with what was spent in
    /// their scope that month. Every status counts towards `used`.
    pub async fn budgets_with_usage(&self, month: &str) -> ResultEngine<Vec<BudgetUsage>> {
        let first = aggregation::parse_month(month)
            .ok_or_else(|| EngineError::field("month", MONTH_INVALID))?;
        let (from, to) = aggregation::month_bounds(first)
            .ok_or_else(|| EngineError::field("month", MONTH_INVALID))?;

        let rows = budgets::Entity::find()
            .filter(budgets::Column::Month.eq(month))
            .order_by_desc(budgets::Column::CreatedAt)
            .all(&self.database)
            .await?;

        let mut usages = Vec::with_capacity(rows.len());
        for row in rows {
            let budget = Budget::try_from(row)?;
            let used = self.scope_spend(budget.scope, from, to, false).await?;
            let percentage = aggregation::usage_percentage(used, budget.amount);
            let scope_name = self.scope_info(budget.scope).await?.map(|info| info.name);
            usages.push(BudgetUsage {
                status: aggregation::budget_health(percentage, budget.alert_threshold),
                remaining: budget.amount - used,
                percentage,
                used,
                scope_name,
                budget,
            });
        }
        Ok(usages)
    }

    /// Budgets of the month containing `today` that reached their alert
    /// threshold, most used first.
    pub async fn budget_alerts(&self, today: NaiveDate) -> ResultEngine<Vec<BudgetAlert>> {
        let Some((from, to)) = aggregation::month_bounds(today) else {
            return Ok(Vec::new());
        };
        let rows = budgets::Entity::find()
            .filter(budgets::Column::Month.eq(aggregation::month_key(today)))
            .all(&self.database)
            .await?;

        let mut uses = Vec::with_capacity(rows.len());
        for row in rows {
            let budget = Budget::try_from(row)?;
            let info = self.scope_info(budget.scope).await?;
            let (name, icon) = match (info, budget.scope) {
                (Some(info), _) => (info.name, info.icon),
                (None, BudgetScope::Category(_)) => (
                    UNKNOWN_SCOPE.to_string(),
                    categories::DEFAULT_ICON.to_string(),
                ),
                (None, BudgetScope::Department(_)) => {
                    (UNKNOWN_SCOPE.to_string(), DEPARTMENT_ICON.to_string())
                }
            };
            uses.push(BudgetUse {
                budget_id: budget.id,
                scope: budget.scope,
                name,
                icon,
                amount: budget.amount,
                alert_threshold: budget.alert_threshold,
                used: self.scope_spend(budget.scope, from, to, false).await?,
            });
        }
        Ok(aggregation::budget_alerts(uses))
    }
}

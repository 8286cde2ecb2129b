use chrono::{Datelike, Months, NaiveDate};
use sea_orm::{QueryFilter, QueryOrder, QuerySelect, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    BudgetAlert, EngineError, Expense, Money, MonthlyTotal, ResultEngine,
    aggregation::{self, group_totals, monthly_series, percentage_change},
    categories::DEFAULT_ICON,
    expenses,
};

use super::{Engine, ExpenseSummary};

const TOP_CATEGORIES: usize = 5;
const RECENT_EXPENSES: u64 = 5;
/// Months in the trend series, the current one included.
const SERIES_MONTHS: u32 = 12;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category_id: Uuid,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub total: Money,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DepartmentSummary {
    pub department_id: Uuid,
    pub name: String,
    pub total: Money,
    pub count: u64,
}

/// Spending overview as of a given day. All statuses count.
#[derive(Clone, Debug, Serialize)]
pub struct Dashboard {
    /// `YYYY-MM`.
    pub current_month: String,
    pub current_year: i32,
    pub current_month_total: Money,
    pub current_month_count: u64,
    pub previous_month_total: Money,
    pub month_change: f64,
    pub current_year_total: Money,
    pub current_year_count: u64,
    pub previous_year_total: Money,
    pub year_change: f64,
    pub monthly: Vec<MonthlyTotal>,
    pub categories: Vec<CategorySummary>,
    pub top_categories: Vec<CategorySummary>,
    pub category_total: Money,
    pub departments: Vec<DepartmentSummary>,
    pub recent: Vec<ExpenseSummary>,
    pub budget_alerts: Vec<BudgetAlert>,
}

fn out_of_range(today: NaiveDate) -> EngineError {
    EngineError::InvalidInput(format!("date out of range: {today}"))
}

fn sum_between(rows: &[(NaiveDate, Money)], from: NaiveDate, to: NaiveDate) -> (Money, u64) {
    rows.iter()
        .filter(|(date, _)| *date >= from && *date <= to)
        .fold((Money::ZERO, 0), |(total, count), (_, amount)| {
            (total + *amount, count + 1)
        })
}

impl Engine {
    pub async fn dashboard(&self, today: NaiveDate) -> ResultEngine<Dashboard> {
        let (month_start, month_end) =
            aggregation::month_bounds(today).ok_or_else(|| out_of_range(today))?;
        let previous_month =
            aggregation::previous_month(today).ok_or_else(|| out_of_range(today))?;
        let (previous_start, previous_end) =
            aggregation::month_bounds(previous_month).ok_or_else(|| out_of_range(today))?;
        let series_start = month_start
            .checked_sub_months(Months::new(SERIES_MONTHS - 1))
            .ok_or_else(|| out_of_range(today))?;

        let year = today.year();
        let year_bounds = |year: i32| {
            NaiveDate::from_ymd_opt(year, 1, 1).zip(NaiveDate::from_ymd_opt(year, 12, 31))
        };
        let (year_start, year_end) = year_bounds(year).ok_or_else(|| out_of_range(today))?;
        let (previous_year_start, previous_year_end) =
            year_bounds(year - 1).ok_or_else(|| out_of_range(today))?;

        let models = expenses::Entity::find()
            .filter(expenses::Column::Date.gte(previous_year_start))
            .order_by_asc(expenses::Column::Date)
            .all(&self.database)
            .await?;
        let rows: Vec<Expense> = models
            .into_iter()
            .map(Expense::try_from)
            .collect::<ResultEngine<_>>()?;
        let amounts: Vec<(NaiveDate, Money)> = rows.iter().map(|e| (e.date, e.amount)).collect();

        let (current_month_total, current_month_count) =
            sum_between(&amounts, month_start, month_end);
        let (previous_month_total, _) = sum_between(&amounts, previous_start, previous_end);
        let (current_year_total, current_year_count) = sum_between(&amounts, year_start, year_end);
        let (previous_year_total, _) =
            sum_between(&amounts, previous_year_start, previous_year_end);

        let monthly = monthly_series(
            amounts
                .iter()
                .copied()
                .filter(|(date, _)| *date >= series_start),
        );

        let maps = self.lookup_maps().await?;
        let this_month: Vec<&Expense> = rows
            .iter()
            .filter(|e| e.date >= month_start && e.date <= month_end)
            .collect();

        let categories: Vec<CategorySummary> = group_totals(
            this_month
                .iter()
                .filter(|e| maps.categories.contains_key(&e.category_id))
                .map(|e| (e.category_id, e.amount)),
        )
        .into_iter()
        .filter_map(|group| {
            let category = maps.categories.get(&group.key)?;
            let icon = if category.icon.is_empty() {
                DEFAULT_ICON.to_string()
            } else {
                category.icon.clone()
            };
            Some(CategorySummary {
                category_id: group.key,
                name: category.name.clone(),
                icon,
                color: category.color.clone(),
                total: group.total,
                count: group.count,
            })
        })
        .collect();
        let category_total = Money::checked_sum(categories.iter().map(|c| c.total))
            .ok_or_else(|| EngineError::InvalidInput("category total out of range".to_string()))?;
        let top_categories = categories.iter().take(TOP_CATEGORIES).cloned().collect();

        let departments = group_totals(
            this_month
                .iter()
                .filter(|e| maps.departments.contains_key(&e.department_id))
                .map(|e| (e.department_id, e.amount)),
        )
        .into_iter()
        .filter_map(|group| {
            let department = maps.departments.get(&group.key)?;
            Some(DepartmentSummary {
                department_id: group.key,
                name: department.name.clone(),
                total: group.total,
                count: group.count,
            })
        })
        .collect();

        let mut recent = expenses::Entity::find()
            .order_by_desc(expenses::Column::CreatedAt)
            .limit(RECENT_EXPENSES)
            .all(&self.database)
            .await?
            .into_iter()
            .map(|model| Expense::try_from(model).map(|expense| maps.summarize(expense)))
            .collect::<ResultEngine<Vec<_>>>()?;
        self.fill_attachment_types(&mut recent).await?;

        let budget_alerts = self.budget_alerts(today).await?;

        Ok(Dashboard {
            current_month: aggregation::month_key(today),
            current_year: year,
            current_month_total,
            current_month_count,
            previous_month_total,
            month_change: percentage_change(current_month_total, previous_month_total),
            current_year_total,
            current_year_count,
            previous_year_total,
            year_change: percentage_change(current_year_total, previous_year_total),
            monthly,
            categories,
            top_categories,
            category_total,
            departments,
            recent,
            budget_alerts,
        })
    }
}

//! Pure aggregation over expense rows: monthly series, grouped breakdowns,
//! period deltas and budget usage ratios.
//!
//! Nothing here touches the database; `ops` fetches the rows and calls in.

use std::{
    collections::{BTreeMap, HashMap},
    hash::Hash,
};

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use crate::{BudgetHealth, BudgetScope, Money};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MonthlyTotal {
    /// `YYYY-MM`.
    pub month: String,
    pub total: Money,
    pub count: u64,
}

/// Sum and count for one group key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GroupTotal<K> {
    pub key: K,
    pub total: Money,
    pub count: u64,
}

/// `YYYY-MM` of a date.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Parses a `YYYY-MM` month into its first day.
pub fn parse_month(month: &str) -> Option<NaiveDate> {
    let (year, month_num) = month.split_once('-')?;
    if year.len() != 4 || month_num.len() != 2 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let month_num: u32 = month_num.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month_num, 1)
}

/// First and last day (inclusive) of the month containing `date`.
pub fn month_bounds(date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let first = date.with_day(1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    Some((first, last))
}

/// First day of the month before the one containing `date`.
pub fn previous_month(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)?.checked_sub_months(Months::new(1))
}

/// Groups rows by `YYYY-MM`, ascending by month.
pub fn monthly_series(rows: impl IntoIterator<Item = (NaiveDate, Money)>) -> Vec<MonthlyTotal> {
    let mut by_month: BTreeMap<String, (Money, u64)> = BTreeMap::new();
    for (date, amount) in rows {
        let entry = by_month.entry(month_key(date)).or_insert((Money::ZERO, 0));
        entry.0 += amount;
        entry.1 += 1;
    }
    by_month
        .into_iter()
        .map(|(month, (total, count))| MonthlyTotal {
            month,
            total,
            count,
        })
        .collect()
}

/// Groups rows by key, descending by total. Equal totals keep the order in
/// which their key first appeared; a "top N" is a prefix of the result.
pub fn group_totals<K>(rows: impl IntoIterator<Item = (K, Money)>) -> Vec<GroupTotal<K>>
where
    K: Eq + Hash + Clone,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<GroupTotal<K>> = Vec::new();
    for (key, amount) in rows {
        match index.get(&key) {
            Some(&i) => {
                groups[i].total += amount;
                groups[i].count += 1;
            }
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(GroupTotal {
                    key,
                    total: amount,
                    count: 1,
                });
            }
        }
    }
    groups.sort_by(|a, b| b.total.cmp(&a.total));
    groups
}

/// Relative change from `previous` to `current`, in percent.
///
/// A zero baseline yields 100 when anything was spent and 0 otherwise.
pub fn percentage_change(current: Money, previous: Money) -> f64 {
    if previous.is_zero() {
        return if current.is_positive() { 100.0 } else { 0.0 };
    }
    (current.minor() - previous.minor()) as f64 * 100.0 / previous.minor() as f64
}

/// `used * 100 / amount`, or 0 for a zero budget.
pub fn usage_percentage(used: Money, amount: Money) -> f64 {
    if amount.is_zero() {
        return 0.0;
    }
    used.minor() as f64 * 100.0 / amount.minor() as f64
}

pub fn budget_health(percentage: f64, alert_threshold: i32) -> BudgetHealth {
    if percentage >= 100.0 {
        BudgetHealth::Danger
    } else if percentage >= f64::from(alert_threshold) {
        BudgetHealth::Warning
    } else {
        BudgetHealth::Safe
    }
}

/// A budget at or past its alert threshold.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BudgetAlert {
    pub budget_id: Uuid,
    pub scope: BudgetScope,
    pub name: String,
    pub icon: String,
    pub amount: Money,
    pub used: Money,
    pub percentage: f64,
    pub status: BudgetHealth,
}

/// Budget figures before alert filtering.
#[derive(Clone, Debug)]
pub struct BudgetUse {
    pub budget_id: Uuid,
    pub scope: BudgetScope,
    pub name: String,
    pub icon: String,
    pub amount: Money,
    pub alert_threshold: i32,
    pub used: Money,
}

/// Keeps the budgets whose usage reached their threshold, most used first.
pub fn budget_alerts(uses: impl IntoIterator<Item = BudgetUse>) -> Vec<BudgetAlert> {
    let mut alerts: Vec<BudgetAlert> = uses
        .into_iter()
        .filter_map(|usage| {
            let percentage = usage_percentage(usage.used, usage.amount);
            if percentage < f64::from(usage.alert_threshold) {
                return None;
            }
            let status = if percentage >= 100.0 {
                BudgetHealth::Danger
            } else {
                BudgetHealth::Warning
            };
            Some(BudgetAlert {
                budget_id: usage.budget_id,
                scope: usage.scope,
                name: usage.name,
                icon: usage.icon,
                amount: usage.amount,
                used: usage.used,
                percentage,
                status,
            })
        })
        .collect();
    alerts.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
    alerts
}

mod common;

use common::{baht, date, fixture};
use engine::{Actor, BudgetCmd, BudgetScope, ExpenseCmd, LookupRef, MonthlyTotal};

#[tokio::test]
async fn dashboard_summarizes_months_years_and_groups() {
    let fx = fixture().await;
    let actor = Actor::system();
    let expenses = [
        fx.expense(date(2023, 6, 1), baht(1_000), "ปีก่อน"),
        fx.expense(date(2024, 1, 1), baht(100), "ต้นปี"),
        fx.expense(date(2024, 4, 3), baht(250), "เดือนก่อน"),
        fx.expense(date(2024, 5, 2), baht(300), "อาหารกลางวัน"),
        ExpenseCmd::new(date(2024, 5, 10), baht(200), "แท็กซี่", "สมหญิง")
            .category(LookupRef::Name("เดินทาง".to_string()))
            .payment_method(LookupRef::Id(fx.payment_method.id))
            .department(fx.department.id),
    ];
    for cmd in expenses {
        fx.engine.create_expense(cmd, &actor).await.unwrap();
    }
    fx.engine
        .create_budget(BudgetCmd::new(
            BudgetScope::Category(fx.category.id),
            "2024-05",
            baht(350),
        ))
        .await
        .unwrap();

    let dashboard = fx.engine.dashboard(date(2024, 5, 15)).await.unwrap();

    assert_eq!(dashboard.current_month, "2024-05");
    assert_eq!(dashboard.current_year, 2024);
    assert_eq!(dashboard.current_month_total, baht(500));
    assert_eq!(dashboard.current_month_count, 2);
    assert_eq!(dashboard.previous_month_total, baht(250));
    assert_eq!(dashboard.month_change, 100.0);
    assert_eq!(dashboard.current_year_total, baht(850));
    assert_eq!(dashboard.current_year_count, 4);
    assert_eq!(dashboard.previous_year_total, baht(1_000));
    assert_eq!(dashboard.year_change, -15.0);

    let months: Vec<&str> = dashboard.monthly.iter().map(|m| m.month.as_str()).collect();
    assert_eq!(months, vec!["2023-06", "2024-01", "2024-04", "2024-05"]);
    assert_eq!(
        dashboard.monthly.last(),
        Some(&MonthlyTotal {
            month: "2024-05".to_string(),
            total: baht(500),
            count: 2,
        })
    );

    let categories: Vec<(&str, i64)> = dashboard
        .categories
        .iter()
        .map(|c| (c.name.as_str(), c.total.minor()))
        .collect();
    assert_eq!(categories, vec![("อาหาร", 30_000), ("เดินทาง", 20_000)]);
    assert_eq!(dashboard.top_categories.len(), 2);
    assert_eq!(dashboard.category_total, baht(500));
    assert_eq!(dashboard.categories[1].icon, "📦");

    assert_eq!(dashboard.departments.len(), 1);
    assert_eq!(dashboard.departments[0].name, "ฝ่ายขาย");
    assert_eq!(dashboard.departments[0].count, 2);

    assert_eq!(dashboard.recent.len(), 5);
    assert!(dashboard.recent.iter().all(|r| r.department.is_some()));

    assert_eq!(dashboard.budget_alerts.len(), 1);
    assert_eq!(dashboard.budget_alerts[0].name, "อาหาร");
}

#[tokio::test]
async fn empty_dashboard_has_zero_changes() {
    let fx = fixture().await;
    let dashboard = fx.engine.dashboard(date(2024, 1, 15)).await.unwrap();

    assert_eq!(dashboard.current_month_total.minor(), 0);
    assert_eq!(dashboard.month_change, 0.0);
    assert_eq!(dashboard.year_change, 0.0);
    assert!(dashboard.monthly.is_empty());
    assert!(dashboard.categories.is_empty());
    assert!(dashboard.recent.is_empty());
    assert!(dashboard.budget_alerts.is_empty());
}

#[tokio::test]
async fn top_categories_are_the_five_largest() {
    let fx = fixture().await;
    let actor = Actor::system();
    for (index, name) in ["ก", "ข", "ค", "ง", "จ", "ฉ", "ช"].into_iter().enumerate() {
        let cmd = ExpenseCmd::new(date(2024, 5, 1), baht(100 * (index as i64 + 1)), name, "สมชาย")
            .category(LookupRef::Name(name.to_string()))
            .payment_method(LookupRef::Id(fx.payment_method.id))
            .department(fx.department.id);
        fx.engine.create_expense(cmd, &actor).await.unwrap();
    }

    let dashboard = fx.engine.dashboard(date(2024, 5, 31)).await.unwrap();
    assert_eq!(dashboard.categories.len(), 7);
    let top: Vec<&str> = dashboard
        .top_categories
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(top, vec!["ช", "ฉ", "จ", "ง", "ค"]);
    assert_eq!(dashboard.category_total, baht(2_800));
}

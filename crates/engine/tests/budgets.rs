mod common;

use common::{Fixture, baht, date, fixture};
use sea_orm::{ConnectionTrait, Statement};
use engine::{
    Actor, BudgetCheck, BudgetCheckCmd, BudgetCheckStatus, BudgetCmd, BudgetHealth, BudgetScope,
    EngineError, FieldErrors, Money,
};

async fn spend(fx: &Fixture, day: u32, amount: Money) -> uuid::Uuid {
    fx.engine
        .create_expense(
            fx.expense(date(2024, 5, day), amount, "ค่าใช้จ่าย"),
            &Actor::system(),
        )
        .await
        .unwrap()
}

fn check_category(fx: &Fixture, amount: Money) -> BudgetCheckCmd {
    BudgetCheckCmd {
        amount,
        date: date(2024, 5, 20),
        category_id: Some(fx.category.id),
        department_id: None,
    }
}

#[tokio::test]
async fn check_reports_ok_warning_and_error() {
    let fx = fixture().await;
    fx.engine
        .create_budget(BudgetCmd::new(
            BudgetScope::Category(fx.category.id),
            "2024-05",
            baht(1_000),
        ))
        .await
        .unwrap();
    spend(&fx, 3, baht(700)).await;

    let warning = fx.engine.check_budget(check_category(&fx, baht(250))).await.unwrap();
    assert_eq!(warning.status, BudgetCheckStatus::Warning);
    assert_eq!(
        warning.message.as_deref(),
        Some("ยอดรวม (950) ใกล้เต็มงบประมาณของ หมวดหมู่ อาหาร (95.0%)")
    );

    let error = fx.engine.check_budget(check_category(&fx, baht(400))).await.unwrap();
    assert_eq!(error.status, BudgetCheckStatus::Error);
    assert_eq!(
        error.message.as_deref(),
        Some("ยอดรวม (1,100) เกินงบประมาณของ หมวดหมู่ อาหาร (1,000)")
    );

    let ok = fx.engine.check_budget(check_category(&fx, baht(50))).await.unwrap();
    assert_eq!(
        ok,
        BudgetCheck {
            status: BudgetCheckStatus::Ok,
            message: None
        }
    );
}

#[tokio::test]
async fn check_ignores_rejected_and_other_months() {
    let fx = fixture().await;
    fx.engine
        .create_budget(BudgetCmd::new(
            BudgetScope::Category(fx.category.id),
            "2024-05",
            baht(1_000),
        ))
        .await
        .unwrap();
    let rejected = spend(&fx, 3, baht(700)).await;
    fx.engine
        .update_status(rejected, "rejected", None, &Actor::system())
        .await
        .unwrap();
    fx.engine
        .create_expense(
            fx.expense(date(2024, 4, 30), baht(900), "เดือนก่อน"),
            &Actor::system(),
        )
        .await
        .unwrap();

    let check = fx.engine.check_budget(check_category(&fx, baht(500))).await.unwrap();
    assert_eq!(check.status, BudgetCheckStatus::Ok);
}

#[tokio::test]
async fn check_combines_category_and_department_findings() {
    let fx = fixture().await;
    fx.engine
        .create_budget(
            BudgetCmd::new(BudgetScope::Category(fx.category.id), "2024-05", baht(1_000))
                .alert_threshold(50),
        )
        .await
        .unwrap();
    fx.engine
        .create_budget(BudgetCmd::new(
            BudgetScope::Department(fx.department.id),
            "2024-05",
            baht(500),
        ))
        .await
        .unwrap();

    let check = fx
        .engine
        .check_budget(BudgetCheckCmd {
            amount: baht(600),
            date: date(2024, 5, 1),
            category_id: Some(fx.category.id),
            department_id: Some(fx.department.id),
        })
        .await
        .unwrap();
    // Any error wins over warnings; only the error messages are reported.
    assert_eq!(check.status, BudgetCheckStatus::Error);
    assert_eq!(
        check.message.as_deref(),
        Some("ยอดรวม (600) เกินงบประมาณของ แผนก ฝ่ายขาย (500)")
    );
}

#[tokio::test]
async fn check_without_budget_or_amount() {
    let fx = fixture().await;

    let no_budget = fx.engine.check_budget(check_category(&fx, baht(10))).await.unwrap();
    assert_eq!(no_budget.status, BudgetCheckStatus::Ok);
    assert_eq!(no_budget.message, None);

    let incomplete = fx
        .engine
        .check_budget(check_category(&fx, Money::ZERO))
        .await
        .unwrap();
    assert_eq!(incomplete.status, BudgetCheckStatus::Ok);
    assert_eq!(incomplete.message.as_deref(), Some("Incomplete data"));

    let unknown_scope = fx
        .engine
        .check_budget(BudgetCheckCmd {
            category_id: Some(uuid::Uuid::new_v4()),
            ..check_category(&fx, baht(10))
        })
        .await
        .unwrap();
    assert_eq!(unknown_scope.status, BudgetCheckStatus::Ok);
}

#[tokio::test]
async fn duplicate_budget_is_a_constraint_violation() {
    let fx = fixture().await;
    let cmd = BudgetCmd::new(BudgetScope::Category(fx.category.id), "2024-05", baht(1_000));
    let created = fx.engine.create_budget(cmd.clone()).await.unwrap();
    assert_eq!(created.alert_threshold, 80);

    let err = fx.engine.create_budget(cmd).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::ConstraintViolation("มีงบประมาณสำหรับรายการนี้ในเดือนนี้แล้ว".to_string())
    );

    // Same month, other scope and same scope, other month are both fine.
    fx.engine
        .create_budget(BudgetCmd::new(
            BudgetScope::Department(fx.department.id),
            "2024-05",
            baht(1_000),
        ))
        .await
        .unwrap();
    fx.engine
        .create_budget(BudgetCmd::new(
            BudgetScope::Category(fx.category.id),
            "2024-06",
            baht(1_000),
        ))
        .await
        .unwrap();
}

#[tokio::test]
async fn create_validates_fields() {
    let fx = fixture().await;
    let err = fx
        .engine
        .create_budget(
            BudgetCmd::new(BudgetScope::Category(uuid::Uuid::new_v4()), "2024-5", Money::ZERO)
                .alert_threshold(120),
        )
        .await
        .unwrap_err();
    let EngineError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(errors.get("month"), Some("รูปแบบเดือนไม่ถูกต้อง (YYYY-MM)"));
    assert_eq!(errors.get("amount"), Some("จำนวนเงินต้องมากกว่า 0"));
    assert_eq!(
        errors.get("alert_threshold"),
        Some("เปอร์เซ็นต์แจ้งเตือนต้องอยู่ระหว่าง 1-100")
    );
    assert_eq!(errors.get("category_id"), Some("กรุณาเลือกหมวดหมู่"));

    let err = fx
        .engine
        .create_budget(BudgetCmd::new(
            BudgetScope::Department(uuid::Uuid::new_v4()),
            "2024-05",
            baht(1),
        ))
        .await
        .unwrap_err();
    let mut expected = FieldErrors::new();
    expected.insert("department_id", "กรุณาเลือกแผนก");
    assert_eq!(err, EngineError::Validation(expected));
}

#[tokio::test]
async fn update_and_delete() {
    let fx = fixture().await;
    let budget = fx
        .engine
        .create_budget(BudgetCmd::new(
            BudgetScope::Category(fx.category.id),
            "2024-05",
            baht(1_000),
        ))
        .await
        .unwrap();

    let updated = fx
        .engine
        .update_budget(budget.id, baht(2_000), Some(90))
        .await
        .unwrap();
    assert_eq!(updated.amount, baht(2_000));
    assert_eq!(updated.alert_threshold, 90);
    assert_eq!(updated.scope, budget.scope);
    assert_eq!(updated.month, "2024-05");

    assert!(matches!(
        fx.engine.update_budget(budget.id, Money::ZERO, None).await,
        Err(EngineError::Validation(_))
    ));

    fx.engine.delete_budget(budget.id).await.unwrap();
    assert_eq!(
        fx.engine.delete_budget(budget.id).await.unwrap_err(),
        EngineError::KeyNotFound("ไม่พบงบประมาณ".to_string())
    );
    assert!(matches!(
        fx.engine.update_budget(budget.id, baht(1), None).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn usage_counts_every_status() {
    let fx = fixture().await;
    fx.engine
        .create_budget(BudgetCmd::new(
            BudgetScope::Category(fx.category.id),
            "2024-05",
            baht(1_000),
        ))
        .await
        .unwrap();
    fx.engine
        .create_budget(BudgetCmd::new(
            BudgetScope::Department(fx.department.id),
            "2024-05",
            baht(400),
        ))
        .await
        .unwrap();
    spend(&fx, 2, baht(300)).await;
    let rejected = spend(&fx, 3, baht(200)).await;
    fx.engine
        .update_status(rejected, "rejected", None, &Actor::system())
        .await
        .unwrap();

    let usages = fx.engine.budgets_with_usage("2024-05").await.unwrap();
    assert_eq!(usages.len(), 2);

    let category = usages
        .iter()
        .find(|u| matches!(u.budget.scope, BudgetScope::Category(_)))
        .unwrap();
    assert_eq!(category.scope_name.as_deref(), Some("อาหาร"));
    assert_eq!(category.used, baht(500));
    assert_eq!(category.remaining, baht(500));
    assert_eq!(category.percentage, 50.0);
    assert_eq!(category.status, BudgetHealth::Safe);

    let department = usages
        .iter()
        .find(|u| matches!(u.budget.scope, BudgetScope::Department(_)))
        .unwrap();
    assert_eq!(department.scope_name.as_deref(), Some("ฝ่ายขาย"));
    assert_eq!(department.remaining, baht(-100));
    assert_eq!(department.status, BudgetHealth::Danger);

    assert!(fx.engine.budgets_with_usage("2024-06").await.unwrap().is_empty());
    assert!(matches!(
        fx.engine.budgets_with_usage("May 2024").await,
        Err(EngineError::Validation(_))
    ));
}

#[tokio::test]
async fn alerts_list_budgets_past_their_threshold() {
    let fx = fixture().await;
    let category_budget = fx
        .engine
        .create_budget(BudgetCmd::new(
            BudgetScope::Category(fx.category.id),
            "2024-05",
            baht(1_000),
        ))
        .await
        .unwrap();
    let department_budget = fx
        .engine
        .create_budget(
            BudgetCmd::new(BudgetScope::Department(fx.department.id), "2024-05", baht(2_000))
                .alert_threshold(50),
        )
        .await
        .unwrap();
    spend(&fx, 2, baht(850)).await;

    let alerts = fx.engine.budget_alerts(date(2024, 5, 15)).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].budget_id, category_budget.id);
    assert_eq!(alerts[0].name, "อาหาร");
    assert_eq!(alerts[0].icon, "📦");
    assert_eq!(alerts[0].status, BudgetHealth::Warning);

    spend(&fx, 4, baht(300)).await;
    let alerts = fx.engine.budget_alerts(date(2024, 5, 15)).await.unwrap();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].budget_id, category_budget.id);
    assert_eq!(alerts[0].status, BudgetHealth::Danger);
    assert_eq!(alerts[1].budget_id, department_budget.id);
    assert_eq!(alerts[1].icon, "🏢");
    assert_eq!(alerts[1].status, BudgetHealth::Warning);

    assert!(fx.engine.budget_alerts(date(2024, 6, 1)).await.unwrap().is_empty());
}

async fn category_budget(fx: &Fixture) {
    fx.engine
        .create_budget(BudgetCmd::new(
            BudgetScope::Category(fx.category.id),
            "2024-05",
            baht(1_000),
        ))
        .await
        .unwrap();
}

/// Writes the stored amount directly, bypassing validation.
async fn set_amount_column(fx: &Fixture, id: uuid::Uuid, value: sea_orm::Value) {
    let result = fx
        .db
        .execute(Statement::from_sql_and_values(
            fx.db.get_database_backend(),
            "UPDATE expenses SET amount_minor = ? WHERE id = ?",
            [value, id.into()],
        ))
        .await
        .unwrap();
    assert_eq!(result.rows_affected(), 1);
}

#[tokio::test]
async fn check_rejects_totals_that_do_not_fit() {
    let fx = fixture().await;
    category_budget(&fx).await;
    let id = spend(&fx, 3, baht(10)).await;
    set_amount_column(&fx, id, (i64::MAX - 10).into()).await;

    let err = fx
        .engine
        .check_budget(check_category(&fx, baht(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let err = fx
        .engine
        .check_budget(check_category(&fx, Money::new(Money::MAX.minor() + 1)))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidInput("จำนวนเงินเกินวงเงินสูงสุดที่รองรับ".to_string())
    );
}

#[tokio::test]
async fn check_surfaces_unreadable_sums() {
    let fx = fixture().await;
    category_budget(&fx).await;
    let id = spend(&fx, 3, baht(10)).await;
    set_amount_column(&fx, id, 1.5_f64.into()).await;

    let err = fx
        .engine
        .check_budget(check_category(&fx, baht(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Database(_)));
}

#[tokio::test]
async fn budget_amounts_above_the_limit_are_rejected() {
    let fx = fixture().await;
    let too_large = Money::new(Money::MAX.minor() + 1);
    let err = fx
        .engine
        .create_budget(BudgetCmd::new(
            BudgetScope::Category(fx.category.id),
            "2024-05",
            too_large,
        ))
        .await
        .unwrap_err();
    let EngineError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(errors.get("amount"), Some("จำนวนเงินเกินวงเงินสูงสุดที่รองรับ"));
}

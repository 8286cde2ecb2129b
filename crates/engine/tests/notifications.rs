mod common;

use common::{engine_with_db, fixture};
use engine::{EngineError, NewNotification, NotificationKind};

#[tokio::test]
async fn roles_see_their_own_and_untargeted_notifications() {
    let (engine, _, _) = engine_with_db().await;
    engine
        .notify(NewNotification::new(NotificationKind::Info, "admin", "a").target_role("admin"))
        .await
        .unwrap();
    engine
        .notify(NewNotification::new(NotificationKind::Success, "user", "u").target_role("user"))
        .await
        .unwrap();
    engine
        .notify(NewNotification::new(NotificationKind::Warning, "everyone", "e").link("/recurring"))
        .await
        .unwrap();

    let titles = |list: Vec<engine::Notification>| {
        let mut titles: Vec<String> = list.into_iter().map(|n| n.title).collect();
        titles.sort();
        titles
    };
    assert_eq!(
        titles(engine.list_notifications(Some("admin"), 50).await.unwrap()),
        vec!["admin", "everyone"]
    );
    assert_eq!(
        titles(engine.list_notifications(Some("user"), 50).await.unwrap()),
        vec!["everyone", "user"]
    );
    assert_eq!(engine.list_notifications(None, 50).await.unwrap().len(), 3);
    assert_eq!(engine.list_notifications(None, 2).await.unwrap().len(), 2);
    assert_eq!(engine.unread_notifications(Some("admin")).await.unwrap(), 2);
}

#[tokio::test]
async fn mark_read_updates_only_the_given_ids() {
    let (engine, _, _) = engine_with_db().await;
    for title in ["one", "two", "three"] {
        engine
            .notify(NewNotification::new(NotificationKind::Info, title, "m"))
            .await
            .unwrap();
    }
    let all = engine.list_notifications(None, 50).await.unwrap();
    let ids: Vec<uuid::Uuid> = all.iter().take(2).map(|n| n.id).collect();

    assert_eq!(engine.mark_notifications_read(&[]).await.unwrap(), 0);
    assert_eq!(engine.unread_notifications(None).await.unwrap(), 3);

    assert_eq!(engine.mark_notifications_read(&ids).await.unwrap(), 2);
    assert_eq!(engine.unread_notifications(None).await.unwrap(), 1);

    let read: Vec<bool> = engine
        .list_notifications(None, 50)
        .await
        .unwrap()
        .into_iter()
        .filter(|n| ids.contains(&n.id))
        .map(|n| n.is_read)
        .collect();
    assert_eq!(read, vec![true, true]);
}

#[tokio::test]
async fn lookups_are_listed_by_name() {
    let fx = fixture().await;
    fx.engine.find_or_create_category("เครื่องเขียน").await.unwrap();
    fx.engine.create_department("บัญชี").await.unwrap();

    let lookups = fx.engine.lookups().await.unwrap();
    let categories: Vec<&str> = lookups.categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(categories, vec!["อาหาร", "เครื่องเขียน"]);
    let departments: Vec<&str> = lookups.departments.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(departments, vec!["บัญชี", "ฝ่ายขาย"]);
    assert_eq!(lookups.payment_methods.len(), 1);

    let again = fx.engine.find_or_create_category("อาหาร").await.unwrap();
    assert_eq!(again.id, fx.category.id);
}

#[tokio::test]
async fn department_names_are_required_and_unique() {
    let fx = fixture().await;

    let err = fx.engine.create_department("  ").await.unwrap_err();
    let EngineError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(errors.get("name"), Some("กรุณาระบุชื่อแผนก"));

    assert_eq!(
        fx.engine.create_department("ฝ่ายขาย").await.unwrap_err(),
        EngineError::ConstraintViolation("มีแผนกนี้อยู่แล้ว".to_string())
    );
    assert!(matches!(
        fx.engine.find_or_create_payment_method(" ").await,
        Err(EngineError::InvalidInput(_))
    ));
}

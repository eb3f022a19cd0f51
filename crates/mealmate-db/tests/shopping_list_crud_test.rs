//! Integration tests for shopping list queries.

use mealmate_db::models::{Category, ShoppingListItem};
use mealmate_db::queries::shopping_lists;
use mealmate_test_utils::{create_test_db_with_user, drop_test_db, seed_meal_plan};

fn item(name: &str, quantity: f64, unit: &str, category: Category) -> ShoppingListItem {
    ShoppingListItem {
        name: name.to_owned(),
        quantity,
        unit: unit.to_owned(),
        category,
        checked: false,
    }
}

#[tokio::test]
async fn upsert_replaces_existing_list() {
    let (pool, db_name, user_id) = create_test_db_with_user().await;
    let plan = seed_meal_plan(&pool, user_id, "Meal Plan - 3/2/2025").await;

    let first = shopping_lists::upsert_shopping_list(
        &pool,
        user_id,
        plan.id,
        "Shopping List - Meal Plan - 3/2/2025",
        &[item("Tomato", 2.0, "pcs", Category::Produce)],
    )
    .await
    .unwrap();
    assert_eq!(first.items.0.len(), 1);

    let second = shopping_lists::upsert_shopping_list(
        &pool,
        user_id,
        plan.id,
        "Shopping List - Meal Plan - 3/2/2025",
        &[
            item("Milk", 1.0, "cup", Category::DairyEggs),
            item("Bread", 1.0, "loaf", Category::Bakery),
        ],
    )
    .await
    .unwrap();
    assert_eq!(second.id, first.id, "upsert keeps one list per plan");
    assert_eq!(second.items.0.len(), 2);

    let fetched = shopping_lists::get_shopping_list_for_plan(&pool, plan.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.items.0[0].name, "Milk");
    assert_eq!(fetched.items.0[0].category, Category::DairyEggs);

    let all = shopping_lists::list_shopping_lists_for_user(&pool, user_id)
        .await
        .unwrap();
    assert_eq!(all.len(), 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn update_items_persists_checked_state() {
    let (pool, db_name, user_id) = create_test_db_with_user().await;
    let plan = seed_meal_plan(&pool, user_id, "Meal Plan").await;

    let list = shopping_lists::upsert_shopping_list(
        &pool,
        user_id,
        plan.id,
        "Shopping List - Meal Plan",
        &[item("Chicken breast", 1.5, "lb", Category::MeatSeafood)],
    )
    .await
    .unwrap();

    let mut items = list.items.0.clone();
    items[0].checked = true;
    let updated = shopping_lists::update_items(&pool, list.id, &items).await.unwrap();
    assert!(updated.items.0[0].checked);
    assert!(updated.updated_at >= list.updated_at);

    assert!(
        shopping_lists::update_items(&pool, uuid::Uuid::new_v4(), &items)
            .await
            .is_err()
    );

    pool.close().await;
    drop_test_db(&db_name).await;
}

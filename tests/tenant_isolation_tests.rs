//! Tenant isolation through the repository layer and the HTTP surface.
//!
//! SQLite has no row-level security, so everything here exercises the
//! explicit restaurant filter every repository applies.

use anyhow::Result;
use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use serde_json::json;

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{
    create_category, create_menu_item, create_restaurant, create_user, request, send,
    setup_test_db, test_state, token_for,
};

use restaurant_platform::error::RepositoryError;
use restaurant_platform::models::restaurant::RestaurantStatus;
use restaurant_platform::repositories::menu_category::NewCategory;
use restaurant_platform::repositories::menu_item::{
    MenuItemChanges, MenuItemFilter, NewMenuItem,
};
use restaurant_platform::repositories::order::{NewOrder, NewOrderLine};
use restaurant_platform::models::reservation::ReservationStatus;
use restaurant_platform::repositories::reservation::{Booker, NewReservation, ReservationChanges};
use restaurant_platform::repositories::{
    MenuCategoryRepository, MenuItemRepository, OrderRepository, ReservationRepository,
    UserRepository,
};
use restaurant_platform::server::create_app;
use restaurant_platform::tenancy::{Role, TenantId};

fn tenant(id: i64) -> TenantId {
    TenantId::new(id).unwrap()
}

#[tokio::test]
async fn menu_items_of_other_restaurants_are_invisible() -> Result<()> {
    let db = setup_test_db().await?;
    let a = create_restaurant(&db, "alpha", RestaurantStatus::Active).await?;
    let b = create_restaurant(&db, "bravo", RestaurantStatus::Active).await?;
    let category = create_category(&db, a.id, "Mains").await?;
    let item = create_menu_item(&db, a.id, category.id, "Secret Stew", 1500).await?;

    let from_b = MenuItemRepository::new(&db, tenant(b.id));
    assert!(from_b.find(item.id).await?.is_none());
    assert!(matches!(
        from_b.get(item.id).await,
        Err(RepositoryError::NotFound("menu item"))
    ));
    assert!(from_b.list(MenuItemFilter::default()).await?.is_empty());
    assert!(from_b.find_many(&[item.id]).await?.is_empty());

    let from_a = MenuItemRepository::new(&db, tenant(a.id));
    assert_eq!(from_a.get(item.id).await?.name, "Secret Stew");
    Ok(())
}

#[tokio::test]
async fn cross_tenant_writes_behave_as_not_found() -> Result<()> {
    let db = setup_test_db().await?;
    let a = create_restaurant(&db, "alpha", RestaurantStatus::Active).await?;
    let b = create_restaurant(&db, "bravo", RestaurantStatus::Active).await?;
    let category = create_category(&db, a.id, "Mains").await?;
    let item = create_menu_item(&db, a.id, category.id, "Stew", 1500).await?;

    let from_b = MenuItemRepository::new(&db, tenant(b.id));
    let update = from_b
        .update(
            item.id,
            MenuItemChanges {
                price_cents: Some(1),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(update, Err(RepositoryError::NotFound(_))));
    assert!(matches!(
        from_b.delete(item.id).await,
        Err(RepositoryError::NotFound(_))
    ));
    assert!(matches!(
        MenuCategoryRepository::new(&db, tenant(b.id))
            .delete(category.id)
            .await,
        Err(RepositoryError::NotFound(_))
    ));

    let unchanged = MenuItemRepository::new(&db, tenant(a.id)).get(item.id).await?;
    assert_eq!(unchanged.price_cents, 1500);
    Ok(())
}

#[tokio::test]
async fn menu_item_cannot_use_category_of_another_restaurant() -> Result<()> {
    let db = setup_test_db().await?;
    let a = create_restaurant(&db, "alpha", RestaurantStatus::Active).await?;
    let b = create_restaurant(&db, "bravo", RestaurantStatus::Active).await?;
    let foreign = create_category(&db, a.id, "Mains").await?;

    let result = MenuItemRepository::new(&db, tenant(b.id))
        .create(NewMenuItem {
            category_id: foreign.id,
            name: "Stolen".to_string(),
            description: None,
            price_cents: 100,
            image_url: None,
            display_order: 0,
            is_available: true,
        })
        .await;
    assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn category_names_are_unique_per_restaurant_only() -> Result<()> {
    let db = setup_test_db().await?;
    let a = create_restaurant(&db, "alpha", RestaurantStatus::Active).await?;
    let b = create_restaurant(&db, "bravo", RestaurantStatus::Active).await?;
    create_category(&db, a.id, "Desserts").await?;
    create_category(&db, b.id, "Desserts").await?;

    let duplicate = MenuCategoryRepository::new(&db, tenant(a.id))
        .create(NewCategory {
            name: "Desserts".to_string(),
            description: None,
            display_order: 1,
            is_active: true,
        })
        .await;
    assert!(matches!(duplicate, Err(RepositoryError::Conflict(_))));
    Ok(())
}

#[tokio::test]
async fn same_email_may_exist_in_different_restaurants() -> Result<()> {
    let db = setup_test_db().await?;
    let a = create_restaurant(&db, "alpha", RestaurantStatus::Active).await?;
    let b = create_restaurant(&db, "bravo", RestaurantStatus::Active).await?;

    create_user(&db, a.id, "guest@mail.test", Role::Client).await?;
    create_user(&db, b.id, "guest@mail.test", Role::Client).await?;
    let duplicate = create_user(&db, a.id, "guest@mail.test", Role::Staff).await;
    assert!(duplicate.is_err());

    let users_a = UserRepository::new(&db, tenant(a.id)).list().await?;
    assert_eq!(users_a.len(), 1);
    assert!(users_a.iter().all(|user| user.restaurant_id == a.id));
    Ok(())
}

#[tokio::test]
async fn orders_cannot_reference_foreign_menu_items() -> Result<()> {
    let db = setup_test_db().await?;
    let a = create_restaurant(&db, "alpha", RestaurantStatus::Active).await?;
    let b = create_restaurant(&db, "bravo", RestaurantStatus::Active).await?;
    let category = create_category(&db, a.id, "Mains").await?;
    let item = create_menu_item(&db, a.id, category.id, "Stew", 1500).await?;

    let result = OrderRepository::new(&db, tenant(b.id))
        .create(NewOrder {
            user_id: None,
            notes: None,
            lines: vec![NewOrderLine {
                menu_item_id: item.id,
                quantity: 1,
                notes: None,
            }],
        })
        .await;
    assert!(matches!(result, Err(RepositoryError::NotFound("menu item"))));

    let order = OrderRepository::new(&db, tenant(a.id))
        .create(NewOrder {
            user_id: None,
            notes: None,
            lines: vec![NewOrderLine {
                menu_item_id: item.id,
                quantity: 2,
                notes: None,
            }],
        })
        .await?;
    assert_eq!(order.order.total_cents, 3000);
    assert!(order.items.iter().all(|line| line.restaurant_id == a.id));
    assert!(matches!(
        OrderRepository::new(&db, tenant(b.id))
            .get_with_items(order.order.id)
            .await,
        Err(RepositoryError::NotFound("order"))
    ));
    Ok(())
}

#[tokio::test]
async fn table_availability_is_checked_per_restaurant() -> Result<()> {
    let db = setup_test_db().await?;
    let a = create_restaurant(&db, "alpha", RestaurantStatus::Active).await?;
    let b = create_restaurant(&db, "bravo", RestaurantStatus::Active).await?;
    let start = Utc::now() + Duration::days(1);
    let booking = |offset_minutes: i64| NewReservation {
        booker: Booker::Guest {
            name: "Grace".to_string(),
            email: "grace@mail.test".to_string(),
            phone: None,
        },
        table_number: 4,
        start_time: (start + Duration::minutes(offset_minutes)).into(),
        end_time: (start + Duration::minutes(offset_minutes + 90)).into(),
        number_of_guests: 2,
        notes: None,
    };

    ReservationRepository::new(&db, tenant(a.id))
        .create(booking(0))
        .await?;
    let overlapping = ReservationRepository::new(&db, tenant(a.id))
        .create(booking(30))
        .await;
    assert!(matches!(overlapping, Err(RepositoryError::Conflict(_))));

    let adjacent = ReservationRepository::new(&db, tenant(a.id))
        .create(booking(90))
        .await;
    assert!(adjacent.is_ok());

    let other_restaurant = ReservationRepository::new(&db, tenant(b.id))
        .create(booking(30))
        .await;
    assert!(other_restaurant.is_ok());
    Ok(())
}

#[tokio::test]
async fn cancelled_reservation_cannot_be_reinstated_over_a_new_booking() -> Result<()> {
    let db = setup_test_db().await?;
    let restaurant = create_restaurant(&db, "alpha", RestaurantStatus::Active).await?;
    let reservations = ReservationRepository::new(&db, tenant(restaurant.id));
    let start = Utc::now() + Duration::days(2);
    let booking = |name: &str| NewReservation {
        booker: Booker::Guest {
            name: name.to_string(),
            email: format!("{}@mail.test", name.to_lowercase()),
            phone: None,
        },
        table_number: 4,
        start_time: start.into(),
        end_time: (start + Duration::minutes(90)).into(),
        number_of_guests: 2,
        notes: None,
    };

    let first = reservations.create(booking("Ada")).await?;
    let cancel = ReservationChanges {
        status: Some(ReservationStatus::Cancelled),
        notes: None,
    };
    reservations.update(first.id, cancel).await?;
    let second = reservations.create(booking("Grace")).await?;

    let reinstated = reservations
        .update(
            first.id,
            ReservationChanges {
                status: Some(ReservationStatus::Confirmed),
                notes: None,
            },
        )
        .await;
    assert!(matches!(reinstated, Err(RepositoryError::Conflict(_))));
    assert_eq!(
        reservations.get(first.id).await?.status,
        ReservationStatus::Cancelled.as_str()
    );

    // Confirming a booking that never left the slot is not a conflict.
    let confirmed = reservations
        .update(
            second.id,
            ReservationChanges {
                status: Some(ReservationStatus::Confirmed),
                notes: Some("window seat".to_string()),
            },
        )
        .await?;
    assert_eq!(confirmed.status, ReservationStatus::Confirmed.as_str());

    // Once the slot frees up again the first booking may come back.
    reservations
        .update(
            second.id,
            ReservationChanges {
                status: Some(ReservationStatus::Cancelled),
                notes: None,
            },
        )
        .await?;
    let restored = reservations
        .update(
            first.id,
            ReservationChanges {
                status: Some(ReservationStatus::Pending),
                notes: None,
            },
        )
        .await?;
    assert_eq!(restored.status, ReservationStatus::Pending.as_str());
    Ok(())
}

#[tokio::test]
async fn token_for_one_restaurant_cannot_read_another() -> Result<()> {
    let db = setup_test_db().await?;
    let a = create_restaurant(&db, "alpha", RestaurantStatus::Active).await?;
    let b = create_restaurant(&db, "bravo", RestaurantStatus::Active).await?;
    let category = create_category(&db, b.id, "Mains").await?;
    let item = create_menu_item(&db, b.id, category.id, "Signature Dish", 2500).await?;
    let staff_a = create_user(&db, a.id, "staff@alpha.test", Role::Staff).await?;

    let state = test_state(db);
    let token = token_for(&state, &staff_a)?;
    let app = create_app(state);

    let (status, body) = send(
        &app,
        request(
            Method::GET,
            &format!("/api/v1/menu-items/{}", item.id),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!body.to_string().contains("Signature Dish"));

    let (status, body) = send(
        &app,
        request(Method::GET, "/api/v1/menu-items", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _) = send(
        &app,
        request(
            Method::PUT,
            &format!("/api/v1/categories/{}", category.id),
            Some(&token),
            Some(json!({ "name": "Hijacked" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn admin_cannot_touch_users_of_another_restaurant() -> Result<()> {
    let db = setup_test_db().await?;
    let a = create_restaurant(&db, "alpha", RestaurantStatus::Active).await?;
    let b = create_restaurant(&db, "bravo", RestaurantStatus::Active).await?;
    let admin_a = create_user(&db, a.id, "admin@alpha.test", Role::Admin).await?;
    let staff_b = create_user(&db, b.id, "staff@bravo.test", Role::Staff).await?;

    let state = test_state(db);
    let token = token_for(&state, &admin_a)?;
    let app = create_app(state);

    for (method, uri) in [
        (Method::GET, format!("/api/v1/users/{}", staff_b.id)),
        (Method::DELETE, format!("/api/v1/users/{}", staff_b.id)),
    ] {
        let (status, _) = send(&app, request(method, &uri, Some(&token), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    let (status, body) = send(&app, request(Method::GET, "/api/v1/users", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    let emails: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|user| user["email"].as_str())
        .collect();
    assert_eq!(emails, vec!["admin@alpha.test"]);
    Ok(())
}

use actix_web::{http::StatusCode, test::TestRequest, web};
use chrono::Utc;
use kitchen_engine::{
    cart_objects::MergeSummary,
    db_types::{CartItem, CartLine, CartOwner, Money, SystemSettings},
    CartApi,
};
use mockall::predicate::{always, eq};
use serde_json::Value;

use super::{
    helpers::{customer, send, with_guest_session, with_token, CUSTOMER_ID, GUEST_SESSION},
    mocks::MockKitchenDb,
};

fn carts(db: MockKitchenDb) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(CartApi::new(db)));
    }
}

fn cart_item(line_id: i64, menu_item_id: i64, unit_price: i64, quantity: i64) -> CartItem {
    CartItem {
        line_id,
        menu_item_id,
        name_en: format!("Dish {menu_item_id}"),
        name_ar: format!("طبق {menu_item_id}"),
        unit_price: Money::from(unit_price),
        quantity,
        notes: None,
        is_available: true,
    }
}

#[actix_web::test]
async fn new_guest_session() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send(TestRequest::post().uri("/api/cart/session"), carts(MockKitchenDb::new())).await;
    assert_eq!(status, StatusCode::CREATED);
    let json: Value = serde_json::from_str(&body).unwrap();
    let session = json["session_id"].as_str().unwrap();
    assert!(CartApi::<MockKitchenDb>::is_valid_guest_session(session));
}

#[actix_web::test]
async fn guests_need_a_session() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send(TestRequest::get().uri("/api/cart"), carts(MockKitchenDb::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("kitchen_cart_session"), "{body}");
}

#[actix_web::test]
async fn malformed_guest_sessions_are_rejected() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/api/cart").insert_header(("kitchen_cart_session", "'; drop table --"));
    let (status, _) = send(req, carts(MockKitchenDb::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn guest_cart() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_fetch_cart()
        .with(eq(CartOwner::Guest(GUEST_SESSION.to_string())))
        .times(1)
        .returning(|_| Ok(vec![cart_item(1, 10, 120, 2), cart_item(2, 11, 45, 1)]));
    let (status, body) = send(with_guest_session(TestRequest::get().uri("/api/cart")), carts(db)).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["subtotal"], 285);
    assert_eq!(json["total_items"], 3);
    assert_eq!(json["items"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn signed_in_users_always_get_their_own_cart() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_fetch_cart().with(eq(CartOwner::User(CUSTOMER_ID))).times(1).returning(|_| Ok(vec![]));
    let req = with_guest_session(with_token(TestRequest::get().uri("/api/cart"), &customer()));
    let (status, body) = send(req, carts(db)).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["subtotal"], 0);
}

#[actix_web::test]
async fn add_to_cart() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    let owner = CartOwner::Guest(GUEST_SESSION.to_string());
    db.expect_fetch_settings().returning(|| Ok(SystemSettings::default()));
    db.expect_add_to_cart()
        .withf(|_, line, max| line.menu_item_id == 10 && line.quantity == 3 && *max == 20)
        .times(1)
        .returning(|_, line, _| {
            Ok(CartLine {
                id: 1,
                user_id: None,
                session_id: Some(GUEST_SESSION.to_string()),
                menu_item_id: line.menu_item_id,
                quantity: line.quantity,
                notes: line.notes,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
        });
    db.expect_fetch_cart().with(eq(owner)).returning(|_| Ok(vec![cart_item(1, 10, 120, 3)]));
    let req = with_guest_session(TestRequest::post().uri("/api/cart"))
        .set_json(serde_json::json!({ "menu_item_id": 10, "quantity": 3, "notes": "extra tahini" }));
    let (status, body) = send(req, carts(db)).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["subtotal"], 360);
}

#[actix_web::test]
async fn quantities_above_the_maximum_are_rejected() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_fetch_settings().returning(|| Ok(SystemSettings::default()));
    let req = with_guest_session(TestRequest::post().uri("/api/cart"))
        .set_json(serde_json::json!({ "menu_item_id": 10, "quantity": 21 }));
    let (status, _) = send(req, carts(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn merging_needs_a_signed_in_user() {
    let _ = env_logger::try_init().ok();
    let req = with_guest_session(TestRequest::post().uri("/api/cart/merge"));
    let (status, _) = send(req, carts(MockKitchenDb::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn merging_needs_a_guest_session() {
    let _ = env_logger::try_init().ok();
    let req = with_token(TestRequest::post().uri("/api/cart/merge"), &customer());
    let (status, _) = send(req, carts(MockKitchenDb::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn merge_guest_cart_after_login() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_fetch_settings().returning(|| Ok(SystemSettings::default()));
    db.expect_merge_guest_cart()
        .with(eq(GUEST_SESSION), eq(CUSTOMER_ID), eq(20))
        .times(1)
        .returning(|_, _, _| Ok(MergeSummary { combined: 1, moved: 1, dropped_units: 2 }));
    db.expect_fetch_cart()
        .with(eq(CartOwner::User(CUSTOMER_ID)))
        .returning(|_| Ok(vec![cart_item(5, 10, 120, 20), cart_item(6, 11, 45, 1)]));
    let req = with_guest_session(with_token(TestRequest::post().uri("/api/cart/merge"), &customer()));
    let (status, body) = send(req, carts(db)).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["total_items"], 21);
}

#[actix_web::test]
async fn lines_in_someone_elses_cart_are_not_found() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_fetch_settings().returning(|| Ok(SystemSettings::default()));
    db.expect_update_cart_line()
        .with(eq(CartOwner::User(CUSTOMER_ID)), eq(99), always(), eq(20))
        .returning(|_, id, _, _| Err(kitchen_engine::CartError::LineNotFound(id)));
    let req =
        with_token(TestRequest::put().uri("/api/cart/99"), &customer()).set_json(serde_json::json!({ "quantity": 2 }));
    let (status, _) = send(req, carts(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn clear_cart() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_clear_cart().with(eq(CartOwner::User(CUSTOMER_ID))).times(1).returning(|_| Ok(2));
    let req = with_token(TestRequest::delete().uri("/api/cart"), &customer());
    let (status, body) = send(req, carts(db)).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert!(json["items"].as_array().unwrap().is_empty());
}

use actix_web::{http::StatusCode, test::TestRequest, web};
use chrono::Utc;
use kitchen_engine::{
    cart_objects::ReorderSummary,
    db_types::{
        CartLine,
        CartOwner,
        Money,
        OrderLine,
        OrderStatusType,
        PaymentMethod,
        PaymentStatus,
        SystemSettings,
    },
    order_objects::OrderWithPayment,
    CartError,
    OrderFlowApi,
};
use mockall::predicate::eq;
use serde_json::Value;

use super::{
    helpers::{admin, customer, order, payment, send, with_token, CUSTOMER_ID},
    mocks::MockKitchenDb,
};

fn orders(db: MockKitchenDb) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(OrderFlowApi::new(db)));
    }
}

#[actix_web::test]
async fn my_orders_need_a_token() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send(TestRequest::get().uri("/api/orders"), orders(MockKitchenDb::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. No access token was provided."}"#);
}

#[actix_web::test]
async fn forged_tokens_are_rejected() {
    let _ = env_logger::try_init().ok();
    let mut token = super::helpers::token_for(&customer());
    token.replace_range(token.len() - 10..token.len() - 5, "00000");
    let req = TestRequest::get().uri("/api/orders").insert_header(("kitchen_access_token", token));
    let (status, body) = send(req, orders(MockKitchenDb::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Access token is invalid"), "{body}");
}

#[actix_web::test]
async fn my_orders() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_fetch_orders_for_user().with(eq(CUSTOMER_ID)).times(1).returning(|user_id| {
        Ok(vec![order(2, user_id, OrderStatusType::New), order(1, user_id, OrderStatusType::Delivered)])
    });
    let (status, body) = send(with_token(TestRequest::get().uri("/api/orders"), &customer()), orders(db)).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json[0]["id"], 2);
    assert_eq!(json[0]["status"], "New");
    assert_eq!(json[1]["status"], "Delivered");
}

#[actix_web::test]
async fn checkout_is_refused_while_ordering_is_disabled() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_fetch_settings().returning(|| Ok(SystemSettings { ordering_enabled: false, ..Default::default() }));
    let req = with_token(TestRequest::post().uri("/api/orders"), &customer()).set_json(checkout_json());
    let (status, body) = send(req, orders(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("not accepting orders"), "{body}");
}

#[actix_web::test]
async fn checkout_with_a_fee_outside_the_range() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_fetch_settings().returning(|| Ok(SystemSettings::default()));
    let mut json = checkout_json();
    json["delivery_fee"] = serde_json::json!(100);
    let req = with_token(TestRequest::post().uri("/api/orders"), &customer()).set_json(json);
    let (status, _) = send(req, orders(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn place_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_fetch_settings().returning(|| Ok(SystemSettings::default()));
    db.expect_create_order_from_cart()
        .withf(|user_id, params| {
            *user_id == CUSTOMER_ID &&
                params.delivery_fee == Money::from(40) &&
                params.payment_method == PaymentMethod::VodafoneCash &&
                params.advance_percentage == 20 &&
                params.delivery_address == "12 Tahrir St, Cairo"
        })
        .times(1)
        .returning(|user_id, _| {
            Ok(OrderWithPayment {
                order: order(11, user_id, OrderStatusType::New),
                lines: vec![order_line(11, 10, 2)],
                payment: payment(21, 11, PaymentStatus::Pending),
            })
        });
    let req = with_token(TestRequest::post().uri("/api/orders"), &customer()).set_json(checkout_json());
    let (status, body) = send(req, orders(db)).await;
    assert_eq!(status, StatusCode::CREATED);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["id"], 11);
    assert_eq!(json["total"], 290);
    assert_eq!(json["advance_amount"], 58);
    assert_eq!(json["payment"]["status"], "Pending");
    assert_eq!(json["lines"][0]["quantity"], 2);
}

#[actix_web::test]
async fn other_customers_orders_are_off_limits() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_fetch_order().with(eq(5)).returning(|id| Ok(Some(order(id, 99, OrderStatusType::New))));
    let (status, _) = send(with_token(TestRequest::get().uri("/api/orders/5"), &customer()), orders(db)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn admins_can_see_any_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_fetch_order().with(eq(5)).returning(|id| Ok(Some(order(id, 99, OrderStatusType::New))));
    db.expect_fetch_order_lines().with(eq(5)).returning(|id| Ok(vec![order_line(id, 10, 1)]));
    db.expect_fetch_payment_for_order().with(eq(5)).returning(|id| Ok(Some(payment(21, id, PaymentStatus::Pending))));
    let (status, body) = send(with_token(TestRequest::get().uri("/api/orders/5"), &admin()), orders(db)).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["user_id"], 99);
    assert_eq!(json["payment"]["id"], 21);
}

#[actix_web::test]
async fn missing_orders() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_fetch_order().with(eq(404)).returning(|_| Ok(None));
    let (status, _) = send(with_token(TestRequest::get().uri("/api/orders/404"), &customer()), orders(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn customer_cancels_own_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_fetch_order().with(eq(5)).returning(|id| Ok(Some(order(id, CUSTOMER_ID, OrderStatusType::New))));
    db.expect_update_order_status()
        .with(eq(5), eq(OrderStatusType::New), eq(OrderStatusType::Cancelled))
        .times(1)
        .returning(|id, _, to| Ok(order(id, CUSTOMER_ID, to)));
    let req = with_token(TestRequest::put().uri("/api/orders/5/status"), &customer())
        .set_json(serde_json::json!({ "status": "Cancelled" }));
    let (status, body) = send(req, orders(db)).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "Cancelled");
}

#[actix_web::test]
async fn customers_cannot_advance_orders() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_fetch_order().with(eq(5)).returning(|id| Ok(Some(order(id, CUSTOMER_ID, OrderStatusType::Confirmed))));
    let req = with_token(TestRequest::put().uri("/api/orders/5/status"), &customer())
        .set_json(serde_json::json!({ "status": "Preparing" }));
    let (status, _) = send(req, orders(db)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn dispatched_orders_cannot_be_cancelled() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_fetch_order().with(eq(5)).returning(|id| Ok(Some(order(id, CUSTOMER_ID, OrderStatusType::OnTheWay))));
    let req = with_token(TestRequest::put().uri("/api/orders/5/status"), &customer())
        .set_json(serde_json::json!({ "status": "Cancelled" }));
    let (status, _) = send(req, orders(db)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn nobody_confirms_an_order_through_the_status_route() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_fetch_order().with(eq(5)).returning(|id| Ok(Some(order(id, CUSTOMER_ID, OrderStatusType::New))));
    let req = with_token(TestRequest::put().uri("/api/orders/5/status"), &admin())
        .set_json(serde_json::json!({ "status": "Confirmed" }));
    let (status, _) = send(req, orders(db)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn reorder_skips_what_cannot_be_added() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_fetch_order().with(eq(5)).returning(|id| Ok(Some(order(id, CUSTOMER_ID, OrderStatusType::Delivered))));
    db.expect_fetch_settings().returning(|| Ok(SystemSettings::default()));
    db.expect_fetch_order_lines().with(eq(5)).returning(|id| Ok(vec![order_line(id, 10, 2), order_line(id, 12, 1)]));
    db.expect_add_to_cart()
        .withf(|owner, _, max| *owner == CartOwner::User(CUSTOMER_ID) && *max == 20)
        .times(2)
        .returning(|_, line, _| match line.menu_item_id {
            12 => Err(CartError::MenuItemUnavailable(12)),
            _ => Ok(CartLine {
                id: 1,
                user_id: Some(CUSTOMER_ID),
                session_id: None,
                menu_item_id: line.menu_item_id,
                quantity: line.quantity,
                notes: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }),
        });
    let req = with_token(TestRequest::post().uri("/api/orders/5/reorder"), &customer());
    let (status, body) = send(req, orders(db)).await;
    assert_eq!(status, StatusCode::OK);
    let summary: ReorderSummary = serde_json::from_str(&body).unwrap();
    assert_eq!(summary.added, vec![10]);
    assert_eq!(summary.skipped, vec![12]);
}

#[actix_web::test]
async fn admin_order_search() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_search_orders()
        .withf(|q| q.status == Some(vec![OrderStatusType::New, OrderStatusType::Confirmed]) && q.user_id == Some(7))
        .times(1)
        .returning(|_| Ok(vec![order(3, CUSTOMER_ID, OrderStatusType::Confirmed)]));
    let req = with_token(TestRequest::get().uri("/api/admin/orders?status=New,Confirmed&user_id=7"), &admin());
    let (status, body) = send(req, orders(db)).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn admin_order_search_with_an_unknown_status() {
    let _ = env_logger::try_init().ok();
    let req = with_token(TestRequest::get().uri("/api/admin/orders?status=Lost"), &admin());
    let (status, _) = send(req, orders(MockKitchenDb::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn customers_cannot_search_all_orders() {
    let _ = env_logger::try_init().ok();
    let req = with_token(TestRequest::get().uri("/api/admin/orders"), &customer());
    let (status, _) = send(req, orders(MockKitchenDb::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn blank_admin_notes_are_cleared() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_update_admin_notes()
        .with(eq(5), eq(None))
        .times(1)
        .returning(|id, _| Ok(order(id, CUSTOMER_ID, OrderStatusType::Preparing)));
    let req = with_token(TestRequest::put().uri("/api/admin/orders/5/notes"), &admin())
        .set_json(serde_json::json!({ "admin_notes": "   " }));
    let (status, _) = send(req, orders(db)).await;
    assert_eq!(status, StatusCode::OK);
}

fn checkout_json() -> Value {
    serde_json::json!({
        "delivery_address": "  12 Tahrir St, Cairo ",
        "payment_method": "VodafoneCash"
    })
}

fn order_line(order_id: i64, menu_item_id: i64, quantity: i64) -> OrderLine {
    OrderLine {
        id: order_id * 100 + menu_item_id,
        order_id,
        menu_item_id,
        name_en: format!("Dish {menu_item_id}"),
        name_ar: format!("طبق {menu_item_id}"),
        unit_price: Money::from(125),
        quantity,
        notes: None,
    }
}

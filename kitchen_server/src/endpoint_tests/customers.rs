use actix_web::{http::StatusCode, test::TestRequest, web};
use kitchen_engine::{
    db_types::{CustomerSummary, Money, OrderStatusType, User},
    AccountApi,
    OrderFlowApi,
};
use mockall::predicate::eq;
use serde_json::Value;

use super::{
    helpers::{admin, customer, order, send, with_token, ADMIN_ID, CUSTOMER_ID},
    mocks::MockKitchenDb,
};

/// Registers the account and order APIs on two mocks. `accounts` answers the user lookups, `orders` the order lookups.
fn customer_apis(accounts: MockKitchenDb, orders: MockKitchenDb) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(AccountApi::new(accounts)))
            .app_data(web::Data::new(OrderFlowApi::new(orders)));
    }
}

fn summary(user: User, order_count: i64, total_spent: i64) -> CustomerSummary {
    CustomerSummary { user, order_count, total_spent: Money::from(total_spent) }
}

#[actix_web::test]
async fn admin_lists_customers() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_fetch_customers().times(1).returning(|| {
        let newer = User { id: 8, name: "Karim".into(), email: "karim@example.com".into(), ..customer() };
        Ok(vec![summary(newer, 0, 0), summary(customer(), 3, 580)])
    });
    let req = with_token(TestRequest::get().uri("/api/admin/customers"), &admin());
    let (status, body) = send(req, customer_apis(db, MockKitchenDb::new())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let json: Value = serde_json::from_str(&body).unwrap();
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["email"], "karim@example.com");
    assert_eq!(list[1]["id"], CUSTOMER_ID);
    assert_eq!(list[1]["order_count"], 3);
    assert_eq!(list[1]["total_spent"], 580);
    assert!(list[1].get("password_hash").is_none());
}

#[actix_web::test]
async fn customers_cannot_list_customers() {
    let _ = env_logger::try_init().ok();
    let req = with_token(TestRequest::get().uri("/api/admin/customers"), &customer());
    let (status, _) = send(req, customer_apis(MockKitchenDb::new(), MockKitchenDb::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn admin_views_a_customer_with_orders() {
    let _ = env_logger::try_init().ok();
    let mut accounts = MockKitchenDb::new();
    accounts.expect_fetch_user().with(eq(CUSTOMER_ID)).times(1).returning(|_| Ok(Some(customer())));
    let mut orders = MockKitchenDb::new();
    orders.expect_fetch_orders_for_user().with(eq(CUSTOMER_ID)).times(1).returning(|user_id| {
        Ok(vec![order(12, user_id, OrderStatusType::New), order(10, user_id, OrderStatusType::Delivered)])
    });
    let req = with_token(TestRequest::get().uri(&format!("/api/admin/customers/{CUSTOMER_ID}")), &admin());
    let (status, body) = send(req, customer_apis(accounts, orders)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["email"], "mona@example.com");
    assert_eq!(json["orders"][0]["id"], 12);
    assert_eq!(json["orders"][1]["status"], "Delivered");
}

#[actix_web::test]
async fn admins_are_not_customers() {
    let _ = env_logger::try_init().ok();
    for (id, user) in [(ADMIN_ID, Some(admin())), (404, None)] {
        let mut accounts = MockKitchenDb::new();
        accounts.expect_fetch_user().with(eq(id)).times(1).returning(move |_| Ok(user.clone()));
        let req = with_token(TestRequest::get().uri(&format!("/api/admin/customers/{id}")), &admin());
        let (status, body) = send(req, customer_apis(accounts, MockKitchenDb::new())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Customer not found"), "{body}");
    }
}

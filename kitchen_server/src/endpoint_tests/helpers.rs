use actix_web::{body, http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::{Duration, TimeZone, Utc};
use kitchen_engine::db_types::{
    MenuItem,
    Money,
    Order,
    OrderStatusType,
    Payment,
    PaymentMethod,
    PaymentStatus,
    User,
};
use log::debug;

use super::mocks::MockKitchenDb;
use crate::{
    auth::{TokenIssuer, ACCESS_TOKEN_HEADER, CART_SESSION_HEADER},
    config::AuthConfig,
    middleware::JwtMiddlewareFactory,
    server::configure_routes,
};

pub const CUSTOMER_ID: i64 = 7;
pub const ADMIN_ID: i64 = 1;
pub const GUEST_SESSION: &str = "guestsession0001";

// DO NOT re-use this secret anywhere.
pub fn test_issuer() -> TokenIssuer {
    TokenIssuer::new(&AuthConfig::new("endpoint-tests-only-secret-0123456789", Duration::hours(1)))
}

pub fn customer() -> User {
    User {
        id: CUSTOMER_ID,
        name: "Mona".into(),
        email: "mona@example.com".into(),
        phone: Some("01001234567".into()),
        password_hash: "$argon2id$not-a-real-hash".into(),
        is_admin: false,
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
    }
}

pub fn admin() -> User {
    User { id: ADMIN_ID, name: "Chef".into(), email: "chef@example.com".into(), is_admin: true, ..customer() }
}

pub fn token_for(user: &User) -> String {
    test_issuer().issue_token(user).expect("Failed to sign token")
}

pub fn with_token(req: TestRequest, user: &User) -> TestRequest {
    req.insert_header((ACCESS_TOKEN_HEADER, token_for(user)))
}

pub fn with_guest_session(req: TestRequest) -> TestRequest {
    req.insert_header((CART_SESSION_HEADER, GUEST_SESSION))
}

/// Sends the request through the full route table and the access token middleware. `data` must register the APIs
/// that the route under test needs, built on a [`MockKitchenDb`].
///
/// Errors raised by middleware are converted into responses, the way the HTTP server does.
pub async fn send<F>(req: TestRequest, data: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let issuer = test_issuer();
    let app = App::new()
        .wrap(JwtMiddlewareFactory::new(issuer.clone()))
        .app_data(web::Data::new(issuer))
        .configure(data)
        .configure(configure_routes::<MockKitchenDb>);
    let service = test::init_service(app).await;
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            debug!("Request failed in middleware: {e}");
            let res = e.error_response();
            let status = res.status();
            let body = body::to_bytes(res.into_body()).await.unwrap_or_default();
            (status, String::from_utf8_lossy(&body).into_owned())
        },
    }
}

pub fn menu_item(id: i64, price: i64, is_available: bool) -> MenuItem {
    let at = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
    MenuItem {
        id,
        name_en: format!("Dish {id}"),
        name_ar: format!("طبق {id}"),
        description_en: None,
        description_ar: None,
        category: Some("Mains".into()),
        price: Money::from(price),
        is_available,
        image_urls: vec![],
        created_at: at,
        updated_at: at,
    }
}

pub fn order(id: i64, user_id: i64, status: OrderStatusType) -> Order {
    let at = Utc.with_ymd_and_hms(2024, 6, 2, 19, 30, 0).unwrap();
    Order {
        id,
        user_id,
        subtotal: Money::from(250),
        delivery_fee: Money::from(40),
        total: Money::from(290),
        advance_amount: Money::from(58),
        delivery_address: "12 Tahrir St, Cairo".into(),
        notes: None,
        admin_notes: None,
        status,
        created_at: at,
        updated_at: at,
    }
}

pub fn payment(id: i64, order_id: i64, status: PaymentStatus) -> Payment {
    let at = Utc.with_ymd_and_hms(2024, 6, 2, 19, 30, 0).unwrap();
    Payment {
        id,
        order_id,
        method: PaymentMethod::VodafoneCash,
        amount: Money::from(58),
        status,
        proof_ref: None,
        rejection_reason: None,
        transaction_ref: None,
        reviewed_by: None,
        reviewed_at: None,
        created_at: at,
        updated_at: at,
    }
}

use std::sync::{Arc, Mutex};

use actix_web::{http::StatusCode, test::TestRequest, web};
use chrono::Utc;
use kitchen_engine::{db_types::User, AccountApi};
use mockall::predicate::eq;
use serde_json::Value;

use super::{
    helpers::{customer, send, test_issuer, with_token, CUSTOMER_ID},
    mocks::MockKitchenDb,
};

fn accounts(db: MockKitchenDb) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(AccountApi::new(db)));
    }
}

fn registration_json() -> Value {
    serde_json::json!({
        "name": " Mona ",
        "email": "Mona@Example.com",
        "password": "molokhia-fan",
        "phone": "01001234567"
    })
}

/// A mock that stores the single registered user, so that a later login can find it.
fn single_user_db() -> MockKitchenDb {
    let stored: Arc<Mutex<Option<User>>> = Arc::new(Mutex::new(None));
    let mut db = MockKitchenDb::new();
    let lookup = Arc::clone(&stored);
    db.expect_fetch_user_by_email().returning(move |email| {
        Ok(lookup.lock().unwrap().as_ref().filter(|u| u.email == email).cloned())
    });
    db.expect_insert_user().times(1).returning(move |new_user| {
        let user = User {
            id: CUSTOMER_ID,
            name: new_user.name,
            email: new_user.email,
            phone: new_user.phone,
            password_hash: new_user.password_hash,
            is_admin: new_user.is_admin,
            created_at: Utc::now(),
        };
        *stored.lock().unwrap() = Some(user.clone());
        Ok(user)
    });
    db
}

#[actix_web::test]
async fn register_issues_a_token() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/auth/register").set_json(registration_json());
    let (status, body) = send(req, accounts(single_user_db())).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["user"]["email"], "mona@example.com");
    assert_eq!(json["user"]["name"], "Mona");
    assert_eq!(json["user"]["is_admin"], false);
    assert!(json["user"].get("password_hash").is_none());
    let claims = test_issuer().validate_token(json["access_token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.user_id, CUSTOMER_ID);
    assert!(!claims.is_admin);
}

#[actix_web::test]
async fn register_then_login() {
    let _ = env_logger::try_init().ok();
    let db = single_user_db();
    let api = AccountApi::new(db);
    let user = api
        .register(serde_json::from_value(registration_json()).unwrap())
        .await
        .expect("Registration should succeed");
    assert_ne!(user.password_hash, "molokhia-fan");
    let data = move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::new(api));
    };
    let req = TestRequest::post()
        .uri("/auth/login")
        .set_json(serde_json::json!({ "email": "MONA@example.com ", "password": "molokhia-fan" }));
    let (status, body) = send(req, data).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["user"]["id"], CUSTOMER_ID);
    assert!(json["access_token"].as_str().is_some());
}

#[actix_web::test]
async fn login_with_the_wrong_password() {
    let _ = env_logger::try_init().ok();
    let api = AccountApi::new(single_user_db());
    api.register(serde_json::from_value(registration_json()).unwrap()).await.unwrap();
    let data = move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::new(api));
    };
    let req = TestRequest::post()
        .uri("/auth/login")
        .set_json(serde_json::json!({ "email": "mona@example.com", "password": "mahshi-fan" }));
    let (status, body) = send(req, data).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Invalid email or password"), "{body}");
}

#[actix_web::test]
async fn login_with_an_unknown_email() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_fetch_user_by_email().with(eq("nobody@example.com")).returning(|_| Ok(None));
    let req = TestRequest::post()
        .uri("/auth/login")
        .set_json(serde_json::json!({ "email": "nobody@example.com", "password": "whatever1" }));
    let (status, body) = send(req, accounts(db)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Invalid email or password"), "{body}");
}

#[actix_web::test]
async fn emails_can_only_register_once() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_fetch_user_by_email().with(eq("mona@example.com")).returning(|_| Ok(Some(customer())));
    let req = TestRequest::post().uri("/auth/register").set_json(registration_json());
    let (status, _) = send(req, accounts(db)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn short_passwords_are_rejected() {
    let _ = env_logger::try_init().ok();
    let mut json = registration_json();
    json["password"] = serde_json::json!("short");
    let req = TestRequest::post().uri("/auth/register").set_json(json);
    let (status, body) = send(req, accounts(MockKitchenDb::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("at least 8 characters"), "{body}");
}

#[actix_web::test]
async fn me() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_fetch_user().with(eq(CUSTOMER_ID)).returning(|_| Ok(Some(customer())));
    let (status, body) = send(with_token(TestRequest::get().uri("/api/auth/me"), &customer()), accounts(db)).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["email"], "mona@example.com");
    assert!(json.get("password_hash").is_none());
}

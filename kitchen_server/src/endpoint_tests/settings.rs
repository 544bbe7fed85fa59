use actix_web::{http::StatusCode, test::TestRequest, web};
use kitchen_engine::{
    db_types::{Money, SystemSettings},
    SettingsApi,
    SettingsError,
};
use serde_json::Value;

use super::{
    helpers::{admin, customer, send, with_token},
    mocks::MockKitchenDb,
};

fn settings(db: MockKitchenDb) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(SettingsApi::new(db)));
    }
}

#[actix_web::test]
async fn ordering_status_is_public() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_fetch_settings().times(1).returning(|| Ok(SystemSettings::default()));
    let (status, body) = send(TestRequest::get().uri("/api/ordering-status"), settings(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"ordering_enabled":true}"#);
}

#[actix_web::test]
async fn admin_toggles_ordering() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_toggle_ordering().times(1).returning(|| Ok(false));
    let req = with_token(TestRequest::post().uri("/api/admin/toggle-ordering"), &admin());
    let (status, body) = send(req, settings(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"ordering_enabled":false}"#);
}

#[actix_web::test]
async fn customers_cannot_touch_settings() {
    let _ = env_logger::try_init().ok();
    let req = with_token(TestRequest::get().uri("/api/admin/settings"), &customer());
    let (status, _) = send(req, settings(MockKitchenDb::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let req = with_token(TestRequest::post().uri("/api/admin/toggle-ordering"), &customer());
    let (status, _) = send(req, settings(MockKitchenDb::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn admin_reads_settings() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_fetch_settings().returning(|| Ok(SystemSettings::default()));
    let req = with_token(TestRequest::get().uri("/api/admin/settings"), &admin());
    let (status, body) = send(req, settings(db)).await;
    assert_eq!(status, StatusCode::OK);
    let settings: SystemSettings = serde_json::from_str(&body).unwrap();
    assert_eq!(settings, SystemSettings::default());
}

#[actix_web::test]
async fn admin_updates_settings() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_update_settings()
        .withf(|u| u.advance_percentage == Some(50) && u.delivery_fee_max == Some(Money::from(100)))
        .times(1)
        .returning(|u| Ok(u.apply_to(&SystemSettings::default())));
    let req = with_token(TestRequest::put().uri("/api/admin/settings"), &admin())
        .set_json(serde_json::json!({ "advance_percentage": 50, "delivery_fee_max": 100 }));
    let (status, body) = send(req, settings(db)).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["advance_percentage"], 50);
    assert_eq!(json["delivery_fee_max"], 100);
    assert_eq!(json["delivery_fee_min"], 40);
}

#[actix_web::test]
async fn invalid_settings_are_rejected() {
    let _ = env_logger::try_init().ok();
    let mut db = MockKitchenDb::new();
    db.expect_update_settings()
        .returning(|_| Err(SettingsError::InvalidSettings("delivery_fee_min is above delivery_fee_max".into())));
    let req = with_token(TestRequest::put().uri("/api/admin/settings"), &admin())
        .set_json(serde_json::json!({ "delivery_fee_min": 500 }));
    let (status, body) = send(req, settings(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("delivery_fee_min"), "{body}");
}

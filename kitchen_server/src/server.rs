use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use kitchen_engine::{
    proof_storage::LocalProofStorage,
    AccountApi,
    AccountManagement,
    CartApi,
    CartManagement,
    CatalogApi,
    CatalogManagement,
    OrderFlowApi,
    OrderManagement,
    SettingsApi,
    SettingsManagement,
    SqliteDatabase,
};
use log::*;

use crate::{
    auth::TokenIssuer,
    config::{AdminConfig, ServerConfig},
    errors::ServerError,
    middleware::JwtMiddlewareFactory,
    routes::*,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    }
    if let Some(admin) = &config.bootstrap_admin {
        bootstrap_admin(&db, admin).await?;
    }
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Makes sure the configured admin account exists, so that a fresh install can be managed at all.
async fn bootstrap_admin(db: &SqliteDatabase, admin: &AdminConfig) -> Result<(), ServerError> {
    let api = AccountApi::new(db.clone());
    let user = api
        .ensure_admin(&admin.name, &admin.email, admin.password.reveal())
        .await
        .map_err(|e| ServerError::InitializeError(format!("Could not create the admin account. {e}")))?;
    info!("👤️ Admin account #{} ({}) is ready", user.id, user.email);
    Ok(())
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let storage = LocalProofStorage::new(&config.upload_dir, config.max_upload_bytes)
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("💻️ Proofs of payment will be stored in {}", config.upload_dir.display());
    let signer = TokenIssuer::new(&config.auth);
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(JwtMiddlewareFactory::new(signer.clone()))
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("kitchen::access_log"))
            .app_data(web::Data::new(OrderFlowApi::new(db.clone())))
            .app_data(web::Data::new(CartApi::new(db.clone())))
            .app_data(web::Data::new(CatalogApi::new(db.clone())))
            .app_data(web::Data::new(AccountApi::new(db.clone())))
            .app_data(web::Data::new(SettingsApi::new(db.clone())))
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(signer.clone()))
            .configure(configure_routes::<SqliteDatabase>)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers every route, along with extractor settings that turn malformed bodies and queries into JSON errors.
///
/// The APIs, proof storage and token issuer must be supplied as app data by the caller.
pub fn configure_routes<B>(cfg: &mut web::ServiceConfig)
where B: CatalogManagement + CartManagement + OrderManagement + AccountManagement + SettingsManagement + 'static {
    let api_scope = web::scope("/api")
        // Auth
        .service(MeRoute::<B>::new())
        // Menu. `/menu/available` must come before `/menu/{id}`
        .service(MenuRoute::<B>::new())
        .service(AvailableMenuRoute::<B>::new())
        .service(MenuItemRoute::<B>::new())
        .service(OrderingStatusRoute::<B>::new())
        // Cart
        .service(new_cart_session)
        .service(GetCartRoute::<B>::new())
        .service(AddToCartRoute::<B>::new())
        .service(MergeCartRoute::<B>::new())
        .service(UpdateCartLineRoute::<B>::new())
        .service(RemoveCartLineRoute::<B>::new())
        .service(ClearCartRoute::<B>::new())
        // Orders
        .service(PlaceOrderRoute::<B>::new())
        .service(MyOrdersRoute::<B>::new())
        .service(OrderByIdRoute::<B>::new())
        .service(UpdateOrderStatusRoute::<B>::new())
        .service(ReorderRoute::<B>::new())
        // Payments. `/payments/methods` must come before `/payments/{id}`
        .service(payment_methods)
        .service(PaymentByIdRoute::<B>::new())
        .service(UploadProofRoute::<B>::new())
        .service(PaymentProofRoute::<B>::new())
        .service(ConfirmPaymentRoute::<B>::new())
        .service(RejectPaymentRoute::<B>::new())
        // Admin
        .service(SearchOrdersRoute::<B>::new())
        .service(UpdateAdminNotesRoute::<B>::new())
        .service(PendingPaymentsRoute::<B>::new())
        .service(SearchPaymentsRoute::<B>::new())
        .service(AddMenuItemRoute::<B>::new())
        .service(UpdateMenuItemRoute::<B>::new())
        .service(DeleteMenuItemRoute::<B>::new())
        .service(ToggleMenuItemRoute::<B>::new())
        .service(AddMenuImageRoute::<B>::new())
        .service(RemoveMenuImageRoute::<B>::new())
        .service(CustomersRoute::<B>::new())
        .service(CustomerRoute::<B>::new())
        .service(GetSettingsRoute::<B>::new())
        .service(UpdateSettingsRoute::<B>::new())
        .service(ToggleOrderingRoute::<B>::new());
    cfg.app_data(
        web::JsonConfig::default().error_handler(|e, _| ServerError::InvalidRequestBody(e.to_string()).into()),
    )
    .app_data(web::QueryConfig::default().error_handler(|e, _| ServerError::ValidationError(e.to_string()).into()))
    .service(health)
    .service(RegisterRoute::<B>::new())
    .service(LoginRoute::<B>::new())
    .service(api_scope);
}

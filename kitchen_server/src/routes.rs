//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate function. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpResponse, Responder};
use futures::StreamExt;
use kitchen_engine::{
    account_objects::{Credentials, Registration},
    db_types::{CartLineUpdate, MenuItemUpdate, NewCartLine, NewMenuItem, PaymentMethod, SettingsUpdate},
    order_objects::{NewOrderRequest, OrderQueryFilter, PaymentQueryFilter},
    proof_storage::{content_type_for, LocalProofStorage, ProofStorageError, ProofUpload},
    traits::{AccountManagement, CartManagement, CatalogManagement, OrderManagement, SettingsManagement},
    AccountApi,
    CartApi,
    CatalogApi,
    OrderFlowApi,
    SettingsApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    auth::{CartIdentity, GuestSession, JwtClaims, Role, TokenIssuer},
    data_objects::{
        AdminNotesRequest,
        CartSessionResponse,
        ConfirmPaymentRequest,
        ConfirmationResult,
        CustomerDetail,
        ImageUrlRequest,
        JsonResponse,
        LoginResponse,
        OrderSearchParams,
        OrderingStatus,
        PaymentMethodInfo,
        PaymentSearchParams,
        RejectPaymentRequest,
        StatusChangeRequest,
    },
    errors::ServerError,
};

/// The multipart field that carries the proof of payment.
pub const PROOF_FIELD: &str = "proof";

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+ where requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(register => Post "/auth/register" impl AccountManagement);
/// Creates a customer account and signs the new customer in.
///
/// The response carries an access token that must be sent in the `kitchen_access_token` header on subsequent
/// requests.
pub async fn register<B: AccountManagement>(
    body: web::Json<Registration>,
    api: web::Data<AccountApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received registration request");
    let user = api.register(body.into_inner()).await?;
    let access_token = signer.issue_token(&user)?;
    debug!("💻️ Registered user #{} and issued an access token", user.id);
    Ok(HttpResponse::Created().json(LoginResponse { access_token, user }))
}

route!(login => Post "/auth/login" impl AccountManagement);
/// Checks an email and password and issues an access token. The token is valid for a fixed period and does NOT
/// refresh.
pub async fn login<B: AccountManagement>(
    body: web::Json<Credentials>,
    api: web::Data<AccountApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received login request");
    let user = api.authenticate(body.into_inner()).await?;
    let access_token = signer.issue_token(&user)?;
    debug!("💻️ Issued access token for user #{}", user.id);
    Ok(HttpResponse::Ok().json(LoginResponse { access_token, user }))
}

route!(me => Get "/auth/me" impl AccountManagement);
pub async fn me<B: AccountManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET me for user #{}", claims.user_id);
    let user = api.user(claims.user_id).await?;
    Ok(HttpResponse::Ok().json(user))
}

//----------------------------------------------   Menu  ----------------------------------------------------
route!(menu => Get "/menu" impl CatalogManagement);
/// The full menu, including items that are switched off.
pub async fn menu<B: CatalogManagement>(api: web::Data<CatalogApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET menu");
    let items = api.menu().await?;
    Ok(HttpResponse::Ok().json(items))
}

route!(available_menu => Get "/menu/available" impl CatalogManagement);
pub async fn available_menu<B: CatalogManagement>(
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET available menu");
    let items = api.available_menu().await?;
    Ok(HttpResponse::Ok().json(items))
}

route!(menu_item => Get "/menu/{id}" impl CatalogManagement);
pub async fn menu_item<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let item = api.menu_item(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(item))
}

route!(add_menu_item => Post "/admin/menu" impl CatalogManagement where requires [Role::Admin]);
pub async fn add_menu_item<B: CatalogManagement>(
    body: web::Json<NewMenuItem>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let item = api.add_menu_item(body.into_inner()).await?;
    info!("💻️ Menu item #{} ({}) added", item.id, item.name_en);
    Ok(HttpResponse::Created().json(item))
}

route!(update_menu_item => Put "/admin/menu/{id}" impl CatalogManagement where requires [Role::Admin]);
pub async fn update_menu_item<B: CatalogManagement>(
    path: web::Path<i64>,
    body: web::Json<MenuItemUpdate>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let item = api.update_menu_item(id, body.into_inner()).await?;
    debug!("💻️ Menu item #{id} updated");
    Ok(HttpResponse::Ok().json(item))
}

route!(delete_menu_item => Delete "/admin/menu/{id}" impl CatalogManagement where requires [Role::Admin]);
pub async fn delete_menu_item<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    api.remove_menu_item(id).await?;
    info!("💻️ Menu item #{id} deleted");
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Menu item #{id} deleted"))))
}

route!(toggle_menu_item => Post "/admin/menu/{id}/toggle" impl CatalogManagement where requires [Role::Admin]);
pub async fn toggle_menu_item<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let item = api.toggle_availability(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(item))
}

route!(add_menu_image => Post "/admin/menu/{id}/images" impl CatalogManagement where requires [Role::Admin]);
/// Adds an image URL to a menu item. Adding a URL the item already has changes nothing.
pub async fn add_menu_image<B: CatalogManagement>(
    path: web::Path<i64>,
    body: web::Json<ImageUrlRequest>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let item = api.add_image(path.into_inner(), &body.image_url).await?;
    Ok(HttpResponse::Ok().json(item))
}

route!(remove_menu_image => Delete "/admin/menu/{id}/images" impl CatalogManagement where requires [Role::Admin]);
pub async fn remove_menu_image<B: CatalogManagement>(
    path: web::Path<i64>,
    body: web::Json<ImageUrlRequest>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let item = api.remove_image(path.into_inner(), &body.image_url).await?;
    Ok(HttpResponse::Ok().json(item))
}

//----------------------------------------------   Cart  ----------------------------------------------------
/// Hands out a fresh guest cart session id. Guests send it back in the `kitchen_cart_session` header.
#[post("/cart/session")]
pub async fn new_cart_session() -> impl Responder {
    let session_id = CartApi::<SqliteDatabase>::new_guest_session();
    trace!("💻️ New guest cart session issued");
    HttpResponse::Created().json(CartSessionResponse { session_id })
}

route!(get_cart => Get "/cart" impl CartManagement, SettingsManagement);
pub async fn get_cart<B: CartManagement + SettingsManagement>(
    identity: CartIdentity,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET cart for {}", identity.owner());
    let cart = api.cart(identity.owner()).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(add_to_cart => Post "/cart" impl CartManagement, SettingsManagement);
/// Adds an item to the cart. If the cart already holds the item, the quantities are added together.
pub async fn add_to_cart<B: CartManagement + SettingsManagement>(
    identity: CartIdentity,
    body: web::Json<NewCartLine>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let line = body.into_inner();
    debug!("💻️ Adding {} x item #{} to the cart of {}", line.quantity, line.menu_item_id, identity.owner());
    let cart = api.add_item(identity.owner(), line).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(update_cart_line => Put "/cart/{line_id}" impl CartManagement, SettingsManagement);
pub async fn update_cart_line<B: CartManagement + SettingsManagement>(
    identity: CartIdentity,
    path: web::Path<i64>,
    body: web::Json<CartLineUpdate>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let cart = api.update_line(identity.owner(), path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(remove_cart_line => Delete "/cart/{line_id}" impl CartManagement, SettingsManagement);
pub async fn remove_cart_line<B: CartManagement + SettingsManagement>(
    identity: CartIdentity,
    path: web::Path<i64>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let cart = api.remove_line(identity.owner(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(clear_cart => Delete "/cart" impl CartManagement, SettingsManagement);
pub async fn clear_cart<B: CartManagement + SettingsManagement>(
    identity: CartIdentity,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let cart = api.clear(identity.owner()).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(merge_cart => Post "/cart/merge" impl CartManagement, SettingsManagement);
/// Moves the guest cart named in the `kitchen_cart_session` header into the signed-in user's cart.
///
/// Clients call this straight after login. Quantities for items that are in both carts are added together, capped at
/// the per-item maximum. The guest cart is empty afterwards.
pub async fn merge_cart<B: CartManagement + SettingsManagement>(
    claims: JwtClaims,
    session: GuestSession,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ Merging guest cart into the cart of user #{}", claims.user_id);
    let cart = api.merge_guest_cart(&session.0, claims.user_id).await?;
    Ok(HttpResponse::Ok().json(cart))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(place_order => Post "/orders" impl OrderManagement, SettingsManagement);
/// Checks out the signed-in customer's cart.
///
/// The new order starts out as `New`, with a `Pending` payment for either the advance or the full total. The cart is
/// emptied in the same transaction.
pub async fn place_order<B: OrderManagement + SettingsManagement>(
    claims: JwtClaims,
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST order for user #{}", claims.user_id);
    let order = api.place_order(&claims.actor(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(order))
}

route!(my_orders => Get "/orders" impl OrderManagement, SettingsManagement);
/// The signed-in customer's orders, newest first.
pub async fn my_orders<B: OrderManagement + SettingsManagement>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_orders for user #{}", claims.user_id);
    let orders = api.my_orders(&claims.actor()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{id}" impl OrderManagement, SettingsManagement);
/// An order with its lines and payment. Customers may only fetch their own orders; admins may fetch any.
pub async fn order_by_id<B: OrderManagement + SettingsManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order = api.order(&claims.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_order_status => Put "/orders/{id}/status" impl OrderManagement, SettingsManagement);
/// Moves an order along the order state machine.
///
/// Customers may only cancel their own orders, and only before they are dispatched. Admins may move any order along
/// any edge, except into `Confirmed`, which only happens through payment confirmation.
pub async fn update_order_status<B: OrderManagement + SettingsManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<StatusChangeRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let target = body.into_inner().status;
    debug!("💻️ User #{} wants to move order #{order_id} to {target}", claims.user_id);
    let order = api.change_order_status(&claims.actor(), order_id, target).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(reorder => Post "/orders/{id}/reorder" impl OrderManagement, CartManagement, SettingsManagement);
pub async fn reorder<B: OrderManagement + CartManagement + SettingsManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let summary = api.reorder(&claims.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(summary))
}

route!(search_orders => Get "/admin/orders" impl OrderManagement, SettingsManagement where requires [Role::Admin]);
/// Searches all orders. Supported query parameters are `status` (a comma-separated list), `user_id`, and `since` and
/// `until` (RFC 3339 timestamps).
pub async fn search_orders<B: OrderManagement + SettingsManagement>(
    query: web::Query<OrderSearchParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter = OrderQueryFilter::try_from(query.into_inner())?;
    debug!("💻️ GET admin order search: {filter:?}");
    let orders = api.search_orders(filter).await?;
    Ok(HttpResponse::Ok().json(orders))
}

//----------------------------------------------   Customers  ----------------------------------------------------
route!(customers => Get "/admin/customers" impl AccountManagement where requires [Role::Admin]);
/// Every customer account, newest first, with the number of orders placed and the amount spent on delivered orders.
pub async fn customers<B: AccountManagement>(api: web::Data<AccountApi<B>>) -> Result<HttpResponse, ServerError> {
    let customers = api.customers().await?;
    Ok(HttpResponse::Ok().json(customers))
}

route!(customer => Get "/admin/customers/{id}" impl AccountManagement, OrderManagement, SettingsManagement where requires [Role::Admin]);
pub async fn customer<B: AccountManagement + OrderManagement + SettingsManagement>(
    path: web::Path<i64>,
    accounts: web::Data<AccountApi<B>>,
    orders: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer = accounts.customer(path.into_inner()).await?;
    let orders = orders.customer_orders(customer.id).await?;
    Ok(HttpResponse::Ok().json(CustomerDetail { customer, orders }))
}

route!(update_admin_notes => Put "/admin/orders/{id}/notes" impl OrderManagement, SettingsManagement where requires [Role::Admin]);
pub async fn update_admin_notes<B: OrderManagement + SettingsManagement>(
    path: web::Path<i64>,
    body: web::Json<AdminNotesRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order = api.update_admin_notes(path.into_inner(), body.into_inner().admin_notes).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Payments  ----------------------------------------------------
/// The payment methods the kitchen accepts, with their display names.
#[get("/payments/methods")]
pub async fn payment_methods() -> impl Responder {
    let methods = PaymentMethod::all().into_iter().map(PaymentMethodInfo::from).collect::<Vec<_>>();
    HttpResponse::Ok().json(methods)
}

route!(payment_by_id => Get "/payments/{id}" impl OrderManagement, SettingsManagement);
pub async fn payment_by_id<B: OrderManagement + SettingsManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payment = api.payment(&claims.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(payment))
}

route!(upload_proof => Post "/payments/{id}/upload" impl OrderManagement, SettingsManagement);
/// Receives a proof of payment (a screenshot or photo of the transfer) as the `proof` field of a multipart form.
///
/// Only the customer who placed the order may upload. The payment moves to `ProofUploaded` and joins the admin review
/// queue. A payment that was rejected accepts a new proof; a confirmed one does not (409).
pub async fn upload_proof<B: OrderManagement + SettingsManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    payload: Multipart,
    api: web::Data<OrderFlowApi<B>>,
    storage: web::Data<LocalProofStorage>,
) -> Result<HttpResponse, ServerError> {
    let payment_id = path.into_inner();
    debug!("💻️ User #{} is uploading a proof for payment #{payment_id}", claims.user_id);
    let upload = read_proof_upload(payload, storage.max_bytes()).await?;
    let payment = api.upload_proof(&claims.actor(), payment_id, upload, storage.get_ref()).await?;
    Ok(HttpResponse::Ok().json(payment))
}

/// Pulls the proof file out of the multipart payload, refusing to buffer more than `max_bytes`.
async fn read_proof_upload(mut payload: Multipart, max_bytes: usize) -> Result<ProofUpload, ServerError> {
    while let Some(field) = payload.next().await {
        let mut field = field.map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
        let disposition = field.content_disposition();
        if disposition.get_name() != Some(PROOF_FIELD) {
            trace!("💻️ Ignoring multipart field {:?}", disposition.get_name());
            continue;
        }
        let filename = disposition.get_filename().unwrap_or_default().to_string();
        let mut content = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
            if content.len() + chunk.len() > max_bytes {
                let err = ProofStorageError::TooLarge { size: content.len() + chunk.len(), max: max_bytes };
                return Err(ServerError::ValidationError(err.to_string()));
            }
            content.extend_from_slice(&chunk);
        }
        return Ok(ProofUpload::new(filename, content));
    }
    Err(ServerError::InvalidRequestBody(format!("The form has no '{PROOF_FIELD}' file field")))
}

route!(payment_proof => Get "/payments/{id}/proof" impl OrderManagement, SettingsManagement);
/// Serves the stored proof of payment, to the customer who uploaded it or to an admin.
pub async fn payment_proof<B: OrderManagement + SettingsManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
    storage: web::Data<LocalProofStorage>,
) -> Result<HttpResponse, ServerError> {
    let (proof_ref, content) = api.fetch_proof(&claims.actor(), path.into_inner(), storage.get_ref()).await?;
    Ok(HttpResponse::Ok().content_type(content_type_for(&proof_ref)).body(content))
}

route!(confirm_payment => Put "/payments/{id}/confirm" impl OrderManagement, SettingsManagement where requires [Role::Admin]);
/// Confirms a payment that is waiting for review. The order moves to `Confirmed` in the same transaction.
///
/// Only one confirmation can ever succeed. A second attempt, or an attempt on a payment without a proof, fails with
/// a 409.
pub async fn confirm_payment<B: OrderManagement + SettingsManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: Option<web::Json<ConfirmPaymentRequest>>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payment_id = path.into_inner();
    let transaction_ref = body.and_then(|b| b.into_inner().transaction_ref);
    let (payment, order) = api.confirm_payment(&claims.actor(), payment_id, transaction_ref).await?;
    Ok(HttpResponse::Ok().json(ConfirmationResult { payment, order }))
}

route!(reject_payment => Put "/payments/{id}/reject" impl OrderManagement, SettingsManagement where requires [Role::Admin]);
/// Rejects a payment that is waiting for review. A reason is required; the customer sees it and may upload a new
/// proof. The order is left as it is.
pub async fn reject_payment<B: OrderManagement + SettingsManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<RejectPaymentRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payment = api.reject_payment(&claims.actor(), path.into_inner(), &body.reason).await?;
    Ok(HttpResponse::Ok().json(payment))
}

route!(search_payments => Get "/admin/payments" impl OrderManagement, SettingsManagement where requires [Role::Admin]);
pub async fn search_payments<B: OrderManagement + SettingsManagement>(
    query: web::Query<PaymentSearchParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter = PaymentQueryFilter::try_from(query.into_inner())?;
    let payments = api.search_payments(filter).await?;
    Ok(HttpResponse::Ok().json(payments))
}

route!(pending_payments => Get "/admin/payments/pending" impl OrderManagement, SettingsManagement where requires [Role::Admin]);
/// The review queue: payments with a proof that has not been looked at yet, oldest first.
pub async fn pending_payments<B: OrderManagement + SettingsManagement>(
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payments = api.pending_payments().await?;
    trace!("💻️ {} payments are waiting for review", payments.len());
    Ok(HttpResponse::Ok().json(payments))
}

//----------------------------------------------   Settings  ----------------------------------------------------
route!(ordering_status => Get "/ordering-status" impl SettingsManagement);
pub async fn ordering_status<B: SettingsManagement>(
    api: web::Data<SettingsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let ordering_enabled = api.ordering_enabled().await?;
    Ok(HttpResponse::Ok().json(OrderingStatus { ordering_enabled }))
}

route!(get_settings => Get "/admin/settings" impl SettingsManagement where requires [Role::Admin]);
pub async fn get_settings<B: SettingsManagement>(api: web::Data<SettingsApi<B>>) -> Result<HttpResponse, ServerError> {
    let settings = api.settings().await?;
    Ok(HttpResponse::Ok().json(settings))
}

route!(update_settings => Put "/admin/settings" impl SettingsManagement where requires [Role::Admin]);
pub async fn update_settings<B: SettingsManagement>(
    body: web::Json<SettingsUpdate>,
    api: web::Data<SettingsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let settings = api.update_settings(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(settings))
}

route!(toggle_ordering => Post "/admin/toggle-ordering" impl SettingsManagement where requires [Role::Admin]);
pub async fn toggle_ordering<B: SettingsManagement>(
    api: web::Data<SettingsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let ordering_enabled = api.toggle_ordering().await?;
    Ok(HttpResponse::Ok().json(OrderingStatus { ordering_enabled }))
}

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use kitchen_engine::{
    db_types::{Order, OrderStatusType, Payment, PaymentMethod, PaymentStatus, User},
    order_objects::{OrderQueryFilter, PaymentQueryFilter},
};
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

/// Returned on successful login or registration.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartSessionResponse {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderingStatus {
    pub ordering_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethodInfo {
    pub method: PaymentMethod,
    pub name_en: String,
    pub name_ar: String,
}

impl From<PaymentMethod> for PaymentMethodInfo {
    fn from(method: PaymentMethod) -> Self {
        Self { method, name_en: method.name_en().to_string(), name_ar: method.name_ar().to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangeRequest {
    pub status: OrderStatusType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfirmPaymentRequest {
    #[serde(default)]
    pub transaction_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectPaymentRequest {
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminNotesRequest {
    #[serde(default)]
    pub admin_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrlRequest {
    #[serde(default)]
    pub image_url: String,
}

/// A customer account together with all of the customer's orders, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub customer: User,
    pub orders: Vec<Order>,
}

/// The result of a payment confirmation: the confirmed payment and the order it confirmed.
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmationResult {
    pub payment: Payment,
    pub order: Order,
}

/// Query parameters for the admin order search. `status` is a comma-separated list of order statuses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderSearchParams {
    pub status: Option<String>,
    pub user_id: Option<i64>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TryFrom<OrderSearchParams> for OrderQueryFilter {
    type Error = ServerError;

    fn try_from(params: OrderSearchParams) -> Result<Self, Self::Error> {
        let status = params.status.as_deref().map(parse_list::<OrderStatusType>).transpose()?;
        Ok(OrderQueryFilter { user_id: params.user_id, status, since: params.since, until: params.until })
    }
}

/// Query parameters for the admin payment search. `status` is a comma-separated list of payment statuses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentSearchParams {
    pub status: Option<String>,
    pub method: Option<String>,
    pub order_id: Option<i64>,
}

impl TryFrom<PaymentSearchParams> for PaymentQueryFilter {
    type Error = ServerError;

    fn try_from(params: PaymentSearchParams) -> Result<Self, Self::Error> {
        let status = params.status.as_deref().map(parse_list::<PaymentStatus>).transpose()?;
        let method = params
            .method
            .as_deref()
            .map(|m| PaymentMethod::from_str(m.trim()).map_err(|e| ServerError::ValidationError(e.to_string())))
            .transpose()?;
        Ok(PaymentQueryFilter { order_id: params.order_id, status, method })
    }
}

fn parse_list<T>(list: &str) -> Result<Vec<T>, ServerError>
where
    T: FromStr,
    T::Err: Display,
{
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| T::from_str(s).map_err(|e| ServerError::ValidationError(e.to_string())))
        .collect()
}

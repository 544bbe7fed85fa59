use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use kitchen_engine::{AccountApiError, CartError, CatalogError, OrderFlowError, SettingsError};
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("A guest cart session is required. Create one with POST /api/cart/session and send it in the \
             kitchen_cart_session header")]
    MissingCartSession,
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("{0}")]
    Conflict(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::MissingCartSession => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
                AuthError::TokenSigningError(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::UNAUTHORIZED,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Invalid email or password.")]
    InvalidCredentials,
    #[error("User account not found.")]
    AccountNotFound,
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Could not sign the access token. {0}")]
    TokenSigningError(String),
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::Validation(_) |
            OrderFlowError::OrderingDisabled |
            OrderFlowError::EmptyCart |
            OrderFlowError::InvalidAmount { .. } => Self::ValidationError(e.to_string()),
            OrderFlowError::Forbidden(_) => Self::InsufficientPermissions(e.to_string()),
            OrderFlowError::OrderNotFound(_) |
            OrderFlowError::PaymentNotFound(_) |
            OrderFlowError::ProofNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::WrongState { .. } | OrderFlowError::InvalidTransition { .. } => {
                Self::Conflict(e.to_string())
            },
            OrderFlowError::DatabaseError(_) | OrderFlowError::StorageError(_) => {
                error!("💻️ Order flow failure. {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<CartError> for ServerError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::LineNotFound(_) | CartError::MenuItemNotFound(_) => Self::NoRecordFound(e.to_string()),
            CartError::MenuItemUnavailable(_) | CartError::QuantityOutOfRange { .. } | CartError::Validation(_) => {
                Self::ValidationError(e.to_string())
            },
            CartError::DatabaseError(_) => {
                error!("💻️ Cart failure. {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<CatalogError> for ServerError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::MenuItemNotFound(_) | CatalogError::ImageNotFound { .. } => {
                Self::NoRecordFound(e.to_string())
            },
            CatalogError::Validation(_) | CatalogError::NoOpUpdate(_) => Self::ValidationError(e.to_string()),
            CatalogError::DatabaseError(_) => {
                error!("💻️ Catalog failure. {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<AccountApiError> for ServerError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::EmailAlreadyRegistered(_)
            | AccountApiError::PhoneAlreadyRegistered(_)
            | AccountApiError::AdminEmailTaken(_) => Self::Conflict(e.to_string()),
            AccountApiError::CustomerNotFound(_) => Self::NoRecordFound("Customer not found".into()),
            AccountApiError::InvalidCredentials => Self::AuthenticationError(AuthError::InvalidCredentials),
            AccountApiError::UserNotFound(_) => Self::AuthenticationError(AuthError::AccountNotFound),
            AccountApiError::Validation(_) => Self::ValidationError(e.to_string()),
            AccountApiError::DatabaseError(_) | AccountApiError::PasswordHashError(_) => {
                error!("💻️ Account failure. {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<SettingsError> for ServerError {
    fn from(e: SettingsError) -> Self {
        match e {
            SettingsError::InvalidSettings(_) => Self::ValidationError(e.to_string()),
            SettingsError::DatabaseError(_) => {
                error!("💻️ Settings failure. {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}

use thiserror::Error;

use crate::db_types::{CustomerSummary, NewUser, User};

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("An account with the email {0} already exists")]
    EmailAlreadyRegistered(String),
    #[error("An account with the phone number {0} already exists")]
    PhoneAlreadyRegistered(String),
    #[error("User #{0} does not exist")]
    UserNotFound(i64),
    #[error("Customer #{0} does not exist")]
    CustomerNotFound(i64),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Invalid account details: {0}")]
    Validation(String),
    #[error("Could not hash password. {0}")]
    PasswordHashError(String),
    #[error("{0} belongs to a customer account, so it cannot be used for the admin account")]
    AdminEmailTaken(String),
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}

/// The `AccountManagement` trait defines behaviour for storing and looking up customer and admin accounts.
///
/// Password hashing happens in the [`crate::AccountApi`]; backends only ever see the hash.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    /// Stores a new user. Emails and phone numbers are unique; a clash results in
    /// [`AccountApiError::EmailAlreadyRegistered`] or [`AccountApiError::PhoneAlreadyRegistered`].
    async fn insert_user(&self, user: NewUser) -> Result<User, AccountApiError>;

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AccountApiError>;

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AccountApiError>;

    /// All non-admin accounts, newest first, each with its order count and the amount spent on delivered orders.
    async fn fetch_customers(&self) -> Result<Vec<CustomerSummary>, AccountApiError>;
}

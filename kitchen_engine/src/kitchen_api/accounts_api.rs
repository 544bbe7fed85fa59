//! Customer and admin accounts.

use std::fmt::Debug;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use log::*;
use rand::rngs::OsRng;

use crate::{
    account_objects::{normalize_email, Credentials, Registration},
    db_types::{CustomerSummary, NewUser, User},
    traits::{AccountApiError, AccountManagement},
};

/// The `AccountApi` registers customers and checks their credentials.
///
/// Passwords are hashed with Argon2 before they reach the backend. Hashing is deliberately slow, so it runs on the
/// blocking thread pool.
pub struct AccountApi<B> {
    db: B,
}

impl<B> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi")
    }
}

impl<B> AccountApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    /// Creates a customer account. The email address is normalized to lower case.
    pub async fn register(&self, registration: Registration) -> Result<User, AccountApiError> {
        let registration = registration.normalized()?;
        if self.db.fetch_user_by_email(&registration.email).await?.is_some() {
            return Err(AccountApiError::EmailAlreadyRegistered(registration.email));
        }
        let password_hash = hash_password(registration.password).await?;
        let user = NewUser {
            name: registration.name,
            email: registration.email,
            phone: registration.phone,
            password_hash,
            is_admin: false,
        };
        let user = self.db.insert_user(user).await?;
        info!("👤️ New customer account #{} registered for {}", user.id, user.email);
        Ok(user)
    }

    /// Checks an email and password pair. Unknown emails and wrong passwords give the same error.
    pub async fn authenticate(&self, credentials: Credentials) -> Result<User, AccountApiError> {
        let email = normalize_email(&credentials.email);
        let Some(user) = self.db.fetch_user_by_email(&email).await? else {
            debug!("👤️ Login attempt for unknown account {email}");
            return Err(AccountApiError::InvalidCredentials);
        };
        if !verify_password(credentials.password, user.password_hash.clone()).await? {
            debug!("👤️ Wrong password for account #{}", user.id);
            return Err(AccountApiError::InvalidCredentials);
        }
        Ok(user)
    }

    pub async fn user(&self, user_id: i64) -> Result<User, AccountApiError> {
        self.db.fetch_user(user_id).await?.ok_or(AccountApiError::UserNotFound(user_id))
    }

    pub async fn customers(&self) -> Result<Vec<CustomerSummary>, AccountApiError> {
        self.db.fetch_customers().await
    }

    /// Looks up a customer account. Admin accounts are not customers, and give
    /// [`AccountApiError::CustomerNotFound`].
    pub async fn customer(&self, customer_id: i64) -> Result<User, AccountApiError> {
        match self.db.fetch_user(customer_id).await? {
            Some(user) if !user.is_admin => Ok(user),
            _ => Err(AccountApiError::CustomerNotFound(customer_id)),
        }
    }

    /// Makes sure an admin account with the given email exists. An existing admin account is left untouched,
    /// password included. If the email belongs to a customer, nothing changes and
    /// [`AccountApiError::AdminEmailTaken`] is returned. Otherwise a new admin account is created.
    pub async fn ensure_admin(&self, name: &str, email: &str, password: &str) -> Result<User, AccountApiError> {
        let email = normalize_email(email);
        if let Some(user) = self.db.fetch_user_by_email(&email).await? {
            if user.is_admin {
                return Ok(user);
            }
            warn!("👤️ The admin email {email} is already used by customer account #{}", user.id);
            return Err(AccountApiError::AdminEmailTaken(email));
        }
        let registration = Registration::new(name, email.as_str(), password).normalized()?;
        let password_hash = hash_password(registration.password).await?;
        let user = NewUser {
            name: registration.name,
            email: registration.email,
            phone: None,
            password_hash,
            is_admin: true,
        };
        let user = self.db.insert_user(user).await?;
        info!("👤️ Admin account #{} created for {}", user.id, user.email);
        Ok(user)
    }
}

async fn hash_password(password: String) -> Result<String, AccountApiError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AccountApiError::PasswordHashError(e.to_string()))
    })
    .await
    .map_err(|e| AccountApiError::PasswordHashError(e.to_string()))?
}

async fn verify_password(password: String, hash: String) -> Result<bool, AccountApiError> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash).map_err(|e| AccountApiError::PasswordHashError(e.to_string()))?;
        Ok::<_, AccountApiError>(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
    })
    .await
    .map_err(|e| AccountApiError::PasswordHashError(e.to_string()))?
}

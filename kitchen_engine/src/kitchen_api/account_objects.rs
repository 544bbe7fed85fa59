use serde::{Deserialize, Serialize};

use crate::traits::AccountApiError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Registration {
    pub fn new<S: Into<String>>(name: S, email: S, password: S) -> Self {
        Self { name: name.into(), email: email.into(), password: password.into(), phone: None }
    }

    pub fn with_phone<S: Into<String>>(mut self, phone: S) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Trims the fields, lower-cases the email, and checks that everything required is present.
    pub fn normalized(self) -> Result<Self, AccountApiError> {
        let name = self.name.trim().to_string();
        let email = normalize_email(&self.email);
        let phone = self.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());
        if name.is_empty() {
            return Err(AccountApiError::Validation("A name is required".into()));
        }
        if !is_plausible_email(&email) {
            return Err(AccountApiError::Validation(format!("{email} is not a valid email address")));
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AccountApiError::Validation(format!(
                "Passwords must be at least {MIN_PASSWORD_LENGTH} characters long"
            )));
        }
        Ok(Self { name, email, password: self.password, phone })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

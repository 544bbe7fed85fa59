//! Access tokens and request identities.
//!
//! Access tokens are HS256 JWTs carrying a [`JwtClaims`] payload. They are issued on login and registration, and are
//! sent back by the client in the `kitchen_access_token` header. The [`crate::middleware::JwtMiddlewareFactory`]
//! validates the token (when there is one) and stores the claims in the request extensions, from where the
//! [`JwtClaims`] and [`CartIdentity`] extractors pick them up.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use chrono::Duration;
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    Header,
    TimeOptions,
    Token,
    UntrustedToken,
};
use kitchen_engine::{
    db_types::{CartOwner, User},
    order_objects::Actor,
    CartApi,
    SqliteDatabase,
};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub const ACCESS_TOKEN_HEADER: &str = "kitchen_access_token";
pub const CART_SESSION_HEADER: &str = "kitchen_cart_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Customer,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub user_id: i64,
    pub email: String,
    pub is_admin: bool,
}

impl JwtClaims {
    /// Every signed-in user is a customer. Admins have the admin role on top.
    pub fn roles(&self) -> Vec<Role> {
        if self.is_admin {
            vec![Role::Customer, Role::Admin]
        } else {
            vec![Role::Customer]
        }
    }

    pub fn actor(&self) -> Actor {
        Actor { user_id: self.user_id, is_admin: self.is_admin }
    }
}

impl From<&User> for JwtClaims {
    fn from(user: &User) -> Self {
        Self { user_id: user.id, email: user.email.clone(), is_admin: user.is_admin }
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned();
        ready(claims.ok_or(ServerError::AuthenticationError(AuthError::MissingToken)))
    }
}

/// The cart a request addresses. Signed-in users always get their own cart, even when a guest session header is
/// present. Everyone else must send a guest session id in the `kitchen_cart_session` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartIdentity(pub CartOwner);

impl CartIdentity {
    pub fn owner(&self) -> &CartOwner {
        &self.0
    }
}

impl FromRequest for CartIdentity {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(claims) = req.extensions().get::<JwtClaims>() {
            return ready(Ok(CartIdentity(CartOwner::User(claims.user_id))));
        }
        ready(guest_session(req).map(|s| CartIdentity(CartOwner::Guest(s))))
    }
}

/// The guest session id sent in the `kitchen_cart_session` header, regardless of whether the user is signed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestSession(pub String);

impl FromRequest for GuestSession {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(guest_session(req).map(GuestSession))
    }
}

fn guest_session(req: &HttpRequest) -> Result<String, ServerError> {
    let session = req
        .headers()
        .get(CART_SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .ok_or(ServerError::MissingCartSession)?;
    if CartApi::<SqliteDatabase>::is_valid_guest_session(&session) {
        Ok(session)
    } else {
        debug!("💻️ Rejecting malformed cart session id '{session}'");
        Err(ServerError::ValidationError(format!("'{session}' is not a valid cart session id")))
    }
}

/// Signs and checks access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    key: Hs256Key,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TokenIssuer(ttl: {})", self.ttl)
    }
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let key = Hs256Key::new(config.jwt_secret.reveal().as_bytes());
        Self { key, ttl: config.access_token_ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues an access token for the given user. This method DOES NOT check the user's credentials. That must be
    /// done before calling `issue_token`.
    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let header = Header::empty().with_token_type("JWT");
        let claims = Claims::new(JwtClaims::from(user)).set_duration_and_issuance(&TimeOptions::default(), self.ttl);
        Hs256.token(&header, &claims, &self.key).map_err(|e| AuthError::TokenSigningError(e.to_string()))
    }

    /// Checks the signature and expiry of an access token and returns its claims.
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let untrusted = UntrustedToken::new(token).map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        let token: Token<JwtClaims> =
            Hs256.validator(&self.key).validate(&untrusted).map_err(|e| AuthError::ValidationError(e.to_string()))?;
        token.claims().validate_expiration(&TimeOptions::default()).map_err(|e| {
            trace!("💻️ Access token for user #{} has expired", token.claims().custom.user_id);
            AuthError::ValidationError(e.to_string())
        })?;
        Ok(token.claims().custom.clone())
    }
}

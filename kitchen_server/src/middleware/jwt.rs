//! Access token middleware.
//!
//! If the request carries a `kitchen_access_token` header, the token is validated and the claims are inserted into
//! the request extensions. An invalid or expired token is rejected with a 401 straight away.
//!
//! Requests without a token are passed through untouched. Handlers that need a signed-in user ask for a
//! [`JwtClaims`] argument, which fails with a 401 when there are no claims; guest-friendly handlers use
//! [`crate::auth::CartIdentity`] instead.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::{debug, trace};

use crate::{
    auth::{JwtClaims, TokenIssuer, ACCESS_TOKEN_HEADER},
    errors::{AuthError, ServerError},
};

pub struct JwtMiddlewareFactory {
    issuer: TokenIssuer,
}

impl JwtMiddlewareFactory {
    pub fn new(issuer: TokenIssuer) -> Self {
        JwtMiddlewareFactory { issuer }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = JwtMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtMiddlewareService { issuer: self.issuer.clone(), service: Rc::new(service) }))
    }
}

pub struct JwtMiddlewareService<S> {
    issuer: TokenIssuer,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let token = req.headers().get(ACCESS_TOKEN_HEADER).map(|v| v.to_str().map(|s| s.trim().to_string()));
        let claims = match token {
            None => None,
            Some(Err(e)) => {
                debug!("🔐️ Could not read access token header. {e}");
                let err = ServerError::AuthenticationError(AuthError::PoorlyFormattedToken(e.to_string()));
                return Box::pin(async move { Err(err.into()) });
            },
            Some(Ok(token)) => match self.issuer.validate_token(&token) {
                Ok(claims) => Some(claims),
                Err(e) => {
                    debug!("🔐️ Rejecting request to {} with an invalid access token. {e}", req.path());
                    let err = ServerError::AuthenticationError(e);
                    return Box::pin(async move { Err(err.into()) });
                },
            },
        };
        if let Some(claims) = claims {
            trace!("🔐️ Access token for user #{} is valid", claims.user_id);
            req.extensions_mut().insert::<JwtClaims>(claims);
        }
        Box::pin(async move { service.call(req).await })
    }
}

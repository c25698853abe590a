//! Viewer identity.
//!
//! Tokens are minted by the external identity service (HS256, shared
//! secret). This service only decodes them: a missing, malformed or expired
//! token makes the request anonymous. Gating happens later, in the
//! authorization guard, never here.

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

/// Cookie carrying the access token for browser clients.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Claims issued by the identity service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id as a decimal string
    pub sub: String,
    pub username: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
}

/// Authenticated viewer as asserted by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

pub struct TokenDecoder {
    key: DecodingKey,
    validation: Validation,
}

impl TokenDecoder {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn decode(&self, token: &str) -> Option<AuthUser> {
        let data = match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring invalid access token");
                return None;
            }
        };

        let id = data.claims.sub.parse::<i64>().ok()?;
        let username = data.claims.username.trim().to_string();
        if username.is_empty() {
            return None;
        }
        Some(AuthUser { id, username })
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    let from_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());

    from_header.or_else(|| {
        req.cookie(ACCESS_TOKEN_COOKIE)
            .map(|c| c.value().to_string())
    })
}

/// Actix middleware that attaches the verified viewer, if any, to the request.
pub struct IdentityMiddleware {
    decoder: Arc<TokenDecoder>,
}

impl IdentityMiddleware {
    pub fn new(decoder: Arc<TokenDecoder>) -> Self {
        Self { decoder }
    }
}

impl<S, B> Transform<S, ServiceRequest> for IdentityMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = IdentityMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityMiddlewareService {
            service: Rc::new(service),
            decoder: self.decoder.clone(),
        }))
    }
}

pub struct IdentityMiddlewareService<S> {
    service: Rc<S>,
    decoder: Arc<TokenDecoder>,
}

impl<S, B> Service<ServiceRequest> for IdentityMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        if let Some(user) = bearer_token(&req).and_then(|t| self.decoder.decode(&t)) {
            req.extensions_mut().insert(user);
        }

        Box::pin(async move { service.call(req).await })
    }
}

/// The possibly-anonymous viewer behind a request. Extraction never fails.
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<AuthUser>);

impl Viewer {
    pub fn user(&self) -> Option<&AuthUser> {
        self.0.as_ref()
    }
}

impl FromRequest for Viewer {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(Ok(Viewer(req.extensions().get::<AuthUser>().cloned())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, sub: &str, username: &str, exp: i64) -> String {
        let claims = Claims {
            sub: sub.into(),
            username: username.into(),
            exp,
            iat: None,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn future() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn decodes_valid_token() {
        let decoder = TokenDecoder::new("secret");
        let user = decoder.decode(&token("secret", "42", "sarah", future()));
        assert_eq!(
            user,
            Some(AuthUser {
                id: 42,
                username: "sarah".into()
            })
        );
    }

    #[test]
    fn wrong_secret_is_anonymous() {
        let decoder = TokenDecoder::new("secret");
        assert!(decoder
            .decode(&token("other", "42", "sarah", future()))
            .is_none());
    }

    #[test]
    fn expired_token_is_anonymous() {
        let decoder = TokenDecoder::new("secret");
        let past = chrono::Utc::now().timestamp() - 60;
        assert!(decoder.decode(&token("secret", "42", "sarah", past)).is_none());
    }

    #[test]
    fn non_numeric_subject_is_anonymous() {
        let decoder = TokenDecoder::new("secret");
        assert!(decoder
            .decode(&token("secret", "not-a-number", "sarah", future()))
            .is_none());
    }
}

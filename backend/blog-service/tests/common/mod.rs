#![allow(dead_code)]

use actix_web::http::header;
use actix_web::test::TestRequest;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::sync::Arc;

use blog_service::db::MemoryContentStore;
use blog_service::middleware::identity::Claims;
use blog_service::{AppState, Config};

pub const SECRET: &str = "blog-service-test-secret";

/// App state over a fresh memory store.
pub fn test_state(cache_ttl_secs: u64) -> AppState {
    let mut config = Config::default();
    config.auth.jwt_secret = SECRET.to_string();
    config.feed.global_cache_ttl_secs = cache_ttl_secs;
    AppState::new(Arc::new(MemoryContentStore::new()), &config)
}

/// Build the service the same way the binary does.
macro_rules! init_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($state.clone()))
                .wrap(blog_service::middleware::IdentityMiddleware::new(
                    $state.tokens.clone(),
                ))
                .configure(blog_service::handlers::configure)
                .default_service(actix_web::web::to(blog_service::handlers::not_found)),
        )
        .await
    };
}

pub fn token(id: i64, username: &str) -> String {
    let claims = Claims {
        sub: id.to_string(),
        username: username.to_string(),
        exp: chrono::Utc::now().timestamp() + 3600,
        iat: None,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("encode token")
}

pub fn get(uri: &str, token: Option<&str>) -> TestRequest {
    authed(TestRequest::get().uri(uri), token)
}

pub fn post_form(uri: &str, token: Option<&str>, form: &[(&str, &str)]) -> TestRequest {
    authed(TestRequest::post().uri(uri), token).set_form(form)
}

fn authed(req: TestRequest, token: Option<&str>) -> TestRequest {
    match token {
        Some(t) => req.insert_header((header::AUTHORIZATION, format!("Bearer {}", t))),
        None => req,
    }
}

pub fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

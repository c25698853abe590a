/// HTTP middleware utilities for blog-service
///
/// Identity decoding (anonymous unless a valid token is presented) and
/// request latency metrics.
pub mod identity;

pub use identity::{AuthUser, IdentityMiddleware, TokenDecoder, Viewer};

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpRequest};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::time::Instant;

use crate::metrics::http::HTTP_REQUEST_DURATION_SECONDS;

/// Path plus query of the current request, used as the login `next` target.
pub fn return_path(req: &HttpRequest) -> String {
    req.uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.path().to_string())
}

// =====================================================================
// Metrics middleware
// =====================================================================

/// Records every request into `blog_http_request_duration_seconds`, labelled
/// by the matched route pattern rather than the raw path.
pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
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
        let path = req.path().to_string();
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let res = service.call(req).await;
            let elapsed = start.elapsed();
            let (status, route) = match &res {
                Ok(r) => (
                    r.status().as_u16(),
                    r.request()
                        .match_pattern()
                        .unwrap_or_else(|| "unmatched".to_string()),
                ),
                Err(_) => (500, "unmatched".to_string()),
            };

            HTTP_REQUEST_DURATION_SECONDS
                .with_label_values(&[method.as_str(), route.as_str(), &status.to_string()])
                .observe(elapsed.as_secs_f64());
            tracing::debug!(
                %method,
                %path,
                %route,
                status,
                elapsed_ms = elapsed.as_millis() as u64,
                "request completed"
            );
            res
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};

    #[actix_web::test]
    async fn requests_are_recorded_by_route_pattern() {
        let app = test::init_service(
            App::new()
                .wrap(MetricsMiddleware)
                .route("/{username}/", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let observed = || {
            HTTP_REQUEST_DURATION_SECONDS
                .with_label_values(&["GET", "/{username}/", "200"])
                .get_sample_count()
        };
        let before = observed();

        let req = test::TestRequest::get().uri("/sarah/").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let req = test::TestRequest::get().uri("/dj/").to_request();
        test::call_service(&app, req).await;

        assert_eq!(observed(), before + 2);
    }

    #[actix_web::test]
    async fn return_path_keeps_the_query() {
        let req = test::TestRequest::get()
            .uri("/follow/?page=2")
            .to_http_request();
        assert_eq!(return_path(&req), "/follow/?page=2");
    }
}

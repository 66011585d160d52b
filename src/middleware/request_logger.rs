use crate::models::all_models::User;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::StatusCode,
    Error, HttpMessage,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use log::{error, log, Level};
use std::{rc::Rc, time::Instant};

/// Logs one line per request with the employee `AuthMiddleware` resolved, if
/// any. Rejections log at `warn`, server faults at `error`.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestLoggerMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequestLoggerMiddleware {
            service: Rc::new(service),
        })
    }
}

pub struct RequestLoggerMiddleware<S> {
    service: Rc<S>,
}

fn level_for(status: StatusCode) -> Level {
    if status.is_server_error() {
        Level::Error
    } else if status.is_client_error() {
        Level::Warn
    } else {
        Level::Info
    }
}

/// `user_name#id` of the authenticated employee, `anonymous` otherwise.
fn requester<B>(response: &ServiceResponse<B>) -> String {
    match response.request().extensions().get::<User>() {
        Some(user) => format!("{}#{}", user.user_name, user.id),
        None => "anonymous".to_string(),
    }
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
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
        let start_time = Instant::now();
        let method = req.method().clone();
        let path = req.path().to_owned();

        let service = self.service.clone();
        Box::pin(async move {
            let res = service.call(req).await;
            let elapsed = start_time.elapsed();

            match &res {
                Ok(response) => {
                    let status = response.status();
                    log!(
                        level_for(status),
                        "[KPI] {} {} - {} - Status: {} - Time: {:.2?}",
                        method,
                        path,
                        requester(response),
                        status.as_u16(),
                        elapsed
                    );
                }
                Err(err) => {
                    error!(
                        "[KPI-ERROR] {} {} - Error: {} - Time: {:.2?}",
                        method, path, err, elapsed
                    );
                }
            }

            res
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::memory_repository::MemoryRepository;
    use crate::routes::test_support::{bearer_for, seed_user, test_config};
    use actix_web::{test, web, App, HttpResponse};
    use std::sync::Arc;

    #[::core::prelude::v1::test]
    fn level_follows_status_class() {
        assert_eq!(level_for(StatusCode::OK), Level::Info);
        assert_eq!(level_for(StatusCode::CREATED), Level::Info);
        assert_eq!(level_for(StatusCode::UNAUTHORIZED), Level::Warn);
        assert_eq!(level_for(StatusCode::NOT_FOUND), Level::Warn);
        assert_eq!(level_for(StatusCode::INTERNAL_SERVER_ERROR), Level::Error);
    }

    #[actix_web::test]
    async fn resolved_user_is_visible_after_the_handler() {
        let repo = Arc::new(MemoryRepository::default());
        let alice = seed_user(&repo, "alice", "Sup3r$ecret").await;
        let app = test::init_service(App::new().configure(test_config(repo))).await;

        let req = test::TestRequest::get()
            .uri("/users/me/")
            .insert_header(bearer_for("alice"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(requester(&resp), format!("alice#{}", alice.id));

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(requester(&resp), "anonymous");
    }

    #[actix_web::test]
    async fn passes_responses_through() {
        let app = test::init_service(
            App::new()
                .wrap(RequestLogger)
                .route("/", web::get().to(|| async { HttpResponse::NotFound().finish() })),
        )
        .await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

pub mod departments;
pub mod kpi;
pub mod user_auth;

use crate::models::all_models::ErrorDetail;
use actix_web::{error::InternalError, web, HttpRequest, HttpResponse};
use log::info;
use departments::config_department_routes;
use kpi::config_kpi_routes;
use serde_json::json;
use user_auth::{config_protected_user_routes, config_user_auth_routes};

async fn read_root() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "message": "Welcome to the KPI Management API V2.6" }))
}

/// Malformed query strings, JSON bodies and forms answer 422 with a
/// `{"detail": ...}` body like every other error.
fn unprocessable<E>(err: E, req: &HttpRequest) -> actix_web::Error
where
    E: std::fmt::Debug + std::fmt::Display + 'static,
{
    info!("Rejected input for {}: {}", req.path(), err);
    let response = HttpResponse::UnprocessableEntity().json(ErrorDetail::new(err.to_string()));
    InternalError::from_response(err, response).into()
}

/// Every route of the API. Expects `web::Data<AuthService>` and
/// `web::Data<dyn KpiRepository>` to be registered as app data.
pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(unprocessable))
        .app_data(web::JsonConfig::default().error_handler(unprocessable))
        .app_data(web::FormConfig::default().error_handler(unprocessable))
        .route("/", web::get().to(read_root))
        .configure(config_user_auth_routes)
        .configure(config_department_routes)
        .configure(config_protected_user_routes)
        .configure(config_kpi_routes);
}

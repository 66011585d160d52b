use crate::handlers::repository::KpiRepository;
use crate::models::all_models::ErrorDetail;
use actix_web::{web, HttpResponse, Responder};
use log::error;

//Get Departments
//Get Departments Output: Vec<Department>
pub async fn read_all_departments(repo: web::Data<dyn KpiRepository>) -> impl Responder {
    match repo.list_departments().await {
        Ok(departments) => HttpResponse::Ok().json(departments),
        Err(e) => {
            error!("Error fetching departments: {}", e);
            HttpResponse::InternalServerError().json(ErrorDetail::new("Failed to fetch departments"))
        }
    }
}

//Config Department Routes
// GET /departments/
pub fn config_department_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/departments/", web::get().to(read_all_departments));
}

use crate::handlers::repository::KpiRepository;
use crate::middleware::auth_middleware::AuthMiddleware;
use crate::models::all_models::{ErrorDetail, KpiResultPayload};
use crate::routes::user_auth::current_user;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::NaiveDate;
use log::error;
use serde::Deserialize;
use serde_json::json;

fn unauthenticated() -> HttpResponse {
    HttpResponse::Unauthorized().json(ErrorDetail::new("Authentication required"))
}

//Get My Assigned KPIs
//Get My Assigned KPIs Input: HttpRequest(Bearer Token)
//Get My Assigned KPIs Output: Vec<Kpi>
pub async fn read_my_assigned_kpis(
    repo: web::Data<dyn KpiRepository>,
    req: HttpRequest,
) -> impl Responder {
    let Some(user) = current_user(&req) else {
        return unauthenticated();
    };

    match repo.assigned_kpis(user.id).await {
        Ok(kpis) => HttpResponse::Ok().json(kpis),
        Err(e) => {
            error!("Error fetching assigned KPIs for {}: {}", user.id, e);
            HttpResponse::InternalServerError().json(ErrorDetail::new("Failed to fetch KPIs"))
        }
    }
}

//Record KPI Result
//Record KPI Result Input: HttpRequest(Bearer Token), KpiResultPayload
//Record KPI Result Output: message (201)
pub async fn record_kpi_result(
    repo: web::Data<dyn KpiRepository>,
    req: HttpRequest,
    payload: web::Json<KpiResultPayload>,
) -> impl Responder {
    let Some(user) = current_user(&req) else {
        return unauthenticated();
    };

    match repo.insert_kpi_result(user.id, &payload).await {
        Ok(()) => HttpResponse::Created().json(json!({
            "message": "KPI result recorded successfully"
        })),
        Err(e) => {
            error!("Error creating KPI result: {}", e);
            HttpResponse::InternalServerError().json(ErrorDetail::new("Failed to record KPI result"))
        }
    }
}

/// Runs the monthly summary for the current user. `not_found` is the detail
/// returned for an empty result; `None` means an empty list is a valid answer.
async fn monthly_summary_response(
    repo: &dyn KpiRepository,
    req: &HttpRequest,
    start: NaiveDate,
    end: NaiveDate,
    not_found: Option<&str>,
) -> HttpResponse {
    let Some(user) = current_user(req) else {
        return unauthenticated();
    };

    match repo.monthly_summary(user.id, start, end).await {
        Ok(rows) => match not_found {
            Some(detail) if rows.is_empty() => {
                HttpResponse::NotFound().json(ErrorDetail::new(detail))
            }
            _ => HttpResponse::Ok().json(rows),
        },
        Err(e) => {
            error!("Error fetching KPI summary: {}", e);
            HttpResponse::InternalServerError().json(ErrorDetail::new("Failed to fetch KPI results"))
        }
    }
}

fn year_bounds(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}

#[derive(Deserialize)]
pub struct YearQuery {
    pub year: i32,
}

//Search KPI Results By Year
//Search KPI Results By Year Input: HttpRequest(Bearer Token), ?year
//Search KPI Results By Year Output: Vec<KpiResultMonthlySummary>
pub async fn search_kpi_results_by_year(
    repo: web::Data<dyn KpiRepository>,
    req: HttpRequest,
    query: web::Query<YearQuery>,
) -> impl Responder {
    let Some((start, end)) = year_bounds(query.year) else {
        return HttpResponse::BadRequest().json(ErrorDetail::new("Invalid year"));
    };
    monthly_summary_response(
        repo.get_ref(),
        &req,
        start,
        end,
        Some("No results found for this year"),
    )
    .await
}

#[derive(Deserialize)]
pub struct YearRangeQuery {
    pub start_year: i32,
    pub end_year: i32,
}

//Multi Year Monthly Summary
//Multi Year Monthly Summary Input: HttpRequest(Bearer Token), ?start_year&end_year
//Multi Year Monthly Summary Output: Vec<KpiResultMonthlySummary>
pub async fn get_multi_year_monthly_kpi_summary(
    repo: web::Data<dyn KpiRepository>,
    req: HttpRequest,
    query: web::Query<YearRangeQuery>,
) -> impl Responder {
    if query.start_year > query.end_year {
        return HttpResponse::BadRequest()
            .json(ErrorDetail::new("start_year cannot be greater than end_year"));
    }
    let (Some((start, _)), Some((_, end))) =
        (year_bounds(query.start_year), year_bounds(query.end_year))
    else {
        return HttpResponse::BadRequest().json(ErrorDetail::new("Invalid year"));
    };
    monthly_summary_response(repo.get_ref(), &req, start, end, None).await
}

#[derive(Deserialize)]
pub struct DateRangeQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

//Search KPI Results By Date Range
//Search KPI Results By Date Range Input: HttpRequest(Bearer Token), ?start_date&end_date
//Search KPI Results By Date Range Output: Vec<KpiResultMonthlySummary>
pub async fn search_kpi_results_by_date_range(
    repo: web::Data<dyn KpiRepository>,
    req: HttpRequest,
    query: web::Query<DateRangeQuery>,
) -> impl Responder {
    if query.start_date > query.end_date {
        return HttpResponse::BadRequest()
            .json(ErrorDetail::new("start_date cannot be after end_date"));
    }
    monthly_summary_response(
        repo.get_ref(),
        &req,
        query.start_date,
        query.end_date,
        Some("No results found for this date range"),
    )
    .await
}

//Get All KPIs With Assignments
//Get All KPIs With Assignments Input: HttpRequest(Bearer Token)
//Get All KPIs With Assignments Output: Vec<KpiWithEmployees>
pub async fn read_all_kpis_with_assignments(repo: web::Data<dyn KpiRepository>) -> impl Responder {
    match repo.kpis_with_assignments().await {
        Ok(kpis) => HttpResponse::Ok().json(kpis),
        Err(e) => {
            error!("Error fetching KPI assignments: {}", e);
            HttpResponse::InternalServerError().json(ErrorDetail::new("Failed to fetch KPIs"))
        }
    }
}

//Config KPI Routes
// POST /kpi-results/
// GET /kpi-results/?start_date&end_date
// GET /kpi-results/by-year/?year
// GET /kpi-results/multi-year-monthly-summary/?start_year&end_year
// GET /kpi/
pub fn config_kpi_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/kpi-results")
            .wrap(AuthMiddleware)
            .route("/", web::post().to(record_kpi_result))
            .route("/", web::get().to(search_kpi_results_by_date_range))
            .route("/by-year/", web::get().to(search_kpi_results_by_year))
            .route(
                "/multi-year-monthly-summary/",
                web::get().to(get_multi_year_monthly_kpi_summary),
            ),
    )
    .service(
        web::scope("/kpi")
            .wrap(AuthMiddleware)
            .route("/", web::get().to(read_all_kpis_with_assignments)),
    );
}

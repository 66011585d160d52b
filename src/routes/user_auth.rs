use crate::handlers::auth::AuthService;
use crate::handlers::password::{
    validate_full_name, validate_password_strength, validate_username,
};
use crate::handlers::repository::{KpiRepository, RepositoryError};
use crate::middleware::auth_middleware::AuthMiddleware;
use crate::models::all_models::{ErrorDetail, User, UserCreate};
use actix_web::{http::header, web, HttpMessage, HttpRequest, HttpResponse, Responder, ResponseError};
use log::{error, info};
use serde::Deserialize;

/// The user resolved by `AuthMiddleware` for this request.
pub fn current_user(req: &HttpRequest) -> Option<User> {
    req.extensions().get::<User>().cloned()
}

//Register User
//Register User Input: UserCreate
//Register User Output: User (201)
pub async fn register_user(
    auth: web::Data<AuthService>,
    repo: web::Data<dyn KpiRepository>,
    payload: web::Json<UserCreate>,
) -> impl Responder {
    let new_user = payload.into_inner();

    let validation = validate_username(&new_user.user_name)
        .and_then(|_| validate_full_name(&new_user.full_name))
        .and_then(|_| validate_password_strength(&new_user.password));
    if let Err(e) = validation {
        return HttpResponse::BadRequest().json(ErrorDetail::new(e.to_string()));
    }

    match repo.find_user_by_username(&new_user.user_name).await {
        Ok(Some(_)) => {
            return HttpResponse::BadRequest().json(ErrorDetail::new("Username already registered"))
        }
        Ok(None) => {}
        Err(e) => {
            error!("Error checking username: {}", e);
            return HttpResponse::InternalServerError().json(ErrorDetail::new("Failed to register"));
        }
    }

    let password_hash = match auth.hash_password(new_user.password.clone()).await {
        Ok(hash) => hash,
        Err(e) => {
            error!("Error hashing password: {}", e);
            return HttpResponse::InternalServerError().json(ErrorDetail::new("Failed to register"));
        }
    };

    match repo.register_user(new_user, password_hash).await {
        Ok(user) => {
            info!("Registered user {}", user.user_name);
            HttpResponse::Created().json(user)
        }
        Err(RepositoryError::DuplicateUsername(_)) => {
            HttpResponse::BadRequest().json(ErrorDetail::new("Username already registered"))
        }
        Err(e) => {
            error!("Registration error: {}", e);
            HttpResponse::InternalServerError().json(ErrorDetail::new("Failed to register"))
        }
    }
}

//Login Form
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

//Login
//Login Input: LoginForm (urlencoded)
//Login Output: Token
pub async fn login_for_access_token(
    auth: web::Data<AuthService>,
    repo: web::Data<dyn KpiRepository>,
    form: web::Form<LoginForm>,
) -> impl Responder {
    let form = form.into_inner();

    let validation =
        validate_username(&form.username).and_then(|_| validate_password_strength(&form.password));
    if let Err(e) = validation {
        return HttpResponse::BadRequest()
            .insert_header((header::WWW_AUTHENTICATE, "Bearer"))
            .json(ErrorDetail::new(e.to_string()));
    }

    match auth
        .login(repo.get_ref(), &form.username, form.password, form.remember_me)
        .await
    {
        Ok(token) => HttpResponse::Ok().json(token),
        Err(e) => {
            info!("Login failed for {}: {}", form.username, e);
            e.error_response()
        }
    }
}

//Get Logged In User
//Get Logged In User Input: HttpRequest(Bearer Token)
//Get Logged In User Output: User
pub async fn read_users_me(req: HttpRequest) -> impl Responder {
    match current_user(&req) {
        Some(user) => HttpResponse::Ok().json(user),
        None => HttpResponse::Unauthorized().json(ErrorDetail::new("Authentication required")),
    }
}

//Config User Auth Routes
// POST /register/
// POST /token
pub fn config_user_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/register/", web::post().to(register_user))
        .route("/token", web::post().to(login_for_access_token));
}

//Config Protected User Routes
// GET /users/me/
// GET /users/me/kpis/
pub fn config_protected_user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .wrap(AuthMiddleware)
            .route("/me/", web::get().to(read_users_me))
            .route("/me/kpis/", web::get().to(super::kpi::read_my_assigned_kpis)),
    );
}

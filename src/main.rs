mod config;
mod handlers;
mod middleware;
mod models;
mod routes;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use config::Config;
use handlers::auth::{AuthService, TokenService};
use handlers::db::{check_db_connection, connect_pool};
use handlers::password::PasswordService;
use handlers::repository::{KpiRepository, MySqlRepository};
use log::{error, info};
use middleware::request_logger::RequestLogger;
use routes::config_routes;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("=== KPI Management API Server Starting ===");

    // Missing secrets or bad cost settings stop the process here.
    let config = Config::from_env()?;

    let passwords = PasswordService::new(config.password_cost)
        .map_err(|e| anyhow::anyhow!("invalid Argon2 parameters: {e}"))?;
    let tokens = TokenService::new(config.jwt_secret.as_bytes());
    let auth = web::Data::new(
        AuthService::new(passwords, tokens).context("failed to initialise auth service")?,
    );

    let pool = match connect_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to connect to MySQL: {}", e);
            return Err(e).context("database connection failed");
        }
    };

    if check_db_connection(&pool).await {
        info!("Database connection established and verified");
    } else {
        info!("Database connection established but verification failed");
    }

    let repo: Arc<dyn KpiRepository> = Arc::new(MySqlRepository::new(pool));
    let repo = web::Data::from(repo);

    let bind_addr = (config.host.clone(), config.port);
    info!("Listening on {}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin_fn(|_origin, _req_head| true)
            .allow_any_method()
            .allow_any_header()
            .expose_any_header()
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(auth.clone())
            .app_data(repo.clone())
            .wrap(RequestLogger)
            .wrap(cors)
            .wrap(Logger::new(
                "%t [%s] \"%r\" %b %D ms \"%{Referer}i\" \"%{User-Agent}i\" %a",
            ))
            .configure(config_routes)
    })
    .bind(bind_addr)?
    .run()
    .await?;

    Ok(())
}

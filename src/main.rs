use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;
use std::sync::Arc;

mod api;
mod auth;
mod config;
mod context;
mod db;
mod docs;
mod model;
mod models;
mod routes;
mod utils;

use config::Config;
use context::AppContext;
use db::init_db;

use crate::auth::handlers::purge_expired_refresh_tokens;
use crate::auth::password::hash_password;
use crate::docs::ApiDoc;
use crate::model::status::AttendanceWindows;
use crate::utils::code_filter;
use crate::utils::regno_cache;
use crate::utils::sms::{Notifier, NoopNotifier, TwilioNotifier};
use sqlx::MySqlPool;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "School Attendance Management System"
}

/// Create the bootstrap admin account if it does not exist yet.
async fn bootstrap_default_admin(pool: &MySqlPool, config: &Config) {
    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admins WHERE username = ?")
        .bind(&config.default_admin_username)
        .fetch_one(pool)
        .await
        .map(|count| count > 0)
        .unwrap_or(true);

    if exists {
        info!("Default admin already exists");
        return;
    }

    let hashed = hash_password(&config.default_admin_password);
    match sqlx::query("INSERT INTO admins (username, password, is_admin) VALUES (?, ?, TRUE)")
        .bind(&config.default_admin_username)
        .bind(&hashed)
        .execute(pool)
        .await
    {
        Ok(_) => info!(username = %config.default_admin_username, "Default admin created"),
        Err(e) => warn!(error = %e, "Failed to create default admin"),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await;

    db::ensure_schema(&pool)
        .await
        .expect("Failed to apply database schema");

    bootstrap_default_admin(&pool, &config).await;

    let windows = AttendanceWindows::from_limits(config.attendance_time_limit, config.late_time_limit);

    let notifier: Arc<dyn Notifier> = match TwilioNotifier::from_config(&config) {
        Some(twilio) => {
            info!("Twilio client initialized");
            Arc::new(twilio)
        }
        None => {
            warn!("SMS notifications disabled: Twilio not configured");
            Arc::new(NoopNotifier)
        }
    };

    let ctx = AppContext::new(pool.clone(), notifier, windows);

    let pool_for_filter_warmup = pool.clone();
    let pool_for_cache_warmup = pool.clone();
    let pool_for_token_purge = pool.clone();
    // clone what the server closure needs BEFORE moving config
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    actix_web::rt::spawn(async move {
        if let Err(e) = code_filter::warmup_code_filter(&pool_for_filter_warmup, 100).await {
            eprintln!("Failed to warmup scan code filter: {:?}", e);
        }
    });

    actix_web::rt::spawn(async move {
        // Warm up students registered in the last 30 days in batches of 250
        if let Err(e) = regno_cache::warmup_regno_cache(&pool_for_cache_warmup, 30, 250).await {
            eprintln!("Failed to warmup reg no cache: {:?}", e);
        }
    });

    actix_web::rt::spawn(async move {
        match purge_expired_refresh_tokens(&pool_for_token_purge).await {
            Ok(purged) => info!(purged, "Expired refresh tokens purged"),
            Err(e) => warn!(error = %e, "Failed to purge expired refresh tokens"),
        }
    });

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(ctx.clone()))
            .app_data(Data::new(config.clone()))
            .service(index)
            // Configure public + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}

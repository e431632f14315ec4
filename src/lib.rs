pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod money;
pub mod openapi;
pub mod schema;
pub mod store;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::application::OrderService;
use crate::domain::ports::Executor;
use crate::errors::AppError;

pub use db::{connect_with_retry, create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    log::info!("Applied {} pending migration(s)", applied.len());
    Ok(())
}

/// Routes and extractor settings shared by the server and the API tests.
/// The `OrderService<E>` itself is registered by the caller as app data.
pub fn configure<E: Executor>(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid request body: {err}")).into()
    }))
    .route("/", web::get().to(handlers::home))
    .route("/products", web::get().to(handlers::products::list_products::<E>))
    .route("/order", web::post().to(handlers::orders::create_order::<E>))
    .route("/orders/{id}", web::get().to(handlers::orders::get_order::<E>));
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server<E: Executor>(
    service: OrderService<E>,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let service = web::Data::new(service);
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .wrap(Logger::default())
            .configure(configure::<E>)
            .service(openapi::swagger_ui())
            .default_service(web::to(handlers::not_found))
    })
    .bind((host.to_string(), port))?
    .run())
}

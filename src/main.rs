use std::process;

use dotenvy::dotenv;
use order_api::application::OrderService;
use order_api::config::{AppConfig, Backend};
use order_api::infrastructure::{MemoryExecutor, MemoryStore, PgExecutor};
use order_api::{build_server, connect_with_retry, run_migrations};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        log::error!("Invalid configuration: {}", e);
        process::exit(1);
    });

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    match config.backend {
        Backend::InMemory => {
            log::info!("Using the in-memory store with the sample catalog");
            let executor = MemoryExecutor::new(MemoryStore::with_sample_catalog());
            build_server(OrderService::new(executor), &config.host, config.port)?.await
        }
        Backend::Postgres { ref database_url } => {
            let pool = connect_with_retry(database_url, config.connect_retries, config.retry_delay)
                .unwrap_or_else(|e| {
                    log::error!(
                        "Could not connect to the database after {} attempts: {}",
                        config.connect_retries,
                        e
                    );
                    process::exit(1);
                });
            if let Err(e) = run_migrations(&pool) {
                log::error!("Failed to run database migrations: {}", e);
                process::exit(1);
            }
            let executor = PgExecutor::new(pool);
            build_server(OrderService::new(executor), &config.host, config.port)?.await
        }
    }
}

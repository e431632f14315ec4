use std::thread;
use std::time::Duration;

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Build a pool. Fails if no connection can be opened within the timeout.
pub fn create_pool(database_url: &str) -> Result<DbPool, PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .connection_timeout(CONNECTION_TIMEOUT)
        .build(manager)
}

/// Keep trying to build a pool, `attempts` times at most, sleeping `delay`
/// between failures. Returns the last error once attempts are exhausted.
pub fn connect_with_retry(
    database_url: &str,
    attempts: u32,
    delay: Duration,
) -> Result<DbPool, PoolError> {
    let mut attempt = 1;
    loop {
        match create_pool(database_url) {
            Ok(pool) => {
                log::info!("Successfully connected to the database");
                return Ok(pool);
            }
            Err(e) if attempt < attempts => {
                log::warn!(
                    "Database connection attempt {}/{} failed: {}. Retrying in {:?}...",
                    attempt,
                    attempts,
                    e,
                    delay
                );
                thread::sleep(delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

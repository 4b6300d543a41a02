use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, warn};
use std::time::Duration;

const MAX_CONNECT_RETRIES: u32 = 5;
const MAX_CONNECTIONS: u32 = 10;

/// Connects with exponential backoff, starting at 2s between attempts.
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let mut attempt = 0;
    let mut wait = Duration::from_secs(2);

    loop {
        let result = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await;

        match result {
            Ok(pool) => {
                info!(max_connections = MAX_CONNECTIONS, "Document store connection established");
                return Ok(pool);
            }
            Err(e) if attempt < MAX_CONNECT_RETRIES => {
                attempt += 1;
                warn!(
                    attempt,
                    max_attempts = MAX_CONNECT_RETRIES,
                    retry_in = %humantime::format_duration(wait),
                    error = %e,
                    "Document store connection failed, retrying"
                );

                tokio::time::sleep(wait).await;
                wait *= 2;
            }
            Err(e) => return Err(e),
        }
    }
}

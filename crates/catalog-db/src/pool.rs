//! PostgreSQL connection pool for the catalog.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, warn};

use catalog_core::defaults::{
    DB_ACQUIRE_TIMEOUT_SECS, DB_IDLE_TIMEOUT_SECS, DB_MAX_CONNECTIONS, DB_MAX_LIFETIME_SECS,
};
use catalog_core::{Error, Result};

/// Pool sizing chosen by the server configuration.
///
/// Idle timeout and connection lifetime are fixed; each request holds at most
/// one connection, so only the size and the wait for a free connection vary
/// between deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    /// How long a request waits for a free connection before failing.
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DB_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DB_ACQUIRE_TIMEOUT_SECS),
        }
    }
}

impl PoolConfig {
    /// Checked sizing. A pool needs at least one connection and a nonzero wait.
    pub fn new(max_connections: u32, acquire_timeout: Duration) -> Result<Self> {
        if max_connections == 0 {
            return Err(Error::Config(
                "database pool needs at least one connection".to_string(),
            ));
        }
        if acquire_timeout.is_zero() {
            return Err(Error::Config(
                "database acquire timeout must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            max_connections,
            acquire_timeout,
        })
    }

    /// Unconnected pool options for this sizing.
    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(1)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(Duration::from_secs(DB_IDLE_TIMEOUT_SECS))
            .max_lifetime(Duration::from_secs(DB_MAX_LIFETIME_SECS))
    }

    /// Open a pool against `database_url`.
    pub async fn connect(&self, database_url: &str) -> Result<PgPool> {
        let start = Instant::now();
        let pool = self
            .pool_options()
            .connect(database_url)
            .await
            .map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "pool",
            op = "connect",
            max_connections = self.max_connections,
            acquire_timeout_secs = self.acquire_timeout.as_secs(),
            pool_size = pool.size(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Database pool ready"
        );
        Ok(pool)
    }
}

/// Log pool occupancy, warning when every connection is busy.
pub fn log_pool_metrics(pool: &PgPool) {
    let size = pool.size();
    let idle = pool.num_idle();

    if idle == 0 && size > 0 {
        warn!(
            subsystem = "db",
            component = "pool",
            pool_size = size,
            "Connection pool has no idle connections"
        );
    } else {
        debug!(
            subsystem = "db",
            component = "pool",
            pool_size = size,
            pool_idle = idle,
            "Pool occupancy"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sizing() {
        let config = PoolConfig::default();
        assert_eq!(config.max_connections, DB_MAX_CONNECTIONS);
        assert_eq!(
            config.acquire_timeout,
            Duration::from_secs(DB_ACQUIRE_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_new_accepts_positive_sizing() {
        let config = PoolConfig::new(3, Duration::from_secs(5)).unwrap();
        assert_eq!(config.max_connections, 3);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_new_rejects_empty_pool() {
        let err = PoolConfig::new(0, Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("at least one connection"));
    }

    #[test]
    fn test_new_rejects_zero_timeout() {
        let err = PoolConfig::new(5, Duration::ZERO).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}

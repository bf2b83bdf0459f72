//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use rand::RngCore;
use tracing::warn;

use catalog_core::defaults;
use catalog_db::PoolConfig;

use crate::messages::Locale;

/// Runtime settings for the admin server.
#[derive(Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_acquire_timeout_secs: u64,
    pub host: String,
    pub port: u16,
    /// Root directory of the filesystem storage backend.
    pub file_storage_path: String,
    /// URL prefix under which stored images are served.
    pub public_image_base_url: String,
    pub max_upload_size_bytes: usize,
    pub max_body_size_bytes: usize,
    /// HMAC key for delete tokens.
    pub csrf_secret: Vec<u8>,
    pub default_locale: Locale,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("database_max_connections", &self.database_max_connections)
            .field(
                "database_acquire_timeout_secs",
                &self.database_acquire_timeout_secs,
            )
            .field("host", &self.host)
            .field("port", &self.port)
            .field("file_storage_path", &self.file_storage_path)
            .field("public_image_base_url", &self.public_image_base_url)
            .field("max_upload_size_bytes", &self.max_upload_size_bytes)
            .field("max_body_size_bytes", &self.max_body_size_bytes)
            .field("default_locale", &self.default_locale)
            .finish_non_exhaustive()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/catalog".to_string(),
            database_max_connections: defaults::DB_MAX_CONNECTIONS,
            database_acquire_timeout_secs: defaults::DB_ACQUIRE_TIMEOUT_SECS,
            host: "0.0.0.0".to_string(),
            port: defaults::SERVER_PORT,
            file_storage_path: defaults::FILE_STORAGE_PATH.to_string(),
            public_image_base_url: defaults::PUBLIC_IMAGE_BASE_URL.to_string(),
            max_upload_size_bytes: defaults::MAX_UPLOAD_SIZE_BYTES,
            max_body_size_bytes: defaults::MAX_BODY_SIZE_BYTES,
            csrf_secret: random_secret(),
            default_locale: Locale::default(),
        }
    }
}

impl ServerConfig {
    /// Read settings from environment variables, falling back to defaults.
    ///
    /// Unparseable numbers are logged and replaced by their default.
    pub fn from_env() -> Self {
        let base = Self::default();

        let csrf_secret = match std::env::var("CSRF_SECRET") {
            Ok(secret) if !secret.is_empty() => secret.into_bytes(),
            _ => {
                warn!(
                    subsystem = "api",
                    component = "config",
                    "CSRF_SECRET not set; delete tokens will not survive a restart"
                );
                base.csrf_secret
            }
        };

        Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or(base.database_url),
            database_max_connections: env_number(
                "DATABASE_MAX_CONNECTIONS",
                base.database_max_connections,
            ),
            database_acquire_timeout_secs: env_number(
                "DATABASE_ACQUIRE_TIMEOUT_SECS",
                base.database_acquire_timeout_secs,
            ),
            host: std::env::var("HOST").unwrap_or(base.host),
            port: env_number("PORT", base.port),
            file_storage_path: std::env::var("FILE_STORAGE_PATH")
                .unwrap_or(base.file_storage_path),
            public_image_base_url: std::env::var("PUBLIC_IMAGE_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(base.public_image_base_url),
            max_upload_size_bytes: env_number("MAX_UPLOAD_SIZE_BYTES", base.max_upload_size_bytes),
            max_body_size_bytes: env_number("MAX_BODY_SIZE_BYTES", base.max_body_size_bytes),
            csrf_secret,
            default_locale: std::env::var("CATALOG_LOCALE")
                .ok()
                .and_then(|l| Locale::parse(&l))
                .unwrap_or(base.default_locale),
        }
    }

    /// Connection pool sizing. Zero connections or a zero timeout is a
    /// configuration error.
    pub fn pool_config(&self) -> catalog_core::Result<PoolConfig> {
        PoolConfig::new(
            self.database_max_connections,
            Duration::from_secs(self.database_acquire_timeout_secs),
        )
    }

    /// Listen address from `host` and `port`.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    /// Whether stored images are served by this process under a local path.
    pub fn serves_media(&self) -> bool {
        self.public_image_base_url.starts_with('/') && self.public_image_base_url.len() > 1
    }
}

fn env_number<T: std::str::FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(
                subsystem = "api",
                component = "config",
                variable = name,
                value = %raw,
                fallback = %default,
                "Invalid number in environment, using default"
            );
            default
        }),
        Err(_) => default,
    }
}

fn random_secret() -> Vec<u8> {
    let mut secret = vec![0u8; 32];
    rand::thread_rng().fill_bytes(&mut secret);
    secret
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.public_image_base_url, "/media");
        assert_eq!(config.max_upload_size_bytes, 10 * 1024 * 1024);
        assert_eq!(config.csrf_secret.len(), 32);
        assert!(config.serves_media());
    }

    #[test]
    fn test_pool_config_from_settings() {
        let config = ServerConfig {
            database_max_connections: 4,
            database_acquire_timeout_secs: 7,
            ..Default::default()
        };
        let pool = config.pool_config().unwrap();
        assert_eq!(pool.max_connections, 4);
        assert_eq!(pool.acquire_timeout, Duration::from_secs(7));

        let default_pool = ServerConfig::default().pool_config().unwrap();
        assert_eq!(default_pool, PoolConfig::default());
    }

    #[test]
    fn test_empty_pool_is_config_error() {
        let config = ServerConfig {
            database_max_connections: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.pool_config(),
            Err(catalog_core::Error::Config(_))
        ));
    }

    #[test]
    fn test_random_secrets_differ() {
        assert_ne!(random_secret(), random_secret());
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Default::default()
        };
        assert_eq!(config.socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_absolute_media_url_is_not_served_locally() {
        let config = ServerConfig {
            public_image_base_url: "https://cdn.example.com/catalog".to_string(),
            ..Default::default()
        };
        assert!(!config.serves_media());
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = ServerConfig::default();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("csrf_secret"));
        assert!(!debug.contains("database_url"));
    }
}

//! Configuration module
//!
//! Settings are read from the environment (after loading an optional `.env`
//! file) into `RosterConfig`, which is wrapped by `Config` and exposed to the
//! rest of the workspace through getters.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::storage_types::StorageBackend;

const DEFAULT_PORT: u16 = 3000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const SIGNED_URL_TTL_SECS: u64 = 3600;
const MAX_PHOTO_SIZE_MB: usize = 5;
const NOTIFICATION_TIMEOUT_SECS: u64 = 10;
const MAX_ALLOCATION_ATTEMPTS: u32 = 5;
const SMTP_PORT: u16 = 587;

/// Server, database and HTTP settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
}

/// File storage settings
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub local_storage_path: String,
    pub local_storage_base_url: String,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub signed_url_ttl_secs: u64,
    pub max_photo_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
}

/// Outbound email settings
#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_tls: bool,
    pub notification_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct RosterConfig {
    pub base: BaseConfig,
    pub storage: StorageConfig,
    pub email: EmailConfig,
    pub organization_name: String,
    pub portal_url: Option<String>,
    pub max_allocation_attempts: u32,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<RosterConfig>);

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = RosterConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.0.validate()
    }

    pub fn is_production(&self) -> bool {
        let env = self.0.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.0.base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.0.base.environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.0.base.cors_origins
    }

    pub fn database_url(&self) -> &str {
        &self.0.base.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.0.base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.0.base.db_timeout_seconds
    }

    pub fn jwt_secret(&self) -> &str {
        &self.0.base.jwt_secret
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.0.storage
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.0.storage.backend
    }

    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.0.storage.signed_url_ttl_secs)
    }

    pub fn max_photo_size_bytes(&self) -> usize {
        self.0.storage.max_photo_size_bytes
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.0.storage.allowed_extensions
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.0.storage.allowed_content_types
    }

    pub fn email(&self) -> &EmailConfig {
        &self.0.email
    }

    pub fn email_enabled(&self) -> bool {
        self.0.email.enabled
    }

    pub fn notification_timeout(&self) -> Duration {
        Duration::from_secs(self.0.email.notification_timeout_secs)
    }

    pub fn organization_name(&self) -> &str {
        &self.0.organization_name
    }

    pub fn portal_url(&self) -> Option<&str> {
        self.0.portal_url.as_deref()
    }

    pub fn max_allocation_attempts(&self) -> u32 {
        self.0.max_allocation_attempts
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|value| value.trim().to_lowercase().parse().unwrap_or(default))
        .unwrap_or(default)
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn env_list(key: &str, default: &str) -> Vec<String> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl RosterConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins: cors_origins_str
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: env_parse("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
        };

        let backend = match env_optional("STORAGE_BACKEND") {
            Some(value) => value.parse::<StorageBackend>()?,
            None => StorageBackend::Local,
        };

        let storage = StorageConfig {
            backend,
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|_| "./uploads".to_string()),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL")
                .unwrap_or_else(|_| "/api/v1/files".to_string()),
            s3_bucket: env_optional("S3_BUCKET"),
            s3_region: env_optional("S3_REGION").or_else(|| env_optional("AWS_REGION")),
            s3_endpoint: env_optional("S3_ENDPOINT"),
            signed_url_ttl_secs: env_parse("SIGNED_URL_TTL_SECS", SIGNED_URL_TTL_SECS),
            max_photo_size_bytes: env_parse("MAX_PHOTO_SIZE_MB", MAX_PHOTO_SIZE_MB) * 1024 * 1024,
            allowed_extensions: env_list("ALLOWED_IMAGE_EXTENSIONS", "jpg,jpeg,png,gif,webp"),
            allowed_content_types: env_list(
                "ALLOWED_IMAGE_CONTENT_TYPES",
                "image/jpeg,image/png,image/gif,image/webp",
            ),
        };

        let email = EmailConfig {
            enabled: env_flag("EMAIL_ENABLED", false),
            smtp_host: env_optional("SMTP_HOST"),
            smtp_port: env_parse("SMTP_PORT", SMTP_PORT),
            smtp_user: env_optional("SMTP_USER"),
            smtp_password: env_optional("SMTP_PASSWORD"),
            smtp_from: env_optional("SMTP_FROM"),
            smtp_tls: env_flag("SMTP_TLS", true),
            notification_timeout_secs: env_parse(
                "NOTIFICATION_TIMEOUT_SECS",
                NOTIFICATION_TIMEOUT_SECS,
            ),
        };

        let config = RosterConfig {
            base,
            storage,
            email,
            organization_name: env::var("ORGANIZATION_NAME")
                .unwrap_or_else(|_| "Roster".to_string()),
            portal_url: env_optional("PORTAL_URL"),
            max_allocation_attempts: env_parse("MAX_ALLOCATION_ATTEMPTS", MAX_ALLOCATION_ATTEMPTS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !self.base.database_url.starts_with("postgresql://")
            && !self.base.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.email.enabled && (self.email.smtp_host.is_none() || self.email.smtp_from.is_none())
        {
            return Err(anyhow::anyhow!(
                "EMAIL_ENABLED=true requires SMTP_HOST and SMTP_FROM to be set"
            ));
        }

        if self.email.notification_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "NOTIFICATION_TIMEOUT_SECS must be greater than zero"
            ));
        }

        if self.max_allocation_attempts == 0 {
            return Err(anyhow::anyhow!(
                "MAX_ALLOCATION_ATTEMPTS must be greater than zero"
            ));
        }

        match self.storage.backend {
            StorageBackend::S3 => {
                if self.storage.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.storage.signed_url_ttl_secs == 0 {
                    return Err(anyhow::anyhow!(
                        "SIGNED_URL_TTL_SECS must be greater than zero"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.storage.local_storage_path.trim().is_empty() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must not be empty when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RosterConfig {
        RosterConfig {
            base: BaseConfig {
                server_port: 3000,
                environment: "test".to_string(),
                cors_origins: vec!["*".to_string()],
                database_url: "postgresql://localhost/roster".to_string(),
                db_max_connections: 5,
                db_timeout_seconds: 5,
                jwt_secret: "a".repeat(32),
            },
            storage: StorageConfig {
                backend: StorageBackend::Local,
                local_storage_path: "./uploads".to_string(),
                local_storage_base_url: "/api/v1/files".to_string(),
                s3_bucket: None,
                s3_region: None,
                s3_endpoint: None,
                signed_url_ttl_secs: 3600,
                max_photo_size_bytes: 1024,
                allowed_extensions: vec!["jpg".to_string()],
                allowed_content_types: vec!["image/jpeg".to_string()],
            },
            email: EmailConfig {
                enabled: false,
                smtp_host: None,
                smtp_port: 587,
                smtp_user: None,
                smtp_password: None,
                smtp_from: None,
                smtp_tls: true,
                notification_timeout_secs: 10,
            },
            organization_name: "Roster".to_string(),
            portal_url: None,
            max_allocation_attempts: 5,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let mut config = sample();
        config.base.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_s3_backend_requires_bucket() {
        let mut config = sample();
        config.storage.backend = StorageBackend::S3;
        assert!(config.validate().is_err());

        config.storage.s3_bucket = Some("photos".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_email_requires_smtp_settings() {
        let mut config = sample();
        config.email.enabled = true;
        assert!(config.validate().is_err());

        config.email.smtp_host = Some("smtp.example.com".to_string());
        config.email.smtp_from = Some("noreply@example.com".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_getters_expose_durations() {
        let config = Config(Box::new(sample()));
        assert_eq!(config.notification_timeout(), Duration::from_secs(10));
        assert_eq!(config.signed_url_ttl(), Duration::from_secs(3600));
        assert!(!config.is_production());
    }
}

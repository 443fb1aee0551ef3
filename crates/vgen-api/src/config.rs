//! API configuration.

/// How requests are authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Verify Firebase ID tokens
    Firebase,
    /// Trust `X-User-Id` (or the configured default user). Local demos only.
    Development,
}

/// Where sequence and video documents live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    /// Process-local maps; nothing survives a restart
    Memory,
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second, per client IP
    pub rate_limit_rps: u32,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    pub auth_mode: AuthMode,
    /// User id assumed in development mode when no `X-User-Id` is sent
    pub dev_user_id: Option<String>,
    /// Firebase project the ID tokens are issued for
    pub firebase_project_id: Option<String>,
    pub document_store: StoreBackend,
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            max_body_size: 1024 * 1024, // 1MB
            environment: "development".to_string(),
            auth_mode: AuthMode::Firebase,
            dev_user_id: None,
            firebase_project_id: None,
            document_store: StoreBackend::Firestore,
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: std::env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.rate_limit_rps),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            auth_mode: match std::env::var("AUTH_MODE").map(|v| v.to_lowercase()).as_deref() {
                Ok("development") | Ok("dev") => AuthMode::Development,
                _ => AuthMode::Firebase,
            },
            dev_user_id: std::env::var("DEV_USER_ID").ok().filter(|s| !s.is_empty()),
            firebase_project_id: std::env::var("FIREBASE_PROJECT_ID")
                .or_else(|_| std::env::var("GCP_PROJECT_ID"))
                .ok()
                .filter(|s| !s.is_empty()),
            document_store: match std::env::var("DOCUMENT_STORE").map(|v| v.to_lowercase()).as_deref() {
                Ok("memory") => StoreBackend::Memory,
                _ => StoreBackend::Firestore,
            },
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_from_env_reads_modes() {
        std::env::set_var("AUTH_MODE", "development");
        std::env::set_var("DEV_USER_ID", "demo-user");
        std::env::set_var("DOCUMENT_STORE", "memory");
        std::env::set_var("API_PORT", "9100");

        let config = ApiConfig::from_env();
        assert_eq!(config.auth_mode, AuthMode::Development);
        assert_eq!(config.dev_user_id.as_deref(), Some("demo-user"));
        assert_eq!(config.document_store, StoreBackend::Memory);
        assert_eq!(config.port, 9100);

        std::env::remove_var("AUTH_MODE");
        std::env::remove_var("DEV_USER_ID");
        std::env::remove_var("DOCUMENT_STORE");
        std::env::remove_var("API_PORT");

        let config = ApiConfig::from_env();
        assert_eq!(config.auth_mode, AuthMode::Firebase);
        assert_eq!(config.document_store, StoreBackend::Firestore);
    }
}

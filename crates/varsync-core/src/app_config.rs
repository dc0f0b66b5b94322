#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub catalog_base_url: String,
    pub catalog_api_token: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub catalog_request_timeout_secs: u64,
    pub catalog_user_agent: String,
    pub catalog_max_retries: u32,
    pub catalog_retry_backoff_base_ms: u64,
    /// Multiplier from unit prices to catalog minor units.
    pub price_scale: i64,
    pub tracker_initial_interval_ms: u64,
    /// Interval multiplier applied after each non-terminal poll; `>= 1.0`.
    pub tracker_growth_factor: f64,
    pub tracker_max_interval_ms: u64,
    pub tracker_max_polls: u32,
    pub batch_max_concurrent: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("catalog_base_url", &self.catalog_base_url)
            .field(
                "catalog_api_token",
                &self.catalog_api_token.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "catalog_request_timeout_secs",
                &self.catalog_request_timeout_secs,
            )
            .field("catalog_user_agent", &self.catalog_user_agent)
            .field("catalog_max_retries", &self.catalog_max_retries)
            .field(
                "catalog_retry_backoff_base_ms",
                &self.catalog_retry_backoff_base_ms,
            )
            .field("price_scale", &self.price_scale)
            .field(
                "tracker_initial_interval_ms",
                &self.tracker_initial_interval_ms,
            )
            .field("tracker_growth_factor", &self.tracker_growth_factor)
            .field("tracker_max_interval_ms", &self.tracker_max_interval_ms)
            .field("tracker_max_polls", &self.tracker_max_polls)
            .field("batch_max_concurrent", &self.batch_max_concurrent)
            .finish()
    }
}

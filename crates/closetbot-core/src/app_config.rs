use std::net::SocketAddr;

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
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub api_token: Option<String>,
    pub api_token_hash_salt: Option<String>,

    pub discovery_access_token: String,
    pub discovery_business_account_id: String,
    pub discovery_base_url: String,
    pub discovery_hourly_ceiling: u32,
    pub discovery_request_timeout_secs: u64,
    pub discovery_max_retries: u32,
    pub discovery_retry_base_delay_secs: u64,

    pub cache_profile_ttl_secs: u64,
    pub cache_media_ttl_secs: u64,

    pub job_worker_concurrency: usize,
    pub job_wall_clock_limit_secs: u64,
    pub job_dispatch_max_retries: u32,
    pub job_dispatch_retry_cooldown_secs: u64,

    pub data_retention_days: u32,

    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("api_token", &self.api_token.as_ref().map(|_| "[redacted]"))
            .field(
                "api_token_hash_salt",
                &self.api_token_hash_salt.as_ref().map(|_| "[redacted]"),
            )
            .field("discovery_access_token", &"[redacted]")
            .field("discovery_business_account_id", &"[redacted]")
            .field("discovery_base_url", &self.discovery_base_url)
            .field("discovery_hourly_ceiling", &self.discovery_hourly_ceiling)
            .field("discovery_request_timeout_secs", &self.discovery_request_timeout_secs)
            .field("discovery_max_retries", &self.discovery_max_retries)
            .field("discovery_retry_base_delay_secs", &self.discovery_retry_base_delay_secs)
            .field("cache_profile_ttl_secs", &self.cache_profile_ttl_secs)
            .field("cache_media_ttl_secs", &self.cache_media_ttl_secs)
            .field("job_worker_concurrency", &self.job_worker_concurrency)
            .field("job_wall_clock_limit_secs", &self.job_wall_clock_limit_secs)
            .field("job_dispatch_max_retries", &self.job_dispatch_max_retries)
            .field("job_dispatch_retry_cooldown_secs", &self.job_dispatch_retry_cooldown_secs)
            .field("data_retention_days", &self.data_retention_days)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}

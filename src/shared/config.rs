use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
    pub access_token: Option<String>,
    /// Per-request timeout in seconds. A stalled call surfaces as a
    /// transient failure instead of wedging a drain pass.
    pub request_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_sync: bool,
    pub sync_interval: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: default_database_url(),
                max_connections: 5,
                connection_timeout: 30,
            },
            remote: RemoteConfig {
                base_url: "http://localhost:8055".to_string(),
                access_token: None,
                request_timeout: 30,
            },
            sync: SyncConfig {
                auto_sync: true,
                sync_interval: 300, // 5 minutes
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("SYNCDECK_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.database.url = v;
            }
        }
        if let Ok(v) = std::env::var("SYNCDECK_DATABASE_MAX_CONNECTIONS") {
            if let Some(value) = parse_u32(&v) {
                cfg.database.max_connections = value;
            }
        }
        if let Ok(v) = std::env::var("SYNCDECK_REMOTE_URL") {
            if !v.trim().is_empty() {
                cfg.remote.base_url = v.trim_end_matches('/').to_string();
            }
        }
        if let Ok(v) = std::env::var("SYNCDECK_REMOTE_TOKEN") {
            if !v.trim().is_empty() {
                cfg.remote.access_token = Some(v);
            }
        }
        if let Ok(v) = std::env::var("SYNCDECK_REMOTE_TIMEOUT") {
            if let Some(value) = parse_u64(&v) {
                cfg.remote.request_timeout = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("SYNCDECK_AUTO_SYNC") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Ok(v) = std::env::var("SYNCDECK_SYNC_INTERVAL") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.sync_interval = value.max(1);
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.remote.base_url.trim().is_empty() {
            return Err("Remote base_url must not be empty".to_string());
        }
        if self.remote.request_timeout == 0 {
            return Err("Remote request_timeout must be greater than 0".to_string());
        }
        if self.sync.auto_sync && self.sync.sync_interval == 0 {
            return Err("Sync interval must be greater than 0 when auto_sync is enabled".to_string());
        }
        Ok(())
    }
}

fn default_database_url() -> String {
    let dir = dirs::data_local_dir()
        .map(|d| d.join("syncdeck"))
        .unwrap_or_else(|| std::path::PathBuf::from("./data"));
    format!("sqlite:{}?mode=rwc", dir.join("syncdeck.db").display())
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

fn parse_u32(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok()
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub database: DatabaseConfig,
    pub retry: RetryConfig,
    pub sync: SyncCycleConfig,
    pub cache: CacheConfig,
    pub bus: BusConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

/// Default retry policy applied to enqueued jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncCycleConfig {
    pub auto_sync: bool,
    pub sync_interval: u64,
    pub batch_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub default_ttl: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    pub capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite:data/offline-sync.db".to_string(),
                max_connections: 5,
                connection_timeout: 30,
            },
            retry: RetryConfig {
                max_retries: 3,
                base_delay_ms: 5_000,
                max_delay_ms: 300_000, // 5 minute hard cap
            },
            sync: SyncCycleConfig {
                auto_sync: true,
                sync_interval: 300, // 5 minutes
                batch_size: 100,
            },
            cache: CacheConfig {
                default_ttl: 3600, // 1 hour
            },
            bus: BusConfig { capacity: 256 },
        }
    }
}

impl SyncConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("OFFLINE_SYNC_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.database.url = v;
            }
        }
        if let Ok(v) = std::env::var("OFFLINE_SYNC_MAX_RETRIES") {
            if let Some(value) = parse_u32(&v) {
                cfg.retry.max_retries = value;
            }
        }
        if let Ok(v) = std::env::var("OFFLINE_SYNC_BASE_DELAY_MS") {
            if let Some(value) = parse_u64(&v) {
                cfg.retry.base_delay_ms = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("OFFLINE_SYNC_MAX_DELAY_MS") {
            if let Some(value) = parse_u64(&v) {
                cfg.retry.max_delay_ms = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("OFFLINE_SYNC_AUTO_SYNC") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Ok(v) = std::env::var("OFFLINE_SYNC_INTERVAL_SECS") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.sync_interval = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("OFFLINE_SYNC_CACHE_TTL_SECS") {
            if let Some(value) = parse_u64(&v) {
                cfg.cache.default_ttl = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("OFFLINE_SYNC_BUS_CAPACITY") {
            if let Some(value) = parse_u64(&v) {
                cfg.bus.capacity = (value.max(1)) as usize;
            }
        }

        cfg
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.retry.base_delay_ms == 0 {
            return Err("Retry base_delay_ms must be greater than 0".to_string());
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err("Retry max_delay_ms must not be below base_delay_ms".to_string());
        }
        if self.bus.capacity == 0 {
            return Err("Bus capacity must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u32(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok()
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SyncConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_delays() {
        let mut cfg = SyncConfig::default();
        cfg.retry.base_delay_ms = 10_000;
        cfg.retry.max_delay_ms = 5_000;
        assert!(cfg.validate().is_err());
    }
}

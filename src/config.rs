use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::time::Duration;

/// MDC's registered TCP port.
pub const DEFAULT_MDC_PORT: u16 = 1515;

#[derive(Debug)]
pub struct Config {
    pub mdc_port: u16,
    pub mdc_connect_timeout_ms: u64,
    pub mdc_response_timeout_ms: u64,
    pub mdc_reachability_timeout_ms: u64,
    pub mdc_devices_file: PathBuf,
    /// Display ids tried by the addressing-index probe.
    pub mdc_probe_ids: Vec<u8>,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn parse_id_list(s: &str) -> Vec<u8> {
    s.split(',')
        .filter_map(|tok| tok.trim().parse::<u8>().ok())
        .collect()
}

impl Config {
    fn from_env() -> Self {
        let mdc_port = env_parse("MDC_PORT").unwrap_or(DEFAULT_MDC_PORT);
        let mdc_connect_timeout_ms = env_parse("MDC_CONNECT_TIMEOUT_MS").unwrap_or(3000u64);
        let mdc_response_timeout_ms = env_parse("MDC_RESPONSE_TIMEOUT_MS").unwrap_or(5000u64);
        let mdc_reachability_timeout_ms =
            env_parse("MDC_REACHABILITY_TIMEOUT_MS").unwrap_or(1500u64);
        let mdc_devices_file = std::env::var("MDC_DEVICES_FILE")
            .map_or_else(|_| PathBuf::from("saved_devices.json"), PathBuf::from);
        let mdc_probe_ids = std::env::var("MDC_PROBE_IDS")
            .ok()
            .map(|s| parse_id_list(&s))
            .filter(|ids| !ids.is_empty())
            .unwrap_or_else(|| vec![0, 1]);
        Self {
            mdc_port,
            mdc_connect_timeout_ms,
            mdc_response_timeout_ms,
            mdc_reachability_timeout_ms,
            mdc_devices_file,
            mdc_probe_ids,
        }
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.mdc_connect_timeout_ms)
    }

    #[must_use]
    pub const fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.mdc_response_timeout_ms)
    }

    #[must_use]
    pub const fn reachability_timeout(&self) -> Duration {
        Duration::from_millis(self.mdc_reachability_timeout_ms)
    }
}

/// Global config loaded once from environment at first access.
pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::from_env);

/// Convenience accessor
pub fn config() -> &'static Config {
    &GLOBAL_CONFIG
}

//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Unset keys fall back to defaults;
//! malformed values are rejected rather than silently replaced.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::DeviceFilter;
use crate::error::GatewayError;
use crate::hub::DEFAULT_QUEUE_CAPACITY;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8080`).
    pub listen_addr: SocketAddr,

    /// Time between two device snapshots.
    pub poll_interval: Duration,

    /// Vendor ID restriction for observed devices.
    pub vendor_id: Option<u16>,

    /// Product ID restriction for observed devices.
    pub product_id: Option<u16>,

    /// Upper bound for a single broadcast write to one listener.
    pub write_timeout: Duration,

    /// Hub commands that may wait in the queue before callers block.
    pub queue_capacity: usize,

    /// Directory served under `/static`.
    pub static_dir: PathBuf,

    /// Page served for every unmatched path.
    pub index_file: PathBuf,

    /// Tracing output format.
    pub log_format: LogFormat,
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidConfig`] if a variable is set but
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, GatewayError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidConfig`] if a value is present but
    /// malformed or out of range.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GatewayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr = parse_or(&lookup, "LISTEN_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?;
        let poll_interval = parse_millis(&lookup, "POLL_INTERVAL_MS", 1_000)?;
        let write_timeout = parse_millis(&lookup, "HUB_WRITE_TIMEOUT_MS", 5_000)?;
        let queue_capacity = parse_or(&lookup, "HUB_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY)?;
        if queue_capacity == 0 {
            return Err(GatewayError::InvalidConfig(
                "HUB_QUEUE_CAPACITY must be greater than 0".to_string(),
            ));
        }
        let vendor_id = parse_device_id(&lookup, "FILTER_VENDOR_ID")?;
        let product_id = parse_device_id(&lookup, "FILTER_PRODUCT_ID")?;

        let static_dir = lookup("STATIC_DIR").map_or_else(|| PathBuf::from("./static"), PathBuf::from);
        let index_file = lookup("INDEX_FILE").map_or_else(|| PathBuf::from("index.html"), PathBuf::from);

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(GatewayError::InvalidConfig(format!(
                    "LOG_FORMAT must be `text` or `json`, got `{other}`"
                )));
            }
        };

        Ok(Self {
            listen_addr,
            poll_interval,
            vendor_id,
            product_id,
            write_timeout,
            queue_capacity,
            static_dir,
            index_file,
            log_format,
        })
    }

    /// Returns the device filter described by the configuration.
    #[must_use]
    pub const fn device_filter(&self) -> DeviceFilter {
        DeviceFilter {
            vendor_id: self.vendor_id,
            product_id: self.product_id,
        }
    }
}

/// Parses `key` as `T`, returning `default` when it is unset.
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, GatewayError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| GatewayError::InvalidConfig(format!("{key}: {e}"))),
    }
}

/// Parses a strictly positive millisecond duration.
fn parse_millis<F>(lookup: &F, key: &str, default_ms: u64) -> Result<Duration, GatewayError>
where
    F: Fn(&str) -> Option<String>,
{
    let millis: u64 = parse_or(lookup, key, default_ms)?;
    if millis == 0 {
        return Err(GatewayError::InvalidConfig(format!("{key} must be greater than 0")));
    }
    Ok(Duration::from_millis(millis))
}

/// Parses an optional 16-bit ID written as `0x`-prefixed hex or decimal.
fn parse_device_id<F>(lookup: &F, key: &str) -> Result<Option<u16>, GatewayError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed
        .map(Some)
        .map_err(|e| GatewayError::InvalidConfig(format!("{key}: `{raw}` is not a 16-bit ID ({e})")))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<GatewayConfig, GatewayError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        GatewayConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let Ok(config) = load(&[]) else {
            panic!("defaults must load");
        };
        assert_eq!(config.listen_addr, SocketAddr::from(([0, 0, 0, 0], 8080)));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.write_timeout, Duration::from_secs(5));
        assert_eq!(config.queue_capacity, 1_024);
        assert_eq!(config.device_filter(), DeviceFilter::any());
        assert_eq!(config.static_dir, PathBuf::from("./static"));
        assert_eq!(config.index_file, PathBuf::from("index.html"));
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn filters_accept_hex_and_decimal() {
        let Ok(config) = load(&[
            ("FILTER_VENDOR_ID", "0x2020"),
            ("FILTER_PRODUCT_ID", "8224"),
        ]) else {
            panic!("filters must parse");
        };
        assert_eq!(
            config.device_filter(),
            DeviceFilter::any().with_vendor_id(0x2020).with_product_id(0x2020)
        );
    }

    #[test]
    fn empty_filter_means_any() {
        let Ok(config) = load(&[("FILTER_VENDOR_ID", "  ")]) else {
            panic!("empty filter must load");
        };
        assert_eq!(config.vendor_id, None);
    }

    #[test]
    fn malformed_filter_is_rejected() {
        assert!(matches!(
            load(&[("FILTER_VENDOR_ID", "0x1ffff")]),
            Err(GatewayError::InvalidConfig(_))
        ));
        assert!(matches!(
            load(&[("FILTER_PRODUCT_ID", "usb")]),
            Err(GatewayError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(matches!(
            load(&[("POLL_INTERVAL_MS", "0")]),
            Err(GatewayError::InvalidConfig(_))
        ));
        assert!(matches!(
            load(&[("HUB_WRITE_TIMEOUT_MS", "0")]),
            Err(GatewayError::InvalidConfig(_))
        ));
        assert!(matches!(
            load(&[("HUB_QUEUE_CAPACITY", "0")]),
            Err(GatewayError::InvalidConfig(_))
        ));
    }

    #[test]
    fn custom_values_are_used() {
        let Ok(config) = load(&[
            ("LISTEN_ADDR", "127.0.0.1:9000"),
            ("POLL_INTERVAL_MS", "250"),
            ("HUB_QUEUE_CAPACITY", "16"),
            ("STATIC_DIR", "/srv/static"),
            ("LOG_FORMAT", "json"),
        ]) else {
            panic!("custom values must load");
        };
        assert_eq!(config.listen_addr, SocketAddr::from(([127, 0, 0, 1], 9000)));
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.queue_capacity, 16);
        assert_eq!(config.static_dir, PathBuf::from("/srv/static"));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn bad_listen_addr_is_rejected() {
        assert!(matches!(
            load(&[("LISTEN_ADDR", "localhost")]),
            Err(GatewayError::InvalidConfig(_))
        ));
        assert!(matches!(
            load(&[("LOG_FORMAT", "xml")]),
            Err(GatewayError::InvalidConfig(_))
        ));
    }
}

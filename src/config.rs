//! Runtime configuration
//!
//! Read once from the environment at startup:
//!
//! ```bash
//! CERTSTREAM_URL=wss://certstream.calidog.io/
//! CERTSTREAM_SAMPLE=http://localhost:8080/latest.json   # or a file path
//! CERTSTREAM_UTC=1                                      # render times in UTC
//! PORT=8080 STATS_URL=stats                             # relay mode
//! ```

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::types::{FeedError, FeedResult};

/// What the binary runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Live feed with demo replay while waiting for data
    #[default]
    Watch,
    /// Sample replay only, no connection
    Demo,
    /// Relay server re-broadcasting the upstream feed
    Relay,
}

impl FromStr for Mode {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "watch" => Ok(Mode::Watch),
            "demo" => Ok(Mode::Demo),
            "relay" => Ok(Mode::Relay),
            other => Err(FeedError::InvalidConfig(format!(
                "unknown mode '{}', expected watch, demo or relay",
                other
            ))),
        }
    }
}

/// Public certstream endpoint
pub const DEFAULT_STREAM_URL: &str = "wss://certstream.calidog.io/";

/// Configuration for the feed, the driver and the relay
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    /// Upstream certstream WebSocket URL
    pub stream_url: String,
    /// Sample document for demo replay (file path or http(s) URL)
    pub sample_source: Option<String>,
    /// Period between display releases
    pub tick_interval_ms: u64,
    /// Exclusive upper bound of a replayed event's delay
    pub replay_max_delay_ms: u64,
    /// How many sample events a replay schedules
    pub replay_count: usize,
    /// Wait after the connection opens before demo replay starts
    pub replay_grace_ms: u64,
    /// Number of lines kept on screen
    pub visible_capacity: usize,
    /// Fixed wait before reconnecting a dropped stream
    pub reconnect_delay_ms: u64,
    /// Render timestamps in UTC instead of local time
    pub use_utc: bool,
    /// Relay listen port
    pub port: u16,
    /// Relay stats path, without leading slash
    pub stats_path: String,
    /// Relay heartbeat period
    pub heartbeat_interval_secs: u64,
    /// Packets retained for `/latest.json`
    pub recent_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            stream_url: DEFAULT_STREAM_URL.to_string(),
            sample_source: None,
            tick_interval_ms: 100,
            replay_max_delay_ms: 2500,
            replay_count: 25,
            replay_grace_ms: 3000,
            visible_capacity: 10,
            reconnect_delay_ms: 5000,
            use_utc: false,
            port: 8080,
            stats_path: "stats".to_string(),
            heartbeat_interval_secs: 10,
            recent_capacity: 25,
        }
    }
}

impl FeedConfig {
    /// Load configuration from process environment variables
    pub fn from_env() -> FeedResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> FeedResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("CERTSTREAM_URL") {
            config.stream_url = url;
        }
        config.sample_source = lookup("CERTSTREAM_SAMPLE").filter(|s| !s.trim().is_empty());

        parse_into(&lookup, "CERTSTREAM_TICK_MS", &mut config.tick_interval_ms)?;
        parse_into(&lookup, "CERTSTREAM_REPLAY_MAX_DELAY_MS", &mut config.replay_max_delay_ms)?;
        parse_into(&lookup, "CERTSTREAM_REPLAY_COUNT", &mut config.replay_count)?;
        parse_into(&lookup, "CERTSTREAM_REPLAY_GRACE_MS", &mut config.replay_grace_ms)?;
        parse_into(&lookup, "CERTSTREAM_RECONNECT_MS", &mut config.reconnect_delay_ms)?;
        parse_into(&lookup, "PORT", &mut config.port)?;

        if let Some(flag) = lookup("CERTSTREAM_UTC") {
            config.use_utc = matches!(flag.trim(), "1" | "true" | "yes");
        }
        if let Some(path) = lookup("STATS_URL") {
            config.stats_path = path.trim_start_matches('/').to_string();
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> FeedResult<()> {
        if self.tick_interval_ms == 0 {
            return Err(FeedError::InvalidConfig(
                "CERTSTREAM_TICK_MS must be greater than zero".to_string(),
            ));
        }
        if self.replay_max_delay_ms == 0 {
            return Err(FeedError::InvalidConfig(
                "CERTSTREAM_REPLAY_MAX_DELAY_MS must be greater than zero".to_string(),
            ));
        }
        if self.stats_path.is_empty() {
            return Err(FeedError::InvalidConfig("STATS_URL must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn replay_grace(&self) -> Duration {
        Duration::from_millis(self.replay_grace_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }
}

fn parse_into<F, T>(lookup: &F, key: &str, slot: &mut T) -> FeedResult<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(key) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|_| FeedError::InvalidConfig(format!("{} has invalid value '{}'", key, raw)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = FeedConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, FeedConfig::default());
        assert_eq!(config.stream_url, DEFAULT_STREAM_URL);
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
        assert_eq!(config.replay_max_delay_ms, 2500);
        assert_eq!(config.visible_capacity, 10);
    }

    #[test]
    fn test_overrides_from_lookup() {
        let config = FeedConfig::from_lookup(lookup_from(&[
            ("CERTSTREAM_URL", "ws://localhost:8080/"),
            ("CERTSTREAM_SAMPLE", "latest.json"),
            ("CERTSTREAM_TICK_MS", "250"),
            ("CERTSTREAM_UTC", "true"),
            ("PORT", "9000"),
            ("STATS_URL", "/secret-stats"),
        ]))
        .unwrap();

        assert_eq!(config.stream_url, "ws://localhost:8080/");
        assert_eq!(config.sample_source.as_deref(), Some("latest.json"));
        assert_eq!(config.tick_interval_ms, 250);
        assert!(config.use_utc);
        assert_eq!(config.port, 9000);
        assert_eq!(config.stats_path, "secret-stats");
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = FeedConfig::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_zero_tick_is_rejected() {
        let result = FeedConfig::from_lookup(lookup_from(&[("CERTSTREAM_TICK_MS", "0")]));
        assert!(matches!(result, Err(FeedError::InvalidConfig(_))));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("watch".parse::<Mode>().unwrap(), Mode::Watch);
        assert_eq!(" Demo ".parse::<Mode>().unwrap(), Mode::Demo);
        assert_eq!("RELAY".parse::<Mode>().unwrap(), Mode::Relay);
        assert!("serve".parse::<Mode>().is_err());
        assert_eq!(Mode::default(), Mode::Watch);
    }

    #[test]
    fn test_blank_sample_is_ignored() {
        let config = FeedConfig::from_lookup(lookup_from(&[("CERTSTREAM_SAMPLE", "  ")])).unwrap();
        assert!(config.sample_source.is_none());
    }
}

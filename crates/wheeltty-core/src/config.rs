//! Session configuration.
//!
//! Built with [`SessionConfig::default`] plus the `with_*` builders, or read
//! from `WHEELTTY_*` environment variables. Either way [`validate`] runs
//! before any ring is allocated.
//!
//! [`validate`]: SessionConfig::validate

use std::time::Duration;

use crate::error::ConfigError;
use crate::ring::Capacity;

pub const ENV_CONSOLE_CAPACITY: &str = "WHEELTTY_CONSOLE_CAPACITY";
pub const ENV_BUS_CAPACITY: &str = "WHEELTTY_BUS_CAPACITY";
pub const ENV_TICK_HZ: &str = "WHEELTTY_TICK_HZ";
pub const ENV_HANDSHAKE_SECS: &str = "WHEELTTY_HANDSHAKE_SECS";
pub const ENV_SETTLE_SECS: &str = "WHEELTTY_SETTLE_SECS";
pub const ENV_SPIN_LIMIT: &str = "WHEELTTY_SPIN_LIMIT";
pub const ENV_LOCAL_MODE: &str = "WHEELTTY_LOCAL_MODE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Console receive ring size.
    pub console_capacity: usize,
    /// Receive ring size of each bus link.
    pub bus_capacity: usize,
    /// Timer interrupt rate.
    pub tick_hz: u32,
    /// How long to wait for the printwheel reply.
    pub handshake_timeout: Duration,
    /// How long to keep relaying after the handshake while the boards settle.
    pub settle_time: Duration,
    /// Polls allowed for any single hardware wait.
    pub spin_limit: u32,
    /// Start in local mode (keystrokes print) rather than line mode.
    pub local_mode: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            console_capacity: 256,
            bus_capacity: 16,
            tick_hz: 20,
            handshake_timeout: Duration::from_secs(7),
            settle_time: Duration::from_secs(1),
            spin_limit: 100_000,
            local_mode: true,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn with_console_capacity(mut self, slots: usize) -> Self {
        self.console_capacity = slots;
        self
    }

    #[must_use]
    pub fn with_bus_capacity(mut self, slots: usize) -> Self {
        self.bus_capacity = slots;
        self
    }

    #[must_use]
    pub fn with_tick_hz(mut self, tick_hz: u32) -> Self {
        self.tick_hz = tick_hz;
        self
    }

    #[must_use]
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_settle_time(mut self, settle: Duration) -> Self {
        self.settle_time = settle;
        self
    }

    #[must_use]
    pub fn with_spin_limit(mut self, spins: u32) -> Self {
        self.spin_limit = spins;
        self
    }

    #[must_use]
    pub fn local_mode(mut self, enabled: bool) -> Self {
        self.local_mode = enabled;
        self
    }

    /// Check every field, returning the validated ring capacities.
    pub fn validate(&self) -> Result<(Capacity, Capacity), ConfigError> {
        let console = Capacity::new(self.console_capacity).ok_or(ConfigError::Capacity {
            field: "console_capacity",
            value: self.console_capacity,
        })?;
        let bus = Capacity::new(self.bus_capacity).ok_or(ConfigError::Capacity {
            field: "bus_capacity",
            value: self.bus_capacity,
        })?;
        if self.tick_hz == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if self.spin_limit == 0 {
            return Err(ConfigError::ZeroSpinLimit);
        }
        Ok((console, bus))
    }

    /// Convert a duration to timer ticks, rounding down.
    #[must_use]
    pub fn ticks(&self, duration: Duration) -> u32 {
        let ticks = duration.as_millis() * u128::from(self.tick_hz) / 1000;
        u32::try_from(ticks).unwrap_or(u32::MAX)
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each
    /// `WHEELTTY_*` key.
    pub fn from_env_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = parse(&lookup, ENV_CONSOLE_CAPACITY)? {
            config.console_capacity = v;
        }
        if let Some(v) = parse(&lookup, ENV_BUS_CAPACITY)? {
            config.bus_capacity = v;
        }
        if let Some(v) = parse(&lookup, ENV_TICK_HZ)? {
            config.tick_hz = v;
        }
        if let Some(v) = parse(&lookup, ENV_HANDSHAKE_SECS)? {
            config.handshake_timeout = Duration::from_secs(v);
        }
        if let Some(v) = parse(&lookup, ENV_SETTLE_SECS)? {
            config.settle_time = Duration::from_secs(v);
        }
        if let Some(v) = parse(&lookup, ENV_SPIN_LIMIT)? {
            config.spin_limit = v;
        }
        if let Some(raw) = lookup(ENV_LOCAL_MODE) {
            config.local_mode = parse_bool(&raw).ok_or(ConfigError::InvalidEnv {
                key: ENV_LOCAL_MODE,
                value: raw,
            })?;
        }
        config.validate()?;
        Ok(config)
    }
}

fn parse<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { key, value: raw }),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "local" => Some(true),
        "0" | "false" | "no" | "off" | "line" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_validate() {
        let config = SessionConfig::default();
        let (console, bus) = config.validate().unwrap();
        assert_eq!(console.get(), 256);
        assert_eq!(bus.get(), 16);
        assert_eq!(config.ticks(config.handshake_timeout), 140);
        assert_eq!(config.ticks(config.settle_time), 20);
    }

    #[test]
    fn builders() {
        let config = SessionConfig::default()
            .with_console_capacity(64)
            .with_bus_capacity(8)
            .with_tick_hz(100)
            .with_handshake_timeout(Duration::from_millis(250))
            .with_settle_time(Duration::ZERO)
            .with_spin_limit(10)
            .local_mode(false);
        assert!(config.validate().is_ok());
        assert_eq!(config.ticks(config.handshake_timeout), 25);
        assert!(!config.local_mode);
    }

    #[test]
    fn rejects_bad_capacity() {
        let err = SessionConfig::default()
            .with_bus_capacity(24)
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Capacity {
                field: "bus_capacity",
                value: 24
            }
        );
    }

    #[test]
    fn rejects_zero_rates() {
        assert_eq!(
            SessionConfig::default().with_tick_hz(0).validate(),
            Err(ConfigError::ZeroTickRate)
        );
        assert_eq!(
            SessionConfig::default().with_spin_limit(0).validate(),
            Err(ConfigError::ZeroSpinLimit)
        );
    }

    #[test]
    fn env_overrides() {
        let config = SessionConfig::from_env_with(lookup(&[
            (ENV_CONSOLE_CAPACITY, "128"),
            (ENV_HANDSHAKE_SECS, " 2 "),
            (ENV_LOCAL_MODE, "line"),
        ]))
        .unwrap();
        assert_eq!(config.console_capacity, 128);
        assert_eq!(config.handshake_timeout, Duration::from_secs(2));
        assert!(!config.local_mode);
        assert_eq!(config.bus_capacity, 16);
    }

    #[test]
    fn env_rejects_garbage() {
        let err = SessionConfig::from_env_with(lookup(&[(ENV_SPIN_LIMIT, "lots")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidEnv {
                key: ENV_SPIN_LIMIT,
                value: "lots".to_owned()
            }
        );
        let err = SessionConfig::from_env_with(lookup(&[(ENV_LOCAL_MODE, "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { key: ENV_LOCAL_MODE, .. }));
    }

    #[test]
    fn env_result_is_validated() {
        let err =
            SessionConfig::from_env_with(lookup(&[(ENV_CONSOLE_CAPACITY, "100")])).unwrap_err();
        assert!(matches!(err, ConfigError::Capacity { .. }));
    }
}

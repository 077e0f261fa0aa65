//! Error types shared across the crate.
//!
//! Every failure here is recoverable at the session level: a timed-out wait
//! abandons one transfer, a bad configuration is rejected before any ring is
//! allocated.

use std::error::Error;
use std::fmt;

use crate::channel::Link;

/// A bounded busy-wait gave up before its condition became true.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitTimeout {
    /// What the wait was for, e.g. `"bus idle"`.
    pub what: &'static str,
    /// How many polls were spent before giving up.
    pub spins: u32,
}

impl fmt::Display for WaitTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timed out waiting for {} after {} spins", self.what, self.spins)
    }
}

impl Error for WaitTimeout {}

/// A transfer on one serial link failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkError {
    pub link: Link,
    pub source: WaitTimeout,
}

impl LinkError {
    #[must_use]
    pub const fn new(link: Link, source: WaitTimeout) -> Self {
        Self { link, source }
    }
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} link: {}", self.link, self.source)
    }
}

impl Error for LinkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Rejected configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Ring capacities must be powers of two within the supported range.
    Capacity { field: &'static str, value: usize },
    /// The tick rate must be non-zero.
    ZeroTickRate,
    /// A busy-wait budget of zero would fail every wait.
    ZeroSpinLimit,
    /// An environment override could not be parsed.
    InvalidEnv { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Capacity { field, value } => write!(
                f,
                "{field} must be a power of two between {} and {}, got {value}",
                crate::ring::MIN_CAPACITY,
                crate::ring::MAX_CAPACITY
            ),
            Self::ZeroTickRate => write!(f, "tick rate must be non-zero"),
            Self::ZeroSpinLimit => write!(f, "spin limit must be non-zero"),
            Self::InvalidEnv { key, value } => write!(f, "invalid value {value:?} for {key}"),
        }
    }
}

impl Error for ConfigError {}

/// Errors surfaced by [`Session`](crate::session::Session) operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    Link(LinkError),
    Config(ConfigError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(err) => write!(f, "session link failure: {err}"),
            Self::Config(err) => write!(f, "session configuration: {err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Link(err) => Some(err),
            Self::Config(err) => Some(err),
        }
    }
}

impl From<LinkError> for SessionError {
    fn from(err: LinkError) -> Self {
        Self::Link(err)
    }
}

impl From<ConfigError> for SessionError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_error_display_names_link_and_wait() {
        let err = LinkError::new(
            Link::PrinterBoard,
            WaitTimeout {
                what: "bus idle",
                spins: 10,
            },
        );
        assert_eq!(
            err.to_string(),
            "printer board link: timed out waiting for bus idle after 10 spins"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn session_error_wraps_link_error() {
        let link = LinkError::new(
            Link::Console,
            WaitTimeout {
                what: "transmitter ready",
                spins: 1,
            },
        );
        let err = SessionError::from(link);
        assert_eq!(err, SessionError::Link(link));
        assert!(err.to_string().starts_with("session link failure"));
    }

    #[test]
    fn capacity_error_mentions_bounds() {
        let err = ConfigError::Capacity {
            field: "bus_capacity",
            value: 12,
        };
        let text = err.to_string();
        assert!(text.contains("bus_capacity"));
        assert!(text.contains("12"));
    }
}

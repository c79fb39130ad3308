//! Live file configuration.

use std::time::Duration;

/// Default minimum interval between accepted reloads.
pub const DEFAULT_WATCHER_DELAY: Duration = Duration::from_millis(100);

/// How reads issued by accepted triggers relate to each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ReloadPolicy {
    /// Every accepted trigger issues its own read, even if one is still
    /// running.
    ///
    /// Reads may complete out of order, so a slow earlier read can
    /// overwrite content produced by a faster later one. Such regressions
    /// are logged at `warn` level.
    #[default]
    Overlapping,

    /// At most one read runs at a time. Triggers accepted while a read is
    /// running collapse into a single follow-up read.
    Serialized,
}

/// Construction-time settings for a [`LiveFile`](crate::LiveFile).
///
/// With the `serde` feature this can be loaded from a config file; the
/// delay is written in whole milliseconds:
///
/// ```toml
/// watcher_delay_ms = 250
/// policy = "serialized"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Options {
    /// Minimum interval between the starts of two accepted reloads.
    #[cfg_attr(
        feature = "serde",
        serde(rename = "watcher_delay_ms", with = "duration_ms")
    )]
    pub watcher_delay: Duration,

    /// Overlap policy for reads.
    pub policy: ReloadPolicy,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            watcher_delay: DEFAULT_WATCHER_DELAY,
            policy: ReloadPolicy::default(),
        }
    }
}

#[cfg(feature = "serde")]
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let ms = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.watcher_delay, Duration::from_millis(100));
        assert_eq!(options.policy, ReloadPolicy::Overlapping);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_toml() {
        let options: Options =
            toml::from_str("watcher_delay_ms = 250\npolicy = \"serialized\"").unwrap();
        assert_eq!(options.watcher_delay, Duration::from_millis(250));
        assert_eq!(options.policy, ReloadPolicy::Serialized);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json_uses_defaults() {
        let options: Options = serde_json::from_str("{}").unwrap();
        assert_eq!(options, Options::default());

        let json = serde_json::to_string(&Options {
            watcher_delay: Duration::from_millis(40),
            policy: ReloadPolicy::Overlapping,
        })
        .unwrap();
        assert!(json.contains("\"watcher_delay_ms\":40"));
        assert!(json.contains("\"overlapping\""));
    }
}

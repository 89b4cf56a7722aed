use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scopes::ScopeSet;

/// A request for a new authorization token.
///
/// `duration` is a wish, not a promise: the engine clamps it to the server's
/// configured ceiling, and a zero duration means "use the server default".
/// An empty request body decodes to the zero value of this type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthRequest {
    /// The identity the token should be issued to.
    #[serde(default)]
    pub user: String,

    /// Requested permission labels. Duplicates collapse; order is irrelevant.
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Requested validity span, e.g. `"1h30m"`. Zero or absent selects the
    /// server default.
    #[serde(default, with = "duration_str")]
    pub duration: Duration,
}

/// The persistent record binding a token to a user, scope set, and expiration.
///
/// Records are immutable after creation; the only later mutation is the
/// delete-on-expiry performed lazily by the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Authorization {
    /// Opaque, globally unique token string; the primary lookup key.
    pub token: String,

    /// The identity the token was issued to.
    pub user: String,

    /// Permission labels granted to the token.
    pub scopes: ScopeSet,

    /// Instant after which the token is invalid.
    pub expiration: DateTime<Utc>,
}

impl Authorization {
    /// Whether the record is still valid at `now`.
    ///
    /// Validity is derived, never stored: time advances independently of
    /// writes, so it must be re-evaluated on every read.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expiration
    }
}

/// Serde adapter for durations in the humantime string form ("1h30m").
///
/// An empty string decodes to the zero duration, which downstream code treats
/// as "use the server default".
pub mod duration_str {
    use std::time::Duration;

    use serde::de::{self, Deserialize, Deserializer};
    use serde::ser::Serializer;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Ok(Duration::ZERO);
        }
        humantime::parse_duration(&raw).map_err(de::Error::custom)
    }
}

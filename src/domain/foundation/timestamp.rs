//! Timestamp value object for immutable points in time.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, DurationRound, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Last microsecond handed out by [`Timestamp::unique_now_micros`].
static LAST_ISSUED_MICROS: AtomicI64 = AtomicI64::new(i64::MIN);

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp for the current moment at microsecond precision.
    ///
    /// PostgreSQL stores `timestamptz` with microseconds; anything finer would
    /// not survive a round trip and would break keyset cursors.
    pub fn now_micros() -> Self {
        Self::now().truncated_to_micros()
    }

    /// Like [`now_micros`](Self::now_micros), but strictly greater than every
    /// earlier value this process handed out.
    ///
    /// Keyset cursors compare creation times exclusively, so two messages
    /// sharing a microsecond could straddle a page boundary and one would be
    /// skipped.
    pub fn unique_now_micros() -> Self {
        let now = Self::now_micros();
        let now_micros = now.0.timestamp_micros();
        let previous = LAST_ISSUED_MICROS
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now_micros.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        let issued = now_micros.max(previous.saturating_add(1));
        DateTime::<Utc>::from_timestamp_micros(issued)
            .map(Self)
            .unwrap_or(now)
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Checks if this timestamp is after another.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Creates a new timestamp by adding a duration.
    pub fn plus(&self, duration: Duration) -> Self {
        Self(self.0 + duration)
    }

    /// Creates a new timestamp by adding the specified number of milliseconds.
    pub fn plus_millis(&self, millis: i64) -> Self {
        Self(self.0 + Duration::milliseconds(millis))
    }

    /// Drops sub-microsecond precision.
    pub fn truncated_to_micros(&self) -> Self {
        Self(
            self.0
                .duration_trunc(Duration::microseconds(1))
                .unwrap_or(self.0),
        )
    }

    /// RFC 3339 rendering with nanosecond digits, e.g. `2024-01-15T10:30:00.123456000Z`.
    pub fn to_rfc3339_nanos(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }

    /// Parses any RFC 3339 string into a UTC timestamp.
    pub fn parse_rfc3339(s: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc)))
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

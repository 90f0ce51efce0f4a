use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;

/// Lifetime an uploader can pick for an entry.
///
/// Selections are exchanged as short strings (`"1m"`, `"10m"`, `"1h"`,
/// `"1d"`, `"1w"`); `"-1"` requests instant expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TtlChoice {
    OneMinute,
    TenMinutes,
    OneHour,
    OneDay,
    OneWeek,
    /// Gone after the first successful read. Carries the one-week
    /// safety-net expiry in case nobody ever reads it.
    InstantExpire,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid TTL selection: {0:?}")]
pub struct InvalidTtl(pub String);

impl TtlChoice {
    pub const ALL: [TtlChoice; 6] = [
        TtlChoice::OneMinute,
        TtlChoice::TenMinutes,
        TtlChoice::OneHour,
        TtlChoice::OneDay,
        TtlChoice::OneWeek,
        TtlChoice::InstantExpire,
    ];

    /// Expiry applied to instant-expire entries that are never read.
    pub const INSTANT_EXPIRE_SAFETY_NET: Duration = Duration::from_secs(WEEK);

    pub fn duration(self) -> Duration {
        match self {
            TtlChoice::OneMinute => Duration::from_secs(MINUTE),
            TtlChoice::TenMinutes => Duration::from_secs(10 * MINUTE),
            TtlChoice::OneHour => Duration::from_secs(HOUR),
            TtlChoice::OneDay => Duration::from_secs(DAY),
            TtlChoice::OneWeek => Duration::from_secs(WEEK),
            TtlChoice::InstantExpire => Self::INSTANT_EXPIRE_SAFETY_NET,
        }
    }

    pub fn is_instant_expire(self) -> bool {
        self == TtlChoice::InstantExpire
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TtlChoice::OneMinute => "1m",
            TtlChoice::TenMinutes => "10m",
            TtlChoice::OneHour => "1h",
            TtlChoice::OneDay => "1d",
            TtlChoice::OneWeek => "1w",
            TtlChoice::InstantExpire => "-1",
        }
    }
}

impl FromStr for TtlChoice {
    type Err = InvalidTtl;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|choice| choice.as_str() == s)
            .ok_or_else(|| InvalidTtl(s.to_string()))
    }
}

impl fmt::Display for TtlChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests;

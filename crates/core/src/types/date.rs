//! Calendar-day bucket labels and the time zone they are computed in.

use core::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Format of a [`DateLabel`].
const LABEL_FORMAT: &str = "%Y-%m-%d";

/// Offset used when no reference zone is configured (UTC+8).
const DEFAULT_OFFSET_SECONDS: i32 = 8 * 3600;

/// Errors that can occur when parsing a [`DateLabel`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DateLabelError {
    #[error("date label must be a calendar date in YYYY-MM-DD form, got {0:?}")]
    Invalid(String),
}

/// Label of a date bucket: one calendar day, rendered `YYYY-MM-DD`.
///
/// ## Examples
///
/// ```
/// use peerbook_core::DateLabel;
///
/// let label = DateLabel::parse("2024-01-01").unwrap();
/// assert_eq!(label.to_string(), "2024-01-01");
/// assert!(DateLabel::parse("2024-02-30").is_err());
/// assert!(DateLabel::parse("01/01/2024").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateLabel(NaiveDate);

impl DateLabel {
    /// Parse a label from its `YYYY-MM-DD` form.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a valid calendar date in that form.
    pub fn parse(s: &str) -> Result<Self, DateLabelError> {
        let s = s.trim();
        // chrono accepts unpadded fields; labels are always zero-padded
        if s.len() != 10 {
            return Err(DateLabelError::Invalid(s.to_owned()));
        }
        NaiveDate::parse_from_str(s, LABEL_FORMAT)
            .map(Self)
            .map_err(|_| DateLabelError::Invalid(s.to_owned()))
    }
}

impl fmt::Display for DateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(LABEL_FORMAT))
    }
}

impl FromStr for DateLabel {
    type Err = DateLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DateLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing a [`ReferenceZone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceZoneError {
    #[error("invalid UTC offset: {0}")]
    InvalidOffset(String),
    #[error("unknown time zone: {0}")]
    UnknownZone(String),
}

/// Time zone in which "today" is decided when picking a date bucket.
///
/// Accepts IANA names (`Asia/Shanghai`) or fixed offsets (`+08:00`,
/// `-05:30`, `UTC+8`, `GMT-3`, `UTC`). Defaults to UTC+8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceZone {
    Fixed(FixedOffset),
    Named(Tz),
}

impl ReferenceZone {
    /// Parse a zone from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed offsets or unknown zone names.
    pub fn parse(s: &str) -> Result<Self, ReferenceZoneError> {
        let s = s.trim();
        let upper = s.to_ascii_uppercase();

        if matches!(upper.as_str(), "UTC" | "GMT" | "Z") {
            return Ok(Self::Fixed(Utc.fix()));
        }

        if let Some(rest) = upper
            .strip_prefix("UTC")
            .or_else(|| upper.strip_prefix("GMT"))
        {
            return parse_offset(rest)
                .map(Self::Fixed)
                .ok_or_else(|| ReferenceZoneError::InvalidOffset(s.to_owned()));
        }

        if s.starts_with('+') || s.starts_with('-') {
            return parse_offset(s)
                .map(Self::Fixed)
                .ok_or_else(|| ReferenceZoneError::InvalidOffset(s.to_owned()));
        }

        s.parse::<Tz>()
            .map(Self::Named)
            .map_err(|_| ReferenceZoneError::UnknownZone(s.to_owned()))
    }

    /// The bucket label for an instant, as a calendar date in this zone.
    #[must_use]
    pub fn label_for(&self, instant: DateTime<Utc>) -> DateLabel {
        let date = match self {
            Self::Fixed(offset) => instant.with_timezone(offset).date_naive(),
            Self::Named(tz) => instant.with_timezone(tz).date_naive(),
        };
        DateLabel(date)
    }
}

impl Default for ReferenceZone {
    fn default() -> Self {
        FixedOffset::east_opt(DEFAULT_OFFSET_SECONDS)
            .map_or_else(|| Self::Fixed(Utc.fix()), Self::Fixed)
    }
}

impl fmt::Display for ReferenceZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(offset) => write!(f, "{offset}"),
            Self::Named(tz) => f.write_str(tz.name()),
        }
    }
}

impl FromStr for ReferenceZone {
    type Err = ReferenceZoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parse `+H`, `+HH`, `+HH:MM` (or `-`) into a fixed offset.
fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = if let Some(rest) = s.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = s.strip_prefix('-') {
        (-1, rest)
    } else {
        return None;
    };

    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    if hours.is_empty() || hours.len() > 2 || minutes.is_empty() || minutes.len() > 2 {
        return None;
    }

    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..60).contains(&minutes) {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

//! Device identity types reported by clients on first install.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`DeviceId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceIdError {
    /// The input is empty or only whitespace.
    #[error("device id cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("device id must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A client-supplied device identifier.
///
/// Unique within one user's address book. Surrounding whitespace is
/// stripped before validation.
///
/// ## Examples
///
/// ```
/// use peerbook_core::DeviceId;
///
/// assert_eq!(DeviceId::parse("  dev-1 ").unwrap().as_str(), "dev-1");
/// assert!(DeviceId::parse("").is_err());
/// assert!(DeviceId::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Maximum length of a device id, in characters.
    pub const MAX_LENGTH: usize = 255;

    /// Parse a `DeviceId` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or longer than
    /// [`Self::MAX_LENGTH`] characters.
    pub fn parse(s: &str) -> Result<Self, DeviceIdError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DeviceIdError::Empty);
        }
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(DeviceIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the device id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for DeviceId {
    type Err = DeviceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Errors that can occur when parsing a [`Hostname`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HostnameError {
    /// The input is too long.
    #[error("hostname must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// Display name a device reports for itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Hostname(String);

impl Hostname {
    /// Maximum length of a hostname, in characters.
    pub const MAX_LENGTH: usize = 255;

    /// Parse an optional hostname. Blank input means the device sent none.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is longer than
    /// [`Self::MAX_LENGTH`] characters.
    pub fn parse_optional(s: Option<&str>) -> Result<Option<Self>, HostnameError> {
        let Some(trimmed) = s.map(str::trim).filter(|t| !t.is_empty()) else {
            return Ok(None);
        };
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(HostnameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Some(Self(trimmed.to_owned())))
    }

    /// Returns the hostname as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Operating system family a device reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Windows,
    Linux,
    Mac,
    Android,
    Ios,
    /// Any platform string we don't recognize.
    Unknown,
}

impl Platform {
    /// Parse a reported platform string.
    ///
    /// Matching is case-insensitive. Blank input yields `None`; any other
    /// unrecognized value yields [`Platform::Unknown`] so a new client OS
    /// never blocks registration.
    #[must_use]
    pub fn parse_lenient(s: Option<&str>) -> Option<Self> {
        let value = s.map(str::trim).filter(|t| !t.is_empty())?;
        let platform = match value.to_ascii_lowercase().as_str() {
            "windows" | "win" => Self::Windows,
            "linux" => Self::Linux,
            "mac" | "macos" | "darwin" | "osx" => Self::Mac,
            "android" => Self::Android,
            "ios" => Self::Ios,
            _ => Self::Unknown,
        };
        Some(platform)
    }

    /// The canonical lowercase tag, as stored and serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Mac => "mac",
            Self::Android => "android",
            Self::Ios => "ios",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_trims_whitespace() {
        let id = DeviceId::parse("\t123456789 \n").unwrap();
        assert_eq!(id.as_str(), "123456789");
    }

    #[test]
    fn test_device_id_rejects_blank() {
        assert_eq!(DeviceId::parse(""), Err(DeviceIdError::Empty));
        assert_eq!(DeviceId::parse("   "), Err(DeviceIdError::Empty));
    }

    #[test]
    fn test_device_id_length_limit() {
        let at_limit = "a".repeat(DeviceId::MAX_LENGTH);
        assert!(DeviceId::parse(&at_limit).is_ok());

        let over = "a".repeat(DeviceId::MAX_LENGTH + 1);
        assert_eq!(
            DeviceId::parse(&over),
            Err(DeviceIdError::TooLong {
                max: DeviceId::MAX_LENGTH
            })
        );
    }

    #[test]
    fn test_hostname_blank_is_absent() {
        assert_eq!(Hostname::parse_optional(None).unwrap(), None);
        assert_eq!(Hostname::parse_optional(Some("  ")).unwrap(), None);
        assert_eq!(
            Hostname::parse_optional(Some(" office-pc ")).unwrap(),
            Some(Hostname("office-pc".to_owned()))
        );
    }

    #[test]
    fn test_hostname_too_long() {
        let over = "h".repeat(Hostname::MAX_LENGTH + 1);
        assert!(Hostname::parse_optional(Some(&over)).is_err());
    }

    #[test]
    fn test_platform_parsing() {
        assert_eq!(Platform::parse_lenient(Some("linux")), Some(Platform::Linux));
        assert_eq!(
            Platform::parse_lenient(Some("Windows")),
            Some(Platform::Windows)
        );
        assert_eq!(Platform::parse_lenient(Some("macOS")), Some(Platform::Mac));
        assert_eq!(Platform::parse_lenient(Some("iOS")), Some(Platform::Ios));
        assert_eq!(
            Platform::parse_lenient(Some("haiku")),
            Some(Platform::Unknown)
        );
        assert_eq!(Platform::parse_lenient(Some("")), None);
        assert_eq!(Platform::parse_lenient(None), None);
    }

    #[test]
    fn test_platform_tag_round_trips_through_parse() {
        for platform in [
            Platform::Windows,
            Platform::Linux,
            Platform::Mac,
            Platform::Android,
            Platform::Ios,
            Platform::Unknown,
        ] {
            assert_eq!(Platform::parse_lenient(Some(platform.as_str())), Some(platform));
        }
    }
}

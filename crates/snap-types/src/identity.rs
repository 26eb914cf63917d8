use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A signed-in user as reported by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
}

impl UserProfile {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Identifier of one device's local like record.
///
/// Device ids end up in file names and HTTP headers, so they are restricted
/// to ASCII alphanumerics, `-` and `_`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    pub const MAX_LEN: usize = 64;

    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        let invalid = |reason: &str| TypeError::InvalidDeviceId {
            id: id.clone(),
            reason: reason.to_string(),
        };
        if id.is_empty() {
            return Err(invalid("empty"));
        }
        if id.len() > Self::MAX_LEN {
            return Err(invalid("too long"));
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(invalid("only ASCII letters, digits, '-' and '_' are allowed"));
        }
        Ok(Self(id))
    }

    /// A fresh, time-ordered device id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DeviceId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

impl FromStr for DeviceId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({})", self.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_valid_and_unique() {
        let a = DeviceId::generate();
        let b = DeviceId::generate();
        assert_ne!(a, b);
        assert!(DeviceId::new(a.as_str()).is_ok());
    }

    #[test]
    fn rejects_path_like_ids() {
        assert!(DeviceId::new("../etc").is_err());
        assert!(DeviceId::new("a/b").is_err());
        assert!(DeviceId::new("").is_err());
        assert!(DeviceId::new("x".repeat(65)).is_err());
    }

    #[test]
    fn accepts_simple_ids() {
        let id: DeviceId = "laptop_01-a".parse().unwrap();
        assert_eq!(id.to_string(), "laptop_01-a");
    }

    #[test]
    fn profile_serializes_display_name() {
        let profile = UserProfile::new("u-1", "alice");
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["displayName"], "alice");
    }
}

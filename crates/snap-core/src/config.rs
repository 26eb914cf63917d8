use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BoardError, BoardResult};

/// How shared counters are changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CounterMode {
    /// Use the store's atomic increment. Concurrent devices never lose a
    /// like, and two first adds of the same name create one record.
    #[default]
    Atomic,
    /// Read the count, then write `count + delta`. Two devices that read
    /// before either writes lose one of the updates.
    ReadModifyWrite,
}

/// Behaviour switches for a [`Board`](crate::Board).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub counter_mode: CounterMode,
    /// Never let a decrement take a count below zero.
    pub clamp_at_zero: bool,
    /// Refuse likes and dislikes (and removes) from signed-out sessions.
    /// Adds always require a signed-in user.
    pub require_auth_for_likes: bool,
}

impl BoardConfig {
    /// Read-modify-write counters, no floor, anonymous likes.
    pub fn literal() -> Self {
        Self {
            counter_mode: CounterMode::ReadModifyWrite,
            clamp_at_zero: false,
            require_auth_for_likes: false,
        }
    }

    pub(crate) fn floor(&self) -> Option<i64> {
        self.clamp_at_zero.then_some(0)
    }

    pub fn from_toml_str(s: &str) -> BoardResult<Self> {
        toml::from_str(s).map_err(|e| BoardError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> BoardResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| BoardError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = BoardConfig::default();
        assert_eq!(c.counter_mode, CounterMode::Atomic);
        assert!(!c.clamp_at_zero);
        assert!(!c.require_auth_for_likes);
        assert_eq!(c.floor(), None);
    }

    #[test]
    fn literal_config_uses_read_modify_write() {
        let c = BoardConfig::literal();
        assert_eq!(c.counter_mode, CounterMode::ReadModifyWrite);
    }

    #[test]
    fn parse_toml() {
        let c = BoardConfig::from_toml_str(
            r#"
            counter_mode = "read-modify-write"
            clamp_at_zero = true
            "#,
        )
        .unwrap();
        assert_eq!(c.counter_mode, CounterMode::ReadModifyWrite);
        assert!(c.clamp_at_zero);
        assert!(!c.require_auth_for_likes);
        assert_eq!(c.floor(), Some(0));
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(BoardConfig::from_toml_str("").unwrap(), BoardConfig::default());
    }

    #[test]
    fn bad_toml_is_config_error() {
        assert!(matches!(
            BoardConfig::from_toml_str("counter_mode = \"sometimes\""),
            Err(BoardError::Config(_))
        ));
    }
}

//! Undo manager configuration
//!
//! Loaded from TOML by hosts that want to tune history behaviour without
//! recompiling:
//!
//! ```toml
//! enabled = true
//! max_levels = 50          # 0 keeps unlimited history
//! default_group_name = "Edit"
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Default number of undo groups kept
pub const DEFAULT_MAX_LEVELS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UndoManagerConfig {
    /// Whether actions are recorded at all
    pub enabled: bool,
    /// Groups kept before the oldest are dropped; `None` or `Some(0)` is
    /// unlimited
    pub max_levels: Option<usize>,
    /// Name of groups opened implicitly by [`UndoManager::perform`](crate::UndoManager::perform)
    pub default_group_name: String,
}

impl Default for UndoManagerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_levels: Some(DEFAULT_MAX_LEVELS),
            default_group_name: String::new(),
        }
    }
}

impl UndoManagerConfig {
    /// Parse configuration from TOML; missing keys take their defaults
    ///
    /// # Errors
    /// * `InvalidConfig` - If the text is not valid TOML or a key has the
    ///   wrong type
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Effective history limit, with zero meaning unlimited
    pub fn history_limit(&self) -> Option<usize> {
        self.max_levels.filter(|&levels| levels > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::errors::DataTreeError;

    #[test]
    fn test_defaults() {
        let config = UndoManagerConfig::default();
        assert!(config.enabled);
        assert_eq!(config.history_limit(), Some(100));
        assert_eq!(config.default_group_name, "");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = UndoManagerConfig::from_toml_str("max_levels = 5").unwrap();
        assert!(config.enabled);
        assert_eq!(config.history_limit(), Some(5));
    }

    #[test]
    fn test_zero_levels_is_unlimited() {
        let config = UndoManagerConfig::from_toml_str("max_levels = 0").unwrap();
        assert_eq!(config.history_limit(), None);
    }

    #[test]
    fn test_bad_toml_is_invalid_config() {
        let result = UndoManagerConfig::from_toml_str("enabled = \"yes\"");
        assert!(matches!(result, Err(DataTreeError::InvalidConfig { .. })));
    }
}

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::references::ReferencePolicy;
use crate::EditorError;

pub const DEFAULT_CONFIG_NAME: &str = "scenekit.config.json";

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Undo levels kept; 0 keeps everything
    #[serde(default = "default_undo_levels")]
    pub undo_levels: usize,

    /// Which properties hold weak and group references
    #[serde(default)]
    pub references: ReferencePolicy,
}

fn default_undo_levels() -> usize {
    100
}

impl EditorConfig {
    /// Load config from a directory
    pub fn load(dir: &Path) -> Result<Self, EditorError> {
        let config_path = dir.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: EditorConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(EditorConfig::default())
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            undo_levels: default_undo_levels(),
            references: ReferencePolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "undoLevels": 20,
            "references": {
                "weakProperties": ["labelFor"],
                "groupProperties": { "toggleGroup": "ToggleGroup", "selectionGroup": "SelectionGroup" }
            }
        }"#;

        let config: EditorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.undo_levels, 20);
        assert!(config.references.weak_properties.contains("labelFor"));
        assert!(!config.references.weak_properties.contains("expandedPane"));
        assert_eq!(config.references.group_class("selectionGroup"), Some("SelectionGroup"));
    }

    #[test]
    fn test_default_config() {
        let config: EditorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.undo_levels, 100);
    }

    #[test]
    fn test_load_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(EditorConfig::load(dir.path()).unwrap(), EditorConfig::default());

        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), r#"{ "undoLevels": 0 }"#).unwrap();
        assert_eq!(EditorConfig::load(dir.path()).unwrap().undo_levels, 0);

        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), "{ nope").unwrap();
        assert!(matches!(EditorConfig::load(dir.path()), Err(EditorError::Config(_))));
    }
}

//! Editor settings loaded from JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::DocumentMode;
use crate::canvas_size::CanvasSize;
use crate::history::MAX_UNDO_HISTORY;
use crate::storage::DEFAULT_AUTOSAVE_INTERVAL_SECS;

/// Settings errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Editor settings. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub document_mode: DocumentMode,
    /// Default canvas size. `None` means an unbounded canvas.
    pub canvas_size: Option<CanvasSize>,
    pub autosave_interval_secs: u64,
    pub max_undo_history: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            document_mode: DocumentMode::default(),
            canvas_size: None,
            autosave_interval_secs: DEFAULT_AUTOSAVE_INTERVAL_SECS,
            max_undo_history: MAX_UNDO_HISTORY,
        }
    }
}

impl Settings {
    /// Parse and validate settings from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("no settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.autosave_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "autosaveIntervalSecs must be positive".to_string(),
            ));
        }
        if self.max_undo_history == 0 {
            return Err(ConfigError::Invalid(
                "maxUndoHistory must be positive".to_string(),
            ));
        }
        if let Some(size) = &self.canvas_size {
            if size.is_fixed() && (size.width <= 0.0 || size.height <= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "fixed canvas needs a positive size, got {}x{}",
                    size.width, size.height
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_object_gives_defaults() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.autosave_interval_secs, 30);
        assert_eq!(settings.max_undo_history, 50);
    }

    #[test]
    fn test_parse_multi_page_fixed_canvas() {
        let settings = Settings::from_json(
            r#"{
                "documentMode": "multi-page",
                "canvasSize": { "mode": "fixed", "width": 1024, "height": 768, "autoZoom": true }
            }"#,
        )
        .unwrap();
        assert_eq!(settings.document_mode, DocumentMode::MultiPage);
        let size = settings.canvas_size.unwrap();
        assert!(size.is_fixed() && size.auto_zoom);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            Settings::from_json(r#"{"autosaveIntervalSecs": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Settings::from_json(r#"{"canvasSize": {"mode": "fixed", "width": 0, "height": 10}}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(Settings::from_json("not json"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(Settings::load(&path).unwrap(), Settings::default());

        let mut file = fs::File::create(&path).unwrap();
        write!(file, r#"{{"maxUndoHistory": 5}}"#).unwrap();
        drop(file);

        assert_eq!(Settings::load(&path).unwrap().max_undo_history, 5);
    }
}

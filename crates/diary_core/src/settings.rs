use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calendar::CalendarSystem;
use crate::color::{ColorRamp, Hsl};
use crate::error::HeatmapResult;
use crate::heatmap::HeatmapConfig;

/// User settings as persisted. Calendar names stay raw strings so a bad value
/// in the file is reported at render time instead of discarding the file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HeatmapSettings {
    pub diary_path: PathBuf,
    pub notes_calendar: String,
    pub display_calendar: String,
    pub min_color: Hsl,
    pub max_color: Hsl,
}

impl Default for HeatmapSettings {
    fn default() -> Self {
        Self {
            diary_path: PathBuf::from("Diary"),
            notes_calendar: CalendarSystem::Persian.to_string(),
            display_calendar: CalendarSystem::Persian.to_string(),
            min_color: ColorRamp::DEFAULT_MIN,
            max_color: ColorRamp::DEFAULT_MAX,
        }
    }
}

impl HeatmapSettings {
    pub fn config(&self) -> HeatmapResult<HeatmapConfig> {
        Ok(HeatmapConfig {
            notes_calendar: CalendarSystem::from_setting("notes_calendar", &self.notes_calendar)?,
            display_calendar: CalendarSystem::from_setting(
                "display_calendar",
                &self.display_calendar,
            )?,
            ramp: ColorRamp {
                min: self.min_color.validated("min_color")?,
                max: self.max_color.validated("max_color")?,
            },
        })
    }
}

/// JSON file holding [`HeatmapSettings`].
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing files yield the defaults.
    pub fn load(&self) -> Result<HeatmapSettings> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "no settings file, using defaults");
            return Ok(HeatmapSettings::default());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read settings `{}`", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse settings `{}`", self.path.display()))
    }

    pub fn save(&self, settings: &HeatmapSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write settings `{}`", self.path.display()))?;
        debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HeatmapError;
    use tempfile::tempdir;

    #[test]
    fn defaults_use_persian_calendars_and_green_ramp() {
        let config = HeatmapSettings::default().config().unwrap();
        assert_eq!(config, HeatmapConfig::default());
    }

    #[test]
    fn unknown_calendar_is_a_configuration_error() {
        let settings = HeatmapSettings {
            display_calendar: "julian".into(),
            ..HeatmapSettings::default()
        };
        assert_eq!(
            settings.config().unwrap_err(),
            HeatmapError::InvalidConfiguration {
                key: "display_calendar".into(),
                value: "julian".into(),
            }
        );
    }

    #[test]
    fn out_of_range_color_is_rejected() {
        let settings = HeatmapSettings {
            max_color: Hsl::new_unchecked(134.0, 100.0, 120.0),
            ..HeatmapSettings::default()
        };
        assert!(matches!(
            settings.config(),
            Err(HeatmapError::InvalidConfiguration { ref key, .. }) if key == "max_color"
        ));
    }

    #[test]
    fn save_then_load_and_fill_missing_fields() {
        let temp = tempdir().expect("tempdir");
        let store = SettingsStore::new(temp.path().join("nested/settings.json"));
        assert_eq!(store.load().unwrap(), HeatmapSettings::default());

        let settings = HeatmapSettings {
            diary_path: PathBuf::from("Journal/Daily"),
            notes_calendar: "gregorian".into(),
            ..HeatmapSettings::default()
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);

        fs::write(store.path(), r#"{"display_calendar":"gregorian"}"#).unwrap();
        let partial = store.load().unwrap();
        assert_eq!(partial.display_calendar, "gregorian");
        assert_eq!(partial.diary_path, PathBuf::from("Diary"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().expect("tempdir");
        let store = SettingsStore::new(temp.path().join("settings.json"));
        fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().is_err());
    }
}

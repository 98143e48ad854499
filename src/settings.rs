//! Persisted operator settings for the focus puller CLI.
//! Stored as JSON in the platform-specific config directory via `directories::ProjectDirs`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::calibration::LightingCondition;
use crate::control::ControlConfig;

/// Settings persistence errors.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Cannot determine config directory")]
    NoConfigDir,
    #[error("Settings I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Application settings that can be saved and loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Lighting key or dropdown label, e.g. "indoor-bad"
    pub lighting: String,
    /// Ramp focus time in seconds
    pub focus_time_s: f64,
    /// Camera offset in meters
    pub camera_offset_m: f64,
    /// Hysteresis threshold in meters
    pub hysteresis_m: f64,
    /// Control loop period in milliseconds
    pub tick_interval_ms: u64,
    /// Number of ticks to run, 0 for no limit
    pub ticks: u64,
    /// Extra time shutdown allows on top of the expected homing time before
    /// warning, in milliseconds
    pub shutdown_timeout_ms: u64,
    /// JSON motor LUT replacing the built-in table (empty for built-in)
    pub motor_lut_path: String,
    /// Where the depth profile PNG is written (empty for the temp dir)
    pub profile_png: String,
    /// Language code ("de" or "en")
    pub lang: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        let control = ControlConfig::default();
        Self {
            lighting: LightingCondition::default().key().to_string(),
            focus_time_s: control.ramp_time_s,
            camera_offset_m: control.camera_offset_m,
            hysteresis_m: control.hysteresis_m,
            tick_interval_ms: 33,
            ticks: 0,
            shutdown_timeout_ms: 2000,
            motor_lut_path: String::new(),
            profile_png: String::new(),
            lang: "de".to_string(),
        }
    }
}

impl AppSettings {
    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "moderras", "focus-puller")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path.
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.json"))
    }

    /// Load settings from the config file, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(SettingsError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                tracing::warn!("Ignoring settings at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save settings to the config file.
    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::settings_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Apply `FOCUS_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `get`. Values that fail to parse are logged and
    /// ignored.
    pub fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(v) = get("FOCUS_LIGHTING") {
            self.lighting = v;
        }
        if let Some(v) = get("FOCUS_LANG") {
            self.lang = v;
        }
        if let Some(v) = get("FOCUS_MOTOR_LUT") {
            self.motor_lut_path = v;
        }
        if let Some(v) = get("FOCUS_PROFILE_PNG") {
            self.profile_png = v;
        }
        parse_into(&get, "FOCUS_TIME", &mut self.focus_time_s);
        parse_into(&get, "FOCUS_CAMERA_OFFSET", &mut self.camera_offset_m);
        parse_into(&get, "FOCUS_HYSTERESIS", &mut self.hysteresis_m);
        parse_into(&get, "FOCUS_TICKS", &mut self.ticks);
    }

    pub fn lighting(&self) -> LightingCondition {
        LightingCondition::from_label_or_default(Some(&self.lighting))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    pub fn motor_lut_path(&self) -> Option<&Path> {
        (!self.motor_lut_path.is_empty()).then(|| Path::new(&self.motor_lut_path))
    }

    pub fn profile_png_path(&self) -> PathBuf {
        if self.profile_png.is_empty() {
            std::env::temp_dir().join("focus-profile.png")
        } else {
            PathBuf::from(&self.profile_png)
        }
    }

    /// Control loop configuration with these settings applied.
    pub fn control_config(&self) -> ControlConfig {
        ControlConfig::default()
            .with_ramp_time(self.focus_time_s)
            .with_camera_offset(self.camera_offset_m)
            .with_hysteresis(self.hysteresis_m)
    }
}

fn parse_into<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    slot: &mut T,
) {
    let Some(raw) = get(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *slot = value,
        Err(_) => tracing::warn!("Ignoring {}={:?}: not a valid value", key, raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = AppSettings::default();
        assert_eq!(settings.lighting(), LightingCondition::IndoorBad);
        assert_eq!(settings.tick_interval(), Duration::from_millis(33));
        assert_eq!(settings.shutdown_timeout(), Duration::from_secs(2));
        assert!(settings.motor_lut_path().is_none());
        assert_eq!(
            settings.profile_png_path(),
            std::env::temp_dir().join("focus-profile.png")
        );

        let control = settings.control_config();
        assert_eq!(control.camera_offset_m, 0.075);
        assert_eq!(control.hysteresis_m, 0.02);
    }

    #[test]
    fn test_missing_fields_fall_back() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"lighting": "Draußen - Gutes Licht", "focus_time_s": 1.5}"#)
                .unwrap();
        assert_eq!(settings.lighting(), LightingCondition::OutdoorGood);
        assert_eq!(settings.focus_time_s, 1.5);
        assert_eq!(settings.tick_interval_ms, 33);
        assert_eq!(settings.lang, "de");
    }

    #[test]
    fn test_unknown_lighting_falls_back() {
        let settings = AppSettings {
            lighting: "studio".into(),
            ..AppSettings::default()
        };
        assert_eq!(settings.lighting(), LightingCondition::IndoorBad);
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = AppSettings::default();
        settings.apply_overrides(env(&[
            ("FOCUS_LIGHTING", "outdoor-bad"),
            ("FOCUS_TIME", "0.8"),
            ("FOCUS_HYSTERESIS", "oops"),
            ("FOCUS_TICKS", "300"),
            ("FOCUS_MOTOR_LUT", "/tmp/lut.json"),
            ("FOCUS_PROFILE_PNG", "/tmp/side.png"),
        ]));
        assert_eq!(settings.lighting(), LightingCondition::OutdoorBad);
        assert_eq!(settings.focus_time_s, 0.8);
        assert_eq!(settings.hysteresis_m, 0.02);
        assert_eq!(settings.ticks, 300);
        assert_eq!(settings.motor_lut_path(), Some(Path::new("/tmp/lut.json")));
        assert_eq!(settings.profile_png_path(), PathBuf::from("/tmp/side.png"));
        assert_eq!(settings.control_config().ramp_time_s, 0.8);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = std::env::temp_dir().join(format!("focus-puller-settings-{}", std::process::id()));
        let path = dir.join("nested").join("settings.json");
        let settings = AppSettings {
            lang: "en".into(),
            camera_offset_m: 0.1,
            ..AppSettings::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(AppSettings::load_from(&path).unwrap(), settings);

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            AppSettings::load_from(&path),
            Err(SettingsError::Json(_))
        ));
        fs::remove_dir_all(&dir).unwrap();
    }
}

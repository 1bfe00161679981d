//! Persistent application configuration.
//!
//! Stored as JSON in a platform-appropriate config directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// How input reaches the game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// Real pointer movement and key events, visible to every process.
    #[default]
    Foreground,
    /// Messages posted to the bound window; the real pointer never moves.
    Background,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputMode::Foreground => write!(f, "foreground"),
            InputMode::Background => write!(f, "background"),
        }
    }
}

/// What "reroll" means for the game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum RerollAction {
    /// Left click on the calibrated reroll button.
    #[default]
    Click,
    /// Press a key (Win32 virtual-key code).
    Key { vk: u16 },
}

/// On-disk configuration for the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OCR model language; selects `ocr/<lang>_recognition.mnn` and `ocr/<lang>_charset.txt`.
    pub ocr_lang: String,

    /// Upscale factor applied to the text crop before OCR.
    pub magnification: f32,

    /// Write every preprocessed OCR crop to `ocr_debug/`.
    pub debug_dump: bool,

    pub max_attempts: u32,

    /// Wait after hovering the item so the tooltip can appear.
    pub hover_settle_ms: u64,

    /// Wait after each reroll before the next attempt.
    pub reroll_interval_ms: u64,

    /// Sleep slice between cancellation checks.
    pub poll_granularity_ms: u64,

    /// Grace period before the first attempt so the game can be focused.
    pub start_delay_ms: u64,

    pub input_mode: InputMode,

    pub reroll_action: RerollAction,

    /// Virtual-key code that stops a running loop (F5).
    pub stop_hotkey: u16,

    /// Fuzzy containment threshold in `[0, 1]`.
    pub similarity_threshold: f64,

    /// Pop a topmost message box when the rule is satisfied.
    pub notify_on_success: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ocr_lang: "ch".to_string(),
            magnification: 3.0,
            debug_dump: false,
            max_attempts: 1000,
            hover_settle_ms: 500,
            reroll_interval_ms: 1000,
            poll_granularity_ms: 50,
            start_delay_ms: 3000,
            input_mode: InputMode::Foreground,
            reroll_action: RerollAction::Click,
            stop_hotkey: 0x74,
            similarity_threshold: matcher::DEFAULT_THRESHOLD,
            notify_on_success: true,
        }
    }
}

impl Config {
    /// Directory holding the config and the rule/profile store.
    pub fn dir() -> Result<PathBuf> {
        let base = dirs::config_dir().context("config_dir() unavailable")?;
        Ok(base.join("washer"))
    }

    /// Path to the config file.
    pub fn path() -> Result<PathBuf> {
        Ok(Self::dir()?.join("config.json"))
    }

    /// Load configuration from disk, falling back to defaults on any failure.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let loaded = match path {
            Some(path) => Self::try_load_from(path),
            None => Self::path().and_then(|path| Self::try_load_from(&path)),
        };
        match loaded {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load config; using defaults");
                Self::default()
            }
        }
    }

    /// Try to load configuration from `path`; a missing file yields defaults.
    pub fn try_load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
        let cfg = serde_json::from_str(&json).with_context(|| format!("parse {:?}", path))?;
        Ok(cfg)
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize config")?;
        fs::write(path, json).with_context(|| format!("write {:?}", path))?;
        Ok(())
    }

    pub fn hover_settle(&self) -> Duration {
        Duration::from_millis(self.hover_settle_ms)
    }

    pub fn reroll_interval(&self) -> Duration {
        Duration::from_millis(self.reroll_interval_ms)
    }

    /// Never zero, so cancellable waits always make progress.
    pub fn poll_granularity(&self) -> Duration {
        Duration::from_millis(self.poll_granularity_ms.max(1))
    }

    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }

    pub fn read_options(&self) -> ie::ReadOptions {
        ie::ReadOptions {
            magnification: self.magnification,
            debug_dump: self.debug_dump.then(|| PathBuf::from("ocr_debug")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::try_load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"max_attempts": 5, "reroll_action": {"type": "key", "vk": 82}}"#).unwrap();

        let cfg = Config::try_load_from(&path).unwrap();
        assert_eq!(cfg.max_attempts, 5);
        assert_eq!(cfg.reroll_action, RerollAction::Key { vk: 82 });
        assert_eq!(cfg.hover_settle_ms, 500);
        assert_eq!(cfg.stop_hotkey, 0x74);
    }

    #[test]
    fn broken_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Config::try_load_from(&path).is_err());
        assert_eq!(Config::load_or_default(Some(&path)), Config::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let cfg = Config {
            input_mode: InputMode::Background,
            debug_dump: true,
            ..Config::default()
        };
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::try_load_from(&path).unwrap(), cfg);
        assert_eq!(cfg.read_options().debug_dump, Some(PathBuf::from("ocr_debug")));
    }

    #[test]
    fn zero_granularity_is_clamped() {
        let cfg = Config {
            poll_granularity_ms: 0,
            ..Config::default()
        };
        assert_eq!(cfg.poll_granularity(), Duration::from_millis(1));
    }
}

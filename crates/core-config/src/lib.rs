//! Config (C10): the typed surface over the public library's tunables.
//!
//! Values load from an optional TOML file, discovered the way the teacher's
//! `oxidized.toml` lookup does (local working directory first, then the
//! platform config directory), with `#[serde(default)]` filling in anything
//! a file omits. Out-of-range values are clamped with a logged warning
//! rather than rejected outright, matching the teacher's
//! `apply_context`/clamp-and-log pattern for `scroll.margin.vertical`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

const MAX_HISTORY_SIZE_MIN: usize = 10;
const MAX_HISTORY_SIZE_MAX: usize = 50_000;
const MAX_HISTORY_SIZE_DEFAULT: usize = 1000;
const MAX_UNDO_ACTIONS_DEFAULT: usize = 100;
const ESCAPE_TIMEOUT_MS_DEFAULT: u64 = 100;

/// Editor configuration, per spec.md §6's enumerated options.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub max_history_size: usize,
    pub max_undo_actions: usize,
    pub enable_multiline: bool,
    pub enable_syntax_highlighting: bool,
    pub enable_auto_completion: bool,
    pub enable_history: bool,
    pub enable_undo: bool,
    pub escape_timeout_ms: u64,
    pub no_history_duplicates: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_history_size: MAX_HISTORY_SIZE_DEFAULT,
            max_undo_actions: MAX_UNDO_ACTIONS_DEFAULT,
            enable_multiline: false,
            enable_syntax_highlighting: false,
            enable_auto_completion: false,
            enable_history: true,
            enable_undo: true,
            escape_timeout_ms: ESCAPE_TIMEOUT_MS_DEFAULT,
            no_history_duplicates: false,
        }
    }
}

impl Config {
    /// Parse TOML text. Malformed input falls back to all-defaults (logged)
    /// rather than failing `create(config)` outright; `max_history_size` is
    /// then clamped into its declared `[10, 50000]` range.
    pub fn from_toml_str(s: &str) -> Self {
        let mut cfg: Config = match toml::from_str(s) {
            Ok(c) => c,
            Err(e) => {
                warn!(target: "config", error = %e, "malformed config file, using defaults");
                Config::default()
            }
        };
        cfg.clamp();
        cfg
    }

    fn clamp(&mut self) {
        let clamped = self.max_history_size.clamp(MAX_HISTORY_SIZE_MIN, MAX_HISTORY_SIZE_MAX);
        if clamped != self.max_history_size {
            warn!(
                target: "config",
                requested = self.max_history_size,
                clamped,
                "max_history_size out of range, clamped"
            );
            self.max_history_size = clamped;
        }
    }
}

/// Best-effort config path: `./rline.toml` in the working directory, else
/// the platform config directory (XDG on Linux, Roaming AppData on
/// Windows, `~/Library/Application Support` on macOS).
pub fn discover() -> PathBuf {
    let local = PathBuf::from("rline.toml");
    if local.exists() {
        return local;
    }
    dirs::config_dir().map(|d| d.join("rline").join("rline.toml")).unwrap_or(local)
}

/// Load from an explicit path, or `discover()`'s guess. A missing file is
/// not an error — `create(config)` still succeeds with defaults.
pub fn load_from(path: Option<PathBuf>) -> Config {
    load_from_path(&path.unwrap_or_else(discover))
}

fn load_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(content) => Config::from_toml_str(&content),
        Err(_) => Config::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_values() {
        let cfg = Config::default();
        assert_eq!(cfg.max_history_size, 1000);
        assert_eq!(cfg.max_undo_actions, 100);
        assert_eq!(cfg.escape_timeout_ms, 100);
        assert!(cfg.enable_history);
        assert!(cfg.enable_undo);
        assert!(!cfg.no_history_duplicates);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_rline_config__.toml")));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn parses_overrides_and_defaults_omitted_fields() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "max_history_size = 500\nno_history_duplicates = true\nenable_undo = false\n",
        )
        .unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf()));
        assert_eq!(cfg.max_history_size, 500);
        assert!(cfg.no_history_duplicates);
        assert!(!cfg.enable_undo);
        // Omitted fields keep their defaults.
        assert_eq!(cfg.max_undo_actions, 100);
        assert!(cfg.enable_history);
    }

    #[test]
    fn clamps_max_history_size_below_minimum() {
        let cfg = Config::from_toml_str("max_history_size = 1\n");
        assert_eq!(cfg.max_history_size, MAX_HISTORY_SIZE_MIN);
    }

    #[test]
    fn clamps_max_history_size_above_maximum() {
        let cfg = Config::from_toml_str("max_history_size = 1000000\n");
        assert_eq!(cfg.max_history_size, MAX_HISTORY_SIZE_MAX);
    }

    #[test]
    fn malformed_toml_falls_back_to_defaults() {
        let cfg = Config::from_toml_str("this is not [ valid toml");
        assert_eq!(cfg, Config::default());
    }
}

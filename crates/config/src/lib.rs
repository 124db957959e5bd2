pub mod schema;
pub mod watcher;

pub use schema::{BarConfig, BlockOverride, WidgetConfig};
pub use watcher::ConfigWatcher;

use bar_core::{BarError, Result};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "BARSTATUS_CONFIG";

/// Load configuration from a TOML file.  Returns `BarConfig::default()` if
/// the file doesn't exist so the bar always has sensible defaults; the
/// caller reports the missing file once logging is up.
pub fn load(path: impl AsRef<Path>) -> Result<BarConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(BarConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| BarError::Config(format!("cannot read '{}': {e}", path.display())))?;

    parse(&raw)
}

/// Parse configuration from TOML text.
pub fn parse(raw: &str) -> Result<BarConfig> {
    toml::from_str(raw).map_err(|e| BarError::Config(format!("TOML parse error: {e}")))
}

/// Return the config path: `$BARSTATUS_CONFIG` if set, otherwise
/// `barstatus/config.toml` under `$XDG_CONFIG_HOME` (or `~/.config`).
pub fn default_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }

    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("barstatus").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.widgets.len(), BarConfig::default().widgets.len());
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "interval_ms = [").unwrap();
        assert!(matches!(load(&path), Err(BarError::Config(_))));
    }
}

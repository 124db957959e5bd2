use bar_core::{Align, Color, MinWidth, Separator};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure parsed from `config.toml`.
///
/// The config is read once per process image. Changing it on disk (with
/// `watch_config` on) restarts the process in place to apply it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BarConfig {
    /// Render interval in milliseconds; `0` means the default of one second.
    pub interval_ms: u64,
    /// Restart in place when the running executable changes on disk.
    pub watch_binary: bool,
    /// Restart in place when this config file changes on disk.
    pub watch_config: bool,
    /// Append stderr (and therefore all logs) to this file.
    pub log_file: Option<PathBuf>,
    /// Separator applied to every block that does not set its own.
    pub separator: Separator,
    /// Widgets, rendered left to right.
    pub widgets: Vec<WidgetConfig>,
}

impl BarConfig {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

    pub fn interval(&self) -> Duration {
        match self.interval_ms {
            0 => Self::DEFAULT_INTERVAL,
            ms => Duration::from_millis(ms),
        }
    }
}

impl Default for BarConfig {
    fn default() -> Self {
        let clocks = vec![
            WidgetConfig::new("clock").with("format", "%A %B %m/%d/%Y %H:%M:%S"),
            WidgetConfig::new("clock")
                .with("format", "%a %H:%M %Z")
                .with("timezone", "utc"),
            WidgetConfig::new("clock")
                .with("format", "%a %H:%M %Z")
                .with("timezone", "Asia/Tokyo"),
        ];

        Self {
            interval_ms:  1_000,
            watch_binary: true,
            watch_config: true,
            log_file:     None,
            separator:    Separator { hide: Some(true), width: Some(24) },
            widgets: vec![
                WidgetConfig::new("cpu")
                    .with("colors", "htop")
                    .with("window_ms", 5_000_i64)
                    .with("show_1", true)
                    .with("show_15", true)
                    .with("width", 24_i64),
                WidgetConfig::new("temperature")
                    .with("path", "/sys/class/hwmon/hwmon0/temp1_input")
                    .with("divisor", 1000.0),
                WidgetConfig::new("memory"),
                WidgetConfig {
                    widgets: clocks,
                    overrides: Some(BlockOverride {
                        separator: Some(Separator { hide: None, width: Some(8) }),
                        ..BlockOverride::default()
                    }),
                    ..WidgetConfig::new("rotate")
                },
                // Keeps the rotate block's separator override visible.
                WidgetConfig::new("text"),
            ],
        }
    }
}

/// Config block for a single widget instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Widget type identifier, e.g. `"cpu"`, `"clock"`, `"rotate"`.
    pub kind: String,
    /// Field overrides applied to every block this widget renders.
    #[serde(default, rename = "override", skip_serializing_if = "Option::is_none")]
    pub overrides: Option<BlockOverride>,
    /// Child widgets, for wrapper kinds such as `"rotate"`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub widgets: Vec<WidgetConfig>,
    /// Arbitrary extra options forwarded to the widget at construction.
    #[serde(default, flatten)]
    pub options: toml::Table,
}

impl WidgetConfig {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            overrides: None,
            widgets: Vec::new(),
            options: toml::Table::new(),
        }
    }

    /// Builder-style option setter.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<toml::Value>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }
}

/// Block fields forced onto a widget's output after it renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockOverride {
    pub separator:  Option<Separator>,
    pub short_text: Option<String>,
    pub color:      Option<Color>,
    pub background: Option<Color>,
    pub border:     Option<Color>,
    pub min_width:  Option<MinWidth>,
    pub align:      Option<Align>,
}

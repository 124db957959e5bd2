//! Status line widgets and the factory that builds them from config.

pub mod apcupsd;
pub mod clock;
pub mod cpu;
pub mod edit;
pub mod memory;
pub mod nvidia;
pub mod rotate;
pub mod segments;
pub mod temperature;

pub use apcupsd::ApcupsdWidget;
pub use clock::ClockWidget;
pub use cpu::CpuWidget;
pub use edit::Edit;
pub use memory::MemoryWidget;
pub use nvidia::NvidiaWidget;
pub use rotate::Rotator;
pub use temperature::TemperatureWidget;

use bar_config::WidgetConfig;
use bar_core::{BarError, Block, Restarter, Result, Widget};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::warn;

/// Options of the `text` kind.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TextOptions {
    text: String,
}

/// Build every configured widget, in order.
pub fn build_all(configs: &[WidgetConfig], restarter: &Restarter) -> Result<Vec<Box<dyn Widget>>> {
    configs.iter().map(|cfg| build(cfg, restarter)).collect()
}

/// Build one widget, wrapped in an [`Edit`] when the config carries an
/// `override` table.
pub fn build(cfg: &WidgetConfig, restarter: &Restarter) -> Result<Box<dyn Widget>> {
    if cfg.kind != "rotate" && !cfg.widgets.is_empty() {
        warn!(kind = %cfg.kind, "nested widgets are only used by rotate; ignoring them");
    }

    let widget: Box<dyn Widget> = match cfg.kind.as_str() {
        "cpu" => Box::new(CpuWidget::new(options(cfg)?, restarter)?),
        "memory" => {
            options::<Empty>(cfg)?;
            Box::new(MemoryWidget::new(restarter))
        }
        "temperature" => Box::new(TemperatureWidget::new(options(cfg)?, restarter)?),
        "clock" => Box::new(ClockWidget::new(options(cfg)?)?),
        "nvidia" => Box::new(NvidiaWidget::new(options(cfg)?, restarter)),
        "apcupsd" => Box::new(ApcupsdWidget::new(options(cfg)?)),
        "rotate" => {
            options::<Empty>(cfg)?;
            Box::new(Rotator::new(build_all(&cfg.widgets, restarter)?)?)
        }
        "text" | "empty" => Box::new(Block::new(options::<TextOptions>(cfg)?.text)),
        other => return Err(BarError::Config(format!("unknown widget kind {other:?}"))),
    };

    Ok(match &cfg.overrides {
        Some(over) => Box::new(Edit::with_override(widget, over.clone())),
        None => widget,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Empty {}

/// Decode the free-form option keys of `cfg` into a widget's option type.
fn options<T: DeserializeOwned>(cfg: &WidgetConfig) -> Result<T> {
    toml::Value::Table(cfg.options.clone())
        .try_into()
        .map_err(|e| BarError::Config(format!("{} widget: {e}", cfg.kind)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bar_config::BarConfig;
    use bar_core::{ClickEvent, Separator};

    fn restarter() -> Restarter {
        Restarter::default()
    }

    #[test]
    fn builds_default_layout() {
        let widgets = build_all(&BarConfig::default().widgets, &restarter()).unwrap();
        let names: Vec<_> = widgets.iter().map(|w| w.name()).collect();
        assert_eq!(names, ["cpu", "temperature", "memory", "rotate", "text"]);
    }

    #[test]
    fn rotate_keeps_override_and_clicks() {
        let cfg = &BarConfig::default().widgets[3];
        let mut w = build(cfg, &restarter()).unwrap();
        let block = w.status().unwrap();
        assert_eq!(block.separator, Separator { hide: None, width: Some(8) });
        assert!(w.clickable().unwrap().click(&ClickEvent::default()));
    }

    #[test]
    fn text_widget() {
        let cfg = WidgetConfig::new("text").with("text", "hello");
        let mut w = build(&cfg, &restarter()).unwrap();
        assert_eq!(w.status().unwrap().full_text, "hello");

        let mut empty = build(&WidgetConfig::new("empty"), &restarter()).unwrap();
        assert_eq!(empty.status().unwrap().full_text, "");
        assert!(empty.clickable().is_none());
    }

    #[test]
    fn unknown_kind() {
        let err = build(&WidgetConfig::new("weather"), &restarter()).err().unwrap();
        assert!(matches!(err, BarError::Config(_)));
    }

    #[test]
    fn misspelled_option() {
        let cfg = WidgetConfig::new("clock").with("fromat", "%H");
        assert!(matches!(build(&cfg, &restarter()), Err(BarError::Config(_))));
        let cfg = WidgetConfig::new("memory").with("unit", "G");
        assert!(build(&cfg, &restarter()).is_err());
    }

    #[test]
    fn empty_rotate() {
        assert!(build(&WidgetConfig::new("rotate"), &restarter()).is_err());
    }
}

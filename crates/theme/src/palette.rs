use bar_core::Color;
use serde::{Deserialize, Serialize};

/// Underline colors for each `/proc/stat` cpu time category.
///
/// A category without a color is left out of the bar entirely, and its time
/// does not count toward the total the bar is divided by. `other` colors
/// whatever rounding leaves over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuPalette {
    pub user:       Option<Color>,
    pub nice:       Option<Color>,
    pub system:     Option<Color>,
    pub idle:       Option<Color>,
    pub iowait:     Option<Color>,
    pub irq:        Option<Color>,
    pub softirq:    Option<Color>,
    pub steal:      Option<Color>,
    pub guest:      Option<Color>,
    pub guest_nice: Option<Color>,
    pub other:      Option<Color>,
}

impl CpuPalette {
    /// The colors of htop's detailed cpu meter. Idle is uncolored.
    pub fn htop() -> Self {
        Self {
            user:       Some(Color::rgb(0x00, 0xFF, 0x00)),
            nice:       Some(Color::rgb(0x00, 0x00, 0xFF)),
            system:     Some(Color::rgb(0xFF, 0x00, 0x00)),
            idle:       None,
            iowait:     Some(Color::rgb(0x7F, 0x7F, 0x7F)),
            irq:        Some(Color::rgb(0xFF, 0xAE, 0x00)),
            softirq:    Some(Color::rgb(0xFF, 0x60, 0xA0)),
            steal:      Some(Color::rgb(0x00, 0x00, 0x00)),
            guest:      Some(Color::rgb(0x00, 0xFF, 0xFF)),
            guest_nice: Some(Color::rgb(0x00, 0x7F, 0xFF)),
            other:      Some(Color::rgb(0xFF, 0xFF, 0xFF)),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "htop" => Some(Self::htop()),
            _ => None,
        }
    }

    /// Colors in `/proc/stat` column order: user, nice, system, idle, iowait,
    /// irq, softirq, steal, guest, guest_nice.
    pub fn categories(&self) -> [Option<Color>; 10] {
        [
            self.user,
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
            self.steal,
            self.guest,
            self.guest_nice,
        ]
    }
}

/// A palette as written in config: a preset name or an explicit table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaletteSpec {
    Named(String),
    Custom(CpuPalette),
}

impl PaletteSpec {
    pub fn resolve(&self) -> Option<CpuPalette> {
        match self {
            PaletteSpec::Named(name) => CpuPalette::by_name(name),
            PaletteSpec::Custom(palette) => Some(palette.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        colors: PaletteSpec,
    }

    #[test]
    fn named_preset() {
        let h: Holder = toml::from_str(r#"colors = "HTOP""#).unwrap();
        assert_eq!(h.colors.resolve(), Some(CpuPalette::htop()));
    }

    #[test]
    fn unknown_preset() {
        let h: Holder = toml::from_str(r#"colors = "solarized""#).unwrap();
        assert_eq!(h.colors.resolve(), None);
    }

    #[test]
    fn custom_table() {
        let h: Holder = toml::from_str(
            r##"colors = { user = "#112233", other = "#FFFFFF" }"##,
        )
        .unwrap();
        let p = h.colors.resolve().unwrap();
        assert_eq!(p.user, Some(Color::rgb(0x11, 0x22, 0x33)));
        assert_eq!(p.system, None);
        assert_eq!(p.categories().iter().flatten().count(), 1);
    }
}

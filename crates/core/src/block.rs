use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::BarError;

/// One renderable unit of the status line.
///
/// Widgets build a fresh `Block` every tick. Everything except `full_text`
/// is optional; unset fields are left out of the encoded protocol object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    /// Text shown on the status line. An empty string makes the bar skip
    /// the block, although its separator still applies.
    pub full_text: String,
    /// Abbreviated text, used when the status line runs out of room.
    pub short_text: Option<String>,
    pub color: Option<Color>,
    pub background: Option<Color>,
    pub border: Option<Color>,
    /// Minimum width; the block is padded according to `align`.
    pub min_width: Option<MinWidth>,
    pub align: Align,
    pub urgent: bool,
    pub markup: Markup,
    /// Per-block separator; unset fields fall through to the bar default.
    pub separator: Separator,
    /// Extra protocol fields merged verbatim into the encoded object.
    pub extra: Map<String, Value>,
}

impl Block {
    pub fn new(full_text: impl Into<String>) -> Self {
        Self {
            full_text: full_text.into(),
            ..Self::default()
        }
    }

    /// The urgent block substituted for a widget that failed this tick.
    pub fn error(err: impl fmt::Display) -> Self {
        Self {
            full_text: format!("error: {err}"),
            urgent: true,
            ..Self::default()
        }
    }
}

/// An opaque RGB color, encoded on the wire as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const RED:    Self = Self::rgb(0xFF, 0x00, 0x00);
    pub const YELLOW: Self = Self::rgb(0xFF, 0xFF, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a CSS-style hex color string (`#RRGGBB`, the `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }

        let byte = |s: &str| -> Option<u8> { u8::from_str_radix(s, 16).ok() };

        Some(Self {
            r: byte(&hex[0..2])?,
            g: byte(&hex[2..4])?,
            b: byte(&hex[4..6])?,
        })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = BarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s).ok_or_else(|| BarError::Parse(format!("invalid color '{s}'")))
    }
}

impl TryFrom<String> for Color {
    type Error = BarError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Horizontal alignment inside `min_width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    pub fn as_str(self) -> &'static str {
        match self {
            Align::Left   => "left",
            Align::Center => "center",
            Align::Right  => "right",
        }
    }
}

/// How the bar parses `full_text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Markup {
    /// Text is used as-is.
    #[default]
    None,
    /// Pango markup; only works with a pango font.
    Pango,
}

impl Markup {
    pub fn as_str(self) -> &'static str {
        match self {
            Markup::None  => "none",
            Markup::Pango => "pango",
        }
    }
}

/// Minimum block width: either pixels, or a sample string whose rendered
/// width is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MinWidth {
    Pixels(u32),
    Text(String),
}

/// Gap and separator line drawn after a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Separator {
    /// Whether to hide the separator line. The gap remains unless `width`
    /// is also set.
    pub hide: Option<bool>,
    /// Pixels to leave blank after the block; the line, if any, is drawn in
    /// the middle, so odd values look best.
    pub width: Option<u32>,
}

impl Separator {
    pub fn is_unset(&self) -> bool {
        self.hide.is_none() && self.width.is_none()
    }

    /// Fill each unset field from `default`.
    #[must_use]
    pub fn resolve(self, default: Separator) -> Separator {
        Separator {
            hide:  self.hide.or(default.hide),
            width: self.width.or(default.width),
        }
    }
}

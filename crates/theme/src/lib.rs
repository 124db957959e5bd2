pub mod palette;

pub use palette::{CpuPalette, PaletteSpec};

use bar_core::Color;

/// Pango span attributes that underline text in `color`.
pub fn underline(color: Color) -> String {
    format!(r#"underline="single" underline_color="{color}""#)
}

/// Wrap `text` in a pango span carrying `attrs`.
pub fn span(attrs: &str, text: &str) -> String {
    format!("<span {attrs}>{}</span>", escape(text))
}

/// Escape the characters pango markup treats specially.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underline_span() {
        let attrs = underline(Color::rgb(0, 0xFF, 0));
        assert_eq!(
            span(&attrs, "1.00 "),
            r##"<span underline="single" underline_color="#00FF00">1.00 </span>"##
        );
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("a<b & 'c'"), "a&lt;b &amp; &apos;c&apos;");
    }
}

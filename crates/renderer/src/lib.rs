//! Turns widget output into protocol objects.
//!
//! [`render`] asks every widget for its block, in order, and [`encode`]s
//! the results. A widget that fails is shown as an urgent error block for
//! that tick; it never aborts the batch.

use bar_core::{Align, Block, Markup, Separator, Widget};
use serde_json::{Map, Value};
use tracing::warn;

/// Render one status line.
pub fn render(widgets: &mut [Box<dyn Widget>], default: Separator) -> Vec<Map<String, Value>> {
    widgets
        .iter_mut()
        .enumerate()
        .map(|(index, widget)| {
            let block = widget.status().unwrap_or_else(|e| {
                warn!(widget = widget.name(), index, "status failed: {e}");
                Block::error(e)
            });
            encode(widget.name(), index, &block, default)
        })
        .collect()
}

/// Encode `block` as the protocol object for the widget at zero-based
/// position `index`.
///
/// Fields set on the block win over its `extra` map. The block's separator
/// is resolved against `default` field by field; a field unset in both is
/// left out.
pub fn encode(name: &str, index: usize, block: &Block, default: Separator) -> Map<String, Value> {
    let mut obj = block.extra.clone();
    let mut put = |key: &str, value: Value| {
        obj.insert(key.to_string(), value);
    };

    put("name", name.into());
    put("instance", (index + 1).to_string().into());

    let separator = block.separator.resolve(default);
    if let Some(hide) = separator.hide {
        put("separator", (!hide).into());
    }
    if let Some(width) = separator.width {
        put("separator_block_width", width.into());
    }

    put("full_text", block.full_text.as_str().into());
    if let Some(short) = &block.short_text {
        put("short_text", short.as_str().into());
    }

    for (key, color) in [
        ("color", block.color),
        ("background", block.background),
        ("border", block.border),
    ] {
        if let Some(color) = color {
            put(key, color.to_string().into());
        }
    }

    if let Some(min_width) = &block.min_width {
        // MinWidth serializes untagged, to either a number or a string.
        if let Ok(value) = serde_json::to_value(min_width) {
            put("min_width", value);
        }
    }
    if block.align != Align::Left {
        put("align", block.align.as_str().into());
    }
    if block.urgent {
        put("urgent", true.into());
    }
    if block.markup != Markup::None {
        put("markup", block.markup.as_str().into());
    }

    obj
}

#[cfg(test)]
mod tests {
    use super::*;
    use bar_core::{BarError, Color, MinWidth, Result};
    use serde_json::json;

    fn sep(hide: Option<bool>, width: Option<u32>) -> Separator {
        Separator { hide, width }
    }

    #[test]
    fn minimal_block() {
        let obj = encode("text", 0, &Block::new("hi"), Separator::default());
        assert_eq!(
            Value::Object(obj),
            json!({ "name": "text", "instance": "1", "full_text": "hi" })
        );
    }

    #[test]
    fn separator_falls_through_per_field() {
        let block = Block {
            separator: sep(None, Some(5)),
            ..Block::new("x")
        };
        let obj = encode("clock", 3, &block, sep(Some(true), Some(20)));
        assert_eq!(obj["instance"], "4");
        assert_eq!(obj["separator"], false);
        assert_eq!(obj["separator_block_width"], 5);
    }

    #[test]
    fn default_separator_applies_when_block_unset() {
        let obj = encode("x", 0, &Block::new(""), sep(None, Some(24)));
        assert!(!obj.contains_key("separator"));
        assert_eq!(obj["separator_block_width"], 24);
    }

    #[test]
    fn full_block() {
        let mut extra = Map::new();
        extra.insert("name".into(), "ignored".into());
        extra.insert("_custom".into(), json!(7));
        let block = Block {
            full_text: "<b>1</b>".into(),
            short_text: Some("1".into()),
            color: Some(Color::rgb(0xff, 0, 0)),
            background: Some(Color::rgb(0, 0, 0)),
            border: Some(Color::rgb(0x12, 0x34, 0x56)),
            min_width: Some(MinWidth::Text("00.00".into())),
            align: Align::Right,
            urgent: true,
            markup: Markup::Pango,
            separator: sep(Some(false), None),
            extra,
        };
        let obj = encode("cpu", 1, &block, Separator::default());
        assert_eq!(
            Value::Object(obj),
            json!({
                "name": "cpu",
                "instance": "2",
                "_custom": 7,
                "separator": true,
                "full_text": "<b>1</b>",
                "short_text": "1",
                "color": "#FF0000",
                "background": "#000000",
                "border": "#123456",
                "min_width": "00.00",
                "align": "right",
                "urgent": true,
                "markup": "pango"
            })
        );
    }

    #[test]
    fn pixel_min_width_is_a_number() {
        let block = Block {
            min_width: Some(MinWidth::Pixels(80)),
            ..Block::default()
        };
        assert_eq!(encode("x", 0, &block, Separator::default())["min_width"], 80);
    }

    struct Failing;

    impl Widget for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn status(&mut self) -> Result<Block> {
            Err(BarError::Widget("sensor gone".into()))
        }
    }

    #[test]
    fn failed_widget_becomes_error_block() {
        let mut widgets: Vec<Box<dyn Widget>> = vec![
            Box::new(Block::new("a")),
            Box::new(Failing),
            Box::new(Block::new("c")),
        ];
        let batch = render(&mut widgets, Separator::default());
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0]["full_text"], "a");
        assert_eq!(batch[1]["name"], "failing");
        assert_eq!(batch[1]["urgent"], true);
        assert!(batch[1]["full_text"].as_str().unwrap().starts_with("error: "));
        assert_eq!(batch[2]["instance"], "3");
    }
}

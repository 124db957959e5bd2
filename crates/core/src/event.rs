use serde::{Deserialize, Serialize};

/// A pointer click on one block, as reported by the bar on stdin.
///
/// The bar also sends `name` and `instance`; those identify the target block
/// and are stripped off by the protocol decoder before dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickEvent {
    /// X11 root window coordinates where the click occurred.
    pub x: i32,
    pub y: i32,
    /// X11 button ID (1 to 3 for left/middle/right, 4/5 for scroll).
    pub button: u32,
    /// Click position relative to the top left corner of the block.
    pub relative_x: i32,
    pub relative_y: i32,
    /// Size of the block in pixels.
    pub width: u32,
    pub height: u32,
    /// Modifiers active during the click, in no particular order.
    pub modifiers: Vec<String>,
}

use crate::{block::Block, error::Result, event::ClickEvent};

/// Every block producer on the status line implements this trait.
///
/// The render loop calls [`Widget::status`] once per tick, in configured
/// order. A failing widget does not abort the tick; its error is shown in
/// place of its block.
pub trait Widget: Send {
    /// Identity reported in the protocol `name` field, e.g. `"cpu"`.
    fn name(&self) -> &str;

    /// Produce this tick's block.
    fn status(&mut self) -> Result<Block>;

    /// The click capability, for widgets that react to pointer clicks.
    fn clickable(&mut self) -> Option<&mut dyn Clickable> {
        None
    }
}

/// A widget that receives the clicks aimed at its block.
pub trait Clickable {
    /// Handle one click; return `true` when the visible state changed and
    /// the bar should be redrawn right away.
    fn click(&mut self, event: &ClickEvent) -> bool;
}

/// A literal block renders as itself. An empty one is useful as a trailing
/// placeholder so the separator of the widget before it takes effect.
impl Widget for Block {
    fn name(&self) -> &str {
        "text"
    }

    fn status(&mut self) -> Result<Block> {
        Ok(self.clone())
    }
}

impl<W: Widget + ?Sized> Widget for Box<W> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn status(&mut self) -> Result<Block> {
        (**self).status()
    }

    fn clickable(&mut self) -> Option<&mut dyn Clickable> {
        (**self).clickable()
    }
}

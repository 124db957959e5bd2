use bar_config::BlockOverride;
use bar_core::{Block, Clickable, Result, Widget};

type EditFn = Box<dyn Fn(&mut Block) + Send>;

/// Wraps a widget and adjusts every block it renders successfully.
///
/// Clicks go to the wrapped widget.
pub struct Edit {
    inner: Box<dyn Widget>,
    edit:  EditFn,
}

impl Edit {
    pub fn new(inner: Box<dyn Widget>, edit: impl Fn(&mut Block) + Send + 'static) -> Self {
        Self {
            inner,
            edit: Box::new(edit),
        }
    }

    /// Force the fields set in `over` onto the wrapped widget's blocks.
    pub fn with_override(inner: Box<dyn Widget>, over: BlockOverride) -> Self {
        Self::new(inner, move |block| apply(&over, block))
    }
}

impl Widget for Edit {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn status(&mut self) -> Result<Block> {
        let mut block = self.inner.status()?;
        (self.edit)(&mut block);
        Ok(block)
    }

    fn clickable(&mut self) -> Option<&mut dyn Clickable> {
        self.inner.clickable()
    }
}

fn apply(over: &BlockOverride, block: &mut Block) {
    if let Some(sep) = over.separator {
        if sep.hide.is_some() {
            block.separator.hide = sep.hide;
        }
        if sep.width.is_some() {
            block.separator.width = sep.width;
        }
    }
    if over.short_text.is_some() {
        block.short_text.clone_from(&over.short_text);
    }
    block.color = over.color.or(block.color);
    block.background = over.background.or(block.background);
    block.border = over.border.or(block.border);
    if over.min_width.is_some() {
        block.min_width.clone_from(&over.min_width);
    }
    if let Some(align) = over.align {
        block.align = align;
    }
}

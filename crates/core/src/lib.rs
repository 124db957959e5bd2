pub mod block;
pub mod error;
pub mod event;
pub mod restart;
pub mod widget;

pub use block::{Align, Block, Color, Markup, MinWidth, Separator};
pub use error::{BarError, Result};
pub use event::ClickEvent;
pub use restart::Restarter;
pub use widget::{Clickable, Widget};

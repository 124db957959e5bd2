//! The i3bar JSON protocol, as spoken by i3bar and swaybar.
//!
//! Output is a header object followed by one endless JSON array whose
//! elements are arrays of blocks. Input is one endless JSON array of click
//! events.

pub mod input;
pub mod output;

pub use input::{ClickMessage, ClickStream};
pub use output::{Header, ProtocolWriter};

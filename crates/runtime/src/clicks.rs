use bar_core::{BarError, ClickEvent, Restarter, Result};
use bar_protocol::ClickStream;
use std::io::Read;
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, error};

/// A click on the block at zero-based position `index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Click {
    pub index: usize,
    pub event: ClickEvent,
}

/// What the click reader hands to the loop.
#[derive(Debug)]
pub enum Wake {
    Click(Click),
    /// The click stream is broken; the reader has stopped.
    Failed(BarError),
}

/// Decode clicks from `input` on a dedicated thread.
///
/// Only clicks aimed at one of the `blocks` blocks are forwarded. The first
/// decode error is forwarded as [`Wake::Failed`] and ends the thread.
pub fn spawn_click_reader<R>(input: R, restarter: Restarter, blocks: usize) -> Result<mpsc::Receiver<Wake>>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    thread::Builder::new()
        .name("click-reader".into())
        .spawn(move || read_clicks(ClickStream::new(input, restarter), blocks, &tx))?;
    Ok(rx)
}

fn read_clicks<R: Read>(mut stream: ClickStream<R>, blocks: usize, tx: &mpsc::Sender<Wake>) {
    loop {
        let wake = match stream.next_click() {
            Ok(msg) => match msg.target(blocks) {
                Some(index) => Wake::Click(Click {
                    index,
                    event: msg.event,
                }),
                None => {
                    debug!(instance = %msg.instance, name = %msg.name, "dropping click on unknown block");
                    continue;
                }
            },
            Err(e) => {
                error!("click stream failed: {e}");
                Wake::Failed(e)
            }
        };

        let failed = matches!(wake, Wake::Failed(_));
        if tx.blocking_send(wake).is_err() || failed {
            return;
        }
    }
}

//! The render/dispatch loop.
//!
//! One current-thread Tokio runtime drives everything that writes to
//! stdout: the render timer, click dispatch and the restart triggers. A
//! plain OS thread blocks on stdin, decodes clicks and hands them over a
//! one-slot channel; it never touches a widget.

mod clicks;

pub use clicks::{spawn_click_reader, Click, Wake};

use bar_config::{BarConfig, ConfigWatcher};
use bar_core::{BarError, Restarter, Result, Separator, Widget};
use bar_protocol::{Header, ProtocolWriter};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

/// Why the loop stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    BinaryChanged,
    ConfigChanged,
}

/// Run the bar until it fails. A successful return is impossible: every
/// exit path either restarts the process in place or reports an error.
pub fn run(config: BarConfig, config_path: &Path) -> Result<()> {
    let restarter = Restarter::from_env();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let exit = runtime.block_on(serve(config, config_path, &restarter))?;

    info!(?exit, "restarting in place");
    drop(runtime);
    Err(restarter.restart())
}

async fn serve(config: BarConfig, config_path: &Path, restarter: &Restarter) -> Result<Exit> {
    let binary = if config.watch_binary {
        Some(BinaryWatch::current()?)
    } else {
        None
    };

    let widgets = bar_widgets::build_all(&config.widgets, restarter)?;
    info!(widgets = widgets.len(), continuation = restarter.is_continuation(), "starting");

    let mut out = ProtocolWriter::new(io::stdout());
    out.start(Header::default(), restarter)?;
    let mut bar = Bar::new(widgets, config.separator, out);

    let mut clicks = spawn_click_reader(io::stdin(), restarter.clone(), bar.len())?;
    let mut config_changes = config
        .watch_config
        .then(|| ConfigWatcher::spawn(config_path).1);

    event_loop(
        &mut bar,
        config.interval(),
        &mut clicks,
        binary.as_ref(),
        &mut config_changes,
    )
    .await
}

/// Draw, then wait for the timer or a click that asks for a redraw.
/// Returns when a restart is due.
pub async fn event_loop<W: Write>(
    bar: &mut Bar<W>,
    interval: Duration,
    clicks: &mut mpsc::Receiver<Wake>,
    binary: Option<&BinaryWatch>,
    config_changes: &mut Option<mpsc::Receiver<()>>,
) -> Result<Exit> {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;

    loop {
        if binary.is_some_and(BinaryWatch::changed) {
            return Ok(Exit::BinaryChanged);
        }
        bar.draw()?;

        loop {
            tokio::select! {
                _ = ticker.tick() => break,
                wake = clicks.recv() => match wake {
                    Some(Wake::Click(click)) => {
                        if bar.dispatch(&click) {
                            break;
                        }
                    }
                    Some(Wake::Failed(e)) => return Err(e),
                    None => return Err(BarError::Protocol("click reader stopped".into())),
                },
                Some(()) = next_change(config_changes) => return Ok(Exit::ConfigChanged),
            }
        }
    }
}

async fn next_change(rx: &mut Option<mpsc::Receiver<()>>) -> Option<()> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// The widgets in display order and the stream they are drawn to.
pub struct Bar<W> {
    widgets:   Vec<Box<dyn Widget>>,
    separator: Separator,
    out:       ProtocolWriter<W>,
}

impl<W: Write> Bar<W> {
    pub fn new(widgets: Vec<Box<dyn Widget>>, separator: Separator, out: ProtocolWriter<W>) -> Self {
        Self {
            widgets,
            separator,
            out,
        }
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Render every widget and write one status line.
    pub fn draw(&mut self) -> Result<()> {
        let batch = bar_renderer::render(&mut self.widgets, self.separator);
        self.out.write_batch(&batch)
    }

    /// Hand a click to its widget. Returns whether to redraw now.
    pub fn dispatch(&mut self, click: &Click) -> bool {
        let Some(widget) = self.widgets.get_mut(click.index) else {
            debug!(index = click.index, "click on a block that no longer exists");
            return false;
        };
        match widget.clickable() {
            Some(target) => target.click(&click.event),
            None => {
                debug!(index = click.index, "block is not clickable");
                false
            }
        }
    }

    pub fn writer(&self) -> &W {
        self.out.get_ref()
    }
}

/// Notices when the running executable is replaced on disk.
#[derive(Debug, Clone)]
pub struct BinaryWatch {
    path:  PathBuf,
    mtime: SystemTime,
}

impl BinaryWatch {
    pub fn current() -> Result<Self> {
        let path = std::env::current_exe()?;
        Self::new(path)
    }

    pub fn new(path: PathBuf) -> Result<Self> {
        let mtime = modified(&path).map_err(|e| BarError::read(&path, e))?;
        Ok(Self { path, mtime })
    }

    /// A missing file does not count as a change; the binary is briefly
    /// absent while a build replaces it.
    pub fn changed(&self) -> bool {
        match modified(&self.path) {
            Ok(mtime) => mtime != self.mtime,
            Err(e) => {
                debug!("cannot stat {}: {e}", self.path.display());
                false
            }
        }
    }
}

fn modified(path: &Path) -> io::Result<SystemTime> {
    std::fs::metadata(path)?.modified()
}

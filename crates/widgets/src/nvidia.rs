use bar_core::{BarError, Block, Restarter, Result, Widget};
use serde::Deserialize;
use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use tracing::{debug, warn};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NvidiaOptions {
    /// `{}` is replaced by the last line the command printed.
    pub format:  String,
    pub command: Vec<String>,
}

impl Default for NvidiaOptions {
    fn default() -> Self {
        Self {
            format:  "{}°C".into(),
            command: [
                "nvidia-smi",
                "--query-gpu=temperature.gpu",
                "--format=csv,noheader",
                "-l",
                "1",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

#[derive(Debug, Default)]
struct Reading {
    line:  Option<String>,
    error: Option<String>,
}

/// GPU temperature from a long-running `nvidia-smi -l 1`.
///
/// The command starts on the first render and its output is followed on a
/// background thread. It is killed before a self-restart, since the new
/// image starts its own.
pub struct NvidiaWidget {
    format:    String,
    command:   Vec<String>,
    reading:   Arc<Mutex<Reading>>,
    child:     Arc<Mutex<Option<Child>>>,
    restarter: Restarter,
    started:   bool,
}

impl NvidiaWidget {
    pub fn new(opts: NvidiaOptions, restarter: &Restarter) -> Self {
        Self {
            format:    opts.format,
            command:   opts.command,
            reading:   Arc::default(),
            child:     Arc::default(),
            restarter: restarter.clone(),
            started:   false,
        }
    }

    fn start(&mut self) -> Result<()> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| BarError::Config("nvidia: empty command".into()))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| BarError::Widget(format!("nvidia: cannot run {program}: {e}")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BarError::Widget("nvidia: no stdout pipe".into()))?;
        debug!(pid = child.id(), "started {program}");
        *lock(&self.child)? = Some(child);

        let reading = Arc::clone(&self.reading);
        thread::Builder::new()
            .name("nvidia-smi".into())
            .spawn(move || follow(stdout, &reading))
            .map_err(|e| BarError::Widget(format!("nvidia: cannot spawn reader: {e}")))?;

        let child = Arc::clone(&self.child);
        self.restarter.before_restart(move || stop(&child));
        Ok(())
    }
}

impl Widget for NvidiaWidget {
    fn name(&self) -> &str {
        "nvidia"
    }

    fn status(&mut self) -> Result<Block> {
        if !self.started {
            self.started = true;
            if let Err(e) = self.start() {
                lock(&self.reading)?.error = Some(e.to_string());
                return Err(e);
            }
        }

        let reading = lock(&self.reading)?;
        if let Some(error) = &reading.error {
            return Err(BarError::Widget(format!("nvidia: {error}")));
        }
        let text = match &reading.line {
            Some(line) => self.format.replace("{}", line),
            None => String::new(),
        };
        Ok(Block::new(text))
    }
}

impl Drop for NvidiaWidget {
    fn drop(&mut self) {
        stop(&self.child);
    }
}

fn follow(stdout: ChildStdout, reading: &Mutex<Reading>) {
    let mut lines = BufReader::new(stdout).lines();
    let error = loop {
        match lines.next() {
            Some(Ok(line)) => {
                if let Ok(mut r) = reading.lock() {
                    r.line = Some(line.trim_end().to_string());
                }
            }
            Some(Err(e)) => break e.to_string(),
            None => break "command exited".to_string(),
        }
    };
    warn!("nvidia: {error}");
    if let Ok(mut r) = reading.lock() {
        r.error = Some(error);
    }
}

fn stop(child: &Mutex<Option<Child>>) {
    let Some(mut child) = child.lock().ok().and_then(|mut c| c.take()) else {
        return;
    };
    if let Err(e) = child.kill() {
        debug!("nvidia: kill failed: {e}");
    }
    let _ = child.wait();
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| BarError::Widget("nvidia: state lock poisoned".into()))
}

//! In-place self-restart.
//!
//! A restart replaces the running process image with a fresh copy of the
//! same executable (same argv, same environment) via `execve`. No child is
//! spawned: the pid, stdin/stdout, and every descriptor not marked
//! close-on-exec survive into the new image.
//!
//! Protocol state that must not be repeated by the new image is handed over
//! through environment markers:
//!
//! | variable               | meaning                                        |
//! |------------------------|------------------------------------------------|
//! | `BARSTATUS_CONTINUE`   | the protocol header was already written        |
//! | `BARSTATUS_SEEN_TOKEN` | the click stream's leading `[` was consumed    |

use crate::error::{BarError, Result};
use nix::fcntl::{fcntl, FcntlArg, FdFlag};
use std::ffi::{CString, OsStr, OsString};
use std::os::fd::AsRawFd;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

pub const ENV_CONTINUE:   &str = "BARSTATUS_CONTINUE";
pub const ENV_SEEN_TOKEN: &str = "BARSTATUS_SEEN_TOKEN";
const ENV_YES: &str = "YES";

type Callback = Box<dyn FnMut() + Send>;

/// Coordinates self-restarts for every component of one process image.
///
/// Cloning is cheap; all clones share the same state. Components receive a
/// clone at construction and use it to register pre-restart work.
#[derive(Clone, Default)]
pub struct Restarter {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    header_sent: AtomicBool,
    token_seen:  AtomicBool,
    callbacks:   Mutex<Vec<Callback>>,
}

/// Everything `execve` needs to start the next image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecPlan {
    pub path: PathBuf,
    pub args: Vec<OsString>,
    pub env:  Vec<(OsString, OsString)>,
}

impl Restarter {
    /// Pick up the continuation markers left by a previous image, if any.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var_os(key))
    }

    /// Like [`Restarter::from_env`], reading variables through `lookup`.
    /// A marker counts only when its value is exactly `YES`.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let flag = |key: &str| lookup(key).is_some_and(|v| v == ENV_YES);
        let restarter = Self::default();
        restarter.inner.header_sent.store(flag(ENV_CONTINUE), Ordering::SeqCst);
        restarter.inner.token_seen.store(flag(ENV_SEEN_TOKEN), Ordering::SeqCst);
        restarter
    }

    /// `true` when a previous image of this run already wrote the header.
    pub fn is_continuation(&self) -> bool {
        self.inner.header_sent.load(Ordering::SeqCst)
    }

    pub fn mark_header_sent(&self) {
        self.inner.header_sent.store(true, Ordering::SeqCst);
    }

    /// `true` when the click stream's leading `[` is already consumed.
    pub fn token_seen(&self) -> bool {
        self.inner.token_seen.load(Ordering::SeqCst)
    }

    pub fn mark_token_seen(&self) {
        self.inner.token_seen.store(true, Ordering::SeqCst);
    }

    /// Register `callback` to run synchronously right before the image is
    /// replaced. Callbacks run in registration order.
    pub fn before_restart(&self, callback: impl FnMut() + Send + 'static) {
        self.lock_callbacks().push(Box::new(callback));
    }

    /// Mark `fd` close-on-exec so it does not leak into the next image.
    pub fn close_on_restart(&self, fd: &impl AsRawFd) -> Result<()> {
        let raw = fd.as_raw_fd();
        let flags = fcntl(raw, FcntlArg::F_GETFD)
            .map_err(|e| BarError::System(format!("F_GETFD on fd {raw}: {e}")))?;
        let flags = FdFlag::from_bits_truncate(flags) | FdFlag::FD_CLOEXEC;
        fcntl(raw, FcntlArg::F_SETFD(flags))
            .map_err(|e| BarError::System(format!("F_SETFD on fd {raw}: {e}")))?;
        Ok(())
    }

    /// Replace the current process image with a fresh copy of itself.
    ///
    /// Only returns if the replacement could not happen; the caller must
    /// treat that as fatal.
    pub fn restart(&self) -> BarError {
        let plan = match self.exec_plan() {
            Ok(plan) => plan,
            Err(e) => return e,
        };
        self.run_callbacks();

        info!("restarting {}", plan.path.display());
        match exec(&plan) {
            Ok(never) => match never {},
            Err(e) => e,
        }
    }

    fn run_callbacks(&self) {
        for callback in self.lock_callbacks().iter_mut() {
            callback();
        }
    }

    /// Build the argv and environment for the next image.
    pub fn exec_plan(&self) -> Result<ExecPlan> {
        let path = current_exe()?;
        let args = std::env::args_os().collect();

        let mut env: Vec<(OsString, OsString)> = std::env::vars_os()
            .filter(|(k, _)| k != ENV_CONTINUE && k != ENV_SEEN_TOKEN)
            .collect();
        if self.is_continuation() {
            env.push((ENV_CONTINUE.into(), ENV_YES.into()));
        }
        if self.token_seen() {
            env.push((ENV_SEEN_TOKEN.into(), ENV_YES.into()));
        }

        Ok(ExecPlan { path, args, env })
    }

    fn lock_callbacks(&self) -> std::sync::MutexGuard<'_, Vec<Callback>> {
        // A panicking callback must not block later restarts.
        self.inner
            .callbacks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for Restarter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Restarter")
            .field("continuation", &self.is_continuation())
            .field("token_seen", &self.token_seen())
            .finish_non_exhaustive()
    }
}

/// Path of the running executable.
///
/// When the binary was replaced on disk, Linux reports the old inode as
/// `"<path> (deleted)"`; the suffix is stripped so the new file is executed.
fn current_exe() -> Result<PathBuf> {
    let exe = std::env::current_exe()
        .map_err(|e| BarError::Restart(format!("unable to get executable: {e}")))?;
    let raw = exe.as_os_str().as_bytes();
    match raw.strip_suffix(b" (deleted)") {
        Some(stripped) => Ok(PathBuf::from(OsStr::from_bytes(stripped))),
        None => Ok(exe),
    }
}

fn exec(plan: &ExecPlan) -> Result<std::convert::Infallible> {
    let path = cstring(plan.path.as_os_str())?;
    let args = plan
        .args
        .iter()
        .map(|a| cstring(a))
        .collect::<Result<Vec<_>>>()?;
    let env = plan
        .env
        .iter()
        .map(|(k, v)| {
            let mut pair = k.clone();
            pair.push("=");
            pair.push(v);
            cstring(&pair)
        })
        .collect::<Result<Vec<_>>>()?;

    nix::unistd::execve(&path, &args, &env).map_err(|e| {
        warn!("execve of {} failed: {e}", plan.path.display());
        BarError::Restart(format!("unable to execve {}: {e}", plan.path.display()))
    })
}

fn cstring(s: &OsStr) -> Result<CString> {
    CString::new(s.as_bytes())
        .map_err(|_| BarError::Restart(format!("interior NUL in {s:?}")))
}

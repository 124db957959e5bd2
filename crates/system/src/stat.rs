use bar_core::{BarError, Result};
use std::ops::Index;

/// Number of time columns on a `/proc/stat` cpu line.
pub const COLUMNS: usize = 10;

/// Aggregate cpu times from the first line of `/proc/stat`, in `USER_HZ`
/// ticks, plus the number of individual cpus listed below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuStat {
    pub times: CpuTimes,
    pub cpus:  usize,
}

/// Time spent in each state, in `/proc/stat` column order: user, nice,
/// system, idle, iowait, irq, softirq, steal, guest, guest_nice.
///
/// Older kernels print fewer columns; missing ones read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes(pub [u64; COLUMNS]);

impl CpuTimes {
    pub const IDLE: usize = 3;

    pub fn idle(&self) -> u64 {
        self.0[Self::IDLE]
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    /// Busy cpus over the interval these times cover: the non-idle share
    /// of all time, scaled by the number of cpus. Zero if no time passed.
    pub fn load(&self, cpus: usize) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (total - self.idle()) as f64 * cpus as f64 / total as f64
    }
}

impl Index<usize> for CpuTimes {
    type Output = u64;

    fn index(&self, i: usize) -> &u64 {
        &self.0[i]
    }
}

impl From<[u64; COLUMNS]> for CpuTimes {
    fn from(times: [u64; COLUMNS]) -> Self {
        Self(times)
    }
}

impl CpuStat {
    /// Parse the raw contents of `/proc/stat`.
    ///
    /// See `proc_stat(5)`. Only the aggregate `cpu` line is decoded; the
    /// `cpuN` lines that follow it are counted.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(raw)
            .map_err(|e| BarError::Parse(format!("/proc/stat is not utf-8: {e}")))?;
        let mut lines = text.lines();

        let first = lines
            .next()
            .ok_or_else(|| BarError::Parse("/proc/stat is empty".into()))?;
        let mut tokens = first.split_whitespace();
        if tokens.next() != Some("cpu") {
            return Err(BarError::Parse(format!(
                "/proc/stat does not start with the cpu line: {first:?}"
            )));
        }

        let mut times = [0u64; COLUMNS];
        let mut columns = 0;
        for (slot, token) in times.iter_mut().zip(tokens) {
            *slot = token
                .parse()
                .map_err(|e| BarError::Parse(format!("invalid cpu time {token:?}: {e}")))?;
            columns += 1;
        }
        if columns <= CpuTimes::IDLE {
            return Err(BarError::Parse(format!("cpu line has only {columns} columns")));
        }

        let cpus = lines
            .take_while(|line| line.starts_with("cpu"))
            .count();

        Ok(Self {
            times: CpuTimes(times),
            cpus,
        })
    }
}

//! Readers for the kernel pseudo-files the widgets poll.

pub mod loadavg;
pub mod memory;
pub mod procfile;
pub mod sampler;
pub mod stat;

pub use loadavg::LoadAvg;
pub use memory::MemInfo;
pub use procfile::ProcFile;
pub use sampler::{Delta, Sample, SampleChain, Sampler, Window};
pub use stat::{CpuStat, CpuTimes};

pub const PROC_STAT:    &str = "/proc/stat";
pub const PROC_MEMINFO: &str = "/proc/meminfo";
pub const PROC_LOADAVG: &str = "/proc/loadavg";

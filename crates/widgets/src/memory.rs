use bar_core::{Block, Restarter, Result, Widget};
use bar_system::{memory::format_gib, MemInfo, ProcFile, PROC_MEMINFO};

/// Used and total memory in GiB, e.g. `7.3/15.5G`. Used memory is
/// `MemTotal - MemAvailable`.
pub struct MemoryWidget {
    meminfo: ProcFile,
}

impl MemoryWidget {
    pub fn new(restarter: &Restarter) -> Self {
        Self {
            meminfo: ProcFile::new(restarter.clone()),
        }
    }
}

impl Widget for MemoryWidget {
    fn name(&self) -> &str {
        "memory"
    }

    fn status(&mut self) -> Result<Block> {
        let info = MemInfo::parse(self.meminfo.read(PROC_MEMINFO)?)?;
        Ok(Block::new(format_gib(info.used(), info.total)))
    }
}

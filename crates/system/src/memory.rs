use bar_core::{BarError, Result};

/// The two `/proc/meminfo` fields the memory widget shows, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemInfo {
    pub total:     u64,
    pub available: u64,
}

impl MemInfo {
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(raw)
            .map_err(|e| BarError::Parse(format!("/proc/meminfo is not utf-8: {e}")))?;
        Ok(Self {
            total:     field(text, "MemTotal")?,
            available: field(text, "MemAvailable")?,
        })
    }

    pub fn used(&self) -> u64 {
        self.total.saturating_sub(self.available)
    }
}

/// Read one `Name:   1234 kB` line, honouring the unit suffix.
fn field(text: &str, name: &str) -> Result<u64> {
    let line = text
        .lines()
        .find_map(|line| line.strip_prefix(name)?.strip_prefix(':'))
        .ok_or_else(|| BarError::Parse(format!("meminfo: no {name:?} line")))?;

    let mut parts = line.split_whitespace();
    let value = parts
        .next()
        .ok_or_else(|| BarError::Parse(format!("meminfo: no value for {name:?}")))?;
    let value: u64 = value
        .parse()
        .map_err(|e| BarError::Parse(format!("meminfo: bad {name:?} value {value:?}: {e}")))?;

    let scale = match parts.next().map(str::to_ascii_lowercase).as_deref() {
        Some("gb" | "gib") => 1 << 30,
        Some("mb" | "mib") => 1 << 20,
        Some("kb" | "kib") => 1 << 10,
        _ => 1,
    };
    value
        .checked_mul(scale)
        .ok_or_else(|| BarError::Parse(format!("meminfo: {name:?} value {value} overflows")))
}

/// Format a used/total pair in GiB with one decimal, e.g. `"7.3/15.5G"`.
pub fn format_gib(used: u64, total: u64) -> String {
    const GIB: f64 = (1u64 << 30) as f64;
    format!("{:.1}/{:.1}G", used as f64 / GIB, total as f64 / GIB)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMINFO: &str = "\
MemTotal:       16283572 kB
MemFree:         1233580 kB
MemAvailable:    8116968 kB
Buffers:          502332 kB
";

    #[test]
    fn parses_kb_fields() {
        let m = MemInfo::parse(MEMINFO.as_bytes()).unwrap();
        assert_eq!(m.total, 16283572 * 1024);
        assert_eq!(m.available, 8116968 * 1024);
        assert_eq!(m.used(), (16283572 - 8116968) * 1024);
    }

    #[test]
    fn oversized_value_is_a_parse_error() {
        let raw = format!("MemTotal: {} kB\nMemAvailable: 1 kB\n", u64::MAX / 2);
        assert!(matches!(MemInfo::parse(raw.as_bytes()), Err(BarError::Parse(_))));
    }

    #[test]
    fn does_not_confuse_prefixed_names() {
        let raw = "MemTotalish: 1 kB\nMemTotal: 2 kB\nMemAvailable: 1\n";
        let m = MemInfo::parse(raw.as_bytes()).unwrap();
        assert_eq!(m.total, 2048);
        assert_eq!(m.available, 1);
    }

    #[test]
    fn missing_field() {
        assert!(MemInfo::parse(b"MemTotal: 1 kB\n").is_err());
    }

    #[test]
    fn gib_format() {
        assert_eq!(format_gib(3 << 29, 16 << 30), "1.5/16.0G");
    }
}

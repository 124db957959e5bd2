use bar_core::{BarError, Result};

/// The 1, 5 and 15 minute load averages, kept as the kernel prints them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadAvg {
    pub one:     String,
    pub five:    String,
    pub fifteen: String,
}

impl LoadAvg {
    /// Parse `/proc/loadavg`, e.g. `0.52 0.58 0.59 1/467 12345`.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(raw)
            .map_err(|e| BarError::Parse(format!("/proc/loadavg is not utf-8: {e}")))?;
        let mut fields = text.split_whitespace();
        let mut next = || {
            fields
                .next()
                .map(str::to_string)
                .ok_or_else(|| BarError::Parse(format!("short /proc/loadavg: {text:?}")))
        };
        Ok(Self {
            one:     next()?,
            five:    next()?,
            fifteen: next()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_averages() {
        let l = LoadAvg::parse(b"0.52 0.58 0.59 1/467 12345\n").unwrap();
        assert_eq!((l.one.as_str(), l.five.as_str(), l.fifteen.as_str()), ("0.52", "0.58", "0.59"));
    }

    #[test]
    fn rejects_short_input() {
        assert!(LoadAvg::parse(b"0.52 0.58").is_err());
    }
}

use bar_core::{BarError, Block, Result, Widget};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Local, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::fmt::Write;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClockOptions {
    /// `strftime`-style format.
    pub format:       String,
    pub short_format: Option<String>,
    /// `local`, `utc`, an IANA zone name such as `Asia/Tokyo`, or a fixed
    /// offset such as `+09:00`.
    pub timezone:     String,
}

impl Default for ClockOptions {
    fn default() -> Self {
        Self {
            format:       "%Y-%m-%d %H:%M:%S".into(),
            short_format: None,
            timezone:     "local".into(),
        }
    }
}

/// Displays the current time and date.
pub struct ClockWidget {
    format:       String,
    short_format: Option<String>,
    zone:         Zone,
}

impl ClockWidget {
    pub fn new(opts: ClockOptions) -> Result<Self> {
        for format in std::iter::once(&opts.format).chain(&opts.short_format) {
            if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                return Err(BarError::Config(format!("clock: invalid format {format:?}")));
            }
        }
        Ok(Self {
            zone: opts.timezone.parse()?,
            format: opts.format,
            short_format: opts.short_format,
        })
    }

    fn render(&self, now: DateTime<Utc>) -> Result<Block> {
        let mut block = Block::new(self.zone.format(now, &self.format)?);
        if let Some(short) = &self.short_format {
            block.short_text = Some(self.zone.format(now, short)?);
        }
        Ok(block)
    }
}

impl Widget for ClockWidget {
    fn name(&self) -> &str {
        "clock"
    }

    fn status(&mut self) -> Result<Block> {
        self.render(Utc::now())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Local,
    Utc,
    Fixed(FixedOffset),
    Named(Tz),
}

impl Zone {
    fn format(&self, now: DateTime<Utc>, format: &str) -> Result<String> {
        let mut out = String::new();
        let written = match self {
            Zone::Local => write!(out, "{}", now.with_timezone(&Local).format(format)),
            Zone::Utc => write!(out, "{}", now.format(format)),
            Zone::Fixed(offset) => write!(out, "{}", now.with_timezone(offset).format(format)),
            Zone::Named(tz) => write!(out, "{}", now.with_timezone(tz).format(format)),
        };
        written.map_err(|_| BarError::Widget(format!("clock: cannot format {format:?}")))?;
        Ok(out)
    }
}

impl FromStr for Zone {
    type Err = BarError;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || BarError::Config(format!("clock: unknown timezone {s:?}"));
        match s.to_ascii_lowercase().as_str() {
            "" | "local" => return Ok(Zone::Local),
            "utc" | "z" => return Ok(Zone::Utc),
            _ => {}
        }

        let (sign, rest) = match s.as_bytes().first() {
            Some(b'+') => (1, &s[1..]),
            Some(b'-') => (-1, &s[1..]),
            _ => return s.parse::<Tz>().map(Zone::Named).map_err(|_| bad()),
        };
        let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
        let hours: i32 = hours.parse().map_err(|_| bad())?;
        let minutes: i32 = minutes.parse().map_err(|_| bad())?;
        if !(0..60).contains(&minutes) {
            return Err(bad());
        }
        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(Zone::Fixed)
            .ok_or_else(bad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).single().unwrap()
    }

    fn clock(format: &str, timezone: &str) -> ClockWidget {
        ClockWidget::new(ClockOptions {
            format: format.into(),
            short_format: Some("%H:%M".into()),
            timezone: timezone.into(),
        })
        .unwrap()
    }

    #[test]
    fn long_format() {
        let block = clock("%A %B %m/%d/%Y %H:%M:%S", "utc").render(at()).unwrap();
        assert_eq!(block.full_text, "Tuesday March 03/05/2024 14:07:09");
        assert_eq!(block.short_text.as_deref(), Some("14:07"));
    }

    #[test]
    fn zones() {
        let fmt = "%a %H:%M %Z";
        assert_eq!(clock(fmt, "UTC").render(at()).unwrap().full_text, "Tue 14:07 UTC");
        assert_eq!(clock(fmt, "+09:00").render(at()).unwrap().full_text, "Tue 23:07 +09:00");
        assert_eq!(clock(fmt, "-05:30").render(at()).unwrap().full_text, "Tue 08:37 -05:30");
    }

    #[test]
    fn named_zones_use_their_abbreviation() {
        let fmt = "%a %H:%M %Z";
        assert_eq!(clock(fmt, "Asia/Tokyo").render(at()).unwrap().full_text, "Tue 23:07 JST");
        assert_eq!(
            "Asia/Tokyo".parse::<Zone>().unwrap(),
            Zone::Named(chrono_tz::Asia::Tokyo)
        );
    }

    #[test]
    fn named_zones_follow_daylight_saving() {
        let ny = clock("%H:%M %Z", "America/New_York");
        assert_eq!(ny.render(at()).unwrap().full_text, "09:07 EST");
        let summer = Utc.with_ymd_and_hms(2024, 7, 5, 14, 7, 9).single().unwrap();
        assert_eq!(ny.render(summer).unwrap().full_text, "10:07 EDT");
    }

    #[test]
    fn bad_timezone() {
        for tz in ["Mars/Olympus", "+9:75", "+", "+99:00"] {
            assert!(tz.parse::<Zone>().is_err(), "{tz}");
        }
        assert_eq!("local".parse::<Zone>().unwrap(), Zone::Local);
    }

    #[test]
    fn bad_format_is_rejected_up_front() {
        let opts = ClockOptions {
            format: "%Q".into(),
            ..ClockOptions::default()
        };
        assert!(ClockWidget::new(opts).is_err());
    }
}

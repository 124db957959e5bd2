use crate::segments::allocate;
use bar_core::{BarError, Block, Color, Markup, Restarter, Result, Widget};
use bar_system::{stat::COLUMNS, CpuStat, CpuTimes, LoadAvg, ProcFile, Sampler, PROC_LOADAVG, PROC_STAT};
use bar_theme::{escape, span, underline, CpuPalette, PaletteSpec};
use serde::Deserialize;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CpuOptions {
    /// Underline the text by cpu time category: a preset name (`"htop"`)
    /// or a table of colors.
    pub colors:    Option<PaletteSpec>,
    /// Lookback for the instantaneous load and the colors; `0` hides the
    /// instantaneous load.
    pub window_ms: u64,
    pub show_1:    bool,
    pub show_5:    bool,
    pub show_15:   bool,
    /// Columns to spread the fields across.
    pub width:     usize,
}

/// Load figures laid out in a fixed number of columns, underlined to show
/// how recent cpu time splits between user, system, iowait and so on.
pub struct CpuWidget {
    palette: Option<CpuPalette>,
    window:  Duration,
    show:    [bool; 3],
    width:   usize,
    sampler: Sampler<COLUMNS>,
    stat:    ProcFile,
    loadavg: ProcFile,
}

impl CpuWidget {
    pub fn new(opts: CpuOptions, restarter: &Restarter) -> Result<Self> {
        let palette = match &opts.colors {
            None => None,
            Some(spec) => Some(
                spec.resolve()
                    .ok_or_else(|| BarError::Config(format!("cpu: unknown palette {spec:?}")))?,
            ),
        };
        let window = Duration::from_millis(opts.window_ms);

        Ok(Self {
            palette,
            window,
            show: [opts.show_1, opts.show_5, opts.show_15],
            width: opts.width,
            sampler: Sampler::new(window),
            stat: ProcFile::new(restarter.clone()),
            loadavg: ProcFile::new(restarter.clone()),
        })
    }

    fn field_count(&self) -> usize {
        usize::from(!self.window.is_zero()) + self.show.iter().filter(|&&on| on).count()
    }
}

impl Widget for CpuWidget {
    fn name(&self) -> &str {
        "cpu"
    }

    fn status(&mut self) -> Result<Block> {
        if self.field_count() == 0 {
            return Err(BarError::Widget(
                "cpu: enable show_1, show_5 or show_15, or set window_ms".into(),
            ));
        }

        let mut fields = Vec::with_capacity(4);
        let mut recent = None;
        if !self.window.is_zero() || self.palette.is_some() {
            let stat = CpuStat::parse(self.stat.read(PROC_STAT)?)?;
            let delta = self.sampler.observe(Instant::now(), stat.times.0);
            let times = CpuTimes::from(delta.counters);
            if !self.window.is_zero() {
                fields.push(format!("{:.2}", times.load(stat.cpus)));
            }
            recent = Some(times);
        }

        if self.show.iter().any(|&on| on) {
            let avg = LoadAvg::parse(self.loadavg.read(PROC_LOADAVG)?)?;
            let [one, five, fifteen] = self.show;
            for (on, value) in [(one, avg.one), (five, avg.five), (fifteen, avg.fifteen)] {
                if on {
                    fields.push(value);
                }
            }
        }

        let text = layout(&fields, self.width);
        if let (Some(palette), Some(times)) = (&self.palette, recent) {
            if let Some(markup) = colorize(&text, &times, palette) {
                return Ok(Block {
                    full_text: markup,
                    markup: Markup::Pango,
                    ..Block::default()
                });
            }
        }
        Ok(Block::new(text))
    }
}

/// Spread `fields` over `width` columns (widened if they cannot fit at four
/// columns each), leading with an even margin.
fn layout(fields: &[String], width: usize) -> String {
    let count = fields.len().max(1);
    let natural = count * 4 - 1;
    let width = width.max(natural);
    let front = (width - natural) / (count * 2);

    let mut out = String::with_capacity(width);
    pad(&mut out, front, false);
    for (i, field) in fields.iter().enumerate() {
        out.push_str(field);
        if i + 1 < fields.len() {
            pad(&mut out, front + width * (i + 1) / count, true);
        }
    }
    pad(&mut out, width, false);
    out
}

fn pad(out: &mut String, to: usize, at_least_one: bool) {
    if at_least_one {
        out.push(' ');
    }
    let len = out.chars().count();
    out.extend(std::iter::repeat(' ').take(to.saturating_sub(len)));
}

/// Underline `text` in proportion to the cpu time in each colored category.
/// `None` when no colored category saw any time.
fn colorize(text: &str, times: &CpuTimes, palette: &CpuPalette) -> Option<String> {
    let mut colors: Vec<Color> = Vec::with_capacity(COLUMNS);
    let mut weights: Vec<u64> = Vec::with_capacity(COLUMNS);
    for (color, &time) in palette.categories().iter().zip(times.0.iter()) {
        let Some(color) = color else { continue };
        match colors.iter().position(|c| c == color) {
            Some(i) => weights[i] += time,
            None => {
                colors.push(*color);
                weights.push(time);
            }
        }
    }

    let chars: Vec<char> = text.chars().collect();
    let alloc = allocate(&weights, chars.len())?;

    let mut out = String::new();
    let mut rest = chars.as_slice();
    for (color, &units) in colors.iter().zip(&alloc.units) {
        if units == 0 {
            continue;
        }
        let (run, tail) = rest.split_at(units);
        out.push_str(&span(&underline(*color), &run.iter().collect::<String>()));
        rest = tail;
    }
    if !rest.is_empty() {
        let run: String = rest.iter().collect();
        match palette.other {
            Some(color) => out.push_str(&span(&underline(color), &run)),
            None => out.push_str(&escape(&run)),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn three_fields_in_24_columns() {
        let text = layout(&strings(&["1.23", "0.52", "0.59"]), 24);
        assert_eq!(text, "  1.23    0.52    0.59  ");
    }

    #[test]
    fn narrow_width_is_widened() {
        let text = layout(&strings(&["10.25", "9.00"]), 0);
        assert_eq!(text, "10.25 9.00");
    }

    #[test]
    fn single_field_is_centered_left() {
        assert_eq!(layout(&strings(&["0.52"]), 10), "   0.52   ");
    }

    fn times(user: u64, nice: u64, system: u64, idle: u64) -> CpuTimes {
        CpuTimes([user, nice, system, idle, 0, 0, 0, 0, 0, 0])
    }

    #[test]
    fn minor_categories_get_a_cell() {
        let out = colorize("abcdefghij", &times(98, 1, 1, 500), &CpuPalette::htop()).unwrap();
        assert_eq!(
            out,
            concat!(
                r##"<span underline="single" underline_color="#00FF00">abcdefgh</span>"##,
                r##"<span underline="single" underline_color="#0000FF">i</span>"##,
                r##"<span underline="single" underline_color="#FF0000">j</span>"##,
            )
        );
    }

    #[test]
    fn leftover_uses_other_color() {
        let out = colorize("abcd", &times(1, 1, 1, 0), &CpuPalette::htop()).unwrap();
        assert!(out.ends_with(r##"<span underline="single" underline_color="#FFFFFF">d</span>"##));
    }

    #[test]
    fn shared_colors_merge() {
        let red = Color::RED;
        let palette = CpuPalette {
            user: Some(red),
            system: Some(red),
            idle: Some(Color::rgb(0, 0, 0)),
            ..CpuPalette::default()
        };
        let out = colorize("ab", &times(1, 0, 1, 2), &palette).unwrap();
        assert_eq!(
            out,
            concat!(
                r##"<span underline="single" underline_color="#FF0000">a</span>"##,
                r##"<span underline="single" underline_color="#000000">b</span>"##,
            )
        );
    }

    #[test]
    fn no_colored_time_means_plain_text() {
        assert_eq!(colorize("abc", &times(0, 0, 0, 10), &CpuPalette::htop()), None);
    }

    #[test]
    fn nothing_enabled_is_an_error() {
        let mut w = CpuWidget::new(CpuOptions::default(), &Restarter::default()).unwrap();
        assert!(matches!(w.status(), Err(BarError::Widget(_))));
    }

    #[test]
    fn unknown_palette_is_rejected() {
        let opts = CpuOptions {
            colors: Some(PaletteSpec::Named("nope".into())),
            ..CpuOptions::default()
        };
        assert!(CpuWidget::new(opts, &Restarter::default()).is_err());
    }

    #[test]
    fn first_render_is_uncolored() {
        let opts = CpuOptions {
            colors: Some(PaletteSpec::Named("htop".into())),
            window_ms: 5_000,
            show_1: true,
            width: 16,
            ..CpuOptions::default()
        };
        let mut w = CpuWidget::new(opts, &Restarter::default()).unwrap();
        let block = w.status().unwrap();
        // No time has passed between samples yet.
        assert_eq!(block.markup, Markup::None);
        assert!(block.full_text.trim_start().starts_with("0.00"));
        assert!(block.full_text.chars().count() >= 16);
    }
}

use bar_core::{BarError, Block, Restarter, Result, Widget};
use bar_system::ProcFile;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemperatureOptions {
    /// Sensor file; `*` and `?` may appear in any component, but the
    /// pattern must match exactly one file.
    pub path:    String,
    /// The raw integer is divided by this, unless it is zero.
    pub divisor: f64,
    /// `{}` or `{:.N}` is replaced by the value.
    pub format:  String,
}

impl Default for TemperatureOptions {
    fn default() -> Self {
        Self {
            path:    "/sys/class/hwmon/hwmon0/temp1_input".into(),
            divisor: 1000.0,
            format:  "{:.0}°C".into(),
        }
    }
}

/// Formats an integer read from a sysfs sensor file.
pub struct TemperatureWidget {
    opts: TemperatureOptions,
    file: ProcFile,
}

impl TemperatureWidget {
    pub fn new(opts: TemperatureOptions, restarter: &Restarter) -> Result<Self> {
        // Reject a bad template up front rather than on every tick.
        fill(&opts.format, 0.0)?;
        Ok(Self {
            opts,
            file: ProcFile::new(restarter.clone()),
        })
    }
}

impl Widget for TemperatureWidget {
    fn name(&self) -> &str {
        "temperature"
    }

    fn status(&mut self) -> Result<Block> {
        let path = match glob(&self.opts.path)?.as_slice() {
            [one] => one.clone(),
            matches => {
                return Err(BarError::Widget(format!(
                    "temperature: {:?} matches {} files, not one",
                    self.opts.path,
                    matches.len()
                )))
            }
        };

        let raw = self.file.read(&path)?;
        let raw = std::str::from_utf8(raw).unwrap_or_default().trim_end();
        let value: i64 = raw.parse().map_err(|e| {
            BarError::Parse(format!("temperature: {} holds {raw:?}: {e}", path.display()))
        })?;

        let mut value = value as f64;
        if self.opts.divisor != 0.0 {
            value /= self.opts.divisor;
        }
        Ok(Block::new(fill(&self.opts.format, value)?))
    }
}

/// Substitute `value` into the first `{}` or `{:.N}` of `template`.
fn fill(template: &str, value: f64) -> Result<String> {
    let bad = || BarError::Config(format!("temperature: bad format {template:?}"));

    let Some(open) = template.find('{') else {
        return Ok(template.to_string());
    };
    let close = open + template[open..].find('}').ok_or_else(bad)?;
    let spec = &template[open + 1..close];

    let rendered = match spec {
        "" => value.to_string(),
        _ => {
            let precision: usize = spec
                .strip_prefix(":.")
                .and_then(|p| p.parse().ok())
                .ok_or_else(bad)?;
            format!("{value:.precision$}")
        }
    };
    Ok(format!("{}{rendered}{}", &template[..open], &template[close + 1..]))
}

/// Expand `*` and `?` in each component of `pattern`, returning the
/// matching paths in sorted order.
fn glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut found = vec![PathBuf::new()];
    for component in Path::new(pattern).components() {
        let part = component.as_os_str();
        let text = part.to_string_lossy();
        if !text.contains(['*', '?']) {
            for path in &mut found {
                path.push(part);
            }
            found.retain(|p| p.exists());
            continue;
        }

        let mut next = Vec::new();
        for dir in &found {
            let listing = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };
            let Ok(entries) = std::fs::read_dir(listing) else { continue };
            for entry in entries.flatten() {
                let name = entry.file_name();
                if wildcard(&text, &name.to_string_lossy()) {
                    next.push(dir.join(name));
                }
            }
        }
        found = next;
    }
    found.sort();
    Ok(found)
}

/// Shell-style match of a single path component.
fn wildcard(pattern: &str, name: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let n: Vec<char> = name.chars().collect();
    let (mut pi, mut ni) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ni < n.len() {
        match p.get(pi) {
            Some('*') => {
                star = Some((pi, ni));
                pi += 1;
            }
            Some(&c) if c == '?' || c == n[ni] => {
                pi += 1;
                ni += 1;
            }
            _ => match star {
                Some((sp, sn)) => {
                    pi = sp + 1;
                    ni = sn + 1;
                    star = Some((sp, sn + 1));
                }
                None => return false,
            },
        }
    }
    p[pi..].iter().all(|&c| c == '*')
}

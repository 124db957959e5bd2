//! UPS load from an apcupsd network information server (NIS).
//!
//! NIS frames are a big-endian `u16` length followed by that many bytes.
//! The client sends `status`; the server answers with one `KEY : value`
//! line per frame and a zero-length frame at the end.

use bar_core::{BarError, Block, Color, Result, Widget};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};
use tracing::debug;

const TIMEOUT: Duration = Duration::from_secs(1);

/// Unit suffixes apcupsd appends to numeric values.
const SUFFIXES: [&str; 7] = [" Minutes", " Seconds", " Percent", " Volts", " Watts", " Hz", " C"];

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApcupsdOptions {
    pub host:        String,
    /// How long a successful reading is reused before asking again.
    pub interval_ms: u64,
}

impl Default for ApcupsdOptions {
    fn default() -> Self {
        Self {
            host:        "localhost:3551".into(),
            interval_ms: 10_000,
        }
    }
}

pub struct ApcupsdWidget {
    host:     String,
    interval: Duration,
    conn:     Option<TcpStream>,
    cached:   Option<(Block, Instant)>,
}

impl ApcupsdWidget {
    pub fn new(opts: ApcupsdOptions) -> Self {
        Self {
            host:     opts.host,
            interval: Duration::from_millis(opts.interval_ms),
            conn:     None,
            cached:   None,
        }
    }

    fn query(&mut self) -> Result<HashMap<String, String>> {
        let conn = match &mut self.conn {
            Some(conn) => conn,
            slot => slot.insert(connect(&self.host)?),
        };
        let io_err = |e: io::Error| BarError::System(format!("apcupsd: {e}"));

        write_frame(conn, b"status").map_err(io_err)?;
        let mut fields = HashMap::new();
        loop {
            let frame = read_frame(conn).map_err(io_err)?;
            if frame.is_empty() {
                break;
            }
            let line = String::from_utf8_lossy(&frame);
            if let Some((key, value)) = line.split_once(':') {
                fields.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        Ok(fields)
    }
}

impl Widget for ApcupsdWidget {
    fn name(&self) -> &str {
        "apcupsd"
    }

    fn status(&mut self) -> Result<Block> {
        if let Some((block, expiry)) = &self.cached {
            if Instant::now() < *expiry {
                return Ok(block.clone());
            }
        }

        let fields = self.query().inspect_err(|_| {
            // Start from a fresh connection next time.
            self.conn = None;
        })?;
        let block = summarize(&fields)?;
        self.cached = Some((block.clone(), Instant::now() + self.interval));
        Ok(block)
    }
}

fn connect(host: &str) -> Result<TcpStream> {
    let addr = host
        .to_socket_addrs()
        .map_err(|e| BarError::Config(format!("apcupsd: bad host {host:?}: {e}")))?
        .next()
        .ok_or_else(|| BarError::Config(format!("apcupsd: {host:?} has no address")))?;

    let stream = TcpStream::connect_timeout(&addr, TIMEOUT)
        .map_err(|e| BarError::System(format!("apcupsd: cannot connect to {host}: {e}")))?;
    stream.set_read_timeout(Some(TIMEOUT))?;
    stream.set_write_timeout(Some(TIMEOUT))?;
    debug!("apcupsd: connected to {addr}");
    Ok(stream)
}

fn write_frame(w: &mut impl Write, data: &[u8]) -> io::Result<()> {
    let len = u16::try_from(data.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "frame too long"))?;
    w.write_all(&len.to_be_bytes())?;
    w.write_all(data)?;
    w.flush()
}

fn read_frame(r: &mut impl Read) -> io::Result<Vec<u8>> {
    let mut len = [0u8; 2];
    r.read_exact(&mut len)?;
    let mut frame = vec![0u8; usize::from(u16::from_be_bytes(len))];
    r.read_exact(&mut frame)?;
    Ok(frame)
}

/// Load in watts; on battery (red) or any other non-online state (yellow)
/// the remaining runtime is appended.
fn summarize(fields: &HashMap<String, String>) -> Result<Block> {
    let nominal = number(fields, "NOMPOWER")?;
    let load = number(fields, "LOADPCT")?;
    let mut text = format!("{:.0}W", load / 100.0 * nominal);

    let mut background = None;
    let status = fields.get("STATUS").map(String::as_str).unwrap_or_default();
    if status != "ONLINE" {
        background = Some(if status == "ONBATT" { Color::RED } else { Color::YELLOW });
        let left = number(fields, "TIMELEFT").unwrap_or(0.0);
        text.push_str(&format!(" ({left:.1} Min)"));
    }

    Ok(Block {
        short_text: Some(text.clone()),
        full_text: text,
        background,
        ..Block::default()
    })
}

fn number(fields: &HashMap<String, String>, key: &str) -> Result<f64> {
    let raw = fields
        .get(key)
        .ok_or_else(|| BarError::Parse(format!("apcupsd: no {key} in status")))?;
    let value = SUFFIXES
        .iter()
        .fold(raw.as_str(), |v, suffix| v.strip_suffix(suffix).unwrap_or(v));
    value
        .trim()
        .parse()
        .map_err(|e| BarError::Parse(format!("apcupsd: {key} is {raw:?}: {e}")))
}

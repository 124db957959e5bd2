use bar_core::{BarError, Restarter, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::Write;

/// The one-time object that opens the output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Header {
    pub version: u32,
    pub click_events: bool,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            version: 1,
            click_events: true,
        }
    }
}

/// Writes the status stream.
///
/// Every batch is followed by `,\n`, so the output is always a prefix of one
/// valid, never-closed JSON array.
pub struct ProtocolWriter<W> {
    out: W,
}

impl<W: Write> ProtocolWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Write the header and open the outer array, unless a previous image of
    /// this run already did.
    pub fn start(&mut self, header: Header, restarter: &Restarter) -> Result<()> {
        if restarter.is_continuation() {
            tracing::debug!("continuing protocol stream; header already sent");
            return Ok(());
        }

        serde_json::to_writer(&mut self.out, &header).map_err(encode_error)?;
        self.out.write_all(b"\n[\n").map_err(write_error)?;
        self.out.flush().map_err(write_error)?;
        restarter.mark_header_sent();
        Ok(())
    }

    /// Write one status line.
    pub fn write_batch(&mut self, batch: &[Map<String, Value>]) -> Result<()> {
        serde_json::to_writer(&mut self.out, batch).map_err(encode_error)?;
        self.out.write_all(b",\n").map_err(write_error)?;
        self.out.flush().map_err(write_error)
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn encode_error(e: serde_json::Error) -> BarError {
    BarError::Protocol(format!("unable to write output: {e}"))
}

fn write_error(e: std::io::Error) -> BarError {
    BarError::Protocol(format!("unable to write output: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn block(text: &str) -> Map<String, Value> {
        let Value::Object(map) = json!({ "full_text": text }) else {
            unreachable!()
        };
        map
    }

    #[test]
    fn fresh_stream_gets_header() {
        let restarter = Restarter::default();
        let mut w = ProtocolWriter::new(Vec::new());
        w.start(Header::default(), &restarter).unwrap();
        w.write_batch(&[block("a"), block("b")]).unwrap();

        let out = String::from_utf8(w.into_inner()).unwrap();
        assert_eq!(
            out,
            "{\"version\":1,\"click_events\":true}\n[\n\
             [{\"full_text\":\"a\"},{\"full_text\":\"b\"}],\n"
        );
        assert!(restarter.is_continuation());
    }

    #[test]
    fn continuation_skips_header() {
        let restarter = Restarter::default();
        restarter.mark_header_sent();
        let mut w = ProtocolWriter::new(Vec::new());
        w.start(Header::default(), &restarter).unwrap();
        w.write_batch(&[block("x")]).unwrap();

        assert_eq!(w.get_ref().as_slice(), b"[{\"full_text\":\"x\"}],\n");
    }

    #[test]
    fn stream_stays_parseable_once_closed() {
        let restarter = Restarter::default();
        let mut w = ProtocolWriter::new(Vec::new());
        w.start(Header::default(), &restarter).unwrap();
        for i in 0..3 {
            w.write_batch(&[block(&i.to_string())]).unwrap();
        }
        let out = String::from_utf8(w.into_inner()).unwrap();
        let (header, body) = out.split_once('\n').unwrap();
        let _: Value = serde_json::from_str(header).unwrap();

        // A consumer sees an open array; closing it must yield valid JSON.
        let closed = format!("{}[]]", body);
        let lines: Vec<Vec<Value>> = serde_json::from_str(&closed).unwrap();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2][0]["full_text"], "2");
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_is_a_protocol_error() {
        let restarter = Restarter::default();
        let mut w = ProtocolWriter::new(Broken);
        assert!(w.start(Header::default(), &restarter).is_err());
        assert!(!restarter.is_continuation());
        let err = w.write_batch(&[block("x")]).unwrap_err();
        assert!(matches!(err, BarError::Protocol(_)));
    }
}

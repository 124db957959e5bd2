use bar_core::{BarError, ClickEvent, Restarter, Result};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Chain, Cursor, ErrorKind, Read};

/// One click event as sent by the bar: the click itself plus the
/// `name`/`instance` of the block it hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickMessage {
    #[serde(flatten)]
    pub event: ClickEvent,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub instance: String,
}

impl ClickMessage {
    /// Zero-based index of the target block, if `instance` is a valid
    /// one-based position among `count` blocks.
    pub fn target(&self, count: usize) -> Option<usize> {
        let position: usize = self.instance.trim().parse().ok()?;
        (1..=count).contains(&position).then(|| position - 1)
    }
}

type Prefixed<R> = Chain<Cursor<&'static [u8]>, R>;

/// Decodes the endless array of click events the bar writes to stdin.
///
/// The leading `[` is read exactly once per run. A process image started by
/// a self-restart finds the stream already past it, so the token is
/// replayed from memory instead of read again.
pub struct ClickStream<R> {
    reader:    BufReader<Prefixed<R>>,
    opened:    bool,
    restarter: Restarter,
}

impl<R: Read> ClickStream<R> {
    pub fn new(input: R, restarter: Restarter) -> Self {
        let replay: &'static [u8] = if restarter.token_seen() { b"[" } else { b"" };
        Self {
            reader: BufReader::new(Cursor::new(replay).chain(input)),
            opened: false,
            restarter,
        }
    }

    /// Block until the next click event arrives.
    ///
    /// Any malformed input, and the end of the stream, is an error: the
    /// click channel cannot recover from either.
    pub fn next_click(&mut self) -> Result<ClickMessage> {
        if !self.opened {
            match self.skip(b" \t\r\n")? {
                Some(b'[') => self.reader.consume(1),
                Some(other) => {
                    return Err(BarError::Protocol(format!(
                        "got unexpected byte {:?} waiting for click stream header",
                        other as char
                    )))
                }
                None => return Err(closed()),
            }
            self.opened = true;
            self.restarter.mark_token_seen();
        }

        match self.skip(b" \t\r\n,")? {
            Some(b'{') => {}
            Some(other) => {
                return Err(BarError::Protocol(format!(
                    "got unexpected byte {:?} waiting for click event",
                    other as char
                )))
            }
            None => return Err(closed()),
        }

        let mut de = serde_json::Deserializer::from_reader(&mut self.reader);
        ClickMessage::deserialize(&mut de)
            .map_err(|e| BarError::Protocol(format!("unable to read click event: {e}")))
    }

    /// Consume bytes from `set` and peek the first byte outside it.
    fn skip(&mut self, set: &[u8]) -> Result<Option<u8>> {
        loop {
            let buf = match self.reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(BarError::Protocol(format!("unable to read clicks: {e}"))),
            };
            if buf.is_empty() {
                return Ok(None);
            }
            match buf.iter().position(|b| !set.contains(b)) {
                Some(n) => {
                    let byte = buf[n];
                    self.reader.consume(n);
                    return Ok(Some(byte));
                }
                None => {
                    let n = buf.len();
                    self.reader.consume(n);
                }
            }
        }
    }
}

fn closed() -> BarError {
    BarError::Protocol("click stream closed".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLICK: &str = r#"{"name":"cpu","instance":"2","button":1,"modifiers":["Shift"],"x":1320,"y":1400,"relative_x":12,"relative_y":8,"width":85,"height":22}"#;

    fn stream(input: &str, restarter: &Restarter) -> ClickStream<Cursor<Vec<u8>>> {
        ClickStream::new(Cursor::new(input.as_bytes().to_vec()), restarter.clone())
    }

    #[test]
    fn decodes_events_after_header() {
        let restarter = Restarter::default();
        let input = format!("[\n{CLICK}\n,{CLICK}\n");
        let mut s = stream(&input, &restarter);

        let first = s.next_click().unwrap();
        assert!(restarter.token_seen());
        assert_eq!(first.name, "cpu");
        assert_eq!(first.instance, "2");
        assert_eq!(first.event.button, 1);
        assert_eq!(first.event.relative_x, 12);
        assert_eq!(first.event.modifiers, vec!["Shift".to_string()]);

        let second = s.next_click().unwrap();
        assert_eq!(second, first);
        assert!(matches!(s.next_click(), Err(BarError::Protocol(_))));
    }

    #[test]
    fn continuation_does_not_reread_header() {
        let restarter = Restarter::default();
        restarter.mark_token_seen();
        // The earlier image consumed `[`; the stream resumes mid-array.
        let input = format!(",{CLICK}\n");
        let mut s = stream(&input, &restarter);
        assert_eq!(s.next_click().unwrap().instance, "2");
    }

    #[test]
    fn rejects_stream_without_header() {
        let restarter = Restarter::default();
        let mut s = stream(CLICK, &restarter);
        assert!(matches!(s.next_click(), Err(BarError::Protocol(_))));
        assert!(!restarter.token_seen());
    }

    #[test]
    fn malformed_event_is_fatal() {
        let restarter = Restarter::default();
        let mut s = stream("[{\"button\": \"left\"}", &restarter);
        assert!(s.next_click().is_err());
    }

    #[test]
    fn empty_input_is_closed() {
        let restarter = Restarter::default();
        let mut s = stream("", &restarter);
        assert!(s.next_click().is_err());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let restarter = Restarter::default();
        let mut s = stream(r#"[{"instance":"1","output_x":4,"scale":2}"#, &restarter);
        let m = s.next_click().unwrap();
        assert_eq!(m.target(1), Some(0));
        assert_eq!(m.event, ClickEvent::default());
    }

    #[test]
    fn target_is_one_based_and_bounded() {
        let at = |instance: &str| ClickMessage {
            instance: instance.into(),
            ..ClickMessage::default()
        };
        assert_eq!(at("1").target(3), Some(0));
        assert_eq!(at("3").target(3), Some(2));
        assert_eq!(at("0").target(3), None);
        assert_eq!(at("4").target(3), None);
        assert_eq!(at("-1").target(3), None);
        assert_eq!(at("cpu").target(3), None);
        assert_eq!(at("").target(3), None);
    }
}

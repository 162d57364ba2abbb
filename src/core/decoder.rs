//! Incremental decoder for the news feed
//!
//! The feed sends JSON arrays of objects, and a frame boundary may fall
//! anywhere inside an array. Bytes accumulate until one or more complete
//! arrays decode; only the decoded bytes are consumed.
//!
//! # Resynchronization
//! - Syntax or shape error right after a leftover partial frame: the
//!   leftover is dropped and the new bytes are decoded on their own
//! - Any other syntax or shape error: the buffer is discarded
//! - More than `max_incomplete` partial decodes in a row: discarded
//! - Buffer larger than `max_bytes`: discarded

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// One element of a feed batch: a news item or a control message
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FeedItem {
    /// `n` for news, otherwise `success`, `subscription` or `error`
    #[serde(rename = "T", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub symbols: Option<Vec<String>>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl FeedItem {
    pub fn is_error(&self) -> bool {
        self.kind.as_deref() == Some("error")
    }

    /// Feed id as text, for numeric or string ids
    pub fn id_string(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

pub struct FeedDecoder {
    buffer: Vec<u8>,
    incomplete_reads: u32,
    max_incomplete: u32,
    max_bytes: usize,
}

impl FeedDecoder {
    pub fn new(max_incomplete: u32, max_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            incomplete_reads: 0,
            max_incomplete,
            max_bytes,
        }
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Append `bytes` and return every item from the arrays now complete
    pub fn push(&mut self, bytes: &[u8]) -> Vec<FeedItem> {
        let stale = self.buffer.len();
        self.buffer.extend_from_slice(bytes);
        let appended = self.buffer.len();

        let mut items = Vec::new();
        let mut outcome = self.decode(&mut items);

        // A leftover fragment can poison the frame appended after it
        if outcome == Decoded::Malformed && stale > 0 && self.buffer.len() == appended {
            warn!(stale, "[INGEST] Dropping stale partial frame");
            self.buffer.drain(..stale);
            self.incomplete_reads = 0;
            outcome = self.decode(&mut items);
        }

        match outcome {
            Decoded::Complete => {
                self.incomplete_reads = 0;
            }
            Decoded::Malformed => {
                warn!(
                    buffered = self.buffer.len(),
                    "[INGEST] Malformed feed frame, resetting buffer"
                );
                self.buffer.clear();
                self.incomplete_reads = 0;
            }
            Decoded::Incomplete => {
                self.incomplete_reads += 1;
                if self.incomplete_reads > self.max_incomplete
                    || self.buffer.len() > self.max_bytes
                {
                    warn!(
                        incomplete_reads = self.incomplete_reads,
                        buffered = self.buffer.len(),
                        "[INGEST] Partial feed frame never completed, resetting buffer"
                    );
                    self.buffer.clear();
                    self.incomplete_reads = 0;
                }
            }
        }
        items
    }

    /// Decode every complete array at the front of the buffer and consume it
    fn decode(&mut self, items: &mut Vec<FeedItem>) -> Decoded {
        let mut consumed = 0;
        let outcome = {
            let mut stream =
                serde_json::Deserializer::from_slice(&self.buffer).into_iter::<Vec<FeedItem>>();
            loop {
                match stream.next() {
                    Some(Ok(batch)) => {
                        items.extend(batch);
                        consumed = stream.byte_offset();
                    }
                    Some(Err(e)) if e.is_eof() => break Decoded::Incomplete,
                    Some(Err(e)) => {
                        debug!(error = %e, "[INGEST] Feed decode error");
                        break Decoded::Malformed;
                    }
                    None => {
                        consumed = self.buffer.len();
                        break Decoded::Complete;
                    }
                }
            }
        };
        self.buffer.drain(..consumed);
        outcome
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decoded {
    Complete,
    Incomplete,
    Malformed,
}

#[cfg(test)]
mod tests {
    use super::*;

    const BATCH: &str = r#"[{"T":"n","id":24918784,"headline":"Apple unveils new product","symbols":["AAPL"],"source":"benzinga"},{"T":"n","id":24918785,"headline":"","symbols":[]}]"#;

    fn decoder() -> FeedDecoder {
        FeedDecoder::new(16, 1024 * 1024)
    }

    #[test]
    fn test_complete_batch() {
        let mut decoder = decoder();
        let items = decoder.push(BATCH.as_bytes());
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].headline.as_deref(), Some("Apple unveils new product"));
        assert_eq!(items[0].id_string().as_deref(), Some("24918784"));
        assert_eq!(items[0].symbols.as_deref(), Some(&["AAPL".to_string()][..]));
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_partial_frame_then_remainder() {
        let mut decoder = decoder();
        let (head, tail) = BATCH.split_at(40);

        assert!(decoder.push(head.as_bytes()).is_empty());
        assert_eq!(decoder.buffered(), head.len(), "Partial frame is kept");

        let items = decoder.push(tail.as_bytes());
        assert_eq!(items.len(), 2);
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_two_batches_and_a_partial_in_one_frame() {
        let mut decoder = decoder();
        let frame = format!("{}\n{}[{{\"headline\":\"x\"", BATCH, BATCH);
        let items = decoder.push(frame.as_bytes());
        assert_eq!(items.len(), 4);
        assert!(decoder.buffered() > 0);

        let rest = decoder.push(br#","symbols":["MSFT"]}]"#);
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].symbols.as_deref(), Some(&["MSFT".to_string()][..]));
    }

    #[test]
    fn test_malformed_frame_resynchronizes() {
        let mut decoder = decoder();
        assert!(decoder.push(b"[{\"headline\": nope}]").is_empty());
        assert_eq!(decoder.buffered(), 0);

        let items = decoder.push(BATCH.as_bytes());
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_stale_fragment_does_not_swallow_next_frame() {
        let mut decoder = decoder();
        assert!(decoder.push(br#"[{"T":"n","id":1,"headline":"cut off"#).is_empty());
        assert!(decoder.buffered() > 0);

        let items =
            decoder.push(br#"[{"T":"n","id":2,"headline":"Apple beats","symbols":["AAPL"]}]"#);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id_string().as_deref(), Some("2"));
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_stale_fragment_then_partial_frame() {
        let mut decoder = decoder();
        decoder.push(br#"[{"headline":"cut off"#);
        let (head, tail) = BATCH.split_at(40);

        assert!(decoder.push(head.as_bytes()).is_empty());
        assert_eq!(decoder.buffered(), head.len(), "Only the new partial frame is kept");
        assert_eq!(decoder.push(tail.as_bytes()).len(), 2);
    }

    #[test]
    fn test_non_array_frame_is_discarded() {
        let mut decoder = decoder();
        assert!(decoder.push(br#"{"T":"success","msg":"connected"}"#).is_empty());
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_control_messages() {
        let mut decoder = decoder();
        let items = decoder.push(br#"[{"T":"error","code":402,"msg":"auth failed"}]"#);
        assert_eq!(items.len(), 1);
        assert!(items[0].is_error());
        assert_eq!(items[0].code, Some(402));
        assert_eq!(items[0].headline, None);
    }

    #[test]
    fn test_string_ids() {
        let item: FeedItem = serde_json::from_str(r#"{"id":"abc"}"#).unwrap();
        assert_eq!(item.id_string().as_deref(), Some("abc"));
        let item: FeedItem = serde_json::from_str(r#"{"id":""}"#).unwrap();
        assert_eq!(item.id_string(), None);
    }

    #[test]
    fn test_stuck_partial_is_dropped() {
        let mut decoder = FeedDecoder::new(2, 1024);
        decoder.push(b"[{\"headline\":");
        decoder.push(b"\"a");
        assert!(decoder.buffered() > 0);
        decoder.push(b"b");
        assert_eq!(decoder.buffered(), 0, "Third incomplete read exceeds the limit");

        assert_eq!(decoder.push(BATCH.as_bytes()).len(), 2);
    }

    #[test]
    fn test_oversized_partial_is_dropped() {
        let mut decoder = FeedDecoder::new(16, 32);
        decoder.push(b"[{\"headline\":\"");
        decoder.push(&[b'a'; 64]);
        assert_eq!(decoder.buffered(), 0);
    }
}

//! Token streaming
//!
//! Generation runs on its own thread and sends text over a channel. The UI
//! drains whatever is available on each tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;

/// Reported when the generation thread goes away without `Done` or `Error`
const LOST_WORKER: &str = "generation thread ended unexpectedly";

/// A message sent from the generation thread
#[derive(Debug, Clone, PartialEq)]
pub enum StreamToken {
    Token(String),
    Done,
    Error(String),
}

/// Create a connected sender/stream pair sharing one cancel flag
pub fn channel() -> (StreamSender, TokenStream) {
    let (sender, receiver) = mpsc::channel();
    let cancel = Arc::new(AtomicBool::new(false));
    (
        StreamSender {
            sender,
            cancel: cancel.clone(),
        },
        TokenStream { receiver, cancel },
    )
}

/// Producer half, owned by the generation thread
pub struct StreamSender {
    sender: Sender<StreamToken>,
    cancel: Arc<AtomicBool>,
}

impl StreamSender {
    /// Send a piece of text. Returns false once the consumer is gone.
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        let text = text.into();
        if text.is_empty() {
            return true;
        }
        self.sender.send(StreamToken::Token(text)).is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    pub fn finish(self) {
        let _ = self.sender.send(StreamToken::Done);
    }

    pub fn fail(self, error: impl ToString) {
        let _ = self.sender.send(StreamToken::Error(error.to_string()));
    }
}

/// Text drained from a stream in one call
#[derive(Debug, Default, PartialEq)]
pub struct Drained {
    pub text: String,
    /// `Some(Ok)` on normal end, `Some(Err)` when generation failed
    pub end: Option<Result<(), String>>,
}

/// Consumer half of a generation
pub struct TokenStream {
    receiver: Receiver<StreamToken>,
    cancel: Arc<AtomicBool>,
}

impl TokenStream {
    /// Ask the generation thread to stop after the current token
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Take every message currently available without blocking
    pub fn try_drain(&self) -> Drained {
        let mut drained = Drained::default();
        loop {
            match self.receiver.try_recv() {
                Ok(StreamToken::Token(text)) => drained.text.push_str(&text),
                Ok(StreamToken::Done) => {
                    drained.end = Some(Ok(()));
                    break;
                }
                Ok(StreamToken::Error(e)) => {
                    drained.end = Some(Err(e));
                    break;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    drained.end = Some(Err(LOST_WORKER.to_string()));
                    break;
                }
            }
        }
        drained
    }

    /// Block until the stream ends and return the full text
    pub fn collect_blocking(self) -> Result<String, String> {
        let mut text = String::new();
        for token in self.receiver.iter() {
            match token {
                StreamToken::Token(t) => text.push_str(&t),
                StreamToken::Done => return Ok(text),
                StreamToken::Error(e) => return Err(e),
            }
        }
        Err(LOST_WORKER.to_string())
    }
}

/// Cuts generated text at the first stop sequence.
///
/// Text that could still turn into a stop sequence is held back until the
/// next push decides it.
#[derive(Debug, Clone)]
pub struct StopSequenceFilter {
    stops: Vec<String>,
    pending: String,
    stopped: bool,
}

impl StopSequenceFilter {
    pub fn new(stops: &[String]) -> Self {
        Self {
            stops: stops.iter().filter(|s| !s.is_empty()).cloned().collect(),
            pending: String::new(),
            stopped: false,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Feed generated text, returning the part that is safe to show
    pub fn push(&mut self, text: &str) -> String {
        if self.stopped {
            return String::new();
        }
        self.pending.push_str(text);

        let first_stop = self
            .stops
            .iter()
            .filter_map(|stop| self.pending.find(stop.as_str()))
            .min();
        if let Some(idx) = first_stop {
            self.pending.truncate(idx);
            self.stopped = true;
            return std::mem::take(&mut self.pending);
        }

        let split = self.pending.len() - self.held_back_len();
        let emitted = self.pending[..split].to_string();
        self.pending.drain(..split);
        emitted
    }

    /// Flush held-back text once generation has ended
    pub fn finish(&mut self) -> String {
        if self.stopped {
            return String::new();
        }
        std::mem::take(&mut self.pending)
    }

    /// Length of the longest pending suffix that is a proper prefix of a stop
    fn held_back_len(&self) -> usize {
        self.stops
            .iter()
            .filter_map(|stop| {
                let max = (stop.len() - 1).min(self.pending.len());
                (1..=max).rev().find(|&k| {
                    stop.is_char_boundary(k) && self.pending.ends_with(&stop[..k])
                })
            })
            .max()
            .unwrap_or(0)
    }
}

/// Incremental UTF-8 decoder for token bytes.
///
/// A token may end in the middle of a multi-byte character; those bytes wait
/// for the next token.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    buf: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) -> String {
        self.buf.extend_from_slice(bytes);
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.buf) {
                Ok(s) => {
                    out.push_str(s);
                    self.buf.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.buf[..valid]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.buf.drain(..valid + len);
                        }
                        None => {
                            self.buf.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush incomplete trailing bytes as replacement characters
    pub fn finish(&mut self) -> String {
        let out = String::from_utf8_lossy(&self.buf).to_string();
        self.buf.clear();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stops() -> Vec<String> {
        vec!["Q:".to_string(), "\n\n".to_string()]
    }

    fn run_filter(chunks: &[&str]) -> (String, bool) {
        let mut filter = StopSequenceFilter::new(&stops());
        let mut out = String::new();
        for chunk in chunks {
            out.push_str(&filter.push(chunk));
        }
        out.push_str(&filter.finish());
        (out, filter.is_stopped())
    }

    #[test]
    fn test_no_stop_passes_everything() {
        let (out, stopped) = run_filter(&["Il router ", "si resetta ", "così."]);
        assert_eq!(out, "Il router si resetta così.");
        assert!(!stopped);
    }

    #[test]
    fn test_stop_inside_single_chunk() {
        let (out, stopped) = run_filter(&["Due anni.\n\nQ: altro"]);
        assert_eq!(out, "Due anni.");
        assert!(stopped);
    }

    #[test]
    fn test_stop_split_across_chunks() {
        let mut filter = StopSequenceFilter::new(&stops());
        assert_eq!(filter.push("Fine.\n"), "Fine.");
        assert_eq!(filter.push("\nresto"), "");
        assert!(filter.is_stopped());
        assert_eq!(filter.push("ignored"), "");
        assert_eq!(filter.finish(), "");
    }

    #[test]
    fn test_partial_prefix_released_when_not_a_stop() {
        let mut filter = StopSequenceFilter::new(&stops());
        assert_eq!(filter.push("Punto Q"), "Punto ");
        assert_eq!(filter.push("uattro"), "Quattro");
        assert!(!filter.is_stopped());
    }

    #[test]
    fn test_held_back_text_flushed_on_finish() {
        let mut filter = StopSequenceFilter::new(&stops());
        assert_eq!(filter.push("ultima riga\n"), "ultima riga");
        assert_eq!(filter.finish(), "\n");
    }

    #[test]
    fn test_stop_at_start() {
        let (out, stopped) = run_filter(&["Q:", " domanda"]);
        assert_eq!(out, "");
        assert!(stopped);
    }

    #[test]
    fn test_empty_stops_are_ignored() {
        let mut filter = StopSequenceFilter::new(&[String::new()]);
        assert_eq!(filter.push("testo"), "testo");
    }

    #[test]
    fn test_multibyte_stop_prefix() {
        let mut filter = StopSequenceFilter::new(&["è fine".to_string()]);
        assert_eq!(filter.push("Questa è"), "Questa ");
        assert_eq!(filter.push(" fine"), "");
        assert!(filter.is_stopped());
    }

    #[test]
    fn test_utf8_decoder_joins_split_characters() {
        let bytes = "perché".as_bytes();
        let (head, tail) = bytes.split_at(bytes.len() - 1);

        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.push(head), "perch");
        assert_eq!(decoder.push(tail), "é");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_utf8_decoder_replaces_invalid_bytes() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.push(&[b'a', 0xFF, b'b']), "a\u{FFFD}b");
        assert_eq!(decoder.push(&[0xE2, 0x82]), "");
        assert_eq!(decoder.finish(), "\u{FFFD}");
    }

    #[test]
    fn test_token_stream_drain_and_collect() {
        let (sender, stream) = channel();
        assert!(sender.send_text("Ciao "));
        assert!(sender.send_text("mondo"));

        let drained = stream.try_drain();
        assert_eq!(drained.text, "Ciao mondo");
        assert_eq!(drained.end, None);

        sender.finish();
        let drained = stream.try_drain();
        assert_eq!(drained.text, "");
        assert_eq!(drained.end, Some(Ok(())));
    }

    #[test]
    fn test_token_stream_error_and_cancel() {
        let (sender, stream) = channel();
        stream.cancel();
        assert!(sender.is_cancelled());
        sender.send_text("parziale");
        sender.fail("boom");
        assert_eq!(stream.collect_blocking(), Err("boom".to_string()));
    }

    #[test]
    fn test_dropped_sender_is_an_error() {
        let (sender, stream) = channel();
        sender.send_text("metà");
        drop(sender);

        let drained = stream.try_drain();
        assert_eq!(drained.text, "metà");
        assert_eq!(drained.end, Some(Err(LOST_WORKER.to_string())));

        let (sender, stream) = channel();
        sender.send_text("metà");
        drop(sender);
        assert_eq!(stream.collect_blocking(), Err(LOST_WORKER.to_string()));
    }
}

//! Incremental response handling shared by the streaming adapters
//!
//! Upstream services answer with a live, single-pass stream of fragments.
//! The adapters turn the transport stream into a fragment stream and fold it
//! here into one value before returning.

use std::collections::VecDeque;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt, stream};

use crate::Result;

/// Sentinel payload that ends an OpenAI-style event stream
const DONE_SENTINEL: &str = "[DONE]";

/// One chunk of a streamed synthesis response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioFragment {
    /// Encoded audio bytes
    Audio(Bytes),
    /// Keep-alive or other non-audio frame
    Control,
}

/// Concatenate text fragments in arrival order
///
/// Absent and empty fragments are skipped. The first error aborts the fold.
///
/// # Errors
///
/// Returns the first error yielded by the stream
pub async fn collect_text<S>(fragments: S) -> Result<String>
where
    S: Stream<Item = Result<Option<String>>>,
{
    fragments
        .try_fold(String::new(), |mut text, fragment| async move {
            if let Some(fragment) = fragment.filter(|f| !f.is_empty()) {
                text.push_str(&fragment);
            }
            Ok(text)
        })
        .await
}

/// Concatenate audio fragments, discarding control frames
///
/// # Errors
///
/// Returns the first error yielded by the stream
pub async fn collect_audio<S>(fragments: S) -> Result<Vec<u8>>
where
    S: Stream<Item = Result<AudioFragment>>,
{
    fragments
        .try_fold(Vec::new(), |mut audio, fragment| async move {
            match fragment {
                AudioFragment::Audio(chunk) => audio.extend_from_slice(&chunk),
                AudioFragment::Control => tracing::trace!("skipping control fragment"),
            }
            Ok(audio)
        })
        .await
}

/// Encode audio for a JSON transport
#[must_use]
pub fn encode_audio(audio: &[u8]) -> String {
    STANDARD.encode(audio)
}

/// Decoder for server-sent events
///
/// Transport chunks can split lines (and UTF-8 sequences), so bytes are held
/// until a newline arrives. An event's `data` lines are only released once
/// the blank line closing the event has been read.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Option<String>,
    done: bool,
}

impl SseDecoder {
    /// Feed a transport chunk, returning the payloads of events it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.done {
            return Vec::new();
        }
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(data) = self.accept_line(&line) {
                payloads.push(data);
            }
            if self.done {
                self.buffer.clear();
                break;
            }
        }
        payloads
    }

    /// Discard anything that did not form a complete event
    ///
    /// Returns whether an incomplete event was dropped.
    pub fn finish(&mut self) -> bool {
        let pending = self.data.take();
        let buffered = std::mem::take(&mut self.buffer);
        !self.done && (pending.is_some() || !buffered.is_empty())
    }

    /// Whether the `[DONE]` sentinel has been seen
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }

    fn accept_line(&mut self, line: &[u8]) -> Option<String> {
        let line = String::from_utf8_lossy(line);
        let line = line.trim_end_matches(['\r', '\n']);

        if line.is_empty() {
            let data = self.data.take()?;
            if data == DONE_SENTINEL {
                self.done = true;
                return None;
            }
            return Some(data);
        }

        // Comments, event names and ids carry no payload
        let value = line.strip_prefix("data:")?;
        let value = value.strip_prefix(' ').unwrap_or(value);
        match &mut self.data {
            Some(data) => {
                data.push('\n');
                data.push_str(value);
            }
            None => self.data = Some(value.to_string()),
        }
        None
    }
}

/// Turn a byte stream into its event `data` payloads
///
/// Ends at the `[DONE]` sentinel or when the transport closes, whichever
/// comes first. An event cut off by the close is dropped. A transport error
/// is yielded once and ends the stream.
pub fn sse_data<S, E>(bytes: S) -> impl Stream<Item = std::result::Result<String, E>>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
{
    let state = (bytes, SseDecoder::default(), VecDeque::new(), false);

    stream::unfold(state, |(mut bytes, mut decoder, mut pending, mut ended)| async move {
        loop {
            if let Some(data) = pending.pop_front() {
                return Some((Ok(data), (bytes, decoder, pending, ended)));
            }
            if ended || decoder.is_done() {
                return None;
            }
            match bytes.next().await {
                Some(Ok(chunk)) => pending.extend(decoder.push(&chunk)),
                Some(Err(e)) => {
                    ended = true;
                    return Some((Err(e), (bytes, decoder, pending, ended)));
                }
                None => {
                    ended = true;
                    let dropped_tail = decoder.finish();
                    tracing::warn!(
                        dropped_tail,
                        "event stream closed before [DONE], keeping partial response"
                    );
                }
            }
        }
    })
}

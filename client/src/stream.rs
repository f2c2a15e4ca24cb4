//! Move notifications over `text/event-stream`.

use crate::Error;
use futures_util::{Stream, StreamExt, stream::BoxStream};
use serde::Deserialize;
use std::mem;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// A dispatched server-sent event.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Event {
    /// The event type, if given.
    pub event: Option<String>,
    /// The last event ID seen on the stream.
    pub id: Option<String>,
    /// The data lines, joined by `\n`.
    pub data: String,
}

/// An incremental decoder of `text/event-stream` bodies.
///
/// Chunks may split lines, line terminators and UTF-8 sequences anywhere.
/// A byte order mark at the start of the stream is skipped.
#[derive(Debug, Default)]
pub struct EventDecoder {
    buf: Vec<u8>,
    started: bool,
    skip_lf: bool,
    data: String,
    event: Option<String>,
    id: Option<String>,
}

impl EventDecoder {
    /// Creates a decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk, returning the events completed by it.
    pub fn feed(&mut self, mut chunk: &[u8]) -> Vec<Event> {
        if self.skip_lf && !chunk.is_empty() {
            self.skip_lf = false;
            if chunk[0] == b'\n' {
                chunk = &chunk[1..];
            }
        }
        self.buf.extend_from_slice(chunk);

        if !self.started {
            if self.buf.len() < BOM.len() && BOM.starts_with(&self.buf) {
                return vec![];
            }
            if self.buf.starts_with(BOM) {
                self.buf.drain(..BOM.len());
            }
            self.started = true;
        }

        let mut events = vec![];
        let mut start = 0;
        while let Some(len) = self.buf[start..]
            .iter()
            .position(|&b| b == b'\n' || b == b'\r')
        {
            let end = start + len;
            let line = String::from_utf8_lossy(&self.buf[start..end]).into_owned();
            start = end + 1;

            // A CR may be the first half of a CRLF split across chunks.
            if self.buf[end] == b'\r' {
                match self.buf.get(start) {
                    Some(b'\n') => start += 1,
                    Some(_) => {}
                    None => self.skip_lf = true,
                }
            }

            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        self.buf.drain(..start);
        events
    }

    fn process_line(&mut self, line: &str) -> Option<Event> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            "event" => self.event = Some(value.into()),
            "id" if !value.contains('\0') => self.id = Some(value.into()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<Event> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let mut data = mem::take(&mut self.data);
        data.pop();
        Some(Event {
            event,
            id: self.id.clone(),
            data,
        })
    }
}

/// A notification that something happened in a game.
///
/// Carries no game state; the receiver is expected to fetch it.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MoveNotification {
    /// The game ID.
    #[serde(default)]
    pub game_id: Option<String>,
    /// The last action taken, e.g. `move_forfeited`.
    #[serde(default)]
    pub last_action: Option<String>,
    /// A message to show to the user.
    #[serde(default)]
    pub message: Option<String>,
}

impl MoveNotification {
    /// The last action of a move forfeited by timeout.
    pub const FORFEITED: &'static str = "move_forfeited";

    /// Tests if the notification reports a forfeited move.
    #[must_use]
    pub fn is_forfeit(&self) -> bool {
        self.last_action.as_deref() == Some(Self::FORFEITED)
    }
}

/// A stream of move notifications.
pub type NotificationStream = BoxStream<'static, Result<MoveNotification, Error>>;

/// Decodes a stream of body chunks into move notifications.
///
/// Transport errors are yielded as [`Error::Http`] and undecodable payloads
/// as [`Error::Decode`], neither ending the stream.
pub fn notifications<S, B>(endpoint: String, chunks: S) -> NotificationStream
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + 'static,
    B: AsRef<[u8]> + 'static,
{
    let mut decoder = EventDecoder::new();
    chunks
        .map(move |res| match res {
            Ok(chunk) => decoder
                .feed(chunk.as_ref())
                .into_iter()
                .map(|event| {
                    serde_json::from_str::<MoveNotification>(&event.data).map_err(|source| Error::Decode {
                        endpoint: endpoint.clone(),
                        source,
                    })
                })
                .collect::<Vec<_>>(),
            Err(source) => vec![Err(Error::Http {
                endpoint: endpoint.clone(),
                source,
            })],
        })
        .flat_map(futures_util::stream::iter)
        .boxed()
}

//! Wire framing and the message-dispatch state machine.
//!
//! [`ProtocolState`] owns the unprocessed input buffer for one peer
//! connection and turns arbitrary byte deliveries into an ordered stream of
//! handler callbacks. It is purely synchronous: [`ProtocolState::input`]
//! runs to quiescence and returns, never waiting for I/O.
//!
//! ## State machine
//!
//! ```text
//!            full frame, payload prefix
//!    ┌─────┐ ─────────────────────────────▶ ┌─────────┐
//!    │Frame│                                │ Payload │
//!    └─────┘ ◀───────────────────────────── └─────────┘
//!            zero chunk / chunk garbage
//! ```
//!
//! In frame mode the scanner ([`frame::find_frame`]) locates one message per
//! line, the [`Coder`] decodes the body, and [`ProtocolHandler::on_message`]
//! fires. A payload-flagged frame switches to payload mode, where chunk
//! headers ([`payload::find_chunk`]) drive [`ProtocolHandler::on_payload`]
//! until the zero-sized terminator.
//!
//! ## Garbage is local, not fatal
//!
//! Malformed framing discards bytes up to the next synchronization point,
//! fires a garbage callback, and keeps the state machine usable. Whether
//! repeated garbage warrants a disconnect is upper-layer policy (see
//! [`ProtocolConfig`](crate::config::ProtocolConfig)).
//!
//! One `ProtocolState` serves one peer; it is not thread-safe. Run one
//! instance per connection.

use crate::message::{Coder, Message};

pub mod frame;
pub mod io;
pub mod payload;

pub use frame::{encode_frame, find_frame, FramePrefix, FrameScan, RawFrame, MIN_FRAME_LEN};
pub use payload::{
    encode_chunk, find_chunk, ChunkHeader, ChunkScan, MAX_PAYLOAD_CHUNK, MAX_SIZE_LINE,
    PAYLOAD_END,
};

/// Starting capacity of the input buffer. The buffer grows as needed; any
/// hard cap is upper-layer policy.
pub const INPUT_BUFF_CAPACITY: usize = 4096;

/// Upper-layer callbacks invoked by [`ProtocolState`].
///
/// For a frame with payload the order is always `on_message`, `on_payload`
/// zero or more times, `on_payload_end`. Chunk bytes are borrowed from the
/// input buffer and are only valid for the duration of the callback; copy
/// them if retention is needed.
pub trait ProtocolHandler {
    /// A frame was successfully decoded.
    fn on_message(&mut self, msg: Message);

    /// A non-empty payload chunk was received.
    fn on_payload(&mut self, chunk: &[u8]) {
        tracing::debug!(len = chunk.len(), "payload chunk ignored");
    }

    /// The zero-sized terminator ended the current payload stream.
    fn on_payload_end(&mut self) {}

    /// The scanner reported garbage in frame mode. `buf` is a snapshot of
    /// the input buffer before the garbage is discarded.
    fn on_msg_garbage(&mut self, buf: &[u8]) {
        tracing::warn!(buffered = buf.len(), "discarding garbage in frame mode");
    }

    /// The chunk reader reported garbage in payload mode.
    fn on_pl_garbage(&mut self, buf: &[u8]) {
        tracing::warn!(buffered = buf.len(), "discarding garbage in payload mode");
    }
}

/// Protocol state machine for one peer connection.
///
/// Owns the input buffer, drives the frame scanner, chunk reader, and coder
/// to completion on every [`input`](Self::input) call, and dispatches to a
/// [`ProtocolHandler`].
#[derive(Debug)]
pub struct ProtocolState<H> {
    handler: H,
    coder: Coder,
    input_buff: Vec<u8>,
    read_payload: bool,
    pending_chunk: Option<ChunkHeader>,
}

impl<H: ProtocolHandler> ProtocolState<H> {
    /// State machine with the default JSON coder.
    pub fn new(handler: H) -> Self {
        Self::with_coder(handler, Coder::default())
    }

    /// State machine with an explicit coder.
    pub fn with_coder(handler: H, coder: Coder) -> Self {
        Self {
            handler,
            coder,
            input_buff: Vec::with_capacity(INPUT_BUFF_CAPACITY),
            read_payload: false,
            pending_chunk: None,
        }
    }

    /// Borrow the handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Mutably borrow the handler.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Consume the state machine, returning the handler.
    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Whether the driver is in payload mode.
    pub fn reading_payload(&self) -> bool {
        self.read_payload
    }

    /// Unprocessed bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.input_buff.len()
    }

    /// Feed bytes from the peer, in whatever splits the transport delivers
    /// them. Processes everything processable, firing callbacks in stream
    /// order, and returns with only incomplete data left in the buffer.
    ///
    /// Never panics and never returns an error: malformed input is reported
    /// through the garbage callbacks and recovered locally.
    pub fn input(&mut self, data: &[u8]) {
        self.input_buff.extend_from_slice(data);
        loop {
            let progressed = if self.read_payload {
                self.step_payload()
            } else {
                self.step_frame()
            };
            if !progressed {
                break;
            }
        }
    }

    /// One frame-mode step. Returns false when the buffer holds no complete
    /// frame.
    fn step_frame(&mut self) -> bool {
        match frame::find_frame(&self.input_buff) {
            FrameScan::Incomplete => false,
            FrameScan::Garbage { consumed } => {
                self.handler.on_msg_garbage(&self.input_buff);
                self.input_buff.drain(..consumed);
                true
            }
            FrameScan::Frame(raw) => {
                let decoded = self.coder.decode_msg(
                    raw.prefix.has_payload(),
                    &self.input_buff[raw.body.clone()],
                    &self.input_buff[raw.signature.clone()],
                );
                match decoded {
                    Ok(msg) => {
                        let wants_payload = msg.has_payload;
                        tracing::trace!(kind = msg.kind_name(), "frame decoded");
                        self.handler.on_message(msg);
                        if wants_payload {
                            self.read_payload = true;
                        }
                    }
                    Err(err) => {
                        // Codec errors are garbage from the driver's point of
                        // view; the frame is consumed either way.
                        tracing::debug!(error = %err, "message body rejected");
                        self.handler.on_msg_garbage(&self.input_buff);
                    }
                }
                self.input_buff.drain(..raw.consumed);
                true
            }
        }
    }

    /// One payload-mode step. Returns false when the buffer holds neither a
    /// full chunk nor a decidable header.
    fn step_payload(&mut self) -> bool {
        let chunk = match self.pending_chunk {
            Some(chunk) => chunk,
            None => match payload::find_chunk(&self.input_buff) {
                ChunkScan::Incomplete => return false,
                ChunkScan::Garbage { discard } => {
                    self.handler.on_pl_garbage(&self.input_buff);
                    self.input_buff.drain(..discard);
                    self.read_payload = false;
                    return true;
                }
                ChunkScan::Header(chunk) => {
                    self.pending_chunk = Some(chunk);
                    chunk
                }
            },
        };

        if self.input_buff.len() < chunk.total_len() {
            // Wait for the rest of the chunk without rescanning its header.
            return false;
        }

        if chunk.is_terminator() {
            self.handler.on_payload_end();
            self.read_payload = false;
        } else {
            self.handler
                .on_payload(&self.input_buff[chunk.header_len..chunk.total_len()]);
        }
        self.input_buff.drain(..chunk.total_len());
        self.pending_chunk = None;
        true
    }
}

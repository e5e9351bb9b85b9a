//! The body codec: textual wire form to typed [`Message`] and back.
//!
//! A [`Coder`] is constructed with an [`Encoding`] tag and hides the concrete
//! encoder behind an object-safe seam, so an alternate body encoding can be
//! added without touching the protocol driver. JSON is the only encoding
//! defined today.

use std::fmt;

use thiserror::Error;

use super::{Message, MessageKind};

/// Errors produced while encoding or decoding a message body.
#[derive(Error, Debug)]
pub enum CoderError {
    /// The body is not a syntactically valid object of a recognized kind:
    /// malformed text, unknown `"type"`, missing or mistyped fields.
    #[error("undecodable message body: {0}")]
    Decode(#[source] serde_json::Error),

    /// The message could not be serialized.
    #[error("unencodable message: {0}")]
    Encode(#[source] serde_json::Error),

    /// Bodies and signatures are single lines; a raw `\n` would break framing.
    #[error("message {0} contains a raw newline")]
    EmbeddedNewline(&'static str),
}

/// Available body encodings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    /// Single-line JSON object, `"type"`-discriminated
    #[default]
    Json,
}

/// Seam between the [`Coder`] and a concrete body encoding.
trait BodyCodec: fmt::Debug + Send + Sync {
    fn decode(&self, body: &[u8]) -> Result<MessageKind, CoderError>;
    fn encode(&self, kind: &MessageKind) -> Result<Vec<u8>, CoderError>;
}

#[derive(Debug)]
struct JsonCodec;

impl BodyCodec for JsonCodec {
    fn decode(&self, body: &[u8]) -> Result<MessageKind, CoderError> {
        serde_json::from_slice(body).map_err(CoderError::Decode)
    }

    fn encode(&self, kind: &MessageKind) -> Result<Vec<u8>, CoderError> {
        serde_json::to_vec(kind).map_err(CoderError::Encode)
    }
}

/// Bidirectional mapping between message bodies and [`Message`] values.
#[derive(Debug)]
pub struct Coder {
    codec: Box<dyn BodyCodec>,
}

impl Coder {
    /// Create a coder for the given body encoding.
    pub fn new(encoding: Encoding) -> Self {
        let codec: Box<dyn BodyCodec> = match encoding {
            Encoding::Json => Box::new(JsonCodec),
        };
        Self { codec }
    }

    /// Decode a message body into a typed [`Message`].
    ///
    /// `has_payload` comes from the frame prefix and `signature` is the raw
    /// signature line (empty for unsigned frames); both are stored on the
    /// message verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`CoderError`] when the body has a format that prevents
    /// decoding.
    pub fn decode_msg(
        &self,
        has_payload: bool,
        body: &[u8],
        signature: &[u8],
    ) -> Result<Message, CoderError> {
        let kind = self.codec.decode(body)?;
        Ok(Message {
            kind,
            has_payload,
            signature: signature.to_vec(),
        })
    }

    /// Encode a message into its body bytes (no prefix, no terminators).
    ///
    /// # Errors
    ///
    /// Returns [`CoderError`] when serialization fails.
    pub fn encode_msg(&self, msg: &Message) -> Result<Vec<u8>, CoderError> {
        self.codec.encode(&msg.kind)
    }
}

impl Default for Coder {
    fn default() -> Self {
        Self::new(Encoding::Json)
    }
}

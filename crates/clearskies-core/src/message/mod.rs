//! Typed protocol messages.
//!
//! Every unit on the wire decodes into a [`Message`]: a closed family of
//! kinds ([`MessageKind`]) plus the frame metadata that travels outside the
//! body, namely whether a binary payload follows and the raw detached
//! signature bytes. Signature *verification* is not done here; the bytes are
//! carried verbatim for an upper layer to check.
//!
//! The body is a single-line JSON object discriminated by its `"type"`
//! field:
//!
//! ```text
//! {"type":"ping","timeout":60}
//! {"type":"get","path":"photos/cat.jpg"}
//! ```
//!
//! Encoding and decoding live in [`coder`].

use serde::{Deserialize, Serialize};

use crate::share::FileInfo;

pub mod coder;

pub use coder::{Coder, CoderError, Encoding};

/// Default keep-alive interval requested by `ping` when the peer omits one.
pub const DEFAULT_PING_TIMEOUT: u32 = 60;

/// Access level a peer holds on a share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// Full read-write access
    ReadWrite,
    /// Read-only access
    ReadOnly,
    /// Untrusted: stores encrypted blocks without seeing content
    Untrusted,
}

impl Access {
    /// Wire name of this access level.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadWrite => "read_write",
            Self::ReadOnly => "read_only",
            Self::Untrusted => "untrusted",
        }
    }
}

fn default_ping_timeout() -> u32 {
    DEFAULT_PING_TIMEOUT
}

/// The closed set of protocol message kinds, discriminated by the `"type"`
/// field of the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageKind {
    /// Keep-alive; the peer promises another message within `timeout` seconds.
    Ping {
        /// Seconds until the next message is due
        #[serde(default = "default_ping_timeout")]
        timeout: u32,
    },
    /// First message on a fresh connection, before any share is selected.
    Greeting {
        /// Software identification string
        software: String,
        /// Protocol revisions the sender speaks
        protocol: Vec<u32>,
        /// Optional feature strings
        #[serde(default)]
        features: Vec<String>,
    },
    /// Selects a share and access level for this connection.
    Start {
        /// Software identification string
        software: String,
        /// Protocol revision chosen for this connection
        protocol: u32,
        /// Optional feature strings
        #[serde(default)]
        features: Vec<String>,
        /// Share id the sender wants to sync
        id: String,
        /// Access level being requested
        access: Access,
        /// Sender's peer id
        peer: String,
    },
    /// Rejects a `start`; the share is unknown or access was denied.
    CannotStart,
    /// Accepts a `start` and asks to upgrade the connection to TLS.
    Starttls {
        /// Responder's peer id
        peer: String,
        /// Access level granted
        access: Access,
    },
    /// Human-readable identity exchanged after the handshake.
    Identity {
        /// Device name
        name: String,
        /// Sender's clock, seconds since the epoch
        time: i64,
    },
    /// Requests the content of one file.
    Get {
        /// Share-relative path
        path: String,
    },
    /// Answers a `get`; the file content follows as the frame's payload.
    FileData {
        /// Share-relative path
        path: String,
    },
    /// Announces that a file changed, with its fresh metadata.
    Update {
        /// New metadata for the file
        file: FileInfo,
    },
    /// Announces that a file moved without changing content.
    Move {
        /// Old share-relative path
        source: String,
        /// New share-relative path
        destination: String,
    },
}

/// One decoded protocol message: the typed body plus frame metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The typed body
    pub kind: MessageKind,
    /// Whether a chunked binary payload follows this frame
    pub has_payload: bool,
    /// Raw signature bytes from the frame, empty when unsigned
    pub signature: Vec<u8>,
}

impl Message {
    /// Plain message: no payload, no signature.
    pub fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            has_payload: false,
            signature: Vec::new(),
        }
    }

    /// Message followed by a chunked binary payload.
    pub fn with_payload(kind: MessageKind) -> Self {
        Self {
            kind,
            has_payload: true,
            signature: Vec::new(),
        }
    }

    /// Message carrying a detached signature.
    pub fn signed(kind: MessageKind, signature: Vec<u8>) -> Self {
        Self {
            kind,
            has_payload: false,
            signature,
        }
    }

    /// Wire name of this message's kind.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            MessageKind::Ping { .. } => "ping",
            MessageKind::Greeting { .. } => "greeting",
            MessageKind::Start { .. } => "start",
            MessageKind::CannotStart => "cannot_start",
            MessageKind::Starttls { .. } => "starttls",
            MessageKind::Identity { .. } => "identity",
            MessageKind::Get { .. } => "get",
            MessageKind::FileData { .. } => "file_data",
            MessageKind::Update { .. } => "update",
            MessageKind::Move { .. } => "move",
        }
    }

    /// Whether this message is signed.
    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty()
    }
}

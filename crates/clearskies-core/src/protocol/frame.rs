//! Frame scanning: locating message boundaries in an input buffer.
//!
//! ## Frame format
//!
//! ```text
//! ┌────────┬──────────────────────────────┬──────┬───────────────┬──────┐
//! │ prefix │            body              │ '\n' │   signature   │ '\n' │
//! │ 0-1 B  │  single-line JSON object     │      │   (optional)  │      │
//! └────────┴──────────────────────────────┴──────┴───────────────┴──────┘
//! ```
//!
//! The optional prefix byte encodes two independent flags:
//!
//! | Prefix | Signature line | Payload follows |
//! |--------|----------------|-----------------|
//! | (none) | no             | no              |
//! | `$`    | yes            | no              |
//! | `!`    | no             | yes             |
//! | `&`    | yes            | yes             |
//!
//! The body always starts with `{`; any other leading byte is garbage. The
//! scanner only finds boundaries; body content is the coder's business.

use std::ops::Range;

use crate::message::{Coder, CoderError, Message};

/// Smallest possible frame on the wire: `{}` plus the newline.
pub const MIN_FRAME_LEN: usize = 3;

/// The frame prefix byte, decoded into its two flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramePrefix {
    /// No prefix: plain unsigned message without payload
    #[default]
    Bare,
    /// `$`: a signature line follows the body
    Signed,
    /// `!`: a chunked binary payload follows the frame
    Payload,
    /// `&`: both a signature line and a payload
    SignedPayload,
}

impl FramePrefix {
    /// Decode a prefix byte. `None` for anything but `$`, `!`, `&`.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'$' => Some(Self::Signed),
            b'!' => Some(Self::Payload),
            b'&' => Some(Self::SignedPayload),
            _ => None,
        }
    }

    /// The prefix for a message with the given flags, `Bare` when both are
    /// off.
    pub fn for_flags(signed: bool, payload: bool) -> Self {
        match (signed, payload) {
            (false, false) => Self::Bare,
            (true, false) => Self::Signed,
            (false, true) => Self::Payload,
            (true, true) => Self::SignedPayload,
        }
    }

    /// The wire byte, `None` for `Bare`.
    pub fn as_byte(self) -> Option<u8> {
        match self {
            Self::Bare => None,
            Self::Signed => Some(b'$'),
            Self::Payload => Some(b'!'),
            Self::SignedPayload => Some(b'&'),
        }
    }

    /// Whether a signature line follows the body.
    pub fn has_signature(self) -> bool {
        matches!(self, Self::Signed | Self::SignedPayload)
    }

    /// Whether a chunked payload follows the frame.
    pub fn has_payload(self) -> bool {
        matches!(self, Self::Payload | Self::SignedPayload)
    }
}

/// A complete frame located in the buffer, as byte ranges into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Decoded prefix flags
    pub prefix: FramePrefix,
    /// Body bytes, excluding prefix and newline
    pub body: Range<usize>,
    /// Signature bytes, empty range for unsigned frames
    pub signature: Range<usize>,
    /// Bytes this frame occupies from the start of the buffer
    pub consumed: usize,
}

/// Result of scanning the buffer for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameScan {
    /// No full frame yet; feed more bytes, buffer untouched
    Incomplete,
    /// Malformed framing; discard `consumed` bytes and resynchronize
    Garbage {
        /// Bytes to discard, through the next newline
        consumed: usize,
    },
    /// A complete frame
    Frame(RawFrame),
}

fn find_newline(buf: &[u8], from: usize) -> Option<usize> {
    buf[from..].iter().position(|&b| b == b'\n').map(|i| from + i)
}

/// Scan the buffer for the next frame boundary.
///
/// Framing is decided by the first two bytes plus the newline terminators;
/// garbage recovery advances to the next newline, so a lost synchronization
/// costs at most one line of bytes.
pub fn find_frame(buf: &[u8]) -> FrameScan {
    let Some(nl1) = find_newline(buf, 0) else {
        return FrameScan::Incomplete;
    };

    if buf.len() < MIN_FRAME_LEN {
        return FrameScan::Garbage { consumed: nl1 + 1 };
    }

    if buf[0] == b'{' {
        return FrameScan::Frame(RawFrame {
            prefix: FramePrefix::Bare,
            body: 0..nl1,
            signature: 0..0,
            consumed: nl1 + 1,
        });
    }

    let Some(prefix) = FramePrefix::from_byte(buf[0]) else {
        return FrameScan::Garbage { consumed: nl1 + 1 };
    };
    if buf[1] != b'{' {
        return FrameScan::Garbage { consumed: nl1 + 1 };
    }

    if !prefix.has_signature() {
        return FrameScan::Frame(RawFrame {
            prefix,
            body: 1..nl1,
            signature: 0..0,
            consumed: nl1 + 1,
        });
    }

    // Signed frame: the next line is the detached signature.
    let Some(nl2) = find_newline(buf, nl1 + 1) else {
        return FrameScan::Incomplete;
    };
    FrameScan::Frame(RawFrame {
        prefix,
        body: 1..nl1,
        signature: nl1 + 1..nl2,
        consumed: nl2 + 1,
    })
}

/// Encode a message as one complete frame: prefix, body, newline, and the
/// signature line when the message carries one.
///
/// # Errors
///
/// Returns [`CoderError`] when the body cannot be serialized or when the
/// body or signature contains a raw newline.
pub fn encode_frame(coder: &Coder, msg: &Message) -> Result<Vec<u8>, CoderError> {
    let body = coder.encode_msg(msg)?;
    if body.contains(&b'\n') {
        return Err(CoderError::EmbeddedNewline("body"));
    }
    if msg.signature.contains(&b'\n') {
        return Err(CoderError::EmbeddedNewline("signature"));
    }

    let prefix = FramePrefix::for_flags(msg.is_signed(), msg.has_payload);
    let mut out = Vec::with_capacity(body.len() + msg.signature.len() + 3);
    if let Some(byte) = prefix.as_byte() {
        out.push(byte);
    }
    out.extend_from_slice(&body);
    out.push(b'\n');
    if prefix.has_signature() {
        out.extend_from_slice(&msg.signature);
        out.push(b'\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageKind;

    #[test]
    fn bare_frame() {
        let scan = find_frame(b"{}\n");
        let FrameScan::Frame(frame) = scan else {
            panic!("expected frame, got {scan:?}");
        };
        assert_eq!(frame.prefix, FramePrefix::Bare);
        assert_eq!(frame.body, 0..2);
        assert!(frame.signature.is_empty());
        assert_eq!(frame.consumed, 3);
    }

    #[test]
    fn payload_prefix_needs_no_signature_line() {
        let FrameScan::Frame(frame) = find_frame(b"!{\"type\":\"get\"}\nrest") else {
            panic!("expected frame");
        };
        assert_eq!(frame.prefix, FramePrefix::Payload);
        assert_eq!(frame.body, 1..15);
        assert_eq!(frame.consumed, 16);
    }

    #[test]
    fn signed_frame_waits_for_signature_line() {
        assert_eq!(find_frame(b"${}\n"), FrameScan::Incomplete);
        assert_eq!(find_frame(b"${}\nSIGBY"), FrameScan::Incomplete);

        let FrameScan::Frame(frame) = find_frame(b"${}\nSIGBYTES\n") else {
            panic!("expected frame");
        };
        assert_eq!(frame.prefix, FramePrefix::Signed);
        assert_eq!(frame.body, 1..3);
        assert_eq!(frame.signature, 4..12);
        assert_eq!(frame.consumed, 13);
    }

    #[test]
    fn no_newline_is_incomplete() {
        assert_eq!(find_frame(b""), FrameScan::Incomplete);
        assert_eq!(find_frame(b"{\"type\":\"ping\"}"), FrameScan::Incomplete);
    }

    #[test]
    fn short_line_is_garbage() {
        assert_eq!(find_frame(b"x\n"), FrameScan::Garbage { consumed: 2 });
    }

    #[test]
    fn unknown_prefix_is_garbage() {
        assert_eq!(
            find_frame(b"XYZ\n{}\n"),
            FrameScan::Garbage { consumed: 4 }
        );
        // prefix byte accepted only when a '{' follows
        assert_eq!(
            find_frame(b"$x{}\n"),
            FrameScan::Garbage { consumed: 5 }
        );
    }

    #[test]
    fn encode_frame_picks_the_right_prefix() {
        let coder = Coder::default();

        let plain = Message::new(MessageKind::CannotStart);
        let bytes = encode_frame(&coder, &plain).expect("encode");
        assert_eq!(bytes[0], b'{');
        assert_eq!(*bytes.last().expect("nonempty"), b'\n');

        let signed = Message::signed(MessageKind::CannotStart, b"SIG".to_vec());
        let bytes = encode_frame(&coder, &signed).expect("encode");
        assert_eq!(bytes[0], b'$');
        assert!(bytes.ends_with(b"\nSIG\n"));

        let mut both = Message::with_payload(MessageKind::Get { path: "f".into() });
        both.signature = b"SIG".to_vec();
        let bytes = encode_frame(&coder, &both).expect("encode");
        assert_eq!(bytes[0], b'&');
    }

    #[test]
    fn encode_frame_rejects_newline_in_signature() {
        let coder = Coder::default();
        let msg = Message::signed(MessageKind::CannotStart, b"bad\nsig".to_vec());
        assert!(matches!(
            encode_frame(&coder, &msg),
            Err(CoderError::EmbeddedNewline("signature"))
        ));
    }

    #[test]
    fn encoded_frames_scan_back() {
        let coder = Coder::default();
        let msg = Message::signed(MessageKind::Get { path: "f".into() }, b"SIG".to_vec());
        let bytes = encode_frame(&coder, &msg).expect("encode");
        let FrameScan::Frame(frame) = find_frame(&bytes) else {
            panic!("expected frame");
        };
        assert_eq!(frame.consumed, bytes.len());
        assert_eq!(&bytes[frame.signature.clone()], b"SIG");
        let back = coder
            .decode_msg(
                frame.prefix.has_payload(),
                &bytes[frame.body.clone()],
                &bytes[frame.signature],
            )
            .expect("decode");
        assert_eq!(back, msg);
    }
}

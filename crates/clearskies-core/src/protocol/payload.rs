//! Payload chunk framing.
//!
//! A frame whose prefix flags a payload is followed by a chunked binary
//! stream:
//!
//! ```text
//! payload    := chunk* terminator
//! chunk      := size '\n' data[size]      ; 1 <= size <= 16 MiB
//! terminator := '0' '\n'
//! ```
//!
//! The size line is ASCII decimal and must terminate within
//! [`MAX_SIZE_LINE`] bytes (8 digits plus the newline); anything longer,
//! non-numeric, or above [`MAX_PAYLOAD_CHUNK`] is garbage.

use crate::error::{Error, Result};

/// Maximum bytes in one payload chunk (16 MiB).
pub const MAX_PAYLOAD_CHUNK: usize = 16_777_216;

/// Maximum bytes in the size line, newline included.
pub const MAX_SIZE_LINE: usize = 9;

/// The zero-sized chunk that terminates a payload stream.
pub const PAYLOAD_END: &[u8] = b"0\n";

/// A parsed chunk header: where the data starts and how long it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Bytes consumed by the size line, newline included
    pub header_len: usize,
    /// Payload bytes that follow the size line
    pub data_len: usize,
}

impl ChunkHeader {
    /// Total bytes this chunk occupies in the buffer.
    pub fn total_len(self) -> usize {
        self.header_len + self.data_len
    }

    /// A zero-sized chunk ends the payload stream.
    pub fn is_terminator(self) -> bool {
        self.data_len == 0
    }
}

/// Result of scanning the buffer for a chunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkScan {
    /// No full size line yet; feed more bytes
    Incomplete,
    /// Malformed size line; discard `discard` bytes and leave payload mode
    Garbage {
        /// Bytes to throw away
        discard: usize,
    },
    /// A well-formed chunk header
    Header(ChunkHeader),
}

/// Fold ASCII decimal digits into a size. Lenient about leading zeros; an
/// empty run folds to 0, which reads as the stream terminator.
fn ascii_base10(digits: &[u8]) -> Option<usize> {
    let mut value = 0usize;
    for &byte in digits {
        if !byte.is_ascii_digit() {
            return None;
        }
        value = value * 10 + usize::from(byte - b'0');
    }
    Some(value)
}

/// Scan the buffer for the next payload chunk header.
pub fn find_chunk(buf: &[u8]) -> ChunkScan {
    let Some(nl) = buf.iter().position(|&b| b == b'\n') else {
        if buf.len() > MAX_SIZE_LINE {
            // Over the size-line limit with no newline in sight: everything
            // buffered so far is garbage.
            return ChunkScan::Garbage { discard: buf.len() };
        }
        return ChunkScan::Incomplete;
    };

    let header_len = nl + 1;
    if header_len > MAX_SIZE_LINE {
        return ChunkScan::Garbage { discard: header_len };
    }

    let Some(data_len) = ascii_base10(&buf[..nl]) else {
        return ChunkScan::Garbage { discard: header_len };
    };
    if data_len > MAX_PAYLOAD_CHUNK {
        return ChunkScan::Garbage { discard: header_len };
    }

    ChunkScan::Header(ChunkHeader {
        header_len,
        data_len,
    })
}

/// Encode one payload chunk: the size line followed by the data.
///
/// # Errors
///
/// Returns an error for empty data (zero is the terminator, written with
/// [`PAYLOAD_END`]) and for chunks above [`MAX_PAYLOAD_CHUNK`].
pub fn encode_chunk(data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Err(Error::EmptyChunk);
    }
    if data.len() > MAX_PAYLOAD_CHUNK {
        return Err(Error::ChunkTooLarge {
            size: data.len(),
            limit: MAX_PAYLOAD_CHUNK,
        });
    }
    let size_line = data.len().to_string();
    let mut out = Vec::with_capacity(size_line.len() + 1 + data.len());
    out.extend_from_slice(size_line.as_bytes());
    out.push(b'\n');
    out.extend_from_slice(data);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_chunk_header() {
        assert_eq!(
            find_chunk(b"5\nHELLO"),
            ChunkScan::Header(ChunkHeader {
                header_len: 2,
                data_len: 5
            })
        );
    }

    #[test]
    fn zero_is_the_terminator() {
        let ChunkScan::Header(header) = find_chunk(b"0\n") else {
            panic!("expected header");
        };
        assert!(header.is_terminator());
        assert_eq!(header.total_len(), 2);
    }

    #[test]
    fn waits_for_the_size_line() {
        assert_eq!(find_chunk(b""), ChunkScan::Incomplete);
        assert_eq!(find_chunk(b"1234"), ChunkScan::Incomplete);
        // 9 bytes without a newline could still become a valid line
        assert_eq!(find_chunk(b"123456789"), ChunkScan::Incomplete);
    }

    #[test]
    fn long_run_without_newline_is_garbage() {
        assert_eq!(
            find_chunk(b"1234567890"),
            ChunkScan::Garbage { discard: 10 }
        );
    }

    #[test]
    fn size_line_over_nine_bytes_is_garbage() {
        assert_eq!(
            find_chunk(b"123456789\n"),
            ChunkScan::Garbage { discard: 10 }
        );
    }

    #[test]
    fn eight_digit_size_is_accepted_when_under_the_cap() {
        assert_eq!(
            find_chunk(b"16000000\nx"),
            ChunkScan::Header(ChunkHeader {
                header_len: 9,
                data_len: 16_000_000
            })
        );
    }

    #[test]
    fn oversize_chunk_is_garbage() {
        // one past the 16 MiB limit
        assert_eq!(
            find_chunk(b"16777217\n"),
            ChunkScan::Garbage { discard: 9 }
        );
        assert_eq!(
            find_chunk(b"16777216\n"),
            ChunkScan::Header(ChunkHeader {
                header_len: 9,
                data_len: MAX_PAYLOAD_CHUNK
            })
        );
    }

    #[test]
    fn non_numeric_size_is_garbage() {
        assert_eq!(find_chunk(b"12a\nxx"), ChunkScan::Garbage { discard: 4 });
        assert_eq!(find_chunk(b"+5\nxxxxx"), ChunkScan::Garbage { discard: 3 });
    }

    #[test]
    fn leading_zeros_are_tolerated() {
        assert_eq!(
            find_chunk(b"00000001\nx"),
            ChunkScan::Header(ChunkHeader {
                header_len: 9,
                data_len: 1
            })
        );
    }

    #[test]
    fn encode_chunk_round_trips() {
        let bytes = encode_chunk(b"HELLO").expect("encode");
        assert_eq!(bytes, b"5\nHELLO");
        let ChunkScan::Header(header) = find_chunk(&bytes) else {
            panic!("expected header");
        };
        assert_eq!(header.data_len, 5);
        assert_eq!(&bytes[header.header_len..header.total_len()], b"HELLO");
    }

    #[test]
    fn encode_chunk_rejects_empty_and_oversize() {
        assert!(matches!(encode_chunk(b""), Err(Error::EmptyChunk)));
        let big = vec![0u8; MAX_PAYLOAD_CHUNK + 1];
        assert!(matches!(
            encode_chunk(&big),
            Err(Error::ChunkTooLarge { .. })
        ));
    }
}

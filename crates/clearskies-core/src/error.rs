//! Error types for ClearSkies.
//!
//! This module provides a unified error type for all ClearSkies operations,
//! with specific error variants for different failure modes.
//!
//! Malformed *input* framing is deliberately not represented here: garbage on
//! the wire is recovered locally and reported through the
//! [`ProtocolHandler`](crate::protocol::ProtocolHandler) callbacks, so the
//! connection keeps going. Variants in this module cover real failures:
//! I/O, encoding, writer-side misuse, share and configuration problems.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::message::CoderError;

/// A specialized `Result` type for ClearSkies operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for ClearSkies.
#[derive(Error, Debug)]
pub enum Error {
    /// Message body could not be encoded or decoded
    #[error(transparent)]
    Coder(#[from] CoderError),

    /// Payload chunk exceeds the protocol limit
    #[error("payload chunk of {size} bytes exceeds the {limit} byte limit")]
    ChunkTooLarge {
        /// Size of the rejected chunk
        size: usize,
        /// Protocol chunk size limit
        limit: usize,
    },

    /// Zero-sized chunks are reserved for the payload terminator
    #[error("payload chunk must not be empty")]
    EmptyChunk,

    /// Peer closed the connection in the middle of a frame or payload
    #[error("connection closed mid-{0}")]
    TruncatedStream(&'static str),

    /// Share root is missing or not a directory
    #[error("share root is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A file record with this path already exists in the share
    #[error("duplicate file record for '{0}'")]
    DuplicateFile(String),

    /// No file record exists for this path
    #[error("no file record for '{0}'")]
    UnknownPath(String),

    /// Configuration file error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Invalid configuration value
    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidConfig {
        /// Configuration key
        key: String,
        /// Reason for invalidity
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

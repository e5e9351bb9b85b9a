//! # ClearSkies Core Library
//!
//! `clearskies-core` provides the core functionality for ClearSkies, a
//! peer-to-peer file synchronization daemon.
//!
//! ## Features
//!
//! - **Incremental wire protocol**: bytes arrive in arbitrary splits and are
//!   framed into typed messages without blocking
//! - **Chunked payloads**: binary payloads stream through in length-prefixed
//!   chunks, never requiring a whole file in memory
//! - **Local garbage recovery**: malformed input costs at most one line of
//!   bytes, the connection keeps going
//! - **Share scanning**: directory trees are indexed and content-hashed for
//!   reconciliation with peers
//!
//! ## Modules
//!
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//! - [`message`] - Typed protocol messages and the body codec
//! - [`protocol`] - Wire framing and the message-dispatch state machine
//! - [`share`] - Share store: file metadata index, scanning and hashing
//!
//! ## Example
//!
//! ```rust,ignore
//! use clearskies_core::protocol::{ProtocolHandler, ProtocolState};
//!
//! struct Peer;
//! impl ProtocolHandler for Peer {
//!     fn on_message(&mut self, msg: clearskies_core::message::Message) {
//!         println!("got {}", msg.kind_name());
//!     }
//! }
//!
//! let mut state = ProtocolState::new(Peer);
//! state.input(b"{\"type\":\"ping\",\"timeout\":60}\n");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod error;
pub mod message;
pub mod protocol;
pub mod share;

pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol revision spoken by this library
pub const PROTOCOL_VERSION: u32 = 1;

/// Software identification sent in handshake messages
pub const SOFTWARE: &str = concat!("clearskies-core ", env!("CARGO_PKG_VERSION"));

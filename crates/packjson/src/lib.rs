//! packjson: a dynamically typed JSON value tree with compact binary encodings.
//!
//! This crate provides a recursive [`Value`] type together with the
//! encodings used to move it between processes and over the wire.
//!
//! # Overview
//!
//! - **Text**: standard JSON, parsed leniently or strictly and rendered
//!   compact or indented
//! - **Packed**: a tagged binary format with an optional 4-byte length frame
//!   for sending over a connection
//! - **DTMI / DTMI2**: the legacy binary formats, decoded in place from a
//!   caller-owned buffer
//! - **Runs**: run-escaped integer sequences for compact length tables
//!
//! # Quick Start
//!
//! ```rust
//! use packjson::Value;
//!
//! let mut stream = Value::new();
//! stream["name"] = "live".into();
//! stream["tracks"].push(1.into());
//! stream["tracks"].push(2.into());
//!
//! // Text
//! let text = stream.to_json_string();
//! assert_eq!(text, r#"{"name":"live","tracks":[1,2]}"#);
//! assert_eq!(Value::from_text(&text), stream);
//!
//! // Binary
//! let bytes = stream.to_packed();
//! assert_eq!(bytes.len(), stream.packed_size());
//! assert_eq!(Value::from_packed(&bytes), stream);
//! ```
//!
//! # Modules
//!
//! - [`model`]: The value tree, accessors, and cursors
//! - [`codec`]: Text, packed, DTMI, and run encodings
//! - [`error`]: Error types for the strict entry points
//! - [`limits`]: Tag bytes and decoding limits
//!
//! # Untrusted input
//!
//! The plain decoders never fail and never read past the end of their input.
//! Truncated or malformed binary data yields the part that decoded cleanly;
//! malformed JSON text yields Null. Nesting depth is bounded by
//! [`DecodeOptions`]. The `try_*` variants report the problem as an error
//! instead.

pub mod codec;
pub mod error;
pub mod limits;
pub mod model;

// Re-export commonly used types at crate root
pub use codec::{BinaryCodec, Dtmi, Dtmi2, NetFrame, Packed};
pub use codec::{decode_vector, decode_vector4, encode_vector, encode_vector4};
pub use error::{DecodeError, ErrorCode, ParseError, ParseErrorKind};
pub use limits::{DecodeOptions, LEGACY_NULL_SENTINEL};
pub use model::{Array, Cursor, CursorKind, CursorMut, Entry, Map, NULL, Value, ValueType};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

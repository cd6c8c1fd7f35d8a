//! Error types for text parsing and binary decoding.
//!
//! The value-producing entry points of this crate never fail. These errors
//! are what the strict `try_*` entry points report instead.

use thiserror::Error;

/// Stable diagnostic codes for tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// P001: Text ended early
    TextTruncated,
    /// P002: Malformed JSON text
    TextMalformed,
    /// P003: Reading JSON text failed
    TextIo,
    /// D001: Binary input ended early
    BinaryTruncated,
    /// D002: Unknown tag or bad framing
    BinaryMalformed,
    /// L001: Nesting limit reached
    DepthLimit,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "P001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::TextTruncated => "P001",
            ErrorCode::TextMalformed => "P002",
            ErrorCode::TextIo => "P003",
            ErrorCode::BinaryTruncated => "D001",
            ErrorCode::BinaryMalformed => "D002",
            ErrorCode::DepthLimit => "L001",
        }
    }
}

/// Error during binary decoding (packed, net frame, DTMI, run codec).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("[D001] unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("[D002] unknown tag 0x{tag:02x} at offset {offset}")]
    InvalidTag { tag: u8, offset: usize },

    #[error("[D002] {remaining} trailing bytes after value")]
    TrailingBytes { remaining: usize },

    #[error("[D002] frame declares {declared} payload bytes but {actual} are present")]
    FrameLengthMismatch { declared: usize, actual: usize },

    #[error("[L001] nesting exceeds maximum depth {max}")]
    DepthLimitExceeded { max: usize },
}

impl DecodeError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            DecodeError::UnexpectedEof { .. } => ErrorCode::BinaryTruncated,
            DecodeError::DepthLimitExceeded { .. } => ErrorCode::DepthLimit,
            _ => ErrorCode::BinaryMalformed,
        }
    }
}

/// What went wrong while parsing JSON text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The text ended inside a value.
    UnexpectedEof,
    /// The text is not valid JSON.
    Syntax,
    /// Something other than whitespace follows the value.
    TrailingCharacters,
    DepthLimitExceeded,
    /// Reading the underlying stream failed.
    Io,
}

/// Error during JSON text parsing.
#[derive(Debug, Error)]
#[error("[{code}] {source}", code = self.code().code())]
pub struct ParseError {
    kind: ParseErrorKind,
    #[source]
    source: serde_json::Error,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, source: serde_json::Error) -> Self {
        Self { kind, source }
    }

    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    /// One-based line of the failure.
    pub fn line(&self) -> usize {
        self.source.line()
    }

    /// One-based column of the failure.
    pub fn column(&self) -> usize {
        self.source.column()
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self.kind {
            ParseErrorKind::UnexpectedEof => ErrorCode::TextTruncated,
            ParseErrorKind::DepthLimitExceeded => ErrorCode::DepthLimit,
            ParseErrorKind::Io => ErrorCode::TextIo,
            ParseErrorKind::Syntax | ParseErrorKind::TrailingCharacters => ErrorCode::TextMalformed,
        }
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(source: serde_json::Error) -> Self {
        let kind = match source.classify() {
            serde_json::error::Category::Eof => ParseErrorKind::UnexpectedEof,
            serde_json::error::Category::Io => ParseErrorKind::Io,
            serde_json::error::Category::Syntax | serde_json::error::Category::Data => {
                ParseErrorKind::Syntax
            }
        };
        Self::new(kind, source)
    }
}

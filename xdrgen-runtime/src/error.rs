//! Error types

use std::fmt;

/// Errors recorded by an [`XdrState`] while transferring data.
///
/// Only the first error is kept; once one is recorded every further transfer
/// on the same state becomes a no-op.
///
/// [`XdrState`]: crate::XdrState
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Error {
    /// The input ended before a complete item could be decoded.
    UnexpectedEof,
    /// A boolean was encoded as something other than 0 or 1.
    InvalidBool(u32),
    /// A string was not valid UTF-8.
    InvalidString,
    /// A variable-length item exceeded its declared maximum length.
    LengthOverflow { max: u32, got: usize },
    /// A union discriminant matched no arm, and the union has no default arm.
    UnmatchedDiscriminant(&'static str),
    /// Bytes were left over after decoding a complete value.
    TrailingBytes(usize),
    /// Optional values were nested deeper than [`MAX_DEPTH`].
    ///
    /// [`MAX_DEPTH`]: crate::MAX_DEPTH
    DepthExceeded,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnexpectedEof => write!(f, "end of data reached unexpectedly"),
            Error::InvalidBool(value) => {
                write!(f, "invalid boolean encoding: {value} (must be 0 or 1)")
            }
            Error::InvalidString => write!(f, "string is not valid UTF-8"),
            Error::LengthOverflow { max, got } => {
                write!(f, "length {got} exceeds maximum {max}")
            }
            Error::UnmatchedDiscriminant(union) => {
                write!(f, "discriminant of union `{union}` matches no arm")
            }
            Error::TrailingBytes(count) => write!(f, "{count} trailing bytes after value"),
            Error::DepthExceeded => {
                write!(f, "optional values nested deeper than {}", crate::MAX_DEPTH)
            }
        }
    }
}

impl std::error::Error for Error {}

//! Error types associated with decoding DER structures.

use snafu::Snafu;

use crate::types::Tag;

/// An error from reading a DER element or parsing an X.509 structure.
///
/// Readers never consume input past a failure; the caller's enclosing
/// parse observes the error and decides how to report it (usually as an
/// [`ErrorId`][crate::error::ErrorId] entry in an error set).
#[derive(Snafu, Debug, Clone, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum DecodeError {
    /// The input ended inside a tag, length, or value.
    #[snafu(display("Input truncated inside a DER element"))]
    Truncated,
    /// The indefinite length form is valid BER but never valid DER.
    #[snafu(display("Indefinite lengths are not permitted in DER"))]
    IndefiniteLengthNotAllowed,
    /// A length (or tag number) used more octets than required.
    #[snafu(display("Length is not minimally encoded"))]
    NonMinimalLength,
    /// An element had a different identifier than the structure requires.
    #[snafu(display("Expected {expected} tag, actual tag: {actual}"))]
    MismatchedTag {
        /// The tag the structure calls for.
        expected: Tag,
        /// The tag that was read.
        actual: Tag,
    },
    /// Data remained after the element a structure is defined to end with.
    #[snafu(display("Unexpected trailing data ({length} bytes)"))]
    TrailingData {
        /// How many unconsumed bytes remained.
        length: usize,
    },
    /// A BOOLEAN content was not exactly one 0x00 or 0xFF octet.
    #[snafu(display("BOOLEAN content must be a single 0x00 or 0xFF octet"))]
    InvalidBool,
    /// An INTEGER content was empty or not minimally encoded.
    #[snafu(display("INTEGER content is empty or not minimally encoded"))]
    InvalidInteger,
    /// A bounded INTEGER did not fit the requested width.
    #[snafu(display("INTEGER is larger than {max_width} bits"))]
    IntegerOverflow {
        /// The maximum accepted width in bits.
        max_width: u32,
    },
    /// A BIT STRING had an out-of-range unused-bit count or nonzero
    /// masked bits.
    #[snafu(display("Invalid BIT STRING (unused bit count {unused_bits})"))]
    InvalidBitString {
        /// The declared unused-bit count.
        unused_bits: u8,
    },
    /// A UTCTime or GeneralizedTime did not name a real Zulu timestamp.
    #[snafu(display("Invalid UTCTime or GeneralizedTime"))]
    InvalidTime,
    /// An X.509 structure rule was violated.
    #[snafu(display("{what}"))]
    Malformed {
        /// The rule that failed.
        what: &'static str,
    },
}

impl DecodeError {
    /// Shorthand for a [`DecodeError::Malformed`] value.
    pub(crate) fn malformed(what: &'static str) -> Self {
        Self::Malformed { what }
    }
}

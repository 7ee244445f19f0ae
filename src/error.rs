//! # Error Types
//!
//! Two layers of failure reporting. [`DecodeError`] is the recoverable
//! result of structural DER and X.509 parsing; every subparser returns it
//! through `Result`. [`ErrorSet`] and [`PathErrors`] accumulate
//! certificate diagnostics keyed by stable [`ErrorId`] identities with a
//! [`Severity`], which is how the certificate factory and the path
//! verifier report everything they find without stopping at the first
//! problem.

mod cert;
mod decode;

pub use self::{
    cert::{CertError, ErrorId, ErrorSet, PathErrors, Severity},
    decode::DecodeError,
};

pub(crate) use self::decode::{
    IndefiniteLengthNotAllowedSnafu, IntegerOverflowSnafu, InvalidBitStringSnafu,
    InvalidBoolSnafu, InvalidIntegerSnafu, InvalidTimeSnafu, MismatchedTagSnafu,
    NonMinimalLengthSnafu, TrailingDataSnafu, TruncatedSnafu,
};

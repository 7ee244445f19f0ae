//! # Value Types
//!
//! Value types shared between the DER reader, the certificate parsers and
//! the path verifier: tags, bit strings, times, and the object identifier
//! constants the X.509 profile bakes in.

mod bits;
mod tag;

pub mod oid;
pub mod time;

pub use self::{
    bits::BitString,
    tag::{Class, Tag},
    time::GeneralizedTime,
};

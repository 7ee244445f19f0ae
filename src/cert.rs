//! # Certificates
//!
//! Parsers for `Certificate`, `TBSCertificate` and every extension the
//! path verifier consults, plus [`ParsedCertificate`]: an eagerly
//! pre-parsed, immutable view bundle over one certificate's DER bytes.

mod algorithm;
mod parse;
mod parsed;

pub mod extensions;

pub use self::{
    algorithm::{SignatureAlgorithm, parse_signature_algorithm},
    parse::{
        ParseOptions, ParsedTbsCertificate, Version, parse_certificate, parse_tbs_certificate,
        parse_validity, verify_serial_number,
    },
    parsed::ParsedCertificate,
};

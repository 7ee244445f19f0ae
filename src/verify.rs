//! # Path Verification
//!
//! The RFC 5280 section 6.1 certification-path state machine, extended
//! with trust-anchor constraint enforcement (RFC 5937), the de-facto
//! treatment of extended key usage as an issuer constraint, and the
//! single-certificate and trusted-leaf cases.

mod delegate;
mod path;
mod policies;
mod trust;

pub use self::{
    delegate::{CacheResult, Delegate, SignatureVerifyCache},
    path::{KeyPurpose, verify_certificate_chain, verify_certificate_is_self_signed},
    trust::{CertificateTrust, TrustType},
};

#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod cert;
pub mod der;
pub mod error;
pub mod name;
pub mod types;
pub mod verify;

#[cfg(test)]
pub(crate) mod testutil;

#[doc(inline)]
pub use self::{
    cert::{ParseOptions, ParsedCertificate},
    error::{ErrorId, ErrorSet, PathErrors, Severity},
    verify::{CertificateTrust, Delegate, KeyPurpose, verify_certificate_chain},
};

/// A prelude containing the types most callers need to parse certificates
/// and verify a chain.
pub mod prelude {
    pub use crate::{
        cert::{ParseOptions, ParsedCertificate},
        error::{ErrorId, ErrorSet, PathErrors, Severity},
        types::GeneralizedTime,
        verify::{
            CertificateTrust, Delegate, KeyPurpose, verify_certificate_chain,
            verify_certificate_is_self_signed,
        },
    };
}

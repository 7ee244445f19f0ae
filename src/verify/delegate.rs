//! The capability object through which the verifier reaches
//! cryptography.
//!
//! The core never interprets keys or signatures itself; everything
//! cryptographic crosses this seam. A delegate may also supply a
//! [`SignatureVerifyCache`] so repeated verifications of identical
//! inputs (common when the same chain is evaluated against several
//! paths) are answered from memory.

use alloc::vec::Vec;

use crate::error::ErrorSet;
use crate::types::BitString;

/// The outcome of a [`SignatureVerifyCache`] lookup.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CacheResult {
    /// The signature previously verified.
    Valid,
    /// The signature previously failed.
    Invalid,
    /// Nothing cached for this key.
    Unknown,
}

/// A cache of signature-verification outcomes, keyed by an opaque byte
/// key derived from the verification inputs. Thread safety is the
/// implementer's concern.
pub trait SignatureVerifyCache {
    /// Records an outcome.
    fn store(&self, key: &[u8], valid: bool);
    /// Looks up a previous outcome.
    fn check(&self, key: &[u8]) -> CacheResult;
}

/// The verifier's window onto policy and cryptography.
pub trait Delegate {
    /// Whether the given signature AlgorithmIdentifier TLV is acceptable
    /// for signatures in this chain. Rejections may append diagnostics.
    fn is_signature_algorithm_acceptable(
        &self,
        signature_algorithm_tlv: &[u8],
        errors: &mut ErrorSet,
    ) -> bool;

    /// Whether the given SubjectPublicKeyInfo is acceptable (e.g. key
    /// size policy). Rejections may append diagnostics.
    fn is_public_key_acceptable(&self, spki_tlv: &[u8], errors: &mut ErrorSet) -> bool;

    /// Verifies `signature` over `signed_data` with the key in
    /// `spki_tlv` under the given algorithm.
    fn verify_signed_data(
        &self,
        signature_algorithm_tlv: &[u8],
        signed_data: &[u8],
        signature: &BitString,
        spki_tlv: &[u8],
    ) -> bool;

    /// Whether certificates carrying the Certificate Transparency
    /// poison extension are accepted.
    fn accept_pre_certificates(&self) -> bool {
        false
    }

    /// An optional signature-verification cache.
    fn verify_cache(&self) -> Option<&dyn SignatureVerifyCache> {
        None
    }
}

/// Length-prefixed concatenation of the verification inputs, so no two
/// distinct input tuples share a cache key.
fn cache_key(
    signature_algorithm_tlv: &[u8],
    signed_data: &[u8],
    signature: &BitString,
    spki_tlv: &[u8],
) -> Vec<u8> {
    let parts: [&[u8]; 4] = [
        signature_algorithm_tlv,
        signed_data,
        signature.bytes(),
        spki_tlv,
    ];
    let mut key = Vec::with_capacity(parts.iter().map(|part| part.len() + 8).sum::<usize>() + 1);
    for part in parts {
        key.extend_from_slice(&(part.len() as u64).to_be_bytes());
        key.extend_from_slice(part);
    }
    key.push(signature.unused_bits());
    key
}

/// Verifies signed data through the delegate, consulting its cache
/// when one is offered.
pub(crate) fn verify_signed_data_cached(
    delegate: &dyn Delegate,
    signature_algorithm_tlv: &[u8],
    signed_data: &[u8],
    signature: &BitString,
    spki_tlv: &[u8],
) -> bool {
    let Some(cache) = delegate.verify_cache() else {
        return delegate.verify_signed_data(
            signature_algorithm_tlv,
            signed_data,
            signature,
            spki_tlv,
        );
    };

    let key = cache_key(signature_algorithm_tlv, signed_data, signature, spki_tlv);
    match cache.check(&key) {
        CacheResult::Valid => true,
        CacheResult::Invalid => false,
        CacheResult::Unknown => {
            let valid = delegate.verify_signed_data(
                signature_algorithm_tlv,
                signed_data,
                signature,
                spki_tlv,
            );
            cache.store(&key, valid);
            valid
        }
    }
}

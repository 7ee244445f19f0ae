//! Logical identity of signature algorithms.
//!
//! The verifier never evaluates signatures itself, but it must decide
//! whether the outer `Certificate.signatureAlgorithm` and the inner
//! `TBSCertificate.signature` are the same algorithm when their DER
//! encodings differ. This module parses an `AlgorithmIdentifier` far
//! enough to answer that question: OID plus the parameter conventions of
//! RFC 3279/4055 (an explicit NULL for the RSA PKCS#1 family, absent
//! parameters for ECDSA).

use crate::der::Reader;
use crate::error::DecodeError;
use crate::types::{Tag, oid};

/// A recognized signature algorithm, independent of its encoding.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[allow(missing_docs)]
pub enum SignatureAlgorithm {
    RsaPkcs1Sha1,
    RsaPkcs1Sha256,
    RsaPkcs1Sha384,
    RsaPkcs1Sha512,
    EcdsaSha1,
    EcdsaSha256,
    EcdsaSha384,
    EcdsaSha512,
}

/// Parses an `AlgorithmIdentifier` TLV into its logical algorithm.
///
/// Unknown OIDs and malformed parameters fail; two TLVs that parse to
/// the same variant are alternate encodings of one algorithm.
pub fn parse_signature_algorithm(
    algorithm_tlv: &[u8],
) -> Result<SignatureAlgorithm, DecodeError> {
    let mut reader = Reader::new(algorithm_tlv);
    let mut sequence = reader.read_sequence()?;
    reader.expect_empty()?;

    let algorithm_oid = sequence.read_oid()?;

    let algorithm = match algorithm_oid {
        oid::SHA1_WITH_RSA_ENCRYPTION | oid::SHA1_WITH_RSA_SIGNATURE_OIW => {
            SignatureAlgorithm::RsaPkcs1Sha1
        }
        oid::SHA256_WITH_RSA_ENCRYPTION => SignatureAlgorithm::RsaPkcs1Sha256,
        oid::SHA384_WITH_RSA_ENCRYPTION => SignatureAlgorithm::RsaPkcs1Sha384,
        oid::SHA512_WITH_RSA_ENCRYPTION => SignatureAlgorithm::RsaPkcs1Sha512,
        oid::ECDSA_WITH_SHA1 => SignatureAlgorithm::EcdsaSha1,
        oid::ECDSA_WITH_SHA256 => SignatureAlgorithm::EcdsaSha256,
        oid::ECDSA_WITH_SHA384 => SignatureAlgorithm::EcdsaSha384,
        oid::ECDSA_WITH_SHA512 => SignatureAlgorithm::EcdsaSha512,
        _ => return Err(DecodeError::malformed("Unknown signature algorithm")),
    };

    match algorithm {
        SignatureAlgorithm::RsaPkcs1Sha1
        | SignatureAlgorithm::RsaPkcs1Sha256
        | SignatureAlgorithm::RsaPkcs1Sha384
        | SignatureAlgorithm::RsaPkcs1Sha512 => {
            // RFC 4055: parameters are an explicit NULL, but encoders
            // that omit them entirely exist; both forms are accepted and
            // the difference is what makes two encodings of the same
            // algorithm possible.
            if sequence.has_more() {
                let null = sequence.read_tag(Tag::NULL)?;
                if !null.is_empty() {
                    return Err(DecodeError::malformed("NULL must be empty"));
                }
            }
        }
        SignatureAlgorithm::EcdsaSha1
        | SignatureAlgorithm::EcdsaSha256
        | SignatureAlgorithm::EcdsaSha384
        | SignatureAlgorithm::EcdsaSha512 => {
            // RFC 5758: parameters must be omitted.
        }
    }
    sequence.expect_empty()?;

    Ok(algorithm)
}

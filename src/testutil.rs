//! Test-only helpers for synthesizing DER certificates.
//!
//! The verifier treats signatures as opaque (the delegate decides
//! whether they verify), so chains built here carry placeholder
//! signature bits and still exercise every part of path validation.

use alloc::{string::String, vec::Vec};

use crate::name::normalize::push_tlv;
use crate::types::oid;

/// Encodes one TLV with a single-octet tag.
pub(crate) fn tlv(tag: u8, contents: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    push_tlv(&mut out, tag, contents);
    out
}

/// A Name TLV with a single common-name attribute.
pub(crate) fn name_tlv(common_name: &str) -> Vec<u8> {
    let mut atv = tlv(0x06, &[0x55, 0x04, 0x03]);
    atv.extend_from_slice(&tlv(0x13, common_name.as_bytes()));
    tlv(0x30, &tlv(0x31, &tlv(0x30, &atv)))
}

/// An AlgorithmIdentifier for sha256WithRSAEncryption with NULL params.
pub(crate) fn algorithm_sha256_rsa() -> Vec<u8> {
    let mut contents = tlv(0x06, oid::SHA256_WITH_RSA_ENCRYPTION);
    contents.extend_from_slice(&[0x05, 0x00]);
    tlv(0x30, &contents)
}

/// A structurally valid SubjectPublicKeyInfo whose key bits are `seed`,
/// so distinct seeds give distinct "keys".
pub(crate) fn spki(seed: &[u8]) -> Vec<u8> {
    let mut algorithm = tlv(0x06, &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01]);
    algorithm.extend_from_slice(&[0x05, 0x00]);
    let mut bits = alloc::vec![0x00];
    bits.extend_from_slice(seed);
    let mut contents = tlv(0x30, &algorithm);
    contents.extend_from_slice(&tlv(0x03, &bits));
    tlv(0x30, &contents)
}

/// Builds certificates field by field. Defaults: v3, serial 1, valid
/// 2023-2033, subject key bits derived from the subject name, no
/// extensions.
pub(crate) struct CertBuilder {
    subject: String,
    issuer: String,
    serial: Vec<u8>,
    not_before: Vec<u8>,
    not_after: Vec<u8>,
    spki_seed: Vec<u8>,
    extensions: Vec<Vec<u8>>,
}

impl CertBuilder {
    pub(crate) fn new(subject: &str, issuer: &str) -> Self {
        Self {
            subject: String::from(subject),
            issuer: String::from(issuer),
            serial: alloc::vec![0x01],
            not_before: b"230101000000Z".to_vec(),
            not_after: b"330101000000Z".to_vec(),
            spki_seed: subject.as_bytes().to_vec(),
            extensions: Vec::new(),
        }
    }

    pub(crate) fn validity(mut self, not_before: &[u8], not_after: &[u8]) -> Self {
        self.not_before = not_before.to_vec();
        self.not_after = not_after.to_vec();
        self
    }

    pub(crate) fn extension(mut self, extension_oid: &[u8], critical: bool, value: &[u8]) -> Self {
        let mut contents = tlv(0x06, extension_oid);
        if critical {
            contents.extend_from_slice(&tlv(0x01, &[0xff]));
        }
        contents.extend_from_slice(&tlv(0x04, value));
        self.extensions.push(tlv(0x30, &contents));
        self
    }

    /// A basicConstraints extension; `path_len` of `None` omits the
    /// field.
    pub(crate) fn basic_constraints(self, is_ca: bool, path_len: Option<u8>) -> Self {
        let mut contents = Vec::new();
        if is_ca {
            contents.extend_from_slice(&tlv(0x01, &[0xff]));
        }
        if let Some(path_len) = path_len {
            contents.extend_from_slice(&tlv(0x02, &[path_len]));
        }
        let value = tlv(0x30, &contents);
        self.extension(oid::BASIC_CONSTRAINTS, true, &value)
    }

    /// A keyUsage extension from raw BIT STRING content.
    pub(crate) fn key_usage(self, bits: &[u8]) -> Self {
        let value = tlv(0x03, bits);
        self.extension(oid::KEY_USAGE, true, &value)
    }

    /// An extendedKeyUsage extension from purpose OIDs.
    pub(crate) fn eku(self, purposes: &[&[u8]]) -> Self {
        let contents: Vec<u8> = purposes
            .iter()
            .flat_map(|purpose| tlv(0x06, purpose))
            .collect();
        let value = tlv(0x30, &contents);
        self.extension(oid::EXT_KEY_USAGE, false, &value)
    }

    /// A subjectAltName extension with the given dNSNames.
    pub(crate) fn san_dns(self, names: &[&str]) -> Self {
        let contents: Vec<u8> = names
            .iter()
            .flat_map(|name| tlv(0x82, name.as_bytes()))
            .collect();
        let value = tlv(0x30, &contents);
        self.extension(oid::SUBJECT_ALT_NAME, false, &value)
    }

    /// A certificatePolicies extension with the given policy OIDs.
    pub(crate) fn policies(self, policy_oids: &[&[u8]]) -> Self {
        let contents: Vec<u8> = policy_oids
            .iter()
            .flat_map(|policy| tlv(0x30, &tlv(0x06, policy)))
            .collect();
        let value = tlv(0x30, &contents);
        self.extension(oid::CERTIFICATE_POLICIES, false, &value)
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let mut tbs_contents = tlv(0xa0, &tlv(0x02, &[0x02]));
        tbs_contents.extend_from_slice(&tlv(0x02, &self.serial));
        tbs_contents.extend_from_slice(&algorithm_sha256_rsa());
        tbs_contents.extend_from_slice(&name_tlv(&self.issuer));
        let mut validity = tlv(0x17, &self.not_before);
        validity.extend_from_slice(&tlv(0x17, &self.not_after));
        tbs_contents.extend_from_slice(&tlv(0x30, &validity));
        tbs_contents.extend_from_slice(&name_tlv(&self.subject));
        tbs_contents.extend_from_slice(&spki(&self.spki_seed));
        if !self.extensions.is_empty() {
            let extensions: Vec<u8> = self.extensions.concat();
            tbs_contents.extend_from_slice(&tlv(0xa3, &tlv(0x30, &extensions)));
        }

        let mut certificate = tlv(0x30, &tbs_contents);
        certificate.extend_from_slice(&algorithm_sha256_rsa());
        certificate.extend_from_slice(&tlv(0x03, &[0x00, 0x5a, 0xa5]));
        tlv(0x30, &certificate)
    }
}

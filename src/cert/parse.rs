//! `Certificate` and `TBSCertificate` parsing (RFC 5280 section 4.1).

use alloc::format;

use crate::der::Reader;
use crate::der::reader::decode_bit_string;
use crate::error::{DecodeError, ErrorId, ErrorSet, Severity};
use crate::types::{BitString, GeneralizedTime, Tag, time};

type Result<T> = core::result::Result<T, DecodeError>;

/// The version of an encoded certificate. DER requires the DEFAULT v1 to
/// be omitted, so an explicitly encoded v1 fails parsing.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Version {
    /// An RFC 5280 v1 certificate (version field omitted).
    V1,
    /// An RFC 5280 v2 certificate.
    V2,
    /// An RFC 5280 v3 certificate.
    V3,
}

/// The fields of a `TBSCertificate`, each borrowed from the input TLV.
#[derive(Clone, Debug)]
pub struct ParsedTbsCertificate<'a> {
    /// The certificate version.
    pub version: Version,
    /// The serialNumber INTEGER contents, unvalidated beyond the checks
    /// of [`verify_serial_number`].
    pub serial_number: &'a [u8],
    /// The inner signature AlgorithmIdentifier TLV, retained for the
    /// cross-check against the outer `Certificate.signatureAlgorithm`.
    pub signature_algorithm_tlv: &'a [u8],
    /// The issuer Name TLV.
    pub issuer_tlv: &'a [u8],
    /// notBefore, normalized.
    pub validity_not_before: GeneralizedTime,
    /// notAfter, normalized.
    pub validity_not_after: GeneralizedTime,
    /// The subject Name TLV.
    pub subject_tlv: &'a [u8],
    /// The SubjectPublicKeyInfo TLV, not interpreted further here.
    pub spki_tlv: &'a [u8],
    /// issuerUniqueID, if present (requires v2 or v3).
    pub issuer_unique_id: Option<BitString>,
    /// subjectUniqueID, if present (requires v2 or v3).
    pub subject_unique_id: Option<BitString>,
    /// The extensions SEQUENCE TLV, if present (requires v3).
    pub extensions_tlv: Option<&'a [u8]>,
}

/// Reads the next TLV and checks that it is a SEQUENCE, returning the
/// whole TLV for re-embedding.
fn read_sequence_tlv<'a>(reader: &mut Reader<'a>) -> Result<&'a [u8]> {
    let raw = reader.read_raw_tlv()?;
    let mut check = Reader::new(raw);
    check.read_tag(Tag::SEQUENCE)?;
    check.expect_empty()?;
    Ok(raw)
}

/// Parses the outermost `Certificate` SEQUENCE into its three elements.
///
/// ```text
/// Certificate ::= SEQUENCE {
///      tbsCertificate       TBSCertificate,
///      signatureAlgorithm   AlgorithmIdentifier,
///      signatureValue       BIT STRING }
/// ```
pub fn parse_certificate(certificate: &[u8]) -> Result<(&[u8], &[u8], BitString)> {
    let mut reader = Reader::new(certificate);
    let mut certificate_reader = reader.read_sequence()?;

    let tbs_certificate_tlv = read_sequence_tlv(&mut certificate_reader)?;
    let signature_algorithm_tlv = read_sequence_tlv(&mut certificate_reader)?;
    let signature_value = certificate_reader.read_bit_string()?;

    // There is no extension point at the end of Certificate, and the
    // input must be a single Certificate.
    certificate_reader.expect_empty()?;
    reader.expect_empty()?;

    Ok((tbs_certificate_tlv, signature_algorithm_tlv, signature_value))
}

/// Version ::= INTEGER { v1(0), v2(1), v3(2) }
fn parse_version(value: &[u8]) -> Result<Version> {
    let mut reader = Reader::new(value);
    let version = reader.read_u64()?;
    reader.expect_empty()?;
    match version {
        0 => Ok(Version::V1),
        1 => Ok(Version::V2),
        2 => Ok(Version::V3),
        _ => Err(DecodeError::malformed("Version is not v1, v2 or v3")),
    }
}

/// Validates a serialNumber INTEGER content per RFC 5280 section
/// 4.1.2.2. Negative and zero serials are always recorded as warnings;
/// a non-minimal encoding or a length over 20 octets is recorded with
/// high severity (warning severity when `warnings_only`) and makes the
/// check fail.
pub fn verify_serial_number(value: &[u8], warnings_only: bool, errors: &mut ErrorSet) -> bool {
    let severity = if warnings_only {
        Severity::Warning
    } else {
        Severity::High
    };

    let negative = match crate::der::reader::is_valid_integer(value) {
        Ok(negative) => negative,
        Err(_) => {
            errors.add(severity, ErrorId::SerialNumberNotValidInteger, None);
            return false;
        }
    };

    if negative {
        errors.add_warning(ErrorId::SerialNumberIsNegative);
    }
    if value == [0x00] {
        errors.add_warning(ErrorId::SerialNumberIsZero);
    }

    if value.len() > 20 {
        errors.add(
            severity,
            ErrorId::SerialNumberLengthOver20,
            Some(format!("length: {}", value.len())),
        );
        return false;
    }

    true
}

/// Reads a `Time` CHOICE: UTCTime or GeneralizedTime, any other tag
/// fails.
fn read_utc_or_generalized_time(reader: &mut Reader<'_>) -> Result<GeneralizedTime> {
    let (tag, value) = reader.read_tlv()?;
    match tag {
        Tag::UTC_TIME => time::parse_utc_time(value),
        Tag::GENERALIZED_TIME => time::parse_generalized_time(value),
        _ => Err(DecodeError::malformed(
            "Time must be UTCTime or GeneralizedTime",
        )),
    }
}

/// Parses a `Validity` TLV into its two times.
///
/// notBefore > notAfter is not a parse error; it simply yields a
/// certificate that is valid at no time.
pub fn parse_validity(validity_tlv: &[u8]) -> Result<(GeneralizedTime, GeneralizedTime)> {
    let mut reader = Reader::new(validity_tlv);
    let mut validity_reader = reader.read_sequence()?;
    let not_before = read_utc_or_generalized_time(&mut validity_reader)?;
    let not_after = read_utc_or_generalized_time(&mut validity_reader)?;
    // The Validity type has no extension point.
    validity_reader.expect_empty()?;
    reader.expect_empty()?;
    Ok((not_before, not_after))
}

/// Parsing knobs for [`parse_tbs_certificate`] and
/// [`ParsedCertificate::create`][crate::cert::ParsedCertificate::create].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ParseOptions {
    /// Downgrades oversized and malformed serial numbers from fatal
    /// errors to warnings, for compatibility with certificates in the
    /// wild.
    pub allow_invalid_serial_numbers: bool,
}

/// Parses a `TBSCertificate` TLV.
///
/// ```text
/// TBSCertificate ::= SEQUENCE {
///      version         [0]  EXPLICIT Version DEFAULT v1,
///      serialNumber         CertificateSerialNumber,
///      signature            AlgorithmIdentifier,
///      issuer               Name,
///      validity             Validity,
///      subject              Name,
///      subjectPublicKeyInfo SubjectPublicKeyInfo,
///      issuerUniqueID  [1]  IMPLICIT UniqueIdentifier OPTIONAL,
///      subjectUniqueID [2]  IMPLICIT UniqueIdentifier OPTIONAL,
///      extensions      [3]  EXPLICIT Extensions OPTIONAL }
/// ```
///
/// Serial-number diagnostics accumulate into `errors` even on success.
pub fn parse_tbs_certificate<'a>(
    tbs_tlv: &'a [u8],
    options: &ParseOptions,
    errors: &mut ErrorSet,
) -> Result<ParsedTbsCertificate<'a>> {
    let mut reader = Reader::new(tbs_tlv);
    let mut tbs = reader.read_sequence()?;

    let version = match tbs.read_optional(Tag::context_constructed(0))? {
        Some(value) => {
            let version = parse_version(value)?;
            if version == Version::V1 {
                // v1 is the DEFAULT and must be omitted in DER.
                return Err(DecodeError::malformed(
                    "Version must be omitted when it is v1",
                ));
            }
            version
        }
        None => Version::V1,
    };

    let serial_number = tbs.read_tag(Tag::INTEGER)?;
    if !verify_serial_number(serial_number, options.allow_invalid_serial_numbers, errors)
        && !options.allow_invalid_serial_numbers
    {
        return Err(DecodeError::malformed("Invalid serial number"));
    }

    let signature_algorithm_tlv = read_sequence_tlv(&mut tbs)?;
    let issuer_tlv = read_sequence_tlv(&mut tbs)?;

    let validity_tlv = tbs.read_raw_tlv()?;
    let (validity_not_before, validity_not_after) = parse_validity(validity_tlv)?;

    let subject_tlv = read_sequence_tlv(&mut tbs)?;
    let spki_tlv = read_sequence_tlv(&mut tbs)?;

    let issuer_unique_id = match tbs.read_optional(Tag::context(1))? {
        Some(value) => Some(decode_bit_string(value)?),
        None => None,
    };
    let subject_unique_id = match tbs.read_optional(Tag::context(2))? {
        Some(value) => Some(decode_bit_string(value)?),
        None => None,
    };
    if (issuer_unique_id.is_some() || subject_unique_id.is_some()) && version == Version::V1 {
        return Err(DecodeError::malformed(
            "UniqueIdentifiers require a v2 or v3 certificate",
        ));
    }

    let extensions_tlv = match tbs.read_optional(Tag::context_constructed(3))? {
        Some(value) => {
            // The [3] wrapper must contain exactly one Extensions
            // SEQUENCE, and only v3 certificates carry it.
            let mut check = Reader::new(value);
            check.read_tag(Tag::SEQUENCE)?;
            check.expect_empty()?;
            if version != Version::V3 {
                return Err(DecodeError::malformed(
                    "Extensions require a v3 certificate",
                ));
            }
            Some(value)
        }
        None => None,
    };

    // Only v1 through v3 are parsed, and none of those versions may
    // carry data past the extensions, so reject any remainder.
    tbs.expect_empty()?;
    reader.expect_empty()?;

    Ok(ParsedTbsCertificate {
        version,
        serial_number,
        signature_algorithm_tlv,
        issuer_tlv,
        validity_not_before,
        validity_not_after,
        subject_tlv,
        spki_tlv,
        issuer_unique_id,
        subject_unique_id,
        extensions_tlv,
    })
}

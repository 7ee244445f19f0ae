//! Parsers for the certificate extensions the path verifier consults
//! (RFC 5280 section 4.2).
//!
//! Each parser operates on the extension's OCTET STRING contents (not
//! the outer OCTET STRING TLV) and returns views borrowing from it.

use alloc::{collections::BTreeMap, vec::Vec};

use crate::der::Reader;
use crate::der::reader::{decode_unsigned, is_valid_integer};
use crate::error::DecodeError;
use crate::name::GeneralNames;
use crate::types::{BitString, Tag, oid};

type Result<T> = core::result::Result<T, DecodeError>;

/// KeyUsage bit numbers, per RFC 5280 section 4.2.1.3.
#[allow(missing_docs)]
pub mod key_usage_bits {
    pub const DIGITAL_SIGNATURE: usize = 0;
    pub const NON_REPUDIATION: usize = 1;
    pub const KEY_ENCIPHERMENT: usize = 2;
    pub const DATA_ENCIPHERMENT: usize = 3;
    pub const KEY_AGREEMENT: usize = 4;
    pub const KEY_CERT_SIGN: usize = 5;
    pub const CRL_SIGN: usize = 6;
    pub const ENCIPHER_ONLY: usize = 7;
    pub const DECIPHER_ONLY: usize = 8;
}

/// One raw certificate extension.
///
/// ```text
/// Extension ::= SEQUENCE {
///      extnID      OBJECT IDENTIFIER,
///      critical    BOOLEAN DEFAULT FALSE,
///      extnValue   OCTET STRING }
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Extension<'a> {
    /// The extnID contents.
    pub oid: &'a [u8],
    /// Whether the extension is critical.
    pub critical: bool,
    /// The extnValue contents (the inner DER, not the OCTET STRING TLV).
    pub value: &'a [u8],
}

/// Parses a single Extension TLV. An explicitly encoded `critical =
/// FALSE` is rejected: DER requires DEFAULT values to be omitted.
pub fn parse_extension(extension_tlv: &[u8]) -> Result<Extension<'_>> {
    let mut reader = Reader::new(extension_tlv);
    let mut extension = reader.read_sequence()?;
    reader.expect_empty()?;

    let extension_oid = extension.read_oid()?;

    let critical = match extension.read_optional_bool()? {
        Some(true) => true,
        Some(false) => {
            return Err(DecodeError::malformed(
                "Extension critical DEFAULT FALSE must be omitted",
            ));
        }
        None => false,
    };

    let value = extension.read_octet_string()?;
    extension.expect_empty()?;

    Ok(Extension {
        oid: extension_oid,
        critical,
        value,
    })
}

/// Parses an `Extensions ::= SEQUENCE SIZE (1..MAX) OF Extension` TLV
/// into a map keyed by extension OID. Duplicate OIDs fail.
pub fn parse_extensions(extensions_tlv: &[u8]) -> Result<BTreeMap<&[u8], Extension<'_>>> {
    let mut reader = Reader::new(extensions_tlv);
    let mut extensions_reader = reader.read_sequence()?;
    reader.expect_empty()?;

    // An empty Extensions sequence should have been omitted entirely.
    if !extensions_reader.has_more() {
        return Err(DecodeError::malformed("Extensions must not be empty"));
    }

    let mut extensions = BTreeMap::new();
    while extensions_reader.has_more() {
        let extension = parse_extension(extensions_reader.read_raw_tlv()?)?;
        if extensions.insert(extension.oid, extension).is_some() {
            return Err(DecodeError::malformed(
                "Extensions contains a duplicate OID",
            ));
        }
    }
    Ok(extensions)
}

/// A parsed basicConstraints extension.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct BasicConstraints {
    /// The cA flag.
    pub is_ca: bool,
    /// The pathLenConstraint, when present.
    pub path_len: Option<u8>,
}

/// BasicConstraints ::= SEQUENCE { cA BOOLEAN DEFAULT FALSE,
/// pathLenConstraint INTEGER (0..MAX) OPTIONAL }
///
/// An explicitly encoded `cA = FALSE` is tolerated (unlike Extension's
/// critical flag) because such encodings are common in the wild. A
/// pathLenConstraint without `cA = TRUE` parses but has no effect on a
/// non-CA. Path lengths above 255 fail.
pub fn parse_basic_constraints(value: &[u8]) -> Result<BasicConstraints> {
    let mut reader = Reader::new(value);
    let mut sequence = reader.read_sequence()?;
    reader.expect_empty()?;

    let is_ca = sequence.read_optional_bool()?.unwrap_or(false);
    let path_len = match sequence.read_optional(Tag::INTEGER)? {
        Some(contents) => {
            is_valid_integer(contents)?;
            Some(decode_unsigned(contents, 8)? as u8)
        }
        None => None,
    };
    sequence.expect_empty()?;

    Ok(BasicConstraints { is_ca, path_len })
}

/// KeyUsage ::= BIT STRING. At least one bit must be set.
pub fn parse_key_usage(value: &[u8]) -> Result<BitString> {
    let mut reader = Reader::new(value);
    let key_usage = reader.read_bit_string()?;
    reader.expect_empty()?;
    if key_usage.is_all_zeros() {
        return Err(DecodeError::malformed(
            "KeyUsage must assert at least one bit",
        ));
    }
    Ok(key_usage)
}

/// ExtKeyUsageSyntax ::= SEQUENCE SIZE (1..MAX) OF KeyPurposeId. The
/// OIDs are returned as raw contents for identity comparison.
pub fn parse_extended_key_usage(value: &[u8]) -> Result<Vec<&[u8]>> {
    let mut reader = Reader::new(value);
    let mut sequence = reader.read_sequence()?;
    reader.expect_empty()?;

    if !sequence.has_more() {
        return Err(DecodeError::malformed(
            "ExtendedKeyUsage must not be empty",
        ));
    }
    let mut purposes = Vec::new();
    while sequence.has_more() {
        purposes.push(sequence.read_oid()?);
    }
    Ok(purposes)
}

/// Extracts the policy OID list from a certificatePolicies extension.
///
/// Qualifiers are not interpreted. When `fail_parsing_unknown_qualifier_oids`
/// is set (used for critical extensions), any qualifier other than
/// CPS-Pointer or User-Notice fails, per RFC 5280 section 4.2.1.4.
pub fn parse_certificate_policies(
    value: &[u8],
    fail_parsing_unknown_qualifier_oids: bool,
) -> Result<Vec<&[u8]>> {
    let mut reader = Reader::new(value);
    let mut sequence = reader.read_sequence()?;
    reader.expect_empty()?;

    if !sequence.has_more() {
        return Err(DecodeError::malformed(
            "CertificatePolicies must not be empty",
        ));
    }

    let mut policies: Vec<&[u8]> = Vec::new();
    while sequence.has_more() {
        // PolicyInformation ::= SEQUENCE {
        //      policyIdentifier   CertPolicyId,
        //      policyQualifiers   SEQUENCE SIZE (1..MAX) OF
        //                         PolicyQualifierInfo OPTIONAL }
        let mut policy_information = sequence.read_sequence()?;
        let policy_oid = policy_information.read_oid()?;
        if policies.contains(&policy_oid) {
            return Err(DecodeError::malformed(
                "CertificatePolicies contains a duplicate policy",
            ));
        }
        policies.push(policy_oid);

        if policy_information.has_more() {
            let mut qualifiers = Reader::new(policy_information.read_tag(Tag::SEQUENCE)?);
            if !qualifiers.has_more() {
                return Err(DecodeError::malformed(
                    "policyQualifiers must not be empty",
                ));
            }
            while qualifiers.has_more() {
                // PolicyQualifierInfo ::= SEQUENCE {
                //      policyQualifierId  PolicyQualifierId,
                //      qualifier          ANY DEFINED BY policyQualifierId }
                let mut qualifier = qualifiers.read_sequence()?;
                let qualifier_oid = qualifier.read_oid()?;
                if fail_parsing_unknown_qualifier_oids
                    && qualifier_oid != oid::QT_CPS
                    && qualifier_oid != oid::QT_UNOTICE
                {
                    return Err(DecodeError::malformed(
                        "policyQualifier is not CPS-Pointer or User-Notice",
                    ));
                }
                qualifier.read_raw_tlv()?;
                qualifier.expect_empty()?;
            }
        }
        policy_information.expect_empty()?;
    }

    Ok(policies)
}

/// One entry of a policyMappings extension.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PolicyMapping<'a> {
    /// The issuerDomainPolicy OID contents.
    pub issuer_domain_policy: &'a [u8],
    /// The subjectDomainPolicy OID contents.
    pub subject_domain_policy: &'a [u8],
}

/// PolicyMappings ::= SEQUENCE SIZE (1..MAX) OF SEQUENCE {
/// issuerDomainPolicy CertPolicyId, subjectDomainPolicy CertPolicyId }
///
/// anyPolicy on either side is rejected later during policy processing,
/// not here.
pub fn parse_policy_mappings(value: &[u8]) -> Result<Vec<PolicyMapping<'_>>> {
    let mut reader = Reader::new(value);
    let mut sequence = reader.read_sequence()?;
    reader.expect_empty()?;

    if !sequence.has_more() {
        return Err(DecodeError::malformed("PolicyMappings must not be empty"));
    }
    let mut mappings = Vec::new();
    while sequence.has_more() {
        let mut mapping = sequence.read_sequence()?;
        let issuer_domain_policy = mapping.read_oid()?;
        let subject_domain_policy = mapping.read_oid()?;
        mapping.expect_empty()?;
        mappings.push(PolicyMapping {
            issuer_domain_policy,
            subject_domain_policy,
        });
    }
    Ok(mappings)
}

/// A parsed policyConstraints extension.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PolicyConstraints {
    /// requireExplicitPolicy skip count.
    pub require_explicit_policy: Option<u8>,
    /// inhibitPolicyMapping skip count.
    pub inhibit_policy_mapping: Option<u8>,
}

/// PolicyConstraints ::= SEQUENCE {
/// requireExplicitPolicy [0] IMPLICIT SkipCerts OPTIONAL,
/// inhibitPolicyMapping [1] IMPLICIT SkipCerts OPTIONAL }
///
/// RFC 5280 requires at least one of the two fields.
pub fn parse_policy_constraints(value: &[u8]) -> Result<PolicyConstraints> {
    let mut reader = Reader::new(value);
    let mut sequence = reader.read_sequence()?;
    reader.expect_empty()?;

    let read_skip_certs = |contents: &[u8]| -> Result<u8> {
        is_valid_integer(contents)?;
        Ok(decode_unsigned(contents, 8)? as u8)
    };

    let require_explicit_policy = sequence
        .read_optional(Tag::context(0))?
        .map(read_skip_certs)
        .transpose()?;
    let inhibit_policy_mapping = sequence
        .read_optional(Tag::context(1))?
        .map(read_skip_certs)
        .transpose()?;
    sequence.expect_empty()?;

    if require_explicit_policy.is_none() && inhibit_policy_mapping.is_none() {
        return Err(DecodeError::malformed(
            "PolicyConstraints must contain at least one field",
        ));
    }

    Ok(PolicyConstraints {
        require_explicit_policy,
        inhibit_policy_mapping,
    })
}

/// InhibitAnyPolicy ::= SkipCerts, a single INTEGER skip count.
pub fn parse_inhibit_any_policy(value: &[u8]) -> Result<u8> {
    let mut reader = Reader::new(value);
    let skip_certs = reader.read_u8()?;
    reader.expect_empty()?;
    Ok(skip_certs)
}

/// One AccessDescription from an authorityInfoAccess extension.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AccessDescription<'a> {
    /// The accessMethod OID contents.
    pub access_method_oid: &'a [u8],
    /// The accessLocation GeneralName, as a raw TLV.
    pub access_location: &'a [u8],
}

/// AuthorityInfoAccessSyntax ::= SEQUENCE SIZE (1..MAX) OF
/// AccessDescription
pub fn parse_authority_info_access(value: &[u8]) -> Result<Vec<AccessDescription<'_>>> {
    let mut reader = Reader::new(value);
    let mut sequence = reader.read_sequence()?;
    reader.expect_empty()?;

    if !sequence.has_more() {
        return Err(DecodeError::malformed(
            "AuthorityInfoAccess must not be empty",
        ));
    }
    let mut access_descriptions = Vec::new();
    while sequence.has_more() {
        let mut access_description = sequence.read_sequence()?;
        let access_method_oid = access_description.read_oid()?;
        let access_location = access_description.read_raw_tlv()?;
        access_description.expect_empty()?;
        access_descriptions.push(AccessDescription {
            access_method_oid,
            access_location,
        });
    }
    Ok(access_descriptions)
}

/// Extracts the caIssuers and OCSP URIs from an authorityInfoAccess
/// extension value. Only uniformResourceIdentifier locations are
/// collected; a non-ASCII URI fails.
pub fn parse_authority_info_access_uris(value: &[u8]) -> Result<(Vec<&str>, Vec<&str>)> {
    let mut ca_issuers_uris = Vec::new();
    let mut ocsp_uris = Vec::new();

    for access_description in parse_authority_info_access(value)? {
        let mut location = Reader::new(access_description.access_location);
        let (tag, location_value) = location.read_tlv()?;
        if tag != Tag::context(6) {
            continue;
        }
        let uri = core::str::from_utf8(location_value)
            .ok()
            .filter(|uri| uri.is_ascii())
            .ok_or_else(|| DecodeError::malformed("accessLocation URI is not ASCII"))?;
        if access_description.access_method_oid == oid::AD_CA_ISSUERS {
            ca_issuers_uris.push(uri);
        } else if access_description.access_method_oid == oid::AD_OCSP {
            ocsp_uris.push(uri);
        }
    }
    Ok((ca_issuers_uris, ocsp_uris))
}

/// One DistributionPoint from a cRLDistributionPoints extension.
#[derive(Clone, Debug, Default)]
pub struct DistributionPoint<'a> {
    /// The fullName alternative of distributionPoint, parsed.
    pub distribution_point_fullname: Option<GeneralNames<'a>>,
    /// The nameRelativeToCRLIssuer alternative, as raw content.
    pub distribution_point_name_relative_to_crl_issuer: Option<&'a [u8]>,
    /// The reasons BIT STRING content, uninterpreted.
    pub reasons: Option<&'a [u8]>,
    /// The cRLIssuer GeneralNames content, uninterpreted.
    pub crl_issuer: Option<&'a [u8]>,
}

/// DistributionPointName ::= CHOICE {
/// fullName [0] GeneralNames, nameRelativeToCRLIssuer [1] RDN }
fn parse_distribution_point_name<'a>(
    value: &'a [u8],
    distribution_point: &mut DistributionPoint<'a>,
) -> Result<()> {
    let mut reader = Reader::new(value);
    if let Some(full_name) = reader.read_optional(Tag::context_constructed(0))? {
        distribution_point.distribution_point_fullname =
            Some(GeneralNames::create_from_value(full_name)?);
        return reader.expect_empty();
    }
    if let Some(relative_name) = reader.read_optional(Tag::context_constructed(1))? {
        distribution_point.distribution_point_name_relative_to_crl_issuer = Some(relative_name);
        return reader.expect_empty();
    }
    Err(DecodeError::malformed(
        "DistributionPointName must contain fullName or nameRelativeToCRLIssuer",
    ))
}

/// CRLDistributionPoints ::= SEQUENCE SIZE (1..MAX) OF DistributionPoint
///
/// ```text
/// DistributionPoint ::= SEQUENCE {
///      distributionPoint       [0]     DistributionPointName OPTIONAL,
///      reasons                 [1]     ReasonFlags OPTIONAL,
///      cRLIssuer               [2]     GeneralNames OPTIONAL }
/// ```
///
/// Either distributionPoint or cRLIssuer must be present.
pub fn parse_crl_distribution_points(value: &[u8]) -> Result<Vec<DistributionPoint<'_>>> {
    let mut reader = Reader::new(value);
    let mut sequence = reader.read_sequence()?;
    reader.expect_empty()?;

    if !sequence.has_more() {
        return Err(DecodeError::malformed(
            "CRLDistributionPoints must not be empty",
        ));
    }

    let mut distribution_points = Vec::new();
    while sequence.has_more() {
        let mut point_reader = sequence.read_sequence()?;
        let mut distribution_point = DistributionPoint::default();

        let name = point_reader.read_optional(Tag::context_constructed(0))?;
        if let Some(name) = name {
            parse_distribution_point_name(name, &mut distribution_point)?;
        }
        distribution_point.reasons = point_reader.read_optional(Tag::context(1))?;
        distribution_point.crl_issuer =
            point_reader.read_optional(Tag::context_constructed(2))?;
        point_reader.expect_empty()?;

        if name.is_none() && distribution_point.crl_issuer.is_none() {
            return Err(DecodeError::malformed(
                "DistributionPoint requires distributionPoint or cRLIssuer",
            ));
        }
        distribution_points.push(distribution_point);
    }
    Ok(distribution_points)
}

/// A parsed authorityKeyIdentifier extension.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AuthorityKeyIdentifier<'a> {
    /// The keyIdentifier contents.
    pub key_identifier: Option<&'a [u8]>,
    /// The authorityCertIssuer GeneralNames content, uninterpreted.
    pub authority_cert_issuer: Option<&'a [u8]>,
    /// The authorityCertSerialNumber contents.
    pub authority_cert_serial_number: Option<&'a [u8]>,
}

/// AuthorityKeyIdentifier ::= SEQUENCE {
/// keyIdentifier [0] OPTIONAL, authorityCertIssuer [1] OPTIONAL,
/// authorityCertSerialNumber [2] OPTIONAL }
///
/// authorityCertIssuer and authorityCertSerialNumber must both be
/// present or both be absent.
pub fn parse_authority_key_identifier(value: &[u8]) -> Result<AuthorityKeyIdentifier<'_>> {
    let mut reader = Reader::new(value);
    let mut sequence = reader.read_sequence()?;
    reader.expect_empty()?;

    let authority_key_identifier = AuthorityKeyIdentifier {
        key_identifier: sequence.read_optional(Tag::context(0))?,
        authority_cert_issuer: sequence.read_optional(Tag::context_constructed(1))?,
        authority_cert_serial_number: sequence.read_optional(Tag::context(2))?,
    };
    sequence.expect_empty()?;

    if authority_key_identifier.authority_cert_issuer.is_some()
        != authority_key_identifier
            .authority_cert_serial_number
            .is_some()
    {
        return Err(DecodeError::malformed(
            "authorityCertIssuer and authorityCertSerialNumber must appear together",
        ));
    }
    Ok(authority_key_identifier)
}

/// SubjectKeyIdentifier ::= KeyIdentifier (an OCTET STRING).
pub fn parse_subject_key_identifier(value: &[u8]) -> Result<&[u8]> {
    let mut reader = Reader::new(value);
    let key_identifier = reader.read_octet_string()?;
    reader.expect_empty()?;
    Ok(key_identifier)
}

//! [`ParsedCertificate`]: the eagerly pre-parsed certificate the
//! verifier consumes.

use alloc::{collections::BTreeMap, vec::Vec};

use crate::cert::algorithm::{SignatureAlgorithm, parse_signature_algorithm};
use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, DistributionPoint, Extension, PolicyConstraints,
    PolicyMapping, parse_authority_info_access_uris, parse_authority_key_identifier,
    parse_basic_constraints, parse_certificate_policies, parse_crl_distribution_points,
    parse_extended_key_usage, parse_extensions, parse_inhibit_any_policy, parse_key_usage,
    parse_policy_constraints, parse_policy_mappings, parse_subject_key_identifier,
};
use crate::cert::parse::{
    ParseOptions, ParsedTbsCertificate, Version, parse_certificate, parse_tbs_certificate,
};
use crate::der::Reader;
use crate::error::{ErrorId, ErrorSet};
use crate::name::{GeneralNames, NameConstraints, normalize_name};
use crate::types::{BitString, GeneralizedTime, Tag, oid};

/// A fully pre-parsed certificate.
///
/// Construction parses every field and extension the path verifier
/// consults; afterwards the value is immutable. All views borrow from
/// the caller's DER buffer, which must outlive the parsed certificate.
#[derive(Clone, Debug)]
pub struct ParsedCertificate<'a> {
    der: &'a [u8],

    tbs_certificate_tlv: &'a [u8],
    signature_algorithm_tlv: &'a [u8],
    signature_value: BitString,
    tbs: ParsedTbsCertificate<'a>,
    signature_algorithm: Option<SignatureAlgorithm>,

    normalized_subject: Vec<u8>,
    normalized_issuer: Vec<u8>,

    extensions: BTreeMap<&'a [u8], Extension<'a>>,
    basic_constraints: Option<BasicConstraints>,
    key_usage: Option<BitString>,
    extended_key_usage: Option<Vec<&'a [u8]>>,
    subject_alt_names: Option<GeneralNames<'a>>,
    name_constraints: Option<NameConstraints<'a>>,
    has_authority_info_access: bool,
    ca_issuers_uris: Vec<&'a str>,
    ocsp_uris: Vec<&'a str>,
    crl_distribution_points: Option<Vec<DistributionPoint<'a>>>,
    policy_oids: Option<Vec<&'a [u8]>>,
    policy_constraints: Option<PolicyConstraints>,
    policy_mappings: Option<Vec<PolicyMapping<'a>>>,
    inhibit_any_policy: Option<u8>,
    subject_key_identifier: Option<&'a [u8]>,
    authority_key_identifier: Option<AuthorityKeyIdentifier<'a>>,
}

/// Returns the value portion of a SEQUENCE TLV.
fn sequence_value<'a>(tlv: &'a [u8]) -> Option<&'a [u8]> {
    let mut reader = Reader::new(tlv);
    let value = reader.read_tag(Tag::SEQUENCE).ok()?;
    reader.expect_empty().ok()?;
    Some(value)
}

impl<'a> ParsedCertificate<'a> {
    /// Parses `der` into a certificate, accumulating diagnostics into
    /// `errors`. On failure returns `None` with at least one
    /// high-severity entry recorded; no partial certificate is ever
    /// produced.
    pub fn create(
        der: &'a [u8],
        options: &ParseOptions,
        errors: &mut ErrorSet,
    ) -> Option<Self> {
        let Ok((tbs_certificate_tlv, signature_algorithm_tlv, signature_value)) =
            parse_certificate(der)
        else {
            errors.add_error(ErrorId::FailedParsingCertificate);
            return None;
        };

        let tbs = match parse_tbs_certificate(tbs_certificate_tlv, options, errors) {
            Ok(tbs) => tbs,
            Err(_) => {
                errors.add_error(ErrorId::FailedParsingTbsCertificate);
                return None;
            }
        };

        // Unparseable algorithms surface later, in the verifier's
        // signature-algorithm checks.
        let signature_algorithm = parse_signature_algorithm(signature_algorithm_tlv).ok();

        let Some(subject_value) = sequence_value(tbs.subject_tlv) else {
            errors.add_error(ErrorId::FailedReadingIssuerOrSubject);
            return None;
        };
        let Ok(normalized_subject) = normalize_name(subject_value) else {
            errors.add_error(ErrorId::FailedNormalizingSubject);
            return None;
        };
        let Some(issuer_value) = sequence_value(tbs.issuer_tlv) else {
            errors.add_error(ErrorId::FailedReadingIssuerOrSubject);
            return None;
        };
        let Ok(normalized_issuer) = normalize_name(issuer_value) else {
            errors.add_error(ErrorId::FailedNormalizingIssuer);
            return None;
        };

        let mut certificate = Self {
            der,
            tbs_certificate_tlv,
            signature_algorithm_tlv,
            signature_value,
            tbs,
            signature_algorithm,
            normalized_subject,
            normalized_issuer,
            extensions: BTreeMap::new(),
            basic_constraints: None,
            key_usage: None,
            extended_key_usage: None,
            subject_alt_names: None,
            name_constraints: None,
            has_authority_info_access: false,
            ca_issuers_uris: Vec::new(),
            ocsp_uris: Vec::new(),
            crl_distribution_points: None,
            policy_oids: None,
            policy_constraints: None,
            policy_mappings: None,
            inhibit_any_policy: None,
            subject_key_identifier: None,
            authority_key_identifier: None,
        };

        if let Some(extensions_tlv) = certificate.tbs.extensions_tlv {
            certificate.extensions = match parse_extensions(extensions_tlv) {
                Ok(extensions) => extensions,
                Err(_) => {
                    errors.add_error(ErrorId::FailedParsingExtensions);
                    return None;
                }
            };
        }

        if let Some(extension) = certificate.extension(oid::BASIC_CONSTRAINTS).copied() {
            match parse_basic_constraints(extension.value) {
                Ok(basic_constraints) => certificate.basic_constraints = Some(basic_constraints),
                Err(_) => {
                    errors.add_error(ErrorId::FailedParsingBasicConstraints);
                    return None;
                }
            }
        }

        if let Some(extension) = certificate.extension(oid::KEY_USAGE).copied() {
            match parse_key_usage(extension.value) {
                Ok(key_usage) => certificate.key_usage = Some(key_usage),
                Err(_) => {
                    errors.add_error(ErrorId::FailedParsingKeyUsage);
                    return None;
                }
            }
        }

        if let Some(extension) = certificate.extension(oid::EXT_KEY_USAGE).copied() {
            match parse_extended_key_usage(extension.value) {
                Ok(purposes) => certificate.extended_key_usage = Some(purposes),
                Err(_) => {
                    errors.add_error(ErrorId::FailedParsingEku);
                    return None;
                }
            }
        }

        if let Some(extension) = certificate.extension(oid::SUBJECT_ALT_NAME).copied() {
            match GeneralNames::create(extension.value) {
                Ok(subject_alt_names) => {
                    // A certificate whose naming information lives only
                    // in the SAN extension must mark it critical (RFC
                    // 5280 section 4.1.2.6).
                    if subject_value.is_empty() && !extension.critical {
                        errors.add_error(ErrorId::SubjectAltNameNotCritical);
                        return None;
                    }
                    certificate.subject_alt_names = Some(subject_alt_names);
                }
                Err(_) => {
                    errors.add_error(ErrorId::FailedParsingSubjectAltName);
                    return None;
                }
            }
        }

        if let Some(extension) = certificate.extension(oid::NAME_CONSTRAINTS).copied() {
            match NameConstraints::create(extension.value, extension.critical) {
                Ok(name_constraints) => certificate.name_constraints = Some(name_constraints),
                Err(_) => {
                    errors.add_error(ErrorId::FailedParsingNameConstraints);
                    return None;
                }
            }
        }

        if let Some(extension) = certificate.extension(oid::AUTHORITY_INFO_ACCESS).copied() {
            match parse_authority_info_access_uris(extension.value) {
                Ok((ca_issuers_uris, ocsp_uris)) => {
                    certificate.has_authority_info_access = true;
                    certificate.ca_issuers_uris = ca_issuers_uris;
                    certificate.ocsp_uris = ocsp_uris;
                }
                Err(_) => {
                    errors.add_error(ErrorId::FailedParsingAia);
                    return None;
                }
            }
        }

        if let Some(extension) = certificate.extension(oid::CRL_DISTRIBUTION_POINTS).copied() {
            match parse_crl_distribution_points(extension.value) {
                Ok(points) => certificate.crl_distribution_points = Some(points),
                Err(_) => {
                    errors.add_error(ErrorId::FailedParsingCrlDistributionPoints);
                    return None;
                }
            }
        }

        if let Some(extension) = certificate.extension(oid::CERTIFICATE_POLICIES).copied() {
            match parse_certificate_policies(extension.value, false) {
                Ok(policy_oids) => certificate.policy_oids = Some(policy_oids),
                Err(_) => {
                    errors.add_error(ErrorId::FailedParsingPolicies);
                    return None;
                }
            }
        }

        if let Some(extension) = certificate.extension(oid::POLICY_CONSTRAINTS).copied() {
            match parse_policy_constraints(extension.value) {
                Ok(policy_constraints) => {
                    certificate.policy_constraints = Some(policy_constraints);
                }
                Err(_) => {
                    errors.add_error(ErrorId::FailedParsingPolicyConstraints);
                    return None;
                }
            }
        }

        if let Some(extension) = certificate.extension(oid::POLICY_MAPPINGS).copied() {
            match parse_policy_mappings(extension.value) {
                Ok(policy_mappings) => certificate.policy_mappings = Some(policy_mappings),
                Err(_) => {
                    errors.add_error(ErrorId::FailedParsingPolicyMappings);
                    return None;
                }
            }
        }

        if let Some(extension) = certificate.extension(oid::INHIBIT_ANY_POLICY).copied() {
            match parse_inhibit_any_policy(extension.value) {
                Ok(skip_certs) => certificate.inhibit_any_policy = Some(skip_certs),
                Err(_) => {
                    errors.add_error(ErrorId::FailedParsingInhibitAnyPolicy);
                    return None;
                }
            }
        }

        if let Some(extension) = certificate.extension(oid::SUBJECT_KEY_IDENTIFIER).copied() {
            match parse_subject_key_identifier(extension.value) {
                Ok(key_identifier) => {
                    certificate.subject_key_identifier = Some(key_identifier);
                }
                Err(_) => {
                    errors.add_error(ErrorId::FailedParsingSubjectKeyIdentifier);
                    return None;
                }
            }
        }

        if let Some(extension) = certificate.extension(oid::AUTHORITY_KEY_IDENTIFIER).copied() {
            match parse_authority_key_identifier(extension.value) {
                Ok(authority_key_identifier) => {
                    certificate.authority_key_identifier = Some(authority_key_identifier);
                }
                Err(_) => {
                    errors.add_error(ErrorId::FailedParsingAuthorityKeyIdentifier);
                    return None;
                }
            }
        }

        Some(certificate)
    }

    /// Parses `der` and appends the result to `chain`, as when
    /// assembling a certificate list presented by a peer. Returns false
    /// (leaving `chain` untouched) on failure.
    pub fn create_and_add_to_vec(
        der: &'a [u8],
        options: &ParseOptions,
        chain: &mut alloc::vec::Vec<ParsedCertificate<'a>>,
        errors: &mut ErrorSet,
    ) -> bool {
        match Self::create(der, options, errors) {
            Some(certificate) => {
                chain.push(certificate);
                true
            }
            None => false,
        }
    }

    /// The certificate's full DER encoding.
    pub fn der(&self) -> &'a [u8] {
        self.der
    }

    /// The TBSCertificate TLV (the signed bytes).
    pub fn tbs_certificate_tlv(&self) -> &'a [u8] {
        self.tbs_certificate_tlv
    }

    /// The outer signatureAlgorithm TLV.
    pub fn signature_algorithm_tlv(&self) -> &'a [u8] {
        self.signature_algorithm_tlv
    }

    /// The signatureValue bits.
    pub fn signature_value(&self) -> &BitString {
        &self.signature_value
    }

    /// The parsed TBSCertificate fields.
    pub fn tbs(&self) -> &ParsedTbsCertificate<'a> {
        &self.tbs
    }

    /// The certificate version.
    pub fn version(&self) -> Version {
        self.tbs.version
    }

    /// notBefore.
    pub fn valid_from(&self) -> GeneralizedTime {
        self.tbs.validity_not_before
    }

    /// notAfter.
    pub fn valid_until(&self) -> GeneralizedTime {
        self.tbs.validity_not_after
    }

    /// The outer signature algorithm, when it parsed to a recognized
    /// one.
    pub fn signature_algorithm(&self) -> Option<SignatureAlgorithm> {
        self.signature_algorithm
    }

    /// The normalized subject RDNSequence value.
    pub fn normalized_subject(&self) -> &[u8] {
        &self.normalized_subject
    }

    /// The normalized issuer RDNSequence value.
    pub fn normalized_issuer(&self) -> &[u8] {
        &self.normalized_issuer
    }

    /// Looks up a raw extension by OID contents.
    pub fn extension(&self, extension_oid: &[u8]) -> Option<&Extension<'a>> {
        self.extensions.get(extension_oid)
    }

    /// All raw extensions, keyed by OID contents.
    pub fn extensions(&self) -> &BTreeMap<&'a [u8], Extension<'a>> {
        &self.extensions
    }

    /// The basicConstraints extension, if present.
    pub fn basic_constraints(&self) -> Option<&BasicConstraints> {
        self.basic_constraints.as_ref()
    }

    /// The keyUsage extension, if present.
    pub fn key_usage(&self) -> Option<&BitString> {
        self.key_usage.as_ref()
    }

    /// The extendedKeyUsage purpose OIDs, if the extension is present.
    pub fn extended_key_usage(&self) -> Option<&[&'a [u8]]> {
        self.extended_key_usage.as_deref()
    }

    /// The parsed subjectAltName extension, if present.
    pub fn subject_alt_names(&self) -> Option<&GeneralNames<'a>> {
        self.subject_alt_names.as_ref()
    }

    /// The parsed nameConstraints extension, if present.
    pub fn name_constraints(&self) -> Option<&NameConstraints<'a>> {
        self.name_constraints.as_ref()
    }

    /// Whether an authorityInfoAccess extension is present.
    pub fn has_authority_info_access(&self) -> bool {
        self.has_authority_info_access
    }

    /// caIssuers URIs from authorityInfoAccess.
    pub fn ca_issuers_uris(&self) -> &[&'a str] {
        &self.ca_issuers_uris
    }

    /// OCSP URIs from authorityInfoAccess.
    pub fn ocsp_uris(&self) -> &[&'a str] {
        &self.ocsp_uris
    }

    /// The parsed cRLDistributionPoints extension, if present.
    pub fn crl_distribution_points(&self) -> Option<&[DistributionPoint<'a>]> {
        self.crl_distribution_points.as_deref()
    }

    /// The certificatePolicies OIDs, if the extension is present.
    pub fn policy_oids(&self) -> Option<&[&'a [u8]]> {
        self.policy_oids.as_deref()
    }

    /// The policyConstraints extension, if present.
    pub fn policy_constraints(&self) -> Option<&PolicyConstraints> {
        self.policy_constraints.as_ref()
    }

    /// The policyMappings extension, if present.
    pub fn policy_mappings(&self) -> Option<&[PolicyMapping<'a>]> {
        self.policy_mappings.as_deref()
    }

    /// The inhibitAnyPolicy skip count, if the extension is present.
    pub fn inhibit_any_policy(&self) -> Option<u8> {
        self.inhibit_any_policy
    }

    /// The subjectKeyIdentifier contents, if present.
    pub fn subject_key_identifier(&self) -> Option<&'a [u8]> {
        self.subject_key_identifier
    }

    /// The authorityKeyIdentifier extension, if present.
    pub fn authority_key_identifier(&self) -> Option<&AuthorityKeyIdentifier<'a>> {
        self.authority_key_identifier.as_ref()
    }
}

//! The certification-path state machine (RFC 5280 section 6.1).

use alloc::{collections::BTreeSet, format, string::String, vec::Vec};

use crate::cert::extensions::{Extension, key_usage_bits, parse_certificate_policies};
use crate::cert::{ParsedCertificate, Version, parse_signature_algorithm};
use crate::der::Reader;
use crate::error::{ErrorId, ErrorSet, PathErrors, Severity};
use crate::name::NameConstraints;
use crate::types::{GeneralizedTime, oid};
use crate::verify::delegate::{Delegate, verify_signed_data_cached};
use crate::verify::policies::ValidPolicyGraph;
use crate::verify::trust::{CertificateTrust, TrustType};

/// The key purpose a chain is being verified for. Beyond selecting the
/// target's required extended key usage, the purpose is interpreted as
/// a constraint when it appears in issuing certificates, which goes
/// beyond RFC 5280 but matches Web PKI practice.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum KeyPurpose {
    /// Skip all extended-key-usage checking.
    AnyEku,
    /// TLS server authentication, legacy-compatible: only enforced when
    /// the EKU extension is present.
    ServerAuth,
    /// TLS server authentication, strictly required.
    ServerAuthStrict,
    /// Strict at the target certificate, legacy elsewhere.
    ServerAuthStrictLeaf,
    /// TLS client authentication, legacy-compatible.
    ClientAuth,
    /// TLS client authentication, strictly required.
    ClientAuthStrict,
    /// Strict at the target certificate, legacy elsewhere.
    ClientAuthStrictLeaf,
    /// RCS MLS client certificates: every certificate must assert
    /// exactly the rcsMlsClient purpose, and the target's key usage
    /// must be exactly digitalSignature.
    RcsMlsClientAuth,
}

/// Returns whether `cert` is self-issued: the same DN in subject and
/// issuer (RFC 5280 section 6.1). Self-issued certificates are not
/// counted for path length or name constraints.
fn is_self_issued(cert: &ParsedCertificate<'_>) -> bool {
    cert.normalized_subject() == cert.normalized_issuer()
}

/// RFC 5280 section 4.1.2.5: validity is notBefore through notAfter,
/// inclusive.
fn verify_time_validity(cert: &ParsedCertificate<'_>, time: GeneralizedTime, errors: &mut ErrorSet) {
    if time < cert.tbs().validity_not_before {
        errors.add_error(ErrorId::ValidityFailedNotBefore);
    }
    if cert.tbs().validity_not_after < time {
        errors.add_error(ErrorId::ValidityFailedNotAfter);
    }
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Checks that `Certificate.signatureAlgorithm` and
/// `TBSCertificate.signature` agree (RFC 5280 sections 4.1.1.2 and
/// 4.1.2.3). The two DER encodings are normally required to be
/// byte-for-byte identical; as a compatibility concession, different
/// encodings of the same logical algorithm only warn.
fn verify_signature_algorithms_match(
    cert: &ParsedCertificate<'_>,
    errors: &mut ErrorSet,
) -> bool {
    let outer_tlv = cert.signature_algorithm_tlv();
    let inner_tlv = cert.tbs().signature_algorithm_tlv;

    if outer_tlv == inner_tlv {
        return true;
    }

    let (Ok(outer), Ok(inner)) = (
        parse_signature_algorithm(outer_tlv),
        parse_signature_algorithm(inner_tlv),
    ) else {
        errors.add_error(ErrorId::UnacceptableSignatureAlgorithm);
        return false;
    };

    if outer == inner {
        errors.add(
            Severity::Warning,
            ErrorId::SignatureAlgorithmsDifferentEncoding,
            Some(format!(
                "Certificate.algorithm: {}, TBSCertificate.signature: {}",
                hex(outer_tlv),
                hex(inner_tlv)
            )),
        );
        return true;
    }

    errors.add_error_with_params(
        ErrorId::SignatureAlgorithmMismatch,
        format!(
            "Certificate.algorithm: {}, TBSCertificate.signature: {}",
            hex(outer_tlv),
            hex(inner_tlv)
        ),
    );
    false
}

fn is_handled_critical_extension(extension: &Extension<'_>) -> bool {
    if extension.oid == oid::BASIC_CONSTRAINTS {
        return true;
    }
    // Key usage is not processed for end-entity certificates (that is
    // the caller's responsibility) but is still considered handled so
    // it may be marked critical.
    if extension.oid == oid::KEY_USAGE {
        return true;
    }
    if extension.oid == oid::EXT_KEY_USAGE {
        return true;
    }
    if extension.oid == oid::NAME_CONSTRAINTS {
        return true;
    }
    if extension.oid == oid::SUBJECT_ALT_NAME {
        return true;
    }
    if extension.oid == oid::CERTIFICATE_POLICIES {
        // Policy qualifiers are skipped during processing, so a
        // critical certificatePolicies is only handled when every
        // qualifier is CPS-Pointer or User-Notice (RFC 5280 section
        // 4.2.1.4).
        return parse_certificate_policies(extension.value, true).is_ok();
    }
    if extension.oid == oid::POLICY_MAPPINGS {
        return true;
    }
    if extension.oid == oid::POLICY_CONSTRAINTS {
        return true;
    }
    if extension.oid == oid::INHIBIT_ANY_POLICY {
        return true;
    }
    false
}

/// Adds errors for any critical extension the verifier did not consume.
fn verify_no_unconsumed_critical_extensions(
    cert: &ParsedCertificate<'_>,
    errors: &mut ErrorSet,
    allow_precertificate: bool,
    key_purpose: KeyPurpose,
) {
    for extension in cert.extensions().values() {
        if !extension.critical {
            continue;
        }
        if key_purpose == KeyPurpose::RcsMlsClientAuth
            && (extension.oid == oid::RCS_MLS_PARTICIPANT_INFORMATION
                || extension.oid == oid::RCS_MLS_ACS_PARTICIPANT_INFORMATION)
        {
            continue;
        }
        if allow_precertificate && extension.oid == oid::CT_POISON {
            continue;
        }
        // The MSApplicationPolicies extension may be ignored when the
        // extendedKeyUsage extension is also present.
        if extension.oid == oid::MS_APPLICATION_POLICIES && cert.extended_key_usage().is_some() {
            continue;
        }
        if !is_handled_critical_extension(extension) {
            errors.add_error_with_params(
                ErrorId::UnconsumedCriticalExtension,
                format!("oid: {}", hex(extension.oid)),
            );
        }
    }
}

/// Verifies that `cert` can be used for `required_key_purpose`.
fn verify_extended_key_usage(
    cert: &ParsedCertificate<'_>,
    required_key_purpose: KeyPurpose,
    errors: &mut ErrorSet,
    is_target_cert: bool,
    is_target_cert_issuer: bool,
) {
    // ANY_EKU means "do not check EKU".
    if required_key_purpose == KeyPurpose::AnyEku {
        return;
    }

    let mut has_any_eku = false;
    let mut has_server_auth_eku = false;
    let mut has_client_auth_eku = false;
    let mut has_code_signing_eku = false;
    let mut has_time_stamping_eku = false;
    let mut has_ocsp_signing_eku = false;
    let mut has_rcs_mls_client_eku = false;
    let mut eku_oid_count = 0usize;
    if let Some(purposes) = cert.extended_key_usage() {
        for &purpose in purposes {
            eku_oid_count += 1;
            has_any_eku |= purpose == oid::ANY_EKU;
            has_server_auth_eku |= purpose == oid::SERVER_AUTH;
            has_client_auth_eku |= purpose == oid::CLIENT_AUTH;
            has_code_signing_eku |= purpose == oid::CODE_SIGNING;
            has_time_stamping_eku |= purpose == oid::TIME_STAMPING;
            has_ocsp_signing_eku |= purpose == oid::OCSP_SIGNING;
            has_rcs_mls_client_eku |= purpose == oid::RCS_MLS_CLIENT;
        }
    }

    if required_key_purpose == KeyPurpose::RcsMlsClientAuth {
        // The leaf's key usage must be exactly digitalSignature: a
        // one-byte BIT STRING with seven unused bits and bit 0 set.
        if is_target_cert {
            let key_usage_ok = cert.key_usage().is_some_and(|key_usage| {
                key_usage.asserts_bit(key_usage_bits::DIGITAL_SIGNATURE)
                    && key_usage.bytes().len() == 1
                    && key_usage.unused_bits() == 7
            });
            if !key_usage_ok {
                errors.add_error(ErrorId::KeyUsageIncorrectForRcsMlsClient);
            }
        }
        // For the leaf and every intermediate, the EKU must be present
        // and contain exactly rcsMlsClient.
        if cert.extended_key_usage().is_none() {
            errors.add_error(ErrorId::EkuNotPresent);
        } else if eku_oid_count != 1 || !has_rcs_mls_client_eku {
            errors.add_error(ErrorId::EkuIncorrectForRcsMlsClient);
        }
        return;
    }

    // The *StrictLeaf variants apply strict rules to the target only.
    let required_key_purpose = match required_key_purpose {
        KeyPurpose::ClientAuthStrictLeaf => {
            if is_target_cert {
                KeyPurpose::ClientAuthStrict
            } else {
                KeyPurpose::ClientAuth
            }
        }
        KeyPurpose::ServerAuthStrictLeaf => {
            if is_target_cert {
                KeyPurpose::ServerAuthStrict
            } else {
                KeyPurpose::ServerAuth
            }
        }
        other => other,
    };
    let strict = matches!(
        required_key_purpose,
        KeyPurpose::ServerAuthStrict | KeyPurpose::ClientAuthStrict
    );
    let mut add_error_if_strict = |errors: &mut ErrorSet, id: ErrorId| {
        if strict {
            errors.add_error(id);
        } else {
            errors.add_warning(id);
        }
    };

    if is_target_cert {
        // Per CABF Baseline Requirements 7.1.2.3(f), loosely: anyEKU may
        // be present in a leaf but does not count toward server or
        // client auth; code signing, OCSP signing and time stamping are
        // prohibited. Email protection still exists in the wild and is
        // not prohibited.
        if cert.extended_key_usage().is_none() {
            // Strict modes will add an error below when this leads to a
            // missing client/server auth purpose.
            errors.add_warning(ErrorId::EkuNotPresent);
        } else {
            if has_code_signing_eku {
                add_error_if_strict(errors, ErrorId::EkuHasProhibitedCodeSigning);
            }
            if has_ocsp_signing_eku {
                add_error_if_strict(errors, ErrorId::EkuHasProhibitedOcspSigning);
            }
            if has_time_stamping_eku {
                add_error_if_strict(errors, ErrorId::EkuHasProhibitedTimeStamping);
            }
        }
    } else if is_target_cert_issuer {
        // EKU as an issuer constraint can only be enforced at the
        // issuer of the target: cross-signing and CA-ownership
        // exceptions make deeper enforcement impossible here. Email
        // protection is allowed in the issuer so it can be allowed in
        // leaves; EKU-less issuers are still common and permit
        // everything.
        if cert.extended_key_usage().is_some() {
            if has_code_signing_eku {
                add_error_if_strict(errors, ErrorId::EkuHasProhibitedCodeSigning);
            }
            if has_time_stamping_eku {
                add_error_if_strict(errors, ErrorId::EkuHasProhibitedTimeStamping);
            }
        }
    }
    // Above the target issuer no prohibited-purpose checks apply, and
    // anyEKU is accepted as a substitute for the required purpose.

    match required_key_purpose {
        KeyPurpose::ServerAuth | KeyPurpose::ServerAuthStrict => {
            let mut has_server_auth_eku = has_server_auth_eku;
            if has_any_eku && !has_server_auth_eku {
                if is_target_cert || is_target_cert_issuer {
                    errors.add_warning(ErrorId::EkuLacksServerAuthButHasAnyEku);
                } else {
                    has_server_auth_eku = true;
                }
            }
            if is_target_cert_issuer && cert.extended_key_usage().is_none() {
                has_server_auth_eku = true;
            }
            if required_key_purpose == KeyPurpose::ServerAuth {
                if cert.extended_key_usage().is_some() && !has_server_auth_eku && !has_any_eku {
                    errors.add_error(ErrorId::EkuLacksServerAuth);
                }
            } else if !has_server_auth_eku {
                errors.add_error(ErrorId::EkuLacksServerAuth);
            }
        }
        KeyPurpose::ClientAuth | KeyPurpose::ClientAuthStrict => {
            let mut has_client_auth_eku = has_client_auth_eku;
            if has_any_eku && !has_client_auth_eku {
                if is_target_cert || is_target_cert_issuer {
                    errors.add_warning(ErrorId::EkuLacksClientAuthButHasAnyEku);
                } else {
                    has_client_auth_eku = true;
                }
            }
            if required_key_purpose == KeyPurpose::ClientAuth {
                if cert.extended_key_usage().is_some() && !has_client_auth_eku && !has_any_eku {
                    errors.add_error(ErrorId::EkuLacksClientAuth);
                }
            } else if !has_client_auth_eku {
                errors.add_error(ErrorId::EkuLacksClientAuth);
            }
        }
        KeyPurpose::AnyEku
        | KeyPurpose::ServerAuthStrictLeaf
        | KeyPurpose::ClientAuthStrictLeaf
        | KeyPurpose::RcsMlsClientAuth => {
            errors.add_error(ErrorId::InternalError);
        }
    }
}

/// If the target has the CA bit set, records an error or warning per
/// CABF Baseline Requirements 7.1.2.3(d).
fn verify_target_cert_is_not_ca(
    cert: &ParsedCertificate<'_>,
    required_key_purpose: KeyPurpose,
    errors: &mut ErrorSet,
) {
    if cert.basic_constraints().is_some_and(|bc| bc.is_ca) {
        match required_key_purpose {
            KeyPurpose::AnyEku => {}
            KeyPurpose::ServerAuth | KeyPurpose::ClientAuth => {
                errors.add_warning(ErrorId::TargetCertShouldNotBeCa);
            }
            KeyPurpose::ServerAuthStrict
            | KeyPurpose::ClientAuthStrict
            | KeyPurpose::ServerAuthStrictLeaf
            | KeyPurpose::ClientAuthStrictLeaf
            | KeyPurpose::RcsMlsClientAuth => {
                errors.add_error(ErrorId::TargetCertShouldNotBeCa);
            }
        }
    }
}

/// Structural validation of a SubjectPublicKeyInfo: a SEQUENCE holding
/// an AlgorithmIdentifier and the subjectPublicKey BIT STRING. Key
/// interpretation belongs to the delegate.
fn parse_spki(spki_tlv: &[u8]) -> bool {
    let parse = || -> Result<(), crate::error::DecodeError> {
        let mut reader = Reader::new(spki_tlv);
        let mut spki_reader = reader.read_sequence()?;
        reader.expect_empty()?;
        let mut algorithm = spki_reader.read_sequence()?;
        algorithm.read_oid()?;
        spki_reader.read_bit_string()?;
        spki_reader.expect_empty()?;
        Ok(())
    };
    parse().is_ok()
}

/// Returns true iff `cert`'s subject equals its issuer and its
/// signature verifies under its own key. Any parseable signature
/// algorithm is allowed; the signature on a self-signed certificate is
/// not load-bearing enough to restrict algorithms and risk breakage.
pub fn verify_certificate_is_self_signed(
    cert: &ParsedCertificate<'_>,
    delegate: &dyn Delegate,
    errors: &mut ErrorSet,
) -> bool {
    if cert.normalized_subject() != cert.normalized_issuer() {
        errors.add_error(ErrorId::SubjectDoesNotMatchIssuer);
        return false;
    }

    if cert.signature_algorithm().is_none() {
        errors.add_error(ErrorId::UnacceptableSignatureAlgorithm);
        return false;
    }

    if !verify_signed_data_cached(
        delegate,
        cert.signature_algorithm_tlv(),
        cert.tbs_certificate_tlv(),
        cert.signature_value(),
        cert.tbs().spki_tlv,
    ) {
        errors.add_error(ErrorId::VerifySignedDataFailed);
        return false;
    }

    true
}

/// The state variables of RFC 5280 section 6.1.2, plus the delegate.
struct PathVerifier<'d, 'p, 'a> {
    delegate: &'d dyn Delegate,

    valid_policy_graph: ValidPolicyGraph<'a>,
    user_constrained_policy_set: BTreeSet<&'a [u8]>,

    /// One entry per earlier certificate that carried nameConstraints;
    /// together these are the permitted_subtrees and excluded_subtrees
    /// state variables.
    name_constraints_list: Vec<&'p NameConstraints<'a>>,

    /// Number of non-self-issued certificates to process before a
    /// non-null policy tree is required.
    explicit_policy: usize,
    /// Number of non-self-issued certificates to process before
    /// anyPolicy stops matching.
    inhibit_any_policy: usize,
    /// Number of non-self-issued certificates to process before policy
    /// mapping is inhibited.
    policy_mapping: usize,

    /// The SPKI used to verify the next certificate's signature. `None`
    /// when the issuer's SPKI failed to parse; the next signature check
    /// then short-circuits the chain.
    working_public_key: Option<&'a [u8]>,
    /// The normalized issuer DN expected in the next certificate.
    working_normalized_issuer_name: &'p [u8],

    /// Decremented for each non-self-issued certificate; may be lowered
    /// by pathLenConstraint.
    max_path_length: usize,
}

impl<'d, 'p, 'a> PathVerifier<'d, 'p, 'a> {
    /// RFC 5280 section 6.1.3 steps d through f.
    fn verify_policies(
        &mut self,
        cert: &'p ParsedCertificate<'a>,
        is_target_cert: bool,
        errors: &mut ErrorSet,
    ) {
        if let Some(policy_oids) = cert.policy_oids() {
            if !self.valid_policy_graph.is_null() {
                let mut previous_level = self.valid_policy_graph.start_level();

                // Step d.1: for each concrete policy, parent it on the
                // nodes expecting it, or on anyPolicy when none do.
                let mut cert_has_any_policy = false;
                for &policy in policy_oids {
                    if policy == oid::ANY_POLICY {
                        cert_has_any_policy = true;
                        continue;
                    }
                    if let Some(parents) = previous_level.expected_policy_map.remove(policy) {
                        self.valid_policy_graph.add_node(policy, parents);
                    } else if previous_level.has_any_policy {
                        self.valid_policy_graph.add_node_with_parent_any_policy(policy);
                    }
                }

                // Step d.2: an asserted anyPolicy keeps the unmatched
                // expectations alive, when anyPolicy is still allowed
                // here.
                if cert_has_any_policy
                    && (self.inhibit_any_policy > 0
                        || (!is_target_cert && is_self_issued(cert)))
                {
                    for (policy, parents) in previous_level.expected_policy_map {
                        self.valid_policy_graph.add_node(policy, parents);
                    }
                    if previous_level.has_any_policy {
                        self.valid_policy_graph.add_any_policy_node();
                    }
                }

                // Step d.3, pruning childless nodes, is deferred to the
                // reachability pass in user_constrained_policy_set.
            }
        } else {
            // Step e.
            self.valid_policy_graph.set_null();
        }

        // Step f.
        if !(self.explicit_policy > 0 || !self.valid_policy_graph.is_null()) {
            errors.add_error(ErrorId::NoValidPolicy);
        }
    }

    /// RFC 5280 section 6.1.4 steps a and b.
    fn verify_policy_mappings(&mut self, cert: &ParsedCertificate<'a>, errors: &mut ErrorSet) {
        let Some(mappings) = cert.policy_mappings() else {
            return;
        };

        // Step a: anyPolicy may appear on neither side of a mapping.
        for mapping in mappings {
            if mapping.issuer_domain_policy == oid::ANY_POLICY
                || mapping.subject_domain_policy == oid::ANY_POLICY
            {
                // Processing continues after this error, so clear the
                // graph to keep the output policy set empty on failure.
                self.valid_policy_graph.set_null();
                errors.add_error(ErrorId::PolicyMappingAnyPolicy);
                return;
            }
        }

        if self.policy_mapping > 0 {
            // Step b.1.
            for mapping in mappings {
                self.valid_policy_graph
                    .add_policy_mapping(mapping.issuer_domain_policy, mapping.subject_domain_policy);
            }
        } else {
            // Step b.2.
            for mapping in mappings {
                self.valid_policy_graph.delete_node(mapping.issuer_domain_policy);
            }
        }
    }

    /// RFC 5280 section 6.1.4 steps i and j.
    fn apply_policy_constraints(&mut self, cert: &ParsedCertificate<'a>) {
        if let Some(constraints) = cert.policy_constraints() {
            if let Some(require_explicit_policy) = constraints.require_explicit_policy {
                self.explicit_policy =
                    self.explicit_policy.min(usize::from(require_explicit_policy));
            }
            if let Some(inhibit_policy_mapping) = constraints.inhibit_policy_mapping {
                self.policy_mapping =
                    self.policy_mapping.min(usize::from(inhibit_policy_mapping));
            }
        }

        if let Some(inhibit_any_policy) = cert.inhibit_any_policy() {
            self.inhibit_any_policy =
                self.inhibit_any_policy.min(usize::from(inhibit_any_policy));
        }
    }

    /// Parses and policy-checks a SubjectPublicKeyInfo. Returns `None`
    /// (with a high-severity error) when the SPKI is structurally
    /// invalid; acceptability failures record an error but still return
    /// the SPKI, matching how an unacceptable-but-parseable key is
    /// reported against its own certificate.
    fn parse_and_check_public_key(
        &mut self,
        spki_tlv: &'a [u8],
        errors: &mut ErrorSet,
    ) -> Option<&'a [u8]> {
        if !parse_spki(spki_tlv) {
            errors.add_error(ErrorId::FailedParsingSpki);
            return None;
        }
        if !self.delegate.is_public_key_acceptable(spki_tlv, errors) {
            errors.add_error(ErrorId::UnacceptablePublicKey);
        }
        Some(spki_tlv)
    }

    /// RFC 5280 section 6.1.3, "Basic Certificate Processing". Returns
    /// whether the rest of the chain must be short-circuited.
    fn basic_certificate_processing(
        &mut self,
        cert: &'p ParsedCertificate<'a>,
        is_target_cert: bool,
        is_target_cert_issuer: bool,
        time: GeneralizedTime,
        required_key_purpose: KeyPurpose,
        errors: &mut ErrorSet,
    ) -> bool {
        // Not part of section 6.1.3, but mandated by sections 4.1.1.2
        // and 4.1.2.3: the two signature-algorithm fields must agree.
        let mut shortcircuit_chain_validation = false;
        if !verify_signature_algorithms_match(cert, errors) {
            shortcircuit_chain_validation = true;
        }

        if cert.signature_algorithm().is_none()
            || !self
                .delegate
                .is_signature_algorithm_acceptable(cert.signature_algorithm_tlv(), errors)
        {
            errors.add_error(ErrorId::UnacceptableSignatureAlgorithm);
            return true;
        }

        match self.working_public_key {
            Some(working_public_key) => {
                // Step a.1: verify the signature with the working key.
                if !verify_signed_data_cached(
                    self.delegate,
                    cert.signature_algorithm_tlv(),
                    cert.tbs_certificate_tlv(),
                    cert.signature_value(),
                    working_public_key,
                ) {
                    shortcircuit_chain_validation = true;
                    errors.add_error(ErrorId::VerifySignedDataFailed);
                }
            }
            None => {
                // The issuer's SPKI did not parse; the error is already
                // recorded on the issuer. Treat like a bad signature.
                shortcircuit_chain_validation = true;
            }
        }
        if shortcircuit_chain_validation {
            return true;
        }

        // Step a.2. (Step a.3, revocation, is outside this crate.)
        verify_time_validity(cert, time, errors);

        // Step a.4.
        if cert.normalized_issuer() != self.working_normalized_issuer_name {
            errors.add_error(ErrorId::SubjectDoesNotMatchIssuer);
        }

        // Steps b and c; skipped for self-issued certificates that are
        // not the target.
        if !self.name_constraints_list.is_empty() && (!is_self_issued(cert) || is_target_cert) {
            for name_constraints in &self.name_constraints_list {
                name_constraints.is_permitted_cert(
                    cert.normalized_subject(),
                    cert.subject_alt_names(),
                    errors,
                );
            }
        }

        // Steps d through f.
        self.verify_policies(cert, is_target_cert, errors);

        verify_extended_key_usage(
            cert,
            required_key_purpose,
            errors,
            is_target_cert,
            is_target_cert_issuer,
        );

        false
    }

    /// RFC 5280 section 6.1.4, "Preparation for Certificate i+1".
    fn prepare_for_next_certificate(
        &mut self,
        cert: &'p ParsedCertificate<'a>,
        key_purpose: KeyPurpose,
        errors: &mut ErrorSet,
    ) {
        // Steps a and b.
        self.verify_policy_mappings(cert, errors);

        // Steps c through f.
        self.working_normalized_issuer_name = cert.normalized_subject();
        self.working_public_key = self.parse_and_check_public_key(cert.tbs().spki_tlv, errors);

        // Step g.
        if let Some(name_constraints) = cert.name_constraints() {
            self.name_constraints_list.push(name_constraints);
        }

        // Step h.
        if !is_self_issued(cert) {
            self.explicit_policy = self.explicit_policy.saturating_sub(1);
            self.policy_mapping = self.policy_mapping.saturating_sub(1);
            self.inhibit_any_policy = self.inhibit_any_policy.saturating_sub(1);
        }

        // Steps i and j.
        self.apply_policy_constraints(cert);

        // Step k. Non-v3 intermediates are implicitly rejected here
        // since they cannot carry a basicConstraints extension.
        match cert.basic_constraints() {
            None => errors.add_error(ErrorId::MissingBasicConstraints),
            Some(basic_constraints) => {
                if !basic_constraints.is_ca {
                    errors.add_error(ErrorId::BasicConstraintsIndicatesNotCa);
                }
            }
        }

        // Step l.
        if !is_self_issued(cert) {
            if self.max_path_length == 0 {
                errors.add_error(ErrorId::MaxPathLengthViolated);
            } else {
                self.max_path_length -= 1;
            }
        }

        // Step m.
        if let Some(path_len) = cert.basic_constraints().and_then(|bc| bc.path_len) {
            self.max_path_length = self.max_path_length.min(usize::from(path_len));
        }

        // Step n.
        if cert
            .key_usage()
            .is_some_and(|key_usage| !key_usage.asserts_bit(key_usage_bits::KEY_CERT_SIGN))
        {
            errors.add_error(ErrorId::KeyCertSignBitNotSet);
        }

        // Step o.
        verify_no_unconsumed_critical_extensions(
            cert,
            errors,
            self.delegate.accept_pre_certificates(),
            key_purpose,
        );
    }

    /// RFC 5280 section 6.1.5, "Wrap-Up Procedure", for the target.
    fn wrap_up(
        &mut self,
        cert: &'p ParsedCertificate<'a>,
        required_key_purpose: KeyPurpose,
        user_initial_policy_set: &BTreeSet<&'a [u8]>,
        allow_precertificate: bool,
        errors: &mut ErrorSet,
    ) {
        // Step a.
        self.explicit_policy = self.explicit_policy.saturating_sub(1);

        // Step b.
        if cert
            .policy_constraints()
            .is_some_and(|constraints| constraints.require_explicit_policy == Some(0))
        {
            self.explicit_policy = 0;
        }

        // Steps c through e are omitted: the working public key is not
        // an output of this verifier.

        // Step f. Duplicates the check in prepare_for_next_certificate
        // so the procedure matches section 6.1 stage by stage.
        verify_no_unconsumed_critical_extensions(
            cert,
            errors,
            allow_precertificate,
            required_key_purpose,
        );

        // Step g, plus the deferred pruning.
        self.user_constrained_policy_set = self
            .valid_policy_graph
            .user_constrained_policy_set(user_initial_policy_set);

        if self.explicit_policy == 0 && self.user_constrained_policy_set.is_empty() {
            errors.add_error(ErrorId::NoValidPolicy);
        }

        // Not part of section 6.1.5, but implied by section 4.2.1.9 and
        // the Baseline Requirements.
        verify_target_cert_is_not_ca(cert, required_key_purpose, errors);

        // The other certificates' keys were checked by
        // prepare_for_next_certificate.
        self.parse_and_check_public_key(cert.tbs().spki_tlv, errors);
    }

    /// Enforces trust-anchor constraints in the style of RFC 5937. The
    /// constraints are whatever the anchor certificate itself encodes.
    fn apply_trust_anchor_constraints(
        &mut self,
        cert: &'p ParsedCertificate<'a>,
        required_key_purpose: KeyPurpose,
        errors: &mut ErrorSet,
    ) {
        // Policies are processed like an intermediate's (RFC 5280
        // section 6.1.3 step d) rather than intersected with the
        // user-initial set as RFC 5937 section 3.2 describes; chain
        // processing has subtly different semantics and is what other
        // verifiers do. Guarded on presence so an anchor without the
        // extension does not null out the graph.
        if cert.policy_oids().is_some() {
            self.verify_policies(cert, false, errors);
        }

        self.verify_policy_mappings(cert, errors);

        // Deviates from RFC 5937 section 3.2 again: the initial-*
        // inputs are booleans and cannot represent the skip counts these
        // extensions encode, so apply them directly.
        self.apply_policy_constraints(cert);

        if cert
            .key_usage()
            .is_some_and(|key_usage| !key_usage.asserts_bit(key_usage_bits::KEY_CERT_SIGN))
        {
            errors.add_error(ErrorId::KeyCertSignBitNotSet);
        }

        // Not in RFC 5937 or 5280; matches the EKU-as-constraint
        // handling applied to intermediates.
        verify_extended_key_usage(cert, required_key_purpose, errors, false, false);

        if let Some(name_constraints) = cert.name_constraints() {
            self.name_constraints_list.push(name_constraints);
        }

        if let Some(basic_constraints) = cert.basic_constraints() {
            // When basicConstraints is present, cA must be true, so a
            // certificate specifically marked as not-a-CA cannot be
            // promoted into one by trust settings.
            if !basic_constraints.is_ca {
                errors.add_error(ErrorId::BasicConstraintsIndicatesNotCa);
            }
            // RFC 5937 section 3.2: a pathLenConstraint on the anchor
            // seeds max_path_length.
            if let Some(path_len) = basic_constraints.path_len {
                self.max_path_length = usize::from(path_len);
            }
        }

        // RFC 5937 section 2: unrecognized critical extensions on a
        // constrained anchor reject the path.
        verify_no_unconsumed_critical_extensions(cert, errors, false, required_key_purpose);
    }

    /// Processes the chain's final certificate under its trust
    /// decision. Returns whether verification must stop.
    fn process_root_certificate(
        &mut self,
        cert: &'p ParsedCertificate<'a>,
        trust: &CertificateTrust,
        time: GeneralizedTime,
        required_key_purpose: KeyPurpose,
        errors: &mut ErrorSet,
    ) -> bool {
        match trust.trust_type {
            TrustType::Unspecified | TrustType::TrustedLeaf => {
                // Does not chain to a trust anchor: implicitly
                // distrusted.
                errors.add_error(ErrorId::CertIsNotTrustAnchor);
                return true;
            }
            TrustType::Distrusted => {
                errors.add_error(ErrorId::DistrustedByTrustStore);
                return true;
            }
            TrustType::TrustedAnchor | TrustType::TrustedAnchorOrLeaf => {}
        }

        if trust.enforce_anchor_expiry {
            verify_time_validity(cert, time, errors);
        }
        if trust.enforce_anchor_constraints {
            if trust.require_anchor_basic_constraints
                && cert.basic_constraints().is_none()
                && cert.version() == Version::V3
            {
                errors.add_error(ErrorId::MissingBasicConstraints);
            }
            self.apply_trust_anchor_constraints(cert, required_key_purpose, errors);
        }

        // The anchor's SPKI and subject seed the working state.
        self.working_public_key = self.parse_and_check_public_key(cert.tbs().spki_tlv, errors);
        self.working_normalized_issuer_name = cert.normalized_subject();
        false
    }

    /// Verification of a chain that is a single certificate. Not
    /// defined by any standard; this matches the de-facto behavior of
    /// platform verifiers.
    fn process_single_cert_chain(
        &mut self,
        cert: &'p ParsedCertificate<'a>,
        trust: &CertificateTrust,
        time: GeneralizedTime,
        required_key_purpose: KeyPurpose,
        errors: &mut ErrorSet,
    ) {
        match trust.trust_type {
            TrustType::Unspecified | TrustType::TrustedAnchor => {
                // No chain and not a directly trusted leaf.
                errors.add_error(ErrorId::CertIsNotTrustAnchor);
                return;
            }
            TrustType::Distrusted => {
                errors.add_error(ErrorId::DistrustedByTrustStore);
                return;
            }
            TrustType::TrustedLeaf | TrustType::TrustedAnchorOrLeaf => {}
        }

        // Check the key whether or not a self-signature is required, to
        // keep the is_public_key_acceptable contract uniform with
        // wrap_up.
        self.parse_and_check_public_key(cert.tbs().spki_tlv, errors);

        if trust.require_leaf_selfsigned {
            if !verify_certificate_is_self_signed(cert, self.delegate, errors) {
                if !errors.contains_any_error_with_severity(Severity::High) {
                    errors.add_error(ErrorId::InternalError);
                }
                return;
            }
        }

        verify_time_validity(cert, time, errors);
        verify_extended_key_usage(cert, required_key_purpose, errors, true, false);

        // Rejecting unknown critical extensions on a trusted leaf
        // matches the stricter of the platform verifiers.
        verify_no_unconsumed_critical_extensions(cert, errors, false, required_key_purpose);
    }

    #[allow(clippy::too_many_arguments)]
    fn run(
        &mut self,
        certs: &'p [ParsedCertificate<'a>],
        last_cert_trust: &CertificateTrust,
        time: GeneralizedTime,
        required_key_purpose: KeyPurpose,
        initial_explicit_policy: bool,
        user_initial_policy_set: &BTreeSet<&'a [u8]>,
        initial_policy_mapping_inhibit: bool,
        initial_any_policy_inhibit: bool,
        errors: &mut PathErrors,
    ) {
        if certs.is_empty() {
            errors.other_errors_mut().add_error(ErrorId::ChainIsEmpty);
            return;
        }

        // A directly trusted leaf is not an RFC 5280 operation; handle
        // it apart from the section 6.1 machinery.
        if certs.len() == 1 {
            self.process_single_cert_chain(
                &certs[0],
                last_cert_trust,
                time,
                required_key_purpose,
                errors.errors_for_cert_mut(0),
            );
            return;
        }

        // RFC 5280's "n" is the path length excluding the anchor.
        let n = certs.len() - 1;

        self.valid_policy_graph.init();

        // Section 6.1.2: each policy counter starts at 0 when its
        // initial-* input is set, and n+1 otherwise; max_path_length
        // starts at n.
        self.explicit_policy = if initial_explicit_policy { 0 } else { n + 1 };
        self.inhibit_any_policy = if initial_any_policy_inhibit { 0 } else { n + 1 };
        self.policy_mapping = if initial_policy_mapping_inhibit { 0 } else { n + 1 };
        self.max_path_length = n;

        // Iterate from the root toward the target certificate.
        for i in 0..certs.len() {
            let index_into_certs = certs.len() - i - 1;
            // The target is not necessarily an end-entity certificate.
            let is_target_cert = index_into_certs == 0;
            let is_target_cert_issuer = index_into_certs == 1;
            let is_root_cert = i == 0;

            let cert = &certs[index_into_certs];
            let cert_errors = errors.errors_for_cert_mut(index_into_certs);

            if is_root_cert {
                if self.process_root_certificate(
                    cert,
                    last_cert_trust,
                    time,
                    required_key_purpose,
                    cert_errors,
                ) {
                    // A chain that does not start from a trusted root
                    // short-circuits: further errors against untrusted
                    // certificates would not be meaningful.
                    return;
                }
                continue;
            }

            if self.basic_certificate_processing(
                cert,
                is_target_cert,
                is_target_cert_issuer,
                time,
                required_key_purpose,
                cert_errors,
            ) {
                // Signature failures and unparseable SPKIs also
                // short-circuit.
                return;
            }

            if !is_target_cert {
                self.prepare_for_next_certificate(cert, required_key_purpose, cert_errors);
            } else {
                self.wrap_up(
                    cert,
                    required_key_purpose,
                    user_initial_policy_set,
                    self.delegate.accept_pre_certificates(),
                    cert_errors,
                );
            }
        }
    }
}

/// Verifies an ordered certification path.
///
/// `certs` runs from the target at index 0 to the chain's last
/// certificate, whose `last_cert_trust` decides whether it may anchor
/// the chain. Verification is exhaustive: every problem found lands in
/// the returned [`PathErrors`] (except after short-circuit conditions,
/// where further diagnoses would be unsound), and the caller decides
/// acceptance with
/// [`PathErrors::contains_high_severity_errors`]. The first returned
/// value is the user-constrained policy set: the certificate policies
/// valid for the whole path, intersected with
/// `user_initial_policy_set`.
#[allow(clippy::too_many_arguments)]
pub fn verify_certificate_chain<'a>(
    certs: &[ParsedCertificate<'a>],
    last_cert_trust: &CertificateTrust,
    delegate: &dyn Delegate,
    time: GeneralizedTime,
    required_key_purpose: KeyPurpose,
    initial_explicit_policy: bool,
    user_initial_policy_set: &BTreeSet<&'a [u8]>,
    initial_policy_mapping_inhibit: bool,
    initial_any_policy_inhibit: bool,
) -> (BTreeSet<&'a [u8]>, PathErrors) {
    let mut errors = PathErrors::new();
    let mut verifier = PathVerifier {
        delegate,
        valid_policy_graph: ValidPolicyGraph::default(),
        user_constrained_policy_set: BTreeSet::new(),
        name_constraints_list: Vec::new(),
        explicit_policy: 0,
        inhibit_any_policy: 0,
        policy_mapping: 0,
        working_public_key: None,
        working_normalized_issuer_name: &[],
        max_path_length: 0,
    };
    verifier.run(
        certs,
        last_cert_trust,
        time,
        required_key_purpose,
        initial_explicit_policy,
        user_initial_policy_set,
        initial_policy_mapping_inhibit,
        initial_any_policy_inhibit,
        &mut errors,
    );
    (verifier.user_constrained_policy_set, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::ParseOptions;
    use crate::testutil::{CertBuilder, tlv};
    use crate::types::time::parse_generalized_time;
    use pretty_assertions::assert_eq;

    struct TestDelegate {
        fail_signatures: bool,
        reject_algorithms: bool,
        accept_pre_certificates: bool,
    }

    impl Default for TestDelegate {
        fn default() -> Self {
            Self {
                fail_signatures: false,
                reject_algorithms: false,
                accept_pre_certificates: false,
            }
        }
    }

    impl Delegate for TestDelegate {
        fn is_signature_algorithm_acceptable(
            &self,
            _algorithm_tlv: &[u8],
            _errors: &mut ErrorSet,
        ) -> bool {
            !self.reject_algorithms
        }

        fn is_public_key_acceptable(&self, _spki_tlv: &[u8], _errors: &mut ErrorSet) -> bool {
            true
        }

        fn verify_signed_data(
            &self,
            _algorithm_tlv: &[u8],
            _signed_data: &[u8],
            _signature: &crate::types::BitString,
            _spki_tlv: &[u8],
        ) -> bool {
            !self.fail_signatures
        }

        fn accept_pre_certificates(&self) -> bool {
            self.accept_pre_certificates
        }
    }

    fn parse_all<'a>(ders: &'a [Vec<u8>]) -> Vec<ParsedCertificate<'a>> {
        ders.iter()
            .map(|der| {
                let mut errors = ErrorSet::new();
                ParsedCertificate::create(der, &ParseOptions::default(), &mut errors)
                    .unwrap_or_else(|| panic!("test certificate failed to parse:\n{errors}"))
            })
            .collect()
    }

    fn noon_2024() -> GeneralizedTime {
        parse_generalized_time(b"20240615120000Z").unwrap()
    }

    fn verify<'a>(
        certs: &[ParsedCertificate<'a>],
        trust: &CertificateTrust,
        delegate: &dyn Delegate,
        purpose: KeyPurpose,
    ) -> (BTreeSet<&'a [u8]>, PathErrors) {
        verify_certificate_chain(
            certs,
            trust,
            delegate,
            noon_2024(),
            purpose,
            false,
            &BTreeSet::new(),
            false,
            false,
        )
    }

    /// target <- intermediate <- root, all plumbing valid.
    fn basic_chain() -> Vec<Vec<u8>> {
        alloc::vec![
            CertBuilder::new("leaf.example.com", "Intermediate")
                .san_dns(&["example.com"])
                .eku(&[oid::SERVER_AUTH])
                .build(),
            CertBuilder::new("Intermediate", "Root")
                .basic_constraints(true, None)
                .build(),
            CertBuilder::new("Root", "Root")
                .basic_constraints(true, None)
                .build(),
        ]
    }

    #[test]
    fn basic_chain_verifies() {
        let ders = basic_chain();
        let certs = parse_all(&ders);
        let (policies, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(
            !errors.contains_high_severity_errors(),
            "unexpected errors:\n{errors}"
        );
        assert!(policies.is_empty());
        assert!(!errors.contains_error(ErrorId::NoValidPolicy));
    }

    #[test]
    fn empty_chain_is_an_error() {
        let (_, errors) = verify(
            &[],
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(errors.other_errors().contains(ErrorId::ChainIsEmpty));
    }

    #[test]
    fn untrusted_root_short_circuits() {
        let ders = basic_chain();
        let certs = parse_all(&ders);
        for trust in [
            CertificateTrust::unspecified(),
            CertificateTrust::trusted_leaf(),
        ] {
            let (_, errors) = verify(
                &certs,
                &trust,
                &TestDelegate::default(),
                KeyPurpose::ServerAuth,
            );
            assert!(
                errors.errors_for_cert(2).unwrap().contains(ErrorId::CertIsNotTrustAnchor)
            );
            // No further diagnostics accumulate on the untrusted chain.
            assert!(errors.errors_for_cert(0).is_none_or(ErrorSet::is_empty));
            assert!(errors.errors_for_cert(1).is_none_or(ErrorSet::is_empty));
        }
    }

    #[test]
    fn distrusted_root_is_reported() {
        let ders = basic_chain();
        let certs = parse_all(&ders);
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::distrusted(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(errors.contains_error(ErrorId::DistrustedByTrustStore));
    }

    #[test]
    fn signature_failure_short_circuits() {
        let ders = basic_chain();
        let certs = parse_all(&ders);
        let delegate = TestDelegate {
            fail_signatures: true,
            ..TestDelegate::default()
        };
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &delegate,
            KeyPurpose::ServerAuth,
        );
        // The intermediate is the first signature checked.
        assert!(
            errors.errors_for_cert(1).unwrap().contains(ErrorId::VerifySignedDataFailed)
        );
        assert!(errors.errors_for_cert(0).is_none_or(ErrorSet::is_empty));
    }

    #[test]
    fn rejected_algorithm_short_circuits() {
        let ders = basic_chain();
        let certs = parse_all(&ders);
        let delegate = TestDelegate {
            reject_algorithms: true,
            ..TestDelegate::default()
        };
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &delegate,
            KeyPurpose::ServerAuth,
        );
        assert!(errors.contains_error(ErrorId::UnacceptableSignatureAlgorithm));
        assert!(errors.errors_for_cert(0).is_none_or(ErrorSet::is_empty));
    }

    #[test]
    fn expired_target_is_reported() {
        let mut ders = basic_chain();
        ders[0] = CertBuilder::new("leaf.example.com", "Intermediate")
            .validity(b"200101000000Z", b"210101000000Z")
            .build();
        let certs = parse_all(&ders);
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(
            errors.errors_for_cert(0).unwrap().contains(ErrorId::ValidityFailedNotAfter)
        );
    }

    #[test]
    fn issuer_name_mismatch_is_reported() {
        let mut ders = basic_chain();
        ders[0] = CertBuilder::new("leaf.example.com", "SomeoneElse").build();
        let certs = parse_all(&ders);
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(
            errors.errors_for_cert(0).unwrap().contains(ErrorId::SubjectDoesNotMatchIssuer)
        );
    }

    #[test]
    fn intermediate_needs_ca_basic_constraints() {
        let mut ders = basic_chain();
        ders[1] = CertBuilder::new("Intermediate", "Root").build();
        let certs = parse_all(&ders);
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(
            errors.errors_for_cert(1).unwrap().contains(ErrorId::MissingBasicConstraints)
        );

        let mut ders = basic_chain();
        ders[1] = CertBuilder::new("Intermediate", "Root")
            .basic_constraints(false, None)
            .build();
        let certs = parse_all(&ders);
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(
            errors
                .errors_for_cert(1)
                .unwrap()
                .contains(ErrorId::BasicConstraintsIndicatesNotCa)
        );
    }

    #[test]
    fn path_length_constraint_is_enforced() {
        let ders = alloc::vec![
            CertBuilder::new("leaf.example.com", "Int2").build(),
            CertBuilder::new("Int2", "Int1").basic_constraints(true, None).build(),
            CertBuilder::new("Int1", "Root")
                .basic_constraints(true, Some(0))
                .build(),
            CertBuilder::new("Root", "Root").basic_constraints(true, None).build(),
        ];
        let certs = parse_all(&ders);
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(
            errors.errors_for_cert(1).unwrap().contains(ErrorId::MaxPathLengthViolated)
        );
    }

    #[test]
    fn key_cert_sign_is_required_when_key_usage_present() {
        let mut ders = basic_chain();
        // digitalSignature only.
        ders[1] = CertBuilder::new("Intermediate", "Root")
            .basic_constraints(true, None)
            .key_usage(&[0x07, 0x80])
            .build();
        let certs = parse_all(&ders);
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(
            errors.errors_for_cert(1).unwrap().contains(ErrorId::KeyCertSignBitNotSet)
        );

        // keyCertSign asserted: fine.
        let mut ders = basic_chain();
        ders[1] = CertBuilder::new("Intermediate", "Root")
            .basic_constraints(true, None)
            .key_usage(&[0x02, 0x04])
            .build();
        let certs = parse_all(&ders);
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(!errors.contains_high_severity_errors(), "{errors}");
    }

    #[test]
    fn strict_server_auth_requires_server_auth_eku() {
        let mut ders = basic_chain();
        ders[0] = CertBuilder::new("leaf.example.com", "Intermediate")
            .eku(&[oid::CLIENT_AUTH])
            .build();
        let certs = parse_all(&ders);
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuthStrict,
        );
        assert!(errors.errors_for_cert(0).unwrap().contains(ErrorId::EkuLacksServerAuth));
    }

    #[test]
    fn any_eku_does_not_substitute_on_the_target() {
        let mut ders = basic_chain();
        ders[0] = CertBuilder::new("leaf.example.com", "Intermediate")
            .eku(&[oid::ANY_EKU])
            .build();
        let certs = parse_all(&ders);

        // Strict: rejected.
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuthStrict,
        );
        assert!(errors.errors_for_cert(0).unwrap().contains(ErrorId::EkuLacksServerAuth));
        assert!(
            errors
                .errors_for_cert(0)
                .unwrap()
                .contains(ErrorId::EkuLacksServerAuthButHasAnyEku)
        );

        // Legacy: accepted with a warning.
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(!errors.contains_high_severity_errors(), "{errors}");
        assert!(
            errors
                .errors_for_cert(0)
                .unwrap()
                .contains(ErrorId::EkuLacksServerAuthButHasAnyEku)
        );
    }

    #[test]
    fn prohibited_ekus_warn_or_fail_by_strictness() {
        let mut ders = basic_chain();
        ders[0] = CertBuilder::new("leaf.example.com", "Intermediate")
            .eku(&[oid::SERVER_AUTH, oid::CODE_SIGNING])
            .build();
        let certs = parse_all(&ders);

        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(!errors.contains_high_severity_errors(), "{errors}");
        assert!(
            errors
                .errors_for_cert(0)
                .unwrap()
                .contains(ErrorId::EkuHasProhibitedCodeSigning)
        );

        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuthStrict,
        );
        assert!(errors.contains_high_severity_errors());
    }

    #[test]
    fn strict_leaf_variant_only_tightens_the_target() {
        // An EKU-less intermediate above the target issuer: plain
        // strict demands serverAuth everywhere, strict-leaf only at the
        // target.
        let ders = alloc::vec![
            CertBuilder::new("leaf.example.com", "Int2")
                .eku(&[oid::SERVER_AUTH])
                .build(),
            CertBuilder::new("Int2", "Int1").basic_constraints(true, None).build(),
            CertBuilder::new("Int1", "Root").basic_constraints(true, None).build(),
            CertBuilder::new("Root", "Root").basic_constraints(true, None).build(),
        ];
        let certs = parse_all(&ders);

        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuthStrict,
        );
        assert!(errors.errors_for_cert(2).unwrap().contains(ErrorId::EkuLacksServerAuth));

        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuthStrictLeaf,
        );
        assert!(!errors.contains_high_severity_errors(), "{errors}");

        // But a target without serverAuth still fails.
        let mut ders = basic_chain();
        ders[0] = CertBuilder::new("leaf.example.com", "Intermediate")
            .eku(&[oid::CLIENT_AUTH])
            .build();
        let certs = parse_all(&ders);
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuthStrictLeaf,
        );
        assert!(errors.errors_for_cert(0).unwrap().contains(ErrorId::EkuLacksServerAuth));
    }

    #[test]
    fn target_with_ca_bit_warns_then_fails_by_strictness() {
        let mut ders = basic_chain();
        ders[0] = CertBuilder::new("leaf.example.com", "Intermediate")
            .basic_constraints(true, None)
            .eku(&[oid::SERVER_AUTH])
            .build();
        let certs = parse_all(&ders);

        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(errors.contains_error(ErrorId::TargetCertShouldNotBeCa));
        assert!(!errors.contains_high_severity_errors(), "{errors}");

        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuthStrict,
        );
        assert!(errors.contains_error(ErrorId::TargetCertShouldNotBeCa));
        assert!(errors.contains_high_severity_errors());
    }

    #[test]
    fn rcs_mls_client_requires_exact_key_usage() {
        let root = CertBuilder::new("Root", "Root").basic_constraints(true, None).build();
        // digitalSignature plus keyEncipherment: too broad.
        let bad = CertBuilder::new("mls-client", "Root")
            .eku(&[oid::RCS_MLS_CLIENT])
            .key_usage(&[0x05, 0xa0])
            .build();
        let ders = alloc::vec![bad, root.clone()];
        let certs = parse_all(&ders);
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::RcsMlsClientAuth,
        );
        assert!(
            errors
                .errors_for_cert(0)
                .unwrap()
                .contains(ErrorId::KeyUsageIncorrectForRcsMlsClient)
        );

        // Exactly digitalSignature: accepted.
        let good = CertBuilder::new("mls-client", "Root")
            .eku(&[oid::RCS_MLS_CLIENT])
            .key_usage(&[0x07, 0x80])
            .build();
        let ders = alloc::vec![good, root];
        let certs = parse_all(&ders);
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::RcsMlsClientAuth,
        );
        assert!(!errors.contains_high_severity_errors(), "{errors}");
    }

    #[test]
    fn rcs_mls_client_requires_exactly_one_eku() {
        let mut ders = basic_chain();
        ders[0] = CertBuilder::new("leaf", "Intermediate")
            .eku(&[oid::RCS_MLS_CLIENT, oid::CLIENT_AUTH])
            .key_usage(&[0x07, 0x80])
            .build();
        let certs = parse_all(&ders);
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::RcsMlsClientAuth,
        );
        assert!(
            errors
                .errors_for_cert(0)
                .unwrap()
                .contains(ErrorId::EkuIncorrectForRcsMlsClient)
        );
        // The EKU-less intermediate is also called out in this mode.
        assert!(errors.errors_for_cert(1).unwrap().contains(ErrorId::EkuNotPresent));
    }

    #[test]
    fn name_constraints_flow_from_issuer_to_target() {
        let constraints = tlv(0x30, &tlv(0xa0, &tlv(0x30, &tlv(0x82, b"example.com"))));
        let mut ders = basic_chain();
        ders[1] = CertBuilder::new("Intermediate", "Root")
            .basic_constraints(true, None)
            .extension(oid::NAME_CONSTRAINTS, true, &constraints)
            .build();
        ders[0] = CertBuilder::new("leaf.example.com", "Intermediate")
            .san_dns(&["other.org"])
            .build();
        let certs = parse_all(&ders);
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(
            errors
                .errors_for_cert(0)
                .unwrap()
                .contains(ErrorId::NotPermittedByNameConstraints)
        );

        // A SAN inside the permitted subtree passes.
        ders[0] = CertBuilder::new("leaf.example.com", "Intermediate")
            .san_dns(&["www.example.com"])
            .build();
        let certs = parse_all(&ders);
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(!errors.contains_high_severity_errors(), "{errors}");
    }

    #[test]
    fn unconsumed_critical_extension_is_rejected() {
        let unknown_oid = [0x2a, 0x03, 0x07];
        let mut ders = basic_chain();
        ders[1] = CertBuilder::new("Intermediate", "Root")
            .basic_constraints(true, None)
            .extension(&unknown_oid, true, &tlv(0x04, b"opaque"))
            .build();
        let certs = parse_all(&ders);
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(
            errors
                .errors_for_cert(1)
                .unwrap()
                .contains(ErrorId::UnconsumedCriticalExtension)
        );

        // Non-critical unknown extensions are ignored.
        let mut ders = basic_chain();
        ders[1] = CertBuilder::new("Intermediate", "Root")
            .basic_constraints(true, None)
            .extension(&unknown_oid, false, &tlv(0x04, b"opaque"))
            .build();
        let certs = parse_all(&ders);
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(!errors.contains_high_severity_errors(), "{errors}");
    }

    #[test]
    fn ct_poison_is_gated_on_the_delegate() {
        let mut ders = basic_chain();
        ders[0] = CertBuilder::new("leaf.example.com", "Intermediate")
            .extension(oid::CT_POISON, true, &[0x05, 0x00])
            .build();
        let certs = parse_all(&ders);

        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(errors.contains_error(ErrorId::UnconsumedCriticalExtension));

        let delegate = TestDelegate {
            accept_pre_certificates: true,
            ..TestDelegate::default()
        };
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &delegate,
            KeyPurpose::ServerAuth,
        );
        assert!(!errors.contains_high_severity_errors(), "{errors}");
    }

    #[test]
    fn anchor_expiry_and_constraints_are_opt_in() {
        let mut ders = basic_chain();
        ders[2] = CertBuilder::new("Root", "Root")
            .validity(b"200101000000Z", b"210101000000Z")
            .basic_constraints(true, None)
            .build();
        let certs = parse_all(&ders);

        // By default an expired anchor is fine.
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(!errors.contains_high_severity_errors(), "{errors}");

        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor().with_enforce_anchor_expiry(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(
            errors.errors_for_cert(2).unwrap().contains(ErrorId::ValidityFailedNotAfter)
        );
    }

    #[test]
    fn anchor_constraints_enforce_basic_constraints_and_path_len() {
        // An anchor explicitly marked not-a-CA.
        let mut ders = basic_chain();
        ders[2] = CertBuilder::new("Root", "Root")
            .basic_constraints(false, None)
            .build();
        let certs = parse_all(&ders);
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor().with_enforce_anchor_constraints(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(
            errors
                .errors_for_cert(2)
                .unwrap()
                .contains(ErrorId::BasicConstraintsIndicatesNotCa)
        );

        // An anchor pathLen of 0 leaves no room for the intermediate.
        let mut ders = basic_chain();
        ders[2] = CertBuilder::new("Root", "Root")
            .basic_constraints(true, Some(0))
            .build();
        let certs = parse_all(&ders);
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor().with_enforce_anchor_constraints(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(
            errors.errors_for_cert(1).unwrap().contains(ErrorId::MaxPathLengthViolated)
        );

        // A v3 anchor without basicConstraints, when required.
        let mut ders = basic_chain();
        ders[2] = CertBuilder::new("Root", "Root").build();
        let certs = parse_all(&ders);
        let trust = CertificateTrust::trusted_anchor()
            .with_enforce_anchor_constraints()
            .with_require_anchor_basic_constraints();
        let (_, errors) = verify(
            &certs,
            &trust,
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(
            errors.errors_for_cert(2).unwrap().contains(ErrorId::MissingBasicConstraints)
        );
    }

    #[test]
    fn anchor_name_constraints_apply_when_enforced() {
        let constraints = tlv(0x30, &tlv(0xa0, &tlv(0x30, &tlv(0x82, b"example.com"))));
        let mut ders = basic_chain();
        ders[2] = CertBuilder::new("Root", "Root")
            .basic_constraints(true, None)
            .extension(oid::NAME_CONSTRAINTS, true, &constraints)
            .build();
        ders[0] = CertBuilder::new("leaf.example.com", "Intermediate")
            .san_dns(&["other.org"])
            .build();
        let certs = parse_all(&ders);

        let trust = CertificateTrust::trusted_anchor().with_enforce_anchor_constraints();
        let (_, errors) = verify(
            &certs,
            &trust,
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(errors.contains_error(ErrorId::NotPermittedByNameConstraints));

        // Without enforcement the same chain passes.
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(!errors.contains_high_severity_errors(), "{errors}");
    }

    #[test]
    fn policies_propagate_into_the_user_constrained_set() {
        const P1: &[u8] = &[0x2a, 0x01];
        let ders = alloc::vec![
            CertBuilder::new("leaf.example.com", "Intermediate")
                .policies(&[P1])
                .build(),
            CertBuilder::new("Intermediate", "Root")
                .basic_constraints(true, None)
                .policies(&[P1])
                .build(),
            CertBuilder::new("Root", "Root").basic_constraints(true, None).build(),
        ];
        let certs = parse_all(&ders);
        let user_set: BTreeSet<&[u8]> = BTreeSet::from([P1]);
        let (policies, errors) = verify_certificate_chain(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            noon_2024(),
            KeyPurpose::ServerAuth,
            false,
            &user_set,
            false,
            false,
        );
        assert!(!errors.contains_high_severity_errors(), "{errors}");
        assert_eq!(policies, user_set);
    }

    #[test]
    fn inhibited_any_policy_yields_no_valid_policy() {
        let ders = alloc::vec![
            CertBuilder::new("leaf.example.com", "Intermediate")
                .policies(&[oid::ANY_POLICY])
                .build(),
            CertBuilder::new("Intermediate", "Root")
                .basic_constraints(true, None)
                .policies(&[oid::ANY_POLICY])
                .build(),
            CertBuilder::new("Root", "Root")
                .basic_constraints(true, None)
                .policies(&[oid::ANY_POLICY])
                .build(),
        ];
        let certs = parse_all(&ders);
        const P1: &[u8] = &[0x2a, 0x01];
        let user_set: BTreeSet<&[u8]> = BTreeSet::from([P1]);
        let (policies, errors) = verify_certificate_chain(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            noon_2024(),
            KeyPurpose::ServerAuth,
            true,
            &user_set,
            false,
            true,
        );
        assert!(errors.contains_error(ErrorId::NoValidPolicy));
        assert!(policies.is_empty());
    }

    #[test]
    fn policy_mapping_of_any_policy_is_rejected() {
        let mapping = {
            let mut pair = tlv(0x06, oid::ANY_POLICY);
            pair.extend_from_slice(&tlv(0x06, &[0x2a, 0x01]));
            tlv(0x30, &tlv(0x30, &pair))
        };
        let mut ders = basic_chain();
        ders[1] = CertBuilder::new("Intermediate", "Root")
            .basic_constraints(true, None)
            .policies(&[oid::ANY_POLICY])
            .extension(oid::POLICY_MAPPINGS, true, &mapping)
            .build();
        let certs = parse_all(&ders);
        let (policies, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(errors.contains_error(ErrorId::PolicyMappingAnyPolicy));
        assert!(policies.is_empty());
    }

    #[test]
    fn single_certificate_requires_leaf_trust() {
        let ders = alloc::vec![CertBuilder::new("Self", "Self").build()];
        let certs = parse_all(&ders);

        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(errors.errors_for_cert(0).unwrap().contains(ErrorId::CertIsNotTrustAnchor));

        for trust in [
            CertificateTrust::trusted_leaf(),
            CertificateTrust::trusted_anchor_or_leaf(),
        ] {
            let (_, errors) = verify(
                &certs,
                &trust,
                &TestDelegate::default(),
                KeyPurpose::ServerAuth,
            );
            assert!(!errors.contains_high_severity_errors(), "{errors}");
        }
    }

    #[test]
    fn trusted_leaf_selfsigned_requirement() {
        // Subject != issuer: cannot be self-signed.
        let ders = alloc::vec![CertBuilder::new("Leaf", "Issuer").build()];
        let certs = parse_all(&ders);
        let trust = CertificateTrust::trusted_leaf().with_require_leaf_selfsigned();
        let (_, errors) = verify(
            &certs,
            &trust,
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(
            errors.errors_for_cert(0).unwrap().contains(ErrorId::SubjectDoesNotMatchIssuer)
        );

        // Self-issued and the delegate verifies the signature.
        let ders = alloc::vec![CertBuilder::new("Self", "Self").build()];
        let certs = parse_all(&ders);
        let (_, errors) = verify(
            &certs,
            &trust,
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(!errors.contains_high_severity_errors(), "{errors}");

        // Self-issued but the signature does not verify.
        let delegate = TestDelegate {
            fail_signatures: true,
            ..TestDelegate::default()
        };
        let (_, errors) = verify(&certs, &trust, &delegate, KeyPurpose::ServerAuth);
        assert!(
            errors.errors_for_cert(0).unwrap().contains(ErrorId::VerifySignedDataFailed)
        );
    }

    #[test]
    fn self_issued_intermediate_skips_path_length_decrement() {
        // A self-issued certificate (key rollover) does not consume
        // path length.
        let ders = alloc::vec![
            CertBuilder::new("leaf.example.com", "Int").build(),
            CertBuilder::new("Int", "Int").basic_constraints(true, None).build(),
            CertBuilder::new("Int", "Root")
                .basic_constraints(true, Some(0))
                .build(),
            CertBuilder::new("Root", "Root").basic_constraints(true, None).build(),
        ];
        let certs = parse_all(&ders);
        let (_, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(!errors.contains_high_severity_errors(), "{errors}");
    }

    #[test]
    fn require_explicit_policy_zero_forces_no_valid_policy() {
        // A target with requireExplicitPolicy = 0 and no certificate
        // policies anywhere in the chain.
        let policy_constraints = tlv(0x30, &tlv(0x80, &[0x00]));
        let mut ders = basic_chain();
        ders[0] = CertBuilder::new("leaf.example.com", "Intermediate")
            .extension(oid::POLICY_CONSTRAINTS, true, &policy_constraints)
            .build();
        let certs = parse_all(&ders);
        let (policies, errors) = verify(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            KeyPurpose::ServerAuth,
        );
        assert!(errors.errors_for_cert(0).unwrap().contains(ErrorId::NoValidPolicy));
        assert!(policies.is_empty());
    }

    #[test]
    fn policy_mappings_rewrite_the_policy_domain() {
        const P1: &[u8] = &[0x2a, 0x01];
        const P2: &[u8] = &[0x2a, 0x02];
        let mapping = {
            let mut pair = tlv(0x06, P1);
            pair.extend_from_slice(&tlv(0x06, P2));
            tlv(0x30, &tlv(0x30, &pair))
        };
        let ders = alloc::vec![
            CertBuilder::new("leaf.example.com", "Intermediate")
                .policies(&[P2])
                .build(),
            CertBuilder::new("Intermediate", "Root")
                .basic_constraints(true, None)
                .policies(&[P1])
                .extension(oid::POLICY_MAPPINGS, true, &mapping)
                .build(),
            CertBuilder::new("Root", "Root").basic_constraints(true, None).build(),
        ];
        let certs = parse_all(&ders);
        // The target's P2 chains through the mapping back to the
        // issuer-domain policy P1, which is what the caller sees.
        let user_set: BTreeSet<&[u8]> = BTreeSet::from([oid::ANY_POLICY]);
        let (policies, errors) = verify_certificate_chain(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            noon_2024(),
            KeyPurpose::ServerAuth,
            false,
            &user_set,
            false,
            false,
        );
        assert!(!errors.contains_high_severity_errors(), "{errors}");
        assert_eq!(policies, BTreeSet::from([P1]));
    }

    #[test]
    fn inhibited_policy_mapping_deletes_the_mapped_node() {
        const P1: &[u8] = &[0x2a, 0x01];
        const P2: &[u8] = &[0x2a, 0x02];
        let mapping = {
            let mut pair = tlv(0x06, P1);
            pair.extend_from_slice(&tlv(0x06, P2));
            tlv(0x30, &tlv(0x30, &pair))
        };
        let ders = alloc::vec![
            CertBuilder::new("leaf.example.com", "Intermediate")
                .policies(&[P2])
                .build(),
            CertBuilder::new("Intermediate", "Root")
                .basic_constraints(true, None)
                .policies(&[P1])
                .extension(oid::POLICY_MAPPINGS, true, &mapping)
                .build(),
            CertBuilder::new("Root", "Root").basic_constraints(true, None).build(),
        ];
        let certs = parse_all(&ders);
        let user_set: BTreeSet<&[u8]> = BTreeSet::from([oid::ANY_POLICY]);
        let (policies, errors) = verify_certificate_chain(
            &certs,
            &CertificateTrust::trusted_anchor(),
            &TestDelegate::default(),
            noon_2024(),
            KeyPurpose::ServerAuth,
            false,
            &user_set,
            // Inhibit policy mapping from the start: the mapping's
            // issuer policy is deleted instead of rewritten.
            true,
            false,
        );
        assert!(!errors.contains_high_severity_errors(), "{errors}");
        assert!(policies.is_empty());
    }

    #[test]
    fn self_signed_check_matches_normalized_names_and_signature() {
        let ders = alloc::vec![CertBuilder::new("Anchor", "ANCHOR").build()];
        let certs = parse_all(&ders);
        let mut errors = ErrorSet::new();
        // Case-folded names are equal; delegate accepts the signature.
        assert!(verify_certificate_is_self_signed(
            &certs[0],
            &TestDelegate::default(),
            &mut errors
        ));

        let delegate = TestDelegate {
            fail_signatures: true,
            ..TestDelegate::default()
        };
        let mut errors = ErrorSet::new();
        assert!(!verify_certificate_is_self_signed(
            &certs[0],
            &delegate,
            &mut errors
        ));
        assert!(errors.contains(ErrorId::VerifySignedDataFailed));
    }
}

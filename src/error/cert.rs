//! Certificate diagnostics.
//!
//! Certificate processing never stops at the first problem: parsing and
//! path verification accumulate everything they find into an [`ErrorSet`]
//! (or, for a whole chain, a [`PathErrors`]) and the caller decides
//! acceptance by querying for high-severity entries. Identities are a
//! closed enumeration so that callers can match on them programmatically,
//! with a human-readable message kept alongside for display.

use alloc::{string::String, vec::Vec};

/// How severe an accumulated diagnostic is.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Severity {
    /// Advisory; does not invalidate the chain.
    Warning,
    /// Fatal to trust of the chain.
    High,
}

macro_rules! error_ids {
    ($($(#[$doc:meta])* $variant:ident => $message:expr),+ $(,)?) => {
        /// The closed enumeration of stable error identities.
        ///
        /// The variant name is the stable identifier (also returned by
        /// [`ErrorId::name`]); the `Display` impl renders the
        /// human-readable message.
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
        pub enum ErrorId {
            $($(#[$doc])* $variant),+
        }

        impl ErrorId {
            /// The stable identifier, e.g. `"ChainIsEmpty"`.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),+
                }
            }

            /// The human-readable message, e.g. `"Chain is empty"`.
            pub const fn message(self) -> &'static str {
                match self {
                    $(Self::$variant => $message),+
                }
            }
        }
    }
}

error_ids! {
    /// An unexpected state was reached; indicates a bug in this crate.
    InternalError => "Internal error",

    // Chain-level and trust decisions.
    ChainIsEmpty => "Chain is empty",
    CertIsNotTrustAnchor => "Certificate is not a trust anchor",
    DistrustedByTrustStore => "Distrusted by trust store",

    // Basic certificate processing.
    ValidityFailedNotBefore => "Time is before notBefore",
    ValidityFailedNotAfter => "Time is after notAfter",
    SubjectDoesNotMatchIssuer => "Subject does not match issuer",
    VerifySignedDataFailed => "VerifySignedData failed",
    UnacceptableSignatureAlgorithm => "Unacceptable signature algorithm",
    UnacceptablePublicKey => "Unacceptable public key",
    SignatureAlgorithmMismatch =>
        "Certificate.signatureAlgorithm does not match TBSCertificate.signature",
    SignatureAlgorithmsDifferentEncoding =>
        "Certificate.signatureAlgorithm is encoded differently than \
         TBSCertificate.signature",
    FailedParsingSpki => "Couldn't parse SubjectPublicKeyInfo",

    // Intermediate and anchor constraints.
    MissingBasicConstraints => "Does not have basic constraints (required for CA certificates)",
    BasicConstraintsIndicatesNotCa => "Basic constraints indicates not a CA",
    TargetCertShouldNotBeCa => "Certificate looks like a CA but is used as an end-entity",
    MaxPathLengthViolated => "max_path_length reached",
    KeyCertSignBitNotSet => "keyCertSign bit is not set",
    UnconsumedCriticalExtension => "Unconsumed critical extension",

    // Name constraints.
    NotPermittedByNameConstraints => "Not permitted by name constraints",
    TooManyNameConstraintChecks => "Too many name constraints checks",

    // Policy processing.
    NoValidPolicy => "No valid policy",
    PolicyMappingAnyPolicy => "PolicyMappings must not map anyPolicy",

    // Extended key usage.
    EkuLacksServerAuth => "The extended key usage does not include server auth",
    EkuLacksServerAuthButHasAnyEku =>
        "The extended key usage does not include server auth but includes anyExtendedKeyUsage",
    EkuLacksClientAuth => "The extended key usage does not include client auth",
    EkuLacksClientAuthButHasAnyEku =>
        "The extended key usage does not include client auth but includes anyExtendedKeyUsage",
    EkuHasProhibitedCodeSigning => "The extended key usage includes code signing",
    EkuHasProhibitedOcspSigning => "The extended key usage includes OCSP signing",
    EkuHasProhibitedTimeStamping => "The extended key usage includes time stamping",
    EkuNotPresent => "Certificate does not have extended key usage",
    EkuIncorrectForRcsMlsClient => "The extended key usage is incorrect for an RCS MLS client",
    KeyUsageIncorrectForRcsMlsClient => "The key usage is incorrect for an RCS MLS client",

    // Certificate parsing stages.
    FailedParsingCertificate => "Failed parsing Certificate",
    FailedParsingTbsCertificate => "Failed parsing TBSCertificate",
    FailedReadingIssuerOrSubject => "Failed reading issuer or subject",
    FailedNormalizingSubject => "Failed normalizing subject",
    FailedNormalizingIssuer => "Failed normalizing issuer",
    FailedParsingExtensions => "Failed parsing extensions",
    FailedParsingBasicConstraints => "Failed parsing basic constraints",
    FailedParsingKeyUsage => "Failed parsing key usage",
    FailedParsingEku => "Failed parsing extended key usage",
    FailedParsingSubjectAltName => "Failed parsing subjectAltName",
    SubjectAltNameNotCritical => "Empty subject and subjectAltName is not critical",
    FailedParsingNameConstraints => "Failed parsing name constraints",
    FailedParsingAia => "Failed parsing authority info access",
    FailedParsingPolicies => "Failed parsing certificate policies",
    FailedParsingPolicyConstraints => "Failed parsing policy constraints",
    FailedParsingPolicyMappings => "Failed parsing policy mappings",
    FailedParsingInhibitAnyPolicy => "Failed parsing inhibit any policy",
    FailedParsingSubjectKeyIdentifier => "Failed parsing subject key identifier",
    FailedParsingAuthorityKeyIdentifier => "Failed parsing authority key identifier",
    FailedParsingCrlDistributionPoints => "Failed parsing CRL distribution points",
    FailedParsingGeneralName => "Failed parsing GeneralName",

    // Serial number checks.
    SerialNumberNotValidInteger => "Serial number is not a valid INTEGER",
    SerialNumberIsNegative => "Serial number is negative",
    SerialNumberIsZero => "Serial number is zero",
    SerialNumberLengthOver20 => "Serial number is longer than 20 octets",
}

impl core::fmt::Display for ErrorId {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

/// One accumulated diagnostic.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CertError {
    /// The severity of the diagnostic.
    pub severity: Severity,
    /// The stable identity.
    pub id: ErrorId,
    /// Optional free-form context (offending OID, lengths, ...).
    pub params: Option<String>,
}

impl core::fmt::Display for CertError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let label = match self.severity {
            Severity::Warning => "WARNING",
            Severity::High => "ERROR",
        };
        write!(f, "{label}: {}", self.id.name())?;
        if let Some(params) = &self.params {
            write!(f, " ({params})")?;
        }
        Ok(())
    }
}

/// An ordered collection of diagnostics for one certificate (or for the
/// chain as a whole).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ErrorSet {
    errors: Vec<CertError>,
}

impl ErrorSet {
    /// Creates an empty set.
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Appends a diagnostic with an explicit severity.
    pub fn add(&mut self, severity: Severity, id: ErrorId, params: Option<String>) {
        self.errors.push(CertError {
            severity,
            id,
            params,
        });
    }

    /// Appends a high-severity diagnostic.
    pub fn add_error(&mut self, id: ErrorId) {
        self.add(Severity::High, id, None);
    }

    /// Appends a high-severity diagnostic with context.
    pub fn add_error_with_params(&mut self, id: ErrorId, params: String) {
        self.add(Severity::High, id, Some(params));
    }

    /// Appends a warning.
    pub fn add_warning(&mut self, id: ErrorId) {
        self.add(Severity::Warning, id, None);
    }

    /// Whether any diagnostic (of any severity) carries `id`.
    pub fn contains(&self, id: ErrorId) -> bool {
        self.errors.iter().any(|error| error.id == id)
    }

    /// Whether any diagnostic has the given severity.
    pub fn contains_any_error_with_severity(&self, severity: Severity) -> bool {
        self.errors.iter().any(|error| error.severity == severity)
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterates over the accumulated diagnostics in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CertError> {
        self.errors.iter()
    }
}

impl core::fmt::Display for ErrorSet {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        for error in &self.errors {
            writeln!(f, "{error}")?;
        }
        Ok(())
    }
}

/// Diagnostics for an entire certification path: one [`ErrorSet`] per
/// chain index plus a bucket for errors not attributable to any single
/// certificate.
#[derive(Clone, Debug, Default)]
pub struct PathErrors {
    cert_errors: Vec<ErrorSet>,
    other_errors: ErrorSet,
}

impl PathErrors {
    /// Creates an empty collection.
    pub const fn new() -> Self {
        Self {
            cert_errors: Vec::new(),
            other_errors: ErrorSet::new(),
        }
    }

    /// The mutable bucket for the certificate at `index` (target is 0),
    /// growing the collection as needed.
    pub fn errors_for_cert_mut(&mut self, index: usize) -> &mut ErrorSet {
        if index >= self.cert_errors.len() {
            self.cert_errors.resize(index + 1, ErrorSet::new());
        }
        &mut self.cert_errors[index]
    }

    /// The bucket for the certificate at `index`, if any was recorded.
    pub fn errors_for_cert(&self, index: usize) -> Option<&ErrorSet> {
        self.cert_errors.get(index)
    }

    /// The bucket for errors not attributed to a single certificate.
    pub fn other_errors(&self) -> &ErrorSet {
        &self.other_errors
    }

    /// Mutable access to the chain-level bucket.
    pub fn other_errors_mut(&mut self) -> &mut ErrorSet {
        &mut self.other_errors
    }

    /// Whether any bucket carries a diagnostic with the given severity.
    pub fn contains_any_error_with_severity(&self, severity: Severity) -> bool {
        self.other_errors.contains_any_error_with_severity(severity)
            || self
                .cert_errors
                .iter()
                .any(|set| set.contains_any_error_with_severity(severity))
    }

    /// Whether any bucket carries a high-severity diagnostic. This is the
    /// acceptance question callers ask after verification.
    pub fn contains_high_severity_errors(&self) -> bool {
        self.contains_any_error_with_severity(Severity::High)
    }

    /// Whether any bucket carries `id` at any severity.
    pub fn contains_error(&self, id: ErrorId) -> bool {
        self.other_errors.contains(id) || self.cert_errors.iter().any(|set| set.contains(id))
    }
}

impl core::fmt::Display for PathErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        for (index, errors) in self.cert_errors.iter().enumerate() {
            if errors.is_empty() {
                continue;
            }
            writeln!(f, "----- Certificate i={index} -----")?;
            write!(f, "{errors}")?;
        }
        if !self.other_errors.is_empty() {
            writeln!(f, "----- Other errors (not certificate specific) -----")?;
            write!(f, "{}", self.other_errors)?;
        }
        Ok(())
    }
}

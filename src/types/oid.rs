//! Object identifier constants.
//!
//! Every OID this profile consults is a fixed DER-encoded content (the
//! bytes following the OBJECT IDENTIFIER tag and length). Comparisons
//! throughout the crate are byte-wise against these constants; nothing
//! ever interprets the arc components.

/// id-ce-basicConstraints (2.5.29.19)
pub const BASIC_CONSTRAINTS: &[u8] = &[0x55, 0x1d, 0x13];
/// id-ce-keyUsage (2.5.29.15)
pub const KEY_USAGE: &[u8] = &[0x55, 0x1d, 0x0f];
/// id-ce-extKeyUsage (2.5.29.37)
pub const EXT_KEY_USAGE: &[u8] = &[0x55, 0x1d, 0x25];
/// id-ce-subjectAltName (2.5.29.17)
pub const SUBJECT_ALT_NAME: &[u8] = &[0x55, 0x1d, 0x11];
/// id-ce-nameConstraints (2.5.29.30)
pub const NAME_CONSTRAINTS: &[u8] = &[0x55, 0x1d, 0x1e];
/// id-ce-certificatePolicies (2.5.29.32)
pub const CERTIFICATE_POLICIES: &[u8] = &[0x55, 0x1d, 0x20];
/// anyPolicy (2.5.29.32.0)
pub const ANY_POLICY: &[u8] = &[0x55, 0x1d, 0x20, 0x00];
/// id-ce-policyMappings (2.5.29.33)
pub const POLICY_MAPPINGS: &[u8] = &[0x55, 0x1d, 0x21];
/// id-ce-policyConstraints (2.5.29.36)
pub const POLICY_CONSTRAINTS: &[u8] = &[0x55, 0x1d, 0x24];
/// id-ce-inhibitAnyPolicy (2.5.29.54)
pub const INHIBIT_ANY_POLICY: &[u8] = &[0x55, 0x1d, 0x36];
/// id-ce-cRLDistributionPoints (2.5.29.31)
pub const CRL_DISTRIBUTION_POINTS: &[u8] = &[0x55, 0x1d, 0x1f];
/// id-ce-authorityKeyIdentifier (2.5.29.35)
pub const AUTHORITY_KEY_IDENTIFIER: &[u8] = &[0x55, 0x1d, 0x23];
/// id-ce-subjectKeyIdentifier (2.5.29.14)
pub const SUBJECT_KEY_IDENTIFIER: &[u8] = &[0x55, 0x1d, 0x0e];

/// id-pe-authorityInfoAccess (1.3.6.1.5.5.7.1.1)
pub const AUTHORITY_INFO_ACCESS: &[u8] = &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x01, 0x01];
/// id-ad-caIssuers (1.3.6.1.5.5.7.48.2)
pub const AD_CA_ISSUERS: &[u8] = &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x02];
/// id-ad-ocsp (1.3.6.1.5.5.7.48.1)
pub const AD_OCSP: &[u8] = &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x01];

/// anyExtendedKeyUsage (2.5.29.37.0)
pub const ANY_EKU: &[u8] = &[0x55, 0x1d, 0x25, 0x00];
/// id-kp-serverAuth (1.3.6.1.5.5.7.3.1)
pub const SERVER_AUTH: &[u8] = &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x01];
/// id-kp-clientAuth (1.3.6.1.5.5.7.3.2)
pub const CLIENT_AUTH: &[u8] = &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x02];
/// id-kp-codeSigning (1.3.6.1.5.5.7.3.3)
pub const CODE_SIGNING: &[u8] = &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x03];
/// id-kp-emailProtection (1.3.6.1.5.5.7.3.4)
pub const EMAIL_PROTECTION: &[u8] = &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x04];
/// id-kp-timeStamping (1.3.6.1.5.5.7.3.8)
pub const TIME_STAMPING: &[u8] = &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x08];
/// id-kp-OCSPSigning (1.3.6.1.5.5.7.3.9)
pub const OCSP_SIGNING: &[u8] = &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x09];

/// rcsMlsClient (2.23.146.2.1.3)
pub const RCS_MLS_CLIENT: &[u8] = &[0x67, 0x81, 0x12, 0x02, 0x01, 0x03];
/// rcsMlsParticipantInformation (2.23.146.2.1.4)
pub const RCS_MLS_PARTICIPANT_INFORMATION: &[u8] = &[0x67, 0x81, 0x12, 0x02, 0x01, 0x04];
/// rcsMlsAcsParticipantInformation (2.23.146.2.1.5)
pub const RCS_MLS_ACS_PARTICIPANT_INFORMATION: &[u8] = &[0x67, 0x81, 0x12, 0x02, 0x01, 0x05];

/// The Certificate Transparency precertificate poison extension
/// (1.3.6.1.4.1.11129.2.4.3)
pub const CT_POISON: &[u8] = &[0x2b, 0x06, 0x01, 0x04, 0x01, 0xd6, 0x79, 0x02, 0x04, 0x03];
/// szOID_APPLICATION_CERT_POLICIES (1.3.6.1.4.1.311.21.10)
pub const MS_APPLICATION_POLICIES: &[u8] =
    &[0x2b, 0x06, 0x01, 0x04, 0x01, 0x82, 0x37, 0x15, 0x0a];

/// pkcs-9 emailAddress attribute (1.2.840.113549.1.9.1)
pub const EMAIL_ADDRESS: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x09, 0x01];

/// id-qt-cps (1.3.6.1.5.5.7.2.1)
pub const QT_CPS: &[u8] = &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x02, 0x01];
/// id-qt-unotice (1.3.6.1.5.5.7.2.2)
pub const QT_UNOTICE: &[u8] = &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x02, 0x02];

/// sha1WithRSAEncryption (1.2.840.113549.1.1.5)
pub const SHA1_WITH_RSA_ENCRYPTION: &[u8] =
    &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x05];
/// sha-1WithRSAEncryption from the OIW arc (1.3.14.3.2.29), an alternate
/// encoding of the same algorithm seen in legacy certificates.
pub const SHA1_WITH_RSA_SIGNATURE_OIW: &[u8] = &[0x2b, 0x0e, 0x03, 0x02, 0x1d];
/// sha256WithRSAEncryption (1.2.840.113549.1.1.11)
pub const SHA256_WITH_RSA_ENCRYPTION: &[u8] =
    &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b];
/// sha384WithRSAEncryption (1.2.840.113549.1.1.12)
pub const SHA384_WITH_RSA_ENCRYPTION: &[u8] =
    &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0c];
/// sha512WithRSAEncryption (1.2.840.113549.1.1.13)
pub const SHA512_WITH_RSA_ENCRYPTION: &[u8] =
    &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0d];
/// ecdsa-with-SHA1 (1.2.840.10045.4.1)
pub const ECDSA_WITH_SHA1: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x04, 0x01];
/// ecdsa-with-SHA256 (1.2.840.10045.4.3.2)
pub const ECDSA_WITH_SHA256: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x04, 0x03, 0x02];
/// ecdsa-with-SHA384 (1.2.840.10045.4.3.3)
pub const ECDSA_WITH_SHA384: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x04, 0x03, 0x03];
/// ecdsa-with-SHA512 (1.2.840.10045.4.3.4)
pub const ECDSA_WITH_SHA512: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x04, 0x03, 0x04];

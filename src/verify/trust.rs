//! The trust decision attached to the last certificate of a chain.

/// How the trust store regards a certificate.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TrustType {
    /// Not trusted: verification fails immediately.
    Unspecified,
    /// Actively distrusted: verification fails immediately.
    Distrusted,
    /// Usable only as a trust anchor.
    TrustedAnchor,
    /// Usable only as a directly trusted leaf (chain length 1).
    TrustedLeaf,
    /// Usable in either role.
    TrustedAnchorOrLeaf,
}

/// A [`TrustType`] plus the modifier bits controlling how much of the
/// anchor or leaf certificate is enforced.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct CertificateTrust {
    /// The base trust decision.
    pub trust_type: TrustType,
    /// Check the anchor's validity window against the verification
    /// time.
    pub enforce_anchor_expiry: bool,
    /// Apply the anchor's encoded constraints (RFC 5937).
    pub enforce_anchor_constraints: bool,
    /// Additionally require a v3 anchor to carry basicConstraints (only
    /// meaningful with `enforce_anchor_constraints`).
    pub require_anchor_basic_constraints: bool,
    /// For trusted leaves, require the certificate to verify under its
    /// own key.
    pub require_leaf_selfsigned: bool,
}

impl CertificateTrust {
    const fn new(trust_type: TrustType) -> Self {
        Self {
            trust_type,
            enforce_anchor_expiry: false,
            enforce_anchor_constraints: false,
            require_anchor_basic_constraints: false,
            require_leaf_selfsigned: false,
        }
    }

    /// Not trusted.
    pub const fn unspecified() -> Self {
        Self::new(TrustType::Unspecified)
    }

    /// Actively distrusted.
    pub const fn distrusted() -> Self {
        Self::new(TrustType::Distrusted)
    }

    /// Trusted as an anchor.
    pub const fn trusted_anchor() -> Self {
        Self::new(TrustType::TrustedAnchor)
    }

    /// Trusted as a directly presented leaf.
    pub const fn trusted_leaf() -> Self {
        Self::new(TrustType::TrustedLeaf)
    }

    /// Trusted in either role.
    pub const fn trusted_anchor_or_leaf() -> Self {
        Self::new(TrustType::TrustedAnchorOrLeaf)
    }

    /// Enables anchor expiry enforcement.
    pub const fn with_enforce_anchor_expiry(mut self) -> Self {
        self.enforce_anchor_expiry = true;
        self
    }

    /// Enables anchor constraint enforcement.
    pub const fn with_enforce_anchor_constraints(mut self) -> Self {
        self.enforce_anchor_constraints = true;
        self
    }

    /// Requires a v3 anchor to carry basicConstraints.
    pub const fn with_require_anchor_basic_constraints(mut self) -> Self {
        self.require_anchor_basic_constraints = true;
        self
    }

    /// Requires a trusted leaf to be self-signed.
    pub const fn with_require_leaf_selfsigned(mut self) -> Self {
        self.require_leaf_selfsigned = true;
        self
    }
}

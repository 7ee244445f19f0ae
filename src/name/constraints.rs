//! The name-constraints engine (RFC 5280 section 4.2.1.10 and section
//! 6.1.3 steps b and c).

use alloc::{string::String, vec::Vec};

use crate::der::Reader;
use crate::error::{DecodeError, ErrorId, ErrorSet};
use crate::name::general_names::{GeneralNames, IpAddressMode, name_types, parse_general_name};
use crate::name::normalize::verify_name_in_subtree;
use crate::name::{ip, normalize::find_email_addresses_in_name};
use crate::types::Tag;

type Result<T> = core::result::Result<T, DecodeError>;

/// The name forms with full constraint support. Other forms receive the
/// minimal handling RFC 5280 requires: a critical constraint on such a
/// form rejects any certificate presenting a name of that form.
const SUPPORTED_NAME_TYPES: u32 = name_types::RFC822_NAME
    | name_types::DNS_NAME
    | name_types::DIRECTORY_NAME
    | name_types::IP_ADDRESS;

/// Checking is O(names x constraints); cap the product to keep a
/// hostile certificate from using name constraints as a DoS vector.
const MAX_CHECKS: usize = 1 << 20;

/// Controls wildcard handling of [`dns_name_matches`]. With
/// `PartialMatch`, `*.bar.com` matches the constraint `foo.bar.com`
/// (some expansion matches); with `FullMatch` it matches `bar.com` but
/// not `foo.bar.com` (every expansion matches).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum WildcardMatch {
    PartialMatch,
    FullMatch,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Rfc822Match {
    Permitted,
    Excluded,
}

/// A parsed nameConstraints extension: permitted and excluded subtrees
/// plus the bitmask of constrained name forms.
#[derive(Clone, Debug)]
pub struct NameConstraints<'a> {
    permitted_subtrees: GeneralNames<'a>,
    excluded_subtrees: GeneralNames<'a>,
    constrained_name_types: u32,
}

impl<'a> NameConstraints<'a> {
    /// Parses a nameConstraints extension value. At least one of the two
    /// subtree lists must be present, and every GeneralSubtree must omit
    /// the unused `minimum` and `maximum` fields.
    ///
    /// When the extension is critical every encountered name form
    /// contributes to the constrained set; otherwise only the four fully
    /// supported forms do.
    pub fn create(extension_value: &'a [u8], is_critical: bool) -> Result<Self> {
        let mut reader = Reader::new(extension_value);
        let mut sequence = reader.read_sequence()?;
        reader.expect_empty()?;

        let supported = if is_critical {
            name_types::ALL
        } else {
            SUPPORTED_NAME_TYPES
        };

        let mut constraints = Self {
            permitted_subtrees: GeneralNames::default(),
            excluded_subtrees: GeneralNames::default(),
            constrained_name_types: 0,
        };

        let permitted = sequence.read_optional(Tag::context_constructed(0))?;
        if let Some(value) = permitted {
            parse_general_subtrees(value, &mut constraints.permitted_subtrees)?;
        }
        constraints.constrained_name_types |=
            constraints.permitted_subtrees.present_name_types & supported;

        let excluded = sequence.read_optional(Tag::context_constructed(1))?;
        if let Some(value) = excluded {
            parse_general_subtrees(value, &mut constraints.excluded_subtrees)?;
        }
        constraints.constrained_name_types |=
            constraints.excluded_subtrees.present_name_types & supported;

        if permitted.is_none() && excluded.is_none() {
            return Err(DecodeError::malformed(
                "NameConstraints must contain permitted or excluded subtrees",
            ));
        }
        sequence.expect_empty()?;

        Ok(constraints)
    }

    /// The [`name_types`] bitmask of forms this extension constrains.
    pub fn constrained_name_types(&self) -> u32 {
        self.constrained_name_types
    }

    /// The permitted subtrees.
    pub fn permitted_subtrees(&self) -> &GeneralNames<'a> {
        &self.permitted_subtrees
    }

    /// The excluded subtrees.
    pub fn excluded_subtrees(&self) -> &GeneralNames<'a> {
        &self.excluded_subtrees
    }

    /// Evaluates whether a certificate with the given subject and
    /// subjectAltNames satisfies these constraints, appending any
    /// failures to `errors`.
    pub fn is_permitted_cert(
        &self,
        subject_rdn_sequence: &[u8],
        subject_alt_names: Option<&GeneralNames<'_>>,
        errors: &mut ErrorSet,
    ) {
        let (name_count, constraint_count) = match subject_alt_names {
            Some(sans) => (
                sans.rfc822_names.len()
                    + sans.dns_names.len()
                    + sans.directory_names.len()
                    + sans.ip_addresses.len(),
                self.excluded_subtrees.rfc822_names.len()
                    + self.permitted_subtrees.rfc822_names.len()
                    + self.excluded_subtrees.dns_names.len()
                    + self.permitted_subtrees.dns_names.len()
                    + self.excluded_subtrees.directory_names.len()
                    + self.permitted_subtrees.directory_names.len()
                    + self.excluded_subtrees.ip_address_ranges.len()
                    + self.permitted_subtrees.ip_address_ranges.len(),
            ),
            None => (
                subject_rdn_sequence.len(),
                self.excluded_subtrees.directory_names.len()
                    + self.permitted_subtrees.directory_names.len(),
            ),
        };
        match name_count.checked_mul(constraint_count) {
            Some(checks) if checks <= MAX_CHECKS => {}
            _ => {
                errors.add_error(ErrorId::TooManyNameConstraintChecks);
                return;
            }
        }

        let mut subject_email_addresses_to_check: Vec<String> = Vec::new();
        if subject_alt_names.is_none()
            && self.constrained_name_types & name_types::RFC822_NAME != 0
        {
            match find_email_addresses_in_name(subject_rdn_sequence) {
                Ok(addresses) => subject_email_addresses_to_check = addresses,
                Err(_) => {
                    errors.add_error(ErrorId::NotPermittedByNameConstraints);
                    return;
                }
            }
        }

        if let Some(sans) = subject_alt_names {
            // A critical constraint on a form we cannot fully process
            // rejects any certificate presenting that form.
            if self.constrained_name_types & sans.present_name_types & !SUPPORTED_NAME_TYPES != 0
            {
                errors.add_error(ErrorId::NotPermittedByNameConstraints);
                return;
            }

            // Only parse rfc822 SANs when rfc822 constraints exist; an
            // exotic but well-formed mailbox should not fail otherwise.
            if self.constrained_name_types & name_types::RFC822_NAME != 0 {
                for rfc822_name in &sans.rfc822_names {
                    if !self.is_permitted_rfc822_name(rfc822_name, false) {
                        errors.add_error(ErrorId::NotPermittedByNameConstraints);
                        return;
                    }
                }
            }
            for dns_name in &sans.dns_names {
                if !self.is_permitted_dns_name(dns_name) {
                    errors.add_error(ErrorId::NotPermittedByNameConstraints);
                    return;
                }
            }
            for directory_name in &sans.directory_names {
                if !self.is_permitted_directory_name(directory_name) {
                    errors.add_error(ErrorId::NotPermittedByNameConstraints);
                    return;
                }
            }
            for ip_address in &sans.ip_addresses {
                if !self.is_permitted_ip(ip_address) {
                    errors.add_error(ErrorId::NotPermittedByNameConstraints);
                    return;
                }
            }
        }

        // Legacy emailAddress attributes in the subject take the rfc822
        // constraints when no SAN extension is present. The local part is
        // matched case-insensitively against exclusions here, since how
        // mail hosts treat case is unknowable.
        for rfc822_name in &subject_email_addresses_to_check {
            if !self.is_permitted_rfc822_name(rfc822_name, true) {
                errors.add_error(ErrorId::NotPermittedByNameConstraints);
                return;
            }
        }

        // A certificate whose subject naming information lives only in a
        // (critical) SAN extension has an empty subject; skip the
        // directoryName check in that case.
        if subject_alt_names.is_some() && subject_rdn_sequence.is_empty() {
            return;
        }

        if !self.is_permitted_directory_name(subject_rdn_sequence) {
            errors.add_error(ErrorId::NotPermittedByNameConstraints);
        }
    }

    fn is_permitted_rfc822_name(
        &self,
        name: &str,
        case_insensitive_exclude_localpart: bool,
    ) -> bool {
        let Some((local, domain)) = split_mailbox(name) else {
            // Includes quoted local parts: fail safe by rejecting.
            return false;
        };
        if !is_allowed_rfc822_local_part(local) || !is_allowed_rfc822_domain(domain) {
            return false;
        }

        for excluded_name in &self.excluded_subtrees.rfc822_names {
            if rfc822_name_matches(
                local,
                domain,
                excluded_name,
                Rfc822Match::Excluded,
                case_insensitive_exclude_localpart,
            ) {
                return false;
            }
        }

        if self.permitted_subtrees.present_name_types & name_types::RFC822_NAME == 0 {
            return true;
        }
        self.permitted_subtrees.rfc822_names.iter().any(|permitted| {
            rfc822_name_matches(local, domain, permitted, Rfc822Match::Permitted, false)
        })
    }

    fn is_permitted_dns_name(&self, name: &str) -> bool {
        for excluded_name in &self.excluded_subtrees.dns_names {
            // A wildcard is excluded when any expansion could land in the
            // excluded subtree.
            if dns_name_matches(name, excluded_name, WildcardMatch::PartialMatch) {
                return false;
            }
        }

        if self.permitted_subtrees.present_name_types & name_types::DNS_NAME == 0 {
            return true;
        }
        self.permitted_subtrees.dns_names.iter().any(|permitted| {
            // A wildcard is permitted only when every expansion stays in
            // the permitted subtree.
            dns_name_matches(name, permitted, WildcardMatch::FullMatch)
        })
    }

    fn is_permitted_directory_name(&self, name_rdn_sequence: &[u8]) -> bool {
        for excluded_name in &self.excluded_subtrees.directory_names {
            if verify_name_in_subtree(name_rdn_sequence, excluded_name) {
                return false;
            }
        }

        if self.permitted_subtrees.present_name_types & name_types::DIRECTORY_NAME == 0 {
            return true;
        }
        self.permitted_subtrees
            .directory_names
            .iter()
            .any(|permitted| verify_name_in_subtree(name_rdn_sequence, permitted))
    }

    fn is_permitted_ip(&self, address: &[u8]) -> bool {
        for (excluded, mask) in &self.excluded_subtrees.ip_address_ranges {
            if ip::ip_matches_with_netmask(address, excluded, mask) {
                return false;
            }
        }

        if self.permitted_subtrees.present_name_types & name_types::IP_ADDRESS == 0 {
            return true;
        }
        self.permitted_subtrees
            .ip_address_ranges
            .iter()
            .any(|(permitted, mask)| ip::ip_matches_with_netmask(address, permitted, mask))
    }
}

/// Parses a GeneralSubtrees sequence value into `subtrees`.
///
/// ```text
/// GeneralSubtrees ::= SEQUENCE SIZE (1..MAX) OF GeneralSubtree
/// GeneralSubtree ::= SEQUENCE {
///      base                    GeneralName,
///      minimum         [0]     BaseDistance DEFAULT 0,
///      maximum         [1]     BaseDistance OPTIONAL }
/// ```
///
/// The minimum and maximum fields are not used with any name form, so
/// the minimum must be zero (omitted, per DER) and the maximum absent;
/// any encoded value fails.
fn parse_general_subtrees<'a>(value: &'a [u8], subtrees: &mut GeneralNames<'a>) -> Result<()> {
    let mut reader = Reader::new(value);
    if !reader.has_more() {
        return Err(DecodeError::malformed("GeneralSubtrees must not be empty"));
    }
    while reader.has_more() {
        let mut subtree = reader.read_sequence()?;
        let raw_general_name = subtree.read_raw_tlv()?;
        parse_general_name(raw_general_name, IpAddressMode::AddressAndNetmask, subtrees)?;
        subtree.expect_empty()?;
    }
    Ok(())
}

/// Returns true if `name` falls in the subtree defined by
/// `dns_constraint`: an exact case-insensitive match, or a suffix match
/// aligned on a label boundary. A constraint with a leading dot matches
/// only proper subdomains. The empty constraint matches everything.
fn dns_name_matches(name: &str, dns_constraint: &str, wildcard_matching: WildcardMatch) -> bool {
    if dns_constraint.is_empty() {
        return true;
    }

    // Normalize absolute names by dropping one trailing dot.
    let name = name.strip_suffix('.').unwrap_or(name);
    let mut dns_constraint = dns_constraint.strip_suffix('.').unwrap_or(dns_constraint);

    // Wildcard partial-match handling: "*.bar.com" against constraint
    // "foo.bar.com" matches when the constraint minus its leftmost label
    // equals the wildcard's suffix. Everything else falls through to the
    // fully-inside / fully-outside check below.
    if wildcard_matching == WildcardMatch::PartialMatch && name.len() > 2 {
        if let Some(wildcard_domain) = name.strip_prefix("*.") {
            if let Some(dot) = dns_constraint.find('.') {
                if wildcard_domain.eq_ignore_ascii_case(&dns_constraint[dot + 1..]) {
                    return true;
                }
            }
        }
    }

    if !ends_with_ignore_ascii_case(name, dns_constraint) {
        return false;
    }
    if name.len() == dns_constraint.len() {
        return true;
    }
    // A constraint starting with a dot matches only subdomains (e.g.
    // "foo.bar.com" matches ".bar.com" but "bar.com" does not).
    if let Some(stripped) = dns_constraint.strip_prefix('.') {
        dns_constraint = stripped;
    }
    if name.len() > dns_constraint.len()
        && name.as_bytes()[name.len() - dns_constraint.len() - 1] == b'.'
    {
        return true;
    }
    // Trailing text matches but not on a label boundary ("foobar.com" is
    // not within "bar.com").
    false
}

fn ends_with_ignore_ascii_case(value: &str, suffix: &str) -> bool {
    value.len() >= suffix.len() && value[value.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

fn is_alpha_digit(c: u8) -> bool {
    c.is_ascii_alphanumeric()
}

/// Characters valid in a non-quoted mailbox local-part. Quoted forms and
/// whitespace are intentionally not representable.
fn is_allowed_rfc822_local_part(local_part: &str) -> bool {
    !local_part.is_empty()
        && local_part.bytes().all(|c| {
            is_alpha_digit(c)
                || matches!(
                    c,
                    b'!' | b'#'
                        | b'$'
                        | b'%'
                        | b'&'
                        | b'\''
                        | b'*'
                        | b'+'
                        | b'-'
                        | b'/'
                        | b'='
                        | b'?'
                        | b'^'
                        | b'_'
                        | b'`'
                        | b'{'
                        | b'|'
                        | b'}'
                        | b'~'
                        | b'.'
                )
        })
}

/// Characters valid in a mailbox domain. Address literals (both IPv4 and
/// IPv6) are rejected; they have no subdomain semantics to constrain.
fn is_allowed_rfc822_domain(domain: &str) -> bool {
    !domain.is_empty()
        && domain
            .bytes()
            .all(|c| is_alpha_digit(c) || c == b'-' || c == b'.')
}

fn split_mailbox(name: &str) -> Option<(&str, &str)> {
    let mut parts = name.split('@');
    let local = parts.next()?;
    let domain = parts.next()?;
    // An @ inside a quoted local part would legitimately produce more
    // parts, but quoted forms are unsupported, so more than one @ fails.
    if parts.next().is_some() {
        return None;
    }
    Some((local, domain))
}

/// Matches one mailbox against one rfc822 constraint. A full-address
/// constraint pins the local part (case sensitivity per the flag) and
/// the domain case-insensitively; a bare domain matches any mailbox on
/// that host; a leading dot matches proper subdomains only. A constraint
/// that itself fails to parse permits nothing and excludes everything.
fn rfc822_name_matches(
    local_part: &str,
    domain: &str,
    rfc822_constraint: &str,
    match_type: Rfc822Match,
    case_insensitive_local_part: bool,
) -> bool {
    let error_value = match_type == Rfc822Match::Excluded;

    let (constraint_local_part, constraint_domain) = match split_mailbox(rfc822_constraint) {
        Some((local, domain)) => {
            if !is_allowed_rfc822_local_part(local) {
                return error_value;
            }
            (local, domain)
        }
        None => {
            if rfc822_constraint.contains('@') {
                return error_value;
            }
            ("", rfc822_constraint)
        }
    };
    if !is_allowed_rfc822_domain(constraint_domain) {
        return error_value;
    }

    if !constraint_local_part.is_empty() {
        let local_matches = if case_insensitive_local_part {
            local_part.eq_ignore_ascii_case(constraint_local_part)
        } else {
            local_part == constraint_local_part
        };
        return local_matches && domain.eq_ignore_ascii_case(constraint_domain);
    }

    if constraint_domain.starts_with('.') {
        return ends_with_ignore_ascii_case(domain, constraint_domain);
    }

    domain.eq_ignore_ascii_case(constraint_domain)
}

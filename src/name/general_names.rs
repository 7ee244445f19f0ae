//! The `GeneralName` CHOICE and its typed collection.

use alloc::vec::Vec;

use crate::der::Reader;
use crate::error::DecodeError;
use crate::name::ip;
use crate::types::Tag;

type Result<T> = core::result::Result<T, DecodeError>;

/// Bit flags identifying which `GeneralName` variants are present in a
/// [`GeneralNames`] collection.
pub mod name_types {
    /// otherName
    pub const OTHER_NAME: u32 = 1 << 0;
    /// rfc822Name
    pub const RFC822_NAME: u32 = 1 << 1;
    /// dNSName
    pub const DNS_NAME: u32 = 1 << 2;
    /// x400Address
    pub const X400_ADDRESS: u32 = 1 << 3;
    /// directoryName
    pub const DIRECTORY_NAME: u32 = 1 << 4;
    /// ediPartyName
    pub const EDI_PARTY_NAME: u32 = 1 << 5;
    /// uniformResourceIdentifier
    pub const UNIFORM_RESOURCE_IDENTIFIER: u32 = 1 << 6;
    /// iPAddress
    pub const IP_ADDRESS: u32 = 1 << 7;
    /// registeredID
    pub const REGISTERED_ID: u32 = 1 << 8;
    /// Every variant.
    pub const ALL: u32 = (1 << 9) - 1;
}

/// How an `iPAddress` entry is interpreted.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IpAddressMode {
    /// A subjectAltName address: exactly 4 or 16 octets.
    AddressOnly,
    /// A name-constraint range: address plus netmask, 8 or 32 octets.
    AddressAndNetmask,
}

/// A parsed `GeneralNames` collection: one vector per name form, each
/// borrowing from the input, plus a summary bitmask of the present
/// forms.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GeneralNames<'a> {
    /// otherName entries, as raw TLVs.
    pub other_names: Vec<&'a [u8]>,
    /// rfc822Name entries (ASCII).
    pub rfc822_names: Vec<&'a str>,
    /// dNSName entries (ASCII).
    pub dns_names: Vec<&'a str>,
    /// x400Address entries, as raw content.
    pub x400_addresses: Vec<&'a [u8]>,
    /// directoryName entries: the inner RDNSequence value, with the
    /// explicit SEQUENCE wrapper stripped.
    pub directory_names: Vec<&'a [u8]>,
    /// ediPartyName entries, as raw content.
    pub edi_party_names: Vec<&'a [u8]>,
    /// uniformResourceIdentifier entries (ASCII).
    pub uniform_resource_identifiers: Vec<&'a str>,
    /// iPAddress entries in [`IpAddressMode::AddressOnly`] form.
    pub ip_addresses: Vec<&'a [u8]>,
    /// iPAddress ranges in [`IpAddressMode::AddressAndNetmask`] form.
    pub ip_address_ranges: Vec<(&'a [u8], &'a [u8])>,
    /// registeredID entries (OID contents).
    pub registered_ids: Vec<&'a [u8]>,
    /// The [`name_types`] flags of every form that appeared.
    pub present_name_types: u32,
}

impl<'a> GeneralNames<'a> {
    /// Parses a `GeneralNames` TLV (`SEQUENCE SIZE (1..MAX) OF
    /// GeneralName`, as in a subjectAltName extension value).
    pub fn create(general_names_tlv: &'a [u8]) -> Result<Self> {
        let mut reader = Reader::new(general_names_tlv);
        let sequence_value = reader.read_tag(Tag::SEQUENCE)?;
        reader.expect_empty()?;
        Self::create_from_value(sequence_value)
    }

    /// Parses the inner sequence value of a `GeneralNames` (used where
    /// an enclosing structure already stripped the SEQUENCE tag, e.g. a
    /// distribution point's `fullName`).
    pub fn create_from_value(general_names_value: &'a [u8]) -> Result<Self> {
        let mut names = GeneralNames::default();
        let mut reader = Reader::new(general_names_value);
        if !reader.has_more() {
            return Err(DecodeError::malformed("GeneralNames must not be empty"));
        }
        while reader.has_more() {
            let raw = reader.read_raw_tlv()?;
            parse_general_name(raw, IpAddressMode::AddressOnly, &mut names)?;
        }
        Ok(names)
    }
}

fn ascii<'a>(value: &'a [u8], what: &'static str) -> Result<&'a str> {
    core::str::from_utf8(value)
        .ok()
        .filter(|s| s.is_ascii())
        .ok_or(DecodeError::Malformed { what })
}

/// Parses a single `GeneralName` TLV into `names`. `mode` selects the
/// `iPAddress` interpretation; everything else is common to SAN and
/// name-constraint uses.
pub fn parse_general_name<'a>(
    input: &'a [u8],
    mode: IpAddressMode,
    names: &mut GeneralNames<'a>,
) -> Result<()> {
    let mut reader = Reader::new(input);
    let (tag, value) = reader.read_tlv()?;
    reader.expect_empty()?;

    let name_type = if tag == Tag::context_constructed(0) {
        names.other_names.push(value);
        name_types::OTHER_NAME
    } else if tag == Tag::context(1) {
        names.rfc822_names.push(ascii(value, "rfc822Name is not ASCII")?);
        name_types::RFC822_NAME
    } else if tag == Tag::context(2) {
        names.dns_names.push(ascii(value, "dNSName is not ASCII")?);
        name_types::DNS_NAME
    } else if tag == Tag::context_constructed(3) {
        names.x400_addresses.push(value);
        name_types::X400_ADDRESS
    } else if tag == Tag::context_constructed(4) {
        // Name is a CHOICE { rdnSequence RDNSequence }, so the SEQUENCE
        // tag is explicit. The matching functions expect the value only.
        let mut name_reader = Reader::new(value);
        let name_value = name_reader.read_tag(Tag::SEQUENCE)?;
        name_reader.expect_empty()?;
        names.directory_names.push(name_value);
        name_types::DIRECTORY_NAME
    } else if tag == Tag::context_constructed(5) {
        names.edi_party_names.push(value);
        name_types::EDI_PARTY_NAME
    } else if tag == Tag::context(6) {
        names
            .uniform_resource_identifiers
            .push(ascii(value, "uniformResourceIdentifier is not ASCII")?);
        name_types::UNIFORM_RESOURCE_IDENTIFIER
    } else if tag == Tag::context(7) {
        match mode {
            IpAddressMode::AddressOnly => {
                if value.len() != 4 && value.len() != 16 {
                    return Err(DecodeError::malformed(
                        "iPAddress must be 4 or 16 octets",
                    ));
                }
                names.ip_addresses.push(value);
            }
            IpAddressMode::AddressAndNetmask => {
                if value.len() != 8 && value.len() != 32 {
                    return Err(DecodeError::malformed(
                        "iPAddress constraint must be 8 or 32 octets",
                    ));
                }
                let (addr, mask) = value.split_at(value.len() / 2);
                if !ip::is_valid_netmask(mask) {
                    return Err(DecodeError::malformed(
                        "iPAddress constraint netmask is not contiguous",
                    ));
                }
                names.ip_address_ranges.push((addr, mask));
            }
        }
        name_types::IP_ADDRESS
    } else if tag == Tag::context(8) {
        names.registered_ids.push(value);
        name_types::REGISTERED_ID
    } else {
        return Err(DecodeError::malformed("Unknown GeneralName type"));
    };

    names.present_name_types |= name_type;
    Ok(())
}

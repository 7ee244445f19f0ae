//! Distinguished-name normalization.
//!
//! RFC 5280 section 7.1 name comparison is re-expressed here as
//! normalize-then-compare: every string attribute value is rewritten to a
//! canonical form (canonical tag, folded case, collapsed whitespace) and
//! the whole RDNSequence is re-encoded, after which two names are equal
//! iff their normalized encodings are byte-for-byte equal. Normalization
//! is idempotent: feeding a normalized name back in reproduces it.

use alloc::{string::String, vec::Vec};

use crate::der::Reader;
use crate::error::DecodeError;
use crate::types::{Tag, oid};

type Result<T> = core::result::Result<T, DecodeError>;

/// Appends a TLV with the given (single-octet) tag and a minimally
/// encoded definite length.
pub(crate) fn push_tlv(out: &mut Vec<u8>, tag: u8, contents: &[u8]) {
    out.push(tag);
    let length = contents.len();
    if length < 0x80 {
        out.push(length as u8);
    } else {
        let bytes = length.to_be_bytes();
        let skip = bytes.iter().take_while(|&&b| b == 0).count();
        out.push(0x80 | (bytes.len() - skip) as u8);
        out.extend_from_slice(&bytes[skip..]);
    }
    out.extend_from_slice(contents);
}

/// Case-folds and compresses whitespace: ASCII letters fold to lower
/// case, runs of internal whitespace collapse to a single space, and
/// leading/trailing whitespace is dropped.
fn fold_string(value: &str) -> String {
    let mut folded = String::with_capacity(value.len());
    let mut pending_space = false;
    for c in value.chars() {
        if c.is_ascii_whitespace() {
            pending_space = !folded.is_empty();
            continue;
        }
        if pending_space {
            folded.push(' ');
            pending_space = false;
        }
        folded.push(c.to_ascii_lowercase());
    }
    folded
}

fn is_printable_string_char(c: u8) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            b' ' | b'\'' | b'(' | b')' | b'+' | b',' | b'-' | b'.' | b'/' | b':' | b'=' | b'?'
        )
}

fn utf8_from_bmp(contents: &[u8]) -> Result<String> {
    if contents.len() % 2 != 0 {
        return Err(DecodeError::malformed("BMPString length is not even"));
    }
    let mut value = String::with_capacity(contents.len());
    for unit in contents.chunks_exact(2) {
        let unit = u16::from_be_bytes([unit[0], unit[1]]);
        // BMPString is UCS-2; surrogate code units have no meaning.
        let c = char::from_u32(u32::from(unit))
            .ok_or_else(|| DecodeError::malformed("BMPString contains a surrogate"))?;
        value.push(c);
    }
    Ok(value)
}

fn utf8_from_universal(contents: &[u8]) -> Result<String> {
    if contents.len() % 4 != 0 {
        return Err(DecodeError::malformed(
            "UniversalString length is not a multiple of four",
        ));
    }
    let mut value = String::with_capacity(contents.len());
    for unit in contents.chunks_exact(4) {
        let unit = u32::from_be_bytes([unit[0], unit[1], unit[2], unit[3]]);
        let c = char::from_u32(unit)
            .ok_or_else(|| DecodeError::malformed("UniversalString is not a Unicode scalar"))?;
        value.push(c);
    }
    Ok(value)
}

fn utf8_from_teletex(contents: &[u8]) -> String {
    // Decoded as Latin-1, which is how these values appear in practice.
    contents.iter().map(|&b| char::from(b)).collect()
}

/// Normalizes one attribute value, returning its canonical TLV. String
/// types are rewritten; everything else passes through unchanged.
fn normalize_value(tag: Tag, contents: &[u8], raw_tlv: &[u8]) -> Result<Vec<u8>> {
    let (out_tag, value) = match tag {
        Tag::PRINTABLE_STRING => {
            if !contents.iter().copied().all(is_printable_string_char) {
                return Err(DecodeError::malformed(
                    "PrintableString contains a character outside its alphabet",
                ));
            }
            // The alphabet is ASCII, so the bytes are valid UTF-8.
            let value = core::str::from_utf8(contents)
                .map_err(|_| DecodeError::malformed("PrintableString is not ASCII"))?;
            (0x13, fold_string(value))
        }
        Tag::UTF8_STRING => {
            let value = core::str::from_utf8(contents)
                .map_err(|_| DecodeError::malformed("UTF8String is not valid UTF-8"))?;
            (0x0c, fold_string(value))
        }
        Tag::BMP_STRING => (0x0c, fold_string(&utf8_from_bmp(contents)?)),
        Tag::UNIVERSAL_STRING => (0x0c, fold_string(&utf8_from_universal(contents)?)),
        Tag::TELETEX_STRING => (0x0c, fold_string(&utf8_from_teletex(contents))),
        _ => {
            let mut out = Vec::with_capacity(raw_tlv.len());
            out.extend_from_slice(raw_tlv);
            return Ok(out);
        }
    };
    let mut out = Vec::with_capacity(value.len() + 4);
    push_tlv(&mut out, out_tag, value.as_bytes());
    Ok(out)
}

/// Normalizes an RDNSequence *value* (the content octets of the Name
/// SEQUENCE). Returns the canonical encoding used for all DN equality
/// tests in this crate.
pub fn normalize_name(rdn_sequence: &[u8]) -> Result<Vec<u8>> {
    let mut reader = Reader::new(rdn_sequence);
    let mut out = Vec::with_capacity(rdn_sequence.len());

    while reader.has_more() {
        let rdn = reader.read_tag(Tag::SET)?;
        let mut rdn_reader = Reader::new(rdn);
        if !rdn_reader.has_more() {
            return Err(DecodeError::malformed(
                "RelativeDistinguishedName must contain at least one attribute",
            ));
        }

        let mut attributes: Vec<Vec<u8>> = Vec::new();
        while rdn_reader.has_more() {
            let mut attribute_reader = Reader::new(rdn_reader.read_tag(Tag::SEQUENCE)?);
            let type_tlv = attribute_reader.read_raw_tlv()?;
            Reader::new(type_tlv).read_oid()?;

            let mut probe = attribute_reader;
            let value_tlv = probe.read_raw_tlv()?;
            let (value_tag, value_contents) = attribute_reader.read_tlv()?;
            attribute_reader.expect_empty()?;

            let normalized = normalize_value(value_tag, value_contents, value_tlv)?;
            let mut attribute = Vec::with_capacity(type_tlv.len() + normalized.len() + 4);
            attribute.extend_from_slice(type_tlv);
            attribute.extend_from_slice(&normalized);

            let mut encoded = Vec::with_capacity(attribute.len() + 4);
            push_tlv(&mut encoded, 0x30, &attribute);
            attributes.push(encoded);
        }

        // DER SET OF orders elements by their encoded octets; sorting here
        // keeps normalization idempotent even for mis-sorted inputs.
        attributes.sort();
        let mut set_contents = Vec::new();
        for attribute in &attributes {
            set_contents.extend_from_slice(attribute);
        }
        push_tlv(&mut out, 0x31, &set_contents);
    }

    Ok(out)
}

/// Collects `emailAddress` attribute values (IA5String) from an
/// RDNSequence value, for the legacy case where rfc822 name constraints
/// apply to the subject itself.
pub fn find_email_addresses_in_name(rdn_sequence: &[u8]) -> Result<Vec<String>> {
    let mut reader = Reader::new(rdn_sequence);
    let mut addresses = Vec::new();

    while reader.has_more() {
        let mut rdn_reader = Reader::new(reader.read_tag(Tag::SET)?);
        while rdn_reader.has_more() {
            let mut attribute_reader = Reader::new(rdn_reader.read_tag(Tag::SEQUENCE)?);
            let attribute_type = attribute_reader.read_oid()?;
            let (value_tag, value_contents) = attribute_reader.read_tlv()?;
            attribute_reader.expect_empty()?;

            if attribute_type == oid::EMAIL_ADDRESS && value_tag == Tag::IA5_STRING {
                let address = core::str::from_utf8(value_contents)
                    .ok()
                    .filter(|s| s.is_ascii())
                    .ok_or_else(|| DecodeError::malformed("emailAddress is not ASCII"))?;
                addresses.push(String::from(address));
            }
        }
    }

    Ok(addresses)
}

/// Returns true iff `name` is within the subtree defined by `subtree`:
/// its first `k` RDNs equal `subtree`'s `k` RDNs (under normalization)
/// and it has at least `k` RDNs. An empty subtree contains every name.
pub fn verify_name_in_subtree(name: &[u8], subtree: &[u8]) -> bool {
    let (Ok(name), Ok(subtree)) = (normalize_name(name), normalize_name(subtree)) else {
        return false;
    };
    let mut name_reader = Reader::new(&name);
    let mut subtree_reader = Reader::new(&subtree);

    while subtree_reader.has_more() {
        let (Ok(subtree_rdn), Ok(name_rdn)) =
            (subtree_reader.read_raw_tlv(), name_reader.read_raw_tlv())
        else {
            return false;
        };
        if subtree_rdn != name_rdn {
            return false;
        }
    }
    true
}

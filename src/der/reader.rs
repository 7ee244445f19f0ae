use alloc::vec::Vec;

use crate::der::parser;
use crate::error::{
    DecodeError, IntegerOverflowSnafu, InvalidBitStringSnafu, InvalidBoolSnafu,
    InvalidIntegerSnafu, MismatchedTagSnafu, TrailingDataSnafu,
};
use crate::types::{BitString, Tag};

type Result<T> = core::result::Result<T, DecodeError>;

/// A cursor over a borrowed DER byte range.
///
/// Reads advance the cursor; any failure leaves the remaining input
/// unconsumed so the enclosing parser can surface a precise error. All
/// returned slices borrow from the reader's input.
#[derive(Clone, Copy, Debug)]
pub struct Reader<'a> {
    input: &'a [u8],
}

impl<'a> Reader<'a> {
    /// Creates a reader over `input`.
    pub fn new(input: &'a [u8]) -> Self {
        Self { input }
    }

    /// Whether any bytes remain.
    pub fn has_more(&self) -> bool {
        !self.input.is_empty()
    }

    /// Fails with [`DecodeError::TrailingData`] when bytes remain.
    pub fn expect_empty(&self) -> Result<()> {
        if self.input.is_empty() {
            Ok(())
        } else {
            TrailingDataSnafu {
                length: self.input.len(),
            }
            .fail()
        }
    }

    /// Parses the next identifier without advancing.
    pub fn peek_tag(&self) -> Option<Tag> {
        parser::parse_identifier(self.input).ok().map(|(_, tag)| tag)
    }

    /// Reads the next TLV, returning its tag and content octets.
    pub fn read_tlv(&mut self) -> Result<(Tag, &'a [u8])> {
        let (rest, (tag, contents)) = parser::parse_value(self.input)?;
        self.input = rest;
        Ok((tag, contents))
    }

    /// Reads the next TLV including its header, for re-embedding.
    pub fn read_raw_tlv(&mut self) -> Result<&'a [u8]> {
        let (rest, _) = parser::parse_value(self.input)?;
        let consumed = self.input.len() - rest.len();
        let raw = &self.input[..consumed];
        self.input = rest;
        Ok(raw)
    }

    /// Reads the next TLV and checks its tag.
    pub fn read_tag(&mut self, tag: Tag) -> Result<&'a [u8]> {
        let (rest, (actual, contents)) = parser::parse_value(self.input)?;
        if actual != tag {
            return MismatchedTagSnafu {
                expected: tag,
                actual,
            }
            .fail();
        }
        self.input = rest;
        Ok(contents)
    }

    /// If the next element carries `tag`, consumes it and returns the
    /// content octets; otherwise leaves the input alone and returns
    /// `None`. An empty reader reports the element as absent.
    pub fn read_optional(&mut self, tag: Tag) -> Result<Option<&'a [u8]>> {
        if self.input.is_empty() {
            return Ok(None);
        }
        let (rest, (actual, contents)) = parser::parse_value(self.input)?;
        if actual != tag {
            return Ok(None);
        }
        self.input = rest;
        Ok(Some(contents))
    }

    /// Reads a SEQUENCE and returns a reader over its contents.
    pub fn read_sequence(&mut self) -> Result<Reader<'a>> {
        Ok(Reader::new(self.read_tag(Tag::SEQUENCE)?))
    }

    /// Reads a BOOLEAN. DER restricts the content to a single octet that
    /// is either 0x00 or 0xFF.
    pub fn read_bool(&mut self) -> Result<bool> {
        let contents = self.read_tag(Tag::BOOLEAN)?;
        decode_bool(contents)
    }

    /// Reads a BOOLEAN if one is next.
    pub fn read_optional_bool(&mut self) -> Result<Option<bool>> {
        match self.read_optional(Tag::BOOLEAN)? {
            Some(contents) => Ok(Some(decode_bool(contents)?)),
            None => Ok(None),
        }
    }

    /// Reads an INTEGER and returns the content octets after checking the
    /// encoding is minimal.
    pub fn read_integer(&mut self) -> Result<&'a [u8]> {
        let contents = self.read_tag(Tag::INTEGER)?;
        is_valid_integer(contents)?;
        Ok(contents)
    }

    /// Reads a non-negative INTEGER bounded by `u64`.
    pub fn read_u64(&mut self) -> Result<u64> {
        let contents = self.read_integer()?;
        decode_unsigned(contents, 64)
    }

    /// Reads a non-negative INTEGER bounded by `u8`.
    pub fn read_u8(&mut self) -> Result<u8> {
        let contents = self.read_integer()?;
        Ok(decode_unsigned(contents, 8)? as u8)
    }

    /// Reads an OCTET STRING.
    pub fn read_octet_string(&mut self) -> Result<&'a [u8]> {
        self.read_tag(Tag::OCTET_STRING)
    }

    /// Reads an OBJECT IDENTIFIER and returns its content octets.
    pub fn read_oid(&mut self) -> Result<&'a [u8]> {
        let contents = self.read_tag(Tag::OBJECT_IDENTIFIER)?;
        if contents.is_empty() || contents[contents.len() - 1] & 0x80 != 0 {
            return Err(DecodeError::malformed("OBJECT IDENTIFIER is malformed"));
        }
        Ok(contents)
    }

    /// Reads a BIT STRING, validating the unused-bit count and that the
    /// masked trailing bits are zero.
    pub fn read_bit_string(&mut self) -> Result<BitString> {
        let contents = self.read_tag(Tag::BIT_STRING)?;
        decode_bit_string(contents)
    }
}

fn decode_bool(contents: &[u8]) -> Result<bool> {
    match contents {
        [0x00] => Ok(false),
        [0xff] => Ok(true),
        _ => InvalidBoolSnafu.fail(),
    }
}

/// Validates an INTEGER content per X.690 8.3: non-empty and minimally
/// encoded. Returns whether the value is negative.
pub fn is_valid_integer(contents: &[u8]) -> Result<bool> {
    if contents.is_empty() {
        return InvalidIntegerSnafu.fail();
    }
    if contents.len() > 1
        && ((contents[0] == 0x00 && contents[1] & 0x80 == 0)
            || (contents[0] == 0xff && contents[1] & 0x80 != 0))
    {
        return InvalidIntegerSnafu.fail();
    }
    Ok(contents[0] & 0x80 != 0)
}

pub(crate) fn decode_unsigned(contents: &[u8], max_width: u32) -> Result<u64> {
    if contents[0] & 0x80 != 0 {
        return InvalidIntegerSnafu.fail();
    }
    // A valid non-negative INTEGER has at most one leading zero octet.
    let magnitude = if contents[0] == 0 {
        &contents[1..]
    } else {
        contents
    };
    if magnitude.len() > (max_width / 8) as usize {
        return IntegerOverflowSnafu { max_width }.fail();
    }
    let mut value: u64 = 0;
    for byte in magnitude {
        value = value << 8 | u64::from(*byte);
    }
    Ok(value)
}

pub(crate) fn decode_bit_string(contents: &[u8]) -> Result<BitString> {
    let Some((&unused_bits, bytes)) = contents.split_first() else {
        return InvalidBitStringSnafu { unused_bits: 0u8 }.fail();
    };
    BitString::new(Vec::from(bytes), unused_bits)
        .ok_or_else(|| InvalidBitStringSnafu { unused_bits }.build())
}

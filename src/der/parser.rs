use nom::IResult;

use crate::error::{
    DecodeError, IndefiniteLengthNotAllowedSnafu, NonMinimalLengthSnafu, TruncatedSnafu,
};
use crate::types::{Class, Tag};

type Result<T> = core::result::Result<T, DecodeError>;

fn map_nom<'a, T>(result: IResult<&'a [u8], T>) -> Result<(&'a [u8], T)> {
    match result {
        Ok(value) => Ok(value),
        Err(_) => TruncatedSnafu.fail(),
    }
}

/// Parses a complete identifier: class and constructed bit from the
/// initial octet, plus the tag number in either the low form or the
/// X.690 high (multi-byte) form.
pub(crate) fn parse_identifier(input: &[u8]) -> Result<(&[u8], Tag)> {
    let (input, octet) = map_nom(nom::bytes::complete::take(1usize)(input))?;
    let initial = octet[0];

    let class = Class::from_bits(initial >> 6);
    let constructed = initial & 0x20 != 0;
    let low_number = u32::from(initial & 0x1f);

    if low_number != 0x1f {
        return Ok((input, Tag::new(class, low_number, constructed)));
    }

    let (input, number) = parse_encoded_number(input)?;
    // X.690 8.1.2.4.2: the high form must not be used for numbers that
    // fit the low form, and must not have a padded leading octet.
    if number < 0x1f {
        return NonMinimalLengthSnafu.fail();
    }
    Ok((input, Tag::new(class, number, constructed)))
}

/// Concatenates a series of base-128 digits delimited by a set high bit
/// and terminated by an octet with the high bit clear.
fn parse_encoded_number(input: &[u8]) -> Result<(&[u8], u32)> {
    let (input, body) = map_nom(nom::bytes::complete::take_while(|i: u8| i & 0x80 != 0)(
        input,
    ))?;
    let (input, end) = map_nom(nom::bytes::complete::take(1usize)(input))?;

    if body.first() == Some(&0x80) {
        return NonMinimalLengthSnafu.fail();
    }

    let mut number: u32 = 0;
    for byte in body.iter().chain(end.iter()) {
        number = number
            .checked_mul(128)
            .ok_or_else(|| NonMinimalLengthSnafu.build())?;
        number |= u32::from(byte & 0x7f);
    }
    Ok((input, number))
}

/// Parses a definite length. The indefinite form and non-minimal
/// long-form encodings are rejected, per DER.
pub(crate) fn parse_length(input: &[u8]) -> Result<(&[u8], usize)> {
    let (input, first) = map_nom(nom::bytes::complete::take(1usize)(input))?;
    let first = first[0];

    if first == 0x80 {
        return IndefiniteLengthNotAllowedSnafu.fail();
    }
    if first < 0x80 {
        return Ok((input, usize::from(first)));
    }

    let count = usize::from(first & 0x7f);
    if count > core::mem::size_of::<usize>() {
        // Longer than any input this reader could be holding.
        return TruncatedSnafu.fail();
    }
    let (input, bytes) = map_nom(nom::bytes::complete::take(count)(input))?;

    let mut length: usize = 0;
    for byte in bytes {
        length = length << 8 | usize::from(*byte);
    }
    // X.690 10.1: the minimum number of octets, so no leading zero octet
    // and no long form for lengths the short form can express.
    if bytes[0] == 0 || length < 0x80 {
        return NonMinimalLengthSnafu.fail();
    }
    Ok((input, length))
}

/// Parses one TLV, returning the tag and the content octets.
pub(crate) fn parse_value(input: &[u8]) -> Result<(&[u8], (Tag, &[u8]))> {
    let (input, tag) = parse_identifier(input)?;
    let (input, length) = parse_length(input)?;
    let (input, contents) = map_nom(nom::bytes::complete::take(length)(input))?;
    Ok((input, (tag, contents)))
}

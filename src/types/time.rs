//! X.509 `Time` values.
//!
//! Both UTCTime (`YYMMDDHHMMSSZ`) and GeneralizedTime (`YYYYMMDDHHMMSSZ`)
//! normalize into the same value type, so the verifier only ever compares
//! one kind of timestamp. All X.509 times are Zulu, making a naive
//! date-time sufficient.

use chrono::NaiveDate;

use crate::error::{DecodeError, InvalidTimeSnafu};

/// The normalized form of an X.509 `Time`.
pub type GeneralizedTime = chrono::NaiveDateTime;

fn read_digit(b: u8) -> Result<u32, DecodeError> {
    if b.is_ascii_digit() {
        Ok(u32::from(b - b'0'))
    } else {
        InvalidTimeSnafu.fail()
    }
}

fn read_two_digits(input: &[u8]) -> Result<u32, DecodeError> {
    Ok(read_digit(input[0])? * 10 + read_digit(input[1])?)
}

/// Parses the fields shared by both time forms: `MMDDHHMMSSZ` following
/// an already-determined year.
fn from_fields(year: i32, input: &[u8]) -> Result<GeneralizedTime, DecodeError> {
    let month = read_two_digits(&input[0..2])?;
    let day = read_two_digits(&input[2..4])?;
    let hour = read_two_digits(&input[4..6])?;
    let minute = read_two_digits(&input[6..8])?;
    let second = read_two_digits(&input[8..10])?;
    if input[10] != b'Z' {
        return InvalidTimeSnafu.fail();
    }

    // Field range validation (month 1-12, day valid for the month and
    // year including leap years) comes from the calendar itself.
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .ok_or_else(|| InvalidTimeSnafu.build())
}

/// Parses a UTCTime content (`YYMMDDHHMMSSZ`), windowing two-digit years
/// per RFC 5280: 00-49 map to 20YY and 50-99 map to 19YY.
pub fn parse_utc_time(content: &[u8]) -> Result<GeneralizedTime, DecodeError> {
    if content.len() != 13 {
        return InvalidTimeSnafu.fail();
    }
    let yy = read_two_digits(&content[0..2])?;
    let year = if yy >= 50 { 1900 + yy } else { 2000 + yy };
    from_fields(year as i32, &content[2..])
}

/// Parses a GeneralizedTime content (`YYYYMMDDHHMMSSZ`). Fractional
/// seconds and offsets are not valid in certificates and are rejected.
pub fn parse_generalized_time(content: &[u8]) -> Result<GeneralizedTime, DecodeError> {
    if content.len() != 15 {
        return InvalidTimeSnafu.fail();
    }
    let year = read_two_digits(&content[0..2])? * 100 + read_two_digits(&content[2..4])?;
    from_fields(year as i32, &content[4..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymdhms(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> GeneralizedTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn utc_time_year_windowing() {
        assert_eq!(
            parse_utc_time(b"490101000000Z").unwrap(),
            ymdhms(2049, 1, 1, 0, 0, 0)
        );
        assert_eq!(
            parse_utc_time(b"500101000000Z").unwrap(),
            ymdhms(1950, 1, 1, 0, 0, 0)
        );
    }

    #[test]
    fn generalized_time_full_year() {
        assert_eq!(
            parse_generalized_time(b"20240229120000Z").unwrap(),
            ymdhms(2024, 2, 29, 12, 0, 0)
        );
    }

    #[test]
    fn rejects_invalid_calendar_dates() {
        // 2023 is not a leap year.
        assert!(parse_generalized_time(b"20230229120000Z").is_err());
        assert!(parse_generalized_time(b"20230431120000Z").is_err());
        assert!(parse_generalized_time(b"20230101240000Z").is_err());
        assert!(parse_generalized_time(b"20230101006000Z").is_err());
    }

    #[test]
    fn rejects_missing_zulu_and_fractions() {
        assert!(parse_generalized_time(b"20230101000000+").is_err());
        assert!(parse_generalized_time(b"20230101000000.5Z").is_err());
        assert!(parse_utc_time(b"2301010000Z").is_err());
    }

    #[test]
    fn ordering_is_chronological() {
        let earlier = parse_utc_time(b"230101000000Z").unwrap();
        let later = parse_generalized_time(b"20230101000001Z").unwrap();
        assert!(earlier < later);
    }
}

//! CIM datetime values.
//!
//! Two 25-character forms exist:
//!
//! ```text
//! yyyymmddhhmmss.mmmmmmsutc   timestamp, s is '+' or '-', utc in minutes
//! ddddddddhhmmss.mmmmmm:000   interval
//! ```
//!
//! Trailing fields may be replaced by asterisks. Once a field is
//! wildcarded every later digit must be too; the UTC offset never is.

use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Length of every datetime string.
pub const DATETIME_LEN: usize = 25;

const USEC_PER_SECOND: u64 = 1_000_000;
const USEC_PER_MINUTE: u64 = 60 * USEC_PER_SECOND;
const USEC_PER_HOUR: u64 = 60 * USEC_PER_MINUTE;
const USEC_PER_DAY: u64 = 24 * USEC_PER_HOUR;

/// Which of the two datetime forms a value uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DateTimeKind {
    /// A point in time with a UTC offset.
    TimeStamp,
    /// A duration.
    Interval,
}

/// A parsed CIM datetime.
///
/// The canonical text is kept as given so encoding reproduces it exactly.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DateTime {
    text: String,
    kind: DateTimeKind,
    wildcarded: bool,
}

impl Default for DateTime {
    /// The zero interval, `00000000000000.000000:000`.
    fn default() -> Self {
        Self {
            text: "00000000000000.000000:000".into(),
            kind: DateTimeKind::Interval,
            wildcarded: false,
        }
    }
}

/// Cursor over the fixed-width fields.
struct Fields<'a> {
    bytes: &'a [u8],
    pos: usize,
    prior_wildcards: bool,
}

impl<'a> Fields<'a> {
    /// Read an `n`-digit field. `None` means the field is all asterisks.
    fn component(&mut self, n: usize) -> Result<Option<u32>, ()> {
        let field = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        if field.iter().all(|&b| b == b'*') {
            self.prior_wildcards = true;
            return Ok(None);
        }
        if self.prior_wildcards {
            return Err(());
        }
        digits(field).map(Some).ok_or(())
    }

    /// Read the 6-digit microseconds field, which may be partially wildcarded.
    fn microseconds(&mut self) -> Result<(u32, bool), ()> {
        let field = &self.bytes[self.pos..self.pos + 6];
        self.pos += 6;
        if self.prior_wildcards && field[0] != b'*' {
            return Err(());
        }
        let significant = field.iter().take_while(|b| b.is_ascii_digit()).count();
        if !field[significant..].iter().all(|&b| b == b'*') {
            return Err(());
        }
        let mut value = digits(&field[..significant]).unwrap_or(0);
        for _ in significant..6 {
            value *= 10;
        }
        Ok((value, significant < 6))
    }

    fn expect(&mut self, c: u8) -> Result<(), ()> {
        if self.bytes.get(self.pos) == Some(&c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(())
        }
    }
}

fn digits(field: &[u8]) -> Option<u32> {
    field.iter().try_fold(0u32, |acc, &b| {
        b.is_ascii_digit().then(|| acc * 10 + u32::from(b - b'0'))
    })
}

fn is_leap_year(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Days from 0000-01-01 to the start of `year`.
fn days_before_year(year: u32) -> u64 {
    if year == 0 {
        return 0;
    }
    let y = u64::from(year - 1);
    // Year 0 is a leap year in the proleptic Gregorian calendar.
    365 * u64::from(year) + y / 4 - y / 100 + y / 400 + 1
}

impl DateTime {
    /// Parse a datetime string.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidDateTime`] if the string is not a
    /// well-formed timestamp or interval, or a field is out of range.
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        let invalid = || ModelError::InvalidDateTime(s.into());
        let bytes = s.as_bytes();
        if bytes.len() != DATETIME_LEN || !s.is_ascii() {
            return Err(invalid());
        }

        let mut f = Fields {
            bytes,
            pos: 0,
            prior_wildcards: false,
        };

        let (kind, wildcarded) = match bytes[21] {
            b':' => {
                let _days = f.component(8).map_err(|()| invalid())?;
                let hours = f.component(2).map_err(|()| invalid())?;
                let minutes = f.component(2).map_err(|()| invalid())?;
                let seconds = f.component(2).map_err(|()| invalid())?;
                f.expect(b'.').map_err(|()| invalid())?;
                let (_usec, partial) = f.microseconds().map_err(|()| invalid())?;
                f.expect(b':').map_err(|()| invalid())?;
                if &bytes[22..] != b"000" {
                    return Err(invalid());
                }
                if hours.is_some_and(|h| h > 23)
                    || minutes.is_some_and(|m| m > 59)
                    || seconds.is_some_and(|s| s > 59)
                {
                    return Err(invalid());
                }
                (DateTimeKind::Interval, f.prior_wildcards || partial)
            }
            b'+' | b'-' => {
                let year = f.component(4).map_err(|()| invalid())?;
                let month = f.component(2).map_err(|()| invalid())?;
                let day = f.component(2).map_err(|()| invalid())?;
                let hours = f.component(2).map_err(|()| invalid())?;
                let minutes = f.component(2).map_err(|()| invalid())?;
                let seconds = f.component(2).map_err(|()| invalid())?;
                f.expect(b'.').map_err(|()| invalid())?;
                let (_usec, partial) = f.microseconds().map_err(|()| invalid())?;
                if digits(&bytes[22..]).is_none() {
                    return Err(invalid());
                }
                if let Some(m) = month {
                    if !(1..=12).contains(&m) {
                        return Err(invalid());
                    }
                    if let Some(d) = day {
                        if d < 1 || d > days_in_month(year.unwrap_or(0), m) {
                            return Err(invalid());
                        }
                    }
                }
                if hours.is_some_and(|h| h > 23)
                    || minutes.is_some_and(|m| m > 59)
                    || seconds.is_some_and(|s| s > 59)
                {
                    return Err(invalid());
                }
                (DateTimeKind::TimeStamp, f.prior_wildcards || partial)
            }
            _ => return Err(invalid()),
        };

        Ok(Self {
            text: s.into(),
            kind,
            wildcarded,
        })
    }

    /// Get the form of this value.
    #[must_use]
    pub const fn kind(&self) -> DateTimeKind {
        self.kind
    }

    /// Check if this is an interval.
    #[must_use]
    pub fn is_interval(&self) -> bool {
        self.kind == DateTimeKind::Interval
    }

    /// Check if this is a timestamp.
    #[must_use]
    pub fn is_timestamp(&self) -> bool {
        self.kind == DateTimeKind::TimeStamp
    }

    /// Check if any field is wildcarded.
    #[must_use]
    pub const fn has_wildcards(&self) -> bool {
        self.wildcarded
    }

    /// Get the canonical 25-character text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// UTC offset in minutes (zero for intervals).
    #[must_use]
    pub fn utc_offset_minutes(&self) -> i32 {
        if self.is_interval() {
            return 0;
        }
        let bytes = self.text.as_bytes();
        let magnitude = digits(&bytes[22..]).map_or(0, |v| v as i32);
        if bytes[21] == b'-' {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Convert to microseconds.
    ///
    /// Intervals yield their duration. Timestamps yield microseconds since
    /// 0000-01-01 00:00 in UTC (the offset is subtracted).
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidDateTime`] for wildcarded values.
    pub fn to_microseconds(&self) -> Result<u64, ModelError> {
        if self.wildcarded {
            return Err(ModelError::InvalidDateTime(self.text.clone()));
        }
        let b = self.text.as_bytes();
        let n = |range: std::ops::Range<usize>| u64::from(digits(&b[range]).unwrap_or(0));
        let time = n(8..10) * USEC_PER_HOUR
            + n(10..12) * USEC_PER_MINUTE
            + n(12..14) * USEC_PER_SECOND
            + n(15..21);
        match self.kind {
            DateTimeKind::Interval => Ok(n(0..8) * USEC_PER_DAY + time),
            DateTimeKind::TimeStamp => {
                let year = digits(&b[0..4]).unwrap_or(0);
                let month = digits(&b[4..6]).unwrap_or(1);
                let mut days = days_before_year(year);
                for m in 1..month {
                    days += u64::from(days_in_month(year, m));
                }
                days += n(6..8).saturating_sub(1);
                let local = days * USEC_PER_DAY + time;
                let offset = i64::from(self.utc_offset_minutes()) * USEC_PER_MINUTE as i64;
                Ok(local.saturating_add_signed(-offset))
            }
        }
    }
}

impl FromStr for DateTime {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

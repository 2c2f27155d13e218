//! String to number conversions for CIM literals.
//!
//! Integer literals are parsed generically into 64 bits first and then
//! range-checked against the declared type, so a syntax error and an
//! out-of-range value stay distinguishable.

use crate::model::CimType;

/// Parse an unsigned integer literal.
///
/// Accepted forms, tried in order:
///
/// - decimal: `0` or a non-zero digit followed by digits
/// - hexadecimal: `0x` or `0X` followed by one or more hex digits
/// - octal: `0` followed by one or more octal digits
/// - binary: one or more binary digits followed by `b` or `B`
///
/// Returns `None` on syntax error or 64-bit overflow.
#[must_use]
pub fn parse_unsigned(s: &str) -> Option<u64> {
    parse_decimal(s)
        .or_else(|| parse_hex(s))
        .or_else(|| parse_octal(s))
        .or_else(|| parse_binary(s))
}

/// Parse a signed integer literal: an optional `+` or `-` followed by any
/// form accepted by [`parse_unsigned`].
#[must_use]
pub fn parse_signed(s: &str) -> Option<i64> {
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let magnitude = parse_unsigned(rest)?;
    if negative {
        if magnitude > 1u64 << 63 {
            return None;
        }
        Some((magnitude as i64).wrapping_neg())
    } else {
        i64::try_from(magnitude).ok()
    }
}

/// Decimal: `0` exactly, or no leading zeros.
fn parse_decimal(s: &str) -> Option<u64> {
    let bytes = s.as_bytes();
    match bytes.first() {
        None => return None,
        Some(b'0') => return if bytes.len() == 1 { Some(0) } else { None },
        Some(_) => {}
    }
    let mut x: u64 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        x = x.checked_mul(10)?.checked_add(u64::from(b - b'0'))?;
    }
    Some(x)
}

fn parse_hex(s: &str) -> Option<u64> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
    parse_radix(digits, 16)
}

fn parse_octal(s: &str) -> Option<u64> {
    let digits = s.strip_prefix('0')?;
    parse_radix(digits, 8)
}

fn parse_binary(s: &str) -> Option<u64> {
    let digits = s.strip_suffix('b').or_else(|| s.strip_suffix('B'))?;
    parse_radix(digits, 2)
}

/// At least one digit of `radix`, nothing else, no overflow.
fn parse_radix(digits: &str, radix: u32) -> Option<u64> {
    if digits.is_empty() {
        return None;
    }
    let mut x: u64 = 0;
    for c in digits.chars() {
        let d = c.to_digit(radix)?;
        x = x.checked_mul(u64::from(radix))?.checked_add(u64::from(d))?;
    }
    Some(x)
}

/// Check that `x` fits the unsigned type `ty`.
///
/// Returns `false` for non-unsigned types.
#[must_use]
pub fn check_uint_bounds(x: u64, ty: CimType) -> bool {
    match ty {
        CimType::Uint8 => x <= u64::from(u8::MAX),
        CimType::Uint16 => x <= u64::from(u16::MAX),
        CimType::Uint32 => x <= u64::from(u32::MAX),
        CimType::Uint64 => true,
        _ => false,
    }
}

/// Check that `x` fits the signed type `ty`.
///
/// Returns `false` for non-signed types.
#[must_use]
pub fn check_sint_bounds(x: i64, ty: CimType) -> bool {
    match ty {
        CimType::Sint8 => i8::try_from(x).is_ok(),
        CimType::Sint16 => i16::try_from(x).is_ok(),
        CimType::Sint32 => i32::try_from(x).is_ok(),
        CimType::Sint64 => true,
        _ => false,
    }
}

/// Parse a real literal.
///
/// Grammar: `[+|-] *digit "." 1*digit [(e|E) [+|-] 1*digit]`. The special
/// forms `NaN`, `INF` and `-INF` are also accepted.
#[must_use]
pub fn parse_real(s: &str) -> Option<f64> {
    match s {
        "NaN" => return Some(f64::NAN),
        "INF" | "+INF" => return Some(f64::INFINITY),
        "-INF" => return Some(f64::NEG_INFINITY),
        _ => {}
    }

    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    if bytes.get(i) != Some(&b'.') {
        return None;
    }
    i += 1;
    let frac_start = i;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    if i == frac_start {
        return None;
    }
    if i < bytes.len() {
        if !matches!(bytes[i], b'e' | b'E') {
            return None;
        }
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exp_start = i;
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        if i == exp_start || i != bytes.len() {
            return None;
        }
    }

    let x: f64 = s.parse().ok()?;
    if x.is_infinite() {
        return None;
    }
    Some(x)
}

/// Parse a boolean literal, case-insensitively.
#[must_use]
pub fn parse_boolean(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Render a real32 as `d.dddddddde+XX`.
#[must_use]
pub fn format_real32(x: f32) -> String {
    if let Some(special) = special_real(f64::from(x)) {
        return special.into();
    }
    c_exponent(&format!("{x:.8e}"))
}

/// Render a real64 as `d.dddddddddddddddde+XX`.
#[must_use]
pub fn format_real64(x: f64) -> String {
    if let Some(special) = special_real(x) {
        return special.into();
    }
    c_exponent(&format!("{x:.16e}"))
}

fn special_real(x: f64) -> Option<&'static str> {
    if x.is_nan() {
        Some("NaN")
    } else if x == f64::INFINITY {
        Some("INF")
    } else if x == f64::NEG_INFINITY {
        Some("-INF")
    } else {
        None
    }
}

/// Rewrite Rust's `1.5e-7` exponent into the C `1.5e-07` shape.
fn c_exponent(s: &str) -> String {
    let Some((mantissa, exp)) = s.split_once('e') else {
        return s.into();
    };
    let (sign, digits) = match exp.strip_prefix('-') {
        Some(d) => ('-', d),
        None => ('+', exp),
    };
    if digits.len() < 2 {
        format!("{mantissa}e{sign}0{digits}")
    } else {
        format!("{mantissa}e{sign}{digits}")
    }
}

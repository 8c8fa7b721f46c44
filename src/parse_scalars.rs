//! Implicit typing of scalar text.
//!
//! Quoted and empty scalars are strings. Everything else is tried against a
//! fixed precedence of literal grammars keyed on the first character; each
//! failed attempt falls through to the next candidate and finally to string.
//! Integers may group digits with single `_` separators; floats may not.
//! Nothing in here can fail.

use std::borrow::Cow;

use crate::events::ScalarStyle;
use crate::node::Scalar;

/// Resolve the raw text of a scalar event into a typed value.
pub fn resolve_scalar(value: &str, style: ScalarStyle) -> Scalar {
    if value.is_empty() || style.is_quoted() {
        return Scalar::String(value.to_owned());
    }
    resolve_plain(value).unwrap_or_else(|| Scalar::String(value.to_owned()))
}

fn resolve_plain(value: &str) -> Option<Scalar> {
    let bytes = value.as_bytes();
    // Start of the part whose first character gates the numeric path.
    let mut numstart = 0;

    match bytes[0] {
        b'.' => match &value[1..] {
            "NaN" | "nan" => return Some(Scalar::Float(f64::NAN)),
            "Inf" | "inf" => return Some(Scalar::Float(f64::INFINITY)),
            _ => {}
        },
        b'0' => match bytes.get(1) {
            Some(b'x') => {
                if let Some(scalar) = parse_radix(&value[2..], 16) {
                    return Some(scalar);
                }
            }
            Some(b'0'..=b'8') => {
                if let Some(scalar) = parse_radix(&value[1..], 8) {
                    return Some(scalar);
                }
            }
            None => return Some(Scalar::Integer(0)),
            Some(_) => {}
        },
        sign @ (b'-' | b'+') => {
            if matches!(&value[1..], ".Inf" | ".inf") {
                return Some(Scalar::Float(if sign == b'-' {
                    f64::NEG_INFINITY
                } else {
                    f64::INFINITY
                }));
            }
            numstart = 1;
        }
        b'n' => return (value == "null").then_some(Scalar::Null),
        b't' => return (value == "true").then_some(Scalar::Bool(true)),
        b'f' => return (value == "false").then_some(Scalar::Bool(false)),
        _ => {}
    }

    match bytes.get(numstart) {
        Some(b'0'..=b'9' | b'.') => parse_number(value),
        _ => None,
    }
}

/// Generic numeric path: base-10 integer, then float, each over the whole
/// text (sign included).
fn parse_number(value: &str) -> Option<Scalar> {
    let (negative, digits) = match value.as_bytes()[0] {
        b'-' => (true, &value[1..]),
        b'+' => (false, &value[1..]),
        _ => (false, value),
    };
    if let Some(digits) = strip_separators(digits) {
        if digits.bytes().all(|b| b.is_ascii_digit()) {
            return Some(match parse_decimal_i64(&digits, negative) {
                Some(int) => Scalar::Integer(int),
                None => {
                    let magnitude = digits.parse::<f64>().ok()?;
                    Scalar::Float(if negative { -magnitude } else { magnitude })
                }
            });
        }
    }
    parse_float(value).map(Scalar::Float)
}

/// Remove `_` digit separators. Each one must sit between two non-separator
/// characters; anything else (leading, trailing, doubled) is rejected, as is
/// empty text.
fn strip_separators(digits: &str) -> Option<Cow<'_, str>> {
    if !digits.contains('_') {
        return (!digits.is_empty()).then_some(Cow::Borrowed(digits));
    }
    if digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
        return None;
    }
    Some(Cow::Owned(digits.replace('_', "")))
}

fn parse_decimal_i64(digits: &str, negative: bool) -> Option<i64> {
    // Accumulate with the sign applied so that i64::MIN is representable.
    let mut val: i64 = 0;
    for b in digits.bytes() {
        let d = (b - b'0') as i64;
        val = val.checked_mul(10)?;
        val = if negative {
            val.checked_sub(d)?
        } else {
            val.checked_add(d)?
        };
    }
    Some(val)
}

/// Float grammar restricted to what may follow the numeric-path gate.
///
/// `str::parse::<f64>` also accepts spellings such as `infinity` or `NaN`;
/// those never reach this point because the caller requires a digit or `.`
/// after the optional sign, and the exact `.inf`/`.nan` literals are handled
/// before the numeric path.
fn parse_float(value: &str) -> Option<f64> {
    let unsigned = value.trim_start_matches(['+', '-']);
    if unsigned.len() + 1 < value.len() {
        return None;
    }
    if unsigned
        .bytes()
        .any(|b| !matches!(b, b'0'..=b'9' | b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        return None;
    }
    value.parse::<f64>().ok()
}

/// Parse `digits` (no prefix, no sign) in `radix`, requiring every character
/// to be a valid digit.
///
/// Magnitudes beyond `i64::MAX` become the nearest `Float` rather than being
/// truncated.
fn parse_radix(digits: &str, radix: u32) -> Option<Scalar> {
    let digits = strip_separators(digits)?;
    let mut exact: Option<u128> = Some(0);
    let mut approx: f64 = 0.0;
    for c in digits.chars() {
        let d = c.to_digit(radix)?;
        exact = exact
            .and_then(|v| v.checked_mul(radix as u128))
            .and_then(|v| v.checked_add(d as u128));
        approx = approx * radix as f64 + d as f64;
    }
    Some(match exact.and_then(|v| i64::try_from(v).ok()) {
        Some(int) => Scalar::Integer(int),
        None => match exact {
            Some(v) => Scalar::Float(v as f64),
            None => Scalar::Float(approx),
        },
    })
}

use crate::constants::{is_digit, is_token_continuation};
use crate::error::Error;
use crate::types::Value;
use crate::Result;

/// Which literal shapes a number scan accepts and returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Digit runs only.
    Integer,
    /// Any literal, always returned as a float.
    Float,
    /// Integer-looking literals stay integers.
    Either,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(value) => value as f64,
            Number::Float(value) => value,
        }
    }
}

impl From<Number> for Value {
    fn from(number: Number) -> Self {
        match number {
            Number::Int(value) => Value::Integer(value),
            Number::Float(value) => Value::Float(value),
        }
    }
}

/// Scans one numeric literal at `pos`.
///
/// A literal directly followed by a word byte is the start of a word, so the
/// scan fails at `pos` rather than returning the numeric prefix.
pub fn parse_number(input: &[u8], pos: usize, target: Target) -> Result<(Number, usize)> {
    let len = input.len();
    let expected = if target == Target::Integer {
        "integer"
    } else {
        "number"
    };
    let mut end = pos;
    let negative = match input.get(end) {
        Some(b'-') => {
            end += 1;
            true
        }
        Some(b'+') => {
            end += 1;
            false
        }
        Some(_) => false,
        None => return Err(Error::decode(pos, expected)),
    };
    let body = end;

    if target != Target::Integer {
        if let Some((value, special_end)) = special_float(input, body) {
            if at_boundary(input, special_end) {
                let value = if negative { -value } else { value };
                return Ok((Number::Float(value), special_end));
            }
        }
    }

    while end < len && is_digit(input[end]) {
        end += 1;
    }
    let int_digits = end - body;
    let mut is_float = false;

    if input.get(end) == Some(&b'.') {
        is_float = true;
        end += 1;
        let frac_start = end;
        while end < len && is_digit(input[end]) {
            end += 1;
        }
        if int_digits == 0 && end == frac_start {
            return Err(Error::decode(pos, expected));
        }
    } else if int_digits == 0 {
        return Err(Error::decode(pos, expected));
    }

    if matches!(input.get(end), Some(b'e' | b'E')) {
        is_float = true;
        end += 1;
        if matches!(input.get(end), Some(b'+' | b'-')) {
            end += 1;
        }
        let exp_start = end;
        while end < len && is_digit(input[end]) {
            end += 1;
        }
        if end == exp_start {
            return Err(Error::decode(pos, expected));
        }
    }

    if !at_boundary(input, end) {
        return Err(Error::decode(pos, "number"));
    }

    let digits = &input[body..end];
    let number = match (target, is_float) {
        (Target::Integer, true) => return Err(Error::decode(pos, "integer")),
        (Target::Integer, false) => match parse_int(digits, negative) {
            Some(value) => Number::Int(value),
            None => return Err(Error::decode(pos, "integer")),
        },
        (Target::Either, false) => match parse_int(digits, negative) {
            Some(value) => Number::Int(value),
            None => Number::Float(parse_float(digits, negative, pos)?),
        },
        (Target::Float, _) | (Target::Either, true) => {
            Number::Float(parse_float(digits, negative, pos)?)
        }
    };
    Ok((number, end))
}

#[inline]
fn at_boundary(input: &[u8], pos: usize) -> bool {
    input
        .get(pos)
        .map_or(true, |byte| !is_token_continuation(*byte))
}

fn special_float(input: &[u8], pos: usize) -> Option<(f64, usize)> {
    let word = input.get(pos..pos + 3)?;
    if word.eq_ignore_ascii_case(b"nan") {
        return Some((f64::NAN, pos + 3));
    }
    if !word.eq_ignore_ascii_case(b"inf") {
        return None;
    }
    let long = input
        .get(pos + 3..pos + 8)
        .is_some_and(|rest| rest.eq_ignore_ascii_case(b"inity"));
    Some((f64::INFINITY, if long { pos + 8 } else { pos + 3 }))
}

fn parse_int(digits: &[u8], negative: bool) -> Option<i64> {
    let mut value: i64 = 0;
    for byte in digits {
        let digit = i64::from(byte - b'0');
        value = value.checked_mul(10)?;
        value = if negative {
            value.checked_sub(digit)?
        } else {
            value.checked_add(digit)?
        };
    }
    Some(value)
}

fn parse_float(digits: &[u8], negative: bool, pos: usize) -> Result<f64> {
    let value: f64 = fast_float::parse(digits).map_err(|_| Error::decode(pos, "number"))?;
    Ok(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(b"42", Target::Either, Number::Int(42), 2)]
    #[case(b"-7;", Target::Either, Number::Int(-7), 2)]
    #[case(b"+3 ", Target::Integer, Number::Int(3), 2)]
    #[case(b"1.5;", Target::Either, Number::Float(1.5), 3)]
    #[case(b"2", Target::Float, Number::Float(2.0), 1)]
    #[case(b"1e-5)", Target::Either, Number::Float(1e-5), 4)]
    #[case(b"-2.5E+3", Target::Either, Number::Float(-2500.0), 7)]
    #[case(b"1.", Target::Either, Number::Float(1.0), 2)]
    #[case(b".5", Target::Either, Number::Float(0.5), 2)]
    #[case(b"-Infinity", Target::Either, Number::Float(f64::NEG_INFINITY), 9)]
    #[case(b"inf)", Target::Float, Number::Float(f64::INFINITY), 3)]
    #[case(b"3(", Target::Integer, Number::Int(3), 1)]
    #[case(b"-9223372036854775808", Target::Either, Number::Int(i64::MIN), 20)]
    #[case(b"99999999999999999999", Target::Either, Number::Float(1e20), 20)]
    fn test_parse_number(
        #[case] input: &[u8],
        #[case] target: Target,
        #[case] expected: Number,
        #[case] end: usize,
    ) {
        assert_eq!(parse_number(input, 0, target).unwrap(), (expected, end));
    }

    #[rstest]
    fn test_nan_is_float() {
        let (number, end) = parse_number(b"NaN ", 0, Target::Either).unwrap();
        assert!(matches!(number, Number::Float(value) if value.is_nan()));
        assert_eq!(end, 3);
    }

    #[rstest]
    #[case(b"1.5e3abc", "number")]
    #[case(b"12ab", "number")]
    #[case(b"nano", "number")]
    #[case(b"-", "number")]
    #[case(b".", "number")]
    #[case(b"1e", "number")]
    #[case(b"abc", "number")]
    #[case(b"", "number")]
    fn test_parse_number_failures(#[case] input: &[u8], #[case] expected: &str) {
        let err = parse_number(input, 0, Target::Either).unwrap_err();
        assert_eq!(err.offset(), Some(0));
        assert_eq!(err.expected(), Some(expected));
    }

    #[rstest]
    fn test_failure_reports_scan_start() {
        let input = b"x 1.5e3abc";
        let err = parse_number(input, 2, Target::Either).unwrap_err();
        assert_eq!(err.offset(), Some(2));
    }

    #[rstest]
    #[case(b"1.0")]
    #[case(b"1e3")]
    #[case(b"nan")]
    #[case(b"99999999999999999999")]
    #[case(b"abc")]
    #[case(b".5")]
    #[case(b"-")]
    #[case(b"1e")]
    #[case(b"")]
    fn test_integer_target_rejects(#[case] input: &[u8]) {
        let err = parse_number(input, 0, Target::Integer).unwrap_err();
        assert_eq!(err.expected(), Some("integer"));
        assert_eq!(err.offset(), Some(0));
    }

    #[rstest]
    fn test_integer_target_word_prefix_is_number() {
        let err = parse_number(b"12ab", 0, Target::Integer).unwrap_err();
        assert_eq!(err.expected(), Some("number"));
    }
}

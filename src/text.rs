// ============================================================================
// Text Codec
// Decimal string parsing with exact clamping, and canonical formatting
// ============================================================================

use crate::decimal128::{Decimal128, EXPONENT_MAX, EXPONENT_MIN, MAX_SIGNIFICAND_DIGITS};
use crate::errors::{DecimalError, DecimalResult};
use crate::flags;
use crate::uint128::UInt128;
use std::fmt;
use std::str::FromStr;
use tracing::trace;

// ============================================================================
// Parsing
// ============================================================================

/// Parse a decimal string.
///
/// Grammar (strict, no surrounding whitespace):
/// `sign? ( digits ( '.' digits? )? | '.' digits ) ( [eE] sign? digits )?`
/// plus the case-insensitive literals `Inf`/`Infinity` (optionally signed)
/// and `NaN`/`-NaN`.
pub(crate) fn parse(s: &str) -> DecimalResult<Decimal128> {
    if s.is_empty() {
        return Err(DecimalError::InvalidInput);
    }
    if let Some(special) = parse_special_literal(s) {
        return Ok(special);
    }

    let bytes = s.as_bytes();
    let mut pos = 0;

    let is_negative = match bytes[0] {
        b'-' => {
            pos += 1;
            true
        },
        b'+' => {
            pos += 1;
            false
        },
        _ => false,
    };

    let integer_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let integer_digits = &s[integer_start..pos];

    let mut fraction_digits = "";
    if pos < bytes.len() && bytes[pos] == b'.' {
        pos += 1;
        let fraction_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        fraction_digits = &s[fraction_start..pos];
    }

    // at least one digit on either side of the point
    if integer_digits.is_empty() && fraction_digits.is_empty() {
        return Err(DecimalError::InvalidInput);
    }

    let mut exponent: i64 = 0;
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        pos += 1;
        let exponent_negative = match bytes.get(pos) {
            Some(b'-') => {
                pos += 1;
                true
            },
            Some(b'+') => {
                pos += 1;
                false
            },
            _ => false,
        };

        let digits_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        let exponent_digits = &s[digits_start..pos];
        if exponent_digits.is_empty() {
            return Err(DecimalError::InvalidInput);
        }

        // exponent literals beyond i32 are a parse failure, not a clamp
        let magnitude = i32::from_str(exponent_digits).map_err(|_| DecimalError::InvalidInput)?;
        exponent = if exponent_negative {
            -(magnitude as i64)
        } else {
            magnitude as i64
        };
    }

    if pos != bytes.len() {
        return Err(DecimalError::InvalidInput);
    }

    // fold the fractional point into the exponent
    exponent -= fraction_digits.len() as i64;

    let mut coefficient = String::with_capacity(integer_digits.len() + fraction_digits.len());
    coefficient.push_str(integer_digits);
    coefficient.push_str(fraction_digits);
    let coefficient = strip_leading_zeros(&coefficient).to_string();

    let coefficient = clamp_or_round(&mut exponent, coefficient);

    if exponent > EXPONENT_MAX as i64 || exponent < EXPONENT_MIN as i64 {
        return Err(DecimalError::InvalidInput);
    }
    if coefficient.len() > MAX_SIGNIFICAND_DIGITS {
        return Err(DecimalError::InvalidInput);
    }

    let significand = UInt128::parse(&coefficient)?;
    Decimal128::from_components(is_negative, exponent as i32, significand)
}

fn parse_special_literal(s: &str) -> Option<Decimal128> {
    if s.eq_ignore_ascii_case("Inf")
        || s.eq_ignore_ascii_case("Infinity")
        || s.eq_ignore_ascii_case("+Inf")
        || s.eq_ignore_ascii_case("+Infinity")
    {
        return Some(Decimal128::POSITIVE_INFINITY);
    }
    if s.eq_ignore_ascii_case("-Inf") || s.eq_ignore_ascii_case("-Infinity") {
        return Some(Decimal128::NEGATIVE_INFINITY);
    }
    if s.eq_ignore_ascii_case("NaN") || s.eq_ignore_ascii_case("-NaN") {
        return Some(Decimal128::NAN);
    }
    None
}

fn strip_leading_zeros(digits: &str) -> &str {
    let stripped = digits.trim_start_matches('0');
    if stripped.is_empty() {
        "0"
    } else {
        stripped
    }
}

/// Bring the exponent and digit count into the representable bounds without
/// changing the value: trailing zero digits shift between the coefficient and
/// the exponent. Values the clamp cannot reach are left as-is for the
/// caller's range checks to reject.
fn clamp_or_round(exponent: &mut i64, coefficient: String) -> String {
    if *exponent > EXPONENT_MAX as i64 {
        if coefficient == "0" {
            // a zero coefficient takes any exponent; snap to the largest
            *exponent = EXPONENT_MAX as i64;
        } else {
            let zeros_to_add = *exponent - EXPONENT_MAX as i64;
            let digits_available = MAX_SIGNIFICAND_DIGITS as i64 - coefficient.len() as i64;
            if zeros_to_add <= digits_available {
                trace!(zeros_to_add, "clamping exponent down by padding coefficient");
                *exponent = EXPONENT_MAX as i64;
                let mut padded = coefficient;
                for _ in 0..zeros_to_add {
                    padded.push('0');
                }
                return padded;
            }
        }
    } else if *exponent < EXPONENT_MIN as i64 {
        if coefficient == "0" {
            *exponent = EXPONENT_MIN as i64;
        } else {
            let zeros_to_remove = EXPONENT_MIN as i64 - *exponent;
            if zeros_to_remove < coefficient.len() as i64 {
                let split = coefficient.len() - zeros_to_remove as usize;
                if coefficient.as_bytes()[split..].iter().all(|&b| b == b'0') {
                    trace!(zeros_to_remove, "clamping exponent up by stripping trailing zeros");
                    *exponent = EXPONENT_MIN as i64;
                    return coefficient[..split].to_string();
                }
            }
        }
    } else if coefficient.len() > MAX_SIGNIFICAND_DIGITS {
        let zeros_to_remove = coefficient.len() - MAX_SIGNIFICAND_DIGITS;
        if *exponent + zeros_to_remove as i64 <= EXPONENT_MAX as i64
            && coefficient.as_bytes()[MAX_SIGNIFICAND_DIGITS..]
                .iter()
                .all(|&b| b == b'0')
        {
            trace!(zeros_to_remove, "reducing coefficient to 34 digits");
            *exponent += zeros_to_remove as i64;
            return coefficient[..MAX_SIGNIFICAND_DIGITS].to_string();
        }
    }

    coefficient
}

impl FromStr for Decimal128 {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

// ============================================================================
// Formatting
// ============================================================================

impl fmt::Display for Decimal128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let high = self.high_bits();

        if flags::is_first_form(high) {
            let (exponent, significand) = self.number_parts();
            let coefficient = significand.to_string();
            let adjusted = exponent as i64 + coefficient.len() as i64 - 1;

            let body = if exponent > 0 || adjusted < -6 {
                format_exponential(&coefficient, adjusted)
            } else {
                format_fixed(&coefficient, exponent)
            };

            if self.is_negative() {
                write!(f, "-{}", body)
            } else {
                f.write_str(&body)
            }
        } else if flags::is_second_form(high) {
            trace!("formatting second-form pattern as zero");
            let (exponent, _) = self.number_parts();
            let sign = if self.is_negative() { "-" } else { "" };
            if exponent == 0 {
                write!(f, "{}0", sign)
            } else if exponent > 0 {
                write!(f, "{}0E+{}", sign, exponent)
            } else {
                write!(f, "{}0E{}", sign, exponent)
            }
        } else if flags::is_negative_infinity(high) {
            f.write_str("-Infinity")
        } else if flags::is_positive_infinity(high) {
            f.write_str("Infinity")
        } else {
            f.write_str("NaN")
        }
    }
}

fn format_exponential(coefficient: &str, adjusted: i64) -> String {
    let mut result = String::with_capacity(coefficient.len() + 8);
    result.push_str(&coefficient[..1]);
    if coefficient.len() > 1 {
        result.push('.');
        result.push_str(&coefficient[1..]);
    }
    result.push('E');
    if adjusted >= 0 {
        result.push('+');
    }
    result.push_str(&adjusted.to_string());
    result
}

fn format_fixed(coefficient: &str, exponent: i32) -> String {
    if exponent == 0 {
        return coefficient.to_string();
    }

    let point_offset = exponent.unsigned_abs() as usize;
    let minimum_len = point_offset + 1;
    let padded = if coefficient.len() < minimum_len {
        format!("{:0>width$}", coefficient, width = minimum_len)
    } else {
        coefficient.to_string()
    };

    let point_index = padded.len() - point_offset;
    format!("{}.{}", &padded[..point_index], &padded[point_index..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(s: &str) -> String {
        Decimal128::parse(s).unwrap().to_string()
    }

    #[test]
    fn test_parse_basic() {
        assert_eq!(roundtrip("0"), "0");
        assert_eq!(roundtrip("1"), "1");
        assert_eq!(roundtrip("-1"), "-1");
        assert_eq!(roundtrip("+1"), "1");
        assert_eq!(roundtrip("123.456"), "123.456");
        assert_eq!(roundtrip("0.001"), "0.001");
        assert_eq!(roundtrip(".5"), "0.5");
        assert_eq!(roundtrip("5."), "5");
    }

    #[test]
    fn test_parse_leading_zeros() {
        assert_eq!(roundtrip("007"), "7");
        assert_eq!(roundtrip("000"), "0");
        assert_eq!(roundtrip("00.100"), "0.100");
    }

    #[test]
    fn test_parse_exponent() {
        let d = Decimal128::parse("1.5E3").unwrap();
        assert_eq!(d.exponent(), Ok(2));
        assert_eq!(d.significand().unwrap().to_string(), "15");

        let d = Decimal128::parse("15e-1").unwrap();
        assert_eq!(d.exponent(), Ok(-1));

        assert_eq!(roundtrip("1E+6"), "1E+6");
        assert_eq!(roundtrip("1e-6"), "0.000001");
    }

    #[test]
    fn test_parse_specials() {
        for s in ["Inf", "inf", "Infinity", "INFINITY", "+Inf", "+infinity"] {
            assert!(Decimal128::parse(s).unwrap().is_positive_infinity(), "{}", s);
        }
        for s in ["-Inf", "-inf", "-Infinity", "-INFINITY"] {
            assert!(Decimal128::parse(s).unwrap().is_negative_infinity(), "{}", s);
        }
        for s in ["NaN", "nan", "-NaN", "-nan"] {
            assert!(Decimal128::parse(s).unwrap().is_qnan(), "{}", s);
        }

        // the positive-signed NaN spelling is not recognized
        assert_eq!(Decimal128::parse("+NaN"), Err(DecimalError::InvalidInput));
    }

    #[test]
    fn test_parse_invalid() {
        for s in [
            "", ".", "+", "-", "e5", "1.2.3", "1e", "1e+", "1x", " 1", "1 ", "--1", "1E5.5",
            "Infinit", "N aN",
        ] {
            assert_eq!(Decimal128::parse(s), Err(DecimalError::InvalidInput), "{:?}", s);
        }

        // exponent literal beyond i32 fails to parse outright
        assert_eq!(
            Decimal128::parse("1E+99999999999"),
            Err(DecimalError::InvalidInput)
        );
        assert_eq!(
            Decimal128::parse("0E+99999999999"),
            Err(DecimalError::InvalidInput)
        );
    }

    #[test]
    fn test_clamp_exponent_high() {
        // padding with trailing zeros keeps the value exact
        let d = Decimal128::parse("1E+6112").unwrap();
        assert_eq!(d.exponent(), Ok(6111));
        assert_eq!(d.significand().unwrap().to_string(), "10");

        // zero snaps without padding
        let d = Decimal128::parse("0E+9999").unwrap();
        assert!(d.is_zero());
        assert_eq!(d.exponent(), Ok(6111));

        // 34 significant digits leave no room to pad
        assert_eq!(
            Decimal128::parse("9999999999999999999999999999999999E+6112"),
            Err(DecimalError::InvalidInput)
        );
    }

    #[test]
    fn test_clamp_exponent_low() {
        // trailing zeros are shifted back into the exponent
        let d = Decimal128::parse("100E-6178").unwrap();
        assert_eq!(d.exponent(), Ok(-6176));
        assert_eq!(d.significand().unwrap().to_string(), "1");

        let d = Decimal128::parse("0E-9999").unwrap();
        assert!(d.is_zero());
        assert_eq!(d.exponent(), Ok(-6176));

        // non-zero digits would be lost
        assert_eq!(
            Decimal128::parse("105E-6178"),
            Err(DecimalError::InvalidInput)
        );
        assert_eq!(Decimal128::parse("1E-6177"), Err(DecimalError::InvalidInput));
    }

    #[test]
    fn test_clamp_long_coefficient() {
        // 35 digits with a trailing zero reduce exactly
        let d = Decimal128::parse("99999999999999999999999999999999990").unwrap();
        assert_eq!(d.exponent(), Ok(1));
        assert_eq!(
            d.significand().unwrap().to_string(),
            "9999999999999999999999999999999999"
        );

        // 35 significant digits cannot be reduced
        assert_eq!(
            Decimal128::parse("99999999999999999999999999999999991"),
            Err(DecimalError::InvalidInput)
        );

        // reduction must not push the exponent past the maximum
        assert_eq!(
            Decimal128::parse("99999999999999999999999999999999990E+6111"),
            Err(DecimalError::InvalidInput)
        );
    }

    #[test]
    fn test_max_value_boundary() {
        let d = Decimal128::parse("9999999999999999999999999999999999E+6111").unwrap();
        assert_eq!(d.to_ieee_bits(), Decimal128::MAX.to_ieee_bits());

        let d = Decimal128::parse("-9999999999999999999999999999999999E+6111").unwrap();
        assert_eq!(d.to_ieee_bits(), Decimal128::MIN.to_ieee_bits());
    }

    #[test]
    fn test_format_preserves_trailing_zeros() {
        assert_eq!(roundtrip("1.20"), "1.20");
        assert_eq!(roundtrip("0.0"), "0.0");
        assert_eq!(roundtrip("100"), "100");
    }

    #[test]
    fn test_format_exponential_notation() {
        // a positive exponent always forces exponential notation
        assert_eq!(roundtrip("123E+2"), "1.23E+4");
        assert_eq!(roundtrip("1E+1"), "1E+1");
        assert_eq!(roundtrip("0E+5"), "0E+5");

        // adjusted exponent below -6 switches to exponential
        assert_eq!(roundtrip("1E-6"), "0.000001");
        assert_eq!(roundtrip("1E-7"), "1E-7");
        assert_eq!(roundtrip("12E-8"), "1.2E-7");
        assert_eq!(roundtrip("0.0000001"), "1E-7");
    }

    #[test]
    fn test_format_fixed_notation() {
        assert_eq!(roundtrip("123.45"), "123.45");
        assert_eq!(roundtrip("0.5"), "0.5");
        assert_eq!(roundtrip("-0.005"), "-0.005");
        assert_eq!(roundtrip("-0"), "-0");
    }

    #[test]
    fn test_format_specials() {
        assert_eq!(Decimal128::POSITIVE_INFINITY.to_string(), "Infinity");
        assert_eq!(Decimal128::NEGATIVE_INFINITY.to_string(), "-Infinity");
        assert_eq!(Decimal128::NAN.to_string(), "NaN");
        assert_eq!(Decimal128::SNAN.to_string(), "NaN");
        assert_eq!((-Decimal128::NAN).to_string(), "NaN");
    }

    #[test]
    fn test_format_second_form() {
        let zero = Decimal128::from_ieee_bits(0x6000_0000_0000_0000, 0);
        assert_eq!(zero.to_string().chars().next(), Some('0'));

        let negative = Decimal128::from_ieee_bits(0xE000_0000_0000_0000, 0);
        assert!(negative.to_string().starts_with("-0"));
    }

    #[test]
    fn test_textual_round_trip_is_exact() {
        for s in [
            "0", "-0", "1", "-1", "1.20", "123.456", "1E+6", "1.23E+4", "5E-324",
            "9999999999999999999999999999999999E+6111",
            "1E-6176",
        ] {
            let d = Decimal128::parse(s).unwrap();
            let reparsed = Decimal128::parse(&d.to_string()).unwrap();
            assert_eq!(
                reparsed.to_ieee_bits(),
                d.to_ieee_bits(),
                "round trip of {}",
                s
            );
        }
    }

    #[test]
    fn test_from_str_trait() {
        let d: Decimal128 = "42.5".parse().unwrap();
        assert_eq!(d.to_string(), "42.5");

        let err: Result<Decimal128, _> = "bogus".parse();
        assert_eq!(err, Err(DecimalError::InvalidInput));
    }
}

// ============================================================================
// Decimal128 Library
// IEEE 754-2008 decimal128 interchange values and their integer backbone
// ============================================================================

//! # Decimal128
//!
//! A 128-bit decimal floating-point value type implementing the
//! IEEE 754-2008 decimal128 interchange format (binary integer significand),
//! together with the two-word unsigned integer arithmetic it rides on.
//!
//! ## Features
//!
//! - **Exact text round trip**: parsing and formatting never change the
//!   represented value; exponents clamp losslessly by shifting trailing
//!   zeros
//! - **Precise narrowing conversions** with truncation toward zero and
//!   exact overflow semantics, including the asymmetric signed ranges
//! - **Cohort-aware ordering**: distinct encodings of the same number
//!   compare equal, with a total order across NaN and the infinities
//! - **Byte-exact wire boundary**: `from_ieee_bits`/`to_ieee_bits`
//!   round-trip every 128-bit pattern
//! - **Immutable `Copy` values** with no shared state, safe from any thread
//!
//! This is a storage and interchange representation, not a calculator:
//! there is no general decimal arithmetic.
//!
//! ## Example
//!
//! ```rust
//! use decimal128::{Decimal128, DecimalError};
//!
//! let price: Decimal128 = "4099.99".parse()?;
//! assert_eq!(price.to_string(), "4099.99");
//! assert_eq!(price.to_i64(), Ok(4099));
//!
//! // wire transmission as two 64-bit words
//! let (high, low) = price.to_ieee_bits();
//! let decoded = Decimal128::from_ieee_bits(high, low);
//! assert_eq!(decoded, price);
//! # Ok::<(), DecimalError>(())
//! ```

mod compare;
mod flags;
mod text;

pub mod decimal128;
pub mod errors;
pub mod uint128;

// Re-exports for convenience
pub use crate::decimal128::Decimal128;
pub use crate::errors::{DecimalError, DecimalResult};
pub use crate::uint128::UInt128;

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_zero_cohort_end_to_end() {
        let zeros: Vec<Decimal128> = ["0", "0.0", "0E+5", "-0"]
            .iter()
            .map(|s| Decimal128::parse(s).unwrap())
            .collect();

        for a in &zeros {
            assert!(a.is_zero());
            for b in &zeros {
                assert_eq!(a, b);
            }
        }

        // the stored exponents still differ
        assert_ne!(
            zeros[0].to_ieee_bits(),
            zeros[2].to_ieee_bits()
        );
    }

    #[test]
    fn test_clamping_boundary_end_to_end() {
        let max = Decimal128::parse("9999999999999999999999999999999999E+6111").unwrap();
        assert_eq!(max, Decimal128::MAX);

        assert!(Decimal128::parse("9999999999999999999999999999999999E+6112").is_err());
    }

    #[test]
    fn test_integer_narrowing_end_to_end() {
        assert_eq!(Decimal128::from(2147483647i32).to_i32(), Ok(2147483647));
        assert_eq!(
            Decimal128::parse("2147483648").unwrap().to_i32(),
            Err(DecimalError::Overflow)
        );
        assert_eq!(
            Decimal128::parse("-2147483648").unwrap().to_i32(),
            Ok(i32::MIN)
        );
        assert_eq!(Decimal128::parse("0").unwrap().to_u8(), Ok(0));
    }

    #[test]
    fn test_formatting_end_to_end() {
        assert_eq!(Decimal128::parse("1.20").unwrap().to_string(), "1.20");
        assert_eq!(Decimal128::parse("123E+2").unwrap().to_string(), "1.23E+4");
    }

    #[test]
    fn test_sorting_with_total_order() {
        let mut values: Vec<Decimal128> = ["3", "NaN", "-Infinity", "-2.5", "0", "1E+3", "Infinity"]
            .iter()
            .map(|s| Decimal128::parse(s).unwrap())
            .collect();

        values.sort_by(|a, b| a.total_cmp(b));

        let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        assert_eq!(
            rendered,
            ["NaN", "-Infinity", "-2.5", "0", "3", "1E+3", "Infinity"]
        );
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::cmp::Ordering;

    const MAX_SIGNIFICAND_VALUE: u128 = 9_999_999_999_999_999_999_999_999_999_999_999;

    proptest! {
        #[test]
        fn prop_ieee_bits_round_trip(high in any::<u64>(), low in any::<u64>()) {
            let d = Decimal128::from_ieee_bits(high, low);
            prop_assert_eq!(d.to_ieee_bits(), (high, low));
        }

        #[test]
        fn prop_textual_round_trip(
            negative in any::<bool>(),
            exponent in -6176i32..=6111,
            significand in 0u128..=MAX_SIGNIFICAND_VALUE,
        ) {
            let d = Decimal128::from_components(
                negative,
                exponent,
                UInt128::from_u128(significand),
            ).unwrap();
            let reparsed = Decimal128::parse(&d.to_string()).unwrap();
            prop_assert_eq!(reparsed.total_cmp(&d), Ordering::Equal);
        }

        #[test]
        fn prop_ordering_antisymmetric(
            a_negative in any::<bool>(),
            a_exponent in -6176i32..=6111,
            a_significand in 0u128..=MAX_SIGNIFICAND_VALUE,
            b_negative in any::<bool>(),
            b_exponent in -6176i32..=6111,
            b_significand in 0u128..=MAX_SIGNIFICAND_VALUE,
        ) {
            let a = Decimal128::from_components(
                a_negative,
                a_exponent,
                UInt128::from_u128(a_significand),
            ).unwrap();
            let b = Decimal128::from_components(
                b_negative,
                b_exponent,
                UInt128::from_u128(b_significand),
            ).unwrap();

            prop_assert_eq!(a.total_cmp(&b), b.total_cmp(&a).reverse());

            // exactly one of <, ==, > for non-NaN operands
            let outcomes = (a < b) as u8 + (a == b) as u8 + (a > b) as u8;
            prop_assert_eq!(outcomes, 1);
        }

        #[test]
        fn prop_i64_round_trip(value in any::<i64>()) {
            prop_assert_eq!(Decimal128::from(value).to_i64(), Ok(value));
        }

        #[test]
        fn prop_u64_round_trip(value in any::<u64>()) {
            prop_assert_eq!(Decimal128::from(value).to_u64(), Ok(value));
        }

        #[test]
        fn prop_f64_round_trip(value in any::<f64>()) {
            let d = Decimal128::from(value);
            if value.is_nan() {
                prop_assert!(d.is_nan());
            } else {
                prop_assert_eq!(d.to_f64(), value);
            }
        }
    }
}

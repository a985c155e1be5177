// ============================================================================
// Decimal128 Value Type
// IEEE 754-2008 decimal128 interchange value (binary integer significand)
// ============================================================================

use crate::compare;
use crate::errors::{DecimalError, DecimalResult};
use crate::flags;
use crate::uint128::UInt128;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::ops::Neg;

/// A 128-bit decimal floating-point value in the IEEE 754-2008 decimal128
/// interchange format.
///
/// The value is exactly two 64-bit words; the logical value is
/// `sign x significand x 10^exponent` with a significand of at most 34
/// decimal digits and an exponent in `[-6176, 6111]`. Signed infinities and
/// quiet/signaling NaN are encoded by reserved bit prefixes. Reserved
/// ("second form") bit patterns are read as signed zeros rather than errors.
///
/// This is a storage and interchange representation: values are constructed
/// from native numbers or text, compared, formatted, and converted back, but
/// there is no general decimal arithmetic.
///
/// Internally the stored exponent uses a bias chosen so that an all-zero bit
/// pattern is a true zero; [`from_ieee_bits`](Self::from_ieee_bits) and
/// [`to_ieee_bits`](Self::to_ieee_bits) re-bias to the standard IEEE window
/// at the wire boundary.
///
/// # Example
/// ```
/// use decimal128::Decimal128;
///
/// let d: Decimal128 = "1.20".parse().unwrap();
/// assert_eq!(d.to_string(), "1.20");
/// assert_eq!(d.to_i32(), Ok(1));
/// ```
#[derive(Clone, Copy)]
pub struct Decimal128 {
    high: u64,
    low: u64,
}

pub(crate) const EXPONENT_MIN: i32 = -6176;
pub(crate) const EXPONENT_MAX: i32 = 6111;
pub(crate) const MAX_SIGNIFICAND_DIGITS: usize = 34;

/// Largest representable significand: 34 nines.
pub(crate) const MAX_SIGNIFICAND: UInt128 =
    UInt128::new(0x0001_ED09_BEAD_87C0, 0x378D_8E63_FFFF_FFFF);

impl Decimal128 {
    /// Zero value
    pub const ZERO: Self = Self { high: 0, low: 0 };

    /// One
    pub const ONE: Self = Self { high: 0, low: 1 };

    /// Largest finite value: 34 nines times 10^6111
    pub const MAX: Self = Self {
        high: 0x2FBF_ED09_BEAD_87C0,
        low: 0x378D_8E63_FFFF_FFFF,
    };

    /// Smallest finite value: the negation of [`MAX`](Self::MAX)
    pub const MIN: Self = Self {
        high: 0xAFBF_ED09_BEAD_87C0,
        low: 0x378D_8E63_FFFF_FFFF,
    };

    /// Positive infinity
    pub const POSITIVE_INFINITY: Self = Self {
        high: flags::POSITIVE_INFINITY,
        low: 0,
    };

    /// Negative infinity
    pub const NEGATIVE_INFINITY: Self = Self {
        high: flags::NEGATIVE_INFINITY,
        low: 0,
    };

    /// Quiet not-a-number
    pub const NAN: Self = Self {
        high: flags::QNAN,
        low: 0,
    };

    /// Signaling not-a-number
    pub const SNAN: Self = Self {
        high: flags::SNAN,
        low: 0,
    };

    // ========================================================================
    // Construction
    // ========================================================================

    /// Build a value from its sign, exponent and significand.
    ///
    /// # Errors
    /// Returns `OutOfRange` if the exponent is outside `[-6176, 6111]` or the
    /// significand exceeds 34 decimal digits.
    pub fn from_components(
        is_negative: bool,
        exponent: i32,
        significand: UInt128,
    ) -> DecimalResult<Self> {
        if !(EXPONENT_MIN..=EXPONENT_MAX).contains(&exponent) {
            return Err(DecimalError::OutOfRange);
        }
        if significand > MAX_SIGNIFICAND {
            return Err(DecimalError::OutOfRange);
        }

        Ok(Self::synthesize(is_negative, exponent, significand))
    }

    /// Encode validated components. Callers guarantee the domain checks.
    pub(crate) fn synthesize(is_negative: bool, exponent: i32, significand: UInt128) -> Self {
        debug_assert!((EXPONENT_MIN..=EXPONENT_MAX).contains(&exponent));
        debug_assert!(significand <= MAX_SIGNIFICAND);

        let biased = flags::exponent_to_biased_exponent(exponent) as u64;
        let mut high = (biased << flags::FIRST_FORM_EXPONENT_SHIFT) | significand.high();
        if is_negative {
            high |= flags::SIGN_BIT;
        }

        Self {
            high,
            low: significand.low(),
        }
    }

    /// Decode a value from the two words of its IEEE interchange encoding.
    #[inline]
    pub const fn from_ieee_bits(high: u64, low: u64) -> Self {
        Self {
            high: flags::high_bits_from_ieee(high),
            low,
        }
    }

    /// Get the two words of the IEEE interchange encoding of this value.
    ///
    /// Round-trips exactly with [`from_ieee_bits`](Self::from_ieee_bits) for
    /// every bit pattern.
    #[inline]
    pub const fn to_ieee_bits(&self) -> (u64, u64) {
        (flags::high_bits_to_ieee(self.high), self.low)
    }

    /// Parse a decimal string.
    ///
    /// See the crate documentation for the accepted grammar. The `Result`
    /// return is the fallible-parse entry point; nothing is silently
    /// defaulted.
    ///
    /// # Errors
    /// Returns `InvalidInput` if the text is malformed or the value is not
    /// representable without loss.
    pub fn parse(s: &str) -> DecimalResult<Self> {
        crate::text::parse(s)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Get the exponent.
    ///
    /// Second-form (reserved) patterns yield their partially recovered
    /// exponent.
    ///
    /// # Errors
    /// Returns `InvalidOperation` for Infinity or NaN, whose exponent is
    /// undefined.
    pub fn exponent(&self) -> DecimalResult<i32> {
        if flags::is_first_form(self.high) {
            let biased = (self.high & flags::FIRST_FORM_EXPONENT_BITS)
                >> flags::FIRST_FORM_EXPONENT_SHIFT;
            Ok(flags::biased_exponent_to_exponent(biased as i32))
        } else if flags::is_second_form(self.high) {
            let biased = (self.high & flags::SECOND_FORM_EXPONENT_BITS)
                >> flags::SECOND_FORM_EXPONENT_SHIFT;
            Ok(flags::biased_exponent_to_exponent(biased as i32))
        } else {
            Err(DecimalError::InvalidOperation)
        }
    }

    /// Get the significand.
    ///
    /// Second-form (reserved) patterns yield zero, as do first-form patterns
    /// whose encoded significand exceeds 34 digits (non-canonical per
    /// IEEE 754-2008).
    ///
    /// # Errors
    /// Returns `InvalidOperation` for Infinity or NaN, whose significand is
    /// undefined.
    pub fn significand(&self) -> DecimalResult<UInt128> {
        if flags::is_first_form(self.high) {
            Ok(self.first_form_significand())
        } else if flags::is_second_form(self.high) {
            Ok(UInt128::ZERO)
        } else {
            Err(DecimalError::InvalidOperation)
        }
    }

    /// Canonical first-form significand: encodings beyond 34 digits read as
    /// zero.
    fn first_form_significand(&self) -> UInt128 {
        let significand = UInt128::new(self.high & flags::FIRST_FORM_SIGNIFICAND_BITS, self.low);
        if significand > MAX_SIGNIFICAND {
            UInt128::ZERO
        } else {
            significand
        }
    }

    /// Exponent and significand of a non-special value. Callers guarantee
    /// the value is not Infinity or NaN.
    pub(crate) fn number_parts(&self) -> (i32, UInt128) {
        match (self.exponent(), self.significand()) {
            (Ok(exponent), Ok(significand)) => (exponent, significand),
            _ => unreachable!("number_parts called on Infinity or NaN"),
        }
    }

    /// Check if the value is numerically zero.
    ///
    /// True for first-form values with a zero significand and for every
    /// second-form (reserved) pattern, regardless of the stored exponent.
    pub fn is_zero(&self) -> bool {
        if flags::is_first_form(self.high) {
            self.first_form_significand().is_zero()
        } else {
            flags::is_second_form(self.high)
        }
    }

    /// Check if the sign bit is set.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        flags::is_negative(self.high)
    }

    /// Check if the value is positive or negative infinity.
    #[inline]
    pub const fn is_infinity(&self) -> bool {
        flags::is_infinity(self.high)
    }

    /// Check if the value is positive infinity.
    #[inline]
    pub const fn is_positive_infinity(&self) -> bool {
        flags::is_positive_infinity(self.high)
    }

    /// Check if the value is negative infinity.
    #[inline]
    pub const fn is_negative_infinity(&self) -> bool {
        flags::is_negative_infinity(self.high)
    }

    /// Check if the value is a NaN (quiet or signaling).
    #[inline]
    pub const fn is_nan(&self) -> bool {
        flags::is_nan(self.high)
    }

    /// Check if the value is a quiet NaN.
    #[inline]
    pub const fn is_qnan(&self) -> bool {
        flags::is_qnan(self.high)
    }

    /// Check if the value is a signaling NaN.
    #[inline]
    pub const fn is_snan(&self) -> bool {
        flags::is_snan(self.high)
    }

    pub(crate) const fn high_bits(&self) -> u64 {
        self.high
    }

    // ========================================================================
    // Exponent walking
    // ========================================================================

    /// Raise the exponent toward `goal` by dividing the significand by 10 as
    /// long as the division is exact. Zeros jump straight to the goal.
    pub(crate) fn with_increased_exponent(self, goal: i32) -> Self {
        if self.is_zero() {
            return Self::synthesize(self.is_negative(), goal, UInt128::ZERO);
        }

        let (mut exponent, mut significand) = self.number_parts();
        while exponent < goal {
            let (divided, remainder) = significand.div_rem_u32(10);
            if remainder != 0 {
                break;
            }
            exponent += 1;
            significand = divided;
        }

        Self::synthesize(self.is_negative(), exponent, significand)
    }

    /// Lower the exponent toward `goal` by multiplying the significand by 10
    /// as long as it stays within 34 digits. Zeros jump straight to the goal.
    pub(crate) fn with_decreased_exponent(self, goal: i32) -> Self {
        if self.is_zero() {
            return Self::synthesize(self.is_negative(), goal, UInt128::ZERO);
        }

        let (mut exponent, mut significand) = self.number_parts();
        while exponent > goal {
            let times_ten = significand.mul_u32(10);
            if times_ten > MAX_SIGNIFICAND {
                break;
            }
            exponent -= 1;
            significand = times_ten;
        }

        Self::synthesize(self.is_negative(), exponent, significand)
    }

    // ========================================================================
    // Comparison
    // ========================================================================

    /// Total order over all values: NaN, then negative infinity, then finite
    /// numbers, then positive infinity.
    ///
    /// Finite comparison is cohort-aware: distinct encodings of the same
    /// number compare equal, and all zeros compare equal regardless of their
    /// stored sign and exponent.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        compare::total_compare(self, other)
    }

    // ========================================================================
    // Narrowing conversions
    // ========================================================================

    /// Truncate toward zero and bound the magnitude. `None` means the value
    /// does not fit; a value that truncates to nothing yields zero.
    fn truncate_to_u64(&self, max_negative: u64, max_positive: u64) -> Option<u64> {
        if self.is_zero() {
            return Some(0);
        }

        let (mut exponent, mut significand) = self.number_parts();

        while exponent < 0 {
            // remainder discarded: truncation toward zero
            let (divided, _) = significand.div_rem_u32(10);
            significand = divided;
            if significand.is_zero() {
                return Some(0);
            }
            exponent += 1;
        }
        while exponent > 0 {
            significand = significand.mul_u32(10);
            if significand > MAX_SIGNIFICAND {
                return None;
            }
            exponent -= 1;
        }

        let limit = if self.is_negative() {
            max_negative
        } else {
            max_positive
        };
        if significand.high() != 0 || significand.low() > limit {
            return None;
        }

        Some(significand.low())
    }

    /// Convert to a fixed-scale [`rust_decimal::Decimal`].
    ///
    /// The exponent is walked into the `[-28, 0]` scale window and the
    /// significand reduced to 96 bits where trailing zeros allow.
    /// Second-form (reserved) patterns convert to `Decimal::ZERO`.
    ///
    /// # Errors
    /// Returns `Overflow` if no exact rescaling fits, and for Infinity or
    /// NaN.
    pub fn to_decimal(&self) -> DecimalResult<rust_decimal::Decimal> {
        if flags::is_first_form(self.high) {
            let mut value = *self;
            let (mut exponent, _) = value.number_parts();

            if exponent > 0 {
                value = value.with_decreased_exponent(0);
                (exponent, _) = value.number_parts();
            } else if exponent < -28 {
                value = value.with_increased_exponent(-28);
                (exponent, _) = value.number_parts();
            }

            // shed exact trailing zeros until the significand fits 96 bits
            let (_, mut significand) = value.number_parts();
            while significand.high() >> 32 != 0 {
                let (divided, remainder) = significand.div_rem_u32(10);
                if remainder != 0 {
                    break;
                }
                exponent += 1;
                significand = divided;
            }

            if !(-28..=0).contains(&exponent) || significand.high() >> 32 != 0 {
                return Err(DecimalError::Overflow);
            }

            let lo = significand.low() as u32;
            let mid = (significand.low() >> 32) as u32;
            let hi = significand.high() as u32;
            Ok(rust_decimal::Decimal::from_parts(
                lo,
                mid,
                hi,
                self.is_negative(),
                (-exponent) as u32,
            ))
        } else if flags::is_second_form(self.high) {
            Ok(rust_decimal::Decimal::ZERO)
        } else {
            Err(DecimalError::Overflow)
        }
    }

    /// Convert to an `f64` via an exact textual round trip. Values beyond
    /// the `f64` range become infinite; second-form patterns become zero.
    pub fn to_f64(&self) -> f64 {
        if flags::is_first_form(self.high) {
            self.to_string()
                .parse()
                .expect("canonical decimal strings parse as f64")
        } else if flags::is_second_form(self.high) {
            0.0
        } else if flags::is_positive_infinity(self.high) {
            f64::INFINITY
        } else if flags::is_negative_infinity(self.high) {
            f64::NEG_INFINITY
        } else {
            f64::NAN
        }
    }

    /// Convert to an `f32` via an exact textual round trip. Values beyond
    /// the `f32` range become infinite; second-form patterns become zero.
    pub fn to_f32(&self) -> f32 {
        if flags::is_first_form(self.high) {
            self.to_string()
                .parse()
                .expect("canonical decimal strings parse as f32")
        } else if flags::is_second_form(self.high) {
            0.0
        } else if flags::is_positive_infinity(self.high) {
            f32::INFINITY
        } else if flags::is_negative_infinity(self.high) {
            f32::NEG_INFINITY
        } else {
            f32::NAN
        }
    }
}

// Narrowing integer conversions: truncation toward zero, then a range check
// honoring the asymmetric negative range of the signed targets.
macro_rules! impl_to_signed {
    ($($(#[$meta:meta])* $name:ident => $t:ty),* $(,)?) => {
        impl Decimal128 {
            $(
                $(#[$meta])*
                pub fn $name(&self) -> DecimalResult<$t> {
                    if flags::is_first_form(self.high) {
                        let max_negative = <$t>::MAX as u64 + 1;
                        match self.truncate_to_u64(max_negative, <$t>::MAX as u64) {
                            Some(magnitude) if self.is_negative() => {
                                if magnitude == max_negative {
                                    Ok(<$t>::MIN)
                                } else {
                                    Ok(-(magnitude as $t))
                                }
                            },
                            Some(magnitude) => Ok(magnitude as $t),
                            None => Err(DecimalError::Overflow),
                        }
                    } else if flags::is_second_form(self.high) {
                        Ok(0)
                    } else {
                        Err(DecimalError::Overflow)
                    }
                }
            )*
        }
    };
}

macro_rules! impl_to_unsigned {
    ($($(#[$meta:meta])* $name:ident => $t:ty),* $(,)?) => {
        impl Decimal128 {
            $(
                $(#[$meta])*
                pub fn $name(&self) -> DecimalResult<$t> {
                    if flags::is_first_form(self.high) {
                        match self.truncate_to_u64(0, <$t>::MAX as u64) {
                            Some(magnitude) => Ok(magnitude as $t),
                            None => Err(DecimalError::Overflow),
                        }
                    } else if flags::is_second_form(self.high) {
                        Ok(0)
                    } else {
                        Err(DecimalError::Overflow)
                    }
                }
            )*
        }
    };
}

impl_to_signed! {
    /// Convert to an `i8`, truncating toward zero.
    ///
    /// # Errors
    /// Returns `Overflow` if the truncated value does not fit, and for
    /// Infinity or NaN.
    to_i8 => i8,
    /// Convert to an `i16`, truncating toward zero.
    ///
    /// # Errors
    /// Returns `Overflow` if the truncated value does not fit, and for
    /// Infinity or NaN.
    to_i16 => i16,
    /// Convert to an `i32`, truncating toward zero.
    ///
    /// # Errors
    /// Returns `Overflow` if the truncated value does not fit, and for
    /// Infinity or NaN.
    to_i32 => i32,
    /// Convert to an `i64`, truncating toward zero.
    ///
    /// # Errors
    /// Returns `Overflow` if the truncated value does not fit, and for
    /// Infinity or NaN.
    to_i64 => i64,
}

impl_to_unsigned! {
    /// Convert to a `u8`, truncating toward zero.
    ///
    /// # Errors
    /// Returns `Overflow` if the truncated value does not fit, and for
    /// Infinity or NaN.
    to_u8 => u8,
    /// Convert to a `u16`, truncating toward zero.
    ///
    /// # Errors
    /// Returns `Overflow` if the truncated value does not fit, and for
    /// Infinity or NaN.
    to_u16 => u16,
    /// Convert to a `u32`, truncating toward zero.
    ///
    /// # Errors
    /// Returns `Overflow` if the truncated value does not fit, and for
    /// Infinity or NaN.
    to_u32 => u32,
    /// Convert to a `u64`, truncating toward zero.
    ///
    /// # Errors
    /// Returns `Overflow` if the truncated value does not fit, and for
    /// Infinity or NaN.
    to_u64 => u64,
}

// ============================================================================
// Construction from native numbers
// ============================================================================

impl From<i64> for Decimal128 {
    /// Sign/magnitude split at exponent zero; exact for every input.
    #[inline]
    fn from(value: i64) -> Self {
        if value >= 0 {
            Self {
                high: 0,
                low: value as u64,
            }
        } else {
            Self {
                high: flags::SIGN_BIT,
                low: value.unsigned_abs(),
            }
        }
    }
}

impl From<u64> for Decimal128 {
    #[inline]
    fn from(value: u64) -> Self {
        Self {
            high: 0,
            low: value,
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty => $via:ty),* $(,)?) => {
        $(
            impl From<$t> for Decimal128 {
                #[inline]
                fn from(value: $t) -> Self {
                    Self::from(value as $via)
                }
            }
        )*
    };
}

impl_from_int!(i8 => i64, i16 => i64, i32 => i64, u8 => u64, u16 => u64, u32 => u64);

impl From<rust_decimal::Decimal> for Decimal128 {
    /// Exact: the 96-bit coefficient and `[0, 28]` scale always fit.
    fn from(value: rust_decimal::Decimal) -> Self {
        let significand = UInt128::from_u128(value.mantissa().unsigned_abs());
        let exponent = -(value.scale() as i32);
        Self::synthesize(value.is_sign_negative(), exponent, significand)
    }
}

impl From<f64> for Decimal128 {
    /// Exact textual round trip: the shortest representation that reparses
    /// to `value` is parsed as decimal text.
    fn from(value: f64) -> Self {
        if value.is_nan() {
            return Self::NAN;
        }
        if value.is_infinite() {
            return if value.is_sign_positive() {
                Self::POSITIVE_INFINITY
            } else {
                Self::NEGATIVE_INFINITY
            };
        }

        Self::parse(&format!("{:e}", value))
            .expect("shortest float representations are valid decimal text")
    }
}

impl From<f32> for Decimal128 {
    /// Exact textual round trip, as for `f64`.
    fn from(value: f32) -> Self {
        if value.is_nan() {
            return Self::NAN;
        }
        if value.is_infinite() {
            return if value.is_sign_positive() {
                Self::POSITIVE_INFINITY
            } else {
                Self::NEGATIVE_INFINITY
            };
        }

        Self::parse(&format!("{:e}", value))
            .expect("shortest float representations are valid decimal text")
    }
}

// ============================================================================
// Trait Implementations
// ============================================================================

impl Default for Decimal128 {
    #[inline]
    fn default() -> Self {
        Self::ZERO
    }
}

impl std::fmt::Debug for Decimal128 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Decimal128({}, high=0x{:016X}, low=0x{:016X})",
            self, self.high, self.low
        )
    }
}

impl Neg for Decimal128 {
    type Output = Self;

    /// Flip the sign bit. Defined for every value, specials included.
    #[inline]
    fn neg(self) -> Self::Output {
        Self {
            high: self.high ^ flags::SIGN_BIT,
            low: self.low,
        }
    }
}

impl PartialEq for Decimal128 {
    /// Value equality: cohort-aware, and NaN never equals anything,
    /// including itself.
    fn eq(&self, other: &Self) -> bool {
        if self.is_nan() || other.is_nan() {
            return false;
        }
        self.total_cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for Decimal128 {
    /// The comparer's total order, except that NaN-vs-NaN yields `None` so
    /// that `==` and `partial_cmp` stay coherent. `<` and `>` therefore
    /// follow [`total_cmp`](Self::total_cmp) exactly.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.total_cmp(other) {
            Ordering::Equal if self.is_nan() => None,
            ordering => Some(ordering),
        }
    }
}

impl Hash for Decimal128 {
    /// Structural hash over the two raw words.
    ///
    /// This is deliberately a different relation from `==`: cohort members
    /// and differently-signed zeros compare equal but hash by their exact
    /// encoding. Callers that need value-level deduplication should key on a
    /// canonical form instead.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.high.hash(state);
        self.low.hash(state);
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Decimal128 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Decimal128 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = <String as serde::Deserialize>::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

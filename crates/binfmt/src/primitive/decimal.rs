//! 96-bit scaled decimal with the invariant-culture text form used on the wire.

use std::fmt;
use std::str::FromStr;

use crate::error::DecodeError;

const SIGN_MASK: u32 = 0x8000_0000;
const SCALE_MASK: u32 = 0x00ff_0000;
const SCALE_SHIFT: u32 = 16;

/// Largest scale (digits after the point) a decimal can carry.
pub const MAX_SCALE: u32 = 28;

const MAX_MANTISSA: u128 = (1u128 << 96) - 1;

/// A decimal number: 96-bit unsigned mantissa, sign bit, and power-of-ten scale.
///
/// Equality is representational, so `1.5` and `1.50` differ; the scale is part
/// of the value and survives a round trip through the text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Decimal {
    flags: u32,
    hi: u32,
    lo: u32,
    mid: u32,
}

impl Decimal {
    pub const ZERO: Decimal = Decimal {
        flags: 0,
        hi: 0,
        lo: 0,
        mid: 0,
    };

    /// 79228162514264337593543950335
    pub const MAX: Decimal = Decimal {
        flags: 0,
        hi: u32::MAX,
        lo: u32::MAX,
        mid: u32::MAX,
    };

    /// -79228162514264337593543950335
    pub const MIN: Decimal = Decimal {
        flags: SIGN_MASK,
        hi: u32::MAX,
        lo: u32::MAX,
        mid: u32::MAX,
    };

    /// Builds a decimal from a signed mantissa and a scale.
    ///
    /// Returns `None` if `|mantissa|` needs more than 96 bits or `scale > 28`.
    pub fn new(mantissa: i128, scale: u32) -> Option<Self> {
        let magnitude = mantissa.unsigned_abs();
        if magnitude > MAX_MANTISSA || scale > MAX_SCALE {
            return None;
        }
        Some(Self::from_magnitude(magnitude, scale, mantissa < 0))
    }

    fn from_magnitude(magnitude: u128, scale: u32, negative: bool) -> Self {
        let sign = if negative { SIGN_MASK } else { 0 };
        Self {
            flags: sign | (scale << SCALE_SHIFT),
            hi: (magnitude >> 64) as u32,
            lo: magnitude as u32,
            mid: (magnitude >> 32) as u32,
        }
    }

    /// Builds a decimal from its four 32-bit words, validating the flags word.
    ///
    /// Only the sign bit and the scale byte may be set in `flags`, and the
    /// scale may not exceed 28.
    pub fn from_parts(lo: i32, mid: i32, hi: i32, flags: i32) -> Result<Self, DecodeError> {
        let flags = flags as u32;
        let scale = (flags & SCALE_MASK) >> SCALE_SHIFT;
        if flags & !(SIGN_MASK | SCALE_MASK) != 0 || scale > MAX_SCALE {
            return Err(DecodeError::InvalidDecimalBits(flags));
        }
        Ok(Self {
            flags,
            hi: hi as u32,
            lo: lo as u32,
            mid: mid as u32,
        })
    }

    /// The four words in `[lo, mid, hi, flags]` order.
    pub fn to_parts(self) -> [i32; 4] {
        [
            self.lo as i32,
            self.mid as i32,
            self.hi as i32,
            self.flags as i32,
        ]
    }

    pub fn mantissa(self) -> u128 {
        (u128::from(self.hi) << 64) | (u128::from(self.mid) << 32) | u128::from(self.lo)
    }

    pub fn scale(self) -> u32 {
        (self.flags & SCALE_MASK) >> SCALE_SHIFT
    }

    pub fn is_sign_negative(self) -> bool {
        self.flags & SIGN_MASK != 0
    }
}

impl FromStr for Decimal {
    type Err = DecodeError;

    /// Parses the invariant-culture form: optional surrounding whitespace, an
    /// optional leading sign, digits with optional `,` group separators, and an
    /// optional `.` fraction. Exponents are not accepted.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || DecodeError::InvalidDecimal(text.to_owned());
        let s = text.trim();
        let (negative, body) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));

        let mut magnitude: u128 = 0;
        let mut digits = 0usize;
        for b in int_part.bytes() {
            if b == b',' && digits > 0 {
                continue;
            }
            magnitude = push_digit(magnitude, b).ok_or_else(invalid)?;
            digits += 1;
        }
        let mut scale = 0u32;
        for b in frac_part.bytes() {
            magnitude = push_digit(magnitude, b).ok_or_else(invalid)?;
            digits += 1;
            scale += 1;
        }
        if digits == 0 || scale > MAX_SCALE {
            return Err(invalid());
        }
        Ok(Self::from_magnitude(magnitude, scale, negative))
    }
}

fn push_digit(magnitude: u128, b: u8) -> Option<u128> {
    let d = u128::from(b.checked_sub(b'0').filter(|d| *d <= 9)?);
    let next = magnitude.checked_mul(10)?.checked_add(d)?;
    (next <= MAX_MANTISSA).then_some(next)
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa().to_string();
        let scale = self.scale() as usize;
        if self.is_sign_negative() {
            f.write_str("-")?;
        }
        if scale == 0 {
            f.write_str(&digits)
        } else if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            write!(f, "{int_part}.{frac_part}")
        } else {
            write!(f, "0.{}{}", "0".repeat(scale - digits.len()), digits)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn text_form_matrix() {
        let cases = [
            ("0", 0, 0),
            ("1.50", 150, 2),
            ("-1.50", -150, 2),
            ("0.05", 5, 2),
            ("0.00", 0, 2),
            ("79228162514264337593543950335", MAX_MANTISSA as i128, 0),
            ("7.9228162514264337593543950335", MAX_MANTISSA as i128, 28),
        ];
        for (text, mantissa, scale) in cases {
            let parsed: Decimal = text.parse().unwrap();
            assert_eq!(parsed, Decimal::new(mantissa, scale).unwrap(), "{text}");
            assert_eq!(parsed.to_string(), text);
        }
    }

    #[test]
    fn lenient_inputs() {
        assert_eq!("  1,000.5 ".parse::<Decimal>(), Ok(Decimal::new(10_005, 1).unwrap()));
        assert_eq!("+.5".parse::<Decimal>(), Ok(Decimal::new(5, 1).unwrap()));
        assert_eq!("7.".parse::<Decimal>(), Ok(Decimal::new(7, 0).unwrap()));
    }

    #[test]
    fn rejects_malformed_text() {
        for text in [
            "",
            "-",
            ".",
            "1e5",
            "1.2.3",
            ",1",
            "79228162514264337593543950336",
            "0.00000000000000000000000000001",
            "NaN",
        ] {
            assert!(text.parse::<Decimal>().is_err(), "{text:?}");
        }
    }

    #[test]
    fn boundaries_and_parts() {
        assert_eq!(Decimal::MAX.to_string(), "79228162514264337593543950335");
        assert_eq!(Decimal::MIN.to_string(), "-79228162514264337593543950335");
        let [lo, mid, hi, flags] = Decimal::MIN.to_parts();
        assert_eq!(Decimal::from_parts(lo, mid, hi, flags), Ok(Decimal::MIN));
        assert!(Decimal::from_parts(0, 0, 0, 29 << 16).is_err());
        assert!(Decimal::from_parts(0, 0, 0, 1).is_err());
    }

    proptest! {
        #[test]
        fn text_roundtrip(mantissa in -(MAX_MANTISSA as i128)..=(MAX_MANTISSA as i128), scale in 0u32..=28) {
            let value = Decimal::new(mantissa, scale).unwrap();
            prop_assert_eq!(value.to_string().parse::<Decimal>(), Ok(value));
        }
    }
}

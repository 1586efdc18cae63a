//! Fixed-width integers for target arithmetic.
//!
//! Targets live in [`U256`]. Any product of a target with a timespan or a
//! coin-day weight is computed in [`U512`] and narrowed afterwards, so the
//! intermediate can never wrap.

use uint::construct_uint;

construct_uint! {
    /// Unsigned 256-bit integer, 4x64-bit little-endian words.
    pub struct U256(4);
}

construct_uint! {
    /// Unsigned 512-bit integer used for widened intermediates.
    pub struct U512(8);
}

/// 2^64 as a float, the weight of one word.
const HALF_WORD_FACTOR: f64 = 4_294_967_296.0;

/// Zero-extend a 256-bit value into 512 bits.
#[inline]
pub fn widen(value: &U256) -> U512 {
    let mut words = [0u64; 8];
    words[..4].copy_from_slice(&value.0);
    U512(words)
}

/// Narrow a 512-bit value, saturating at `U256::MAX`.
#[inline]
pub fn narrow_saturating(value: &U512) -> U256 {
    if value.0[4..].iter().any(|word| *word != 0) {
        return U256::MAX;
    }
    let mut words = [0u64; 4];
    words.copy_from_slice(&value.0[..4]);
    U256(words)
}

/// Compute `value * num / den` without intermediate overflow.
///
/// A zero denominator is treated as one.
pub fn mul_div(value: &U256, num: u64, den: u64) -> U256 {
    let product = widen(value) * U512::from(num);
    narrow_saturating(&(product / U512::from(den.max(1))))
}

/// Approximate a little-endian word array as a float.
///
/// Accumulates 32-bit halves from the least significant end, so each term
/// is exact before scaling.
pub fn words_to_f64(words: &[u64]) -> f64 {
    let mut ret = 0.0;
    let mut fact = 1.0;
    for word in words {
        for half in [*word & 0xffff_ffff, *word >> 32] {
            ret += fact * (half as f64);
            fact *= HALF_WORD_FACTOR;
        }
    }
    ret
}

/// Approximate a 256-bit value as a float.
#[inline]
pub fn u256_to_f64(value: &U256) -> f64 {
    words_to_f64(&value.0)
}

/// Approximate a 512-bit value as a float.
#[inline]
pub fn u512_to_f64(value: &U512) -> f64 {
    words_to_f64(&value.0)
}

/// Parse a big-endian hex string (optionally `0x`-prefixed) into a `U256`.
///
/// Shorter strings are left-padded with zeros.
pub fn u256_from_hex(text: &str) -> Result<U256, hex::FromHexError> {
    let digits = text.trim_start_matches("0x");
    let padded = if digits.len() % 2 == 1 {
        format!("0{}", digits)
    } else {
        digits.to_string()
    };
    let bytes = hex::decode(padded)?;
    if bytes.len() > 32 {
        return Err(hex::FromHexError::InvalidStringLength);
    }
    Ok(U256::from_big_endian(&bytes))
}

/// Render a `U256` as 64 big-endian hex digits.
pub fn u256_to_hex(value: &U256) -> String {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widen_narrow() {
        let value = U256::MAX >> 8;
        assert_eq!(narrow_saturating(&widen(&value)), value);

        let big = widen(&U256::MAX) * U512::from(2u64);
        assert_eq!(narrow_saturating(&big), U256::MAX);
    }

    #[test]
    fn test_mul_div_no_overflow() {
        // MAX * 4 / 4 would wrap in 256 bits.
        let value = U256::MAX >> 1;
        assert_eq!(mul_div(&value, 4, 4), value);
        assert_eq!(mul_div(&value, 4, 8), value >> 1);
    }

    #[test]
    fn test_words_to_f64() {
        assert_eq!(u256_to_f64(&U256::from(12345u64)), 12345.0);
        let two_pow_64 = U256::from(1u64) << 64;
        assert_eq!(u256_to_f64(&two_pow_64), HALF_WORD_FACTOR * HALF_WORD_FACTOR);

        let two_pow_32 = U256::from(1u64) << 32;
        assert_eq!(u256_to_f64(&two_pow_32), HALF_WORD_FACTOR);

        let mixed = U256::from(0x0000_0003_0000_0005u64);
        assert_eq!(u256_to_f64(&mixed), 3.0 * HALF_WORD_FACTOR + 5.0);
    }

    #[test]
    fn test_hex_roundtrip() {
        let value = u256_from_hex("0x00000fffffffffffffffffffffffffffffffffffffffffffffffffffffffffff").unwrap();
        assert_eq!(value, U256::MAX >> 20);
        assert_eq!(
            u256_to_hex(&value),
            "00000fffffffffffffffffffffffffffffffffffffffffffffffffffffffffff"
        );

        assert_eq!(u256_from_hex("abc").unwrap(), U256::from(0xabcu64));
        assert!(u256_from_hex(&"ff".repeat(33)).is_err());
        assert!(u256_from_hex("zz").is_err());
    }
}

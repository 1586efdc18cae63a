//! Compact "nBits" target encoding and difficulty display helpers.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::arith::{u256_to_f64, U256};
use crate::error::CompactError;

/// Compact bits of the difficulty-1 target, used as the display baseline.
pub const DIFFICULTY_ONE_BITS: u32 = 0x1d00ffff;

/// Sign bit inside the 24-bit mantissa field.
const SIGN_BIT: u32 = 0x0080_0000;

/// Mantissa without the sign bit.
const MANTISSA_MASK: u32 = 0x007f_ffff;

/// A 256-bit target packed into 32 bits.
///
/// The format is: [size (1 byte)][mantissa (3 bytes)]
/// Target = mantissa * 256^(size - 3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompactTarget(pub u32);

impl CompactTarget {
    /// Wrap raw bits.
    #[inline]
    pub const fn new(bits: u32) -> Self {
        CompactTarget(bits)
    }

    /// Raw 32-bit encoding.
    #[inline]
    pub const fn to_bits(self) -> u32 {
        self.0
    }

    /// Expand to the full 256-bit target.
    ///
    /// Zero expands to zero. A set sign bit on a non-zero mantissa, or a
    /// size that pushes the mantissa past 256 bits, is rejected rather than
    /// wrapped.
    pub fn expand(self) -> Result<U256, CompactError> {
        let bits = self.0;
        let size = (bits >> 24) as usize;
        let mut word = bits & MANTISSA_MASK;

        if size <= 3 {
            word >>= 8 * (3 - size);
        }

        if word != 0 && (bits & SIGN_BIT) != 0 {
            return Err(CompactError::Negative);
        }

        if word != 0 && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32)) {
            return Err(CompactError::Overflow);
        }

        let value = U256::from(word);
        if size <= 3 {
            Ok(value)
        } else {
            Ok(value << (8 * (size - 3)))
        }
    }

    /// Compress a 256-bit target into its canonical compact form.
    ///
    /// The mantissa is shifted down a byte whenever its top bit would read
    /// as the sign bit, so every result expands as a non-negative value.
    pub fn from_target(target: &U256) -> Self {
        let mut size = (target.bits() + 7) / 8;
        let mut compact = if size <= 3 {
            (target.low_u64() << (8 * (3 - size))) as u32
        } else {
            (*target >> (8 * (size - 3))).low_u64() as u32
        };

        if compact & SIGN_BIT != 0 {
            compact >>= 8;
            size += 1;
        }

        CompactTarget(compact | ((size as u32) << 24))
    }

    /// Approximate difficulty relative to the difficulty-1 target.
    ///
    /// Malformed or zero targets report infinite difficulty.
    pub fn difficulty(self) -> f64 {
        let current = match self.expand() {
            Ok(target) if !target.is_zero() => u256_to_f64(&target),
            _ => return f64::INFINITY,
        };
        let baseline = CompactTarget(DIFFICULTY_ONE_BITS)
            .expand()
            .map(|target| u256_to_f64(&target))
            .unwrap_or(0.0);

        baseline / current
    }
}

impl From<u32> for CompactTarget {
    fn from(bits: u32) -> Self {
        CompactTarget(bits)
    }
}

impl From<CompactTarget> for u32 {
    fn from(target: CompactTarget) -> Self {
        target.0
    }
}

impl fmt::Display for CompactTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// Format difficulty for display (e.g., "1.23T" for trillion).
pub fn format_difficulty(difficulty: f64) -> String {
    if difficulty >= 1e15 {
        format!("{:.2}P", difficulty / 1e15)
    } else if difficulty >= 1e12 {
        format!("{:.2}T", difficulty / 1e12)
    } else if difficulty >= 1e9 {
        format!("{:.2}G", difficulty / 1e9)
    } else if difficulty >= 1e6 {
        format!("{:.2}M", difficulty / 1e6)
    } else if difficulty >= 1e3 {
        format!("{:.2}K", difficulty / 1e3)
    } else {
        format!("{:.2}", difficulty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_difficulty_one() {
        let target = CompactTarget(0x1d00ffff).expand().unwrap();
        // 0x00000000ffff0000...
        assert_eq!(target, U256::from(0xffffu64) << (8 * 26));
    }

    #[test]
    fn test_expand_small_sizes() {
        assert_eq!(CompactTarget(0x01003456).expand().unwrap(), U256::zero());
        assert_eq!(CompactTarget(0x01123456).expand().unwrap(), U256::from(0x12u64));
        assert_eq!(CompactTarget(0x02123456).expand().unwrap(), U256::from(0x1234u64));
        assert_eq!(CompactTarget(0x03123456).expand().unwrap(), U256::from(0x123456u64));
        assert_eq!(CompactTarget(0x04123456).expand().unwrap(), U256::from(0x12345600u64));
        assert_eq!(CompactTarget(0x00000000).expand().unwrap(), U256::zero());
    }

    #[test]
    fn test_expand_rejects_negative() {
        assert_eq!(CompactTarget(0x04923456).expand(), Err(CompactError::Negative));
        assert_eq!(CompactTarget(0x01fedcba).expand(), Err(CompactError::Negative));
        // A zero mantissa with the sign bit is just zero.
        assert_eq!(CompactTarget(0x04800000).expand().unwrap(), U256::zero());
    }

    #[test]
    fn test_expand_rejects_overflow() {
        assert_eq!(CompactTarget(0xff123456).expand(), Err(CompactError::Overflow));
        assert_eq!(CompactTarget(0x21010000).expand(), Err(CompactError::Overflow));
        assert!(CompactTarget(0x20123456).expand().is_ok());
    }

    #[test]
    fn test_compress_known_values() {
        assert_eq!(CompactTarget::from_target(&U256::zero()), CompactTarget(0));
        assert_eq!(CompactTarget::from_target(&U256::from(0x80u64)), CompactTarget(0x02008000));
        assert_eq!(CompactTarget::from_target(&(U256::MAX >> 8)), CompactTarget(0x2000ffff));
        assert_eq!(CompactTarget::from_target(&(U256::MAX >> 20)), CompactTarget(0x1e0fffff));
        assert_eq!(CompactTarget::from_target(&(U256::MAX >> 32)), CompactTarget(0x1d00ffff));
    }

    #[test]
    fn test_compact_roundtrip() {
        let test_cases = [
            0x1d00ffff, // difficulty 1
            0x17034219, // high difficulty
            0x1b0404cb, // medium difficulty
            0x1e0ffff0, // genesis
            0x207fffff, // regtest genesis
            0x2000ffff, // pow limit
            0x1e0fffff, // legacy pow limit
            0x05009234, // needs the extra size byte
            0x12345678, // not canonical, still valid
        ];

        for &bits in &test_cases {
            let target = CompactTarget(bits).expand().unwrap();
            let recompressed = CompactTarget::from_target(&target);
            assert_eq!(
                recompressed.expand().unwrap(),
                target,
                "Roundtrip failed for bits {:08x}",
                bits
            );
        }
    }

    #[test]
    fn test_canonical_bits_are_stable() {
        for &bits in &[0x1d00ffffu32, 0x17034219, 0x1b0404cb, 0x1e0ffff0] {
            let target = CompactTarget(bits).expand().unwrap();
            assert_eq!(CompactTarget::from_target(&target).to_bits(), bits);
        }
    }

    #[test]
    fn test_difficulty_calculation() {
        assert!((CompactTarget(DIFFICULTY_ONE_BITS).difficulty() - 1.0).abs() < 1e-9);
        // One byte smaller target is 256x harder.
        let harder = CompactTarget(0x1c00ffff).difficulty();
        assert!((harder - 256.0).abs() < 1e-6);
        assert_eq!(CompactTarget(0).difficulty(), f64::INFINITY);
    }

    #[test]
    fn test_format_difficulty() {
        assert_eq!(format_difficulty(12.0), "12.00");
        assert_eq!(format_difficulty(1_500.0), "1.50K");
        assert_eq!(format_difficulty(2_000_000_000_000.0), "2.00T");
    }
}

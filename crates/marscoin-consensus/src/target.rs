//! Proof-of-work target arithmetic.
//!
//! Targets are 256-bit unsigned integers that block hashes are compared
//! against. In block headers they travel as compact `nBits`: base-256
//! scientific notation with a one-byte exponent and a three-byte signed
//! mantissa, so `value = mantissa * 256^(exponent - 3)`. The encoding is
//! consensus-critical: two `nBits` words are equal for consensus purposes
//! iff they decode to the same expanded target.
//!
//! All shifts on the 256-bit value are logical. Bits shifted past the top
//! are discarded, which is exactly the behavior the difficulty algorithms
//! rely on when they probe for overflow by shifting back and comparing.

use crate::error::{ConsensusError, ConsensusResult};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Shl, Shr, Sub};
use uint::construct_uint;

construct_uint! {
    /// 256-bit unsigned integer backing targets and accumulated work.
    pub struct U256(4);
}

/// Sign bit of the compact mantissa.
const COMPACT_SIGN_BIT: u32 = 0x0080_0000;

/// Mask selecting the unsigned compact mantissa.
const COMPACT_MANTISSA_MASK: u32 = 0x007f_ffff;

/// An expanded proof-of-work target.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Target(pub(crate) U256);

impl Target {
    /// The zero target. Never valid as a difficulty, useful as a sentinel.
    pub fn zero() -> Self {
        Target(U256::zero())
    }

    /// The smallest valid target (hardest difficulty representable).
    pub fn one() -> Self {
        Target(U256::one())
    }

    /// Whether this target is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Position of the highest set bit plus one; zero for the zero target.
    pub fn bits(&self) -> usize {
        self.0.bits()
    }

    /// Decode a compact `nBits` word.
    ///
    /// Returns the expanded target together with the `negative` and
    /// `overflow` flags. A word is negative when the mantissa sign bit is
    /// set and the mantissa is non-zero; it overflows when a non-zero
    /// mantissa would carry significant bits past 2^256.
    ///
    /// The expanded value is still computed for flagged words (with the
    /// out-of-range bits discarded); callers decide whether the flags are
    /// fatal.
    pub fn from_compact(word: u32) -> (Self, bool, bool) {
        let size = word >> 24;
        let mantissa = word & COMPACT_MANTISSA_MASK;

        let value = if size <= 3 {
            U256::from(mantissa >> (8 * (3 - size)))
        } else {
            U256::from(mantissa) << (8 * (size - 3)) as usize
        };

        let negative = word & COMPACT_SIGN_BIT != 0 && mantissa != 0;
        let overflow = mantissa != 0
            && (size > 34 || (mantissa > 0xff && size > 33) || (mantissa > 0xffff && size > 32));

        (Target(value), negative, overflow)
    }

    /// Decode a compact word, rejecting negative, zero, and overflowing
    /// values with a typed error.
    pub fn checked_from_compact(word: u32) -> ConsensusResult<Self> {
        let (target, negative, overflow) = Self::from_compact(word);
        if negative {
            return Err(ConsensusError::InvalidCompact {
                nbits: word,
                reason: "negative",
            });
        }
        if overflow {
            return Err(ConsensusError::InvalidCompact {
                nbits: word,
                reason: "overflow",
            });
        }
        if target.is_zero() {
            return Err(ConsensusError::InvalidCompact {
                nbits: word,
                reason: "zero",
            });
        }
        Ok(target)
    }

    /// Encode as a compact `nBits` word.
    ///
    /// The mantissa is normalised so its high bit (the sign bit of the
    /// encoding) is clear: when it would be set, the mantissa is shifted
    /// down a byte and the exponent incremented. Decoding the result gives
    /// back a value that is consensus-equal to `self`.
    pub fn to_compact(&self) -> u32 {
        let mut size = (self.0.bits() + 7) / 8;
        let mut compact = if size <= 3 {
            (self.0.low_u64() << (8 * (3 - size))) as u32
        } else {
            let shifted = self.0 >> (8 * (size - 3));
            shifted.low_u64() as u32
        };

        if compact & COMPACT_SIGN_BIT != 0 {
            compact >>= 8;
            size += 1;
        }

        compact | ((size as u32) << 24)
    }

    /// Interpret a 32-byte block hash as a little-endian 256-bit integer
    /// for comparison against a target.
    pub fn from_le_bytes(bytes: &[u8; 32]) -> Self {
        Target(U256::from_little_endian(bytes))
    }

    /// The work this target represents: `2^256 / (target + 1)`.
    ///
    /// Computed as `(~target / (target + 1)) + 1` since `2^256` itself is
    /// not representable.
    pub fn work(&self) -> Work {
        Work((!self.0 / (self.0 + U256::one())) + U256::one())
    }
}

impl Mul<u64> for Target {
    type Output = Target;

    fn mul(self, rhs: u64) -> Target {
        Target(self.0 * rhs)
    }
}

impl Div<u64> for Target {
    type Output = Target;

    fn div(self, rhs: u64) -> Target {
        Target(self.0 / rhs)
    }
}

impl Add for Target {
    type Output = Target;

    fn add(self, rhs: Target) -> Target {
        Target(self.0 + rhs.0)
    }
}

impl Sub for Target {
    type Output = Target;

    fn sub(self, rhs: Target) -> Target {
        Target(self.0 - rhs.0)
    }
}

impl Shl<u32> for Target {
    type Output = Target;

    fn shl(self, rhs: u32) -> Target {
        Target(self.0 << rhs as usize)
    }
}

impl Shr<u32> for Target {
    type Output = Target;

    fn shr(self, rhs: u32) -> Target {
        Target(self.0 >> rhs as usize)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = [0u8; 32];
        self.0.to_big_endian(&mut buf);
        f.debug_tuple("Target").field(&hex::encode(buf)).finish()
    }
}

impl fmt::LowerHex for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = [0u8; 32];
        self.0.to_big_endian(&mut buf);
        f.write_str(&hex::encode(buf))
    }
}

/// Accumulated proof-of-work weight of one or more blocks.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Work(pub(crate) U256);

impl Work {
    /// No work at all (the proof weight of an invalid header).
    pub fn zero() -> Self {
        Work(U256::zero())
    }

    /// Whether this is zero work.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Add for Work {
    type Output = Work;

    fn add(self, rhs: Work) -> Work {
        Work(self.0 + rhs.0)
    }
}

impl AddAssign for Work {
    fn add_assign(&mut self, rhs: Work) {
        self.0 = self.0 + rhs.0;
    }
}

impl fmt::Debug for Work {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = [0u8; 32];
        self.0.to_big_endian(&mut buf);
        f.debug_tuple("Work").field(&hex::encode(buf)).finish()
    }
}

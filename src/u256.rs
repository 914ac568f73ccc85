//! Component A: the 256-bit word type every other component operates on.
//!
//! Limbs are stored least-significant-first (`limbs[0]` holds bits 0..64), the same
//! convention the construction/shift/string oracles in the reference test suite this
//! type is grounded on expect.

use std::cmp::Ordering;
use std::fmt;

/// A 256-bit unsigned integer, four 64-bit limbs, least-significant limb first.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct U256 {
    limbs: [u64; 4],
}

impl U256 {
    pub const ZERO: U256 = U256 { limbs: [0, 0, 0, 0] };
    pub const ONE: U256 = U256 {
        limbs: [1, 0, 0, 0],
    };
    pub const MAX: U256 = U256 {
        limbs: [u64::MAX; 4],
    };

    /// Construct from the given limbs, least-significant first. Omitted high limbs
    /// are zero, so `U256::new(&[17])` is the plain integer 17 and
    /// `U256::new(&[0, 42])` is `42 << 64`.
    pub fn new(parts: &[u64]) -> Self {
        let mut limbs = [0u64; 4];
        for (i, p) in parts.iter().enumerate().take(4) {
            limbs[i] = *p;
        }
        Self { limbs }
    }

    pub const fn from_limbs(limbs: [u64; 4]) -> Self {
        Self { limbs }
    }

    pub const fn limbs(&self) -> [u64; 4] {
        self.limbs
    }

    pub fn is_zero(&self) -> bool {
        self.limbs == [0, 0, 0, 0]
    }

    pub fn bit_len(&self) -> u32 {
        for i in (0..4).rev() {
            if self.limbs[i] != 0 {
                return (i as u32) * 64 + (64 - self.limbs[i].leading_zeros());
            }
        }
        0
    }

    /// Canonical 32-byte big-endian encoding (the EVM "word").
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for i in 0..4 {
            let limb = self.limbs[3 - i];
            out[i * 8..i * 8 + 8].copy_from_slice(&limb.to_be_bytes());
        }
        out
    }

    /// Lower 20 bytes of the big-endian encoding (address truncation).
    pub fn to_be_bytes_20(&self) -> [u8; 20] {
        let full = self.to_be_bytes();
        let mut out = [0u8; 20];
        out.copy_from_slice(&full[12..32]);
        out
    }

    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let mut buf = [0u8; 32];
        let n = bytes.len().min(32);
        buf[32 - n..].copy_from_slice(&bytes[bytes.len() - n..]);
        let mut limbs = [0u64; 4];
        for i in 0..4 {
            let chunk = &buf[i * 8..i * 8 + 8];
            limbs[3 - i] = u64::from_be_bytes(chunk.try_into().unwrap());
        }
        Self { limbs }
    }

    /// Left-pad / truncate an arbitrary byte slice into a word, as `PUSH` does for
    /// short operands and `CALLDATALOAD`/`MLOAD` do for out-of-range reads.
    pub fn from_be_slice_padded(bytes: &[u8]) -> Self {
        let mut buf = [0u8; 32];
        let n = bytes.len().min(32);
        buf[..n].copy_from_slice(&bytes[..n]);
        Self::from_be_bytes(&buf)
    }

    pub fn low_u64(&self) -> u64 {
        self.limbs[0]
    }

    pub fn as_usize_saturating(&self) -> usize {
        if self.limbs[1] != 0 || self.limbs[2] != 0 || self.limbs[3] != 0 {
            usize::MAX
        } else {
            self.limbs[0] as usize
        }
    }

    pub fn as_u64_saturating(&self) -> u64 {
        if self.limbs[1] != 0 || self.limbs[2] != 0 || self.limbs[3] != 0 {
            u64::MAX
        } else {
            self.limbs[0]
        }
    }

    pub fn fits_u64(&self) -> bool {
        self.limbs[1] == 0 && self.limbs[2] == 0 && self.limbs[3] == 0
    }

    pub fn bit(&self, i: u32) -> bool {
        if i >= 256 {
            return false;
        }
        (self.limbs[(i / 64) as usize] >> (i % 64)) & 1 == 1
    }

    pub fn is_negative(&self) -> bool {
        self.bit(255)
    }

    pub fn twos_complement_neg(&self) -> Self {
        (!*self).wrapping_add(U256::ONE)
    }

    /// Absolute value under two's-complement interpretation, plus whether the
    /// original value was negative (needed by `SDIV`/`SMOD` to restore the sign).
    pub fn abs_signed(&self) -> (Self, bool) {
        if self.is_negative() {
            (self.twos_complement_neg(), true)
        } else {
            (*self, false)
        }
    }

    pub fn wrapping_add(&self, other: Self) -> Self {
        let mut limbs = [0u64; 4];
        let mut carry = 0u128;
        for i in 0..4 {
            let sum = self.limbs[i] as u128 + other.limbs[i] as u128 + carry;
            limbs[i] = sum as u64;
            carry = sum >> 64;
        }
        Self { limbs }
    }

    pub fn wrapping_sub(&self, other: Self) -> Self {
        self.wrapping_add(other.twos_complement_neg())
    }

    pub fn wrapping_mul(&self, other: Self) -> Self {
        let mut wide = [0u64; 8];
        for i in 0..4 {
            if self.limbs[i] == 0 {
                continue;
            }
            let mut carry = 0u128;
            for j in 0..4 {
                let acc = wide[i + j] as u128
                    + self.limbs[i] as u128 * other.limbs[j] as u128
                    + carry;
                wide[i + j] = acc as u64;
                carry = acc >> 64;
            }
            let mut k = i + 4;
            while carry > 0 {
                let acc = wide[k] as u128 + carry;
                wide[k] = acc as u64;
                carry = acc >> 64;
                k += 1;
            }
        }
        Self {
            limbs: [wide[0], wide[1], wide[2], wide[3]],
        }
    }

    /// Full 512-bit product, used by `MULMOD` to avoid intermediate overflow.
    fn wide_mul(&self, other: &Self) -> [u64; 8] {
        let mut wide = [0u64; 8];
        for i in 0..4 {
            let mut carry = 0u128;
            for j in 0..4 {
                let acc = wide[i + j] as u128
                    + self.limbs[i] as u128 * other.limbs[j] as u128
                    + carry;
                wide[i + j] = acc as u64;
                carry = acc >> 64;
            }
            let mut k = i + 4;
            while carry > 0 {
                let acc = wide[k] as u128 + carry;
                wide[k] = acc as u64;
                carry = acc >> 64;
                k += 1;
            }
        }
        wide
    }

    /// Unsigned division, returning `(quotient, remainder)`. `None` if `other` is
    /// zero (the EVM opcodes instead define `x / 0 == 0`, handled by the caller).
    pub fn div_rem(&self, other: &Self) -> Option<(Self, Self)> {
        if other.is_zero() {
            return None;
        }
        if self < other {
            return Some((U256::ZERO, *self));
        }
        let mut quotient = U256::ZERO;
        let mut remainder = U256::ZERO;
        for i in (0..256).rev() {
            remainder = remainder.shl_u32(1);
            if self.bit(i) {
                remainder.limbs[0] |= 1;
            }
            if remainder >= *other {
                remainder = remainder.wrapping_sub(*other);
                quotient = quotient.set_bit(i);
            }
        }
        Some((quotient, remainder))
    }

    fn set_bit(mut self, i: u32) -> Self {
        self.limbs[(i / 64) as usize] |= 1 << (i % 64);
        self
    }

    pub fn shl_u32(&self, shift: u32) -> Self {
        if shift >= 256 {
            return U256::ZERO;
        }
        if shift == 0 {
            return *self;
        }
        let limb_shift = (shift / 64) as usize;
        let bit_shift = shift % 64;
        let mut limbs = [0u64; 4];
        for i in (0..4).rev() {
            if i < limb_shift {
                continue;
            }
            let src = i - limb_shift;
            let mut v = self.limbs[src] << bit_shift;
            if bit_shift != 0 && src > 0 {
                v |= self.limbs[src - 1] >> (64 - bit_shift);
            }
            limbs[i] = v;
        }
        Self { limbs }
    }

    pub fn shr_u32(&self, shift: u32) -> Self {
        if shift >= 256 {
            return U256::ZERO;
        }
        if shift == 0 {
            return *self;
        }
        let limb_shift = (shift / 64) as usize;
        let bit_shift = shift % 64;
        let mut limbs = [0u64; 4];
        for i in 0..4 {
            let src = i + limb_shift;
            if src >= 4 {
                continue;
            }
            let mut v = self.limbs[src] >> bit_shift;
            if bit_shift != 0 && src + 1 < 4 {
                v |= self.limbs[src + 1] << (64 - bit_shift);
            }
            limbs[i] = v;
        }
        Self { limbs }
    }

    pub fn shl(&self, shift: U256) -> Self {
        if !shift.fits_u64() || shift.low_u64() >= 256 {
            return U256::ZERO;
        }
        self.shl_u32(shift.low_u64() as u32)
    }

    pub fn shr(&self, shift: U256) -> Self {
        if !shift.fits_u64() || shift.low_u64() >= 256 {
            return U256::ZERO;
        }
        self.shr_u32(shift.low_u64() as u32)
    }

    /// Arithmetic (sign-extending) right shift.
    pub fn sar(&self, shift: U256) -> Self {
        let negative = self.is_negative();
        if !shift.fits_u64() || shift.low_u64() >= 256 {
            return if negative { U256::MAX } else { U256::ZERO };
        }
        let shift = shift.low_u64() as u32;
        if shift == 0 {
            return *self;
        }
        let shifted = self.shr_u32(shift);
        if !negative {
            return shifted;
        }
        let mask = U256::MAX.shl_u32(256 - shift);
        shifted | mask
    }

    pub fn add_mod(&self, other: Self, modulus: Self) -> Self {
        if modulus.is_zero() {
            return U256::ZERO;
        }
        let a = [self.limbs[0], self.limbs[1], self.limbs[2], self.limbs[3], 0];
        let b = [other.limbs[0], other.limbs[1], other.limbs[2], other.limbs[3], 0];
        let mut sum = [0u64; 5];
        let mut carry = 0u128;
        for i in 0..5 {
            let s = a[i] as u128 + b[i] as u128 + carry;
            sum[i] = s as u64;
            carry = s >> 64;
        }
        Self::reduce_wide(&{
            let mut w = [0u64; 8];
            w[..5].copy_from_slice(&sum);
            w
        }, &modulus)
    }

    pub fn mul_mod(&self, other: Self, modulus: Self) -> Self {
        if modulus.is_zero() {
            return U256::ZERO;
        }
        let wide = self.wide_mul(&other);
        Self::reduce_wide(&wide, &modulus)
    }

    /// Reduce a 512-bit value modulo a 256-bit modulus via binary long division.
    fn reduce_wide(wide: &[u64; 8], modulus: &Self) -> Self {
        let mut remainder = U256::ZERO;
        for i in (0..512).rev() {
            remainder = remainder.shl_u32(1);
            let limb = wide[(i / 64) as usize];
            if (limb >> (i % 64)) & 1 == 1 {
                remainder.limbs[0] |= 1;
            }
            if remainder >= *modulus {
                remainder = remainder.wrapping_sub(*modulus);
            }
        }
        remainder
    }

    pub fn pow(&self, exponent: Self) -> Self {
        let mut result = U256::ONE;
        let mut base = *self;
        let bits = exponent.bit_len();
        for i in 0..bits {
            if exponent.bit(i) {
                result = result.wrapping_mul(base);
            }
            base = base.wrapping_mul(base);
        }
        result
    }

    pub fn byte(&self, index: Self) -> Self {
        if !index.fits_u64() || index.low_u64() >= 32 {
            return U256::ZERO;
        }
        let be = self.to_be_bytes();
        U256::new(&[be[index.low_u64() as usize] as u64])
    }

    pub fn sign_extend(&self, byte_index: Self) -> Self {
        if !byte_index.fits_u64() || byte_index.low_u64() >= 31 {
            return *self;
        }
        let n = byte_index.low_u64() as u32;
        let mut be = self.to_be_bytes();
        let extend_from = 31 - n as usize;
        let negative = (be[extend_from] >> 7) & 1 == 1;
        let fill = if negative { 0xffu8 } else { 0x00 };
        for b in be.iter_mut().take(extend_from) {
            *b = fill;
        }
        U256::from_be_bytes(&be)
    }
}

impl PartialOrd for U256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for U256 {
    fn cmp(&self, other: &Self) -> Ordering {
        for i in (0..4).rev() {
            match self.limbs[i].cmp(&other.limbs[i]) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl std::ops::Not for U256 {
    type Output = U256;
    fn not(self) -> U256 {
        U256::new(&self.limbs.map(|l| !l))
    }
}

impl std::ops::BitAnd for U256 {
    type Output = U256;
    fn bitand(self, rhs: Self) -> U256 {
        let mut limbs = [0u64; 4];
        for i in 0..4 {
            limbs[i] = self.limbs[i] & rhs.limbs[i];
        }
        U256 { limbs }
    }
}

impl std::ops::BitOr for U256 {
    type Output = U256;
    fn bitor(self, rhs: Self) -> U256 {
        let mut limbs = [0u64; 4];
        for i in 0..4 {
            limbs[i] = self.limbs[i] | rhs.limbs[i];
        }
        U256 { limbs }
    }
}

impl std::ops::BitXor for U256 {
    type Output = U256;
    fn bitxor(self, rhs: Self) -> U256 {
        let mut limbs = [0u64; 4];
        for i in 0..4 {
            limbs[i] = self.limbs[i] ^ rhs.limbs[i];
        }
        U256 { limbs }
    }
}

impl From<u64> for U256 {
    fn from(v: u64) -> Self {
        U256::new(&[v])
    }
}

impl From<u32> for U256 {
    fn from(v: u32) -> Self {
        U256::new(&[v as u64])
    }
}

impl From<usize> for U256 {
    fn from(v: usize) -> Self {
        U256::new(&[v as u64])
    }
}

impl From<i64> for U256 {
    fn from(v: i64) -> Self {
        if v >= 0 {
            U256::new(&[v as u64])
        } else {
            U256::new(&[(-v) as u64]).twos_complement_neg()
        }
    }
}

/// Printed least-significant limb first, matching the reference oracle's Stringer.
impl fmt::Debug for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:016x} {:016x} {:016x} {:016x}",
            self.limbs[0], self.limbs[1], self.limbs[2], self.limbs[3]
        )
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.to_be_bytes()))
    }
}

#[cfg(feature = "util")]
impl serde::Serialize for U256 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{}", self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_zero() {
        assert!(U256::new(&[]).is_zero());
        assert!(!U256::new(&[1]).is_zero());
    }

    #[test]
    fn bytes32be() {
        let x = U256::new(&[1, 2, 3, 4]);
        assert_eq!(
            x.to_be_bytes(),
            [
                0, 0, 0, 0, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0, 3, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, 0,
                0, 0, 0, 1
            ]
        );
    }

    #[test]
    fn bytes20be() {
        let x = U256::new(&[1, 2, 3, 4]);
        assert_eq!(
            x.to_be_bytes_20(),
            [0, 0, 0, 3, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 1]
        );
    }

    #[test]
    fn ordering() {
        let a = U256::new(&[1, 2, 3, 4]);
        let b = U256::new(&[4]);
        assert!(a != b);
        assert!(b < a);
        assert!(a > b);
    }

    #[test]
    fn add_wraps() {
        assert_eq!(
            U256::MAX.wrapping_add(U256::ONE),
            U256::ZERO
        );
        assert_eq!(U256::from(17u64).wrapping_add(13u64.into()), 30u64.into());
    }

    #[test]
    fn sub_wraps() {
        assert_eq!(U256::ZERO.wrapping_sub(U256::ONE), U256::MAX);
    }

    #[test]
    fn add_mod_overflow() {
        assert_eq!(
            U256::MAX.add_mod(U256::from(2u64), U256::from(2u64)),
            U256::ONE
        );
    }

    #[test]
    fn mul_mod_overflow() {
        assert_eq!(
            U256::MAX.mul_mod(U256::MAX, U256::from(12u64)),
            U256::from(9u64)
        );
    }

    #[test]
    fn div_rem_basic() {
        let (q, r) = U256::from(24u64).div_rem(&U256::from(8u64)).unwrap();
        assert_eq!(q, U256::from(3u64));
        assert_eq!(r, U256::ZERO);
    }

    #[test]
    fn shl_crosses_limb() {
        assert_eq!(U256::from(42u64).shl(64u64.into()), U256::new(&[0, 42]));
    }

    #[test]
    fn shr_crosses_limb() {
        assert_eq!(U256::new(&[0, 42]).shr(64u64.into()), U256::from(42u64));
    }

    #[test]
    fn exp_small() {
        assert_eq!(U256::from(7u64).pow(5u64.into()), U256::from(16807u64));
    }
}

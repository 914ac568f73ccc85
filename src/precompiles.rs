//! Precompiled-contract address table and gas formulas (component G's callee
//! classification, spec.md §1/§4.6). spec.md explicitly scopes this crate to
//! "only their address table and advertised gas formula" -- the actual
//! cryptography (ECDSA recovery, SHA-256, RIPEMD-160, MODEXP, the BN254 curve
//! operations, BLAKE2F compression) is an external collaborator, never
//! implemented here. `call.rs` consults [`Precompile::from_address`] to
//! classify a callee and [`Precompile::gas_cost`] to charge for the attempt;
//! actually producing output bytes is delegated to a caller-supplied
//! [`PrecompileRunner`].

use crate::revision::Revision;
use crate::state::num_words;
use crate::types::Address;

/// The nine standard precompile addresses, `0x01`..`0x09`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Precompile {
    EcRecover = 1,
    Sha256 = 2,
    Ripemd160 = 3,
    Identity = 4,
    ModExp = 5,
    EcAdd = 6,
    EcMul = 7,
    EcPairing = 8,
    Blake2F = 9,
}

impl Precompile {
    /// Classify `address` as a precompile, irrespective of revision
    /// availability -- callers check [`Precompile::is_available`] separately,
    /// the same way `is_code_position` and revision-gating are kept as
    /// distinct questions elsewhere in this crate.
    pub fn from_address(address: Address) -> Option<Self> {
        if address.0[..19] != [0u8; 19] {
            return None;
        }
        Some(match address.0[19] {
            1 => Self::EcRecover,
            2 => Self::Sha256,
            3 => Self::Ripemd160,
            4 => Self::Identity,
            5 => Self::ModExp,
            6 => Self::EcAdd,
            7 => Self::EcMul,
            8 => Self::EcPairing,
            9 => Self::Blake2F,
            _ => return None,
        })
    }

    pub fn address(self) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = self as u8;
        Address(bytes)
    }

    /// `EcAdd`/`EcMul`/`EcPairing` arrive at Byzantium (EIP-196/197);
    /// `Blake2F` arrives at Istanbul (EIP-152); the first four are available
    /// from Frontier onward.
    pub fn is_available(self, revision: Revision) -> bool {
        match self {
            Self::EcAdd | Self::EcMul | Self::EcPairing => revision >= Revision::Byzantium,
            Self::Blake2F => revision >= Revision::Istanbul,
            _ => true,
        }
    }

    /// The advertised gas formula for this precompile, given its raw input.
    /// `ModExp`'s formula is itself revision-dependent (EIP-2565 repriced it
    /// at Berlin); everything else is a flat or per-word cost.
    pub fn gas_cost(self, input: &[u8], revision: Revision) -> u64 {
        match self {
            Self::EcRecover => 3000,
            Self::Sha256 => 60 + 12 * num_words(input.len()),
            Self::Ripemd160 => 600 + 120 * num_words(input.len()),
            Self::Identity => 15 + 3 * num_words(input.len()),
            Self::ModExp => modexp_gas_cost(input, revision),
            Self::EcAdd => {
                if revision >= Revision::Istanbul {
                    150
                } else {
                    500
                }
            }
            Self::EcMul => {
                if revision >= Revision::Istanbul {
                    6000
                } else {
                    40000
                }
            }
            Self::EcPairing => {
                let pairs = input.len() / 192;
                if revision >= Revision::Istanbul {
                    45000 + 34000 * pairs as u64
                } else {
                    100000 + 80000 * pairs as u64
                }
            }
            Self::Blake2F => {
                // First 4 bytes of input are the big-endian round count
                // (EIP-152); malformed input is the runner's problem, not the
                // gas formula's -- this only advertises the per-round cost.
                input.get(0..4).map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as u64).unwrap_or(0)
            }
        }
    }
}

/// EIP-198/EIP-2565 `MODEXP` gas formula. Pre-Berlin uses the quadratic
/// complexity formula from EIP-198; Berlin onward uses EIP-2565's cheaper
/// `max(200, words^2 / 3)` floor, both read the three 32-byte length headers
/// (`base_len`, `exp_len`, `mod_len`) from the front of `input`.
fn modexp_gas_cost(input: &[u8], revision: Revision) -> u64 {
    let read_len = |offset: usize| -> u64 {
        let mut buf = [0u8; 32];
        for (i, b) in buf.iter_mut().enumerate() {
            if let Some(v) = input.get(offset + i) {
                *b = *v;
            }
        }
        u64::from_be_bytes(buf[24..32].try_into().unwrap())
    };
    let base_len = read_len(0);
    let exp_len = read_len(32);
    let mod_len = read_len(64);
    let max_len = base_len.max(mod_len);
    let words = max_len.div_ceil(8);
    let complexity = words * words;

    let exp_head_start = 96 + base_len as usize;
    let exp_head = {
        let mut buf = [0u8; 32];
        let take = (exp_len as usize).min(32);
        for i in 0..take {
            if let Some(v) = input.get(exp_head_start + i) {
                buf[32 - take + i] = *v;
            }
        }
        u64::from_be_bytes(buf[24..32].try_into().unwrap())
    };
    let iteration_count = if exp_len <= 32 {
        if exp_head == 0 {
            0
        } else {
            63 - exp_head.leading_zeros() as u64
        }
    } else {
        let extra = 8 * (exp_len - 32);
        if exp_head == 0 {
            extra
        } else {
            extra + 63 - exp_head.leading_zeros() as u64
        }
    }
    .max(1);

    if revision >= Revision::Berlin {
        (complexity * iteration_count / 3).max(200)
    } else {
        let complexity = if max_len <= 64 {
            complexity
        } else if max_len <= 1024 {
            complexity / 4 + 96 * max_len - 3072
        } else {
            complexity / 16 + 480 * max_len - 199680
        };
        (complexity * iteration_count / 20).max(200)
    }
}

/// Output of a precompile's native execution. `gas_used` lets a runner report
/// less than the advertised [`Precompile::gas_cost`] only where a formula
/// explicitly allows it (none of the nine currently do); callers always
/// charge the advertised cost up front and treat this purely as the return
/// payload.
#[derive(Clone, Debug, Default)]
pub struct PrecompileOutput {
    pub output: Vec<u8>,
}

/// The native-execution collaborator spec.md §1 scopes out of this crate.
/// `call.rs` charges [`Precompile::gas_cost`] itself and only reaches for
/// this trait to produce the actual output bytes; a call target with no
/// runner configured, or one that returns `Err`, fails the call the same way
/// an ordinary sub-call returning `Failed` would.
pub trait PrecompileRunner: std::fmt::Debug {
    fn run(&self, precompile: Precompile, input: &[u8]) -> Result<PrecompileOutput, ()>;
}

/// A runner that fails every precompile call -- the default when no host
/// integration supplies cryptographic primitives.
#[derive(Debug, Default)]
pub struct UnimplementedPrecompiles;

impl PrecompileRunner for UnimplementedPrecompiles {
    fn run(&self, _precompile: Precompile, _input: &[u8]) -> Result<PrecompileOutput, ()> {
        Err(())
    }
}

/// A runner that treats every precompile as the identity function -- useful
/// for CT-harness differential testing where the precompile's *plumbing*
/// (address classification, gas charge, call/return wiring) is under test,
/// not the cryptography itself.
#[derive(Debug, Default)]
pub struct IdentityPrecompiles;

impl PrecompileRunner for IdentityPrecompiles {
    fn run(&self, _precompile: Precompile, input: &[u8]) -> Result<PrecompileOutput, ()> {
        Ok(PrecompileOutput { output: input.to_vec() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_the_nine_standard_addresses() {
        for n in 1u8..=9 {
            let mut bytes = [0u8; 20];
            bytes[19] = n;
            assert!(Precompile::from_address(Address(bytes)).is_some());
        }
        let mut bytes = [0u8; 20];
        bytes[19] = 10;
        assert_eq!(Precompile::from_address(Address(bytes)), None);
    }

    #[test]
    fn bn254_ops_gated_at_byzantium() {
        assert!(!Precompile::EcAdd.is_available(Revision::Homestead));
        assert!(Precompile::EcAdd.is_available(Revision::Byzantium));
    }

    #[test]
    fn blake2f_gated_at_istanbul() {
        assert!(!Precompile::Blake2F.is_available(Revision::Byzantium));
        assert!(Precompile::Blake2F.is_available(Revision::Istanbul));
    }

    #[test]
    fn identity_gas_is_per_word() {
        assert_eq!(Precompile::Identity.gas_cost(&[0u8; 32], Revision::Cancun), 15 + 3);
        assert_eq!(Precompile::Identity.gas_cost(&[0u8; 33], Revision::Cancun), 15 + 6);
    }

    #[test]
    fn ecadd_repriced_at_istanbul() {
        assert_eq!(Precompile::EcAdd.gas_cost(&[], Revision::Byzantium), 500);
        assert_eq!(Precompile::EcAdd.gas_cost(&[], Revision::Istanbul), 150);
    }

    #[test]
    fn modexp_floor_is_200_at_berlin() {
        let input = vec![0u8; 96];
        assert_eq!(modexp_gas_cost(&input, Revision::Berlin), 200);
    }
}

//! Revision/hard-fork progression. Grounded in `common::Revision` (which the
//! retrieval pack's copy only carried through London) and extended through Cancun,
//! since the gas tables and opcode availability this crate must model reference
//! Shanghai/Cancun explicitly.

use strum_macros::Display;

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "util", derive(serde::Serialize, serde::Deserialize))]
pub enum Revision {
    /// The Frontier revision. The one Ethereum launched with.
    Frontier = 0,
    /// [EIP-606](https://eips.ethereum.org/EIPS/eip-606)
    Homestead = 1,
    /// [EIP-608](https://eips.ethereum.org/EIPS/eip-608)
    Tangerine = 2,
    /// [EIP-607](https://eips.ethereum.org/EIPS/eip-607)
    Spurious = 3,
    /// [EIP-609](https://eips.ethereum.org/EIPS/eip-609)
    Byzantium = 4,
    /// [EIP-1013](https://eips.ethereum.org/EIPS/eip-1013)
    Constantinople = 5,
    /// [EIP-1716](https://eips.ethereum.org/EIPS/eip-1716)
    Petersburg = 6,
    /// [EIP-1679](https://eips.ethereum.org/EIPS/eip-1679)
    Istanbul = 7,
    /// Berlin, [EIP-2929](https://eips.ethereum.org/EIPS/eip-2929) access lists.
    Berlin = 8,
    /// London, [EIP-1559](https://eips.ethereum.org/EIPS/eip-1559) base fee and
    /// [EIP-3529](https://eips.ethereum.org/EIPS/eip-3529) refund reduction.
    London = 9,
    /// The Paris revision (the Merge). No new opcodes; `DIFFICULTY` is
    /// repurposed as `PREVRANDAO`.
    Paris = 10,
    /// Shanghai, [EIP-3855](https://eips.ethereum.org/EIPS/eip-3855) `PUSH0` and
    /// [EIP-3860](https://eips.ethereum.org/EIPS/eip-3860) init-code size limit.
    Shanghai = 11,
    /// Cancun, [EIP-1153](https://eips.ethereum.org/EIPS/eip-1153) transient
    /// storage (`TLOAD`/`TSTORE`).
    Cancun = 12,
}

impl Revision {
    pub fn iter() -> impl Iterator<Item = Self> {
        [
            Self::Frontier,
            Self::Homestead,
            Self::Tangerine,
            Self::Spurious,
            Self::Byzantium,
            Self::Constantinople,
            Self::Petersburg,
            Self::Istanbul,
            Self::Berlin,
            Self::London,
            Self::Paris,
            Self::Shanghai,
            Self::Cancun,
        ]
        .into_iter()
    }

    pub const fn len() -> usize {
        Self::Cancun as usize + 1
    }

    pub const fn latest() -> Self {
        Self::Cancun
    }
}

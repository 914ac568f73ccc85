//! Component E: the gas schedule. A table keyed by `(revision, opcode)` giving
//! static cost and stack delta, plus the dynamic-cost rules spec.md §4.2 calls
//! out by name (`SSTORE`, warm/cold access, `EXP`, `LOG_n`, `SHA3`, the copy
//! opcodes, `CALL`/`CREATE` family). Grounded on the teacher's
//! `instructions::properties` (`PROPERTIES`/`*_GAS_COSTS` per-revision cascade)
//! and `config.rs`'s `Config::frontier()` → `..Self::prev()` chaining pattern,
//! folded into one table builder instead of a separate `Config` struct since
//! spec.md §4.2 describes a single schedule, not a parallel config layer.

use crate::opcode::OpCode;
use crate::revision::Revision;
use once_cell::race::OnceBox;

pub const COLD_SLOAD_COST: u64 = 2100;
pub const COLD_ACCOUNT_ACCESS_COST: u64 = 2600;
pub const WARM_STORAGE_READ_COST: u64 = 100;
pub const ADDITIONAL_COLD_ACCOUNT_ACCESS_COST: u64 = COLD_ACCOUNT_ACCESS_COST - WARM_STORAGE_READ_COST;
pub const ADDITIONAL_COLD_SLOAD_COST: u64 = COLD_SLOAD_COST - WARM_STORAGE_READ_COST;
pub const CALL_STIPEND: u64 = 2300;
pub const CALL_VALUE_COST: u64 = 9000;
pub const NEW_ACCOUNT_COST: u64 = 25000;
pub const CREATE_GAS: u64 = 32000;
pub const SELFDESTRUCT_REFUND: i64 = 24000;
pub const SSTORE_SET_GAS: u64 = 20000;
pub const SSTORE_RESET_GAS: u64 = 5000;
pub const SSTORE_CLEARS_REFUND: i64 = 15000;
pub const SSTORE_CLEARS_REFUND_LONDON: i64 = 4800;
pub const MAX_CODE_SIZE: usize = 0x6000;
pub const MAX_INITCODE_SIZE: usize = 0xC000;

/// Stack-height requirements plus static gas cost, per opcode. `stack_in` /
/// `stack_out` mirror spec.md §4.1 step 4's overflow/underflow check directly
/// (`stack.size < stack_in` underflows, `stack.size - stack_in + stack_out >
/// 1024` overflows); `static_gas` is charged before op-specific logic runs.
#[derive(Clone, Copy, Debug)]
pub struct OpSchedule {
    pub static_gas: u64,
    pub stack_in: u8,
    pub stack_out: u8,
}

impl OpSchedule {
    const fn new(static_gas: u64, stack_in: u8, stack_out: u8) -> Self {
        Self {
            static_gas,
            stack_in,
            stack_out,
        }
    }
}

pub type OpTable = [Option<OpSchedule>; 256];

#[allow(clippy::needless_range_loop)]
fn frontier_table() -> OpTable {
    let mut t: OpTable = [None; 256];
    macro_rules! op {
        ($op:expr, $gas:expr, $in:expr, $out:expr) => {
            t[$op.to_usize()] = Some(OpSchedule::new($gas, $in, $out));
        };
    }

    op!(OpCode::STOP, 0, 0, 0);
    op!(OpCode::ADD, 3, 2, 1);
    op!(OpCode::MUL, 5, 2, 1);
    op!(OpCode::SUB, 3, 2, 1);
    op!(OpCode::DIV, 5, 2, 1);
    op!(OpCode::SDIV, 5, 2, 1);
    op!(OpCode::MOD, 5, 2, 1);
    op!(OpCode::SMOD, 5, 2, 1);
    op!(OpCode::ADDMOD, 8, 3, 1);
    op!(OpCode::MULMOD, 8, 3, 1);
    op!(OpCode::EXP, 10, 2, 1);
    op!(OpCode::SIGNEXTEND, 5, 2, 1);

    op!(OpCode::LT, 3, 2, 1);
    op!(OpCode::GT, 3, 2, 1);
    op!(OpCode::SLT, 3, 2, 1);
    op!(OpCode::SGT, 3, 2, 1);
    op!(OpCode::EQ, 3, 2, 1);
    op!(OpCode::ISZERO, 3, 1, 1);
    op!(OpCode::AND, 3, 2, 1);
    op!(OpCode::OR, 3, 2, 1);
    op!(OpCode::XOR, 3, 2, 1);
    op!(OpCode::NOT, 3, 1, 1);
    op!(OpCode::BYTE, 3, 2, 1);

    op!(OpCode::KECCAK256, 30, 2, 1);

    op!(OpCode::ADDRESS, 2, 0, 1);
    op!(OpCode::BALANCE, 20, 1, 1);
    op!(OpCode::ORIGIN, 2, 0, 1);
    op!(OpCode::CALLER, 2, 0, 1);
    op!(OpCode::CALLVALUE, 2, 0, 1);
    op!(OpCode::CALLDATALOAD, 3, 1, 1);
    op!(OpCode::CALLDATASIZE, 2, 0, 1);
    op!(OpCode::CALLDATACOPY, 3, 3, 0);
    op!(OpCode::CODESIZE, 2, 0, 1);
    op!(OpCode::CODECOPY, 3, 3, 0);
    op!(OpCode::GASPRICE, 2, 0, 1);
    op!(OpCode::EXTCODESIZE, 20, 1, 1);
    op!(OpCode::EXTCODECOPY, 20, 4, 0);

    op!(OpCode::BLOCKHASH, 20, 1, 1);
    op!(OpCode::COINBASE, 2, 0, 1);
    op!(OpCode::TIMESTAMP, 2, 0, 1);
    op!(OpCode::NUMBER, 2, 0, 1);
    op!(OpCode::DIFFICULTY, 2, 0, 1);
    op!(OpCode::GASLIMIT, 2, 0, 1);

    op!(OpCode::POP, 2, 1, 0);
    op!(OpCode::MLOAD, 3, 1, 1);
    op!(OpCode::MSTORE, 3, 2, 0);
    op!(OpCode::MSTORE8, 3, 2, 0);
    op!(OpCode::SLOAD, 50, 1, 1);
    op!(OpCode::SSTORE, 0, 2, 0);
    op!(OpCode::JUMP, 8, 1, 0);
    op!(OpCode::JUMPI, 10, 2, 0);
    op!(OpCode::PC, 2, 0, 1);
    op!(OpCode::MSIZE, 2, 0, 1);
    op!(OpCode::GAS, 2, 0, 1);
    op!(OpCode::JUMPDEST, 1, 0, 0);

    for op in OpCode::PUSH1.to_usize()..=OpCode::PUSH32.to_usize() {
        t[op] = Some(OpSchedule::new(3, 0, 1));
    }
    for (i, op) in (OpCode::DUP1.to_usize()..=OpCode::DUP16.to_usize()).enumerate() {
        t[op] = Some(OpSchedule::new(3, (i + 1) as u8, (i + 2) as u8));
    }
    for (i, op) in (OpCode::SWAP1.to_usize()..=OpCode::SWAP16.to_usize()).enumerate() {
        t[op] = Some(OpSchedule::new(3, (i + 2) as u8, (i + 2) as u8));
    }
    for (i, op) in (OpCode::LOG0.to_usize()..=OpCode::LOG4.to_usize()).enumerate() {
        t[op] = Some(OpSchedule::new(375 + 375 * i as u64, (2 + i) as u8, 0));
    }

    op!(OpCode::CREATE, 32000, 3, 1);
    op!(OpCode::CALL, 40, 7, 1);
    op!(OpCode::CALLCODE, 40, 7, 1);
    op!(OpCode::RETURN, 0, 2, 0);
    op!(OpCode::INVALID, 0, 0, 0);
    op!(OpCode::SELFDESTRUCT, 0, 1, 0);

    t
}

fn homestead_table() -> OpTable {
    let mut t = frontier_table();
    t[OpCode::DELEGATECALL.to_usize()] = Some(OpSchedule::new(40, 6, 1));
    t
}

fn tangerine_table() -> OpTable {
    let mut t = homestead_table();
    t[OpCode::BALANCE.to_usize()] = Some(OpSchedule::new(400, 1, 1));
    t[OpCode::EXTCODESIZE.to_usize()] = Some(OpSchedule::new(700, 1, 1));
    t[OpCode::EXTCODECOPY.to_usize()] = Some(OpSchedule::new(700, 4, 0));
    t[OpCode::SLOAD.to_usize()] = Some(OpSchedule::new(200, 1, 1));
    t[OpCode::CALL.to_usize()] = Some(OpSchedule::new(700, 7, 1));
    t[OpCode::CALLCODE.to_usize()] = Some(OpSchedule::new(700, 7, 1));
    t[OpCode::DELEGATECALL.to_usize()] = Some(OpSchedule::new(700, 6, 1));
    t[OpCode::SELFDESTRUCT.to_usize()] = Some(OpSchedule::new(5000, 1, 0));
    t
}

fn spurious_table() -> OpTable {
    tangerine_table()
}

fn byzantium_table() -> OpTable {
    let mut t = spurious_table();
    t[OpCode::RETURNDATASIZE.to_usize()] = Some(OpSchedule::new(2, 0, 1));
    t[OpCode::RETURNDATACOPY.to_usize()] = Some(OpSchedule::new(3, 3, 0));
    t[OpCode::STATICCALL.to_usize()] = Some(OpSchedule::new(700, 6, 1));
    t[OpCode::REVERT.to_usize()] = Some(OpSchedule::new(0, 2, 0));
    t
}

fn constantinople_table() -> OpTable {
    let mut t = byzantium_table();
    t[OpCode::SHL.to_usize()] = Some(OpSchedule::new(3, 2, 1));
    t[OpCode::SHR.to_usize()] = Some(OpSchedule::new(3, 2, 1));
    t[OpCode::SAR.to_usize()] = Some(OpSchedule::new(3, 2, 1));
    t[OpCode::EXTCODEHASH.to_usize()] = Some(OpSchedule::new(400, 1, 1));
    t[OpCode::CREATE2.to_usize()] = Some(OpSchedule::new(32000, 4, 1));
    t
}

fn petersburg_table() -> OpTable {
    constantinople_table()
}

fn istanbul_table() -> OpTable {
    let mut t = petersburg_table();
    t[OpCode::BALANCE.to_usize()] = Some(OpSchedule::new(700, 1, 1));
    t[OpCode::CHAINID.to_usize()] = Some(OpSchedule::new(2, 0, 1));
    t[OpCode::EXTCODEHASH.to_usize()] = Some(OpSchedule::new(700, 1, 1));
    t[OpCode::SELFBALANCE.to_usize()] = Some(OpSchedule::new(5, 0, 1));
    t[OpCode::SLOAD.to_usize()] = Some(OpSchedule::new(800, 1, 1));
    t
}

fn berlin_table() -> OpTable {
    let mut t = istanbul_table();
    let warm = WARM_STORAGE_READ_COST;
    t[OpCode::EXTCODESIZE.to_usize()] = Some(OpSchedule::new(warm, 1, 1));
    t[OpCode::EXTCODECOPY.to_usize()] = Some(OpSchedule::new(warm, 4, 0));
    t[OpCode::EXTCODEHASH.to_usize()] = Some(OpSchedule::new(warm, 1, 1));
    t[OpCode::BALANCE.to_usize()] = Some(OpSchedule::new(warm, 1, 1));
    t[OpCode::CALL.to_usize()] = Some(OpSchedule::new(warm, 7, 1));
    t[OpCode::CALLCODE.to_usize()] = Some(OpSchedule::new(warm, 7, 1));
    t[OpCode::DELEGATECALL.to_usize()] = Some(OpSchedule::new(warm, 6, 1));
    t[OpCode::STATICCALL.to_usize()] = Some(OpSchedule::new(warm, 6, 1));
    t[OpCode::SLOAD.to_usize()] = Some(OpSchedule::new(warm, 1, 1));
    t
}

fn london_table() -> OpTable {
    let mut t = berlin_table();
    t[OpCode::BASEFEE.to_usize()] = Some(OpSchedule::new(2, 0, 1));
    t
}

fn paris_table() -> OpTable {
    london_table()
}

fn shanghai_table() -> OpTable {
    let mut t = paris_table();
    t[OpCode::PUSH0.to_usize()] = Some(OpSchedule::new(2, 0, 1));
    t
}

fn cancun_table() -> OpTable {
    let mut t = shanghai_table();
    t[OpCode::TLOAD.to_usize()] = Some(OpSchedule::new(WARM_STORAGE_READ_COST, 1, 1));
    t[OpCode::TSTORE.to_usize()] = Some(OpSchedule::new(WARM_STORAGE_READ_COST, 2, 0));
    t
}

static TABLES: OnceBox<[OpTable; Revision::len()]> = OnceBox::new();

fn build_tables() -> [OpTable; Revision::len()] {
    [
        frontier_table(),
        homestead_table(),
        tangerine_table(),
        spurious_table(),
        byzantium_table(),
        constantinople_table(),
        petersburg_table(),
        istanbul_table(),
        berlin_table(),
        london_table(),
        paris_table(),
        shanghai_table(),
        cancun_table(),
    ]
}

/// Per-revision schedule. `None` for an opcode means it is undefined in that
/// revision (spec.md §4.1 step 3's revision gate).
pub fn table(revision: Revision) -> &'static OpTable {
    &TABLES.get_or_init(|| Box::new(build_tables()))[revision as usize]
}

pub fn lookup(revision: Revision, op: OpCode) -> Option<OpSchedule> {
    table(revision)[op.to_usize()]
}

/// `EXP`'s per-byte-of-exponent dynamic cost (spec.md §4.2): 10 gas/byte before
/// Spurious Dragon, 50 after.
pub fn exp_byte_cost(revision: Revision) -> u64 {
    if revision >= Revision::Spurious {
        50
    } else {
        10
    }
}

/// `w` 32-byte words -> `3w + floor(w^2/512)`, the quadratic memory-expansion
/// curve spec.md §4.4/§4.5 both reference.
pub fn memory_expansion_cost(words: u64) -> u64 {
    3 * words + words * words / 512
}

/// `SSTORE`'s refund quotient cap (spec.md §4.5 / EIP-3529): 2 pre-London, 5
/// from London onward.
pub fn max_refund_quotient(revision: Revision) -> u64 {
    if revision >= Revision::London {
        5
    } else {
        2
    }
}

/// Charge `amount` against `state.gas`, failing `OutOfGas` instead of wrapping.
pub fn charge(state: &mut crate::state::State, amount: u64) -> Result<(), crate::error::StatusCode> {
    state.gas = state
        .gas
        .checked_sub(amount)
        .ok_or(crate::error::StatusCode::OutOfGas)?;
    Ok(())
}

/// Per-word dynamic costs for the opcodes spec.md §4.2 calls out by name:
/// `CALLDATACOPY`/`CODECOPY`/`EXTCODECOPY`/`RETURNDATACOPY` charge 3 gas/word,
/// `KECCAK256`/`LOG_n`'s data charge 6/8 gas per word or byte respectively.
pub mod dynamic {
    use crate::state::num_words;

    pub fn copy_words_cost(len: usize) -> u64 {
        num_words(len) * 3
    }

    pub fn keccak_words_cost(len: usize) -> u64 {
        num_words(len) * 6
    }

    pub fn log_data_cost(len: usize) -> u64 {
        len as u64 * 8
    }
}

/// `true` for the revisions using the full (original, current, new)
/// net-gas-metering refund table: Constantinople (EIP-1283) and Istanbul
/// onward (EIP-2200). Petersburg reverted EIP-1283 without replacing it, so it
/// falls back to the flat clear-only rule along with every earlier revision.
pub fn net_gas_metering(revision: Revision) -> bool {
    revision == Revision::Constantinople || revision >= Revision::Istanbul
}

/// The cost of a plain re-read of an already-touched slot under `revision` --
/// EIP-2200's `SLOAD_GAS`, repriced to the warm-read cost by EIP-2929 from
/// Berlin onward.
fn sload_gas(revision: Revision) -> u64 {
    if revision >= Revision::Berlin {
        WARM_STORAGE_READ_COST
    } else if revision >= Revision::Istanbul {
        800
    } else {
        200
    }
}

/// The refund-counter delta for an `SSTORE` writing `new` to a slot that held
/// `current` at the start of this call and `original` at the start of the
/// transaction (spec.md §4.2/§4.5, EIP-2200 as amended by EIP-2929/EIP-3529).
/// Zero on revisions [`net_gas_metering`] excludes -- those grant their one
/// clear refund via `StorageStatus::Deleted` at the call site instead, since
/// the flat cost model never unwinds a refund within the same transaction.
pub fn sstore_refund_delta(
    original: crate::u256::U256,
    current: crate::u256::U256,
    new: crate::u256::U256,
    revision: Revision,
) -> i64 {
    if current == new || !net_gas_metering(revision) {
        return 0;
    }

    let clears_refund = sstore_clears_refund(revision);
    let mut refund = 0i64;

    if original == current {
        if !original.is_zero() && new.is_zero() {
            refund += clears_refund;
        }
    } else {
        if !original.is_zero() {
            if current.is_zero() {
                refund -= clears_refund;
            }
            if new.is_zero() {
                refund += clears_refund;
            }
        }
        if original == new {
            if original.is_zero() {
                refund += (SSTORE_SET_GAS - sload_gas(revision)) as i64;
            } else {
                refund += (SSTORE_RESET_GAS - sload_gas(revision)) as i64;
            }
        }
    }

    refund
}

pub fn sstore_clears_refund(revision: Revision) -> i64 {
    if revision >= Revision::London {
        SSTORE_CLEARS_REFUND_LONDON
    } else {
        SSTORE_CLEARS_REFUND
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basefee_undefined_before_london() {
        assert!(lookup(Revision::Berlin, OpCode::BASEFEE).is_none());
        assert!(lookup(Revision::London, OpCode::BASEFEE).is_some());
    }

    #[test]
    fn sload_is_revision_dependent() {
        assert_eq!(lookup(Revision::Frontier, OpCode::SLOAD).unwrap().static_gas, 50);
        assert_eq!(lookup(Revision::Istanbul, OpCode::SLOAD).unwrap().static_gas, 800);
        assert_eq!(
            lookup(Revision::Berlin, OpCode::SLOAD).unwrap().static_gas,
            WARM_STORAGE_READ_COST
        );
    }

    #[test]
    fn memory_expansion_matches_spec_example() {
        assert_eq!(memory_expansion_cost(1), 3);
        assert_eq!(memory_expansion_cost(2), 6);
    }

    #[test]
    fn refund_quotient_changes_at_london() {
        assert_eq!(max_refund_quotient(Revision::Berlin), 2);
        assert_eq!(max_refund_quotient(Revision::London), 5);
    }
}

//! Random, revision-consistent initial-`State` generator (spec.md §4.8: "a
//! random generator constructs a valid initial `State` with uniformly-random
//! U256 fields and a revision-consistent block number"). Grounded on
//! `go/ct/gen/block_context.go`'s fork-block-plus-offset scheme (SPEC_FULL.md
//! §2); the teacher has no generator of its own, so the random-field shape
//! (a handful of stack entries, a couple of touched accounts/storage slots, a
//! short piece of code) is sized the way `util::bytecode`'s own test fixtures
//! are, not mined from a teacher original.

use crate::code::Code;
use crate::revision::Revision;
use crate::state::{Account, BlockContext, CallContext, CallKind, State};
use crate::types::Address;
use crate::u256::U256;
use rand::Rng;

/// The first block number at which `revision` is active on mainnet, or `None`
/// for revisions with no fixed activation block (anything from The Merge
/// onward switched to time-based activation). Used only to keep generated
/// `block_number`s plausible for the chosen revision; not a source of truth
/// for consensus.
fn fork_block(revision: Revision) -> Option<u64> {
    match revision {
        Revision::Frontier => Some(0),
        Revision::Homestead => Some(1_150_000),
        Revision::Tangerine => Some(2_463_000),
        Revision::Spurious => Some(2_675_000),
        Revision::Byzantium => Some(4_370_000),
        Revision::Constantinople | Revision::Petersburg => Some(7_280_000),
        Revision::Istanbul => Some(9_069_000),
        Revision::Berlin => Some(12_244_000),
        Revision::London => Some(12_965_000),
        Revision::Paris | Revision::Shanghai | Revision::Cancun => None,
    }
}

fn random_u256(rng: &mut impl Rng) -> U256 {
    let mut limbs = [0u64; 4];
    for limb in limbs.iter_mut() {
        *limb = rng.gen();
    }
    U256::from_limbs(limbs)
}

fn random_address(rng: &mut impl Rng) -> Address {
    let mut bytes = [0u8; 20];
    rng.fill(&mut bytes);
    Address(bytes)
}

fn random_block_number(revision: Revision, rng: &mut impl Rng) -> u64 {
    match fork_block(revision) {
        Some(start) => start + rng.gen_range(0..1_000_000u64),
        None => rng.gen(),
    }
}

/// Generate a well-formed initial `State` for `revision` with `stack_depth`
/// uniformly-random stack entries and `code` as its program. Accounts and
/// storage start empty -- callers that want touched state use
/// [`with_random_accounts`] on top of this.
pub fn generate(revision: Revision, code: Code, stack_depth: usize, rng: &mut impl Rng) -> State {
    let own_address = random_address(rng);
    let caller = random_address(rng);
    let mut state = State::new(
        code,
        revision,
        rng.gen_range(21_000..30_000_000u64),
        CallContext {
            kind: CallKind::Call,
            depth: 0,
            address: own_address,
            caller,
            call_value: random_u256(rng),
            call_data: bytes::Bytes::new(),
        },
    );

    for _ in 0..stack_depth {
        state.stack.push(random_u256(rng)).expect("stack_depth within Stack::limit()");
    }

    state.block_context = BlockContext {
        coinbase: random_address(rng),
        block_number: random_block_number(revision, rng),
        timestamp: rng.gen_range(1_438_269_973..2_000_000_000u64),
        gas_limit: rng.gen_range(21_000..30_000_000u64),
        difficulty: random_u256(rng),
        base_fee: if revision >= Revision::London {
            random_u256(rng)
        } else {
            U256::ZERO
        },
        chain_id: U256::from(1u64),
        gas_price: random_u256(rng),
    };

    state
}

/// Seed `count` additional accounts (distinct from `state`'s own address and
/// caller) with random balance/nonce, and a handful of random storage slots
/// under each, for differential tests that exercise `BALANCE`/`EXTCODE*`/
/// `SLOAD` against state the step engine did not itself construct.
pub fn with_random_accounts(mut state: State, count: usize, rng: &mut impl Rng) -> State {
    for _ in 0..count {
        let address = random_address(rng);
        state.accounts.set(
            address,
            Account {
                balance: random_u256(rng),
                code: Code::new(Vec::new()),
                nonce: rng.gen_range(0..1000u64),
            },
        );
        let storage = state.storage_mut(address);
        for _ in 0..rng.gen_range(0..4usize) {
            let key = random_u256(rng);
            let value = random_u256(rng);
            storage.set_original(key, value);
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_state_is_running_with_requested_stack_depth() {
        let mut rng = rand::thread_rng();
        let state = generate(Revision::Cancun, Code::new(vec![0x00]), 5, &mut rng);
        assert_eq!(state.stack.size(), 5);
        assert_eq!(state.status, crate::state::Status::Running);
    }

    #[test]
    fn block_number_respects_forks_activation_floor() {
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let state = generate(Revision::Byzantium, Code::new(vec![]), 0, &mut rng);
            assert!(state.block_context.block_number >= 4_370_000);
        }
    }

    #[test]
    fn with_random_accounts_adds_distinct_entries() {
        let mut rng = rand::thread_rng();
        let state = generate(Revision::Cancun, Code::new(vec![]), 0, &mut rng);
        let state = with_random_accounts(state, 3, &mut rng);
        assert!(state.accounts.iter().count() <= 3);
    }
}

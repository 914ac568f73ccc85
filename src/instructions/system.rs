//! `ADDRESS`/`BALANCE`/`ORIGIN`/`CALLER`/`CALLVALUE`/`GASPRICE`/`EXTCODE*`/
//! `BLOCKHASH`/`COINBASE`/`TIMESTAMP`/`NUMBER`/`DIFFICULTY`/`GASLIMIT`/
//! `CHAINID`/`SELFBALANCE`/`BASEFEE`/`LOG0`..`LOG4`/`SELFDESTRUCT`.
//!
//! Grounded on the teacher's `instructions::external` (`balance!`/`extcodesize!`'s
//! Berlin cold-access surcharge, `push_txcontext!`'s per-field accessors,
//! `do_log!`, `selfdestruct!`), retargeted from host round-trips onto direct
//! reads of `State`'s own `accounts`/`block_context`/`transaction_context`
//! fields -- the fields `push_txcontext!` used to fetch via `Host::get_tx_context`
//! are simply present on `State` already, so most of these become one-line reads.

use crate::error::StatusCode;
use crate::gas::{ADDITIONAL_COLD_ACCOUNT_ACCESS_COST, COLD_ACCOUNT_ACCESS_COST, SELFDESTRUCT_REFUND};
use crate::revision::Revision;
use crate::state::{Log, State, Status};
use crate::u256::U256;
use sha3::{Digest, Keccak256};

use super::memory_ops::charge_memory_region;

pub(crate) fn address(state: &mut State) {
    state.stack.push(state.own_address().to_u256()).unwrap();
}

pub(crate) fn balance(state: &mut State) -> Result<(), StatusCode> {
    let address = crate::types::Address::from_u256(state.stack.pop().unwrap());
    charge_cold_access(state, address)?;
    state.stack.push(state.accounts.balance(address)).unwrap();
    Ok(())
}

pub(crate) fn origin(state: &mut State) {
    state.stack.push(state.transaction_context.origin.to_u256()).unwrap();
}

pub(crate) fn caller(state: &mut State) {
    state.stack.push(state.call_context.caller.to_u256()).unwrap();
}

pub(crate) fn callvalue(state: &mut State) {
    state.stack.push(state.call_context.call_value).unwrap();
}

pub(crate) fn gasprice(state: &mut State) {
    state.stack.push(state.transaction_context.gas_price).unwrap();
}

pub(crate) fn extcodesize(state: &mut State) -> Result<(), StatusCode> {
    let address = crate::types::Address::from_u256(state.stack.pop().unwrap());
    charge_cold_access(state, address)?;
    state.stack.push(U256::from(state.accounts.code(address).len())).unwrap();
    Ok(())
}

pub(crate) fn extcodecopy(state: &mut State) -> Result<(), StatusCode> {
    let address = crate::types::Address::from_u256(state.stack.pop().unwrap());
    let dest_offset = state.stack.pop().unwrap();
    let offset = state.stack.pop().unwrap();
    let size = state.stack.pop().unwrap();

    charge_cold_access(state, address)?;
    let (dest, len) = charge_memory_region(state, dest_offset, size)?;
    crate::gas::charge(state, crate::gas::dynamic::copy_words_cost(len))?;

    let code = state.accounts.code(address);
    let code_bytes = code.as_bytes();
    let src = offset.as_usize_saturating();
    let mut buf = vec![0u8; len];
    if src < code_bytes.len() {
        let end = (src + len).min(code_bytes.len());
        buf[..end - src].copy_from_slice(&code_bytes[src..end]);
    }
    state.memory.write(dest, &buf);
    Ok(())
}

pub(crate) fn extcodehash(state: &mut State) -> Result<(), StatusCode> {
    let address = crate::types::Address::from_u256(state.stack.pop().unwrap());
    charge_cold_access(state, address)?;
    let value = if !state.accounts.exists(address) {
        U256::ZERO
    } else {
        let code = state.accounts.code(address);
        if code.is_empty() {
            U256::ZERO
        } else {
            U256::from_be_bytes(&Keccak256::digest(code.as_bytes()))
        }
    };
    state.stack.push(value).unwrap();
    Ok(())
}

/// Berlin's per-access surcharge shared by `BALANCE`/`EXTCODESIZE`/
/// `EXTCODECOPY`/`EXTCODEHASH`: the opcode's static cost already covers the warm
/// case, so only the cold/warm *delta* is charged here, same as the teacher's
/// `balance!`/`extcodesize!` macros.
fn charge_cold_access(state: &mut State, address: crate::types::Address) -> Result<(), StatusCode> {
    if state.revision >= Revision::Berlin {
        let was_warm = state.accounts.access(address);
        if !was_warm {
            crate::gas::charge(state, ADDITIONAL_COLD_ACCOUNT_ACCESS_COST)?;
        }
    }
    Ok(())
}

pub(crate) fn blockhash(state: &mut State) {
    let number = state.stack.pop().unwrap();
    let value = number
        .fits_u64()
        .then(|| number.low_u64())
        .filter(|&n| {
            let current = state.block_context.block_number;
            n < current && current.saturating_sub(n) <= 256
        })
        .and_then(|n| state.block_hashes.get(&n).copied())
        .map(|h| h.to_u256())
        .unwrap_or(U256::ZERO);
    state.stack.push(value).unwrap();
}

pub(crate) fn coinbase(state: &mut State) {
    state.stack.push(state.block_context.coinbase.to_u256()).unwrap();
}

pub(crate) fn timestamp(state: &mut State) {
    state.stack.push(U256::from(state.block_context.timestamp)).unwrap();
}

pub(crate) fn number(state: &mut State) {
    state.stack.push(U256::from(state.block_context.block_number)).unwrap();
}

pub(crate) fn difficulty(state: &mut State) {
    state.stack.push(state.block_context.difficulty).unwrap();
}

pub(crate) fn gaslimit(state: &mut State) {
    state.stack.push(U256::from(state.block_context.gas_limit)).unwrap();
}

pub(crate) fn chainid(state: &mut State) {
    state.stack.push(state.block_context.chain_id).unwrap();
}

pub(crate) fn selfbalance(state: &mut State) {
    let address = state.own_address();
    state.stack.push(state.accounts.balance(address)).unwrap();
}

pub(crate) fn basefee(state: &mut State) {
    state.stack.push(state.block_context.base_fee).unwrap();
}

/// `LOG0`..`LOG4`'s shared body. `n` is the topic count (`0..=4`).
pub(crate) fn log(state: &mut State, n: usize) -> Result<(), StatusCode> {
    if state.read_only {
        return Err(StatusCode::StaticModeViolation);
    }
    let offset = state.stack.pop().unwrap();
    let size = state.stack.pop().unwrap();
    let (off, len) = charge_memory_region(state, offset, size)?;
    crate::gas::charge(state, crate::gas::dynamic::log_data_cost(len))?;

    let mut topics = arrayvec::ArrayVec::new();
    for _ in 0..n {
        let topic = state.stack.pop().unwrap();
        topics.push(crate::types::Hash256::from_u256(topic));
    }

    let data = bytes::Bytes::from(state.memory.read(off, len));
    state.logs.push(Log {
        address: state.own_address(),
        topics,
        data,
    });
    Ok(())
}

/// Transfers the executing account's whole balance to `beneficiary` and halts
/// the current call frame. The pre-London one-time refund and Berlin/Tangerine
/// surcharges are kept from the teacher's `selfdestruct!` macro; EIP-6780's
/// same-transaction-creation carve-out is out of scope here (every
/// `SELFDESTRUCT` empties the account, matching every revision through London).
pub(crate) fn selfdestruct(state: &mut State) -> Result<(), StatusCode> {
    if state.read_only {
        return Err(StatusCode::StaticModeViolation);
    }
    let beneficiary = crate::types::Address::from_u256(state.stack.pop().unwrap());

    if state.revision >= Revision::Berlin {
        let was_warm = state.accounts.access(beneficiary);
        if !was_warm {
            crate::gas::charge(state, COLD_ACCOUNT_ACCESS_COST)?;
        }
    }

    let own = state.own_address();
    let balance = state.accounts.balance(own);

    if state.revision >= Revision::Tangerine && !balance.is_zero() && !state.accounts.exists(beneficiary) {
        crate::gas::charge(state, crate::gas::NEW_ACCOUNT_COST)?;
    }

    if own != beneficiary {
        state.accounts.set_balance(beneficiary, state.accounts.balance(beneficiary).wrapping_add(balance));
    }
    state.accounts.set_balance(own, U256::ZERO);
    state.accounts.set_nonce(own, 0);
    state.accounts.set_code(own, crate::code::Code::new(Vec::new()));

    if state.revision < Revision::London && state.destructed.insert(own) {
        state.gas_refund = (state.gas_refund as i64 + SELFDESTRUCT_REFUND) as u64;
    } else {
        state.destructed.insert(own);
    }

    state.status = Status::Stopped;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Code;
    use crate::state::CallContext;
    use crate::types::Address;

    fn state(revision: Revision) -> State {
        State::new(Code::new(vec![]), revision, 1_000_000, CallContext::default())
    }

    #[test]
    fn balance_of_untouched_address_is_zero() {
        let mut s = state(Revision::Cancun);
        s.stack.push(Address::from([9u8; 20]).to_u256()).unwrap();
        balance(&mut s).unwrap();
        assert_eq!(s.stack.get(0), U256::ZERO);
    }

    #[test]
    fn cold_access_charged_once() {
        let mut s = state(Revision::Berlin);
        let addr = Address::from([1u8; 20]);
        s.stack.push(addr.to_u256()).unwrap();
        let before = s.gas;
        balance(&mut s).unwrap();
        assert_eq!(before - s.gas, ADDITIONAL_COLD_ACCOUNT_ACCESS_COST);

        s.stack.push(addr.to_u256()).unwrap();
        let before = s.gas;
        balance(&mut s).unwrap();
        assert_eq!(before - s.gas, 0);
    }

    #[test]
    fn blockhash_out_of_range_is_zero() {
        let mut s = state(Revision::Cancun);
        s.block_context.block_number = 500;
        s.block_hashes.insert(10, crate::types::Hash256::from([7u8; 32]));
        s.stack.push(U256::from(10u64)).unwrap();
        blockhash(&mut s);
        assert_eq!(s.stack.get(0), U256::ZERO);

        s.block_context.block_number = 20;
        s.stack.push(U256::from(10u64)).unwrap();
        blockhash(&mut s);
        assert_eq!(s.stack.get(0), crate::types::Hash256::from([7u8; 32]).to_u256());
    }

    #[test]
    fn selfdestruct_moves_balance_and_refunds_pre_london() {
        let mut s = state(Revision::Istanbul);
        let beneficiary = Address::from([2u8; 20]);
        s.accounts.set_balance(s.own_address(), 100u64.into());
        s.stack.push(beneficiary.to_u256()).unwrap();
        selfdestruct(&mut s).unwrap();
        assert_eq!(s.accounts.balance(beneficiary), 100u64.into());
        assert_eq!(s.accounts.balance(s.own_address()), U256::ZERO);
        assert_eq!(s.gas_refund, SELFDESTRUCT_REFUND as u64);
        assert_eq!(s.status, Status::Stopped);
    }
}

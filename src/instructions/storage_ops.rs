//! `SLOAD`/`SSTORE`/`TLOAD`/`TSTORE`. Grounded on the teacher's `sload!`/
//! `sstore!` macros -- the canonical EIP-2200/EIP-1283/EIP-2929 cost table is
//! kept verbatim, retargeted onto `State::storage_mut` (a direct field, not a
//! yielded host interrupt) and the crate-local `StorageStatus`.

use crate::error::StatusCode;
use crate::gas::{COLD_SLOAD_COST, WARM_STORAGE_READ_COST};
use crate::revision::Revision;
use crate::state::{State, StorageStatus};

pub(crate) fn sload(state: &mut State) -> Result<(), StatusCode> {
    let key = state.stack.pop().unwrap();
    let address = state.own_address();

    if state.revision >= Revision::Berlin {
        let was_warm = state.storage_mut(address).access(key);
        if !was_warm {
            crate::gas::charge(state, COLD_SLOAD_COST - WARM_STORAGE_READ_COST)?;
        }
    }

    let value = state.sload(address, key);
    state.stack.push(value).unwrap();
    Ok(())
}

pub(crate) fn sstore(state: &mut State) -> Result<(), StatusCode> {
    if state.read_only {
        return Err(StatusCode::StaticModeViolation);
    }
    if state.revision >= Revision::Istanbul && state.gas <= 2300 {
        return Err(StatusCode::OutOfGas);
    }

    let key = state.stack.pop().unwrap();
    let value = state.stack.pop().unwrap();
    let address = state.own_address();

    let mut cost = 0u64;
    if state.revision >= Revision::Berlin {
        let was_warm = state.storage_mut(address).access(key);
        if !was_warm {
            cost = COLD_SLOAD_COST;
        }
    }

    let storage = state.storage_mut(address);
    let original = storage.original(key);
    let current = storage.get(key);

    let status = state.sstore(address, key, value);

    cost += match status {
        StorageStatus::Unchanged | StorageStatus::ModifiedAgain => {
            if state.revision >= Revision::Berlin {
                WARM_STORAGE_READ_COST
            } else if state.revision == Revision::Istanbul {
                800
            } else if state.revision == Revision::Constantinople {
                200
            } else {
                5000
            }
        }
        StorageStatus::Modified | StorageStatus::Deleted => {
            if state.revision >= Revision::Berlin {
                5000 - COLD_SLOAD_COST
            } else {
                5000
            }
        }
        StorageStatus::Added => 20000,
    };

    crate::gas::charge(state, cost)?;

    if crate::gas::net_gas_metering(state.revision) {
        let delta = crate::gas::sstore_refund_delta(original, current, value, state.revision);
        state.gas_refund = (state.gas_refund as i64 + delta) as u64;
    } else if matches!(status, StorageStatus::Deleted) {
        state.gas_refund += crate::gas::sstore_clears_refund(state.revision).max(0) as u64;
    }

    Ok(())
}

pub(crate) fn tload(state: &mut State) {
    let key = state.stack.pop().unwrap();
    let value = state.transient_storage.get(key);
    state.stack.push(value).unwrap();
}

pub(crate) fn tstore(state: &mut State) -> Result<(), StatusCode> {
    if state.read_only {
        return Err(StatusCode::StaticModeViolation);
    }
    let key = state.stack.pop().unwrap();
    let value = state.stack.pop().unwrap();
    state.transient_storage.set(key, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Code;
    use crate::state::CallContext;
    use crate::u256::U256;

    fn state(revision: Revision) -> State {
        State::new(Code::new(vec![]), revision, 1_000_000, CallContext::default())
    }

    #[test]
    fn sstore_added_costs_20000_pre_berlin() {
        let mut st = state(Revision::Frontier);
        st.stack.push(U256::ONE).unwrap();
        st.stack.push(U256::ZERO).unwrap();
        let before = st.gas;
        sstore(&mut st).unwrap();
        assert_eq!(before - st.gas, 20000);
    }

    #[test]
    fn sstore_cold_berlin_adds_cold_sload_cost() {
        let mut st = state(Revision::Berlin);
        st.stack.push(U256::ONE).unwrap();
        st.stack.push(U256::ZERO).unwrap();
        let before = st.gas;
        sstore(&mut st).unwrap();
        assert_eq!(before - st.gas, 20000 + COLD_SLOAD_COST);
    }

    #[test]
    fn sload_marks_warm() {
        let mut st = state(Revision::Berlin);
        st.stack.push(U256::ZERO).unwrap();
        sload(&mut st).unwrap();
        assert!(st.storage(st.own_address()).is_warm(U256::ZERO));
    }

    #[test]
    fn sstore_clear_then_restore_original_nonzero_unwinds_refund() {
        let mut st = state(Revision::Istanbul);
        let address = st.own_address();
        st.storage_mut(address).set_original(U256::ZERO, U256::from(5u64));

        // original=5 -> 0: grants the clear refund.
        st.stack.push(U256::ZERO).unwrap();
        st.stack.push(U256::ZERO).unwrap();
        sstore(&mut st).unwrap();
        assert_eq!(st.gas_refund, crate::gas::sstore_clears_refund(Revision::Istanbul) as u64);

        // 0 -> 5 (back to original): unwinds the clear refund and grants the
        // reset-to-nonzero-original refund instead.
        st.stack.push(U256::from(5u64)).unwrap();
        st.stack.push(U256::ZERO).unwrap();
        sstore(&mut st).unwrap();
        assert_eq!(st.gas_refund, 5000 - 800);
    }

    #[test]
    fn sstore_re_dirtying_a_cleared_slot_subtracts_the_clear_refund() {
        let mut st = state(Revision::Istanbul);
        let address = st.own_address();
        st.storage_mut(address).set_original(U256::ZERO, U256::from(5u64));

        st.stack.push(U256::ZERO).unwrap();
        st.stack.push(U256::ZERO).unwrap();
        sstore(&mut st).unwrap();
        assert_eq!(st.gas_refund, crate::gas::sstore_clears_refund(Revision::Istanbul) as u64);

        // 0 -> 7 (not the original value): just unwinds the clear refund.
        st.stack.push(U256::from(7u64)).unwrap();
        st.stack.push(U256::ZERO).unwrap();
        sstore(&mut st).unwrap();
        assert_eq!(st.gas_refund, 0);
    }

    #[test]
    fn sstore_reset_to_zero_original_refunds_the_added_cost() {
        let mut st = state(Revision::Istanbul);
        let address = st.own_address();

        st.stack.push(U256::from(5u64)).unwrap();
        st.stack.push(U256::ZERO).unwrap();
        sstore(&mut st).unwrap();
        assert_eq!(st.gas_refund, 0);

        st.stack.push(U256::ZERO).unwrap();
        st.stack.push(U256::ZERO).unwrap();
        sstore(&mut st).unwrap();
        assert_eq!(st.gas_refund, 20000 - 800);
    }

    #[test]
    fn tstore_then_tload_roundtrips() {
        let mut st = state(Revision::Cancun);
        st.stack.push(U256::from(7u64)).unwrap();
        st.stack.push(U256::ZERO).unwrap();
        tstore(&mut st).unwrap();
        st.stack.push(U256::ZERO).unwrap();
        tload(&mut st);
        assert_eq!(st.stack.get(0), U256::from(7u64));
    }
}

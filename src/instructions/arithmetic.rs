//! Component A's callers: `ADD`..`SIGNEXTEND`. Grounded on the teacher's
//! `instructions::arithmetic`, retargeted from `ethereum_types::U256`/`i256::I256`
//! onto the crate-local `U256`, whose `div_rem`/`sar`/`sign_extend`/`pow` already
//! implement the heavy lifting these wrappers used to hand-roll.

use crate::error::StatusCode;
use crate::revision::Revision;
use crate::state::{Stack, State};
use crate::u256::U256;

pub(crate) fn add(stack: &mut Stack) {
    let a = stack.pop().unwrap();
    let b = stack.pop().unwrap();
    stack.push(a.wrapping_add(b)).unwrap();
}

pub(crate) fn mul(stack: &mut Stack) {
    let a = stack.pop().unwrap();
    let b = stack.pop().unwrap();
    stack.push(a.wrapping_mul(b)).unwrap();
}

pub(crate) fn sub(stack: &mut Stack) {
    let a = stack.pop().unwrap();
    let b = stack.pop().unwrap();
    stack.push(a.wrapping_sub(b)).unwrap();
}

pub(crate) fn div(stack: &mut Stack) {
    let a = stack.pop().unwrap();
    let b = stack.pop().unwrap();
    let v = a.div_rem(&b).map(|(q, _)| q).unwrap_or(U256::ZERO);
    stack.push(v).unwrap();
}

pub(crate) fn sdiv(stack: &mut Stack) {
    let a = stack.pop().unwrap();
    let b = stack.pop().unwrap();
    if b.is_zero() {
        stack.push(U256::ZERO).unwrap();
        return;
    }
    let (a_abs, a_neg) = a.abs_signed();
    let (b_abs, b_neg) = b.abs_signed();
    let (q, _) = a_abs.div_rem(&b_abs).unwrap();
    let v = if a_neg != b_neg { q.twos_complement_neg() } else { q };
    stack.push(v).unwrap();
}

pub(crate) fn modulo(stack: &mut Stack) {
    let a = stack.pop().unwrap();
    let b = stack.pop().unwrap();
    let v = a.div_rem(&b).map(|(_, r)| r).unwrap_or(U256::ZERO);
    stack.push(v).unwrap();
}

pub(crate) fn smod(stack: &mut Stack) {
    let a = stack.pop().unwrap();
    let b = stack.pop().unwrap();
    if b.is_zero() {
        stack.push(U256::ZERO).unwrap();
        return;
    }
    let (a_abs, a_neg) = a.abs_signed();
    let (b_abs, _) = b.abs_signed();
    let (_, r) = a_abs.div_rem(&b_abs).unwrap();
    let v = if a_neg { r.twos_complement_neg() } else { r };
    stack.push(v).unwrap();
}

pub(crate) fn addmod(stack: &mut Stack) {
    let a = stack.pop().unwrap();
    let b = stack.pop().unwrap();
    let c = stack.pop().unwrap();
    stack.push(a.add_mod(b, c)).unwrap();
}

pub(crate) fn mulmod(stack: &mut Stack) {
    let a = stack.pop().unwrap();
    let b = stack.pop().unwrap();
    let c = stack.pop().unwrap();
    stack.push(a.mul_mod(b, c)).unwrap();
}

/// `EXP`'s per-byte-of-exponent dynamic surcharge (spec.md §4.2), charged before
/// the result is computed so an unaffordable exponent fails as `OutOfGas`
/// without ever pushing a result.
pub(crate) fn exp(state: &mut State) -> Result<(), StatusCode> {
    let base = state.stack.pop().unwrap();
    let power = state.stack.pop().unwrap();

    if !power.is_zero() {
        let byte_cost = crate::gas::exp_byte_cost(state.revision);
        let bytes_in_exponent = (power.bit_len() as u64 + 7) / 8;
        let additional_gas = byte_cost * bytes_in_exponent;
        state.gas = state
            .gas
            .checked_sub(additional_gas)
            .ok_or(StatusCode::OutOfGas)?;
    }

    state.stack.push(power_of(base, power)).unwrap();
    Ok(())
}

fn power_of(base: U256, exponent: U256) -> U256 {
    base.pow(exponent)
}

pub(crate) fn signextend(stack: &mut Stack) {
    let a = stack.pop().unwrap();
    let b = stack.pop().unwrap();
    stack.push(b.sign_extend(a)).unwrap();
}

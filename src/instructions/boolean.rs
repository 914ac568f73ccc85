//! Comparison and bitwise-boolean opcodes. Grounded on the teacher's
//! `instructions::boolean`, retargeted onto the crate-local `U256`; `SLT`/`SGT`
//! replace the teacher's `i256::I256` wrapper with a direct two's-complement
//! sign comparison (same-sign values compare as unsigned, opposite-sign values
//! are ordered by sign alone).

use crate::state::Stack;
use crate::u256::U256;

pub(crate) fn lt(stack: &mut Stack) {
    let a = stack.pop().unwrap();
    let b = stack.pop().unwrap();
    stack.push(bool_to_u256(a < b)).unwrap();
}

pub(crate) fn gt(stack: &mut Stack) {
    let a = stack.pop().unwrap();
    let b = stack.pop().unwrap();
    stack.push(bool_to_u256(a > b)).unwrap();
}

fn signed_lt(a: U256, b: U256) -> bool {
    match (a.is_negative(), b.is_negative()) {
        (true, false) => true,
        (false, true) => false,
        _ => a < b,
    }
}

pub(crate) fn slt(stack: &mut Stack) {
    let a = stack.pop().unwrap();
    let b = stack.pop().unwrap();
    stack.push(bool_to_u256(signed_lt(a, b))).unwrap();
}

pub(crate) fn sgt(stack: &mut Stack) {
    let a = stack.pop().unwrap();
    let b = stack.pop().unwrap();
    stack.push(bool_to_u256(signed_lt(b, a))).unwrap();
}

pub(crate) fn eq(stack: &mut Stack) {
    let a = stack.pop().unwrap();
    let b = stack.pop().unwrap();
    stack.push(bool_to_u256(a == b)).unwrap();
}

pub(crate) fn iszero(stack: &mut Stack) {
    let a = stack.pop().unwrap();
    stack.push(bool_to_u256(a.is_zero())).unwrap();
}

pub(crate) fn and(stack: &mut Stack) {
    let a = stack.pop().unwrap();
    let b = stack.pop().unwrap();
    stack.push(a & b).unwrap();
}

pub(crate) fn or(stack: &mut Stack) {
    let a = stack.pop().unwrap();
    let b = stack.pop().unwrap();
    stack.push(a | b).unwrap();
}

pub(crate) fn xor(stack: &mut Stack) {
    let a = stack.pop().unwrap();
    let b = stack.pop().unwrap();
    stack.push(a ^ b).unwrap();
}

pub(crate) fn not(stack: &mut Stack) {
    let a = stack.pop().unwrap();
    stack.push(!a).unwrap();
}

fn bool_to_u256(b: bool) -> U256 {
    if b {
        U256::ONE
    } else {
        U256::ZERO
    }
}

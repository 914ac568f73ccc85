//! `BYTE`/`SHL`/`SHR`/`SAR`. Grounded on the teacher's `instructions::bitwise`,
//! retargeted to wrap the crate-local `U256`'s own `byte`/`shl`/`shr`/`sar`
//! (which already encode the ">=256 shifts to zero/sign" rule) instead of
//! re-deriving them bit by bit.

use crate::state::Stack;

pub(crate) fn byte(stack: &mut Stack) {
    let index = stack.pop().unwrap();
    let value = stack.pop().unwrap();
    stack.push(value.byte(index)).unwrap();
}

pub(crate) fn shl(stack: &mut Stack) {
    let shift = stack.pop().unwrap();
    let value = stack.pop().unwrap();
    stack.push(value.shl(shift)).unwrap();
}

pub(crate) fn shr(stack: &mut Stack) {
    let shift = stack.pop().unwrap();
    let value = stack.pop().unwrap();
    stack.push(value.shr(shift)).unwrap();
}

pub(crate) fn sar(stack: &mut Stack) {
    let shift = stack.pop().unwrap();
    let value = stack.pop().unwrap();
    stack.push(value.sar(shift)).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::u256::U256;

    #[test]
    fn shl_overshift_is_zero() {
        let mut s = Stack::new();
        s.push(U256::ONE).unwrap();
        s.push(U256::from(256u64)).unwrap();
        shl(&mut s);
        assert_eq!(s.get(0), U256::ZERO);
    }

    #[test]
    fn sar_of_negative_overshift_is_minus_one() {
        let mut s = Stack::new();
        s.push(U256::ONE.twos_complement_neg()).unwrap();
        s.push(U256::from(256u64)).unwrap();
        sar(&mut s);
        assert_eq!(s.get(0), U256::MAX);
    }
}

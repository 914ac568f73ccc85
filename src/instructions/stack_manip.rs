//! `PUSHn`/`DUPn`/`SWAPn`/`POP`. Grounded on the teacher's
//! `instructions::stack_manip`; `DUP`/`SWAP` delegate straight to `Stack`'s own
//! `dup`/`swap_top` (component C already implements the top-relative indexing),
//! leaving only `PUSH`'s code-read here.

use crate::code::Code;
use crate::state::Stack;
use crate::u256::U256;

/// Read `n` code bytes starting at `pos`, zero-padded past the end of the
/// program, and push them as a single word.
pub(crate) fn push(stack: &mut Stack, code: &Code, pos: usize, n: usize) {
    let bytes = code.slice_padded(pos, n);
    stack.push(U256::from_be_bytes(&bytes[..n])).unwrap();
}

pub(crate) fn push0(stack: &mut Stack) {
    stack.push(U256::ZERO).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_reads_immediate_operand() {
        let code = Code::new(vec![0x61, 0x01, 0x02, 0x00]);
        let mut stack = Stack::new();
        push(&mut stack, &code, 1, 2);
        assert_eq!(stack.get(0), U256::from(0x0102u64));
    }

    #[test]
    fn push_pads_past_end_of_code() {
        let code = Code::new(vec![0x60]);
        let mut stack = Stack::new();
        push(&mut stack, &code, 1, 1);
        assert_eq!(stack.get(0), U256::ZERO);
    }
}

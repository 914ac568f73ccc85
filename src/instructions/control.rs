//! `JUMP`/`JUMPI`/`RETURN`/`REVERT`/`CALLDATALOAD`/`CALLDATASIZE`/`PC`. Grounded
//! on the teacher's `instructions::control`, retargeted onto `Code::is_jumpdest`
//! (which already folds in the is-code-position check `JumpdestMap` used to
//! need a separate bitmap for) and the owned `call_context.call_data`.

use crate::error::StatusCode;
use crate::state::State;
use crate::u256::U256;

use super::memory_ops::charge_memory_region;

/// `JUMP`'s destination check; `JUMPI`'s caller pops the condition separately.
pub(crate) fn op_jump(state: &mut State) -> Result<usize, StatusCode> {
    let dst = state.stack.pop().unwrap();
    if !dst.fits_u64() || !state.code.is_jumpdest(dst.as_usize_saturating()) {
        return Err(StatusCode::BadJumpDestination);
    }
    Ok(dst.as_usize_saturating())
}

pub(crate) fn calldataload(state: &mut State) {
    let index = state.stack.pop().unwrap();
    let input = &state.call_context.call_data;
    let value = if !index.fits_u64() || index.low_u64() as usize >= input.len() {
        U256::ZERO
    } else {
        let start = index.low_u64() as usize;
        let end = (start + 32).min(input.len());
        let mut buf = [0u8; 32];
        buf[..end - start].copy_from_slice(&input[start..end]);
        U256::from_be_bytes(&buf)
    };
    state.stack.push(value).unwrap();
}

pub(crate) fn calldatasize(state: &mut State) {
    state.stack.push(U256::from(state.call_context.call_data.len())).unwrap();
}

pub(crate) fn calldatacopy(state: &mut State) -> Result<(), StatusCode> {
    let dest_offset = state.stack.pop().unwrap();
    let offset = state.stack.pop().unwrap();
    let size = state.stack.pop().unwrap();

    let (dest, len) = charge_memory_region(state, dest_offset, size)?;
    crate::gas::charge(state, crate::gas::dynamic::copy_words_cost(len))?;

    let input = state.call_context.call_data.clone();
    let src = offset.as_usize_saturating();
    let mut buf = vec![0u8; len];
    if src < input.len() {
        let end = (src + len).min(input.len());
        buf[..end - src].copy_from_slice(&input[src..end]);
    }
    state.memory.write(dest, &buf);
    Ok(())
}

/// `RETURN`/`REVERT`'s shared memory-slice extraction.
pub(crate) fn output_data(state: &mut State) -> Result<bytes::Bytes, StatusCode> {
    let offset = state.stack.pop().unwrap();
    let size = state.stack.pop().unwrap();
    if size.is_zero() {
        return Ok(bytes::Bytes::new());
    }
    let (off, len) = charge_memory_region(state, offset, size)?;
    Ok(bytes::Bytes::from(state.memory.read(off, len)))
}

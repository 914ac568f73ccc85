//! `MLOAD`/`MSTORE`/`MSTORE8`/`MSIZE`/`CODESIZE`/`CODECOPY`/`KECCAK256`/
//! `RETURNDATASIZE`/`RETURNDATACOPY`. Grounded on the teacher's
//! `instructions::memory` (`verify_memory_region`'s cost formula, kept
//! verbatim as `state::memory::growth_cost`) and `MAX_BUFFER_SIZE` guard
//! against offsets too large to ever be affordable.

use crate::error::StatusCode;
use crate::state::State;
use crate::u256::U256;
use sha3::{Digest, Keccak256};

/// Any offset/size that doesn't fit in a `u32` could never be paid for by any
/// gas limit this engine will see; reject it immediately instead of growing
/// memory towards a 4-billion-byte buffer. Mirrors the teacher's
/// `MAX_BUFFER_SIZE = u32::MAX`.
const MAX_BUFFER_SIZE: u64 = u32::MAX as u64;

/// Resolve `(offset, size)` to plain `usize`s, charging the memory-expansion
/// gas for `[offset, offset+size)`. `size == 0` never grows memory or charges
/// gas, matching spec.md §4.4's "zero-size access never touches memory" rule.
pub(crate) fn charge_memory_region(
    state: &mut State,
    offset: U256,
    size: U256,
) -> Result<(usize, usize), StatusCode> {
    if size.is_zero() {
        return Ok((0, 0));
    }
    if !offset.fits_u64() || !size.fits_u64() || offset.low_u64() > MAX_BUFFER_SIZE || size.low_u64() > MAX_BUFFER_SIZE {
        return Err(StatusCode::OutOfGas);
    }
    let offset = offset.low_u64() as usize;
    let size = size.low_u64() as usize;
    let end = offset.checked_add(size).ok_or(StatusCode::OutOfGas)?;
    if end as u64 > MAX_BUFFER_SIZE {
        return Err(StatusCode::OutOfGas);
    }
    let cost = state.memory.ensure(offset, size);
    crate::gas::charge(state, cost)?;
    Ok((offset, size))
}

pub(crate) fn mload(state: &mut State) -> Result<(), StatusCode> {
    let offset = state.stack.pop().unwrap();
    let (off, _) = charge_memory_region(state, offset, U256::from(32u64))?;
    let bytes = state.memory.read(off, 32);
    state.stack.push(U256::from_be_bytes(&bytes)).unwrap();
    Ok(())
}

pub(crate) fn mstore(state: &mut State) -> Result<(), StatusCode> {
    let offset = state.stack.pop().unwrap();
    let value = state.stack.pop().unwrap();
    let (off, _) = charge_memory_region(state, offset, U256::from(32u64))?;
    state.memory.write(off, &value.to_be_bytes());
    Ok(())
}

pub(crate) fn mstore8(state: &mut State) -> Result<(), StatusCode> {
    let offset = state.stack.pop().unwrap();
    let value = state.stack.pop().unwrap();
    let (off, _) = charge_memory_region(state, offset, U256::ONE)?;
    state.memory.write_byte(off, value.to_be_bytes()[31]);
    Ok(())
}

pub(crate) fn msize(state: &mut State) {
    state.stack.push(U256::from(state.memory.len() as u64)).unwrap();
}

pub(crate) fn codesize(state: &mut State) {
    state.stack.push(U256::from(state.code.len() as u64)).unwrap();
}

pub(crate) fn codecopy(state: &mut State) -> Result<(), StatusCode> {
    let dest_offset = state.stack.pop().unwrap();
    let offset = state.stack.pop().unwrap();
    let size = state.stack.pop().unwrap();

    let (dest, len) = charge_memory_region(state, dest_offset, size)?;
    crate::gas::charge(state, crate::gas::dynamic::copy_words_cost(len))?;

    let src = offset.as_usize_saturating();
    let code_bytes = state.code.as_bytes();
    let mut buf = vec![0u8; len];
    if src < code_bytes.len() {
        let end = (src + len).min(code_bytes.len());
        buf[..end - src].copy_from_slice(&code_bytes[src..end]);
    }
    state.memory.write(dest, &buf);
    Ok(())
}

pub(crate) fn keccak256(state: &mut State) -> Result<(), StatusCode> {
    let offset = state.stack.pop().unwrap();
    let size = state.stack.pop().unwrap();
    let (off, len) = charge_memory_region(state, offset, size)?;
    crate::gas::charge(state, crate::gas::dynamic::keccak_words_cost(len))?;
    let data = state.memory.read(off, len);
    let hash = Keccak256::digest(&data);
    state.stack.push(U256::from_be_bytes(&hash)).unwrap();
    Ok(())
}

pub(crate) fn returndatasize(state: &mut State) {
    state.stack.push(U256::from(state.last_call_return_data.len())).unwrap();
}

pub(crate) fn returndatacopy(state: &mut State) -> Result<(), StatusCode> {
    let dest_offset = state.stack.pop().unwrap();
    let offset = state.stack.pop().unwrap();
    let size = state.stack.pop().unwrap();

    if !offset.fits_u64() || !size.fits_u64() {
        return Err(StatusCode::InvalidMemoryAccess);
    }
    let src = offset.low_u64() as usize;
    let len = size.low_u64() as usize;
    if src.checked_add(len).map_or(true, |end| end > state.last_call_return_data.len()) {
        return Err(StatusCode::InvalidMemoryAccess);
    }

    let (dest, _) = charge_memory_region(state, dest_offset, size)?;
    crate::gas::charge(state, crate::gas::dynamic::copy_words_cost(len))?;
    let data = state.last_call_return_data[src..src + len].to_vec();
    state.memory.write(dest, &data);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Code;
    use crate::revision::Revision;
    use crate::state::CallContext;

    fn state() -> State {
        State::new(Code::new(vec![]), Revision::Cancun, 1_000_000, CallContext::default())
    }

    #[test]
    fn mstore_then_mload_roundtrips() {
        let mut s = state();
        s.stack.push(U256::from(42u64)).unwrap();
        s.stack.push(U256::ZERO).unwrap();
        mstore(&mut s).unwrap();
        s.stack.push(U256::ZERO).unwrap();
        mload(&mut s).unwrap();
        assert_eq!(s.stack.get(0), U256::from(42u64));
    }

    #[test]
    fn returndatacopy_out_of_range_fails() {
        let mut s = state();
        s.last_call_return_data = bytes::Bytes::from_static(&[1, 2, 3]);
        s.stack.push(U256::from(10u64)).unwrap();
        s.stack.push(U256::ZERO).unwrap();
        s.stack.push(U256::ZERO).unwrap();
        assert_eq!(returndatacopy(&mut s), Err(StatusCode::InvalidMemoryAccess));
    }

    #[test]
    fn keccak256_of_empty_matches_known_hash() {
        let mut s = state();
        s.stack.push(U256::ZERO).unwrap();
        s.stack.push(U256::ZERO).unwrap();
        keccak256(&mut s).unwrap();
        let expected = hex::decode("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470").unwrap();
        assert_eq!(s.stack.get(0), U256::from_be_bytes(&expected));
    }
}

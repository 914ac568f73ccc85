//! Component F: the step engine. Grounded on the teacher's `interpreter`
//! module -- same per-instruction contract (`check_requirements`'s gas/stack
//! preflight, the opcode `match`, the `PUSHn`/`JUMP`/`JUMPI` program-counter
//! rules) -- rebuilt as a plain synchronous function instead of a
//! `genawaiter` coroutine, since nothing in this crate's execution model ever
//! needs to suspend mid-instruction: a nested `CALL`/`CREATE` runs its child
//! frame to completion inline (see `instructions::call`) rather than yielding
//! an interrupt for a caller to resume.

use crate::error::StatusCode;
use crate::gas;
use crate::instructions::*;
use crate::opcode::OpCode;
use crate::state::{Stack, State, Status};
use crate::u256::U256;

/// Run one instruction. No-op once `state.status` has left `Running`.
pub fn step(state: &mut State) {
    if state.status != Status::Running {
        return;
    }
    if let Err(_cause) = step_inner(state) {
        state.status = Status::Failed;
    }
}

/// Run up to `n` instructions, stopping early once `state` reaches a terminal
/// status.
pub fn step_n(state: &mut State, n: usize) {
    for _ in 0..n {
        if state.status != Status::Running {
            break;
        }
        step(state);
    }
}

/// Run until `state` reaches a terminal status. Every call/create dispatch in
/// `instructions::call` drives its child frame with this.
pub fn run_to_completion(state: &mut State) {
    while state.status == Status::Running {
        step(state);
    }
}

fn step_inner(state: &mut State) -> Result<(), StatusCode> {
    let op = state.code.get_op(state.pc as usize);
    let schedule = gas::lookup(state.revision, op).ok_or(StatusCode::UndefinedInstruction)?;

    let stack_in = schedule.stack_in as usize;
    let stack_out = schedule.stack_out as usize;
    if state.stack.size() < stack_in {
        return Err(StatusCode::StackUnderflow);
    }
    if state.stack.size() - stack_in + stack_out > Stack::limit() {
        return Err(StatusCode::StackOverflow);
    }

    gas::charge(state, schedule.static_gas)?;

    dispatch(state, op)
}

fn advance(state: &mut State) -> Result<(), StatusCode> {
    state.pc = state.pc.wrapping_add(1);
    Ok(())
}

fn dispatch(state: &mut State, op: OpCode) -> Result<(), StatusCode> {
    if op.is_push() {
        let n = op.push_size();
        stack_manip::push(&mut state.stack, &state.code, state.pc as usize + 1, n);
        state.pc = state.pc.wrapping_add(1 + n as u16);
        return Ok(());
    }
    let byte = op.to_u8();
    if (OpCode::DUP1.to_u8()..=OpCode::DUP16.to_u8()).contains(&byte) {
        let pos = (byte - OpCode::DUP1.to_u8()) as usize;
        state.stack.dup(pos).map_err(|_| StatusCode::StackOverflow)?;
        return advance(state);
    }
    if (OpCode::SWAP1.to_u8()..=OpCode::SWAP16.to_u8()).contains(&byte) {
        let pos = (byte - OpCode::SWAP1.to_u8()) as usize + 1;
        state.stack.swap_top(pos);
        return advance(state);
    }
    if (OpCode::LOG0.to_u8()..=OpCode::LOG4.to_u8()).contains(&byte) {
        let n = (byte - OpCode::LOG0.to_u8()) as usize;
        system::log(state, n)?;
        return advance(state);
    }

    match op {
        OpCode::STOP => {
            state.status = Status::Stopped;
            Ok(())
        }
        OpCode::ADD => {
            arithmetic::add(&mut state.stack);
            advance(state)
        }
        OpCode::MUL => {
            arithmetic::mul(&mut state.stack);
            advance(state)
        }
        OpCode::SUB => {
            arithmetic::sub(&mut state.stack);
            advance(state)
        }
        OpCode::DIV => {
            arithmetic::div(&mut state.stack);
            advance(state)
        }
        OpCode::SDIV => {
            arithmetic::sdiv(&mut state.stack);
            advance(state)
        }
        OpCode::MOD => {
            arithmetic::modulo(&mut state.stack);
            advance(state)
        }
        OpCode::SMOD => {
            arithmetic::smod(&mut state.stack);
            advance(state)
        }
        OpCode::ADDMOD => {
            arithmetic::addmod(&mut state.stack);
            advance(state)
        }
        OpCode::MULMOD => {
            arithmetic::mulmod(&mut state.stack);
            advance(state)
        }
        OpCode::EXP => {
            arithmetic::exp(state)?;
            advance(state)
        }
        OpCode::SIGNEXTEND => {
            arithmetic::signextend(&mut state.stack);
            advance(state)
        }
        OpCode::LT => {
            boolean::lt(&mut state.stack);
            advance(state)
        }
        OpCode::GT => {
            boolean::gt(&mut state.stack);
            advance(state)
        }
        OpCode::SLT => {
            boolean::slt(&mut state.stack);
            advance(state)
        }
        OpCode::SGT => {
            boolean::sgt(&mut state.stack);
            advance(state)
        }
        OpCode::EQ => {
            boolean::eq(&mut state.stack);
            advance(state)
        }
        OpCode::ISZERO => {
            boolean::iszero(&mut state.stack);
            advance(state)
        }
        OpCode::AND => {
            boolean::and(&mut state.stack);
            advance(state)
        }
        OpCode::OR => {
            boolean::or(&mut state.stack);
            advance(state)
        }
        OpCode::XOR => {
            boolean::xor(&mut state.stack);
            advance(state)
        }
        OpCode::NOT => {
            boolean::not(&mut state.stack);
            advance(state)
        }
        OpCode::BYTE => {
            bitwise::byte(&mut state.stack);
            advance(state)
        }
        OpCode::SHL => {
            bitwise::shl(&mut state.stack);
            advance(state)
        }
        OpCode::SHR => {
            bitwise::shr(&mut state.stack);
            advance(state)
        }
        OpCode::SAR => {
            bitwise::sar(&mut state.stack);
            advance(state)
        }
        OpCode::KECCAK256 => {
            memory_ops::keccak256(state)?;
            advance(state)
        }
        OpCode::ADDRESS => {
            system::address(state);
            advance(state)
        }
        OpCode::BALANCE => {
            system::balance(state)?;
            advance(state)
        }
        OpCode::ORIGIN => {
            system::origin(state);
            advance(state)
        }
        OpCode::CALLER => {
            system::caller(state);
            advance(state)
        }
        OpCode::CALLVALUE => {
            system::callvalue(state);
            advance(state)
        }
        OpCode::CALLDATALOAD => {
            control::calldataload(state);
            advance(state)
        }
        OpCode::CALLDATASIZE => {
            control::calldatasize(state);
            advance(state)
        }
        OpCode::CALLDATACOPY => {
            control::calldatacopy(state)?;
            advance(state)
        }
        OpCode::CODESIZE => {
            memory_ops::codesize(state);
            advance(state)
        }
        OpCode::CODECOPY => {
            memory_ops::codecopy(state)?;
            advance(state)
        }
        OpCode::GASPRICE => {
            system::gasprice(state);
            advance(state)
        }
        OpCode::EXTCODESIZE => {
            system::extcodesize(state)?;
            advance(state)
        }
        OpCode::EXTCODECOPY => {
            system::extcodecopy(state)?;
            advance(state)
        }
        OpCode::RETURNDATASIZE => {
            memory_ops::returndatasize(state);
            advance(state)
        }
        OpCode::RETURNDATACOPY => {
            memory_ops::returndatacopy(state)?;
            advance(state)
        }
        OpCode::EXTCODEHASH => {
            system::extcodehash(state)?;
            advance(state)
        }
        OpCode::BLOCKHASH => {
            system::blockhash(state);
            advance(state)
        }
        OpCode::COINBASE => {
            system::coinbase(state);
            advance(state)
        }
        OpCode::TIMESTAMP => {
            system::timestamp(state);
            advance(state)
        }
        OpCode::NUMBER => {
            system::number(state);
            advance(state)
        }
        OpCode::DIFFICULTY => {
            system::difficulty(state);
            advance(state)
        }
        OpCode::GASLIMIT => {
            system::gaslimit(state);
            advance(state)
        }
        OpCode::CHAINID => {
            system::chainid(state);
            advance(state)
        }
        OpCode::SELFBALANCE => {
            system::selfbalance(state);
            advance(state)
        }
        OpCode::BASEFEE => {
            system::basefee(state);
            advance(state)
        }
        OpCode::POP => {
            state.stack.pop().map_err(|_| StatusCode::StackUnderflow)?;
            advance(state)
        }
        OpCode::MLOAD => {
            memory_ops::mload(state)?;
            advance(state)
        }
        OpCode::MSTORE => {
            memory_ops::mstore(state)?;
            advance(state)
        }
        OpCode::MSTORE8 => {
            memory_ops::mstore8(state)?;
            advance(state)
        }
        OpCode::SLOAD => {
            storage_ops::sload(state)?;
            advance(state)
        }
        OpCode::SSTORE => {
            storage_ops::sstore(state)?;
            advance(state)
        }
        OpCode::JUMP => {
            let dst = control::op_jump(state)?;
            state.pc = dst as u16;
            Ok(())
        }
        OpCode::JUMPI => {
            let dst = state.stack.pop().map_err(|_| StatusCode::StackUnderflow)?;
            let cond = state.stack.pop().map_err(|_| StatusCode::StackUnderflow)?;
            if cond.is_zero() {
                advance(state)
            } else {
                if !dst.fits_u64() || !state.code.is_jumpdest(dst.as_usize_saturating()) {
                    return Err(StatusCode::BadJumpDestination);
                }
                state.pc = dst.as_usize_saturating() as u16;
                Ok(())
            }
        }
        OpCode::PC => {
            state.stack.push(U256::from(state.pc as u64)).map_err(|_| StatusCode::StackOverflow)?;
            advance(state)
        }
        OpCode::MSIZE => {
            memory_ops::msize(state);
            advance(state)
        }
        OpCode::GAS => {
            state.stack.push(U256::from(state.gas)).map_err(|_| StatusCode::StackOverflow)?;
            advance(state)
        }
        OpCode::JUMPDEST => advance(state),
        OpCode::TLOAD => {
            storage_ops::tload(state);
            advance(state)
        }
        OpCode::TSTORE => {
            storage_ops::tstore(state)?;
            advance(state)
        }
        OpCode::PUSH0 => {
            stack_manip::push0(&mut state.stack);
            advance(state)
        }
        OpCode::CREATE => {
            call::create(state)?;
            advance(state)
        }
        OpCode::CALL => {
            call::call(state)?;
            advance(state)
        }
        OpCode::CALLCODE => {
            call::callcode(state)?;
            advance(state)
        }
        OpCode::RETURN => {
            let data = control::output_data(state)?;
            state.return_data = data;
            state.status = Status::Returned;
            Ok(())
        }
        OpCode::DELEGATECALL => {
            call::delegatecall(state)?;
            advance(state)
        }
        OpCode::CREATE2 => {
            call::create2(state)?;
            advance(state)
        }
        OpCode::STATICCALL => {
            call::staticcall(state)?;
            advance(state)
        }
        OpCode::REVERT => {
            let data = control::output_data(state)?;
            state.return_data = data;
            state.status = Status::Reverted;
            Ok(())
        }
        OpCode::INVALID => Err(StatusCode::InvalidInstruction),
        OpCode::SELFDESTRUCT => {
            system::selfdestruct(state)?;
            Ok(())
        }
        _ => Err(StatusCode::UndefinedInstruction),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Code;
    use crate::revision::Revision;
    use crate::state::CallContext;

    fn run(bytes: Vec<u8>, gas: u64) -> State {
        let mut state = State::new(Code::new(bytes), Revision::Cancun, gas, CallContext::default());
        run_to_completion(&mut state);
        state
    }

    #[test]
    fn simple_add() {
        let state = run(vec![0x60, 3, 0x60, 4, 0x01, 0x00], 1_000_000);
        assert_eq!(state.status, Status::Stopped);
        assert_eq!(state.stack.get(0), U256::from(7u64));
    }

    #[test]
    fn undefined_opcode_fails() {
        let state = run(vec![0x0c], 1_000_000);
        assert_eq!(state.status, Status::Failed);
    }

    #[test]
    fn out_of_gas_fails() {
        let state = run(vec![0x60, 3, 0x60, 4, 0x01, 0x00], 5);
        assert_eq!(state.status, Status::Failed);
    }

    #[test]
    fn jumpi_taken_skips_to_destination() {
        // PUSH1 1 PUSH1 6 JUMPI INVALID JUMPDEST PUSH1 42 STOP
        let state = run(vec![0x60, 1, 0x60, 6, 0x57, 0xfe, 0x5b, 0x60, 42, 0x00], 1_000_000);
        assert_eq!(state.status, Status::Stopped);
        assert_eq!(state.stack.get(0), U256::from(42u64));
    }

    #[test]
    fn return_carries_memory_slice() {
        // PUSH1 7 PUSH1 0 MSTORE PUSH1 32 PUSH1 0 RETURN
        let state = run(vec![0x60, 7, 0x60, 0, 0x52, 0x60, 32, 0x60, 0, 0xf3], 1_000_000);
        assert_eq!(state.status, Status::Returned);
        assert_eq!(state.return_data.len(), 32);
        assert_eq!(state.return_data[31], 7);
    }
}

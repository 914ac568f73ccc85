//! End-to-end `CALL`/`CALLCODE`/`DELEGATECALL`/`STATICCALL`/`CREATE`/`CREATE2`
//! scenarios run against a self-contained `State`. Unlike the teacher's own
//! `tests/call.rs` (which drives an async `Host` coroutine that resolves
//! each nested call by hand), nested calls here execute inline against the
//! same `State.accounts`/`storage_by_address` -- so these tests seed the
//! callee's code directly on the state and assert on its mutations after
//! `run_to_completion`, rather than intercepting a suspended call message.

use evmodin_core::opcode::OpCode;
use evmodin_core::util::{Bytecode, CallInstruction};
use evmodin_core::{
    run_to_completion, Address, CallContext, CallKind, Code, Revision, State, Status, U256,
};

fn addr(byte: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[19] = byte;
    Address(bytes)
}

fn run(code: Bytecode, gas: u64, setup: impl FnOnce(&mut State)) -> State {
    let mut state = State::new(Code::new(code.build()), Revision::Cancun, gas, CallContext {
        kind: CallKind::Call,
        depth: 0,
        address: addr(1),
        caller: addr(0),
        call_value: U256::ZERO,
        call_data: bytes::Bytes::new(),
    });
    setup(&mut state);
    run_to_completion(&mut state);
    state
}

#[test]
fn call_transfers_value_to_callee() {
    let callee = addr(2);
    let code = Bytecode::new().append_bc(
        CallInstruction::call(2u64).gas(50000u64).value(7u64).input(0u64, 0u64).output(0u64, 0u64),
    );

    let state = run(code, 100_000, |state| {
        state.accounts.set_balance(addr(1), U256::from(100u64));
    });

    assert_eq!(state.status, Status::Stopped);
    assert_eq!(state.stack.get(0), U256::ONE);
    assert_eq!(state.accounts.balance(addr(1)), U256::from(93u64));
    assert_eq!(state.accounts.balance(callee), U256::from(7u64));
}

#[test]
fn delegatecall_runs_callee_code_against_callers_storage() {
    // Callee: SSTORE(1, 42)
    let callee_code = Bytecode::new().sstore(1u64, 42u64).opcode(OpCode::STOP);
    let code = Bytecode::new().append_bc(CallInstruction::delegatecall(2u64).gas(50000u64));

    let state = run(code, 100_000, |state| {
        state.accounts.set_code(addr(2), Code::new(callee_code.build()));
    });

    assert_eq!(state.status, Status::Stopped);
    assert_eq!(state.stack.get(0), U256::ONE);
    // DELEGATECALL writes to the *caller's* own storage (address 1), not addr(2)'s.
    assert_eq!(state.sload(addr(1), U256::from(1u64)), U256::from(42u64));
    assert_eq!(state.sload(addr(2), U256::from(1u64)), U256::ZERO);
}

#[test]
fn staticcall_blocks_callee_sstore_without_reverting_caller() {
    let callee_code = Bytecode::new().sstore(1u64, 42u64).opcode(OpCode::STOP);
    let code = Bytecode::new()
        .append_bc(CallInstruction::staticcall(2u64).gas(50000u64))
        .opcode(OpCode::STOP);

    let state = run(code, 100_000, |state| {
        state.accounts.set_code(addr(2), Code::new(callee_code.build()));
    });

    assert_eq!(state.status, Status::Stopped);
    // The callee failed (static violation), so the call pushes 0, but the
    // caller itself keeps running to its own STOP.
    assert_eq!(state.stack.get(0), U256::ZERO);
    assert_eq!(state.sload(addr(2), U256::from(1u64)), U256::ZERO);
}

#[test]
fn call_value_in_static_context_is_rejected() {
    let code = Bytecode::new().append_bc(
        CallInstruction::call(2u64).gas(50000u64).value(1u64).input(0u64, 0u64).output(0u64, 0u64),
    );
    let state = run(code, 100_000, |state| {
        state.read_only = true;
        state.accounts.set_balance(addr(1), U256::from(100u64));
    });
    assert_eq!(state.status, Status::Failed);
}

#[test]
fn create_deploys_init_code_return_value_as_runtime_code() {
    // Init code: MSTORE8(31, 0xff), RETURN(31, 1) -- deploys a single 0xff byte.
    let init = Bytecode::new().mstore8_value(31u64, 0xffu64).ret(31u64, 1u64).build();

    // Copy `init`'s bytes into the outer call's memory one byte at a time,
    // then CREATE a new contract from that memory region.
    let mut deploy = Bytecode::new();
    for (i, byte) in init.iter().enumerate() {
        deploy = deploy.mstore8_value(i as u64, *byte as u64);
    }
    deploy = deploy
        .pushv(init.len() as u64)
        .pushv(0u64)
        .pushv(0u64)
        .opcode(OpCode::CREATE);

    let state = run(deploy, 1_000_000, |state| {
        state.accounts.set_balance(addr(1), U256::from(1u64));
        state.accounts.set_nonce(addr(1), 0);
    });

    assert_eq!(state.status, Status::Stopped);
    assert_ne!(state.stack.get(0), U256::ZERO);
    let new_address = Address::from_u256(state.stack.get(0));
    assert_eq!(state.accounts.code(new_address).as_bytes(), &[0xff]);
    assert_eq!(state.accounts.nonce(addr(1)), 1);
}

#[test]
fn create_with_insufficient_balance_for_endowment_fails_without_reverting_caller() {
    let deploy = Bytecode::new()
        .pushv(0u64)
        .pushv(0u64)
        .pushv(100u64) // endowment greater than available balance
        .opcode(OpCode::CREATE)
        .opcode(OpCode::STOP);

    let state = run(deploy, 100_000, |state| {
        state.accounts.set_balance(addr(1), U256::ZERO);
    });

    assert_eq!(state.status, Status::Stopped);
    assert_eq!(state.stack.get(0), U256::ZERO);
}

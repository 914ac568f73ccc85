//! End-to-end checks of arithmetic/comparison opcodes via the bytecode DSL,
//! running full programs through `run_to_completion` rather than unit-testing
//! each opcode function in isolation.

use evmodin_core::opcode::OpCode;
use evmodin_core::util::Bytecode;
use evmodin_core::{run_to_completion, CallContext, Code, Revision, State, Status, U256};

fn eval(code: Bytecode) -> U256 {
    let mut state = State::new(Code::new(code.build()), Revision::Cancun, 1_000_000, CallContext::default());
    run_to_completion(&mut state);
    assert_eq!(state.status, Status::Returned);
    U256::from_be_bytes(&state.return_data)
}

#[test]
fn add_wraps_on_overflow() {
    let code = Bytecode::new()
        .pushv(U256::MAX)
        .pushv(1u64)
        .opcode(OpCode::ADD)
        .ret_top();
    assert_eq!(eval(code), U256::ZERO);
}

#[test]
fn div_by_zero_yields_zero_per_evm_convention() {
    let code = Bytecode::new()
        .pushv(0u64)
        .pushv(42u64)
        .opcode(OpCode::DIV)
        .ret_top();
    assert_eq!(eval(code), U256::ZERO);
}

#[test]
fn mulmod_reduces_modulo_third_operand() {
    // (10 * 10) % 8 == 4
    let code = Bytecode::new()
        .pushv(8u64)
        .pushv(10u64)
        .pushv(10u64)
        .opcode(OpCode::MULMOD)
        .ret_top();
    assert_eq!(eval(code), U256::from(4u64));
}

#[test]
fn lt_pushes_one_when_true() {
    let code = Bytecode::new()
        .pushv(10u64)
        .pushv(3u64)
        .opcode(OpCode::LT)
        .ret_top();
    assert_eq!(eval(code), U256::ONE);
}

#[test]
fn signextend_propagates_sign_bit() {
    // SIGNEXTEND(0, 0xff) == U256::MAX (sign-extends the single negative byte).
    let code = Bytecode::new()
        .pushv(0xffu64)
        .pushv(0u64)
        .opcode(OpCode::SIGNEXTEND)
        .ret_top();
    assert_eq!(eval(code), U256::MAX);
}

//! Differential test: a freshly-generated random `State` run through
//! `NativeEvm` twice must agree with itself -- the same determinism property
//! `ct::compare` exists to check between two candidate implementations.

use evmodin_core::ct::{compare, generator, NativeEvm};
use evmodin_core::util::Bytecode;
use evmodin_core::{opcode::OpCode, Code, Revision};

#[test]
fn native_evm_is_deterministic_across_generated_states() {
    let mut rng = rand::thread_rng();
    let evm = NativeEvm;

    for _ in 0..20 {
        let code = Bytecode::new()
            .pushv(1u64)
            .pushv(2u64)
            .opcode(OpCode::ADD)
            .opcode(OpCode::POP)
            .opcode(OpCode::STOP)
            .build();
        let state = generator::generate(Revision::Cancun, Code::new(code), 0, &mut rng);
        let state = generator::with_random_accounts(state, 3, &mut rng);

        if let Err(diff) = compare(&evm, &evm, &state, 10) {
            panic!("NativeEvm disagreed with itself: {diff}");
        }
    }
}

//! Component I: the conformance-testing (CT) harness. Grounded on spec.md
//! §4.8 -- a differential-testing substrate built from three pieces: the
//! [`Evm`] adapter boundary every candidate interpreter satisfies, a random
//! [`generator`] that produces well-formed initial `State`s, and [`diff`]'s
//! shared `Eq`/human-readable-difference plumbing. There is no teacher
//! counterpart to this module (`vorot93-evmodin` has no differential-testing
//! harness); it is authored fresh against spec.md's description, following
//! the shape of a trait-object-based pluggable backend the way `host.rs`
//! and `precompiles.rs` already do for their own collaborators.

pub mod diff;
#[cfg(feature = "util")]
pub mod generator;

use crate::state::State;

/// The single operation every candidate interpreter must satisfy (spec.md
/// §4.8): apply `step` at most `n` times, or until `state.status` leaves
/// `Running`, and return the resulting `State`. Contract: given two
/// implementations `A` and `B`, for every generated `state` and every `n`,
/// `A.step_n(state.clone(), n) == B.step_n(state.clone(), n)` must hold under
/// [`State`]'s own `Eq` (which already collapses every failure cause into a
/// single `Failed` equivalence class).
pub trait Evm: std::fmt::Debug {
    fn step_n(&self, state: State, n: usize) -> State;
}

/// The `Evm` this crate's own step engine (`crate::interpreter`) implements.
/// The reference implementation a second back-end is differentially tested
/// against.
#[derive(Debug, Default)]
pub struct NativeEvm;

impl Evm for NativeEvm {
    fn step_n(&self, mut state: State, n: usize) -> State {
        crate::interpreter::step_n(&mut state, n);
        state
    }
}

/// Run both implementations on independent clones of `state` for the same
/// `n` and report whether they agree. Returns `Ok(())` on agreement, or an
/// `Err` carrying the human-readable diff spec.md §4.8 calls for printing
/// on mismatch.
pub fn compare(a: &dyn Evm, b: &dyn Evm, state: &State, n: usize) -> Result<(), String> {
    let result_a = a.step_n(state.clone(), n);
    let result_b = b.step_n(state.clone(), n);
    let differences = result_a.diff(&result_b);
    if differences.is_empty() {
        Ok(())
    } else {
        Err(differences.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Code;
    use crate::state::CallContext;
    use crate::revision::Revision;

    #[test]
    fn native_evm_agrees_with_itself() {
        let state = State::new(
            Code::new(vec![0x60, 1, 0x60, 2, 0x01, 0x00]),
            Revision::Cancun,
            100_000,
            CallContext::default(),
        );
        assert!(compare(&NativeEvm, &NativeEvm, &state, 10).is_ok());
    }

    #[test]
    fn determinism_holds_across_clones() {
        let state = State::new(Code::new(vec![0x00]), Revision::Cancun, 21000, CallContext::default());
        let evm = NativeEvm;
        let a = evm.step_n(state.clone(), 5);
        let b = evm.step_n(state.clone(), 5);
        assert_eq!(a, b);
    }
}

//! Test tooling kept from the teacher (SPEC_FULL.md §1): the bytecode
//! builder DSL and an in-memory `TransactionContext`. Gated behind the
//! `util` feature exactly as the teacher gates its own `util` module.

pub mod bytecode;
pub mod mocked_host;

pub use bytecode::{Bytecode, CallInstruction};
pub use mocked_host::MockedHost;

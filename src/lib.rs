//! `evmodin-core`: an Ethereum Virtual Machine execution engine and the
//! conformance-testing (CT) harness that surrounds it.
//!
//! The crate is organized leaves-first, the way the teacher this was grown
//! from lays out an interpreter: a 256-bit integer type and byte-code model
//! at the bottom, mutable state containers above that, a gas schedule and a
//! synchronous step engine above that, call/create dispatch and the
//! transaction processor on top, and the CT harness (a thin adapter trait
//! plus a random-state generator) as the outermost layer.

pub mod ct;
pub mod code;
pub mod error;
pub mod gas;
pub mod host;
#[doc(hidden)]
pub mod instructions;
pub mod interpreter;
pub mod opcode;
pub mod precompiles;
pub mod revision;
pub mod state;
pub mod tracer;
pub mod transaction;
pub mod types;
pub mod u256;

#[cfg(feature = "util")]
pub mod util;

pub use code::Code;
pub use error::{HostError, StatusCode};
pub use host::{AccessStatus, DummyHost, SnapshotId, TransactionContext};
pub use interpreter::{run_to_completion, step, step_n};
pub use revision::Revision;
pub use state::{
    Account, Accounts, BlockContext, CallContext, CallKind, Log, Logs, Memory, Snapshot, Stack,
    State, Status, Storage, StorageStatus, TransientStorage, TxContext,
};
pub use tracer::{NoopTracer, Tracer};
pub use transaction::{Receipt, Transaction, ValidationError};
pub use types::{Address, Hash256};
pub use u256::U256;

/// Maximum allowed EVM bytecode size (EIP-170).
pub const MAX_CODE_SIZE: usize = gas::MAX_CODE_SIZE;

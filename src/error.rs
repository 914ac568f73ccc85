//! Two error axes, per the step engine's contract: interpreter failure causes
//! (introspection only — the `State` itself only ever exposes the collapsed
//! `Terminal::Failed`), and typed host/adapter errors for the `TransactionContext`
//! boundary. Grounded in `common::StatusCode` (kept near verbatim) and extended
//! with a `thiserror`-derived `HostError` in place of the teacher's `anyhow::Error`.

use strum_macros::Display;

/// Cause of interpreter failure. Carried by tracers/diagnostics; never visible on
/// `State.status`, which always collapses a failure to `Terminal::Failed`.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum StatusCode {
    #[strum(serialize = "success")]
    Success,
    #[strum(serialize = "failure")]
    Failure,
    #[strum(serialize = "revert")]
    Revert,
    #[strum(serialize = "out of gas")]
    OutOfGas,
    #[strum(serialize = "invalid instruction")]
    InvalidInstruction,
    #[strum(serialize = "undefined instruction")]
    UndefinedInstruction,
    #[strum(serialize = "stack overflow")]
    StackOverflow,
    #[strum(serialize = "stack underflow")]
    StackUnderflow,
    #[strum(serialize = "bad jump destination")]
    BadJumpDestination,
    #[strum(serialize = "invalid memory access")]
    InvalidMemoryAccess,
    #[strum(serialize = "call depth exceeded")]
    CallDepthExceeded,
    #[strum(serialize = "static mode violation")]
    StaticModeViolation,
    #[strum(serialize = "precompile failure")]
    PrecompileFailure,
    #[strum(serialize = "argument out of range")]
    ArgumentOutOfRange,
    #[strum(serialize = "insufficient balance")]
    InsufficientBalance,
    #[strum(serialize = "internal error")]
    InternalError,
}

/// Typed errors a `TransactionContext` implementation can report. These are
/// adapter-contract violations, not interpreter outcomes -- they propagate as
/// `Err` out of the step engine instead of collapsing into `Terminal::Failed`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("unknown account")]
    UnknownAccount,
    #[error("unknown snapshot id {0}")]
    UnknownSnapshot(u64),
    #[error("block hash unavailable for block {0}")]
    BlockHashUnavailable(u64),
    #[error("host operation not supported in this context")]
    Unsupported,
}

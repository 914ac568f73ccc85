//! Component C: the append-only log sequence `LOG0..LOG4` produce. Grounded on
//! the teacher's `Host::emit_log(address, data, topics)` call shape, folded into
//! a plain `Vec` owned by `State` rather than dispatched through a host call,
//! per spec.md §3.

use crate::types::{Address, Hash256};
use arrayvec::ArrayVec;
use bytes::Bytes;

/// One `LOGn` record: up to 4 topics (`n`) plus the data blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Log {
    pub address: Address,
    pub topics: ArrayVec<Hash256, 4>,
    pub data: Bytes,
}

/// Append-only, ordered. A restored snapshot must discard any logs emitted
/// after the snapshot point (spec.md §5).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Logs(Vec<Log>);

impl Logs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, log: Log) {
        self.0.push(log);
    }

    pub fn as_slice(&self) -> &[Log] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drop every log appended after `mark` (the length at snapshot time) --
    /// `CreateSnapshot`/`RestoreSnapshot`'s log-rollback requirement.
    pub fn truncate(&mut self, mark: usize) {
        self.0.truncate(mark);
    }
}

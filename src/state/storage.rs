//! Component C: per-contract storage. Grounded on spec.md §3's
//! "(original, current, warm-key set)" shape, which the teacher's `Host` trait
//! only gestures at through `get_storage`/`set_storage`/`StorageStatus` -- this
//! crate owns the triple directly inside `State` rather than pushing it behind a
//! host call, since the state machine is self-contained per spec.md §5.

use crate::u256::U256;
use std::collections::HashMap;

/// `SLOAD`/`SSTORE` outcome classification the gas schedule keys off of,
/// kept from the teacher's `host::StorageStatus`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageStatus {
    Unchanged,
    Modified,
    ModifiedAgain,
    Added,
    Deleted,
}

/// One contract's storage: the value present at the start of the transaction,
/// the latest written value, and which keys have been touched this transaction.
#[derive(Clone, Debug, Default)]
pub struct Storage {
    original: HashMap<U256, U256>,
    current: HashMap<U256, U256>,
    warm: std::collections::HashSet<U256>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the original (pre-transaction) value of a key -- used by the
    /// transaction processor / CT generator when constructing an initial state.
    pub fn set_original(&mut self, key: U256, value: U256) {
        if value.is_zero() {
            self.original.remove(&key);
        } else {
            self.original.insert(key, value);
        }
        self.current.insert(key, value);
    }

    pub fn original(&self, key: U256) -> U256 {
        self.original.get(&key).copied().unwrap_or(U256::ZERO)
    }

    pub fn get(&self, key: U256) -> U256 {
        self.current.get(&key).copied().unwrap_or(U256::ZERO)
    }

    /// Write `value` to `key`, returning the `StorageStatus` the gas schedule
    /// needs (computed against the `(original, current, new)` triple per
    /// EIP-2200/2929).
    pub fn set(&mut self, key: U256, value: U256) -> StorageStatus {
        let original = self.original(key);
        let current = self.get(key);

        let status = if current == value {
            StorageStatus::Unchanged
        } else if original == current {
            if value.is_zero() {
                StorageStatus::Deleted
            } else if current.is_zero() {
                StorageStatus::Added
            } else {
                StorageStatus::Modified
            }
        } else {
            StorageStatus::ModifiedAgain
        };

        if value.is_zero() {
            self.current.remove(&key);
        } else {
            self.current.insert(key, value);
        }

        status
    }

    /// `{cold, warm}` first-touch access marking per EIP-2929. Returns `true` if
    /// the slot was already warm.
    pub fn access(&mut self, key: U256) -> bool {
        !self.warm.insert(key)
    }

    pub fn is_warm(&self, key: U256) -> bool {
        self.warm.contains(&key)
    }

    /// Human-readable differences, empty iff `Eq` holds (spec.md §4.5).
    pub fn diff(&self, other: &Self) -> Vec<String> {
        let mut out = Vec::new();
        let mut keys: std::collections::HashSet<U256> =
            self.current.keys().copied().collect();
        keys.extend(other.current.keys().copied());
        for key in keys {
            let a = self.get(key);
            let b = other.get(key);
            if a != b {
                out.push(format!("storage[{key}]: {a} != {b}"));
            }
        }
        out
    }
}

impl PartialEq for Storage {
    fn eq(&self, other: &Self) -> bool {
        self.diff(other).is_empty()
    }
}

impl Eq for Storage {}

/// EIP-1153 transient storage: same key/value shape as `Storage` but no
/// original-value tracking or warm set, and always empty at transaction start.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransientStorage(HashMap<U256, U256>);

impl TransientStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: U256) -> U256 {
        self.0.get(&key).copied().unwrap_or(U256::ZERO)
    }

    pub fn set(&mut self, key: U256, value: U256) {
        if value.is_zero() {
            self.0.remove(&key);
        } else {
            self.0.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_reads_as_zero_and_equals_explicit_zero() {
        let mut a = Storage::new();
        let mut b = Storage::new();
        b.set(1u64.into(), U256::ZERO);
        assert_eq!(a, b);
        assert!(a.diff(&b).is_empty());
        a.set(2u64.into(), U256::ZERO);
        assert_eq!(a, b);
    }

    #[test]
    fn status_classification() {
        let mut s = Storage::new();
        s.set_original(1u64.into(), 5u64.into());
        assert_eq!(s.set(1u64.into(), 5u64.into()), StorageStatus::Unchanged);
        assert_eq!(s.set(1u64.into(), 7u64.into()), StorageStatus::Modified);
        assert_eq!(s.set(1u64.into(), 9u64.into()), StorageStatus::ModifiedAgain);

        let mut s2 = Storage::new();
        assert_eq!(s2.set(2u64.into(), 1u64.into()), StorageStatus::Added);
        assert_eq!(s2.set(2u64.into(), U256::ZERO), StorageStatus::Deleted);
    }

    #[test]
    fn access_marks_warm_on_first_touch() {
        let mut s = Storage::new();
        assert!(!s.access(3u64.into()));
        assert!(s.is_warm(3u64.into()));
        assert!(s.access(3u64.into()));
    }

    #[test]
    fn transient_is_independent_of_storage_and_defaults_to_zero() {
        let mut t = TransientStorage::new();
        assert_eq!(t.get(1u64.into()), U256::ZERO);
        t.set(1u64.into(), 42u64.into());
        assert_eq!(t.get(1u64.into()), 42u64.into());
        t.set(1u64.into(), U256::ZERO);
        assert_eq!(t, TransientStorage::new());
    }
}

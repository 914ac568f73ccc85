//! Component §6: `TransactionContext`, the processor-facing adapter boundary.
//!
//! Grounded on the teacher's `Host` trait -- same operation set
//! (`get_balance`/`set_storage`/`access_account`/`emit_log`/...), same
//! `AccessStatus` enum -- but synchronous and `thiserror`-typed instead of
//! `async_trait`/`anyhow`. The teacher's `Host` is the interpreter's own
//! per-step collaborator (every `SLOAD`/`BALANCE`/nested `CALL` suspends the
//! coroutine to ask it something); here the step engine and call dispatch
//! (component G) read and write `State`'s own owned containers directly; a
//! `TransactionContext` is consulted only once, by the transaction processor
//! (component H), to seed a fresh `State` from persistent chain data before
//! execution and to commit `State`'s final mutations back afterward. Every
//! operation spec.md's processor boundary names is still present on the trait
//! -- just exercised at the two ends of a transaction instead of continuously.

use crate::code::Code;
use crate::error::HostError;
use crate::state::{BlockContext, Log, StorageStatus, TxContext};
use crate::types::{Address, Hash256};
use crate::u256::U256;

/// State access status (EIP-2929), kept from the teacher's `host::AccessStatus`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AccessStatus {
    #[default]
    Cold,
    Warm,
}

pub type SnapshotId = u64;

/// Persistent chain-state access the transaction processor needs before and
/// after running a transaction's `State` through the step engine.
pub trait TransactionContext {
    fn get_balance(&self, address: Address) -> U256;
    fn set_balance(&mut self, address: Address, balance: U256);
    fn get_nonce(&self, address: Address) -> u64;
    fn set_nonce(&mut self, address: Address, nonce: u64);
    fn get_code(&self, address: Address) -> Code;
    fn set_code(&mut self, address: Address, code: Code);
    fn get_code_hash(&self, address: Address) -> Hash256;
    fn get_storage(&self, address: Address, key: U256) -> U256;
    fn set_storage(&mut self, address: Address, key: U256, value: U256) -> StorageStatus;
    fn account_exists(&self, address: Address) -> bool;

    fn create_snapshot(&mut self) -> SnapshotId;
    fn restore_snapshot(&mut self, id: SnapshotId) -> Result<(), HostError>;

    fn get_logs(&self) -> &[Log];
    fn emit_log(&mut self, log: Log);

    fn access_account(&mut self, address: Address) -> AccessStatus;
    fn access_storage(&mut self, address: Address, key: U256) -> AccessStatus;

    fn block_context(&self) -> BlockContext;
    fn transaction_context(&self) -> TxContext;
    fn get_block_hash(&self, block_number: u64) -> Result<Hash256, HostError>;

    fn selfdestruct(&mut self, address: Address, beneficiary: Address);
}

/// A `TransactionContext` that reports every read as empty/nonexistent and
/// rejects every mutation -- the synchronous counterpart to the teacher's
/// `DummyHost`, useful as a placeholder for tests that never expect a given
/// code path to touch the outer chain state at all.
#[derive(Debug, Default)]
pub struct DummyHost;

impl TransactionContext for DummyHost {
    fn get_balance(&self, _address: Address) -> U256 {
        U256::ZERO
    }
    fn set_balance(&mut self, _address: Address, _balance: U256) {}
    fn get_nonce(&self, _address: Address) -> u64 {
        0
    }
    fn set_nonce(&mut self, _address: Address, _nonce: u64) {}
    fn get_code(&self, _address: Address) -> Code {
        Code::new(Vec::new())
    }
    fn set_code(&mut self, _address: Address, _code: Code) {}
    fn get_code_hash(&self, _address: Address) -> Hash256 {
        Hash256::ZERO
    }
    fn get_storage(&self, _address: Address, _key: U256) -> U256 {
        U256::ZERO
    }
    fn set_storage(&mut self, _address: Address, _key: U256, _value: U256) -> StorageStatus {
        StorageStatus::Unchanged
    }
    fn account_exists(&self, _address: Address) -> bool {
        false
    }
    fn create_snapshot(&mut self) -> SnapshotId {
        0
    }
    fn restore_snapshot(&mut self, _id: SnapshotId) -> Result<(), HostError> {
        Err(HostError::Unsupported)
    }
    fn get_logs(&self) -> &[Log] {
        &[]
    }
    fn emit_log(&mut self, _log: Log) {}
    fn access_account(&mut self, _address: Address) -> AccessStatus {
        AccessStatus::Cold
    }
    fn access_storage(&mut self, _address: Address, _key: U256) -> AccessStatus {
        AccessStatus::Cold
    }
    fn block_context(&self) -> BlockContext {
        BlockContext::default()
    }
    fn transaction_context(&self) -> TxContext {
        TxContext::default()
    }
    fn get_block_hash(&self, block_number: u64) -> Result<Hash256, HostError> {
        Err(HostError::BlockHashUnavailable(block_number))
    }
    fn selfdestruct(&mut self, _address: Address, _beneficiary: Address) {}
}

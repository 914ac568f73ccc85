//! In-memory `TransactionContext` for tests. Reconstructed from first
//! principles against `host.rs`'s trait -- the teacher's own
//! `util::mocked_host` (an async `Host` mock recording suspended sub-call
//! messages) has no counterpart here, since this crate's call/create
//! dispatch never suspends out to a host mid-call; what a synchronous
//! `TransactionContext` mock needs to record is narrower: which addresses
//! were read/written, which snapshots were taken/restored, and the logs
//! emitted, the same bookkeeping the teacher's `Recorded` struct kept, just
//! against this crate's own operation set.

use crate::code::Code;
use crate::error::HostError;
use crate::host::{AccessStatus, SnapshotId, TransactionContext};
use crate::state::{BlockContext, Log, StorageStatus, TxContext};
use crate::types::{Address, Hash256};
use crate::u256::U256;
use std::collections::HashMap;

/// One in-memory account: everything a `TransactionContext` tracks per
/// address.
#[derive(Clone, Debug, Default)]
pub struct MockedAccount {
    pub balance: U256,
    pub nonce: u64,
    pub code: Code,
    pub storage: HashMap<U256, U256>,
}

/// Bookkeeping of every boundary-crossing operation performed against a
/// `MockedHost`, mirroring the teacher's `Recorded` struct.
#[derive(Clone, Debug, Default)]
pub struct Recorded {
    pub account_accesses: Vec<Address>,
    pub storage_accesses: Vec<(Address, U256)>,
    pub logs: Vec<Log>,
    pub snapshots_created: u64,
    pub snapshots_restored: Vec<SnapshotId>,
}

/// A fully in-memory `TransactionContext`: accounts/storage live in plain
/// maps, snapshots are full deep copies pushed onto a stack, and every
/// operation is recorded for post-hoc assertions.
#[derive(Clone, Debug, Default)]
pub struct MockedHost {
    pub accounts: HashMap<Address, MockedAccount>,
    pub block_context: BlockContext,
    pub tx_context: TxContext,
    pub block_hashes: HashMap<u64, Hash256>,
    pub recorded: Recorded,
    snapshots: Vec<HashMap<Address, MockedAccount>>,
}

impl MockedHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(&mut self, address: Address) -> &mut MockedAccount {
        self.accounts.entry(address).or_default()
    }
}

impl TransactionContext for MockedHost {
    fn get_balance(&self, address: Address) -> U256 {
        self.accounts.get(&address).map(|a| a.balance).unwrap_or(U256::ZERO)
    }

    fn set_balance(&mut self, address: Address, balance: U256) {
        self.account(address).balance = balance;
    }

    fn get_nonce(&self, address: Address) -> u64 {
        self.accounts.get(&address).map(|a| a.nonce).unwrap_or(0)
    }

    fn set_nonce(&mut self, address: Address, nonce: u64) {
        self.account(address).nonce = nonce;
    }

    fn get_code(&self, address: Address) -> Code {
        self.accounts
            .get(&address)
            .map(|a| a.code.clone())
            .unwrap_or_else(|| Code::new(Vec::new()))
    }

    fn set_code(&mut self, address: Address, code: Code) {
        self.account(address).code = code;
    }

    fn get_code_hash(&self, address: Address) -> Hash256 {
        use sha3::{Digest, Keccak256};
        let code = self.get_code(address);
        if code.is_empty() {
            return Hash256::ZERO;
        }
        Hash256(Keccak256::digest(code.as_bytes()).into())
    }

    fn get_storage(&self, address: Address, key: U256) -> U256 {
        self.accounts
            .get(&address)
            .and_then(|a| a.storage.get(&key))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    fn set_storage(&mut self, address: Address, key: U256, value: U256) -> StorageStatus {
        let previous = self.get_storage(address, key);
        self.recorded.storage_accesses.push((address, key));
        if value.is_zero() {
            self.account(address).storage.remove(&key);
        } else {
            self.account(address).storage.insert(key, value);
        }
        if previous == value {
            StorageStatus::Unchanged
        } else if previous.is_zero() {
            StorageStatus::Added
        } else if value.is_zero() {
            StorageStatus::Deleted
        } else {
            StorageStatus::Modified
        }
    }

    fn account_exists(&self, address: Address) -> bool {
        self.accounts.contains_key(&address)
    }

    fn create_snapshot(&mut self) -> SnapshotId {
        self.snapshots.push(self.accounts.clone());
        self.recorded.snapshots_created += 1;
        (self.snapshots.len() - 1) as SnapshotId
    }

    fn restore_snapshot(&mut self, id: SnapshotId) -> Result<(), HostError> {
        let index = id as usize;
        if index >= self.snapshots.len() {
            return Err(HostError::UnknownSnapshot(id));
        }
        self.accounts = self.snapshots[index].clone();
        self.snapshots.truncate(index);
        self.recorded.snapshots_restored.push(id);
        Ok(())
    }

    fn get_logs(&self) -> &[Log] {
        &self.recorded.logs
    }

    fn emit_log(&mut self, log: Log) {
        self.recorded.logs.push(log);
    }

    fn access_account(&mut self, address: Address) -> AccessStatus {
        self.recorded.account_accesses.push(address);
        if self.accounts.contains_key(&address) {
            AccessStatus::Warm
        } else {
            AccessStatus::Cold
        }
    }

    fn access_storage(&mut self, address: Address, key: U256) -> AccessStatus {
        self.recorded.storage_accesses.push((address, key));
        AccessStatus::Cold
    }

    fn block_context(&self) -> BlockContext {
        self.block_context
    }

    fn transaction_context(&self) -> TxContext {
        self.tx_context
    }

    fn get_block_hash(&self, block_number: u64) -> Result<Hash256, HostError> {
        self.block_hashes
            .get(&block_number)
            .copied()
            .ok_or(HostError::BlockHashUnavailable(block_number))
    }

    fn selfdestruct(&mut self, address: Address, beneficiary: Address) {
        if let Some(account) = self.accounts.remove(&address) {
            let beneficiary_account = self.account(beneficiary);
            beneficiary_account.balance = beneficiary_account.balance.wrapping_add(account.balance);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_defaults_to_zero_for_unseeded_account() {
        let host = MockedHost::new();
        assert_eq!(host.get_balance(Address::ZERO), U256::ZERO);
    }

    #[test]
    fn snapshot_restore_undoes_balance_and_storage_changes() {
        let mut host = MockedHost::new();
        let addr = Address::from([1u8; 20]);
        host.set_balance(addr, U256::from(10u64));
        let snap = host.create_snapshot();
        host.set_balance(addr, U256::from(20u64));
        host.set_storage(addr, U256::from(1u64), U256::from(5u64));

        host.restore_snapshot(snap).unwrap();
        assert_eq!(host.get_balance(addr), U256::from(10u64));
        assert_eq!(host.get_storage(addr, U256::from(1u64)), U256::ZERO);
    }

    #[test]
    fn restoring_an_unknown_snapshot_errors() {
        let mut host = MockedHost::new();
        assert!(matches!(
            host.restore_snapshot(7),
            Err(HostError::UnknownSnapshot(7))
        ));
    }

    #[test]
    fn access_account_records_and_reports_warm_on_repeat() {
        let mut host = MockedHost::new();
        let addr = Address::from([2u8; 20]);
        assert_eq!(host.access_account(addr), AccessStatus::Cold);
        host.set_balance(addr, U256::from(1u64));
        assert_eq!(host.access_account(addr), AccessStatus::Warm);
        assert_eq!(host.recorded.account_accesses.len(), 2);
    }

    #[test]
    fn selfdestruct_transfers_balance_to_beneficiary() {
        let mut host = MockedHost::new();
        let addr = Address::from([3u8; 20]);
        let beneficiary = Address::from([4u8; 20]);
        host.set_balance(addr, U256::from(50u64));
        host.selfdestruct(addr, beneficiary);
        assert!(!host.account_exists(addr));
        assert_eq!(host.get_balance(beneficiary), U256::from(50u64));
    }
}

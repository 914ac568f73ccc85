//! Component C: per-transaction account view. Grounded on spec.md §3's
//! `{Balance, Code, Nonce}` triple plus a warm-address set, and on the teacher's
//! `Host::{get_balance, get_code_size, access_account}` call shapes -- folded
//! into a self-contained map instead of host round-trips, matching `host.rs`'s
//! generalization into a synchronous, state-owned model.

use crate::code::Code;
use crate::types::Address;
use crate::u256::U256;
use std::collections::{HashMap, HashSet};

/// One account's observable fields. A default (missing) account is empty,
/// zero-balance, zero-nonce -- indistinguishable from an explicit zero entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Account {
    pub balance: U256,
    pub code: Code,
    pub nonce: u64,
}

impl Account {
    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.code.is_empty() && self.nonce == 0
    }
}

/// Per-transaction mapping from address to account, plus the warm-address set
/// EIP-2929 requires.
#[derive(Clone, Debug, Default)]
pub struct Accounts {
    entries: HashMap<Address, Account>,
    warm: HashSet<Address>,
}

impl Accounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, address: Address) -> Account {
        self.entries.get(&address).cloned().unwrap_or_default()
    }

    pub fn exists(&self, address: Address) -> bool {
        self.entries.contains_key(&address)
    }

    /// Insert or overwrite an account. Setting it to the empty account is
    /// observably identical to removing it (spec.md §3), so this just stores
    /// the value either way -- equality/diff already treat them the same.
    pub fn set(&mut self, address: Address, account: Account) {
        if account.is_empty() {
            self.entries.remove(&address);
        } else {
            self.entries.insert(address, account);
        }
    }

    pub fn balance(&self, address: Address) -> U256 {
        self.get(address).balance
    }

    pub fn set_balance(&mut self, address: Address, balance: U256) {
        let mut a = self.get(address);
        a.balance = balance;
        self.set(address, a);
    }

    pub fn nonce(&self, address: Address) -> u64 {
        self.get(address).nonce
    }

    pub fn set_nonce(&mut self, address: Address, nonce: u64) {
        let mut a = self.get(address);
        a.nonce = nonce;
        self.set(address, a);
    }

    pub fn code(&self, address: Address) -> Code {
        self.get(address).code
    }

    pub fn set_code(&mut self, address: Address, code: Code) {
        let mut a = self.get(address);
        a.code = code;
        self.set(address, a);
    }

    /// First-touch warm marking (EIP-2929). Returns `true` if already warm.
    pub fn access(&mut self, address: Address) -> bool {
        !self.warm.insert(address)
    }

    pub fn is_warm(&self, address: Address) -> bool {
        self.warm.contains(&address)
    }

    /// Every address with a non-empty entry, for the transaction processor's
    /// final commit-back pass.
    pub fn iter(&self) -> impl Iterator<Item = (Address, &Account)> {
        self.entries.iter().map(|(address, account)| (*address, account))
    }

    /// Addresses present in either side, for iteration in `diff`/generators.
    fn all_addresses(&self, other: &Self) -> HashSet<Address> {
        let mut keys: HashSet<Address> = self.entries.keys().copied().collect();
        keys.extend(other.entries.keys().copied());
        keys
    }

    pub fn diff(&self, other: &Self) -> Vec<String> {
        let mut out = Vec::new();
        for address in self.all_addresses(other) {
            let a = self.get(address);
            let b = other.get(address);
            if a != b {
                out.push(format!("account[{address}]: {a:?} != {b:?}"));
            }
        }
        out
    }
}

impl PartialEq for Accounts {
    fn eq(&self, other: &Self) -> bool {
        self.diff(other).is_empty()
    }
}

impl Eq for Accounts {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_account_equals_explicit_zero_account() {
        let mut a = Accounts::new();
        let mut b = Accounts::new();
        let addr = Address::from([1u8; 20]);
        b.set(addr, Account::default());
        assert_eq!(a, b);
        assert!(a.diff(&b).is_empty());

        a.set_balance(addr, U256::ZERO);
        assert_eq!(a, b);
    }

    #[test]
    fn nonzero_balance_breaks_equality() {
        let mut a = Accounts::new();
        let b = Accounts::new();
        a.set_balance(Address::from([2u8; 20]), 1u64.into());
        assert_ne!(a, b);
        assert_eq!(a.diff(&b).len(), 1);
    }

    #[test]
    fn access_marks_warm_on_first_touch() {
        let mut accounts = Accounts::new();
        let addr = Address::from([3u8; 20]);
        assert!(!accounts.access(addr));
        assert!(accounts.is_warm(addr));
        assert!(accounts.access(addr));
    }
}

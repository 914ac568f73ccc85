//! Component C: the EVM stack. Grounded in the teacher's `state::Stack`
//! (`ArrayVec`-backed, top at the end of the vec but addressed as index 0 from
//! callers) and its `#[test] fn stack()` unit test, retargeted onto the
//! crate-local `U256`.

use crate::u256::U256;
use arrayvec::ArrayVec;

/// Maximum stack depth per spec.md §3.
pub const LIMIT: usize = 1024;

/// Ordered sequence of `U256`, top at index 0.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stack(ArrayVec<U256, LIMIT>);

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    /// `size` items, all zero -- `NewStackWithSize` from spec.md §4.4.
    pub fn with_size(size: usize) -> Self {
        let mut s = ArrayVec::new();
        for _ in 0..size {
            s.push(U256::ZERO);
        }
        Self(s)
    }

    pub const fn limit() -> usize {
        LIMIT
    }

    fn index_from_top(&self, pos: usize) -> usize {
        self.0.len() - 1 - pos
    }

    /// `i`-th item from the top; `get(0)` is the most recently pushed value.
    pub fn get(&self, pos: usize) -> U256 {
        self.0[self.index_from_top(pos)]
    }

    pub fn set(&mut self, pos: usize, value: U256) {
        let idx = self.index_from_top(pos);
        self.0[idx] = value;
    }

    pub fn size(&self) -> usize {
        self.0.len()
    }

    pub fn len(&self) -> usize {
        self.size()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Err` on stack-overflow (depth already at `LIMIT`).
    pub fn push(&mut self, value: U256) -> Result<(), ()> {
        if self.0.len() == LIMIT {
            return Err(());
        }
        self.0.push(value);
        Ok(())
    }

    /// `Err` on stack-underflow (empty stack).
    pub fn pop(&mut self) -> Result<U256, ()> {
        self.0.pop().ok_or(())
    }

    pub fn swap_top(&mut self, pos: usize) {
        let top = self.0.len() - 1;
        let other = self.index_from_top(pos);
        self.0.swap(top, other);
    }

    pub fn dup(&mut self, pos: usize) -> Result<(), ()> {
        let v = self.get(pos);
        self.push(v)
    }
}

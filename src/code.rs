//! Component B: the byte-code model. Grounded in the teacher's
//! `interpreter::AnalyzedCode::analyze` (which scans the program once to build a
//! jump-destination bitmap and pads the tail with a synthetic `STOP`), generalized
//! per spec.md §3 into a full is-code/is-data bitmap so that `RETURNDATACOPY`-style
//! "pc fell inside PUSH data" questions can be answered for any position, not only
//! `JUMPDEST` candidates.

use crate::opcode::OpCode;
use std::sync::Arc;

/// Program bytes plus a precomputed is-code bitmap, shared immutably across clones
/// the way the teacher caches `AnalyzedCode` once per `Code` value.
#[derive(Clone, Debug)]
pub struct Code {
    inner: Arc<CodeInner>,
}

#[derive(Debug)]
struct CodeInner {
    bytes: Vec<u8>,
    is_code_position: Vec<bool>,
}

impl Code {
    /// Analyze code: every byte is code unless it falls within the `n` bytes
    /// immediately following a `PUSHn` opcode.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let mut is_code_position = vec![true; bytes.len()];

        let mut i = 0;
        while i < bytes.len() {
            let op = OpCode(bytes[i]);
            let push_size = op.push_size();
            if push_size > 0 {
                for j in i + 1..=i + push_size {
                    if j < is_code_position.len() {
                        is_code_position[j] = false;
                    }
                }
                i += 1 + push_size;
            } else {
                i += 1;
            }
        }

        Self {
            inner: Arc::new(CodeInner {
                bytes,
                is_code_position,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.inner.bytes
    }

    /// Fetch the opcode at `pos`, or `STOP` once `pos` runs past the end of the
    /// program (step 2 of the step engine's per-instruction contract).
    pub fn get_op(&self, pos: usize) -> OpCode {
        self.inner
            .bytes
            .get(pos)
            .copied()
            .map(OpCode)
            .unwrap_or(OpCode::STOP)
    }

    pub fn is_code_position(&self, pos: usize) -> bool {
        pos < self.inner.is_code_position.len() && self.inner.is_code_position[pos]
    }

    pub fn is_jumpdest(&self, pos: usize) -> bool {
        pos < self.len() && self.inner.bytes[pos] == OpCode::JUMPDEST.to_u8() && self.is_code_position(pos)
    }

    /// `n` bytes starting at `pos`, zero-padded past the end of the program -- the
    /// load `PUSHn` performs for its immediate operand.
    pub fn slice_padded(&self, pos: usize, n: usize) -> [u8; 32] {
        let mut out = [0u8; 32];
        let bytes = &self.inner.bytes;
        let end = (pos + n).min(bytes.len());
        if pos < end {
            out[..end - pos].copy_from_slice(&bytes[pos..end]);
        }
        out
    }
}

impl Default for Code {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PartialEq for Code {
    fn eq(&self, other: &Self) -> bool {
        self.inner.bytes == other.inner.bytes
    }
}

impl Eq for Code {}

impl From<Vec<u8>> for Code {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for Code {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_data_is_not_code() {
        // PUSH2 0xAABB, ADD
        let code = Code::new(vec![0x61, 0xaa, 0xbb, 0x01]);
        assert!(code.is_code_position(0));
        assert!(!code.is_code_position(1));
        assert!(!code.is_code_position(2));
        assert!(code.is_code_position(3));
    }

    #[test]
    fn jumpdest_inside_push_data_is_not_a_destination() {
        // PUSH1 0x5B, JUMPDEST
        let code = Code::new(vec![0x60, 0x5b, 0x5b]);
        assert!(!code.is_jumpdest(1));
        assert!(code.is_jumpdest(2));
    }

    #[test]
    fn fetch_past_end_synthesizes_stop() {
        let code = Code::new(vec![0x01]);
        assert_eq!(code.get_op(0), OpCode::ADD);
        assert_eq!(code.get_op(1), OpCode::STOP);
        assert_eq!(code.get_op(1000), OpCode::STOP);
    }

    #[test]
    fn clone_shares_analysis() {
        let code = Code::new(vec![0x60, 0x01, 0x01]);
        let clone = code.clone();
        assert_eq!(code, clone);
        assert!(clone.is_code_position(0));
        assert!(!clone.is_code_position(1));
    }
}

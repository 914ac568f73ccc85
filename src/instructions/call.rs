//! Component G: `CALL`/`CALLCODE`/`DELEGATECALL`/`STATICCALL`/`CREATE`/`CREATE2`.
//!
//! Grounded on the teacher's `do_call!`/`do_create!` macros -- the 63/64
//! forwarding rule, the 2300-gas stipend, the Berlin cold-access surcharge and
//! the value-transfer/new-account costs are all kept verbatim. What changes is
//! the nested-call mechanism itself: the teacher suspends the current
//! coroutine and yields an interrupt for an async `Host::call` to resolve.
//! `State` already owns its accounts/storage/logs directly (no host to yield
//! to), so a nested call instead *borrows* those containers into a freshly
//! built child `State` via `mem::swap`, runs the step engine on it to
//! completion, and swaps the (possibly mutated) containers back -- the same
//! effect as a shared mutable reference, expressed as an explicit move instead
//! of threading a borrow through the whole call stack.

use crate::code::Code;
use crate::error::StatusCode;
use crate::gas::{
    ADDITIONAL_COLD_ACCOUNT_ACCESS_COST, CALL_STIPEND, CALL_VALUE_COST, MAX_CODE_SIZE, MAX_INITCODE_SIZE,
    NEW_ACCOUNT_COST,
};
use crate::revision::Revision;
use crate::state::{CallContext, CallKind, State, Status};
use crate::types::Address;
use crate::u256::U256;
use sha3::{Digest, Keccak256};

use super::memory_ops::charge_memory_region;

const DEPTH_LIMIT: u16 = 1024;

/// Move the shared, cross-call containers (accounts/storage/transient
/// storage/logs) out of `state` and into a freshly built child frame.
fn enter_frame(state: &mut State, code: Code, call_context: CallContext, read_only: bool, gas: u64) -> State {
    let mut child = State::new(code, state.revision, gas, call_context);
    child.read_only = read_only;
    std::mem::swap(&mut child.accounts, &mut state.accounts);
    std::mem::swap(&mut child.storage_by_address, &mut state.storage_by_address);
    std::mem::swap(&mut child.transient_storage, &mut state.transient_storage);
    std::mem::swap(&mut child.logs, &mut state.logs);
    std::mem::swap(&mut child.destructed, &mut state.destructed);
    child.block_context = state.block_context;
    child.transaction_context = state.transaction_context;
    child.block_hashes = state.block_hashes.clone();
    child.precompiles = state.precompiles.clone();
    child
}

/// Move the (possibly mutated) containers back out of a finished child frame.
fn exit_frame(state: &mut State, mut child: State) {
    std::mem::swap(&mut state.accounts, &mut child.accounts);
    std::mem::swap(&mut state.storage_by_address, &mut child.storage_by_address);
    std::mem::swap(&mut state.transient_storage, &mut child.transient_storage);
    std::mem::swap(&mut state.logs, &mut child.logs);
    std::mem::swap(&mut state.destructed, &mut child.destructed);
}

struct CallArgs {
    gas: U256,
    address: Address,
    value: U256,
    input_offset: U256,
    input_size: U256,
    output_offset: U256,
    output_size: U256,
}

fn pop_call_args(state: &mut State, kind: CallKind) -> CallArgs {
    let gas = state.stack.pop().unwrap();
    let address = Address::from_u256(state.stack.pop().unwrap());
    let value = if matches!(kind, CallKind::Call | CallKind::CallCode) {
        state.stack.pop().unwrap()
    } else {
        U256::ZERO
    };
    let input_offset = state.stack.pop().unwrap();
    let input_size = state.stack.pop().unwrap();
    let output_offset = state.stack.pop().unwrap();
    let output_size = state.stack.pop().unwrap();
    CallArgs {
        gas,
        address,
        value,
        input_offset,
        input_size,
        output_offset,
        output_size,
    }
}

/// Shared body for all four `CALL`-family opcodes.
fn dispatch_call(state: &mut State, kind: CallKind) -> Result<(), StatusCode> {
    let args = pop_call_args(state, kind);
    let has_value = !args.value.is_zero();

    if matches!(kind, CallKind::Call) && state.read_only && has_value {
        return Err(StatusCode::StaticModeViolation);
    }

    let (in_off, in_len) = charge_memory_region(state, args.input_offset, args.input_size)?;
    let (out_off, out_len) = charge_memory_region(state, args.output_offset, args.output_size)?;

    if state.revision >= Revision::Berlin {
        let was_warm = state.accounts.access(args.address);
        if !was_warm {
            crate::gas::charge(state, ADDITIONAL_COLD_ACCOUNT_ACCESS_COST)?;
        }
    }

    if has_value {
        crate::gas::charge(state, CALL_VALUE_COST)?;
    }
    if matches!(kind, CallKind::Call)
        && !state.accounts.exists(args.address)
        && (has_value || state.revision < Revision::Spurious)
    {
        crate::gas::charge(state, NEW_ACCOUNT_COST)?;
    }

    let gas_left = state.gas;
    let requested = args.gas.as_u64_saturating();
    let mut forwarded = if state.revision >= Revision::Tangerine {
        requested.min(gas_left - gas_left / 64)
    } else {
        requested.min(gas_left)
    };
    crate::gas::charge(state, forwarded)?;
    if has_value {
        forwarded += CALL_STIPEND;
    }

    // Assume failure; overwritten below on a real attempt.
    state.stack.push(U256::ZERO).unwrap();

    if state.call_context.depth as u64 + 1 > DEPTH_LIMIT as u64 {
        state.gas += forwarded;
        return Ok(());
    }
    if matches!(kind, CallKind::Call | CallKind::CallCode) && state.accounts.balance(state.own_address()) < args.value
    {
        state.gas += forwarded;
        return Ok(());
    }

    let input = bytes::Bytes::from(state.memory.read(in_off, in_len));

    if let Some(precompile) = crate::precompiles::Precompile::from_address(args.address) {
        if precompile.is_available(state.revision) {
            if matches!(kind, CallKind::Call | CallKind::CallCode) && has_value {
                let own = state.own_address();
                state.accounts.set_balance(own, state.accounts.balance(own).wrapping_sub(args.value));
                state.accounts.set_balance(args.address, state.accounts.balance(args.address).wrapping_add(args.value));
            }
            return run_precompile(state, precompile, &input, forwarded, out_off, out_len);
        }
    }

    let code = state.accounts.code(args.address);

    let call_context = match kind {
        CallKind::Call | CallKind::StaticCall => CallContext {
            kind,
            depth: state.call_context.depth + 1,
            address: args.address,
            caller: state.own_address(),
            call_value: args.value,
            call_data: input,
        },
        CallKind::CallCode => CallContext {
            kind,
            depth: state.call_context.depth + 1,
            address: state.own_address(),
            caller: state.own_address(),
            call_value: args.value,
            call_data: input,
        },
        CallKind::DelegateCall => CallContext {
            kind,
            depth: state.call_context.depth + 1,
            address: state.own_address(),
            caller: state.call_context.caller,
            call_value: state.call_context.call_value,
            call_data: input,
        },
        CallKind::Create | CallKind::Create2 { .. } => unreachable!(),
    };

    let read_only = state.read_only || matches!(kind, CallKind::StaticCall);

    if matches!(kind, CallKind::Call | CallKind::CallCode) && has_value {
        let own = state.own_address();
        state.accounts.set_balance(own, state.accounts.balance(own).wrapping_sub(args.value));
        state.accounts.set_balance(args.address, state.accounts.balance(args.address).wrapping_add(args.value));
    }

    let snapshot = state.snapshot();
    let mut child = enter_frame(state, code, call_context, read_only, forwarded);
    crate::interpreter::run_to_completion(&mut child);
    let status = child.status;
    let gas_left_after = child.gas;
    let return_data = child.return_data.clone();
    let refund = child.gas_refund;
    exit_frame(state, child);

    if matches!(status, Status::Reverted | Status::Failed) {
        state.restore(snapshot);
    } else {
        state.gas_refund += refund;
    }

    state.gas += gas_left_after;
    state.last_call_return_data = return_data.clone();
    let copy_len = out_len.min(return_data.len());
    state.memory.write(out_off, &return_data[..copy_len]);
    state
        .stack
        .set(0, if matches!(status, Status::Stopped | Status::Returned) { U256::ONE } else { U256::ZERO });

    Ok(())
}

/// A precompile's "execution" (component G step 4). The advertised gas
/// formula is charged against the already-forwarded budget; any leftover is
/// credited back to the caller exactly as a Returned sub-call would. Absent a
/// configured [`crate::precompiles::PrecompileRunner`] (or if it reports
/// failure), the call fails the way a reverting sub-call does: the forwarded
/// gas is consumed and a zero is pushed.
fn run_precompile(
    state: &mut State,
    precompile: crate::precompiles::Precompile,
    input: &[u8],
    forwarded: u64,
    out_off: usize,
    out_len: usize,
) -> Result<(), StatusCode> {
    let cost = precompile.gas_cost(input, state.revision);
    if cost > forwarded {
        state.last_call_return_data = bytes::Bytes::new();
        return Ok(());
    }
    let result = state.precompiles.as_ref().and_then(|runner| runner.run(precompile, input).ok());
    match result {
        Some(output) => {
            state.gas += forwarded - cost;
            let copy_len = out_len.min(output.output.len());
            state.memory.write(out_off, &output.output[..copy_len]);
            state.last_call_return_data = bytes::Bytes::from(output.output);
            state.stack.set(0, U256::ONE);
        }
        None => {
            state.last_call_return_data = bytes::Bytes::new();
        }
    }
    Ok(())
}

pub(crate) fn call(state: &mut State) -> Result<(), StatusCode> {
    dispatch_call(state, CallKind::Call)
}

pub(crate) fn callcode(state: &mut State) -> Result<(), StatusCode> {
    dispatch_call(state, CallKind::CallCode)
}

pub(crate) fn delegatecall(state: &mut State) -> Result<(), StatusCode> {
    dispatch_call(state, CallKind::DelegateCall)
}

pub(crate) fn staticcall(state: &mut State) -> Result<(), StatusCode> {
    dispatch_call(state, CallKind::StaticCall)
}

/// RLP-encodes `(sender, nonce)` and hashes it -- `CREATE`'s address formula.
/// Minimal hand-rolled encoder: both fields always fit in a short RLP list (no
/// long-form length prefixes needed for a 20-byte address plus an 8-byte nonce).
fn rlp_bytes(bytes: &[u8]) -> Vec<u8> {
    if bytes.len() == 1 && bytes[0] < 0x80 {
        vec![bytes[0]]
    } else {
        let mut out = vec![0x80 + bytes.len() as u8];
        out.extend_from_slice(bytes);
        out
    }
}

fn rlp_address_nonce(sender: Address, nonce: u64) -> Vec<u8> {
    let sender_rlp = rlp_bytes(&sender.0);
    let nonce_bytes = nonce.to_be_bytes();
    let trimmed: &[u8] = match nonce_bytes.iter().position(|&b| b != 0) {
        Some(i) => &nonce_bytes[i..],
        None => &[],
    };
    let nonce_rlp = if trimmed.is_empty() { vec![0x80] } else { rlp_bytes(trimmed) };
    let payload_len = sender_rlp.len() + nonce_rlp.len();
    let mut out = vec![0xc0 + payload_len as u8];
    out.extend_from_slice(&sender_rlp);
    out.extend_from_slice(&nonce_rlp);
    out
}

pub(crate) fn create_address(sender: Address, nonce: u64) -> Address {
    let encoded = rlp_address_nonce(sender, nonce);
    Address::from_u256(U256::from_be_bytes(&Keccak256::digest(&encoded)))
}

fn create2_address(sender: Address, salt: U256, init_code: &[u8]) -> Address {
    let init_hash = Keccak256::digest(init_code);
    let mut buf = Vec::with_capacity(1 + 20 + 32 + 32);
    buf.push(0xff);
    buf.extend_from_slice(&sender.0);
    buf.extend_from_slice(&salt.to_be_bytes());
    buf.extend_from_slice(&init_hash);
    Address::from_u256(U256::from_be_bytes(&Keccak256::digest(&buf)))
}

fn dispatch_create(state: &mut State, kind: CallKind) -> Result<(), StatusCode> {
    if state.read_only {
        return Err(StatusCode::StaticModeViolation);
    }
    let endowment = state.stack.pop().unwrap();
    let init_code_offset = state.stack.pop().unwrap();
    let init_code_size = state.stack.pop().unwrap();
    let salt = if let CallKind::Create2 { .. } = kind {
        Some(state.stack.pop().unwrap())
    } else {
        None
    };

    let (off, len) = charge_memory_region(state, init_code_offset, init_code_size)?;

    if state.revision >= Revision::Shanghai && len > MAX_INITCODE_SIZE {
        return Err(StatusCode::ArgumentOutOfRange);
    }
    if salt.is_some() {
        crate::gas::charge(state, crate::gas::dynamic::copy_words_cost(len) * 2)?;
    }

    // Assume failure; overwritten below on a real attempt.
    state.stack.push(U256::ZERO).unwrap();

    let sender = state.own_address();
    let sender_nonce = state.accounts.nonce(sender);
    if state.call_context.depth as u64 + 1 > DEPTH_LIMIT as u64 || state.accounts.balance(sender) < endowment {
        return Ok(());
    }

    let init_code = state.memory.read(off, len);
    let new_address = match kind {
        CallKind::Create => create_address(sender, sender_nonce),
        CallKind::Create2 { .. } => create2_address(sender, salt.unwrap(), &init_code),
        _ => unreachable!(),
    };

    state.accounts.set_nonce(sender, sender_nonce + 1);

    let forwarded = if state.revision >= Revision::Tangerine {
        state.gas - state.gas / 64
    } else {
        state.gas
    };
    crate::gas::charge(state, forwarded)?;

    let call_context = CallContext {
        kind,
        depth: state.call_context.depth + 1,
        address: new_address,
        caller: sender,
        call_value: endowment,
        call_data: bytes::Bytes::new(),
    };

    state.accounts.set_balance(sender, state.accounts.balance(sender).wrapping_sub(endowment));
    state.accounts.set_balance(new_address, state.accounts.balance(new_address).wrapping_add(endowment));

    let snapshot = state.snapshot();
    let mut child = enter_frame(state, Code::new(init_code), call_context, false, forwarded);
    crate::interpreter::run_to_completion(&mut child);
    let status = child.status;
    let gas_left_after = child.gas;
    let return_data = child.return_data.clone();
    let refund = child.gas_refund;
    exit_frame(state, child);

    if matches!(status, Status::Reverted | Status::Failed) {
        state.restore(snapshot);
        state.gas += gas_left_after;
        state.last_call_return_data = return_data;
        return Ok(());
    }
    state.gas_refund += refund;

    let code_len = return_data.len();
    if code_len > MAX_CODE_SIZE {
        state.restore(snapshot);
        return Ok(());
    }
    let deposit_cost = 200u64 * code_len as u64;
    if deposit_cost > gas_left_after {
        state.restore(snapshot);
        return Ok(());
    }

    state.accounts.set_code(new_address, Code::new(return_data.to_vec()));
    state.gas += gas_left_after - deposit_cost;
    state.last_call_return_data = bytes::Bytes::new();
    state.stack.set(0, new_address.to_u256());
    Ok(())
}

pub(crate) fn create(state: &mut State) -> Result<(), StatusCode> {
    dispatch_create(state, CallKind::Create)
}

pub(crate) fn create2(state: &mut State) -> Result<(), StatusCode> {
    dispatch_create(state, CallKind::Create2 { salt: U256::ZERO })
}

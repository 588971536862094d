//! `base64` library in the shape generated code takes.
//!
//! Module state lives in a two-level closure environment chain:
//!
//! ```text
//! decode env ── slot 0 ──> encode env (root)
//!   slot 1: map             slot 1: codes
//! ```
//!
//! `encode` captures the root environment, `decode` captures the child and
//! reaches `codes` one level up.

use memory::Value;
use tracing::trace;
use vm::{ArithOp, RuntimeError, VM};

use crate::bit32::{band, bor, lshift, rshift};

const CODES: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/=";
const CODES_SLOT: usize = 1;
const MAP_SLOT: usize = 1;

/// Sextet value of the padding character.
const PAD: f64 = 64.0;

/// Captured value (`level`, `slot`) of the running native's environment.
fn captured(vm: &mut VM, level: usize, slot: usize) -> Result<Value, RuntimeError> {
    let env = vm.upvalue(1);
    vm.push(env)?;
    vm.push_captured(-1, level, slot)?;
    let v = vm.pop()?;
    vm.pop()?;
    Ok(v)
}

/// Optional string argument, empty when absent.
fn opt_bytes(vm: &VM, arg: i32) -> Result<Vec<u8>, RuntimeError> {
    if vm.value_at(arg).is_nil() {
        Ok(Vec::new())
    } else {
        vm.check_bytes(arg)
    }
}

fn code_at(codes: &[u8], index: u32) -> Result<u8, RuntimeError> {
    codes
        .get(index as usize)
        .copied()
        .ok_or_else(|| RuntimeError::Custom(format!("base64: code index {} out of range", index)))
}

fn base64_encode(vm: &mut VM) -> Result<usize, RuntimeError> {
    let input = opt_bytes(vm, 1)?;
    let codes = captured(vm, 0, CODES_SLOT)?;
    let codes = vm
        .bytes_of(codes)
        .ok_or_else(|| vm.raise("alphabet missing"))?
        .to_vec();
    vm.set_top(0)?;

    let mut out = Vec::with_capacity(input.len().div_ceil(3) * 4);
    for chunk in input.chunks(3) {
        let a = chunk[0] as u32;
        let b = chunk.get(1).map(|&b| b as u32);
        let c = chunk.get(2).map(|&c| c as u32);

        // aaaaaa aabbbb bbbbcc cccccc
        out.push(code_at(&codes, rshift(a, 2))?);
        out.push(code_at(
            &codes,
            bor(lshift(band(a, 3), 4), b.map_or(0, |b| rshift(b, 4))),
        )?);
        out.push(match b {
            Some(b) => code_at(
                &codes,
                bor(lshift(band(b, 15), 2), c.map_or(0, |c| rshift(c, 6))),
            )?,
            None => b'=',
        });
        out.push(match c {
            Some(c) => code_at(&codes, band(c, 63))?,
            None => b'=',
        });
    }

    let result = vm.intern_bytes(&out);
    vm.push(result)?;
    Ok(1)
}

/// Sextet for character `ch`, or padding past the end of the input.
fn sextet(vm: &mut VM, map: Value, ch: Option<&u8>) -> Result<Value, RuntimeError> {
    let Some(&ch) = ch else {
        return Ok(Value::number(PAD));
    };
    let v = vm.raw_get(map, Value::number(ch as f64));
    if v.is_nil() {
        return Err(vm.raise(format!("invalid character '{}'", ch as char)));
    }
    Ok(v)
}

fn as_bits(vm: &VM, v: Value) -> u32 {
    vm.coerce_number(v).map_or(0, |n| n as u32)
}

/// `v < 64`, i.e. not padding.
fn is_data(vm: &mut VM, v: Value) -> Result<bool, RuntimeError> {
    Ok(!vm.less_equal_values(Value::number(PAD), v)?)
}

fn to_byte(vm: &VM, bits: u32) -> Result<u8, RuntimeError> {
    u8::try_from(bits).map_err(|_| vm.raise(format!("byte value {} out of range", bits)))
}

fn base64_decode(vm: &mut VM) -> Result<usize, RuntimeError> {
    let data = opt_bytes(vm, 1)?;
    let map = captured(vm, 0, MAP_SLOT)?;
    vm.set_top(0)?;

    let mut bytes = Vec::with_capacity(data.len() / 4 * 3);
    for chunk in data.chunks(4) {
        let a = sextet(vm, map, chunk.first())?;
        let b = sextet(vm, map, chunk.get(1))?;
        let c = sextet(vm, map, chunk.get(2))?;
        let d = sextet(vm, map, chunk.get(3))?;
        // every chunk carries at least one full byte
        if !is_data(vm, a)? || !is_data(vm, b)? {
            return Err(vm.raise("invalid padding"));
        }
        let (ba, bb) = (as_bits(vm, a), as_bits(vm, b));

        // aaaaaabb bbbbcccc ccdddddd
        bytes.push(to_byte(vm, bor(lshift(ba, 2), rshift(bb, 4)))?);
        if is_data(vm, c)? {
            let bc = as_bits(vm, c);
            bytes.push(to_byte(vm, bor(lshift(band(bb, 0xf), 4), rshift(bc, 2)))?);
            if is_data(vm, d)? {
                bytes.push(to_byte(vm, bor(lshift(band(bc, 3), 6), as_bits(vm, d)))?);
            }
        }
    }

    let result = vm.intern_bytes(&bytes);
    vm.push(result)?;
    Ok(1)
}

/// Fills `map[byte(codes, i)] = i - 1` for every alphabet character.
fn build_reverse_map(vm: &mut VM, map: Value) -> Result<(), RuntimeError> {
    for (i, ch) in CODES.bytes().enumerate() {
        let position = Value::number((i + 1) as f64);
        let sextet = vm.arith_values(ArithOp::Sub, position, Value::number(1.0))?;
        vm.raw_set(map, Value::number(ch as f64), sextet)?;
    }
    Ok(())
}

/// Registers `base64`. The library table is left on the stack.
pub fn open(vm: &mut VM) -> Result<Value, RuntimeError> {
    let base = vm.top() as i32;

    // root environment: codes
    vm.push(Value::nil())?;
    vm.new_closure_env(-1)?;
    vm.remove(-2)?;
    let encode_env = base + 1;
    let codes = vm.intern(CODES);
    vm.push(codes)?;
    vm.store_captured(encode_env, 0, CODES_SLOT)?;
    let encode_upvalue = vm.value_at(encode_env);
    let encode = vm.new_native("base64.encode", base64_encode, vec![encode_upvalue]);

    // child environment: reverse map
    vm.new_closure_env(encode_env)?;
    let decode_env = base + 2;
    let map = vm.new_table(CODES.len());
    build_reverse_map(vm, map)?;
    vm.push(map)?;
    vm.store_captured(decode_env, 0, MAP_SLOT)?;
    let decode_upvalue = vm.value_at(decode_env);
    let decode = vm.new_native("base64.decode", base64_decode, vec![decode_upvalue]);

    vm.set_top(base)?;
    let table = vm.register_library("base64", 2)?;
    let key = vm.intern("encode");
    vm.raw_set(table, key, encode)?;
    let key = vm.intern("decode");
    vm.raw_set(table, key, decode)?;
    trace!("base64 environments initialised");
    Ok(table)
}

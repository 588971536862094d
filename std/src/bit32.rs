//! `bit32` library: bitwise operations on 32-bit unsigned integers.
//!
//! Operands are numbers truncated toward zero and wrapped modulo 2^32.
//! Results are always in `0..2^32`.

use memory::Value;
use vm::{NativeFn, RuntimeError, VM};

pub const NBITS: i64 = 32;
pub const ALL_ONES: u32 = !0;

pub fn band(a: u32, b: u32) -> u32 {
    a & b
}

pub fn bor(a: u32, b: u32) -> u32 {
    a | b
}

pub fn bxor(a: u32, b: u32) -> u32 {
    a ^ b
}

pub fn bnot(a: u32) -> u32 {
    !a
}

/// Logical shift: left for positive `i`, right for negative `i`. Shifting by
/// 32 or more bits in either direction yields 0.
pub fn shift(r: u32, i: i64) -> u32 {
    if i.unsigned_abs() >= NBITS as u64 {
        0
    } else if i < 0 {
        r >> -i
    } else {
        r << i
    }
}

pub fn lshift(r: u32, i: i64) -> u32 {
    shift(r, i)
}

pub fn rshift(r: u32, i: i64) -> u32 {
    shift(r, i.saturating_neg())
}

/// Arithmetic right shift: vacated high bits copy the sign bit.
pub fn arshift(r: u32, i: i64) -> u32 {
    if i < 0 || r & (1 << 31) == 0 {
        return rshift(r, i);
    }
    if i >= NBITS {
        ALL_ONES
    } else {
        (r >> i) | !(ALL_ONES >> i)
    }
}

/// Number to its 32-bit unsigned form.
pub fn to_unsigned(n: f64) -> u32 {
    n.trunc().rem_euclid(4294967296.0) as u32
}

fn check_unsigned(vm: &VM, arg: i32) -> Result<u32, RuntimeError> {
    vm.check_number(arg).map(to_unsigned)
}

fn check_shift(vm: &VM, arg: i32) -> Result<i64, RuntimeError> {
    vm.check_number(arg).map(|n| n as i64)
}

fn push_unsigned(vm: &mut VM, r: u32) -> Result<usize, RuntimeError> {
    vm.push(Value::number(r as f64))?;
    Ok(1)
}

/// Folds every argument with `op`, starting from `init`.
fn fold_args(vm: &VM, init: u32, op: fn(u32, u32) -> u32) -> Result<u32, RuntimeError> {
    let mut r = init;
    for arg in 1..=vm.top() as i32 {
        r = op(r, check_unsigned(vm, arg)?);
    }
    Ok(r)
}

fn bit32_band(vm: &mut VM) -> Result<usize, RuntimeError> {
    let r = fold_args(vm, ALL_ONES, band)?;
    push_unsigned(vm, r)
}

fn bit32_bor(vm: &mut VM) -> Result<usize, RuntimeError> {
    let r = fold_args(vm, 0, bor)?;
    push_unsigned(vm, r)
}

fn bit32_bxor(vm: &mut VM) -> Result<usize, RuntimeError> {
    let r = fold_args(vm, 0, bxor)?;
    push_unsigned(vm, r)
}

fn bit32_btest(vm: &mut VM) -> Result<usize, RuntimeError> {
    let r = fold_args(vm, ALL_ONES, band)?;
    vm.push(Value::bool(r != 0))?;
    Ok(1)
}

fn bit32_bnot(vm: &mut VM) -> Result<usize, RuntimeError> {
    let a = check_unsigned(vm, 1)?;
    push_unsigned(vm, bnot(a))
}

fn bit32_lshift(vm: &mut VM) -> Result<usize, RuntimeError> {
    let r = check_unsigned(vm, 1)?;
    let i = check_shift(vm, 2)?;
    push_unsigned(vm, lshift(r, i))
}

fn bit32_rshift(vm: &mut VM) -> Result<usize, RuntimeError> {
    let r = check_unsigned(vm, 1)?;
    let i = check_shift(vm, 2)?;
    push_unsigned(vm, rshift(r, i))
}

fn bit32_arshift(vm: &mut VM) -> Result<usize, RuntimeError> {
    let r = check_unsigned(vm, 1)?;
    let i = check_shift(vm, 2)?;
    push_unsigned(vm, arshift(r, i))
}

const FUNCTIONS: &[(&str, NativeFn)] = &[
    ("arshift", bit32_arshift),
    ("band", bit32_band),
    ("bnot", bit32_bnot),
    ("bor", bit32_bor),
    ("btest", bit32_btest),
    ("bxor", bit32_bxor),
    ("lshift", bit32_lshift),
    ("rshift", bit32_rshift),
];

/// Registers `bit32`. The library table is left on the stack.
pub fn open(vm: &mut VM) -> Result<Value, RuntimeError> {
    vm.define_library("bit32", FUNCTIONS)
}

//! Machine module - VM implementation
//!
//! This module contains the runtime substrate segmented into focused
//! submodules: the stack protocol, operator dispatch, closure environments,
//! library registration and collection.

mod frame;
mod vm;
mod stack;
mod arithmetic;
mod closure;
mod registry;
mod gc;

// Public API
pub use arithmetic::{ArithOp, ArithmeticOps, Operand};
pub use frame::CallFrame;
pub use gc::GarbageCollector;
pub use stack::MULTRET;
pub use vm::{STACK_MAX, VM};

use crate::error::RuntimeError;
use memory::Value;
use tracing::debug;

use super::frame::CallFrame;
use super::vm::{MAX_CALL_DEPTH, STACK_MAX, VM};

/// `nresults` value keeping every result of a call.
pub const MULTRET: i32 = -1;

/// Trait for stack operations (registers)
pub trait StackOps {
    fn get_reg(&self, base: usize, reg: usize) -> Result<Value, RuntimeError>;
    fn set_reg(&mut self, base: usize, reg: usize, val: Value) -> Result<(), RuntimeError>;
}

impl StackOps for VM {
    #[inline(always)]
    fn get_reg(&self, base: usize, reg: usize) -> Result<Value, RuntimeError> {
        self.stack
            .get(base + reg)
            .copied()
            .ok_or(RuntimeError::StackOverflow)
    }

    #[inline(always)]
    fn set_reg(&mut self, base: usize, reg: usize, val: Value) -> Result<(), RuntimeError> {
        let slot = self
            .stack
            .get_mut(base + reg)
            .ok_or(RuntimeError::StackOverflow)?;
        *slot = val;
        Ok(())
    }
}

// Stack protocol for natives. Positive indices are 1-based from the current
// frame's base, negative indices count down from the top (-1 is the top).
impl VM {
    #[inline]
    fn base(&self) -> usize {
        self.frames.last().map_or(0, |f| f.base)
    }

    /// Absolute slot of a valid index.
    pub fn abs_index(&self, idx: i32) -> Result<usize, RuntimeError> {
        let base = self.base();
        let slot = if idx > 0 {
            base + idx as usize - 1
        } else if idx < 0 {
            let back = idx.unsigned_abs() as usize;
            if back > self.stack_top - base {
                return Err(RuntimeError::InvalidIndex(idx));
            }
            self.stack_top - back
        } else {
            return Err(RuntimeError::InvalidIndex(idx));
        };
        if slot < self.stack_top {
            Ok(slot)
        } else {
            Err(RuntimeError::InvalidIndex(idx))
        }
    }

    /// Number of values in the current frame.
    pub fn top(&self) -> usize {
        self.stack_top - self.base()
    }

    /// Value at `idx`, nil for an index past the top.
    pub fn value_at(&self, idx: i32) -> Value {
        self.abs_index(idx)
            .map(|slot| self.stack[slot])
            .unwrap_or_else(|_| Value::nil())
    }

    pub fn push(&mut self, val: Value) -> Result<(), RuntimeError> {
        if self.stack_top >= STACK_MAX {
            return Err(RuntimeError::StackOverflow);
        }
        self.stack[self.stack_top] = val;
        self.stack_top += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<Value, RuntimeError> {
        if self.stack_top <= self.base() {
            return Err(RuntimeError::StackUnderflow);
        }
        self.stack_top -= 1;
        Ok(std::mem::take(&mut self.stack[self.stack_top]))
    }

    /// Removes the value at `idx`, shifting the values above it down.
    pub fn remove(&mut self, idx: i32) -> Result<Value, RuntimeError> {
        let slot = self.abs_index(idx)?;
        let removed = self.stack[slot];
        self.stack.copy_within(slot + 1..self.stack_top, slot);
        self.stack_top -= 1;
        self.stack[self.stack_top] = Value::nil();
        Ok(removed)
    }

    /// Pops the top value into `idx`.
    pub fn replace(&mut self, idx: i32) -> Result<(), RuntimeError> {
        let slot = self.abs_index(idx)?;
        let val = self.pop()?;
        if slot < self.stack_top {
            self.stack[slot] = val;
        }
        Ok(())
    }

    /// Moves the top value into `idx`, shifting the values above it up.
    pub fn insert(&mut self, idx: i32) -> Result<(), RuntimeError> {
        let slot = self.abs_index(idx)?;
        let top = self.stack_top - 1;
        let val = self.stack[top];
        self.stack.copy_within(slot..top, slot + 1);
        self.stack[slot] = val;
        Ok(())
    }

    /// Sets the frame size: `idx >= 0` is an absolute size (new slots are
    /// nil), a negative `idx` drops values above it.
    pub fn set_top(&mut self, idx: i32) -> Result<(), RuntimeError> {
        let base = self.base();
        let new_top = if idx >= 0 {
            base + idx as usize
        } else {
            let back = (idx.unsigned_abs() - 1) as usize;
            if back > self.stack_top - base {
                return Err(RuntimeError::InvalidIndex(idx));
            }
            self.stack_top - back
        };
        if new_top > STACK_MAX {
            return Err(RuntimeError::StackOverflow);
        }
        if new_top > self.stack_top {
            self.stack[self.stack_top..new_top].fill(Value::nil());
        } else {
            self.stack[new_top..self.stack_top].fill(Value::nil());
        }
        self.stack_top = new_top;
        Ok(())
    }

    /// Calls the function sitting below `nargs` arguments. Results replace
    /// the function and its arguments, adjusted to `nresults` (or all of
    /// them for `MULTRET`).
    pub fn call(&mut self, nargs: usize, nresults: i32) -> Result<(), RuntimeError> {
        if nargs + 1 > self.top() {
            return Err(RuntimeError::StackUnderflow);
        }
        let func_slot = self.stack_top - nargs - 1;
        let callee = self.stack[func_slot];
        let native_idx = callee
            .as_handle()
            .filter(|_| callee.is_function())
            .ok_or(RuntimeError::NotCallable(callee.type_name()))?;
        let func = self
            .natives
            .get(native_idx as usize)
            .map(|n| n.func)
            .ok_or(RuntimeError::NotCallable(callee.type_name()))?;

        if self.frames.len() >= MAX_CALL_DEPTH {
            return Err(RuntimeError::StackOverflow);
        }
        self.frames.push(CallFrame::new(func_slot + 1, Some(native_idx)));
        let result = func(self);
        self.frames.pop();
        let produced = match result {
            Ok(n) => n,
            Err(err) => {
                // drop the callee and whatever it left behind
                let top = self.stack_top.max(func_slot);
                self.stack[func_slot..top].fill(Value::nil());
                self.stack_top = func_slot;
                return Err(err);
            }
        };

        let produced = produced.min(self.stack_top.saturating_sub(func_slot + 1));
        let first = self.stack_top - produced;
        self.stack.copy_within(first..self.stack_top, func_slot);
        let kept = if nresults == MULTRET {
            produced
        } else {
            nresults.max(0) as usize
        };
        let end = func_slot + kept;
        if end > STACK_MAX {
            return Err(RuntimeError::StackOverflow);
        }
        let clear_from = func_slot + produced.min(kept);
        let clear_to = end.max(self.stack_top);
        self.stack[clear_from..clear_to].fill(Value::nil());
        self.stack_top = end;
        Ok(())
    }

    /// `call` behind a protected boundary: on error the frames and stack
    /// are unwound to where the callee sat and the error message is pushed
    /// in its place. The error is still returned to the host.
    pub fn pcall(&mut self, nargs: usize, nresults: i32) -> Result<(), RuntimeError> {
        if nargs + 1 > self.top() {
            return Err(RuntimeError::StackUnderflow);
        }
        let func_slot = self.stack_top - nargs - 1;
        let depth = self.frames.len();
        match self.call(nargs, nresults) {
            Ok(()) => Ok(()),
            Err(err) => {
                debug!(error = %err, "protected call failed");
                self.frames.truncate(depth);
                self.stack[func_slot..self.stack_top.max(func_slot)].fill(Value::nil());
                self.stack_top = func_slot;
                let message = self.intern(&err.to_string());
                self.push(message)?;
                Err(err)
            }
        }
    }

    /// Error raised from a native, prefixed with the native's name.
    pub fn raise(&self, message: impl Into<String>) -> RuntimeError {
        let message = message.into();
        match self.current_native_name() {
            Some(name) => format!("{}: {}", name, message).into(),
            None => message.into(),
        }
    }

    /// Upvalue `i` (1-based) of the running native; nil outside a native.
    pub fn upvalue(&self, i: usize) -> Value {
        self.frames
            .last()
            .and_then(|f| f.native)
            .and_then(|idx| self.natives.get(idx as usize))
            .and_then(|n| n.upvalues.get(i.checked_sub(1)?))
            .copied()
            .unwrap_or_else(Value::nil)
    }

    // --- Argument helpers ---

    pub fn check_number(&self, arg: i32) -> Result<f64, RuntimeError> {
        let v = self.value_at(arg);
        self.coerce_number(v)
            .ok_or_else(|| self.bad_argument(arg, format!("number expected, got {}", v.type_name())))
    }

    pub fn check_string(&self, arg: i32) -> Result<String, RuntimeError> {
        let bytes = self.check_bytes(arg)?;
        String::from_utf8(bytes).map_err(|_| self.bad_argument(arg, "invalid UTF-8 string"))
    }

    /// String argument as raw bytes; numbers are converted to their text.
    pub fn check_bytes(&self, arg: i32) -> Result<Vec<u8>, RuntimeError> {
        let v = self.value_at(arg);
        if let Some(b) = self.bytes_of(v) {
            return Ok(b.to_vec());
        }
        if let Some(n) = v.as_number() {
            return Ok(self.val_to_string(&Value::number(n)).into_bytes());
        }
        Err(self.bad_argument(arg, format!("string expected, got {}", v.type_name())))
    }

    pub fn bad_argument(&self, arg: i32, message: impl Into<String>) -> RuntimeError {
        RuntimeError::BadArgument {
            arg: arg.max(0) as usize,
            func: self.current_native_name().unwrap_or("?").to_string(),
            message: message.into(),
        }
    }
}

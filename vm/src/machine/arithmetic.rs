use crate::error::RuntimeError;
use crate::opcode::{instruction::*, OpCode};
use memory::{Heap, Value};
use tracing::trace;

use super::stack::StackOps;
use super::vm::VM;

/// Binary arithmetic operators with an override event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    IDiv,
}

impl ArithOp {
    /// Metatable key consulted when an operand is not numeric.
    pub fn event(self) -> &'static str {
        match self {
            ArithOp::Add => "__add",
            ArithOp::Sub => "__sub",
            ArithOp::Mul => "__mul",
            ArithOp::Div => "__div",
            ArithOp::Mod => "__mod",
            ArithOp::IDiv => "__idiv",
        }
    }

    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
            ArithOp::Div => a / b,
            // floored: the result takes the sign of the divisor
            ArithOp::Mod => a - (a / b).floor() * b,
            ArithOp::IDiv => (a / b).trunc(),
        }
    }

    fn from_opcode(op: OpCode) -> Option<Self> {
        match op {
            OpCode::Add => Some(ArithOp::Add),
            OpCode::Sub => Some(ArithOp::Sub),
            OpCode::Mul => Some(ArithOp::Mul),
            OpCode::Div => Some(ArithOp::Div),
            OpCode::Mod => Some(ArithOp::Mod),
            OpCode::IDiv => Some(ArithOp::IDiv),
            _ => None,
        }
    }
}

/// Operand class seen by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    Number(f64),
    /// Interned string handle
    Text(u32),
    /// Metatable handle
    HandlerCarrying(u32),
    Other,
}

impl Operand {
    pub fn classify(heap: &Heap, v: Value) -> Operand {
        if let Some(n) = v.as_number() {
            return Operand::Number(n);
        }
        if v.is_string() {
            if let Some(h) = v.as_handle() {
                return Operand::Text(h);
            }
        }
        match heap.metatable_of(v) {
            Some(mt) => Operand::HandlerCarrying(mt),
            None => Operand::Other,
        }
    }
}

/// Parses the textual forms `tonumber` accepts: decimal with optional
/// exponent, or `0x` hex, surrounded by optional whitespace.
pub(crate) fn str_to_number(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    let (negative, body) = match t.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, t.strip_prefix('+').unwrap_or(t)),
    };
    if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        let n = u64::from_str_radix(hex, 16).ok()? as f64;
        return Some(if negative { -n } else { n });
    }
    // f64::from_str also takes "inf" and "nan", which are not numerals
    if !body.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let n: f64 = body.parse().ok()?;
    Some(if negative { -n } else { n })
}

impl VM {
    /// Number value of `v`, converting numeric text.
    pub fn coerce_number(&self, v: Value) -> Option<f64> {
        v.as_number().or_else(|| self.str_of(v).and_then(str_to_number))
    }

    /// Override handler for `event`, looked up on `a` then on `b`.
    fn operator_handler(&self, a: Value, b: Option<Value>, event: &str) -> Option<Value> {
        std::iter::once(a)
            .chain(b)
            .filter(|v| matches!(Operand::classify(&self.heap, *v), Operand::HandlerCarrying(_)))
            .map(|v| self.heap.metafield(v, event))
            .find(|h| !h.is_nil())
    }

    /// Calls `handler(args...)` and returns its first result.
    fn call_handler(&mut self, handler: Value, args: &[Value]) -> Result<Value, RuntimeError> {
        let top = self.stack_top;
        let result = self.push_and_call(handler, args);
        self.stack[top..self.stack_top.max(top)].fill(Value::nil());
        self.stack_top = top;
        result
    }

    fn push_and_call(&mut self, handler: Value, args: &[Value]) -> Result<Value, RuntimeError> {
        self.push(handler)?;
        for &arg in args {
            self.push(arg)?;
        }
        self.call(args.len(), 1)?;
        self.pop()
    }

    pub fn arith_values(&mut self, op: ArithOp, a: Value, b: Value) -> Result<Value, RuntimeError> {
        if let (Some(x), Some(y)) = (self.coerce_number(a), self.coerce_number(b)) {
            return Ok(Value::number(op.apply(x, y)));
        }
        match self.operator_handler(a, Some(b), op.event()) {
            Some(handler) => {
                trace!(event = op.event(), "arithmetic override");
                self.call_handler(handler, &[a, b])
            }
            None => Err(RuntimeError::Arithmetic),
        }
    }

    pub fn negate_value(&mut self, a: Value) -> Result<Value, RuntimeError> {
        if let Some(x) = self.coerce_number(a) {
            return Ok(Value::number(-x));
        }
        match self.operator_handler(a, None, "__unm") {
            Some(handler) => {
                trace!(event = "__unm", "arithmetic override");
                self.call_handler(handler, &[a])
            }
            None => Err(RuntimeError::Arithmetic),
        }
    }

    pub fn less_equal_values(&mut self, a: Value, b: Value) -> Result<bool, RuntimeError> {
        match (Operand::classify(&self.heap, a), Operand::classify(&self.heap, b)) {
            (Operand::Number(x), Operand::Number(y)) => return Ok(x <= y),
            (Operand::Text(x), Operand::Text(y)) => {
                // interned: equal handles are equal strings
                if x == y {
                    return Ok(true);
                }
                let lhs = self.heap.get_string(x);
                let rhs = self.heap.get_string(y);
                return match (lhs, rhs) {
                    (Some(l), Some(r)) => Ok(l <= r),
                    _ => Err(RuntimeError::Compare),
                };
            }
            _ => {}
        }

        if let Some(handler) = self.operator_handler(a, Some(b), "__le") {
            trace!(event = "__le", "comparison override");
            let res = self.call_handler(handler, &[a, b])?;
            return Ok(!res.is_falsey());
        }
        // a <= b  <=>  not (b < a)
        if let Some(handler) = self.operator_handler(a, Some(b), "__lt") {
            trace!(event = "__lt", "comparison override");
            let res = self.call_handler(handler, &[b, a])?;
            return Ok(res.is_falsey());
        }
        Err(RuntimeError::Compare)
    }

    /// Pushes `value_at(a) op value_at(b)`.
    pub fn arith(&mut self, op: ArithOp, a: i32, b: i32) -> Result<(), RuntimeError> {
        let va = self.value_at(a);
        let vb = self.value_at(b);
        let res = self.arith_values(op, va, vb)?;
        self.push(res)
    }

    /// Pushes `-value_at(a)`.
    pub fn negate(&mut self, a: i32) -> Result<(), RuntimeError> {
        let va = self.value_at(a);
        let res = self.negate_value(va)?;
        self.push(res)
    }

    pub fn less_equal(&mut self, a: i32, b: i32) -> Result<bool, RuntimeError> {
        let va = self.value_at(a);
        let vb = self.value_at(b);
        self.less_equal_values(va, vb)
    }
}

/// Register window reserved above `base` while a handler runs.
const REGISTER_WINDOW: usize = 256;

/// Trait for arithmetic instruction handlers
pub trait ArithmeticOps {
    fn handle_arithmetic(
        &mut self,
        op: OpCode,
        instruction: u32,
        base: usize,
    ) -> Result<(), RuntimeError>;
}

impl ArithmeticOps for VM {
    fn handle_arithmetic(
        &mut self,
        op: OpCode,
        instruction: u32,
        base: usize,
    ) -> Result<(), RuntimeError> {
        let a = decode_a(instruction) as usize;
        let b = decode_b(instruction) as usize;
        let c = decode_c(instruction) as usize;

        let vb = self.get_reg(base, b)?;
        let vc = self.get_reg(base, c)?;

        // Handlers push above the top; keep them clear of this frame's registers.
        let saved_top = self.stack_top;
        self.stack_top = self.stack_top.max(base + REGISTER_WINDOW);

        let result = match op {
            OpCode::Unm => self.negate_value(vb),
            OpCode::Le => self.less_equal_values(vb, vc).map(Value::bool),
            _ => match ArithOp::from_opcode(op) {
                Some(arith) => self.arith_values(arith, vb, vc),
                None => Err(RuntimeError::InvalidOpcode(op.as_u8())),
            },
        };

        self.stack_top = saved_top;
        self.set_reg(base, a, result?)
    }
}

use std::fmt;

// --- NaN-boxed u64 ---
// Any bit pattern outside the boxed range is an IEEE-754 double.
// Boxed values: bits 63..50 all set, bits 47..32 = tag, bits 31..0 = payload.

const BOX_MASK: u64 = 0xFFFC_0000_0000_0000;
const TAG_SHIFT: u32 = 32;
const TAG_MASK: u64 = 0xFFFF;
const PAYLOAD_MASK: u64 = 0xFFFF_FFFF;
const CANONICAL_NAN: u64 = 0x7FF8_0000_0000_0000;

pub const TAG_NIL: u64 = 1;
pub const TAG_FALSE: u64 = 2;
pub const TAG_TRUE: u64 = 3;
pub const TAG_STRING: u64 = 4;
pub const TAG_TABLE: u64 = 5;
pub const TAG_FUNCTION: u64 = 6;
pub const TAG_HANDLE: u64 = 7;
pub const TAG_COROUTINE: u64 = 8;
pub const TAG_ENV: u64 = 9;

// Number tag: reported by `type_tag` for unboxed doubles.
pub const TAG_NUMBER: u64 = 0;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Value(pub u64);

impl Value {
    // --- Constructors ---

    #[inline]
    pub fn number(n: f64) -> Self {
        if n.is_nan() {
            Value(CANONICAL_NAN)
        } else {
            Value(n.to_bits())
        }
    }

    #[inline]
    pub fn nil() -> Self {
        Value::boxed(TAG_NIL, 0)
    }

    #[inline]
    pub fn bool(b: bool) -> Self {
        if b {
            Value::boxed(TAG_TRUE, 0)
        } else {
            Value::boxed(TAG_FALSE, 0)
        }
    }

    #[inline]
    pub fn string(handle: u32) -> Self {
        Value::boxed(TAG_STRING, handle)
    }

    #[inline]
    pub fn table(handle: u32) -> Self {
        Value::boxed(TAG_TABLE, handle)
    }

    #[inline]
    pub fn function(handle: u32) -> Self {
        Value::boxed(TAG_FUNCTION, handle)
    }

    #[inline]
    pub fn handle(handle: u32) -> Self {
        Value::boxed(TAG_HANDLE, handle)
    }

    #[inline]
    pub fn coroutine(handle: u32) -> Self {
        Value::boxed(TAG_COROUTINE, handle)
    }

    #[inline]
    pub fn env(handle: u32) -> Self {
        Value::boxed(TAG_ENV, handle)
    }

    #[inline]
    fn boxed(tag: u64, payload: u32) -> Self {
        Value(BOX_MASK | (tag << TAG_SHIFT) | payload as u64)
    }

    // --- Checkers ---

    #[inline]
    pub fn is_number(&self) -> bool {
        self.0 & BOX_MASK != BOX_MASK
    }

    #[inline]
    pub fn type_tag(&self) -> u64 {
        if self.is_number() {
            TAG_NUMBER
        } else {
            (self.0 >> TAG_SHIFT) & TAG_MASK
        }
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        self.type_tag() == TAG_NIL
    }

    #[inline]
    pub fn is_bool(&self) -> bool {
        let t = self.type_tag();
        t == TAG_FALSE || t == TAG_TRUE
    }

    #[inline]
    pub fn is_string(&self) -> bool {
        self.type_tag() == TAG_STRING
    }

    #[inline]
    pub fn is_table(&self) -> bool {
        self.type_tag() == TAG_TABLE
    }

    #[inline]
    pub fn is_function(&self) -> bool {
        self.type_tag() == TAG_FUNCTION
    }

    #[inline]
    pub fn is_handle(&self) -> bool {
        self.type_tag() == TAG_HANDLE
    }

    #[inline]
    pub fn is_coroutine(&self) -> bool {
        self.type_tag() == TAG_COROUTINE
    }

    #[inline]
    pub fn is_env(&self) -> bool {
        self.type_tag() == TAG_ENV
    }

    /// Heap-backed values (everything carrying a handle payload).
    #[inline]
    pub fn is_obj(&self) -> bool {
        self.type_tag() >= TAG_STRING
    }

    #[inline]
    pub fn is_falsey(&self) -> bool {
        let t = self.type_tag();
        t == TAG_NIL || t == TAG_FALSE
    }

    // --- Accessors ---

    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        self.is_number().then(|| f64::from_bits(self.0))
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self.type_tag() {
            TAG_TRUE => Some(true),
            TAG_FALSE => Some(false),
            _ => None,
        }
    }

    #[inline]
    pub fn as_handle(&self) -> Option<u32> {
        if self.is_obj() {
            Some((self.0 & PAYLOAD_MASK) as u32)
        } else {
            None
        }
    }

    /// Primitive equality without override handlers: numbers compare
    /// numerically (`0 == -0`, NaN never equal), everything else by identity.
    /// Strings are interned, so identity is content equality.
    #[inline]
    pub fn raw_equal(&self, other: &Value) -> bool {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.0 == other.0,
            _ => false,
        }
    }

    /// The host-visible type name (`type(v)`).
    pub fn type_name(&self) -> &'static str {
        match self.type_tag() {
            TAG_NUMBER => "number",
            TAG_NIL => "nil",
            TAG_FALSE | TAG_TRUE => "boolean",
            TAG_STRING => "string",
            TAG_TABLE => "table",
            TAG_FUNCTION => "function",
            TAG_COROUTINE => "thread",
            TAG_HANDLE | TAG_ENV => "userdata",
            _ => "unknown",
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::nil()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.type_tag() {
            TAG_NUMBER => write!(f, "Number({})", f64::from_bits(self.0)),
            TAG_NIL => write!(f, "Nil"),
            TAG_FALSE => write!(f, "Bool(false)"),
            TAG_TRUE => write!(f, "Bool(true)"),
            TAG_STRING => write!(f, "String({})", self.0 & PAYLOAD_MASK),
            TAG_TABLE => write!(f, "Table({})", self.0 & PAYLOAD_MASK),
            TAG_FUNCTION => write!(f, "Function({})", self.0 & PAYLOAD_MASK),
            TAG_HANDLE => write!(f, "Handle({})", self.0 & PAYLOAD_MASK),
            TAG_COROUTINE => write!(f, "Coroutine({})", self.0 & PAYLOAD_MASK),
            TAG_ENV => write!(f, "Env({})", self.0 & PAYLOAD_MASK),
            _ => write!(f, "Unknown(Bits: {:x})", self.0),
        }
    }
}

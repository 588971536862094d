/// Represents a single native call frame.
///
/// Each frame tracks:
/// - `base`: stack slot of the first argument (stack index 1)
/// - `native`: index of the running native in `VM::natives`, `None` for the host frame
#[derive(Debug, Clone)]
pub struct CallFrame {
    pub base: usize,
    pub native: Option<u32>,
}

impl CallFrame {
    pub fn new(base: usize, native: Option<u32>) -> Self {
        Self { base, native }
    }

    pub fn host() -> Self {
        Self::new(0, None)
    }
}

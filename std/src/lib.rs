//! Standard library modules compiled to native code.
//!
//! Each module follows the same protocol as generated code: it registers
//! itself through `VM::register_library`, keeps its private state in closure
//! environments and performs arithmetic through the VM operator runtime.

pub mod base64;
pub mod bit32;

use tracing::debug;
use vm::{RuntimeError, VM};

/// Opens every module in this crate, leaving the stack as it was.
pub fn open_libs(vm: &mut VM) -> Result<(), RuntimeError> {
    let top = vm.top() as i32;
    bit32::open(vm)?;
    base64::open(vm)?;
    vm.set_top(top)?;
    debug!("opened native standard library");
    Ok(())
}

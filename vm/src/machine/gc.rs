use memory::Value;
use tracing::debug;

use super::vm::VM;

/// Trait for garbage collection operations
pub trait GarbageCollector {
    fn collect_garbage(&mut self);
    fn mark_roots(&self) -> Vec<Value>;

    /// Collects when over threshold (always in stress mode). Hosts call this
    /// at points where every live value is reachable from the roots.
    fn maybe_collect(&mut self) -> bool;
}

impl GarbageCollector for VM {
    fn maybe_collect(&mut self) -> bool {
        if self.stress_mode || self.heap.should_collect() {
            self.collect_garbage();
            true
        } else {
            false
        }
    }

    fn collect_garbage(&mut self) {
        let before = self.heap.bytes_allocated;

        let roots = self.mark_roots();
        self.heap.trace(roots);
        self.heap.sweep();

        // Dynamic Threshold: Double it or set reasonable limits
        self.heap.next_gc_threshold = std::cmp::max(
            self.heap.bytes_allocated * 2,
            1024 * 1024, // Min 1MB
        );
        debug!(before, stress = self.stress_mode, "collected garbage");
    }

    fn mark_roots(&self) -> Vec<Value> {
        let mut roots = Vec::new();

        // 1. Live stack
        roots.extend_from_slice(&self.stack[..self.stack_top]);

        // 2. Globals and registry (which holds _LOADED)
        roots.push(Value::table(self.globals));
        roots.push(Value::table(self.registry));

        // 3. Native upvalues (natives themselves are never freed)
        for native in &self.natives {
            roots.extend_from_slice(&native.upvalues);
        }

        roots
    }
}

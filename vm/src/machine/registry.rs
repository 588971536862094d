use crate::error::RuntimeError;
use crate::native::NativeFn;
use memory::Value;
use tracing::debug;

use super::vm::{LOADED_KEY, VM};

impl VM {
    /// The `_LOADED` table kept in the registry.
    fn loaded_table(&mut self) -> Result<Value, RuntimeError> {
        let loaded = self.registry_get(LOADED_KEY);
        if loaded.is_table() {
            return Ok(loaded);
        }
        let loaded = self.new_table(16);
        let key = self.intern(LOADED_KEY);
        self.raw_set(Value::table(self.registry), key, loaded)?;
        Ok(loaded)
    }

    /// Walks dotted `name` from the globals table, creating missing tables.
    /// The last component is pre-sized with `size_hint`.
    fn find_table(&mut self, name: &str, size_hint: usize) -> Result<Value, RuntimeError> {
        let mut current = Value::table(self.globals);
        let mut parts = name.split('.').peekable();
        while let Some(part) = parts.next() {
            let key = self.intern(part);
            let existing = self.raw_get(current, key);
            current = if existing.is_nil() {
                let hint = if parts.peek().is_some() { 1 } else { size_hint };
                let table = self.new_table(hint);
                self.raw_set(current, key, table)?;
                table
            } else if existing.is_table() {
                existing
            } else {
                return Err(RuntimeError::NameConflict(name.to_string()));
            };
        }
        Ok(current)
    }

    /// Returns the single table for module `name`, creating and recording it
    /// on first use. The table is also left on top of the stack.
    pub fn register_library(&mut self, name: &str, size_hint: usize) -> Result<Value, RuntimeError> {
        let loaded = self.loaded_table()?;
        let key = self.intern(name);
        let existing = self.raw_get(loaded, key);
        if existing.is_table() {
            self.push(existing)?;
            return Ok(existing);
        }

        let table = self.find_table(name, size_hint)?;
        self.raw_set(loaded, key, table)?;
        debug!(module = name, size_hint, "registered library");
        self.push(table)?;
        Ok(table)
    }

    /// Registers `name` and stores each function under its key.
    pub fn define_library(
        &mut self,
        name: &str,
        functions: &[(&str, NativeFn)],
    ) -> Result<Value, RuntimeError> {
        let table = self.register_library(name, functions.len())?;
        for &(key, func) in functions {
            let qualified = format!("{}.{}", name, key);
            let f = self.new_native(&qualified, func, Vec::new());
            let k = self.intern(key);
            self.raw_set(table, k, f)?;
        }
        Ok(table)
    }
}

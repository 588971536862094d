use crate::value::{Value, TAG_ENV, TAG_HANDLE, TAG_STRING, TAG_TABLE};
use std::any::Any;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct Arena<T> {
    pub data: Vec<T>,
    pub free_indices: Vec<u32>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            free_indices: Vec::new(),
        }
    }

    fn alloc(&mut self, item: T) -> u32 {
        if let Some(idx) = self.free_indices.pop() {
            self.data[idx as usize] = item;
            idx
        } else {
            let index = self.data.len() as u32;
            self.data.push(item);
            index
        }
    }

    pub fn is_free(&self, idx: u32) -> bool {
        self.free_indices.contains(&idx)
    }

    /// Number of live (not freed) entries.
    pub fn live(&self) -> usize {
        self.data.len() - self.free_indices.len()
    }
}

/// A hash-only table. Keys are normalized values (see `Table::normalize_key`).
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub hash: HashMap<Value, Value>,
    pub metatable: Option<u32>,
}

impl Table {
    pub fn with_capacity(size: usize) -> Self {
        Self {
            hash: HashMap::with_capacity(size),
            metatable: None,
        }
    }

    /// `-0` and `0` must address the same slot.
    #[inline]
    pub fn normalize_key(key: Value) -> Value {
        match key.as_number() {
            Some(n) if n == 0.0 => Value::number(0.0),
            _ => key,
        }
    }

    pub fn get(&self, key: Value) -> Value {
        self.hash
            .get(&Table::normalize_key(key))
            .copied()
            .unwrap_or_else(Value::nil)
    }

    /// Assigning nil removes the entry.
    pub fn set(&mut self, key: Value, value: Value) {
        let key = Table::normalize_key(key);
        if value.is_nil() {
            self.hash.remove(&key);
        } else {
            self.hash.insert(key, value);
        }
    }

    /// Length border: the largest `n` such that `t[1..=n]` are all non-nil.
    pub fn border(&self) -> usize {
        let mut n = 0;
        while self.hash.contains_key(&Value::number((n + 1) as f64)) {
            n += 1;
        }
        n
    }
}

/// Closure environment: slot 0 holds the parent environment (or nil at the
/// root), slots 1.. hold captured values.
#[derive(Debug, Clone)]
pub struct ClosureEnv {
    pub slots: Vec<Value>,
}

impl ClosureEnv {
    pub fn new(parent: Option<u32>) -> Self {
        let link = parent.map(Value::env).unwrap_or_else(Value::nil);
        Self { slots: vec![link] }
    }

    pub fn parent(&self) -> Option<u32> {
        self.slots
            .first()
            .filter(|v| v.is_env())
            .and_then(|v| v.as_handle())
    }

    pub fn get(&self, slot: usize) -> Value {
        self.slots.get(slot).copied().unwrap_or_else(Value::nil)
    }

    pub fn set(&mut self, slot: usize, value: Value) {
        if slot >= self.slots.len() {
            self.slots.resize(slot + 1, Value::nil());
        }
        self.slots[slot] = value;
    }
}

/// Opaque host object with an optional metatable.
pub struct Userdata {
    pub metatable: Option<u32>,
    pub payload: Box<dyn Any>,
}

pub struct Heap {
    // Typed Arenas
    /// Byte strings; contents need not be UTF-8.
    pub strings: Arena<Vec<u8>>,
    pub tables: Arena<Table>,
    pub envs: Arena<ClosureEnv>,
    pub userdata: Arena<Option<Userdata>>,

    // Interned string contents -> handle
    pub interned: HashMap<Vec<u8>, u32>,

    // Mark State (One set per arena type)
    pub marked_strings: HashSet<u32>,
    pub marked_tables: HashSet<u32>,
    pub marked_envs: HashSet<u32>,
    pub marked_userdata: HashSet<u32>,

    // GC Metrics
    pub bytes_allocated: usize,
    pub next_gc_threshold: usize,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Heap {
    pub fn new() -> Self {
        Self {
            strings: Arena::new(),
            tables: Arena::new(),
            envs: Arena::new(),
            userdata: Arena::new(),

            interned: HashMap::new(),

            marked_strings: HashSet::new(),
            marked_tables: HashSet::new(),
            marked_envs: HashSet::new(),
            marked_userdata: HashSet::new(),

            bytes_allocated: 0,
            next_gc_threshold: 1024 * 1024, // Start at 1MB
        }
    }

    pub fn should_collect(&self) -> bool {
        self.bytes_allocated > self.next_gc_threshold
    }

    // --- Strings ---

    /// Returns the handle of the interned copy of `s`, allocating on first use.
    pub fn intern(&mut self, s: &str) -> u32 {
        self.intern_bytes(s.as_bytes())
    }

    pub fn intern_bytes(&mut self, bytes: &[u8]) -> u32 {
        if let Some(&handle) = self.interned.get(bytes) {
            return handle;
        }
        self.bytes_allocated += bytes.len();
        let handle = self.strings.alloc(bytes.to_vec());
        self.interned.insert(bytes.to_vec(), handle);
        handle
    }

    /// Handle of `s` only if it was already interned.
    pub fn find_interned(&self, s: &str) -> Option<u32> {
        self.interned.get(s.as_bytes()).copied()
    }

    pub fn get_string(&self, index: u32) -> Option<&[u8]> {
        self.strings.data.get(index as usize).map(Vec::as_slice)
    }

    pub fn is_string_free(&self, index: u32) -> bool {
        self.strings.is_free(index)
    }

    // --- Tables ---

    pub fn alloc_table(&mut self, size_hint: usize) -> u32 {
        self.bytes_allocated += std::mem::size_of::<Table>() + size_hint * 16;
        self.tables.alloc(Table::with_capacity(size_hint))
    }

    pub fn get_table(&self, index: u32) -> Option<&Table> {
        self.tables.data.get(index as usize)
    }

    pub fn get_table_mut(&mut self, index: u32) -> Option<&mut Table> {
        self.tables.data.get_mut(index as usize)
    }

    pub fn is_table_free(&self, index: u32) -> bool {
        self.tables.is_free(index)
    }

    // --- Closure environments ---

    pub fn alloc_env(&mut self, parent: Option<u32>) -> u32 {
        self.bytes_allocated += std::mem::size_of::<ClosureEnv>();
        self.envs.alloc(ClosureEnv::new(parent))
    }

    pub fn get_env(&self, index: u32) -> Option<&ClosureEnv> {
        self.envs.data.get(index as usize)
    }

    pub fn get_env_mut(&mut self, index: u32) -> Option<&mut ClosureEnv> {
        self.envs.data.get_mut(index as usize)
    }

    pub fn is_env_free(&self, index: u32) -> bool {
        self.envs.is_free(index)
    }

    /// New environment linked to `parent` through slot 0.
    pub fn new_env(&mut self, parent: Option<u32>) -> u32 {
        self.alloc_env(parent)
    }

    /// Follows `level` parent links starting at `env`.
    fn env_at_level(&self, env: u32, level: usize) -> Option<u32> {
        let mut current = env;
        for _ in 0..level {
            current = self.get_env(current)?.parent()?;
        }
        Some(current)
    }

    /// Reads `slot` of the environment `level` links above `env`.
    pub fn env_get(&self, env: u32, level: usize, slot: usize) -> Value {
        let target = self.env_at_level(env, level);
        debug_assert!(target.is_some(), "env level {level} exceeds chain depth");
        target
            .and_then(|e| self.get_env(e))
            .map(|e| e.get(slot))
            .unwrap_or_else(Value::nil)
    }

    pub fn env_set(&mut self, env: u32, level: usize, slot: usize, value: Value) {
        let target = self.env_at_level(env, level);
        debug_assert!(target.is_some(), "env level {level} exceeds chain depth");
        if let Some(e) = target.and_then(|e| self.get_env_mut(e)) {
            e.set(slot, value);
        }
    }

    // --- Userdata ---

    pub fn alloc_userdata(&mut self, payload: Box<dyn Any>, metatable: Option<u32>) -> u32 {
        self.bytes_allocated += std::mem::size_of::<Userdata>();
        self.userdata.alloc(Some(Userdata { metatable, payload }))
    }

    pub fn get_userdata(&self, index: u32) -> Option<&Userdata> {
        self.userdata.data.get(index as usize).and_then(|u| u.as_ref())
    }

    // --- Metatables ---

    /// Metatable carried by `v`, if any. Only tables and opaque handles carry one.
    pub fn metatable_of(&self, v: Value) -> Option<u32> {
        let handle = v.as_handle()?;
        match v.type_tag() {
            TAG_TABLE => self.get_table(handle)?.metatable,
            TAG_HANDLE => self.get_userdata(handle)?.metatable,
            _ => None,
        }
    }

    pub fn set_metatable(&mut self, v: Value, metatable: Option<u32>) -> bool {
        let Some(handle) = v.as_handle() else {
            return false;
        };
        match v.type_tag() {
            TAG_TABLE => match self.get_table_mut(handle) {
                Some(t) => {
                    t.metatable = metatable;
                    true
                }
                None => false,
            },
            TAG_HANDLE => match self.userdata.data.get_mut(handle as usize) {
                Some(Some(u)) => {
                    u.metatable = metatable;
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// Raw read of `event` in the metatable of `v`; nil when absent.
    pub fn metafield(&self, v: Value, event: &str) -> Value {
        let Some(mt) = self.metatable_of(v) else {
            return Value::nil();
        };
        // An event name that was never interned cannot be a key anywhere.
        let Some(key) = self.find_interned(event) else {
            return Value::nil();
        };
        self.get_table(mt)
            .map(|t| t.get(Value::string(key)))
            .unwrap_or_else(Value::nil)
    }

    // --- Collection ---

    /// Mark phase: everything reachable from `roots`.
    pub fn trace(&mut self, roots: Vec<Value>) {
        let mut worklist = roots;

        while let Some(val) = worklist.pop() {
            let Some(handle) = val.as_handle() else {
                continue;
            };

            match val.type_tag() {
                TAG_STRING => {
                    self.marked_strings.insert(handle);
                }
                TAG_TABLE => {
                    if self.marked_tables.insert(handle) {
                        if let Some(t) = self.tables.data.get(handle as usize) {
                            for (k, v) in t.hash.iter() {
                                worklist.push(*k);
                                worklist.push(*v);
                            }
                            if let Some(mt) = t.metatable {
                                worklist.push(Value::table(mt));
                            }
                        }
                    }
                }
                TAG_ENV => {
                    if self.marked_envs.insert(handle) {
                        if let Some(env) = self.envs.data.get(handle as usize) {
                            worklist.extend(env.slots.iter().copied());
                        }
                    }
                }
                TAG_HANDLE => {
                    if self.marked_userdata.insert(handle) {
                        if let Some(mt) = self.get_userdata(handle).and_then(|u| u.metatable) {
                            worklist.push(Value::table(mt));
                        }
                    }
                }
                // functions are owned by the VM, coroutines by the scheduler
                _ => {}
            }
        }
    }

    pub fn sweep(&mut self) {
        // Strings
        for i in 0..self.strings.data.len() {
            let idx = i as u32;
            if !self.marked_strings.contains(&idx) && !self.strings.free_indices.contains(&idx) {
                let s = std::mem::take(&mut self.strings.data[i]);
                self.interned.remove(&s);
                self.strings.free_indices.push(idx);
            }
        }
        self.marked_strings.clear();

        // Tables
        for i in 0..self.tables.data.len() {
            let idx = i as u32;
            if !self.marked_tables.contains(&idx) && !self.tables.free_indices.contains(&idx) {
                self.tables.free_indices.push(idx);
                self.tables.data[i] = Table::default();
            }
        }
        self.marked_tables.clear();

        // Environments
        for i in 0..self.envs.data.len() {
            let idx = i as u32;
            if !self.marked_envs.contains(&idx) && !self.envs.free_indices.contains(&idx) {
                self.envs.free_indices.push(idx);
                self.envs.data[i] = ClosureEnv::new(None);
            }
        }
        self.marked_envs.clear();

        // Userdata
        for i in 0..self.userdata.data.len() {
            let idx = i as u32;
            if !self.marked_userdata.contains(&idx) && !self.userdata.free_indices.contains(&idx) {
                self.userdata.free_indices.push(idx);
                self.userdata.data[i] = None;
            }
        }
        self.marked_userdata.clear();

        self.bytes_allocated = 0;
    }
}

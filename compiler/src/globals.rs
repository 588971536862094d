//! Whole-unit tracking of global assignments.
//!
//! A global is only a builtin candidate while nothing in the compilation
//! unit assigns to it. The pass is flow-insensitive: an assignment anywhere,
//! in any nested block or function, before or after a use, disqualifies
//! every use.

use std::collections::HashMap;
use tidal_syntax::ast::{Expr, Program, Stmt};
use tidal_syntax::visit::Visitor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalState {
    /// Referenced, never assigned in this unit.
    Default,
    /// Declared replaceable by the host.
    Mutable,
    /// Assigned somewhere in this unit.
    Written,
}

/// Names the host can always swap out from under compiled code.
const ALWAYS_MUTABLE: &[&str] = &["_G"];

#[derive(Debug, Default)]
pub struct GlobalTracker {
    states: HashMap<String, GlobalState>,
}

impl GlobalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker with `_G` and every name in `mutable` preset to `Mutable`.
    pub fn with_mutable<S: AsRef<str>>(mutable: &[S]) -> Self {
        let mut tracker = Self::new();
        let names = ALWAYS_MUTABLE
            .iter()
            .copied()
            .chain(mutable.iter().map(AsRef::as_ref));
        for name in names {
            tracker
                .states
                .insert(name.to_string(), GlobalState::Mutable);
        }
        tracker
    }

    /// Creates a `Default` entry if `name` is not yet known.
    pub fn declare(&mut self, name: &str) {
        if !self.states.contains_key(name) {
            self.states.insert(name.to_string(), GlobalState::Default);
        }
    }

    /// Permanently marks `name` as assigned. `Mutable` stays `Mutable`.
    pub fn mark_written(&mut self, name: &str) {
        let state = self
            .states
            .entry(name.to_string())
            .or_insert(GlobalState::Default);
        if *state == GlobalState::Default {
            *state = GlobalState::Written;
        }
    }

    pub fn state_of(&self, name: &str) -> Option<GlobalState> {
        self.states.get(name).copied()
    }

    /// Records every global referenced or assigned in `program`.
    pub fn track_program(&mut self, program: &Program) {
        GlobalPass { tracker: self }.visit_program(program);
    }
}

struct GlobalPass<'t> {
    tracker: &'t mut GlobalTracker,
}

impl GlobalPass<'_> {
    fn assign(&mut self, target: &Expr) {
        if let Expr::Global { name, .. } = target {
            self.tracker.mark_written(name);
        }
    }
}

impl<'ast> Visitor<'ast> for GlobalPass<'_> {
    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        match stmt {
            Stmt::Assign { targets, .. } => {
                for t in targets {
                    self.assign(t);
                }
            }
            Stmt::CompoundAssign { target, .. } | Stmt::Function { target, .. } => {
                self.assign(target)
            }
            _ => {}
        }
        self.super_stmt(stmt);
    }

    fn visit_expr(&mut self, expr: &'ast Expr) {
        if let Expr::Global { name, .. } = expr {
            self.tracker.declare(name);
        }
        self.super_expr(expr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidal_syntax::parse_program;

    fn track(source: &str) -> GlobalTracker {
        let program = parse_program(source).unwrap();
        let mut tracker = GlobalTracker::new();
        tracker.track_program(&program);
        tracker
    }

    #[test]
    fn test_declare_and_write() {
        let mut t = GlobalTracker::new();
        assert_eq!(t.state_of("math"), None);
        t.declare("math");
        assert_eq!(t.state_of("math"), Some(GlobalState::Default));
        t.mark_written("math");
        t.declare("math");
        assert_eq!(t.state_of("math"), Some(GlobalState::Written));
        t.mark_written("math");
        assert_eq!(t.state_of("math"), Some(GlobalState::Written));
    }

    #[test]
    fn test_mutable_is_never_default() {
        let mut t = GlobalTracker::with_mutable(&["game"]);
        t.declare("game");
        t.mark_written("game");
        assert_eq!(t.state_of("game"), Some(GlobalState::Mutable));
        assert_eq!(t.state_of("_G"), Some(GlobalState::Mutable));
    }

    #[test]
    fn test_references_are_declared() {
        let t = track("print(math.pi)");
        assert_eq!(t.state_of("print"), Some(GlobalState::Default));
        assert_eq!(t.state_of("math"), Some(GlobalState::Default));
        assert_eq!(t.state_of("pi"), None);
    }

    #[test]
    fn test_assignment_anywhere_marks_written() {
        let t = track(
            "local r = math.sqrt(4)\n\
             local function later()\n  if cond then math = {} end\nend",
        );
        assert_eq!(t.state_of("math"), Some(GlobalState::Written));
        assert_eq!(t.state_of("cond"), Some(GlobalState::Default));
    }

    #[test]
    fn test_compound_and_function_statements_write() {
        let t = track("count += 1\nfunction helper() end\nfunction lib.f() end");
        assert_eq!(t.state_of("count"), Some(GlobalState::Written));
        assert_eq!(t.state_of("helper"), Some(GlobalState::Written));
        // member definitions do not touch the namespace binding
        assert_eq!(t.state_of("lib"), Some(GlobalState::Default));
    }

    #[test]
    fn test_member_assignment_is_not_tracked() {
        let t = track("table.insert = nil");
        assert_eq!(t.state_of("table"), Some(GlobalState::Default));
    }

    #[test]
    fn test_local_assignment_leaves_globals_alone() {
        let t = track("local math = 1\nmath = 2");
        assert_eq!(t.state_of("math"), None);
    }
}

//! Per-local facts used to see through aliases such as `local m = math`.

use std::collections::HashMap;
use tidal_syntax::ast::{Expr, LocalId, Program, Stmt};
use tidal_syntax::visit::Visitor;

/// What is known about one local binding.
#[derive(Debug, Clone, Copy, Default)]
pub struct Variable<'a> {
    /// Initializer expression, when the binding received exactly one.
    pub init: Option<&'a Expr>,
    /// Reassigned anywhere after declaration.
    pub written: bool,
}

impl Variable<'_> {
    /// A binding that still holds its initializer everywhere it is read.
    pub fn is_stable(&self) -> bool {
        !self.written
    }
}

#[derive(Debug, Default)]
pub struct VariableTracker<'a> {
    vars: HashMap<LocalId, Variable<'a>>,
}

impl<'a> VariableTracker<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info_of(&self, id: LocalId) -> Option<&Variable<'a>> {
        self.vars.get(&id)
    }

    pub fn track_program(&mut self, program: &'a Program) {
        VariablePass { tracker: self }.visit_program(program);
    }

    fn declare(&mut self, id: LocalId, init: Option<&'a Expr>) {
        self.vars.insert(id, Variable { init, written: false });
    }

    fn mark_written(&mut self, id: LocalId) {
        self.vars.entry(id).or_default().written = true;
    }
}

struct VariablePass<'t, 'a> {
    tracker: &'t mut VariableTracker<'a>,
}

impl VariablePass<'_, '_> {
    fn assign(&mut self, target: &Expr) {
        if let Expr::Local { local, .. } = target {
            self.tracker.mark_written(*local);
        }
    }
}

impl<'a> Visitor<'a> for VariablePass<'_, 'a> {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::Local { vars, values, .. } => {
                // a trailing call or `...` spreads over the remaining names,
                // which therefore have no single initializer
                let spread_from = match values.last() {
                    Some(last) if last.is_multi_value() => values.len() - 1,
                    _ => usize::MAX,
                };
                for (i, &id) in vars.iter().enumerate() {
                    let init = if i < spread_from { values.get(i) } else { None };
                    self.tracker.declare(id, init);
                }
            }
            Stmt::LocalFunction { var, func, .. } => self.tracker.declare(*var, Some(func)),
            Stmt::NumericFor { var, .. } => self.tracker.declare(*var, None),
            Stmt::GenericFor { vars, .. } => {
                for &id in vars {
                    self.tracker.declare(id, None);
                }
            }
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

    fn visit_expr(&mut self, expr: &'a Expr) {
        if let Expr::Function { params, .. } = expr {
            for &id in params {
                self.tracker.declare(id, None);
            }
        }
        self.super_expr(expr);
    }
}

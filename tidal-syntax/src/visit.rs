//! Read-only AST traversal.
//!
//! Each `visit_X` method has a matching `super_X` method that performs the
//! default recursive walk. Override `visit_X` for custom behavior and call
//! `super_X` to continue into children. The `'ast` lifetime lets passes keep
//! references into the tree they walk.

use crate::ast::{Block, Expr, Program, Stmt, TableItem};

pub trait Visitor<'ast>: Sized {
    fn visit_program(&mut self, program: &'ast Program) {
        self.visit_block(&program.body);
    }

    fn visit_block(&mut self, block: &'ast Block) {
        self.super_block(block);
    }

    fn super_block(&mut self, block: &'ast Block) {
        for stmt in &block.stmts {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        self.super_stmt(stmt);
    }

    fn super_stmt(&mut self, stmt: &'ast Stmt) {
        match stmt {
            Stmt::Local { values, .. } => {
                for v in values {
                    self.visit_expr(v);
                }
            }
            Stmt::LocalFunction { func, .. } => self.visit_expr(func),
            Stmt::Function { target, func, .. } => {
                self.visit_expr(target);
                self.visit_expr(func);
            }
            Stmt::Assign {
                targets, values, ..
            } => {
                for t in targets {
                    self.visit_expr(t);
                }
                for v in values {
                    self.visit_expr(v);
                }
            }
            Stmt::CompoundAssign { target, value, .. } => {
                self.visit_expr(target);
                self.visit_expr(value);
            }
            Stmt::Expr(e) => self.visit_expr(e),
            Stmt::Do(block) => self.visit_block(block),
            Stmt::If {
                branches,
                else_block,
                ..
            } => {
                for (cond, block) in branches {
                    self.visit_expr(cond);
                    self.visit_block(block);
                }
                if let Some(block) = else_block {
                    self.visit_block(block);
                }
            }
            Stmt::While {
                condition, body, ..
            } => {
                self.visit_expr(condition);
                self.visit_block(body);
            }
            Stmt::Repeat {
                body, condition, ..
            } => {
                self.visit_block(body);
                self.visit_expr(condition);
            }
            Stmt::NumericFor {
                start,
                limit,
                step,
                body,
                ..
            } => {
                self.visit_expr(start);
                self.visit_expr(limit);
                if let Some(step) = step {
                    self.visit_expr(step);
                }
                self.visit_block(body);
            }
            Stmt::GenericFor { values, body, .. } => {
                for v in values {
                    self.visit_expr(v);
                }
                self.visit_block(body);
            }
            Stmt::Return { values, .. } => {
                for v in values {
                    self.visit_expr(v);
                }
            }
            Stmt::Break { .. } => {}
        }
    }

    fn visit_expr(&mut self, expr: &'ast Expr) {
        self.super_expr(expr);
    }

    fn super_expr(&mut self, expr: &'ast Expr) {
        match expr {
            Expr::Nil { .. }
            | Expr::Bool { .. }
            | Expr::Number { .. }
            | Expr::Str { .. }
            | Expr::Varargs { .. }
            | Expr::Local { .. }
            | Expr::Global { .. } => {}
            Expr::IndexName { object, .. } => self.visit_expr(object),
            Expr::IndexExpr { object, index, .. } => {
                self.visit_expr(object);
                self.visit_expr(index);
            }
            Expr::Call { callee, args, .. } => {
                self.visit_expr(callee);
                for a in args {
                    self.visit_expr(a);
                }
            }
            Expr::Function { body, .. } => self.visit_block(body),
            Expr::Table { items, .. } => {
                for item in items {
                    match item {
                        TableItem::Positional(v) | TableItem::Named(_, v) => self.visit_expr(v),
                        TableItem::Keyed(k, v) => {
                            self.visit_expr(k);
                            self.visit_expr(v);
                        }
                    }
                }
            }
            Expr::Unary { operand, .. } => self.visit_expr(operand),
            Expr::Binary { lhs, rhs, .. } => {
                self.visit_expr(lhs);
                self.visit_expr(rhs);
            }
            Expr::Group { inner, .. } => self.visit_expr(inner),
        }
    }
}

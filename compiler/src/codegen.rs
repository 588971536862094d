use crate::builtins::{builtin_function_id, resolve_builtin, Builtin};
use crate::error::CompilerError;
use crate::globals::GlobalTracker;
use crate::options::CompileOptions;
use crate::variables::VariableTracker;
use tidal_syntax::ast::{Block, Expr, Program, Stmt, TableItem};
use tidal_syntax::parse_program;
use tracing::debug;
use vm::opcode::{instruction::encode_abc, OpCode};
use vm::BuiltinFunction;

/// How one call site is lowered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallLowering {
    /// `FASTCALL` with this builtin, then the generic `CALL` as fallback.
    FastCall(BuiltinFunction),
    /// Generic `CALL` only.
    Generic,
}

/// Lowering decision for one call expression, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub line: usize,
    pub builtin: Builtin,
    pub lowering: CallLowering,
}

/// Result of compiling one unit.
#[derive(Debug, Clone, Default)]
pub struct CompiledUnit {
    pub bytecode: Vec<u32>,
    pub call_sites: Vec<CallSite>,
}

impl CompiledUnit {
    pub fn fast_calls(&self) -> impl Iterator<Item = BuiltinFunction> + '_ {
        self.call_sites.iter().filter_map(|s| match s.lowering {
            CallLowering::FastCall(b) => Some(b),
            CallLowering::Generic => None,
        })
    }
}

/// Results a call must leave in its function register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Want {
    None,
    One,
    All,
}

impl Want {
    /// `C` operand of `CALL`: result count plus one, 0 for all.
    fn call_c(self) -> u8 {
        match self {
            Want::None => 1,
            Want::One => 2,
            Want::All => 0,
        }
    }
}

/// Highest register index a frame may use.
const MAX_REGISTER: usize = u8::MAX as usize;

pub struct Compiler {
    pub options: CompileOptions,
    pub bytecode: Vec<u32>,
    pub call_sites: Vec<CallSite>,

    // Simple register allocator state
    pub reg_top: u8,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(CompileOptions::default())
    }
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            bytecode: Vec::new(),
            call_sites: Vec::new(),
            reg_top: 0,
        }
    }

    pub fn compile(&mut self, source: &str) -> Result<CompiledUnit, CompilerError> {
        let program = parse_program(source)?;
        self.compile_program(&program)
    }

    /// Lowers every call in `program`. The trackers live only for this call.
    pub fn compile_program(&mut self, program: &Program) -> Result<CompiledUnit, CompilerError> {
        self.bytecode.clear();
        self.call_sites.clear();
        self.reg_top = 0;

        let mut globals = GlobalTracker::with_mutable(&self.options.mutable_globals);
        globals.track_program(program);
        let mut variables = VariableTracker::new();
        variables.track_program(program);

        let mut pass = LoweringPass {
            compiler: self,
            globals: &globals,
            variables: &variables,
        };
        pass.lower_block(&program.body)?;

        self.emit_abc(OpCode::Return, 0, 1, 0);
        Ok(CompiledUnit {
            bytecode: std::mem::take(&mut self.bytecode),
            call_sites: std::mem::take(&mut self.call_sites),
        })
    }

    /// Lowering for a call whose callee resolved to `builtin`.
    pub fn lowering_for(&self, builtin: &Builtin, method: bool) -> CallLowering {
        if method || !self.options.fast_calls_enabled() {
            return CallLowering::Generic;
        }
        match builtin_function_id(builtin, &self.options) {
            Some(b) => CallLowering::FastCall(b),
            None => CallLowering::Generic,
        }
    }

    /// Emits `[FASTCALL id] CALL func nargs want`.
    ///
    /// `nargs` of `None` means the arguments run to the top of the stack.
    pub fn emit_call(&mut self, lowering: CallLowering, func: u8, nargs: Option<u8>, results: u8) {
        if let CallLowering::FastCall(builtin) = lowering {
            self.emit_abc(OpCode::FastCall, builtin.as_u8(), 0, 0);
        }
        let b = nargs.map_or(0, |n| n + 1);
        self.emit_abc(OpCode::Call, func, b, results);
    }

    fn emit_abc(&mut self, op: OpCode, a: u8, b: u8, c: u8) {
        self.bytecode.push(encode_abc(op.as_u8(), a, b, c));
    }
}

struct LoweringPass<'c, 'a> {
    compiler: &'c mut Compiler,
    globals: &'c GlobalTracker,
    variables: &'c VariableTracker<'a>,
}

impl LoweringPass<'_, '_> {
    fn lower_block(&mut self, block: &Block) -> Result<(), CompilerError> {
        for stmt in &block.stmts {
            let saved = self.compiler.reg_top;
            self.lower_stmt(stmt)?;
            self.compiler.reg_top = saved;
        }
        Ok(())
    }

    fn lower_stmt(&mut self, stmt: &Stmt) -> Result<(), CompilerError> {
        match stmt {
            Stmt::Expr(e) => self.lower_expr(e, Want::None),
            Stmt::Local { values, .. } => self.lower_list(values),
            Stmt::LocalFunction { func, .. } => self.lower_expr(func, Want::One),
            Stmt::Function { target, func, .. } => {
                self.lower_expr(target, Want::One)?;
                self.lower_expr(func, Want::One)
            }
            Stmt::Assign {
                targets, values, ..
            } => {
                for t in targets {
                    self.lower_expr(t, Want::One)?;
                }
                self.lower_list(values)
            }
            Stmt::CompoundAssign { target, value, .. } => {
                self.lower_expr(target, Want::One)?;
                self.lower_expr(value, Want::One)
            }
            Stmt::Do(block) => self.lower_block(block),
            Stmt::If {
                branches,
                else_block,
                ..
            } => {
                for (cond, block) in branches {
                    self.lower_expr(cond, Want::One)?;
                    self.lower_block(block)?;
                }
                match else_block {
                    Some(block) => self.lower_block(block),
                    None => Ok(()),
                }
            }
            Stmt::While {
                condition, body, ..
            } => {
                self.lower_expr(condition, Want::One)?;
                self.lower_block(body)
            }
            Stmt::Repeat {
                body, condition, ..
            } => {
                self.lower_block(body)?;
                self.lower_expr(condition, Want::One)
            }
            Stmt::NumericFor {
                start,
                limit,
                step,
                body,
                ..
            } => {
                self.lower_expr(start, Want::One)?;
                self.lower_expr(limit, Want::One)?;
                if let Some(step) = step {
                    self.lower_expr(step, Want::One)?;
                }
                self.lower_block(body)
            }
            Stmt::GenericFor { values, body, .. } => {
                self.lower_list(values)?;
                self.lower_block(body)
            }
            Stmt::Return { values, .. } => self.lower_list(values),
            Stmt::Break { .. } => Ok(()),
        }
    }

    /// Expression list where a trailing call keeps all of its results.
    fn lower_list(&mut self, exprs: &[Expr]) -> Result<(), CompilerError> {
        for (i, e) in exprs.iter().enumerate() {
            let want = if i + 1 == exprs.len() { Want::All } else { Want::One };
            self.lower_expr(e, want)?;
        }
        Ok(())
    }

    fn lower_expr(&mut self, expr: &Expr, want: Want) -> Result<(), CompilerError> {
        match expr {
            Expr::Call {
                callee,
                args,
                method,
                span,
            } => self.lower_call(callee, args, *method, want, span.line),
            Expr::IndexName { object, .. } => self.lower_expr(object, Want::One),
            Expr::IndexExpr { object, index, .. } => {
                self.lower_expr(object, Want::One)?;
                self.lower_expr(index, Want::One)
            }
            Expr::Function { body, .. } => {
                // a function body gets its own register frame
                let saved = self.compiler.reg_top;
                self.compiler.reg_top = 0;
                let result = self.lower_block(body);
                self.compiler.reg_top = saved;
                result
            }
            Expr::Table { items, .. } => {
                for item in items {
                    match item {
                        TableItem::Positional(v) | TableItem::Named(_, v) => {
                            self.lower_expr(v, Want::One)?
                        }
                        TableItem::Keyed(k, v) => {
                            self.lower_expr(k, Want::One)?;
                            self.lower_expr(v, Want::One)?;
                        }
                    }
                }
                Ok(())
            }
            Expr::Unary { operand, .. } => self.lower_expr(operand, Want::One),
            Expr::Binary { lhs, rhs, .. } => {
                self.lower_expr(lhs, Want::One)?;
                self.lower_expr(rhs, Want::One)
            }
            Expr::Group { inner, .. } => self.lower_expr(inner, Want::One),
            _ => Ok(()),
        }
    }

    fn lower_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        method: bool,
        want: Want,
        line: usize,
    ) -> Result<(), CompilerError> {
        let func = self.compiler.reg_top;
        // a method call also passes the receiver
        let nargs = args.len() + usize::from(method);
        if func as usize + nargs > MAX_REGISTER || nargs >= MAX_REGISTER {
            return Err(CompilerError::RegisterOverflow { line });
        }

        self.lower_expr(callee, Want::One)?;
        for (i, arg) in args.iter().enumerate() {
            self.compiler.reg_top = func + 1 + usize::from(method) as u8 + i as u8;
            let arg_want = if i + 1 == args.len() { Want::All } else { Want::One };
            self.lower_expr(arg, arg_want)?;
        }
        self.compiler.reg_top = func;

        let variadic = args.last().is_some_and(Expr::is_multi_value);
        let nargs = if variadic { None } else { Some(nargs as u8) };

        let builtin = resolve_builtin(callee, self.globals, self.variables);
        let lowering = self.compiler.lowering_for(&builtin, method);
        if let CallLowering::FastCall(b) = lowering {
            debug!(builtin = b.name(), line, "lowering call to fast call");
        }
        self.compiler.emit_call(lowering, func, nargs, want.call_c());
        self.compiler.call_sites.push(CallSite {
            line,
            builtin,
            lowering,
        });
        Ok(())
    }
}

//! Statements and control-flow signals
//!
//! `break`, `continue` and `return` are not errors: they travel as
//! [`Signal`] results up through statement execution until the matching
//! construct consumes them. A signal that escapes a function boundary is a
//! fatal error; a `return` that reaches the top of a script simply
//! truncates it.
//!
//! Loop statements call [`Env::check_interrupt`] at every back-edge, which
//! is where the cooperative timeout unwinds from.

use crate::core::value::{Symbol, Val};
use crate::interp::env::Env;
use crate::interp::error::EngineError;
use crate::interp::expr::ExprNode;

/// Distinguished result of one statement.
#[derive(Debug)]
pub enum Signal {
    Next,
    Break,
    Continue,
    Return(Val),
}

pub trait Stmt: std::fmt::Debug {
    fn execute(&self, env: &mut Env) -> Result<Signal, EngineError>;
}

pub type StmtNode = Box<dyn Stmt>;

#[derive(Debug)]
pub struct BlockStmt(pub Vec<StmtNode>);

impl Stmt for BlockStmt {
    fn execute(&self, env: &mut Env) -> Result<Signal, EngineError> {
        for stmt in &self.0 {
            match stmt.execute(env)? {
                Signal::Next => {}
                signal => return Ok(signal),
            }
        }
        Ok(Signal::Next)
    }
}

#[derive(Debug)]
pub struct ExprStmt(pub ExprNode);

impl Stmt for ExprStmt {
    fn execute(&self, env: &mut Env) -> Result<Signal, EngineError> {
        self.0.eval(env)?;
        Ok(Signal::Next)
    }
}

/// Render each value into the environment's output sink.
#[derive(Debug)]
pub struct EchoStmt(pub Vec<ExprNode>);

impl Stmt for EchoStmt {
    fn execute(&self, env: &mut Env) -> Result<Signal, EngineError> {
        for expr in &self.0 {
            let value = expr.eval(env)?;
            env.write_value(&value)?;
        }
        Ok(Signal::Next)
    }
}

#[derive(Debug)]
pub struct IfStmt {
    pub cond: ExprNode,
    pub then_branch: StmtNode,
    pub else_branch: Option<StmtNode>,
}

impl Stmt for IfStmt {
    fn execute(&self, env: &mut Env) -> Result<Signal, EngineError> {
        if self.cond.eval(env)?.to_bool() {
            self.then_branch.execute(env)
        } else if let Some(else_branch) = &self.else_branch {
            else_branch.execute(env)
        } else {
            Ok(Signal::Next)
        }
    }
}

#[derive(Debug)]
pub struct WhileStmt {
    pub cond: ExprNode,
    pub body: StmtNode,
}

impl Stmt for WhileStmt {
    fn execute(&self, env: &mut Env) -> Result<Signal, EngineError> {
        loop {
            env.check_interrupt()?;
            if !self.cond.eval(env)?.to_bool() {
                return Ok(Signal::Next);
            }
            match self.body.execute(env)? {
                Signal::Next | Signal::Continue => {}
                Signal::Break => return Ok(Signal::Next),
                signal @ Signal::Return(_) => return Ok(signal),
            }
        }
    }
}

/// `foreach ($array as [$key =>] $value) body`, by value or by reference.
///
/// By value iterates a snapshot, so mutations inside the body never affect
/// the traversal. By reference binds the value variable to each entry's
/// cell in turn and leaves the last binding in place afterwards.
#[derive(Debug)]
pub struct ForeachStmt {
    pub array: ExprNode,
    pub key_var: Option<Symbol>,
    pub value_var: Symbol,
    pub by_ref: bool,
    pub body: StmtNode,
}

impl Stmt for ForeachStmt {
    fn execute(&self, env: &mut Env) -> Result<Signal, EngineError> {
        if self.by_ref {
            return self.execute_by_ref(env);
        }
        let subject = self.array.eval(env)?;
        let Val::Array(arr) = subject else {
            env.warn(&format!(
                "foreach() argument must be of type array, {} given",
                subject.type_name()
            ));
            return Ok(Signal::Next);
        };
        for (key, value) in arr.entries_snapshot() {
            env.check_interrupt()?;
            if let Some(key_var) = self.key_var {
                env.set_var(key_var, key.to_val());
            }
            env.set_var(self.value_var, value);
            match self.body.execute(env)? {
                Signal::Next | Signal::Continue => {}
                Signal::Break => break,
                signal @ Signal::Return(_) => return Ok(signal),
            }
        }
        Ok(Signal::Next)
    }
}

impl ForeachStmt {
    fn execute_by_ref(&self, env: &mut Env) -> Result<Signal, EngineError> {
        let subject = self.array.eval_array(env)?;
        let Val::Array(arr) = subject else {
            env.warn(&format!(
                "foreach() argument must be of type array, {} given",
                subject.type_name()
            ));
            return Ok(Signal::Next);
        };
        for key in arr.borrow().keys() {
            env.check_interrupt()?;
            // Entries removed mid-iteration are skipped.
            if !arr.borrow().has_key(&key) {
                continue;
            }
            if let Some(key_var) = self.key_var {
                env.set_var(key_var, key.to_val());
            }
            let cell = arr.borrow_mut().get_ref(key);
            env.bind_var_ref(self.value_var, cell);
            match self.body.execute(env)? {
                Signal::Next | Signal::Continue => {}
                Signal::Break => break,
                signal @ Signal::Return(_) => return Ok(signal),
            }
        }
        Ok(Signal::Next)
    }
}

/// `return [expr]`. The returned value detaches from the callee's slots.
#[derive(Debug)]
pub struct ReturnStmt(pub Option<ExprNode>);

impl Stmt for ReturnStmt {
    fn execute(&self, env: &mut Env) -> Result<Signal, EngineError> {
        let value = match &self.0 {
            Some(expr) => expr.eval_copy(env)?,
            None => Val::Null,
        };
        Ok(Signal::Return(value))
    }
}

#[derive(Debug)]
pub struct BreakStmt;

impl Stmt for BreakStmt {
    fn execute(&self, _env: &mut Env) -> Result<Signal, EngineError> {
        Ok(Signal::Break)
    }
}

#[derive(Debug)]
pub struct ContinueStmt;

impl Stmt for ContinueStmt {
    fn execute(&self, _env: &mut Env) -> Result<Signal, EngineError> {
        Ok(Signal::Continue)
    }
}

/// `global $x, $y;`: bind local names to the global frame's cells.
#[derive(Debug)]
pub struct GlobalStmt(pub Vec<Symbol>);

impl Stmt for GlobalStmt {
    fn execute(&self, env: &mut Env) -> Result<Signal, EngineError> {
        for &name in &self.0 {
            env.bind_global(name);
        }
        Ok(Signal::Next)
    }
}

/// `unset(...)` on any set of addressable expressions.
#[derive(Debug)]
pub struct UnsetStmt(pub Vec<ExprNode>);

impl Stmt for UnsetStmt {
    fn execute(&self, env: &mut Env) -> Result<Signal, EngineError> {
        for target in &self.0 {
            target.eval_unset(env)?;
        }
        Ok(Signal::Next)
    }
}

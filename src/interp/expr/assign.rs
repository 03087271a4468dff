//! Assignment, reference binding and slot-replacing operators

use crate::core::value::Val;
use crate::interp::env::Env;
use crate::interp::error::EngineError;
use crate::interp::expr::{Expr, ExprNode};

/// `target = value`. The target's `eval_assign` applies the value-copy, so
/// arrays land as independent copies.
#[derive(Debug)]
pub struct AssignExpr {
    pub target: ExprNode,
    pub value: ExprNode,
}

impl AssignExpr {
    pub fn new(target: ExprNode, value: ExprNode) -> Self {
        Self { target, value }
    }
}

impl Expr for AssignExpr {
    fn eval(&self, env: &mut Env) -> Result<Val, EngineError> {
        let value = self.value.eval(env)?;
        self.target.eval_assign(env, value.clone())?;
        Ok(value)
    }
}

/// `target =& source`: rebind the target's slot to the source's cell.
#[derive(Debug)]
pub struct AssignRefExpr {
    pub target: ExprNode,
    pub source: ExprNode,
}

impl AssignRefExpr {
    pub fn new(target: ExprNode, source: ExprNode) -> Self {
        Self { target, source }
    }
}

impl Expr for AssignRefExpr {
    fn eval(&self, env: &mut Env) -> Result<Val, EngineError> {
        let var = self.source.eval_ref(env)?;
        self.target.eval_assign_ref(env, var.clone())?;
        Ok(var.get())
    }
}

#[derive(Debug, Clone, Copy)]
pub enum IncDecOp {
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

/// `++`/`--`: read through the target's cell, store the replacement value
/// back into the same cell.
#[derive(Debug)]
pub struct IncDecExpr {
    pub op: IncDecOp,
    pub target: ExprNode,
}

impl IncDecExpr {
    pub fn new(op: IncDecOp, target: ExprNode) -> Self {
        Self { op, target }
    }
}

impl Expr for IncDecExpr {
    fn eval(&self, env: &mut Env) -> Result<Val, EngineError> {
        let var = self.target.eval_ref(env)?;
        let old = var.get();
        let new = match self.op {
            IncDecOp::PreInc | IncDecOp::PostInc => old.increment(),
            IncDecOp::PreDec | IncDecOp::PostDec => old.decrement(),
        };
        var.set(new.clone());
        Ok(match self.op {
            IncDecOp::PreInc | IncDecOp::PreDec => new,
            IncDecOp::PostInc | IncDecOp::PostDec => old,
        })
    }
}

/// `isset(...)`: true when every target is set and non-null. Never warns
/// and never vivifies.
#[derive(Debug)]
pub struct IssetExpr {
    pub targets: Vec<ExprNode>,
}

impl IssetExpr {
    pub fn new(targets: Vec<ExprNode>) -> Self {
        Self { targets }
    }
}

impl Expr for IssetExpr {
    fn eval(&self, env: &mut Env) -> Result<Val, EngineError> {
        for target in &self.targets {
            if !target.eval_isset(env)? {
                return Ok(Val::Bool(false));
            }
        }
        Ok(Val::Bool(true))
    }
}

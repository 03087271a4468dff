//! The multi-context expression protocol
//!
//! Every expression node implements one trait so a single syntax tree can
//! serve every usage context without re-parsing. Most contexts have a
//! sensible default; container and variable nodes override the ones they
//! care about:
//!
//! - [`Expr::eval`]: plain read. Reading a missing path yields null and
//!   never mutates the tree.
//! - [`Expr::eval_copy`]: read for storage into a new slot; applies the
//!   array value-copy.
//! - [`Expr::eval_ref`]: the cell this expression denotes, created on
//!   demand. The write-gated path: container bases auto-vivify here.
//! - [`Expr::eval_arg`]: deferred binding for call arguments (see
//!   [`crate::interp::arg`]).
//! - [`Expr::eval_assign`] / [`Expr::eval_assign_ref`]: store a value /
//!   rebind the slot's cell.
//! - [`Expr::eval_array`] / [`Expr::eval_object`]: vivify-as-container
//!   steps for chained accesses like `$a['x']['y']` and `$o->a->b`.
//! - [`Expr::eval_unset`]: remove the denoted slot (distinct from
//!   assigning null).
//! - [`Expr::eval_isset`]: silent existence probe.

mod assign;
mod dim;
mod field;
mod invoke;
mod ops;
mod var;

pub use assign::{AssignExpr, AssignRefExpr, IncDecExpr, IncDecOp, IssetExpr};
pub use dim::ArrayDimExpr;
pub use field::FieldGetExpr;
pub use invoke::{CallExpr, MethodCallExpr, NewExpr};
pub use ops::{BinaryExpr, BinaryOp, CmpExpr, CmpOp, ConcatExpr, LogicalExpr, LogicalOp, UnaryExpr, UnaryOp};
pub use var::{ThisExpr, VarExpr};

use crate::core::value::Val;
use crate::core::var::Var;
use crate::interp::arg::ArgumentBinding;
use crate::interp::env::Env;
use crate::interp::error::EngineError;

pub trait Expr: std::fmt::Debug {
    /// Ordinary read.
    fn eval(&self, env: &mut Env) -> Result<Val, EngineError>;

    /// Read, then detach: the result is safe to store into a new slot.
    fn eval_copy(&self, env: &mut Env) -> Result<Val, EngineError> {
        Ok(self.eval(env)?.copy_for_assignment())
    }

    /// The cell this expression denotes. The default wraps the value in a
    /// fresh temporary cell, adequate for rvalues bound to by-reference
    /// parameters; addressable nodes return their real cell.
    fn eval_ref(&self, env: &mut Env) -> Result<Var, EngineError> {
        Ok(Var::new(self.eval(env)?))
    }

    /// Deferred value-vs-cell binding for a call argument.
    fn eval_arg(&self) -> ArgumentBinding<'_>
    where
        Self: Sized,
    {
        ArgumentBinding::new(self)
    }

    /// Store into this expression's target slot.
    fn eval_assign(&self, _env: &mut Env, _value: Val) -> Result<(), EngineError> {
        Err(EngineError::Fatal(
            "Cannot use this expression as an assignment target".into(),
        ))
    }

    /// Rebind this expression's slot to an existing cell (`=&`).
    fn eval_assign_ref(&self, _env: &mut Env, _var: Var) -> Result<(), EngineError> {
        Err(EngineError::Fatal(
            "Cannot bind a reference to this expression".into(),
        ))
    }

    /// The value with an array vivified in place if the slot was unset.
    /// Only write paths may call this.
    fn eval_array(&self, env: &mut Env) -> Result<Val, EngineError> {
        self.eval(env)
    }

    /// The value with an object vivified in place if the slot was unset.
    fn eval_object(&self, env: &mut Env) -> Result<Val, EngineError> {
        self.eval(env)
    }

    /// Remove the denoted slot.
    fn eval_unset(&self, _env: &mut Env) -> Result<(), EngineError> {
        Err(EngineError::Fatal("Cannot unset this expression".into()))
    }

    /// Existence probe: set and non-null, without diagnostics and without
    /// mutating anything.
    fn eval_isset(&self, env: &mut Env) -> Result<bool, EngineError> {
        Ok(self.eval(env)?.is_set())
    }
}

pub type ExprNode = Box<dyn Expr>;

/// A constant value in the tree.
#[derive(Debug)]
pub struct LiteralExpr(pub Val);

impl LiteralExpr {
    pub fn new(value: impl Into<Val>) -> Self {
        Self(value.into())
    }
}

impl Expr for LiteralExpr {
    fn eval(&self, _env: &mut Env) -> Result<Val, EngineError> {
        Ok(self.0.clone())
    }
}

/// Shorthand used throughout the tests and by embedders.
pub fn lit(value: impl Into<Val>) -> ExprNode {
    Box::new(LiteralExpr(value.into()))
}

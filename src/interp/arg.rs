//! Deferred call-site argument resolution
//!
//! Whether an argument passes by value or by reference is a property of the
//! callee's signature, discovered only at dispatch time. A call site
//! therefore produces one `ArgumentBinding` per argument expression and
//! hands them over unresolved; the binder invokes exactly one of the two
//! resolution methods per binding once the matching parameter is known.
//!
//! Resolving by value never auto-vivifies: a read-only call site leaves
//! missing containers untouched. Resolving by reference goes through the
//! expression's `eval_ref`, creating the addressed cell (and any container
//! on the way to it) on demand.

use crate::core::value::Val;
use crate::core::var::Var;
use crate::interp::env::Env;
use crate::interp::error::EngineError;
use crate::interp::expr::{Expr, ExprNode};

pub struct ArgumentBinding<'a> {
    expr: &'a dyn Expr,
}

impl<'a> ArgumentBinding<'a> {
    pub fn new(expr: &'a dyn Expr) -> Self {
        Self { expr }
    }

    /// The argument as an independent value (by-value parameter).
    pub fn resolve_value(&self, env: &mut Env) -> Result<Val, EngineError> {
        self.expr.eval_copy(env)
    }

    /// The argument as a shared cell (by-reference parameter); auto-vivifies
    /// the denoted slot.
    pub fn resolve_ref(&self, env: &mut Env) -> Result<Var, EngineError> {
        self.expr.eval_ref(env)
    }
}

/// Bindings for a call site's argument list, in source order.
pub fn bind_all(args: &[ExprNode]) -> Vec<ArgumentBinding<'_>> {
    args.iter()
        .map(|expr| ArgumentBinding::new(expr.as_ref()))
        .collect()
}

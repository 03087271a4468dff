//! Call-site nodes
//!
//! Arguments are not evaluated here: each one becomes a deferred
//! [`crate::interp::arg::ArgumentBinding`], resolved by the binder once the
//! callee's per-parameter reference-ness is known.

use crate::core::value::{Symbol, Val};
use crate::interp::arg::bind_all;
use crate::interp::env::Env;
use crate::interp::error::EngineError;
use crate::interp::expr::{Expr, ExprNode};

/// `name(args...)`
#[derive(Debug)]
pub struct CallExpr {
    pub name: Symbol,
    pub args: Vec<ExprNode>,
}

impl CallExpr {
    pub fn new(name: Symbol, args: Vec<ExprNode>) -> Self {
        Self { name, args }
    }
}

impl Expr for CallExpr {
    fn eval(&self, env: &mut Env) -> Result<Val, EngineError> {
        let bindings = bind_all(&self.args);
        env.call(self.name, &bindings)
    }
}

/// `$obj->method(args...)`
#[derive(Debug)]
pub struct MethodCallExpr {
    pub obj: ExprNode,
    pub method: Symbol,
    pub args: Vec<ExprNode>,
}

impl MethodCallExpr {
    pub fn new(obj: ExprNode, method: Symbol, args: Vec<ExprNode>) -> Self {
        Self { obj, method, args }
    }
}

impl Expr for MethodCallExpr {
    fn eval(&self, env: &mut Env) -> Result<Val, EngineError> {
        let target = self.obj.eval(env)?;
        match target {
            Val::Object(obj) => {
                let bindings = bind_all(&self.args);
                env.call_method(&obj, self.method, &bindings)
            }
            // Calling a method on a value that cannot hold one is fatal.
            value => Err(EngineError::Fatal(format!(
                "Call to a member function {}() on {}",
                env.symbol_name(self.method),
                value.type_name()
            ))),
        }
    }
}

/// `new ClassName(args...)`
#[derive(Debug)]
pub struct NewExpr {
    pub class: Symbol,
    pub args: Vec<ExprNode>,
}

impl NewExpr {
    pub fn new(class: Symbol, args: Vec<ExprNode>) -> Self {
        Self { class, args }
    }
}

impl Expr for NewExpr {
    fn eval(&self, env: &mut Env) -> Result<Val, EngineError> {
        let bindings = bind_all(&self.args);
        env.new_object(self.class, &bindings)
    }
}

//! Variable references

use crate::core::value::{Symbol, Val};
use crate::core::var::Var;
use crate::interp::env::Env;
use crate::interp::error::EngineError;
use crate::interp::expr::Expr;

/// A named variable in the active scope (`$x`).
#[derive(Debug)]
pub struct VarExpr {
    pub name: Symbol,
}

impl VarExpr {
    pub fn new(name: Symbol) -> Self {
        Self { name }
    }
}

impl Expr for VarExpr {
    fn eval(&self, env: &mut Env) -> Result<Val, EngineError> {
        Ok(env.read_var(self.name))
    }

    fn eval_ref(&self, env: &mut Env) -> Result<Var, EngineError> {
        Ok(env.get_var_ref(self.name))
    }

    fn eval_assign(&self, env: &mut Env, value: Val) -> Result<(), EngineError> {
        env.set_var(self.name, value);
        Ok(())
    }

    fn eval_assign_ref(&self, env: &mut Env, var: Var) -> Result<(), EngineError> {
        env.bind_var_ref(self.name, var);
        Ok(())
    }

    fn eval_array(&self, env: &mut Env) -> Result<Val, EngineError> {
        let var = env.get_var_ref(self.name);
        let current = var.get();
        match current {
            Val::Array(_) => Ok(current),
            value if !value.is_set() => {
                let fresh = Val::empty_array();
                var.set(fresh.clone());
                Ok(fresh)
            }
            value => Err(EngineError::TypeError {
                expected: "array",
                got: value.type_name().to_string(),
                operation: "array access",
            }),
        }
    }

    fn eval_object(&self, env: &mut Env) -> Result<Val, EngineError> {
        let var = env.get_var_ref(self.name);
        let current = var.get();
        match current {
            Val::Object(_) => Ok(current),
            value if !value.is_set() => {
                let fresh = Val::Object(env.create_plain_object());
                var.set(fresh.clone());
                Ok(fresh)
            }
            value => Err(EngineError::TypeError {
                expected: "object",
                got: value.type_name().to_string(),
                operation: "property access",
            }),
        }
    }

    fn eval_unset(&self, env: &mut Env) -> Result<(), EngineError> {
        env.unset_var(self.name);
        Ok(())
    }

    fn eval_isset(&self, env: &mut Env) -> Result<bool, EngineError> {
        Ok(env
            .var_lookup(self.name)
            .map(|var| var.get().is_set())
            .unwrap_or(false))
    }
}

/// The receiver inside a method body (`$this`).
#[derive(Debug)]
pub struct ThisExpr;

impl Expr for ThisExpr {
    fn eval(&self, env: &mut Env) -> Result<Val, EngineError> {
        match env.current_this() {
            Some(obj) => Ok(Val::Object(obj)),
            None => Err(EngineError::Fatal(
                "Using $this when not in object context".into(),
            )),
        }
    }

    fn eval_isset(&self, env: &mut Env) -> Result<bool, EngineError> {
        Ok(env.current_this().is_some())
    }
}

//! Object field access

use crate::core::value::{Symbol, Val};
use crate::core::var::Var;
use crate::interp::env::Env;
use crate::interp::error::EngineError;
use crate::interp::expr::{Expr, ExprNode};
use crate::runtime::object::ObjectRef;

/// `$obj->name` in all of its contexts.
#[derive(Debug)]
pub struct FieldGetExpr {
    pub obj: ExprNode,
    pub name: Symbol,
}

impl FieldGetExpr {
    pub fn new(obj: ExprNode, name: Symbol) -> Self {
        Self { obj, name }
    }

    /// The base in write mode: `eval_object` vivifies an unset base and a
    /// non-object base is a fixed-policy fatal type error.
    fn expect_object(&self, env: &mut Env) -> Result<ObjectRef, EngineError> {
        match self.obj.eval_object(env)? {
            Val::Object(obj) => Ok(obj),
            value => Err(EngineError::TypeError {
                expected: "object",
                got: value.type_name().to_string(),
                operation: "property access",
            }),
        }
    }
}

impl Expr for FieldGetExpr {
    fn eval(&self, env: &mut Env) -> Result<Val, EngineError> {
        let base = self.obj.eval(env)?;
        match base {
            Val::Object(obj) => {
                let field = obj.borrow().get_field(self.name);
                match field {
                    Some(value) => Ok(value),
                    None => {
                        let class = env.symbol_name(obj.borrow().class_name());
                        let name = env.symbol_name(self.name);
                        env.warn(&format!("Undefined property: {}::${}", class, name));
                        Ok(Val::Null)
                    }
                }
            }
            value => {
                env.warn(&format!(
                    "Attempt to read property \"{}\" on {}",
                    env.symbol_name(self.name),
                    value.type_name()
                ));
                Ok(Val::Null)
            }
        }
    }

    fn eval_ref(&self, env: &mut Env) -> Result<Var, EngineError> {
        let obj = self.expect_object(env)?;
        Ok(obj.borrow_mut().get_field_ref(self.name))
    }

    fn eval_assign(&self, env: &mut Env, value: Val) -> Result<(), EngineError> {
        let obj = self.expect_object(env)?;
        obj.borrow_mut()
            .put_field(self.name, value.copy_for_assignment());
        Ok(())
    }

    fn eval_assign_ref(&self, env: &mut Env, var: Var) -> Result<(), EngineError> {
        let obj = self.expect_object(env)?;
        obj.borrow_mut().put_field_ref(self.name, var);
        Ok(())
    }

    fn eval_array(&self, env: &mut Env) -> Result<Val, EngineError> {
        let obj = self.expect_object(env)?;
        let existing = obj.borrow().get_field(self.name);
        match existing {
            Some(value @ Val::Array(_)) => Ok(value),
            Some(value) if value.is_set() => Err(EngineError::TypeError {
                expected: "array",
                got: value.type_name().to_string(),
                operation: "array access",
            }),
            _ => {
                let fresh = Val::empty_array();
                obj.borrow_mut().put_field(self.name, fresh.clone());
                Ok(fresh)
            }
        }
    }

    fn eval_object(&self, env: &mut Env) -> Result<Val, EngineError> {
        let obj = self.expect_object(env)?;
        let existing = obj.borrow().get_field(self.name);
        match existing {
            Some(value @ Val::Object(_)) => Ok(value),
            Some(value) if value.is_set() => Err(EngineError::TypeError {
                expected: "object",
                got: value.type_name().to_string(),
                operation: "property access",
            }),
            _ => {
                let fresh = Val::Object(env.create_plain_object());
                obj.borrow_mut().put_field(self.name, fresh.clone());
                Ok(fresh)
            }
        }
    }

    fn eval_unset(&self, env: &mut Env) -> Result<(), EngineError> {
        let base = self.obj.eval(env)?;
        match base {
            Val::Object(obj) => {
                obj.borrow_mut().remove_field(self.name);
                Ok(())
            }
            Val::Null => Ok(()),
            value => {
                env.warn(&format!(
                    "Attempt to unset property on {}",
                    value.type_name()
                ));
                Ok(())
            }
        }
    }

    fn eval_isset(&self, env: &mut Env) -> Result<bool, EngineError> {
        if !self.obj.eval_isset(env)? {
            return Ok(false);
        }
        let base = self.obj.eval(env)?;
        match base {
            Val::Object(obj) => Ok(obj
                .borrow()
                .get_field(self.name)
                .map(|value| value.is_set())
                .unwrap_or(false)),
            _ => Ok(false),
        }
    }
}

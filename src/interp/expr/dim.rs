//! Array index access
//!
//! `$base[$index]` in all of its contexts, plus the append form `$base[]`.
//! The write-gated vivification contract lives here: plain reads of a
//! missing path produce null without touching the tree, while assignment,
//! reference binds and chained write access create the missing containers
//! level by level through `eval_array`.

use crate::core::array::{ArrayKey, ArrayRef};
use crate::core::value::Val;
use crate::core::var::Var;
use crate::interp::env::Env;
use crate::interp::error::EngineError;
use crate::interp::expr::{Expr, ExprNode};

#[derive(Debug)]
pub struct ArrayDimExpr {
    pub base: ExprNode,
    /// `None` is the append form `$base[]`, valid only in write contexts.
    pub index: Option<ExprNode>,
}

impl ArrayDimExpr {
    pub fn new(base: ExprNode, index: ExprNode) -> Self {
        Self {
            base,
            index: Some(index),
        }
    }

    pub fn append(base: ExprNode) -> Self {
        Self { base, index: None }
    }

    /// Evaluate the index expression into a normalized key. An illegal
    /// offset type warns and yields no key.
    fn key(&self, env: &mut Env) -> Result<Option<ArrayKey>, EngineError> {
        let index = self
            .index
            .as_ref()
            .expect("append form has no index expression");
        let value = index.eval(env)?;
        match ArrayKey::try_from_val(&value) {
            Some(key) => Ok(Some(key)),
            None => {
                env.warn(&format!("Illegal offset type {}", value.type_name()));
                Ok(None)
            }
        }
    }

    fn describe_key(key: &ArrayKey) -> String {
        match key {
            ArrayKey::Int(i) => i.to_string(),
            ArrayKey::Str(s) => format!("\"{}\"", String::from_utf8_lossy(s)),
        }
    }

    /// The base in write mode: `eval_array` vivifies an unset base and a
    /// non-array base is a fixed-policy fatal type error.
    fn array_base(&self, env: &mut Env, operation: &'static str) -> Result<ArrayRef, EngineError> {
        match self.base.eval_array(env)? {
            Val::Array(arr) => Ok(arr),
            other => Err(EngineError::TypeError {
                expected: "array",
                got: other.type_name().to_string(),
                operation,
            }),
        }
    }
}

impl Expr for ArrayDimExpr {
    fn eval(&self, env: &mut Env) -> Result<Val, EngineError> {
        if self.index.is_none() {
            return Err(EngineError::Fatal("Cannot use [] for reading".into()));
        }
        let base = self.base.eval(env)?;
        match base {
            Val::Array(arr) => {
                let Some(key) = self.key(env)? else {
                    return Ok(Val::Null);
                };
                match arr.borrow().get(&key) {
                    Some(value) => Ok(value),
                    None => {
                        env.warn(&format!(
                            "Undefined array key {}",
                            Self::describe_key(&key)
                        ));
                        Ok(Val::Null)
                    }
                }
            }
            Val::String(s) => {
                let Some(key) = self.key(env)? else {
                    return Ok(Val::Null);
                };
                let mut offset = key.to_val().to_int();
                if offset < 0 {
                    offset += s.len() as i64;
                }
                match usize::try_from(offset).ok().and_then(|i| s.get(i)) {
                    Some(byte) => Ok(Val::string(vec![*byte])),
                    None => {
                        env.warn(&format!("Uninitialized string offset {}", offset));
                        Ok(Val::string(Vec::new()))
                    }
                }
            }
            Val::Object(_) => Err(EngineError::TypeError {
                expected: "array",
                got: "object".to_string(),
                operation: "array access",
            }),
            value => {
                // Reading an offset of a scalar (or null) is recoverable.
                if value.is_set() {
                    env.warn(&format!(
                        "Trying to access array offset on value of type {}",
                        value.type_name()
                    ));
                }
                if self.index.is_some() {
                    self.key(env)?;
                }
                Ok(Val::Null)
            }
        }
    }

    fn eval_ref(&self, env: &mut Env) -> Result<Var, EngineError> {
        let arr = self.array_base(env, "array access")?;
        match &self.index {
            None => {
                let var = Var::default();
                arr.borrow_mut().append_ref(var.clone());
                Ok(var)
            }
            Some(_) => match self.key(env)? {
                Some(key) => Ok(arr.borrow_mut().get_ref(key)),
                // The warned illegal-offset case binds a detached cell.
                None => Ok(Var::default()),
            },
        }
    }

    fn eval_assign(&self, env: &mut Env, value: Val) -> Result<(), EngineError> {
        let arr = self.array_base(env, "array assignment")?;
        match &self.index {
            None => {
                arr.borrow_mut().append(value.copy_for_assignment());
            }
            Some(_) => {
                if let Some(key) = self.key(env)? {
                    arr.borrow_mut().put(key, value.copy_for_assignment());
                }
            }
        }
        Ok(())
    }

    fn eval_assign_ref(&self, env: &mut Env, var: Var) -> Result<(), EngineError> {
        let arr = self.array_base(env, "array assignment")?;
        match &self.index {
            None => {
                arr.borrow_mut().append_ref(var);
            }
            Some(_) => {
                if let Some(key) = self.key(env)? {
                    arr.borrow_mut().put_ref(key, var);
                }
            }
        }
        Ok(())
    }

    fn eval_array(&self, env: &mut Env) -> Result<Val, EngineError> {
        let arr = self.array_base(env, "array access")?;
        let key = match &self.index {
            None => {
                let fresh = Val::empty_array();
                arr.borrow_mut().append(fresh.clone());
                return Ok(fresh);
            }
            Some(_) => match self.key(env)? {
                Some(key) => key,
                None => return Ok(Val::empty_array()),
            },
        };
        let existing = arr.borrow().get(&key);
        match existing {
            Some(value @ Val::Array(_)) => Ok(value),
            Some(value) if value.is_set() => Err(EngineError::TypeError {
                expected: "array",
                got: value.type_name().to_string(),
                operation: "array access",
            }),
            _ => {
                let fresh = Val::empty_array();
                arr.borrow_mut().put(key, fresh.clone());
                Ok(fresh)
            }
        }
    }

    fn eval_object(&self, env: &mut Env) -> Result<Val, EngineError> {
        let arr = self.array_base(env, "array access")?;
        let key = match &self.index {
            None => {
                let fresh = Val::Object(env.create_plain_object());
                arr.borrow_mut().append(fresh.clone());
                return Ok(fresh);
            }
            Some(_) => match self.key(env)? {
                Some(key) => key,
                None => return Ok(Val::Object(env.create_plain_object())),
            },
        };
        let existing = arr.borrow().get(&key);
        match existing {
            Some(value @ Val::Object(_)) => Ok(value),
            Some(value) if value.is_set() => Err(EngineError::TypeError {
                expected: "object",
                got: value.type_name().to_string(),
                operation: "property access",
            }),
            _ => {
                let fresh = Val::Object(env.create_plain_object());
                arr.borrow_mut().put(key, fresh.clone());
                Ok(fresh)
            }
        }
    }

    fn eval_unset(&self, env: &mut Env) -> Result<(), EngineError> {
        let base = self.base.eval(env)?;
        match base {
            Val::Array(arr) => {
                if self.index.is_none() {
                    return Err(EngineError::Fatal("Cannot use [] for unsetting".into()));
                }
                if let Some(key) = self.key(env)? {
                    arr.borrow_mut().remove(&key);
                }
                Ok(())
            }
            Val::Null => Ok(()),
            value => {
                env.warn(&format!(
                    "Cannot unset offset in a {} value",
                    value.type_name()
                ));
                Ok(())
            }
        }
    }

    fn eval_isset(&self, env: &mut Env) -> Result<bool, EngineError> {
        if self.index.is_none() {
            return Ok(false);
        }
        if !self.base.eval_isset(env)? {
            return Ok(false);
        }
        let base = self.base.eval(env)?;
        match base {
            Val::Array(arr) => {
                let Some(key) = self.key(env)? else {
                    return Ok(false);
                };
                Ok(arr
                    .borrow()
                    .get(&key)
                    .map(|value| value.is_set())
                    .unwrap_or(false))
            }
            Val::String(s) => {
                let Some(key) = self.key(env)? else {
                    return Ok(false);
                };
                let mut offset = key.to_val().to_int();
                if offset < 0 {
                    offset += s.len() as i64;
                }
                Ok(usize::try_from(offset)
                    .map(|i| i < s.len())
                    .unwrap_or(false))
            }
            _ => Ok(false),
        }
    }
}

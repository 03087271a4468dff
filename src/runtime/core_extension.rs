//! Core native functions
//!
//! The minimal builtin set the engine itself ships: type probes, the array
//! cursor functions, a couple of mutating array helpers and the generated
//! session identifier. Everything else belongs to external standard-library
//! collaborators registered the same way.
//!
//! Handlers receive the bound parameter cells. Parameters declared by
//! reference share the caller's cell, so `reset`/`next`/`array_push`
//! mutate the caller's array through the ordinary aliasing primitive.

use crate::core::array::ArrayKey;
use crate::core::value::Val;
use crate::core::var::Var;
use crate::interp::env::Env;
use crate::interp::error::EngineError;
use crate::runtime::extension::{Extension, NativeFunctionDef, NativeParam};
use rand::Rng;

pub struct CoreExtension;

impl Extension for CoreExtension {
    fn name(&self) -> &'static str {
        "core"
    }

    fn functions(&self) -> Vec<NativeFunctionDef> {
        vec![
            NativeFunctionDef {
                name: b"strlen",
                params: vec![NativeParam::by_value(b"string")],
                handler: strlen,
            },
            NativeFunctionDef {
                name: b"count",
                params: vec![NativeParam::by_value(b"value")],
                handler: count,
            },
            NativeFunctionDef {
                name: b"is_array",
                params: vec![NativeParam::by_value(b"value")],
                handler: is_array,
            },
            NativeFunctionDef {
                name: b"is_null",
                params: vec![NativeParam::by_value(b"value")],
                handler: is_null,
            },
            NativeFunctionDef {
                name: b"gettype",
                params: vec![NativeParam::by_value(b"value")],
                handler: gettype,
            },
            NativeFunctionDef {
                name: b"reset",
                params: vec![NativeParam::by_ref(b"array")],
                handler: reset,
            },
            NativeFunctionDef {
                name: b"next",
                params: vec![NativeParam::by_ref(b"array")],
                handler: next,
            },
            NativeFunctionDef {
                name: b"current",
                params: vec![NativeParam::by_value(b"array")],
                handler: current,
            },
            NativeFunctionDef {
                name: b"key",
                params: vec![NativeParam::by_value(b"array")],
                handler: key,
            },
            NativeFunctionDef {
                name: b"array_push",
                params: vec![NativeParam::by_ref(b"array"), NativeParam::by_value(b"value")],
                handler: array_push,
            },
            NativeFunctionDef {
                name: b"array_key_exists",
                params: vec![NativeParam::by_value(b"key"), NativeParam::by_value(b"array")],
                handler: array_key_exists,
            },
            NativeFunctionDef {
                name: b"session_id",
                params: Vec::new(),
                handler: session_id,
            },
        ]
    }
}

fn strlen(env: &mut Env, args: &[Var]) -> Result<Val, EngineError> {
    let value = args[0].get();
    match value {
        Val::Array(_) | Val::Object(_) => Err(EngineError::TypeError {
            expected: "string",
            got: value.type_name().to_string(),
            operation: "strlen",
        }),
        _ => Ok(Val::Int(env.render_bytes(&value).len() as i64)),
    }
}

fn count(env: &mut Env, args: &[Var]) -> Result<Val, EngineError> {
    let value = args[0].get();
    match value {
        Val::Array(arr) => Ok(Val::Int(arr.borrow().len() as i64)),
        Val::Null => {
            env.warn("count(): Parameter must be an array, null given");
            Ok(Val::Int(0))
        }
        _ => {
            env.warn(&format!(
                "count(): Parameter must be an array, {} given",
                value.type_name()
            ));
            Ok(Val::Int(1))
        }
    }
}

fn is_array(_env: &mut Env, args: &[Var]) -> Result<Val, EngineError> {
    Ok(Val::Bool(matches!(args[0].get(), Val::Array(_))))
}

fn is_null(_env: &mut Env, args: &[Var]) -> Result<Val, EngineError> {
    Ok(Val::Bool(matches!(args[0].get(), Val::Null)))
}

/// Legacy spelling of the type names, as the language reports them.
fn gettype(_env: &mut Env, args: &[Var]) -> Result<Val, EngineError> {
    let name = match args[0].get() {
        Val::Null => "NULL",
        Val::Bool(_) => "boolean",
        Val::Int(_) => "integer",
        Val::Float(_) => "double",
        Val::String(_) => "string",
        Val::Array(_) => "array",
        Val::Object(_) => "object",
        Val::Resource(_) => "resource",
    };
    Ok(Val::from(name))
}

fn reset(env: &mut Env, args: &[Var]) -> Result<Val, EngineError> {
    match args[0].get() {
        Val::Array(arr) => {
            let mut data = arr.borrow_mut();
            data.rewind();
            Ok(data.current().unwrap_or(Val::Bool(false)))
        }
        value => {
            env.warn(&format!(
                "reset() expects parameter 1 to be array, {} given",
                value.type_name()
            ));
            Ok(Val::Bool(false))
        }
    }
}

fn next(env: &mut Env, args: &[Var]) -> Result<Val, EngineError> {
    match args[0].get() {
        Val::Array(arr) => Ok(arr.borrow_mut().advance().unwrap_or(Val::Bool(false))),
        value => {
            env.warn(&format!(
                "next() expects parameter 1 to be array, {} given",
                value.type_name()
            ));
            Ok(Val::Bool(false))
        }
    }
}

fn current(_env: &mut Env, args: &[Var]) -> Result<Val, EngineError> {
    match args[0].get() {
        Val::Array(arr) => Ok(arr.borrow().current().unwrap_or(Val::Bool(false))),
        _ => Ok(Val::Bool(false)),
    }
}

fn key(_env: &mut Env, args: &[Var]) -> Result<Val, EngineError> {
    match args[0].get() {
        Val::Array(arr) => Ok(arr
            .borrow()
            .current_key()
            .map(|k| k.to_val())
            .unwrap_or(Val::Null)),
        _ => Ok(Val::Null),
    }
}

fn array_push(env: &mut Env, args: &[Var]) -> Result<Val, EngineError> {
    match args[0].get() {
        Val::Array(arr) => {
            let value = args[1].get();
            let mut data = arr.borrow_mut();
            data.append(value.copy_for_assignment());
            Ok(Val::Int(data.len() as i64))
        }
        value => {
            env.warn(&format!(
                "array_push() expects parameter 1 to be array, {} given",
                value.type_name()
            ));
            Ok(Val::Bool(false))
        }
    }
}

fn array_key_exists(env: &mut Env, args: &[Var]) -> Result<Val, EngineError> {
    let key_val = args[0].get();
    let Some(key) = ArrayKey::try_from_val(&key_val) else {
        env.warn(&format!("Illegal offset type {}", key_val.type_name()));
        return Ok(Val::Bool(false));
    };
    match args[1].get() {
        Val::Array(arr) => Ok(Val::Bool(arr.borrow().has_key(&key))),
        _ => Ok(Val::Bool(false)),
    }
}

/// The engine-scoped session identifier, generated lazily on first access
/// and stable for the environment's lifetime.
fn session_id(env: &mut Env, _args: &[Var]) -> Result<Val, EngineError> {
    Ok(env.special_or_init(b"session_id", |_| {
        let raw: [u8; 13] = rand::thread_rng().r#gen();
        let mut id = Vec::with_capacity(raw.len() * 2);
        for byte in raw {
            id.extend_from_slice(format!("{:02x}", byte).as_bytes());
        }
        Val::String(std::rc::Rc::new(id))
    }))
}

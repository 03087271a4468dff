//! Callable invocation
//!
//! Functions and methods share one shape: a parameter list with per-position
//! declared reference-ness, and a body that is either a statement tree or a
//! native handler.
//!
//! ## Argument binding
//!
//! A call site hands over unresolved [`ArgumentBinding`]s; only here, once
//! the callee's signature is known, does each binding resolve: to a shared
//! cell for a by-reference parameter, to an independent value otherwise.
//! Bindings resolve exactly once, in declaration order, so argument
//! expressions keep their left-to-right evaluation and a by-value call
//! never auto-vivifies anything at the call site.
//!
//! ## Parameters inside the callee
//!
//! Every parameter becomes a local cell: by-reference parameters share the
//! caller's cell, by-value parameters get a fresh one. Native handlers
//! receive the same bound cells, so by-reference builtins mutate the
//! caller's slot through the ordinary aliasing primitive.

use crate::core::interner::Interner;
use crate::core::value::{Symbol, Val};
use crate::core::var::Var;
use crate::interp::arg::ArgumentBinding;
use crate::interp::env::{Env, Frame};
use crate::interp::error::EngineError;
use crate::interp::stmt::{Signal, StmtNode};
use crate::runtime::class::ClassChain;
use crate::runtime::extension::NativeFunctionDef;
use crate::runtime::object::ObjectRef;
use smallvec::SmallVec;
use std::rc::Rc;

pub type NativeHandler = fn(&mut Env, &[Var]) -> Result<Val, EngineError>;

/// Bound argument cells; most calls fit inline.
pub type BoundArgs = SmallVec<[Var; 8]>;

#[derive(Debug, Clone)]
pub struct ParamInfo {
    pub name: Symbol,
    pub by_ref: bool,
    pub default: Option<Val>,
}

impl ParamInfo {
    pub fn by_value(name: Symbol) -> Self {
        Self {
            name,
            by_ref: false,
            default: None,
        }
    }

    pub fn by_ref(name: Symbol) -> Self {
        Self {
            name,
            by_ref: true,
            default: None,
        }
    }

    pub fn with_default(name: Symbol, default: Val) -> Self {
        Self {
            name,
            by_ref: false,
            default: Some(default),
        }
    }
}

#[derive(Debug, Clone)]
pub enum FuncBody {
    User(Rc<StmtNode>),
    Native(NativeHandler),
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: Vec<u8>,
    pub params: Vec<ParamInfo>,
    pub body: FuncBody,
}

impl Function {
    pub fn user(name: impl Into<Vec<u8>>, params: Vec<ParamInfo>, body: StmtNode) -> Self {
        Self {
            name: name.into(),
            params,
            body: FuncBody::User(Rc::new(body)),
        }
    }

    pub fn native(
        name: impl Into<Vec<u8>>,
        params: Vec<ParamInfo>,
        handler: NativeHandler,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            body: FuncBody::Native(handler),
        }
    }

    /// Build the callable for a registered native definition.
    pub fn from_native_def(def: &NativeFunctionDef, interner: &mut Interner) -> Function {
        let params = def
            .params
            .iter()
            .map(|p| ParamInfo {
                name: interner.intern(p.name),
                by_ref: p.by_ref,
                default: p.default.clone(),
            })
            .collect();
        Function::native(def.name.to_vec(), params, def.handler)
    }
}

impl Env {
    // ---- registration (program linkage) ---------------------------------

    /// Register a function under its exact spelling and lowercase fallback.
    pub fn register_function(&mut self, name: &[u8], func: Function) -> Result<(), EngineError> {
        let exact = self.interner.intern(name);
        let lower = self.interner.intern_lower(name);
        if self.functions_lower.contains_key(&lower) {
            return Err(EngineError::Fatal(format!(
                "Cannot redeclare function {}",
                String::from_utf8_lossy(name)
            )));
        }
        let func = Rc::new(func);
        self.functions.insert(exact, Rc::clone(&func));
        self.functions_lower.insert(lower, func);
        Ok(())
    }

    /// Register a linked class chain under its name.
    pub fn register_class(&mut self, chain: Rc<ClassChain>) -> Result<(), EngineError> {
        let exact = chain.name();
        let name = self
            .interner
            .lookup(exact)
            .map(|b| b.to_vec())
            .unwrap_or_default();
        let lower = self.interner.intern_lower(&name);
        if self.classes_lower.contains_key(&lower) {
            return Err(EngineError::Fatal(format!(
                "Cannot redeclare class {}",
                String::from_utf8_lossy(&name)
            )));
        }
        self.classes.insert(exact, Rc::clone(&chain));
        self.classes_lower.insert(lower, chain);
        Ok(())
    }

    // ---- lookup (exact case first, lowercase fallback) ------------------

    pub fn lookup_function(&mut self, name: Symbol) -> Option<Rc<Function>> {
        if let Some(func) = self.functions.get(&name) {
            return Some(Rc::clone(func));
        }
        let lower = self.lower_symbol(name);
        self.functions_lower.get(&lower).cloned()
    }

    pub fn lookup_class(&mut self, name: Symbol) -> Option<Rc<ClassChain>> {
        if let Some(chain) = self.classes.get(&name) {
            return Some(Rc::clone(chain));
        }
        let lower = self.lower_symbol(name);
        self.classes_lower.get(&lower).cloned()
    }

    // ---- invocation -----------------------------------------------------

    /// Call a registered function. An unknown name is a recoverable error
    /// unwinding the current unit, never a silent null.
    pub fn call(&mut self, name: Symbol, args: &[ArgumentBinding]) -> Result<Val, EngineError> {
        let func = self
            .lookup_function(name)
            .ok_or_else(|| EngineError::UndefinedFunction {
                name: self.symbol_name(name),
            })?;
        self.invoke_function(&func, None, args)
    }

    /// Dispatch a method through the object's descriptor chain.
    pub fn call_method(
        &mut self,
        obj: &ObjectRef,
        method: Symbol,
        args: &[ArgumentBinding],
    ) -> Result<Val, EngineError> {
        let chain = obj.class_chain();
        let lower = self.lower_symbol(method);
        let func = chain
            .find_method(method, lower)
            .ok_or_else(|| EngineError::UndefinedMethod {
                class: self.symbol_name(chain.name()),
                method: self.symbol_name(method),
            })?;
        self.invoke_function(&func, Some(obj.clone()), args)
    }

    /// Instantiate a class: allocate through the chain, then run the
    /// resolved constructor, if any.
    pub fn new_object(
        &mut self,
        class: Symbol,
        args: &[ArgumentBinding],
    ) -> Result<Val, EngineError> {
        let chain = self
            .lookup_class(class)
            .ok_or_else(|| EngineError::UndefinedClass {
                name: self.symbol_name(class),
            })?;
        let obj = chain.new_instance();
        if let Some(ctor) = chain.find_constructor() {
            self.invoke_function(&ctor, Some(obj.clone()), args)?;
        }
        Ok(Val::Object(obj))
    }

    /// Bind arguments against the signature and run the body.
    pub fn invoke_function(
        &mut self,
        func: &Rc<Function>,
        this: Option<ObjectRef>,
        args: &[ArgumentBinding],
    ) -> Result<Val, EngineError> {
        let mut bound: BoundArgs = BoundArgs::with_capacity(args.len().max(func.params.len()));

        for (index, param) in func.params.iter().enumerate() {
            let var = match args.get(index) {
                Some(binding) if param.by_ref => binding.resolve_ref(self)?,
                Some(binding) => Var::new(binding.resolve_value(self)?),
                None => match &param.default {
                    Some(default) => Var::new(default.copy_for_assignment()),
                    None => {
                        let name = String::from_utf8_lossy(&func.name).into_owned();
                        self.warn(&format!(
                            "Too few arguments to function {}(), {} passed and at least {} expected",
                            name,
                            args.len(),
                            func.params.len()
                        ));
                        Var::default()
                    }
                },
            };
            bound.push(var);
        }

        // Surplus arguments still evaluate, left to right, by value.
        for binding in args.iter().skip(func.params.len()) {
            let value = binding.resolve_value(self)?;
            bound.push(Var::new(value));
        }

        match &func.body {
            FuncBody::Native(handler) => handler(self, &bound),
            FuncBody::User(body) => {
                let mut frame = Frame::with_this(this);
                for (param, var) in func.params.iter().zip(bound.iter()) {
                    frame.locals.insert(param.name, var.clone());
                }
                self.push_frame(frame);
                let result = body.execute(self);
                self.pop_frame();
                match result? {
                    Signal::Return(value) => Ok(value),
                    Signal::Next => Ok(Val::Null),
                    Signal::Break | Signal::Continue => Err(EngineError::Fatal(
                        "Cannot break/continue out of a function".into(),
                    )),
                }
            }
        }
    }
}

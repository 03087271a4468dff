//! The execution environment
//!
//! One `Env` is the single piece of mutable ambient state threaded through
//! every evaluation call: the variable frames, the function and class
//! tables (each with a parallel lowercase index), the engine-scoped
//! specials, the output sink, the diagnostics handler and the cooperative
//! interrupt deadline.
//!
//! Environments do not share cells or containers with each other; running
//! several in parallel threads needs no locking inside the value model.
//!
//! ## Scopes
//!
//! The global scope doubles as the top-level scope. A call frame starts
//! empty (callee frames never inherit caller locals) and reaches the
//! global frame only through an explicit `global` binding.

use crate::core::interner::Interner;
use crate::core::value::{Symbol, Val};
use crate::core::var::Var;
use crate::interp::call::Function;
use crate::interp::error::{EngineError, ErrorHandler, ErrorLevel, StderrErrorHandler};
use crate::runtime::class::{ClassChain, ClassDef};
use crate::runtime::context::EngineContext;
use crate::runtime::object::ObjectRef;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub trait OutputWriter {
    fn write(&mut self, bytes: &[u8]) -> Result<(), EngineError>;
    fn flush(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Default sink writing to stdout.
pub struct StdoutWriter {
    stdout: io::Stdout,
}

impl Default for StdoutWriter {
    fn default() -> Self {
        Self {
            stdout: io::stdout(),
        }
    }
}

impl OutputWriter for StdoutWriter {
    fn write(&mut self, bytes: &[u8]) -> Result<(), EngineError> {
        self.stdout
            .write_all(bytes)
            .map_err(|e| EngineError::Fatal(format!("Failed to write output: {}", e)))
    }

    fn flush(&mut self) -> Result<(), EngineError> {
        self.stdout
            .flush()
            .map_err(|e| EngineError::Fatal(format!("Failed to flush output: {}", e)))
    }
}

/// Sink writing into a shared byte buffer, for capture and tests.
#[derive(Default, Clone)]
pub struct SharedBufferWriter {
    buffer: Rc<RefCell<Vec<u8>>>,
}

impl SharedBufferWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.buffer.borrow().clone()
    }
}

impl OutputWriter for SharedBufferWriter {
    fn write(&mut self, bytes: &[u8]) -> Result<(), EngineError> {
        self.buffer.borrow_mut().extend_from_slice(bytes);
        Ok(())
    }
}

/// One call frame: its locals and the bound `$this`, if any.
#[derive(Default)]
pub struct Frame {
    pub locals: HashMap<Symbol, Var>,
    pub this: Option<ObjectRef>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_this(this: Option<ObjectRef>) -> Self {
        Self {
            locals: HashMap::new(),
            this,
        }
    }
}

pub struct Env {
    pub interner: Interner,
    engine: Arc<EngineContext>,
    globals: HashMap<Symbol, Var>,
    frames: Vec<Frame>,
    pub(crate) functions: HashMap<Symbol, Rc<Function>>,
    pub(crate) functions_lower: HashMap<Symbol, Rc<Function>>,
    pub(crate) classes: HashMap<Symbol, Rc<ClassChain>>,
    pub(crate) classes_lower: HashMap<Symbol, Rc<ClassChain>>,
    specials: HashMap<Vec<u8>, Val>,
    std_class: Option<Rc<ClassChain>>,
    pub output: Box<dyn OutputWriter>,
    pub errors: Box<dyn ErrorHandler>,
    started: Instant,
    max_execution: Option<Duration>,
}

impl Env {
    pub fn new(engine: Arc<EngineContext>) -> Self {
        let mut env = Self {
            interner: Interner::new(),
            engine,
            globals: HashMap::new(),
            frames: Vec::new(),
            functions: HashMap::new(),
            functions_lower: HashMap::new(),
            classes: HashMap::new(),
            classes_lower: HashMap::new(),
            specials: HashMap::new(),
            std_class: None,
            output: Box::new(StdoutWriter::default()),
            errors: Box::new(StderrErrorHandler::default()),
            started: Instant::now(),
            max_execution: None,
        };
        env.materialize_native_functions();
        env.register_builtin_classes();
        env
    }

    /// Turn the engine registry's definitions into symbol-keyed tables.
    fn materialize_native_functions(&mut self) {
        let engine = Arc::clone(&self.engine);
        for def in engine.registry.functions() {
            let func = Function::from_native_def(def, &mut self.interner);
            // Registry construction already rejected duplicates.
            let _ = self.register_function(def.name, func);
        }
    }

    fn register_builtin_classes(&mut self) {
        let name = self.interner.intern(b"stdClass");
        let chain = ClassChain::link(Rc::new(ClassDef::new(name)), None);
        self.std_class = Some(Rc::clone(&chain));
        let _ = self.register_class(chain);
    }

    pub fn set_output_writer(&mut self, writer: Box<dyn OutputWriter>) {
        self.output = writer;
    }

    pub fn set_error_handler(&mut self, handler: Box<dyn ErrorHandler>) {
        self.errors = handler;
    }

    // ---- names ----------------------------------------------------------

    pub fn intern(&mut self, name: &[u8]) -> Symbol {
        self.interner.intern(name)
    }

    /// Human-readable spelling of a symbol, for diagnostics.
    pub fn symbol_name(&self, sym: Symbol) -> String {
        self.interner
            .lookup(sym)
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_else(|| "?".to_string())
    }

    pub(crate) fn lower_symbol(&mut self, sym: Symbol) -> Symbol {
        match self.interner.lookup(sym) {
            Some(bytes) => {
                let bytes = bytes.to_vec();
                self.interner.intern_lower(&bytes)
            }
            None => sym,
        }
    }

    // ---- variable scope -------------------------------------------------

    fn scope(&self) -> &HashMap<Symbol, Var> {
        match self.frames.last() {
            Some(frame) => &frame.locals,
            None => &self.globals,
        }
    }

    fn scope_mut(&mut self) -> &mut HashMap<Symbol, Var> {
        match self.frames.last_mut() {
            Some(frame) => &mut frame.locals,
            None => &mut self.globals,
        }
    }

    pub fn var_lookup(&self, sym: Symbol) -> Option<Var> {
        self.scope().get(&sym).cloned()
    }

    pub fn var_exists(&self, sym: Symbol) -> bool {
        self.scope().contains_key(&sym)
    }

    /// Plain read. An undefined variable is a notice, not an error, and
    /// reads as null without creating a slot.
    pub fn read_var(&mut self, sym: Symbol) -> Val {
        match self.var_lookup(sym) {
            Some(var) => var.get(),
            None => {
                let name = self.symbol_name(sym);
                self.report(ErrorLevel::Notice, &format!("Undefined variable ${}", name));
                Val::Null
            }
        }
    }

    /// Fetch the variable's cell, creating a null-valued one if the name is
    /// new. The addressable path used by `=&` and by-reference binding.
    pub fn get_var_ref(&mut self, sym: Symbol) -> Var {
        self.scope_mut()
            .entry(sym)
            .or_insert_with(Var::default)
            .clone()
    }

    /// Non-reference assignment: installs an independent value into the
    /// variable's current cell, so every slot sharing the cell observes it.
    pub fn set_var(&mut self, sym: Symbol, value: Val) {
        let value = value.copy_for_assignment();
        match self.scope().get(&sym) {
            Some(var) => var.set(value),
            None => {
                self.scope_mut().insert(sym, Var::new(value));
            }
        }
    }

    /// Reference assignment: rebind the variable slot to `var`'s cell.
    pub fn bind_var_ref(&mut self, sym: Symbol, var: Var) {
        self.scope_mut().insert(sym, var);
    }

    /// Remove the slot; the variable returns to the unset state, which is
    /// distinct from holding null.
    pub fn unset_var(&mut self, sym: Symbol) {
        self.scope_mut().remove(&sym);
    }

    /// Bind a local name to the global frame's cell (`global $x`). At top
    /// level the active scope already is the global frame.
    pub fn bind_global(&mut self, sym: Symbol) {
        let var = self
            .globals
            .entry(sym)
            .or_insert_with(Var::default)
            .clone();
        if let Some(frame) = self.frames.last_mut() {
            frame.locals.insert(sym, var);
        }
    }

    // ---- frames ---------------------------------------------------------

    pub fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    pub fn current_this(&self) -> Option<ObjectRef> {
        self.frames.last().and_then(|frame| frame.this.clone())
    }

    // ---- objects --------------------------------------------------------

    /// A bare `stdClass` instance, used when a write path vivifies an
    /// object out of an unset base.
    pub fn create_plain_object(&mut self) -> ObjectRef {
        self.std_class
            .as_ref()
            .expect("stdClass is registered at construction")
            .new_instance()
    }

    // ---- specials -------------------------------------------------------

    /// Engine-scoped named values (connection caches, generated ids).
    pub fn special(&self, name: &[u8]) -> Option<Val> {
        self.specials.get(name).cloned()
    }

    pub fn set_special(&mut self, name: &[u8], value: Val) {
        self.specials.insert(name.to_vec(), value);
    }

    /// Fetch a special, creating it on first access.
    pub fn special_or_init(
        &mut self,
        name: &[u8],
        init: impl FnOnce(&mut Env) -> Val,
    ) -> Val {
        if let Some(value) = self.specials.get(name) {
            return value.clone();
        }
        let value = init(self);
        self.specials.insert(name.to_vec(), value.clone());
        value
    }

    // ---- interrupt probe ------------------------------------------------

    pub fn set_time_limit(&mut self, limit: Option<Duration>) {
        self.started = Instant::now();
        self.max_execution = limit;
    }

    /// Cooperative cancellation probe, called by loop statements at every
    /// back-edge. Tripping unwinds through the fatal path.
    pub fn check_interrupt(&self) -> Result<(), EngineError> {
        if let Some(limit) = self.max_execution {
            if self.started.elapsed() > limit {
                return Err(EngineError::Timeout {
                    limit_ms: limit.as_millis() as u64,
                });
            }
        }
        Ok(())
    }

    // ---- diagnostics ----------------------------------------------------

    pub fn report(&mut self, level: ErrorLevel, message: &str) {
        self.errors.report(level, message);
    }

    pub fn notice(&mut self, message: &str) {
        self.report(ErrorLevel::Notice, message);
    }

    pub fn warn(&mut self, message: &str) {
        self.report(ErrorLevel::Warning, message);
    }

    // ---- rendering ------------------------------------------------------

    /// The observable byte form of a value, raising the array-conversion
    /// diagnostic where it applies.
    pub fn render_bytes(&mut self, value: &Val) -> Vec<u8> {
        if matches!(value, Val::Array(_)) {
            self.warn("Array to string conversion");
        }
        value.to_string_bytes()
    }

    /// Render a value into the environment's output sink.
    pub fn write_value(&mut self, value: &Val) -> Result<(), EngineError> {
        let bytes = self.render_bytes(value);
        self.output.write(&bytes)
    }
}

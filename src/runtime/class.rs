//! Class descriptors and resolution chains
//!
//! Each class links once into an immutable self-to-root descriptor chain; a
//! derived class prepends its own descriptor to its parent's chain, sharing
//! the parent descriptors structurally rather than copying them.
//!
//! Method dispatch is case-insensitive with exact-case precedence: lookup
//! scans the chain most-derived-first for an exact-case match, then repeats
//! the scan against each descriptor's pre-lowercased index.

use crate::core::interner::Interner;
use crate::core::value::{Symbol, Val};
use crate::interp::call::Function;
use crate::runtime::object::{ObjectData, ObjectRef};
use std::collections::HashMap;
use std::rc::Rc;

/// One class's own declarations: its methods (exact-case map plus the
/// lowercase index), field initializers and optional constructor.
#[derive(Debug, Default)]
pub struct ClassDef {
    name: Symbol,
    methods: HashMap<Symbol, Rc<Function>>,
    methods_lower: HashMap<Symbol, Rc<Function>>,
    constructor: Option<Rc<Function>>,
    field_defaults: Vec<(Symbol, Val)>,
}

impl ClassDef {
    pub fn new(name: Symbol) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    pub fn name(&self) -> Symbol {
        self.name
    }

    /// Declare a method, indexing it under both its exact spelling and its
    /// lowercase form.
    pub fn add_method(&mut self, interner: &mut Interner, name: &[u8], func: Rc<Function>) {
        let exact = interner.intern(name);
        let lower = interner.intern_lower(name);
        self.methods.insert(exact, Rc::clone(&func));
        self.methods_lower.insert(lower, func);
    }

    pub fn set_constructor(&mut self, func: Rc<Function>) {
        self.constructor = Some(func);
    }

    /// Declare an instance field with its default value. Initializers run
    /// root-first at instantiation, so a redeclaration in a derived class
    /// overwrites the base default.
    pub fn add_field_default(&mut self, name: Symbol, value: Val) {
        self.field_defaults.push((name, value));
    }

    fn find_exact(&self, name: Symbol) -> Option<Rc<Function>> {
        self.methods.get(&name).cloned()
    }

    fn find_lower(&self, lower: Symbol) -> Option<Rc<Function>> {
        self.methods_lower.get(&lower).cloned()
    }
}

/// The ordered self-to-root descriptor list for one linked class.
#[derive(Debug)]
pub struct ClassChain {
    defs: Vec<Rc<ClassDef>>,
}

impl ClassChain {
    /// Link a class: its own descriptor prepended to the parent's chain.
    pub fn link(def: Rc<ClassDef>, parent: Option<&Rc<ClassChain>>) -> Rc<ClassChain> {
        let mut defs = Vec::with_capacity(1 + parent.map_or(0, |p| p.defs.len()));
        defs.push(def);
        if let Some(parent) = parent {
            defs.extend(parent.defs.iter().cloned());
        }
        Rc::new(ClassChain { defs })
    }

    pub fn name(&self) -> Symbol {
        self.defs[0].name
    }

    pub fn descriptors(&self) -> &[Rc<ClassDef>] {
        &self.defs
    }

    /// First declared constructor, scanning most-derived to root. No
    /// implicit constructor is synthesized.
    pub fn find_constructor(&self) -> Option<Rc<Function>> {
        self.defs.iter().find_map(|def| def.constructor.clone())
    }

    /// Resolve a method: one exact-case pass over the chain, then one
    /// lowercase pass. Exact-case wins when both spellings exist.
    pub fn find_method(&self, exact: Symbol, lower: Symbol) -> Option<Rc<Function>> {
        self.defs
            .iter()
            .find_map(|def| def.find_exact(exact))
            .or_else(|| self.defs.iter().find_map(|def| def.find_lower(lower)))
    }

    /// True when `class_name` names this class or any ancestor.
    pub fn instance_of(&self, class_name: Symbol) -> bool {
        self.defs.iter().any(|def| def.name == class_name)
    }

    /// Allocate an instance and run the field initializers root-first, so
    /// derived defaults overwrite base defaults. The constructor is the
    /// caller's responsibility (it needs argument binding).
    pub fn new_instance(self: &Rc<Self>) -> ObjectRef {
        let mut data = ObjectData::new(Rc::clone(self));
        for def in self.defs.iter().rev() {
            for (name, default) in &def.field_defaults {
                data.put_field(*name, default.copy_for_assignment());
            }
        }
        ObjectRef::new(data)
    }
}

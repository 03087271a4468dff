//! Object instances
//!
//! An object is a mutable field container tied to one class descriptor
//! chain at construction. Unlike arrays, objects are identity-shared:
//! assigning an object variable creates another alias to the same instance,
//! never a copy.

use crate::core::value::{Symbol, Val};
use crate::core::var::{Slot, Var};
use crate::runtime::class::ClassChain;
use indexmap::IndexMap;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

#[derive(Debug)]
pub struct ObjectData {
    class: Rc<ClassChain>,
    fields: IndexMap<Symbol, Slot>,
}

impl ObjectData {
    pub fn new(class: Rc<ClassChain>) -> Self {
        Self {
            class,
            fields: IndexMap::new(),
        }
    }

    pub fn class(&self) -> &Rc<ClassChain> {
        &self.class
    }

    pub fn class_name(&self) -> Symbol {
        self.class.name()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn has_field(&self, name: Symbol) -> bool {
        self.fields.contains_key(&name)
    }

    pub fn get_field(&self, name: Symbol) -> Option<Val> {
        self.fields.get(&name).map(Slot::read)
    }

    /// Store a field value; writes through a reference-bound field cell.
    pub fn put_field(&mut self, name: Symbol, value: Val) {
        match self.fields.get_mut(&name) {
            Some(slot) => slot.write(value),
            None => {
                self.fields.insert(name, Slot::Value(value));
            }
        }
    }

    pub fn put_field_ref(&mut self, name: Symbol, var: Var) {
        self.fields.insert(name, Slot::Ref(var));
    }

    /// Fetch the field's cell, creating a null field if absent.
    pub fn get_field_ref(&mut self, name: Symbol) -> Var {
        self.fields
            .entry(name)
            .or_insert_with(|| Slot::Ref(Var::default()))
            .promote()
    }

    pub fn remove_field(&mut self, name: Symbol) -> Option<Val> {
        self.fields.shift_remove(&name).map(|slot| slot.read())
    }

    pub fn fields_snapshot(&self) -> Vec<(Symbol, Val)> {
        self.fields
            .iter()
            .map(|(name, slot)| (*name, slot.read()))
            .collect()
    }
}

/// Shared handle to one object instance; identity is handle identity.
#[derive(Debug, Clone)]
pub struct ObjectRef(Rc<RefCell<ObjectData>>);

impl ObjectRef {
    pub fn new(data: ObjectData) -> Self {
        Self(Rc::new(RefCell::new(data)))
    }

    pub fn borrow(&self) -> Ref<'_, ObjectData> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, ObjectData> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn same_class(&self, other: &ObjectRef) -> bool {
        self.borrow().class_name() == other.borrow().class_name()
    }

    pub fn class_chain(&self) -> Rc<ClassChain> {
        Rc::clone(self.borrow().class())
    }

    pub fn fields_snapshot(&self) -> Vec<(Symbol, Val)> {
        self.borrow().fields_snapshot()
    }
}

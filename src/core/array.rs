//! The ordered array container
//!
//! PHP arrays are insertion-ordered maps from int/string keys to slots, with
//! value-copy semantics at assignment boundaries and one internal iteration
//! cursor per container instance.
//!
//! ## Copy semantics
//!
//! `copy()` produces a logically independent container: plain slots are
//! duplicated (recursing into nested arrays, aliasing objects), while slots
//! that were reference-bound stay linked to their shared cell. The copy is
//! eager; observable independence is the invariant that matters.
//!
//! ## Key normalization
//!
//! Byte keys in canonical integer-literal form (`"0"`, `"5"`, `"-3"`) are
//! normalized to integer keys on insertion. Non-canonical numeric strings
//! (`"01"`, `" 5"`, out-of-range digits) remain string keys.
//! Reference: $PHP_SRC_PATH/Zend/zend_hash.h - ZEND_HANDLE_NUMERIC_STR

use crate::core::value::Val;
use crate::core::var::{Slot, Var};
use indexmap::IndexMap;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub enum ArrayKey {
    Int(i64),
    Str(Rc<Vec<u8>>),
}

impl ArrayKey {
    /// Normalize a byte key: canonical i64 literals become integer keys.
    pub fn from_bytes(bytes: &[u8]) -> ArrayKey {
        match canonical_int(bytes) {
            Some(i) => ArrayKey::Int(i),
            None => ArrayKey::Str(Rc::new(bytes.to_vec())),
        }
    }

    /// Coerce a value into an array offset, following PHP offset rules.
    /// Arrays, objects and resources are not legal offsets.
    pub fn try_from_val(val: &Val) -> Option<ArrayKey> {
        match val {
            Val::Null => Some(ArrayKey::Str(Rc::new(Vec::new()))),
            Val::Bool(b) => Some(ArrayKey::Int(*b as i64)),
            Val::Int(i) => Some(ArrayKey::Int(*i)),
            Val::Float(f) => Some(ArrayKey::Int(*f as i64)),
            Val::String(s) => Some(ArrayKey::from_bytes(s)),
            Val::Array(_) | Val::Object(_) | Val::Resource(_) => None,
        }
    }

    pub fn to_val(&self) -> Val {
        match self {
            ArrayKey::Int(i) => Val::Int(*i),
            ArrayKey::Str(s) => Val::String(Rc::clone(s)),
        }
    }
}

/// Parse a canonical integer literal: optional `-`, no leading zeros, no
/// surrounding whitespace, in i64 range. `"-0"` and `"01"` are not
/// canonical and stay strings.
fn canonical_int(bytes: &[u8]) -> Option<i64> {
    let (neg, digits) = match bytes.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, bytes),
    };
    if digits.is_empty() || !digits.iter().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits[0] == b'0' && (digits.len() > 1 || neg) {
        return None;
    }
    let text = std::str::from_utf8(bytes).ok()?;
    text.parse::<i64>().ok()
}

#[derive(Debug, Clone, Default)]
pub struct ArrayData {
    map: IndexMap<ArrayKey, Slot>,
    /// Cached next auto-increment index (max integer key + 1).
    next_free: i64,
    /// Position of the internal iteration cursor, in insertion order.
    cursor: usize,
}

impl ArrayData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: IndexMap::with_capacity(capacity),
            next_free: 0,
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn next_index(&self) -> i64 {
        self.next_free
    }

    fn bump_next_free(&mut self, key: &ArrayKey) {
        if let ArrayKey::Int(i) = key {
            if *i >= self.next_free {
                self.next_free = i.saturating_add(1);
            }
        }
    }

    pub fn has_key(&self, key: &ArrayKey) -> bool {
        self.map.contains_key(key)
    }

    pub fn get(&self, key: &ArrayKey) -> Option<Val> {
        self.map.get(key).map(Slot::read)
    }

    /// Store a value under `key`. Writing an entry that was reference-bound
    /// goes through the shared cell, so aliases observe the new value.
    pub fn put(&mut self, key: ArrayKey, value: Val) {
        self.bump_next_free(&key);
        match self.map.get_mut(&key) {
            Some(slot) => slot.write(value),
            None => {
                self.map.insert(key, Slot::Value(value));
            }
        }
    }

    /// Convenience for byte-string keys (applies normalization).
    pub fn put_bytes_key(&mut self, key: &[u8], value: Val) {
        self.put(ArrayKey::from_bytes(key), value);
    }

    /// Rebind the entry to an existing shared cell (`$a[k] =& $v`).
    pub fn put_ref(&mut self, key: ArrayKey, var: Var) {
        self.bump_next_free(&key);
        self.map.insert(key, Slot::Ref(var));
    }

    /// Fetch the entry's cell, creating a null entry if absent. This is the
    /// auto-vivifying access used by reference binds; read paths must not
    /// reach it.
    pub fn get_ref(&mut self, key: ArrayKey) -> Var {
        self.bump_next_free(&key);
        self.map
            .entry(key)
            .or_insert_with(|| Slot::Ref(Var::default()))
            .promote()
    }

    /// Remove the entry, preserving the order of the remaining ones.
    pub fn remove(&mut self, key: &ArrayKey) -> Option<Val> {
        let index = self.map.get_index_of(key)?;
        let (_, slot) = self.map.shift_remove_index(index)?;
        if index < self.cursor {
            self.cursor -= 1;
        }
        Some(slot.read())
    }

    /// Assign the next integer key.
    pub fn append(&mut self, value: Val) -> ArrayKey {
        let key = ArrayKey::Int(self.next_free);
        self.next_free += 1;
        self.map.insert(key.clone(), Slot::Value(value));
        key
    }

    pub fn append_ref(&mut self, var: Var) -> ArrayKey {
        let key = ArrayKey::Int(self.next_free);
        self.next_free += 1;
        self.map.insert(key.clone(), Slot::Ref(var));
        key
    }

    /// The value-copy: plain slots become independent (nested arrays copy
    /// recursively, objects stay aliased), reference-bound slots keep their
    /// shared cell. The cursor position carries over; the two cursors then
    /// advance independently.
    pub fn copy(&self) -> ArrayData {
        let mut map = IndexMap::with_capacity(self.map.len());
        for (key, slot) in &self.map {
            map.insert(key.clone(), slot.copy_for_container_copy());
        }
        ArrayData {
            map,
            next_free: self.next_free,
            cursor: self.cursor,
        }
    }

    // ---- cursor ---------------------------------------------------------

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub fn has_current(&self) -> bool {
        self.cursor < self.map.len()
    }

    pub fn current(&self) -> Option<Val> {
        self.map.get_index(self.cursor).map(|(_, slot)| slot.read())
    }

    pub fn current_key(&self) -> Option<ArrayKey> {
        self.map.get_index(self.cursor).map(|(key, _)| key.clone())
    }

    /// Advance the cursor and return the new current value.
    pub fn advance(&mut self) -> Option<Val> {
        if self.cursor < self.map.len() {
            self.cursor += 1;
        }
        self.current()
    }

    // ---- iteration snapshots -------------------------------------------

    pub fn keys(&self) -> Vec<ArrayKey> {
        self.map.keys().cloned().collect()
    }

    pub fn entries_snapshot(&self) -> Vec<(ArrayKey, Val)> {
        self.map
            .iter()
            .map(|(key, slot)| (key.clone(), slot.read()))
            .collect()
    }
}

/// Shared handle to one array container. Cloning the handle shares the
/// container; `copy()` applies the value-copy semantics.
#[derive(Debug, Clone, Default)]
pub struct ArrayRef(Rc<RefCell<ArrayData>>);

impl ArrayRef {
    pub fn new(data: ArrayData) -> Self {
        Self(Rc::new(RefCell::new(data)))
    }

    pub fn borrow(&self) -> Ref<'_, ArrayData> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, ArrayData> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &ArrayRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn copy(&self) -> ArrayRef {
        ArrayRef::new(self.borrow().copy())
    }

    pub fn entries_snapshot(&self) -> Vec<(ArrayKey, Val)> {
        self.borrow().entries_snapshot()
    }

    /// Left-biased key union (`$a + $b`): entries of `self`, then entries of
    /// `other` whose keys `self` lacks. Both sides contribute copies.
    pub fn union(&self, other: &ArrayRef) -> ArrayRef {
        let mut result = self.borrow().copy();
        for (key, value) in other.entries_snapshot() {
            if !result.has_key(&key) {
                result.put(key, value.copy_for_assignment());
            }
        }
        ArrayRef::new(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_normalization() {
        assert_eq!(ArrayKey::from_bytes(b"5"), ArrayKey::Int(5));
        assert_eq!(ArrayKey::from_bytes(b"0"), ArrayKey::Int(0));
        assert_eq!(ArrayKey::from_bytes(b"-3"), ArrayKey::Int(-3));
        assert!(matches!(ArrayKey::from_bytes(b"05"), ArrayKey::Str(_)));
        assert!(matches!(ArrayKey::from_bytes(b"-0"), ArrayKey::Str(_)));
        assert!(matches!(ArrayKey::from_bytes(b" 5"), ArrayKey::Str(_)));
        assert!(matches!(ArrayKey::from_bytes(b"1.5"), ArrayKey::Str(_)));
        // One past i64::MAX stays a string key.
        assert!(matches!(
            ArrayKey::from_bytes(b"9223372036854775808"),
            ArrayKey::Str(_)
        ));
    }

    #[test]
    fn normalized_keys_share_one_slot() {
        let mut arr = ArrayData::new();
        arr.put_bytes_key(b"5", Val::Int(1));
        assert_eq!(arr.get(&ArrayKey::Int(5)), Some(Val::Int(1)));
        assert_eq!(arr.len(), 1);

        arr.put_bytes_key(b"05", Val::Int(2));
        assert_eq!(arr.get(&ArrayKey::Int(5)), Some(Val::Int(1)));
        assert_eq!(arr.len(), 2);
    }

    #[test]
    fn append_tracks_max_int_key() {
        let mut arr = ArrayData::new();
        assert_eq!(arr.append(Val::Int(10)), ArrayKey::Int(0));
        arr.put(ArrayKey::Int(7), Val::Int(20));
        assert_eq!(arr.append(Val::Int(30)), ArrayKey::Int(8));
        // String keys never advance the auto index.
        arr.put_bytes_key(b"name", Val::Int(40));
        assert_eq!(arr.append(Val::Int(50)), ArrayKey::Int(9));
    }

    #[test]
    fn copy_is_independent() {
        let mut a = ArrayData::new();
        a.put_bytes_key(b"x", Val::Int(1));
        let mut b = a.copy();
        b.put_bytes_key(b"x", Val::Int(9));
        b.put_bytes_key(b"y", Val::Int(2));
        assert_eq!(a.get(&ArrayKey::from_bytes(b"x")), Some(Val::Int(1)));
        assert!(!a.has_key(&ArrayKey::from_bytes(b"y")));
    }

    #[test]
    fn copy_preserves_ref_slots() {
        let mut a = ArrayData::new();
        let shared = a.get_ref(ArrayKey::from_bytes(b"r"));
        a.put_bytes_key(b"v", Val::Int(1));

        let b = a.copy();
        shared.set(Val::Int(42));
        assert_eq!(b.get(&ArrayKey::from_bytes(b"r")), Some(Val::Int(42)));

        // Plain slots in the copy stay independent.
        let mut b = b;
        b.put_bytes_key(b"v", Val::Int(9));
        assert_eq!(a.get(&ArrayKey::from_bytes(b"v")), Some(Val::Int(1)));
    }

    #[test]
    fn put_through_ref_slot_updates_aliases() {
        let mut arr = ArrayData::new();
        let cell = arr.get_ref(ArrayKey::Int(0));
        arr.put(ArrayKey::Int(0), Val::Int(5));
        assert_eq!(cell.get(), Val::Int(5));
    }

    #[test]
    fn cursor_walk() {
        let mut arr = ArrayData::new();
        arr.append(Val::Int(10));
        arr.append(Val::Int(20));
        assert_eq!(arr.current(), Some(Val::Int(10)));
        assert_eq!(arr.advance(), Some(Val::Int(20)));
        assert_eq!(arr.advance(), None);
        assert!(!arr.has_current());
        arr.rewind();
        assert_eq!(arr.current_key(), Some(ArrayKey::Int(0)));
    }

    #[test]
    fn cursors_of_copies_are_independent() {
        let mut a = ArrayData::new();
        a.append(Val::Int(1));
        a.append(Val::Int(2));
        a.advance();

        // The copy inherits the position but advances on its own.
        let mut b = a.copy();
        assert_eq!(b.current(), Some(Val::Int(2)));
        b.advance();
        assert!(!b.has_current());
        assert_eq!(a.current(), Some(Val::Int(2)));

        a.rewind();
        assert_eq!(a.current(), Some(Val::Int(1)));
        assert!(!b.has_current());
    }

    #[test]
    fn remove_keeps_order_and_cursor() {
        let mut arr = ArrayData::new();
        arr.append(Val::Int(1));
        arr.append(Val::Int(2));
        arr.append(Val::Int(3));
        arr.advance();
        arr.advance(); // cursor at the third entry

        arr.remove(&ArrayKey::Int(0));
        assert_eq!(arr.current(), Some(Val::Int(3)));
        assert_eq!(
            arr.keys(),
            vec![ArrayKey::Int(1), ArrayKey::Int(2)]
        );
    }
}

//! Runtime values and type juggling
//!
//! The closed variant every runtime datum lives in, plus the PHP conversion
//! and comparison rules that go with it.
//!
//! ## Mutation model
//!
//! Operators never mutate a `Val` in place: increment, assignment and
//! friends replace the value stored in the owning slot (a reference cell or
//! a container entry). The two exceptions are the `Array` and `Object`
//! payloads, which are mutable containers with meaningful identity; their
//! interior mutability is what element/field reference semantics hang off.
//!
//! ## Coercion rules
//!
//! - To bool: falsy are `null`, `false`, `0`, `0.0`, `""`, `"0"` and the
//!   empty array.
//! - To int/float: numeric strings parse by their leading numeric prefix;
//!   strings with no numeric prefix become `0` (the call sites that have an
//!   environment raise the recoverable diagnostic).
//! - To string: `null` → `""`, `true` → `"1"`, `false` → `""`, arrays
//!   render as the `Array` sentinel rather than failing.
//!
//! ## References
//!
//! - Zend: `$PHP_SRC_PATH/Zend/zend_operators.c` - conversion and
//!   comparison functions
//! - PHP Manual: https://www.php.net/manual/en/language.types.type-juggling.php

use crate::core::array::ArrayRef;
use crate::runtime::object::ObjectRef;
use std::any::Any;
use std::cmp::Ordering;
use std::rc::Rc;

/// Interned name (variable, function, class or member).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Symbol(pub u32);

#[derive(Debug, Clone)]
pub enum Val {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Rc<Vec<u8>>), // PHP strings are byte sequences
    Array(ArrayRef),
    Object(ObjectRef),
    Resource(Rc<dyn Any>),
}

/// Result of numeric-string parsing and of numeric promotion.
#[derive(Debug, Clone, Copy)]
pub enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    pub fn to_f64(self) -> f64 {
        match self {
            Numeric::Int(i) => i as f64,
            Numeric::Float(f) => f,
        }
    }

    pub fn to_i64(self) -> i64 {
        match self {
            Numeric::Int(i) => i,
            Numeric::Float(f) => f as i64,
        }
    }

    pub fn to_val(self) -> Val {
        match self {
            Numeric::Int(i) => Val::Int(i),
            Numeric::Float(f) => Val::Float(f),
        }
    }

    fn is_float(self) -> bool {
        matches!(self, Numeric::Float(_))
    }
}

/// Parse the leading numeric prefix of a byte string.
///
/// Returns the parsed number and whether the whole string (modulo
/// surrounding whitespace) was numeric. `None` when no prefix parses.
/// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - is_numeric_string_ex
pub fn parse_numeric(s: &[u8]) -> Option<(Numeric, bool)> {
    let is_ws = |b: u8| matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c);

    let mut pos = 0;
    while pos < s.len() && is_ws(s[pos]) {
        pos += 1;
    }

    let start = pos;
    if pos < s.len() && (s[pos] == b'+' || s[pos] == b'-') {
        pos += 1;
    }

    let int_digits_from = pos;
    while pos < s.len() && s[pos].is_ascii_digit() {
        pos += 1;
    }
    let int_digits = pos - int_digits_from;

    let mut is_float = false;
    if pos < s.len() && s[pos] == b'.' {
        let frac_from = pos + 1;
        let mut frac_to = frac_from;
        while frac_to < s.len() && s[frac_to].is_ascii_digit() {
            frac_to += 1;
        }
        if int_digits > 0 || frac_to > frac_from {
            is_float = true;
            pos = frac_to;
        }
    }

    if int_digits == 0 && !is_float {
        return None;
    }

    // Exponent part only counts when followed by at least one digit.
    if pos < s.len() && (s[pos] == b'e' || s[pos] == b'E') {
        let mut exp = pos + 1;
        if exp < s.len() && (s[exp] == b'+' || s[exp] == b'-') {
            exp += 1;
        }
        let exp_digits_from = exp;
        while exp < s.len() && s[exp].is_ascii_digit() {
            exp += 1;
        }
        if exp > exp_digits_from {
            is_float = true;
            pos = exp;
        }
    }

    let text = std::str::from_utf8(&s[start..pos]).ok()?;

    let mut rest = pos;
    while rest < s.len() && is_ws(s[rest]) {
        rest += 1;
    }
    let fully = rest == s.len();

    if is_float {
        text.parse::<f64>().ok().map(|f| (Numeric::Float(f), fully))
    } else {
        match text.parse::<i64>() {
            Ok(i) => Some((Numeric::Int(i), fully)),
            // Integer overflow falls back to float precision.
            Err(_) => text.parse::<f64>().ok().map(|f| (Numeric::Float(f), fully)),
        }
    }
}

impl Val {
    pub fn string(bytes: impl Into<Vec<u8>>) -> Val {
        Val::String(Rc::new(bytes.into()))
    }

    pub fn empty_array() -> Val {
        Val::Array(ArrayRef::default())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Val::Null => "null",
            Val::Bool(_) => "bool",
            Val::Int(_) => "int",
            Val::Float(_) => "float",
            Val::String(_) => "string",
            Val::Array(_) => "array",
            Val::Object(_) => "object",
            Val::Resource(_) => "resource",
        }
    }

    /// True for every value except `null`. The "unset" state is the absence
    /// of a slot, which is distinct from a stored `null`; both report unset
    /// to language-level existence probes.
    pub fn is_set(&self) -> bool {
        !matches!(self, Val::Null)
    }

    /// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - zend_is_true
    pub fn to_bool(&self) -> bool {
        match self {
            Val::Null => false,
            Val::Bool(b) => *b,
            Val::Int(i) => *i != 0,
            Val::Float(f) => *f != 0.0 && !f.is_nan(),
            Val::String(s) => !(s.is_empty() || s.as_slice() == b"0"),
            Val::Array(arr) => !arr.borrow().is_empty(),
            Val::Object(_) | Val::Resource(_) => true,
        }
    }

    /// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - _zval_get_long_func
    pub fn to_int(&self) -> i64 {
        match self {
            Val::Null => 0,
            Val::Bool(b) => *b as i64,
            Val::Int(i) => *i,
            Val::Float(f) => *f as i64,
            Val::String(s) => match parse_numeric(s) {
                Some((n, _)) => n.to_i64(),
                None => 0,
            },
            Val::Array(arr) => {
                if arr.borrow().is_empty() {
                    0
                } else {
                    1
                }
            }
            Val::Object(_) => 1,
            Val::Resource(_) => 0,
        }
    }

    /// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - _zval_get_double_func
    pub fn to_float(&self) -> f64 {
        match self {
            Val::Float(f) => *f,
            Val::String(s) => match parse_numeric(s) {
                Some((n, _)) => n.to_f64(),
                None => 0.0,
            },
            other => other.to_int() as f64,
        }
    }

    /// Convert to the observable byte-string form.
    ///
    /// Total: arrays produce the `Array` sentinel and objects `Object`; the
    /// evaluation layer raises the accompanying diagnostic where an
    /// environment is available.
    /// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - zend_make_printable_zval
    pub fn to_string_bytes(&self) -> Vec<u8> {
        match self {
            Val::Null => Vec::new(),
            Val::Bool(b) => {
                if *b {
                    b"1".to_vec()
                } else {
                    Vec::new()
                }
            }
            Val::Int(i) => i.to_string().into_bytes(),
            Val::Float(f) => float_to_bytes(*f),
            Val::String(s) => s.to_vec(),
            Val::Array(_) => b"Array".to_vec(),
            Val::Object(_) => b"Object".to_vec(),
            Val::Resource(_) => b"Resource".to_vec(),
        }
    }

    /// The value a fully numeric operand contributes to a numeric
    /// comparison, if it is one.
    pub fn as_fully_numeric(&self) -> Option<Numeric> {
        match self {
            Val::Int(i) => Some(Numeric::Int(*i)),
            Val::Float(f) => Some(Numeric::Float(*f)),
            Val::String(s) => match parse_numeric(s) {
                Some((n, true)) => Some(n),
                _ => None,
            },
            _ => None,
        }
    }

    /// Numeric promotion for arithmetic operands.
    fn numeric(&self) -> Numeric {
        match self {
            Val::Int(i) => Numeric::Int(*i),
            Val::Float(f) => Numeric::Float(*f),
            Val::String(s) => match parse_numeric(s) {
                Some((n, _)) => n,
                None => Numeric::Int(0),
            },
            other => Numeric::Int(other.to_int()),
        }
    }

    /// A value safe to store into an independent slot: arrays copy,
    /// everything else (objects included) shares.
    pub fn copy_for_assignment(&self) -> Val {
        match self {
            Val::Array(arr) => Val::Array(arr.copy()),
            other => other.clone(),
        }
    }

    // ---- arithmetic -----------------------------------------------------

    /// Addition, with `array + array` computing the left-biased union.
    /// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - add_function
    pub fn add(&self, rhs: &Val) -> Val {
        if let (Val::Array(a), Val::Array(b)) = (self, rhs) {
            return Val::Array(a.union(b));
        }
        binary_numeric(self.numeric(), rhs.numeric(), i64::checked_add, |a, b| a + b)
    }

    pub fn sub(&self, rhs: &Val) -> Val {
        binary_numeric(self.numeric(), rhs.numeric(), i64::checked_sub, |a, b| a - b)
    }

    pub fn mul(&self, rhs: &Val) -> Val {
        binary_numeric(self.numeric(), rhs.numeric(), i64::checked_mul, |a, b| a * b)
    }

    /// Division of a non-zero divisor; exact integer quotients stay `Int`.
    /// The zero-divisor policy lives at the operator evaluation site.
    pub fn div(&self, rhs: &Val) -> Val {
        let (a, b) = (self.numeric(), rhs.numeric());
        if let (Numeric::Int(x), Numeric::Int(y)) = (a, b) {
            if y != 0 && x % y == 0 {
                if let Some(q) = x.checked_div(y) {
                    return Val::Int(q);
                }
            }
        }
        Val::Float(a.to_f64() / b.to_f64())
    }

    /// Integer modulo of a non-zero divisor.
    pub fn rem(&self, rhs: &Val) -> Val {
        let b = rhs.to_int();
        match self.to_int().checked_rem(b) {
            Some(r) => Val::Int(r),
            None => Val::Int(0),
        }
    }

    pub fn neg(&self) -> Val {
        match self.numeric() {
            Numeric::Int(i) => match i.checked_neg() {
                Some(n) => Val::Int(n),
                None => Val::Float(-(i as f64)),
            },
            Numeric::Float(f) => Val::Float(-f),
        }
    }

    // ---- bitwise --------------------------------------------------------

    pub fn bit_and(&self, rhs: &Val) -> Val {
        Val::Int(self.to_int() & rhs.to_int())
    }

    pub fn bit_or(&self, rhs: &Val) -> Val {
        Val::Int(self.to_int() | rhs.to_int())
    }

    pub fn bit_xor(&self, rhs: &Val) -> Val {
        Val::Int(self.to_int() ^ rhs.to_int())
    }

    pub fn bit_not(&self) -> Val {
        Val::Int(!self.to_int())
    }

    /// Shifts saturate past the word width instead of wrapping.
    pub fn shl(&self, rhs: &Val) -> Val {
        let shift = rhs.to_int();
        let base = self.to_int();
        if !(0..64).contains(&shift) {
            return Val::Int(0);
        }
        Val::Int(base.wrapping_shl(shift as u32))
    }

    pub fn shr(&self, rhs: &Val) -> Val {
        let shift = rhs.to_int();
        let base = self.to_int();
        if !(0..64).contains(&shift) {
            return Val::Int(if base < 0 { -1 } else { 0 });
        }
        Val::Int(base >> shift)
    }

    // ---- increment / decrement -----------------------------------------

    /// The `++` replacement value.
    /// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - increment_function
    pub fn increment(&self) -> Val {
        match self {
            Val::Null => Val::Int(1),
            Val::Int(i) => match i.checked_add(1) {
                Some(n) => Val::Int(n),
                None => Val::Float(*i as f64 + 1.0),
            },
            Val::Float(f) => Val::Float(f + 1.0),
            Val::String(s) => match parse_numeric(s) {
                Some((n, true)) => n.to_val().increment(),
                _ => self.clone(),
            },
            other => other.clone(),
        }
    }

    /// The `--` replacement value. Decrementing `null` leaves it `null`.
    pub fn decrement(&self) -> Val {
        match self {
            Val::Null => Val::Null,
            Val::Int(i) => match i.checked_sub(1) {
                Some(n) => Val::Int(n),
                None => Val::Float(*i as f64 - 1.0),
            },
            Val::Float(f) => Val::Float(f - 1.0),
            Val::String(s) => match parse_numeric(s) {
                Some((n, true)) => n.to_val().decrement(),
                _ => self.clone(),
            },
            other => other.clone(),
        }
    }

    // ---- comparison -----------------------------------------------------

    /// Loose (`==`) comparison with type juggling.
    ///
    /// Coercion runs toward the more structured operand with the fixed
    /// precedence bool > numeric > string > array; arrays compare as
    /// order-insensitive key/value sets; objects compare field-wise under a
    /// visited-pair guard so cyclic structures terminate.
    pub fn loose_equals(&self, other: &Val) -> bool {
        loose_eq(self, other, &mut Vec::new())
    }

    /// Strict (`===`) comparison: same kind and same value. Arrays must
    /// match pairwise in order; objects must be the same instance.
    pub fn identical_to(&self, other: &Val) -> bool {
        identical(self, other, &mut Vec::new())
    }

    /// Relational ordering used by `<`, `<=`, `>`, `>=`.
    pub fn loose_cmp(&self, other: &Val) -> Ordering {
        if let (Val::String(a), Val::String(b)) = (self, other) {
            return match (self.as_fully_numeric(), other.as_fully_numeric()) {
                (Some(x), Some(y)) => {
                    x.to_f64().partial_cmp(&y.to_f64()).unwrap_or(Ordering::Equal)
                }
                _ => a.as_slice().cmp(b.as_slice()),
            };
        }
        if matches!(self, Val::Bool(_) | Val::Null) || matches!(other, Val::Bool(_) | Val::Null) {
            return self.to_bool().cmp(&other.to_bool());
        }
        if let (Val::Array(a), Val::Array(b)) = (self, other) {
            return a.borrow().len().cmp(&b.borrow().len());
        }
        self.to_float()
            .partial_cmp(&other.to_float())
            .unwrap_or(Ordering::Equal)
    }
}

fn binary_numeric(
    a: Numeric,
    b: Numeric,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Val {
    if a.is_float() || b.is_float() {
        return Val::Float(float_op(a.to_f64(), b.to_f64()));
    }
    let (x, y) = (a.to_i64(), b.to_i64());
    match int_op(x, y) {
        Some(result) => Val::Int(result),
        // Overflow promotes the whole operation to float.
        None => Val::Float(float_op(x as f64, y as f64)),
    }
}

fn float_to_bytes(f: f64) -> Vec<u8> {
    if f.is_nan() {
        return b"NAN".to_vec();
    }
    if f.is_infinite() {
        return if f > 0.0 { b"INF".to_vec() } else { b"-INF".to_vec() };
    }
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{:.0}", f).into_bytes()
    } else {
        format!("{}", f).into_bytes()
    }
}

/// Pairs of container addresses already under comparison; cycles through
/// shared cells or self-referential fields compare equal instead of
/// recursing forever.
type VisitedPairs = Vec<(usize, usize)>;

fn loose_eq(a: &Val, b: &Val, visited: &mut VisitedPairs) -> bool {
    match (a, b) {
        (Val::Null, Val::Null) => true,
        (Val::Bool(_), _) | (_, Val::Bool(_)) => a.to_bool() == b.to_bool(),
        (Val::Array(x), Val::Array(y)) => {
            let pair = (x.addr(), y.addr());
            if x.ptr_eq(y) || visited.contains(&pair) {
                return true;
            }
            visited.push(pair);
            let xs = x.entries_snapshot();
            if xs.len() != y.borrow().len() {
                return false;
            }
            xs.iter().all(|(key, value)| match y.borrow().get(key) {
                Some(other) => loose_eq(value, &other, visited),
                None => false,
            })
        }
        (Val::Null, Val::Array(arr)) | (Val::Array(arr), Val::Null) => arr.borrow().is_empty(),
        (Val::Array(_), _) | (_, Val::Array(_)) => false,
        (Val::Object(x), Val::Object(y)) => {
            if x.ptr_eq(y) {
                return true;
            }
            let pair = (x.addr(), y.addr());
            if visited.contains(&pair) {
                return true;
            }
            visited.push(pair);
            if !x.same_class(y) {
                return false;
            }
            let fields = x.fields_snapshot();
            if fields.len() != y.borrow().field_count() {
                return false;
            }
            fields
                .iter()
                .all(|(name, value)| match y.borrow().get_field(*name) {
                    Some(other) => loose_eq(value, &other, visited),
                    None => false,
                })
        }
        (Val::Object(_), _) | (_, Val::Object(_)) => false,
        (Val::Resource(x), Val::Resource(y)) => Rc::ptr_eq(x, y),
        (Val::Resource(_), _) | (_, Val::Resource(_)) => false,
        (Val::String(x), Val::String(y)) => {
            match (a.as_fully_numeric(), b.as_fully_numeric()) {
                (Some(m), Some(n)) => m.to_f64() == n.to_f64(),
                _ => x == y,
            }
        }
        // Null against a string compares as the empty string; against the
        // remaining kinds (numerics) it degrades to the boolean comparison.
        (Val::Null, Val::String(s)) | (Val::String(s), Val::Null) => s.is_empty(),
        (Val::Null, _) | (_, Val::Null) => a.to_bool() == b.to_bool(),
        // Mixed numeric/string: a numeric-looking string compares
        // numerically, anything else compares by its rendered form.
        _ => match (a.as_fully_numeric(), b.as_fully_numeric()) {
            (Some(m), Some(n)) => m.to_f64() == n.to_f64(),
            _ => a.to_string_bytes() == b.to_string_bytes(),
        },
    }
}

fn identical(a: &Val, b: &Val, visited: &mut VisitedPairs) -> bool {
    match (a, b) {
        (Val::Null, Val::Null) => true,
        (Val::Bool(x), Val::Bool(y)) => x == y,
        (Val::Int(x), Val::Int(y)) => x == y,
        (Val::Float(x), Val::Float(y)) => x == y,
        (Val::String(x), Val::String(y)) => x == y,
        (Val::Array(x), Val::Array(y)) => {
            let pair = (x.addr(), y.addr());
            if x.ptr_eq(y) || visited.contains(&pair) {
                return true;
            }
            visited.push(pair);
            let (xs, ys) = (x.entries_snapshot(), y.entries_snapshot());
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys.iter())
                    .all(|((ka, va), (kb, vb))| ka == kb && identical(va, vb, visited))
        }
        (Val::Object(x), Val::Object(y)) => x.ptr_eq(y),
        (Val::Resource(x), Val::Resource(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

impl PartialEq for Val {
    fn eq(&self, other: &Self) -> bool {
        self.identical_to(other)
    }
}

impl From<i64> for Val {
    fn from(i: i64) -> Val {
        Val::Int(i)
    }
}

impl From<f64> for Val {
    fn from(f: f64) -> Val {
        Val::Float(f)
    }
}

impl From<bool> for Val {
    fn from(b: bool) -> Val {
        Val::Bool(b)
    }
}

impl From<&str> for Val {
    fn from(s: &str) -> Val {
        Val::string(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Val {
    fn from(bytes: Vec<u8>) -> Val {
        Val::string(bytes)
    }
}

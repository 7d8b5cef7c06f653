//! Managed value representation
//!
//! Shared value representation for arguments and return values crossing the
//! bridge.
//! - Null, Bool, Int: Immediate values (stack-allocated)
//! - Str: Heap-allocated, reference-counted (Arc<str>), immutable
//! - Bytes: Reference-counted byte buffer (Arc<[u8]>), immutable
//! - Tuple: Copy-on-write (ValueTuple wrapping Arc<Vec<Value>>), value semantics
//! - Wrapped: Managed proxy for a native handle (see [`crate::proxy`])

use crate::proxy::WrappedObject;
use std::fmt;
use std::sync::Arc;

/// Copy-on-write tuple. Cheap to clone (refcount bump).
/// Mutations on a shared tuple clone the inner Vec first (Arc::make_mut).
#[derive(Clone, Debug, Default)]
pub struct ValueTuple(Arc<Vec<Value>>);

impl ValueTuple {
    pub fn new() -> Self {
        ValueTuple(Arc::new(Vec::new()))
    }

    pub fn from_vec(v: Vec<Value>) -> Self {
        ValueTuple(Arc::new(v))
    }

    /// Read access — no clone needed.
    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Mutating access — triggers CoW if Arc is shared.
    pub fn push(&mut self, value: Value) {
        Arc::make_mut(&mut self.0).push(value);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    /// Convert to owned Vec — clones only if shared.
    pub fn into_vec(self) -> Vec<Value> {
        Arc::try_unwrap(self.0).unwrap_or_else(|arc| (*arc).clone())
    }
}

impl PartialEq for ValueTuple {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_slice() == other.0.as_slice()
    }
}

impl std::ops::Index<usize> for ValueTuple {
    type Output = Value;
    fn index(&self, index: usize) -> &Value {
        &self.0[index]
    }
}

impl From<Vec<Value>> for ValueTuple {
    fn from(v: Vec<Value>) -> Self {
        ValueTuple::from_vec(v)
    }
}

impl FromIterator<Value> for ValueTuple {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        ValueTuple(Arc::new(iter.into_iter().collect()))
    }
}

/// A value crossing the bridge in either direction
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    /// Absent value; also the "no error" marker in error-indicator slots
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Str(Arc<str>),
    Bytes(Arc<[u8]>),
    Tuple(ValueTuple),
    /// Managed proxy for a native handle
    Wrapped(WrappedObject),
}

impl Value {
    pub fn str(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn bytes(b: impl Into<Arc<[u8]>>) -> Self {
        Value::Bytes(b.into())
    }

    /// Type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::Tuple(_) => "tuple",
            Value::Wrapped(_) => "wrapped",
        }
    }

    /// Integer view, if this value is an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_wrapped(&self) -> Option<&WrappedObject> {
        match self {
            Value::Wrapped(w) => Some(w),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Fold another out-value into an aggregated return.
    ///
    /// Synchronous wrapper paths collect several out-values into one managed
    /// return: a lone `Null` is replaced by the value, a single value becomes a
    /// pair, and a tuple is extended in place.
    pub fn append_result(self, value: Value) -> Value {
        match self {
            Value::Null => value,
            Value::Tuple(mut tuple) => {
                tuple.push(value);
                Value::Tuple(tuple)
            }
            other => Value::Tuple(ValueTuple::from_vec(vec![other, value])),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<WrappedObject> for Value {
    fn from(w: WrappedObject) -> Self {
        Value::Wrapped(w)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Tuple(t) => {
                write!(f, "(")?;
                for (i, v) in t.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, ")")
            }
            Value::Wrapped(w) => write!(f, "<{} handle {}>", w.kind(), w.raw()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_result_null_becomes_value() {
        let result = Value::Null.append_result(Value::Int(5));
        assert_eq!(result, Value::Int(5));
    }

    #[test]
    fn test_append_result_value_becomes_pair() {
        let result = Value::Int(1).append_result(Value::str("x"));
        let Value::Tuple(tuple) = result else {
            panic!("expected tuple");
        };
        assert_eq!(tuple.as_slice(), &[Value::Int(1), Value::str("x")]);
    }

    #[test]
    fn test_append_result_tuple_is_extended() {
        let result = Value::Int(1)
            .append_result(Value::Int(2))
            .append_result(Value::Int(3));
        let Value::Tuple(tuple) = result else {
            panic!("expected tuple");
        };
        assert_eq!(tuple.len(), 3);
        assert_eq!(tuple[2], Value::Int(3));
    }

    #[test]
    fn test_tuple_cow_preserves_original() {
        let original = ValueTuple::from_vec(vec![Value::Int(1)]);
        let mut copy = original.clone();
        copy.push(Value::Int(2));
        assert_eq!(original.len(), 1);
        assert_eq!(copy.len(), 2);
    }

    #[test]
    fn test_as_int_only_on_integers() {
        assert_eq!(Value::Int(7).as_int(), Some(7));
        assert_eq!(Value::Bool(true).as_int(), None);
        assert_eq!(Value::str("7").as_int(), None);
    }
}

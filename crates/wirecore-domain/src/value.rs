//! Uniform value representation at the proxy boundary
//!
//! The interceptor chain always deals in `Value`: primitives are boxed into
//! their variant when marshalled into the argument array and unboxed on
//! return with exact kind correspondence. Wide primitives (64-bit) take a
//! dedicated return path so narrowing can never happen silently.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// An opaque component instance handed across the container boundary
pub type Instance = Arc<dyn Any + Send + Sync>;

/// The kind of a parameter or return slot in a method signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// No value (void return)
    Void,
    /// Boolean primitive
    Bool,
    /// 8-bit integer primitive
    I8,
    /// 16-bit integer primitive
    I16,
    /// 32-bit integer primitive
    I32,
    /// 64-bit integer primitive (wide)
    I64,
    /// 32-bit float primitive
    F32,
    /// 64-bit float primitive (wide)
    F64,
    /// Character primitive
    Char,
    /// Any reference type, including strings
    Reference,
    /// Array reference type
    Array,
}

impl ValueKind {
    /// Whether this kind is a primitive (needs boxing at the proxy boundary)
    pub fn is_primitive(self) -> bool {
        !matches!(self, ValueKind::Reference | ValueKind::Array | ValueKind::Void)
    }

    /// Wide primitives occupy the wide return path (64-bit)
    pub fn is_wide(self) -> bool {
        matches!(self, ValueKind::I64 | ValueKind::F64)
    }
}

/// A boxed value crossing the interceptor boundary
#[derive(Clone)]
pub enum Value {
    /// Absent reference
    Null,
    /// Result of a void method
    Unit,
    /// Boxed boolean
    Bool(bool),
    /// Boxed 8-bit integer
    I8(i8),
    /// Boxed 16-bit integer
    I16(i16),
    /// Boxed 32-bit integer
    I32(i32),
    /// Boxed 64-bit integer
    I64(i64),
    /// Boxed 32-bit float
    F32(f32),
    /// Boxed 64-bit float
    F64(f64),
    /// Boxed character
    Char(char),
    /// String value
    Str(String),
    /// Opaque reference value
    Ref(Instance),
    /// Array value
    Array(Vec<Value>),
}

impl Value {
    /// The kind this value occupies at the proxy boundary
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Unit => ValueKind::Void,
            Value::Bool(_) => ValueKind::Bool,
            Value::I8(_) => ValueKind::I8,
            Value::I16(_) => ValueKind::I16,
            Value::I32(_) => ValueKind::I32,
            Value::I64(_) => ValueKind::I64,
            Value::F32(_) => ValueKind::F32,
            Value::F64(_) => ValueKind::F64,
            Value::Char(_) => ValueKind::Char,
            Value::Null | Value::Str(_) | Value::Ref(_) => ValueKind::Reference,
            Value::Array(_) => ValueKind::Array,
        }
    }

    /// Whether this value is the absent reference
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Wrap an instance as a reference value
    pub fn reference(instance: Instance) -> Self {
        Value::Ref(instance)
    }

    /// Downcast a reference value to a concrete type
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            Value::Ref(instance) => instance.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Unit => write!(f, "Unit"),
            Value::Bool(v) => write!(f, "Bool({v})"),
            Value::I8(v) => write!(f, "I8({v})"),
            Value::I16(v) => write!(f, "I16({v})"),
            Value::I32(v) => write!(f, "I32({v})"),
            Value::I64(v) => write!(f, "I64({v})"),
            Value::F32(v) => write!(f, "F32({v})"),
            Value::F64(v) => write!(f, "F64({v})"),
            Value::Char(v) => write!(f, "Char({v:?})"),
            Value::Str(v) => write!(f, "Str({v:?})"),
            Value::Ref(_) => write!(f, "Ref(<opaque>)"),
            Value::Array(items) => f.debug_tuple("Array").field(items).finish(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) | (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Ref(a), Value::Ref(b)) => Arc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_distinguishes_wide_primitives() {
        assert!(Value::I64(1).kind().is_wide());
        assert!(Value::F64(1.0).kind().is_wide());
        assert!(!Value::I32(1).kind().is_wide());
    }

    #[test]
    fn test_null_is_a_reference_kind() {
        assert_eq!(Value::Null.kind(), ValueKind::Reference);
        assert!(Value::Null.is_null());
    }

    #[test]
    fn test_ref_equality_is_identity() {
        let a: Instance = Arc::new("hello".to_string());
        let v1 = Value::reference(a.clone());
        let v2 = Value::reference(a);
        let v3 = Value::reference(Arc::new("hello".to_string()));
        assert_eq!(v1, v2);
        assert_ne!(v1, v3);
    }
}

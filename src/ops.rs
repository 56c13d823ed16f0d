//! Value coercions shared by the interpreter and by generated source.
//!
//! Generated fragments call into this module by absolute path
//! (`::ogel_lang::ops::boolean_value`), so the signatures here are part of
//! the fragment contract.

use rust_decimal::{Decimal, prelude::FromPrimitive};

use crate::value::Value;

/// Anything that can be coerced to a boolean.
///
/// Implemented for [`Value`] and for the native operand types a generated
/// fragment may produce, so `boolean_value` accepts both.
pub trait Truthy {
    fn truthy(&self) -> bool;
}

impl Truthy for Value {
    fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Map(_) | Value::Object(_) => true,
        }
    }
}

impl Truthy for bool {
    fn truthy(&self) -> bool {
        *self
    }
}

impl Truthy for i64 {
    fn truthy(&self) -> bool {
        *self != 0
    }
}

impl Truthy for f64 {
    fn truthy(&self) -> bool {
        *self != 0.0
    }
}

impl Truthy for str {
    fn truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for String {
    fn truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T: Truthy> Truthy for Option<T> {
    fn truthy(&self) -> bool {
        self.as_ref().is_some_and(Truthy::truthy)
    }
}

/// Boolean coercion: null, `false`, numeric zero and the empty string are
/// false; every other value is true.
pub fn boolean_value<T: Truthy + ?Sized>(value: &T) -> bool {
    value.truthy()
}

/// Equality used by `==` / `!=`.
///
/// Integers and floats compare by exact numeric value; host objects compare
/// by identity.
pub fn equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Integer(i), Value::Float(f)) | (Value::Float(f), Value::Integer(i)) => {
            Decimal::from_f64(*f).is_some_and(|fd| fd == Decimal::from(*i))
        }
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| equals(l, r))
        }
        (Value::Map(x), Value::Map(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| equals(v, other)))
        }
        (Value::Object(x), Value::Object(y)) => x.ptr_eq(y),
        _ => false,
    }
}

use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{ops, reflect::ObjectRef};

/// A runtime value flowing through expression evaluation.
///
/// Scalars, arrays and string-keyed maps are plain data. Host objects are
/// carried as [`ObjectRef`]s and navigated through their registered class
/// descriptor.
///
/// # Examples
///
/// ```
/// use ogel_lang::Value;
///
/// let v = Value::from("hello");
/// assert!(v.is_truthy());
/// assert!(!Value::from(0).is_truthy());
/// assert!(!Value::Null.is_truthy());
/// ```
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,

    Boolean(bool),

    Integer(i64),

    Float(f64),

    String(String),

    Array(Vec<Value>),

    Map(HashMap<String, Value>),

    /// Host instance; compared by identity.
    Object(ObjectRef),
}

impl Value {
    /// Truthiness per the engine's coercion rules, see [`ops::boolean_value`].
    pub fn is_truthy(&self) -> bool {
        ops::boolean_value(self)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Human-readable type name, the class name for host objects.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Object(obj) => obj.class().name(),
        }
    }

    pub fn type_hint(&self) -> TypeHint {
        match self {
            Value::Null => TypeHint::Null,
            Value::Boolean(_) => TypeHint::Boolean,
            Value::Integer(_) => TypeHint::Integer,
            Value::Float(_) => TypeHint::Float,
            Value::String(_) => TypeHint::String,
            Value::Array(_) => TypeHint::Array,
            Value::Map(_) => TypeHint::Map,
            Value::Object(obj) => TypeHint::Object(obj.class().name().to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        ops::equals(self, other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                f.write_str("{")?;
                for (i, key) in keys.into_iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key:?}: {}", map[key])?;
                }
                f.write_str("}")
            }
            Value::Object(obj) => write!(f, "{obj:?}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        i64::try_from(n).map_or(Value::Float(n as f64), Value::Integer)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(map: HashMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

/// Static type annotation recorded on the context while generating source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TypeHint {
    /// Only known at runtime; fragments of this type are `Value` expressions.
    #[default]
    Dynamic,
    Null,
    /// Fragments of this type are native `bool` expressions.
    Boolean,
    Integer,
    Float,
    String,
    Array,
    Map,
    Object(String),
}

impl fmt::Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeHint::Dynamic => f.write_str("dynamic"),
            TypeHint::Null => f.write_str("null"),
            TypeHint::Boolean => f.write_str("boolean"),
            TypeHint::Integer => f.write_str("integer"),
            TypeHint::Float => f.write_str("float"),
            TypeHint::String => f.write_str("string"),
            TypeHint::Array => f.write_str("array"),
            TypeHint::Map => f.write_str("map"),
            TypeHint::Object(class) => f.write_str(class),
        }
    }
}

/// Constant carried by a literal node.
///
/// Deserialised untagged, so JSON scalars map directly onto literals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Literal {
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Null => Value::Null,
            Literal::Boolean(b) => Value::Boolean(*b),
            Literal::Integer(n) => Value::Integer(*n),
            Literal::Float(n) => Value::Float(*n),
            Literal::String(s) => Value::String(s.clone()),
        }
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Boolean(b)
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Integer(n)
    }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self {
        Literal::Integer(i64::from(n))
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Literal::Float(n)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}

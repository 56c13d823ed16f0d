//! Navigation primitives shared by the interpreter and generated source.
//!
//! Every read that can reach a host member goes through the context's
//! member access policy; every read that yields null goes through the
//! context's null handlers.

use crate::{
    access::elevated,
    ast::DynamicSubscript,
    context::EvalContext,
    error::{EvalError, EvalResult},
    null_handler::{PropertyKey, on_null_method, on_null_property},
    reflect::{ObjectRef, PropertyAccessor},
    value::Value,
};

/// Value of context variable `name`, null when undefined.
pub fn variable(ctx: &EvalContext, name: &str) -> Value {
    ctx.variable(name).cloned().unwrap_or_default()
}

/// Reads property `name` of `source`.
pub fn get_property(ctx: &EvalContext, source: &Value, name: &str) -> EvalResult<Value> {
    tracing::trace!(property = name, target = source.type_name(), "get property");
    let value = match source {
        Value::Null => return Err(EvalError::null_source("getProperty", name)),
        Value::Map(map) => map.get(name).cloned().unwrap_or_default(),
        Value::Object(obj) => read_object_property(ctx, source, obj, name)?,
        Value::Array(items) if matches!(name, "length" | "size") => Value::from(items.len()),
        Value::String(s) if name == "length" => Value::from(s.chars().count()),
        other => return Err(EvalError::no_such_member(other.type_name(), name)),
    };
    if value.is_null() {
        return Ok(on_null_property(ctx, source, PropertyKey::Name(name.to_string())));
    }
    Ok(value)
}

fn read_object_property(
    ctx: &EvalContext,
    source: &Value,
    obj: &ObjectRef,
    name: &str,
) -> EvalResult<Value> {
    let class = obj.class();
    match class.property(name) {
        Some(PropertyAccessor::Field(field)) => {
            elevated(ctx, source, field.member(), name, || field.get(obj))
        }
        Some(PropertyAccessor::Getter(method)) => {
            elevated(ctx, source, method.member(), name, || method.invoke(obj, &[]))
        }
        None => Err(EvalError::no_such_member(class.name(), name)),
    }
}

/// Reads `source[key]`.
pub fn get_index(ctx: &EvalContext, source: &Value, key: &Value) -> EvalResult<Value> {
    tracing::trace!(%key, target = source.type_name(), "get index");
    let value = match (source, key) {
        (Value::Null, _) => return Err(EvalError::null_source("getIndex", key.to_string())),
        (Value::Array(items), Value::Integer(index)) => {
            let slot = usize::try_from(*index).ok().filter(|i| *i < items.len());
            match slot {
                Some(i) => items[i].clone(),
                None => {
                    return Err(EvalError::IndexOutOfBounds {
                        index: *index,
                        len: items.len(),
                    });
                }
            }
        }
        (Value::Map(map), Value::String(name)) => map.get(name).cloned().unwrap_or_default(),
        (Value::Map(map), other) => map.get(&other.to_string()).cloned().unwrap_or_default(),
        (Value::Object(obj), _) => match obj.class().indexer() {
            Some(indexer) => elevated(ctx, source, indexer.member(), indexer.member().name(), || {
                indexer.get(obj, key)
            })?,
            None => match key {
                Value::String(name) => read_object_property(ctx, source, obj, name)?,
                _ => {
                    return Err(EvalError::type_error(format!(
                        "{} has no indexer",
                        obj.class().name()
                    )));
                }
            },
        },
        (target, key) => {
            return Err(EvalError::type_error(format!(
                "cannot index {} with {}",
                target.type_name(),
                key.type_name()
            )));
        }
    };
    if value.is_null() {
        return Ok(on_null_property(ctx, source, PropertyKey::Index(key.clone())));
    }
    Ok(value)
}

/// Applies a dynamic subscript to an array.
pub fn get_subscript(
    ctx: &EvalContext,
    source: &Value,
    subscript: DynamicSubscript,
) -> EvalResult<Value> {
    let value = match source {
        Value::Null => return Err(EvalError::null_source("getIndex", subscript.to_string())),
        Value::Array(items) => match subscript {
            DynamicSubscript::All => Value::Array(items.clone()),
            _ => subscript
                .position(items.len())
                .map(|i| items[i].clone())
                .unwrap_or_default(),
        },
        other => {
            return Err(EvalError::type_error(format!(
                "subscript {subscript} requires an array, got {}",
                other.type_name()
            )));
        }
    };
    if value.is_null() {
        return Ok(on_null_property(ctx, source, PropertyKey::Subscript(subscript)));
    }
    Ok(value)
}

/// Invokes method `name` on `source`.
pub fn call_method(
    ctx: &EvalContext,
    source: &Value,
    name: &str,
    args: &[Value],
) -> EvalResult<Value> {
    tracing::trace!(method = name, target = source.type_name(), argc = args.len(), "call method");
    let value = match source {
        Value::Null => return Err(EvalError::null_source("callMethod", name)),
        Value::Object(obj) => {
            let class = obj.class();
            let method = class
                .method(name)
                .ok_or_else(|| EvalError::no_such_member(class.name(), name))?;
            elevated(ctx, source, method.member(), name, || method.invoke(obj, args))?
        }
        other => builtin_method(other, name, args)?,
    };
    if value.is_null() {
        return Ok(on_null_method(ctx, source, name, args));
    }
    Ok(value)
}

fn expect_args(name: &str, args: &[Value], expected: usize) -> EvalResult<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvalError::Arity {
            name: name.to_string(),
            expected,
            found: args.len(),
        })
    }
}

/// Methods available on plain data values.
fn builtin_method(target: &Value, name: &str, args: &[Value]) -> EvalResult<Value> {
    match (target, name) {
        (Value::String(s), "length") => {
            expect_args(name, args, 0)?;
            Ok(Value::from(s.chars().count()))
        }
        (Value::Array(items), "length" | "size") => {
            expect_args(name, args, 0)?;
            Ok(Value::from(items.len()))
        }
        (Value::Map(map), "size") => {
            expect_args(name, args, 0)?;
            Ok(Value::from(map.len()))
        }
        (Value::String(s), "isEmpty") => {
            expect_args(name, args, 0)?;
            Ok(Value::from(s.is_empty()))
        }
        (Value::Array(items), "isEmpty") => {
            expect_args(name, args, 0)?;
            Ok(Value::from(items.is_empty()))
        }
        (Value::Map(map), "isEmpty") => {
            expect_args(name, args, 0)?;
            Ok(Value::from(map.is_empty()))
        }
        (Value::String(s), "contains") => {
            expect_args(name, args, 1)?;
            let needle = args[0]
                .as_str()
                .ok_or_else(|| EvalError::type_error("contains() on a string expects a string"))?;
            Ok(Value::from(s.contains(needle)))
        }
        (Value::Array(items), "contains") => {
            expect_args(name, args, 1)?;
            Ok(Value::from(items.contains(&args[0])))
        }
        (Value::Map(map), "containsKey") => {
            expect_args(name, args, 1)?;
            let key = args[0]
                .as_str()
                .ok_or_else(|| EvalError::type_error("containsKey() expects a string"))?;
            Ok(Value::from(map.contains_key(key)))
        }
        (Value::Map(map), "get") => {
            expect_args(name, args, 1)?;
            let key = args[0]
                .as_str()
                .ok_or_else(|| EvalError::type_error("get() on a map expects a string"))?;
            Ok(map.get(key).cloned().unwrap_or_default())
        }
        (Value::Array(items), "get") => {
            expect_args(name, args, 1)?;
            let index = args[0]
                .as_int()
                .ok_or_else(|| EvalError::type_error("get() on an array expects an integer"))?;
            usize::try_from(index)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or(EvalError::IndexOutOfBounds {
                    index,
                    len: items.len(),
                })
        }
        (value, "toString") => {
            expect_args(name, args, 0)?;
            Ok(match value {
                Value::String(s) => Value::String(s.clone()),
                other => Value::String(other.to_string()),
            })
        }
        (value, _) => Err(EvalError::no_such_member(value.type_name(), name)),
    }
}

/// Assigns property `name` of `target`.
///
/// Only host objects are writable: a field with a setter, or a one-argument
/// `set_<name>` method.
pub fn set_property(ctx: &EvalContext, target: &Value, name: &str, value: Value) -> EvalResult<()> {
    tracing::trace!(property = name, target = target.type_name(), "set property");
    match target {
        Value::Null => Err(EvalError::null_source("setProperty", name)),
        Value::Object(obj) => {
            let class = obj.class();
            if let Some(field) = class.field(name) {
                return elevated(ctx, target, field.member(), name, || field.set(obj, value));
            }
            match class.method(&format!("set_{name}")) {
                Some(setter) if setter.arity() == Some(1) => {
                    elevated(ctx, target, setter.member(), name, || {
                        setter.invoke(obj, std::slice::from_ref(&value)).map(|_| ())
                    })
                }
                _ => Err(EvalError::no_such_member(class.name(), name)),
            }
        }
        other => Err(EvalError::NotAssignable(format!(
            "cannot set '{name}' on {}",
            other.type_name()
        ))),
    }
}

/// Assigns `target[key]`.
pub fn set_index(ctx: &EvalContext, target: &Value, key: &Value, value: Value) -> EvalResult<()> {
    match (target, key) {
        (Value::Null, _) => Err(EvalError::null_source("setIndex", key.to_string())),
        (Value::Object(obj), _) => match (obj.class().indexer(), key) {
            (Some(indexer), _) => elevated(ctx, target, indexer.member(), indexer.member().name(), || {
                indexer.set(obj, key, value)
            }),
            (None, Value::String(name)) => set_property(ctx, target, name, value),
            (None, _) => Err(EvalError::NotAssignable(format!(
                "{} has no indexer",
                obj.class().name()
            ))),
        },
        (other, _) => Err(EvalError::NotAssignable(format!(
            "cannot assign an index of {}",
            other.type_name()
        ))),
    }
}

//! Null propagation hooks.
//!
//! When a navigation step yields null the evaluator asks the context's
//! [`NullHandlers`] for a substitute before continuing. With no handler
//! configured, null simply propagates.

use std::{collections::HashMap, fmt, sync::Arc};

use crate::{ast::DynamicSubscript, context::EvalContext, value::Value};

/// Property designator passed to [`NullHandler::null_property_value`].
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    Name(String),
    Index(Value),
    Subscript(DynamicSubscript),
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::Name(name) => f.write_str(name),
            PropertyKey::Index(key) => write!(f, "[{key}]"),
            PropertyKey::Subscript(sub) => write!(f, "{sub}"),
        }
    }
}

/// Substitutes values for nulls met during navigation.
///
/// Both hooks default to returning null, so implementors override only what
/// they need. Hooks never walk the expression tree themselves.
pub trait NullHandler: Send + Sync {
    /// Called when a method invoked on `target` returned null. Not called
    /// when the invocation failed.
    fn null_method_result(
        &self,
        _ctx: &EvalContext,
        _target: &Value,
        _method_name: &str,
        _args: &[Value],
    ) -> Value {
        Value::Null
    }

    /// Called when reading `property` from `target` yielded null.
    fn null_property_value(
        &self,
        _ctx: &EvalContext,
        _target: &Value,
        _property: &PropertyKey,
    ) -> Value {
        Value::Null
    }
}

/// Handler substituting one fixed value for every null.
#[derive(Debug, Clone)]
pub struct DefaultValue(pub Value);

impl NullHandler for DefaultValue {
    fn null_method_result(&self, _: &EvalContext, _: &Value, _: &str, _: &[Value]) -> Value {
        self.0.clone()
    }

    fn null_property_value(&self, _: &EvalContext, _: &Value, _: &PropertyKey) -> Value {
        self.0.clone()
    }
}

/// Handlers keyed by the type of the navigated target, with an optional
/// fallback.
#[derive(Clone, Default)]
pub struct NullHandlers {
    fallback: Option<Arc<dyn NullHandler>>,
    by_type: HashMap<String, Arc<dyn NullHandler>>,
}

impl NullHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fallback(&mut self, handler: Arc<dyn NullHandler>) {
        self.fallback = Some(handler);
    }

    /// Registers a handler for targets whose [`Value::type_name`] is
    /// `type_name` (the class name for host objects).
    pub fn register(&mut self, type_name: impl Into<String>, handler: Arc<dyn NullHandler>) {
        self.by_type.insert(type_name.into(), handler);
    }

    pub fn is_empty(&self) -> bool {
        self.fallback.is_none() && self.by_type.is_empty()
    }

    pub fn handler_for(&self, target: &Value) -> Option<&Arc<dyn NullHandler>> {
        self.by_type
            .get(target.type_name())
            .or(self.fallback.as_ref())
    }
}

impl fmt::Debug for NullHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&String> = self.by_type.keys().collect();
        types.sort();
        f.debug_struct("NullHandlers")
            .field("fallback", &self.fallback.is_some())
            .field("by_type", &types)
            .finish()
    }
}

/// Substitute for a null property read, or null when no handler applies.
pub(crate) fn on_null_property(ctx: &EvalContext, target: &Value, property: PropertyKey) -> Value {
    match ctx.null_handlers().handler_for(target) {
        Some(handler) => {
            let substitute = handler.null_property_value(ctx, target, &property);
            tracing::trace!(%property, target = target.type_name(), %substitute, "null property substituted");
            substitute
        }
        None => Value::Null,
    }
}

/// Substitute for a null method result, or null when no handler applies.
pub(crate) fn on_null_method(
    ctx: &EvalContext,
    target: &Value,
    method_name: &str,
    args: &[Value],
) -> Value {
    match ctx.null_handlers().handler_for(target) {
        Some(handler) => {
            let substitute = handler.null_method_result(ctx, target, method_name, args);
            tracing::trace!(method = method_name, target = target.type_name(), %substitute, "null method result substituted");
            substitute
        }
        None => Value::Null,
    }
}

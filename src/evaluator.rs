use crate::{
    ast::Node,
    context::EvalContext,
    error::{EvalError, EvalResult},
    ops, runtime,
    value::Value,
};

/// Evaluates `node` against the context's root object.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use ogel_lang::{EvalContext, Node, Value, get_value};
///
/// let mut doc = HashMap::new();
/// doc.insert("active".to_string(), Value::from(true));
///
/// let ctx = EvalContext::new(Value::Map(doc));
/// let expr = Node::not(Node::property("active"));
/// assert_eq!(get_value(&expr, &ctx).unwrap(), Value::from(false));
/// ```
#[tracing::instrument(level = "debug", skip_all, fields(expression = %node))]
pub fn get_value(node: &Node, ctx: &EvalContext) -> EvalResult<Value> {
    node.evaluate(ctx, ctx.root())
}

/// Assigns `value` through `node`, navigating from the context's root.
#[tracing::instrument(level = "debug", skip_all, fields(expression = %node))]
pub fn set_value(node: &Node, ctx: &mut EvalContext, value: Value) -> EvalResult<()> {
    let root = ctx.root().clone();
    node.set_value(ctx, &root, value)
}

impl Node {
    /// Evaluates this node against `source`.
    ///
    /// Children are evaluated first; the first error aborts the whole
    /// evaluation. Index keys and method arguments are evaluated against the
    /// root object.
    pub fn evaluate(&self, ctx: &EvalContext, source: &Value) -> EvalResult<Value> {
        match self {
            Node::Const(lit) => Ok(lit.to_value()),
            Node::Root => Ok(ctx.root().clone()),
            Node::This => Ok(source.clone()),
            Node::Variable(name) => Ok(runtime::variable(ctx, name)),
            Node::Property(name) => runtime::get_property(ctx, source, name),
            Node::Index(key) => {
                let key = key.evaluate(ctx, ctx.root())?;
                runtime::get_index(ctx, source, &key)
            }
            Node::Subscript(subscript) => runtime::get_subscript(ctx, source, *subscript),
            Node::Method { name, args } => {
                let args = args
                    .iter()
                    .map(|arg| arg.evaluate(ctx, ctx.root()))
                    .collect::<EvalResult<Vec<_>>>()?;
                runtime::call_method(ctx, source, name, &args)
            }
            Node::Chain(links) => {
                let mut current = source.clone();
                for link in links {
                    current = link.evaluate(ctx, &current)?;
                }
                Ok(current)
            }
            Node::Not(operand) => {
                let value = operand.evaluate(ctx, source)?;
                Ok(Value::Boolean(!ops::boolean_value(&value)))
            }
            Node::Logical { op, operands } => {
                let mut last = Value::Boolean(op.identity());
                for operand in operands {
                    last = operand.evaluate(ctx, source)?;
                    if op.stops_at(last.is_truthy()) {
                        break;
                    }
                }
                Ok(last)
            }
            Node::Compare { op, left, right } => {
                let left = left.evaluate(ctx, source)?;
                let right = right.evaluate(ctx, source)?;
                Ok(Value::Boolean(op.apply(ops::equals(&left, &right))))
            }
        }
    }

    /// Assigns `value` to the location this node designates on `source`.
    pub fn set_value(&self, ctx: &mut EvalContext, source: &Value, value: Value) -> EvalResult<()> {
        match self {
            Node::Variable(name) => {
                ctx.set_variable(name.clone(), value);
                Ok(())
            }
            Node::Property(name) => runtime::set_property(ctx, source, name, value),
            Node::Index(key) => {
                let key = key.evaluate(ctx, ctx.root())?;
                runtime::set_index(ctx, source, &key, value)
            }
            Node::Chain(links) => match links.split_last() {
                Some((last, prefix)) => {
                    let mut target = source.clone();
                    for link in prefix {
                        target = link.evaluate(ctx, &target)?;
                    }
                    last.set_value(ctx, &target, value)
                }
                None => Err(EvalError::NotAssignable("empty chain".to_string())),
            },
            other => Err(EvalError::NotAssignable(other.to_string())),
        }
    }
}

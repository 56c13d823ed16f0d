//! Source-fragment generation for compiled evaluation.
//!
//! Each node renders to a Rust expression equivalent to its interpreted
//! evaluation. Fragments are evaluated inside a routine with the bindings
//!
//! ```text
//! ctx: &EvalContext, root: &Value, target: &Value
//! ```
//!
//! returning `Result<Value, EvalError>`, so fragments may use `?`. After a
//! node renders, [`EvalContext::current_type`] holds the fragment's static
//! type: fragments typed [`TypeHint::Boolean`] are native `bool`
//! expressions, every other fragment is a `Value` expression.
//!
//! Generating a chain evaluates every link but the last against the
//! context, so host methods on the prefix run and members are elevated
//! while rendering.

use crate::{
    ast::{BoolOp, Node},
    context::EvalContext,
    error::{EvalError, GenerationError},
    reflect::Member,
    value::{Literal, TypeHint, Value},
};

const OPS: &str = "::ogel_lang::ops";
const RT: &str = "::ogel_lang::runtime";
const VALUE: &str = "::ogel_lang::Value";

/// The null literal substituted for blank fragments.
pub const NULL_LITERAL: &str = "::ogel_lang::Value::Null";

/// Renders `node` against the context's root, starting from a clean
/// transient state.
pub fn to_source(node: &Node, ctx: &mut EvalContext) -> Result<String, GenerationError> {
    ctx.reset();
    let root = ctx.root().clone();
    node.to_source(ctx, &root)
}

/// Wraps a rendered fragment into a complete routine named `name`.
pub fn routine(name: &str, fragment: &str, hint: Option<&TypeHint>) -> String {
    let body = as_value(fragment, hint);
    format!(
        "#[allow(unused_variables)]\n\
         fn {name}(ctx: &::ogel_lang::EvalContext, root: &{VALUE}, target: &{VALUE}) \
         -> ::std::result::Result<{VALUE}, ::ogel_lang::EvalError> {{\n    \
         Ok({body})\n}}\n"
    )
}

/// Converts a fragment of type `hint` into a `Value` expression.
fn as_value(fragment: &str, hint: Option<&TypeHint>) -> String {
    if fragment.trim().is_empty() {
        NULL_LITERAL.to_string()
    } else if hint == Some(&TypeHint::Boolean) {
        format!("{VALUE}::Boolean({fragment})")
    } else {
        fragment.to_string()
    }
}

fn float_source(n: f64) -> String {
    if n.is_nan() {
        "f64::NAN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "f64::INFINITY" } else { "f64::NEG_INFINITY" }.to_string()
    } else {
        format!("{n:?}")
    }
}

fn literal_source(lit: &Literal) -> (String, TypeHint) {
    match lit {
        Literal::Null => (NULL_LITERAL.to_string(), TypeHint::Null),
        Literal::Boolean(b) => (b.to_string(), TypeHint::Boolean),
        Literal::Integer(n) => (format!("{VALUE}::Integer({n})"), TypeHint::Integer),
        Literal::Float(n) => (format!("{VALUE}::Float({})", float_source(*n)), TypeHint::Float),
        Literal::String(s) => (
            format!("{VALUE}::String(::std::string::String::from({s:?}))"),
            TypeHint::String,
        ),
    }
}

impl Node {
    /// Renders this node as a source fragment against `target`.
    pub fn to_source(&self, ctx: &mut EvalContext, target: &Value) -> Result<String, GenerationError> {
        match self {
            Node::Const(lit) => {
                let (fragment, hint) = literal_source(lit);
                ctx.set_current_type(hint);
                Ok(fragment)
            }
            Node::Root => {
                let hint = ctx.root().type_hint();
                ctx.set_current_type(hint);
                Ok("root.clone()".to_string())
            }
            Node::This => {
                ctx.set_current_type(target.type_hint());
                Ok(format!("{}.clone()", ctx.source_target()))
            }
            Node::Variable(name) => {
                let hint = ctx.variable(name).map_or(TypeHint::Dynamic, Value::type_hint);
                ctx.set_current_type(hint);
                Ok(format!("{RT}::variable(ctx, {name:?})"))
            }
            Node::Property(name) => self.property_source(ctx, target, name),
            Node::Index(key) => {
                let key = self.root_operand(ctx, key)?;
                ctx.set_current_type(TypeHint::Dynamic);
                Ok(format!("{RT}::get_index(ctx, &{}, &{key})?", ctx.source_target()))
            }
            Node::Subscript(subscript) => {
                ctx.set_current_type(TypeHint::Dynamic);
                Ok(format!(
                    "{RT}::get_subscript(ctx, &{}, {})?",
                    ctx.source_target(),
                    subscript.source_path()
                ))
            }
            Node::Method { name, args } => {
                self.method_source_check(ctx, target, name)?;
                let args = args
                    .iter()
                    .map(|arg| self.root_operand(ctx, arg))
                    .collect::<Result<Vec<_>, _>>()?;
                ctx.set_current_type(TypeHint::Dynamic);
                Ok(format!(
                    "{RT}::call_method(ctx, &{}, {name:?}, &[{}])?",
                    ctx.source_target(),
                    args.join(", ")
                ))
            }
            Node::Chain(links) => self.chain_source(ctx, target, links),
            Node::Not(operand) => self.not_source(ctx, target, operand),
            Node::Logical { op, operands } => {
                let fragments = operands
                    .iter()
                    .map(|operand| value_operand(ctx, target, operand))
                    .collect::<Result<Vec<_>, _>>()?;
                ctx.set_current_type(TypeHint::Dynamic);
                Ok(logical_source(*op, fragments))
            }
            Node::Compare { op, left, right } => {
                let left = value_operand(ctx, target, left)?;
                let right = value_operand(ctx, target, right)?;
                ctx.set_current_type(TypeHint::Boolean);
                let test = format!("{OPS}::equals(&{left}, &{right})");
                if op.apply(true) {
                    Ok(test)
                } else {
                    Ok(format!("(!{test})"))
                }
            }
        }
    }

    fn not_source(
        &self,
        ctx: &mut EvalContext,
        target: &Value,
        operand: &Node,
    ) -> Result<String, GenerationError> {
        let mut child = operand
            .to_source(ctx, target)
            .map_err(|err| GenerationError::new(self.to_string(), err))?;
        if child.trim().is_empty() {
            child = NULL_LITERAL.to_string();
        }
        ctx.set_current_type(TypeHint::Boolean);
        Ok(format!("(!{OPS}::boolean_value(&({child})))"))
    }

    fn property_source(
        &self,
        ctx: &mut EvalContext,
        target: &Value,
        name: &str,
    ) -> Result<String, GenerationError> {
        if let Value::Object(obj) = target {
            let class = obj.class();
            let accessor = class.property(name).ok_or_else(|| {
                GenerationError::new(self.to_string(), EvalError::no_such_member(class.name(), name))
            })?;
            self.check_access(ctx, target, class.name(), accessor.member(), name)?;
        }
        ctx.set_current_type(TypeHint::Dynamic);
        Ok(format!("{RT}::get_property(ctx, &{}, {name:?})?", ctx.source_target()))
    }

    fn method_source_check(
        &self,
        ctx: &EvalContext,
        target: &Value,
        name: &str,
    ) -> Result<(), GenerationError> {
        if let Value::Object(obj) = target {
            let class = obj.class();
            let method = class.method(name).ok_or_else(|| {
                GenerationError::new(self.to_string(), EvalError::no_such_member(class.name(), name))
            })?;
            self.check_access(ctx, target, class.name(), method.member(), name)?;
        }
        Ok(())
    }

    /// Rejects members the active policy denies, whatever their host flag.
    fn check_access(
        &self,
        ctx: &EvalContext,
        target: &Value,
        class: &str,
        member: &Member,
        name: &str,
    ) -> Result<(), GenerationError> {
        if ctx.member_access().is_accessible(ctx, target, member, name) {
            return Ok(());
        }
        Err(GenerationError::new(
            self.to_string(),
            EvalError::Inaccessible {
                class: class.to_string(),
                member: name.to_string(),
            },
        ))
    }

    fn chain_source(
        &self,
        ctx: &mut EvalContext,
        target: &Value,
        links: &[Node],
    ) -> Result<String, GenerationError> {
        if links.is_empty() {
            ctx.set_current_type(TypeHint::Dynamic);
            return Ok(String::new());
        }
        let saved = ctx.source_target().to_string();
        let result = self.chain_links(ctx, target, links);
        ctx.replace_source_target(saved);
        result
    }

    fn chain_links(
        &self,
        ctx: &mut EvalContext,
        target: &Value,
        links: &[Node],
    ) -> Result<String, GenerationError> {
        let mut current = target.clone();
        let mut fragment = String::new();
        for (i, link) in links.iter().enumerate() {
            fragment = link.to_source(ctx, &current)?;
            if i + 1 == links.len() {
                break;
            }
            // later links need the runtime type of this step
            current = link
                .evaluate(ctx, &current)
                .map_err(|err| GenerationError::new(self.to_string(), err))?;
            let next_target = as_value(&fragment, ctx.current_type());
            ctx.replace_source_target(format!("({next_target})"));
        }
        Ok(fragment)
    }

    /// Renders an operand that is evaluated against the root.
    fn root_operand(&self, ctx: &mut EvalContext, operand: &Node) -> Result<String, GenerationError> {
        let root = ctx.root().clone();
        let saved = ctx.replace_source_target("root".to_string());
        let result = value_operand(ctx, &root, operand);
        ctx.replace_source_target(saved);
        result
    }
}

fn value_operand(ctx: &mut EvalContext, target: &Value, operand: &Node) -> Result<String, GenerationError> {
    let fragment = operand.to_source(ctx, target)?;
    Ok(as_value(&fragment, ctx.current_type()))
}

fn logical_source(op: BoolOp, fragments: Vec<String>) -> String {
    let mut rev = fragments.into_iter().rev();
    let Some(mut acc) = rev.next() else {
        return format!("{VALUE}::Boolean({})", op.identity());
    };
    let stop = match op {
        BoolOp::And => format!("!{OPS}::boolean_value(&v)"),
        BoolOp::Or => format!("{OPS}::boolean_value(&v)"),
    };
    for fragment in rev {
        acc = format!("{{ let v = {fragment}; if {stop} {{ v }} else {{ {acc} }} }}");
    }
    acc
}

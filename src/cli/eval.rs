//! Evaluate or compile expression trees against JSON input

use std::sync::Arc;

use super::{CliError, json_to_value, value_to_json};
use crate::{DefaultMemberAccess, DefaultValue, EvalContext, Node, TypeHint, get_value, source};

/// Options for the eval command
#[derive(Debug, Clone, Default)]
pub struct EvalOptions {
    /// The expression tree, as JSON
    pub ast: String,
    /// JSON root object; null when absent
    pub input: Option<String>,
    /// Variable bindings of the form `name=<json>`
    pub variables: Vec<String>,
    /// JSON value substituted for every null met during navigation
    pub null_default: Option<String>,
    /// Allow private, protected and package members
    pub allow_all: bool,
}

/// Options for the source command
#[derive(Debug, Clone, Default)]
pub struct SourceOptions {
    /// The expression tree, as JSON
    pub ast: String,
    /// JSON root object the fragment is generated against
    pub input: Option<String>,
    /// Variable bindings of the form `name=<json>`
    pub variables: Vec<String>,
    /// Wrap the fragment into a routine with this name
    pub routine: Option<String>,
    pub allow_all: bool,
}

/// Result of a source operation
#[derive(Debug, Clone, PartialEq)]
pub struct SourceOutput {
    pub source: String,
    /// Static type of the fragment
    pub type_hint: Option<TypeHint>,
}

fn parse_binding(binding: &str) -> Result<(String, crate::Value), CliError> {
    let (name, json) = binding
        .split_once('=')
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| CliError::InvalidVariable(binding.to_string()))?;
    let value = serde_json::from_str(json)?;
    Ok((name.to_string(), json_to_value(value)))
}

fn build_context(
    input: Option<&str>,
    variables: &[String],
    allow_all: bool,
) -> Result<EvalContext, CliError> {
    let root = match input {
        Some(json) => json_to_value(serde_json::from_str(json)?),
        None => crate::Value::Null,
    };
    let mut ctx = EvalContext::new(root)
        .with_member_access(Arc::new(DefaultMemberAccess::allow_all(allow_all)));
    for binding in variables {
        let (name, value) = parse_binding(binding)?;
        ctx.set_variable(name, value);
    }
    Ok(ctx)
}

/// Evaluate an expression tree and return the result as JSON
pub fn execute_eval(options: &EvalOptions) -> Result<serde_json::Value, CliError> {
    let node: Node = serde_json::from_str(&options.ast)?;
    let mut ctx = build_context(options.input.as_deref(), &options.variables, options.allow_all)?;
    if let Some(json) = &options.null_default {
        let substitute = json_to_value(serde_json::from_str(json)?);
        ctx = ctx.with_null_handler(Arc::new(DefaultValue(substitute)));
    }
    tracing::debug!(expression = %node, "evaluating");
    let result = get_value(&node, &ctx)?;
    Ok(value_to_json(result))
}

/// Generate the source fragment of an expression tree
pub fn execute_source(options: &SourceOptions) -> Result<SourceOutput, CliError> {
    let node: Node = serde_json::from_str(&options.ast)?;
    let mut ctx = build_context(options.input.as_deref(), &options.variables, options.allow_all)?;
    let fragment = source::to_source(&node, &mut ctx)?;
    let type_hint = ctx.current_type().cloned();
    let source = match &options.routine {
        Some(name) => source::routine(name, &fragment, type_hint.as_ref()),
        None => fragment,
    };
    Ok(SourceOutput { source, type_hint })
}

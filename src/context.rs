use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    access::{DefaultMemberAccess, MemberAccess},
    null_handler::{NullHandler, NullHandlers},
    value::{TypeHint, Value},
};

/// Default binding name of the current target in generated source.
pub(crate) const SOURCE_TARGET: &str = "target";

/// Per-evaluation state: the root object, named variables, the active
/// member access policy and null handlers, plus the transient type
/// annotation used while generating source.
///
/// A context belongs to one evaluation at a time. It may be reused for
/// further evaluations after [`reset`](EvalContext::reset).
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use ogel_lang::{DefaultMemberAccess, EvalContext, Value};
///
/// let ctx = EvalContext::new(Value::Null)
///     .with_member_access(Arc::new(DefaultMemberAccess::allow_all(true)))
///     .with_variable("limit", Value::from(10));
/// assert_eq!(ctx.variable("limit"), Some(&Value::from(10)));
/// ```
#[derive(Clone)]
pub struct EvalContext {
    root: Value,
    variables: HashMap<String, Value>,
    member_access: Arc<dyn MemberAccess>,
    null_handlers: NullHandlers,
    current_type: Option<TypeHint>,
    source_target: String,
}

impl EvalContext {
    /// Context over `root` with the default policy (public members only) and
    /// no null handlers.
    pub fn new(root: Value) -> Self {
        EvalContext {
            root,
            variables: HashMap::new(),
            member_access: Arc::new(DefaultMemberAccess::default()),
            null_handlers: NullHandlers::new(),
            current_type: None,
            source_target: SOURCE_TARGET.to_string(),
        }
    }

    pub fn with_member_access(mut self, access: Arc<dyn MemberAccess>) -> Self {
        self.member_access = access;
        self
    }

    /// Fallback null handler for every target type.
    pub fn with_null_handler(mut self, handler: Arc<dyn NullHandler>) -> Self {
        self.null_handlers.set_fallback(handler);
        self
    }

    /// Null handler for targets of one type.
    pub fn with_type_null_handler(
        mut self,
        type_name: impl Into<String>,
        handler: Arc<dyn NullHandler>,
    ) -> Self {
        self.null_handlers.register(type_name, handler);
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn set_root(&mut self, root: Value) {
        self.root = root;
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.variables.insert(name.into(), value)
    }

    pub fn remove_variable(&mut self, name: &str) -> Option<Value> {
        self.variables.remove(name)
    }

    pub fn variables(&self) -> &HashMap<String, Value> {
        &self.variables
    }

    pub fn member_access(&self) -> &dyn MemberAccess {
        self.member_access.as_ref()
    }

    pub fn set_member_access(&mut self, access: Arc<dyn MemberAccess>) {
        self.member_access = access;
    }

    pub fn null_handlers(&self) -> &NullHandlers {
        &self.null_handlers
    }

    pub fn null_handlers_mut(&mut self) -> &mut NullHandlers {
        &mut self.null_handlers
    }

    /// Static type of the most recently generated fragment.
    pub fn current_type(&self) -> Option<&TypeHint> {
        self.current_type.as_ref()
    }

    pub fn set_current_type(&mut self, hint: TypeHint) {
        self.current_type = Some(hint);
    }

    /// Clears the transient fields so the context can serve another run.
    pub fn reset(&mut self) {
        self.current_type = None;
        self.source_target = SOURCE_TARGET.to_string();
    }

    pub(crate) fn source_target(&self) -> &str {
        &self.source_target
    }

    /// Swaps in a new target expression, returning the previous one.
    pub(crate) fn replace_source_target(&mut self, target: String) -> String {
        std::mem::replace(&mut self.source_target, target)
    }
}

impl fmt::Debug for EvalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalContext")
            .field("root", &self.root)
            .field("variables", &self.variables)
            .field("member_access", &self.member_access)
            .field("null_handlers", &self.null_handlers)
            .field("current_type", &self.current_type)
            .finish()
    }
}

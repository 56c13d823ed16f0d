//! Registered-accessor tables describing host types.
//!
//! A host registers each type it wants expressions to reach with a
//! [`ClassBuilder`], naming its fields, methods and optional indexer together
//! with their [`Visibility`]. The resulting [`ClassDescriptor`] is the
//! reflection surface the evaluator resolves member names against; whether a
//! resolved member may actually be touched is decided separately by the
//! active [`MemberAccess`](crate::access::MemberAccess) policy.
//!
//! ```
//! use ogel_lang::reflect::{ClassBuilder, Visibility};
//! use ogel_lang::Value;
//!
//! struct Account {
//!     active: bool,
//!     pin: u32,
//! }
//!
//! let class = ClassBuilder::<Account>::new("Account")
//!     .field("active", Visibility::Public, |a| Value::from(a.active))
//!     .field("pin", Visibility::Private, |a| Value::from(i64::from(a.pin)))
//!     .build();
//!
//! let account = class.wrap(Account { active: true, pin: 1234 });
//! assert_eq!(account.type_name(), "Account");
//! ```

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    marker::PhantomData,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use crate::{
    error::{AccessError, EvalError, EvalResult},
    value::Value,
};

/// Declared visibility of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Protected,
    /// Visible within the declaring module only.
    Package,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Method,
    Indexer,
}

/// Descriptor of one field, method or indexer.
///
/// Descriptors are shared by every instance and every evaluation, so the
/// runtime accessibility they carry is process-wide. It has two parts: a
/// host-level flag (set for public members, or by
/// [`set_accessible`](Member::set_accessible)) and a count of live
/// elevations granted by access policies. Counting elevations keeps
/// concurrent evaluations that touch the same member from revoking each
/// other's access.
pub struct Member {
    name: String,
    declaring_class: String,
    kind: MemberKind,
    visibility: Visibility,
    accessible: AtomicBool,
    elevations: AtomicUsize,
}

impl Member {
    fn new(declaring_class: &str, name: &str, kind: MemberKind, visibility: Visibility) -> Self {
        Self {
            name: name.to_string(),
            declaring_class: declaring_class.to_string(),
            kind,
            visibility,
            accessible: AtomicBool::new(visibility == Visibility::Public),
            elevations: AtomicUsize::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declaring_class(&self) -> &str {
        &self.declaring_class
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Host-level accessibility flag, ignoring policy elevations.
    pub fn is_accessible_flag(&self) -> bool {
        self.accessible.load(Ordering::Acquire)
    }

    pub fn set_accessible(&self, flag: bool) {
        self.accessible.store(flag, Ordering::Release);
    }

    /// Whether the member can be read or invoked right now.
    pub fn can_access(&self) -> bool {
        self.is_accessible_flag() || self.elevations() > 0
    }

    pub fn elevations(&self) -> usize {
        self.elevations.load(Ordering::Acquire)
    }

    pub(crate) fn elevate(&self) {
        self.elevations.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn revoke(&self) -> Result<(), AccessError> {
        self.elevations
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .map(|_| ())
            .map_err(|_| AccessError::Unbalanced {
                member: self.to_string(),
            })
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring_class, self.name)
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("declaring_class", &self.declaring_class)
            .field("kind", &self.kind)
            .field("visibility", &self.visibility)
            .field("accessible", &self.is_accessible_flag())
            .field("elevations", &self.elevations())
            .finish()
    }
}

type Getter = Arc<dyn Fn(&ObjectRef) -> EvalResult<Value> + Send + Sync>;
type Setter = Arc<dyn Fn(&ObjectRef, Value) -> EvalResult<()> + Send + Sync>;
type Invoker = Arc<dyn Fn(&ObjectRef, &[Value]) -> EvalResult<Value> + Send + Sync>;
type IndexGetter = Arc<dyn Fn(&ObjectRef, &Value) -> EvalResult<Value> + Send + Sync>;
type IndexSetter = Arc<dyn Fn(&ObjectRef, &Value, Value) -> EvalResult<()> + Send + Sync>;

pub struct FieldAccessor {
    member: Member,
    getter: Getter,
    setter: Option<Setter>,
}

impl FieldAccessor {
    pub fn member(&self) -> &Member {
        &self.member
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    /// Raw read; callers go through the access policy first.
    pub(crate) fn get(&self, target: &ObjectRef) -> EvalResult<Value> {
        (self.getter)(target)
    }

    pub(crate) fn set(&self, target: &ObjectRef, value: Value) -> EvalResult<()> {
        match &self.setter {
            Some(setter) => setter(target, value),
            None => Err(EvalError::NotAssignable(format!(
                "field '{}' is read-only",
                self.member
            ))),
        }
    }
}

pub struct MethodAccessor {
    member: Member,
    arity: Option<usize>,
    invoker: Invoker,
}

impl MethodAccessor {
    pub fn member(&self) -> &Member {
        &self.member
    }

    /// Fixed argument count, `None` for variadic methods.
    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    pub(crate) fn invoke(&self, target: &ObjectRef, args: &[Value]) -> EvalResult<Value> {
        if let Some(expected) = self.arity
            && expected != args.len()
        {
            return Err(EvalError::Arity {
                name: self.member.name().to_string(),
                expected,
                found: args.len(),
            });
        }
        (self.invoker)(target, args)
    }
}

pub struct IndexAccessor {
    member: Member,
    getter: IndexGetter,
    setter: Option<IndexSetter>,
}

impl IndexAccessor {
    pub fn member(&self) -> &Member {
        &self.member
    }

    pub(crate) fn get(&self, target: &ObjectRef, key: &Value) -> EvalResult<Value> {
        (self.getter)(target, key)
    }

    pub(crate) fn set(&self, target: &ObjectRef, key: &Value, value: Value) -> EvalResult<()> {
        match &self.setter {
            Some(setter) => setter(target, key, value),
            None => Err(EvalError::NotAssignable(format!(
                "indexer of {} is read-only",
                self.member.declaring_class()
            ))),
        }
    }
}

/// How a property name resolved against a class.
pub enum PropertyAccessor<'a> {
    Field(&'a FieldAccessor),
    /// Zero-argument method standing in for a property.
    Getter(&'a MethodAccessor),
}

impl PropertyAccessor<'_> {
    pub fn member(&self) -> &Member {
        match self {
            PropertyAccessor::Field(field) => field.member(),
            PropertyAccessor::Getter(method) => method.member(),
        }
    }
}

/// Accessor table for one host type.
pub struct ClassDescriptor {
    name: String,
    type_id: TypeId,
    fields: HashMap<String, FieldAccessor>,
    methods: HashMap<String, MethodAccessor>,
    indexer: Option<IndexAccessor>,
}

impl ClassDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self, name: &str) -> Option<&FieldAccessor> {
        self.fields.get(name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodAccessor> {
        self.methods.get(name)
    }

    pub fn indexer(&self) -> Option<&IndexAccessor> {
        self.indexer.as_ref()
    }

    /// Resolves a property name: a field first, then a zero-argument method
    /// named `name`, `get_<name>` or `is_<name>`.
    pub fn property(&self, name: &str) -> Option<PropertyAccessor<'_>> {
        if let Some(field) = self.fields.get(name) {
            return Some(PropertyAccessor::Field(field));
        }
        [name.to_string(), format!("get_{name}"), format!("is_{name}")]
            .iter()
            .filter_map(|candidate| self.methods.get(candidate))
            .find(|method| method.arity == Some(0))
            .map(PropertyAccessor::Getter)
    }

    /// Every member this class declares, in no particular order.
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.fields
            .values()
            .map(FieldAccessor::member)
            .chain(self.methods.values().map(MethodAccessor::member))
            .chain(self.indexer.iter().map(IndexAccessor::member))
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<&String> = self.fields.keys().collect();
        fields.sort();
        let mut methods: Vec<&String> = self.methods.keys().collect();
        methods.sort();
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("fields", &fields)
            .field("methods", &methods)
            .field("indexer", &self.indexer.is_some())
            .finish()
    }
}

/// Builds a [`ClassDescriptor`] for host type `T`.
///
/// Accessor closures receive `&T`; setters that mutate must use interior
/// mutability since instances are shared.
pub struct ClassBuilder<T> {
    descriptor: ClassDescriptor,
    _marker: PhantomData<fn() -> T>,
}

fn downcast<'a, T: Any>(target: &'a ObjectRef, class: &str) -> EvalResult<&'a T> {
    target.downcast_ref::<T>().ok_or_else(|| {
        EvalError::type_error(format!(
            "expected instance of {class}, got {}",
            target.class().name()
        ))
    })
}

impl<T: Any + Send + Sync> ClassBuilder<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            descriptor: ClassDescriptor {
                name: name.into(),
                type_id: TypeId::of::<T>(),
                fields: HashMap::new(),
                methods: HashMap::new(),
                indexer: None,
            },
            _marker: PhantomData,
        }
    }

    fn member(&self, name: &str, kind: MemberKind, visibility: Visibility) -> Member {
        Member::new(&self.descriptor.name, name, kind, visibility)
    }

    /// Read-only field.
    pub fn field<F>(mut self, name: &str, visibility: Visibility, getter: F) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        let class = self.descriptor.name.clone();
        let accessor = FieldAccessor {
            member: self.member(name, MemberKind::Field, visibility),
            getter: Arc::new(move |target: &ObjectRef| {
                downcast::<T>(target, &class).map(&getter)
            }),
            setter: None,
        };
        self.descriptor.fields.insert(name.to_string(), accessor);
        self
    }

    /// Read-write field.
    pub fn field_rw<G, S>(mut self, name: &str, visibility: Visibility, getter: G, setter: S) -> Self
    where
        G: Fn(&T) -> Value + Send + Sync + 'static,
        S: Fn(&T, Value) -> EvalResult<()> + Send + Sync + 'static,
    {
        let get_class = self.descriptor.name.clone();
        let set_class = self.descriptor.name.clone();
        let accessor = FieldAccessor {
            member: self.member(name, MemberKind::Field, visibility),
            getter: Arc::new(move |target: &ObjectRef| {
                downcast::<T>(target, &get_class).map(&getter)
            }),
            setter: Some(Arc::new(move |target: &ObjectRef, value: Value| {
                setter(downcast::<T>(target, &set_class)?, value)
            })),
        };
        self.descriptor.fields.insert(name.to_string(), accessor);
        self
    }

    /// Method with a fixed argument count.
    pub fn method<F>(self, name: &str, visibility: Visibility, arity: usize, body: F) -> Self
    where
        F: Fn(&T, &[Value]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        self.insert_method(name, visibility, Some(arity), body)
    }

    /// Method accepting any number of arguments.
    pub fn variadic<F>(self, name: &str, visibility: Visibility, body: F) -> Self
    where
        F: Fn(&T, &[Value]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        self.insert_method(name, visibility, None, body)
    }

    fn insert_method<F>(mut self, name: &str, visibility: Visibility, arity: Option<usize>, body: F) -> Self
    where
        F: Fn(&T, &[Value]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        let class = self.descriptor.name.clone();
        let accessor = MethodAccessor {
            member: self.member(name, MemberKind::Method, visibility),
            arity,
            invoker: Arc::new(move |target: &ObjectRef, args: &[Value]| {
                body(downcast::<T>(target, &class)?, args)
            }),
        };
        self.descriptor.methods.insert(name.to_string(), accessor);
        self
    }

    /// Indexed access (`obj[key]`), optionally writable.
    pub fn indexer<G>(mut self, visibility: Visibility, getter: G) -> Self
    where
        G: Fn(&T, &Value) -> EvalResult<Value> + Send + Sync + 'static,
    {
        let class = self.descriptor.name.clone();
        self.descriptor.indexer = Some(IndexAccessor {
            member: self.member("[]", MemberKind::Indexer, visibility),
            getter: Arc::new(move |target: &ObjectRef, key: &Value| {
                getter(downcast::<T>(target, &class)?, key)
            }),
            setter: None,
        });
        self
    }

    /// Makes a previously declared indexer writable.
    pub fn index_setter<S>(mut self, setter: S) -> Self
    where
        S: Fn(&T, &Value, Value) -> EvalResult<()> + Send + Sync + 'static,
    {
        let class = self.descriptor.name.clone();
        if let Some(indexer) = self.descriptor.indexer.as_mut() {
            indexer.setter = Some(Arc::new(move |target: &ObjectRef, key: &Value, value: Value| {
                setter(downcast::<T>(target, &class)?, key, value)
            }));
        }
        self
    }

    pub fn build(self) -> Class<T> {
        Class {
            descriptor: Arc::new(self.descriptor),
            _marker: PhantomData,
        }
    }
}

/// Typed handle on a registered class; the only way to create instances.
pub struct Class<T> {
    descriptor: Arc<ClassDescriptor>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Class<T> {
    fn clone(&self) -> Self {
        Self {
            descriptor: Arc::clone(&self.descriptor),
            _marker: PhantomData,
        }
    }
}

impl<T: Any + Send + Sync> Class<T> {
    pub fn descriptor(&self) -> &Arc<ClassDescriptor> {
        &self.descriptor
    }

    pub fn wrap(&self, value: T) -> Value {
        self.wrap_shared(Arc::new(value))
    }

    /// Wraps an instance the host keeps a handle to.
    pub fn wrap_shared(&self, value: Arc<T>) -> Value {
        debug_assert_eq!(self.descriptor.type_id, TypeId::of::<T>());
        Value::Object(ObjectRef {
            class: Arc::clone(&self.descriptor),
            inner: value,
        })
    }
}

/// Shared handle on a host instance and its class descriptor.
#[derive(Clone)]
pub struct ObjectRef {
    class: Arc<ClassDescriptor>,
    inner: Arc<dyn Any + Send + Sync>,
}

impl ObjectRef {
    pub fn class(&self) -> &Arc<ClassDescriptor> {
        &self.class
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:p}", self.class.name, Arc::as_ptr(&self.inner))
    }
}

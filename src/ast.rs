//! # Expression trees
//!
//! This module defines the node family evaluated by the engine. Trees are
//! produced by an external parser (or built directly by the host) and are
//! immutable once constructed, so one tree may be evaluated concurrently by
//! any number of evaluations, each with its own
//! [`EvalContext`](crate::EvalContext).
//!
//! - **[expressions]** - the [`Node`] enum and its display form
//! - **[operators]** - display operators of the operator nodes
//! - **[subscript]** - dynamic array subscripts (`[^]`, `[|]`, `[$]`, `[*]`)
//!
//! ## Navigation
//!
//! Navigation nodes read from the *source* they are evaluated against:
//!
//! ```text
//! account.owner.name      Chain[Property(account), Property(owner), Property(name)]
//! items[0]                Chain[Property(items), Index(Const(0))]
//! #user.active            Chain[Variable(user), Property(active)]
//! ```
//!
//! Index expressions and method arguments are evaluated against the root
//! object, not against the value being indexed.
//!
//! ## Serialised form
//!
//! Nodes (de)serialise externally tagged in snake_case:
//!
//! ```text
//! {"not": {"property": "active"}}
//! {"chain": [{"variable": "user"}, {"method": {"name": "isAdmin", "args": []}}]}
//! ```
pub mod expressions;
pub mod operators;
pub mod subscript;

pub use expressions::Node;
pub use operators::{BoolOp, CompareOp};
pub use subscript::DynamicSubscript;

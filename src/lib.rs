pub mod access;
pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod null_handler;
pub mod ops;
pub mod reflect;
pub mod runtime;
pub mod source;
pub mod value;

pub use access::{AccessToken, DefaultMemberAccess, ElevationScope, MemberAccess};
pub use ast::{BoolOp, CompareOp, DynamicSubscript, Node};
pub use context::EvalContext;
pub use error::{AccessError, EvalError, EvalResult, GenerationError};
pub use evaluator::{get_value, set_value};
pub use null_handler::{DefaultValue, NullHandler, NullHandlers, PropertyKey};
pub use value::{Literal, TypeHint, Value};

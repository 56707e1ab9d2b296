//! netfacts-core: Core abstractions for the netfacts rule engine
//!
//! This crate provides:
//! - `Value`: the JSON-shaped value tree every directive produces
//! - `Scope`: a stack of variable frames used while a document runs
//! - `ExpressionResolver`: path/index resolution of `{{ ... }}` expressions
//! - `Diagnostics`: the non-fatal warning channel of a run

mod diagnostics;
mod error;
pub mod expr;
mod resolver;
mod scope;
pub mod value;

pub use diagnostics::Diagnostics;
pub use error::ExpressionError;
pub use expr::{Condition, Expr, PathSegment, Template, VarPath};
pub use resolver::{ExpressionResolver, PathResolver};
pub use scope::Scope;
pub use value::{Map, Value};

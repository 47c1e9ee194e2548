//! Query derivation - from a method name to an executable [`Filter`].
//!
//! 1. [`parse_method_name`] splits a name such as
//!    `findManyByBalanceBetweenAndCustomerId` into a root operator and a
//!    [`FilterChain`] whose fields are resolved against the entity schema.
//! 2. The registry validates the chain and freezes it in a
//!    [`CompiledMethodSpec`].
//! 3. On every call, [`compile_filter`] binds the arguments to the chain
//!    and yields a [`Filter`] tree for the store.

mod compiler;
mod directive;
mod filter;
mod method;
mod operator;
mod parser;

pub use compiler::compile_filter;
pub use directive::{FieldUpdate, Pagination, Sort, SortField, UpdateBatch};
pub use filter::{CompareOp, Filter, Pattern};
pub use method::{CompiledMethodSpec, TrailingParam};
pub use operator::{
    Cardinality, Combinator, FilterOperator, MethodOperator, METHOD_PREFIXES, SUFFIX_PRECEDENCE,
};
pub use parser::{parse_method_name, FilterChain, FilterTerm, ParsedMethod};

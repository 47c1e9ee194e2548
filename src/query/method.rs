use super::directive::SortField;
use super::operator::{Cardinality, MethodOperator};
use super::parser::{FilterChain, ParsedMethod};

/// Trailing directive parameter accepted after the filter arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailingParam {
    Sort,
    Pagination,
    UpdateBatch,
}

/// A validated method, ready to be compiled against call arguments.
///
/// Built once at registration and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledMethodSpec {
    /// Declared method name.
    pub method: String,
    /// Name the grammar was applied to (the transform target, if any).
    pub effective: String,
    pub operator: MethodOperator,
    pub cardinality: Cardinality,
    pub chain: FilterChain,
    /// Sort keys from method annotations, resolved to raw field names.
    pub sort: Vec<SortField>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
    pub trailing: Option<TrailingParam>,
    pub asynchronous: bool,
}

impl CompiledMethodSpec {
    pub fn new(method: impl Into<String>, parsed: ParsedMethod) -> Self {
        let method = method.into();
        Self {
            effective: method.clone(),
            method,
            operator: parsed.operator,
            cardinality: parsed.cardinality.unwrap_or(Cardinality::Many),
            chain: parsed.chain,
            sort: Vec::new(),
            limit: None,
            skip: None,
            trailing: None,
            asynchronous: false,
        }
    }

    /// Number of call arguments the method takes.
    pub fn param_count(&self) -> usize {
        self.chain.arity() + usize::from(self.trailing.is_some())
    }
}

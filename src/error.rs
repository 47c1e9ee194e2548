use thiserror::Error;

use crate::contract::{ParamType, ReturnType};
use crate::query::MethodOperator;
use crate::store::StoreError;
use crate::value::ValueType;

/// A method name that does not follow the naming grammar.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(
        "method `{method}` does not start with an operation prefix \
         (findFirstBy, findManyBy, findBy, countBy, deleteBy, existsBy, pageBy, updateFieldsBy)"
    )]
    NoMethodOperator { method: String },
    #[error("method `{method}` mixes And and Or; a method name may use only one combinator")]
    AmbiguousCombinator { method: String },
    #[error("method `{method}` has an empty filter segment `{segment}` with no field or operator")]
    NoFilterOperator { method: String, segment: String },
    #[error("method `{method}`: `{field}` does not name a field of {entity}")]
    UnknownField {
        method: String,
        field: String,
        entity: String,
    },
}

/// A schema or method declaration rejected at registration time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("entity {entity} declares no fields")]
    NoFields { entity: String },
    #[error("entity {entity} declares field `{field}` twice (names are compared case-insensitively)")]
    DuplicateField { entity: String, field: String },
    #[error("entity {entity} field `{field}` is immutable; derived repositories must be able to write every field")]
    ImmutableField { entity: String, field: String },
    #[error("entity {entity} has no field marked as the unique id")]
    MissingIdField { entity: String },
    #[error("entity {entity} marks both `{first}` and `{second}` as the unique id")]
    MultipleIdFields {
        entity: String,
        first: String,
        second: String,
    },
    #[error("entity {entity} declares an index on unknown field `{field}`")]
    IndexField { entity: String, field: String },

    #[error("method `{method}` is declared twice")]
    DuplicateMethod { method: String },
    #[error("method `{method}`: {operator} must return {expected}, found {actual}")]
    ReturnType {
        method: String,
        operator: MethodOperator,
        expected: &'static str,
        actual: ReturnType,
    },
    #[error("method `{method}` expects {expected} parameters, found {actual}")]
    ParameterCount {
        method: String,
        expected: usize,
        actual: usize,
    },
    #[error("method `{method}` parameter {index} for field `{field}` must be {expected}, found {actual}")]
    ParameterType {
        method: String,
        field: String,
        index: usize,
        expected: ValueType,
        actual: ParamType,
    },
    #[error("method `{method}` parameter {index} is a Regex argument and must be text or a pattern, found {actual}")]
    RegexParameter {
        method: String,
        index: usize,
        actual: ParamType,
    },
    #[error("method `{method}` parameter {index} for field `{field}` must be a list of {expected}, found {actual}")]
    ListParameter {
        method: String,
        field: String,
        index: usize,
        expected: ValueType,
        actual: ParamType,
    },
    #[error("method `{method}`: HasKey needs a map field, `{field}` is {actual}")]
    HasKeyField {
        method: String,
        field: String,
        actual: ValueType,
    },
    #[error("method `{method}` parameter {index} is a {directive} directive, which {operator} methods do not accept there")]
    MisplacedDirective {
        method: String,
        index: usize,
        directive: ParamType,
        operator: MethodOperator,
    },
    #[error("method `{method}` must take a trailing {expected} parameter")]
    MissingDirective {
        method: String,
        expected: ParamType,
    },
    #[error("method `{method}` combines a Sort/Pagination parameter with sort annotations")]
    MixedSort { method: String },
    #[error("method `{method}` sorts by unknown field `{field}`")]
    SortField { method: String, field: String },
}

/// Error type for repository registration and calls.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// Registration of a contract failed; nothing was published.
    #[error("failed to register repository {contract}: {source}")]
    Registration {
        contract: String,
        #[source]
        source: ValidationError,
    },
    #[error("method `{method}` expects {expected} arguments, got {actual}")]
    ParameterCount {
        method: String,
        expected: usize,
        actual: usize,
    },
    #[error("method `{method}` is not supported by repository {contract}")]
    Unsupported { method: String, contract: String },
    #[error("method `{method}` argument {index}: expected {expected}, got {actual}")]
    InvalidArgument {
        method: String,
        index: usize,
        expected: String,
        actual: String,
    },
    #[error("method `{method}` argument {index} must be text or a pattern to be used as a regex, got {actual}")]
    InvalidRegexArgument {
        method: String,
        index: usize,
        actual: String,
    },
    #[error("method `{method}` built an invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        method: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("method `{method}` refers to unknown field `{field}`")]
    UnknownField { method: String, field: String },
    #[error("expected a {expected} result, got {actual}")]
    ReturnMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("serialization error: {0}")]
    Serde(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("asynchronous task failed: {0}")]
    Async(String),
    #[error("repository registry lock poisoned during {0}")]
    LockPoisoned(&'static str),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serde(err.to_string())
    }
}

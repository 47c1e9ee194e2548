mod contract;
mod entity;
mod error;
mod executor;
mod query;
mod repository;
mod store;
mod value;

pub use contract::{
    Argument, Contract, ContractDescriptor, MethodDescriptor, Outcome, Param, ParamType,
    Returned, ReturnType,
};
pub use entity::{
    normalize_field_name, CompoundIndex, Entity, EntityRef, FieldDescriptor, FieldKind,
    IndexSpec, Schema, SchemaDescriptor,
};
pub use error::{ParseError, RepositoryError, ValidationError};
pub use executor::{AsyncHandle, Executor, PoolStats, Task, ThreadExecutor, WorkerPool};
pub use query::{
    compile_filter, parse_method_name, Cardinality, Combinator, CompareOp, CompiledMethodSpec,
    FieldUpdate, Filter, FilterChain, FilterOperator, FilterTerm, MethodOperator, Pagination,
    ParsedMethod, Pattern, Sort, SortField, TrailingParam, UpdateBatch, METHOD_PREFIXES,
    SUFFIX_PRECEDENCE,
};
pub use repository::{
    compile_method, PredefinedOp, RegistryBuilder, RegistryConfig, Repository,
    RepositoryRegistry,
};
pub use store::{DocumentStore, FindOptions, InMemoryDocumentStore, StoreError};
pub use value::{Document, Value, ValueType};

// Re-export the derive and attribute macros from docrepo_macros
pub use docrepo_macros::{repository, Entity};

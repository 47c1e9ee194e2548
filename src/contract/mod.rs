//! Contracts - the declared data-access surface of a repository.
//!
//! A contract is usually a Rust trait annotated with `#[repository]`:
//!
//! ```ignore
//! #[repository(entity = Customer)]
//! pub trait CustomerRepository {
//!     fn find_first_by_first_name(&self, first_name: String)
//!         -> Result<Option<Customer>, RepositoryError>;
//!
//!     #[sort_by(field = "balance", descending)]
//!     #[limit(10)]
//!     fn find_many_by_customer_id_exists(&self) -> Result<Vec<Customer>, RepositoryError>;
//!
//!     #[transform("countByCustomerId")]
//!     fn async_count_customer_id(&self, customer_id: i32) -> AsyncHandle<u64>;
//! }
//! ```
//!
//! The macro turns the trait into a [`ContractDescriptor`] (method names
//! converted to camel case) and implements the trait for
//! `Repository<dyn CustomerRepository>`. A descriptor can also be built by
//! hand when no trait is involved.

mod param;

use std::fmt;

use crate::entity::{Entity, EntityRef};
use crate::query::SortField;
use crate::value::ValueType;

pub use param::{Argument, Outcome, Param, Returned};

/// Declared type of one method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Value(ValueType),
    Pattern,
    Sort,
    Pagination,
    UpdateBatch,
}

impl ParamType {
    /// Whether this is a trailing directive rather than a filter value.
    pub fn is_directive(&self) -> bool {
        matches!(
            self,
            ParamType::Sort | ParamType::Pagination | ParamType::UpdateBatch
        )
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Value(ty) => write!(f, "{}", ty),
            ParamType::Pattern => write!(f, "pattern"),
            ParamType::Sort => write!(f, "Sort"),
            ParamType::Pagination => write!(f, "Pagination"),
            ParamType::UpdateBatch => write!(f, "UpdateBatch"),
        }
    }
}

/// Declared return type of a method, with async wrappers removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnType {
    Entity(EntityRef),
    EntityList(EntityRef),
    Bool,
    Integer,
    Float,
    Text,
    Value,
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnType::Entity(e) => write!(f, "Option<{}>", e),
            ReturnType::EntityList(e) => write!(f, "Vec<{}>", e),
            ReturnType::Bool => write!(f, "bool"),
            ReturnType::Integer => write!(f, "integer"),
            ReturnType::Float => write!(f, "float"),
            ReturnType::Text => write!(f, "text"),
            ReturnType::Value => write!(f, "value"),
        }
    }
}

/// One declared contract method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    pub name: String,
    pub params: Vec<(String, ParamType)>,
    pub returns: ReturnType,
    pub asynchronous: bool,
    /// Borrow the parsed form of another method name.
    pub transform: Option<String>,
    pub sort_by: Vec<SortField>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>, returns: ReturnType) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns,
            asynchronous: false,
            transform: None,
            sort_by: Vec::new(),
            limit: None,
            skip: None,
        }
    }

    pub fn param(mut self, name: impl Into<String>, ty: ParamType) -> Self {
        self.params.push((name.into(), ty));
        self
    }

    pub fn asynchronous(mut self) -> Self {
        self.asynchronous = true;
        self
    }

    pub fn transform(mut self, target: impl Into<String>) -> Self {
        self.transform = Some(target.into());
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, ascending: bool) -> Self {
        self.sort_by.push(SortField::new(field, ascending));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Name used for parsing and predefined lookup.
    pub fn effective_name(&self) -> &str {
        self.transform.as_deref().unwrap_or(&self.name)
    }

    pub fn has_sort_annotations(&self) -> bool {
        !self.sort_by.is_empty() || self.limit.is_some() || self.skip.is_some()
    }
}

/// Every declared method of one contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractDescriptor {
    pub name: String,
    pub methods: Vec<MethodDescriptor>,
}

impl ContractDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }
}

/// A declared repository contract bound to one entity type.
///
/// `Self` is the registry key; `#[repository]` implements this for
/// `dyn Trait`.
pub trait Contract: 'static {
    type Entity: Entity;

    fn describe() -> ContractDescriptor;
}

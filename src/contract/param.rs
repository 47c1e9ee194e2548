//! Mapping between Rust signatures and the dynamic call representation.

use crate::entity::{Entity, EntityRef, FieldKind};
use crate::error::RepositoryError;
use crate::query::{Pagination, Pattern, Sort, UpdateBatch};
use crate::value::{Document, Value, ValueType};

use super::{ParamType, ReturnType};

/// A runtime argument of a repository call.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Value(Value),
    Pattern(Pattern),
    Sort(Sort),
    Pagination(Pagination),
    Update(UpdateBatch),
    Entity(Document),
    Entities(Vec<Document>),
}

impl Argument {
    pub fn kind(&self) -> &'static str {
        match self {
            Argument::Value(v) => v.kind(),
            Argument::Pattern(_) => "pattern",
            Argument::Sort(_) => "Sort",
            Argument::Pagination(_) => "Pagination",
            Argument::Update(_) => "UpdateBatch",
            Argument::Entity(_) => "entity",
            Argument::Entities(_) => "entity list",
        }
    }
}

impl From<Value> for Argument {
    fn from(value: Value) -> Self {
        Argument::Value(value)
    }
}

/// Result of a dispatched call, before conversion to the declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Entity(Option<Document>),
    Entities(Vec<Document>),
    Bool(bool),
    Count(u64),
    Text(String),
    Value(Value),
}

impl Outcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Entity(_) => "entity",
            Outcome::Entities(_) => "entity list",
            Outcome::Bool(_) => "bool",
            Outcome::Count(_) => "count",
            Outcome::Text(_) => "text",
            Outcome::Value(_) => "value",
        }
    }
}

/// A Rust type usable as a contract method parameter.
pub trait Param {
    fn param_type() -> ParamType;
    fn into_argument(self) -> Argument;
}

macro_rules! scalar_param {
    ($($ty:ty),*) => {
        $(
            impl Param for $ty {
                fn param_type() -> ParamType {
                    ParamType::Value(<$ty as FieldKind>::value_type())
                }

                fn into_argument(self) -> Argument {
                    Argument::Value(Value::from(self))
                }
            }
        )*
    };
}

scalar_param!(bool, i8, i16, i32, i64, u8, u16, u32, f32, f64, String, uuid::Uuid);

impl Param for &str {
    fn param_type() -> ParamType {
        ParamType::Value(ValueType::Text)
    }

    fn into_argument(self) -> Argument {
        Argument::Value(Value::from(self))
    }
}

impl<T: FieldKind + Into<Value>> Param for Vec<T> {
    fn param_type() -> ParamType {
        ParamType::Value(ValueType::list_of(T::value_type()))
    }

    fn into_argument(self) -> Argument {
        Argument::Value(Value::from(self))
    }
}

impl<T: FieldKind + Into<Value>> Param for Option<T> {
    fn param_type() -> ParamType {
        ParamType::Value(T::value_type())
    }

    fn into_argument(self) -> Argument {
        Argument::Value(Value::from(self))
    }
}

impl Param for Pattern {
    fn param_type() -> ParamType {
        ParamType::Pattern
    }

    fn into_argument(self) -> Argument {
        Argument::Pattern(self)
    }
}

impl Param for regex::Regex {
    fn param_type() -> ParamType {
        ParamType::Pattern
    }

    fn into_argument(self) -> Argument {
        Argument::Pattern(Pattern::from(self))
    }
}

impl Param for Sort {
    fn param_type() -> ParamType {
        ParamType::Sort
    }

    fn into_argument(self) -> Argument {
        Argument::Sort(self)
    }
}

impl Param for Pagination {
    fn param_type() -> ParamType {
        ParamType::Pagination
    }

    fn into_argument(self) -> Argument {
        Argument::Pagination(self)
    }
}

impl Param for UpdateBatch {
    fn param_type() -> ParamType {
        ParamType::UpdateBatch
    }

    fn into_argument(self) -> Argument {
        Argument::Update(self)
    }
}

/// A Rust type usable as the (unwrapped) return type of a contract method.
pub trait Returned: Sized + Send + 'static {
    fn return_type() -> ReturnType;
    fn from_outcome(outcome: Outcome) -> Result<Self, RepositoryError>;
}

fn mismatch<T>(expected: &'static str, outcome: &Outcome) -> Result<T, RepositoryError> {
    Err(RepositoryError::ReturnMismatch {
        expected,
        actual: outcome.kind(),
    })
}

impl<E: Entity> Returned for Option<E> {
    fn return_type() -> ReturnType {
        ReturnType::Entity(EntityRef::of::<E>())
    }

    fn from_outcome(outcome: Outcome) -> Result<Self, RepositoryError> {
        match outcome {
            Outcome::Entity(doc) => Ok(doc.map(|d| d.to_entity()).transpose()?),
            other => mismatch("entity", &other),
        }
    }
}

impl<E: Entity> Returned for Vec<E> {
    fn return_type() -> ReturnType {
        ReturnType::EntityList(EntityRef::of::<E>())
    }

    fn from_outcome(outcome: Outcome) -> Result<Self, RepositoryError> {
        match outcome {
            Outcome::Entities(docs) => Ok(docs
                .iter()
                .map(Document::to_entity::<E>)
                .collect::<Result<_, _>>()?),
            other => mismatch("entity list", &other),
        }
    }
}

impl Returned for bool {
    fn return_type() -> ReturnType {
        ReturnType::Bool
    }

    fn from_outcome(outcome: Outcome) -> Result<Self, RepositoryError> {
        match outcome {
            Outcome::Bool(b) => Ok(b),
            other => mismatch("bool", &other),
        }
    }
}

macro_rules! integer_returned {
    ($($ty:ty),*) => {
        $(
            impl Returned for $ty {
                fn return_type() -> ReturnType {
                    ReturnType::Integer
                }

                fn from_outcome(outcome: Outcome) -> Result<Self, RepositoryError> {
                    match outcome {
                        Outcome::Count(n) => <$ty>::try_from(n).map_err(|_| {
                            RepositoryError::ReturnMismatch {
                                expected: stringify!($ty),
                                actual: "count out of range",
                            }
                        }),
                        other => mismatch(stringify!($ty), &other),
                    }
                }
            }
        )*
    };
}

integer_returned!(u32, u64, usize, i32, i64);

impl Returned for f64 {
    fn return_type() -> ReturnType {
        ReturnType::Float
    }

    fn from_outcome(outcome: Outcome) -> Result<Self, RepositoryError> {
        match outcome {
            Outcome::Count(n) => Ok(n as f64),
            other => mismatch("f64", &other),
        }
    }
}

impl Returned for String {
    fn return_type() -> ReturnType {
        ReturnType::Text
    }

    fn from_outcome(outcome: Outcome) -> Result<Self, RepositoryError> {
        match outcome {
            Outcome::Text(s) => Ok(s),
            other => mismatch("text", &other),
        }
    }
}

impl Returned for Value {
    fn return_type() -> ReturnType {
        ReturnType::Value
    }

    fn from_outcome(outcome: Outcome) -> Result<Self, RepositoryError> {
        match outcome {
            Outcome::Value(v) => Ok(v),
            other => mismatch("value", &other),
        }
    }
}

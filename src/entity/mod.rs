//! Entities - the typed documents a repository stores.
//!
//! An entity is a serde-serializable struct with a static
//! [`SchemaDescriptor`]. Derive it with `#[derive(Entity)]`:
//!
//! ```ignore
//! use docrepo::Entity;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Serialize, Deserialize, Entity)]
//! #[entity(collection = "customers", index = "customer_id, -balance")]
//! struct Customer {
//!     #[entity(id)]
//!     pub unique_id: uuid::Uuid,
//!     pub customer_id: i32,
//!     pub first_name: String,
//!     pub balance: f64,
//! }
//! ```
//!
//! or implement [`Entity`] by hand and build the descriptor with
//! [`SchemaDescriptor::new`].

mod schema;

use std::collections::{BTreeMap, HashMap};

use serde::{de::DeserializeOwned, Serialize};

use crate::value::ValueType;

pub use schema::{
    normalize_field_name, CompoundIndex, EntityRef, FieldDescriptor, IndexSpec, Schema,
    SchemaDescriptor,
};

/// Trait for types that can be stored by a derived repository.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The collection name for this entity type.
    /// Maps to a collection in MongoDB, a table in SQL, a key prefix in KV stores, etc.
    const COLLECTION: &'static str;

    /// Static description of the entity's fields, id and indexes.
    fn schema() -> SchemaDescriptor;
}

/// Maps a Rust field type to the [`ValueType`] recorded in the schema.
///
/// Implemented for the scalar types a document field can hold. Nested
/// structs are marked with `#[entity(object)]` instead.
pub trait FieldKind {
    fn value_type() -> ValueType;
}

macro_rules! field_kind {
    ($kind:expr => $($ty:ty),*) => {
        $(
            impl FieldKind for $ty {
                fn value_type() -> ValueType {
                    $kind
                }
            }
        )*
    };
}

field_kind!(ValueType::Bool => bool);
field_kind!(ValueType::Int => i8, i16, i32, i64, u8, u16, u32);
field_kind!(ValueType::Float => f32, f64);
field_kind!(ValueType::Text => String);
field_kind!(ValueType::Uuid => uuid::Uuid);

impl<T: FieldKind> FieldKind for Option<T> {
    fn value_type() -> ValueType {
        T::value_type()
    }
}

impl<T: FieldKind> FieldKind for Vec<T> {
    fn value_type() -> ValueType {
        ValueType::list_of(T::value_type())
    }
}

impl<K, V, S> FieldKind for HashMap<K, V, S> {
    fn value_type() -> ValueType {
        ValueType::Map
    }
}

impl<K, V> FieldKind for BTreeMap<K, V> {
    fn value_type() -> ValueType {
        ValueType::Map
    }
}

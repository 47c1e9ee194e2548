//! Schema descriptors - the static shape of an entity.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use crate::error::ValidationError;
use crate::value::ValueType;

/// Identity of an entity type: its Rust type id plus a printable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub type_id: TypeId,
    pub name: &'static str,
}

impl EntityRef {
    pub fn of<E: ?Sized + 'static>() -> Self {
        let full = std::any::type_name::<E>();
        Self {
            type_id: TypeId::of::<E>(),
            name: full.rsplit("::").next().unwrap_or(full),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Key used for case-insensitive field matching: lower-cased with
/// underscores removed, so `first_name`, `firstName` and `FirstName` agree.
pub fn normalize_field_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// One declared field of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Raw identifier as stored in documents.
    pub name: String,
    pub value_type: ValueType,
    pub id: bool,
    /// Suppresses the unique index on the id field.
    pub non_index: bool,
    pub immutable: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            id: false,
            non_index: false,
            immutable: false,
        }
    }

    pub fn id(mut self) -> Self {
        self.id = true;
        self
    }

    pub fn non_index(mut self) -> Self {
        self.non_index = true;
        self
    }

    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }
}

/// A compound index declared on the entity, by field name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompoundIndex {
    pub fields: Vec<(String, bool)>,
    pub unique: bool,
}

impl CompoundIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `"customer_id, -balance"`: comma separated, a leading `-`
    /// marks a descending key.
    pub fn parse(spec: &str) -> Self {
        let fields = spec
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix('-') {
                Some(name) => (name.trim().to_string(), false),
                None => (s.to_string(), true),
            })
            .collect();
        Self {
            fields,
            unique: false,
        }
    }

    pub fn ascending(mut self, field: impl Into<String>) -> Self {
        self.fields.push((field.into(), true));
        self
    }

    pub fn descending(mut self, field: impl Into<String>) -> Self {
        self.fields.push((field.into(), false));
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Index creation directive handed to the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexSpec {
    /// (raw field name, ascending)
    pub keys: Vec<(String, bool)>,
    pub unique: bool,
}

impl IndexSpec {
    /// Conventional index name, `field_1_other_-1` style.
    pub fn name(&self) -> String {
        self.keys
            .iter()
            .map(|(field, asc)| format!("{}_{}", field, if *asc { 1 } else { -1 }))
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// Unvalidated description of an entity, as produced by `#[derive(Entity)]`
/// or written by hand.
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    entity: EntityRef,
    collection: String,
    fields: Vec<FieldDescriptor>,
    indexes: Vec<CompoundIndex>,
    drop_entities_on_start: bool,
    drop_indexes_on_start: bool,
}

impl SchemaDescriptor {
    pub fn new<E: 'static>(collection: impl Into<String>) -> Self {
        Self {
            entity: EntityRef::of::<E>(),
            collection: collection.into(),
            fields: Vec::new(),
            indexes: Vec::new(),
            drop_entities_on_start: false,
            drop_indexes_on_start: false,
        }
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn index(mut self, index: CompoundIndex) -> Self {
        self.indexes.push(index);
        self
    }

    /// Drop every stored entity when the repository is registered.
    pub fn drop_entities_on_start(mut self) -> Self {
        self.drop_entities_on_start = true;
        self
    }

    /// Drop every index when the repository is registered.
    pub fn drop_indexes_on_start(mut self) -> Self {
        self.drop_indexes_on_start = true;
        self
    }

    pub fn entity(&self) -> EntityRef {
        self.entity
    }

    /// Check the schema invariants and build the lookup tables.
    pub fn resolve(self) -> Result<Schema, ValidationError> {
        let entity = self.entity.name.to_string();
        if self.fields.is_empty() {
            return Err(ValidationError::NoFields { entity });
        }

        let mut by_key = HashMap::with_capacity(self.fields.len());
        let mut id = None;
        for (index, field) in self.fields.iter().enumerate() {
            if by_key
                .insert(normalize_field_name(&field.name), index)
                .is_some()
            {
                return Err(ValidationError::DuplicateField {
                    entity,
                    field: field.name.clone(),
                });
            }
            if field.immutable {
                return Err(ValidationError::ImmutableField {
                    entity,
                    field: field.name.clone(),
                });
            }
            if field.id {
                if let Some(first) = id {
                    let first: &FieldDescriptor = &self.fields[first];
                    return Err(ValidationError::MultipleIdFields {
                        entity,
                        first: first.name.clone(),
                        second: field.name.clone(),
                    });
                }
                id = Some(index);
            }
        }
        let id = id.ok_or_else(|| ValidationError::MissingIdField {
            entity: entity.clone(),
        })?;

        let lookup = |name: &str| {
            by_key
                .get(&normalize_field_name(name))
                .map(|&i| self.fields[i].name.clone())
        };

        let mut indexes = Vec::new();
        let id_field = &self.fields[id];
        if !id_field.non_index {
            indexes.push(IndexSpec {
                keys: vec![(id_field.name.clone(), true)],
                unique: true,
            });
        }
        for compound in &self.indexes {
            let mut keys = Vec::with_capacity(compound.fields.len());
            for (name, ascending) in &compound.fields {
                let raw = lookup(name).ok_or_else(|| ValidationError::IndexField {
                    entity: entity.clone(),
                    field: name.clone(),
                })?;
                keys.push((raw, *ascending));
            }
            indexes.push(IndexSpec {
                keys,
                unique: compound.unique,
            });
        }

        Ok(Schema {
            entity: self.entity,
            collection: self.collection,
            fields: self.fields,
            by_key,
            id,
            indexes,
            drop_entities_on_start: self.drop_entities_on_start,
            drop_indexes_on_start: self.drop_indexes_on_start,
        })
    }
}

/// A validated schema with case-insensitive field lookup.
#[derive(Debug, Clone)]
pub struct Schema {
    entity: EntityRef,
    collection: String,
    fields: Vec<FieldDescriptor>,
    by_key: HashMap<String, usize>,
    id: usize,
    indexes: Vec<IndexSpec>,
    drop_entities_on_start: bool,
    drop_indexes_on_start: bool,
}

impl Schema {
    pub fn entity(&self) -> EntityRef {
        self.entity
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Find a field by name, ignoring case and underscores.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_key
            .get(&normalize_field_name(name))
            .map(|&i| &self.fields[i])
    }

    pub fn id_field(&self) -> &FieldDescriptor {
        &self.fields[self.id]
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Index directives to emit at registration, id index first.
    pub fn indexes(&self) -> &[IndexSpec] {
        &self.indexes
    }

    pub fn drops_entities_on_start(&self) -> bool {
        self.drop_entities_on_start
    }

    pub fn drops_indexes_on_start(&self) -> bool {
        self.drop_indexes_on_start
    }
}

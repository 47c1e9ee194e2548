use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::contract::{Argument, Contract, Outcome, Returned};
use crate::entity::Schema;
use crate::error::RepositoryError;
use crate::executor::{AsyncHandle, Executor};
use crate::query::{CompiledMethodSpec, FieldUpdate, Filter, SortField, UpdateBatch};
use crate::store::DocumentStore;
use crate::value::{Document, Value};

/// Published state of one registered contract. Never mutated once built.
pub struct RepositoryCore {
    pub(crate) contract: String,
    pub(crate) schema: Schema,
    /// Derived methods by declared name.
    pub(crate) methods: HashMap<String, CompiledMethodSpec>,
    /// Declared name -> transform target, for every transformed method.
    pub(crate) transforms: HashMap<String, String>,
    pub(crate) store: Arc<dyn DocumentStore>,
    pub(crate) executor: Arc<dyn Executor>,
}

impl RepositoryCore {
    pub(crate) fn id_of<'d>(&self, doc: &'d Document) -> Option<&'d Value> {
        doc.get(&self.schema.id_field().name)
    }

    pub(crate) fn id_filter(&self, id: Value) -> Filter {
        Filter::Eq {
            field: self.schema.id_field().name.clone(),
            value: id,
        }
    }

    /// Replace the stored document with the same id, or insert it.
    pub(crate) fn save(&self, doc: Document) -> Result<bool, RepositoryError> {
        let collection = self.schema.collection();
        let acknowledged = match self.id_of(&doc).filter(|id| !id.is_null()).cloned() {
            Some(id) => {
                self.store
                    .upsert_by_id(collection, &self.schema.id_field().name, &id, doc)?
            }
            None => self.store.insert(collection, doc)?,
        };
        Ok(acknowledged)
    }

    /// Map sort keys onto raw field names.
    pub(crate) fn resolve_sort(
        &self,
        method: &str,
        keys: &[SortField],
    ) -> Result<Vec<SortField>, RepositoryError> {
        keys.iter()
            .map(|key| {
                self.schema
                    .field(&key.field)
                    .map(|field| SortField::new(field.name.clone(), key.ascending))
                    .ok_or_else(|| RepositoryError::UnknownField {
                        method: method.to_string(),
                        field: key.field.clone(),
                    })
            })
            .collect()
    }

    /// Map update targets onto raw field names. The id field is off limits.
    pub(crate) fn resolve_updates(
        &self,
        method: &str,
        updates: &UpdateBatch,
    ) -> Result<UpdateBatch, RepositoryError> {
        let id_field = &self.schema.id_field().name;
        let resolved = updates
            .updates()
            .iter()
            .map(|update| {
                let field = self
                    .schema
                    .field(update.field())
                    .map(|f| f.name.clone())
                    .ok_or_else(|| RepositoryError::UnknownField {
                        method: method.to_string(),
                        field: update.field().to_string(),
                    })?;
                if &field == id_field {
                    return Err(RepositoryError::InvalidArgument {
                        method: method.to_string(),
                        index: 0,
                        expected: "an update of a non-id field".to_string(),
                        actual: format!("an update of `{}`", field),
                    });
                }
                Ok(match update {
                    FieldUpdate::Set { value, .. } => FieldUpdate::Set {
                        field,
                        value: value.clone(),
                    },
                    FieldUpdate::Unset { .. } => FieldUpdate::Unset { field },
                    FieldUpdate::Rename { to, .. } => FieldUpdate::Rename {
                        field,
                        to: to.clone(),
                    },
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(UpdateBatch::from(resolved))
    }
}

/// A registered repository for contract `C`.
///
/// `#[repository]` implements the contract trait for
/// `Repository<dyn Trait>`; every generated method forwards to
/// [`Repository::call`] or [`Repository::call_async`]. The predefined
/// operations are available as inherent methods.
pub struct Repository<C: ?Sized> {
    core: Arc<RepositoryCore>,
    _contract: PhantomData<fn() -> *const C>,
}

impl<C: ?Sized> Clone for Repository<C> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            _contract: PhantomData,
        }
    }
}

impl<C: ?Sized> fmt::Debug for Repository<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("contract", &self.core.contract)
            .field("collection", &self.core.schema.collection())
            .field("methods", &self.core.methods.len())
            .finish()
    }
}

impl<C: Contract + ?Sized> Repository<C> {
    pub(crate) fn from_core(core: RepositoryCore) -> Self {
        Self {
            core: Arc::new(core),
            _contract: PhantomData,
        }
    }

    pub fn contract_name(&self) -> &str {
        &self.core.contract
    }

    pub fn schema(&self) -> &Schema {
        &self.core.schema
    }

    /// The frozen spec of a derived method, if it was declared.
    pub fn method(&self, name: &str) -> Option<&CompiledMethodSpec> {
        self.core.methods.get(name)
    }

    /// Dispatch a call by camel-case method name.
    pub fn invoke(&self, method: &str, args: Vec<Argument>) -> Result<Outcome, RepositoryError> {
        self.core.dispatch(method, args, false)
    }

    /// Dispatch a call on the registry's executor.
    pub fn invoke_async(&self, method: &str, args: Vec<Argument>) -> AsyncHandle<Outcome> {
        let core = Arc::clone(&self.core);
        let executor = Arc::clone(&core.executor);
        let method = method.to_string();
        AsyncHandle::spawn(executor.as_ref(), move || {
            core.dispatch(&method, args, true)
        })
    }

    pub fn call<T: Returned>(&self, method: &str, args: Vec<Argument>) -> Result<T, RepositoryError> {
        self.invoke(method, args).and_then(T::from_outcome)
    }

    pub fn call_async<T: Returned>(&self, method: &str, args: Vec<Argument>) -> AsyncHandle<T> {
        let core = Arc::clone(&self.core);
        let executor = Arc::clone(&core.executor);
        let method = method.to_string();
        AsyncHandle::spawn(executor.as_ref(), move || {
            core.dispatch(&method, args, true).and_then(T::from_outcome)
        })
    }

    pub fn collection_name(&self) -> Result<String, RepositoryError> {
        self.call("getCollectionName", Vec::new())
    }

    /// Id value of `entity` as stored.
    pub fn unique_id(&self, entity: &C::Entity) -> Result<Value, RepositoryError> {
        self.call("getUniqueId", vec![entity_argument(entity)?])
    }

    pub fn find_by_id(&self, id: impl Into<Value>) -> Result<Option<C::Entity>, RepositoryError> {
        self.call("findById", vec![Argument::Value(id.into())])
    }

    pub fn find_all(&self) -> Result<Vec<C::Entity>, RepositoryError> {
        self.call("findAll", Vec::new())
    }

    /// Replace the entity with the same id, or insert it.
    pub fn save(&self, entity: &C::Entity) -> Result<bool, RepositoryError> {
        self.call("save", vec![entity_argument(entity)?])
    }

    pub fn save_all(&self, entities: &[C::Entity]) -> Result<bool, RepositoryError> {
        self.call("saveAll", vec![entities_argument(entities)?])
    }

    pub fn delete(&self, entity: &C::Entity) -> Result<bool, RepositoryError> {
        self.call("delete", vec![entity_argument(entity)?])
    }

    pub fn delete_by_id(&self, id: impl Into<Value>) -> Result<bool, RepositoryError> {
        self.call("deleteById", vec![Argument::Value(id.into())])
    }

    /// Drop the whole collection.
    pub fn delete_all(&self) -> Result<bool, RepositoryError> {
        self.call("deleteAll", Vec::new())
    }

    pub fn exists(&self, entity: &C::Entity) -> Result<bool, RepositoryError> {
        self.call("exists", vec![entity_argument(entity)?])
    }

    pub fn exists_by_id(&self, id: impl Into<Value>) -> Result<bool, RepositoryError> {
        self.call("existsById", vec![Argument::Value(id.into())])
    }

    /// Apply `updates` to every stored entity.
    pub fn update_all_fields(&self, updates: UpdateBatch) -> Result<bool, RepositoryError> {
        self.call("updateAllFields", vec![Argument::Update(updates)])
    }

    pub fn async_find_by_id(&self, id: impl Into<Value>) -> AsyncHandle<Option<C::Entity>> {
        self.call_async("asyncFindById", vec![Argument::Value(id.into())])
    }

    pub fn async_find_all(&self) -> AsyncHandle<Vec<C::Entity>> {
        self.call_async("asyncFindAll", Vec::new())
    }

    pub fn async_save(&self, entity: &C::Entity) -> AsyncHandle<bool> {
        match entity_argument(entity) {
            Ok(arg) => self.call_async("asyncSave", vec![arg]),
            Err(e) => AsyncHandle::ready(Err(e)),
        }
    }

    pub fn async_save_all(&self, entities: &[C::Entity]) -> AsyncHandle<bool> {
        match entities_argument(entities) {
            Ok(arg) => self.call_async("asyncSaveAll", vec![arg]),
            Err(e) => AsyncHandle::ready(Err(e)),
        }
    }

    pub fn async_delete_by_id(&self, id: impl Into<Value>) -> AsyncHandle<bool> {
        self.call_async("asyncDeleteById", vec![Argument::Value(id.into())])
    }

    pub fn async_delete_all(&self) -> AsyncHandle<bool> {
        self.call_async("asyncDeleteAll", Vec::new())
    }

    pub fn async_exists_by_id(&self, id: impl Into<Value>) -> AsyncHandle<bool> {
        self.call_async("asyncExistsById", vec![Argument::Value(id.into())])
    }

    pub fn async_update_all_fields(&self, updates: UpdateBatch) -> AsyncHandle<bool> {
        self.call_async("asyncUpdateAllFields", vec![Argument::Update(updates)])
    }
}

fn entity_argument<E: serde::Serialize>(entity: &E) -> Result<Argument, RepositoryError> {
    Ok(Argument::Entity(Document::from_entity(entity)?))
}

fn entities_argument<E: serde::Serialize>(entities: &[E]) -> Result<Argument, RepositoryError> {
    let docs = entities
        .iter()
        .map(Document::from_entity)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Argument::Entities(docs))
}

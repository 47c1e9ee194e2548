//! Operations every repository supports without declaring them.
//!
//! Each one has a fixed name and arity. `async` + the capitalized name
//! (`asyncFindById`) selects the same operation for asynchronous calls.

use crate::contract::{Argument, Outcome};
use crate::error::RepositoryError;
use crate::query::{Filter, UpdateBatch};
use crate::store::FindOptions;
use crate::value::{Document, Value};

use super::repository::RepositoryCore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredefinedOp {
    GetCollectionName,
    GetUniqueId,
    FindById,
    FindAll,
    Save,
    SaveAll,
    Delete,
    DeleteById,
    DeleteAll,
    Exists,
    ExistsById,
    UpdateAllFields,
}

const ASYNC_PREFIX: &str = "async";

impl PredefinedOp {
    pub const ALL: [PredefinedOp; 12] = [
        PredefinedOp::GetCollectionName,
        PredefinedOp::GetUniqueId,
        PredefinedOp::FindById,
        PredefinedOp::FindAll,
        PredefinedOp::Save,
        PredefinedOp::SaveAll,
        PredefinedOp::Delete,
        PredefinedOp::DeleteById,
        PredefinedOp::DeleteAll,
        PredefinedOp::Exists,
        PredefinedOp::ExistsById,
        PredefinedOp::UpdateAllFields,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            PredefinedOp::GetCollectionName => "getCollectionName",
            PredefinedOp::GetUniqueId => "getUniqueId",
            PredefinedOp::FindById => "findById",
            PredefinedOp::FindAll => "findAll",
            PredefinedOp::Save => "save",
            PredefinedOp::SaveAll => "saveAll",
            PredefinedOp::Delete => "delete",
            PredefinedOp::DeleteById => "deleteById",
            PredefinedOp::DeleteAll => "deleteAll",
            PredefinedOp::Exists => "exists",
            PredefinedOp::ExistsById => "existsById",
            PredefinedOp::UpdateAllFields => "updateAllFields",
        }
    }

    pub const fn arity(self) -> usize {
        match self {
            PredefinedOp::GetCollectionName | PredefinedOp::FindAll | PredefinedOp::DeleteAll => 0,
            _ => 1,
        }
    }

    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Resolve an `asyncXxx` name to the operation `xxx`.
    pub fn lookup_async(name: &str) -> Option<Self> {
        let rest = name.strip_prefix(ASYNC_PREFIX)?;
        Self::ALL
            .into_iter()
            .find(|op| capitalize(op.name()) == rest)
    }

    pub fn async_name(self) -> String {
        format!("{}{}", ASYNC_PREFIX, capitalize(self.name()))
    }

    /// Whether a declared method name is served by a predefined operation
    /// rather than derived from its name.
    pub fn serves(name: &str, asynchronous: bool, transformed: bool) -> bool {
        Self::lookup(name).is_some()
            || (asynchronous && !transformed && Self::lookup_async(name).is_some())
    }

    pub(crate) fn run(
        self,
        core: &RepositoryCore,
        method: &str,
        mut args: Vec<Argument>,
    ) -> Result<Outcome, RepositoryError> {
        if args.len() != self.arity() {
            return Err(RepositoryError::ParameterCount {
                method: method.to_string(),
                expected: self.arity(),
                actual: args.len(),
            });
        }
        let store = core.store.as_ref();
        let collection = core.schema.collection();
        let arg = args.pop();

        let outcome = match self {
            PredefinedOp::GetCollectionName => Outcome::Text(collection.to_string()),
            PredefinedOp::GetUniqueId => {
                let doc = entity_arg(method, arg)?;
                Outcome::Value(entity_id(core, method, &doc)?)
            }
            PredefinedOp::FindById => {
                let id = value_arg(method, arg)?;
                Outcome::Entity(store.find_one(collection, &core.id_filter(id), &[])?)
            }
            PredefinedOp::FindAll => {
                Outcome::Entities(store.find(collection, &Filter::MatchAll, &FindOptions::default())?)
            }
            PredefinedOp::Save => Outcome::Bool(core.save(entity_arg(method, arg)?)?),
            PredefinedOp::SaveAll => {
                let docs = match arg {
                    Some(Argument::Entities(docs)) => docs,
                    other => return Err(invalid(method, "entity list", other)),
                };
                let mut acknowledged = true;
                for doc in docs {
                    acknowledged &= core.save(doc)?;
                }
                Outcome::Bool(acknowledged)
            }
            PredefinedOp::Delete => {
                let doc = entity_arg(method, arg)?;
                let id = entity_id(core, method, &doc)?;
                Outcome::Bool(store.delete_many(collection, &core.id_filter(id))?)
            }
            PredefinedOp::DeleteById => {
                let id = value_arg(method, arg)?;
                Outcome::Bool(store.delete_many(collection, &core.id_filter(id))?)
            }
            PredefinedOp::DeleteAll => Outcome::Bool(store.delete_collection(collection)?),
            PredefinedOp::Exists => {
                let doc = entity_arg(method, arg)?;
                let id = entity_id(core, method, &doc)?;
                Outcome::Bool(store.count(collection, &core.id_filter(id))? > 0)
            }
            PredefinedOp::ExistsById => {
                let id = value_arg(method, arg)?;
                Outcome::Bool(store.count(collection, &core.id_filter(id))? > 0)
            }
            PredefinedOp::UpdateAllFields => {
                let updates: UpdateBatch = match arg {
                    Some(Argument::Update(updates)) => core.resolve_updates(method, &updates)?,
                    other => return Err(invalid(method, "UpdateBatch", other)),
                };
                Outcome::Bool(store.update_many(collection, &Filter::MatchAll, &updates)?)
            }
        };
        Ok(outcome)
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// A non-null id argument.
fn value_arg(method: &str, arg: Option<Argument>) -> Result<Value, RepositoryError> {
    match arg {
        Some(Argument::Value(value)) if !value.is_null() => Ok(value),
        other => Err(invalid(method, "non-null id value", other)),
    }
}

/// The id of `doc`, which must be present and non-null.
fn entity_id(core: &RepositoryCore, method: &str, doc: &Document) -> Result<Value, RepositoryError> {
    match core.id_of(doc) {
        Some(id) if !id.is_null() => Ok(id.clone()),
        _ => Err(RepositoryError::InvalidArgument {
            method: method.to_string(),
            index: 0,
            expected: format!("an entity with a `{}` id", core.schema.id_field().name),
            actual: "an entity without one".to_string(),
        }),
    }
}

fn entity_arg(method: &str, arg: Option<Argument>) -> Result<Document, RepositoryError> {
    match arg {
        Some(Argument::Entity(doc)) => Ok(doc),
        other => Err(invalid(method, "entity", other)),
    }
}

fn invalid(method: &str, expected: &str, actual: Option<Argument>) -> RepositoryError {
    RepositoryError::InvalidArgument {
        method: method.to_string(),
        index: 0,
        expected: expected.to_string(),
        actual: actual.as_ref().map_or("nothing", Argument::kind).to_string(),
    }
}

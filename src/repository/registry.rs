//! RepositoryRegistry - builds each contract's repository once and hands
//! out the cached instance afterwards.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::contract::{Contract, ContractDescriptor};
use crate::entity::{Entity, Schema};
use crate::error::{RepositoryError, ValidationError};
use crate::executor::{Executor, ThreadExecutor, WorkerPool};
use crate::store::DocumentStore;

use super::config::RegistryConfig;
use super::predefined::PredefinedOp;
use super::repository::{Repository, RepositoryCore};
use super::validator::compile_method;

type Published = Arc<dyn Any + Send + Sync>;

/// Lazily populated table of repositories keyed by contract type.
///
/// ## Example
///
/// ```ignore
/// use docrepo::{InMemoryDocumentStore, RepositoryRegistry};
/// use std::sync::Arc;
///
/// let registry = RepositoryRegistry::new(Arc::new(InMemoryDocumentStore::new()));
/// let customers = registry.obtain::<dyn CustomerRepository>()?;
/// let found = customers.find_many_by_customer_id(7)?;
/// ```
pub struct RepositoryRegistry {
    store: Arc<dyn DocumentStore>,
    executor: Arc<dyn Executor>,
    config: RegistryConfig,
    published: RwLock<HashMap<TypeId, Published>>,
    building: Mutex<HashMap<TypeId, Arc<Mutex<()>>>>,
}

impl RepositoryRegistry {
    /// Registry with default config and a thread-per-call executor.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::builder(store).build()
    }

    pub fn builder(store: Arc<dyn DocumentStore>) -> RegistryBuilder {
        RegistryBuilder {
            store,
            config: RegistryConfig::default(),
            executor: None,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Number of published repositories.
    pub fn len(&self) -> usize {
        self.published.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_registered<C: Contract + ?Sized>(&self) -> bool {
        self.published
            .read()
            .map(|p| p.contains_key(&TypeId::of::<C>()))
            .unwrap_or(false)
    }

    /// The repository for contract `C`, building it on first use.
    ///
    /// Concurrent first calls build once; the others block and then share
    /// the published instance. A failed build publishes nothing, so a later
    /// call retries.
    pub fn obtain<C: Contract + ?Sized>(&self) -> Result<Arc<Repository<C>>, RepositoryError> {
        if let Some(repo) = self.lookup::<C>()? {
            return Ok(repo);
        }

        let key = TypeId::of::<C>();
        let gate = {
            let mut building = self
                .building
                .lock()
                .map_err(|_| RepositoryError::LockPoisoned("build"))?;
            Arc::clone(building.entry(key).or_default())
        };
        // A build that panicked published nothing, so its poisoned gate is
        // safe to reuse.
        let _guard = gate.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(repo) = self.lookup::<C>()? {
            return Ok(repo);
        }

        let repo = Arc::new(self.build::<C>()?);
        self.published
            .write()
            .map_err(|_| RepositoryError::LockPoisoned("write"))?
            .insert(key, Arc::clone(&repo) as Published);
        tracing::debug!(contract = %repo.contract_name(), "repository published");
        Ok(repo)
    }

    fn lookup<C: Contract + ?Sized>(&self) -> Result<Option<Arc<Repository<C>>>, RepositoryError> {
        let published = self
            .published
            .read()
            .map_err(|_| RepositoryError::LockPoisoned("read"))?;
        Ok(published
            .get(&TypeId::of::<C>())
            .and_then(|entry| Arc::clone(entry).downcast::<Repository<C>>().ok()))
    }

    fn build<C: Contract + ?Sized>(&self) -> Result<Repository<C>, RepositoryError> {
        let descriptor = C::describe();
        let contract = descriptor.name.clone();
        let collection = <C::Entity as Entity>::COLLECTION;
        tracing::debug!(
            contract = %contract,
            collection,
            methods = descriptor.methods.len(),
            "building repository"
        );

        let core = self.validate::<C>(descriptor).map_err(|source| {
            tracing::warn!(contract = %contract, error = %source, "repository registration failed");
            RepositoryError::Registration {
                contract: contract.clone(),
                source,
            }
        })?;

        self.apply_directives(&core.schema)?;
        Ok(Repository::from_core(core))
    }

    fn validate<C: Contract + ?Sized>(
        &self,
        descriptor: ContractDescriptor,
    ) -> Result<RepositoryCore, ValidationError> {
        let schema = <C::Entity as Entity>::schema().resolve()?;

        let mut seen = HashSet::new();
        let mut methods = HashMap::new();
        let mut transforms = HashMap::new();
        for method in &descriptor.methods {
            if !seen.insert(method.name.as_str()) {
                return Err(ValidationError::DuplicateMethod {
                    method: method.name.clone(),
                });
            }
            if let Some(target) = &method.transform {
                transforms.insert(method.name.clone(), target.clone());
            }
            if PredefinedOp::serves(
                method.effective_name(),
                method.asynchronous,
                method.transform.is_some(),
            ) {
                continue;
            }
            let spec = compile_method(method, &schema)?;
            methods.insert(method.name.clone(), spec);
        }

        Ok(RepositoryCore {
            contract: descriptor.name,
            schema,
            methods,
            transforms,
            store: Arc::clone(&self.store),
            executor: Arc::clone(&self.executor),
        })
    }

    /// Storage-side directives, emitted only once every method validated.
    fn apply_directives(&self, schema: &Schema) -> Result<(), RepositoryError> {
        let collection = schema.collection();
        if schema.drops_entities_on_start() {
            self.store.delete_collection(collection)?;
        }
        if schema.drops_indexes_on_start() {
            self.store.drop_indexes(collection)?;
        }
        if self.config.create_indexes {
            for index in schema.indexes() {
                tracing::debug!(collection, index = %index.name(), unique = index.unique, "creating index");
                self.store.create_index(collection, index)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for RepositoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryRegistry")
            .field("config", &self.config)
            .field("published", &self.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`RepositoryRegistry`].
pub struct RegistryBuilder {
    store: Arc<dyn DocumentStore>,
    config: RegistryConfig,
    executor: Option<Arc<dyn Executor>>,
}

impl RegistryBuilder {
    pub fn config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    /// Run async calls on `executor` instead of the configured default.
    pub fn executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn build(self) -> RepositoryRegistry {
        let executor = self.executor.unwrap_or_else(|| match self.config.worker_threads {
            Some(threads) => Arc::new(WorkerPool::new(threads)) as Arc<dyn Executor>,
            None => Arc::new(ThreadExecutor),
        });
        RepositoryRegistry {
            store: self.store,
            executor,
            config: self.config,
            published: RwLock::new(HashMap::new()),
            building: Mutex::new(HashMap::new()),
        }
    }
}

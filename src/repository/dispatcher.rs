//! Call routing: predefined operation, async predefined variant, then the
//! derived method table.

use crate::contract::{Argument, Outcome};
use crate::error::RepositoryError;
use crate::query::{compile_filter, Cardinality, CompiledMethodSpec, MethodOperator, TrailingParam};
use crate::store::FindOptions;

use super::predefined::PredefinedOp;
use super::repository::RepositoryCore;

impl RepositoryCore {
    pub(crate) fn dispatch(
        &self,
        method: &str,
        args: Vec<Argument>,
        asynchronous: bool,
    ) -> Result<Outcome, RepositoryError> {
        let transform = self.transforms.get(method);
        let effective = transform.map_or(method, String::as_str);

        if let Some(op) = PredefinedOp::lookup(effective) {
            tracing::trace!(contract = %self.contract, method, operation = op.name(), "dispatching predefined call");
            return op.run(self, method, args);
        }
        if asynchronous && transform.is_none() {
            if let Some(op) = PredefinedOp::lookup_async(method) {
                tracing::trace!(contract = %self.contract, method, operation = op.name(), "dispatching async predefined call");
                return op.run(self, method, args);
            }
        }
        match self.methods.get(method) {
            Some(spec) => self.run_derived(spec, args),
            None => Err(RepositoryError::Unsupported {
                method: method.to_string(),
                contract: self.contract.clone(),
            }),
        }
    }

    fn run_derived(
        &self,
        spec: &CompiledMethodSpec,
        args: Vec<Argument>,
    ) -> Result<Outcome, RepositoryError> {
        if args.len() != spec.param_count() {
            return Err(RepositoryError::ParameterCount {
                method: spec.method.clone(),
                expected: spec.param_count(),
                actual: args.len(),
            });
        }
        let filter = compile_filter(spec, &args)?;
        tracing::trace!(
            contract = %self.contract,
            method = %spec.method,
            operator = %spec.operator,
            ?filter,
            "dispatching derived query"
        );

        let store = self.store.as_ref();
        let collection = self.schema.collection();
        let trailing = args.into_iter().nth(spec.chain.arity());

        let outcome = match spec.operator {
            MethodOperator::Count => Outcome::Count(store.count(collection, &filter)?),
            MethodOperator::Delete => Outcome::Bool(store.delete_many(collection, &filter)?),
            MethodOperator::Exists => Outcome::Bool(store.count(collection, &filter)? > 0),
            MethodOperator::UpdateFields => {
                let updates = match trailing {
                    Some(Argument::Update(updates)) => self.resolve_updates(&spec.method, &updates)?,
                    other => return Err(self.bad_directive(spec, "UpdateBatch", other)),
                };
                Outcome::Bool(store.update_many(collection, &filter, &updates)?)
            }
            MethodOperator::Find | MethodOperator::Page => {
                let options = self.find_options(spec, trailing)?;
                match spec.cardinality {
                    Cardinality::First if options.skip.is_none() => {
                        Outcome::Entity(store.find_one(collection, &filter, &options.sort)?)
                    }
                    Cardinality::First => {
                        let options = FindOptions {
                            limit: Some(1),
                            ..options
                        };
                        Outcome::Entity(store.find(collection, &filter, &options)?.into_iter().next())
                    }
                    Cardinality::Many => {
                        Outcome::Entities(store.find(collection, &filter, &options)?)
                    }
                }
            }
        };
        Ok(outcome)
    }

    /// Sort and window from the trailing argument, or from the method's
    /// annotations when it takes none.
    fn find_options(
        &self,
        spec: &CompiledMethodSpec,
        trailing: Option<Argument>,
    ) -> Result<FindOptions, RepositoryError> {
        match (spec.trailing, trailing) {
            (None, _) => Ok(FindOptions {
                sort: spec.sort.clone(),
                skip: spec.skip,
                limit: spec.limit,
            }),
            (Some(TrailingParam::Sort), Some(Argument::Sort(sort))) => Ok(FindOptions {
                sort: self.resolve_sort(&spec.method, sort.fields())?,
                skip: sort.skip_value(),
                limit: sort.limit_value(),
            }),
            (Some(TrailingParam::Pagination), Some(Argument::Pagination(page))) => {
                Ok(FindOptions {
                    sort: self.resolve_sort(&spec.method, page.fields())?,
                    skip: Some(page.skip()),
                    limit: Some(page.limit()),
                })
            }
            (Some(TrailingParam::Sort), other) => Err(self.bad_directive(spec, "Sort", other)),
            (Some(_), other) => Err(self.bad_directive(spec, "Pagination", other)),
        }
    }

    fn bad_directive(
        &self,
        spec: &CompiledMethodSpec,
        expected: &str,
        actual: Option<Argument>,
    ) -> RepositoryError {
        RepositoryError::InvalidArgument {
            method: spec.method.clone(),
            index: spec.chain.arity(),
            expected: expected.to_string(),
            actual: actual.as_ref().map_or("nothing", Argument::kind).to_string(),
        }
    }
}

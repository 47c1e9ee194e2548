//! Integration tests for repository registration.

mod contracts;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use contracts::{
    Account, AccountRepository, AmbiguousRepository, BadParameterRepository,
    BadReturnRepository, BooleanFindRepository, DuplicateAccounts, FlakyAccounts,
    LedgerRepository, ManualAccounts, MixedSortRepository, Note, NoteRepository,
    OrderRepository, Profile, ProfileRepository,
};
use docrepo::{
    Argument, Document, DocumentStore, Entity, InMemoryDocumentStore, IndexSpec,
    MethodOperator, ParamType, ParseError, RegistryConfig, RepositoryError, RepositoryRegistry,
    ReturnType, UpdateBatch, ValidationError, ValueType,
};

fn registry() -> (InMemoryDocumentStore, RepositoryRegistry) {
    let store = InMemoryDocumentStore::new();
    let registry = RepositoryRegistry::new(Arc::new(store.clone()));
    (store, registry)
}

fn registration_error(err: RepositoryError) -> (String, ValidationError) {
    match err {
        RepositoryError::Registration { contract, source } => (contract, source),
        other => panic!("expected a registration error, got {:?}", other),
    }
}

#[test]
fn ambiguous_combinator_aborts_the_whole_contract() {
    let (store, registry) = registry();

    let err = registry.obtain::<dyn AmbiguousRepository>().unwrap_err();
    let message = err.to_string();
    let (contract, source) = registration_error(err);
    assert_eq!(contract, "AmbiguousRepository");
    assert_eq!(
        source,
        ValidationError::Parse(ParseError::AmbiguousCombinator {
            method: "findManyByOwnerAndEmailOrBalance".into()
        })
    );
    assert!(message.contains("AmbiguousRepository"));
    assert!(message.contains("findManyByOwnerAndEmailOrBalance"));

    // Nothing published, no directives emitted
    assert!(!registry.is_registered::<dyn AmbiguousRepository>());
    assert_eq!(store.index_creations(), 0);
}

#[test]
fn wrong_return_type_is_rejected() {
    let (_, registry) = registry();

    let (_, source) = registration_error(registry.obtain::<dyn BadReturnRepository>().unwrap_err());
    match source {
        ValidationError::ReturnType {
            method,
            operator,
            actual,
            ..
        } => {
            assert_eq!(method, "countByOwner");
            assert_eq!(operator, MethodOperator::Count);
            assert_eq!(actual, ReturnType::Bool);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn combinator_inside_a_field_name_still_counts() {
    let (store, registry) = registry();

    let (contract, source) =
        registration_error(registry.obtain::<dyn OrderRepository>().unwrap_err());
    assert_eq!(contract, "OrderRepository");
    assert_eq!(
        source,
        ValidationError::Parse(ParseError::AmbiguousCombinator {
            method: "findManyByCustomerIdAndOrderStatus".into()
        })
    );
    assert_eq!(store.index_creations(), 0);
}

#[test]
fn find_returning_bool_is_rejected() {
    let (_, registry) = registry();

    let (_, source) =
        registration_error(registry.obtain::<dyn BooleanFindRepository>().unwrap_err());
    assert!(matches!(
        source,
        ValidationError::ReturnType {
            ref method,
            operator: MethodOperator::Find,
            actual: ReturnType::Bool,
            ..
        } if method == "findByOwner"
    ));
}

#[test]
fn wrong_parameter_type_is_rejected() {
    let (_, registry) = registry();

    let (_, source) =
        registration_error(registry.obtain::<dyn BadParameterRepository>().unwrap_err());
    assert_eq!(
        source,
        ValidationError::ParameterType {
            method: "findManyByBalanceGreaterThan".into(),
            field: "balance".into(),
            index: 0,
            expected: ValueType::Float,
            actual: ParamType::Value(ValueType::Int),
        }
    );
}

#[test]
fn sort_parameter_and_annotations_conflict() {
    let (_, registry) = registry();

    let (_, source) = registration_error(registry.obtain::<dyn MixedSortRepository>().unwrap_err());
    assert!(matches!(source, ValidationError::MixedSort { .. }));
}

#[test]
fn schema_violations_fail_registration() {
    let (_, registry) = registry();

    let (contract, source) =
        registration_error(registry.obtain::<dyn LedgerRepository>().unwrap_err());
    assert_eq!(contract, "LedgerRepository");
    assert!(matches!(source, ValidationError::ImmutableField { field, .. } if field == "id"));
}

#[test]
fn duplicate_methods_fail_registration() {
    let (_, registry) = registry();

    let (_, source) = registration_error(registry.obtain::<DuplicateAccounts>().unwrap_err());
    assert_eq!(
        source,
        ValidationError::DuplicateMethod {
            method: "countByOwner".into()
        }
    );
}

#[test]
fn failed_registration_is_not_cached() {
    let (_, registry) = registry();

    assert!(registry.obtain::<dyn BadReturnRepository>().is_err());
    assert!(registry.obtain::<dyn BadReturnRepository>().is_err());
    assert!(registry.is_empty());
}

#[test]
fn panicking_build_does_not_block_later_registration() {
    let (_, registry) = registry();

    let first = panic::catch_unwind(AssertUnwindSafe(|| registry.obtain::<FlakyAccounts>()));
    assert!(first.is_err());
    assert!(!registry.is_registered::<FlakyAccounts>());

    let repo = registry.obtain::<FlakyAccounts>().unwrap();
    assert_eq!(repo.contract_name(), "FlakyAccounts");
}

#[test]
fn id_operations_need_an_id() {
    let (store, registry) = registry();
    let repo = registry.obtain::<dyn NoteRepository>().unwrap();

    assert!(repo.save(&Note::draft("kept")).unwrap());
    assert_eq!(store.len("notes").unwrap(), 1);

    let stranger = Note::draft("never saved");
    let errors = [
        repo.delete(&stranger).unwrap_err(),
        repo.exists(&stranger).unwrap_err(),
        repo.unique_id(&stranger).unwrap_err(),
        repo.delete_by_id(None::<i64>).unwrap_err(),
        repo.exists_by_id(None::<i64>).unwrap_err(),
    ];
    for err in errors {
        assert!(matches!(err, RepositoryError::InvalidArgument { .. }), "{:?}", err);
    }

    // The id-less document is still there
    assert_eq!(store.len("notes").unwrap(), 1);
    assert_eq!(repo.count_by_body("kept".into()).unwrap(), 1);
}

#[test]
fn updates_cannot_break_unique_indexes() {
    let (_, registry) = registry();
    let repo = registry.obtain::<dyn AccountRepository>().unwrap();
    let ann = Account::new(1, "ann@example.com", "ann", 10.0);
    let bob = Account::new(2, "bob@example.com", "bob", 20.0);
    assert!(repo.save_all(&[ann.clone(), bob.clone()]).unwrap());

    let steal = UpdateBatch::new().set("email", "ann@example.com");
    let err = repo.update_fields_by_owner("bob".into(), steal.clone()).unwrap_err();
    assert!(matches!(err, RepositoryError::Store(_)));
    let err = repo.update_all_fields(steal).unwrap_err();
    assert!(matches!(err, RepositoryError::Store(_)));
    assert_eq!(repo.find_all().unwrap(), vec![ann, bob]);
}

#[test]
fn serde_renames_define_the_document_keys() {
    let schema = Profile::schema().resolve().unwrap();
    let names: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["id", "displayName", "mail"]);

    let (store, registry) = registry();
    let repo = registry.obtain::<dyn ProfileRepository>().unwrap();
    let profile = Profile {
        id: 1,
        display_name: "Ada".into(),
        email_address: "ada@example.com".into(),
        session_token: String::new(),
    };
    assert!(repo.save(&profile).unwrap());

    assert_eq!(
        repo.find_first_by_display_name("Ada".into()).unwrap(),
        Some(profile)
    );
    assert_eq!(repo.count_by_mail("ada@example.com".into()).unwrap(), 1);
    let indexes = store.indexes("profiles").unwrap();
    assert_eq!(indexes[1].keys, vec![("mail".to_string(), true)]);
}

#[test]
fn start_directives_run_before_index_creation() {
    let (store, registry) = registry();
    let stale = Document::from_entity(&Account::new(1, "old@example.com", "old", 1.0)).unwrap();
    store.insert("accounts", stale).unwrap();
    let stale_index = IndexSpec {
        keys: vec![("owner".into(), true)],
        unique: false,
    };
    store.create_index("accounts", &stale_index).unwrap();

    let repo = registry.obtain::<dyn AccountRepository>().unwrap();
    assert!(repo.find_all().unwrap().is_empty());

    let indexes = store.indexes("accounts").unwrap();
    assert_eq!(indexes.len(), 2);
    assert_eq!(indexes[0].keys, vec![("id".to_string(), true)]);
    assert_eq!(indexes[1].keys, vec![("email".to_string(), true)]);
    assert!(indexes[1].unique);

    assert!(repo.save(&Account::new(2, "a@example.com", "ann", 10.0)).unwrap());
    let err = repo
        .save(&Account::new(3, "a@example.com", "bob", 5.0))
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Store(_)));
}

#[test]
fn index_creation_can_be_disabled_by_config() {
    let store = InMemoryDocumentStore::new();
    let config = RegistryConfig::from_json(r#"{ "create_indexes": false }"#).unwrap();
    let registry = RepositoryRegistry::builder(Arc::new(store.clone()))
        .config(config)
        .build();

    let repo = registry.obtain::<dyn AccountRepository>().unwrap();
    assert_eq!(store.index_creations(), 0);
    assert!(repo.save(&Account::new(1, "a@example.com", "ann", 10.0)).unwrap());
    assert_eq!(repo.count_by_balance_less_eq(10.0).unwrap(), 1);
}

#[test]
fn worker_pool_serves_async_calls() {
    let store = InMemoryDocumentStore::new();
    let config = RegistryConfig {
        worker_threads: Some(2),
        ..RegistryConfig::default()
    };
    let registry = RepositoryRegistry::builder(Arc::new(store))
        .config(config)
        .build();
    let repo = registry.obtain::<dyn AccountRepository>().unwrap();

    let accounts = vec![
        Account::new(1, "a@example.com", "ann", 10.0),
        Account::new(2, "b@example.com", "ann", 20.0),
        Account::new(3, "c@example.com", "cat", 30.0),
    ];
    assert!(repo.async_save_all(&accounts).wait().unwrap());
    assert_eq!(repo.async_find_all().wait().unwrap(), accounts);
    assert!(repo.async_exists_by_id(2).wait().unwrap());
    assert_eq!(repo.find_many_by_owner("ann".into()).unwrap().len(), 2);
}

#[test]
fn hand_built_contracts_dispatch_dynamically() {
    let (_, registry) = registry();

    let repo = registry.obtain::<ManualAccounts>().unwrap();
    assert!(repo.save(&Account::new(1, "a@example.com", "ann", 10.0)).unwrap());
    let count: u64 = repo
        .call("countByOwner", vec![Argument::Value("ann".into())])
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(repo.contract_name(), "ManualAccounts");
    assert!(repo.method("countByOwner").is_some());
}

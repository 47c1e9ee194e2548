//! Integration tests for derived customer repositories.

mod customer;

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use customer::{customers, first_names, Customer, CustomerRepository};
use docrepo::{
    Argument, InMemoryDocumentStore, Pagination, Pattern, Repository, RepositoryError,
    RepositoryRegistry, Sort, UpdateBatch, Value,
};

type Customers = Repository<dyn CustomerRepository>;

fn seeded() -> (InMemoryDocumentStore, Arc<Customers>, Vec<Customer>) {
    let store = InMemoryDocumentStore::new();
    let registry = RepositoryRegistry::new(Arc::new(store.clone()));
    let repo = registry.obtain::<dyn CustomerRepository>().unwrap();
    let all = customers();
    assert!(repo.save_all(&all).unwrap());
    (store, repo, all)
}

#[test]
fn between_and_equals_finds_open_interval_matches() {
    let (_, repo, _) = seeded();

    let found = repo
        .find_many_by_balance_between_and_customer_id(10.0, 100.0, 7)
        .unwrap();
    assert_eq!(first_names(&found), vec!["Di", "Ed"]);

    // Bounds are exclusive
    let found = repo
        .find_many_by_balance_between_and_customer_id(20.0, 99.0, 7)
        .unwrap();
    assert!(found.is_empty());
}

#[test]
fn contains_is_case_insensitive() {
    let (_, repo, _) = seeded();

    let found = repo.find_many_by_last_name_contains("smith".into()).unwrap();
    assert_eq!(first_names(&found), vec!["Ada", "Bob", "Di"]);
}

#[test]
fn ignore_case_matches_whole_value() {
    let (_, repo, _) = seeded();

    let found = repo.find_first_by_last_name_ign("SMITH".into()).unwrap().unwrap();
    assert_eq!(found.last_name, "Smith");
    assert!(repo.find_first_by_last_name_ign("smi".into()).unwrap().is_none());
}

#[test]
fn find_first_returns_option() {
    let (_, repo, all) = seeded();

    let cy = repo.find_first_by_first_name("Cy".into()).unwrap();
    assert_eq!(cy.as_ref(), Some(&all[2]));
    assert!(repo.find_first_by_first_name("Zed".into()).unwrap().is_none());
}

#[test]
fn regex_membership_and_or_chains() {
    let (_, repo, _) = seeded();

    let pattern = Pattern::new("^[AB]").unwrap();
    let found = repo.find_many_by_first_name_regex(pattern).unwrap();
    assert_eq!(first_names(&found), vec!["Ada", "Bob"]);

    let found = repo.find_many_by_customer_id_in(vec![1, 3]).unwrap();
    assert_eq!(first_names(&found), vec!["Ada", "Cy"]);

    let found = repo.find_many_by_customer_id_not_in(vec![7]).unwrap();
    assert_eq!(first_names(&found), vec!["Ada", "Bob", "Cy"]);

    let found = repo
        .find_many_by_balance_greater_eq_or_logged_in(100.0, true)
        .unwrap();
    assert_eq!(first_names(&found), vec!["Ada", "Bob", "Cy", "Ed"]);
}

#[test]
fn sort_parameter_orders_and_windows_results() {
    let (_, repo, _) = seeded();

    let found = repo
        .find_many_by_logged_in(true, Sort::new().desc("balance"))
        .unwrap();
    assert_eq!(first_names(&found), vec!["Ed", "Cy", "Ada"]);

    let found = repo
        .find_many_by_logged_in(true, Sort::new().desc("Balance").skip(1).limit(1))
        .unwrap();
    assert_eq!(first_names(&found), vec!["Cy"]);

    let err = repo
        .find_many_by_logged_in(true, Sort::new().asc("nickname"))
        .unwrap_err();
    assert!(matches!(err, RepositoryError::UnknownField { field, .. } if field == "nickname"));
}

#[test]
fn sort_annotations_apply_without_a_parameter() {
    let (_, repo, _) = seeded();

    let found = repo.find_many_by_balance_greater_than(30.0).unwrap();
    assert_eq!(first_names(&found), vec!["Bob", "Ed"]);
}

#[test]
fn pages_are_one_based() {
    let (_, repo, _) = seeded();

    let page = Pagination::of(2).order("balance", true);
    let first = repo.page_by_balance_greater_than(0.0, page.clone()).unwrap();
    let second = repo.page_by_balance_greater_than(0.0, page.clone().page(2)).unwrap();
    let third = repo.page_by_balance_greater_than(0.0, page.page(3)).unwrap();
    assert_eq!(first_names(&first), vec!["Di", "Ada"]);
    assert_eq!(first_names(&second), vec!["Cy", "Ed"]);
    assert_eq!(first_names(&third), vec!["Bob"]);
}

#[test]
fn count_and_exists() {
    let (_, repo, _) = seeded();

    assert_eq!(repo.count_by_last_name("Smith".into()).unwrap(), 2);
    assert_eq!(repo.count_by_last_name("Nobody".into()).unwrap(), 0);
    assert!(repo.exists_by_customer_id(3).unwrap());
    assert!(!repo.exists_by_customer_id(4).unwrap());
    assert!(repo.exists_by_attributes_has_key("tier".into()).unwrap());
    assert!(!repo.exists_by_attributes_has_key("missing".into()).unwrap());
}

#[test]
fn negated_delete_removes_everyone_else() {
    let (_, repo, all) = seeded();

    assert!(repo.delete_by_first_name_not("Ada".into()).unwrap());
    assert_eq!(repo.find_all().unwrap(), vec![all[0].clone()]);
}

#[test]
fn update_fields_touches_matching_entities_only() {
    let (_, repo, _) = seeded();

    let updates = UpdateBatch::new().set("balance", 0.0).set("LoggedIn", true);
    assert!(repo.update_fields_by_customer_id(7, updates).unwrap());

    let found = repo
        .find_many_by_balance_between_and_customer_id(-1.0, 1.0, 7)
        .unwrap();
    assert_eq!(first_names(&found), vec!["Di", "Ed"]);
    assert!(found.iter().all(|c| c.logged_in));
    assert_eq!(repo.count_by_last_name("Jones".into()).unwrap(), 1);

    let err = repo
        .update_fields_by_customer_id(7, UpdateBatch::new().set("unique_id", "x"))
        .unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidArgument { .. }));

    let err = repo
        .update_fields_by_customer_id(7, UpdateBatch::new().unset("nickname"))
        .unwrap_err();
    assert!(matches!(err, RepositoryError::UnknownField { .. }));
}

#[test]
fn async_methods_complete_through_handles() {
    let (_, repo, all) = seeded();

    let handle = repo.customers_above(2);
    assert_eq!(handle.wait().unwrap(), 3);

    let everyone = CustomerRepository::async_find_all(&*repo).wait().unwrap();
    assert_eq!(everyone.len(), all.len());

    let ada = repo.async_find_by_id(all[0].unique_id);
    let result = ada.wait_timeout(Duration::from_secs(5)).unwrap().unwrap();
    assert_eq!(result, Some(all[0].clone()));
}

#[test]
fn transform_can_target_a_predefined_operation() {
    let (_, repo, all) = seeded();

    assert_eq!(repo.lookup(all[3].unique_id).unwrap(), Some(all[3].clone()));
}

#[test]
fn predefined_operations() {
    let (_, repo, all) = seeded();
    let mut ada = all[0].clone();

    assert_eq!(repo.collection_name().unwrap(), "customers");
    assert_eq!(repo.unique_id(&ada).unwrap(), Value::from(ada.unique_id));

    ada.balance = 500.0;
    assert!(repo.save(&ada).unwrap());
    assert_eq!(repo.find_all().unwrap().len(), all.len());
    assert_eq!(repo.find_by_id(ada.unique_id).unwrap(), Some(ada.clone()));

    assert!(repo.exists(&ada).unwrap());
    assert!(repo.delete(&ada).unwrap());
    assert!(!repo.exists(&ada).unwrap());
    assert!(!repo.exists_by_id(ada.unique_id).unwrap());

    assert!(repo.delete_by_id(all[1].unique_id).unwrap());
    assert_eq!(repo.find_all().unwrap().len(), all.len() - 2);

    assert!(repo.update_all_fields(UpdateBatch::new().set("logged_in", false)).unwrap());
    assert!(repo
        .find_many_by_logged_in(true, Sort::new())
        .unwrap()
        .is_empty());

    assert!(repo.delete_all().unwrap());
    assert!(repo.find_all().unwrap().is_empty());
}

#[test]
fn dynamic_invocation_reports_unknown_methods_and_bad_arity() {
    let (_, repo, _) = seeded();

    let err = repo.invoke("findManyByNickname", Vec::new()).unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Unsupported { ref method, ref contract }
            if method == "findManyByNickname" && contract == "CustomerRepository"
    ));

    let err = repo
        .invoke("countByLastName", vec![Argument::Value("a".into()), Argument::Value("b".into())])
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::ParameterCount { expected: 1, actual: 2, .. }
    ));

    let err = repo.invoke("findById", Vec::new()).unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::ParameterCount { expected: 1, actual: 0, .. }
    ));

    // asyncXxx names only resolve on asynchronous calls
    let err = repo.invoke("asyncFindAll", Vec::new()).unwrap_err();
    assert!(matches!(err, RepositoryError::Unsupported { .. }));
}

#[test]
fn obtain_is_idempotent() {
    let store = InMemoryDocumentStore::new();
    let registry = RepositoryRegistry::new(Arc::new(store.clone()));

    let first = registry.obtain::<dyn CustomerRepository>().unwrap();
    let second = registry.obtain::<dyn CustomerRepository>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.len(), 1);

    // Unique id index plus the compound index, each created once
    assert_eq!(store.index_creations(), 2);
    let indexes = store.indexes("customers").unwrap();
    assert_eq!(indexes[0].keys, vec![("unique_id".to_string(), true)]);
    assert!(indexes[0].unique);
    assert_eq!(
        indexes[1].keys,
        vec![("last_name".to_string(), true), ("balance".to_string(), false)]
    );
}

#[test]
fn concurrent_obtain_builds_once() {
    let store = InMemoryDocumentStore::new();
    let registry = Arc::new(RepositoryRegistry::new(Arc::new(store.clone())));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.obtain::<dyn CustomerRepository>().unwrap()
            })
        })
        .collect();

    let repos: Vec<Arc<Customers>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(repos.iter().all(|r| Arc::ptr_eq(r, &repos[0])));
    assert_eq!(store.index_creations(), 2);
}

#[test]
fn unique_id_index_rejects_duplicate_inserts() {
    let (store, _, all) = seeded();
    let duplicate = docrepo::Document::from_entity(&all[0]).unwrap();

    let err = docrepo::DocumentStore::insert(&store, "customers", duplicate).unwrap_err();
    assert!(matches!(err, docrepo::StoreError::DuplicateKey { .. }));
}

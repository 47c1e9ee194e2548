//! Customer entity and its repository contract.

use std::collections::BTreeMap;

use docrepo::{repository, AsyncHandle, Entity, Pagination, Pattern, RepositoryError, Sort, UpdateBatch};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Entity)]
#[entity(collection = "customers", index = "last_name, -balance")]
pub struct Customer {
    #[entity(id)]
    pub unique_id: Uuid,
    pub customer_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub balance: f64,
    pub logged_in: bool,
    pub attributes: BTreeMap<String, String>,
}

impl Customer {
    pub fn new(customer_id: i32, first_name: &str, last_name: &str, balance: f64) -> Self {
        Self {
            unique_id: Uuid::new_v4(),
            customer_id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            balance,
            logged_in: false,
            attributes: BTreeMap::new(),
        }
    }

    pub fn logged_in(mut self) -> Self {
        self.logged_in = true;
        self
    }

    pub fn attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }
}

/// Ada, Bob, Cy, Di and Ed.
pub fn customers() -> Vec<Customer> {
    vec![
        Customer::new(1, "Ada", "Smith", 50.0)
            .logged_in()
            .attribute("tier", "gold"),
        Customer::new(2, "Bob", "Smithson", 150.0),
        Customer::new(3, "Cy", "Jones", 75.5)
            .logged_in()
            .attribute("referrer", "ada"),
        Customer::new(7, "Di", "Smith", 20.0),
        Customer::new(7, "Ed", "Brown", 99.0).logged_in(),
    ]
}

pub fn first_names(found: &[Customer]) -> Vec<&str> {
    found.iter().map(|c| c.first_name.as_str()).collect()
}

#[repository(entity = Customer)]
pub trait CustomerRepository {
    fn find_first_by_first_name(&self, first_name: String)
        -> Result<Option<Customer>, RepositoryError>;

    fn find_many_by_balance_between_and_customer_id(
        &self,
        low: f64,
        high: f64,
        customer_id: i32,
    ) -> Result<Vec<Customer>, RepositoryError>;

    fn find_many_by_last_name_contains(&self, fragment: String)
        -> Result<Vec<Customer>, RepositoryError>;

    fn find_first_by_last_name_ign(&self, last_name: String)
        -> Result<Option<Customer>, RepositoryError>;

    fn find_many_by_first_name_regex(&self, pattern: Pattern)
        -> Result<Vec<Customer>, RepositoryError>;

    fn find_many_by_customer_id_in(&self, ids: Vec<i32>) -> Result<Vec<Customer>, RepositoryError>;

    fn find_many_by_customer_id_not_in(&self, ids: Vec<i32>)
        -> Result<Vec<Customer>, RepositoryError>;

    fn find_many_by_balance_greater_eq_or_logged_in(
        &self,
        min: f64,
        logged_in: bool,
    ) -> Result<Vec<Customer>, RepositoryError>;

    fn find_many_by_logged_in(&self, logged_in: bool, sort: Sort)
        -> Result<Vec<Customer>, RepositoryError>;

    #[sort_by(field = "balance", descending)]
    #[limit(2)]
    fn find_many_by_balance_greater_than(&self, min: f64) -> Result<Vec<Customer>, RepositoryError>;

    fn page_by_balance_greater_than(
        &self,
        min: f64,
        page: Pagination,
    ) -> Result<Vec<Customer>, RepositoryError>;

    fn count_by_last_name(&self, last_name: String) -> Result<u64, RepositoryError>;

    fn exists_by_attributes_has_key(&self, key: String) -> Result<bool, RepositoryError>;

    fn exists_by_customer_id(&self, customer_id: i32) -> Result<bool, RepositoryError>;

    fn delete_by_first_name_not(&self, first_name: String) -> Result<bool, RepositoryError>;

    fn update_fields_by_customer_id(
        &self,
        customer_id: i32,
        updates: UpdateBatch,
    ) -> Result<bool, RepositoryError>;

    #[transform("countByCustomerIdGreaterThan")]
    fn customers_above(&self, customer_id: i32) -> AsyncHandle<u64>;

    #[transform("findById")]
    fn lookup(&self, unique_id: Uuid) -> Result<Option<Customer>, RepositoryError>;

    fn async_find_all(&self) -> AsyncHandle<Vec<Customer>>;
}

//! Entities and contracts exercising registration.

use std::sync::atomic::{AtomicBool, Ordering};

use docrepo::{
    repository, Contract, ContractDescriptor, Entity, MethodDescriptor, ParamType,
    RepositoryError, ReturnType, Sort, UpdateBatch, ValueType,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Entity)]
#[entity(
    collection = "accounts",
    unique_index = "email",
    drop_entities_on_start,
    drop_indexes_on_start
)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub owner: String,
    pub balance: f64,
}

impl Account {
    pub fn new(id: i64, email: &str, owner: &str, balance: f64) -> Self {
        Self {
            id,
            email: email.to_string(),
            owner: owner.to_string(),
            balance,
        }
    }
}

#[repository(entity = Account)]
pub trait AccountRepository {
    fn find_many_by_owner(&self, owner: String) -> Result<Vec<Account>, RepositoryError>;

    fn count_by_balance_less_eq(&self, max: f64) -> Result<usize, RepositoryError>;

    fn update_fields_by_owner(
        &self,
        owner: String,
        updates: UpdateBatch,
    ) -> Result<bool, RepositoryError>;
}

#[repository(entity = Account)]
pub trait AmbiguousRepository {
    fn find_many_by_owner(&self, owner: String) -> Result<Vec<Account>, RepositoryError>;

    fn find_many_by_owner_and_email_or_balance(
        &self,
        owner: String,
        email: String,
        balance: f64,
    ) -> Result<Vec<Account>, RepositoryError>;
}

#[repository(entity = Account)]
pub trait BadReturnRepository {
    fn count_by_owner(&self, owner: String) -> Result<bool, RepositoryError>;
}

#[repository(entity = Account)]
pub trait BooleanFindRepository {
    fn find_by_owner(&self, owner: String) -> Result<bool, RepositoryError>;
}

#[repository(entity = Account)]
pub trait BadParameterRepository {
    fn find_many_by_balance_greater_than(&self, min: i32)
        -> Result<Vec<Account>, RepositoryError>;
}

#[repository(entity = Account)]
pub trait MixedSortRepository {
    #[sort_by(field = "owner")]
    fn find_many_by_owner_exists(&self, sort: Sort) -> Result<Vec<Account>, RepositoryError>;
}

#[derive(Clone, Debug, Serialize, Deserialize, Entity)]
#[entity(collection = "ledgers")]
pub struct Ledger {
    #[entity(immutable)]
    pub id: i64,
    pub total: i64,
}

#[repository(entity = Ledger)]
pub trait LedgerRepository {
    fn count_by_total(&self, total: i64) -> Result<u64, RepositoryError>;
}

#[derive(Clone, Debug, Serialize, Deserialize, Entity)]
#[entity(collection = "orders")]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub order_status: String,
}

#[repository(entity = Order)]
pub trait OrderRepository {
    fn count_by_order_status(&self, order_status: String) -> Result<u64, RepositoryError>;

    fn find_many_by_customer_id_and_order_status(
        &self,
        customer_id: i64,
        order_status: String,
    ) -> Result<Vec<Order>, RepositoryError>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Entity)]
#[entity(collection = "notes")]
pub struct Note {
    pub id: Option<i64>,
    pub body: String,
}

impl Note {
    pub fn draft(body: &str) -> Self {
        Self {
            id: None,
            body: body.to_string(),
        }
    }
}

#[repository(entity = Note)]
pub trait NoteRepository {
    fn count_by_body(&self, body: String) -> Result<u64, RepositoryError>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Entity)]
#[serde(rename_all = "camelCase")]
#[entity(collection = "profiles", unique_index = "mail")]
pub struct Profile {
    pub id: i64,
    pub display_name: String,
    #[serde(rename = "mail")]
    pub email_address: String,
    #[serde(skip)]
    pub session_token: String,
}

#[repository(entity = Profile)]
pub trait ProfileRepository {
    fn find_first_by_display_name(&self, display_name: String)
        -> Result<Option<Profile>, RepositoryError>;

    fn count_by_mail(&self, mail: String) -> Result<u64, RepositoryError>;
}

fn count_by_owner() -> MethodDescriptor {
    MethodDescriptor::new("countByOwner", ReturnType::Integer)
        .param("owner", ParamType::Value(ValueType::Text))
}

/// A contract described by hand, without a trait.
pub struct ManualAccounts;

impl Contract for ManualAccounts {
    type Entity = Account;

    fn describe() -> ContractDescriptor {
        ContractDescriptor::new("ManualAccounts").method(count_by_owner())
    }
}

/// Declares the same method twice, which a trait cannot.
pub struct DuplicateAccounts;

impl Contract for DuplicateAccounts {
    type Entity = Account;

    fn describe() -> ContractDescriptor {
        ContractDescriptor::new("DuplicateAccounts")
            .method(count_by_owner())
            .method(count_by_owner())
    }
}

/// Set while [`FlakyAccounts::describe`] should panic once.
pub static FLAKY_DESCRIBE_PANICS: AtomicBool = AtomicBool::new(true);

/// Panics the first time it is described.
pub struct FlakyAccounts;

impl Contract for FlakyAccounts {
    type Entity = Account;

    fn describe() -> ContractDescriptor {
        if FLAKY_DESCRIBE_PANICS.swap(false, Ordering::SeqCst) {
            panic!("descriptor not ready");
        }
        ContractDescriptor::new("FlakyAccounts").method(count_by_owner())
    }
}

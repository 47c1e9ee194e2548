mod entity;
mod repository;

use proc_macro::TokenStream;

// ============================================================================
// #[derive(Entity)]
// ============================================================================

/// Derive macro implementing `docrepo::Entity`.
///
/// # Usage
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize, Entity)]
/// #[entity(collection = "customers", index = "last_name, -balance")]
/// #[entity(unique_index = "customer_id")]
/// struct Customer {
///     #[entity(id)]
///     unique_id: Uuid,
///     customer_id: i32,
///     last_name: String,
///     balance: f64,
///     #[entity(object)]
///     address: Address,
/// }
/// ```
///
/// Struct-level keys:
/// - `collection = "..."`: defaults to the snake_case type name plus `s`
/// - `index = "a, -b"` / `unique_index = "..."`: compound indexes, `-` for
///   descending; may repeat
/// - `drop_entities_on_start`, `drop_indexes_on_start`
///
/// Field-level keys: `id` (a field named `id` is used when none is marked),
/// `non_index`, `immutable`, `object` (nested struct, not a scalar).
///
/// Schema field names are the serialized keys: `#[serde(rename = "...")]`
/// and `#[serde(rename_all = "...")]` apply, `#[serde(skip)]` fields are
/// left out and `#[serde(flatten)]` is rejected.
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    entity::derive_entity(input)
}

// ============================================================================
// #[repository] attribute macro
// ============================================================================

/// Attribute macro turning a trait into a repository contract.
///
/// # Usage
///
/// ```ignore
/// #[repository(entity = Customer)]
/// pub trait CustomerRepository {
///     fn find_many_by_balance_between_and_customer_id(
///         &self,
///         low: f64,
///         high: f64,
///         customer_id: i32,
///     ) -> Result<Vec<Customer>, RepositoryError>;
///
///     #[sort_by(field = "balance", descending)]
///     #[limit(3)]
///     fn find_many_by_last_name(&self, last_name: String)
///         -> Result<Vec<Customer>, RepositoryError>;
///
///     #[transform("countByCustomerId")]
///     fn customers_with_id(&self, customer_id: i32) -> AsyncHandle<u64>;
/// }
/// ```
///
/// Method names are converted to lowerCamelCase and parsed by the
/// naming grammar at registration. `Result<T, RepositoryError>` marks a
/// synchronous method, `AsyncHandle<T>` an asynchronous one.
///
/// Method attributes (removed from the emitted trait):
/// - `#[transform("name")]`: parse `name` instead of the method's own name
/// - `#[sort_by(field = "...", descending)]`: ascending unless `descending`; may repeat
/// - `#[limit(n)]`, `#[skip(n)]`
///
/// Generates `impl docrepo::Contract for dyn Trait` and
/// `impl Trait for docrepo::Repository<dyn Trait>`.
#[proc_macro_attribute]
pub fn repository(attr: TokenStream, item: TokenStream) -> TokenStream {
    repository::expand(attr, item)
}

//! Sorting, pagination and bulk-update arguments.

use crate::value::Value;

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub field: String,
    pub ascending: bool,
}

impl SortField {
    pub fn new(field: impl Into<String>, ascending: bool) -> Self {
        Self {
            field: field.into(),
            ascending,
        }
    }
}

/// Sort/limit/skip passed as the trailing argument of a find method.
///
/// ```ignore
/// let sort = Sort::new().desc("balance").asc("customer_id").limit(10);
/// repo.find_many_by_customer_id_not(7, sort)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sort {
    fields: Vec<SortField>,
    limit: Option<usize>,
    skip: Option<usize>,
}

impl Sort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order(mut self, field: impl Into<String>, ascending: bool) -> Self {
        self.fields.push(SortField::new(field, ascending));
        self
    }

    pub fn asc(self, field: impl Into<String>) -> Self {
        self.order(field, true)
    }

    pub fn desc(self, field: impl Into<String>) -> Self {
        self.order(field, false)
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn fields(&self) -> &[SortField] {
        &self.fields
    }

    pub fn limit_value(&self) -> Option<usize> {
        self.limit
    }

    pub fn skip_value(&self) -> Option<usize> {
        self.skip
    }
}

/// Page selection passed as the trailing argument of a `pageBy` method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    entities_per_page: usize,
    page: usize,
    fields: Vec<SortField>,
}

impl Pagination {
    /// Pages of `entities_per_page` entities, starting at page 1.
    pub fn of(entities_per_page: usize) -> Self {
        Self {
            entities_per_page,
            page: 1,
            fields: Vec::new(),
        }
    }

    /// Select a 1-based page. Page 0 is treated as page 1.
    pub fn page(mut self, page: usize) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn order(mut self, field: impl Into<String>, ascending: bool) -> Self {
        self.fields.push(SortField::new(field, ascending));
        self
    }

    pub fn fields(&self) -> &[SortField] {
        &self.fields
    }

    pub fn skip(&self) -> usize {
        (self.page - 1).saturating_mul(self.entities_per_page)
    }

    pub fn limit(&self) -> usize {
        self.entities_per_page
    }
}

/// A single field change inside an [`UpdateBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Set { field: String, value: Value },
    Unset { field: String },
    Rename { field: String, to: String },
}

impl FieldUpdate {
    pub fn field(&self) -> &str {
        match self {
            FieldUpdate::Set { field, .. }
            | FieldUpdate::Unset { field }
            | FieldUpdate::Rename { field, .. } => field,
        }
    }
}

/// Field changes applied to every document matched by an `updateFieldsBy`
/// method (or to the whole collection by `updateAllFields`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateBatch {
    updates: Vec<FieldUpdate>,
}

impl UpdateBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.updates.push(FieldUpdate::Set {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn unset(mut self, field: impl Into<String>) -> Self {
        self.updates.push(FieldUpdate::Unset {
            field: field.into(),
        });
        self
    }

    pub fn rename(mut self, field: impl Into<String>, to: impl Into<String>) -> Self {
        self.updates.push(FieldUpdate::Rename {
            field: field.into(),
            to: to.into(),
        });
        self
    }

    pub fn updates(&self) -> &[FieldUpdate] {
        &self.updates
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

impl From<Vec<FieldUpdate>> for UpdateBatch {
    fn from(updates: Vec<FieldUpdate>) -> Self {
        Self { updates }
    }
}

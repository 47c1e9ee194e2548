//! Boolean filter expressions handed to the store.

use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::value::{Document, Value};

/// A compiled regular expression usable as a filter argument.
#[derive(Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Pattern)
    }

    pub fn case_insensitive(source: &str) -> Result<Self, regex::Error> {
        RegexBuilder::new(source)
            .case_insensitive(true)
            .build()
            .map(Pattern)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Pattern(regex)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Lt,
    Gte,
    Lte,
}

/// Filter expression tree.
///
/// Field names are raw document keys (dotted paths allowed). Stores may
/// translate the tree into their native query language or evaluate it with
/// [`Filter::matches`].
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    MatchAll,
    Eq { field: String, value: Value },
    Compare { field: String, op: CompareOp, value: Value },
    Regex { field: String, pattern: Pattern },
    Exists { field: String },
    In { field: String, values: Vec<Value> },
    NotIn { field: String, values: Vec<Value> },
    Not(Box<Filter>),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Filter::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn negate(self) -> Self {
        Filter::Not(Box::new(self))
    }

    /// Evaluate the filter against a document.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::MatchAll => true,
            Filter::Eq { field, value } => match doc.get(field) {
                Some(Value::List(items)) if !matches!(value, Value::List(_)) => {
                    items.iter().any(|item| item.loose_eq(value))
                }
                Some(found) => found.loose_eq(value),
                None => value.is_null(),
            },
            Filter::Compare { field, op, value } => doc
                .get(field)
                .and_then(|found| found.compare(value))
                .is_some_and(|ord| match op {
                    CompareOp::Gt => ord.is_gt(),
                    CompareOp::Lt => ord.is_lt(),
                    CompareOp::Gte => ord.is_ge(),
                    CompareOp::Lte => ord.is_le(),
                }),
            Filter::Regex { field, pattern } => match doc.get(field) {
                Some(Value::Text(text)) => pattern.is_match(text),
                Some(Value::List(items)) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|text| pattern.is_match(text)),
                _ => false,
            },
            Filter::Exists { field } => doc.get(field).is_some(),
            Filter::In { field, values } => contains_any(doc.get(field), values),
            Filter::NotIn { field, values } => !contains_any(doc.get(field), values),
            Filter::Not(inner) => !inner.matches(doc),
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(doc)),
        }
    }
}

fn contains_any(found: Option<&Value>, values: &[Value]) -> bool {
    match found {
        Some(Value::List(items)) => items
            .iter()
            .any(|item| values.iter().any(|v| v.loose_eq(item))),
        Some(found) => values.iter().any(|v| v.loose_eq(found)),
        None => values.iter().any(Value::is_null),
    }
}

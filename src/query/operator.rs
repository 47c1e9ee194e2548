use std::fmt;

/// Leaf comparison applied to one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Equals,
    EqualsIgnoreCase,
    Contains,
    GreaterThan,
    LessThan,
    GreaterEquals,
    LessEquals,
    Regex,
    Exists,
    Between,
    BetweenEquals,
    In,
    NotIn,
    HasKey,
}

/// Operator suffixes in the order the parser tries them.
///
/// Longest keyword first, so `GreaterEquals` is never read as `Greater...`
/// and `NotIn` is never read as a negated `In`. `Equals` has no keyword: a
/// segment with no matching suffix is an equality test.
pub const SUFFIX_PRECEDENCE: &[(&str, FilterOperator)] = &[
    ("BetweenEquals", FilterOperator::BetweenEquals),
    ("GreaterEquals", FilterOperator::GreaterEquals),
    ("GreaterThan", FilterOperator::GreaterThan),
    ("IgnoreCase", FilterOperator::EqualsIgnoreCase),
    ("LessEquals", FilterOperator::LessEquals),
    ("BetweenEq", FilterOperator::BetweenEquals),
    ("GreaterEq", FilterOperator::GreaterEquals),
    ("LessThan", FilterOperator::LessThan),
    ("Contains", FilterOperator::Contains),
    ("Between", FilterOperator::Between),
    ("Exists", FilterOperator::Exists),
    ("HasKey", FilterOperator::HasKey),
    ("LessEq", FilterOperator::LessEquals),
    ("Regex", FilterOperator::Regex),
    ("NotIn", FilterOperator::NotIn),
    ("Ign", FilterOperator::EqualsIgnoreCase),
    ("In", FilterOperator::In),
];

impl FilterOperator {
    /// Number of method parameters the operator consumes.
    pub const fn arity(self) -> usize {
        match self {
            FilterOperator::Exists => 0,
            FilterOperator::Between | FilterOperator::BetweenEquals => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Root operation named by the method prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodOperator {
    Find,
    Delete,
    Exists,
    Count,
    Page,
    UpdateFields,
}

/// Whether a find returns the first match or every match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    First,
    Many,
}

/// Method prefixes, longest first. Every prefix includes the `By` routing
/// keyword.
pub const METHOD_PREFIXES: &[(&str, MethodOperator, Option<Cardinality>)] = &[
    ("updateFieldsBy", MethodOperator::UpdateFields, None),
    ("findFirstBy", MethodOperator::Find, Some(Cardinality::First)),
    ("findManyBy", MethodOperator::Find, Some(Cardinality::Many)),
    ("existsBy", MethodOperator::Exists, None),
    ("deleteBy", MethodOperator::Delete, None),
    ("countBy", MethodOperator::Count, None),
    ("pageBy", MethodOperator::Page, None),
    ("findBy", MethodOperator::Find, None),
];

impl MethodOperator {
    /// Split a method name into its root operator and the filter remainder.
    pub fn strip_prefix(method: &str) -> Option<(MethodOperator, Option<Cardinality>, &str)> {
        METHOD_PREFIXES.iter().find_map(|(prefix, op, cardinality)| {
            method
                .strip_prefix(prefix)
                .map(|rest| (*op, *cardinality, rest))
        })
    }
}

impl fmt::Display for MethodOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Boolean combinator joining the terms of one method name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    pub const fn token(self) -> &'static str {
        match self {
            Combinator::And => "And",
            Combinator::Or => "Or",
        }
    }
}

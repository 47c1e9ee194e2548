//! Method-name grammar.
//!
//! ```text
//! <prefix>By<Field>[Not][<Operator>]((And|Or)<Field>[Not][<Operator>])*
//! ```
//!
//! A name may use only one combinator: any name whose filter part contains
//! both `And` and `Or`, even inside a field name, is rejected. Otherwise
//! the combinator only splits at a camel-case word boundary, i.e. when the
//! next character starts a new word. `findManyByOrderId` is a single term
//! on `orderId`, not an `Or` chain.

use crate::entity::Schema;
use crate::error::ParseError;
use crate::value::ValueType;

use super::operator::{Cardinality, Combinator, FilterOperator, MethodOperator, SUFFIX_PRECEDENCE};

/// One `<Field>[Not][<Operator>]` unit of a method name.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterTerm {
    /// Raw field name as stored in documents.
    pub field: String,
    pub field_type: ValueType,
    pub operator: FilterOperator,
    pub negated: bool,
}

/// Ordered terms joined by exactly one combinator.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterChain {
    pub combinator: Combinator,
    pub terms: Vec<FilterTerm>,
}

impl FilterChain {
    /// Total number of parameters the chain consumes.
    pub fn arity(&self) -> usize {
        self.terms.iter().map(|t| t.operator.arity()).sum()
    }
}

/// Result of parsing a method name against a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMethod {
    pub operator: MethodOperator,
    pub cardinality: Option<Cardinality>,
    pub chain: FilterChain,
}

/// Parse `method` into a root operator and a filter chain over `schema`.
pub fn parse_method_name(method: &str, schema: &Schema) -> Result<ParsedMethod, ParseError> {
    let (operator, cardinality, remainder) =
        MethodOperator::strip_prefix(method).ok_or_else(|| ParseError::NoMethodOperator {
            method: method.to_string(),
        })?;

    let (combinator, segments) = split_combinators(method, remainder)?;
    let terms = segments
        .into_iter()
        .map(|segment| parse_term(method, segment, schema))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ParsedMethod {
        operator,
        cardinality,
        chain: FilterChain { combinator, terms },
    })
}

fn split_combinators<'a>(
    method: &str,
    remainder: &'a str,
) -> Result<(Combinator, Vec<&'a str>), ParseError> {
    let has_and = remainder.contains(Combinator::And.token());
    let has_or = remainder.contains(Combinator::Or.token());
    if has_and && has_or {
        return Err(ParseError::AmbiguousCombinator {
            method: method.to_string(),
        });
    }
    let combinator = if has_or { Combinator::Or } else { Combinator::And };

    let token = combinator.token();
    let cuts: Vec<usize> = remainder
        .match_indices(token)
        .map(|(start, _)| start)
        .filter(|start| {
            remainder[start + token.len()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_uppercase())
        })
        .collect();

    let mut segments = Vec::with_capacity(cuts.len() + 1);
    let mut from = 0;
    for start in cuts {
        segments.push(&remainder[from..start]);
        from = start + token.len();
    }
    segments.push(&remainder[from..]);
    Ok((combinator, segments))
}

fn parse_term(method: &str, segment: &str, schema: &Schema) -> Result<FilterTerm, ParseError> {
    if segment.is_empty() {
        return Err(ParseError::NoFilterOperator {
            method: method.to_string(),
            segment: segment.to_string(),
        });
    }

    for (keyword, operator) in SUFFIX_PRECEDENCE {
        let Some(prefix) = segment.strip_suffix(keyword) else {
            continue;
        };
        if let Some(term) = resolve_field(prefix, *operator, schema) {
            return Ok(term);
        }
    }

    resolve_field(segment, FilterOperator::Equals, schema).ok_or_else(|| {
        ParseError::UnknownField {
            method: method.to_string(),
            field: segment.to_string(),
            entity: schema.entity().name.to_string(),
        }
    })
}

fn resolve_field(prefix: &str, operator: FilterOperator, schema: &Schema) -> Option<FilterTerm> {
    if prefix.is_empty() {
        return None;
    }
    let term = |field: &crate::entity::FieldDescriptor, negated| FilterTerm {
        field: field.name.clone(),
        field_type: field.value_type.clone(),
        operator,
        negated,
    };
    if let Some(field) = schema.field(prefix) {
        return Some(term(field, false));
    }
    let stripped = prefix.strip_suffix("Not").filter(|s| !s.is_empty())?;
    schema.field(stripped).map(|field| term(field, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{FieldDescriptor, SchemaDescriptor};

    struct Customer;

    fn schema() -> Schema {
        SchemaDescriptor::new::<Customer>("customers")
            .field(FieldDescriptor::new("unique_id", ValueType::Uuid).id())
            .field(FieldDescriptor::new("customer_id", ValueType::Int))
            .field(FieldDescriptor::new("first_name", ValueType::Text))
            .field(FieldDescriptor::new("last_name", ValueType::Text))
            .field(FieldDescriptor::new("balance", ValueType::Float))
            .field(FieldDescriptor::new("order_status", ValueType::Text))
            .field(FieldDescriptor::new("logged_in", ValueType::Bool))
            .field(FieldDescriptor::new("a", ValueType::Int))
            .field(FieldDescriptor::new("b", ValueType::Int))
            .resolve()
            .unwrap()
    }

    fn ops(parsed: &ParsedMethod) -> Vec<(&str, FilterOperator, bool)> {
        parsed
            .chain
            .terms
            .iter()
            .map(|t| (t.field.as_str(), t.operator, t.negated))
            .collect()
    }

    #[test]
    fn parses_and_chain_with_between() {
        let parsed =
            parse_method_name("findManyByBalanceBetweenAndCustomerId", &schema()).unwrap();
        assert_eq!(parsed.operator, MethodOperator::Find);
        assert_eq!(parsed.cardinality, Some(Cardinality::Many));
        assert_eq!(parsed.chain.combinator, Combinator::And);
        assert_eq!(
            ops(&parsed),
            vec![
                ("balance", FilterOperator::Between, false),
                ("customer_id", FilterOperator::Equals, false),
            ]
        );
        assert_eq!(parsed.chain.arity(), 3);
    }

    #[test]
    fn parsing_is_deterministic() {
        let schema = schema();
        let name = "findFirstByFirstNameAndBalanceNotBetweenAndCustomerId";
        let first = parse_method_name(name, &schema).unwrap();
        let second = parse_method_name(name, &schema).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            ops(&first),
            vec![
                ("first_name", FilterOperator::Equals, false),
                ("balance", FilterOperator::Between, true),
                ("customer_id", FilterOperator::Equals, false),
            ]
        );
    }

    #[test]
    fn negation_sits_between_field_and_operator() {
        let parsed = parse_method_name("deleteByFirstNameNot", &schema()).unwrap();
        assert_eq!(ops(&parsed), vec![("first_name", FilterOperator::Equals, true)]);

        let parsed = parse_method_name("findManyByCustomerIdNotIn", &schema()).unwrap();
        assert_eq!(ops(&parsed), vec![("customer_id", FilterOperator::NotIn, false)]);

        let parsed = parse_method_name("existsByLastNameNotContains", &schema()).unwrap();
        assert_eq!(ops(&parsed), vec![("last_name", FilterOperator::Contains, true)]);
    }

    #[test]
    fn suffix_precedence_prefers_longest_keyword() {
        let schema = schema();
        let cases = [
            ("findFirstByBalanceGreaterEq", FilterOperator::GreaterEquals),
            ("findFirstByBalanceGreaterEquals", FilterOperator::GreaterEquals),
            ("findFirstByBalanceGreaterThan", FilterOperator::GreaterThan),
            ("findFirstByBalanceBetweenEq", FilterOperator::BetweenEquals),
            ("findFirstByFirstNameIgn", FilterOperator::EqualsIgnoreCase),
            ("findFirstByFirstNameIgnoreCase", FilterOperator::EqualsIgnoreCase),
            ("findFirstByFirstNameRegex", FilterOperator::Regex),
            ("findFirstByFirstNameExists", FilterOperator::Exists),
        ];
        for (name, expected) in cases {
            let parsed = parse_method_name(name, &schema).unwrap();
            assert_eq!(parsed.chain.terms[0].operator, expected, "{}", name);
        }
    }

    #[test]
    fn field_names_ending_in_keywords_still_resolve() {
        let parsed = parse_method_name("findManyByLoggedIn", &schema()).unwrap();
        assert_eq!(ops(&parsed), vec![("logged_in", FilterOperator::Equals, false)]);
    }

    #[test]
    fn combinators_need_a_word_boundary() {
        let parsed = parse_method_name("countByOrderStatus", &schema()).unwrap();
        assert_eq!(ops(&parsed), vec![("order_status", FilterOperator::Equals, false)]);

        let parsed = parse_method_name("findManyByCustomerIdOrCustomerId", &schema()).unwrap();
        assert_eq!(parsed.chain.combinator, Combinator::Or);
        assert_eq!(parsed.chain.terms.len(), 2);
    }

    #[test]
    fn mixed_combinators_are_rejected() {
        let err = parse_method_name("findManyByAAndOrB", &schema()).unwrap_err();
        assert!(matches!(err, ParseError::AmbiguousCombinator { .. }));

        // `Or` inside a field name still counts
        let err = parse_method_name("findManyByCustomerIdAndOrderStatus", &schema()).unwrap_err();
        assert!(matches!(err, ParseError::AmbiguousCombinator { .. }));
    }

    #[test]
    fn reports_unknown_fields_and_operators() {
        let schema = schema();
        assert!(matches!(
            parse_method_name("fetchByFirstName", &schema).unwrap_err(),
            ParseError::NoMethodOperator { .. }
        ));
        assert!(matches!(
            parse_method_name("findByNickname", &schema).unwrap_err(),
            ParseError::UnknownField { field, .. } if field == "Nickname"
        ));
        assert!(matches!(
            parse_method_name("findByFirstNameAnd", &schema).unwrap_err(),
            ParseError::UnknownField { .. }
        ));
        assert!(matches!(
            parse_method_name("countBy", &schema).unwrap_err(),
            ParseError::NoFilterOperator { .. }
        ));
    }
}

//! Registration-time checks of one declared method against the schema.

use crate::contract::{MethodDescriptor, ParamType, ReturnType};
use crate::entity::Schema;
use crate::error::{ParseError, ValidationError};
use crate::query::{
    parse_method_name, Cardinality, CompiledMethodSpec, FilterOperator, FilterTerm,
    MethodOperator, SortField, TrailingParam,
};
use crate::value::ValueType;

/// Parse and validate `method`, producing its frozen spec.
///
/// Checks run in a fixed order: the operation prefix, the return type, the
/// rest of the name grammar, the parameter count, each parameter's type,
/// then sort annotations.
pub fn compile_method(
    method: &MethodDescriptor,
    schema: &Schema,
) -> Result<CompiledMethodSpec, ValidationError> {
    let name = method.effective_name();
    let (operator, hint, _) =
        MethodOperator::strip_prefix(name).ok_or_else(|| ParseError::NoMethodOperator {
            method: name.to_string(),
        })?;
    let cardinality = check_return(method, schema, operator, hint)?;
    let parsed = parse_method_name(name, schema)?;
    let trailing = check_count(method, parsed.operator, parsed.chain.arity())?;

    let mut index = 0;
    for term in &parsed.chain.terms {
        let arity = term.operator.arity();
        for (_, ty) in &method.params[index..index + arity] {
            check_param(method, parsed.operator, term, index, ty)?;
            index += 1;
        }
    }

    let sort = check_sort(method, schema, trailing)?;

    let mut spec = CompiledMethodSpec::new(method.name.clone(), parsed);
    spec.effective = method.effective_name().to_string();
    spec.cardinality = cardinality;
    spec.sort = sort;
    spec.limit = method.limit;
    spec.skip = method.skip;
    spec.trailing = trailing;
    spec.asynchronous = method.asynchronous;
    Ok(spec)
}

fn check_return(
    method: &MethodDescriptor,
    schema: &Schema,
    operator: MethodOperator,
    hint: Option<Cardinality>,
) -> Result<Cardinality, ValidationError> {
    let entity = schema.entity();
    let fail = |expected: &'static str| ValidationError::ReturnType {
        method: method.name.clone(),
        operator,
        expected,
        actual: method.returns.clone(),
    };

    match (operator, &method.returns) {
        (MethodOperator::Find, ReturnType::Entity(e)) if *e == entity => match hint {
            Some(Cardinality::Many) => Err(fail("a list of entities")),
            _ => Ok(Cardinality::First),
        },
        (MethodOperator::Find, ReturnType::EntityList(e)) if *e == entity => match hint {
            Some(Cardinality::First) => Err(fail("an optional entity")),
            _ => Ok(Cardinality::Many),
        },
        (MethodOperator::Find, _) => Err(fail(match hint {
            Some(Cardinality::First) => "an optional entity",
            Some(Cardinality::Many) => "a list of entities",
            None => "an optional entity or a list of entities",
        })),
        (MethodOperator::Page, ReturnType::EntityList(e)) if *e == entity => Ok(Cardinality::Many),
        (MethodOperator::Page, _) => Err(fail("a list of entities")),
        (MethodOperator::Count, ReturnType::Integer) => Ok(Cardinality::Many),
        (MethodOperator::Count, _) => Err(fail("an integer")),
        (
            MethodOperator::Delete | MethodOperator::Exists | MethodOperator::UpdateFields,
            ReturnType::Bool,
        ) => Ok(Cardinality::Many),
        (MethodOperator::Delete | MethodOperator::Exists | MethodOperator::UpdateFields, _) => {
            Err(fail("bool"))
        }
    }
}

fn check_count(
    method: &MethodDescriptor,
    operator: MethodOperator,
    arity: usize,
) -> Result<Option<TrailingParam>, ValidationError> {
    let last_is_directive = method
        .params
        .last()
        .is_some_and(|(_, ty)| ty.is_directive());
    let required = match operator {
        MethodOperator::Page => Some(ParamType::Pagination),
        MethodOperator::UpdateFields => Some(ParamType::UpdateBatch),
        _ => None,
    };
    let optional_sort = operator == MethodOperator::Find && last_is_directive;
    let expected = arity + usize::from(required.is_some() || optional_sort);

    if method.params.len() != expected {
        return Err(ValidationError::ParameterCount {
            method: method.name.clone(),
            expected,
            actual: method.params.len(),
        });
    }

    let last = method.params.last().map(|(_, ty)| ty);
    match required {
        Some(directive) => {
            if last != Some(&directive) {
                return Err(ValidationError::MissingDirective {
                    method: method.name.clone(),
                    expected: directive,
                });
            }
            Ok(Some(match directive {
                ParamType::Pagination => TrailingParam::Pagination,
                _ => TrailingParam::UpdateBatch,
            }))
        }
        None if optional_sort => match last {
            Some(ParamType::Sort) => Ok(Some(TrailingParam::Sort)),
            Some(other) => Err(ValidationError::MisplacedDirective {
                method: method.name.clone(),
                index: expected - 1,
                directive: other.clone(),
                operator,
            }),
            None => Ok(None),
        },
        None => Ok(None),
    }
}

fn check_param(
    method: &MethodDescriptor,
    operator: MethodOperator,
    term: &FilterTerm,
    index: usize,
    ty: &ParamType,
) -> Result<(), ValidationError> {
    if ty.is_directive() {
        return Err(ValidationError::MisplacedDirective {
            method: method.name.clone(),
            index,
            directive: ty.clone(),
            operator,
        });
    }
    let mismatch = |expected: ValueType| ValidationError::ParameterType {
        method: method.name.clone(),
        field: term.field.clone(),
        index,
        expected,
        actual: ty.clone(),
    };

    match term.operator {
        FilterOperator::Regex => match ty {
            ParamType::Pattern | ParamType::Value(ValueType::Text) => Ok(()),
            _ => Err(ValidationError::RegexParameter {
                method: method.name.clone(),
                index,
                actual: ty.clone(),
            }),
        },
        FilterOperator::In | FilterOperator::NotIn => match ty {
            ParamType::Value(ValueType::List(inner)) if **inner == term.field_type => Ok(()),
            _ => Err(ValidationError::ListParameter {
                method: method.name.clone(),
                field: term.field.clone(),
                index,
                expected: term.field_type.clone(),
                actual: ty.clone(),
            }),
        },
        FilterOperator::HasKey => {
            if term.field_type != ValueType::Map {
                return Err(ValidationError::HasKeyField {
                    method: method.name.clone(),
                    field: term.field.clone(),
                    actual: term.field_type.clone(),
                });
            }
            match ty {
                ParamType::Value(ValueType::Text | ValueType::Uuid) => Ok(()),
                _ => Err(mismatch(ValueType::Text)),
            }
        }
        _ => match ty {
            ParamType::Value(actual) if *actual == term.field_type => Ok(()),
            _ => Err(mismatch(term.field_type.clone())),
        },
    }
}

fn check_sort(
    method: &MethodDescriptor,
    schema: &Schema,
    trailing: Option<TrailingParam>,
) -> Result<Vec<SortField>, ValidationError> {
    let dynamic_sort = matches!(
        trailing,
        Some(TrailingParam::Sort | TrailingParam::Pagination)
    );
    if dynamic_sort && method.has_sort_annotations() {
        return Err(ValidationError::MixedSort {
            method: method.name.clone(),
        });
    }

    method
        .sort_by
        .iter()
        .map(|key| {
            schema
                .field(&key.field)
                .map(|field| SortField::new(field.name.clone(), key.ascending))
                .ok_or_else(|| ValidationError::SortField {
                    method: method.name.clone(),
                    field: key.field.clone(),
                })
        })
        .collect()
}

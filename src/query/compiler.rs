//! Turns a compiled method plus call arguments into a [`Filter`].
//!
//! Pure and call-local: no I/O, no shared state.

use crate::contract::Argument;
use crate::error::RepositoryError;
use crate::value::Value;

use super::filter::{CompareOp, Filter, Pattern};
use super::method::CompiledMethodSpec;
use super::operator::{Combinator, FilterOperator};
use super::parser::FilterTerm;

/// Build the filter for one call. `args` holds at least the filter
/// arguments, in declaration order; a trailing directive is ignored.
pub fn compile_filter(
    spec: &CompiledMethodSpec,
    args: &[Argument],
) -> Result<Filter, RepositoryError> {
    let needed = spec.chain.arity();
    if args.len() < needed {
        return Err(RepositoryError::ParameterCount {
            method: spec.method.clone(),
            expected: spec.param_count(),
            actual: args.len(),
        });
    }

    let mut offset = 0;
    let mut filters = Vec::with_capacity(spec.chain.terms.len());
    for term in &spec.chain.terms {
        let arity = term.operator.arity();
        let compiler = TermCompiler {
            method: &spec.method,
            term,
            offset,
        };
        let filter = compiler.compile(&args[offset..offset + arity])?;
        filters.push(if term.negated { filter.negate() } else { filter });
        offset += arity;
    }

    Ok(match filters.len() {
        0 => Filter::MatchAll,
        1 => filters.remove(0),
        _ => match spec.chain.combinator {
            Combinator::And => Filter::And(filters),
            Combinator::Or => Filter::Or(filters),
        },
    })
}

struct TermCompiler<'a> {
    method: &'a str,
    term: &'a FilterTerm,
    offset: usize,
}

impl TermCompiler<'_> {
    fn compile(&self, args: &[Argument]) -> Result<Filter, RepositoryError> {
        let field = self.term.field.clone();
        let filter = match self.term.operator {
            FilterOperator::Equals => Filter::Eq {
                field,
                value: self.value(args, 0)?.clone(),
            },
            FilterOperator::EqualsIgnoreCase => {
                let source = format!("(?i)^{}$", text_of(self.value(args, 0)?));
                Filter::Regex {
                    field,
                    pattern: self.pattern(source, false)?,
                }
            }
            FilterOperator::Contains => {
                let source = format!(".*{}.*", text_of(self.value(args, 0)?));
                Filter::Regex {
                    field,
                    pattern: self.pattern(source, true)?,
                }
            }
            FilterOperator::GreaterThan => self.compare(field, CompareOp::Gt, args, 0)?,
            FilterOperator::LessThan => self.compare(field, CompareOp::Lt, args, 0)?,
            FilterOperator::GreaterEquals => self.compare(field, CompareOp::Gte, args, 0)?,
            FilterOperator::LessEquals => self.compare(field, CompareOp::Lte, args, 0)?,
            FilterOperator::Regex => Filter::Regex {
                field,
                pattern: self.regex_argument(&args[0])?,
            },
            FilterOperator::Exists => Filter::Exists { field },
            FilterOperator::Between => Filter::And(vec![
                self.compare(field.clone(), CompareOp::Gt, args, 0)?,
                self.compare(field, CompareOp::Lt, args, 1)?,
            ]),
            FilterOperator::BetweenEquals => Filter::And(vec![
                self.compare(field.clone(), CompareOp::Gte, args, 0)?,
                self.compare(field, CompareOp::Lte, args, 1)?,
            ]),
            FilterOperator::In => Filter::In {
                field,
                values: self.list(args)?,
            },
            FilterOperator::NotIn => Filter::NotIn {
                field,
                values: self.list(args)?,
            },
            FilterOperator::HasKey => Filter::Exists {
                field: format!("{}.{}", field, text_of(self.value(args, 0)?)),
            },
        };
        Ok(filter)
    }

    fn value<'v>(&self, args: &'v [Argument], at: usize) -> Result<&'v Value, RepositoryError> {
        match &args[at] {
            Argument::Value(value) => Ok(value),
            other => Err(self.invalid(at, self.term.field_type.to_string(), other.kind())),
        }
    }

    fn compare(
        &self,
        field: String,
        op: CompareOp,
        args: &[Argument],
        at: usize,
    ) -> Result<Filter, RepositoryError> {
        Ok(Filter::Compare {
            field,
            op,
            value: self.value(args, at)?.clone(),
        })
    }

    fn list(&self, args: &[Argument]) -> Result<Vec<Value>, RepositoryError> {
        match self.value(args, 0)? {
            Value::List(items) => Ok(items.clone()),
            other => Err(self.invalid(
                0,
                format!("list of {}", self.term.field_type),
                other.kind(),
            )),
        }
    }

    fn regex_argument(&self, arg: &Argument) -> Result<Pattern, RepositoryError> {
        match arg {
            Argument::Pattern(pattern) => Ok(pattern.clone()),
            Argument::Value(Value::Text(source)) => self.pattern(source.clone(), false),
            other => Err(RepositoryError::InvalidRegexArgument {
                method: self.method.to_string(),
                index: self.offset,
                actual: other.kind().to_string(),
            }),
        }
    }

    fn pattern(&self, source: String, ignore_case: bool) -> Result<Pattern, RepositoryError> {
        let built = if ignore_case {
            Pattern::case_insensitive(&source)
        } else {
            Pattern::new(&source)
        };
        built.map_err(|source_err| RepositoryError::InvalidPattern {
            method: self.method.to_string(),
            pattern: source,
            source: source_err,
        })
    }

    fn invalid(&self, at: usize, expected: String, actual: &str) -> RepositoryError {
        RepositoryError::InvalidArgument {
            method: self.method.to_string(),
            index: self.offset + at,
            expected,
            actual: actual.to_string(),
        }
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::Text(text) => text.clone(),
        other => other.to_string(),
    }
}

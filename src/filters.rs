//! Date filter capability and the inclusive time-boundary operator layered on it.
//!
//! The generic capability (`before`, `after`, `between`, `empty`, day granularity)
//! belongs to the query engine; `DateTimeFilter` adds exactly one operator,
//! `TimeInclusiveGte`, and hands every other operator to its base unchanged.

use crate::date::DateTimeValue;
use crate::error::ExportError;
use crate::query::{normalized_field, FilterPredicate, Operator};
use serde_json::Value;

/// Something that can turn a date operator on a field into a predicate.
pub trait DateFilter {
    fn supports(&self, operator: Operator) -> bool;
    fn field_filter(&self, field: &str, operator: Operator, value: Value) -> Result<FilterPredicate, ExportError>;
}

/// Base capability: passes the day-granularity operators through verbatim on the
/// raw field, leaving their interpretation to the engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct DelegatingDateFilter;

impl DateFilter for DelegatingDateFilter {
    fn supports(&self, operator: Operator) -> bool {
        matches!(operator, Operator::Before | Operator::After | Operator::Between | Operator::Empty)
    }

    fn field_filter(&self, field: &str, operator: Operator, value: Value) -> Result<FilterPredicate, ExportError> {
        if !self.supports(operator) {
            return Err(ExportError::InvalidArgument {
                field: field.to_string(),
                expected: "date operator",
                received_kind: "operator",
                received_value: operator.token().to_string(),
            });
        }
        Ok(FilterPredicate::new(field, operator, value))
    }
}

/// `DateFilter` extended with second-granularity, inclusive lower bounds.
#[derive(Clone, Debug, Default)]
pub struct DateTimeFilter<B = DelegatingDateFilter> {
    base: B,
}

impl<B: DateFilter> DateTimeFilter<B> {
    pub fn new(base: B) -> Self {
        Self { base }
    }

    /// Compile `field >= value` against the normalized field, compared as epoch seconds.
    pub fn compile(&self, field: &str, value: &DateTimeValue) -> Result<FilterPredicate, ExportError> {
        let at = value.resolve(field)?;
        Ok(FilterPredicate::new(normalized_field(field), Operator::TimeInclusiveGte, at.unix_timestamp()))
    }
}

impl<B: DateFilter> DateFilter for DateTimeFilter<B> {
    fn supports(&self, operator: Operator) -> bool {
        operator == Operator::TimeInclusiveGte || self.base.supports(operator)
    }

    fn field_filter(&self, field: &str, operator: Operator, value: Value) -> Result<FilterPredicate, ExportError> {
        if operator != Operator::TimeInclusiveGte {
            return self.base.field_filter(field, operator, value);
        }
        let dt = match value {
            Value::String(s) => DateTimeValue::Raw(s),
            Value::Number(n) => {
                let ts = n.as_i64().ok_or_else(|| invalid(field, "number", n.to_string()))?;
                let at = time::OffsetDateTime::from_unix_timestamp(ts)
                    .map_err(|_| invalid(field, "number", n.to_string()))?;
                DateTimeValue::At(at)
            }
            other => return Err(invalid(field, json_kind(&other), other.to_string())),
        };
        self.compile(field, &dt)
    }
}

fn invalid(field: &str, kind: &'static str, raw: String) -> ExportError {
    ExportError::InvalidArgument {
        field: field.to_string(),
        expected: "date-time",
        received_kind: kind,
        received_value: raw,
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! Predicate model handed to the product query engine, and the engine seam itself.

use crate::catalog::Product;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Prefix of the indexed/denormalized copy of product fields.
pub const NORMALIZED_FIELD: &str = "normalizedData";

pub const FIELD_CATEGORIES: &str = "categories.id";
pub const FIELD_UPDATED: &str = "updated";
pub const FIELD_ENABLED: &str = "enabled";
pub const FIELD_COMPLETENESS: &str = "completeness_for_export";

/// The normalized form of a filter target, e.g. `normalizedData.updated`.
pub fn normalized_field(field: &str) -> String {
    format!("{}.{}", NORMALIZED_FIELD, field)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    LessThan,
    /// Member of any category below (or at) one of the given ids.
    DescendantOf,
    /// No category at all.
    Unclassified,
    /// `>=` on a second-granularity epoch timestamp.
    TimeInclusiveGte,
    // Day-granularity date operators; their semantics belong to the query engine.
    Before,
    After,
    Between,
    Empty,
}

impl Operator {
    /// Operator token as the query engine spells it.
    pub fn token(self) -> &'static str {
        match self {
            Operator::Equals => "=",
            Operator::LessThan => "<",
            Operator::DescendantOf => "IN CHILDREN",
            Operator::Unclassified => "UNCLASSIFIED",
            Operator::TimeInclusiveGte => ">= WITH TIME",
            Operator::Before => "<",
            Operator::After => ">",
            Operator::Between => "BETWEEN",
            Operator::Empty => "EMPTY",
        }
    }

    pub fn is_date_operator(self) -> bool {
        matches!(
            self,
            Operator::TimeInclusiveGte | Operator::Before | Operator::After | Operator::Between | Operator::Empty
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl FilterPredicate {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self { field: field.into(), operator, value: value.into(), options: Map::new() }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }
}

impl fmt::Display for FilterPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator.token(), self.value)?;
        if !self.options.is_empty() {
            write!(f, " {}", Value::Object(self.options.clone()))?;
        }
        Ok(())
    }
}

/// Options the query is created with (not per-predicate).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub default_scope: Option<String>,
}

/// Lazy, finite, single-pass stream of matching products.
pub type ProductStream = Box<dyn Iterator<Item = Result<Product>>>;

/// The persistence layer's query engine: runs a predicate set and yields matches
/// in its own order.
pub trait ProductQuery {
    fn execute(&self, predicates: &[FilterPredicate], options: &QueryOptions) -> Result<ProductStream>;
}

//! Compiles the enumerated job options into the ordered predicate set a run reads with.

use crate::catalog::Channel;
use crate::completeness::{CompletenessGenerator, CompletenessTrigger};
use crate::config::{CategorizationCondition, CompleteCondition, EnabledCondition, JobFilterConfig, UpdatedCondition};
use crate::date::DateTimeValue;
use crate::filters::{DateFilter, DateTimeFilter, DelegatingDateFilter};
use crate::history::{ExecutionHistory, LastExecutionDateResolver};
use crate::query::{FilterPredicate, Operator, FIELD_CATEGORIES, FIELD_COMPLETENESS, FIELD_ENABLED, FIELD_UPDATED};
use anyhow::Result;
use serde_json::{json, Value};

/// Completeness ratio a product needs to count as complete.
pub const COMPLETE_RATIO: u8 = 100;

pub struct FilterCompiler<'a, B: DateFilter = DelegatingDateFilter> {
    date_filter: DateTimeFilter<B>,
    last_execution: LastExecutionDateResolver<'a>,
    completeness: CompletenessTrigger<'a>,
}

impl<'a> FilterCompiler<'a, DelegatingDateFilter> {
    pub fn new(history: &'a dyn ExecutionHistory, completeness: &'a dyn CompletenessGenerator) -> Self {
        Self::with_date_filter(DateTimeFilter::default(), history, completeness)
    }
}

impl<'a, B: DateFilter> FilterCompiler<'a, B> {
    pub fn with_date_filter(
        date_filter: DateTimeFilter<B>,
        history: &'a dyn ExecutionHistory,
        completeness: &'a dyn CompletenessGenerator,
    ) -> Self {
        Self {
            date_filter,
            last_execution: LastExecutionDateResolver::new(history),
            completeness: CompletenessTrigger::new(completeness),
        }
    }

    /// Categorization, recency and enabled predicates come first; completeness is
    /// generated (when asked for) before its predicate is attached, and last.
    pub fn compile(&mut self, config: &JobFilterConfig, channel: &Channel) -> Result<Vec<FilterPredicate>> {
        let mut predicates = Vec::new();

        if let Some(p) = categorization_predicate(config.categorization(), channel) {
            attach(&mut predicates, p);
        }
        if let Some(p) = self.updated_predicate(config)? {
            attach(&mut predicates, p);
        }
        if let Some(p) = enabled_predicate(config.enabled()) {
            attach(&mut predicates, p);
        }

        if config.complete() != CompleteCondition::None && config.generate_completeness() {
            self.completeness.ensure(channel)?;
        }
        if let Some(p) = complete_predicate(config.complete(), channel) {
            attach(&mut predicates, p);
        }

        tracing::info!(channel = %channel.code, predicates = predicates.len(), "compiled product filters");
        Ok(predicates)
    }

    fn updated_predicate(&self, config: &JobFilterConfig) -> Result<Option<FilterPredicate>> {
        let since = match config.updated() {
            UpdatedCondition::None => None,
            UpdatedCondition::FixedDate(since) => since.clone(),
            UpdatedCondition::SinceLastRun => {
                let last = self.last_execution.resolve(config.job_definition_id())?;
                if last.is_none() {
                    tracing::info!(job = %config.job_definition_id(), "no completed execution yet, exporting without an updated bound");
                }
                last.map(DateTimeValue::At)
            }
        };
        match since {
            Some(value) => Ok(Some(self.date_filter.compile(FIELD_UPDATED, &value)?)),
            None => Ok(None),
        }
    }
}

fn attach(predicates: &mut Vec<FilterPredicate>, p: FilterPredicate) {
    tracing::debug!(predicate = %p, "filter attached");
    predicates.push(p);
}

fn categorization_predicate(cond: CategorizationCondition, channel: &Channel) -> Option<FilterPredicate> {
    match cond {
        CategorizationCondition::CategorizedOnly => Some(FilterPredicate::new(
            FIELD_CATEGORIES,
            Operator::DescendantOf,
            json!([channel.root_category_id]),
        )),
        CategorizationCondition::UncategorizedOnly => {
            Some(FilterPredicate::new(FIELD_CATEGORIES, Operator::Unclassified, Value::Array(Vec::new())))
        }
        CategorizationCondition::None => None,
    }
}

fn enabled_predicate(cond: EnabledCondition) -> Option<FilterPredicate> {
    let enabled = match cond {
        EnabledCondition::EnabledOnly => true,
        EnabledCondition::DisabledOnly => false,
        EnabledCondition::None => return None,
    };
    Some(FilterPredicate::new(FIELD_ENABLED, Operator::Equals, enabled))
}

fn complete_predicate(cond: CompleteCondition, channel: &Channel) -> Option<FilterPredicate> {
    let operator = match cond {
        CompleteCondition::CompleteOnly => Operator::Equals,
        CompleteCondition::IncompleteOnly => Operator::LessThan,
        CompleteCondition::None => return None,
    };
    Some(FilterPredicate::new(FIELD_COMPLETENESS, operator, COMPLETE_RATIO).with_option("scope", channel.scope.clone()))
}

//! The reader step: resolve the channel, compile filters, open the cursor once,
//! then hand out products one at a time.

use crate::catalog::{Channel, ChannelRepository, Product};
use crate::compiler::FilterCompiler;
use crate::completeness::CompletenessGenerator;
use crate::config::{CategorizationCondition, CompleteCondition, EnabledCondition, JobFilterConfig, UpdatedOption};
use crate::cursor::{RecordCursor, UnitConverter};
use crate::error::ExportError;
use crate::history::ExecutionHistory;
use crate::progress::make_read_spinner;
use crate::query::{FilterPredicate, ProductQuery, QueryOptions};
use anyhow::{Context, Result};
use serde::Serialize;

/// Descriptor of one configurable job option, for whatever renders job forms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConfigurationField {
    pub name: &'static str,
    pub required: bool,
    pub multiple: bool,
    /// (value, label); empty for free-text options
    pub choices: Vec<(String, String)>,
}

impl ConfigurationField {
    pub fn choice(name: &'static str, choices: Vec<(String, String)>) -> Self {
        Self { name, required: true, multiple: false, choices }
    }
    pub fn multiple(name: &'static str, choices: Vec<(String, String)>) -> Self {
        Self { name, required: false, multiple: true, choices }
    }
    pub fn text(name: &'static str) -> Self {
        Self { name, required: false, multiple: false, choices: Vec::new() }
    }
}

fn same_label(choices: &[&str]) -> Vec<(String, String)> {
    choices.iter().map(|c| (c.to_string(), c.to_string())).collect()
}

/// Collaborators a reader talks to. All are borrowed for the run.
#[derive(Clone, Copy)]
pub struct ReaderContext<'a> {
    pub query: &'a dyn ProductQuery,
    pub channels: &'a dyn ChannelRepository,
    pub completeness: &'a dyn CompletenessGenerator,
    pub history: &'a dyn ExecutionHistory,
    pub converter: &'a dyn UnitConverter,
}

pub struct ProductReader<'a> {
    ctx: ReaderContext<'a>,
    progress: bool,
    predicates: Vec<FilterPredicate>,
    cursor: Option<RecordCursor<'a>>,
}

impl<'a> ProductReader<'a> {
    pub fn new(ctx: ReaderContext<'a>) -> Self {
        Self { ctx, progress: false, predicates: Vec::new(), cursor: None }
    }

    pub fn progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }

    /// Resolve the channel, compile the predicate set and open the cursor.
    /// A missing channel aborts before anything is read.
    pub fn initialize(&mut self, config: &JobFilterConfig) -> Result<()> {
        self.cursor = None;
        let code = config.channel_code();
        let channel = self
            .ctx
            .channels
            .channel_by_code(code)
            .with_context(|| format!("looking up channel '{}'", code))?
            .ok_or_else(|| ExportError::ChannelNotFound(code.to_string()))?;

        let mut compiler = FilterCompiler::new(self.ctx.history, self.ctx.completeness);
        self.predicates = compiler.compile(config, &channel)?;

        let options = QueryOptions { default_scope: Some(channel.code.clone()) };
        let stream = self
            .ctx
            .query
            .execute(&self.predicates, &options)
            .with_context(|| format!("executing product query for channel '{}'", channel.code))?;

        let mut cursor = RecordCursor::open(stream, self.ctx.converter, channel);
        if self.progress {
            cursor = cursor.with_progress(make_read_spinner("Reading products"));
        }
        tracing::info!(job = %config.job_definition_id(), %config, "product reader initialized");
        self.cursor = Some(cursor);
        Ok(())
    }

    /// Next matching product, or None once the cursor is exhausted.
    pub fn read(&mut self) -> Result<Option<Product>> {
        let cursor = self.cursor.as_mut().ok_or(ExportError::NotInitialized)?;
        cursor.next().transpose()
    }

    pub fn read_count(&self) -> u64 {
        self.cursor.as_ref().map_or(0, RecordCursor::read_count)
    }

    pub fn channel(&self) -> Option<&Channel> {
        self.cursor.as_ref().map(RecordCursor::channel)
    }

    /// The predicate set compiled by the last `initialize`.
    pub fn predicates(&self) -> &[FilterPredicate] {
        &self.predicates
    }

    pub fn configuration_fields(&self) -> Result<Vec<ConfigurationField>> {
        let channels = self.ctx.channels.channel_codes()?;
        Ok(vec![
            ConfigurationField::choice("channel", channels.into_iter().map(|c| (c.clone(), c)).collect()),
            ConfigurationField::choice("updatedCondition", same_label(UpdatedOption::choices())),
            ConfigurationField::text("updatedSince"),
            ConfigurationField::choice("enabledCondition", same_label(EnabledCondition::choices())),
            ConfigurationField::choice("categorizationCondition", same_label(CategorizationCondition::choices())),
            ConfigurationField::choice("completeCondition", same_label(CompleteCondition::choices())),
        ])
    }
}

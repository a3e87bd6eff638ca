use crate::catalog::Channel;
use anyhow::{Context, Result};
use std::collections::HashSet;

/// Computes missing completeness entries for every product under a channel.
pub trait CompletenessGenerator {
    fn generate_missing_for_channel(&self, channel: &Channel) -> Result<()>;
}

/// Makes sure completeness exists for a channel before anything filters on it.
/// Each channel is generated at most once per trigger.
pub struct CompletenessTrigger<'a> {
    generator: &'a dyn CompletenessGenerator,
    ensured: HashSet<String>,
}

impl<'a> CompletenessTrigger<'a> {
    pub fn new(generator: &'a dyn CompletenessGenerator) -> Self {
        Self { generator, ensured: HashSet::new() }
    }

    pub fn ensure(&mut self, channel: &Channel) -> Result<()> {
        if self.ensured.contains(&channel.code) {
            tracing::debug!(channel = %channel.code, "completeness already generated");
            return Ok(());
        }
        tracing::info!(channel = %channel.code, "generating missing completeness");
        self.generator
            .generate_missing_for_channel(channel)
            .with_context(|| format!("generating completeness for channel '{}'", channel.code))?;
        self.ensured.insert(channel.code.clone());
        Ok(())
    }

    pub fn was_ensured(&self, channel_code: &str) -> bool {
        self.ensured.contains(channel_code)
    }
}

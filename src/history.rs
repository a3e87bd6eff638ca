//! Past runs of a job definition, and the "since last successful run" lower bound.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitStatus {
    Completed,
    Failed,
    Stopped,
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub job_definition_id: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
    pub exit_status: ExitStatus,
}

/// Query surface over stored execution metadata.
pub trait ExecutionHistory {
    /// Latest `end_time` among executions of `job_definition_id` with `status`.
    fn max_end_time(&self, job_definition_id: &str, status: ExitStatus) -> Result<Option<OffsetDateTime>>;
}

/// History kept in memory; executions can be appended while a process runs several jobs.
#[derive(Debug, Default)]
pub struct InMemoryExecutionHistory {
    records: Mutex<Vec<ExecutionRecord>>,
}

impl InMemoryExecutionHistory {
    pub fn new(records: Vec<ExecutionRecord>) -> Self {
        Self { records: Mutex::new(records) }
    }

    pub fn record(&self, rec: ExecutionRecord) {
        self.records.lock().push(rec);
    }
}

impl ExecutionHistory for InMemoryExecutionHistory {
    fn max_end_time(&self, job_definition_id: &str, status: ExitStatus) -> Result<Option<OffsetDateTime>> {
        let records = self.records.lock();
        Ok(records
            .iter()
            .filter(|r| r.job_definition_id == job_definition_id && r.exit_status == status)
            .filter_map(|r| r.end_time)
            .max())
    }
}

/// Resolves the end time of the most recent completed run of a job definition.
pub struct LastExecutionDateResolver<'a> {
    history: &'a dyn ExecutionHistory,
}

impl<'a> LastExecutionDateResolver<'a> {
    pub fn new(history: &'a dyn ExecutionHistory) -> Self {
        Self { history }
    }

    /// None when the job never completed; that is a valid "no lower bound" answer.
    pub fn resolve(&self, job_definition_id: &str) -> Result<Option<OffsetDateTime>> {
        let latest = self
            .history
            .max_end_time(job_definition_id, ExitStatus::Completed)
            .with_context(|| format!("last completed execution of job '{}'", job_definition_id))?;
        Ok(latest.map(|dt| dt.to_offset(UtcOffset::UTC)))
    }
}

//! Job options: the raw, setter-populated parameters a scheduled export carries,
//! and the immutable `JobFilterConfig` validated from them once per run.

use crate::date::{parse_flexible, DateTimeValue};
use crate::error::ExportError;
use crate::util::split_code_list;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Recency condition on the product `updated` timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum UpdatedOption {
    #[default]
    DoNotApply,
    FromDefinedDate,
    FromLastExecution,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EnabledCondition {
    EnabledOnly,
    DisabledOnly,
    #[default]
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CategorizationCondition {
    CategorizedOnly,
    UncategorizedOnly,
    #[default]
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CompleteCondition {
    CompleteOnly,
    IncompleteOnly,
    #[default]
    None,
}

/// Resolved recency condition. A fixed date with no value attached compiles to
/// no predicate at all.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum UpdatedCondition {
    #[default]
    None,
    FixedDate(Option<DateTimeValue>),
    SinceLastRun,
}

macro_rules! option_strings {
    ($ty:ty, $option:literal, { $($s:literal => $v:expr),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = ExportError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($s => Ok($v),)+
                    other => Err(ExportError::InvalidOption { option: $option, value: other.to_string() }),
                }
            }
        }
        impl $ty {
            /// The option strings this condition accepts, in display order.
            pub fn choices() -> &'static [&'static str] {
                &[$($s),+]
            }
        }
    };
}

option_strings!(UpdatedOption, "updatedCondition", {
    "doNotApply" => UpdatedOption::DoNotApply,
    "fromDefinedDate" => UpdatedOption::FromDefinedDate,
    "fromLastExecution" => UpdatedOption::FromLastExecution,
});

option_strings!(EnabledCondition, "enabledCondition", {
    "onlyEnabled" => EnabledCondition::EnabledOnly,
    "onlyDisabled" => EnabledCondition::DisabledOnly,
    "doNotApply" => EnabledCondition::None,
});

option_strings!(CategorizationCondition, "categorizationCondition", {
    "onlyCategorized" => CategorizationCondition::CategorizedOnly,
    "onlyNonCategorized" => CategorizationCondition::UncategorizedOnly,
    "doNotApply" => CategorizationCondition::None,
});

option_strings!(CompleteCondition, "completeCondition", {
    "onlyComplete" => CompleteCondition::CompleteOnly,
    "onlyUncomplete" => CompleteCondition::IncompleteOnly,
    "doNotApply" => CompleteCondition::None,
});

/// Exclusion lists arrive either as JSON arrays or as a single delimited string.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum CodeList {
    List(Vec<String>),
    Joined(String),
}

impl Default for CodeList {
    fn default() -> Self {
        CodeList::List(Vec::new())
    }
}

impl CodeList {
    fn into_set(self) -> BTreeSet<String> {
        let raw = match self {
            CodeList::List(v) => v,
            CodeList::Joined(s) => split_code_list(&s),
        };
        raw.into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn default_true() -> bool {
    true
}

/// Raw job parameters as stored by the scheduler (option strings, camelCase keys).
/// Only mutated during the configuration phase; `validate` freezes them.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct JobParameters {
    pub job_definition_id: String,
    pub channel: String,
    pub updated_condition: String,
    pub updated_since: Option<String>,
    pub enabled_condition: String,
    pub categorization_condition: String,
    pub complete_condition: String,
    #[serde(default = "default_true")]
    pub generate_completeness: bool,
    pub attributes_to_exclude: CodeList,
    pub association_types_to_exclude: CodeList,
}

impl Default for JobParameters {
    fn default() -> Self {
        Self {
            job_definition_id: String::new(),
            channel: String::new(),
            updated_condition: "doNotApply".into(),
            updated_since: None,
            enabled_condition: "doNotApply".into(),
            categorization_condition: "doNotApply".into(),
            complete_condition: "doNotApply".into(),
            generate_completeness: true,
            attributes_to_exclude: CodeList::default(),
            association_types_to_exclude: CodeList::default(),
        }
    }
}

impl JobParameters {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn with_job_definition(mut self, id: impl Into<String>) -> Self {
        self.job_definition_id = id.into();
        self
    }
    pub fn with_channel(mut self, code: impl Into<String>) -> Self {
        self.channel = code.into();
        self
    }
    pub fn with_updated_condition(mut self, cond: impl Into<String>) -> Self {
        self.updated_condition = cond.into();
        self
    }
    pub fn with_updated_since(mut self, since: impl Into<String>) -> Self {
        self.updated_since = Some(since.into());
        self
    }
    pub fn with_enabled_condition(mut self, cond: impl Into<String>) -> Self {
        self.enabled_condition = cond.into();
        self
    }
    pub fn with_categorization_condition(mut self, cond: impl Into<String>) -> Self {
        self.categorization_condition = cond.into();
        self
    }
    pub fn with_complete_condition(mut self, cond: impl Into<String>) -> Self {
        self.complete_condition = cond.into();
        self
    }
    pub fn with_generate_completeness(mut self, yes: bool) -> Self {
        self.generate_completeness = yes;
        self
    }
    pub fn with_attributes_to_exclude<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes_to_exclude = CodeList::List(codes.into_iter().map(Into::into).collect());
        self
    }
    pub fn with_association_types_to_exclude<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.association_types_to_exclude = CodeList::List(codes.into_iter().map(Into::into).collect());
        self
    }

    /// Freeze the parameters into the config used for the whole run.
    pub fn validate(self) -> Result<JobFilterConfig, ExportError> {
        let channel_code = self.channel.trim().to_string();
        if channel_code.is_empty() {
            return Err(ExportError::MissingOption("channel"));
        }

        let updated = match self.updated_condition.parse::<UpdatedOption>()? {
            UpdatedOption::DoNotApply => UpdatedCondition::None,
            UpdatedOption::FromLastExecution => UpdatedCondition::SinceLastRun,
            UpdatedOption::FromDefinedDate => {
                let since = self
                    .updated_since
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| match parse_flexible(s) {
                        Some(dt) => DateTimeValue::At(dt),
                        // left raw; the boundary filter reports it with the field name
                        None => DateTimeValue::Raw(s.to_string()),
                    });
                UpdatedCondition::FixedDate(since)
            }
        };

        Ok(JobFilterConfig {
            job_definition_id: self.job_definition_id,
            channel_code,
            updated,
            enabled: self.enabled_condition.parse()?,
            categorization: self.categorization_condition.parse()?,
            complete: self.complete_condition.parse()?,
            generate_completeness: self.generate_completeness,
            attributes_to_exclude: self.attributes_to_exclude.into_set(),
            association_types_to_exclude: self.association_types_to_exclude.into_set(),
        })
    }
}

/// Immutable filter configuration for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobFilterConfig {
    job_definition_id: String,
    channel_code: String,
    updated: UpdatedCondition,
    enabled: EnabledCondition,
    categorization: CategorizationCondition,
    complete: CompleteCondition,
    generate_completeness: bool,
    attributes_to_exclude: BTreeSet<String>,
    association_types_to_exclude: BTreeSet<String>,
}

impl JobFilterConfig {
    pub fn job_definition_id(&self) -> &str {
        &self.job_definition_id
    }
    pub fn channel_code(&self) -> &str {
        &self.channel_code
    }
    pub fn updated(&self) -> &UpdatedCondition {
        &self.updated
    }
    pub fn enabled(&self) -> EnabledCondition {
        self.enabled
    }
    pub fn categorization(&self) -> CategorizationCondition {
        self.categorization
    }
    pub fn complete(&self) -> CompleteCondition {
        self.complete
    }
    pub fn generate_completeness(&self) -> bool {
        self.generate_completeness
    }
    pub fn attributes_to_exclude(&self) -> &BTreeSet<String> {
        &self.attributes_to_exclude
    }
    pub fn association_types_to_exclude(&self) -> &BTreeSet<String> {
        &self.association_types_to_exclude
    }
}

impl fmt::Display for JobFilterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "channel={} updated={:?} enabled={:?} categorization={:?} complete={:?} generate_completeness={} excluded_attributes={} excluded_associations={}",
            self.channel_code,
            self.updated,
            self.enabled,
            self.categorization,
            self.complete,
            self.generate_completeness,
            self.attributes_to_exclude.len(),
            self.association_types_to_exclude.len(),
        )
    }
}

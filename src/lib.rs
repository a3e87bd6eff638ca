mod error;
mod config;
mod date;
mod util;
mod catalog;
mod query;

mod filters;
mod history;
mod completeness;
mod compiler;

mod cursor;
mod conversion;
mod progress;

mod flatten;
mod exclusion;
mod processor;
mod reader;
mod pipeline;

pub mod memory;

pub use crate::error::ExportError;
pub use crate::config::{
    CategorizationCondition, CodeList, CompleteCondition, EnabledCondition, JobFilterConfig, JobParameters,
    UpdatedCondition, UpdatedOption,
};
pub use crate::date::{parse_flexible, DateTimeValue};
pub use crate::catalog::{
    Association, AssociationType, AttributeDefinition, AttributeGroup, Channel, ChannelRepository, Family, Price,
    Product, ProductValue, ValueData,
};
pub use crate::query::{
    normalized_field, FilterPredicate, Operator, ProductQuery, ProductStream, QueryOptions, FIELD_CATEGORIES,
    FIELD_COMPLETENESS, FIELD_ENABLED, FIELD_UPDATED, NORMALIZED_FIELD,
};

// Filter compilation and its collaborators.
pub use crate::filters::{DateFilter, DateTimeFilter, DelegatingDateFilter};
pub use crate::history::{ExecutionHistory, ExecutionRecord, ExitStatus, InMemoryExecutionHistory, LastExecutionDateResolver};
pub use crate::completeness::{CompletenessGenerator, CompletenessTrigger};
pub use crate::compiler::{FilterCompiler, COMPLETE_RATIO};

// Read loop.
pub use crate::cursor::{RecordCursor, UnitConverter};
pub use crate::conversion::{MeasureFamily, MetricConverter};
pub use crate::reader::{ConfigurationField, ProductReader, ReaderContext};

// Record shaping.
pub use crate::flatten::{
    family_codes, value_key, AttributeFlattener, ExportRecord, FlatProduct, MediaReference, RecordFlattener,
    ITEM_SEPARATOR, SUFFIX_SEPARATOR,
};
pub use crate::exclusion::{exclude, filter_media_values, key_matches_code, ExclusionSet};
pub use crate::processor::{AttributeProcessor, NoopDetacher, ObjectDetacher, ProductProcessor};

pub use crate::pipeline::{CatalogExport, ExportSummary};
pub use crate::util::{init_tracing_once, split_code_list};

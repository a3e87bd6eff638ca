//! Typed failures raised by the export stage itself.
//!
//! Collaborator failures travel as `anyhow::Error` and are never wrapped here;
//! callers that need to branch on one of these kinds can `downcast_ref::<ExportError>()`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    /// A filter value could not be interpreted as the kind the operator needs.
    #[error("invalid argument for filter on '{field}': expected {expected}, got {received_kind} '{received_value}'")]
    InvalidArgument {
        field: String,
        expected: &'static str,
        received_kind: &'static str,
        received_value: String,
    },

    /// The configured channel does not exist; fatal to job start.
    #[error("channel '{0}' not found")]
    ChannelNotFound(String),

    /// An enumerated job option carried a value outside its domain.
    #[error("invalid value '{value}' for option '{option}'")]
    InvalidOption { option: &'static str, value: String },

    #[error("missing required option '{0}'")]
    MissingOption(&'static str),

    #[error("reader used before initialize()")]
    NotInitialized,

    /// A measured value used a unit the conversion table does not know.
    #[error("unknown unit '{unit}' for metric family '{family}'")]
    UnknownUnit { family: String, unit: String },
}

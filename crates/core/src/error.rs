//! Typed errors for the two failure tiers of a run.

use thiserror::Error;

/// Invalid naming configuration. Always fatal: the run aborts before any
/// file is touched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConventionError {
    #[error("{which} suffix must not be empty")]
    EmptySuffix { which: &'static str },

    #[error("{which} suffix {value:?} must end with .srt")]
    MissingSrtExtension { which: &'static str, value: String },
}

/// A single file failed to load, translate or save. Recorded in the run
/// summary; the run continues with the next file.
#[derive(Debug, Error)]
#[error("failed to translate {file}")]
pub struct TranslationError {
    /// Name of the input file.
    pub file: String,
    #[source]
    pub source: anyhow::Error,
}

impl TranslationError {
    /// Full error chain on one line, for log output.
    pub fn detail(&self) -> String {
        format!("{:#}", self.source)
    }
}

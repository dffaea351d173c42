//! Batch English to Russian translation of the subtitle files in a directory.
//!
//! [`naming`] decides which files are translated and what the results are
//! called, [`translate`] turns one SRT file into another through a text
//! backend, and [`run`] ties both together over a directory listing.

pub mod error;
pub mod naming;
pub mod run;
pub mod scan;
pub mod srt;
pub mod translate;

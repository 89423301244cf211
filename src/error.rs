//! Error types for TIN-X scoring.

use crate::mentions::Pmid;

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Domain errors raised while reading inputs or computing scores.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("line {line_no}: invalid PubMed ID {token:?}")]
    MalformedPmid { line_no: usize, token: String },

    #[error("line {line_no}: expected identifier and PubMed ID columns separated by tab")]
    MissingColumn { line_no: usize },

    #[error("no PubMed IDs recorded for {0}")]
    EmptyMentions(String),

    #[error("no per-paper mention count for PubMed ID {0}")]
    MissingPaperCount(Pmid),

    #[error("OBO line {line_no}: {message}")]
    Obo { line_no: usize, message: String },
}

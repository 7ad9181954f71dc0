use thiserror::Error;

/// Errors surfaced by index construction and query evaluation.
#[derive(Error, Debug)]
pub enum IndexError {
    /// The term has no postings list. Query evaluation recovers from
    /// this locally (an AND over a missing term is empty), it is not
    /// a hard failure.
    #[error("term not found: {0}")]
    TermNotFound(String),

    /// A skip link violated the forward-only invariant. This signals
    /// a bug in skip construction and must never be swallowed.
    #[error("malformed skip list: link from {from} to {to} (len {len})")]
    MalformedSkipList { from: usize, to: usize, len: usize },

    /// A corpus line did not match the `doc_id \t body` layout.
    #[error("malformed corpus line: {0:?}")]
    MalformedLine(String),
}

pub type Result<T> = std::result::Result<T, IndexError>;

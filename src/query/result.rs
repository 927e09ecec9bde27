// Query Result Types
//
// Errors surfaced while pulling features through a cursor chain.

use thiserror::Error;

use crate::cql::SyntaxError;
use crate::filter::EvaluationError;

/// Errors that can occur during query execution
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("{0}")]
    Syntax(#[from] SyntaxError),

    #[error("Cursor exhausted")]
    Exhausted,

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

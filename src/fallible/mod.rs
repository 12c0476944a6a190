//! Errors
//!
//! There are two kinds of errors. A [``MountError``] is a configuration error
//! and happens while the schema is assembled at boot. It is fatal: the host
//! application has to fix its mount call.
//!
//! Everything that goes wrong while a request is executed is turned into a
//! GraphQL error with a ``code`` extension (see [``UserError``]), so a client can
//! match on it instead of parsing the message.
mod errors;

pub use errors::*;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MountError {
    /// an operation in ``operations``, ``only`` or ``skip`` does not exist
    #[error("{operation} is not a valid operation, known operations are: {}", known.join(", "))]
    UnknownOperation {
        operation: String,
        known: Vec<String>,
    },
    /// ``only`` and ``skip`` were both given for the same mount
    #[error("only and skip cannot be used at the same time (only: {}; skip: {})", only.join(", "), skip.join(", "))]
    ConflictingFilters { only: Vec<String>, skip: Vec<String> },
}

//! Operational errors returned by the store façade.
//!
//! Unlike definition errors, every kind here is an expected runtime
//! condition the caller reacts to. Each failure wraps exactly one remote
//! outcome with the table it concerns and the original error text; nothing
//! is swallowed or wrapped generically.

use crate::codec::AttrError;
use crate::store::client::RemoteError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("failed to initialize table {table}: {reason}")]
    InitFailed { table: String, reason: String },

    #[error("table {table} reported a status that is unknown: {status}")]
    TableStatusUnknown { table: String, status: String },

    #[error("failed to destroy table {table}: {source}")]
    DestroyFailed { table: String, source: RemoteError },

    #[error("failed to delete record in table {table}: {source}")]
    DeleteFailed { table: String, source: RemoteError },

    #[error("failed to save record in table {table}: {source}")]
    SaveFailed { table: String, source: RemoteError },

    #[error("failed to update record in table {table}: {source}")]
    UpdateFailed { table: String, source: RemoteError },

    #[error("failed to lookup record in table {table}: {source}")]
    LookupFailed { table: String, source: RemoteError },

    /// The remote store rejected a conditional write because the expected
    /// prior state did not hold.
    #[error("conditional check failed")]
    ConditionalCheckFailed,

    #[error("record wasnt found")]
    RecordNotFound,

    #[error("attribute {0} not found")]
    AttributeNotFound(String),

    #[error("attribute {attribute} has unexpected value: {value}")]
    AttributeValueInvalid { attribute: String, value: String },
}

impl From<AttrError> for StoreError {
    fn from(err: AttrError) -> Self {
        match err {
            AttrError::NotFound(attribute) => StoreError::AttributeNotFound(attribute),
            AttrError::Invalid { attribute, value } => {
                StoreError::AttributeValueInvalid { attribute, value }
            }
        }
    }
}

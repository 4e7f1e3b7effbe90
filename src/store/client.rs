//! The remote store client boundary.
//!
//! The store façade never talks to the network itself; it delegates every
//! operation to a [`RemoteClient`] implementation. The AWS-backed
//! implementation lives in [`crate::store::dynamo`]; tests substitute an
//! in-memory one.

use crate::schema::TableDescriptor;
use crate::wire::{Comparison, Item, ItemKey, WireAttribute};
use async_trait::async_trait;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Service error code reported for a rejected conditional write.
pub const CONDITIONAL_CHECK_FAILED: &str = "ConditionalCheckFailedException";

/// Service error code reported for a missing table.
pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";

/// An error reported by the remote store, normalized to the service's
/// error code plus its message text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct RemoteError {
    pub code: String,
    pub message: String,
}

impl RemoteError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        RemoteError {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Whether this error is the distinguished conditional-write rejection.
    /// Some transports surface the code only as a message prefix, so both
    /// are accepted.
    pub fn is_conditional_check_failed(&self) -> bool {
        self.code == CONDITIONAL_CHECK_FAILED || self.message.starts_with(CONDITIONAL_CHECK_FAILED)
    }

    /// Whether this error reports a missing table or item resource.
    pub fn is_not_found(&self) -> bool {
        self.code == RESOURCE_NOT_FOUND || self.message.starts_with(RESOURCE_NOT_FOUND)
    }
}

/// Lifecycle state of a remote table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableStatus {
    Creating,
    Active,
    Deleting,
    Updating,
    Unknown(String),
}

impl Display for TableStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TableStatus::Creating => f.write_str("CREATING"),
            TableStatus::Active => f.write_str("ACTIVE"),
            TableStatus::Deleting => f.write_str("DELETING"),
            TableStatus::Updating => f.write_str("UPDATING"),
            TableStatus::Unknown(status) => f.write_str(status),
        }
    }
}

/// Contract of the remote wide-column store.
///
/// Each method is one remote round trip. `expected` parameters are
/// optimistic-concurrency preconditions: the store rejects the call
/// atomically with [`CONDITIONAL_CHECK_FAILED`] when the expected prior
/// state does not hold.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn list_tables(&self) -> Result<Vec<String>, RemoteError>;

    async fn create_table(&self, descriptor: &TableDescriptor) -> Result<TableStatus, RemoteError>;

    async fn describe_table(&self, table: &str) -> Result<TableStatus, RemoteError>;

    async fn delete_table(&self, table: &str) -> Result<(), RemoteError>;

    async fn put_item(
        &self,
        table: &str,
        attributes: &[WireAttribute],
        expected: Option<&[WireAttribute]>,
    ) -> Result<(), RemoteError>;

    async fn get_item(&self, table: &str, key: &ItemKey) -> Result<Option<Item>, RemoteError>;

    async fn update_item(
        &self,
        table: &str,
        key: &ItemKey,
        attributes: &[WireAttribute],
        expected: Option<&[WireAttribute]>,
    ) -> Result<(), RemoteError>;

    async fn delete_item(
        &self,
        table: &str,
        key: &ItemKey,
        expected: Option<&[WireAttribute]>,
    ) -> Result<(), RemoteError>;

    async fn query(
        &self,
        table: &str,
        index_name: Option<&str>,
        conditions: &[Comparison],
    ) -> Result<Vec<Item>, RemoteError>;

    /// One page of one scan segment. Returns the page's items and, when the
    /// scan is not exhausted, the raw attribute map to resume from.
    async fn scan_segment(
        &self,
        table: &str,
        conditions: &[Comparison],
        start_key: Option<&ItemKey>,
        segment: usize,
        total_segments: usize,
        limit: i64,
    ) -> Result<(Vec<Item>, Option<Item>), RemoteError>;
}

//! Definition-time errors.
//!
//! Every variant reports a programmer mistake in a table description:
//! duplicate names, illegal key compositions, projection violations, bad
//! throughput values. Any of them aborts the whole
//! [`describe`](crate::schema::describe) call — there is no partial table
//! descriptor.

use crate::schema::attr::NativeKind;
use crate::schema::index::KeyRole;
use crate::wire::WireType;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("incorrect table definition: duplicate attr name {0}")]
    DuplicateAttribute(String),

    #[error("incorrect table definition: duplicate {kind} index name {name}")]
    DuplicateIndex { kind: &'static str, name: String },

    #[error(
        "incorrect table definition: index name {0} is illegal, length must be between 4 and 255"
    )]
    IllegalIndexName(String),

    #[error("incorrect table definition: duplicate index key {0} attribute")]
    DuplicateKeyRole(KeyRole),

    #[error("incorrect table definition: an index key schema holds at most two entries")]
    TooManyKeys,

    #[error("incorrect table definition: unsupported index key attribute type for {attribute}")]
    UnsupportedKeyType { attribute: String },

    #[error("incorrect table definition: attribute {0} was not declared as a key attribute")]
    NotAKeyAttribute(String),

    #[error(
        "incorrect table definition: projection cant include more than 20 non-key attributes"
    )]
    ProjectionTooLarge,

    #[error(
        "incorrect table definition: projection cant include key attribute {0} in non-key attr list"
    )]
    ProjectionKeyOverlap(String),

    #[error(
        "incorrect table definition: projection cant include duplicate attribute {0} in non-key attr list"
    )]
    ProjectionDuplicate(String),

    #[error(
        "incorrect table definition: provisioned throughput {what} capacity cant be less than 1, got {value}"
    )]
    InvalidThroughput { what: &'static str, value: i64 },

    #[error("incorrect table definition: primary key has no hash attribute")]
    MissingHashKey,

    #[error(
        "incorrect table definition: attribute {attribute} is declared as {declared} but requires {requested}"
    )]
    TypeConflict {
        attribute: String,
        declared: WireType,
        requested: WireType,
    },

    #[error(
        "incorrect table definition: attribute {attribute} was already specialized as {existing}, cannot respecialize as {requested}"
    )]
    Respecialized {
        attribute: String,
        existing: NativeKind,
        requested: NativeKind,
    },

    #[error("incorrect key usage: expected key attributes [{expected}], got [{got}]")]
    KeyMismatch { expected: String, got: String },
}

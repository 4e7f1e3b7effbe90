//! Declarative table descriptions.
//!
//! A table's shape — attributes, primary key, secondary indexes, throughput,
//! projections — is declared once inside a description callback and frozen
//! into an immutable [`TableDescriptor`]. All structural invariants are
//! enforced while the description runs, before any network call: mistakes
//! are cheap to catch here and expensive (a remote-service error, billable
//! and slow) to discover during provisioning.
//!
//! # Example
//!
//! ```rust,ignore
//! use dynatable::schema;
//! use dynatable::wire::WireType;
//!
//! let descriptor = schema::describe("Threads", |t| {
//!     let forum_name = t.key_attr("ForumName", WireType::String)?;
//!     let created = t.key_attr("Created", WireType::Number)?;
//!     let subject = t.non_key_attr("Subject", WireType::String)?;
//!
//!     let pk = t.primary_key();
//!     pk.hash(&forum_name)?;
//!     pk.range(&created)?;
//!
//!     let throughput = t.provisioned_throughput();
//!     throughput.read_capacity(1)?;
//!     throughput.write_capacity(1)?;
//!     Ok(())
//! })?;
//! ```
//!
//! Construction is a single synchronous pass with no suspension points; the
//! handles handed to the callback ([`Table`], [`Attr`], index builders) all
//! point into one shared definition state and are only meaningful while the
//! description runs. The frozen descriptor is a plain value.

use std::cell::RefCell;
use std::rc::Rc;

pub mod attr;
pub mod descriptor;
pub mod error;
pub mod index;

pub use attr::{
    Attr, BinaryAttr, BinarySetAttr, BoolAttr, F32Attr, F64Attr, I32Attr, I64Attr, NativeKind,
    NumberSetAttr, StringAttr, StringSetAttr, TimestampAttr, TimestampNanosAttr,
};
pub use descriptor::{
    AttributeDefinition, IndexDescriptor, KeyElement, ProjectionDescriptor, QueryableIndex,
    TableDescriptor,
};
pub use error::DefinitionError;
pub use index::{
    GlobalIndex, KeyRole, LocalIndex, PrimaryKey, Projection, ProvisionedThroughput, Throughput,
};

use crate::wire::WireType;
use attr::AttrRecord;
use index::{IndexState, KeySchemaEntry};

/// The whole under-construction definition. Every handle given to the
/// description callback points at this one value; an attribute
/// specialization is a single write here, visible to all handle holders.
pub(crate) struct TableState {
    pub name: String,
    pub attrs: Vec<AttrRecord>,
    pub primary_key: Vec<KeySchemaEntry>,
    pub throughput: Option<Throughput>,
    pub local_indexes: Vec<IndexState>,
    pub global_indexes: Vec<IndexState>,
}

pub(crate) type Shared = Rc<RefCell<TableState>>;

/// Executes a description callback against a fresh table definition and
/// freezes the result.
///
/// This is the sole entry point: any invariant violation fails the whole
/// construction via the callback's `?` channel, so no half-built table can
/// escape.
pub fn describe(
    name: &str,
    definitions: impl FnOnce(&Table) -> Result<(), DefinitionError>,
) -> Result<TableDescriptor, DefinitionError> {
    let table = Table {
        state: Rc::new(RefCell::new(TableState {
            name: name.to_string(),
            attrs: Vec::new(),
            primary_key: Vec::new(),
            throughput: None,
            local_indexes: Vec::new(),
            global_indexes: Vec::new(),
        })),
    };
    definitions(&table)?;
    descriptor::freeze(&table.state.borrow())
}

/// Builder handle for one table definition, passed to the
/// [`describe`] callback.
pub struct Table {
    state: Shared,
}

impl Table {
    /// Claims a unique attribute name that participates in key schemas.
    ///
    /// Key attributes are registered in the table-level attribute-definition
    /// list, as the wire schema requires for every key-schema attribute. The
    /// wire type may be left unset (`None`) and pinned later by the first
    /// typed specialization.
    pub fn key_attr(
        &self,
        name: &str,
        wire_type: impl Into<Option<WireType>>,
    ) -> Result<Attr, DefinitionError> {
        self.add_attr(name, wire_type.into(), true)
    }

    /// Claims a unique attribute name for an item payload field that is
    /// never used as a key. Purely a typed accessor; not registered in the
    /// attribute-definition list.
    pub fn non_key_attr(
        &self,
        name: &str,
        wire_type: impl Into<Option<WireType>>,
    ) -> Result<Attr, DefinitionError> {
        self.add_attr(name, wire_type.into(), false)
    }

    fn add_attr(
        &self,
        name: &str,
        wire_type: Option<WireType>,
        key_attr: bool,
    ) -> Result<Attr, DefinitionError> {
        let mut state = self.state.borrow_mut();
        if state.attrs.iter().any(|a| a.name == name) {
            return Err(DefinitionError::DuplicateAttribute(name.to_string()));
        }
        state.attrs.push(AttrRecord {
            name: name.to_string(),
            wire_type,
            native: None,
            key_attr,
        });
        let idx = state.attrs.len() - 1;
        drop(state);
        Ok(Attr::new(self.state.clone(), idx))
    }

    /// The table's primary key, an unnamed index with no projection.
    pub fn primary_key(&self) -> PrimaryKey {
        PrimaryKey::new(self.state.clone())
    }

    /// Declares a local secondary index with the given name.
    pub fn local_index(&self, name: &str) -> Result<LocalIndex, DefinitionError> {
        check_index_name(name)?;
        let mut state = self.state.borrow_mut();
        if state.local_indexes.iter().any(|i| i.name == name) {
            return Err(DefinitionError::DuplicateIndex {
                kind: "local",
                name: name.to_string(),
            });
        }
        state.local_indexes.push(IndexState::new(name));
        let idx = state.local_indexes.len() - 1;
        drop(state);
        Ok(LocalIndex::new(self.state.clone(), idx))
    }

    /// Declares a global secondary index with the given name.
    pub fn global_index(&self, name: &str) -> Result<GlobalIndex, DefinitionError> {
        check_index_name(name)?;
        let mut state = self.state.borrow_mut();
        if state.global_indexes.iter().any(|i| i.name == name) {
            return Err(DefinitionError::DuplicateIndex {
                kind: "global",
                name: name.to_string(),
            });
        }
        state.global_indexes.push(IndexState::new(name));
        let idx = state.global_indexes.len() - 1;
        drop(state);
        Ok(GlobalIndex::new(self.state.clone(), idx))
    }

    /// The table-level throughput settings.
    pub fn provisioned_throughput(&self) -> ProvisionedThroughput {
        ProvisionedThroughput::table(self.state.clone())
    }
}

fn check_index_name(name: &str) -> Result<(), DefinitionError> {
    if name.len() > 3 && name.len() <= 255 {
        Ok(())
    } else {
        Err(DefinitionError::IllegalIndexName(name.to_string()))
    }
}

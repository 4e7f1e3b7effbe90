//! Key schemas, secondary indexes, projections and throughput settings.
//!
//! All invariants here are enforced while the description callback runs:
//! at most one Hash and one Range entry per key schema, scalar-typed key
//! attributes only, projection size and disjointness limits, capacity
//! bounds. Nothing in this module performs I/O.

use crate::schema::attr::Attr;
use crate::schema::error::DefinitionError;
use crate::schema::Shared;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A key schema holds at most this many entries (one Hash, one Range).
pub const MAX_INDEX_KEYS: usize = 2;

/// A projection covers at most this many attributes, key-schema entries
/// included.
pub const PROJECTION_NON_KEY_ATTR_LIMIT: usize = 20;

/// Capacity applied when a table or global index leaves throughput unset.
pub const DEFAULT_READ_CAPACITY: i64 = 1;
pub const DEFAULT_WRITE_CAPACITY: i64 = 1;

/// The role a key attribute holds: hash determines item placement, range
/// orders items sharing a hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyRole {
    #[serde(rename = "HASH")]
    Hash,
    #[serde(rename = "RANGE")]
    Range,
}

impl Display for KeyRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            KeyRole::Hash => "HASH",
            KeyRole::Range => "RANGE",
        })
    }
}

/// Read/write capacity a table or global index reserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Throughput {
    pub read: i64,
    pub write: i64,
}

impl Default for Throughput {
    fn default() -> Self {
        Throughput {
            read: DEFAULT_READ_CAPACITY,
            write: DEFAULT_WRITE_CAPACITY,
        }
    }
}

/// One key-schema entry: an arena slot plus its role.
pub(crate) struct KeySchemaEntry {
    pub attr: usize,
    pub role: KeyRole,
}

pub(crate) enum ProjectionState {
    Unset,
    All,
    KeysOnly,
    Include(Vec<String>),
}

/// Under-construction secondary index.
pub(crate) struct IndexState {
    pub name: String,
    pub key_schema: Vec<KeySchemaEntry>,
    pub projection: ProjectionState,
    pub throughput: Option<Throughput>,
}

impl IndexState {
    pub fn new(name: &str) -> Self {
        IndexState {
            name: name.to_string(),
            key_schema: Vec::new(),
            projection: ProjectionState::Unset,
            throughput: None,
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) enum IndexSlot {
    Local(usize),
    Global(usize),
}

#[derive(Clone, Copy)]
enum KeySlot {
    Primary,
    Index(IndexSlot),
}

fn try_add_key(
    state: &Shared,
    slot: KeySlot,
    role: KeyRole,
    attr: &Attr,
) -> Result<(), DefinitionError> {
    assert!(
        attr.same_table(state),
        "definition error: attribute belongs to a different table definition"
    );
    let mut guard = state.borrow_mut();
    let state = &mut *guard;
    let record = &state.attrs[attr.index()];
    let (name, wire_type, key_attr) = (record.name.clone(), record.wire_type, record.key_attr);

    let key_schema = match slot {
        KeySlot::Primary => &mut state.primary_key,
        KeySlot::Index(IndexSlot::Local(i)) => &mut state.local_indexes[i].key_schema,
        KeySlot::Index(IndexSlot::Global(i)) => &mut state.global_indexes[i].key_schema,
    };
    if key_schema.len() >= MAX_INDEX_KEYS {
        return Err(DefinitionError::TooManyKeys);
    }
    if key_schema.iter().any(|entry| entry.role == role) {
        return Err(DefinitionError::DuplicateKeyRole(role));
    }
    if !key_attr {
        return Err(DefinitionError::NotAKeyAttribute(name));
    }
    match wire_type {
        Some(wire_type) if wire_type.is_scalar() => {}
        _ => return Err(DefinitionError::UnsupportedKeyType { attribute: name }),
    }
    key_schema.push(KeySchemaEntry {
        attr: attr.index(),
        role,
    });
    Ok(())
}

/// Builder handle for the table's primary key: an index with no name and
/// no projection.
pub struct PrimaryKey {
    state: Shared,
}

impl PrimaryKey {
    pub(crate) fn new(state: Shared) -> Self {
        PrimaryKey { state }
    }

    pub fn hash(&self, attr: &Attr) -> Result<(), DefinitionError> {
        try_add_key(&self.state, KeySlot::Primary, KeyRole::Hash, attr)
    }

    pub fn range(&self, attr: &Attr) -> Result<(), DefinitionError> {
        try_add_key(&self.state, KeySlot::Primary, KeyRole::Range, attr)
    }
}

/// Builder handle for a local secondary index.
pub struct LocalIndex {
    state: Shared,
    idx: usize,
}

impl LocalIndex {
    pub(crate) fn new(state: Shared, idx: usize) -> Self {
        LocalIndex { state, idx }
    }

    pub fn hash(&self, attr: &Attr) -> Result<(), DefinitionError> {
        try_add_key(
            &self.state,
            KeySlot::Index(IndexSlot::Local(self.idx)),
            KeyRole::Hash,
            attr,
        )
    }

    pub fn range(&self, attr: &Attr) -> Result<(), DefinitionError> {
        try_add_key(
            &self.state,
            KeySlot::Index(IndexSlot::Local(self.idx)),
            KeyRole::Range,
            attr,
        )
    }

    pub fn projection(&self) -> Projection {
        Projection {
            state: self.state.clone(),
            slot: IndexSlot::Local(self.idx),
        }
    }
}

/// Builder handle for a global secondary index, which additionally owns
/// its own throughput.
pub struct GlobalIndex {
    state: Shared,
    idx: usize,
}

impl GlobalIndex {
    pub(crate) fn new(state: Shared, idx: usize) -> Self {
        GlobalIndex { state, idx }
    }

    pub fn hash(&self, attr: &Attr) -> Result<(), DefinitionError> {
        try_add_key(
            &self.state,
            KeySlot::Index(IndexSlot::Global(self.idx)),
            KeyRole::Hash,
            attr,
        )
    }

    pub fn range(&self, attr: &Attr) -> Result<(), DefinitionError> {
        try_add_key(
            &self.state,
            KeySlot::Index(IndexSlot::Global(self.idx)),
            KeyRole::Range,
            attr,
        )
    }

    pub fn projection(&self) -> Projection {
        Projection {
            state: self.state.clone(),
            slot: IndexSlot::Global(self.idx),
        }
    }

    pub fn provisioned_throughput(&self) -> ProvisionedThroughput {
        ProvisionedThroughput {
            state: self.state.clone(),
            slot: Some(self.idx),
        }
    }
}

/// Declares which non-key attributes a secondary index copies.
pub struct Projection {
    state: Shared,
    slot: IndexSlot,
}

impl Projection {
    fn set_mode(&self, projection: ProjectionState) {
        let mut state = self.state.borrow_mut();
        let index = match self.slot {
            IndexSlot::Local(i) => &mut state.local_indexes[i],
            IndexSlot::Global(i) => &mut state.global_indexes[i],
        };
        index.projection = projection;
    }

    /// The index copies every attribute.
    pub fn all(&self) {
        self.set_mode(ProjectionState::All);
    }

    /// The index copies only its key attributes.
    pub fn keys_only(&self) {
        self.set_mode(ProjectionState::KeysOnly);
    }

    /// The index copies the given non-key attributes alongside its keys.
    ///
    /// Repeated calls accumulate. Fails when the total attribute count
    /// (included non-key plus key-schema entries) would exceed
    /// [`PROJECTION_NON_KEY_ATTR_LIMIT`], when an attribute is part of the
    /// owning key schema, or when an attribute is included twice.
    pub fn include(&self, attrs: &[&Attr]) -> Result<(), DefinitionError> {
        for attr in attrs {
            assert!(
                attr.same_table(&self.state),
                "definition error: attribute belongs to a different table definition"
            );
        }
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let names: Vec<String> = attrs
            .iter()
            .map(|attr| state.attrs[attr.index()].name.clone())
            .collect();

        let index = match self.slot {
            IndexSlot::Local(i) => &state.local_indexes[i],
            IndexSlot::Global(i) => &state.global_indexes[i],
        };
        let key_names: Vec<String> = index
            .key_schema
            .iter()
            .map(|entry| state.attrs[entry.attr].name.clone())
            .collect();
        let mut included = match &index.projection {
            ProjectionState::Include(existing) => existing.clone(),
            _ => Vec::new(),
        };
        if included.len() + names.len() + key_names.len() > PROJECTION_NON_KEY_ATTR_LIMIT {
            return Err(DefinitionError::ProjectionTooLarge);
        }
        for name in names {
            if key_names.contains(&name) {
                return Err(DefinitionError::ProjectionKeyOverlap(name));
            }
            if included.contains(&name) {
                return Err(DefinitionError::ProjectionDuplicate(name));
            }
            included.push(name);
        }

        let index = match self.slot {
            IndexSlot::Local(i) => &mut state.local_indexes[i],
            IndexSlot::Global(i) => &mut state.global_indexes[i],
        };
        index.projection = ProjectionState::Include(included);
        Ok(())
    }
}

/// Throughput settings for the table (slot `None`) or one global index.
pub struct ProvisionedThroughput {
    state: Shared,
    slot: Option<usize>,
}

impl ProvisionedThroughput {
    pub(crate) fn table(state: Shared) -> Self {
        ProvisionedThroughput { state, slot: None }
    }

    pub fn read_capacity(&self, capacity: i64) -> Result<(), DefinitionError> {
        if capacity < 1 {
            return Err(DefinitionError::InvalidThroughput {
                what: "read",
                value: capacity,
            });
        }
        self.slot_mut(|throughput| throughput.read = capacity);
        Ok(())
    }

    pub fn write_capacity(&self, capacity: i64) -> Result<(), DefinitionError> {
        if capacity < 1 {
            return Err(DefinitionError::InvalidThroughput {
                what: "write",
                value: capacity,
            });
        }
        self.slot_mut(|throughput| throughput.write = capacity);
        Ok(())
    }

    fn slot_mut(&self, apply: impl FnOnce(&mut Throughput)) {
        let mut state = self.state.borrow_mut();
        let slot = match self.slot {
            None => &mut state.throughput,
            Some(i) => &mut state.global_indexes[i].throughput,
        };
        apply(slot.get_or_insert_with(Throughput::default));
    }
}

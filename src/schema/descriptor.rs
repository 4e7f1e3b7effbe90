//! The frozen result of a table description.
//!
//! [`TableDescriptor`] is a plain immutable value: once
//! [`describe`](crate::schema::describe) returns there is no further
//! mutation path. The mutable builder handles live only inside the
//! description callback; afterwards the descriptor offers read-only
//! [`QueryableIndex`] views for query construction and a key factory for
//! concrete lookups.

use crate::schema::error::DefinitionError;
use crate::schema::index::{KeyRole, ProjectionState, Throughput};
use crate::schema::TableState;
use crate::wire::{Comparison, ItemKey, Query, WireAttribute, WireType};
use serde::Serialize;

/// A named attribute with its pinned wire type, as registered in the
/// table-level attribute-definition list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeDefinition {
    pub name: String,
    pub wire_type: WireType,
}

/// One entry of a frozen key schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyElement {
    pub attribute: String,
    pub role: KeyRole,
}

/// Which attributes a secondary index copies alongside its keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ProjectionDescriptor {
    All,
    KeysOnly,
    Include(Vec<String>),
}

impl ProjectionDescriptor {
    /// The included non-key attribute names; empty for `All` and
    /// `KeysOnly`.
    pub fn non_key_attributes(&self) -> &[String] {
        match self {
            ProjectionDescriptor::Include(names) => names,
            _ => &[],
        }
    }
}

/// A frozen index: the primary key (no name, no projection) or a
/// secondary index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexDescriptor {
    name: Option<String>,
    key_schema: Vec<KeyElement>,
    projection: Option<ProjectionDescriptor>,
    throughput: Option<Throughput>,
}

impl IndexDescriptor {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn key_schema(&self) -> &[KeyElement] {
        &self.key_schema
    }

    pub fn projection(&self) -> Option<&ProjectionDescriptor> {
        self.projection.as_ref()
    }

    pub fn throughput(&self) -> Option<Throughput> {
        self.throughput
    }

    /// The element holding the given role, if present.
    pub fn key_element(&self, role: KeyRole) -> Option<&KeyElement> {
        self.key_schema.iter().find(|element| element.role == role)
    }
}

/// The complete, validated shape of one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDescriptor {
    name: String,
    attribute_definitions: Vec<AttributeDefinition>,
    primary_key: IndexDescriptor,
    local_secondary_indexes: Vec<IndexDescriptor>,
    global_secondary_indexes: Vec<IndexDescriptor>,
    throughput: Throughput,
}

impl TableDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute_definitions(&self) -> &[AttributeDefinition] {
        &self.attribute_definitions
    }

    pub fn primary_key(&self) -> &IndexDescriptor {
        &self.primary_key
    }

    pub fn local_secondary_indexes(&self) -> &[IndexDescriptor] {
        &self.local_secondary_indexes
    }

    pub fn global_secondary_indexes(&self) -> &[IndexDescriptor] {
        &self.global_secondary_indexes
    }

    pub fn throughput(&self) -> Throughput {
        self.throughput
    }

    /// Read-only query view over the primary key.
    pub fn primary_index(&self) -> QueryableIndex<'_> {
        QueryableIndex {
            table: &self.name,
            index: &self.primary_key,
        }
    }

    /// Read-only query view over the named local secondary index.
    pub fn local_index(&self, name: &str) -> Option<QueryableIndex<'_>> {
        self.local_secondary_indexes
            .iter()
            .find(|index| index.name() == Some(name))
            .map(|index| QueryableIndex {
                table: &self.name,
                index,
            })
    }

    /// Read-only query view over the named global secondary index.
    pub fn global_index(&self, name: &str) -> Option<QueryableIndex<'_>> {
        self.global_secondary_indexes
            .iter()
            .find(|index| index.name() == Some(name))
            .map(|index| QueryableIndex {
                table: &self.name,
                index,
            })
    }

    /// Builds a concrete lookup key from primary-key attribute values.
    ///
    /// The supplied attributes must match the primary key's hash (and, if
    /// defined, range) attribute names exactly — this is checked at call
    /// time because key values only exist at call time.
    pub fn key(&self, parts: &[WireAttribute]) -> Result<ItemKey, DefinitionError> {
        let hash_name = &self
            .primary_key
            .key_element(KeyRole::Hash)
            .ok_or(DefinitionError::MissingHashKey)?
            .attribute;
        let range_name = self
            .primary_key
            .key_element(KeyRole::Range)
            .map(|element| &element.attribute);

        let mismatch = || {
            let mut expected = hash_name.clone();
            if let Some(range) = range_name {
                expected.push_str(", ");
                expected.push_str(range);
            }
            DefinitionError::KeyMismatch {
                expected,
                got: parts
                    .iter()
                    .map(|part| part.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            }
        };

        let hash = parts
            .iter()
            .find(|part| part.name == *hash_name)
            .cloned()
            .ok_or_else(mismatch)?;
        let range = match range_name {
            Some(range_name) => Some(
                parts
                    .iter()
                    .find(|part| part.name == *range_name)
                    .cloned()
                    .ok_or_else(mismatch)?,
            ),
            None => None,
        };
        let expected_len = 1 + usize::from(range.is_some());
        if parts.len() != expected_len {
            return Err(mismatch());
        }
        Ok(ItemKey { hash, range })
    }
}

/// Immutable query builder over one index of a frozen descriptor.
///
/// Builds query descriptions only; execution belongs to the store façade
/// and its remote client.
#[derive(Debug, Clone, Copy)]
pub struct QueryableIndex<'a> {
    table: &'a str,
    index: &'a IndexDescriptor,
}

impl<'a> QueryableIndex<'a> {
    pub fn table(&self) -> &str {
        self.table
    }

    pub fn name(&self) -> Option<&str> {
        self.index.name()
    }

    pub fn key_schema(&self) -> &'a [KeyElement] {
        self.index.key_schema()
    }

    /// Builds a query scoped to this index. Secondary indexes carry their
    /// name as a qualifier; the bare primary key does not.
    pub fn query(&self, conditions: impl IntoIterator<Item = Comparison>) -> Query {
        Query {
            table: self.table.to_string(),
            index_name: self.index.name().map(str::to_string),
            conditions: conditions.into_iter().collect(),
        }
    }
}

/// Converts the builder state into the frozen descriptor, applying the
/// freeze-time checks and defaults.
pub(crate) fn freeze(state: &TableState) -> Result<TableDescriptor, DefinitionError> {
    if !state
        .primary_key
        .iter()
        .any(|entry| entry.role == KeyRole::Hash)
    {
        return Err(DefinitionError::MissingHashKey);
    }

    let key_elements = |entries: &[crate::schema::index::KeySchemaEntry]| {
        entries
            .iter()
            .map(|entry| KeyElement {
                attribute: state.attrs[entry.attr].name.clone(),
                role: entry.role,
            })
            .collect::<Vec<_>>()
    };
    let projection = |projection: &ProjectionState| match projection {
        ProjectionState::Unset | ProjectionState::All => ProjectionDescriptor::All,
        ProjectionState::KeysOnly => ProjectionDescriptor::KeysOnly,
        ProjectionState::Include(names) => ProjectionDescriptor::Include(names.clone()),
    };

    Ok(TableDescriptor {
        name: state.name.clone(),
        attribute_definitions: state
            .attrs
            .iter()
            .filter(|record| record.key_attr)
            .filter_map(|record| {
                record.wire_type.map(|wire_type| AttributeDefinition {
                    name: record.name.clone(),
                    wire_type,
                })
            })
            .collect(),
        primary_key: IndexDescriptor {
            name: None,
            key_schema: key_elements(&state.primary_key),
            projection: None,
            throughput: None,
        },
        local_secondary_indexes: state
            .local_indexes
            .iter()
            .map(|index| IndexDescriptor {
                name: Some(index.name.clone()),
                key_schema: key_elements(&index.key_schema),
                projection: Some(projection(&index.projection)),
                throughput: None,
            })
            .collect(),
        global_secondary_indexes: state
            .global_indexes
            .iter()
            .map(|index| IndexDescriptor {
                name: Some(index.name.clone()),
                key_schema: key_elements(&index.key_schema),
                projection: Some(projection(&index.projection)),
                throughput: Some(index.throughput.unwrap_or_default()),
            })
            .collect(),
        throughput: state.throughput.unwrap_or_default(),
    })
}

//! Tagged wire-value model shared by the schema builder, the codec and the
//! store façade.
//!
//! The remote store transmits every attribute as a loosely typed pair of a
//! type tag and one or more strings. Instead of re-deriving the tag from ad
//! hoc comparisons at each call site, the tag travels with the payload as an
//! explicit tagged value: [`WireAttribute`] carries the attribute name, its
//! [`WireType`] and a [`WireValue`] that is either a single string or a list
//! of strings (for the set-typed variants).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// The wire-level type tag of an attribute value.
///
/// Every native kind (bool, integers, floats, timestamps, blobs, strings)
/// maps onto exactly one of the three scalar tags; the set variants carry
/// multiple values under one name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireType {
    #[serde(rename = "S")]
    String,
    #[serde(rename = "N")]
    Number,
    #[serde(rename = "B")]
    Binary,
    #[serde(rename = "SS")]
    StringSet,
    #[serde(rename = "NS")]
    NumberSet,
    #[serde(rename = "BS")]
    BinarySet,
}

impl WireType {
    /// Whether this tag is one of the set variants.
    pub fn is_set(self) -> bool {
        matches!(
            self,
            WireType::StringSet | WireType::NumberSet | WireType::BinarySet
        )
    }

    /// Whether this tag is a scalar, i.e. acceptable in a key schema.
    pub fn is_scalar(self) -> bool {
        !self.is_set()
    }

    /// The short tag used on the wire.
    pub fn tag(self) -> &'static str {
        match self {
            WireType::String => "S",
            WireType::Number => "N",
            WireType::Binary => "B",
            WireType::StringSet => "SS",
            WireType::NumberSet => "NS",
            WireType::BinarySet => "BS",
        }
    }
}

impl Display for WireType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// The payload of a wire attribute: one string for scalar tags, a list of
/// strings for set tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireValue {
    #[serde(rename = "value")]
    Single(String),
    #[serde(rename = "values")]
    Set(Vec<String>),
}

/// A named, typed value as the remote store sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireAttribute {
    pub name: String,
    #[serde(rename = "type")]
    pub wire_type: WireType,
    #[serde(flatten)]
    pub value: WireValue,
}

impl WireAttribute {
    /// Builds a scalar attribute.
    pub fn scalar(name: impl Into<String>, wire_type: WireType, value: impl Into<String>) -> Self {
        WireAttribute {
            name: name.into(),
            wire_type,
            value: WireValue::Single(value.into()),
        }
    }

    /// Builds a set-valued attribute.
    pub fn set(name: impl Into<String>, wire_type: WireType, values: Vec<String>) -> Self {
        WireAttribute {
            name: name.into(),
            wire_type,
            value: WireValue::Set(values),
        }
    }

    /// The single string payload, when this is a scalar value.
    pub fn as_single(&self) -> Option<&str> {
        match &self.value {
            WireValue::Single(value) => Some(value),
            WireValue::Set(_) => None,
        }
    }

    /// The string list payload, when this is a set value.
    pub fn as_set(&self) -> Option<&[String]> {
        match &self.value {
            WireValue::Single(_) => None,
            WireValue::Set(values) => Some(values),
        }
    }
}

/// A full item as returned by the remote store: attribute name → wire value.
pub type Item = HashMap<String, WireAttribute>;

/// Collects wire attributes into an [`Item`], keyed by attribute name.
pub fn item_of(attributes: impl IntoIterator<Item = WireAttribute>) -> Item {
    attributes
        .into_iter()
        .map(|attr| (attr.name.clone(), attr))
        .collect()
}

/// A concrete primary-key value locating one item: the hash attribute plus,
/// for composite keys, the range attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemKey {
    pub hash: WireAttribute,
    pub range: Option<WireAttribute>,
}

impl ItemKey {
    /// The key's attributes, hash first.
    pub fn attributes(&self) -> impl Iterator<Item = &WireAttribute> {
        std::iter::once(&self.hash).chain(self.range.as_ref())
    }
}

/// Comparison operator usable in query and scan predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "EQ")]
    Equal,
    #[serde(rename = "NE")]
    NotEqual,
}

/// A single predicate: attribute, operator, comparison values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub attribute: String,
    pub op: CompareOp,
    pub values: Vec<WireAttribute>,
}

/// A query scoped to a table and, for secondary indexes, an index name.
///
/// This is a description of a lookup, not an executor; the store façade
/// hands it to the remote client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub table: String,
    pub index_name: Option<String>,
    pub conditions: Vec<Comparison>,
}

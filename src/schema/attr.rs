//! Attribute descriptors and their typed views.
//!
//! An [`Attr`] is a handle into the table definition's attribute arena: a
//! named slot whose wire type may still be unset. Requesting a typed view
//! (`as_bool`, `as_i64`, …) pins the slot's wire type with a single arena
//! write that every other holder of the handle observes, and yields a plain
//! immutable accessor that converts between the native kind and the wire
//! representation at runtime.
//!
//! A slot specializes at most once: asking for a second, different native
//! kind is a definition error rather than a silent last-write-wins.

use crate::codec::{self, AttrError};
use crate::schema::error::DefinitionError;
use crate::schema::Shared;
use crate::wire::{CompareOp, Comparison, Item, WireAttribute, WireType, WireValue};
use chrono::{DateTime, Utc};
use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// One attribute slot in the definition arena.
pub(crate) struct AttrRecord {
    pub name: String,
    pub wire_type: Option<WireType>,
    pub native: Option<NativeKind>,
    pub key_attr: bool,
}

/// The native kinds an attribute can specialize into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeKind {
    Bool,
    I32,
    I64,
    F32,
    F64,
    String,
    Binary,
    Timestamp,
    TimestampNanos,
    StringSet,
    NumberSet,
    BinarySet,
}

impl NativeKind {
    /// The wire type a specialization to this kind pins.
    pub fn wire_type(self) -> WireType {
        match self {
            NativeKind::Bool
            | NativeKind::I32
            | NativeKind::I64
            | NativeKind::F32
            | NativeKind::F64
            | NativeKind::Timestamp
            | NativeKind::TimestampNanos => WireType::Number,
            // Blobs travel as base64 text.
            NativeKind::String | NativeKind::Binary => WireType::String,
            NativeKind::StringSet => WireType::StringSet,
            NativeKind::NumberSet => WireType::NumberSet,
            NativeKind::BinarySet => WireType::BinarySet,
        }
    }
}

impl Display for NativeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            NativeKind::Bool => "bool",
            NativeKind::I32 => "i32",
            NativeKind::I64 => "i64",
            NativeKind::F32 => "f32",
            NativeKind::F64 => "f64",
            NativeKind::String => "string",
            NativeKind::Binary => "binary",
            NativeKind::Timestamp => "timestamp",
            NativeKind::TimestampNanos => "timestamp-nanos",
            NativeKind::StringSet => "string-set",
            NativeKind::NumberSet => "number-set",
            NativeKind::BinarySet => "binary-set",
        })
    }
}

/// Handle to one declared attribute.
///
/// Cheap to clone; every clone refers to the same arena slot. The handle is
/// tied to the definition it came from and is not `Send` — runtime code
/// should hold the typed views instead.
#[derive(Clone)]
pub struct Attr {
    state: Shared,
    idx: usize,
}

impl Attr {
    pub(crate) fn new(state: Shared, idx: usize) -> Self {
        Attr { state, idx }
    }

    pub(crate) fn same_table(&self, state: &Shared) -> bool {
        Rc::ptr_eq(&self.state, state)
    }

    pub(crate) fn index(&self) -> usize {
        self.idx
    }

    /// The attribute's name.
    pub fn name(&self) -> String {
        self.state.borrow().attrs[self.idx].name.clone()
    }

    /// The currently pinned wire type, if any.
    pub fn wire_type(&self) -> Option<WireType> {
        self.state.borrow().attrs[self.idx].wire_type
    }

    /// Builds a wire attribute from raw string values.
    ///
    /// Set-typed attributes accept any number of values and produce a set
    /// payload; scalar attributes require exactly one non-empty value.
    ///
    /// # Panics
    ///
    /// Panics when the attribute has no wire type yet, when a scalar
    /// attribute is given an empty value (the wire never carries empty
    /// strings; use the accessor layer's sentinel handling instead), or
    /// when a scalar attribute is given anything but exactly one value.
    /// These are definition mistakes, not runtime conditions.
    pub fn is(&self, values: &[&str]) -> WireAttribute {
        let (name, wire_type) = {
            let state = self.state.borrow();
            let record = &state.attrs[self.idx];
            let Some(wire_type) = record.wire_type else {
                panic!(
                    "definition error: attribute {} has no wire type yet",
                    record.name
                );
            };
            (record.name.clone(), wire_type)
        };
        if wire_type.is_set() {
            return WireAttribute::set(name, wire_type, values.iter().map(|v| v.to_string()).collect());
        }
        match values {
            [value] if !value.is_empty() => WireAttribute::scalar(name, wire_type, *value),
            [_] => panic!("definition error: empty value is not allowed for scalar attribute {name}"),
            _ => panic!("definition error: scalar attribute {name} expects exactly one value"),
        }
    }

    /// Builds an equality predicate for index queries.
    ///
    /// # Panics
    ///
    /// Same conditions as [`Attr::is`].
    pub fn equals(&self, value: &str) -> Comparison {
        self.compare(CompareOp::Equal, value)
    }

    /// Builds an inequality predicate for index queries.
    ///
    /// # Panics
    ///
    /// Same conditions as [`Attr::is`].
    pub fn not_equals(&self, value: &str) -> Comparison {
        self.compare(CompareOp::NotEqual, value)
    }

    fn compare(&self, op: CompareOp, value: &str) -> Comparison {
        let attr = self.is(&[value]);
        Comparison {
            attribute: attr.name.clone(),
            op,
            values: vec![attr],
        }
    }

    /// The raw wire string of this attribute in the given item.
    pub fn from(&self, item: &Item) -> Result<String, AttrError> {
        let name = self.name();
        match item.get(&name).map(|attr| &attr.value) {
            Some(WireValue::Single(value)) if !value.is_empty() => Ok(value.clone()),
            _ => Err(AttrError::NotFound(name)),
        }
    }

    fn specialize(&self, kind: NativeKind) -> Result<String, DefinitionError> {
        let mut state = self.state.borrow_mut();
        let record = &mut state.attrs[self.idx];
        if let Some(existing) = record.native {
            if existing == kind {
                return Ok(record.name.clone());
            }
            return Err(DefinitionError::Respecialized {
                attribute: record.name.clone(),
                existing,
                requested: kind,
            });
        }
        let required = kind.wire_type();
        match record.wire_type {
            None => record.wire_type = Some(required),
            Some(declared) if declared == required => {}
            Some(declared) => {
                return Err(DefinitionError::TypeConflict {
                    attribute: record.name.clone(),
                    declared,
                    requested: required,
                });
            }
        }
        record.native = Some(kind);
        Ok(record.name.clone())
    }

    pub fn as_bool(&self) -> Result<BoolAttr, DefinitionError> {
        Ok(BoolAttr { name: self.specialize(NativeKind::Bool)? })
    }

    pub fn as_i32(&self) -> Result<I32Attr, DefinitionError> {
        Ok(I32Attr { name: self.specialize(NativeKind::I32)? })
    }

    pub fn as_i64(&self) -> Result<I64Attr, DefinitionError> {
        Ok(I64Attr { name: self.specialize(NativeKind::I64)? })
    }

    pub fn as_f32(&self) -> Result<F32Attr, DefinitionError> {
        Ok(F32Attr { name: self.specialize(NativeKind::F32)? })
    }

    pub fn as_f64(&self) -> Result<F64Attr, DefinitionError> {
        Ok(F64Attr { name: self.specialize(NativeKind::F64)? })
    }

    pub fn as_string(&self) -> Result<StringAttr, DefinitionError> {
        Ok(StringAttr { name: self.specialize(NativeKind::String)? })
    }

    pub fn as_binary(&self) -> Result<BinaryAttr, DefinitionError> {
        Ok(BinaryAttr { name: self.specialize(NativeKind::Binary)? })
    }

    pub fn as_timestamp(&self) -> Result<TimestampAttr, DefinitionError> {
        Ok(TimestampAttr { name: self.specialize(NativeKind::Timestamp)? })
    }

    pub fn as_timestamp_nanos(&self) -> Result<TimestampNanosAttr, DefinitionError> {
        Ok(TimestampNanosAttr { name: self.specialize(NativeKind::TimestampNanos)? })
    }

    pub fn as_string_set(&self) -> Result<StringSetAttr, DefinitionError> {
        Ok(StringSetAttr { name: self.specialize(NativeKind::StringSet)? })
    }

    pub fn as_number_set(&self) -> Result<NumberSetAttr, DefinitionError> {
        Ok(NumberSetAttr { name: self.specialize(NativeKind::NumberSet)? })
    }

    pub fn as_binary_set(&self) -> Result<BinarySetAttr, DefinitionError> {
        Ok(BinarySetAttr { name: self.specialize(NativeKind::BinarySet)? })
    }
}

/// The scalar wire string of a named attribute in an item.
///
/// An absent key and a literally empty wire value both read as not-found:
/// empty strings never legally appear on the wire.
fn raw_scalar<'a>(name: &str, item: &'a Item) -> Result<&'a str, AttrError> {
    match item.get(name).map(|attr| &attr.value) {
        Some(WireValue::Single(value)) if !value.is_empty() => Ok(value),
        _ => Err(AttrError::NotFound(name.to_string())),
    }
}

fn compare(op: CompareOp, attr: WireAttribute) -> Comparison {
    Comparison {
        attribute: attr.name.clone(),
        op,
        values: vec![attr],
    }
}

macro_rules! comparisons {
    ($value_type:ty) => {
        /// Builds an equality predicate for index queries.
        pub fn equals(&self, value: $value_type) -> Comparison {
            compare(CompareOp::Equal, self.is(value))
        }

        /// Builds an inequality predicate for index queries.
        pub fn not_equals(&self, value: $value_type) -> Comparison {
            compare(CompareOp::NotEqual, self.is(value))
        }

        /// The attribute's name.
        pub fn name(&self) -> &str {
            &self.name
        }
    };
}

/// Boolean view; transmitted as Number `"1"`/`"0"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoolAttr {
    name: String,
}

impl BoolAttr {
    pub fn is(&self, value: bool) -> WireAttribute {
        WireAttribute::scalar(&self.name, WireType::Number, codec::encode_bool(value))
    }

    pub fn from(&self, item: &Item) -> Result<bool, AttrError> {
        codec::decode_bool(&self.name, raw_scalar(&self.name, item)?)
    }

    comparisons!(bool);
}

/// 32-bit integer view; transmitted as Number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I32Attr {
    name: String,
}

impl I32Attr {
    pub fn is(&self, value: i32) -> WireAttribute {
        WireAttribute::scalar(&self.name, WireType::Number, codec::encode_i32(value))
    }

    pub fn from(&self, item: &Item) -> Result<i32, AttrError> {
        codec::decode_i32(&self.name, raw_scalar(&self.name, item)?)
    }

    comparisons!(i32);
}

/// 64-bit integer view; transmitted as Number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I64Attr {
    name: String,
}

impl I64Attr {
    pub fn is(&self, value: i64) -> WireAttribute {
        WireAttribute::scalar(&self.name, WireType::Number, codec::encode_i64(value))
    }

    pub fn from(&self, item: &Item) -> Result<i64, AttrError> {
        codec::decode_i64(&self.name, raw_scalar(&self.name, item)?)
    }

    comparisons!(i64);
}

/// 32-bit float view; transmitted as Number in shortest round-trip form.
#[derive(Debug, Clone, PartialEq)]
pub struct F32Attr {
    name: String,
}

impl F32Attr {
    pub fn is(&self, value: f32) -> WireAttribute {
        WireAttribute::scalar(&self.name, WireType::Number, codec::encode_f32(value))
    }

    pub fn from(&self, item: &Item) -> Result<f32, AttrError> {
        codec::decode_f32(&self.name, raw_scalar(&self.name, item)?)
    }

    comparisons!(f32);
}

/// 64-bit float view; transmitted as Number in shortest round-trip form.
#[derive(Debug, Clone, PartialEq)]
pub struct F64Attr {
    name: String,
}

impl F64Attr {
    pub fn is(&self, value: f64) -> WireAttribute {
        WireAttribute::scalar(&self.name, WireType::Number, codec::encode_f64(value))
    }

    pub fn from(&self, item: &Item) -> Result<f64, AttrError> {
        codec::decode_f64(&self.name, raw_scalar(&self.name, item)?)
    }

    comparisons!(f64);
}

/// String view. The empty string is transmitted as the reserved `NULL`
/// sentinel and reads back as empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringAttr {
    name: String,
}

impl StringAttr {
    pub fn is(&self, value: &str) -> WireAttribute {
        WireAttribute::scalar(&self.name, WireType::String, codec::encode_string(value))
    }

    pub fn from(&self, item: &Item) -> Result<String, AttrError> {
        Ok(codec::decode_string(raw_scalar(&self.name, item)?))
    }

    comparisons!(&str);
}

/// Byte-blob view; transmitted as String via base64.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryAttr {
    name: String,
}

impl BinaryAttr {
    pub fn is(&self, value: &[u8]) -> WireAttribute {
        WireAttribute::scalar(&self.name, WireType::String, codec::encode_binary(value))
    }

    pub fn from(&self, item: &Item) -> Result<Vec<u8>, AttrError> {
        codec::decode_binary(&self.name, raw_scalar(&self.name, item)?)
    }

    comparisons!(&[u8]);
}

/// Timestamp view at second precision; transmitted as Number
/// (seconds since the Unix epoch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampAttr {
    name: String,
}

impl TimestampAttr {
    pub fn is(&self, value: DateTime<Utc>) -> WireAttribute {
        WireAttribute::scalar(&self.name, WireType::Number, codec::encode_timestamp(value))
    }

    pub fn from(&self, item: &Item) -> Result<DateTime<Utc>, AttrError> {
        codec::decode_timestamp(&self.name, raw_scalar(&self.name, item)?)
    }

    comparisons!(DateTime<Utc>);
}

/// Timestamp view at nanosecond precision; transmitted as Number
/// (nanoseconds since the Unix epoch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampNanosAttr {
    name: String,
}

impl TimestampNanosAttr {
    pub fn is(&self, value: DateTime<Utc>) -> WireAttribute {
        WireAttribute::scalar(
            &self.name,
            WireType::Number,
            codec::encode_timestamp_nanos(value),
        )
    }

    pub fn from(&self, item: &Item) -> Result<DateTime<Utc>, AttrError> {
        codec::decode_timestamp_nanos(&self.name, raw_scalar(&self.name, item)?)
    }

    comparisons!(DateTime<Utc>);
}

fn raw_set(name: &str, item: &Item, expected: WireType) -> Result<Vec<String>, AttrError> {
    let attr = item
        .get(name)
        .ok_or_else(|| AttrError::NotFound(name.to_string()))?;
    match &attr.value {
        WireValue::Set(values) if attr.wire_type == expected => Ok(values.clone()),
        WireValue::Set(_) => Err(AttrError::Invalid {
            attribute: name.to_string(),
            value: attr.wire_type.to_string(),
        }),
        WireValue::Single(value) => Err(AttrError::Invalid {
            attribute: name.to_string(),
            value: value.clone(),
        }),
    }
}

/// String-set view. Set payloads bypass the empty-value prohibition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringSetAttr {
    name: String,
}

impl StringSetAttr {
    pub fn is(&self, values: &[&str]) -> WireAttribute {
        WireAttribute::set(
            &self.name,
            WireType::StringSet,
            values.iter().map(|v| v.to_string()).collect(),
        )
    }

    pub fn from(&self, item: &Item) -> Result<Vec<String>, AttrError> {
        raw_set(&self.name, item, WireType::StringSet)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Number-set view; values are canonical decimal strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberSetAttr {
    name: String,
}

impl NumberSetAttr {
    pub fn is(&self, values: &[&str]) -> WireAttribute {
        WireAttribute::set(
            &self.name,
            WireType::NumberSet,
            values.iter().map(|v| v.to_string()).collect(),
        )
    }

    pub fn from(&self, item: &Item) -> Result<Vec<String>, AttrError> {
        raw_set(&self.name, item, WireType::NumberSet)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Binary-set view; values are base64 strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinarySetAttr {
    name: String,
}

impl BinarySetAttr {
    pub fn is(&self, values: &[&str]) -> WireAttribute {
        WireAttribute::set(
            &self.name,
            WireType::BinarySet,
            values.iter().map(|v| v.to_string()).collect(),
        )
    }

    pub fn from(&self, item: &Item) -> Result<Vec<String>, AttrError> {
        raw_set(&self.name, item, WireType::BinarySet)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TableState;
    use crate::wire::item_of;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn test_attr(name: &str, wire_type: Option<WireType>) -> Attr {
        let state: Shared = Rc::new(RefCell::new(TableState {
            name: "Test".to_string(),
            attrs: vec![AttrRecord {
                name: name.to_string(),
                wire_type,
                native: None,
                key_attr: true,
            }],
            primary_key: Vec::new(),
            throughput: None,
            local_indexes: Vec::new(),
            global_indexes: Vec::new(),
        }));
        Attr::new(state, 0)
    }

    #[test]
    fn bool_view_uses_canonical_number_tokens() {
        let flag = test_attr("Closed", None).as_bool().unwrap();

        let attr = flag.is(true);
        assert_eq!(attr.wire_type, WireType::Number);
        assert_eq!(attr.as_single(), Some("1"));

        let item = item_of([flag.is(true)]);
        assert_eq!(flag.from(&item), Ok(true));
        let item = item_of([WireAttribute::scalar("Closed", WireType::Number, "0")]);
        assert_eq!(flag.from(&item), Ok(false));
        let item = item_of([WireAttribute::scalar("Closed", WireType::Number, "2")]);
        assert_eq!(
            flag.from(&item),
            Err(AttrError::Invalid {
                attribute: "Closed".to_string(),
                value: "2".to_string(),
            })
        );
    }

    #[test]
    fn from_reports_missing_attribute_instead_of_a_zero_value() {
        let count = test_attr("Count", None).as_i64().unwrap();

        assert_eq!(
            count.from(&Item::new()),
            Err(AttrError::NotFound("Count".to_string()))
        );
    }

    #[test]
    fn from_treats_literally_empty_wire_value_as_missing() {
        let subject = test_attr("Subject", None).as_string().unwrap();
        let item = item_of([WireAttribute::scalar("Subject", WireType::String, "")]);

        assert_eq!(
            subject.from(&item),
            Err(AttrError::NotFound("Subject".to_string()))
        );
    }

    #[test]
    fn string_view_round_trips_the_empty_string_through_the_sentinel() {
        let subject = test_attr("Subject", None).as_string().unwrap();

        let attr = subject.is("");
        assert_eq!(attr.as_single(), Some("NULL"));

        let item = item_of([attr]);
        assert_eq!(subject.from(&item), Ok(String::new()));
    }

    #[test]
    fn specialization_pins_the_wire_type_for_all_handle_holders() {
        let attr = test_attr("Created", None);
        let clone = attr.clone();
        assert_eq!(clone.wire_type(), None);

        attr.as_timestamp().unwrap();

        assert_eq!(clone.wire_type(), Some(WireType::Number));
    }

    #[test]
    fn same_kind_specialization_is_idempotent() {
        let attr = test_attr("Created", None);
        attr.as_i64().unwrap();

        assert!(attr.as_i64().is_ok());
    }

    #[test]
    fn respecializing_to_a_different_kind_is_a_definition_error() {
        let attr = test_attr("Created", None);
        attr.as_i64().unwrap();

        assert_eq!(
            attr.as_string().unwrap_err(),
            DefinitionError::Respecialized {
                attribute: "Created".to_string(),
                existing: NativeKind::I64,
                requested: NativeKind::String,
            }
        );
    }

    #[test]
    fn specialization_conflicting_with_declared_type_is_rejected() {
        let attr = test_attr("Subject", Some(WireType::String));

        assert_eq!(
            attr.as_bool().unwrap_err(),
            DefinitionError::TypeConflict {
                attribute: "Subject".to_string(),
                declared: WireType::String,
                requested: WireType::Number,
            }
        );
    }

    #[test]
    fn typed_equals_builds_an_equality_predicate() {
        let user_id = test_attr("UserId", None).as_string().unwrap();

        let predicate = user_id.equals("uid:1");
        assert_eq!(predicate.attribute, "UserId");
        assert_eq!(predicate.op, CompareOp::Equal);
        assert_eq!(predicate.values[0].as_single(), Some("uid:1"));

        let predicate = user_id.not_equals("uid:2");
        assert_eq!(predicate.op, CompareOp::NotEqual);
    }

    #[test]
    fn raw_is_produces_sets_for_set_typed_attributes() {
        let tags = test_attr("Tags", Some(WireType::StringSet));

        let attr = tags.is(&["a", "b"]);
        assert_eq!(attr.wire_type, WireType::StringSet);
        assert_eq!(attr.as_set(), Some(&["a".to_string(), "b".to_string()][..]));
    }

    #[test]
    fn set_view_round_trips() {
        let tags = test_attr("Tags", None).as_string_set().unwrap();

        let item = item_of([tags.is(&["x", "y"])]);
        assert_eq!(
            tags.from(&item),
            Ok(vec!["x".to_string(), "y".to_string()])
        );
    }

    #[test]
    fn set_view_rejects_a_scalar_payload() {
        let tags = test_attr("Tags", None).as_string_set().unwrap();
        let item = item_of([WireAttribute::scalar("Tags", WireType::String, "x")]);

        assert_eq!(
            tags.from(&item),
            Err(AttrError::Invalid {
                attribute: "Tags".to_string(),
                value: "x".to_string(),
            })
        );
    }

    #[test]
    #[should_panic(expected = "empty value is not allowed")]
    fn raw_is_panics_on_an_empty_scalar_value() {
        let subject = test_attr("Subject", Some(WireType::String));
        subject.is(&[""]);
    }

    #[test]
    #[should_panic(expected = "exactly one value")]
    fn raw_is_panics_on_multiple_values_for_a_scalar() {
        let subject = test_attr("Subject", Some(WireType::String));
        subject.is(&["a", "b"]);
    }

    #[test]
    #[should_panic(expected = "no wire type yet")]
    fn raw_is_panics_on_an_untyped_attribute() {
        let pending = test_attr("Pending", None);
        pending.is(&["x"]);
    }

    #[test]
    fn raw_equals_and_from_operate_on_wire_strings() {
        let user_id = test_attr("UserId", Some(WireType::String));

        let predicate = user_id.equals("uid:1");
        assert_eq!(predicate.attribute, "UserId");
        assert_eq!(predicate.values[0].as_single(), Some("uid:1"));

        let item = item_of([user_id.is(&["uid:1"])]);
        assert_eq!(user_id.from(&item), Ok("uid:1".to_string()));
        assert_eq!(
            test_attr("Other", Some(WireType::String)).from(&item),
            Err(AttrError::NotFound("Other".to_string()))
        );
    }
}

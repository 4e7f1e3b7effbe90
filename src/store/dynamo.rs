//! AWS SDK implementation of the [`RemoteClient`] contract.
//!
//! Translates between the library's wire model and the SDK's types: a
//! frozen [`TableDescriptor`] becomes a `CreateTable` request, wire
//! attributes become `AttributeValue`s (blobs are carried as base64 text in
//! the wire model and decoded to `Blob` here), and optimistic
//! preconditions are rendered as condition expressions. SDK errors are
//! normalized to [`RemoteError`] with the service error code preserved, so
//! the façade's conditional-failure mapping works unchanged.

use crate::codec;
use crate::schema::{KeyRole, ProjectionDescriptor, TableDescriptor};
use crate::store::client::{RemoteClient, RemoteError, TableStatus};
use crate::wire::{CompareOp, Comparison, Item, ItemKey, WireAttribute, WireType, WireValue};
use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::{BuildError, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, ComparisonOperator, Condition, GlobalSecondaryIndex,
    KeySchemaElement, KeyType, LocalSecondaryIndex, Projection, ProjectionType,
    ProvisionedThroughput, ScalarAttributeType, TableStatus as SdkTableStatus,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::collections::HashMap;

/// Remote client backed by the AWS DynamoDB SDK.
#[derive(Clone, Debug)]
pub struct DynamoRemote {
    client: Client,
}

impl DynamoRemote {
    /// Creates a client from the default AWS credential chain and region
    /// configuration.
    pub async fn from_env() -> anyhow::Result<DynamoRemote> {
        tracing::info!("Setting up DynamoDB....");
        let config = aws_config::load_from_env().await;
        Ok(DynamoRemote {
            client: Client::new(&config),
        })
    }

    /// Wraps an already configured SDK client.
    pub fn new(client: Client) -> DynamoRemote {
        DynamoRemote { client }
    }
}

fn remote_err<E, R>(err: SdkError<E, R>) -> RemoteError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = err.code().unwrap_or("SdkError").to_string();
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| err.to_string());
    RemoteError::new(code, message)
}

fn build_err(err: BuildError) -> RemoteError {
    RemoteError::new("BuildError", err.to_string())
}

fn malformed(name: &str) -> RemoteError {
    RemoteError::new(
        "ValidationException",
        format!("attribute {name} has a malformed payload"),
    )
}

fn scalar_type(wire_type: WireType, attribute: &str) -> Result<ScalarAttributeType, RemoteError> {
    match wire_type {
        WireType::String => Ok(ScalarAttributeType::S),
        WireType::Number => Ok(ScalarAttributeType::N),
        WireType::Binary => Ok(ScalarAttributeType::B),
        _ => Err(malformed(attribute)),
    }
}

fn to_attribute_value(attr: &WireAttribute) -> Result<AttributeValue, RemoteError> {
    match (attr.wire_type, &attr.value) {
        (WireType::String, WireValue::Single(value)) => Ok(AttributeValue::S(value.clone())),
        (WireType::Number, WireValue::Single(value)) => Ok(AttributeValue::N(value.clone())),
        (WireType::Binary, WireValue::Single(value)) => BASE64
            .decode(value)
            .map(|bytes| AttributeValue::B(Blob::new(bytes)))
            .map_err(|_| malformed(&attr.name)),
        (WireType::StringSet, WireValue::Set(values)) => Ok(AttributeValue::Ss(values.clone())),
        (WireType::NumberSet, WireValue::Set(values)) => Ok(AttributeValue::Ns(values.clone())),
        (WireType::BinarySet, WireValue::Set(values)) => values
            .iter()
            .map(|value| BASE64.decode(value).map(Blob::new))
            .collect::<Result<Vec<_>, _>>()
            .map(AttributeValue::Bs)
            .map_err(|_| malformed(&attr.name)),
        _ => Err(malformed(&attr.name)),
    }
}

fn from_attribute_value(name: &str, value: &AttributeValue) -> Option<WireAttribute> {
    match value {
        AttributeValue::S(value) => Some(WireAttribute::scalar(name, WireType::String, value)),
        AttributeValue::N(value) => Some(WireAttribute::scalar(name, WireType::Number, value)),
        AttributeValue::B(blob) => Some(WireAttribute::scalar(
            name,
            WireType::Binary,
            BASE64.encode(blob.as_ref()),
        )),
        AttributeValue::Bool(value) => Some(WireAttribute::scalar(
            name,
            WireType::Number,
            if *value {
                codec::BOOL_TRUE
            } else {
                codec::BOOL_FALSE
            },
        )),
        AttributeValue::Ss(values) => {
            Some(WireAttribute::set(name, WireType::StringSet, values.clone()))
        }
        AttributeValue::Ns(values) => {
            Some(WireAttribute::set(name, WireType::NumberSet, values.clone()))
        }
        AttributeValue::Bs(blobs) => Some(WireAttribute::set(
            name,
            WireType::BinarySet,
            blobs.iter().map(|blob| BASE64.encode(blob.as_ref())).collect(),
        )),
        // Documents (maps, lists) and explicit nulls have no counterpart in
        // the wire model.
        _ => None,
    }
}

fn to_sdk_item(attributes: &[WireAttribute]) -> Result<HashMap<String, AttributeValue>, RemoteError> {
    attributes
        .iter()
        .map(|attr| Ok((attr.name.clone(), to_attribute_value(attr)?)))
        .collect()
}

fn to_wire_item(item: &HashMap<String, AttributeValue>) -> Item {
    item.iter()
        .filter_map(|(name, value)| {
            from_attribute_value(name, value).map(|attr| (name.clone(), attr))
        })
        .collect()
}

fn to_sdk_key(key: &ItemKey) -> Result<HashMap<String, AttributeValue>, RemoteError> {
    key.attributes()
        .map(|attr| Ok((attr.name.clone(), to_attribute_value(attr)?)))
        .collect()
}

/// Renders an optimistic precondition as a condition expression with
/// `#cN`/`:cN` placeholders.
fn condition_expression(
    expected: &[WireAttribute],
) -> Result<(String, HashMap<String, String>, HashMap<String, AttributeValue>), RemoteError> {
    let mut clauses = Vec::with_capacity(expected.len());
    let mut names = HashMap::new();
    let mut values = HashMap::new();
    for (i, attr) in expected.iter().enumerate() {
        clauses.push(format!("#c{i} = :c{i}"));
        names.insert(format!("#c{i}"), attr.name.clone());
        values.insert(format!(":c{i}"), to_attribute_value(attr)?);
    }
    Ok((clauses.join(" AND "), names, values))
}

/// Renders attribute updates as a `SET` update expression with
/// `#uN`/`:uN` placeholders.
fn update_expression(
    attributes: &[WireAttribute],
) -> Result<(String, HashMap<String, String>, HashMap<String, AttributeValue>), RemoteError> {
    let mut assignments = Vec::with_capacity(attributes.len());
    let mut names = HashMap::new();
    let mut values = HashMap::new();
    for (i, attr) in attributes.iter().enumerate() {
        assignments.push(format!("#u{i} = :u{i}"));
        names.insert(format!("#u{i}"), attr.name.clone());
        values.insert(format!(":u{i}"), to_attribute_value(attr)?);
    }
    Ok((format!("SET {}", assignments.join(", ")), names, values))
}

fn to_sdk_condition(comparison: &Comparison) -> Result<Condition, RemoteError> {
    let operator = match comparison.op {
        CompareOp::Equal => ComparisonOperator::Eq,
        CompareOp::NotEqual => ComparisonOperator::Ne,
    };
    let mut builder = Condition::builder().comparison_operator(operator);
    for value in &comparison.values {
        builder = builder.attribute_value_list(to_attribute_value(value)?);
    }
    builder.build().map_err(build_err)
}

fn status_from_sdk(status: &SdkTableStatus) -> TableStatus {
    match status {
        SdkTableStatus::Creating => TableStatus::Creating,
        SdkTableStatus::Active => TableStatus::Active,
        SdkTableStatus::Deleting => TableStatus::Deleting,
        SdkTableStatus::Updating => TableStatus::Updating,
        other => TableStatus::Unknown(other.as_str().to_string()),
    }
}

fn key_schema_elements(
    schema: &[crate::schema::KeyElement],
) -> Result<Vec<KeySchemaElement>, RemoteError> {
    schema
        .iter()
        .map(|element| {
            KeySchemaElement::builder()
                .attribute_name(&element.attribute)
                .key_type(match element.role {
                    KeyRole::Hash => KeyType::Hash,
                    KeyRole::Range => KeyType::Range,
                })
                .build()
                .map_err(build_err)
        })
        .collect()
}

fn to_sdk_projection(projection: &ProjectionDescriptor) -> Projection {
    let builder = match projection {
        ProjectionDescriptor::All => Projection::builder().projection_type(ProjectionType::All),
        ProjectionDescriptor::KeysOnly => {
            Projection::builder().projection_type(ProjectionType::KeysOnly)
        }
        ProjectionDescriptor::Include(names) => Projection::builder()
            .projection_type(ProjectionType::Include)
            .set_non_key_attributes(Some(names.clone())),
    };
    builder.build()
}

#[async_trait]
impl RemoteClient for DynamoRemote {
    async fn list_tables(&self) -> Result<Vec<String>, RemoteError> {
        let mut names = Vec::new();
        let mut start = None;
        loop {
            let output = self
                .client
                .list_tables()
                .set_exclusive_start_table_name(start)
                .send()
                .await
                .map_err(remote_err)?;
            names.extend(output.table_names().iter().cloned());
            match output.last_evaluated_table_name() {
                Some(next) => start = Some(next.to_string()),
                None => return Ok(names),
            }
        }
    }

    async fn create_table(&self, descriptor: &TableDescriptor) -> Result<TableStatus, RemoteError> {
        let mut request = self
            .client
            .create_table()
            .table_name(descriptor.name())
            .provisioned_throughput(
                ProvisionedThroughput::builder()
                    .read_capacity_units(descriptor.throughput().read)
                    .write_capacity_units(descriptor.throughput().write)
                    .build()
                    .map_err(build_err)?,
            );
        for definition in descriptor.attribute_definitions() {
            request = request.attribute_definitions(
                AttributeDefinition::builder()
                    .attribute_name(&definition.name)
                    .attribute_type(scalar_type(definition.wire_type, &definition.name)?)
                    .build()
                    .map_err(build_err)?,
            );
        }
        for element in key_schema_elements(descriptor.primary_key().key_schema())? {
            request = request.key_schema(element);
        }
        for index in descriptor.local_secondary_indexes() {
            let mut builder = LocalSecondaryIndex::builder()
                .index_name(index.name().unwrap_or_default())
                .projection(to_sdk_projection(
                    index.projection().unwrap_or(&ProjectionDescriptor::All),
                ));
            for element in key_schema_elements(index.key_schema())? {
                builder = builder.key_schema(element);
            }
            request = request.local_secondary_indexes(builder.build().map_err(build_err)?);
        }
        for index in descriptor.global_secondary_indexes() {
            let throughput = index.throughput().unwrap_or_default();
            let mut builder = GlobalSecondaryIndex::builder()
                .index_name(index.name().unwrap_or_default())
                .projection(to_sdk_projection(
                    index.projection().unwrap_or(&ProjectionDescriptor::All),
                ))
                .provisioned_throughput(
                    ProvisionedThroughput::builder()
                        .read_capacity_units(throughput.read)
                        .write_capacity_units(throughput.write)
                        .build()
                        .map_err(build_err)?,
                );
            for element in key_schema_elements(index.key_schema())? {
                builder = builder.key_schema(element);
            }
            request = request.global_secondary_indexes(builder.build().map_err(build_err)?);
        }

        let output = request.send().await.map_err(remote_err)?;
        Ok(output
            .table_description()
            .and_then(|table| table.table_status())
            .map(status_from_sdk)
            .unwrap_or(TableStatus::Creating))
    }

    async fn describe_table(&self, table: &str) -> Result<TableStatus, RemoteError> {
        let output = self
            .client
            .describe_table()
            .table_name(table)
            .send()
            .await
            .map_err(remote_err)?;
        Ok(output
            .table()
            .and_then(|table| table.table_status())
            .map(status_from_sdk)
            .unwrap_or(TableStatus::Unknown("MISSING".to_string())))
    }

    async fn delete_table(&self, table: &str) -> Result<(), RemoteError> {
        self.client
            .delete_table()
            .table_name(table)
            .send()
            .await
            .map(|_| ())
            .map_err(remote_err)
    }

    async fn put_item(
        &self,
        table: &str,
        attributes: &[WireAttribute],
        expected: Option<&[WireAttribute]>,
    ) -> Result<(), RemoteError> {
        let mut request = self
            .client
            .put_item()
            .table_name(table)
            .set_item(Some(to_sdk_item(attributes)?));
        if let Some(expected) = expected {
            let (expression, names, values) = condition_expression(expected)?;
            request = request
                .condition_expression(expression)
                .set_expression_attribute_names(Some(names))
                .set_expression_attribute_values(Some(values));
        }
        request.send().await.map(|_| ()).map_err(remote_err)
    }

    async fn get_item(&self, table: &str, key: &ItemKey) -> Result<Option<Item>, RemoteError> {
        let output = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(to_sdk_key(key)?))
            .send()
            .await
            .map_err(remote_err)?;
        Ok(output.item().map(to_wire_item))
    }

    async fn update_item(
        &self,
        table: &str,
        key: &ItemKey,
        attributes: &[WireAttribute],
        expected: Option<&[WireAttribute]>,
    ) -> Result<(), RemoteError> {
        let mut request = self
            .client
            .update_item()
            .table_name(table)
            .set_key(Some(to_sdk_key(key)?));
        let mut all_names = HashMap::new();
        let mut all_values = HashMap::new();
        if !attributes.is_empty() {
            let (expression, names, values) = update_expression(attributes)?;
            request = request.update_expression(expression);
            all_names.extend(names);
            all_values.extend(values);
        }
        if let Some(expected) = expected {
            let (expression, names, values) = condition_expression(expected)?;
            request = request.condition_expression(expression);
            all_names.extend(names);
            all_values.extend(values);
        }
        if !all_names.is_empty() {
            request = request
                .set_expression_attribute_names(Some(all_names))
                .set_expression_attribute_values(Some(all_values));
        }
        request.send().await.map(|_| ()).map_err(remote_err)
    }

    async fn delete_item(
        &self,
        table: &str,
        key: &ItemKey,
        expected: Option<&[WireAttribute]>,
    ) -> Result<(), RemoteError> {
        let mut request = self
            .client
            .delete_item()
            .table_name(table)
            .set_key(Some(to_sdk_key(key)?));
        if let Some(expected) = expected {
            let (expression, names, values) = condition_expression(expected)?;
            request = request
                .condition_expression(expression)
                .set_expression_attribute_names(Some(names))
                .set_expression_attribute_values(Some(values));
        }
        request.send().await.map(|_| ()).map_err(remote_err)
    }

    async fn query(
        &self,
        table: &str,
        index_name: Option<&str>,
        conditions: &[Comparison],
    ) -> Result<Vec<Item>, RemoteError> {
        let mut request = self
            .client
            .query()
            .table_name(table)
            .set_index_name(index_name.map(str::to_string));
        for condition in conditions {
            request = request.key_conditions(&condition.attribute, to_sdk_condition(condition)?);
        }
        let output = request.send().await.map_err(remote_err)?;
        Ok(output.items().iter().map(to_wire_item).collect())
    }

    async fn scan_segment(
        &self,
        table: &str,
        conditions: &[Comparison],
        start_key: Option<&ItemKey>,
        segment: usize,
        total_segments: usize,
        limit: i64,
    ) -> Result<(Vec<Item>, Option<Item>), RemoteError> {
        let mut request = self
            .client
            .scan()
            .table_name(table)
            .segment(i32::try_from(segment).unwrap_or(i32::MAX))
            .total_segments(i32::try_from(total_segments).unwrap_or(i32::MAX))
            .limit(i32::try_from(limit).unwrap_or(i32::MAX));
        if let Some(start_key) = start_key {
            request = request.set_exclusive_start_key(Some(to_sdk_key(start_key)?));
        }
        for condition in conditions {
            request = request.scan_filter(&condition.attribute, to_sdk_condition(condition)?);
        }
        let output = request.send().await.map_err(remote_err)?;
        let items = output.items().iter().map(to_wire_item).collect();
        let next = output.last_evaluated_key().map(to_wire_item);
        Ok((items, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_wire_values_map_to_sdk_attribute_values() {
        let s = WireAttribute::scalar("Subject", WireType::String, "hi");
        assert_eq!(
            to_attribute_value(&s).unwrap(),
            AttributeValue::S("hi".to_string())
        );

        let n = WireAttribute::scalar("Created", WireType::Number, "42");
        assert_eq!(
            to_attribute_value(&n).unwrap(),
            AttributeValue::N("42".to_string())
        );

        let b = WireAttribute::scalar("Payload", WireType::Binary, BASE64.encode(b"abc"));
        assert_eq!(
            to_attribute_value(&b).unwrap(),
            AttributeValue::B(Blob::new(b"abc".to_vec()))
        );
    }

    #[test]
    fn malformed_base64_in_a_binary_value_is_rejected() {
        let b = WireAttribute::scalar("Payload", WireType::Binary, "!!!");
        assert!(to_attribute_value(&b).is_err());
    }

    #[test]
    fn mismatched_payload_shapes_are_rejected() {
        let scalar_with_set_tag = WireAttribute::scalar("Tags", WireType::StringSet, "oops");
        assert!(to_attribute_value(&scalar_with_set_tag).is_err());
    }

    #[test]
    fn sdk_values_round_trip_back_to_wire_attributes() {
        for attr in [
            WireAttribute::scalar("S", WireType::String, "x"),
            WireAttribute::scalar("N", WireType::Number, "7"),
            WireAttribute::scalar("B", WireType::Binary, BASE64.encode(b"\x01\x02")),
            WireAttribute::set(
                "SS",
                WireType::StringSet,
                vec!["a".to_string(), "b".to_string()],
            ),
        ] {
            let value = to_attribute_value(&attr).unwrap();
            assert_eq!(from_attribute_value(&attr.name, &value), Some(attr));
        }
    }

    #[test]
    fn foreign_bool_values_read_as_canonical_number_tokens() {
        let attr = from_attribute_value("Closed", &AttributeValue::Bool(true)).unwrap();
        assert_eq!(attr.wire_type, WireType::Number);
        assert_eq!(attr.as_single(), Some("1"));
    }

    #[test]
    fn condition_expression_uses_one_placeholder_pair_per_attribute() {
        let expected = [
            WireAttribute::scalar("UserId", WireType::String, "uid:1"),
            WireAttribute::scalar("Created", WireType::Number, "7"),
        ];
        let (expression, names, values) = condition_expression(&expected).unwrap();

        assert_eq!(expression, "#c0 = :c0 AND #c1 = :c1");
        assert_eq!(names["#c0"], "UserId");
        assert_eq!(names["#c1"], "Created");
        assert_eq!(values[":c1"], AttributeValue::N("7".to_string()));
    }

    #[test]
    fn update_expression_sets_each_attribute() {
        let attrs = [
            WireAttribute::scalar("UserAgent", WireType::String, "ua:ff"),
            WireAttribute::scalar("Seen", WireType::Number, "1"),
        ];
        let (expression, names, values) = update_expression(&attrs).unwrap();

        assert_eq!(expression, "SET #u0 = :u0, #u1 = :u1");
        assert_eq!(names["#u1"], "Seen");
        assert_eq!(values[":u0"], AttributeValue::S("ua:ff".to_string()));
    }
}

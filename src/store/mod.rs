//! Thin CRUD/query façade over one table.
//!
//! A [`Store`] pairs a frozen [`TableDescriptor`] with a remote client
//! handle. Every operation is a single remote round trip whose failure is
//! mapped to exactly one [`StoreError`] kind; the only wait loop is
//! [`Store::init`]'s bounded poll for the table to become active.
//!
//! The façade holds no per-call mutable state — only fixed configuration
//! and the client handle — so one instance is safe to share across
//! concurrent callers as long as the client is.

use crate::schema::{KeyRole, TableDescriptor};
use crate::wire::{Comparison, Item, ItemKey, Query, WireAttribute};
use std::time::Duration;
use tokio::time::{sleep, timeout};

pub mod client;
#[cfg(feature = "aws")]
pub mod dynamo;
pub mod error;

pub use client::{RemoteClient, RemoteError, TableStatus};
pub use error::StoreError;

/// How long [`Store::init`] waits for a table to become active.
pub const DEFAULT_CREATE_CHECK_TIMEOUT: Duration = Duration::from_secs(60);

/// How often [`Store::init`] polls the table status while waiting.
pub const DEFAULT_CREATE_CHECK_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Store configuration: bounds for the create-and-wait poll in
/// [`Store::init`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub create_check_timeout: Duration,
    pub create_check_poll_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            create_check_timeout: DEFAULT_CREATE_CHECK_TIMEOUT,
            create_check_poll_interval: DEFAULT_CREATE_CHECK_POLL_INTERVAL,
        }
    }
}

/// CRUD/query operations over one table, parameterized by its descriptor.
pub struct Store<C> {
    descriptor: TableDescriptor,
    client: C,
    config: StoreConfig,
}

impl<C: RemoteClient> Store<C> {
    pub fn new(descriptor: TableDescriptor, client: C) -> Self {
        Store::with_config(descriptor, client, StoreConfig::default())
    }

    pub fn with_config(descriptor: TableDescriptor, client: C, config: StoreConfig) -> Self {
        Store {
            descriptor,
            client,
            config,
        }
    }

    pub fn descriptor(&self) -> &TableDescriptor {
        &self.descriptor
    }

    fn table(&self) -> &str {
        self.descriptor.name()
    }

    /// Idempotent create-or-await-active.
    ///
    /// Creates the table when it does not exist, then waits — polling at
    /// the configured interval, bounded by the configured timeout — until
    /// the remote store reports it active.
    pub async fn init(&self) -> Result<(), StoreError> {
        let table = self.table();
        tracing::debug!(table, "initializing store");
        let tables = self
            .client
            .list_tables()
            .await
            .map_err(|err| self.init_failed(err.to_string()))?;
        if tables.iter().any(|name| name == table) {
            tracing::debug!(table, "table exists, waiting until it becomes active");
            return self.wait_until_active().await;
        }

        tracing::info!(table, "creating table");
        match self.client.create_table(&self.descriptor).await {
            Ok(TableStatus::Active) => {
                tracing::debug!(table, "table is active");
                Ok(())
            }
            Ok(TableStatus::Creating) => {
                tracing::debug!(table, "waiting until table becomes active");
                self.wait_until_active().await
            }
            Ok(status) => {
                tracing::error!(table, status = %status, "unexpected status during table initialization");
                Err(StoreError::TableStatusUnknown {
                    table: table.to_string(),
                    status: status.to_string(),
                })
            }
            Err(err) => {
                tracing::error!(table, error = %err, "error in init()");
                Err(self.init_failed(err.to_string()))
            }
        }
    }

    async fn wait_until_active(&self) -> Result<(), StoreError> {
        let table = self.table();
        let poll = async {
            loop {
                match self.client.describe_table(table).await {
                    Ok(TableStatus::Active) => return Ok(()),
                    Ok(status) => {
                        tracing::debug!(table, status = %status, "table is not active yet");
                    }
                    // A freshly created table may not be visible yet.
                    Err(err) if err.is_not_found() => {
                        tracing::debug!(table, "table is not visible yet");
                    }
                    Err(err) => return Err(err),
                }
                sleep(self.config.create_check_poll_interval).await;
            }
        };
        match timeout(self.config.create_check_timeout, poll).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(self.init_failed(err.to_string())),
            Err(_) => Err(self.init_failed(format!(
                "table did not become active within {:?}",
                self.config.create_check_timeout
            ))),
        }
    }

    fn init_failed(&self, reason: String) -> StoreError {
        StoreError::InitFailed {
            table: self.table().to_string(),
            reason,
        }
    }

    /// Idempotent delete-if-exists.
    pub async fn destroy(&self) -> Result<(), StoreError> {
        let table = self.table();
        tracing::debug!(table, "destroying table");
        let tables = self
            .client
            .list_tables()
            .await
            .map_err(|source| StoreError::DestroyFailed {
                table: table.to_string(),
                source,
            })?;
        if !tables.iter().any(|name| name == table) {
            tracing::debug!(table, "table doesnt exist, skipping deletion");
            return Ok(());
        }
        self.client
            .delete_table(table)
            .await
            .map_err(|source| {
                tracing::error!(table, error = %source, "error in destroy()");
                StoreError::DestroyFailed {
                    table: table.to_string(),
                    source,
                }
            })
            .inspect(|_| tracing::debug!(table, "table deleted successfully"))
    }

    /// Fetches the item under the given primary key.
    pub async fn get(&self, key: &ItemKey) -> Result<Item, StoreError> {
        let table = self.table();
        tracing::debug!(table, key = ?key.hash.name, "getting item");
        match self.client.get_item(table, key).await {
            Ok(Some(item)) => Ok(item),
            Ok(None) => Err(StoreError::RecordNotFound),
            Err(source) => {
                tracing::error!(table, error = %source, "error in get()");
                Err(StoreError::LookupFailed {
                    table: table.to_string(),
                    source,
                })
            }
        }
    }

    /// Runs an index-scoped query built by a
    /// [`QueryableIndex`](crate::schema::QueryableIndex).
    pub async fn find(&self, query: &Query) -> Result<Vec<Item>, StoreError> {
        let table = self.table();
        tracing::debug!(table, index = ?query.index_name, "running query");
        self.client
            .query(table, query.index_name.as_deref(), &query.conditions)
            .await
            .map_err(|source| {
                tracing::error!(table, error = %source, "error in find()");
                StoreError::LookupFailed {
                    table: table.to_string(),
                    source,
                }
            })
    }

    /// Writes a full item.
    pub async fn save(&self, attributes: &[WireAttribute]) -> Result<(), StoreError> {
        self.save_conditional(attributes, None).await
    }

    /// Writes a full item, accepted only when the expected prior attribute
    /// values hold.
    pub async fn save_conditional(
        &self,
        attributes: &[WireAttribute],
        expected: Option<&[WireAttribute]>,
    ) -> Result<(), StoreError> {
        let table = self.table();
        tracing::debug!(table, attributes = attributes.len(), "saving item");
        match self.client.put_item(table, attributes, expected).await {
            Ok(()) => Ok(()),
            Err(source) if source.is_conditional_check_failed() => {
                Err(StoreError::ConditionalCheckFailed)
            }
            Err(source) => {
                tracing::error!(table, error = %source, "error in save_conditional()");
                Err(StoreError::SaveFailed {
                    table: table.to_string(),
                    source,
                })
            }
        }
    }

    /// Updates the given attributes of the item under the key.
    pub async fn update(
        &self,
        key: &ItemKey,
        attributes: &[WireAttribute],
    ) -> Result<(), StoreError> {
        self.update_conditional(key, attributes, None).await
    }

    /// Updates attributes, accepted only when the expected prior attribute
    /// values hold.
    pub async fn update_conditional(
        &self,
        key: &ItemKey,
        attributes: &[WireAttribute],
        expected: Option<&[WireAttribute]>,
    ) -> Result<(), StoreError> {
        let table = self.table();
        tracing::debug!(table, key = ?key.hash.name, "updating item");
        match self
            .client
            .update_item(table, key, attributes, expected)
            .await
        {
            Ok(()) => Ok(()),
            Err(source) if source.is_conditional_check_failed() => {
                Err(StoreError::ConditionalCheckFailed)
            }
            Err(source) => {
                tracing::error!(table, error = %source, "error in update_conditional()");
                Err(StoreError::UpdateFailed {
                    table: table.to_string(),
                    source,
                })
            }
        }
    }

    /// Deletes the item under the key.
    pub async fn delete(&self, key: &ItemKey) -> Result<(), StoreError> {
        self.delete_conditional(key, None).await
    }

    /// Deletes the item, accepted only when the expected prior attribute
    /// values hold.
    pub async fn delete_conditional(
        &self,
        key: &ItemKey,
        expected: Option<&[WireAttribute]>,
    ) -> Result<(), StoreError> {
        let table = self.table();
        tracing::debug!(table, key = ?key.hash.name, "deleting item");
        match self.client.delete_item(table, key, expected).await {
            Ok(()) => Ok(()),
            Err(source) if source.is_conditional_check_failed() => {
                Err(StoreError::ConditionalCheckFailed)
            }
            Err(source) => {
                tracing::error!(table, error = %source, "error in delete_conditional()");
                Err(StoreError::DeleteFailed {
                    table: table.to_string(),
                    source,
                })
            }
        }
    }

    /// One page of one segment of a parallel scan. Returns the page's items
    /// and, when the segment is not exhausted, the key to resume from.
    pub async fn parallel_scan(
        &self,
        conditions: &[Comparison],
        start_key: Option<&ItemKey>,
        segment: usize,
        total_segments: usize,
        limit: i64,
    ) -> Result<(Vec<Item>, Option<ItemKey>), StoreError> {
        let table = self.table();
        tracing::debug!(table, segment, total_segments, limit, "scanning segment");
        match self
            .client
            .scan_segment(table, conditions, start_key, segment, total_segments, limit)
            .await
        {
            Ok((items, next)) => Ok((items, next.and_then(|key| self.item_key_from(key)))),
            Err(source) if source.is_not_found() => Err(StoreError::RecordNotFound),
            Err(source) => {
                tracing::error!(
                    table,
                    segment,
                    total_segments,
                    error = %source,
                    "error in parallel_scan()"
                );
                Err(StoreError::LookupFailed {
                    table: table.to_string(),
                    source,
                })
            }
        }
    }

    /// Reassembles a raw resume-key attribute map into an [`ItemKey`] using
    /// the descriptor's primary key schema.
    fn item_key_from(&self, mut attrs: Item) -> Option<ItemKey> {
        let pk = self.descriptor.primary_key();
        let hash = attrs.remove(&pk.key_element(KeyRole::Hash)?.attribute)?;
        let range = pk
            .key_element(KeyRole::Range)
            .and_then(|element| attrs.remove(&element.attribute));
        Some(ItemKey { hash, range })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::describe;
    use crate::store::client::{CONDITIONAL_CHECK_FAILED, RESOURCE_NOT_FOUND};
    use crate::wire::{item_of, CompareOp, WireType, WireValue};
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// In-memory remote store with scripted statuses and failure injection.
    struct MockRemote {
        tables: Mutex<Vec<String>>,
        items: Mutex<HashMap<String, Item>>,
        statuses: Mutex<VecDeque<TableStatus>>,
        create_status: Mutex<Option<TableStatus>>,
        fail_next: Mutex<Option<RemoteError>>,
    }

    impl MockRemote {
        fn new() -> Self {
            MockRemote {
                tables: Mutex::new(Vec::new()),
                items: Mutex::new(HashMap::new()),
                statuses: Mutex::new(VecDeque::new()),
                create_status: Mutex::new(None),
                fail_next: Mutex::new(None),
            }
        }

        fn with_table(name: &str) -> Self {
            let mock = MockRemote::new();
            mock.tables.lock().unwrap().push(name.to_string());
            mock
        }

        fn script_statuses(&self, statuses: impl IntoIterator<Item = TableStatus>) {
            self.statuses.lock().unwrap().extend(statuses);
        }

        fn inject_failure(&self, err: RemoteError) {
            *self.fail_next.lock().unwrap() = Some(err);
        }

        fn take_failure(&self) -> Option<RemoteError> {
            self.fail_next.lock().unwrap().take()
        }

        fn key_string(key: &ItemKey) -> String {
            let mut s = match &key.hash.value {
                WireValue::Single(v) => v.clone(),
                WireValue::Set(_) => String::new(),
            };
            if let Some(range) = &key.range {
                if let WireValue::Single(v) = &range.value {
                    s.push('|');
                    s.push_str(v);
                }
            }
            s
        }

        fn check_expected(
            item: Option<&Item>,
            expected: Option<&[WireAttribute]>,
        ) -> Result<(), RemoteError> {
            let Some(expected) = expected else {
                return Ok(());
            };
            for want in expected {
                let holds = item
                    .and_then(|item| item.get(&want.name))
                    .is_some_and(|have| have.value == want.value);
                if !holds {
                    return Err(RemoteError::new(
                        CONDITIONAL_CHECK_FAILED,
                        "the conditional request failed",
                    ));
                }
            }
            Ok(())
        }

        fn matches(item: &Item, conditions: &[Comparison]) -> bool {
            conditions.iter().all(|condition| {
                let value = item
                    .get(&condition.attribute)
                    .and_then(|attr| attr.as_single());
                let wanted = condition.values[0].as_single();
                match condition.op {
                    CompareOp::Equal => value == wanted,
                    CompareOp::NotEqual => value.is_some() && value != wanted,
                }
            })
        }
    }

    #[async_trait]
    impl RemoteClient for MockRemote {
        async fn list_tables(&self) -> Result<Vec<String>, RemoteError> {
            if let Some(err) = self.take_failure() {
                return Err(err);
            }
            Ok(self.tables.lock().unwrap().clone())
        }

        async fn create_table(
            &self,
            descriptor: &TableDescriptor,
        ) -> Result<TableStatus, RemoteError> {
            if let Some(err) = self.take_failure() {
                return Err(err);
            }
            self.tables.lock().unwrap().push(descriptor.name().to_string());
            Ok(self
                .create_status
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(TableStatus::Active))
        }

        async fn describe_table(&self, _table: &str) -> Result<TableStatus, RemoteError> {
            Ok(self
                .statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(TableStatus::Active))
        }

        async fn delete_table(&self, table: &str) -> Result<(), RemoteError> {
            if let Some(err) = self.take_failure() {
                return Err(err);
            }
            self.tables.lock().unwrap().retain(|name| name != table);
            Ok(())
        }

        async fn put_item(
            &self,
            _table: &str,
            attributes: &[WireAttribute],
            expected: Option<&[WireAttribute]>,
        ) -> Result<(), RemoteError> {
            if let Some(err) = self.take_failure() {
                return Err(err);
            }
            let item = item_of(attributes.iter().cloned());
            // The tests pass the hash key attribute first.
            let key = attributes[0].as_single().unwrap().to_string();
            let mut items = self.items.lock().unwrap();
            MockRemote::check_expected(items.get(&key), expected)?;
            items.insert(key, item);
            Ok(())
        }

        async fn get_item(&self, _table: &str, key: &ItemKey) -> Result<Option<Item>, RemoteError> {
            if let Some(err) = self.take_failure() {
                return Err(err);
            }
            Ok(self
                .items
                .lock()
                .unwrap()
                .get(&MockRemote::key_string(key))
                .cloned())
        }

        async fn update_item(
            &self,
            _table: &str,
            key: &ItemKey,
            attributes: &[WireAttribute],
            expected: Option<&[WireAttribute]>,
        ) -> Result<(), RemoteError> {
            if let Some(err) = self.take_failure() {
                return Err(err);
            }
            let key_string = MockRemote::key_string(key);
            let mut items = self.items.lock().unwrap();
            MockRemote::check_expected(items.get(&key_string), expected)?;
            let entry = items
                .entry(key_string)
                .or_insert_with(|| item_of(key.attributes().cloned()));
            for attr in attributes {
                entry.insert(attr.name.clone(), attr.clone());
            }
            Ok(())
        }

        async fn delete_item(
            &self,
            _table: &str,
            key: &ItemKey,
            expected: Option<&[WireAttribute]>,
        ) -> Result<(), RemoteError> {
            if let Some(err) = self.take_failure() {
                return Err(err);
            }
            let key_string = MockRemote::key_string(key);
            let mut items = self.items.lock().unwrap();
            MockRemote::check_expected(items.get(&key_string), expected)?;
            items.remove(&key_string);
            Ok(())
        }

        async fn query(
            &self,
            _table: &str,
            _index_name: Option<&str>,
            conditions: &[Comparison],
        ) -> Result<Vec<Item>, RemoteError> {
            if let Some(err) = self.take_failure() {
                return Err(err);
            }
            Ok(self
                .items
                .lock()
                .unwrap()
                .values()
                .filter(|item| MockRemote::matches(item, conditions))
                .cloned()
                .collect())
        }

        async fn scan_segment(
            &self,
            _table: &str,
            conditions: &[Comparison],
            _start_key: Option<&ItemKey>,
            _segment: usize,
            _total_segments: usize,
            limit: i64,
        ) -> Result<(Vec<Item>, Option<Item>), RemoteError> {
            if let Some(err) = self.take_failure() {
                return Err(err);
            }
            let items: Vec<Item> = self
                .items
                .lock()
                .unwrap()
                .values()
                .filter(|item| MockRemote::matches(item, conditions))
                .take(limit as usize)
                .cloned()
                .collect();
            Ok((items, None))
        }
    }

    fn sessions_descriptor() -> TableDescriptor {
        describe("Sessions", |t| {
            let id = t.key_attr("Id", WireType::String)?;
            let user_id = t.key_attr("UserId", WireType::String)?;
            t.primary_key().hash(&id)?;

            let index = t.global_index("UserIndex")?;
            index.hash(&user_id)?;
            index.projection().all();
            Ok(())
        })
        .unwrap()
    }

    fn sessions_store() -> Store<MockRemote> {
        Store::new(sessions_descriptor(), MockRemote::new())
    }

    fn attr(name: &str, value: &str) -> WireAttribute {
        WireAttribute::scalar(name, WireType::String, value)
    }

    fn session_key(descriptor: &TableDescriptor, id: &str) -> ItemKey {
        descriptor.key(&[attr("Id", id)]).unwrap()
    }

    #[tokio::test]
    async fn save_then_get_round_trips() {
        let store = sessions_store();
        store
            .save(&[attr("Id", "sid:1"), attr("UserId", "uid:1")])
            .await
            .unwrap();

        let key = session_key(store.descriptor(), "sid:1");
        let item = store.get(&key).await.unwrap();

        assert_eq!(item["UserId"].as_single(), Some("uid:1"));
    }

    #[tokio::test]
    async fn get_of_a_missing_record_reports_not_found() {
        let store = sessions_store();
        let key = session_key(store.descriptor(), "sid:missing");

        assert_eq!(store.get(&key).await.unwrap_err(), StoreError::RecordNotFound);
    }

    #[tokio::test]
    async fn get_failures_map_to_lookup_failed() {
        let store = sessions_store();
        store.client.inject_failure(RemoteError::new("InternalServerError", "boom"));
        let key = session_key(store.descriptor(), "sid:1");

        assert!(matches!(
            store.get(&key).await.unwrap_err(),
            StoreError::LookupFailed { .. }
        ));
    }

    #[tokio::test]
    async fn rejected_conditional_save_is_distinguishable_from_a_generic_failure() {
        let store = sessions_store();
        store.save(&[attr("Id", "sid:1"), attr("UserId", "uid:1")]).await.unwrap();

        // Precondition does not hold: expect a different prior UserId.
        let rejected = store
            .save_conditional(
                &[attr("Id", "sid:1"), attr("UserId", "uid:2")],
                Some(&[attr("UserId", "uid:other")]),
            )
            .await;
        assert_eq!(rejected.unwrap_err(), StoreError::ConditionalCheckFailed);

        // A non-conditional remote failure maps to SaveFailed instead.
        store.client.inject_failure(RemoteError::new("InternalServerError", "boom"));
        let failed = store.save(&[attr("Id", "sid:1"), attr("UserId", "uid:2")]).await;
        assert!(matches!(failed.unwrap_err(), StoreError::SaveFailed { .. }));
    }

    #[tokio::test]
    async fn conditional_save_succeeds_when_the_precondition_holds() {
        let store = sessions_store();
        store.save(&[attr("Id", "sid:1"), attr("UserId", "uid:1")]).await.unwrap();

        store
            .save_conditional(
                &[attr("Id", "sid:1"), attr("UserId", "uid:2")],
                Some(&[attr("UserId", "uid:1")]),
            )
            .await
            .unwrap();

        let key = session_key(store.descriptor(), "sid:1");
        let item = store.get(&key).await.unwrap();
        assert_eq!(item["UserId"].as_single(), Some("uid:2"));
    }

    #[tokio::test]
    async fn update_merges_attributes_and_maps_conditional_rejections() {
        let store = sessions_store();
        store.save(&[attr("Id", "sid:1"), attr("UserId", "uid:1")]).await.unwrap();
        let key = session_key(store.descriptor(), "sid:1");

        store.update(&key, &[attr("UserId", "uid:9")]).await.unwrap();
        let item = store.get(&key).await.unwrap();
        assert_eq!(item["UserId"].as_single(), Some("uid:9"));

        let rejected = store
            .update_conditional(&key, &[attr("UserId", "uid:1")], Some(&[attr("UserId", "uid:wrong")]))
            .await;
        assert_eq!(rejected.unwrap_err(), StoreError::ConditionalCheckFailed);

        store.client.inject_failure(RemoteError::new("InternalServerError", "boom"));
        let failed = store.update(&key, &[attr("UserId", "uid:1")]).await;
        assert!(matches!(failed.unwrap_err(), StoreError::UpdateFailed { .. }));
    }

    #[tokio::test]
    async fn delete_removes_the_record_and_maps_failures() {
        let store = sessions_store();
        store.save(&[attr("Id", "sid:1"), attr("UserId", "uid:1")]).await.unwrap();
        let key = session_key(store.descriptor(), "sid:1");

        store.delete(&key).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap_err(), StoreError::RecordNotFound);

        let rejected = store
            .delete_conditional(&key, Some(&[attr("UserId", "uid:1")]))
            .await;
        assert_eq!(rejected.unwrap_err(), StoreError::ConditionalCheckFailed);

        store.client.inject_failure(RemoteError::new("InternalServerError", "boom"));
        let failed = store.delete(&key).await;
        assert!(matches!(failed.unwrap_err(), StoreError::DeleteFailed { .. }));
    }

    #[tokio::test]
    async fn find_filters_by_the_query_conditions() {
        let store = sessions_store();
        store.save(&[attr("Id", "sid:1"), attr("UserId", "uid:1")]).await.unwrap();
        store.save(&[attr("Id", "sid:2"), attr("UserId", "uid:1")]).await.unwrap();
        store.save(&[attr("Id", "sid:3"), attr("UserId", "uid:2")]).await.unwrap();

        let user_index = store.descriptor().global_index("UserIndex").unwrap();
        let query = user_index.query([Comparison {
            attribute: "UserId".to_string(),
            op: CompareOp::Equal,
            values: vec![attr("UserId", "uid:1")],
        }]);
        assert_eq!(query.index_name.as_deref(), Some("UserIndex"));

        let items = store.find(&query).await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| item["UserId"].as_single() == Some("uid:1")));
    }

    #[tokio::test]
    async fn parallel_scan_honors_the_limit_and_maps_failures() {
        let store = sessions_store();
        for i in 0..5 {
            store
                .save(&[attr("Id", &format!("sid:{i}")), attr("UserId", "uid:1")])
                .await
                .unwrap();
        }

        let (items, next) = store.parallel_scan(&[], None, 0, 1, 3).await.unwrap();
        assert_eq!(items.len(), 3);
        assert!(next.is_none());

        store.client.inject_failure(RemoteError::new("InternalServerError", "boom"));
        let failed = store.parallel_scan(&[], None, 0, 1, 3).await;
        assert!(matches!(failed.unwrap_err(), StoreError::LookupFailed { .. }));
    }

    #[tokio::test]
    async fn parallel_scan_maps_a_missing_table_to_record_not_found() {
        let store = sessions_store();
        store
            .client
            .inject_failure(RemoteError::new(RESOURCE_NOT_FOUND, "no such table"));

        let result = store.parallel_scan(&[], None, 0, 1, 3).await;

        assert_eq!(result.unwrap_err(), StoreError::RecordNotFound);
    }

    #[tokio::test]
    async fn init_creates_a_missing_table_and_waits_for_it() {
        let store = Store::with_config(
            sessions_descriptor(),
            MockRemote::new(),
            StoreConfig {
                create_check_timeout: Duration::from_millis(200),
                create_check_poll_interval: Duration::from_millis(1),
            },
        );
        *store.client.create_status.lock().unwrap() = Some(TableStatus::Creating);
        store
            .client
            .script_statuses([TableStatus::Creating, TableStatus::Creating, TableStatus::Active]);

        store.init().await.unwrap();

        assert!(store.client.tables.lock().unwrap().contains(&"Sessions".to_string()));
    }

    #[tokio::test]
    async fn init_is_a_no_op_when_the_table_is_already_active() {
        let store = Store::new(sessions_descriptor(), MockRemote::with_table("Sessions"));

        store.init().await.unwrap();

        assert_eq!(store.client.tables.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn init_reports_an_unknown_creation_status() {
        let store = sessions_store();
        *store.client.create_status.lock().unwrap() =
            Some(TableStatus::Unknown("ARCHIVED".to_string()));

        let result = store.init().await;

        assert_eq!(
            result.unwrap_err(),
            StoreError::TableStatusUnknown {
                table: "Sessions".to_string(),
                status: "ARCHIVED".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn init_times_out_when_the_table_never_becomes_active() {
        let store = Store::with_config(
            sessions_descriptor(),
            MockRemote::with_table("Sessions"),
            StoreConfig {
                create_check_timeout: Duration::from_millis(20),
                create_check_poll_interval: Duration::from_millis(1),
            },
        );
        store
            .client
            .script_statuses(std::iter::repeat_n(TableStatus::Creating, 1000));

        let result = store.init().await;

        assert!(matches!(result.unwrap_err(), StoreError::InitFailed { .. }));
    }

    #[tokio::test]
    async fn init_failures_map_to_init_failed() {
        let store = sessions_store();
        store.client.inject_failure(RemoteError::new("AccessDeniedException", "no"));

        assert!(matches!(
            store.init().await.unwrap_err(),
            StoreError::InitFailed { .. }
        ));
    }

    #[tokio::test]
    async fn destroy_deletes_an_existing_table_and_skips_a_missing_one() {
        let store = Store::new(sessions_descriptor(), MockRemote::with_table("Sessions"));
        store.destroy().await.unwrap();
        assert!(store.client.tables.lock().unwrap().is_empty());

        // Second destroy is a no-op.
        store.destroy().await.unwrap();

        let store = Store::new(sessions_descriptor(), MockRemote::with_table("Sessions"));
        store.client.inject_failure(RemoteError::new("InternalServerError", "boom"));
        assert!(matches!(
            store.destroy().await.unwrap_err(),
            StoreError::DestroyFailed { .. }
        ));
    }
}

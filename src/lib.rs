//! # Dynatable
//!
//! A declarative schema layer for DynamoDB-shaped wide-column stores:
//! describe a table once — attributes, primary key, secondary indexes,
//! throughput, projections — and get back a validated, immutable table
//! descriptor plus typed attribute accessors that convert between native
//! values and the store's wire representation.
//!
//! All structural invariants (key composition, projection limits, name
//! uniqueness, capacity bounds) are checked while the description runs,
//! before any network call. The store façade that executes CRUD and query
//! operations against the remote service is a thin pass-through that maps
//! every remote failure to one typed error.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dynatable::schema;
//! use dynatable::store::{dynamo::DynamoRemote, Store};
//! use dynatable::wire::WireType;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     dynatable::logging::setup_tracing();
//!
//!     let mut user_id = None;
//!     let descriptor = schema::describe("Sessions", |t| {
//!         let id = t.key_attr("Id", WireType::String)?;
//!         let user = t.key_attr("UserId", WireType::String)?;
//!         t.primary_key().hash(&id)?;
//!
//!         let index = t.global_index("UserIndex")?;
//!         index.hash(&user)?;
//!         index.projection().all();
//!
//!         user_id = Some(user.as_string()?);
//!         Ok(())
//!     })?;
//!
//!     let store = Store::new(descriptor, DynamoRemote::from_env().await?);
//!     store.init().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`schema`] - Table description builder, frozen descriptors, typed
//!   attribute views
//! - [`codec`] - Native value ↔ wire string conversions
//! - [`wire`] - Tagged wire values, items, keys, queries
//! - [`store`] - CRUD/query façade and the remote client boundary
//! - [`logging`] - Tracing setup
//!
//! ## Feature Flags
//!
//! - `aws` (default) - The AWS SDK implementation of the remote client
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `RUST_LOG` | Console log filter (e.g., `info`, `myapp=debug`) | `info` |
//!
//! The AWS-backed client additionally reads the standard AWS configuration
//! (credentials, region) from the environment.

/// Native value ↔ wire string conversions.
pub mod codec;

/// Logging and tracing infrastructure.
pub mod logging;

/// Declarative table descriptions and typed attribute views.
pub mod schema;

/// CRUD/query façade over one table and the remote client boundary.
pub mod store;

/// Tagged wire-value model.
pub mod wire;

//! Milvus Domain Library
//!
//! Collection lifecycle, record mutation and similarity search over a Milvus
//! vector database, shaped for a small management console.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   MilvusService                     │  ← Caller-facing operations
//! └──────┬──────────────────┬────────────────────┬──────┘
//!        │                  │                    │
//! ┌──────▼───────────┐ ┌────▼────────────┐ ┌─────▼─────────┐
//! │CollectionRegistry│ │ MutationGateway │ │  QueryEngine  │
//! │ (schema builder) │ │ (flush after)   │ │ (normalizer)  │
//! └──────┬───────────┘ └────┬────────────┘ └─────┬─────────┘
//!        └──────────────────┼────────────────────┘
//!                   ┌───────▼───────┐
//!                   │ MilvusClient  │  ← One shared connection
//!                   │   (trait)     │
//!                   └───────┬───────┘
//!                   ┌───────▼─────────┐
//!                   │MilvusRestClient │
//!                   │ (REST v2 API)   │
//!                   └─────────────────┘
//! ```
//!
//! # Consistency
//!
//! Inserts and deletes flush the collection before returning, so a caller's
//! next query sees its own writes. Metadata reads degrade to defaults (row
//! count 0, `not_loaded`, dimension 128) rather than failing.
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_milvus::{
//!     CreateCollection, MilvusConfig, MilvusRestClient, MilvusService, SearchQuery,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = MilvusRestClient::new(&MilvusConfig::default())?;
//! let service = MilvusService::new(client);
//!
//! service
//!     .create_collection(CreateCollection {
//!         name: "documents".to_string(),
//!         description: None,
//!         dimension: 4,
//!     })
//!     .await?;
//! service.load_collection("documents").await?;
//! service
//!     .insert_record("documents", 1, vec![0.1, 0.2, 0.3, 0.4])
//!     .await?;
//!
//! let outcome = service
//!     .search("documents", SearchQuery::new(vec![0.1, 0.2, 0.3, 0.4], 5))
//!     .await?;
//! println!("{} hits in {}ms", outcome.results.len(), outcome.latency_ms);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod mutation;
pub mod normalizer;
pub mod query;
pub mod registry;
pub mod rest;
pub mod schema;
pub mod service;

// Re-export commonly used types
pub use client::MilvusClient;
pub use config::{FacadeOptions, MilvusConfig};
pub use error::{MilvusError, MilvusResult};
pub use handlers::MilvusApiDoc;
pub use models::{
    CollectionLoadState, CollectionMetadata, CreateCollection, CreateCollectionOutcome,
    MutationReceipt, QueryPage, Record, SearchHit, SearchOutcome, SearchQuery,
};
pub use rest::MilvusRestClient;
pub use schema::{CollectionSpec, FieldSpec, IndexSpec, build_collection_spec};
pub use service::MilvusService;

//! Collection lifecycle and per-collection metadata.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::client::{
    CollectionDescription, CreateCollectionRequest, CreateIndexRequest, DataType, KeyValuePair,
    MilvusClient,
};
use crate::config::{FALLBACK_DIMENSION, FacadeOptions};
use crate::error::{MilvusError, MilvusResult};
use crate::models::{
    CollectionLoadState, CollectionMetadata, CreateCollection, CreateCollectionOutcome,
};
use crate::schema::build_collection_spec_with;

const ROW_COUNT_KEY: &str = "row_count";

pub struct CollectionRegistry<C: MilvusClient> {
    client: Arc<C>,
    options: FacadeOptions,
}

impl<C: MilvusClient> CollectionRegistry<C> {
    pub fn new(client: Arc<C>, options: FacadeOptions) -> Self {
        Self { client, options }
    }

    /// Best-effort existence check: driver failures read as `false`.
    #[instrument(skip(self))]
    pub async fn exists(&self, name: &str) -> bool {
        match self.client.has_collection(name).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(collection = name, error = %e, "Existence check failed, assuming absent");
                false
            }
        }
    }

    /// Creates the collection, then its vector index.
    ///
    /// An index failure leaves the collection in place and is reported as a
    /// warning on the outcome; there is no rollback.
    #[instrument(skip(self, input), fields(collection = %input.name))]
    pub async fn create(&self, input: CreateCollection) -> MilvusResult<CreateCollectionOutcome> {
        if input.name.trim().is_empty() {
            return Err(MilvusError::invalid("collection name is required"));
        }
        let spec = build_collection_spec_with(input.dimension, self.options.nlist)?;

        if self.exists(&input.name).await {
            return Err(MilvusError::AlreadyExists(input.name));
        }

        let dimension = spec.vector_dimension().unwrap_or_default();

        self.client
            .create_collection(CreateCollectionRequest {
                name: input.name.clone(),
                description: input.description.unwrap_or_default(),
                fields: spec.fields,
                shards_num: self.options.shards_num,
            })
            .await?;
        info!(dimension, "Created collection");

        let index_result = self
            .client
            .create_index(CreateIndexRequest {
                collection_name: input.name.clone(),
                index: spec.index,
            })
            .await;

        let warning = match index_result {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "Collection created but index creation failed");
                Some(format!("collection created without index: {}", e))
            }
        };

        Ok(CreateCollectionOutcome {
            name: input.name,
            dimension,
            indexed: warning.is_none(),
            warning,
        })
    }

    /// Drops the collection; unknown names surface the driver's error.
    #[instrument(skip(self))]
    pub async fn drop(&self, name: &str) -> MilvusResult<()> {
        self.client.drop_collection(name).await?;
        info!(collection = name, "Dropped collection");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn load(&self, name: &str) -> MilvusResult<()> {
        self.client.load_collection(name).await?;
        info!(collection = name, "Load requested");
        Ok(())
    }

    /// Composes statistics, load state and schema into one record.
    ///
    /// Never fails: each sub-call degrades to its default on error.
    #[instrument(skip(self))]
    pub async fn describe_one(&self, name: &str) -> CollectionMetadata {
        let count = self.row_count(name).await.unwrap_or_else(|e| {
            warn!(collection = name, error = %e, "Statistics unavailable, reporting 0 rows");
            0
        });

        let status = match self.client.get_load_state(name).await {
            Ok(state) => CollectionLoadState::from(state),
            Err(e) => {
                warn!(collection = name, error = %e, "Load state unavailable, reporting not_loaded");
                CollectionLoadState::NotLoaded
            }
        };

        let (description, dimension) = match self.client.describe_collection(name).await {
            Ok(schema) => {
                let dimension = dimension_of(&schema).unwrap_or_else(|| {
                    warn!(
                        collection = name,
                        fallback = FALLBACK_DIMENSION,
                        "No float vector dimension in schema, using fallback"
                    );
                    FALLBACK_DIMENSION
                });
                (schema.description, dimension)
            }
            Err(e) => {
                warn!(
                    collection = name,
                    error = %e,
                    fallback = FALLBACK_DIMENSION,
                    "Schema unavailable, using fallback dimension"
                );
                (String::new(), FALLBACK_DIMENSION)
            }
        };

        CollectionMetadata {
            name: name.to_string(),
            description,
            dimension,
            count,
            status,
        }
    }

    /// Metadata for every collection, in enumeration order. An enumeration
    /// failure yields an empty list.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Vec<CollectionMetadata> {
        let names = match self.client.show_collections().await {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "Failed to enumerate collections");
                return Vec::new();
            }
        };

        let mut collections = Vec::with_capacity(names.len());
        for name in names {
            collections.push(self.describe_one(&name).await);
        }
        collections
    }

    /// Vector dimension, or the fallback (128) when it cannot be recovered.
    pub async fn vector_dimension(&self, name: &str) -> u32 {
        match self.try_vector_dimension(name).await {
            Ok(Some(dimension)) => dimension,
            Ok(None) => {
                warn!(collection = name, fallback = FALLBACK_DIMENSION, "Vector field not found");
                FALLBACK_DIMENSION
            }
            Err(e) => {
                warn!(collection = name, error = %e, fallback = FALLBACK_DIMENSION, "Describe failed");
                FALLBACK_DIMENSION
            }
        }
    }

    /// Strict dimension lookup: `None` when the schema has no float vector
    /// field with a parsable `dim`.
    #[instrument(skip(self))]
    pub async fn try_vector_dimension(&self, name: &str) -> MilvusResult<Option<u32>> {
        let schema = self.client.describe_collection(name).await?;
        Ok(dimension_of(&schema))
    }

    /// Row count from the statistics call.
    pub async fn row_count(&self, name: &str) -> MilvusResult<u64> {
        let stats = self.client.get_collection_statistics(name).await?;
        Ok(row_count_of(&stats))
    }
}

fn dimension_of(schema: &CollectionDescription) -> Option<u32> {
    schema
        .fields
        .iter()
        .find(|f| f.data_type == DataType::FloatVector)
        .and_then(|f| f.type_param("dim"))
        .and_then(|dim| dim.trim().parse().ok())
}

pub(crate) fn row_count_of(stats: &[KeyValuePair]) -> u64 {
    stats
        .iter()
        .find(|kv| kv.key == ROW_COUNT_KEY)
        .and_then(|kv| kv.value.trim().parse().ok())
        .unwrap_or(0)
}

use std::sync::Arc;

use rand::Rng;
use tracing::{error, instrument};

use crate::client::MilvusClient;
use crate::config::FacadeOptions;
use crate::error::{MilvusError, MilvusResult};
use crate::models::{
    CollectionMetadata, CreateCollection, CreateCollectionOutcome, MutationReceipt, QueryPage,
    Record, SearchOutcome, SearchQuery,
};
use crate::mutation::MutationGateway;
use crate::query::QueryEngine;
use crate::registry::CollectionRegistry;

/// Collection name used by the connection check. It does not need to exist.
const CHECK_COLLECTION: &str = "test_connection";

/// Checks a client with one cheap existence call.
///
/// Unlike [`CollectionRegistry::exists`], driver failures are returned to the
/// caller instead of being folded into `false`.
pub async fn test_connection<C: MilvusClient + ?Sized>(client: &C) -> MilvusResult<()> {
    client.has_collection(CHECK_COLLECTION).await.map(|_| ())
}

/// Milvus service providing the caller-facing operations.
///
/// One client connection is shared by the registry, the mutation gateway and
/// the query engine; none of them hold any other state.
pub struct MilvusService<C: MilvusClient> {
    client: Arc<C>,
    registry: CollectionRegistry<C>,
    mutations: MutationGateway<C>,
    queries: QueryEngine<C>,
}

impl<C: MilvusClient> MilvusService<C> {
    pub fn new(client: C) -> Self {
        Self::with_options(client, FacadeOptions::default())
    }

    pub fn with_options(client: C, options: FacadeOptions) -> Self {
        let client = Arc::new(client);
        Self {
            registry: CollectionRegistry::new(client.clone(), options),
            mutations: MutationGateway::new(client.clone()),
            queries: QueryEngine::new(client.clone(), options),
            client,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub async fn test_connection(&self) -> MilvusResult<()> {
        test_connection(self.client.as_ref()).await
    }

    // ===== Collections =====

    pub async fn list_collections(&self) -> Vec<CollectionMetadata> {
        self.registry.list_all().await
    }

    /// Metadata for one named collection. Unknown names fail with the
    /// database's own not-found error; only the sub-reads of an existing
    /// collection degrade to defaults.
    pub async fn describe_collection(&self, name: &str) -> MilvusResult<CollectionMetadata> {
        require_name(name)?;
        let exists = self
            .client
            .has_collection(name)
            .await
            .inspect_err(log_failure)?;
        if !exists {
            self.client
                .describe_collection(name)
                .await
                .inspect_err(log_failure)?;
        }
        Ok(self.registry.describe_one(name).await)
    }

    pub async fn collection_exists(&self, name: &str) -> bool {
        self.registry.exists(name).await
    }

    pub async fn create_collection(
        &self,
        input: CreateCollection,
    ) -> MilvusResult<CreateCollectionOutcome> {
        self.registry.create(input).await.inspect_err(log_failure)
    }

    pub async fn drop_collection(&self, name: &str) -> MilvusResult<()> {
        require_name(name)?;
        self.registry.drop(name).await.inspect_err(log_failure)
    }

    pub async fn load_collection(&self, name: &str) -> MilvusResult<()> {
        require_name(name)?;
        self.registry.load(name).await.inspect_err(log_failure)
    }

    pub async fn vector_dimension(&self, name: &str) -> u32 {
        self.registry.vector_dimension(name).await
    }

    pub async fn try_vector_dimension(&self, name: &str) -> MilvusResult<Option<u32>> {
        self.registry.try_vector_dimension(name).await
    }

    // ===== Records =====

    pub async fn insert_record(
        &self,
        collection_name: &str,
        id: i64,
        vector: Vec<f32>,
    ) -> MilvusResult<MutationReceipt> {
        require_name(collection_name)?;
        self.mutations
            .insert(collection_name, id, vector)
            .await
            .inspect_err(log_failure)
    }

    pub async fn insert_records(
        &self,
        collection_name: &str,
        records: Vec<Record>,
    ) -> MilvusResult<MutationReceipt> {
        require_name(collection_name)?;
        self.mutations
            .insert_records(collection_name, records)
            .await
            .inspect_err(log_failure)
    }

    pub async fn delete_record(&self, collection_name: &str, id: i64) -> MilvusResult<MutationReceipt> {
        require_name(collection_name)?;
        self.mutations
            .delete(collection_name, id)
            .await
            .inspect_err(log_failure)
    }

    pub async fn query_page(
        &self,
        collection_name: &str,
        page: u32,
        page_size: u32,
    ) -> MilvusResult<QueryPage> {
        require_name(collection_name)?;
        self.queries
            .query_page(collection_name, page, page_size)
            .await
            .inspect_err(log_failure)
    }

    pub async fn search(&self, collection_name: &str, query: SearchQuery) -> MilvusResult<SearchOutcome> {
        require_name(collection_name)?;
        self.queries
            .search(collection_name, query)
            .await
            .inspect_err(log_failure)
    }

    /// Uniform `[0, 1)` vector sized to the collection's recovered dimension.
    #[instrument(skip(self))]
    pub async fn random_vector(&self, collection_name: &str) -> MilvusResult<Vec<f32>> {
        require_name(collection_name)?;
        let dimension = self.registry.vector_dimension(collection_name).await;
        Ok(random_vector(dimension as usize))
    }
}

pub fn random_vector(dimension: usize) -> Vec<f32> {
    let mut rng = rand::rng();
    (0..dimension).map(|_| rng.random::<f32>()).collect()
}

fn require_name(name: &str) -> MilvusResult<()> {
    if name.trim().is_empty() {
        return Err(MilvusError::invalid("collection name is required"));
    }
    Ok(())
}

fn log_failure(e: &MilvusError) {
    match e {
        MilvusError::Upstream { code, message } => {
            error!(code, message = %message, "Milvus rejected the request")
        }
        MilvusError::Transport(_) => error!(error = %e, "Milvus is unreachable"),
        _ => {}
    }
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::client::LoadState;
use crate::error::{MilvusError, MilvusResult};
use crate::normalizer::{FieldValue, NormalizedRow};

/// Whether a collection is resident in query-serving memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CollectionLoadState {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
}

impl CollectionLoadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionLoadState::NotLoaded => "not_loaded",
            CollectionLoadState::Loading => "loading",
            CollectionLoadState::Loaded => "loaded",
        }
    }
}

impl From<LoadState> for CollectionLoadState {
    fn from(state: LoadState) -> Self {
        match state {
            LoadState::Loaded => CollectionLoadState::Loaded,
            LoadState::Loading => CollectionLoadState::Loading,
            LoadState::NotLoad | LoadState::NotExist => CollectionLoadState::NotLoaded,
        }
    }
}

/// Collection record composed from statistics, load state and schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CollectionMetadata {
    pub name: String,
    pub description: String,
    pub dimension: u32,
    /// Row count as last reported by the database
    pub count: u64,
    pub status: CollectionLoadState,
}

/// Input for creating a collection
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateCollection {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub dimension: i64,
}

/// Result of a create call. `warning` is set when the collection exists
/// but its index could not be built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreateCollectionOutcome {
    pub name: String,
    pub dimension: u32,
    pub indexed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Record {
    pub id: i64,
    pub vector: Vec<f32>,
}

impl Record {
    pub fn new(id: i64, vector: Vec<f32>) -> Self {
        Self { id, vector }
    }
}

impl TryFrom<&NormalizedRow> for Record {
    type Error = MilvusError;

    fn try_from(row: &NormalizedRow) -> MilvusResult<Self> {
        let id = row
            .get("id")
            .and_then(FieldValue::as_i64)
            .ok_or_else(|| MilvusError::Internal("query row is missing id".to_string()))?;
        let vector = row
            .get("vector")
            .and_then(FieldValue::as_vector)
            .map(<[f32]>::to_vec)
            .unwrap_or_default();

        Ok(Record { id, vector })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MutationReceipt {
    pub affected: u64,
    /// False when the follow-up flush failed; the mutation itself succeeded.
    pub flushed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryPage {
    pub data: Vec<Record>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub has_more: bool,
}

/// One ranked search hit; rows are ascending by L2 distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchHit {
    pub rank: u32,
    pub id: i64,
    pub distance: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}

impl TryFrom<&NormalizedRow> for SearchHit {
    type Error = MilvusError;

    fn try_from(row: &NormalizedRow) -> MilvusResult<Self> {
        let missing = |field: &str| MilvusError::Internal(format!("search row is missing {}", field));

        let rank = row
            .get("rank")
            .and_then(FieldValue::as_i64)
            .ok_or_else(|| missing("rank"))?;
        let id = row
            .get("id")
            .and_then(FieldValue::as_i64)
            .ok_or_else(|| missing("id"))?;
        let distance = row
            .get("distance")
            .and_then(FieldValue::as_f32)
            .ok_or_else(|| missing("distance"))?;
        let vector = row
            .get("vector")
            .and_then(FieldValue::as_vector)
            .map(<[f32]>::to_vec);

        Ok(SearchHit {
            rank: rank as u32,
            id,
            distance,
            vector,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub results: Vec<SearchHit>,
    /// Wall-clock time of the search round-trip; informational only
    pub latency_ms: u64,
}

/// Search parameters
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchQuery {
    pub vector: Vec<f32>,
    pub top_k: u32,
    pub with_vectors: bool,
}

impl SearchQuery {
    pub fn new(vector: Vec<f32>, top_k: u32) -> Self {
        Self {
            vector,
            top_k,
            with_vectors: false,
        }
    }

    pub fn with_vectors(mut self, with_vectors: bool) -> Self {
        self.with_vectors = with_vectors;
        self
    }
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MilvusResult;
use crate::schema::{FieldSpec, IndexSpec, MetricType};

/// Field data type as reported by the database's schema description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Int64,
    Float,
    FloatVector,
    VarChar,
    Other,
}

impl DataType {
    pub fn parse(name: &str) -> Self {
        match name {
            "Int64" => DataType::Int64,
            "Float" => DataType::Float,
            "FloatVector" => DataType::FloatVector,
            "VarChar" => DataType::VarChar,
            _ => DataType::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValuePair {
    pub key: String,
    pub value: String,
}

impl KeyValuePair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    pub data_type: DataType,
    pub is_primary: bool,
    pub auto_id: bool,
    pub type_params: Vec<KeyValuePair>,
}

impl FieldSchema {
    pub fn type_param(&self, key: &str) -> Option<&str> {
        self.type_params
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDescription {
    pub name: String,
    pub description: String,
    pub fields: Vec<FieldSchema>,
}

/// Load state as the database reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadState {
    NotExist,
    NotLoad,
    Loading,
    Loaded,
}

impl LoadState {
    pub fn parse(value: &str) -> Self {
        match value {
            "LoadStateLoaded" => LoadState::Loaded,
            "LoadStateLoading" => LoadState::Loading,
            "LoadStateNotExist" => LoadState::NotExist,
            _ => LoadState::NotLoad,
        }
    }
}

/// Column-oriented field data, one entry per row.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldData {
    Int64(Vec<i64>),
    Float(Vec<f32>),
    /// Row-major, `dim` floats per row.
    FloatVector { dim: usize, data: Vec<f32> },
}

impl FieldData {
    pub fn len(&self) -> usize {
        match self {
            FieldData::Int64(v) => v.len(),
            FieldData::Float(v) => v.len(),
            FieldData::FloatVector { dim, data } => {
                if *dim == 0 {
                    0
                } else {
                    data.len() / dim
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn vector_at(&self, row: usize) -> Option<&[f32]> {
        match self {
            FieldData::FloatVector { dim, data } => data.get(row * dim..(row + 1) * dim),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldColumn {
    pub name: String,
    pub data: FieldData,
}

impl FieldColumn {
    pub fn new(name: impl Into<String>, data: FieldData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResultSet {
    pub row_count: usize,
    pub columns: Vec<FieldColumn>,
}

impl RawResultSet {
    pub fn column(&self, name: &str) -> Option<&FieldColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Hits for a single query vector, in the order the database ranked them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSearchResults {
    pub ids: Vec<i64>,
    pub scores: Vec<f32>,
    pub columns: Vec<FieldColumn>,
}

impl RawSearchResults {
    pub fn column(&self, name: &str) -> Option<&FieldColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateCollectionRequest {
    pub name: String,
    pub description: String,
    pub fields: Vec<FieldSpec>,
    pub shards_num: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndexRequest {
    pub collection_name: String,
    pub index: IndexSpec,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertRequest {
    pub collection_name: String,
    pub columns: Vec<FieldColumn>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteRequest {
    pub collection_name: String,
    pub expr: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub collection_name: String,
    pub expr: String,
    pub output_fields: Vec<String>,
    pub offset: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub collection_name: String,
    pub vector_field: String,
    pub metric: MetricType,
    pub vectors: Vec<Vec<f32>>,
    pub top_k: u32,
    pub nprobe: u32,
    pub output_fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationResult {
    pub affected: u64,
}

/// Capability-based client for the vector database.
///
/// Each call is a single round-trip. Any non-success status comes back as
/// `MilvusError::Upstream` carrying the database's message unchanged.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MilvusClient: Send + Sync {
    async fn has_collection(&self, name: &str) -> MilvusResult<bool>;

    async fn create_collection(&self, request: CreateCollectionRequest) -> MilvusResult<()>;

    async fn drop_collection(&self, name: &str) -> MilvusResult<()>;

    async fn load_collection(&self, name: &str) -> MilvusResult<()>;

    async fn describe_collection(&self, name: &str) -> MilvusResult<CollectionDescription>;

    async fn get_collection_statistics(&self, name: &str) -> MilvusResult<Vec<KeyValuePair>>;

    async fn get_load_state(&self, name: &str) -> MilvusResult<LoadState>;

    /// Collection names in the database's enumeration order.
    async fn show_collections(&self) -> MilvusResult<Vec<String>>;

    async fn create_index(&self, request: CreateIndexRequest) -> MilvusResult<()>;

    async fn insert(&self, request: InsertRequest) -> MilvusResult<MutationResult>;

    async fn delete(&self, request: DeleteRequest) -> MilvusResult<MutationResult>;

    async fn query(&self, request: QueryRequest) -> MilvusResult<RawResultSet>;

    async fn search(&self, request: SearchRequest) -> MilvusResult<RawSearchResults>;

    async fn flush(&self, collection_names: Vec<String>) -> MilvusResult<()>;
}

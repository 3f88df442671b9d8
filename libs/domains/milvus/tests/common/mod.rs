//! In-memory `MilvusClient` for handler tests.
//!
//! Mirrors the behaviour the façade relies on: inserts and deletes stay
//! invisible until flushed, search and query require a loaded collection,
//! and search ranks by ascending L2 distance.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use domain_milvus::MilvusResult;
use domain_milvus::client::{
    CollectionDescription, CreateCollectionRequest, CreateIndexRequest, DataType, DeleteRequest,
    FieldColumn, FieldData, FieldSchema, InsertRequest, KeyValuePair, LoadState, MilvusClient,
    MutationResult, QueryRequest, RawResultSet, RawSearchResults, SearchRequest,
};
use domain_milvus::error::MilvusError;
use domain_milvus::schema::FieldSpec;

enum Pending {
    Upsert(i64, Vec<f32>),
    Delete(i64),
}

struct Collection {
    description: String,
    dimension: usize,
    loaded: bool,
    rows: BTreeMap<i64, Vec<f32>>,
    pending: Vec<Pending>,
}

#[derive(Default)]
struct State {
    // Creation order, as the database enumerates.
    order: Vec<String>,
    collections: BTreeMap<String, Collection>,
}

#[derive(Default)]
pub struct InMemoryMilvus {
    state: Mutex<State>,
    fail_index: bool,
}

impl InMemoryMilvus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index creation always fails, leaving collections unindexed.
    pub fn failing_index() -> Self {
        Self {
            fail_index: true,
            ..Self::default()
        }
    }
}

fn not_found(name: &str) -> MilvusError {
    MilvusError::upstream(100, format!("collection not found[collection={}]", name))
}

fn not_loaded(name: &str) -> MilvusError {
    MilvusError::upstream(101, format!("collection not loaded[collection={}]", name))
}

/// Parses the `id == <n>` filter the gateway emits.
fn parse_id_filter(expr: &str) -> MilvusResult<i64> {
    expr.strip_prefix("id == ")
        .and_then(|id| id.trim().parse().ok())
        .ok_or_else(|| MilvusError::upstream(1100, format!("cannot parse expression: {}", expr)))
}

fn l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl State {
    fn get(&self, name: &str) -> MilvusResult<&Collection> {
        self.collections.get(name).ok_or_else(|| not_found(name))
    }

    fn get_mut(&mut self, name: &str) -> MilvusResult<&mut Collection> {
        self.collections.get_mut(name).ok_or_else(|| not_found(name))
    }
}

fn columns_for(output_fields: &[String], rows: &[(i64, Vec<f32>)], dim: usize) -> Vec<FieldColumn> {
    output_fields
        .iter()
        .map(|field| match field.as_str() {
            "vector" => FieldColumn::new(
                "vector",
                FieldData::FloatVector {
                    dim,
                    data: rows.iter().flat_map(|(_, v)| v.clone()).collect(),
                },
            ),
            _ => FieldColumn::new(
                field.clone(),
                FieldData::Int64(rows.iter().map(|(id, _)| *id).collect()),
            ),
        })
        .collect()
}

#[async_trait]
impl MilvusClient for InMemoryMilvus {
    async fn has_collection(&self, name: &str) -> MilvusResult<bool> {
        Ok(self.state.lock().unwrap().collections.contains_key(name))
    }

    async fn create_collection(&self, request: CreateCollectionRequest) -> MilvusResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.collections.contains_key(&request.name) {
            return Err(MilvusError::upstream(65535, "collection already exists"));
        }
        let dimension = request
            .fields
            .iter()
            .find_map(FieldSpec::dimension)
            .unwrap_or_default() as usize;
        state.order.push(request.name.clone());
        state.collections.insert(
            request.name,
            Collection {
                description: request.description,
                dimension,
                loaded: false,
                rows: BTreeMap::new(),
                pending: Vec::new(),
            },
        );
        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> MilvusResult<()> {
        let mut state = self.state.lock().unwrap();
        state.collections.remove(name).ok_or_else(|| not_found(name))?;
        state.order.retain(|n| n != name);
        Ok(())
    }

    async fn load_collection(&self, name: &str) -> MilvusResult<()> {
        self.state.lock().unwrap().get_mut(name)?.loaded = true;
        Ok(())
    }

    async fn describe_collection(&self, name: &str) -> MilvusResult<CollectionDescription> {
        let state = self.state.lock().unwrap();
        let collection = state.get(name)?;
        Ok(CollectionDescription {
            name: name.to_string(),
            description: collection.description.clone(),
            fields: vec![
                FieldSchema {
                    name: "id".to_string(),
                    data_type: DataType::Int64,
                    is_primary: true,
                    auto_id: false,
                    type_params: vec![],
                },
                FieldSchema {
                    name: "vector".to_string(),
                    data_type: DataType::FloatVector,
                    is_primary: false,
                    auto_id: false,
                    type_params: vec![KeyValuePair::new("dim", collection.dimension.to_string())],
                },
            ],
        })
    }

    async fn get_collection_statistics(&self, name: &str) -> MilvusResult<Vec<KeyValuePair>> {
        let state = self.state.lock().unwrap();
        let rows = state.get(name)?.rows.len();
        Ok(vec![KeyValuePair::new("row_count", rows.to_string())])
    }

    async fn get_load_state(&self, name: &str) -> MilvusResult<LoadState> {
        let state = self.state.lock().unwrap();
        Ok(match state.collections.get(name) {
            None => LoadState::NotExist,
            Some(c) if c.loaded => LoadState::Loaded,
            Some(_) => LoadState::NotLoad,
        })
    }

    async fn show_collections(&self) -> MilvusResult<Vec<String>> {
        Ok(self.state.lock().unwrap().order.clone())
    }

    async fn create_index(&self, request: CreateIndexRequest) -> MilvusResult<()> {
        if self.fail_index {
            return Err(MilvusError::upstream(1100, "index type not supported"));
        }
        self.state.lock().unwrap().get(&request.collection_name)?;
        Ok(())
    }

    async fn insert(&self, request: InsertRequest) -> MilvusResult<MutationResult> {
        let mut state = self.state.lock().unwrap();
        let collection = state.get_mut(&request.collection_name)?;

        let ids = match request.columns.iter().find(|c| c.name == "id").map(|c| &c.data) {
            Some(FieldData::Int64(ids)) => ids.clone(),
            _ => return Err(MilvusError::upstream(1100, "missing id column")),
        };
        let vectors = match request.columns.iter().find(|c| c.name == "vector") {
            Some(column) => column,
            None => return Err(MilvusError::upstream(1100, "missing vector column")),
        };
        if let FieldData::FloatVector { dim, .. } = &vectors.data {
            if *dim != collection.dimension {
                return Err(MilvusError::upstream(
                    1100,
                    format!(
                        "the dim ({}) of field data(vector) is not equal to schema dim ({})",
                        dim, collection.dimension
                    ),
                ));
            }
        }

        for (row, id) in ids.iter().enumerate() {
            let vector = vectors.data.vector_at(row).unwrap_or_default().to_vec();
            collection.pending.push(Pending::Upsert(*id, vector));
        }
        Ok(MutationResult {
            affected: ids.len() as u64,
        })
    }

    async fn delete(&self, request: DeleteRequest) -> MilvusResult<MutationResult> {
        let id = parse_id_filter(&request.expr)?;
        let mut state = self.state.lock().unwrap();
        let collection = state.get_mut(&request.collection_name)?;
        collection.pending.push(Pending::Delete(id));
        Ok(MutationResult {
            affected: u64::from(collection.rows.contains_key(&id)),
        })
    }

    async fn query(&self, request: QueryRequest) -> MilvusResult<RawResultSet> {
        let state = self.state.lock().unwrap();
        let collection = state.get(&request.collection_name)?;
        if !collection.loaded {
            return Err(not_loaded(&request.collection_name));
        }

        let rows: Vec<(i64, Vec<f32>)> = collection
            .rows
            .iter()
            .filter(|(id, _)| **id >= 0)
            .skip(request.offset as usize)
            .take(request.limit as usize)
            .map(|(id, v)| (*id, v.clone()))
            .collect();

        Ok(RawResultSet {
            row_count: rows.len(),
            columns: columns_for(&request.output_fields, &rows, collection.dimension),
        })
    }

    async fn search(&self, request: SearchRequest) -> MilvusResult<RawSearchResults> {
        let state = self.state.lock().unwrap();
        let collection = state.get(&request.collection_name)?;
        if !collection.loaded {
            return Err(not_loaded(&request.collection_name));
        }
        let query = request.vectors.first().cloned().unwrap_or_default();
        if query.len() != collection.dimension {
            return Err(MilvusError::upstream(
                1100,
                format!(
                    "vector dimension mismatch, expected vector size(byte) {}, actual {}",
                    collection.dimension * 4,
                    query.len() * 4
                ),
            ));
        }

        let mut scored: Vec<(f32, i64, Vec<f32>)> = collection
            .rows
            .iter()
            .map(|(id, v)| (l2(&query, v), *id, v.clone()))
            .collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        scored.truncate(request.top_k as usize);

        let rows: Vec<(i64, Vec<f32>)> = scored.iter().map(|(_, id, v)| (*id, v.clone())).collect();
        let extra: Vec<String> = request
            .output_fields
            .iter()
            .filter(|f| f.as_str() != "id")
            .cloned()
            .collect();

        Ok(RawSearchResults {
            ids: rows.iter().map(|(id, _)| *id).collect(),
            scores: scored.iter().map(|(d, _, _)| *d).collect(),
            columns: columns_for(&extra, &rows, collection.dimension),
        })
    }

    async fn flush(&self, collection_names: Vec<String>) -> MilvusResult<()> {
        let mut state = self.state.lock().unwrap();
        for name in collection_names {
            let collection = state.get_mut(&name)?;
            for change in collection.pending.drain(..) {
                match change {
                    Pending::Upsert(id, vector) => {
                        collection.rows.insert(id, vector);
                    }
                    Pending::Delete(id) => {
                        collection.rows.remove(&id);
                    }
                }
            }
        }
        Ok(())
    }
}

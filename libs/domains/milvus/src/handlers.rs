//! HTTP handlers for the Milvus console API

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::client::MilvusClient;
use crate::config::MilvusConfig;
use crate::error::MilvusResult;
use crate::models::{
    CollectionLoadState, CollectionMetadata, CreateCollection, CreateCollectionOutcome,
    MutationReceipt, QueryPage, Record, SearchHit, SearchOutcome, SearchQuery,
};
use crate::rest::MilvusRestClient;
use crate::service::{self, MilvusService};

// ===== Request/Response DTOs =====

/// Connection parameters to check
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size", rename = "pageSize")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    10
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InsertParams {
    /// Caller-supplied primary key
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    #[serde(default = "default_top_k", rename = "topK")]
    pub top_k: u32,
    /// Echo each hit's vector
    #[serde(default, rename = "withVectors")]
    pub with_vectors: bool,
}

fn default_top_k() -> u32 {
    10
}

/// Success body: a message plus the operation's payload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActionResponse<T> {
    pub message: String,
    pub data: T,
}

impl<T> ActionResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

/// Success body without a payload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RandomVectorResponse {
    pub dimension: usize,
    pub vector: Vec<f32>,
}

type Shared<C> = State<Arc<MilvusService<C>>>;

// ===== Connection =====

/// Check a Milvus endpoint without changing the served connection
#[utoipa::path(
    get,
    path = "/connect",
    tag = "milvus",
    params(ConnectParams),
    responses(
        (status = 200, description = "Connection succeeded", body = MessageResponse),
        (status = 400, description = "Milvus rejected the connection check"),
        (status = 503, description = "Milvus unreachable")
    )
)]
pub async fn connect(
    Query(params): Query<ConnectParams>,
) -> MilvusResult<Json<MessageResponse>> {
    let config = MilvusConfig::new(params.host, params.port)
        .with_credentials(params.username, params.password);
    let client = MilvusRestClient::new(&config)?;
    service::test_connection(&client).await?;
    Ok(Json(MessageResponse::new("Connection succeeded")))
}

// ===== Collections =====

/// List all collections with their metadata
#[utoipa::path(
    get,
    path = "/collections",
    tag = "milvus",
    responses(
        (status = 200, description = "Collections in enumeration order", body = Vec<CollectionMetadata>)
    )
)]
pub async fn list_collections<C: MilvusClient>(
    State(service): Shared<C>,
) -> Json<Vec<CollectionMetadata>> {
    Json(service.list_collections().await)
}

/// Create a collection and its vector index
#[utoipa::path(
    post,
    path = "/collections",
    tag = "milvus",
    request_body = CreateCollection,
    responses(
        (status = 201, description = "Collection created", body = ActionResponse<CreateCollectionOutcome>),
        (status = 400, description = "Invalid dimension or rejected by Milvus"),
        (status = 409, description = "Collection already exists")
    )
)]
pub async fn create_collection<C: MilvusClient>(
    State(service): Shared<C>,
    Json(input): Json<CreateCollection>,
) -> MilvusResult<(StatusCode, Json<ActionResponse<CreateCollectionOutcome>>)> {
    let outcome = service.create_collection(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ActionResponse::new("Collection created", outcome)),
    ))
}

/// Describe one collection
#[utoipa::path(
    get,
    path = "/collections/{name}",
    tag = "milvus",
    params(("name" = String, Path, description = "Collection name")),
    responses(
        (status = 200, description = "Collection metadata", body = CollectionMetadata),
        (status = 400, description = "Unknown collection, database message verbatim")
    )
)]
pub async fn get_collection<C: MilvusClient>(
    State(service): Shared<C>,
    Path(name): Path<String>,
) -> MilvusResult<Json<CollectionMetadata>> {
    Ok(Json(service.describe_collection(&name).await?))
}

/// Drop a collection
#[utoipa::path(
    delete,
    path = "/collections/{name}",
    tag = "milvus",
    params(("name" = String, Path, description = "Collection name")),
    responses(
        (status = 200, description = "Collection dropped", body = MessageResponse),
        (status = 400, description = "Rejected by Milvus, e.g. unknown collection")
    )
)]
pub async fn drop_collection<C: MilvusClient>(
    State(service): Shared<C>,
    Path(name): Path<String>,
) -> MilvusResult<Json<MessageResponse>> {
    service.drop_collection(&name).await?;
    Ok(Json(MessageResponse::new("Collection dropped")))
}

/// Load a collection into memory for query and search
#[utoipa::path(
    post,
    path = "/collections/{name}/load",
    tag = "milvus",
    params(("name" = String, Path, description = "Collection name")),
    responses(
        (status = 200, description = "Collection loaded", body = MessageResponse),
        (status = 400, description = "Rejected by Milvus")
    )
)]
pub async fn load_collection<C: MilvusClient>(
    State(service): Shared<C>,
    Path(name): Path<String>,
) -> MilvusResult<Json<MessageResponse>> {
    service.load_collection(&name).await?;
    Ok(Json(MessageResponse::new("Collection loaded")))
}

// ===== Records =====

/// Page through a collection's records
#[utoipa::path(
    get,
    path = "/collections/{name}/data",
    tag = "milvus",
    params(("name" = String, Path, description = "Collection name"), PageParams),
    responses(
        (status = 200, description = "One page of records", body = QueryPage),
        (status = 400, description = "Invalid page or rejected by Milvus")
    )
)]
pub async fn query_page<C: MilvusClient>(
    State(service): Shared<C>,
    Path(name): Path<String>,
    Query(params): Query<PageParams>,
) -> MilvusResult<Json<QueryPage>> {
    Ok(Json(
        service
            .query_page(&name, params.page, params.page_size)
            .await?,
    ))
}

/// Insert one record; the body is the vector
#[utoipa::path(
    post,
    path = "/collections/{name}/data",
    tag = "milvus",
    params(("name" = String, Path, description = "Collection name"), InsertParams),
    request_body = Vec<f32>,
    responses(
        (status = 200, description = "Record inserted and flushed", body = ActionResponse<MutationReceipt>),
        (status = 400, description = "Rejected by Milvus, e.g. dimension mismatch")
    )
)]
pub async fn insert_record<C: MilvusClient>(
    State(service): Shared<C>,
    Path(name): Path<String>,
    Query(params): Query<InsertParams>,
    Json(vector): Json<Vec<f32>>,
) -> MilvusResult<Json<ActionResponse<MutationReceipt>>> {
    let receipt = service.insert_record(&name, params.id, vector).await?;
    Ok(Json(ActionResponse::new("Record inserted", receipt)))
}

/// Delete a record by id; unknown ids succeed
#[utoipa::path(
    delete,
    path = "/collections/{name}/data/{id}",
    tag = "milvus",
    params(
        ("name" = String, Path, description = "Collection name"),
        ("id" = i64, Path, description = "Record id")
    ),
    responses(
        (status = 200, description = "Record deleted", body = ActionResponse<MutationReceipt>),
        (status = 400, description = "Rejected by Milvus")
    )
)]
pub async fn delete_record<C: MilvusClient>(
    State(service): Shared<C>,
    Path((name, id)): Path<(String, i64)>,
) -> MilvusResult<Json<ActionResponse<MutationReceipt>>> {
    let receipt = service.delete_record(&name, id).await?;
    Ok(Json(ActionResponse::new("Record deleted", receipt)))
}

/// L2 nearest-neighbour search; the body is the query vector
#[utoipa::path(
    post,
    path = "/collections/{name}/search",
    tag = "milvus",
    params(("name" = String, Path, description = "Collection name"), SearchParams),
    request_body = Vec<f32>,
    responses(
        (status = 200, description = "Ranked hits and latency", body = SearchOutcome),
        (status = 400, description = "Invalid topK or rejected by Milvus")
    )
)]
pub async fn search<C: MilvusClient>(
    State(service): Shared<C>,
    Path(name): Path<String>,
    Query(params): Query<SearchParams>,
    Json(vector): Json<Vec<f32>>,
) -> MilvusResult<Json<SearchOutcome>> {
    let query = SearchQuery::new(vector, params.top_k).with_vectors(params.with_vectors);
    Ok(Json(service.search(&name, query).await?))
}

/// Random vector sized to the collection, for trying out searches
#[utoipa::path(
    get,
    path = "/collections/{name}/random-vector",
    tag = "milvus",
    params(("name" = String, Path, description = "Collection name")),
    responses(
        (status = 200, description = "Uniform [0, 1) vector", body = RandomVectorResponse)
    )
)]
pub async fn random_vector<C: MilvusClient>(
    State(service): Shared<C>,
    Path(name): Path<String>,
) -> MilvusResult<Json<RandomVectorResponse>> {
    let vector = service.random_vector(&name).await?;
    Ok(Json(RandomVectorResponse {
        dimension: vector.len(),
        vector,
    }))
}

/// OpenAPI documentation for the Milvus console API
#[derive(OpenApi)]
#[openapi(
    paths(
        connect,
        list_collections,
        create_collection,
        get_collection,
        drop_collection,
        load_collection,
        query_page,
        insert_record,
        delete_record,
        search,
        random_vector,
    ),
    components(
        schemas(
            CollectionMetadata, CollectionLoadState, CreateCollection, CreateCollectionOutcome,
            MutationReceipt, QueryPage, Record, SearchHit, SearchOutcome, RandomVectorResponse,
            MessageResponse
        )
    ),
    tags(
        (name = "milvus", description = "Milvus collection management, records and search")
    )
)]
pub struct MilvusApiDoc;

/// Router over a shared [`MilvusService`]; mount it under `/api/milvus`.
pub fn router<C: MilvusClient + 'static>(service: Arc<MilvusService<C>>) -> Router {
    Router::new()
        .route("/connect", get(connect))
        .route(
            "/collections",
            get(list_collections::<C>).post(create_collection::<C>),
        )
        .route(
            "/collections/{name}",
            get(get_collection::<C>).delete(drop_collection::<C>),
        )
        .route("/collections/{name}/load", post(load_collection::<C>))
        .route(
            "/collections/{name}/data",
            get(query_page::<C>).post(insert_record::<C>),
        )
        .route("/collections/{name}/data/{id}", delete(delete_record::<C>))
        .route("/collections/{name}/search", post(search::<C>))
        .route(
            "/collections/{name}/random-vector",
            get(random_vector::<C>),
        )
        .with_state(service)
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use super::conversions;
use crate::client::{
    CollectionDescription, CreateCollectionRequest, CreateIndexRequest, DeleteRequest,
    InsertRequest, KeyValuePair, LoadState, MilvusClient, MutationResult, QueryRequest,
    RawResultSet, RawSearchResults, SearchRequest,
};
use crate::config::MilvusConfig;
use crate::error::{MilvusError, MilvusResult};

/// Envelope every v2 endpoint answers with; `code == 0` is success.
#[derive(Debug, Deserialize)]
struct MilvusResponse<T> {
    code: i32,
    data: Option<T>,
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HasData {
    #[serde(default)]
    has: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertData {
    #[serde(default)]
    insert_count: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteData {
    #[serde(default)]
    delete_count: u64,
}

/// [`MilvusClient`] over the Milvus REST v2 API.
#[derive(Debug, Clone)]
pub struct MilvusRestClient {
    http: Client,
    base_url: String,
}

impl MilvusRestClient {
    pub fn new(config: &MilvusConfig) -> MilvusResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = config.token() {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| MilvusError::Config(format!("Invalid credentials: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self::from_client(http, &config.base_url()))
    }

    pub fn from_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POSTs `body` to `/v2/vectordb/{endpoint}` and unwraps the envelope.
    #[instrument(skip(self, body), fields(base_url = %self.base_url))]
    async fn call<T: DeserializeOwned>(&self, endpoint: &str, body: Value) -> MilvusResult<Option<T>> {
        let url = format!("{}/v2/vectordb/{}", self.base_url, endpoint);
        let response = self.http.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MilvusError::upstream(i32::from(status.as_u16()), message));
        }

        let envelope: MilvusResponse<T> = response.json().await?;
        if envelope.code != 0 {
            return Err(MilvusError::upstream(
                envelope.code,
                envelope
                    .message
                    .unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        debug!(endpoint, "Milvus call succeeded");
        Ok(envelope.data)
    }

    async fn call_unit(&self, endpoint: &str, body: Value) -> MilvusResult<()> {
        self.call::<Value>(endpoint, body).await.map(|_| ())
    }
}

#[async_trait]
impl MilvusClient for MilvusRestClient {
    async fn has_collection(&self, name: &str) -> MilvusResult<bool> {
        let data: Option<HasData> = self
            .call("collections/has", json!({ "collectionName": name }))
            .await?;
        Ok(data.unwrap_or_default().has)
    }

    async fn create_collection(&self, request: CreateCollectionRequest) -> MilvusResult<()> {
        self.call_unit(
            "collections/create",
            conversions::create_collection_body(&request),
        )
        .await
    }

    async fn drop_collection(&self, name: &str) -> MilvusResult<()> {
        self.call_unit("collections/drop", json!({ "collectionName": name }))
            .await
    }

    async fn load_collection(&self, name: &str) -> MilvusResult<()> {
        self.call_unit("collections/load", json!({ "collectionName": name }))
            .await
    }

    async fn describe_collection(&self, name: &str) -> MilvusResult<CollectionDescription> {
        let data: Option<Value> = self
            .call("collections/describe", json!({ "collectionName": name }))
            .await?;
        let data = data.ok_or_else(|| {
            MilvusError::Internal(format!("empty description for collection '{}'", name))
        })?;
        conversions::parse_description(data)
    }

    async fn get_collection_statistics(&self, name: &str) -> MilvusResult<Vec<KeyValuePair>> {
        let data: Option<Value> = self
            .call("collections/get_stats", json!({ "collectionName": name }))
            .await?;
        Ok(data
            .map(|d| conversions::parse_statistics(&d))
            .unwrap_or_default())
    }

    async fn get_load_state(&self, name: &str) -> MilvusResult<LoadState> {
        let data: Option<Value> = self
            .call("collections/get_load_state", json!({ "collectionName": name }))
            .await?;
        Ok(conversions::parse_load_state(&data.unwrap_or_default()))
    }

    async fn show_collections(&self) -> MilvusResult<Vec<String>> {
        let data: Option<Vec<String>> = self.call("collections/list", json!({})).await?;
        Ok(data.unwrap_or_default())
    }

    async fn create_index(&self, request: CreateIndexRequest) -> MilvusResult<()> {
        self.call_unit("indexes/create", conversions::create_index_body(&request))
            .await
    }

    async fn insert(&self, request: InsertRequest) -> MilvusResult<MutationResult> {
        let rows = conversions::insert_rows(&request)?;
        let data: Option<InsertData> = self
            .call(
                "entities/insert",
                json!({ "collectionName": request.collection_name, "data": rows }),
            )
            .await?;
        Ok(MutationResult {
            affected: data.unwrap_or_default().insert_count,
        })
    }

    async fn delete(&self, request: DeleteRequest) -> MilvusResult<MutationResult> {
        let data: Option<DeleteData> = self
            .call(
                "entities/delete",
                json!({ "collectionName": request.collection_name, "filter": request.expr }),
            )
            .await?;
        Ok(MutationResult {
            affected: data.unwrap_or_default().delete_count,
        })
    }

    async fn query(&self, request: QueryRequest) -> MilvusResult<RawResultSet> {
        let rows: Option<Vec<Value>> = self
            .call(
                "entities/query",
                json!({
                    "collectionName": request.collection_name,
                    "filter": request.expr,
                    "outputFields": request.output_fields,
                    "offset": request.offset,
                    "limit": request.limit,
                }),
            )
            .await?;
        conversions::parse_query_rows(&rows.unwrap_or_default(), &request.output_fields)
    }

    async fn search(&self, request: SearchRequest) -> MilvusResult<RawSearchResults> {
        let hits: Option<Vec<Value>> = self
            .call("entities/search", conversions::search_body(&request))
            .await?;
        conversions::parse_search_hits(&hits.unwrap_or_default(), &request.output_fields)
    }

    async fn flush(&self, collection_names: Vec<String>) -> MilvusResult<()> {
        for name in collection_names {
            self.call_unit("collections/flush", json!({ "collectionName": name }))
                .await?;
        }
        Ok(())
    }
}

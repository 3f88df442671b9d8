//! Paginated scalar-filter retrieval and similarity search.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument, warn};

use crate::client::{FieldColumn, MilvusClient, QueryRequest, SearchRequest};
use crate::config::FacadeOptions;
use crate::error::{MilvusError, MilvusResult};
use crate::models::{QueryPage, Record, SearchHit, SearchOutcome, SearchQuery};
use crate::normalizer::{
    DistanceAccessor, FieldAccessor, IdAccessor, MissingField, RankAccessor, normalize,
};
use crate::registry::row_count_of;
use crate::schema::{MetricType, PRIMARY_FIELD, VECTOR_FIELD};

pub struct QueryEngine<C: MilvusClient> {
    client: Arc<C>,
    options: FacadeOptions,
}

impl<C: MilvusClient> QueryEngine<C> {
    pub fn new(client: Arc<C>, options: FacadeOptions) -> Self {
        Self { client, options }
    }

    /// Fetches one page of records, then the total row count.
    ///
    /// The total comes from a second round-trip and may be stale relative
    /// to the page under concurrent writes.
    #[instrument(skip(self))]
    pub async fn query_page(
        &self,
        collection_name: &str,
        page: u32,
        page_size: u32,
    ) -> MilvusResult<QueryPage> {
        if page < 1 {
            return Err(MilvusError::invalid("page must be at least 1"));
        }
        if page_size < 1 {
            return Err(MilvusError::invalid("pageSize must be at least 1"));
        }

        let raw = self
            .client
            .query(QueryRequest {
                collection_name: collection_name.to_string(),
                expr: format!("{} >= 0", PRIMARY_FIELD),
                output_fields: vec![PRIMARY_FIELD.to_string(), VECTOR_FIELD.to_string()],
                offset: u64::from(page - 1) * u64::from(page_size),
                limit: u64::from(page_size),
            })
            .await?;

        let data = {
            let missing_id = MissingField(PRIMARY_FIELD);
            let missing_vector = MissingField(VECTOR_FIELD);
            let ids = column_or(raw.column(PRIMARY_FIELD), &missing_id);
            let vectors = column_or(raw.column(VECTOR_FIELD), &missing_vector);

            normalize(raw.row_count, &[ids, vectors])
                .iter()
                .map(Record::try_from)
                .collect::<MilvusResult<Vec<_>>>()?
        };

        let total = match self.client.get_collection_statistics(collection_name).await {
            Ok(stats) => row_count_of(&stats),
            Err(e) => {
                warn!(collection = collection_name, error = %e, "Statistics unavailable, reporting total 0");
                0
            }
        };

        debug!(rows = data.len(), total, "Fetched page");

        Ok(QueryPage {
            data,
            total,
            page,
            page_size,
            has_more: u64::from(page) * u64::from(page_size) < total,
        })
    }

    /// Single-vector L2 search. Hits keep the database's order; rank is the
    /// 1-based output position.
    #[instrument(skip(self, query), fields(top_k = query.top_k, dim = query.vector.len()))]
    pub async fn search(
        &self,
        collection_name: &str,
        query: SearchQuery,
    ) -> MilvusResult<SearchOutcome> {
        if query.top_k < 1 {
            return Err(MilvusError::invalid("topK must be at least 1"));
        }
        if query.vector.is_empty() {
            return Err(MilvusError::invalid("query vector must not be empty"));
        }

        let mut output_fields = vec![PRIMARY_FIELD.to_string()];
        if query.with_vectors {
            output_fields.push(VECTOR_FIELD.to_string());
        }

        let started = Instant::now();
        let raw = self
            .client
            .search(SearchRequest {
                collection_name: collection_name.to_string(),
                vector_field: VECTOR_FIELD.to_string(),
                metric: MetricType::L2,
                vectors: vec![query.vector],
                top_k: query.top_k,
                nprobe: self.options.nprobe,
                output_fields,
            })
            .await?;
        let latency_ms = started.elapsed().as_millis() as u64;

        let ids = IdAccessor(&raw.ids);
        let distances = DistanceAccessor(&raw.scores);
        let missing_vector = MissingField(VECTOR_FIELD);
        let vectors = column_or(raw.column(VECTOR_FIELD), &missing_vector);

        let results = normalize(raw.ids.len(), &[&ids, vectors, &distances, &RankAccessor])
            .iter()
            .map(SearchHit::try_from)
            .collect::<MilvusResult<Vec<_>>>()?;

        debug!(hits = results.len(), latency_ms, "Search completed");

        Ok(SearchOutcome {
            results,
            latency_ms,
        })
    }
}

fn column_or<'a>(
    column: Option<&'a FieldColumn>,
    missing: &'a MissingField<'a>,
) -> &'a dyn FieldAccessor {
    match column {
        Some(column) => column,
        None => missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{
        FieldData, KeyValuePair, MockMilvusClient, RawResultSet, RawSearchResults,
    };

    fn engine(mock: MockMilvusClient) -> QueryEngine<MockMilvusClient> {
        QueryEngine::new(Arc::new(mock), FacadeOptions::default())
    }

    fn page_of(ids: Vec<i64>, dim: usize) -> RawResultSet {
        let data = ids.iter().flat_map(|id| vec![*id as f32; dim]).collect();
        RawResultSet {
            row_count: ids.len(),
            columns: vec![
                FieldColumn::new("id", FieldData::Int64(ids)),
                FieldColumn::new("vector", FieldData::FloatVector { dim, data }),
            ],
        }
    }

    fn stats(total: u64) -> Vec<KeyValuePair> {
        vec![KeyValuePair::new("row_count", total.to_string())]
    }

    #[tokio::test]
    async fn test_query_page_translates_page_to_offset() {
        let mut mock = MockMilvusClient::new();
        mock.expect_query()
            .withf(|req| {
                req.collection_name == "docs"
                    && req.expr == "id >= 0"
                    && req.output_fields == vec!["id".to_string(), "vector".to_string()]
                    && req.offset == 20
                    && req.limit == 10
            })
            .returning(|_| Ok(page_of(vec![21, 22, 23, 24, 25], 2)));
        mock.expect_get_collection_statistics()
            .returning(|_| Ok(stats(25)));

        let page = engine(mock).query_page("docs", 3, 10).await.unwrap();

        assert_eq!(page.data.len(), 5);
        assert_eq!(page.data[0], Record::new(21, vec![21.0, 21.0]));
        assert_eq!(page.total, 25);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_first_page_of_25_has_more() {
        let mut mock = MockMilvusClient::new();
        mock.expect_query()
            .returning(|_| Ok(page_of((1..=10).collect(), 1)));
        mock.expect_get_collection_statistics()
            .returning(|_| Ok(stats(25)));

        let page = engine(mock).query_page("docs", 1, 10).await.unwrap();
        assert!(page.has_more);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 10);
    }

    #[tokio::test]
    async fn test_query_page_rejects_zero_page() {
        let mut mock = MockMilvusClient::new();
        mock.expect_query().never();

        let engine = engine(mock);
        assert!(matches!(
            engine.query_page("docs", 0, 10).await,
            Err(MilvusError::InvalidArgument(_))
        ));
        assert!(matches!(
            engine.query_page("docs", 1, 0).await,
            Err(MilvusError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_query_failure_is_surfaced_verbatim_without_retry() {
        let mut mock = MockMilvusClient::new();
        mock.expect_query()
            .times(1)
            .returning(|_| Err(MilvusError::upstream(101, "collection not loaded")));
        mock.expect_get_collection_statistics().never();

        let err = engine(mock).query_page("docs", 1, 10).await.unwrap_err();
        assert_eq!(err.to_string(), "collection not loaded");
    }

    #[tokio::test]
    async fn test_search_requests_l2_with_nprobe_and_ranks_by_position() {
        let mut mock = MockMilvusClient::new();
        mock.expect_search()
            .withf(|req| {
                req.vector_field == "vector"
                    && req.metric == MetricType::L2
                    && req.nprobe == 10
                    && req.top_k == 3
                    && req.vectors.len() == 1
                    && req.output_fields == vec!["id".to_string()]
            })
            .returning(|_| {
                Ok(RawSearchResults {
                    ids: vec![7, 3, 9],
                    scores: vec![0.1, 0.4, 2.5],
                    columns: vec![],
                })
            });

        let outcome = engine(mock)
            .search("docs", SearchQuery::new(vec![0.0, 0.0], 3))
            .await
            .unwrap();

        let ranked: Vec<_> = outcome.results.iter().map(|h| (h.rank, h.id)).collect();
        assert_eq!(ranked, vec![(1, 7), (2, 3), (3, 9)]);
        assert!(outcome.results.iter().all(|h| h.vector.is_none()));
        assert!(
            outcome
                .results
                .windows(2)
                .all(|w| w[0].distance <= w[1].distance)
        );
    }

    #[tokio::test]
    async fn test_search_with_vectors_echoes_vector_column() {
        let mut mock = MockMilvusClient::new();
        mock.expect_search()
            .withf(|req| req.output_fields == vec!["id".to_string(), "vector".to_string()])
            .returning(|_| {
                Ok(RawSearchResults {
                    ids: vec![1],
                    scores: vec![0.0],
                    columns: vec![FieldColumn::new(
                        "vector",
                        FieldData::FloatVector {
                            dim: 2,
                            data: vec![0.5, 0.5],
                        },
                    )],
                })
            });

        let outcome = engine(mock)
            .search("docs", SearchQuery::new(vec![0.5, 0.5], 1).with_vectors(true))
            .await
            .unwrap();
        assert_eq!(outcome.results[0].vector, Some(vec![0.5, 0.5]));
    }

    #[tokio::test]
    async fn test_search_validates_input() {
        let mut mock = MockMilvusClient::new();
        mock.expect_search().never();
        let engine = engine(mock);

        assert!(matches!(
            engine.search("docs", SearchQuery::new(vec![1.0], 0)).await,
            Err(MilvusError::InvalidArgument(_))
        ));
        assert!(matches!(
            engine.search("docs", SearchQuery::new(vec![], 5)).await,
            Err(MilvusError::InvalidArgument(_))
        ));
    }
}

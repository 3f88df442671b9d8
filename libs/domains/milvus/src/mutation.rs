//! Inserts and deletes, each followed by a flush so the change is visible
//! to the caller's next read.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::client::{DeleteRequest, FieldColumn, FieldData, InsertRequest, MilvusClient};
use crate::error::{MilvusError, MilvusResult};
use crate::models::{MutationReceipt, Record};
use crate::schema::{PRIMARY_FIELD, VECTOR_FIELD};

pub struct MutationGateway<C: MilvusClient> {
    client: Arc<C>,
}

impl<C: MilvusClient> MutationGateway<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    pub async fn insert(
        &self,
        collection_name: &str,
        id: i64,
        vector: Vec<f32>,
    ) -> MilvusResult<MutationReceipt> {
        self.insert_records(collection_name, vec![Record::new(id, vector)])
            .await
    }

    /// Inserts `records` as one column-wise batch over `id` then `vector`.
    ///
    /// All vectors in a batch must share one length; the database checks that
    /// length against the schema.
    #[instrument(skip(self, records), fields(collection = collection_name, rows = records.len()))]
    pub async fn insert_records(
        &self,
        collection_name: &str,
        records: Vec<Record>,
    ) -> MilvusResult<MutationReceipt> {
        if records.is_empty() {
            return Err(MilvusError::invalid("at least one record is required"));
        }

        let columns = to_columns(records)?;
        let result = self
            .client
            .insert(InsertRequest {
                collection_name: collection_name.to_string(),
                columns,
            })
            .await?;
        info!(affected = result.affected, "Inserted rows");

        let flushed = self.flush(collection_name).await;
        Ok(MutationReceipt {
            affected: result.affected,
            flushed,
        })
    }

    /// Deletes by `id == <id>` filter. Unknown ids succeed as a no-op.
    #[instrument(skip(self))]
    pub async fn delete(&self, collection_name: &str, id: i64) -> MilvusResult<MutationReceipt> {
        let result = self
            .client
            .delete(DeleteRequest {
                collection_name: collection_name.to_string(),
                expr: format!("{} == {}", PRIMARY_FIELD, id),
            })
            .await?;
        info!(affected = result.affected, "Deleted rows");

        let flushed = self.flush(collection_name).await;
        Ok(MutationReceipt {
            affected: result.affected,
            flushed,
        })
    }

    async fn flush(&self, collection_name: &str) -> bool {
        match self.client.flush(vec![collection_name.to_string()]).await {
            Ok(()) => true,
            Err(e) => {
                warn!(collection = collection_name, error = %e, "Flush after mutation failed");
                false
            }
        }
    }
}

/// Flattens records into columns. A ragged batch would be re-chunked at the
/// wrong row boundaries, so it is rejected before anything is sent.
fn to_columns(records: Vec<Record>) -> MilvusResult<Vec<FieldColumn>> {
    let dim = records.first().map(|r| r.vector.len()).unwrap_or(0);
    let mut ids = Vec::with_capacity(records.len());
    let mut data = Vec::with_capacity(records.len() * dim);

    for record in records {
        if record.vector.len() != dim {
            return Err(MilvusError::invalid(format!(
                "record {} has a vector of length {}, expected {} like the first record",
                record.id,
                record.vector.len(),
                dim
            )));
        }
        ids.push(record.id);
        data.extend(record.vector);
    }

    Ok(vec![
        FieldColumn::new(PRIMARY_FIELD, FieldData::Int64(ids)),
        FieldColumn::new(VECTOR_FIELD, FieldData::FloatVector { dim, data }),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MockMilvusClient, MutationResult};

    fn gateway(mock: MockMilvusClient) -> MutationGateway<MockMilvusClient> {
        MutationGateway::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn test_insert_sends_id_then_vector_and_flushes() {
        let mut mock = MockMilvusClient::new();
        let mut seq = mockall::Sequence::new();

        mock.expect_insert()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req| {
                req.collection_name == "docs"
                    && req.columns.len() == 2
                    && req.columns[0] == FieldColumn::new("id", FieldData::Int64(vec![1]))
                    && req.columns[1].name == "vector"
                    && req.columns[1].data.len() == 1
            })
            .returning(|_| Ok(MutationResult { affected: 1 }));
        mock.expect_flush()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|names| names == &vec!["docs".to_string()])
            .returning(|_| Ok(()));

        let receipt = gateway(mock).insert("docs", 1, vec![0.1, 0.2, 0.3]).await.unwrap();

        assert_eq!(receipt.affected, 1);
        assert!(receipt.flushed);
    }

    #[tokio::test]
    async fn test_failed_insert_does_not_flush() {
        let mut mock = MockMilvusClient::new();
        mock.expect_insert()
            .returning(|_| Err(MilvusError::upstream(1100, "the dim (3) of field data(vector) is not equal to schema dim (4)")));
        mock.expect_flush().never();

        let err = gateway(mock).insert("docs", 1, vec![0.1, 0.2, 0.3]).await.unwrap_err();
        assert!(err.to_string().contains("schema dim"));
    }

    #[tokio::test]
    async fn test_flush_failure_keeps_insert_successful() {
        let mut mock = MockMilvusClient::new();
        mock.expect_insert()
            .returning(|_| Ok(MutationResult { affected: 1 }));
        mock.expect_flush()
            .returning(|_| Err(MilvusError::Transport("timeout".to_string())));

        let receipt = gateway(mock).insert("docs", 1, vec![0.5]).await.unwrap();
        assert_eq!(receipt.affected, 1);
        assert!(!receipt.flushed);
    }

    #[tokio::test]
    async fn test_batch_columns_match_row_count() {
        let mut mock = MockMilvusClient::new();
        mock.expect_insert()
            .withf(|req| req.columns.iter().all(|c| c.data.len() == 3))
            .returning(|_| Ok(MutationResult { affected: 3 }));
        mock.expect_flush().returning(|_| Ok(()));

        let records = vec![
            Record::new(1, vec![0.0, 1.0]),
            Record::new(2, vec![1.0, 0.0]),
            Record::new(3, vec![1.0, 1.0]),
        ];
        let receipt = gateway(mock).insert_records("docs", records).await.unwrap();
        assert_eq!(receipt.affected, 3);
    }

    #[tokio::test]
    async fn test_ragged_batch_is_rejected_before_insert() {
        let mut mock = MockMilvusClient::new();
        mock.expect_insert().never();
        mock.expect_flush().never();

        // 2 + 4 floats would split evenly into three rows of width 2.
        let records = vec![
            Record::new(1, vec![1.0, 2.0]),
            Record::new(2, vec![3.0, 4.0, 5.0, 6.0]),
        ];
        let err = gateway(mock).insert_records("docs", records).await.unwrap_err();

        assert!(matches!(err, MilvusError::InvalidArgument(_)));
        assert!(err.to_string().contains("record 2"));
    }

    #[tokio::test]
    async fn test_empty_batch_is_rejected() {
        let mut mock = MockMilvusClient::new();
        mock.expect_insert().never();

        let err = gateway(mock).insert_records("docs", vec![]).await.unwrap_err();
        assert!(matches!(err, MilvusError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_delete_uses_primary_key_filter_and_flushes() {
        let mut mock = MockMilvusClient::new();
        mock.expect_delete()
            .withf(|req| req.collection_name == "docs" && req.expr == "id == 42")
            .returning(|_| Ok(MutationResult { affected: 0 }));
        mock.expect_flush().times(1).returning(|_| Ok(()));

        let receipt = gateway(mock).delete("docs", 42).await.unwrap();
        assert_eq!(receipt.affected, 0);
        assert!(receipt.flushed);
    }
}

//! JSON shapes of the Milvus REST v2 API, to and from the column-oriented
//! client types.

use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::client::{
    CollectionDescription, CreateCollectionRequest, CreateIndexRequest, DataType, FieldColumn,
    FieldData, FieldSchema, InsertRequest, KeyValuePair, LoadState, RawResultSet,
    RawSearchResults, SearchRequest,
};
use crate::error::{MilvusError, MilvusResult};
use crate::schema::{FieldSpec, PRIMARY_FIELD};

const ROW_COUNT_KEY: &str = "row_count";

static NULL: Value = Value::Null;

// ===== Requests =====

pub fn create_collection_body(request: &CreateCollectionRequest) -> Value {
    let fields: Vec<Value> = request
        .fields
        .iter()
        .map(|field| match field {
            FieldSpec::PrimaryKey { name } => json!({
                "fieldName": name,
                "dataType": "Int64",
                "isPrimary": true,
            }),
            FieldSpec::Vector { name, dimension } => json!({
                "fieldName": name,
                "dataType": "FloatVector",
                "elementTypeParams": { "dim": dimension.to_string() },
            }),
        })
        .collect();

    json!({
        "collectionName": request.name,
        "description": request.description,
        "schema": {
            "autoId": false,
            "enableDynamicField": false,
            "fields": fields,
        },
        "params": { "shardsNum": request.shards_num },
    })
}

pub fn create_index_body(request: &CreateIndexRequest) -> Value {
    let index = &request.index;
    json!({
        "collectionName": request.collection_name,
        "indexParams": [{
            "fieldName": index.field_name,
            "indexName": index.field_name,
            "metricType": index.metric.as_str(),
            "indexType": index.index_type.as_str(),
            "params": { "nlist": index.nlist },
        }],
    })
}

/// Pivots column-wise insert data into the row objects the REST API takes.
pub fn insert_rows(request: &InsertRequest) -> MilvusResult<Vec<Value>> {
    for column in &request.columns {
        if let FieldData::FloatVector { dim, data } = &column.data {
            if *dim == 0 || data.len() % dim != 0 {
                return Err(MilvusError::invalid(format!(
                    "column '{}' holds {} floats, not a whole number of {}-long vectors",
                    column.name,
                    data.len(),
                    dim
                )));
            }
        }
    }

    let row_count = request.columns.first().map(|c| c.data.len()).unwrap_or(0);
    if let Some(column) = request.columns.iter().find(|c| c.data.len() != row_count) {
        return Err(MilvusError::invalid(format!(
            "column '{}' has {} rows, expected {}",
            column.name,
            column.data.len(),
            row_count
        )));
    }

    let rows = (0..row_count)
        .map(|row| {
            let mut object = Map::new();
            for column in &request.columns {
                object.insert(column.name.clone(), cell(&column.data, row));
            }
            Value::Object(object)
        })
        .collect();
    Ok(rows)
}

fn cell(data: &FieldData, row: usize) -> Value {
    match data {
        FieldData::Int64(values) => json!(values[row]),
        FieldData::Float(values) => json!(values[row]),
        FieldData::FloatVector { .. } => json!(data.vector_at(row).unwrap_or_default()),
    }
}

pub fn search_body(request: &SearchRequest) -> Value {
    json!({
        "collectionName": request.collection_name,
        "data": request.vectors,
        "annsField": request.vector_field,
        "limit": request.top_k,
        "outputFields": request.output_fields,
        "searchParams": {
            "metricType": request.metric.as_str(),
            "params": { "nprobe": request.nprobe },
        },
    })
}

// ===== Responses =====

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeData {
    collection_name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    fields: Vec<DescribeField>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeField {
    name: String,
    #[serde(rename = "type")]
    data_type: String,
    #[serde(default)]
    primary_key: bool,
    #[serde(default)]
    auto_id: bool,
    #[serde(default)]
    params: Vec<KeyValuePair>,
}

pub fn parse_description(data: Value) -> MilvusResult<CollectionDescription> {
    let data: DescribeData = serde_json::from_value(data)?;
    Ok(CollectionDescription {
        name: data.collection_name,
        description: data.description,
        fields: data
            .fields
            .into_iter()
            .map(|f| FieldSchema {
                data_type: DataType::parse(&f.data_type),
                name: f.name,
                is_primary: f.primary_key,
                auto_id: f.auto_id,
                type_params: f.params,
            })
            .collect(),
    })
}

/// `{"rowCount": n}` becomes the `row_count` statistic.
pub fn parse_statistics(data: &Value) -> Vec<KeyValuePair> {
    data.get("rowCount")
        .and_then(as_int64)
        .map(|count| vec![KeyValuePair::new(ROW_COUNT_KEY, count.to_string())])
        .unwrap_or_default()
}

pub fn parse_load_state(data: &Value) -> LoadState {
    data.get("loadState")
        .and_then(Value::as_str)
        .map(LoadState::parse)
        .unwrap_or(LoadState::NotLoad)
}

pub fn parse_query_rows(rows: &[Value], output_fields: &[String]) -> MilvusResult<RawResultSet> {
    let columns = output_fields
        .iter()
        .map(|name| column_from_rows(name, rows))
        .collect::<MilvusResult<Vec<_>>>()?;
    Ok(RawResultSet {
        row_count: rows.len(),
        columns,
    })
}

/// Hits for one query vector; `id` and `distance` are lifted out, every
/// other requested field becomes a column.
pub fn parse_search_hits(
    hits: &[Value],
    output_fields: &[String],
) -> MilvusResult<RawSearchResults> {
    let ids = hits
        .iter()
        .map(|hit| {
            hit.get(PRIMARY_FIELD)
                .and_then(as_int64)
                .ok_or_else(|| MilvusError::Internal("search hit without id".to_string()))
        })
        .collect::<MilvusResult<Vec<_>>>()?;
    let scores = hits
        .iter()
        .map(|hit| {
            hit.get("distance")
                .and_then(Value::as_f64)
                .map(|d| d as f32)
                .ok_or_else(|| MilvusError::Internal("search hit without distance".to_string()))
        })
        .collect::<MilvusResult<Vec<_>>>()?;
    let columns = output_fields
        .iter()
        .filter(|name| name.as_str() != PRIMARY_FIELD)
        .map(|name| column_from_rows(name, hits))
        .collect::<MilvusResult<Vec<_>>>()?;

    Ok(RawSearchResults {
        ids,
        scores,
        columns,
    })
}

/// The column type follows the first row's value.
fn column_from_rows(name: &str, rows: &[Value]) -> MilvusResult<FieldColumn> {
    let values: Vec<&Value> = rows
        .iter()
        .map(|row| row.get(name).unwrap_or(&NULL))
        .collect();
    let invalid = |row: usize| MilvusError::Internal(format!("row {} has invalid '{}'", row, name));

    let data = match values.first() {
        None => FieldData::Int64(Vec::new()),
        Some(Value::Array(first)) => {
            let dim = first.len();
            let mut data = Vec::with_capacity(dim * values.len());
            for (row, value) in values.iter().enumerate() {
                let vector = value
                    .as_array()
                    .filter(|v| v.len() == dim)
                    .ok_or_else(|| invalid(row))?;
                for element in vector {
                    data.push(element.as_f64().ok_or_else(|| invalid(row))? as f32);
                }
            }
            FieldData::FloatVector { dim, data }
        }
        Some(first) if as_int64(first).is_some() => FieldData::Int64(
            values
                .iter()
                .enumerate()
                .map(|(row, v)| as_int64(v).ok_or_else(|| invalid(row)))
                .collect::<MilvusResult<_>>()?,
        ),
        Some(_) => FieldData::Float(
            values
                .iter()
                .enumerate()
                .map(|(row, v)| v.as_f64().map(|f| f as f32).ok_or_else(|| invalid(row)))
                .collect::<MilvusResult<_>>()?,
        ),
    };
    Ok(FieldColumn::new(name, data))
}

/// Int64 values may arrive as JSON numbers or as decimal strings.
fn as_int64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

//! Shapes columnar driver results into ordered per-row records.
//!
//! Query and search both go through [`normalize`], so rows from either path
//! carry the same field-name-to-value contract.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::client::{FieldColumn, FieldData};

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Int64(i64),
    Float(f32),
    FloatVector(Vec<f32>),
}

impl FieldValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Int64(v) => Some(*v as f32),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[f32]> {
        match self {
            FieldValue::FloatVector(v) => Some(v),
            _ => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_none(),
            FieldValue::Int64(v) => serializer.serialize_i64(*v),
            FieldValue::Float(v) => serializer.serialize_f32(*v),
            FieldValue::FloatVector(v) => v.serialize(serializer),
        }
    }
}

/// One named output field, readable by row position.
pub trait FieldAccessor {
    fn name(&self) -> &str;

    /// `FieldValue::Null` when the row is out of range.
    fn value_at(&self, row: usize) -> FieldValue;
}

impl FieldAccessor for FieldColumn {
    fn name(&self) -> &str {
        &self.name
    }

    fn value_at(&self, row: usize) -> FieldValue {
        match &self.data {
            FieldData::Int64(values) => values
                .get(row)
                .map(|v| FieldValue::Int64(*v))
                .unwrap_or(FieldValue::Null),
            FieldData::Float(values) => values
                .get(row)
                .map(|v| FieldValue::Float(*v))
                .unwrap_or(FieldValue::Null),
            FieldData::FloatVector { .. } => self
                .data
                .vector_at(row)
                .map(|v| FieldValue::FloatVector(v.to_vec()))
                .unwrap_or(FieldValue::Null),
        }
    }
}

/// Primary keys of search hits.
pub struct IdAccessor<'a>(pub &'a [i64]);

impl FieldAccessor for IdAccessor<'_> {
    fn name(&self) -> &str {
        "id"
    }

    fn value_at(&self, row: usize) -> FieldValue {
        self.0
            .get(row)
            .map(|v| FieldValue::Int64(*v))
            .unwrap_or(FieldValue::Null)
    }
}

/// Distance scores of search hits.
pub struct DistanceAccessor<'a>(pub &'a [f32]);

impl FieldAccessor for DistanceAccessor<'_> {
    fn name(&self) -> &str {
        "distance"
    }

    fn value_at(&self, row: usize) -> FieldValue {
        self.0
            .get(row)
            .map(|v| FieldValue::Float(*v))
            .unwrap_or(FieldValue::Null)
    }
}

/// 1-based output position.
pub struct RankAccessor;

impl FieldAccessor for RankAccessor {
    fn name(&self) -> &str {
        "rank"
    }

    fn value_at(&self, row: usize) -> FieldValue {
        FieldValue::Int64(row as i64 + 1)
    }
}

/// A requested field the driver did not return.
pub struct MissingField<'a>(pub &'a str);

impl FieldAccessor for MissingField<'_> {
    fn name(&self) -> &str {
        self.0
    }

    fn value_at(&self, _row: usize) -> FieldValue {
        FieldValue::Null
    }
}

/// A flat row; field order is the order the fields were requested in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRow {
    fields: Vec<(String, FieldValue)>,
}

impl NormalizedRow {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for NormalizedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

pub fn normalize(row_count: usize, accessors: &[&dyn FieldAccessor]) -> Vec<NormalizedRow> {
    (0..row_count)
        .map(|row| NormalizedRow {
            fields: accessors
                .iter()
                .map(|a| (a.name().to_string(), a.value_at(row)))
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id_column(ids: Vec<i64>) -> FieldColumn {
        FieldColumn::new("id", FieldData::Int64(ids))
    }

    fn vector_column(dim: usize, data: Vec<f32>) -> FieldColumn {
        FieldColumn::new("vector", FieldData::FloatVector { dim, data })
    }

    #[test]
    fn test_rows_keep_requested_field_order() {
        let ids = id_column(vec![7, 8]);
        let vectors = vector_column(2, vec![0.1, 0.2, 0.3, 0.4]);

        let rows = normalize(2, &[&vectors, &ids]);

        assert_eq!(rows.len(), 2);
        let names: Vec<_> = rows[0].field_names().collect();
        assert_eq!(names, vec!["vector", "id"]);
        assert_eq!(rows[1].get("id"), Some(&FieldValue::Int64(8)));
        assert_eq!(
            rows[1].get("vector"),
            Some(&FieldValue::FloatVector(vec![0.3, 0.4]))
        );
    }

    #[test]
    fn test_search_accessors_assign_rank_by_position() {
        let ids = [30_i64, 10, 20];
        let scores = [0.5_f32, 1.5, 4.0];
        let missing = MissingField("vector");

        let rows = normalize(
            3,
            &[
                &IdAccessor(&ids),
                &missing,
                &DistanceAccessor(&scores),
                &RankAccessor,
            ],
        );

        let ranks: Vec<_> = rows
            .iter()
            .map(|r| r.get("rank").and_then(FieldValue::as_i64).unwrap())
            .collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(rows[0].get("id"), Some(&FieldValue::Int64(30)));
        assert_eq!(rows[2].get("distance"), Some(&FieldValue::Float(4.0)));
        assert_eq!(rows[0].get("vector"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_short_column_yields_null() {
        let ids = id_column(vec![1]);
        let rows = normalize(2, &[&ids]);
        assert_eq!(rows[1].get("id"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_zero_rows() {
        let ids = id_column(vec![]);
        assert!(normalize(0, &[&ids]).is_empty());
    }

    #[test]
    fn test_row_serializes_as_ordered_map() {
        let ids = id_column(vec![5]);
        let vectors = vector_column(1, vec![0.5]);
        let rows = normalize(1, &[&ids, &vectors]);

        let json = serde_json::to_string(&rows[0]).unwrap();
        assert_eq!(json, r#"{"id":5,"vector":[0.5]}"#);
    }
}

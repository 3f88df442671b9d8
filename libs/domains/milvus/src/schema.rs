//! Two-field collection schema (`id` + `vector`) and its vector index.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{MilvusError, MilvusResult};

pub const PRIMARY_FIELD: &str = "id";
pub const VECTOR_FIELD: &str = "vector";

/// Inverted-list partition count used when none is configured.
pub const DEFAULT_NLIST: u32 = 1024;

/// Field descriptor. The primary key is always caller-supplied (auto-id off).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldSpec {
    PrimaryKey { name: String },
    Vector { name: String, dimension: u32 },
}

impl FieldSpec {
    pub fn name(&self) -> &str {
        match self {
            FieldSpec::PrimaryKey { name } | FieldSpec::Vector { name, .. } => name,
        }
    }

    pub fn dimension(&self) -> Option<u32> {
        match self {
            FieldSpec::Vector { dimension, .. } => Some(*dimension),
            FieldSpec::PrimaryKey { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum IndexType {
    #[default]
    #[serde(rename = "IVF_FLAT")]
    IvfFlat,
}

impl IndexType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexType::IvfFlat => "IVF_FLAT",
        }
    }
}

/// Distance metric; only Euclidean is modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum MetricType {
    #[default]
    L2,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::L2 => "L2",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IndexSpec {
    pub field_name: String,
    pub index_type: IndexType,
    pub metric: MetricType,
    pub nlist: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CollectionSpec {
    pub fields: Vec<FieldSpec>,
    pub index: IndexSpec,
}

impl CollectionSpec {
    pub fn vector_dimension(&self) -> Option<u32> {
        self.fields.iter().find_map(FieldSpec::dimension)
    }
}

/// Builds the schema with the default `nlist`.
pub fn build_collection_spec(dimension: i64) -> MilvusResult<CollectionSpec> {
    build_collection_spec_with(dimension, DEFAULT_NLIST)
}

/// Builds the schema and index spec for a collection of `dimension`-long vectors.
///
/// Pure construction; nothing is sent to the database.
pub fn build_collection_spec_with(dimension: i64, nlist: u32) -> MilvusResult<CollectionSpec> {
    if dimension <= 0 {
        return Err(MilvusError::invalid(format!(
            "dimension must be a positive integer, got {}",
            dimension
        )));
    }
    let dimension = u32::try_from(dimension)
        .map_err(|_| MilvusError::invalid(format!("dimension {} is too large", dimension)))?;
    if nlist == 0 {
        return Err(MilvusError::invalid("nlist must be positive"));
    }

    Ok(CollectionSpec {
        fields: vec![
            FieldSpec::PrimaryKey {
                name: PRIMARY_FIELD.to_string(),
            },
            FieldSpec::Vector {
                name: VECTOR_FIELD.to_string(),
                dimension,
            },
        ],
        index: IndexSpec {
            field_name: VECTOR_FIELD.to_string(),
            index_type: IndexType::IvfFlat,
            metric: MetricType::L2,
            nlist,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_has_one_primary_key_and_one_vector_field() {
        for dim in [1_i64, 64, 128, 1536] {
            let spec = build_collection_spec(dim).unwrap();
            let primary: Vec<_> = spec
                .fields
                .iter()
                .filter(|f| matches!(f, FieldSpec::PrimaryKey { .. }))
                .collect();
            let vectors: Vec<_> = spec
                .fields
                .iter()
                .filter(|f| matches!(f, FieldSpec::Vector { .. }))
                .collect();

            assert_eq!(primary.len(), 1);
            assert_eq!(vectors.len(), 1);
            assert_eq!(primary[0].name(), "id");
            assert_eq!(vectors[0].name(), "vector");
            assert_eq!(spec.vector_dimension(), Some(dim as u32));
        }
    }

    #[test]
    fn test_field_order_is_id_then_vector() {
        let spec = build_collection_spec(8).unwrap();
        let names: Vec<_> = spec.fields.iter().map(FieldSpec::name).collect();
        assert_eq!(names, vec!["id", "vector"]);
    }

    #[test]
    fn test_non_positive_dimension_is_rejected() {
        for dim in [0_i64, -1, -128] {
            let err = build_collection_spec(dim).unwrap_err();
            assert!(matches!(err, MilvusError::InvalidArgument(_)), "dim {}", dim);
        }
    }

    #[test]
    fn test_default_index_is_ivf_flat_l2_with_1024_lists() {
        let spec = build_collection_spec(32).unwrap();
        assert_eq!(spec.index.field_name, "vector");
        assert_eq!(spec.index.index_type, IndexType::IvfFlat);
        assert_eq!(spec.index.metric, MetricType::L2);
        assert_eq!(spec.index.nlist, 1024);
    }

    #[test]
    fn test_custom_nlist_is_used() {
        let spec = build_collection_spec_with(32, 256).unwrap();
        assert_eq!(spec.index.nlist, 256);
    }

    #[test]
    fn test_field_spec_serializes_as_tagged_variant() {
        let json = serde_json::to_value(FieldSpec::Vector {
            name: "vector".to_string(),
            dimension: 4,
        })
        .unwrap();
        assert_eq!(json["kind"], "vector");
        assert_eq!(json["dimension"], 4);
    }
}

//! Qdrant vector store backend implementation.
//!
//! Qdrant has no native namespaces, so every point carries a `namespace` payload
//! field and all reads and deletes filter on it.

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, Value, VectorParamsBuilder,
    point_id::PointIdOptions,
};
use std::collections::HashMap;

use super::{IndexInfo, VectorStore};
use crate::error::VectorStoreError;
use crate::models::{DocumentRecord, Namespace, RetrievedChunk, VectorStoreConfig};

const NAMESPACE_FIELD: &str = "namespace";

/// Qdrant vector store backend.
pub struct QdrantBackend {
    client: Qdrant,
    collection: String,
    embedding_dim: u64,
}

impl QdrantBackend {
    pub fn new(config: &VectorStoreConfig) -> Result<Self, VectorStoreError> {
        let mut builder = Qdrant::from_url(&config.qdrant.url);

        if let Some(ref api_key) = config.qdrant.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            collection: config.index_name.clone(),
            embedding_dim: config.dimension,
        })
    }

    fn namespace_filter(namespace: &Namespace) -> Filter {
        Filter::must([Condition::matches(
            NAMESPACE_FIELD,
            namespace.as_str().to_string(),
        )])
    }
}

fn to_point(record: DocumentRecord, namespace: &Namespace) -> PointStruct {
    let mut payload: HashMap<String, Value> = HashMap::new();
    payload.insert(NAMESPACE_FIELD.to_string(), namespace.as_str().into());
    payload.insert("text".to_string(), record.metadata.text.into());
    payload.insert("filename".to_string(), record.metadata.filename.into());
    payload.insert(
        "chunk_index".to_string(),
        i64::from(record.metadata.chunk_index).into(),
    );

    PointStruct::new(record.id, record.values, payload)
}

fn payload_str(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
    payload.get(key).and_then(|v| match &v.kind {
        Some(Kind::StringValue(s)) => Some(s.clone()),
        _ => None,
    })
}

#[async_trait]
impl VectorStore for QdrantBackend {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        self.client
            .health_check()
            .await
            .map(|_| true)
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))
    }

    async fn get_index_info(&self) -> Result<Option<IndexInfo>, VectorStoreError> {
        match self.client.collection_info(&self.collection).await {
            Ok(info) => Ok(Some(IndexInfo {
                dimension: self.embedding_dim,
                record_count: info.result.map_or(0, |r| r.points_count.unwrap_or(0)),
                namespace_count: None,
            })),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("not found") || msg.contains("doesn't exist") {
                    Ok(None)
                } else {
                    Err(VectorStoreError::IndexError(msg))
                }
            }
        }
    }

    async fn create_index(&self) -> Result<(), VectorStoreError> {
        if self.get_index_info().await?.is_some() {
            return Ok(());
        }

        tracing::info!(
            collection = %self.collection,
            dimension = self.embedding_dim,
            "creating Qdrant collection"
        );

        let create_collection = CreateCollectionBuilder::new(&self.collection).vectors_config(
            VectorParamsBuilder::new(self.embedding_dim, Distance::Cosine),
        );

        self.client
            .create_collection(create_collection)
            .await
            .map_err(|e| VectorStoreError::IndexError(e.to_string()))?;

        Ok(())
    }

    async fn upsert(
        &self,
        records: Vec<DocumentRecord>,
        namespace: &Namespace,
    ) -> Result<(), VectorStoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = records
            .into_iter()
            .map(|record| to_point(record, namespace))
            .collect();

        let upsert = UpsertPointsBuilder::new(&self.collection, points).wait(true);

        self.client
            .upsert_points(upsert)
            .await
            .map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;

        Ok(())
    }

    async fn query(
        &self,
        vector: Vec<f32>,
        namespace: &Namespace,
        top_k: u64,
    ) -> Result<Vec<RetrievedChunk>, VectorStoreError> {
        let search = SearchPointsBuilder::new(&self.collection, vector, top_k)
            .filter(Self::namespace_filter(namespace))
            .with_payload(true);

        let results = self
            .client
            .search_points(search)
            .await
            .map_err(|e| VectorStoreError::QueryError(e.to_string()))?;

        Ok(results
            .result
            .into_iter()
            .map(|point| {
                let id = match point.id.and_then(|id| id.point_id_options) {
                    Some(PointIdOptions::Uuid(uuid)) => uuid,
                    Some(PointIdOptions::Num(num)) => num.to_string(),
                    None => String::new(),
                };
                RetrievedChunk {
                    id,
                    score: point.score,
                    text: payload_str(&point.payload, "text").unwrap_or_default(),
                    filename: payload_str(&point.payload, "filename"),
                }
            })
            .collect())
    }

    async fn delete_namespace(&self, namespace: &Namespace) -> Result<(), VectorStoreError> {
        if self.get_index_info().await?.is_none() {
            return Ok(());
        }

        let delete = DeletePointsBuilder::new(&self.collection)
            .points(Self::namespace_filter(namespace))
            .wait(true);

        self.client
            .delete_points(delete)
            .await
            .map_err(|e| VectorStoreError::DeleteError(e.to_string()))?;

        Ok(())
    }

    fn index_name(&self) -> &str {
        &self.collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecordMetadata, VectorDriver};

    fn record() -> DocumentRecord {
        DocumentRecord {
            id: "2f1c6d4e-8a43-4b8e-9b35-0c7f5b7f2a10".to_string(),
            values: vec![0.1, 0.2, 0.3],
            metadata: RecordMetadata {
                text: "chunk text".to_string(),
                filename: "doc.pdf".to_string(),
                chunk_index: 7,
            },
        }
    }

    #[test]
    fn test_backend_uses_index_name_as_collection() {
        let config = VectorStoreConfig {
            driver: VectorDriver::Qdrant,
            index_name: "papers".to_string(),
            dimension: 3,
            ..Default::default()
        };
        let backend = QdrantBackend::new(&config).unwrap();
        assert_eq!(backend.index_name(), "papers");
        assert_eq!(backend.embedding_dim, 3);
    }

    #[test]
    fn test_point_payload_carries_namespace_and_metadata() {
        let point = to_point(record(), &Namespace::Session("abc".to_string()));

        assert_eq!(
            payload_str(&point.payload, NAMESPACE_FIELD).as_deref(),
            Some("abc")
        );
        assert_eq!(
            payload_str(&point.payload, "text").as_deref(),
            Some("chunk text")
        );
        assert_eq!(
            payload_str(&point.payload, "filename").as_deref(),
            Some("doc.pdf")
        );
        assert!(matches!(
            point.payload.get("chunk_index").and_then(|v| v.kind.clone()),
            Some(Kind::IntegerValue(7))
        ));
    }

    #[test]
    fn test_default_namespace_payload_is_empty_string() {
        let point = to_point(record(), &Namespace::Default);
        assert_eq!(
            payload_str(&point.payload, NAMESPACE_FIELD).as_deref(),
            Some("")
        );
    }
}

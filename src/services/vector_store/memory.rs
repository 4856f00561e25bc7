//! In-process vector store backend.
//!
//! Exact cosine search over per-namespace record lists. Mirrors the remote
//! backends' behavior, including rejecting vectors of the wrong dimension.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{IndexInfo, VectorStore};
use crate::error::VectorStoreError;
use crate::models::{DocumentRecord, Namespace, RetrievedChunk};

pub struct MemoryBackend {
    index_name: String,
    dimension: u64,
    namespaces: RwLock<HashMap<String, Vec<DocumentRecord>>>,
}

impl MemoryBackend {
    pub fn new(index_name: &str, dimension: u64) -> Self {
        Self {
            index_name: index_name.to_string(),
            dimension,
            namespaces: RwLock::new(HashMap::new()),
        }
    }

    fn check_dimension(&self, len: usize) -> Result<(), String> {
        if len as u64 != self.dimension {
            return Err(format!(
                "vector dimension {} does not match the dimension of the index {}",
                len, self.dimension
            ));
        }
        Ok(())
    }

    /// Number of records stored in a namespace.
    pub async fn count(&self, namespace: &Namespace) -> usize {
        self.namespaces
            .read()
            .await
            .get(namespace.as_str())
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl VectorStore for MemoryBackend {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        Ok(true)
    }

    async fn get_index_info(&self) -> Result<Option<IndexInfo>, VectorStoreError> {
        let namespaces = self.namespaces.read().await;
        Ok(Some(IndexInfo {
            dimension: self.dimension,
            record_count: namespaces.values().map(|r| r.len() as u64).sum(),
            namespace_count: Some(namespaces.values().filter(|r| !r.is_empty()).count() as u64),
        }))
    }

    async fn create_index(&self) -> Result<(), VectorStoreError> {
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
        for record in &records {
            self.check_dimension(record.values.len())
                .map_err(VectorStoreError::UpsertError)?;
        }

        let mut namespaces = self.namespaces.write().await;
        let stored = namespaces.entry(namespace.as_str().to_string()).or_default();
        for record in records {
            match stored.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record,
                None => stored.push(record),
            }
        }
        Ok(())
    }

    async fn query(
        &self,
        vector: Vec<f32>,
        namespace: &Namespace,
        top_k: u64,
    ) -> Result<Vec<RetrievedChunk>, VectorStoreError> {
        self.check_dimension(vector.len())
            .map_err(VectorStoreError::QueryError)?;

        let namespaces = self.namespaces.read().await;
        let Some(records) = namespaces.get(namespace.as_str()) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<(f32, &DocumentRecord)> = records
            .iter()
            .map(|r| (cosine_similarity(&vector, &r.values), r))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(top_k as usize)
            .map(|(score, r)| RetrievedChunk {
                id: r.id.clone(),
                score,
                text: r.metadata.text.clone(),
                filename: Some(r.metadata.filename.clone()),
            })
            .collect())
    }

    async fn delete_namespace(&self, namespace: &Namespace) -> Result<(), VectorStoreError> {
        self.namespaces.write().await.remove(namespace.as_str());
        Ok(())
    }

    fn index_name(&self) -> &str {
        &self.index_name
    }
}

/// Cosine similarity; zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordMetadata;

    fn record(id: &str, values: Vec<f32>, text: &str) -> DocumentRecord {
        DocumentRecord {
            id: id.to_string(),
            values,
            metadata: RecordMetadata {
                text: text.to_string(),
                filename: "doc.pdf".to_string(),
                chunk_index: 0,
            },
        }
    }

    fn session(id: &str) -> Namespace {
        Namespace::Session(id.to_string())
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_query_orders_by_similarity_and_limits() {
        let store = MemoryBackend::new("test", 2);
        let ns = session("a");
        store
            .upsert(
                vec![
                    record("far", vec![0.0, 1.0], "far"),
                    record("near", vec![1.0, 0.0], "near"),
                    record("mid", vec![1.0, 1.0], "mid"),
                ],
                &ns,
            )
            .await
            .unwrap();

        let results = store.query(vec![1.0, 0.0], &ns, 2).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid"]);
        assert_eq!(results[0].text, "near");
        assert_eq!(results[0].filename.as_deref(), Some("doc.pdf"));
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let store = MemoryBackend::new("test", 2);
        store
            .upsert(vec![record("a1", vec![1.0, 0.0], "from a")], &session("a"))
            .await
            .unwrap();
        store
            .upsert(vec![record("b1", vec![1.0, 0.0], "from b")], &session("b"))
            .await
            .unwrap();

        let a = store.query(vec![1.0, 0.0], &session("a"), 10).await.unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].text, "from a");

        let default = store
            .query(vec![1.0, 0.0], &Namespace::Default, 10)
            .await
            .unwrap();
        assert!(default.is_empty());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_rejected() {
        let store = MemoryBackend::new("test", 3);
        let err = store
            .upsert(vec![record("x", vec![1.0, 0.0], "x")], &session("a"))
            .await
            .unwrap_err();
        assert!(matches!(err, VectorStoreError::UpsertError(_)));

        let err = store
            .query(vec![1.0], &session("a"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, VectorStoreError::QueryError(_)));
    }

    #[tokio::test]
    async fn test_upsert_overwrites_same_id() {
        let store = MemoryBackend::new("test", 2);
        let ns = session("a");
        store
            .upsert(vec![record("x", vec![1.0, 0.0], "old")], &ns)
            .await
            .unwrap();
        store
            .upsert(vec![record("x", vec![1.0, 0.0], "new")], &ns)
            .await
            .unwrap();

        assert_eq!(store.count(&ns).await, 1);
        let results = store.query(vec![1.0, 0.0], &ns, 5).await.unwrap();
        assert_eq!(results[0].text, "new");
    }

    #[tokio::test]
    async fn test_delete_namespace() {
        let store = MemoryBackend::new("test", 2);
        let ns = session("a");
        store
            .upsert(vec![record("x", vec![1.0, 0.0], "x")], &ns)
            .await
            .unwrap();
        store.delete_namespace(&ns).await.unwrap();
        store.delete_namespace(&session("never-existed")).await.unwrap();

        assert_eq!(store.count(&ns).await, 0);
        let info = store.get_index_info().await.unwrap().unwrap();
        assert_eq!(info.record_count, 0);
        assert_eq!(info.namespace_count, Some(0));
    }
}

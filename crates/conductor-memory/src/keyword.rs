use crate::bm25::Bm25;
use async_trait::async_trait;
use conductor_core::{ConductorResult, Document, Retriever};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    scorer: Bm25,
    documents: HashMap<Uuid, Document>,
}

/// In-memory keyword retriever.
///
/// Documents are ranked with BM25; each returned document carries its `id`
/// and `score` in metadata.
#[derive(Default)]
pub struct KeywordIndex {
    inner: RwLock<Inner>,
}

impl KeywordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_document(&self, document: Document) -> Uuid {
        let id = Uuid::new_v4();
        let mut inner = self.inner.write().await;
        inner.scorer.insert(id, &document.content);
        inner.documents.insert(id, document);
        id
    }

    pub async fn remove_document(&self, id: Uuid) -> bool {
        let mut inner = self.inner.write().await;
        inner.documents.remove(&id);
        inner.scorer.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Index every regular file directly under `dir` as one document, with
    /// its path under the `source` metadata key. Files that are not valid
    /// UTF-8 are skipped. Returns the number of documents added.
    pub async fn load_dir(&self, dir: impl AsRef<Path>) -> ConductorResult<usize> {
        let dir = dir.as_ref();
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut added = 0;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let path = entry.path();
            let Ok(content) = tokio::fs::read_to_string(&path).await else {
                debug!(path = %path.display(), "Skipping non-text file");
                continue;
            };
            let source = path.display().to_string();
            self.add_document(Document::new(content).with_metadata("source", source.into()))
                .await;
            added += 1;
        }

        info!(dir = %dir.display(), documents = added, "Keyword index loaded");
        Ok(added)
    }
}

#[async_trait]
impl Retriever for KeywordIndex {
    async fn retrieve(&self, query: &str, top_k: usize) -> ConductorResult<Vec<Document>> {
        let inner = self.inner.read().await;
        let hits = inner.scorer.search(query, top_k);
        debug!(hits = hits.len(), "Keyword search");

        Ok(hits
            .into_iter()
            .filter_map(|(id, score)| {
                inner.documents.get(&id).map(|doc| {
                    doc.clone()
                        .with_metadata("id", id.to_string().into())
                        .with_metadata("score", serde_json::json!(score))
                })
            })
            .collect())
    }
}

use async_trait::async_trait;
use conductor_core::{ConductorError, ConductorResult, Document, Retriever};
use serde::Deserialize;
use tracing::debug;

/// Retrieval service reached over HTTP.
///
/// Sends `{query, top_k}` to the endpoint and accepts either
/// `{"documents": [...]}` or a bare array of documents back.
pub struct HttpRetriever {
    endpoint: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RetrievalResponse {
    Wrapped { documents: Vec<Document> },
    Bare(Vec<Document>),
}

impl HttpRetriever {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> ConductorResult<Vec<Document>> {
        let resp = self
            .http
            .post(&self.endpoint)
            .json(&serde_json::json!({"query": query, "top_k": top_k}))
            .send()
            .await
            .map_err(|e| ConductorError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ConductorError::Downstream(format!(
                "retrieval service error {status}: {text}"
            )));
        }

        let body: RetrievalResponse = resp
            .json()
            .await
            .map_err(|e| ConductorError::Parse(e.to_string()))?;
        let mut documents = match body {
            RetrievalResponse::Wrapped { documents } => documents,
            RetrievalResponse::Bare(documents) => documents,
        };
        documents.truncate(top_k);
        debug!(endpoint = %self.endpoint, documents = documents.len(), "Retrieved documents");
        Ok(documents)
    }
}

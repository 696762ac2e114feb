use crate::agent::{Agent, AgentInit};
use crate::trace::AgentState;
use async_trait::async_trait;
use conductor_core::{
    CompletionOptions, ConductorError, ConductorResult, Document, ModelCompletion, Retriever,
    RunContext,
};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds a retrieval backend on demand.
pub type RetrieverFactory =
    Arc<dyn Fn() -> BoxFuture<'static, ConductorResult<Arc<dyn Retriever>>> + Send + Sync>;

/// Wrap an already-built retriever as a factory.
pub fn ready_retriever(retriever: Arc<dyn Retriever>) -> RetrieverFactory {
    Arc::new(move || {
        let retriever = retriever.clone();
        async move { Ok::<_, ConductorError>(retriever) }.boxed()
    })
}

const PLAN: [&str; 4] = [
    "Initialize retrieval backends",
    "Retrieve relevant context",
    "Generate response",
    "Assemble result",
];

/// Context merged from both retrieval sources.
///
/// Index results whose content already appears among the vector results are
/// dropped, so each passage is shown to the model once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievedContext {
    pub vector_store_results: Vec<Document>,
    pub index_results: Vec<Document>,
}

impl RetrievedContext {
    pub fn merge(vector: Vec<Document>, index: Vec<Document>) -> Self {
        let index_results = index
            .into_iter()
            .filter(|doc| !vector.iter().any(|v| v.content == doc.content))
            .collect();
        Self {
            vector_store_results: vector,
            index_results,
        }
    }

    pub fn len(&self) -> usize {
        self.vector_store_results.len() + self.index_results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Source {
    factory: RetrieverFactory,
    built: Option<Arc<dyn Retriever>>,
}

impl Source {
    fn new(factory: RetrieverFactory) -> Self {
        Self {
            factory,
            built: None,
        }
    }

    /// Build on first use; reuse for the life of the agent afterwards.
    async fn get(&mut self) -> ConductorResult<Arc<dyn Retriever>> {
        if let Some(retriever) = &self.built {
            return Ok(retriever.clone());
        }
        let retriever = (self.factory)().await?;
        self.built = Some(retriever.clone());
        Ok(retriever)
    }
}

/// Retrieval-augmented agent: answers a query from context merged out of a
/// vector source and an index source.
pub struct RagAgent {
    state: AgentState,
    completion: Arc<dyn ModelCompletion>,
    options: CompletionOptions,
    vector: Source,
    index: Source,
    top_k: usize,
}

impl RagAgent {
    pub fn new(init: AgentInit, vector: RetrieverFactory, index: RetrieverFactory) -> Self {
        Self {
            state: AgentState::new(init.name, init.max_steps),
            completion: init.completion,
            options: init.options,
            vector: Source::new(vector),
            index: Source::new(index),
            top_k: 3,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

fn answer_prompt(task: &str, context: &str) -> String {
    format!(
        "You are an AI assistant powered by RAG (Retrieval Augmented Generation).\n\
         Your task is to provide accurate answers based on the retrieved context.\n\n\
         Task: {task}\n\n\
         Retrieved Context:\n{context}\n\n\
         Query: {task}\n\n\
         Please provide:\n\
         1. A direct answer to the query\n\
         2. Supporting evidence from the context\n\
         3. Any relevant code examples or documentation references\n\
         4. Suggestions for follow-up queries\n\n\
         Response:"
    )
}

#[async_trait]
impl Agent for RagAgent {
    fn state(&self) -> &AgentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AgentState {
        &mut self.state
    }

    async fn plan(&mut self, _task: &str, _ctx: &RunContext) -> ConductorResult<Vec<String>> {
        Ok(PLAN.iter().map(|s| (*s).to_string()).collect())
    }

    async fn execute_plan(
        &mut self,
        task: &str,
        plan: &[String],
        ctx: &RunContext,
    ) -> ConductorResult<serde_json::Value> {
        let label = |i: usize| plan.get(i).map_or(PLAN[i], String::as_str).to_string();

        self.state.consume_step()?;
        let vector = ctx.guard(self.vector.get()).await?;
        let index = ctx.guard(self.index.get()).await?;
        self.state.complete_step(label(0), json!({"sources": 2}));

        self.state.consume_step()?;
        let vector_results = ctx.guard(vector.retrieve(task, self.top_k)).await?;
        let index_results = ctx.guard(index.retrieve(task, self.top_k)).await?;
        let context = RetrievedContext::merge(vector_results, index_results);
        debug!(agent = %self.state.name(), documents = context.len(), "Context retrieved");
        let counts = json!({
            "vector_store": context.vector_store_results.len(),
            "index": context.index_results.len(),
        });
        self.state.complete_step(label(1), counts);

        self.state.consume_step()?;
        let prompt = answer_prompt(task, &serde_json::to_string_pretty(&context)?);
        let response = ctx
            .guard(self.completion.complete(&prompt, &self.options))
            .await?;
        let answered = json!({"response": response});
        self.state.complete_step(label(2), answered);

        self.state.consume_step()?;
        let sources = json!({
            "vector_store": contents(&context.vector_store_results),
            "index": contents(&context.index_results),
        });
        let assembled = json!({"documents": context.len()});
        self.state.complete_step(label(3), assembled);
        info!(agent = %self.state.name(), documents = context.len(), "RAG answer generated");

        Ok(json!({
            "query": task,
            "context": context,
            "response": response,
            "sources": sources,
        }))
    }
}

fn contents(documents: &[Document]) -> Vec<&str> {
    documents.iter().map(|doc| doc.content.as_str()).collect()
}

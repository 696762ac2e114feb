pub mod auto;
pub mod automation;
pub mod code_review;
pub mod rag;

pub use auto::AutoAgent;
pub use automation::{AutomationAgent, AutomationSettings};
pub use code_review::CodeReviewAgent;
pub use rag::{ready_retriever, RagAgent, RetrievedContext, RetrieverFactory};

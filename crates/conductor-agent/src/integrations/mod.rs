//! HTTP clients for the retrieval, automation, and code-review ports.

pub mod automation;
pub mod retrieval;
pub mod review;

pub use automation::HttpAutomationTrigger;
pub use retrieval::HttpRetriever;
pub use review::{HttpCodeReviewer, DEFAULT_REVIEW_URL};

pub mod openai;

use crate::config::ModelConfig;
use conductor_core::{ConductorResult, ModelCompletion};
use std::sync::Arc;

pub use openai::OpenAiCompletion;

/// Build the completion capability for a model config.
///
/// Every supported provider speaks the OpenAI chat completions API, so they
/// all share one backend; the provider only selects the base URL and headers.
pub fn completion_from_config(config: ModelConfig) -> ConductorResult<Arc<dyn ModelCompletion>> {
    Ok(Arc::new(OpenAiCompletion::new(config)?))
}

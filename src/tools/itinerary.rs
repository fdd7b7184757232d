use std::sync::Arc;

use tracing::instrument;

use super::prompts;
use crate::providers::{ChatRequest, LlmProvider};
use crate::Result;

/// Day-by-day itinerary planning
#[derive(Clone)]
pub struct ItineraryPlanner {
    llm: Arc<dyn LlmProvider>,
}

impl ItineraryPlanner {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    #[instrument(skip(self))]
    pub async fn plan(&self, query: &str) -> Result<String> {
        self.llm
            .complete(ChatRequest::new(prompts::ITINERARY, query).temperature(0.1))
            .await
    }
}

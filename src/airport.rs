//! City name to IATA airport code resolution

use std::sync::Arc;

use tracing::{debug, warn};

use crate::providers::{ChatRequest, LlmProvider};
use crate::tools::prompts;

/// Asks an LLM for a city's airport code, falling back to the city name
#[derive(Clone)]
pub struct AirportResolver {
    llm: Arc<dyn LlmProvider>,
}

fn as_iata(candidate: &str) -> Option<String> {
    let code = candidate.trim().to_ascii_uppercase();
    (code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())).then_some(code)
}

impl AirportResolver {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Never fails: any provider error or unusable reply yields `city` unchanged
    pub async fn resolve(&self, city: &str) -> String {
        let trimmed = city.trim();
        if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_uppercase()) {
            return trimmed.to_string();
        }

        let request = ChatRequest::new("", prompts::airport_code(city));
        match self.llm.complete(request).await {
            Ok(reply) => match as_iata(&reply) {
                Some(code) => {
                    debug!("Resolved {city} to {code}");
                    code
                }
                None => {
                    debug!("No airport code for {city}, using the city name");
                    city.to_string()
                }
            },
            Err(e) => {
                warn!("Airport lookup for {city} failed: {e}");
                city.to_string()
            }
        }
    }
}

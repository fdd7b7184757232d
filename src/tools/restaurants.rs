use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use tracing::instrument;

use super::prompts;
use crate::providers::{ChatRequest, LlmProvider};
use crate::Result;

pub const DEFAULT_DIETARY: &str = "veg and non-veg";

fn default_dietary() -> String {
    DEFAULT_DIETARY.to_string()
}

fn default_travelers() -> u32 {
    2
}

/// Inputs for a restaurant search
#[derive(Debug, Clone, Deserialize)]
pub struct RestaurantQuery {
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub dates: String,
    #[serde(default = "default_dietary")]
    pub dietary_preferences: String,
    #[serde(default)]
    pub budget_hint: String,
    #[serde(default = "default_travelers")]
    pub travelers: u32,
    /// Itinerary text to anchor suggestions to; empty means independent search
    #[serde(default)]
    pub itinerary_details: String,
}

impl Default for RestaurantQuery {
    fn default() -> Self {
        Self {
            location: String::new(),
            dates: String::new(),
            dietary_preferences: default_dietary(),
            budget_hint: String::new(),
            travelers: default_travelers(),
            itinerary_details: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    ItineraryBased,
    Independent,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::ItineraryBased => f.write_str("itinerary-based"),
            SearchMode::Independent => f.write_str("independent"),
        }
    }
}

fn plural(travelers: u32) -> &'static str {
    if travelers > 1 { "s" } else { "" }
}

fn or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() { fallback } else { value }
}

impl RestaurantQuery {
    #[must_use]
    pub fn mode(&self) -> SearchMode {
        if self.itinerary_details.trim().is_empty() {
            SearchMode::Independent
        } else {
            SearchMode::ItineraryBased
        }
    }

    /// User turn sent alongside the system prompt
    #[must_use]
    pub fn user_query(&self) -> String {
        match self.mode() {
            SearchMode::ItineraryBased => format!(
                "Find restaurants based on this itinerary:\n{}\n\nDates: {}\nDietary Preferences: {}\nTravelers: {}\nBudget: {}\n\nSuggest restaurants near each activity location, aligned with meal times.",
                self.itinerary_details,
                or(&self.dates, "Not specified"),
                self.dietary_preferences,
                self.travelers,
                or(&self.budget_hint, "Flexible"),
            ),
            SearchMode::Independent => format!(
                "Find the best restaurants in {} for {} person{}.\n\nDietary Preferences: {}\nBudget: {}\nDates: {}\n\nGroup the options into breakfast, lunch, dinner and local specialties across budget, mid-range and fine dining.",
                self.location,
                self.travelers,
                plural(self.travelers),
                self.dietary_preferences,
                or(&self.budget_hint, "Varied price ranges from budget to fine dining"),
                or(&self.dates, "General recommendations"),
            ),
        }
    }
}

/// Restaurant recommendations, either anchored to an itinerary or for a whole location
#[derive(Clone)]
pub struct RestaurantFinder {
    llm: Arc<dyn LlmProvider>,
}

impl RestaurantFinder {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    #[instrument(skip(self, query), fields(mode = %query.mode()))]
    pub async fn search(&self, query: &RestaurantQuery) -> Result<String> {
        let location = or(&query.location, "the destination");
        let system = prompts::restaurant(
            &query.mode().to_string(),
            location,
            or(&query.dietary_preferences, "No specific preferences"),
            or(&query.budget_hint, "No specific budget, suggest varied price ranges"),
            query.travelers,
        );

        self.llm
            .complete(ChatRequest::new(system, query.user_query()).temperature(0.1))
            .await
    }
}

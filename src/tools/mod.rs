//! Lookup tools: each one formats a prompt, calls a provider and returns its text

pub mod accommodation;
pub mod itinerary;
pub mod prompts;
pub mod restaurants;
pub mod travel;

use std::sync::Arc;

use serde::Serialize;

use crate::airport::AirportResolver;
use crate::providers::{LlmProvider, TravelDataProvider};

pub use accommodation::{AccommodationPlanner, HotelSearch};
pub use itinerary::ItineraryPlanner;
pub use restaurants::{RestaurantFinder, RestaurantQuery, SearchMode};
pub use travel::{TravelOptimizer, TravelSearchReport};

/// All four tools wired to the same providers
#[derive(Clone)]
pub struct Toolset {
    pub accommodation: AccommodationPlanner,
    pub itinerary: ItineraryPlanner,
    pub restaurants: RestaurantFinder,
    pub travel: TravelOptimizer,
}

impl Toolset {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        travel_data: Option<Arc<dyn TravelDataProvider>>,
        airports: Option<AirportResolver>,
    ) -> Self {
        Self {
            accommodation: AccommodationPlanner::new(llm.clone(), travel_data.clone()),
            itinerary: ItineraryPlanner::new(llm.clone()),
            restaurants: RestaurantFinder::new(llm.clone()),
            travel: TravelOptimizer::new(llm, travel_data, airports),
        }
    }
}

/// Static description of a tool, served by `/agent/info` and `tools` CLI command
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub input: &'static str,
    pub output: &'static str,
    pub example: &'static str,
    pub endpoint: &'static str,
}

const CATALOG: [ToolInfo; 4] = [
    ToolInfo {
        name: "search_accommodations",
        description: "Search for accommodation options based on a natural language query",
        input: "Natural language query with location, dates, budget and preferences",
        output: "Markdown accommodation recommendations with pricing, optionally with live Google Hotels results",
        example: "Find hotels in Paris for 2 people from 26-11-2025 to 30-11-2025 with budget $500",
        endpoint: "/tools/accommodation",
    },
    ToolInfo {
        name: "plan_itinerary",
        description: "Create day-by-day itinerary plans",
        input: "Natural language query with destination, dates, travel type and preferences",
        output: "Daily tables with Time | Activity | Details | Maps columns",
        example: "Plan a 3-day itinerary for Tokyo for a couple with budget $1500, prefer temples and shopping",
        endpoint: "/tools/itinerary",
    },
    ToolInfo {
        name: "search_restaurants",
        description: "Find restaurants for an itinerary or a location, respecting dietary preferences",
        input: "Itinerary details, dates and dietary preferences",
        output: "Restaurant tables with Time | Location | Restaurant | Cuisine | Price | Dietary | Maps",
        example: "Search restaurants for a Tokyo itinerary with veg and non-veg preferences",
        endpoint: "/tools/restaurants",
    },
    ToolInfo {
        name: "travel_search",
        description: "Transport options: live flight pricing plus LLM research for buses and trains",
        input: "Natural language query, or structured origin/destination/date/mode parameters",
        output: "Markdown recommendations, or a JSON report of per-provider search results",
        example: "Mumbai to Delhi on 2024-12-01 by flight and train for 2 travelers",
        endpoint: "/tools/travel",
    },
];

#[must_use]
pub fn tool_catalog() -> &'static [ToolInfo] {
    &CATALOG
}

#[must_use]
pub fn list_available_tools() -> Vec<&'static str> {
    CATALOG.iter().map(|tool| tool.name).collect()
}

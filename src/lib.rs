//! `TripMazer` - Budget-aware AI trip planning
//!
//! This library extracts trip preferences from a free-form request, splits
//! the budget across the accommodation, itinerary, restaurant and travel
//! tools, runs them in turn and renders a markdown report.

pub mod airport;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod planner;
pub mod providers;
pub mod telemetry;
pub mod tools;
pub mod web;

// Re-export core types for public API
pub use airport::AirportResolver;
pub use cache::PersistentCache;
pub use config::TripMazerConfig;
pub use error::{ErrorCode, TripMazerError};
pub use models::{Currency, ToolKind, TravelSearchParams, TripPreferences};
pub use planner::{TripOptimizationAgent, TripPlan, TripState};
pub use providers::{
    CachedLlm, ChatRequest, GeminiClient, LlmProvider, PerplexityClient, ProviderSet, SerpApiClient,
    TravelDataProvider,
};
pub use tools::Toolset;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TripMazerError>;

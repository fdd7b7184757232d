//! Trip optimization agent
//!
//! Runs the request through a fixed pipeline: preference extraction, budget
//! split, one call per tool in routing order, then a markdown report. A
//! failing tool is recorded on the state and the pipeline moves on.

pub mod budget;
pub mod preferences;
pub mod report;
pub mod state;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

use crate::config::PlannerConfig;
use crate::models::ToolKind;
use crate::providers::LlmProvider;
use crate::tools::{RestaurantQuery, Toolset};
use crate::Result;

pub use state::{ExecutionSummary, TripState};

/// Result of one planning run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripPlan {
    pub combined_result: String,
    pub execution_summary: Value,
    pub state: TripState,
}

#[derive(Clone)]
pub struct TripOptimizationAgent {
    tools: Toolset,
    llm: Arc<dyn LlmProvider>,
    config: PlannerConfig,
}

/// Whether a tool's text hints that its share of the budget is too small
fn suggests_budget_adjustment(result: &str) -> bool {
    let lower = result.to_lowercase();
    lower.contains("budget") && (lower.contains("exceed") || lower.contains("over"))
}

impl TripOptimizationAgent {
    pub fn new(tools: Toolset, llm: Arc<dyn LlmProvider>, config: PlannerConfig) -> Self {
        Self { tools, llm, config }
    }

    #[must_use]
    pub fn tools(&self) -> &Toolset {
        &self.tools
    }

    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn plan_trip(&self, query: &str) -> TripPlan {
        let mut state = TripState::new(query);

        self.process_input(&mut state).await;
        self.allocate_budget(&mut state);

        while let Some(tool) = state.current_tool() {
            self.execute_tool(&mut state, tool).await;
            self.track_budget(&mut state, tool);
        }

        state.combined_result = report::render(&state);
        let execution_summary =
            serde_json::to_value(state.execution_summary()).unwrap_or(Value::Null);

        info!(
            completed = state.completed_tools.len(),
            errors = state.errors.len(),
            "Trip planning finished"
        );

        TripPlan {
            combined_result: state.combined_result.clone(),
            execution_summary,
            state,
        }
    }

    async fn process_input(&self, state: &mut TripState) {
        let preferences =
            preferences::extract(self.llm.as_ref(), &state.original_query, self.config.default_budget)
                .await;
        let sequence = preferences.routing_order.clone();
        state.update_input(preferences);
        state.set_tool_sequence(sequence);
    }

    fn allocate_budget(&self, state: &mut TripState) {
        let allocation = budget::allocate(
            state.total_budget,
            &state.preferences.routing_order,
            &self.config,
        );
        state.allocate_budget(allocation);
    }

    async fn execute_tool(&self, state: &mut TripState, tool: ToolKind) {
        let amount = state.remaining_for(tool);
        let currency = state.currency.symbol();

        match self.run_tool(state, tool, amount, currency).await {
            Ok(result) => {
                if suggests_budget_adjustment(&result) {
                    state.add_warning(format!("{tool} suggests budget adjustment needed"));
                }
                state.set_tool_result(tool, result);
            }
            Err(e) => {
                let message = format!("Error executing {tool}: {e}");
                state.add_error(&message);
                state.set_tool_result(tool, format!("Error: {message}"));
            }
        }
        state.mark_tool_completed(tool);
    }

    async fn run_tool(
        &self,
        state: &TripState,
        tool: ToolKind,
        amount: f64,
        currency: &str,
    ) -> Result<String> {
        let budget_aware = format!(
            "{} Budget for {tool}: {currency}{amount:.0}",
            state.original_query
        );

        match tool {
            ToolKind::Accommodation => self.tools.accommodation.search(&budget_aware, None).await,
            ToolKind::Itinerary => self.tools.itinerary.plan(&budget_aware).await,
            ToolKind::Travel => self.tools.travel.optimize(&budget_aware).await,
            ToolKind::Restaurant => match state.tool_result(ToolKind::Itinerary) {
                Some(itinerary) if !itinerary.is_empty() => {
                    let query = RestaurantQuery {
                        location: state.to_location.clone(),
                        dates: state.dates.clone(),
                        itinerary_details: itinerary.to_string(),
                        travelers: state.travelers,
                        ..RestaurantQuery::default()
                    };
                    self.tools.restaurants.search(&query).await
                }
                _ => Ok(format!(
                    "No itinerary available for restaurant planning. Budget: {currency}{amount:.0}"
                )),
            },
        }
    }

    fn track_budget(&self, state: &mut TripState, tool: ToolKind) {
        let estimate = budget::estimated_spend(state.remaining_for(tool), &self.config);
        state.spend_budget(tool, estimate);
        state.advance_step();
    }
}

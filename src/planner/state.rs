//! Per-request planning record

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{Currency, NOT_SPECIFIED, ToolKind, TripPreferences};

/// Everything the pipeline knows about one request; created at the start and
/// discarded once the plan is returned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripState {
    pub original_query: String,
    pub preferences: TripPreferences,

    pub total_budget: f64,
    pub currency: Currency,
    pub dates: String,
    pub from_location: String,
    pub to_location: String,
    pub travelers: u32,

    pub remaining_budget: f64,
    pub budget_allocation: BTreeMap<ToolKind, f64>,
    pub spent_amounts: BTreeMap<ToolKind, f64>,

    pub tool_sequence: Vec<ToolKind>,
    pub current_step: usize,
    pub completed_tools: Vec<ToolKind>,
    pub results: BTreeMap<ToolKind, String>,

    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub retry_count: u32,

    pub combined_result: String,
}

/// Snapshot of how the run went, returned alongside the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub total_budget: f64,
    pub remaining_budget: f64,
    pub budget_utilization: f64,
    pub completed_tools: Vec<ToolKind>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub retry_count: u32,
}

impl TripState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            original_query: query.into(),
            preferences: TripPreferences::default(),
            total_budget: 0.0,
            currency: Currency::default(),
            dates: NOT_SPECIFIED.to_string(),
            from_location: NOT_SPECIFIED.to_string(),
            to_location: NOT_SPECIFIED.to_string(),
            travelers: 1,
            remaining_budget: 0.0,
            budget_allocation: BTreeMap::new(),
            spent_amounts: BTreeMap::new(),
            tool_sequence: Vec::new(),
            current_step: 0,
            completed_tools: Vec::new(),
            results: BTreeMap::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            retry_count: 0,
            combined_result: String::new(),
        }
    }

    /// Copies extracted preferences in and resets the remaining budget
    pub fn update_input(&mut self, preferences: TripPreferences) {
        self.total_budget = preferences.budget;
        self.remaining_budget = preferences.budget;
        self.currency = preferences.currency;
        self.dates = preferences.dates.clone();
        self.from_location = preferences.from_location.clone();
        self.to_location = preferences.to_location.clone();
        self.travelers = preferences.travelers;
        self.preferences = preferences;
    }

    pub fn set_tool_sequence(&mut self, sequence: Vec<ToolKind>) {
        self.tool_sequence = sequence;
        self.current_step = 0;
    }

    pub fn allocate_budget(&mut self, allocation: BTreeMap<ToolKind, f64>) {
        self.spent_amounts = allocation.keys().map(|tool| (*tool, 0.0)).collect();
        self.budget_allocation = allocation;
    }

    /// Books `amount` against the tool's allocation. Overspending is refused
    /// and recorded as a warning.
    pub fn spend_budget(&mut self, tool: ToolKind, amount: f64) -> bool {
        let allocated = self.budget_allocation.get(&tool).copied().unwrap_or(0.0);
        let spent = self.spent_amounts.get(&tool).copied().unwrap_or(0.0);

        if spent + amount <= allocated {
            self.spent_amounts.insert(tool, spent + amount);
            self.remaining_budget -= amount;
            true
        } else {
            self.add_warning(format!(
                "Budget exceeded for {tool}: trying to spend {amount}, only {} remaining",
                allocated - spent
            ));
            false
        }
    }

    #[must_use]
    pub fn remaining_for(&self, tool: ToolKind) -> f64 {
        let allocated = self.budget_allocation.get(&tool).copied().unwrap_or(0.0);
        let spent = self.spent_amounts.get(&tool).copied().unwrap_or(0.0);
        allocated - spent
    }

    #[must_use]
    pub fn allocated_for(&self, tool: ToolKind) -> f64 {
        self.budget_allocation.get(&tool).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn spent_for(&self, tool: ToolKind) -> f64 {
        self.spent_amounts.get(&tool).copied().unwrap_or(0.0)
    }

    pub fn advance_step(&mut self) {
        self.current_step += 1;
    }

    pub fn mark_tool_completed(&mut self, tool: ToolKind) {
        if !self.completed_tools.contains(&tool) {
            self.completed_tools.push(tool);
        }
    }

    pub fn set_tool_result(&mut self, tool: ToolKind, result: impl Into<String>) {
        self.results.insert(tool, result.into());
    }

    #[must_use]
    pub fn tool_result(&self, tool: ToolKind) -> Option<&str> {
        self.results.get(&tool).map(String::as_str)
    }

    pub fn add_error(&mut self, message: impl AsRef<str>) {
        let entry = format!("{}: {}", Utc::now().to_rfc3339(), message.as_ref());
        warn!("{entry}");
        self.errors.push(entry);
    }

    pub fn add_warning(&mut self, message: impl AsRef<str>) {
        let entry = format!("{}: {}", Utc::now().to_rfc3339(), message.as_ref());
        warn!("{entry}");
        self.warnings.push(entry);
    }

    pub fn increment_retry(&mut self) {
        self.retry_count += 1;
    }

    #[must_use]
    pub fn current_tool(&self) -> Option<ToolKind> {
        self.tool_sequence.get(self.current_step).copied()
    }

    #[must_use]
    pub fn is_execution_complete(&self) -> bool {
        self.current_step >= self.tool_sequence.len()
    }

    #[must_use]
    pub fn execution_summary(&self) -> ExecutionSummary {
        ExecutionSummary {
            total_budget: self.total_budget,
            remaining_budget: self.remaining_budget,
            budget_utilization: self.total_budget - self.remaining_budget,
            completed_tools: self.completed_tools.clone(),
            errors: self.errors.clone(),
            warnings: self.warnings.clone(),
            retry_count: self.retry_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_SEQUENCE;

    fn state_with_budget() -> TripState {
        let mut state = TripState::new("Plan Goa trip");
        state.update_input(TripPreferences {
            budget: 1000.0,
            ..TripPreferences::default()
        });
        state.allocate_budget(BTreeMap::from([
            (ToolKind::Accommodation, 400.0),
            (ToolKind::Travel, 600.0),
        ]));
        state
    }

    #[test]
    fn test_update_input_resets_remaining() {
        let state = state_with_budget();
        assert_eq!(state.total_budget, 1000.0);
        assert_eq!(state.remaining_budget, 1000.0);
        assert_eq!(state.spent_for(ToolKind::Accommodation), 0.0);
    }

    #[test]
    fn test_spend_within_allocation() {
        let mut state = state_with_budget();
        assert!(state.spend_budget(ToolKind::Accommodation, 300.0));
        assert_eq!(state.remaining_for(ToolKind::Accommodation), 100.0);
        assert_eq!(state.remaining_budget, 700.0);
        assert!(state.warnings.is_empty());
    }

    #[test]
    fn test_overspend_is_refused_with_warning() {
        let mut state = state_with_budget();
        assert!(state.spend_budget(ToolKind::Accommodation, 300.0));
        assert!(!state.spend_budget(ToolKind::Accommodation, 150.0));

        assert_eq!(state.spent_for(ToolKind::Accommodation), 300.0);
        assert_eq!(state.remaining_budget, 700.0);
        assert_eq!(state.warnings.len(), 1);
        assert!(state.warnings[0].ends_with(
            "Budget exceeded for accommodation: trying to spend 150, only 100 remaining"
        ));
    }

    #[test]
    fn test_unknown_category_has_nothing_to_spend() {
        let mut state = state_with_budget();
        assert_eq!(state.remaining_for(ToolKind::Restaurant), 0.0);
        assert!(!state.spend_budget(ToolKind::Restaurant, 1.0));
        assert!(state.spend_budget(ToolKind::Restaurant, 0.0));
    }

    #[test]
    fn test_step_progression() {
        let mut state = TripState::new("q");
        state.set_tool_sequence(DEFAULT_SEQUENCE.to_vec());
        assert_eq!(state.current_tool(), Some(ToolKind::Itinerary));

        for _ in 0..4 {
            assert!(!state.is_execution_complete());
            state.advance_step();
        }
        assert!(state.is_execution_complete());
        assert_eq!(state.current_tool(), None);

        state.set_tool_sequence(vec![ToolKind::Travel]);
        assert_eq!(state.current_step, 0);
    }

    #[test]
    fn test_mark_completed_is_idempotent() {
        let mut state = TripState::new("q");
        state.mark_tool_completed(ToolKind::Travel);
        state.mark_tool_completed(ToolKind::Travel);
        assert_eq!(state.completed_tools, vec![ToolKind::Travel]);
    }

    #[test]
    fn test_messages_are_timestamped() {
        let mut state = TripState::new("q");
        state.add_error("boom");
        let (stamp, message) = state.errors[0].split_once(": ").unwrap();
        assert_eq!(message, "boom");
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn test_execution_summary() {
        let mut state = state_with_budget();
        state.spend_budget(ToolKind::Travel, 480.0);
        state.mark_tool_completed(ToolKind::Travel);
        state.increment_retry();

        let summary = state.execution_summary();
        assert_eq!(summary.total_budget, 1000.0);
        assert_eq!(summary.remaining_budget, 520.0);
        assert_eq!(summary.budget_utilization, 480.0);
        assert_eq!(summary.completed_tools, vec![ToolKind::Travel]);
        assert_eq!(summary.retry_count, 1);
    }
}

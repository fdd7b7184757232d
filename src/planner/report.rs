//! Markdown rendering of a finished `TripState`

use std::fmt::Write;

use super::state::TripState;
use crate::models::ToolKind;

const SECTIONS: [(ToolKind, &str); 4] = [
    (ToolKind::Itinerary, "🗺️ Itinerary Planning"),
    (ToolKind::Travel, "🚌 Travel Optimization"),
    (ToolKind::Accommodation, "🏨 Accommodation Recommendations"),
    (ToolKind::Restaurant, "🍽️ Restaurant Recommendations"),
];

fn capitalized(tool: ToolKind) -> String {
    let name = tool.as_str();
    let mut chars = name.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

fn joined(tools: &[ToolKind], separator: &str) -> String {
    tools
        .iter()
        .map(|tool| tool.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Renders the combined trip report
#[must_use]
pub fn render(state: &TripState) -> String {
    let c = state.currency.symbol();
    let mut out = String::new();

    // writing into a String cannot fail
    let _ = writeln!(out, "# 🌟 Comprehensive Trip Planning Report\n");
    let _ = writeln!(out, "## 📋 Executive Summary");
    let _ = writeln!(
        out,
        "- **Destination:** {} → {}",
        state.from_location, state.to_location
    );
    let _ = writeln!(out, "- **Dates:** {}", state.dates);
    let _ = writeln!(out, "- **Travelers:** {} people", state.travelers);
    let _ = writeln!(out, "- **Total Budget:** {c}{}", state.total_budget);
    let _ = writeln!(
        out,
        "- **Budget Utilized:** {c}{:.2}",
        state.total_budget - state.remaining_budget
    );
    let _ = writeln!(
        out,
        "- **Remaining Budget:** {c}{:.2}\n",
        state.remaining_budget
    );

    for (tool, heading) in SECTIONS {
        let _ = writeln!(out, "---\n");
        let _ = writeln!(out, "## {heading}");
        let _ = writeln!(out, "{}\n", state.tool_result(tool).unwrap_or_default());
    }

    let _ = writeln!(out, "---\n");
    let _ = writeln!(out, "## 💰 Budget Summary");
    let _ = writeln!(out, "| Category | Allocated | Estimated Used | Remaining |");
    let _ = writeln!(out, "|----------|-----------|----------------|-----------|");
    for (tool, _) in SECTIONS {
        let _ = writeln!(
            out,
            "| {} | {c}{:.0} | {c}{:.0} | {c}{:.0} |",
            capitalized(tool),
            state.allocated_for(tool),
            state.spent_for(tool),
            state.remaining_for(tool),
        );
    }

    let _ = writeln!(out, "\n## ⚠️ Warnings & Notes");
    if state.warnings.is_empty() {
        let _ = writeln!(out, "- No warnings");
    } else {
        for warning in &state.warnings {
            let _ = writeln!(out, "- {warning}");
        }
    }

    let _ = writeln!(out, "\n## 🎯 Execution Summary");
    let _ = writeln!(
        out,
        "- **Tools Completed:** {}",
        joined(&state.completed_tools, ", ")
    );
    let _ = writeln!(
        out,
        "- **Execution Order:** {}",
        joined(&state.tool_sequence, " → ")
    );
    let _ = writeln!(out, "- **Total Retries:** {}", state.retry_count);

    out
}

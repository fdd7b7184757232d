use std::collections::BTreeMap;

use crate::config::PlannerConfig;
use crate::models::ToolKind;

fn base_share(tool: ToolKind) -> f64 {
    match tool {
        ToolKind::Accommodation => 0.35,
        ToolKind::Itinerary => 0.20,
        ToolKind::Travel => 0.30,
        ToolKind::Restaurant => 0.15,
    }
}

/// Fraction of the total budget given to each tool. The first tool of the
/// routing order gets a bonus taken evenly from the others, each of which
/// keeps at least `min_share`.
#[must_use]
pub fn shares(routing_order: &[ToolKind], config: &PlannerConfig) -> BTreeMap<ToolKind, f64> {
    let mut shares: BTreeMap<ToolKind, f64> = ToolKind::ALL
        .iter()
        .map(|tool| (*tool, base_share(*tool)))
        .collect();

    let Some(first) = routing_order.first().copied() else {
        return shares;
    };

    let others = (ToolKind::ALL.len() - 1) as f64;
    for (tool, share) in &mut shares {
        if *tool == first {
            *share += config.first_tool_bonus;
        } else {
            *share = (*share - config.first_tool_bonus / others).max(config.min_share);
        }
    }
    shares
}

/// Absolute amount per tool
#[must_use]
pub fn allocate(
    total: f64,
    routing_order: &[ToolKind],
    config: &PlannerConfig,
) -> BTreeMap<ToolKind, f64> {
    shares(routing_order, config)
        .into_iter()
        .map(|(tool, share)| (tool, total * share))
        .collect()
}

/// Estimated spend booked after a tool has run
#[must_use]
pub fn estimated_spend(remaining: f64, config: &PlannerConfig) -> f64 {
    remaining * config.spend_ratio
}

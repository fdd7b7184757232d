//! Turning a free-form request into `TripPreferences`

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::ErrorCode;
use crate::models::{Currency, DEFAULT_SEQUENCE, NOT_SPECIFIED, ToolKind, TripPreferences};
use crate::providers::{ChatRequest, LlmProvider};
use crate::tools::prompts;
use crate::{Result, TripMazerError};

static FLAT_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^{}]*\}").expect("static regex is valid"));

/// Larger traveler counts are treated as a misread reply
const MAX_TRAVELERS: f64 = 100.0;

const INDIAN_CITIES: [&str; 5] = ["mumbai", "delhi", "bangalore", "chennai", "kolkata"];

const KEYWORDS: [(ToolKind, &[&str]); 4] = [
    (
        ToolKind::Accommodation,
        &["hotel", "stay", "accommodation", "lodging", "resort"],
    ),
    (
        ToolKind::Itinerary,
        &["plan", "itinerary", "schedule", "activities", "sightseeing", "temple"],
    ),
    (
        ToolKind::Restaurant,
        &["food", "restaurant", "dining", "eat", "meal"],
    ),
    (
        ToolKind::Travel,
        &["transport", "flight", "train", "bus", "travel", "route"],
    ),
];

/// Asks the LLM for preferences, falling back to keyword matching when the
/// call fails or the reply has no usable JSON
#[instrument(skip(llm, query))]
pub async fn extract(llm: &dyn LlmProvider, query: &str, default_budget: f64) -> TripPreferences {
    let request = ChatRequest::new(
        prompts::PREFERENCE_EXTRACTION,
        format!("Extract travel preferences from this query: {query}"),
    )
    .temperature(0.1);

    match llm.complete(request).await {
        Ok(reply) => match parse_reply(&reply, default_budget) {
            Ok(preferences) => {
                debug!(?preferences, "Extracted preferences");
                preferences
            }
            Err(e) => {
                warn!("Could not parse extracted preferences, using keyword fallback: {e}");
                fallback(query, default_budget)
            }
        },
        Err(e) => {
            warn!("Preference extraction failed, using keyword fallback: {e}");
            fallback(query, default_budget)
        }
    }
}

/// Parses the first flat JSON object in the reply, or the whole reply if
/// there is none
pub fn parse_reply(reply: &str, default_budget: f64) -> Result<TripPreferences> {
    let candidate = FLAT_OBJECT
        .find(reply)
        .map_or(reply.trim(), |found| found.as_str());

    let value: Value = serde_json::from_str(candidate).map_err(|e| {
        TripMazerError::api(
            ErrorCode::ApiInvalidResponse,
            format!("Preference reply is not JSON: {e}"),
        )
    })?;

    if !value.is_object() {
        return Err(TripMazerError::api(
            ErrorCode::ApiInvalidResponse,
            "Preference reply is not a JSON object",
        ));
    }

    Ok(normalize(&value, default_budget))
}

fn number(value: Option<&Value>) -> Option<f64> {
    let parsed: Option<f64> = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.replace(',', "").trim().parse().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() && s.trim() != "null" => {
            s.trim().to_string()
        }
        _ => NOT_SPECIFIED.to_string(),
    }
}

/// Keeps known tools once each, then appends the missing ones in default order
pub fn normalize_routing(order: &[String]) -> Vec<ToolKind> {
    let mut routing: Vec<ToolKind> = Vec::with_capacity(DEFAULT_SEQUENCE.len());
    for tool in order.iter().filter_map(|name| name.parse::<ToolKind>().ok()) {
        if !routing.contains(&tool) {
            routing.push(tool);
        }
    }
    if routing.is_empty() {
        return DEFAULT_SEQUENCE.to_vec();
    }
    for tool in DEFAULT_SEQUENCE {
        if !routing.contains(&tool) {
            routing.push(tool);
        }
    }
    routing
}

fn normalize(value: &Value, default_budget: f64) -> TripPreferences {
    let budget = number(value.get("budget"))
        .filter(|b| *b > 0.0)
        .unwrap_or(default_budget);

    let currency = value
        .get("currency")
        .and_then(Value::as_str)
        .map(Currency::parse_lenient)
        .unwrap_or_default();

    let travelers = number(value.get("travelers"))
        .filter(|t| (1.0..=MAX_TRAVELERS).contains(t))
        .map_or(1, |t| t as u32);

    let order: Vec<String> = value
        .get("routing_order")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    TripPreferences {
        budget,
        currency,
        dates: text(value.get("dates")),
        from_location: text(value.get("from_location")),
        to_location: text(value.get("to_location")),
        travelers,
        routing_order: normalize_routing(&order),
    }
}

/// Keyword extraction used when the LLM is unavailable
pub fn fallback(query: &str, default_budget: f64) -> TripPreferences {
    let lower = query.to_lowercase();

    let currency = if query.contains('₹') || INDIAN_CITIES.iter().any(|c| lower.contains(c)) {
        Currency::Rupee
    } else {
        Currency::Dollar
    };

    let travelers = if lower.contains("couple") {
        2
    } else if lower.contains("family") {
        4
    } else {
        1
    };

    let mut scores: Vec<(ToolKind, usize)> = ToolKind::ALL
        .iter()
        .map(|tool| {
            let score = KEYWORDS
                .iter()
                .find(|(kind, _)| kind == tool)
                .map_or(0, |(_, words)| {
                    words.iter().filter(|word| lower.contains(*word)).count()
                });
            (*tool, score)
        })
        .collect();
    // stable sort keeps accommodation, itinerary, restaurant, travel on ties
    scores.sort_by(|a, b| b.1.cmp(&a.1));

    TripPreferences {
        budget: default_budget,
        currency,
        travelers,
        routing_order: scores.into_iter().map(|(tool, _)| tool).collect(),
        ..TripPreferences::default()
    }
}

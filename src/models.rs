//! Domain types shared by the planner, tools and HTTP surface

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::TripMazerError;

/// The four lookup tools the planner can route through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Accommodation,
    Itinerary,
    Restaurant,
    Travel,
}

/// Order used when nothing in the request suggests another priority
pub const DEFAULT_SEQUENCE: [ToolKind; 4] = [
    ToolKind::Itinerary,
    ToolKind::Travel,
    ToolKind::Accommodation,
    ToolKind::Restaurant,
];

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::Accommodation,
        ToolKind::Itinerary,
        ToolKind::Restaurant,
        ToolKind::Travel,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ToolKind::Accommodation => "accommodation",
            ToolKind::Itinerary => "itinerary",
            ToolKind::Restaurant => "restaurant",
            ToolKind::Travel => "travel",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolKind {
    type Err = TripMazerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accommodation" | "accommodations" | "hotel" | "hotels" => Ok(ToolKind::Accommodation),
            "itinerary" => Ok(ToolKind::Itinerary),
            "restaurant" | "restaurants" => Ok(ToolKind::Restaurant),
            "travel" | "transport" => Ok(ToolKind::Travel),
            other => Err(TripMazerError::validation(format!("Unknown tool '{other}'"))),
        }
    }
}

/// Currencies the planner recognises in free-form requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "₹", alias = "INR")]
    Rupee,
    #[default]
    #[serde(rename = "$", alias = "USD")]
    Dollar,
}

impl Currency {
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Rupee => "₹",
            Currency::Dollar => "$",
        }
    }

    /// ISO 4217 code used by SerpAPI
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Currency::Rupee => "INR",
            Currency::Dollar => "USD",
        }
    }

    /// SerpAPI market (`gl`) matching the currency
    #[must_use]
    pub fn country(self) -> &'static str {
        match self {
            Currency::Rupee => "in",
            Currency::Dollar => "us",
        }
    }

    /// Lenient parse; anything unrecognised is treated as dollars
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Currency {
    type Err = TripMazerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "₹" | "inr" | "rs" | "rs." | "rupee" | "rupees" => Ok(Currency::Rupee),
            "$" | "usd" | "dollar" | "dollars" => Ok(Currency::Dollar),
            other => Err(TripMazerError::validation(format!("Unknown currency '{other}'"))),
        }
    }
}

/// Structured preferences extracted from a free-form request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripPreferences {
    pub budget: f64,
    pub currency: Currency,
    pub dates: String,
    pub from_location: String,
    pub to_location: String,
    pub travelers: u32,
    pub routing_order: Vec<ToolKind>,
}

pub const NOT_SPECIFIED: &str = "Not specified";

impl Default for TripPreferences {
    fn default() -> Self {
        Self {
            budget: 10000.0,
            currency: Currency::Dollar,
            dates: NOT_SPECIFIED.to_string(),
            from_location: NOT_SPECIFIED.to_string(),
            to_location: NOT_SPECIFIED.to_string(),
            travelers: 1,
            routing_order: DEFAULT_SEQUENCE.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripType {
    OneWay,
    #[default]
    RoundTrip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Flight,
    Bus,
    Train,
}

impl TransportMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TransportMode::Flight => "flight",
            TransportMode::Bus => "bus",
            TransportMode::Train => "train",
        }
    }

    #[must_use]
    pub fn is_ground(self) -> bool {
        matches!(self, TransportMode::Bus | TransportMode::Train)
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_travelers() -> u32 {
    1
}

fn default_currency_code() -> String {
    "INR".to_string()
}

fn default_true() -> bool {
    true
}

/// Parameters for a structured transport search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelSearchParams {
    pub origin: String,
    pub destination: String,
    /// YYYY-MM-DD
    pub departure_date: String,
    #[serde(default)]
    pub return_date: Option<String>,
    #[serde(default = "default_travelers")]
    pub travelers: u32,
    #[serde(default)]
    pub budget_limit: Option<f64>,
    #[serde(default = "default_currency_code")]
    pub currency: String,
    pub transport_modes: Vec<TransportMode>,
    #[serde(default)]
    pub trip_type: TripType,
    #[serde(default = "default_true")]
    pub is_domestic: bool,
    #[serde(default)]
    pub origin_airport: Option<String>,
    #[serde(default)]
    pub destination_airport: Option<String>,
    #[serde(default = "default_true")]
    pub use_serp_for_flights: bool,
    #[serde(default = "default_true")]
    pub use_llm_for_ground: bool,
}

impl TravelSearchParams {
    /// Returns every problem found; an empty list means the params are usable
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.origin.trim().is_empty() {
            errors.push("Origin is required".to_string());
        }
        if self.destination.trim().is_empty() {
            errors.push("Destination is required".to_string());
        }
        if self.departure_date.trim().is_empty() {
            errors.push("Departure date is required".to_string());
        }
        if self.travelers == 0 {
            errors.push("Number of travelers must be positive".to_string());
        }
        if self.transport_modes.is_empty() {
            errors.push("At least one transport mode must be specified".to_string());
        }
        errors
    }

    #[must_use]
    pub fn wants_flights(&self) -> bool {
        self.transport_modes.contains(&TransportMode::Flight)
    }

    #[must_use]
    pub fn ground_modes(&self) -> Vec<TransportMode> {
        self.transport_modes
            .iter()
            .copied()
            .filter(|mode| mode.is_ground())
            .collect()
    }

    /// Return leg to search, if this is a round trip with a return date
    #[must_use]
    pub fn return_leg_date(&self) -> Option<&str> {
        match self.trip_type {
            TripType::RoundTrip => self.return_date.as_deref().filter(|d| !d.trim().is_empty()),
            TripType::OneWay => None,
        }
    }

    /// SerpAPI market for this route
    #[must_use]
    pub fn country_code(&self) -> &'static str {
        if self.is_domestic { "in" } else { "us" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn params() -> TravelSearchParams {
        TravelSearchParams {
            origin: "Mumbai".to_string(),
            destination: "Delhi".to_string(),
            departure_date: "2024-12-01".to_string(),
            return_date: Some("2024-12-05".to_string()),
            travelers: 2,
            budget_limit: Some(15000.0),
            currency: "INR".to_string(),
            transport_modes: vec![TransportMode::Flight, TransportMode::Train],
            trip_type: TripType::RoundTrip,
            is_domestic: true,
            origin_airport: None,
            destination_airport: None,
            use_serp_for_flights: true,
            use_llm_for_ground: true,
        }
    }

    #[rstest]
    #[case("accommodation", ToolKind::Accommodation)]
    #[case("Restaurants", ToolKind::Restaurant)]
    #[case(" itinerary ", ToolKind::Itinerary)]
    #[case("TRAVEL", ToolKind::Travel)]
    fn test_tool_kind_parse(#[case] raw: &str, #[case] expected: ToolKind) {
        assert_eq!(raw.parse::<ToolKind>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_tool_is_rejected() {
        assert!("weather".parse::<ToolKind>().is_err());
    }

    #[rstest]
    #[case("₹", Currency::Rupee)]
    #[case("INR", Currency::Rupee)]
    #[case("$", Currency::Dollar)]
    #[case("usd", Currency::Dollar)]
    #[case("EUR", Currency::Dollar)]
    fn test_currency_lenient_parse(#[case] raw: &str, #[case] expected: Currency) {
        assert_eq!(Currency::parse_lenient(raw), expected);
    }

    #[test]
    fn test_currency_serializes_as_symbol() {
        assert_eq!(serde_json::to_string(&Currency::Rupee).unwrap(), "\"₹\"");
        let parsed: Currency = serde_json::from_str("\"$\"").unwrap();
        assert_eq!(parsed, Currency::Dollar);
    }

    #[test]
    fn test_default_preferences() {
        let prefs = TripPreferences::default();
        assert_eq!(prefs.budget, 10000.0);
        assert_eq!(prefs.currency, Currency::Dollar);
        assert_eq!(prefs.dates, NOT_SPECIFIED);
        assert_eq!(prefs.travelers, 1);
        assert_eq!(prefs.routing_order, DEFAULT_SEQUENCE.to_vec());
    }

    #[test]
    fn test_valid_params_have_no_errors() {
        assert!(params().validate().is_empty());
    }

    #[test]
    fn test_invalid_params_collect_all_errors() {
        let mut p = params();
        p.origin.clear();
        p.travelers = 0;
        p.transport_modes.clear();
        let errors = p.validate();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("Origin")));
        assert!(errors.iter().any(|e| e.contains("travelers")));
        assert!(errors.iter().any(|e| e.contains("transport mode")));
    }

    #[test]
    fn test_ground_modes_and_return_leg() {
        let mut p = params();
        assert_eq!(p.ground_modes(), vec![TransportMode::Train]);
        assert_eq!(p.return_leg_date(), Some("2024-12-05"));
        p.trip_type = TripType::OneWay;
        assert_eq!(p.return_leg_date(), None);
    }

    #[test]
    fn test_params_deserialize_with_defaults() {
        let json = r#"{
            "origin": "Pune",
            "destination": "Goa",
            "departure_date": "2025-01-10",
            "transport_modes": ["bus"]
        }"#;
        let p: TravelSearchParams = serde_json::from_str(json).unwrap();
        assert_eq!(p.travelers, 1);
        assert_eq!(p.currency, "INR");
        assert_eq!(p.trip_type, TripType::RoundTrip);
        assert!(p.is_domestic);
        assert!(!p.wants_flights());
    }
}

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use super::prompts;
use crate::airport::AirportResolver;
use crate::error::TripMazerError;
use crate::models::{TransportMode, TravelSearchParams};
use crate::providers::serp::{FlightQuery, FlightSearchResults};
use crate::providers::{ChatRequest, LlmProvider, TravelDataProvider};
use crate::Result;

/// Route and transport-mode recommendations
#[derive(Clone)]
pub struct TravelOptimizer {
    llm: Arc<dyn LlmProvider>,
    travel_data: Option<Arc<dyn TravelDataProvider>>,
    airports: Option<AirportResolver>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AirportCodes {
    pub origin: String,
    pub destination: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlightOutcome {
    pub provider: &'static str,
    pub success: bool,
    pub outbound: Option<FlightSearchResults>,
    #[serde(rename = "return")]
    pub return_flights: Option<FlightSearchResults>,
    pub error: Option<String>,
    pub airport_codes_used: AirportCodes,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroundOutcome {
    pub provider: &'static str,
    pub transport_modes: Vec<TransportMode>,
    pub success: bool,
    pub raw_results: Option<String>,
    pub error: Option<String>,
    pub search_query: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flights: Option<FlightOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ground_transport: Option<GroundOutcome>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchSummary {
    pub providers_used: Vec<&'static str>,
    pub transport_modes_searched: Vec<TransportMode>,
    /// True when every provider that was queried answered
    pub search_success: bool,
}

/// Per-provider outcome of a structured transport search
#[derive(Debug, Clone, Serialize)]
pub struct TravelSearchReport {
    pub search_params: TravelSearchParams,
    pub results: SearchResults,
    pub summary: SearchSummary,
}

impl TravelSearchReport {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TripMazerError::general(format!("Failed to serialize travel report: {e}")))
    }
}

impl TravelOptimizer {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        travel_data: Option<Arc<dyn TravelDataProvider>>,
        airports: Option<AirportResolver>,
    ) -> Self {
        Self {
            llm,
            travel_data,
            airports,
        }
    }

    /// Transport recommendations from a free-form request
    #[instrument(skip(self))]
    pub async fn optimize(&self, query: &str) -> Result<String> {
        self.llm
            .complete(ChatRequest::new(prompts::TRAVEL, query).temperature(0.1))
            .await
    }

    /// Structured search: live flights plus LLM research for buses and trains.
    /// Invalid params are an error; provider failures are recorded in the report.
    #[instrument(skip(self, params), fields(origin = %params.origin, destination = %params.destination))]
    pub async fn search(&self, params: &TravelSearchParams) -> Result<TravelSearchReport> {
        let errors = params.validate();
        if !errors.is_empty() {
            return Err(TripMazerError::validation(format!(
                "Invalid parameters: {}",
                errors.join(", ")
            )));
        }

        let mut results = SearchResults::default();
        let mut summary = SearchSummary {
            search_success: true,
            ..SearchSummary::default()
        };

        if params.wants_flights() && params.use_serp_for_flights {
            info!("Searching flights");
            let outcome = self.search_flights(params).await;
            if let Some(error) = &outcome.error {
                warn!("Flight search failed: {error}");
                summary.search_success = false;
            }
            summary.providers_used.push(outcome.provider);
            summary.transport_modes_searched.push(TransportMode::Flight);
            results.flights = Some(outcome);
        }

        let ground_modes = params.ground_modes();
        if !ground_modes.is_empty() && params.use_llm_for_ground {
            info!("Searching ground transport: {ground_modes:?}");
            let outcome = self.search_ground(params, ground_modes.clone()).await;
            if let Some(error) = &outcome.error {
                warn!("Ground transport search failed: {error}");
                summary.search_success = false;
            }
            summary.providers_used.push(outcome.provider);
            summary.transport_modes_searched.extend(ground_modes);
            results.ground_transport = Some(outcome);
        }

        Ok(TravelSearchReport {
            search_params: params.clone(),
            results,
            summary,
        })
    }

    async fn airport_code(&self, explicit: Option<&String>, city: &str) -> String {
        if let Some(code) = explicit.filter(|c| !c.trim().is_empty()) {
            return code.trim().to_string();
        }
        match &self.airports {
            Some(resolver) => resolver.resolve(city).await,
            None => city.to_string(),
        }
    }

    async fn search_flights(&self, params: &TravelSearchParams) -> FlightOutcome {
        let origin = self.airport_code(params.origin_airport.as_ref(), &params.origin).await;
        let destination = self
            .airport_code(params.destination_airport.as_ref(), &params.destination)
            .await;

        let mut outcome = FlightOutcome {
            provider: "serp_api",
            success: false,
            outbound: None,
            return_flights: None,
            error: None,
            airport_codes_used: AirportCodes {
                origin: origin.clone(),
                destination: destination.clone(),
            },
        };

        let Some(provider) = &self.travel_data else {
            outcome.error = Some("Live flight search is not configured".to_string());
            return outcome;
        };

        let leg = |from: &str, to: &str, date: &str| FlightQuery {
            departure_id: from.to_string(),
            arrival_id: to.to_string(),
            outbound_date: date.to_string(),
            country_code: params.country_code().to_string(),
            currency: params.currency.clone(),
            adults: Some(params.travelers),
            ..FlightQuery::default()
        };

        match provider
            .search_flights(&leg(&origin, &destination, &params.departure_date))
            .await
        {
            Ok(found) => outcome.outbound = Some(found),
            Err(e) => {
                outcome.error = Some(e.to_string());
                return outcome;
            }
        }

        if let Some(return_date) = params.return_leg_date() {
            match provider.search_flights(&leg(&destination, &origin, return_date)).await {
                Ok(found) => outcome.return_flights = Some(found),
                Err(e) => {
                    outcome.error = Some(e.to_string());
                    return outcome;
                }
            }
        }

        outcome.success = true;
        outcome
    }

    async fn search_ground(&self, params: &TravelSearchParams, modes: Vec<TransportMode>) -> GroundOutcome {
        let labels = modes.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(" and ");
        let query = prompts::ground_transport_query(params, &labels);
        let request = ChatRequest::new(prompts::ground_transport(params, &labels), query.clone()).temperature(0.1);

        let (raw_results, error) = match self.llm.complete(request).await {
            Ok(text) => (Some(text), None),
            Err(e) => (None, Some(e.to_string())),
        };

        GroundOutcome {
            provider: "perplexity",
            transport_modes: modes,
            success: error.is_none(),
            raw_results,
            error,
            search_query: query,
        }
    }
}

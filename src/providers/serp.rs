//! SerpAPI client for Google Hotels and Google Flights

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Url;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

use super::{build_http_client, check_status, decode_json, log_timing, require_key, transport_error};
use crate::config::SerpConfig;
use crate::error::{ErrorCode, TripMazerError};
use crate::Result;

const PROVIDER: &str = "SerpAPI";

/// Structured hotel and flight search
#[async_trait]
pub trait TravelDataProvider: Send + Sync {
    async fn search_hotels(&self, query: &HotelQuery) -> Result<HotelSearchResults>;
    async fn search_flights(&self, query: &FlightQuery) -> Result<FlightSearchResults>;
}

/// Google Hotels search parameters
#[derive(Debug, Clone, Default)]
pub struct HotelQuery {
    /// City name or a free-form query such as "budget hotels in Goa"
    pub query: String,
    pub check_in_date: String,
    pub check_out_date: String,
    pub currency: String,
    pub country_code: String,
    /// Defaults to 2 adults when unset
    pub adults: Option<u32>,
    pub children: Option<u32>,
    pub min_price: Option<u32>,
    pub max_price: Option<u32>,
    pub rating: Option<String>,
    pub hotel_class: Option<String>,
    pub amenities: Option<String>,
    pub free_cancellation: Option<bool>,
}

/// Google Flights search parameters for a single leg
#[derive(Debug, Clone, Default)]
pub struct FlightQuery {
    pub departure_id: String,
    pub arrival_id: String,
    pub outbound_date: String,
    pub country_code: String,
    pub currency: String,
    pub return_date: Option<String>,
    /// 1 round trip, 2 one way (default), 3 multi-city
    pub flight_type: Option<u8>,
    pub adults: Option<u32>,
    /// 1 economy, 2 premium economy, 3 business, 4 first
    pub travel_class: Option<u8>,
    pub stops: Option<u8>,
    pub max_price: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HotelSearchResults {
    #[serde(default)]
    pub properties: Vec<HotelProperty>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HotelProperty {
    pub name: Option<String>,
    pub overall_rating: Option<f64>,
    pub reviews: Option<u64>,
    pub total_rate: Option<Rate>,
    pub rate_per_night: Option<Rate>,
    /// Either a label ("4-star hotel") or a bare number depending on the listing
    pub hotel_class: Option<Value>,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rate {
    pub lowest: Option<String>,
    pub extracted_lowest: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlightSearchResults {
    #[serde(default)]
    pub best_flights: Vec<FlightOption>,
    #[serde(default)]
    pub other_flights: Vec<FlightOption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flights: Vec<FlightOption>,
}

impl FlightSearchResults {
    /// The first non-empty result group, in SerpAPI's preference order
    #[must_use]
    pub fn options(&self) -> &[FlightOption] {
        [&self.best_flights, &self.other_flights, &self.flights]
            .into_iter()
            .find(|group| !group.is_empty())
            .map(|group| group.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlightOption {
    #[serde(default)]
    pub flights: Vec<FlightLeg>,
    pub total_duration: Option<u32>,
    pub price: Option<f64>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlightLeg {
    pub airline: Option<String>,
    pub flight_number: Option<String>,
    pub departure_airport: Option<AirportTime>,
    pub arrival_airport: Option<AirportTime>,
    pub duration: Option<u32>,
    pub travel_class: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AirportTime {
    pub id: Option<String>,
    pub name: Option<String>,
    pub time: Option<String>,
}

/// SerpAPI reports some failures as a 200 with an `error` field
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    error: Option<String>,
    #[serde(flatten)]
    body: T,
}

pub struct SerpApiClient {
    client: ClientWithMiddleware,
    api_key: String,
    base_url: String,
}

impl SerpApiClient {
    pub fn new(config: &SerpConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config.timeout_seconds, config.max_retries)?,
            api_key: require_key(config.api_key.as_ref(), PROVIDER, "SERP_API_KEY")?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self, engine: &str, params: Vec<(&'static str, String)>) -> Result<Url> {
        let mut all = vec![("engine", engine.to_string()), ("api_key", self.api_key.clone())];
        all.extend(params);
        Url::parse_with_params(&format!("{}/search.json", self.base_url), &all)
            .map_err(|e| TripMazerError::config(format!("Invalid SerpAPI base URL: {e}")))
    }

    async fn fetch<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        let started = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;
        log_timing(PROVIDER, started);

        let response = check_status(PROVIDER, response).await?;
        let envelope: Envelope<T> = decode_json(PROVIDER, response).await?;
        match envelope.error {
            Some(error) => Err(TripMazerError::api(
                ErrorCode::ApiInvalidResponse,
                format!("SerpAPI error: {error}"),
            )),
            None => Ok(envelope.body),
        }
    }
}

pub(crate) fn hotel_params(query: &HotelQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("q", query.query.clone()),
        ("check_in_date", query.check_in_date.clone()),
        ("check_out_date", query.check_out_date.clone()),
        ("currency", query.currency.clone()),
        ("gl", query.country_code.clone()),
        ("hl", "en".to_string()),
        ("adults", query.adults.unwrap_or(2).to_string()),
        ("no_cache", "true".to_string()),
    ];
    if let Some(children) = query.children.filter(|c| *c > 0) {
        params.push(("children", children.to_string()));
    }
    if let Some(min_price) = query.min_price {
        params.push(("min_price", min_price.to_string()));
    }
    if let Some(max_price) = query.max_price {
        params.push(("max_price", max_price.to_string()));
    }
    if let Some(rating) = &query.rating {
        params.push(("rating", rating.clone()));
    }
    if let Some(hotel_class) = &query.hotel_class {
        params.push(("hotel_class", hotel_class.clone()));
    }
    if let Some(amenities) = &query.amenities {
        params.push(("amenities", amenities.clone()));
    }
    if let Some(free_cancellation) = query.free_cancellation {
        params.push(("free_cancellation", free_cancellation.to_string()));
    }
    params
}

pub(crate) fn flight_params(query: &FlightQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("departure_id", query.departure_id.clone()),
        ("arrival_id", query.arrival_id.clone()),
        ("outbound_date", query.outbound_date.clone()),
        ("type", query.flight_type.unwrap_or(2).to_string()),
        ("hl", "en".to_string()),
        ("gl", query.country_code.clone()),
        ("currency", query.currency.clone()),
        ("sort_by", "2".to_string()),
    ];
    if let Some(return_date) = &query.return_date {
        params.push(("return_date", return_date.clone()));
    }
    if let Some(adults) = query.adults {
        params.push(("adults", adults.to_string()));
    }
    if let Some(travel_class) = query.travel_class {
        params.push(("travel_class", travel_class.to_string()));
    }
    if let Some(stops) = query.stops {
        params.push(("stops", stops.to_string()));
    }
    if let Some(max_price) = query.max_price {
        params.push(("max_price", max_price.to_string()));
    }
    params
}

#[async_trait]
impl TravelDataProvider for SerpApiClient {
    #[instrument(skip(self, query), fields(q = %query.query))]
    async fn search_hotels(&self, query: &HotelQuery) -> Result<HotelSearchResults> {
        let url = self.search_url("google_hotels", hotel_params(query))?;
        let results: HotelSearchResults = self.fetch(url).await?;
        info!("SerpAPI returned {} hotel properties", results.properties.len());
        Ok(results)
    }

    #[instrument(skip(self, query), fields(route = %format!("{}->{}", query.departure_id, query.arrival_id)))]
    async fn search_flights(&self, query: &FlightQuery) -> Result<FlightSearchResults> {
        let url = self.search_url("google_flights", flight_params(query))?;
        let results: FlightSearchResults = self.fetch(url).await?;
        info!("SerpAPI returned {} flight options", results.options().len());
        Ok(results)
    }
}

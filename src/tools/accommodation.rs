use std::fmt::Write as _;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{instrument, warn};

use super::prompts;
use crate::models::Currency;
use crate::providers::serp::{HotelProperty, HotelQuery};
use crate::providers::{ChatRequest, LlmProvider, TravelDataProvider};
use crate::Result;

const TOP_HOTELS: usize = 5;

/// Live hotel lookup appended below the LLM recommendations
#[derive(Debug, Clone, Deserialize)]
pub struct HotelSearch {
    pub location: String,
    /// YYYY-MM-DD
    pub check_in_date: String,
    /// YYYY-MM-DD
    pub check_out_date: String,
    #[serde(default = "default_adults")]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default = "default_currency")]
    pub currency: Currency,
}

fn default_adults() -> u32 {
    2
}

fn default_currency() -> Currency {
    Currency::Rupee
}

#[derive(Clone)]
pub struct AccommodationPlanner {
    llm: Arc<dyn LlmProvider>,
    travel_data: Option<Arc<dyn TravelDataProvider>>,
}

impl AccommodationPlanner {
    pub fn new(llm: Arc<dyn LlmProvider>, travel_data: Option<Arc<dyn TravelDataProvider>>) -> Self {
        Self { llm, travel_data }
    }

    /// LLM recommendations, followed by a Google Hotels table when `hotels` is given
    #[instrument(skip(self, hotels))]
    pub async fn search(&self, query: &str, hotels: Option<&HotelSearch>) -> Result<String> {
        let mut result = self
            .llm
            .complete(ChatRequest::new(prompts::ACCOMMODATION, query))
            .await?;

        if let Some(search) = hotels {
            result.push_str(&self.hotel_section(search).await);
        }
        Ok(result)
    }

    async fn hotel_section(&self, search: &HotelSearch) -> String {
        let Some(provider) = &self.travel_data else {
            return hotel_notice("Live hotel search is not configured.");
        };

        let query = HotelQuery {
            query: search.location.clone(),
            check_in_date: search.check_in_date.clone(),
            check_out_date: search.check_out_date.clone(),
            currency: search.currency.code().to_string(),
            country_code: search.currency.country().to_string(),
            adults: Some(search.adults),
            children: Some(search.children),
            ..HotelQuery::default()
        };

        match provider.search_hotels(&query).await {
            Ok(results) if results.properties.is_empty() => hotel_notice("No hotels found."),
            Ok(results) => format_hotel_table(&results.properties, search),
            Err(e) => {
                warn!("Hotel search failed: {e}");
                hotel_notice(&format!("**Error:** {e}"))
            }
        }
    }
}

fn hotel_notice(body: &str) -> String {
    format!("\n\n---\n\n## Live Hotel Search Results\n\n{body}")
}

fn hotel_class_label(class: Option<&Value>) -> String {
    match class {
        Some(Value::String(label)) if !label.is_empty() => label.clone(),
        Some(Value::Number(stars)) => format!("{stars}⭐"),
        _ => "N/A".to_string(),
    }
}

fn price_label(property: &HotelProperty, symbol: &str) -> String {
    let rate = property.rate_per_night.as_ref().or(property.total_rate.as_ref());
    match rate {
        Some(rate) => match (rate.extracted_lowest, &rate.lowest) {
            (Some(amount), _) => format!("{symbol}{amount:.0}"),
            (None, Some(label)) => label.clone(),
            (None, None) => "N/A".to_string(),
        },
        None => "N/A".to_string(),
    }
}

/// Markdown table of the top properties
pub(crate) fn format_hotel_table(properties: &[HotelProperty], search: &HotelSearch) -> String {
    let symbol = search.currency.symbol();
    let mut out = String::from("\n\n---\n\n## Top 5 Live Hotel Recommendations\n\n");

    let _ = write!(
        out,
        "**Search Parameters:** {} | Check-in: {} | Check-out: {} | Guests: {} adults",
        search.location, search.check_in_date, search.check_out_date, search.adults
    );
    if search.children > 0 {
        let _ = write!(out, ", {} children", search.children);
    }
    out.push_str("\n\n");

    out.push_str("| # | Hotel Name | Rating | Price/Night | Hotel Class | Key Amenities | Booking Link |\n");
    out.push_str("|---|------------|--------|-------------|-------------|---------------|--------------|\n");

    for (i, property) in properties.iter().take(TOP_HOTELS).enumerate() {
        let name = property.name.as_deref().unwrap_or("N/A");
        let rating = property.overall_rating.map_or_else(
            || "N/A".to_string(),
            |r| format!("{r} ({} reviews)", property.reviews.unwrap_or(0)),
        );
        let amenities = if property.amenities.is_empty() {
            "N/A".to_string()
        } else {
            property.amenities.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
        };
        let link = property.link.as_deref().unwrap_or("#");

        let _ = writeln!(
            out,
            "| {} | {name} | {rating} | {} | {} | {amenities} | [View Details]({link}) |",
            i + 1,
            price_label(property, symbol),
            hotel_class_label(property.hotel_class.as_ref()),
        );
    }

    out.push_str("\n*Prices are per night for the whole property. Data from Google Hotels via SerpAPI.*\n");
    out
}

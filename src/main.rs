use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};

use tripmazer::api::AppState;
use tripmazer::models::{TransportMode, TripType};
use tripmazer::tools::{HotelSearch, RestaurantQuery, Toolset, restaurants::DEFAULT_DIETARY, tool_catalog};
use tripmazer::telemetry::init_telemetry;
use tripmazer::{
    AirportResolver, Currency, ProviderSet, TravelSearchParams, TripMazerConfig, TripMazerError,
    TripOptimizationAgent, web,
};

/// Budget-aware AI trip planner
#[derive(Parser, Debug)]
#[command(name = "tripmazer", version, about)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print machine-readable JSON instead of markdown
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plan a complete trip from a free-form request
    Plan { query: String },

    /// Accommodation recommendations, optionally with live Google Hotels results
    Accommodation {
        query: String,
        /// Location for the live hotel search
        #[arg(long, requires_all = ["check_in", "check_out"])]
        location: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        check_in: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        check_out: Option<String>,
        #[arg(long, default_value_t = 2)]
        adults: u32,
        #[arg(long, default_value_t = 0)]
        children: u32,
        #[arg(long, default_value = "INR")]
        currency: String,
    },

    /// Day-by-day itinerary
    Itinerary { query: String },

    /// Restaurant suggestions for an itinerary or a location
    Restaurants {
        #[arg(long)]
        location: Option<String>,
        /// Itinerary text to anchor suggestions to
        #[arg(long)]
        itinerary: Option<String>,
        #[arg(long)]
        dates: Option<String>,
        #[arg(long, default_value = DEFAULT_DIETARY)]
        dietary: String,
        #[arg(long)]
        budget: Option<String>,
        #[arg(long, default_value_t = 2)]
        travelers: u32,
    },

    /// Transport options, from a free-form query or a structured search
    Travel {
        /// Free-form request; omit to run a structured search
        query: Option<String>,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        /// Departure date, YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
        /// Return date, YYYY-MM-DD
        #[arg(long)]
        return_date: Option<String>,
        #[arg(long, default_value_t = 1)]
        travelers: u32,
        /// Comma-separated: flight, bus, train
        #[arg(long, value_delimiter = ',', default_value = "flight")]
        modes: Vec<String>,
        #[arg(long)]
        budget: Option<f64>,
        #[arg(long, default_value = "INR")]
        currency: String,
        #[arg(long)]
        one_way: bool,
        #[arg(long)]
        international: bool,
    },

    /// Resolve a city to its IATA airport code
    Airport { city: String },

    /// Validate configuration and provider connectivity
    Check,

    /// Run the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },

    /// List the available tools
    Tools,
}

fn parse_mode(raw: &str) -> Result<TransportMode> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "flight" | "flights" => Ok(TransportMode::Flight),
        "bus" => Ok(TransportMode::Bus),
        "train" => Ok(TransportMode::Train),
        other => bail!("Unknown transport mode '{other}' (expected flight, bus or train)"),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_result(tool: &str, result: &str, json: bool) -> Result<()> {
    if json {
        print_json(&serde_json::json!({ "tool": tool, "result": result }))
    } else {
        println!("{result}");
        Ok(())
    }
}

struct App {
    providers: ProviderSet,
    tools: Toolset,
}

impl App {
    fn new(config: &TripMazerConfig) -> Result<Self> {
        let providers = ProviderSet::from_config(config)?;
        let airports = providers.gemini.clone().map(AirportResolver::new);
        let tools = Toolset::new(
            providers.llm.clone(),
            providers.travel_data.clone(),
            airports,
        );
        Ok(Self { providers, tools })
    }

    fn agent(&self, config: &TripMazerConfig) -> TripOptimizationAgent {
        TripOptimizationAgent::new(
            self.tools.clone(),
            self.providers.llm.clone(),
            config.planner.clone(),
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = TripMazerConfig::load_from_path(cli.config.clone())?;
    let telemetry = init_telemetry(&config.logging, cli.verbose)?;

    if let Err(e) = run(cli, &mut config).await {
        let Some(message) = user_message(&e) else {
            return Err(e);
        };
        error!("{e:#}");
        eprintln!("Error: {message}");
        drop(telemetry);
        std::process::exit(1);
    }
    drop(telemetry);
    Ok(())
}

/// Friendly text for failures that come from the library
fn user_message(err: &anyhow::Error) -> Option<String> {
    err.downcast_ref::<TripMazerError>()
        .map(TripMazerError::user_message)
}

async fn run(cli: Cli, config: &mut TripMazerConfig) -> Result<()> {
    let json = cli.json;

    match cli.command {
        Command::Tools => {
            if json {
                print_json(&tool_catalog())?;
            } else {
                for tool in tool_catalog() {
                    println!("{:<24} {}", tool.name, tool.description);
                    println!("{:<24} endpoint: {}", "", tool.endpoint);
                    println!("{:<24} example:  {}", "", tool.example);
                }
            }
        }

        Command::Check => {
            TripMazerConfig::ensure_config_dir()?;
            let app = App::new(config)?;
            app.providers
                .perplexity
                .check_connection()
                .await
                .context("Perplexity connection check failed")?;
            println!("Perplexity: ok");
            println!(
                "Gemini:     {}",
                if app.providers.gemini.is_some() { "configured" } else { "not configured" }
            );
            println!(
                "SerpAPI:    {}",
                if app.providers.travel_data.is_some() { "configured" } else { "not configured" }
            );
        }

        Command::Plan { query } => {
            let app = App::new(config)?;
            let plan = app.agent(config).plan_trip(&query).await;
            if json {
                print_json(&plan)?;
            } else {
                println!("{}", plan.combined_result);
            }
        }

        Command::Accommodation {
            query,
            location,
            check_in,
            check_out,
            adults,
            children,
            currency,
        } => {
            let app = App::new(config)?;
            let hotel_search = match (location, check_in, check_out) {
                (Some(location), Some(check_in_date), Some(check_out_date)) => Some(HotelSearch {
                    location,
                    check_in_date,
                    check_out_date,
                    adults,
                    children,
                    currency: Currency::parse_lenient(&currency),
                }),
                _ => None,
            };
            let result = app
                .tools
                .accommodation
                .search(&query, hotel_search.as_ref())
                .await?;
            print_result("accommodation", &result, json)?;
        }

        Command::Itinerary { query } => {
            let app = App::new(config)?;
            let result = app.tools.itinerary.plan(&query).await?;
            print_result("itinerary", &result, json)?;
        }

        Command::Restaurants {
            location,
            itinerary,
            dates,
            dietary,
            budget,
            travelers,
        } => {
            if location.is_none() && itinerary.is_none() {
                bail!("Provide --location or --itinerary");
            }
            let app = App::new(config)?;
            let query = RestaurantQuery {
                location: location.unwrap_or_default(),
                dates: dates.unwrap_or_default(),
                dietary_preferences: dietary,
                budget_hint: budget.unwrap_or_default(),
                travelers,
                itinerary_details: itinerary.unwrap_or_default(),
            };
            let result = app.tools.restaurants.search(&query).await?;
            print_result("restaurants", &result, json)?;
        }

        Command::Travel {
            query,
            from,
            to,
            date,
            return_date,
            travelers,
            modes,
            budget,
            currency,
            one_way,
            international,
        } => {
            let app = App::new(config)?;
            if let Some(query) = query {
                let result = app.tools.travel.optimize(&query).await?;
                return print_result("travel", &result, json);
            }

            let (Some(origin), Some(destination), Some(departure_date)) = (from, to, date) else {
                bail!("Provide a query, or --from, --to and --date for a structured search");
            };
            let params = TravelSearchParams {
                origin,
                destination,
                departure_date,
                return_date,
                travelers,
                budget_limit: budget,
                currency,
                transport_modes: modes
                    .iter()
                    .map(String::as_str)
                    .map(parse_mode)
                    .collect::<Result<Vec<_>>>()?,
                trip_type: if one_way { TripType::OneWay } else { TripType::RoundTrip },
                is_domestic: !international,
                origin_airport: None,
                destination_airport: None,
                use_serp_for_flights: true,
                use_llm_for_ground: true,
            };
            let report = app.tools.travel.search(&params).await?;
            println!("{}", report.to_json()?);
        }

        Command::Airport { city } => {
            let app = App::new(config)?;
            let Some(gemini) = app.providers.gemini.clone() else {
                bail!("Airport lookup needs a Gemini API key. Set GEMINI_API_KEY.");
            };
            let code = AirportResolver::new(gemini).resolve(&city).await;
            if json {
                print_json(&serde_json::json!({ "city": city, "code": code }))?;
            } else {
                println!("{code}");
            }
        }

        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let app = App::new(config)?;
            let state = AppState::new(app.agent(config), config.clone());
            info!(
                "Starting TripMazer {} ({})",
                tripmazer::VERSION,
                config.server.environment
            );
            web::run(state, &config.server).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("Train").unwrap(), TransportMode::Train);
        assert!(parse_mode("ferry").is_err());
    }

    #[test]
    fn test_user_message_for_library_errors() {
        let err = anyhow::Error::from(TripMazerError::config("PERPLEXITY_API_KEY missing"));
        assert!(user_message(&err).unwrap().contains("Configuration error"));

        let wrapped = Err::<(), _>(TripMazerError::api(
            tripmazer::ErrorCode::ApiUnauthorized,
            "401",
        ))
        .context("Perplexity connection check failed")
        .unwrap_err();
        assert!(user_message(&wrapped).unwrap().contains("API key"));

        assert_eq!(user_message(&anyhow::anyhow!("Provide --location or --itinerary")), None);
    }

    #[test]
    fn test_travel_modes_split_on_commas() {
        let cli = Cli::parse_from(["tripmazer", "travel", "--from", "Pune", "--modes", "bus,train"]);
        match cli.command {
            Command::Travel { modes, .. } => assert_eq!(modes, vec!["bus", "train"]),
            other => panic!("unexpected command {other:?}"),
        }
    }
}

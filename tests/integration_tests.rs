//! End-to-end tests against mocked Perplexity and SerpAPI servers

use std::process::Command;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tripmazer::api::{self, AppState};
use tripmazer::models::{Currency, ToolKind, TransportMode, TravelSearchParams, TripType};
use tripmazer::tools::{HotelSearch, Toolset};
use tripmazer::{ProviderSet, TripMazerConfig, TripOptimizationAgent, web};

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    }))
}

fn config_for(perplexity: &MockServer, serp: Option<&MockServer>) -> TripMazerConfig {
    let mut config = TripMazerConfig::default();
    config.perplexity.api_key = Some("pplx-integration-key".to_string());
    config.perplexity.base_url = perplexity.uri();
    config.perplexity.max_retries = 0;
    config.cache.enabled = false;
    if let Some(serp) = serp {
        config.serp.api_key = Some("serp-integration-key".to_string());
        config.serp.base_url = serp.uri();
        config.serp.max_retries = 0;
    }
    config
}

fn agent_for(config: &TripMazerConfig) -> TripOptimizationAgent {
    let providers = ProviderSet::from_config(config).unwrap();
    let tools = Toolset::new(providers.llm.clone(), providers.travel_data.clone(), None);
    TripOptimizationAgent::new(tools, providers.llm, config.planner.clone())
}

/// Answers each tool's prompt with a recognisable line
async fn scripted_perplexity() -> MockServer {
    let server = MockServer::start().await;

    let scripted = [
        (
            "Extract travel preferences from this query",
            r#"{"budget": 50000, "currency": "₹", "dates": "10-01-2025 to 14-01-2025", "from_location": "Mumbai", "to_location": "Goa", "travelers": 2, "routing_order": ["accommodation", "itinerary", "travel", "restaurant"]}"#,
        ),
        ("You are an accommodation specialist", "Stay at Casa Baga, ₹4500 per night"),
        ("You are an itinerary planner", "Day 1: Fort Aguada at sunset"),
        ("You are a transport planner", "Overnight Volvo bus from Mumbai"),
        ("You are a restaurant consultant", "Dinner at Gunpowder, Assagao"),
    ];

    for (needle, reply) in scripted {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains(needle))
            .respond_with(completion(reply))
            .with_priority(1)
            .mount(&server)
            .await;
    }

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(completion("Generic answer"))
        .mount(&server)
        .await;

    server
}

#[tokio::test]
async fn test_plan_trip_end_to_end() {
    let perplexity = scripted_perplexity().await;
    let config = config_for(&perplexity, None);

    let plan = agent_for(&config)
        .plan_trip("Couple trip from Mumbai to Goa with ₹50000, want a nice hotel")
        .await;

    let state = &plan.state;
    assert_eq!(state.total_budget, 50000.0);
    assert_eq!(state.currency, Currency::Rupee);
    assert_eq!(state.tool_sequence[0], ToolKind::Accommodation);
    assert_eq!(state.completed_tools.len(), 4);
    assert!(state.errors.is_empty());

    // accommodation leads, so it receives the 10% bonus: 45% of 50000
    assert!((state.allocated_for(ToolKind::Accommodation) - 22500.0).abs() < 1e-6);

    let report = &plan.combined_result;
    assert!(report.contains("- **Destination:** Mumbai → Goa"));
    assert!(report.contains("Stay at Casa Baga"));
    assert!(report.contains("Day 1: Fort Aguada at sunset"));
    assert!(report.contains("Overnight Volvo bus from Mumbai"));
    assert!(report.contains("Dinner at Gunpowder, Assagao"));
    assert!(report.contains("- **Execution Order:** accommodation → itinerary → travel → restaurant"));

    assert_eq!(plan.execution_summary["total_budget"], 50000.0);
    assert_eq!(plan.execution_summary["completed_tools"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_plan_trip_survives_provider_failure() {
    let perplexity = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .mount(&perplexity)
        .await;

    let config = config_for(&perplexity, None);
    let plan = agent_for(&config)
        .plan_trip("Family trip to Delhi, looking for food and restaurants")
        .await;

    let state = &plan.state;
    assert_eq!(state.currency, Currency::Rupee);
    assert_eq!(state.travelers, 4);
    assert_eq!(state.tool_sequence[0], ToolKind::Restaurant);
    assert_eq!(state.completed_tools.len(), 4);
    assert!(!state.errors.is_empty());
    assert!(state.errors.iter().all(|e| e.contains("Error executing")));
    assert!(plan.combined_result.contains("## 💰 Budget Summary"));
}

#[tokio::test]
async fn test_accommodation_with_live_hotels() {
    let perplexity = scripted_perplexity().await;
    let serp = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "google_hotels"))
        .and(query_param("q", "Goa"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "properties": [
                {
                    "name": "Taj Fort Aguada",
                    "overall_rating": 4.6,
                    "reviews": 2100,
                    "rate_per_night": { "lowest": "₹18,500", "extracted_lowest": 18500.0 },
                    "hotel_class": "5-star hotel",
                    "amenities": ["Pool", "Spa", "Beach access", "Free Wi-Fi"],
                    "link": "https://example.com/taj"
                }
            ]
        })))
        .mount(&serp)
        .await;

    let config = config_for(&perplexity, Some(&serp));
    let agent = agent_for(&config);
    let search = HotelSearch {
        location: "Goa".to_string(),
        check_in_date: "2025-01-10".to_string(),
        check_out_date: "2025-01-14".to_string(),
        adults: 2,
        children: 0,
        currency: Currency::Rupee,
    };

    let result = agent
        .tools()
        .accommodation
        .search("Hotels in Goa", Some(&search))
        .await
        .unwrap();

    assert!(result.starts_with("Stay at Casa Baga"));
    assert!(result.contains("| # | Hotel Name | Rating | Price/Night | Hotel Class | Key Amenities | Booking Link |"));
    assert!(result.contains("Taj Fort Aguada"));
    assert!(result.contains("₹18500"));
    assert!(result.contains("Pool, Spa, Beach access"));
    assert!(!result.contains("Free Wi-Fi"));
}

#[tokio::test]
async fn test_structured_travel_search() {
    let perplexity = scripted_perplexity().await;
    let serp = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "google_flights"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "best_flights": [
                { "flights": [{ "airline": "IndiGo", "flight_number": "6E 341" }], "total_duration": 75, "price": 4200 }
            ]
        })))
        .expect(2)
        .mount(&serp)
        .await;

    let config = config_for(&perplexity, Some(&serp));
    let agent = agent_for(&config);
    let params = TravelSearchParams {
        origin: "Mumbai".to_string(),
        destination: "Goa".to_string(),
        departure_date: "2025-01-10".to_string(),
        return_date: Some("2025-01-14".to_string()),
        travelers: 2,
        budget_limit: Some(15000.0),
        currency: "INR".to_string(),
        transport_modes: vec![TransportMode::Flight, TransportMode::Bus],
        trip_type: TripType::RoundTrip,
        is_domestic: true,
        origin_airport: Some("BOM".to_string()),
        destination_airport: Some("GOI".to_string()),
        use_serp_for_flights: true,
        use_llm_for_ground: true,
    };

    let report = agent.tools().travel.search(&params).await.unwrap();
    let value: Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

    assert_eq!(value["summary"]["search_success"], true);
    assert_eq!(value["summary"]["providers_used"], json!(["serp_api", "perplexity"]));
    assert_eq!(value["summary"]["transport_modes_searched"], json!(["flight", "bus"]));
    assert_eq!(value["results"]["flights"]["airport_codes_used"]["origin"], "BOM");
    assert_eq!(value["results"]["flights"]["outbound"]["best_flights"][0]["price"], 4200.0);
    assert!(value["results"]["flights"]["return"].is_object());
    assert_eq!(value["results"]["ground_transport"]["raw_results"], "Generic answer");
}

async fn call(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn test_app() -> (MockServer, axum::Router) {
    let perplexity = scripted_perplexity().await;
    let config = config_for(&perplexity, None);
    let agent = agent_for(&config);
    let app = api::router(AppState::new(agent, config));
    (perplexity, app)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (_server, app) = test_app().await;
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = call(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["environment"], "development");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_planner_endpoint_rejects_short_query() {
    let (_server, app) = test_app().await;
    let (status, body) = call(app, post("/optimized_trip_planner", r#"{"query": "Goa"}"#)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("at least 5 characters"));
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_planner_endpoint_rejects_malformed_body() {
    let (_server, app) = test_app().await;
    let (status, body) = call(app, post("/optimized_trip_planner", r#"{"question": 1}"#)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_planner_endpoint_returns_plan() {
    let (_server, app) = test_app().await;
    let (status, body) = call(
        app,
        post("/optimized_trip_planner", r#"{"query": "Mumbai to Goa for a couple"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["data"]["combined_result"].as_str().unwrap().contains("Fort Aguada"));
    assert!(body["execution_time_ms"].is_u64());
}

#[tokio::test]
async fn test_itinerary_tool_endpoint() {
    let (_server, app) = test_app().await;
    let (status, body) = call(app, post("/tools/itinerary", r#"{"query": "3 days in Goa"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tool"], "itinerary");
    assert_eq!(body["data"]["result"], "Day 1: Fort Aguada at sunset");
}

#[tokio::test]
async fn test_travel_search_endpoint_validates_params() {
    let (_server, app) = test_app().await;
    let body = r#"{"origin": "", "destination": "Goa", "departure_date": "2025-01-10", "transport_modes": ["bus"]}"#;
    let (status, body) = call(app, post("/tools/travel/search", body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("Origin is required"));
}

#[tokio::test]
async fn test_agent_info_lists_tools() {
    let (_server, app) = test_app().await;
    let request = Request::builder().uri("/agent/info").body(Body::empty()).unwrap();
    let (status, body) = call(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["main_endpoint"], "/optimized_trip_planner");
    assert_eq!(body["data"]["tools"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_slow_upstream_times_out_with_408() {
    let perplexity = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion("too late").set_delay(std::time::Duration::from_secs(3)))
        .mount(&perplexity)
        .await;

    let mut config = config_for(&perplexity, None);
    config.server.request_timeout_seconds = 1;
    let agent = agent_for(&config);
    let app = web::app(AppState::new(agent, config.clone()), &config.server);

    let response = app
        .oneshot(post("/tools/itinerary", r#"{"query": "3 days in Goa"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
}

#[test]
fn test_cli_lists_tools_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_tripmazer"))
        .args(["--config"])
        .arg(dir.path().join("missing.toml"))
        .args(["--json", "tools"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let tools: Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = tools
        .as_array()
        .unwrap()
        .iter()
        .map(|tool| tool["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["search_accommodations", "plan_itinerary", "search_restaurants", "travel_search"]
    );
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_tripmazer"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Budget-aware AI trip plan"));
    assert!(stdout.contains("plan"));
    assert!(stdout.contains("serve"));
}

/// Query API integration tests
///
/// Drives the full router (routes, CORS layer, fallback) in-process with
/// `tower::ServiceExt::oneshot` against tables built in memory or loaded
/// from fixture files.
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use serde_json::{json, Value};
use tower::ServiceExt;

use brent_backend::app::create_app;
use brent_backend::config::{DataPaths, ServerConfig};
use brent_backend::models::{ChangePointRecord, EventRecord, PricePoint, PriceSeries};
use brent_backend::state::AppState;
use brent_backend::utils::DateParsingConfig;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn sample_state(change_points: Vec<ChangePointRecord>) -> AppState {
    let (prices, _) = PriceSeries::from_unsorted(vec![
        PricePoint::new(ymd(2020, 1, 4), 52.0),
        PricePoint::new(ymd(2020, 1, 1), 50.0),
        PricePoint::new(ymd(2020, 1, 2), 51.0),
    ]);
    let events = vec![
        EventRecord {
            date: ymd(2020, 1, 3),
            title: "Soleimani strike".to_string(),
            category: "Conflict".to_string(),
            description: "US strike in Baghdad".to_string(),
        },
        EventRecord {
            date: ymd(2020, 3, 6),
            title: "OPEC+ talks collapse".to_string(),
            category: "Policy".to_string(),
            description: "Price war begins".to_string(),
        },
    ];
    AppState::new(prices, events, change_points)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn historical_filters_inclusive_range_in_date_order() {
    let app = create_app(sample_state(vec![]));
    let (status, body) = get_json(app, "/api/historical?start=2020-01-01&end=2020-01-03").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"date": "2020-01-01", "price": 50.0},
            {"date": "2020-01-02", "price": 51.0}
        ])
    );
}

#[tokio::test]
async fn historical_without_bounds_returns_everything() {
    let app = create_app(sample_state(vec![]));
    let (status, body) = get_json(app, "/api/historical").await;

    assert_eq!(status, StatusCode::OK);
    let dates: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2020-01-01", "2020-01-02", "2020-01-04"]);
}

#[tokio::test]
async fn historical_rejects_malformed_dates() {
    let app = create_app(sample_state(vec![]));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/historical?start=01/01/2020")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn events_are_listed_and_filterable() {
    let (status, body) = get_json(create_app(sample_state(vec![])), "/api/events").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(
        body[0],
        json!({
            "date": "2020-01-03",
            "title": "Soleimani strike",
            "category": "Conflict",
            "description": "US strike in Baghdad"
        })
    );

    let (_, filtered) = get_json(create_app(sample_state(vec![])), "/api/events?category=policy").await;
    assert_eq!(filtered.as_array().unwrap().len(), 1);
    assert_eq!(filtered[0]["title"], "OPEC+ talks collapse");
}

#[tokio::test]
async fn change_points_expose_dates_and_summary() {
    let record = ChangePointRecord {
        tau_index: 3,
        tau_date: ymd(2020, 1, 4),
        mu1_price: 50.5,
        mu2_price: 52.0,
        pct_change: 2.97,
    };
    let state = sample_state(vec![record]);

    let (status, dates) = get_json(create_app(state.clone()), "/api/changepoints").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dates, json!([{"date": "2020-01-04"}]));

    let (status, summary) = get_json(create_app(state), "/api/changepoints/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary[0]["tau_index"], 3);
    assert_eq!(summary[0]["pct_change"], 2.97);
}

#[tokio::test]
async fn missing_summary_artifact_serves_empty_array() {
    let dir = std::env::temp_dir().join(format!("brent-api-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let prices = dir.join("prices.csv");
    let events = dir.join("events.csv");
    std::fs::write(&prices, "Date,Price\n20-May-87,18.63\n21-May-87,18.45\n").unwrap();
    std::fs::write(
        &events,
        "Date,Short Title,Category,Description\n1990-08-02,Iraq invades Kuwait,Conflict,Gulf War\n",
    )
    .unwrap();

    let config = ServerConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        paths: DataPaths {
            prices_csv: prices,
            events_csv: events,
            summary_csv: dir.join("does-not-exist.csv"),
        },
        dates: DateParsingConfig::default(),
    };
    let state = AppState::load(&config).unwrap();

    let (status, body) = get_json(create_app(state.clone()), "/api/changepoints").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (_, prices) = get_json(create_app(state), "/api/historical").await;
    assert_eq!(prices[0], json!({"date": "1987-05-20", "price": 18.63}));
}

#[tokio::test]
async fn unknown_route_is_not_found_and_health_is_ok() {
    let response = create_app(sample_state(vec![]))
        .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = create_app(sample_state(vec![]))
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

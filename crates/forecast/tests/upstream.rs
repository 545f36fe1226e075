//! Fetcher and tool behavior against a local stand-in for QWeather.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use forecast::{
    Coordinate, EMPTY_FORECAST_MESSAGE, FetchError, ForecastConfig, ForecastFetcher,
    ForecastOutcome, ForecastTool, TOOL_NAME,
};
use mcp::{ToolError, ToolHost};
use serde_json::json;

const PAYLOAD: &str = r#"{
  "code": "200",
  "updateTime": "2024-01-01T08:00+08:00",
  "fxLink": "https://www.qweather.com/weather/shanghai-101020100.html",
  "daily": [
    {"fxDate": "2024-01-01", "tempMax": "12", "tempMin": "3", "textDay": "晴", "textNight": "多云",
     "windDirDay": "北风", "windScaleDay": "1-3"},
    {"fxDate": "2024-01-02", "tempMax": "10", "tempMin": "2", "textDay": "小雨", "textNight": "阴",
     "windDirDay": "东风", "windScaleDay": "3-4"}
  ],
  "refer": {"sources": ["QWeather"], "license": ["QWeather Developers License"]}
}"#;

#[derive(Clone)]
struct Reply {
    status: StatusCode,
    body: &'static str,
    delay: Duration,
}

impl Reply {
    fn ok(body: &'static str) -> Self {
        Self {
            status: StatusCode::OK,
            body,
            delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Default, Clone)]
struct Seen {
    query: Option<String>,
    api_key: Option<String>,
    user_agent: Option<String>,
}

#[derive(Clone)]
struct Upstream {
    reply: Reply,
    hits: Arc<AtomicUsize>,
    seen: Arc<Mutex<Seen>>,
}

async fn forecast_handler(
    State(upstream): State<Upstream>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    upstream.hits.fetch_add(1, Ordering::SeqCst);
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    *upstream.seen.lock().unwrap() = Seen {
        query,
        api_key: header("x-qw-api-key"),
        user_agent: header("user-agent"),
    };

    if !upstream.reply.delay.is_zero() {
        tokio::time::sleep(upstream.reply.delay).await;
    }
    (
        upstream.reply.status,
        [("content-type", "application/json")],
        upstream.reply.body,
    )
        .into_response()
}

async fn start_upstream(reply: Reply) -> (SocketAddr, Upstream) {
    let upstream = Upstream {
        reply,
        hits: Arc::new(AtomicUsize::new(0)),
        seen: Arc::new(Mutex::new(Seen::default())),
    };
    let app = Router::new()
        .route("/v7/weather/7d", get(forecast_handler))
        .with_state(upstream.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, upstream)
}

fn fetcher_for(addr: SocketAddr, config: ForecastConfig) -> ForecastFetcher {
    ForecastFetcher::new(config.with_endpoint(format!("http://{addr}/v7/weather/7d"))).unwrap()
}

fn shanghai() -> Coordinate {
    Coordinate::new(121.4737, 31.2304).unwrap()
}

#[tokio::test]
async fn success_sends_headers_and_rounded_location() {
    let (addr, upstream) = start_upstream(Reply::ok(PAYLOAD)).await;
    let fetcher = fetcher_for(addr, ForecastConfig::default().with_api_key("test-key"));

    let outcome = fetcher.fetch(&shanghai()).await;

    let ForecastOutcome::Ready(response) = outcome else {
        panic!("expected a forecast, got {outcome:?}");
    };
    assert_eq!(response.daily.len(), 2);
    assert_eq!(response.daily[0].fx_date, "2024-01-01");
    assert_eq!(response.daily[1].text_day, "小雨");

    let seen = upstream.seen.lock().unwrap().clone();
    assert_eq!(seen.query.as_deref(), Some("location=121.47,31.23"));
    assert_eq!(seen.api_key.as_deref(), Some("test-key"));
    assert_eq!(seen.user_agent.as_deref(), Some("weather-app/1.0"));
}

#[tokio::test]
async fn missing_key_sends_empty_header() {
    let (addr, upstream) = start_upstream(Reply::ok(PAYLOAD)).await;
    let fetcher = fetcher_for(addr, ForecastConfig::default());

    assert!(matches!(
        fetcher.fetch(&shanghai()).await,
        ForecastOutcome::Ready(_)
    ));
    assert_eq!(upstream.seen.lock().unwrap().api_key.as_deref(), Some(""));
}

#[tokio::test]
async fn unauthorized_is_unavailable() {
    let (addr, _upstream) = start_upstream(Reply {
        status: StatusCode::UNAUTHORIZED,
        body: r#"{"code":"401"}"#,
        delay: Duration::ZERO,
    })
    .await;
    let fetcher = fetcher_for(addr, ForecastConfig::default());

    match fetcher.fetch(&shanghai()).await {
        ForecastOutcome::Unavailable(FetchError::Status { status, .. }) => assert_eq!(status, 401),
        other => panic!("expected a status failure, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_unavailable() {
    let (addr, _upstream) = start_upstream(Reply::ok("<html>not json</html>")).await;
    let fetcher = fetcher_for(addr, ForecastConfig::default());

    assert!(matches!(
        fetcher.fetch(&shanghai()).await,
        ForecastOutcome::Unavailable(FetchError::Decode(_))
    ));
}

#[tokio::test]
async fn empty_daily_is_empty_not_unavailable() {
    let (addr, _upstream) = start_upstream(Reply::ok(r#"{"code":"200","daily":[]}"#)).await;
    let fetcher = fetcher_for(addr, ForecastConfig::default());

    assert!(matches!(
        fetcher.fetch(&shanghai()).await,
        ForecastOutcome::Empty(_)
    ));
}

#[tokio::test]
async fn loosely_typed_fields_still_render() {
    let body = r#"{
        "code": 200,
        "daily": [{"fxDate": "2024-01-01", "moonrise": null, "tempMin": 10, "tempMax": 18}]
    }"#;
    let (addr, _upstream) = start_upstream(Reply::ok(body)).await;
    let fetcher = fetcher_for(addr, ForecastConfig::default());

    let ForecastOutcome::Ready(response) = fetcher.fetch(&shanghai()).await else {
        panic!("loosely typed payload should still be a forecast");
    };
    assert_eq!(response.code, "200");
    assert_eq!(response.daily[0].moonrise, "");
    assert_eq!(response.daily[0].temp_min, "10");
    assert_eq!(response.daily[0].temp_max, "18");
}

#[tokio::test]
async fn connection_refused_is_unavailable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let fetcher = fetcher_for(addr, ForecastConfig::default());

    assert!(matches!(
        fetcher.fetch(&shanghai()).await,
        ForecastOutcome::Unavailable(FetchError::Network(_))
    ));
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let (addr, _upstream) = start_upstream(Reply {
        status: StatusCode::OK,
        body: PAYLOAD,
        delay: Duration::from_secs(5),
    })
    .await;
    let fetcher = fetcher_for(
        addr,
        ForecastConfig::default().with_timeout(Duration::from_millis(200)),
    );

    assert!(matches!(
        fetcher.fetch(&shanghai()).await,
        ForecastOutcome::Unavailable(FetchError::Network(_))
    ));
}

#[tokio::test]
async fn tool_renders_forecast_text() {
    let (addr, _upstream) = start_upstream(Reply::ok(PAYLOAD)).await;
    let tool = ForecastTool::new(fetcher_for(addr, ForecastConfig::default()));

    let result = tool
        .execute(TOOL_NAME, json!({"longitude": 121.4737, "latitude": 31.2304}))
        .await
        .unwrap();

    assert!(!result.is_error);
    let text = result.content[0].as_text().unwrap();
    assert!(text.starts_with("Current time is "));
    assert!(text.contains("forecast for 121.4737, 31.2304:"));
    assert!(text.contains("**日期: 2024-01-01**\n温度: 3 12\n风: 北风 1-3\n天气: 白天晴，夜晚多云\n---"));
    assert!(text.contains("**日期: 2024-01-02**"));
}

#[tokio::test]
async fn tool_reports_failures_as_text() {
    let (addr, _upstream) = start_upstream(Reply {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: "boom",
        delay: Duration::ZERO,
    })
    .await;
    let tool = ForecastTool::new(fetcher_for(addr, ForecastConfig::default()));

    let result = tool
        .execute(TOOL_NAME, json!({"longitude": 10.5, "latitude": -20.25}))
        .await
        .unwrap();

    let text = result.content[0].as_text().unwrap();
    assert!(text.starts_with("Failed to retrieve forecast for coordinates: 10.5, -20.25."));
}

#[tokio::test]
async fn tool_reports_empty_forecast() {
    let (addr, _upstream) = start_upstream(Reply::ok(r#"{"code":"200","daily":[]}"#)).await;
    let tool = ForecastTool::new(fetcher_for(addr, ForecastConfig::default()));

    let result = tool
        .execute(TOOL_NAME, json!({"longitude": 0, "latitude": 0}))
        .await
        .unwrap();

    assert_eq!(result.content[0].as_text(), Some(EMPTY_FORECAST_MESSAGE));
}

#[tokio::test]
async fn invalid_arguments_never_reach_upstream() {
    let (addr, upstream) = start_upstream(Reply::ok(PAYLOAD)).await;
    let tool = ForecastTool::new(fetcher_for(addr, ForecastConfig::default()));

    for arguments in [
        json!({"longitude": 181, "latitude": 0}),
        json!({"longitude": 0, "latitude": -90.5}),
        json!({"latitude": 0}),
    ] {
        let err = tool.execute(TOOL_NAME, arguments).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    let err = tool
        .execute("get-alerts", json!({"longitude": 0, "latitude": 0}))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::NotFound(_)));

    assert_eq!(upstream.hits.load(Ordering::SeqCst), 0);
}

//! TimeZoneDB client against a mock HTTP server

use dstcheck::error::DstError;
use dstcheck::offset::{resolve, OffsetKey, ZoneTable};
use dstcheck::oracle::{TimeZoneDbOracle, TransitionOracle};
use dstcheck::record::Direction;
use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

const API_PATH: &str = "/v2.1/get-time-zone";

fn oracle_for(server: &MockServer) -> TimeZoneDbOracle {
    TimeZoneDbOracle::new(
        format!("{}{}", server.uri(), API_PATH),
        "TESTKEY",
        ZoneTable::default(),
    )
}

#[tokio::test]
async fn test_lookup_success() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("GET"))
        .and(matchers::path(API_PATH))
        .and(matchers::query_param("key", "TESTKEY"))
        .and(matchers::query_param("format", "json"))
        .and(matchers::query_param("by", "zone"))
        .and(matchers::query_param("zone", "America/New_York"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"status":"OK","message":"","countryCode":"US","zoneName":"America/New_York","abbreviation":"EDT","gmtOffset":-14400,"dst":"1","zoneStart":1710054000,"zoneEnd":1730613600,"nextAbbreviation":"EST","timestamp":1720000000}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let oracle = oracle_for(&server);
    let key = resolve("(GMT-05:00) Eastern Time (US & Canada)").unwrap();
    let info = oracle.lookup(&key).await.unwrap();

    assert_eq!(info.next_transition_epoch, 1_730_613_600);
    assert_eq!(info.direction, Direction::Forward);
    assert_eq!(info.offset_hours, -4);
}

#[tokio::test]
async fn test_lookup_half_hour_uses_whole_hour_zone() {
    let server = MockServer::start().await;
    Mock::given(matchers::path(API_PATH))
        .and(matchers::query_param("zone", "Asia/Karachi"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"status":"OK","gmtOffset":18000,"dst":"0","zoneEnd":null,"nextTransition":"2030-01-01T00:00:00Z"}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let oracle = oracle_for(&server);
    let key = resolve("(GMT+05:30) Chennai, Kolkata, Mumbai, New Delhi").unwrap();
    let info = oracle.lookup(&key).await.unwrap();

    assert_eq!(info.offset_hours, 5);
    assert_eq!(info.direction, Direction::Backward);
    assert_eq!(info.next_transition_epoch, 1_893_456_000);
}

#[tokio::test]
async fn test_lookup_non_200_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(matchers::path(API_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let oracle = oracle_for(&server);
    let err = oracle.lookup(&OffsetKey::from_hours(0)).await.unwrap_err();
    assert!(matches!(err, DstError::OracleUnavailable(_)));
    assert!(err.to_string().contains("503"), "{}", err);
}

#[tokio::test]
async fn test_lookup_failed_status_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(matchers::path(API_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"status":"FAILED","message":"Invalid API key."}"#),
        )
        .mount(&server)
        .await;

    let oracle = oracle_for(&server);
    let err = oracle.lookup(&OffsetKey::from_hours(1)).await.unwrap_err();
    assert!(err.to_string().contains("Invalid API key."), "{}", err);
}

#[tokio::test]
async fn test_lookup_garbage_body_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(matchers::path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"))
        .mount(&server)
        .await;

    let oracle = oracle_for(&server);
    let err = oracle.lookup(&OffsetKey::from_hours(2)).await.unwrap_err();
    assert!(matches!(err, DstError::OracleUnavailable(_)));
}

#[tokio::test]
async fn test_unmapped_offset_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let oracle = oracle_for(&server);
    let key = resolve("(GMT+13:00) Nuku'alofa").unwrap();
    let err = oracle.lookup(&key).await.unwrap_err();
    assert!(err.to_string().contains("offset 13"), "{}", err);
}

#[tokio::test]
async fn test_unreachable_server_is_unavailable() {
    // Nothing listens on the discard port
    let oracle = TimeZoneDbOracle::new("http://127.0.0.1:9/tz", "TESTKEY", ZoneTable::default());
    let err = oracle.lookup(&OffsetKey::from_hours(0)).await.unwrap_err();
    assert!(matches!(err, DstError::OracleUnavailable(_)));
}

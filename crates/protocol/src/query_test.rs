//! Tests for Query

use crate::error::ProtocolError;
use crate::query::Query;
use crate::result::MetricKind;

// =============================================================================
// Query::new tests
// =============================================================================

#[test]
fn test_query_new() {
    let query = Query::new("system:type=Cpu", ["usage", "cores"]).unwrap();

    assert_eq!(query.pattern(), "system:type=Cpu");
    assert_eq!(query.attributes(), &["usage".to_string(), "cores".to_string()]);
    assert_eq!(query.alias(), None);
    assert_eq!(query.kind(), MetricKind::Unknown);
}

#[test]
fn test_query_new_empty_pattern() {
    let err = Query::new("  ", ["usage"]).unwrap_err();
    assert_eq!(err, ProtocolError::EmptyPattern);
}

#[test]
fn test_query_new_no_attributes() {
    let err = Query::new("system:*", Vec::<String>::new()).unwrap_err();
    assert_eq!(err, ProtocolError::no_attributes("system:*"));
}

#[test]
fn test_query_new_empty_attribute() {
    let err = Query::new("system:*", ["usage", ""]).unwrap_err();
    assert_eq!(err, ProtocolError::empty_attribute("system:*"));
}

// =============================================================================
// Builder tests
// =============================================================================

#[test]
fn test_query_with_alias_and_kind() {
    let query = Query::new("system:type=Memory", ["used"])
        .unwrap()
        .with_alias("mem")
        .with_kind(MetricKind::Gauge);

    assert_eq!(query.alias(), Some("mem"));
    assert_eq!(query.kind(), MetricKind::Gauge);
}

#[test]
fn test_query_with_empty_alias_is_none() {
    let query = Query::new("system:type=Memory", ["used"])
        .unwrap()
        .with_alias("");

    assert_eq!(query.alias(), None);
}

// =============================================================================
// Result naming tests
// =============================================================================

#[test]
fn test_result_name_uses_entity() {
    let query = Query::new("app:*", ["requests"]).unwrap();
    assert_eq!(query.result_name("app:name=web", "requests"), "app:name=web.requests");
}

#[test]
fn test_result_name_uses_alias() {
    let query = Query::new("app:*", ["requests"]).unwrap().with_alias("app");
    assert_eq!(query.result_name("app:name=web", "requests"), "app.requests");
}

#[test]
fn test_query_display() {
    let query = Query::new("app:*", ["a", "b"]).unwrap();
    assert_eq!(query.to_string(), "app:*[a,b]");
}

//! Integration tests for the two outbound lookups: RDAP and the Gemini API.
//!
//! Both talk to wiremock servers standing in for the real services.

use chrono::{TimeZone, Utc};
use phishscope::agent::{Summarizer, SummaryRequest, MISSING_KEY_MESSAGE};
use phishscope::config::AgentConfig;
use phishscope::domain::{DomainAgeResolver, Years, LOOKUP_ERROR, NOT_FOUND, NO_DATA};
use serde_json::json;
use std::collections::BTreeMap;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn resolver_for(server: &MockServer) -> DomainAgeResolver {
    let mut endpoints = BTreeMap::new();
    endpoints.insert("com".to_string(), format!("{}/com/v1/domain/", server.uri()));
    DomainAgeResolver::new(reqwest::Client::new(), endpoints)
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn registration_event_gives_age() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/com/v1/domain/example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ldhName": "EXAMPLE.COM",
            "events": [
                { "eventAction": "last changed", "eventDate": "2023-08-14T07:01:38Z" },
                { "eventAction": "registration", "eventDate": "1995-08-14T04:00:00Z" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let age = resolver_for(&server)
        .resolve_at("https://www.example.com/login?next=/", now())
        .await;
    assert_eq!(age.parent_domain, "example.com");
    // March is before August: one year is borrowed
    assert_eq!(age.display, "28y 7m");
    assert_eq!(age.years, Years::Known(28));
}

#[tokio::test]
async fn created_event_is_the_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/com/v1/domain/example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [ { "eventAction": "created", "eventDate": "2020-01-05" } ]
        })))
        .mount(&server)
        .await;

    let age = resolver_for(&server)
        .resolve_at("https://shop.example.com/", now())
        .await;
    assert_eq!(age.display, "4y 2m");
    assert_eq!(age.years, Years::Known(4));
}

#[tokio::test]
async fn missing_events_give_no_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/com/v1/domain/example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [ { "eventAction": "expiration", "eventDate": "2030-01-01T00:00:00Z" } ]
        })))
        .mount(&server)
        .await;

    let age = resolver_for(&server).resolve("https://example.com/").await;
    assert_eq!(age.display, NO_DATA);
    assert_eq!(age.years, Years::Unknown);
}

#[tokio::test]
async fn null_events_give_no_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/com/v1/domain/example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "events": null })))
        .mount(&server)
        .await;

    let age = resolver_for(&server).resolve("https://example.com/").await;
    assert_eq!(age.display, NO_DATA);
    assert_eq!(age.years, Years::Unknown);
}

#[tokio::test]
async fn dateless_events_are_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/com/v1/domain/example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [
                { "eventAction": "last update of RDAP database" },
                { "eventAction": "registration", "eventDate": "2001-01-01T00:00:00Z" }
            ]
        })))
        .mount(&server)
        .await;

    let age = resolver_for(&server)
        .resolve_at("https://example.com/", now())
        .await;
    assert_eq!(age.display, "23y 2m");
    assert_eq!(age.years, Years::Known(23));
}

#[tokio::test]
async fn registry_miss_gives_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let age = resolver_for(&server).resolve("https://unregistered.com/").await;
    assert_eq!(age.display, NOT_FOUND);
    assert_eq!(age.years, Years::Unknown);
}

#[tokio::test]
async fn unreadable_answer_gives_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let age = resolver_for(&server).resolve("https://example.com/").await;
    assert_eq!(age.display, LOOKUP_ERROR);
}

#[tokio::test]
async fn transport_failure_gives_error() {
    let mut endpoints = BTreeMap::new();
    endpoints.insert("com".to_string(), "http://127.0.0.1:9/".to_string());
    let resolver = DomainAgeResolver::new(reqwest::Client::new(), endpoints);

    let age = resolver.resolve("https://example.com/").await;
    assert_eq!(age.display, LOOKUP_ERROR);
    assert_eq!(age.years, Years::Unknown);
}

fn summarizer_for(server: &MockServer) -> Summarizer {
    let config = AgentConfig {
        endpoint: format!("{}/v1beta", server.uri()),
        ..AgentConfig::default()
    };
    Summarizer::new(reqwest::Client::new(), &config)
}

fn request() -> SummaryRequest<'static> {
    SummaryRequest {
        url: "https://login-paypa1.example.com/",
        content: "Confirm your card details within 24 hours",
        domain_age_years: Years::Known(0),
        links: &[],
    }
}

#[tokio::test]
async fn summary_text_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({ "contents": [ { "parts": [ {} ] } ] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [ { "content": { "parts": [ { "text": "**Risk Level: High**\nFake login." } ] } } ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = summarizer_for(&server)
        .generate_summary(Some("test-key"), &request())
        .await;
    assert_eq!(text, "**Risk Level: High**\nFake login.");
}

#[tokio::test]
async fn prompt_is_sent_in_the_first_part() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [ { "content": { "parts": [ { "text": "ok" } ] } } ]
        })))
        .mount(&server)
        .await;

    summarizer_for(&server)
        .generate_summary(Some("test-key"), &request())
        .await;

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.starts_with("Analyze this webpage for phishing risks."));
    assert!(prompt.contains("Confirm your card details within 24 hours"));
    assert!(prompt.contains("- **Domain Age:** 0 years old."));
}

#[tokio::test]
async fn error_status_becomes_display_string() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
        .mount(&server)
        .await;

    let text = summarizer_for(&server)
        .generate_summary(Some("bad-key"), &request())
        .await;
    assert_eq!(text, "Error analyzing: API error: 403");
}

#[tokio::test]
async fn empty_candidates_become_display_string() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let text = summarizer_for(&server)
        .generate_summary(Some("test-key"), &request())
        .await;
    assert_eq!(text, "Error analyzing: response contained no text");
}

#[tokio::test]
async fn missing_key_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let text = summarizer_for(&server).generate_summary(None, &request()).await;
    assert_eq!(text, MISSING_KEY_MESSAGE);
}

#[tokio::test]
async fn transport_failure_keeps_key_out_of_message() {
    let config = AgentConfig {
        endpoint: "http://127.0.0.1:9/v1beta".to_string(),
        ..AgentConfig::default()
    };
    let summarizer = Summarizer::new(reqwest::Client::new(), &config);

    let text = summarizer
        .generate_summary(Some("SUPERSECRETKEY123"), &request())
        .await;
    assert!(text.starts_with("Error analyzing:"), "{}", text);
    assert!(!text.contains("SUPERSECRETKEY123"), "{}", text);
}

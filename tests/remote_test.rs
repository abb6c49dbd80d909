//! Remote $ref fetching against a local mock HTTP server.

#![cfg(feature = "remote")]

use openapi_deref::{dereference_document, DerefOptions, HttpFetcher, LoadError, RemoteFetcher};
use serde_json::json;
use std::time::Duration;
use url::Url;

fn root_location() -> Url {
    Url::parse("file:///specs/openapi.yaml").unwrap()
}

#[test]
fn fetches_http_refs_when_allowed() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/common.yaml")
        .with_status(200)
        .with_body("Error:\n  type: object\n  properties:\n    code:\n      $ref: '#/Code'\nCode:\n  type: integer\n")
        .expect(1)
        .create();

    let reference = format!("{}/common.yaml#/Error", server.url());
    let doc = json!({
        "a": { "$ref": reference.clone() },
        "b": { "$ref": reference }
    });

    let options = DerefOptions::new().allow_http_fetch(true);
    let out = dereference_document(doc, root_location(), &options).unwrap();

    assert_eq!(out.document["a"]["properties"]["code"]["type"], "integer");
    assert_eq!(out.document["a"]["properties"]["code"]["x-resolved-from"], "#/Code");
    assert_eq!(out.document["a"], out.document["b"]);
    assert!(out.warnings.is_empty());
    // The document is fetched once and cached
    mock.assert();
}

#[test]
fn http_errors_leave_ref_in_place() {
    let mut server = mockito::Server::new();
    let mock = server.mock("GET", "/missing.yaml").with_status(404).create();

    let reference = format!("{}/missing.yaml#/Error", server.url());
    let doc = json!({ "a": { "$ref": reference } });

    let options = DerefOptions::new().allow_http_fetch(true);
    let out = dereference_document(doc.clone(), root_location(), &options).unwrap();

    assert_eq!(out.document, doc);
    assert_eq!(out.stats.unresolved, 1);
    assert!(out.warnings[0].contains("failed to fetch"));
    mock.assert();
}

#[test]
fn no_request_when_fetch_disabled() {
    let mut server = mockito::Server::new();
    let mock = server.mock("GET", "/common.yaml").expect(0).create();

    let reference = format!("{}/common.yaml#/Error", server.url());
    let doc = json!({ "a": { "$ref": reference } });

    let out = dereference_document(doc.clone(), root_location(), &DerefOptions::new()).unwrap();

    assert_eq!(out.document, doc);
    assert!(out.warnings[0].contains("HTTP(S) external refs are disabled"));
    mock.assert();
}

#[test]
fn http_fetcher_returns_body() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/doc.json")
        .with_status(200)
        .with_body(r#"{"ok": true}"#)
        .create();

    let url = Url::parse(&format!("{}/doc.json", server.url())).unwrap();
    let body = HttpFetcher::new().fetch(&url).unwrap();
    assert_eq!(body, r#"{"ok": true}"#);

    let missing = Url::parse(&format!("{}/nope.json", server.url())).unwrap();
    assert!(matches!(
        HttpFetcher::new().fetch(&missing),
        Err(LoadError::NetworkError { .. })
    ));
}

#[test]
fn http_fetcher_with_custom_timeout() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/slow.yaml")
        .with_status(200)
        .with_body("Code:\n  type: integer\n")
        .create();

    let fetcher = HttpFetcher::with_timeout(Duration::from_secs(5));
    let url = Url::parse(&format!("{}/slow.yaml", server.url())).unwrap();
    assert_eq!(fetcher.fetch(&url).unwrap(), "Code:\n  type: integer\n");
}

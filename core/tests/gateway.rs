// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! End-to-end gateway tests against a mocked DAV server.

use davgate_core::dav::{DavConfig, ETag};
use davgate_core::{AuditEntry, Config, ConfigError, Contact, CoordinatorError, Event, Gateway, GatewayError};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONTACT_PATH: &str = "/dav/addressbooks/alice/contacts/c-1.vcf";
const EVENT_PATH: &str = "/dav/calendars/alice/personal/e-1.ics";

fn config(server: &MockServer, dir: &tempfile::TempDir) -> Config {
    Config {
        dav: DavConfig {
            base_url: server.uri(),
            addressbook_home: "/dav/addressbooks/alice/".to_string(),
            calendar_home: "/dav/calendars/alice/".to_string(),
            ..Default::default()
        },
        audit_log: Some(dir.path().join("logs").join("audit.log")),
    }
}

fn read_audit(dir: &tempfile::TempDir) -> Vec<AuditEntry> {
    let text = std::fs::read_to_string(dir.path().join("logs").join("audit.log")).unwrap();
    text.lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn gateway_rejects_stale_contact_update() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path(CONTACT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "\"2\"")
                .set_body_string("BEGIN:VCARD\r\nVERSION:3.0\r\nUID:c-1\r\nFN:Bob\r\nEND:VCARD\r\n"),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let gateway = Gateway::new(config(&server, &dir)).unwrap();
    let stale = Contact {
        uid: "c-1".to_string(),
        full_name: "Alice".to_string(),
        etag: Some(ETag::from("1")),
        ..Default::default()
    };
    let err = gateway.update_contact(None, stale).await.unwrap_err();
    let CoordinatorError::Conflict { current, .. } = &err else {
        panic!("expected conflict, got {err:?}");
    };
    assert_eq!(current.full_name, "Bob");
    assert_eq!(current.etag, Some(ETag::from("\"2\"")));
    gateway.shutdown().await;

    let entries = read_audit(&dir);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].uid, "c-1");
    assert_eq!(entries[0].resource, "contact");
}

#[tokio::test]
async fn gateway_creates_event_with_if_none_match() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("PUT"))
        .and(path(EVENT_PATH))
        .and(header("If-None-Match", "*"))
        .and(body_string_contains("TRIGGER:-PT15M"))
        .respond_with(ResponseTemplate::new(201).insert_header("ETag", "\"e1\""))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = Gateway::new(config(&server, &dir)).unwrap();
    let event: Event = serde_json::from_value(serde_json::json!({
        "uid": "e-1",
        "summary": "Standup",
        "start": "2025-04-21T14:00:00",
        "end": "2025-04-21T14:15:00",
        "start_timezone": "Europe/Paris",
        "reminders": [{ "type": "display", "mode": "relative", "trigger": "-PT15M" }],
    }))
    .unwrap();

    let created = gateway.create_event(None, event).await.unwrap();
    assert_eq!(created.etag, Some(ETag::from("\"e1\"")));
    assert_eq!(created.url.as_deref(), Some(EVENT_PATH));
    gateway.shutdown().await;

    let entries = read_audit(&dir);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].after.as_ref().unwrap()["summary"], "Standup");
}

#[tokio::test]
async fn gateway_delete_of_missing_event_succeeds() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path(EVENT_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let gateway = Gateway::new(config(&server, &dir)).unwrap();
    let result = gateway.delete_event(None, "e-1", None).await.unwrap();
    assert_eq!(serde_json::to_value(result).unwrap(), "not_present");
}

#[tokio::test]
async fn gateway_requires_base_url() {
    let err = Gateway::new(Config::default()).unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Config(ConfigError::MissingBaseUrl)
    ));
}

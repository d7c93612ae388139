//! Integration tests for spreadsheet provisioning (src/sheets.rs).

mod common;

use mockito::Matcher;
use pretty_assertions::assert_eq;
use std::cell::Cell;

use common::*;
use gsheets_plaid::Error;
use gsheets_plaid::auth::Credential;
use gsheets_plaid::sheets::{
    DEFAULT_SPREADSHEET_TITLE, ResourceProvisioner, ResourceRecord, SheetsClient, SpreadsheetApi,
    load_record,
};

/// Spreadsheet API that hands out sequential ids and counts calls.
#[derive(Default)]
struct CountingApi {
    calls: Cell<u32>,
    fail: bool,
}

impl SpreadsheetApi for CountingApi {
    fn create_spreadsheet(
        &self,
        title: &str,
        _credential: &Credential,
    ) -> gsheets_plaid::Result<String> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            return Err(Error::ResourceCreation("HTTP 429: quota exceeded".to_string()));
        }
        assert_eq!(title, DEFAULT_SPREADSHEET_TITLE);
        Ok(format!("sheet-{}", self.calls.get()))
    }
}

fn cred() -> Credential {
    common::credential("https://oauth2.googleapis.com/token", 3600)
}

#[test]
fn test_existing_record_skips_api() {
    let (_tmp, dir) = temp_dir();
    std::fs::write(record_path(&dir), r#"{"spreadsheetId": "abc123"}"#).unwrap();

    let api = CountingApi::default();
    let provisioner = ResourceProvisioner::new(&config_in(&dir), &api);
    let id = provisioner.ensure_resource("Finance Tracker", &cred()).unwrap();

    assert_eq!(id, "abc123");
    assert_eq!(api.calls.get(), 0);
}

#[test]
fn test_creates_once_then_reuses() {
    let (_tmp, dir) = temp_dir();
    let config = config_in(&dir);
    let api = CountingApi::default();

    let provisioner = ResourceProvisioner::new(&config, &api);
    assert!(!provisioner.is_provisioned());
    let first = provisioner.ensure_resource(DEFAULT_SPREADSHEET_TITLE, &cred()).unwrap();
    assert_eq!(api.calls.get(), 1);
    assert!(provisioner.is_provisioned());

    let record = load_record(&record_path(&dir)).unwrap().unwrap();
    assert_eq!(
        record,
        ResourceRecord {
            spreadsheet_id: first.clone()
        }
    );

    // same run
    let second = provisioner.ensure_resource(DEFAULT_SPREADSHEET_TITLE, &cred()).unwrap();
    // later run
    let later = ResourceProvisioner::new(&config, &api)
        .ensure_resource(DEFAULT_SPREADSHEET_TITLE, &cred())
        .unwrap();

    assert_eq!(api.calls.get(), 1);
    assert_eq!(second, first);
    assert_eq!(later, first);
}

#[test]
fn test_creation_failure_writes_nothing() {
    let (_tmp, dir) = temp_dir();
    let api = CountingApi {
        fail: true,
        ..Default::default()
    };
    let provisioner = ResourceProvisioner::new(&config_in(&dir), &api);

    let err = provisioner.ensure_resource(DEFAULT_SPREADSHEET_TITLE, &cred()).unwrap_err();
    assert!(matches!(err, Error::ResourceCreation(_)), "{:?}", err);
    assert_eq!(api.calls.get(), 1);
    assert!(!record_path(&dir).exists());
}

#[test]
fn test_malformed_record_is_fatal() {
    let (_tmp, dir) = temp_dir();
    std::fs::write(record_path(&dir), "spreadsheetId=abc").unwrap();

    let api = CountingApi::default();
    let provisioner = ResourceProvisioner::new(&config_in(&dir), &api);
    let err = provisioner.ensure_resource(DEFAULT_SPREADSHEET_TITLE, &cred()).unwrap_err();

    assert!(matches!(err, Error::ResourceRecordLoad { .. }), "{:?}", err);
    assert_eq!(api.calls.get(), 0);
}

#[test]
fn test_record_missing_key_is_fatal() {
    let (_tmp, dir) = temp_dir();
    std::fs::write(record_path(&dir), r#"{"sheet": "abc"}"#).unwrap();
    let err = load_record(&record_path(&dir)).unwrap_err();
    assert!(matches!(err, Error::ResourceRecordLoad { .. }), "{:?}", err);
}

// ---------------------------------------------------------------------------
// Sheets REST client
// ---------------------------------------------------------------------------

#[test]
fn test_sheets_client_creates_spreadsheet() {
    let mut server = mockito::Server::new();
    let create = server
        .mock("POST", "/v4/spreadsheets")
        .match_header("authorization", "Bearer ya29.cached")
        .match_body(Matcher::Json(serde_json::json!({
            "properties": {"title": "Finance Tracker"}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"spreadsheetId":"1AbC","properties":{"title":"Finance Tracker"},"spreadsheetUrl":"https://docs.google.com/spreadsheets/d/1AbC/edit"}"#)
        .create();

    let client = SheetsClient::new(server.url());
    let id = client.create_spreadsheet("Finance Tracker", &cred()).unwrap();

    create.assert();
    assert_eq!(id, "1AbC");
}

#[test]
fn test_sheets_client_surfaces_http_error() {
    let mut server = mockito::Server::new();
    let _create = server
        .mock("POST", "/v4/spreadsheets")
        .with_status(403)
        .with_body(r#"{"error":{"code":403,"message":"The caller does not have permission"}}"#)
        .create();

    let client = SheetsClient::new(server.url());
    let err = client.create_spreadsheet("Finance Tracker", &cred()).unwrap_err();
    match err {
        Error::ResourceCreation(msg) => {
            assert!(msg.contains("403"), "{}", msg);
            assert!(msg.contains("permission"), "{}", msg);
        }
        other => panic!("expected ResourceCreation, got {:?}", other),
    }
}

#[test]
fn test_sheets_client_missing_id() {
    let mut server = mockito::Server::new();
    let _create = server
        .mock("POST", "/v4/spreadsheets")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .create();

    let client = SheetsClient::new(server.url());
    assert!(matches!(
        client.create_spreadsheet("Finance Tracker", &cred()),
        Err(Error::ResourceCreation(_))
    ));
}

#[test]
fn test_provisioner_with_rest_client() {
    let mut server = mockito::Server::new();
    let create = server
        .mock("POST", "/v4/spreadsheets")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"spreadsheetId":"from-api"}"#)
        .expect(1)
        .create();

    let (_tmp, dir) = temp_dir();
    let config =
        config_in(&dir).with(gsheets_plaid::config::GOOGLE_SHEETS_API_BASE, server.url());
    let provisioner = ResourceProvisioner::from_config(&config);

    assert_eq!(provisioner.ensure_resource(DEFAULT_SPREADSHEET_TITLE, &cred()).unwrap(), "from-api");
    assert_eq!(provisioner.ensure_resource(DEFAULT_SPREADSHEET_TITLE, &cred()).unwrap(), "from-api");
    create.assert();
}

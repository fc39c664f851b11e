use std::time::Duration;

use httpmock::prelude::*;
use qsogrid_directory::{DirectoryCredentials, DirectoryLookup, LookupFailure, QrzClient};

const PATH: &str = "/xml/current/";

fn session_xml(key: &str) -> String {
    format!(
        r#"<?xml version="1.0" ?>
<QRZDatabase version="1.34">
  <Session><Key>{key}</Key><Count>1</Count></Session>
</QRZDatabase>"#
    )
}

fn callsign_xml(call: &str, lat: &str, lon: &str) -> String {
    format!(
        r#"<?xml version="1.0" ?>
<QRZDatabase version="1.34">
  <Callsign><call>{call}</call><lat>{lat}</lat><lon>{lon}</lon><grid>EM29qe</grid></Callsign>
  <Session><Key>fresh</Key></Session>
</QRZDatabase>"#
    )
}

fn error_xml(message: &str) -> String {
    format!(
        r#"<QRZDatabase version="1.34"><Session><Error>{message}</Error></Session></QRZDatabase>"#
    )
}

fn client(server: &MockServer) -> QrzClient {
    QrzClient::new(
        DirectoryCredentials::new("n0call", "hunter2"),
        &server.url(PATH),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[test]
fn logs_in_once_then_looks_up() {
    let server = MockServer::start();

    let login = server.mock(|when, then| {
        when.method(GET)
            .path(PATH)
            .query_param("username", "n0call")
            .query_param("password", "hunter2");
        then.status(200).body(session_xml("fresh"));
    });
    let lookup = server.mock(|when, then| {
        when.method(GET)
            .path(PATH)
            .query_param("s", "fresh")
            .query_param("callsign", "K0TV");
        then.status(200).body(callsign_xml("K0TV", "39.25", "-94.90"));
    });
    let lookup_other = server.mock(|when, then| {
        when.method(GET)
            .path(PATH)
            .query_param("s", "fresh")
            .query_param("callsign", "W3ABC");
        then.status(200).body(callsign_xml("W3ABC", "39.95", "-75.17"));
    });

    let mut client = client(&server);
    let rec = client.lookup("K0TV").unwrap();
    assert_eq!(rec.lat.as_deref(), Some("39.25"));
    assert_eq!(rec.lon.as_deref(), Some("-94.90"));
    client.lookup("W3ABC").unwrap();

    login.assert_calls(1);
    lookup.assert_calls(1);
    lookup_other.assert_calls(1);
}

#[test]
fn portable_call_uses_slash_form() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(PATH).query_param("callsign", "VE3/K3JT");
        then.status(200).body(callsign_xml("VE3/K3JT", "43.6", "-79.4"));
    });

    let mut client = client(&server).with_session_key("cached");
    let rec = client.lookup("VE3-K3JT").unwrap();
    assert_eq!(rec.callsign, "VE3/K3JT");
}

#[test]
fn expired_session_logs_in_again() {
    let server = MockServer::start();

    let stale = server.mock(|when, then| {
        when.method(GET).path(PATH).query_param("s", "stale");
        then.status(200).body(error_xml("Session Timeout"));
    });
    let login = server.mock(|when, then| {
        when.method(GET).path(PATH).query_param("username", "n0call");
        then.status(200).body(session_xml("fresh"));
    });
    let fresh = server.mock(|when, then| {
        when.method(GET).path(PATH).query_param("s", "fresh");
        then.status(200).body(callsign_xml("K0TV", "39.25", "-94.90"));
    });

    let mut client = client(&server).with_session_key("stale");
    let rec = client.lookup("K0TV").unwrap();
    assert_eq!(rec.callsign, "K0TV");

    stale.assert_calls(1);
    login.assert_calls(1);
    fresh.assert_calls(1);
}

#[test]
fn not_found_is_failure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(PATH).query_param("s", "cached");
        then.status(200).body(error_xml("Not found: XX9XX"));
    });

    let mut client = client(&server).with_session_key("cached");
    let err = client.lookup("XX9XX").unwrap_err();
    assert_eq!(err, LookupFailure::NotFound("XX9XX".into()));
}

#[test]
fn bad_login_is_session_failure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(PATH).query_param("username", "n0call");
        then.status(200).body(error_xml("Username/password incorrect"));
    });

    let mut client = client(&server);
    let err = client.lookup("K0TV").unwrap_err();
    assert!(matches!(err, LookupFailure::Session(ref m) if m.contains("incorrect")));
}

#[test]
fn http_error_status_is_failure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(PATH);
        then.status(503).body("maintenance");
    });

    let mut client = client(&server).with_session_key("cached");
    let err = client.lookup("K0TV").unwrap_err();
    assert_eq!(err, LookupFailure::Http(503, "maintenance".into()));
}

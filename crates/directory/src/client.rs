//! QRZ XML directory client.
//!
//! Blocking reqwest client (no Tokio runtime required). One login per
//! process yields a session key; an expired key triggers a single re-login.

use std::time::Duration;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::auth::DirectoryCredentials;
use crate::{DirectoryLookup, DirectoryRecord, LookupFailure};

const AGENT: &str = concat!("qsogrid-", env!("CARGO_PKG_VERSION"));

/// QRZ XML API client (blocking).
pub struct QrzClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    credentials: DirectoryCredentials,
    session_key: Option<String>,
}

/// The parts of a `<QRZDatabase>` document this client reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QrzResponse {
    pub session_key: Option<String>,
    pub error: Option<String>,
    pub record: Option<DirectoryRecord>,
}

impl QrzClient {
    pub fn new(
        credentials: DirectoryCredentials,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<Self, LookupFailure> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| LookupFailure::Network(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            credentials,
            session_key: None,
        })
    }

    /// Reuse a session key obtained earlier.
    pub fn with_session_key(mut self, key: impl Into<String>) -> Self {
        self.session_key = Some(key.into());
        self
    }

    fn session_key(&mut self) -> Result<String, LookupFailure> {
        if let Some(ref key) = self.session_key {
            return Ok(key.clone());
        }

        let creds = &self.credentials;
        let body = self.get(&[
            ("username", creds.username.as_str()),
            ("password", creds.password.as_str()),
            ("agent", AGENT),
        ])?;
        let resp = parse_response(&body)?;

        match resp.session_key {
            Some(key) => {
                log::debug!("directory login ok for {}", self.credentials.username);
                self.session_key = Some(key.clone());
                Ok(key)
            }
            None => Err(LookupFailure::Session(
                resp.error.unwrap_or_else(|| "login returned no session key".into()),
            )),
        }
    }

    fn get(&self, params: &[(&str, &str)]) -> Result<String, LookupFailure> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(params)
            .send()
            .map_err(|e| LookupFailure::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LookupFailure::Http(status, body));
        }

        response.text().map_err(|e| LookupFailure::Network(e.to_string()))
    }
}

impl DirectoryLookup for QrzClient {
    fn lookup(&mut self, callsign: &str) -> Result<DirectoryRecord, LookupFailure> {
        // Directory keys use the on-air form with `/`.
        let call = callsign.replace('-', "/");

        for attempt in 0..2 {
            let key = self.session_key()?;
            let body = self.get(&[("s", key.as_str()), ("callsign", call.as_str())])?;
            let resp = parse_response(&body)?;

            if let Some(record) = resp.record {
                return Ok(record);
            }

            match resp.error {
                Some(err) if is_session_error(&err) && attempt == 0 => {
                    log::debug!("directory session expired ({err}), logging in again");
                    self.session_key = None;
                }
                Some(err) if err.starts_with("Not found") => {
                    return Err(LookupFailure::NotFound(call));
                }
                Some(err) => return Err(LookupFailure::Session(err)),
                None => {
                    return Err(LookupFailure::Parse(
                        "response carried neither a callsign nor an error".into(),
                    ))
                }
            }
        }

        Err(LookupFailure::Session("session expired after re-login".into()))
    }
}

fn is_session_error(err: &str) -> bool {
    err.contains("Session Timeout") || err.contains("Invalid session key")
}

#[derive(Clone, Copy)]
enum Section {
    Callsign,
    Session,
}

/// Parse a `<QRZDatabase>` document.
pub fn parse_response(xml: &str) -> Result<QrzResponse, LookupFailure> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut saw_root = false;
    let mut section: Option<Section> = None;
    let mut field: Option<String> = None;
    let mut record: Option<DirectoryRecord> = None;
    let mut resp = QrzResponse::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match name.as_str() {
                    "QRZDatabase" => saw_root = true,
                    "Callsign" => {
                        section = Some(Section::Callsign);
                        record = Some(DirectoryRecord::default());
                    }
                    "Session" => section = Some(Section::Session),
                    _ => field = Some(name),
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = String::from_utf8_lossy(e.as_ref()).to_string();
                match (section, field.as_deref(), record.as_mut()) {
                    (Some(Section::Callsign), Some("call"), Some(r)) => r.callsign.push_str(&text),
                    (Some(Section::Callsign), Some("lat"), Some(r)) => append(&mut r.lat, &text),
                    (Some(Section::Callsign), Some("lon"), Some(r)) => append(&mut r.lon, &text),
                    (Some(Section::Callsign), Some("grid"), Some(r)) => append(&mut r.grid, &text),
                    (Some(Section::Session), Some("Key"), _) => append(&mut resp.session_key, &text),
                    (Some(Section::Session), Some("Error"), _) => append(&mut resp.error, &text),
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"Callsign" | b"Session" => section = None,
                _ => field = None,
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(LookupFailure::Parse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(LookupFailure::Parse("missing <QRZDatabase> root".into()));
    }

    resp.record = record;
    Ok(resp)
}

fn append(slot: &mut Option<String>, text: &str) {
    slot.get_or_insert_with(String::new).push_str(text);
}

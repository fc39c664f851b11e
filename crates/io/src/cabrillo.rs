//! Cabrillo contest logs (SEQP submissions).
//!
//! A log directory holds one `*.log` per station, with portable calls
//! (`/P`, `/7`) usually filed one level down. Exchange fields after the
//! date/time are not positional in practice, so each token is classified by
//! shape and dropped into the next compatible slot of
//! `call₀ rst₀ grid₀ call₁ rst₁ grid₁`.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use qsogrid_core::{CallSign, ContactRecord, SourceTag, StationReport};

use crate::error::IngestError;
use crate::text::read_file_as_utf8;

/// Band token (`20m`) to the band's lower edge in kHz.
const BAND_EDGES_KHZ: &[(u32, f64)] = &[
    (160, 1800.0),
    (80, 3500.0),
    (60, 5330.5),
    (40, 7000.0),
    (30, 10100.0),
    (20, 14000.0),
    (17, 18068.0),
    (15, 21000.0),
    (12, 24890.0),
    (10, 28000.0),
    (6, 50000.0),
    (2, 144000.0),
];

const QSO_TIMESTAMP: &str = "%Y-%m-%d %H%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Call,
    Report,
    Grid,
}

const SLOTS: [FieldKind; 6] = [
    FieldKind::Call,
    FieldKind::Report,
    FieldKind::Grid,
    FieldKind::Call,
    FieldKind::Report,
    FieldKind::Grid,
];

/// `*.log` files in `dir` and its immediate subdirectories, sorted.
pub fn log_files(dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let read_err = |source| IngestError::Read {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    let mut subdirs = Vec::new();

    for entry in fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if is_log_file(&path) {
            files.push(path);
        }
    }

    for sub in subdirs {
        match fs::read_dir(&sub) {
            Ok(entries) => files.extend(
                entries
                    .filter_map(|e| e.ok().map(|e| e.path()))
                    .filter(|p| p.is_file() && is_log_file(p)),
            ),
            Err(e) => log::warn!("skipping {}: {}", sub.display(), e),
        }
    }

    files.sort();
    Ok(files)
}

fn is_log_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("log"))
}

/// Read every log under `dir`. Unreadable logs are reported and skipped.
pub fn read_log_dir(dir: &Path) -> Result<Vec<ContactRecord>, IngestError> {
    let mut records = Vec::new();
    let mut failed = 0usize;
    let files = log_files(dir)?;

    for path in &files {
        match read_log(path) {
            Ok(recs) => {
                log::debug!("processed {} ({} QSOs)", path.display(), recs.len());
                records.extend(recs);
            }
            Err(e) => {
                log::error!("{e}");
                failed += 1;
            }
        }
    }

    log::info!(
        "{}: {} QSOs from {} logs ({} skipped)",
        dir.display(),
        records.len(),
        files.len() - failed,
        failed
    );
    Ok(records)
}

pub fn read_log(path: &Path) -> Result<Vec<ContactRecord>, IngestError> {
    let text = read_file_as_utf8(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(parse_log(&text, &name))
}

/// Parse one Cabrillo log. Exact duplicate QSO lines are kept once.
pub fn parse_log(text: &str, log_file: &str) -> Vec<ContactRecord> {
    let text = clean_text(text);
    let single_op = is_single_op(&text);

    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for line in text.lines() {
        let Some((tag, payload)) = line.split_once(':') else {
            continue;
        };
        if !tag.trim().eq_ignore_ascii_case("QSO") {
            continue;
        }

        let tokens: Vec<&str> = payload.split_whitespace().collect();
        if !seen.insert(tokens.join(" ")) {
            continue;
        }

        match parse_qso(&tokens, log_file, single_op) {
            Some(rec) => records.push(rec),
            None => log::debug!("{log_file}: unusable QSO line: {}", line.trim()),
        }
    }

    records
}

/// Strip the stray bytes hand-edited and RTF-exported logs carry.
fn clean_text(text: &str) -> String {
    text.replace(['\u{a0}', '\u{ff}'], " ")
        .replace("\\'a0", " ")
        .replace('\\', " ")
        .replace('\u{ad}', "-")
}

fn is_single_op(text: &str) -> bool {
    for line in text.lines() {
        let Some((tag, value)) = line.split_once(':') else {
            continue;
        };
        let tag = tag.trim().to_ascii_uppercase();

        if tag == "CATEGORY-OPERATOR" && value.to_ascii_uppercase().contains("MULTI") {
            return false;
        }
        if tag == "OPERATORS" {
            let operators = value
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|s| !s.is_empty())
                .count();
            if operators > 1 {
                return false;
            }
        }
    }
    true
}

/// Exchange tokens fill `SLOTS` left to right. A typed token takes the next
/// slot of its kind and leaves any skipped slots empty. A token of no kind
/// (`-`, `K3`, `/`) is ignored and consumes no slot, so the remote call
/// after it still lands.
fn parse_qso(tokens: &[&str], log_file: &str, single_op: bool) -> Option<ContactRecord> {
    if tokens.len() < 4 {
        return None;
    }

    let frequency_mhz = frequency_khz(tokens[0]).map(|khz| khz / 1000.0);
    let mode = tokens[1].to_ascii_uppercase();

    let stamp = format!("{} {}", tokens[2], tokens[3]);
    let timestamp = NaiveDateTime::parse_from_str(&stamp, QSO_TIMESTAMP).ok();
    if timestamp.is_none() {
        log::warn!("{log_file}: cannot parse QSO date '{stamp}'");
    }

    let mut slots: [Option<String>; 6] = Default::default();
    let mut cursor = 0;
    for raw in &tokens[4..] {
        let value = strip_db(raw);
        let Some(kind) = classify(value) else {
            continue;
        };
        while cursor < SLOTS.len() {
            let slot = cursor;
            cursor += 1;
            if SLOTS[slot] == kind {
                slots[slot] = Some(value.to_ascii_uppercase());
                break;
            }
        }
    }

    let [call_0, rst_0, grid_0, call_1, rst_1, grid_1] = slots;
    let local = CallSign::parse(call_0.as_deref()?)?;
    let remote = CallSign::parse(call_1.as_deref()?)?;

    Some(ContactRecord {
        timestamp,
        frequency_mhz,
        mode,
        stations: [
            StationReport::new(local, grid_0, rst_0),
            StationReport::new(remote, grid_1, rst_1),
        ],
        source: SourceTag::SeqpLogs,
        log_file: Some(log_file.to_string()),
        single_op: Some(single_op),
    })
}

/// kHz from a frequency field: kHz, MHz (below 1000), or a band token.
fn frequency_khz(token: &str) -> Option<f64> {
    let lower = token.to_ascii_lowercase();
    if let Some(band) = lower.strip_suffix('m') {
        let band: u32 = band.parse().ok()?;
        return BAND_EDGES_KHZ
            .iter()
            .find(|(b, _)| *b == band)
            .map(|(_, khz)| *khz);
    }

    let value: f64 = lower.parse().ok()?;
    Some(if value < 1000.0 { value * 1000.0 } else { value })
}

/// `-12dB` → `-12`. Anything else unchanged.
fn strip_db(token: &str) -> &str {
    let n = token.len();
    if n > 2 && token.is_char_boundary(n - 2) && token[n - 2..].eq_ignore_ascii_case("db") {
        let number = &token[..n - 2];
        if number.parse::<f64>().is_ok() {
            return number;
        }
    }
    token
}

fn classify(field: &str) -> Option<FieldKind> {
    let chars: Vec<char> = field.chars().collect();

    if chars.len() >= 4
        && chars[0].is_alphabetic()
        && chars[1].is_alphabetic()
        && chars[2].is_ascii_digit()
        && chars[3].is_ascii_digit()
    {
        return Some(FieldKind::Grid);
    }
    if field.parse::<f64>().is_ok() {
        return Some(FieldKind::Report);
    }
    if chars.len() >= 3 {
        return Some(FieldKind::Call);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsogrid_core::StationRole;

    const LOG: &str = "\
START-OF-LOG: 2.0
CALLSIGN: NJ0P
CONTEST: ECLIPSE-QSO
CATEGORY-OPERATOR: SINGLE-OP
OPERATORS: NJ0P
QSO: 14038 CW 2017-08-21 1555 NJ0P          599  EM29FX  K3JT          569  EM99XO
QSO: 14035 CW 2017-08-21 1558 NJ0P          599  EM29FX  W6RW          599  DM22QR
QSO: 14035 CW 2017-08-21 1558 NJ0P          599  EM29FX  W6RW          599  DM22QR
QSO: 7.031 CW 2017-08-21 1645 NJ0P          599  AA3B          599  FN20EI
QSO: 20m   PH 2017-08-21 1702 NJ0P          59   K3WW/P        57   fn20ij
QSO: 14029 CW 2017-08-21 1803 NJ0P          -12dB W7IY         559
QSO: 14019 CW 2017-08-21 ???? NJ0P          599  K1EO          599  FN44NS
QSO: 14019 CW
END-OF-LOG:
";

    #[test]
    fn parses_qso_lines() {
        let recs = parse_log(LOG, "nj0p.log");
        // One duplicate and one truncated line dropped.
        assert_eq!(recs.len(), 6);

        let r = &recs[0];
        assert_eq!(r.source, SourceTag::SeqpLogs);
        assert_eq!(r.mode, "CW");
        assert!((r.frequency_mhz.unwrap() - 14.038).abs() < 1e-9);
        assert_eq!(r.timestamp.unwrap().to_string(), "2017-08-21 15:55:00");
        assert_eq!(r.log_file.as_deref(), Some("nj0p.log"));
        assert_eq!(r.single_op, Some(true));

        let local = r.station(StationRole::Local);
        assert_eq!(local.callsign.as_str(), "NJ0P");
        assert_eq!(local.signal_report.as_deref(), Some("599"));
        assert_eq!(local.locator.as_deref(), Some("EM29FX"));
        let remote = r.station(StationRole::Remote);
        assert_eq!(remote.callsign.as_str(), "K3JT");
        assert_eq!(remote.locator.as_deref(), Some("EM99XO"));
    }

    #[test]
    fn missing_sent_grid_shifts_nothing() {
        let recs = parse_log(LOG, "nj0p.log");
        let r = &recs[2];
        assert!((r.frequency_mhz.unwrap() - 7.031).abs() < 1e-9);
        assert!(r.station(StationRole::Local).locator.is_none());
        assert_eq!(r.station(StationRole::Remote).callsign.as_str(), "AA3B");
        assert_eq!(r.station(StationRole::Remote).signal_report.as_deref(), Some("599"));
        assert_eq!(r.station(StationRole::Remote).locator.as_deref(), Some("FN20EI"));
    }

    #[test]
    fn band_token_portable_call_and_db_report() {
        let recs = parse_log(LOG, "nj0p.log");

        let r = &recs[3];
        assert!((r.frequency_mhz.unwrap() - 14.0).abs() < 1e-9);
        assert_eq!(r.mode, "PH");
        assert_eq!(r.station(StationRole::Remote).callsign.as_str(), "K3WW-P");
        assert_eq!(r.station(StationRole::Remote).locator.as_deref(), Some("FN20IJ"));

        let r = &recs[4];
        assert_eq!(r.station(StationRole::Local).signal_report.as_deref(), Some("-12"));
        assert!(r.station(StationRole::Remote).locator.is_none());
    }

    #[test]
    fn shapeless_token_consumes_no_slot() {
        let log = "QSO: 14038 CW 2017-08-21 1555 NJ0P 599 EM29FX -- K3JT 569 EM99XO\n";
        let recs = parse_log(log, "x.log");
        assert_eq!(recs.len(), 1);

        let local = recs[0].station(StationRole::Local);
        assert_eq!(local.locator.as_deref(), Some("EM29FX"));
        let remote = recs[0].station(StationRole::Remote);
        assert_eq!(remote.callsign.as_str(), "K3JT");
        assert_eq!(remote.signal_report.as_deref(), Some("569"));
        assert_eq!(remote.locator.as_deref(), Some("EM99XO"));
    }

    #[test]
    fn bad_date_keeps_record() {
        let recs = parse_log(LOG, "nj0p.log");
        assert!(recs[5].timestamp.is_none());
        assert_eq!(recs[5].station(StationRole::Remote).callsign.as_str(), "K1EO");
    }

    #[test]
    fn multi_op_detection() {
        assert!(!is_single_op("CATEGORY-OPERATOR: MULTI-OP\n"));
        assert!(!is_single_op("OPERATORS: K1ABC W2DEF\n"));
        assert!(!is_single_op("OPERATORS: K1ABC,W2DEF\n"));
        assert!(is_single_op("CATEGORY-OPERATOR: SINGLE-OP\nOPERATORS: K1ABC\n"));

        let log = "CATEGORY-OPERATOR: MULTI-ONE\nQSO: 14038 CW 2017-08-21 1555 W1AW 599 FN31 K3JT 569 EM99\n";
        assert_eq!(parse_log(log, "w1aw.log")[0].single_op, Some(false));
    }

    #[test]
    fn stray_bytes_cleaned() {
        let log = "QSO: 14038 CW 2017-08-21 1555 NJ0P\u{a0}599 EM29FX K3JT 569 EM99XO\n";
        let recs = parse_log(log, "x.log");
        assert_eq!(recs[0].station(StationRole::Local).signal_report.as_deref(), Some("599"));
    }

    #[test]
    fn frequency_forms() {
        assert_eq!(frequency_khz("14038"), Some(14038.0));
        assert_eq!(frequency_khz("7.031"), Some(7031.0));
        assert_eq!(frequency_khz("40M"), Some(7000.0));
        assert_eq!(frequency_khz("70cm"), None);
        assert_eq!(frequency_khz("abc"), None);
    }

    #[test]
    fn field_shapes() {
        assert_eq!(classify("EM29"), Some(FieldKind::Grid));
        assert_eq!(classify("599"), Some(FieldKind::Report));
        assert_eq!(classify("-12"), Some(FieldKind::Report));
        assert_eq!(classify("AA3B"), Some(FieldKind::Call));
        assert_eq!(classify("K3"), None);
    }

    #[test]
    fn log_dir_descends_one_level() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("nj0p.log"), LOG).unwrap();
        fs::create_dir(dir.path().join("K3WW")).unwrap();
        fs::write(
            dir.path().join("K3WW/k3ww-p.log"),
            "QSO: 14026 CW 2017-08-21 1702 K3WW/P 579 FN20IJ NJ0P 599 EM29FX\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "not a log").unwrap();

        let files = log_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);

        let recs = read_log_dir(dir.path()).unwrap();
        assert_eq!(recs.len(), 7);
        assert!(recs.iter().any(|r| r.log_file.as_deref() == Some("k3ww-p.log")));
    }

    #[test]
    fn windows_1252_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = b"SOAPBOX: Caf\xe9 QTH\n".to_vec();
        bytes.extend_from_slice(b"QSO: 14038 CW 2017-08-21 1555 NJ0P 599 EM29FX K3JT 569 EM99XO\n");
        let path = dir.path().join("cafe.log");
        fs::write(&path, bytes).unwrap();
        assert_eq!(read_log(&path).unwrap().len(), 1);
    }
}

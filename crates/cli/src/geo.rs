//! `qsogrid geolocate | check-grid | login`, plus geolocation cache wiring
//! shared with the pass commands.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use serde::Serialize;

use qsogrid_config::Settings;
use qsogrid_core::{is_valid, CallSign};
use qsogrid_directory::{
    load_credentials, save_credentials, DirectoryCredentials, DirectoryLookup, DisabledDirectory,
    QrzClient,
};
use qsogrid_geocache::{GeoCache, GeoLookup};

use crate::exit_codes::EXIT_INVALID_GRID;
use crate::{CacheArgs, CliError};

pub fn load_settings() -> Result<Settings, CliError> {
    Ok(Settings::load()?)
}

/// Open the cache named by `--cache` or the settings, backed by the QRZ
/// client when the directory is enabled and credentials exist.
///
/// Missing credentials fail only when `require_credentials` is set;
/// otherwise lookups are disabled for the run with a warning.
pub fn open_geocache(
    args: &CacheArgs,
    settings: &Settings,
    require_credentials: bool,
) -> Result<GeoCache, CliError> {
    let path = args.cache.clone().unwrap_or_else(|| settings.cache.path.clone());
    let directory = directory_for(args, settings, require_credentials)?;
    log::debug!("location cache: {}", path.display());
    Ok(GeoCache::open(&path, directory)?)
}

fn directory_for(
    args: &CacheArgs,
    settings: &Settings,
    require_credentials: bool,
) -> Result<Box<dyn DirectoryLookup>, CliError> {
    let dir = &settings.directory;
    if args.no_directory || !dir.enabled {
        return Ok(Box::new(DisabledDirectory));
    }

    let Some(credentials) = load_credentials(dir.username.as_deref()) else {
        if require_credentials {
            return Err(CliError::no_credentials());
        }
        log::warn!("no directory credentials; directory lookups disabled for this run");
        return Ok(Box::new(DisabledDirectory));
    };

    let client = QrzClient::new(credentials, &dir.endpoint, Duration::from_secs(dir.timeout_secs))
        .map_err(|e| CliError::runtime(format!("cannot create directory client: {e}")))?;
    Ok(Box::new(client))
}

// ============================================================================
// geolocate
// ============================================================================

#[derive(Serialize)]
struct GeolocateRow {
    callsign: CallSign,
    #[serde(flatten)]
    lookup: GeoLookup,
}

pub fn cmd_geolocate(calls: Vec<String>, json_output: bool, cache: CacheArgs) -> Result<(), CliError> {
    let calls: Vec<CallSign> = calls
        .iter()
        .map(|c| CallSign::parse(c).ok_or_else(|| CliError::usage(format!("invalid callsign: {c:?}"))))
        .collect::<Result<_, _>>()?;

    let settings = load_settings()?;
    let mut geocache = open_geocache(&cache, &settings, true)?;

    let mut rows = Vec::with_capacity(calls.len());
    for callsign in calls {
        let lookup = geocache.resolve(&callsign)?;
        rows.push(GeolocateRow { callsign, lookup });
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let write_err = |e: io::Error| CliError::runtime(e.to_string());

    if json_output {
        let json = serde_json::to_string_pretty(&rows)
            .map_err(|e| CliError::runtime(format!("JSON serialization error: {e}")))?;
        writeln!(out, "{json}").map_err(write_err)?;
        return Ok(());
    }

    for row in &rows {
        match &row.lookup {
            GeoLookup::Found { coordinates, tier } => writeln!(
                out,
                "{:<12} {:>9.4} {:>10.4}  {:?}",
                row.callsign.as_str(),
                coordinates.lat,
                coordinates.lon,
                tier
            ),
            GeoLookup::Failed { failure } => {
                writeln!(out, "{:<12} {:>9} {:>10}  {failure}", row.callsign.as_str(), "-", "-")
            }
        }
        .map_err(write_err)?;
    }
    Ok(())
}

// ============================================================================
// check-grid
// ============================================================================

pub fn cmd_check_grid(locators: Vec<String>, quiet: bool) -> Result<(), CliError> {
    let mut invalid = 0usize;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for locator in &locators {
        let ok = is_valid(locator);
        if !ok {
            invalid += 1;
        }
        if !quiet {
            writeln!(out, "{locator}\t{}", if ok { "valid" } else { "invalid" })
                .map_err(|e| CliError::runtime(e.to_string()))?;
        }
    }

    if invalid > 0 {
        let message = if quiet {
            String::new()
        } else {
            format!("{invalid} of {} locators invalid", locators.len())
        };
        return Err(CliError::new(EXIT_INVALID_GRID, message));
    }
    Ok(())
}

// ============================================================================
// login
// ============================================================================

pub fn cmd_login(username: String) -> Result<(), CliError> {
    let username = username.trim().to_string();
    if username.is_empty() {
        return Err(CliError::usage("username must not be empty"));
    }

    let mut password = String::new();
    io::stdin()
        .lock()
        .read_line(&mut password)
        .map_err(|e| CliError::usage(format!("cannot read password from stdin: {e}")))?;
    let password = password.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(CliError::usage("empty password on stdin")
            .with_hint("echo \"$QRZ_PASSWORD\" | qsogrid login --username CALL"));
    }

    let path = save_credentials(&DirectoryCredentials::new(username.as_str(), password))
        .map_err(|e| CliError::runtime(e.to_string()))?;
    eprintln!("saved credentials for {username} to {}", path.display());
    Ok(())
}

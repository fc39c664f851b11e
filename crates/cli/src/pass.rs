//! `qsogrid run | resolve | qths`: config-driven resolution passes.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use qsogrid_core::CallSign;
use qsogrid_io::{cabrillo, export, pskreporter, rbn, submissions, wspr};
use qsogrid_recon::{
    grid_stats, resolve_path, EvidenceIndex, QthResolver, ReconConfig, ReconInput, ReconResult,
    ResolvedQth,
};

use crate::geo::{load_settings, open_geocache};
use crate::{CacheArgs, CliError};

/// Read and validate a pass config; returns it with the directory its
/// relative paths are based on.
fn load_config(path: &Path) -> Result<(ReconConfig, PathBuf), CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::usage(format!("cannot read config {}: {e}", path.display())))?;
    let config = ReconConfig::from_toml(&text)?;
    let base = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    Ok((config, base))
}

/// Load every configured source plus the submissions file.
fn load_input(config: &ReconConfig, base: &Path) -> Result<ReconInput, CliError> {
    let sources = &config.sources;
    let mut input = ReconInput::default();

    if let Some(ref dir) = sources.seqp_logs {
        input.records.extend(cabrillo::read_log_dir(&resolve_path(base, dir))?);
    }
    if let Some(ref file) = sources.rbn {
        input.records.extend(rbn::read_rbn(&resolve_path(base, file))?);
    }
    if let Some(ref file) = sources.wspr {
        input.records.extend(wspr::read_wspr(&resolve_path(base, file))?);
    }
    if let Some(ref file) = sources.pskreporter {
        input.records.extend(pskreporter::read_pskreporter(&resolve_path(base, file))?);
    }
    if let Some(ref subs) = config.submissions {
        input.submissions = submissions::read_submissions(&resolve_path(base, &subs.file))?;
    }

    log::info!(
        "{}: loaded {} records, {} submissions",
        config.name,
        input.records.len(),
        input.submissions.len()
    );
    Ok(input)
}

fn to_json(value: &impl serde::Serialize) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::runtime(format!("JSON serialization error: {e}")))
}

// ============================================================================
// run
// ============================================================================

pub fn cmd_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    cache: CacheArgs,
) -> Result<(), CliError> {
    let (config, base) = load_config(&config_path)?;
    let input = load_input(&config, &base)?;

    let mut geocache = if config.directory_fallback {
        Some(open_geocache(&cache, &load_settings()?, false)?)
    } else {
        None
    };
    let result = qsogrid_recon::run(&config, &input, geocache.as_mut())?;

    write_outputs(&config, &base, output_file, &result)?;

    if json_output {
        println!("{}", to_json(&result)?);
    }

    // Human summary to stderr
    let s = &result.summary;
    eprintln!(
        "{}: {} records, {} callsigns, {}/{} stations resolved, {} discrepancies",
        result.meta.config_name,
        s.records,
        s.callsigns,
        s.stations_resolved,
        s.stations_resolved + s.stations_unresolved,
        s.discrepancies,
    );
    if !s.by_source.is_empty() {
        let parts: Vec<String> = s.by_source.iter().map(|(k, v)| format!("{k}={v}")).collect();
        eprintln!("by source: {}", parts.join(", "));
    }
    if s.evidence_rejected > 0 {
        eprintln!("{} malformed locators ignored", s.evidence_rejected);
    }
    if let Some(cache) = geocache {
        let stats = cache.stats();
        eprintln!(
            "location cache: {} memory, {} stored, {} directory hits, {} lookup failures",
            stats.memory_hits, stats.store_hits, stats.directory_hits, stats.directory_failures,
        );
    }

    Ok(())
}

fn write_outputs(
    config: &ReconConfig,
    base: &Path,
    json_override: Option<PathBuf>,
    result: &ReconResult,
) -> Result<(), CliError> {
    let out = &config.output;
    if let Some(ref p) = out.records {
        export::export_records(&result.records, &resolve_path(base, p))?;
    }
    if let Some(ref p) = out.discrepancies {
        export::export_discrepancies(&result.discrepancies, &resolve_path(base, p))?;
    }
    if let Some(ref p) = out.qths {
        export::export_qths(&result.qths, &resolve_path(base, p))?;
    }

    let json_path = json_override.or_else(|| out.json.as_ref().map(|p| resolve_path(base, p)));
    if let Some(path) = json_path {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| CliError::runtime(format!("cannot create {}: {e}", parent.display())))?;
        }
        std::fs::write(&path, to_json(result)?)
            .map_err(|e| CliError::runtime(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

// ============================================================================
// resolve
// ============================================================================

pub fn cmd_resolve(
    config_path: PathBuf,
    calls: Vec<String>,
    json_output: bool,
    cache: CacheArgs,
) -> Result<(), CliError> {
    let calls = parse_calls(&calls)?;
    let (config, base) = load_config(&config_path)?;
    let input = load_input(&config, &base)?;
    let index = EvidenceIndex::build(&input.records, &input.submissions);

    let mut geocache = if config.directory_fallback {
        Some(open_geocache(&cache, &load_settings()?, false)?)
    } else {
        None
    };
    let mut resolver = QthResolver::new(&index, geocache.as_mut());

    let mut resolved = Vec::with_capacity(calls.len());
    for call in &calls {
        resolved.push(resolver.find_qth(call)?);
    }

    if json_output {
        println!("{}", to_json(&resolved)?);
    } else {
        print_table(&resolved)?;
    }
    Ok(())
}

fn parse_calls(raw: &[String]) -> Result<Vec<CallSign>, CliError> {
    raw.iter()
        .map(|c| CallSign::parse(c).ok_or_else(|| CliError::usage(format!("invalid callsign: {c:?}"))))
        .collect()
}

fn print_table(qths: &[ResolvedQth]) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for q in qths {
        let locator = q.locator.as_ref().map(|l| l.as_str()).unwrap_or("-");
        let source = q.source.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
        let count = q.count.map(|c| c.to_string()).unwrap_or_else(|| "-".into());
        let line = match q.lookup_failure {
            Some(ref failure) => format!("{:<12} {:<8} {:<10} {:>5}  ({failure})", q.callsign.as_str(), locator, source, count),
            None => format!("{:<12} {:<8} {:<10} {:>5}", q.callsign.as_str(), locator, source, count),
        };
        writeln!(out, "{}", line.trim_end()).map_err(|e| CliError::runtime(e.to_string()))?;
    }
    Ok(())
}

// ============================================================================
// qths
// ============================================================================

/// QTH table over every callsign with evidence. Every such callsign
/// resolves from evidence, so no cache is opened.
pub fn cmd_qths(
    config_path: PathBuf,
    stats: bool,
    json_output: bool,
    output_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let (config, base) = load_config(&config_path)?;
    let input = load_input(&config, &base)?;
    let index = EvidenceIndex::build(&input.records, &input.submissions);
    let qths = QthResolver::new(&index, None).resolve_all()?;

    let mut buf: Vec<u8> = Vec::new();
    if stats {
        let rows = grid_stats(&qths);
        if json_output {
            writeln!(buf, "{}", to_json(&rows)?).map_err(|e| CliError::runtime(e.to_string()))?;
        } else {
            let mut lines = vec![format!("{:<12} {:>6} {:>6} {:>7} {:>6}", "source", "4-char", "6-char", "no-grid", "total")];
            lines.extend(rows.iter().map(|r| {
                format!("{:<12} {:>6} {:>6} {:>7} {:>6}", r.source, r.four_char, r.six_char, r.no_grid, r.total)
            }));
            writeln!(buf, "{}", lines.join("\n")).map_err(|e| CliError::runtime(e.to_string()))?;
        }
    } else if json_output {
        writeln!(buf, "{}", to_json(&qths)?).map_err(|e| CliError::runtime(e.to_string()))?;
    } else {
        export::write_qths_csv(&qths, &mut buf).map_err(CliError::runtime)?;
    }

    match output_file {
        Some(path) => {
            std::fs::write(&path, &buf)
                .map_err(|e| CliError::runtime(format!("cannot write {}: {e}", path.display())))?;
            eprintln!("wrote {}", path.display());
        }
        None => io::stdout()
            .write_all(&buf)
            .map_err(|e| CliError::runtime(e.to_string()))?,
    }
    Ok(())
}

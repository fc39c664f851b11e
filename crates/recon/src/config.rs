use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// One resolution pass, read from a `*.qsogrid.toml` file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    pub name: String,
    pub sources: SourcesConfig,
    #[serde(default)]
    pub submissions: Option<SubmissionsConfig>,
    /// Consult the geolocation cache for callsigns with no evidence.
    #[serde(default = "default_true")]
    pub directory_fallback: bool,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// One optional path per ingestion source.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourcesConfig {
    /// Directory of Cabrillo `*.log` files.
    #[serde(default)]
    pub seqp_logs: Option<String>,
    #[serde(default)]
    pub rbn: Option<String>,
    #[serde(default)]
    pub wspr: Option<String>,
    #[serde(default)]
    pub pskreporter: Option<String>,
}

impl SourcesConfig {
    fn entries(&self) -> [(&'static str, Option<&String>); 4] {
        [
            ("seqp_logs", self.seqp_logs.as_ref()),
            ("rbn", self.rbn.as_ref()),
            ("wspr", self.wspr.as_ref()),
            ("pskreporter", self.pskreporter.as_ref()),
        ]
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmissionsConfig {
    pub file: String,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default)]
    pub records: Option<String>,
    #[serde(default)]
    pub discrepancies: Option<String>,
    #[serde(default)]
    pub qths: Option<String>,
    #[serde(default)]
    pub json: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }

        let sources = self.sources.entries();
        if sources.iter().all(|(_, path)| path.is_none()) {
            return Err(ReconError::ConfigValidation(
                "at least one of sources.seqp_logs, sources.rbn, sources.wspr, sources.pskreporter is required".into(),
            ));
        }

        let mut paths: Vec<(String, Option<&String>)> = sources
            .iter()
            .map(|(key, path)| (format!("sources.{key}"), *path))
            .collect();
        paths.push((
            "submissions.file".into(),
            self.submissions.as_ref().map(|s| &s.file),
        ));
        paths.extend([
            ("output.records".into(), self.output.records.as_ref()),
            ("output.discrepancies".into(), self.output.discrepancies.as_ref()),
            ("output.qths".into(), self.output.qths.as_ref()),
            ("output.json".into(), self.output.json.as_ref()),
        ]);

        for (key, path) in paths {
            if path.is_some_and(|p| p.trim().is_empty()) {
                return Err(ReconError::ConfigValidation(format!("{key} must not be empty")));
            }
        }

        Ok(())
    }
}

/// Paths in a config are relative to the directory holding it.
pub fn resolve_path(base: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

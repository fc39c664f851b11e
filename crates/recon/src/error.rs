use qsogrid_geocache::CacheError;

#[derive(Debug, thiserror::Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (no sources, empty path, ...).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Persistent location cache failure. Aborts the pass.
    #[error(transparent)]
    Store(#[from] CacheError),
}

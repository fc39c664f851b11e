//! Directory credential storage.
//!
//! Reads/writes ~/.config/qsogrid/qrz.json (0600 on Unix). Environment
//! variables win over the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const USERNAME_ENV: &str = "QSOGRID_QRZ_USERNAME";
pub const PASSWORD_ENV: &str = "QSOGRID_QRZ_PASSWORD";

/// Login for the directory service.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryCredentials {
    pub username: String,
    pub password: String,
}

impl DirectoryCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for DirectoryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Returns the path to the credentials file.
pub fn credentials_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|c| c.join("qsogrid/qrz.json"))
}

/// Resolve credentials: env > saved file.
///
/// `username_hint` (from settings) fills in a missing username when only
/// the password is supplied through the environment.
pub fn load_credentials(username_hint: Option<&str>) -> Option<DirectoryCredentials> {
    let env_user = std::env::var(USERNAME_ENV).ok().filter(|s| !s.is_empty());
    let env_pass = std::env::var(PASSWORD_ENV).ok().filter(|s| !s.is_empty());

    if let Some(password) = env_pass {
        let username = env_user.or_else(|| username_hint.map(String::from))?;
        return Some(DirectoryCredentials { username, password });
    }

    load_credentials_from(&credentials_file_path()?)
}

/// Load saved credentials. Returns None if absent or unreadable.
pub fn load_credentials_from(path: &Path) -> Option<DirectoryCredentials> {
    let contents = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&contents).ok()
}

/// Failure to persist credentials.
#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("no config directory for this user")]
    NoConfigDir,
    #[error("cannot encode credentials: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Save to [`credentials_file_path`]; returns the path written.
pub fn save_credentials(creds: &DirectoryCredentials) -> Result<PathBuf, CredentialsError> {
    let path = credentials_file_path().ok_or(CredentialsError::NoConfigDir)?;
    save_credentials_to(creds, &path)?;
    Ok(path)
}

pub fn save_credentials_to(creds: &DirectoryCredentials, path: &Path) -> Result<(), CredentialsError> {
    let json = serde_json::to_vec_pretty(creds)?;
    write_private(path, &json).map_err(|source| CredentialsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Owner-only file, parent directories created as needed. An existing file
/// is truncated and its mode tightened.
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qsogrid/qrz.json");
        let creds = DirectoryCredentials::new("n0call", "hunter2");
        save_credentials_to(&creds, &path).unwrap();

        let loaded = load_credentials_from(&path).unwrap();
        assert_eq!(loaded, creds);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn overwrite_tightens_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qrz.json");
        std::fs::write(&path, "{\"username\":\"old\",\"password\":\"a-much-longer-old-password\"}").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        }

        let creds = DirectoryCredentials::new("k3jt", "pw");
        save_credentials_to(&creds, &path).unwrap();
        assert_eq!(load_credentials_from(&path).unwrap(), creds);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn unwritable_path_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let target = blocker.join("qrz.json");

        let err = save_credentials_to(&DirectoryCredentials::new("k3jt", "pw"), &target).unwrap_err();
        assert!(matches!(err, CredentialsError::Io { ref path, .. } if *path == target));
        assert!(err.to_string().contains("qrz.json"));
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_credentials_from(&dir.path().join("nope.json")).is_none());
    }

    #[test]
    fn debug_redacts_password() {
        let creds = DirectoryCredentials::new("n0call", "hunter2");
        let shown = format!("{creds:?}");
        assert!(shown.contains("n0call"));
        assert!(!shown.contains("hunter2"));
    }
}

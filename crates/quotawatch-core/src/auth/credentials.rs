use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Environment variable that supplies the token directly
pub const ENV_OAUTH_TOKEN: &str = "ANTHROPIC_OAUTH_TOKEN";

/// Failure to obtain a usable OAuth token
#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("read credentials: {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse credentials: {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "credentials file {} must not be group/other readable (mode {mode:o}); set chmod 600",
        path.display()
    )]
    Permissions { path: PathBuf, mode: u32 },

    #[error("accessToken empty in credentials file")]
    EmptyToken,
}

/// `{"claudeAiOauth": {"accessToken": "..."}}`
#[derive(Debug, Default, Deserialize)]
struct CredentialsFile {
    #[serde(rename = "claudeAiOauth", default)]
    oauth: OauthSection,
}

#[derive(Debug, Default, Deserialize)]
struct OauthSection {
    #[serde(rename = "accessToken", default)]
    access_token: String,
}

/// Find the OAuth token: a non-blank `ANTHROPIC_OAUTH_TOKEN` wins, otherwise
/// the credentials file at `path` is read.
pub fn resolve_token(path: &Path) -> Result<String, CredentialsError> {
    if let Ok(token) = std::env::var(ENV_OAUTH_TOKEN) {
        let token = token.trim();
        if !token.is_empty() {
            debug!("Using token from {}", ENV_OAUTH_TOKEN);
            return Ok(token.to_string());
        }
    }

    let path = expand_home(path);
    let content = std::fs::read_to_string(&path).map_err(|source| CredentialsError::Read {
        path: path.clone(),
        source,
    })?;
    check_permissions(&path)?;

    let creds: CredentialsFile =
        serde_json::from_str(&content).map_err(|source| CredentialsError::Parse {
            path: path.clone(),
            source,
        })?;

    let token = creds.oauth.access_token.trim();
    if token.is_empty() {
        return Err(CredentialsError::EmptyToken);
    }
    debug!("Using token from {:?}", path);
    Ok(token.to_string())
}

/// Replace a leading `~` with the home directory when it is known
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(unix)]
fn check_permissions(path: &Path) -> Result<(), CredentialsError> {
    use std::os::unix::fs::PermissionsExt;

    // Unreadable metadata is left to the read that already succeeded
    let Ok(meta) = std::fs::metadata(path) else {
        return Ok(());
    };
    let mode = meta.permissions().mode() & 0o777;
    if mode & 0o077 != 0 {
        return Err(CredentialsError::Permissions {
            path: path.to_path_buf(),
            mode,
        });
    }
    Ok(())
}

#[cfg(not(unix))]
fn check_permissions(_path: &Path) -> Result<(), CredentialsError> {
    Ok(())
}

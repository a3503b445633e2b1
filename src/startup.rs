//! Startup resolution: settings precedence, validation and token lookup.
//!
//! Everything here runs before the terminal is taken over and before any
//! fetch is attempted, so failures can be reported plainly on stderr.

use thiserror::Error;

use quotawatch_core::auth::{resolve_token, CredentialsError};
use quotawatch_core::config::{Config, ConfigError, Settings};
use quotawatch_core::usage::DEFAULT_BETA_HEADER;

/// Fatal startup failure; the process exits with status 1
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("config error: {0:#}")]
    Load(anyhow::Error),

    #[error("config error: {0}")]
    Invalid(#[from] ConfigError),

    #[error("token error: {0}")]
    Token(#[from] CredentialsError),
}

/// Resolved inputs for the dashboard
#[derive(Debug)]
pub struct Startup {
    pub settings: Settings,
    pub token: String,
    /// Non-fatal notices to print before the UI starts
    pub warnings: Vec<String>,
}

/// Resolve settings (defaults < file < env < CLI), validate them and find the
/// OAuth token.
pub fn prepare(cli: &Config) -> Result<Startup, StartupError> {
    let mut settings = Settings::load(cli.config.as_ref()).map_err(StartupError::Load)?;
    let mut warnings = settings.merge_env();
    settings.merge_cli(cli);
    settings.validate()?;

    let token = resolve_token(&settings.credentials_path)?;

    if settings.uses_default_beta_header() {
        warnings.push(format!(
            "warning: using default anthropic-beta header {}; override with --beta-header or ANTHROPIC_BETA_HEADER if requests fail",
            DEFAULT_BETA_HEADER
        ));
    }

    Ok(Startup {
        settings,
        token,
        warnings,
    })
}

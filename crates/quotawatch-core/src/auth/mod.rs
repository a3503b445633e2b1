//! OAuth token resolution.

mod credentials;

pub use credentials::{expand_home, resolve_token, CredentialsError, ENV_OAUTH_TOKEN};

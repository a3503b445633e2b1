mod duration;
mod settings;

pub use duration::{format_duration, parse_duration};
pub use settings::{
    Config, ConfigError, Settings, UiSettings, ENV_BETA_HEADER, ENV_HTTP_TIMEOUT,
    MIN_REFRESH_INTERVAL,
};

use honeybadger_core::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("unable to get notice from API after {attempts} attempt(s) (last status: {})", fmt_status(*.last_status))]
    RetryExhausted {
        attempts: u32,
        last_status: Option<u16>,
    },

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("transport fault: {0}")]
    TransportFault(String),

    #[error("notice schema error: {0}")]
    Schema(String),
}

impl LoaderError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::TransportFault(_))
    }
}

impl From<serde_json::Error> for LoaderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Schema(err.to_string())
    }
}

fn fmt_status(status: Option<u16>) -> String {
    status.map_or_else(|| "none".to_string(), |s| s.to_string())
}

//! Reader configuration and the thread-scoped ambient slot used while a
//! notice is being bound.
//!
//! Values come from the process environment (`HONEYBADGER_*`) or from the
//! builder-style setters. The ambient slot lets nested `Deserialize` impls see
//! the active configuration without threading it through serde.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::debug;

/// Default public endpoint of the Honeybadger API.
pub const DEFAULT_API_URL: &str = "https://api.honeybadger.io";

pub const ENV_URL: &str = "HONEYBADGER_URL";
pub const ENV_API_KEY: &str = "HONEYBADGER_API_KEY";
pub const ENV_READ_API_KEY: &str = "HONEYBADGER_READ_API_KEY";
pub const ENV_ENVIRONMENT: &str = "HONEYBADGER_ENVIRONMENT";
pub const ENV_EXCLUDED_PARAMS: &str = "HONEYBADGER_EXCLUDED_PARAMS";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Read API key must be set")]
    MissingReadApiKey,
    #[error("invalid Honeybadger URL {0:?}: expected an http(s) address")]
    InvalidUrl(String),
}

/// Configuration consulted by the notice loader.
///
/// Credentials are held as [`SecretString`] and never appear in `Debug`
/// output.
pub struct ConfigContext {
    base_url: String,
    api_key: Option<SecretString>,
    read_api_key: Option<SecretString>,
    environment: Option<String>,
    excluded_params: BTreeSet<String>,
}

impl Default for ConfigContext {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            read_api_key: None,
            environment: None,
            excluded_params: BTreeSet::new(),
        }
    }
}

impl Clone for ConfigContext {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            api_key: self.api_key.as_ref().map(clone_secret),
            read_api_key: self.read_api_key.as_ref().map(clone_secret),
            environment: self.environment.clone(),
            excluded_params: self.excluded_params.clone(),
        }
    }
}

impl fmt::Debug for ConfigContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigContext")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("read_api_key", &self.read_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("environment", &self.environment)
            .field("excluded_params", &self.excluded_params)
            .finish()
    }
}

fn clone_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_owned())
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl ConfigContext {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ConfigError> {
        Self::default().with_base_url(base_url)
    }

    /// Build a configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset. `HONEYBADGER_EXCLUDED_PARAMS` is a
    /// comma-separated list.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).and_then(non_blank);

        let mut config = match get(ENV_URL) {
            Some(url) => Self::new(url)?,
            None => Self::default(),
        };
        if let Some(key) = get(ENV_API_KEY) {
            config = config.with_api_key(key);
        }
        if let Some(key) = get(ENV_READ_API_KEY) {
            config = config.with_read_api_key(key);
        }
        if let Some(env) = get(ENV_ENVIRONMENT) {
            config = config.with_environment(env);
        }
        if let Some(list) = get(ENV_EXCLUDED_PARAMS) {
            config = config.with_excluded_params(list.split(','));
        }
        debug!(
            base_url = %config.base_url,
            environment = ?config.environment,
            read_api_key = config.read_api_key.is_some(),
            excluded_params = config.excluded_params.len(),
            "loaded Honeybadger configuration"
        );
        Ok(config)
    }

    /// Set the service address. A trailing `/` is dropped.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Result<Self, ConfigError> {
        let base_url = base_url.into();
        let trimmed = base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(base_url));
        }
        self.base_url = trimmed.to_string();
        Ok(self)
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = non_blank(key.into()).map(SecretString::from);
        self
    }

    pub fn with_read_api_key(mut self, key: impl Into<String>) -> Self {
        self.read_api_key = non_blank(key.into()).map(SecretString::from);
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = non_blank(environment.into());
        self
    }

    /// Replace the set of request parameter names dropped during binding.
    /// Names are matched case-insensitively.
    pub fn with_excluded_params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded_params = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_ascii_lowercase())
            .filter(|name| !name.is_empty())
            .collect();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> Option<&SecretString> {
        self.api_key.as_ref()
    }

    pub fn read_api_key(&self) -> Option<&SecretString> {
        self.read_api_key.as_ref()
    }

    /// The read credential, or [`ConfigError::MissingReadApiKey`].
    pub fn require_read_api_key(&self) -> Result<&SecretString, ConfigError> {
        self.read_api_key
            .as_ref()
            .ok_or(ConfigError::MissingReadApiKey)
    }

    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    pub fn excluded_params(&self) -> &BTreeSet<String> {
        &self.excluded_params
    }

    pub fn is_excluded_param(&self, name: &str) -> bool {
        !self.excluded_params.is_empty()
            && self.excluded_params.contains(&name.to_ascii_lowercase())
    }
}

// ── Ambient scope ──

thread_local! {
    static AMBIENT: RefCell<Option<Arc<ConfigContext>>> = const { RefCell::new(None) };
}

/// Restores the previously active ambient configuration when dropped.
///
/// Not `Send`: the guard must be dropped on the thread that created it.
#[must_use = "the ambient configuration is cleared as soon as the guard is dropped"]
pub struct AmbientGuard {
    previous: Option<Arc<ConfigContext>>,
    _thread_bound: PhantomData<*const ()>,
}

impl Drop for AmbientGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        AMBIENT.with(|slot| *slot.borrow_mut() = previous);
    }
}

/// Make `config` the ambient configuration of the current thread until the
/// returned guard is dropped.
pub fn enter(config: Arc<ConfigContext>) -> AmbientGuard {
    let previous = AMBIENT.with(|slot| slot.borrow_mut().replace(config));
    AmbientGuard {
        previous,
        _thread_bound: PhantomData,
    }
}

/// Run `f` with `config` as the ambient configuration. The previous value is
/// restored on return and on unwind.
pub fn with_ambient<R>(config: Arc<ConfigContext>, f: impl FnOnce() -> R) -> R {
    let _guard = enter(config);
    f()
}

/// The ambient configuration of the current thread, if a scope is active.
pub fn current() -> Option<Arc<ConfigContext>> {
    AMBIENT.with(|slot| slot.borrow().clone())
}

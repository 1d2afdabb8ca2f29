//! Typed notice record as stored by Honeybadger.
//!
//! Every section is optional on the wire; missing fields fall back to their
//! defaults and unknown fields are ignored. Request maps (`params`, `session`,
//! `cgi_data`) drop names excluded by the ambient [`ConfigContext`], and a
//! missing `server.environment_name` is taken from it.
//!
//! [`ConfigContext`]: crate::ConfigContext

use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::config;
use crate::notifier::Notifier;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub notifier: Notifier,
    #[serde(default)]
    pub error: NoticeError,
    #[serde(default)]
    pub request: Request,
    #[serde(default)]
    pub server: ServerDetails,
    #[serde(default)]
    pub details: Map<String, Value>,
    #[serde(default)]
    pub web_environment: CgiData,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoticeError {
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub backtrace: Vec<BacktraceLine>,
    #[serde(default)]
    pub causes: Vec<Cause>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cause {
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub backtrace: Vec<BacktraceLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktraceLine {
    /// Line number. The API emits it either as a string or an integer.
    #[serde(default, deserialize_with = "line_number")]
    pub number: Option<u32>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

fn line_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u32),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Int(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid line number {s:?}"))),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub component: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub session: Session,
    #[serde(default)]
    pub cgi_data: CgiData,
    #[serde(default)]
    pub context: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerDetails {
    #[serde(default = "ambient_environment")]
    pub environment_name: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub project_root: Option<String>,
    #[serde(default)]
    pub pid: Option<u32>,
    #[serde(default)]
    pub revision: Option<String>,
}

impl Default for ServerDetails {
    fn default() -> Self {
        Self {
            environment_name: ambient_environment(),
            hostname: None,
            project_root: None,
            pid: None,
            revision: None,
        }
    }
}

fn ambient_environment() -> Option<String> {
    config::current().and_then(|c| c.environment().map(str::to_string))
}

/// Deserialize a string-keyed map, tolerating `null`, and drop the names the
/// ambient configuration excludes.
fn filtered_map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut map = Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    if let Some(config) = config::current() {
        map.retain(|name, _| !config.is_excluded_param(name));
    }
    Ok(map)
}

macro_rules! filtered_map_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize)]
        #[serde(transparent)]
        pub struct $name(Map<String, Value>);

        impl $name {
            pub fn into_inner(self) -> Map<String, Value> {
                self.0
            }
        }

        impl Deref for $name {
            type Target = Map<String, Value>;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl From<Map<String, Value>> for $name {
            fn from(map: Map<String, Value>) -> Self {
                Self(map)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                filtered_map(deserializer).map(Self)
            }
        }
    };
}

filtered_map_type! {
    /// Request parameters.
    Params
}

filtered_map_type! {
    /// Session values attached to the request.
    Session
}

filtered_map_type! {
    /// CGI / web environment variables (`REMOTE_ADDR`, `HTTP_USER_AGENT`, ...).
    CgiData
}

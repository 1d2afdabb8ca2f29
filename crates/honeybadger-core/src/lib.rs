//! Shared types for reading Honeybadger notices: configuration, notifier
//! identity, and the typed notice record.

pub mod config;
pub mod notice;
pub mod notifier;

pub use config::{ConfigContext, ConfigError};
pub use notice::{
    BacktraceLine, Cause, CgiData, Notice, NoticeError, Params, Request, ServerDetails, Session,
};
pub use notifier::{Notifier, resolve_version};

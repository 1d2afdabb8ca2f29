//! Identity of this library as reported in the `notifier` section of a notice.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

pub const NOTIFIER_NAME: &str = "io.honeybadger:honeybadger-rust";
pub const NOTIFIER_URL: &str = "https://github.com/honeybadger-io/honeybadger-rust";

/// Runtime override for the reported version.
pub const VERSION_OVERRIDE_ENV: &str = "HONEYBADGER_VERSION";

pub const UNKNOWN_VERSION: &str = "unknown";

const EMBEDDED_VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

static VERSION: OnceLock<String> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Notifier {
    pub name: String,
    pub url: String,
    pub version: String,
}

impl Notifier {
    /// The identity of this process. The version is resolved once.
    pub fn current() -> Self {
        Self {
            name: NOTIFIER_NAME.to_string(),
            url: NOTIFIER_URL.to_string(),
            version: resolve_version().to_string(),
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::current()
    }
}

/// Version reported by this process: `HONEYBADGER_VERSION` if set, else the
/// version embedded at build time, else `"unknown"`.
pub fn resolve_version() -> &'static str {
    VERSION.get_or_init(|| {
        let runtime = std::env::var(VERSION_OVERRIDE_ENV).ok();
        resolve_version_from(runtime.as_deref(), EMBEDDED_VERSION)
    })
}

pub fn resolve_version_from(runtime_override: Option<&str>, embedded: Option<&str>) -> String {
    [runtime_override, embedded]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
        .unwrap_or(UNKNOWN_VERSION)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn override_wins_over_embedded() {
        assert_eq!(resolve_version_from(Some("9.9.9"), Some("0.1.0")), "9.9.9");
        assert_eq!(resolve_version_from(Some("9.9.9"), None), "9.9.9");
    }

    #[test]
    fn embedded_used_without_override() {
        assert_eq!(resolve_version_from(None, Some("0.1.0")), "0.1.0");
        assert_eq!(resolve_version_from(Some(""), Some("0.1.0")), "0.1.0");
    }

    #[test]
    fn falls_back_to_unknown() {
        assert_eq!(resolve_version_from(None, None), UNKNOWN_VERSION);
        assert_eq!(resolve_version_from(Some("  "), Some("")), UNKNOWN_VERSION);
    }

    #[test]
    fn resolved_once_per_process() {
        assert!(std::ptr::eq(resolve_version(), resolve_version()));
        assert!(!resolve_version().is_empty());
    }

    #[test]
    fn identity_equality_and_hash_are_structural() {
        let a = Notifier::current();
        let b = Notifier::current();
        assert_eq!(a, b);

        let other = Notifier {
            version: "0.0.0-other".into(),
            ..a.clone()
        };
        assert_ne!(a, other);

        let set: HashSet<Notifier> = [a, b, other].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}

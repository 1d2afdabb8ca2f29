//! Binds a normalized notice document to [`Notice`].
//!
//! The configuration is installed as the thread's ambient context for the
//! duration of one bind, so nested values (request maps, server details) can
//! read it. The previous context is restored on every exit path.

use std::collections::BTreeSet;
use std::sync::Arc;

use honeybadger_core::{ConfigContext, Notice, config};
use serde_json::{Map, Value};
use tracing::trace;

use crate::LoaderError;

/// Top-level document fields skipped during binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionPolicy {
    fields: BTreeSet<String>,
}

impl Default for ExclusionPolicy {
    /// Skips `notifier`: a loaded notice always carries this process's
    /// notifier identity.
    fn default() -> Self {
        Self::new(["notifier"])
    }
}

impl ExclusionPolicy {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn none() -> Self {
        Self {
            fields: BTreeSet::new(),
        }
    }

    pub fn excludes(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    fn apply(&self, doc: &mut Map<String, Value>) {
        for field in &self.fields {
            if doc.remove(field).is_some() {
                trace!(field = %field, "excluded notice field");
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoticeDeserializer {
    exclusions: ExclusionPolicy,
}

impl NoticeDeserializer {
    pub fn new(exclusions: ExclusionPolicy) -> Self {
        Self { exclusions }
    }

    pub fn exclusions(&self) -> &ExclusionPolicy {
        &self.exclusions
    }

    /// Bind `doc` to a [`Notice`] with `config` as the ambient configuration.
    pub fn deserialize(
        &self,
        mut doc: Map<String, Value>,
        config: &ConfigContext,
    ) -> Result<Notice, LoaderError> {
        self.exclusions.apply(&mut doc);

        let notice = config::with_ambient(Arc::new(config.clone()), || {
            serde_json::from_value::<Notice>(Value::Object(doc))
        })?;
        Ok(notice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use honeybadger_core::Notifier;
    use serde_json::json;
    use std::sync::Barrier;
    use std::thread;

    fn doc(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn binds_normalized_document() {
        let notice = NoticeDeserializer::default()
            .deserialize(
                doc(json!({
                    "web_environment": {"REMOTE_ADDR": "10.0.0.1"},
                    "request": {"url": "/a", "cgi_data": {"REMOTE_ADDR": "10.0.0.1"}}
                })),
                &ConfigContext::default(),
            )
            .unwrap();

        assert_eq!(notice.request.url.as_deref(), Some("/a"));
        assert_eq!(
            notice.request.cgi_data.get("REMOTE_ADDR"),
            Some(&json!("10.0.0.1"))
        );
        assert_eq!(
            notice.web_environment.get("REMOTE_ADDR"),
            Some(&json!("10.0.0.1"))
        );
    }

    #[test]
    fn default_policy_replaces_remote_notifier() {
        let notice = NoticeDeserializer::default()
            .deserialize(
                doc(json!({
                    "notifier": {"name": "other", "url": "https://x.test", "version": "0.0.1"}
                })),
                &ConfigContext::default(),
            )
            .unwrap();
        assert_eq!(notice.notifier, Notifier::current());
    }

    #[test]
    fn empty_policy_keeps_remote_notifier() {
        let notice = NoticeDeserializer::new(ExclusionPolicy::none())
            .deserialize(
                doc(json!({
                    "notifier": {"name": "other", "url": "https://x.test", "version": "0.0.1"}
                })),
                &ConfigContext::default(),
            )
            .unwrap();
        assert_eq!(notice.notifier.name, "other");
    }

    #[test]
    fn structural_mismatch_is_schema_error() {
        let err = NoticeDeserializer::default()
            .deserialize(
                doc(json!({"request": {"url": 42}})),
                &ConfigContext::default(),
            )
            .unwrap_err();
        assert!(matches!(err, LoaderError::Schema(_)));
    }

    #[test]
    fn ambient_config_cleared_after_success_and_failure() {
        let deserializer = NoticeDeserializer::default();
        let config = ConfigContext::default().with_environment("staging");

        deserializer.deserialize(doc(json!({})), &config).unwrap();
        assert!(config::current().is_none());

        deserializer
            .deserialize(doc(json!({"error": "not an object"})), &config)
            .unwrap_err();
        assert!(config::current().is_none());
    }

    #[test]
    fn concurrent_binds_see_only_their_own_config() {
        const THREADS: usize = 8;
        let barrier = Arc::new(Barrier::new(THREADS));
        let deserializer = Arc::new(NoticeDeserializer::default());

        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let barrier = barrier.clone();
                let deserializer = deserializer.clone();
                thread::spawn(move || {
                    let env = format!("env-{i}");
                    let secret = format!("secret-{i}");
                    let config = ConfigContext::default()
                        .with_environment(env.clone())
                        .with_excluded_params([secret.clone()]);

                    let mut params = Map::new();
                    for j in 0..THREADS {
                        params.insert(format!("secret-{j}"), json!(j));
                    }

                    barrier.wait();
                    let mut seen = Vec::new();
                    for _ in 0..50 {
                        let notice = deserializer
                            .deserialize(
                                doc(json!({"request": {"params": params.clone()}})),
                                &config,
                            )
                            .unwrap();
                        seen.push(notice);
                    }
                    (env, secret, seen)
                })
            })
            .collect();

        for handle in handles {
            let (env, secret, seen) = handle.join().unwrap();
            for notice in seen {
                assert_eq!(notice.server.environment_name.as_deref(), Some(env.as_str()));
                assert!(!notice.request.params.contains_key(&secret));
                assert_eq!(notice.request.params.len(), THREADS - 1);
            }
        }
    }
}

//! Fetch → normalize → bind pipeline for a single notice.

use honeybadger_core::{ConfigContext, Notice};
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::LoaderError;
use crate::deserialize::NoticeDeserializer;
use crate::fetch::NoticeFetcher;
use crate::normalize::normalize;

/// Loads a fault's details into a [`Notice`].
pub struct NoticeLoader {
    config: ConfigContext,
    fetcher: NoticeFetcher,
    deserializer: NoticeDeserializer,
}

impl NoticeLoader {
    /// Loader with the default `reqwest` fetcher and exclusion policy.
    pub fn new(config: ConfigContext) -> Self {
        Self::with_parts(config, NoticeFetcher::new(), NoticeDeserializer::default())
    }

    /// Loader built from caller-supplied components. Nothing else is
    /// constructed, so a custom fetcher never pays for a default HTTP client.
    pub fn with_parts(
        config: ConfigContext,
        fetcher: NoticeFetcher,
        deserializer: NoticeDeserializer,
    ) -> Self {
        Self {
            config,
            fetcher,
            deserializer,
        }
    }

    pub fn config(&self) -> &ConfigContext {
        &self.config
    }

    /// Fetch notice `id` and bind it, waiting out the read API's processing
    /// delay.
    pub fn find_error_details(&self, id: Uuid) -> Result<Notice, LoaderError> {
        let json = self.fetcher.fetch(id, &self.config)?;
        let doc = parse_document(&json)?;
        let notice = self.deserializer.deserialize(normalize(doc)?, &self.config)?;
        info!(%id, "loaded notice");
        Ok(notice)
    }
}

/// Fetch and bind notice `id` using the default transport and retry policy.
pub fn fetch_notice(id: Uuid, config: &ConfigContext) -> Result<Notice, LoaderError> {
    NoticeLoader::new(config.clone()).find_error_details(id)
}

fn parse_document(json: &str) -> Result<Map<String, Value>, LoaderError> {
    match serde_json::from_str::<Value>(json)? {
        Value::Object(doc) => Ok(doc),
        _ => Err(LoaderError::Schema(
            "notice body is not a JSON object".to_string(),
        )),
    }
}

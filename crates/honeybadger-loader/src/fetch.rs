//! Authenticated read of a single notice, retried while the API still
//! reports it as unavailable.
//!
//! The read API answers 404 until a freshly reported notice has been
//! processed, and it answers the same way for notices that never existed.
//! Both cases go through the full retry budget.

use std::sync::Arc;

use honeybadger_core::{ConfigContext, ConfigError};
use reqwest::Url;
use secrecy::ExposeSecret;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::LoaderError;
use crate::retry::{self, Interruptible, RetryOutcome, RetryPolicy, Waiter};
use crate::transport::{HttpReply, NoticeTransport, ReqwestTransport};

pub struct NoticeFetcher {
    transport: Arc<dyn NoticeTransport>,
    waiter: Arc<dyn Waiter>,
    policy: RetryPolicy,
}

impl Default for NoticeFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl NoticeFetcher {
    /// Fetcher using `reqwest` and real-time waits with the default policy.
    pub fn new() -> Self {
        Self::with_parts(
            Arc::new(ReqwestTransport::new()),
            Arc::new(Interruptible::new()),
            RetryPolicy::default(),
        )
    }

    /// Fetcher from caller-supplied components; no default client is built.
    pub fn with_parts(
        transport: Arc<dyn NoticeTransport>,
        waiter: Arc<dyn Waiter>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            waiter,
            policy,
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn NoticeTransport>) -> Self {
        self.transport = transport;
        self
    }

    /// Replace the backoff waiter. Keep a clone of an [`Interruptible`] to be
    /// able to cancel a fetch from another thread.
    pub fn with_waiter(mut self, waiter: Arc<dyn Waiter>) -> Self {
        self.waiter = waiter;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch the raw JSON of notice `id`.
    ///
    /// Fails with [`LoaderError::Configuration`] before any request when no
    /// read API key is configured.
    pub fn fetch(&self, id: Uuid, config: &ConfigContext) -> Result<String, LoaderError> {
        let read_api_key = config.require_read_api_key()?;
        let query_url = notice_url(config.base_url(), id)?;

        let mut authed_url = query_url.clone();
        authed_url
            .query_pairs_mut()
            .append_pair("auth_token", read_api_key.expose_secret());

        debug!(url = %query_url, "querying for error details");

        let outcome = retry::run(
            &self.policy,
            self.waiter.as_ref(),
            |attempt| {
                let reply = self.transport.get_json(authed_url.as_str())?;
                if !reply.is_ok() {
                    debug!(
                        attempt,
                        status = reply.status,
                        "notice not available yet"
                    );
                }
                Ok::<HttpReply, LoaderError>(reply)
            },
            HttpReply::is_ok,
        )?;

        match outcome {
            RetryOutcome::Done { value, attempts } => {
                debug!(%id, attempts, bytes = value.body.len(), "fetched notice");
                Ok(value.body)
            }
            RetryOutcome::Exhausted {
                last,
                attempts,
                interrupted,
            } => {
                let last_status = last.map(|reply| reply.status);
                warn!(%id, attempts, ?last_status, interrupted, "unable to get notice from API");
                Err(LoaderError::RetryExhausted {
                    attempts,
                    last_status,
                })
            }
        }
    }
}

/// `{base}/v1/notices/{id}/`, without credentials.
pub fn notice_url(base_url: &str, id: Uuid) -> Result<Url, ConfigError> {
    let raw = format!("{}/v1/notices/{id}/", base_url.trim_end_matches('/'));
    Url::parse(&raw).map_err(|_| ConfigError::InvalidUrl(base_url.to_string()))
}

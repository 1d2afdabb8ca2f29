//! HTTP seam for the read API.

use reqwest::header::ACCEPT;

use crate::LoaderError;

/// Status and body of one read-API response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Issues a single `GET` asking for JSON. Any returned status is a reply;
/// only connection or protocol faults are errors.
pub trait NoticeTransport: Send + Sync {
    fn get_json(&self, url: &str) -> Result<HttpReply, LoaderError>;
}

/// Blocking `reqwest` transport using the client's default timeouts.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::with_client(reqwest::blocking::Client::new())
    }

    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl NoticeTransport for ReqwestTransport {
    fn get_json(&self, url: &str) -> Result<HttpReply, LoaderError> {
        let resp = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()?;
        let status = resp.status().as_u16();
        let body = resp.text()?;
        Ok(HttpReply { status, body })
    }
}

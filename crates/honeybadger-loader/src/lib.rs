//! Reads notices back from the Honeybadger API.
//!
//! The read endpoint is eventually consistent and returns CGI data under a
//! different key than the one used at ingestion; [`NoticeLoader`] retries
//! the read and reshapes the document before binding it to a [`Notice`].
//!
//! [`Notice`]: honeybadger_core::Notice

mod error;
pub mod deserialize;
pub mod fetch;
pub mod loader;
pub mod normalize;
pub mod retry;
pub mod transport;

pub use deserialize::{ExclusionPolicy, NoticeDeserializer};
pub use error::LoaderError;
pub use fetch::NoticeFetcher;
pub use loader::{NoticeLoader, fetch_notice};
pub use normalize::normalize;
pub use retry::{Interruptible, Interrupted, RetryPolicy, Waiter};
pub use transport::{HttpReply, NoticeTransport, ReqwestTransport};

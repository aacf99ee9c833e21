//! Transport Port: selector → raw records from the remote source
//!
//! Chosen once at construction. [`HttpTransport`] talks to the REST endpoint;
//! tests inject in-process implementations.

pub mod http;

pub use http::{HttpTransport, TransportError};

use crate::models::{QuerySelector, ScoredRecord};
use aqua_common::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch every record matching `selector`
    ///
    /// Failures are reported as [`Error::Transport`](aqua_common::Error::Transport).
    /// Retry policy, if any, belongs to the implementation.
    async fn request(
        &self,
        base_uri: &str,
        selector: &QuerySelector,
        headers: &[(String, String)],
    ) -> Result<Vec<ScoredRecord>>;
}

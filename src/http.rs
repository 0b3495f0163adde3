//! Shared plumbing for hosted model clients

use std::future::Future;
use std::time::Duration;

use crate::error::{MemvaultError, Result};

/// Drive an async request from the synchronous engine.
///
/// Tool calls run on blocking worker threads, so the ambient runtime handle
/// is reused when there is one. Without a runtime (CLI tools, tests) a
/// throwaway current-thread runtime is built.
pub(crate) fn block_on<F: Future>(fut: F) -> Result<F::Output> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => Ok(tokio::task::block_in_place(|| handle.block_on(fut))),
        Err(_) => {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| MemvaultError::Config(format!("Failed to build runtime: {}", e)))?;
            Ok(rt.block_on(fut))
        }
    }
}

/// HTTP client with a hard per-request timeout
pub(crate) fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .map_err(|e| MemvaultError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Rate limiting and server-side failures are worth one more attempt
pub(crate) fn is_transient_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

/// Network-level failures (timeouts, refused connections) are transient
pub(crate) fn is_transient_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

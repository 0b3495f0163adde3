//! Bounded retry for calls that leave the process
//!
//! Store, embedding and generation calls get at most `max_retries` extra
//! attempts, and only when the failure is transient
//! (`MemvaultError::is_retryable`). Validation and not-found errors surface
//! on the first attempt.

use std::time::Duration;

use crate::embedding::{EmbedTask, Embedder};
use crate::error::Result;
use crate::generation::Generator;

/// Retry count and fixed backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    /// Run `call`, retrying transient failures
    pub fn run<T, F>(&self, operation: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let max_attempts = self.max_retries + 1;
        let mut attempt = 1;

        loop {
            match call() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    tracing::warn!(
                        operation,
                        attempt,
                        max_attempts,
                        error = %err,
                        "Transient failure, retrying"
                    );
                    if !self.backoff.is_zero() {
                        std::thread::sleep(self.backoff);
                    }
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_retryable() {
                        tracing::error!(operation, attempt, error = %err, "Giving up after retries");
                    }
                    return Err(err);
                }
            }
        }
    }
}

/// Embedder wrapper applying a [`RetryPolicy`] to every call
pub struct ResilientEmbedder<E> {
    inner: E,
    policy: RetryPolicy,
}

impl<E: Embedder> ResilientEmbedder<E> {
    pub fn new(inner: E, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<E: Embedder> Embedder for ResilientEmbedder<E> {
    fn embed(&self, text: &str, task: EmbedTask) -> Result<Vec<f32>> {
        self.policy.run("embed", || self.inner.embed(text, task))
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

/// Generator wrapper applying a [`RetryPolicy`] to every call
pub struct ResilientGenerator<G> {
    inner: G,
    policy: RetryPolicy,
}

impl<G: Generator> ResilientGenerator<G> {
    pub fn new(inner: G, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<G: Generator> Generator for ResilientGenerator<G> {
    fn generate(&self, prompt: &str) -> Result<String> {
        self.policy.run("generate", || self.inner.generate(prompt))
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

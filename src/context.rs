// src/context.rs
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::CertError;

/// Cancellation plus an optional deadline, threaded through every network
/// call. Clones share the token.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    // Keeps the parent's deadline when it is earlier.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        Self {
            token: self.token.child_token(),
            deadline: Some(match self.deadline {
                Some(parent) if parent < deadline => parent,
                _ => deadline,
            }),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    async fn done(&self) -> &'static str {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.token.cancelled() => "context cancelled",
                _ = tokio::time::sleep_until(deadline) => "deadline exceeded",
            },
            None => {
                self.token.cancelled().await;
                "context cancelled"
            }
        }
    }

    /// Runs `fut` until it completes or the context ends. An already ended
    /// context never polls `fut`.
    pub async fn run<T, F>(&self, location: &str, fut: F) -> Result<T, CertError>
    where
        F: Future<Output = Result<T, CertError>>,
    {
        tokio::select! {
            biased;
            reason = self.done() => {
                tracing::debug!(location, reason, "aborting certificate fetch");
                Err(CertError::Cancelled {
                    location: location.to_string(),
                    reason,
                })
            }
            result = fut => result,
        }
    }
}

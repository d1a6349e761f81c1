use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::error::LedgerError;

/// Re-runs a whole transactional unit while it fails with a retryable
/// error. The operation must begin and settle its own transaction so a
/// failed attempt leaves nothing behind.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
    pub retryable: fn(&LedgerError) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(50),
            retryable: LedgerError::is_transient,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            ..Self::default()
        }
    }

    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, LedgerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        let mut attempt: u32 = 1;
        loop {
            match op().await {
                Err(err) if (self.retryable)(&err) => {
                    if attempt >= self.max_attempts {
                        warn!(operation, attempt, error = %err, "Giving up after retryable failures");
                        return Err(LedgerError::Storage(format!(
                            "{operation} failed after {attempt} attempts: {err}"
                        )));
                    }
                    warn!(operation, attempt, error = %err, "Retryable failure, retrying");
                    if !self.backoff.is_zero() {
                        tokio::time::sleep(self.backoff * attempt).await;
                    }
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }
}

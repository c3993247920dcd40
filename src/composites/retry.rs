// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::{ModuleError, TIMEOUT_KIND};
use crate::observability::messages::{RetryScheduled, StructuredLog};
use crate::traits::{Args, Kwargs, Module};

/// Bounded re-invocation with exponential backoff.
///
/// Attempts the wrapped child up to `max_retries + 1` times. Only domain
/// errors whose kind is in the retryable set trigger another attempt; any
/// other error propagates immediately. Backoff between attempts is
/// `2^attempt` seconds, attempt-indexed from 0, no jitter, capped at
/// `2^32` seconds. The ambient
/// `retry_count` is informational and left untouched.
// Exponent cap: 2^32 seconds is already far beyond any useful wait, and
// keeps the doubling finite for arbitrarily large attempt counts.
const MAX_BACKOFF_EXPONENT: u32 = 32;

fn backoff_for(attempt: u32) -> Duration {
    Duration::from_secs_f64(2f64.powi(attempt.min(MAX_BACKOFF_EXPONENT) as i32))
}

pub struct Retry {
    child: Arc<dyn Module>,
    max_retries: u32,
    retryable: HashSet<String>,
}

impl Retry {
    pub fn new(
        child: Arc<dyn Module>,
        max_retries: u32,
        retryable: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            child,
            max_retries,
            retryable: retryable.into_iter().map(Into::into).collect(),
        }
    }

    /// Retry wrapper with the reference defaults: three retries, timeout
    /// failures only.
    pub fn with_defaults(child: Arc<dyn Module>) -> Self {
        Self::new(child, 3, [TIMEOUT_KIND])
    }

    fn is_retryable(&self, err: &ModuleError) -> bool {
        err.kind().map(|k| self.retryable.contains(k)).unwrap_or(false)
    }
}

#[async_trait]
impl Module for Retry {
    async fn process(&self, args: Args, kwargs: Kwargs) -> Result<Value, ModuleError> {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            match self.child.invoke(args.clone(), kwargs.clone()).await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    if !self.is_retryable(&err) {
                        return Err(err);
                    }
                    last_err = Some(err);
                    if attempt == self.max_retries {
                        break;
                    }

                    let backoff = backoff_for(attempt);
                    RetryScheduled {
                        module: self.child.name(),
                        attempt,
                        backoff,
                    }
                    .log();
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            ModuleError::domain("retry", "attempts exhausted without an error")
        }))
    }

    fn name(&self) -> &'static str {
        "retry"
    }
}

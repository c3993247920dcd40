// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for module invocation lifecycle events.

use std::fmt::{Display, Formatter};
use std::time::Duration;

/// A message that knows how to emit itself as a structured tracing event.
pub trait StructuredLog: Display {
    fn log(&self);
}

/// A module invocation began.
///
/// # Log Level
/// `debug!` - per-step lifecycle event
pub struct ModuleStarted<'a> {
    pub module: &'a str,
    pub step_id: &'a str,
}

impl Display for ModuleStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Module '{}' started step {}", self.module, self.step_id)
    }
}

impl StructuredLog for ModuleStarted<'_> {
    fn log(&self) {
        tracing::debug!(module = self.module, step_id = self.step_id, "{}", self);
    }
}

/// A module invocation completed successfully.
///
/// # Log Level
/// `debug!` - per-step lifecycle event
pub struct ModuleCompleted<'a> {
    pub module: &'a str,
    pub step_id: &'a str,
}

impl Display for ModuleCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Module '{}' completed step {}", self.module, self.step_id)
    }
}

impl StructuredLog for ModuleCompleted<'_> {
    fn log(&self) {
        tracing::debug!(module = self.module, step_id = self.step_id, "{}", self);
    }
}

/// A retry wrapper scheduled another attempt after a retryable failure.
///
/// # Log Level
/// `debug!` - control-flow event inside the Retry combinator
pub struct RetryScheduled<'a> {
    pub module: &'a str,
    pub attempt: u32,
    pub backoff: Duration,
}

impl Display for RetryScheduled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Retrying module '{}' after attempt {} with {:?} backoff",
            self.module, self.attempt, self.backoff
        )
    }
}

impl StructuredLog for RetryScheduled<'_> {
    fn log(&self) {
        tracing::debug!(
            module = self.module,
            attempt = self.attempt,
            backoff_ms = self.backoff.as_millis() as u64,
            "{}",
            self
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_render_their_fields() {
        let msg = ModuleStarted {
            module: "sequential",
            step_id: "abc123",
        };
        assert_eq!(msg.to_string(), "Module 'sequential' started step abc123");

        let msg = RetryScheduled {
            module: "flaky",
            attempt: 1,
            backoff: Duration::from_secs(2),
        };
        assert!(msg.to_string().contains("attempt 1"));
    }
}

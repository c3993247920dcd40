// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors surfaced through the module invocation path.

use thiserror::Error;

use crate::errors::ContextError;

/// Kind string used for deadline-style domain errors. Retry treats this as
/// its default retryable kind.
pub const TIMEOUT_KIND: &str = "timeout";

/// Errors a [`Module`](crate::traits::Module) invocation can produce.
///
/// Domain errors are opaque to the core: composites propagate them
/// unchanged, and only [`Retry`](crate::composites::Retry) inspects the
/// `kind` to decide whether to re-attempt.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// The module has no processing step. Raised by placeholder modules
    /// whose behavior was never supplied.
    #[error("module '{module}' does not implement process()")]
    NotImplemented { module: String },

    /// Context construction or derivation failed before the processing
    /// step could run.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// An error raised by a user's processing function. The `kind` is a
    /// caller-chosen category used for retry matching; the core never
    /// interprets it otherwise.
    #[error("{kind}: {message}")]
    Domain { kind: String, message: String },

    /// The worker thread running a synchronous processing function was
    /// cancelled or panicked before relaying a result.
    #[error("worker thread for module '{module}' did not complete: {reason}")]
    Worker { module: String, reason: String },
}

impl ModuleError {
    /// A domain error with an explicit kind.
    pub fn domain(kind: impl Into<String>, message: impl Into<String>) -> Self {
        ModuleError::Domain {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// A domain error with the `timeout` kind, for processing functions
    /// that consult the ambient deadline and decide to fail fast.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::domain(TIMEOUT_KIND, message)
    }

    /// The retry-matching kind of this error, if it is a domain error.
    pub fn kind(&self) -> Option<&str> {
        match self {
            ModuleError::Domain { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_carry_their_kind() {
        let err = ModuleError::domain("rate_limit", "too many requests");
        assert_eq!(err.kind(), Some("rate_limit"));
        assert_eq!(err.to_string(), "rate_limit: too many requests");
    }

    #[test]
    fn timeout_helper_uses_the_timeout_kind() {
        assert_eq!(ModuleError::timeout("deadline exceeded").kind(), Some(TIMEOUT_KIND));
    }

    #[test]
    fn non_domain_errors_have_no_kind() {
        let err = ModuleError::NotImplemented {
            module: "base".to_string(),
        };
        assert_eq!(err.kind(), None);
    }
}

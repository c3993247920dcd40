// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while building or deriving a [`Context`](crate::context::Context).

use thiserror::Error;

/// Usage and validation errors from context construction and derivation.
///
/// These are fail-fast errors: the core never retries or downgrades them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContextError {
    /// A deadline was supplied in the wall-clock domain instead of the
    /// monotonic domain. Caught by the ten-year distance heuristic.
    #[error("'deadline' must be monotonic time (got {deadline}, which looks like a wall-clock timestamp)")]
    WallClockDeadline { deadline: f64 },

    /// Both the absolute and the relative deadline form were supplied.
    #[error("'deadline' and 'timeout' cannot be set at the same time")]
    DeadlineTimeoutConflict,

    /// The reserved `ctx` configuration key held something that is not a
    /// serialized Context.
    #[error("'ctx' must be a Context object")]
    InvalidCtx,

    /// A declared Context field was supplied with a malformed value.
    #[error("invalid value for context field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
}

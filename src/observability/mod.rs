// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability for module execution.
//!
//! Message types follow a struct-based pattern with `Display`
//! implementations, so log wording lives in one place instead of being
//! scattered through the execution core. The core emits lifecycle events
//! only; it never logs errors on behalf of the caller.

pub mod messages;

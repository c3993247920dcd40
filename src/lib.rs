// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;      // closure-backed leaf modules
pub mod clock;         // monotonic clock domain
pub mod composites;    // sequence / fan-out / branch / delay / retry
pub mod context;       // request-scoped ambient context
pub mod errors;        // error handling
pub mod observability;
pub mod traits;        // unified abstractions

pub use composites::{Conditional, Delay, Parallel, Retry, Sequential};
pub use context::{Context, ContextGuard, Scoped};
pub use errors::{ContextError, ModuleError};
pub use traits::{Args, Configured, Kwargs, Module, ModuleExt};

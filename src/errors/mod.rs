// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod context;
mod module;

pub use context::ContextError;
pub use module::{ModuleError, TIMEOUT_KIND};

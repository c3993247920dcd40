// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod functional;

pub use functional::{AsyncFn, Placeholder, SyncFn};

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod module;

pub use module::{Args, Configured, Kwargs, Module, ModuleExt};

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Composite modules: combinators built only out of other modules.
//!
//! Each composite preserves the context-propagation and error-propagation
//! contracts of the invocation core, including under concurrent execution.

pub mod conditional;
pub mod delay;
pub mod parallel;
pub mod retry;
pub mod sequential;


pub use conditional::Conditional;
pub use delay::Delay;
pub use parallel::Parallel;
pub use retry::Retry;
pub use sequential::Sequential;

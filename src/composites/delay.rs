// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ModuleError;
use crate::traits::{Args, Kwargs, Module};

/// Pass-through after a non-blocking wait.
///
/// Suspends cooperatively for the configured duration, then returns the
/// input unchanged: the single positional argument if exactly one was
/// given, otherwise the full positional sequence as an array.
pub struct Delay {
    duration: Duration,
}

impl Delay {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

#[async_trait]
impl Module for Delay {
    async fn process(&self, args: Args, _kwargs: Kwargs) -> Result<Value, ModuleError> {
        tokio::time::sleep(self.duration).await;

        let mut args = args;
        match args.len() {
            1 => Ok(args.pop().unwrap_or(Value::Null)),
            _ => Ok(Value::Array(args)),
        }
    }

    fn name(&self) -> &'static str {
        "delay"
    }
}

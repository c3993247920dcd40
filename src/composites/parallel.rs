// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;

use crate::context::Context;
use crate::errors::ModuleError;
use crate::traits::{Args, Kwargs, Module};

/// Parallel fan-out with context isolation.
///
/// Every child runs concurrently with identical arguments, each under its
/// own snapshot of the context that was ambient when the fan-out began, so
/// sibling branches cannot observe each other's metadata. All branches are
/// awaited to settlement before any error is propagated; on success the
/// result is an array of child results in declared order, regardless of
/// completion order.
pub struct Parallel {
    children: Vec<Arc<dyn Module>>,
}

impl Parallel {
    pub fn new(children: Vec<Arc<dyn Module>>) -> Self {
        Self { children }
    }
}

#[async_trait]
impl Module for Parallel {
    async fn process(&self, args: Args, kwargs: Kwargs) -> Result<Value, ModuleError> {
        let snapshot = Context::current();
        let branches = self.children.iter().map(|child| {
            snapshot
                .clone()
                .scope(child.invoke(args.clone(), kwargs.clone()))
        });

        // Every branch settles before the first error wins; no branch is
        // left un-awaited.
        let settled = join_all(branches).await;

        let mut results = Vec::with_capacity(settled.len());
        for outcome in settled {
            results.push(outcome?);
        }
        Ok(Value::Array(results))
    }

    fn name(&self) -> &'static str {
        "parallel"
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ModuleError;
use crate::traits::{Args, Kwargs, Module};

/// Predicate-selected branching.
///
/// The predicate always receives the full positional-argument slice; that
/// is the declared contract, so there is no arity inspection. The selected
/// branch receives all original arguments and its result or error
/// propagates unchanged.
pub struct Conditional {
    predicate: Arc<dyn Fn(&[Value]) -> bool + Send + Sync>,
    when_true: Arc<dyn Module>,
    when_false: Arc<dyn Module>,
}

impl Conditional {
    pub fn new(
        predicate: impl Fn(&[Value]) -> bool + Send + Sync + 'static,
        when_true: Arc<dyn Module>,
        when_false: Arc<dyn Module>,
    ) -> Self {
        Self {
            predicate: Arc::new(predicate),
            when_true,
            when_false,
        }
    }
}

#[async_trait]
impl Module for Conditional {
    async fn process(&self, args: Args, kwargs: Kwargs) -> Result<Value, ModuleError> {
        let branch = if (self.predicate)(&args) {
            &self.when_true
        } else {
            &self.when_false
        };
        branch.invoke(args, kwargs).await
    }

    fn name(&self) -> &'static str {
        "conditional"
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ModuleError;
use crate::traits::{Args, Kwargs, Module};

/// Sequential composition: threads a running result through each child in
/// declared order.
///
/// A child result that is an array is unpacked as the next child's
/// positional arguments; any other value passes as a single argument. The
/// keyword mapping is broadcast unchanged to every child. A child's error
/// propagates immediately, aborting the remaining children.
///
/// ```ignore
/// let pipeline = Sequential::new(vec![tokenize, embed, classify]);
/// let result = pipeline.invoke(vec![json!("hello world")], Kwargs::new()).await?;
/// ```
pub struct Sequential {
    children: Vec<Arc<dyn Module>>,
}

impl Sequential {
    pub fn new(children: Vec<Arc<dyn Module>>) -> Self {
        Self { children }
    }
}

#[async_trait]
impl Module for Sequential {
    async fn process(&self, args: Args, kwargs: Kwargs) -> Result<Value, ModuleError> {
        let mut current = Value::Array(args);
        for child in &self.children {
            let positional = match current {
                Value::Array(items) => items,
                single => vec![single],
            };
            current = child.invoke(positional, kwargs.clone()).await?;
        }
        Ok(current)
    }

    fn name(&self) -> &'static str {
        "sequential"
    }
}

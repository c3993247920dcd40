// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Closure-backed leaf modules.
//!
//! The execution nature of a processing function is declared by the wrapper
//! type chosen at construction, not guessed at runtime: [`SyncFn`] runs its
//! closure on the blocking pool so it cannot stall the cooperative
//! scheduler, while [`AsyncFn`] awaits its future inline on the calling
//! task.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::context::Context;
use crate::errors::ModuleError;
use crate::traits::{Args, Kwargs, Module};

/// A leaf module wrapping a synchronous processing function.
///
/// Each invocation dispatches the closure to `spawn_blocking` with the
/// derived ambient context re-attached inside the worker thread, so the
/// closure can read [`Context::current`] like any other processing step.
pub struct SyncFn<F> {
    name: &'static str,
    f: Arc<F>,
}

impl<F> SyncFn<F>
where
    F: Fn(Args, Kwargs) -> Result<Value, ModuleError> + Send + Sync + 'static,
{
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f: Arc::new(f) }
    }
}

#[async_trait]
impl<F> Module for SyncFn<F>
where
    F: Fn(Args, Kwargs) -> Result<Value, ModuleError> + Send + Sync + 'static,
{
    async fn process(&self, args: Args, kwargs: Kwargs) -> Result<Value, ModuleError> {
        let f = Arc::clone(&self.f);
        let ctx = Context::current();
        let module = self.name;
        tokio::task::spawn_blocking(move || {
            let _guard = ctx.attach();
            f(args, kwargs)
        })
        .await
        .map_err(|e| ModuleError::Worker {
            module: module.to_string(),
            reason: e.to_string(),
        })?
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// A leaf module wrapping an asynchronous processing function, awaited
/// inline so it inherits the calling task's concurrency.
pub struct AsyncFn<F> {
    name: &'static str,
    f: F,
}

impl<F> AsyncFn<F>
where
    F: Fn(Args, Kwargs) -> BoxFuture<'static, Result<Value, ModuleError>> + Send + Sync,
{
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

#[async_trait]
impl<F> Module for AsyncFn<F>
where
    F: Fn(Args, Kwargs) -> BoxFuture<'static, Result<Value, ModuleError>> + Send + Sync,
{
    async fn process(&self, args: Args, kwargs: Kwargs) -> Result<Value, ModuleError> {
        (self.f)(args, kwargs).await
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// A leaf whose processing step was never supplied. Invoking it always
/// fails with [`ModuleError::NotImplemented`].
pub struct Placeholder {
    name: &'static str,
}

impl Placeholder {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[async_trait]
impl Module for Placeholder {
    async fn process(&self, _args: Args, _kwargs: Kwargs) -> Result<Value, ModuleError> {
        Err(ModuleError::NotImplemented {
            module: self.name.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

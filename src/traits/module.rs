// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The core `Module` abstraction and its uniform invocation path.
//!
//! A module is any processing unit, leaf or composite, that can be invoked
//! with positional arguments and a keyword mapping. The provided [`Module::invoke`]
//! method is the single calling convention: it merges static and call-time
//! configuration, derives a request [`Context`] from the merged mapping,
//! keeps that context ambient for the duration of the processing step, and
//! propagates the step's result or error unchanged.

use async_trait::async_trait;
use serde_json::Value;
use tracing::Instrument;

use crate::context::Context;
use crate::errors::ModuleError;
use crate::observability::messages::{ModuleCompleted, ModuleStarted, StructuredLog};

/// Positional arguments for a module invocation.
pub type Args = Vec<Value>;

/// Keyword arguments and configuration mappings. Insertion-ordered.
pub type Kwargs = serde_json::Map<String, Value>;

#[async_trait]
pub trait Module: Send + Sync {
    /// The processing step. Implementations decide their own execution
    /// nature: composites and async leaves run inline on the calling task,
    /// while synchronous leaves offload to the blocking pool (see
    /// [`SyncFn`](crate::backends::functional::SyncFn)).
    async fn process(&self, args: Args, kwargs: Kwargs) -> Result<Value, ModuleError>;

    fn name(&self) -> &'static str;

    /// Per-instance configuration attached via [`ModuleExt::with_cfg`].
    /// Merged under call-time keywords at every invocation.
    fn static_cfg(&self) -> Option<&Kwargs> {
        None
    }

    /// The uniform call path. Reentrant: concurrent invocations on the same
    /// or different instances cannot corrupt each other's ambient context,
    /// because activation is strand-local.
    ///
    /// Note the dual exposure: configuration-shaped keys are consumed into
    /// the derived context from a *copy* of the merged mapping, while the
    /// full merged mapping still reaches [`process`](Module::process) as
    /// keyword arguments. Implementations may read configuration from
    /// either their arguments or [`Context::current`].
    async fn invoke(&self, args: Args, kwargs: Kwargs) -> Result<Value, ModuleError> {
        let mut merged = self.static_cfg().cloned().unwrap_or_default();
        for (key, value) in kwargs {
            merged.insert(key, value);
        }

        let mut cfg = merged.clone();
        let ctx = Context::derive(Some(&Context::current()), &mut cfg)?;
        let step_id = ctx.step_id.clone();

        let span = tracing::debug_span!("module", module = self.name(), step_id = %step_id);
        ModuleStarted {
            module: self.name(),
            step_id: &step_id,
        }
        .log();

        let result = ctx.scope(self.process(args, merged)).instrument(span).await;

        if result.is_ok() {
            ModuleCompleted {
                module: self.name(),
                step_id: &step_id,
            }
            .log();
        }
        // Errors propagate unchanged; visibility is the caller's concern.
        result
    }
}

/// Builder-style configuration, immutable variant: each call wraps the
/// module and returns a new value with the merged configuration, so shared
/// instances are never mutated.
pub trait ModuleExt: Module + Sized {
    /// Attach static configuration. New entries win on key collision, both
    /// against the wrapped module's existing configuration and across
    /// chained calls.
    fn with_cfg(self, cfg: Kwargs) -> Configured<Self> {
        Configured::new(self, cfg)
    }
}

impl<M: Module + Sized> ModuleExt for M {}

/// A module plus pre-merged static configuration. Delegates processing to
/// the wrapped module.
pub struct Configured<M> {
    inner: M,
    cfg: Kwargs,
}

impl<M: Module> Configured<M> {
    fn new(inner: M, cfg: Kwargs) -> Self {
        let mut merged = inner.static_cfg().cloned().unwrap_or_default();
        for (key, value) in cfg {
            merged.insert(key, value);
        }
        Self { inner, cfg: merged }
    }
}

#[async_trait]
impl<M: Module> Module for Configured<M> {
    async fn process(&self, args: Args, kwargs: Kwargs) -> Result<Value, ModuleError> {
        self.inner.process(args, kwargs).await
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn static_cfg(&self) -> Option<&Kwargs> {
        Some(&self.cfg)
    }
}

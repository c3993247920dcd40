// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Request-scoped context carried ambiently through module invocations.
//!
//! A [`Context`] is a value object holding a deadline, free-form metadata,
//! a retry counter, a step identifier, and an optional tracing span. Module
//! invocations derive a fresh context from their configuration, activate it
//! for the duration of the step, and restore the previous one on every exit
//! path. See [`scope`] for the ambient storage discipline.

mod scope;

pub use scope::{ContextGuard, Scoped};

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Span;

use crate::clock::{looks_like_wall_clock, monotonic_now};
use crate::errors::ContextError;
use crate::traits::Kwargs;

/// Reserved configuration key carrying an explicit serialized [`Context`].
pub const CTX_KEY: &str = "ctx";
/// Reserved configuration key for an absolute monotonic deadline (seconds).
pub const DEADLINE_KEY: &str = "deadline";
/// Reserved configuration key for a relative timeout (seconds).
pub const TIMEOUT_KEY: &str = "timeout";

const METADATA_KEY: &str = "metadata";
const RETRY_COUNT_KEY: &str = "retry_count";
const STEP_ID_KEY: &str = "step_id";
const SPAN_KEY: &str = "span";
const PRIVATE_PREFIX: char = '_';

fn fresh_step_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Request-scoped carrier for deadlines, metadata, retries, and tracing.
///
/// Contexts are values: derivation produces a new `Context`, never mutating
/// one reachable from elsewhere. Exactly one context is ambient per thread
/// at any instant; nested activations are strictly LIFO.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    /// Absolute deadline in the monotonic clock domain, in seconds.
    /// Advisory: the core never cancels work on its own.
    #[serde(default)]
    pub deadline: Option<f64>,

    /// Cross-cutting key/value data (tracing ids, auth identity, tags).
    /// Insertion-ordered, last-writer-wins, never pruned automatically.
    #[serde(default)]
    pub metadata: Kwargs,

    /// Informational retry counter. Not auto-incremented by the core.
    #[serde(default)]
    pub retry_count: u32,

    /// Identifier for one execution step, for tracing correlation.
    #[serde(default = "fresh_step_id")]
    pub step_id: String,

    /// Passthrough slot for an external tracer. The core never enters or
    /// inspects it, and it does not travel through serialized contexts.
    #[serde(skip)]
    pub span: Option<Span>,
}

impl Context {
    /// A default context: no deadline, empty metadata, fresh step id.
    pub fn new() -> Self {
        Self {
            deadline: None,
            metadata: Kwargs::new(),
            retry_count: 0,
            step_id: fresh_step_id(),
            span: None,
        }
    }

    /// A context with a validated monotonic deadline.
    pub fn with_deadline(deadline: f64) -> Result<Self, ContextError> {
        let mut ctx = Self::new();
        ctx.deadline = Some(validate_deadline(deadline)?);
        Ok(ctx)
    }

    /// Whether the deadline, if any, has passed. Processing functions that
    /// want timeout behavior check this and fail with
    /// [`ModuleError::timeout`](crate::errors::ModuleError::timeout).
    pub fn expired(&self) -> bool {
        self.deadline.map(|d| monotonic_now() > d).unwrap_or(false)
    }

    /// Derive a new context from `overrides` layered over `base`.
    ///
    /// Reserved keys (`ctx`, `deadline`, `timeout`, and the declared field
    /// names) are validated and **consumed** from `overrides`; every other
    /// key not starting with `_` is merged into metadata and likewise
    /// consumed. The consumption is intentional: it is how configuration is
    /// kept out of a module's business-logic arguments.
    ///
    /// Seeding order: an explicit `ctx` override wins over `base`, and
    /// explicit field overrides win over both.
    pub fn derive(base: Option<&Context>, overrides: &mut Kwargs) -> Result<Self, ContextError> {
        if overrides.contains_key(DEADLINE_KEY) && overrides.contains_key(TIMEOUT_KEY) {
            return Err(ContextError::DeadlineTimeoutConflict);
        }

        let mut ctx = match overrides.remove(CTX_KEY) {
            Some(value) => {
                let seeded: Context =
                    serde_json::from_value(value).map_err(|_| ContextError::InvalidCtx)?;
                if let Some(d) = seeded.deadline {
                    validate_deadline(d)?;
                }
                seeded
            }
            None => base.cloned().unwrap_or_default(),
        };

        if let Some(value) = overrides.remove(DEADLINE_KEY) {
            ctx.deadline = match value {
                Value::Null => None,
                other => {
                    let d = other.as_f64().ok_or_else(|| ContextError::InvalidField {
                        field: "deadline",
                        reason: "expected a number of monotonic seconds".to_string(),
                    })?;
                    Some(validate_deadline(d)?)
                }
            };
        }

        if let Some(value) = overrides.remove(METADATA_KEY) {
            match value {
                Value::Object(map) => ctx.metadata = map,
                _ => {
                    return Err(ContextError::InvalidField {
                        field: "metadata",
                        reason: "expected a string-keyed mapping".to_string(),
                    })
                }
            }
        }

        if let Some(value) = overrides.remove(RETRY_COUNT_KEY) {
            let count = value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| ContextError::InvalidField {
                    field: "retry_count",
                    reason: "expected a non-negative integer".to_string(),
                })?;
            ctx.retry_count = count;
        }

        if let Some(value) = overrides.remove(STEP_ID_KEY) {
            match value {
                Value::String(id) => ctx.step_id = id,
                _ => {
                    return Err(ContextError::InvalidField {
                        field: "step_id",
                        reason: "expected a string".to_string(),
                    })
                }
            }
        }

        if let Some(value) = overrides.remove(SPAN_KEY) {
            // The span slot is API-only; a live span cannot travel through
            // a configuration value.
            if !value.is_null() {
                return Err(ContextError::InvalidField {
                    field: "span",
                    reason: "spans can only be set on a Context directly".to_string(),
                });
            }
        }

        if let Some(value) = overrides.remove(TIMEOUT_KEY) {
            let t = value.as_f64().ok_or_else(|| ContextError::InvalidField {
                field: "timeout",
                reason: "expected a number of seconds".to_string(),
            })?;
            ctx.deadline = Some(monotonic_now() + t);
        }

        let meta_keys: Vec<String> = overrides
            .keys()
            .filter(|k| !k.starts_with(PRIVATE_PREFIX))
            .cloned()
            .collect();
        for key in meta_keys {
            if let Some(value) = overrides.remove(&key) {
                ctx.metadata.insert(key, value);
            }
        }

        Ok(ctx)
    }

    /// Derive from `overrides` layered over the ambient context. This is the
    /// entry point for scoped activation:
    ///
    /// ```ignore
    /// let ctx = Context::layered(&mut overrides)?;
    /// ctx.scope(async { /* ambient here */ }).await;
    /// ```
    pub fn layered(overrides: &mut Kwargs) -> Result<Self, ContextError> {
        Self::derive(Some(&Self::current()), overrides)
    }

    /// Snapshot of the ambient context for this thread, lazily installing a
    /// default base context if none is active yet.
    pub fn current() -> Self {
        scope::current()
    }

    /// Activate this context as ambient, returning the restoration token.
    /// Dropping the token restores the previously ambient context, on every
    /// exit path.
    pub fn attach(self) -> ContextGuard {
        scope::attach(self)
    }

    /// Run `fut` with this context ambient for its entire extent. Correct
    /// under task migration and interleaving; nesting composes LIFO.
    pub fn scope<'a, T>(self, fut: impl Future<Output = T> + Send + 'a) -> Scoped<'a, T> {
        Scoped::new(self, fut)
    }

    /// This context as a serialized value, suitable for the reserved `ctx`
    /// configuration key. The span slot is not carried.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_deadline(deadline: f64) -> Result<f64, ContextError> {
    if looks_like_wall_clock(deadline) {
        return Err(ContextError::WallClockDeadline { deadline });
    }
    Ok(deadline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::wall_clock_now;
    use serde_json::json;

    fn kwargs(value: Value) -> Kwargs {
        value.as_object().cloned().expect("test kwargs must be an object")
    }

    #[test]
    fn default_context_has_fresh_fields() {
        let ctx = Context::new();
        assert!(ctx.deadline.is_none());
        assert!(ctx.metadata.is_empty());
        assert_eq!(ctx.retry_count, 0);
        assert!(!ctx.step_id.is_empty());
        assert_ne!(ctx.step_id, Context::new().step_id);
    }

    #[test]
    fn monotonic_deadlines_are_accepted() {
        let deadline = monotonic_now() + 30.0;
        let ctx = Context::with_deadline(deadline).expect("monotonic deadline");
        assert_eq!(ctx.deadline, Some(deadline));
    }

    #[test]
    fn wall_clock_deadlines_are_rejected() {
        let err = Context::with_deadline(wall_clock_now() + 30.0).unwrap_err();
        assert!(matches!(err, ContextError::WallClockDeadline { .. }));
    }

    #[test]
    fn derive_converts_timeout_and_captures_metadata() {
        let mut overrides = kwargs(json!({"timeout": 30.0, "user_id": "12345"}));
        let before = monotonic_now();
        let ctx = Context::derive(None, &mut overrides).expect("derive");

        let deadline = ctx.deadline.expect("deadline set from timeout");
        assert!(deadline >= before + 30.0);
        assert!(deadline <= monotonic_now() + 30.0);
        assert_eq!(ctx.metadata.get("user_id"), Some(&json!("12345")));

        // Both keys were consumed from the overrides mapping.
        assert!(overrides.is_empty());
    }

    #[test]
    fn derive_leaves_private_keys_alone() {
        let mut overrides = kwargs(json!({"tag": "t", "_internal": 1}));
        let ctx = Context::derive(None, &mut overrides).expect("derive");
        assert_eq!(ctx.metadata.get("tag"), Some(&json!("t")));
        assert!(!ctx.metadata.contains_key("_internal"));
        assert!(overrides.contains_key("_internal"));
    }

    #[test]
    fn derive_rejects_deadline_and_timeout_together() {
        let mut overrides = kwargs(json!({
            "deadline": monotonic_now() + 30.0,
            "timeout": 30.0,
        }));
        let err = Context::derive(None, &mut overrides).unwrap_err();
        assert_eq!(err, ContextError::DeadlineTimeoutConflict);
    }

    #[test]
    fn derive_seeds_from_an_explicit_context() {
        let mut seed = Context::new();
        seed.metadata.insert("existing".to_string(), json!("value"));

        let mut overrides = kwargs(json!({"timeout": 30.0, "new_key": "new_value"}));
        overrides.insert(CTX_KEY.to_string(), seed.to_value());

        let ctx = Context::derive(None, &mut overrides).expect("derive");
        assert_eq!(ctx.metadata.get("existing"), Some(&json!("value")));
        assert_eq!(ctx.metadata.get("new_key"), Some(&json!("new_value")));
        assert!(ctx.deadline.is_some());
        assert_eq!(ctx.step_id, seed.step_id);
    }

    #[test]
    fn derive_rejects_a_non_context_ctx_value() {
        let mut overrides = kwargs(json!({"ctx": "not a context"}));
        let err = Context::derive(None, &mut overrides).unwrap_err();
        assert_eq!(err, ContextError::InvalidCtx);
    }

    #[test]
    fn derive_layers_over_the_base() {
        let mut base = Context::new();
        base.metadata.insert("inherited".to_string(), json!(true));
        base.retry_count = 2;

        let mut overrides = kwargs(json!({"extra": "e"}));
        let ctx = Context::derive(Some(&base), &mut overrides).expect("derive");
        assert_eq!(ctx.metadata.get("inherited"), Some(&json!(true)));
        assert_eq!(ctx.metadata.get("extra"), Some(&json!("e")));
        assert_eq!(ctx.retry_count, 2);
    }

    #[test]
    fn derive_applies_declared_fields() {
        let mut overrides = kwargs(json!({
            "retry_count": 3,
            "step_id": "step-42",
            "metadata": {"seeded": "yes"},
        }));
        let ctx = Context::derive(None, &mut overrides).expect("derive");
        assert_eq!(ctx.retry_count, 3);
        assert_eq!(ctx.step_id, "step-42");
        assert_eq!(ctx.metadata.get("seeded"), Some(&json!("yes")));
        assert!(overrides.is_empty());
    }

    #[test]
    fn derive_rejects_a_span_configuration_value() {
        let mut overrides = kwargs(json!({"span": "nope"}));
        let err = Context::derive(None, &mut overrides).unwrap_err();
        assert!(matches!(err, ContextError::InvalidField { field: "span", .. }));
    }

    #[tokio::test]
    async fn layered_contexts_restore_after_the_scope() {
        let mut outer_cfg = kwargs(json!({"initial": "value"}));
        let outer = Context::layered(&mut outer_cfg).expect("outer");

        outer
            .scope(async {
                let mut inner_cfg = kwargs(json!({"timeout": 30.0, "user_id": "12345"}));
                let inner = Context::layered(&mut inner_cfg).expect("inner");
                inner
                    .scope(async {
                        let current = Context::current();
                        assert_eq!(current.metadata.get("user_id"), Some(&json!("12345")));
                        assert_eq!(current.metadata.get("initial"), Some(&json!("value")));
                        assert!(current.deadline.is_some());
                    })
                    .await;

                let restored = Context::current();
                assert_eq!(restored.metadata.get("initial"), Some(&json!("value")));
                assert!(!restored.metadata.contains_key("user_id"));
            })
            .await;
    }

    #[tokio::test]
    async fn restoration_holds_when_the_scope_errors() {
        let mut outer_cfg = kwargs(json!({"initial": "value"}));
        let outer = Context::layered(&mut outer_cfg).expect("outer");

        outer
            .scope(async {
                let mut inner_cfg = kwargs(json!({"user_id": "12345"}));
                let inner = Context::layered(&mut inner_cfg).expect("inner");
                let result: Result<(), &str> = inner
                    .scope(async {
                        assert_eq!(
                            Context::current().metadata.get("user_id"),
                            Some(&json!("12345"))
                        );
                        Err("test error")
                    })
                    .await;
                assert!(result.is_err());

                let restored = Context::current();
                assert_eq!(restored.metadata.get("initial"), Some(&json!("value")));
                assert!(!restored.metadata.contains_key("user_id"));
            })
            .await;
    }

    #[test]
    fn serde_round_trip_preserves_fields_but_not_span() {
        let mut ctx = Context::new();
        ctx.deadline = Some(monotonic_now() + 10.0);
        ctx.metadata.insert("k".to_string(), json!("v"));
        ctx.retry_count = 1;
        ctx.span = Some(tracing::debug_span!("step"));

        let value = ctx.to_value();
        let back: Context = serde_json::from_value(value).expect("round trip");
        assert_eq!(back.deadline, ctx.deadline);
        assert_eq!(back.metadata, ctx.metadata);
        assert_eq!(back.retry_count, 1);
        assert_eq!(back.step_id, ctx.step_id);
        assert!(back.span.is_none());
    }
}

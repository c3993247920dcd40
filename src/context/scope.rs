// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Ambient context storage and scoped activation.
//!
//! The ambient slot is a thread-local LIFO stack of [`Context`] values.
//! Synchronous code activates a context with [`Context::attach`], holding the
//! returned guard for the dynamic extent of the activation. Asynchronous code
//! uses [`Context::scope`], which re-attaches the context around **every
//! poll** of the wrapped future, so the ambient slot stays correct when the
//! runtime migrates a task between worker threads and when sibling tasks
//! interleave on the same thread.

use std::cell::RefCell;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use crate::context::Context;

thread_local! {
    static AMBIENT: RefCell<Vec<Context>> = const { RefCell::new(Vec::new()) };
}

/// Snapshot of the ambient context for the calling thread, lazily installing
/// a default base context if none is active yet.
pub(crate) fn current() -> Context {
    AMBIENT.with(|stack| {
        let mut stack = stack.borrow_mut();
        if stack.is_empty() {
            stack.push(Context::new());
        }
        stack.last().cloned().unwrap_or_else(Context::new)
    })
}

/// Push `ctx` onto the ambient stack, returning its restoration point.
pub(crate) fn attach(ctx: Context) -> ContextGuard {
    let restore_len = AMBIENT.with(|stack| {
        let mut stack = stack.borrow_mut();
        let len = stack.len();
        stack.push(ctx);
        len
    });
    ContextGuard {
        restore_len,
        _not_send: PhantomData,
    }
}

/// Restoration token returned by [`Context::attach`].
///
/// Dropping the guard restores the context that was ambient immediately
/// before the corresponding attach. Restoration is stack-disciplined: the
/// guard remembers the depth it must restore to, so dropping an outer guard
/// before an inner one still leaves the stack at the outer guard's
/// restoration point. The guard is deliberately not `Send`; an activation
/// belongs to the thread that created it.
#[derive(Debug)]
pub struct ContextGuard {
    restore_len: usize,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        AMBIENT.with(|stack| {
            let mut stack = stack.borrow_mut();
            stack.truncate(self.restore_len);
        });
    }
}

/// Future wrapper produced by [`Context::scope`].
///
/// Attaches its context before each poll of the inner future and restores
/// the previous ambient context afterwards, on every exit path.
pub struct Scoped<'a, T> {
    ctx: Context,
    inner: Pin<Box<dyn Future<Output = T> + Send + 'a>>,
}

impl<'a, T> Scoped<'a, T> {
    pub(crate) fn new(ctx: Context, fut: impl Future<Output = T> + Send + 'a) -> Self {
        Self {
            ctx,
            inner: Box::pin(fut),
        }
    }
}

impl<T> Future for Scoped<'_, T> {
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        // All fields are Unpin (the inner future is boxed), so projecting
        // through get_mut is safe.
        let this = self.as_mut().get_mut();
        let _guard = attach(this.ctx.clone());
        this.inner.as_mut().poll(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tagged(tag: &str) -> Context {
        let mut ctx = Context::new();
        ctx.metadata.insert("tag".to_string(), json!(tag));
        ctx
    }

    fn current_tag() -> Option<String> {
        current()
            .metadata
            .get("tag")
            .and_then(|v| v.as_str().map(str::to_string))
    }

    #[test]
    fn attach_is_lifo() {
        let base_tag = current_tag();

        let guard_a = attach(tagged("a"));
        assert_eq!(current_tag().as_deref(), Some("a"));

        let guard_b = attach(tagged("b"));
        assert_eq!(current_tag().as_deref(), Some("b"));

        drop(guard_b);
        assert_eq!(current_tag().as_deref(), Some("a"));

        drop(guard_a);
        assert_eq!(current_tag(), base_tag);
    }

    #[test]
    fn out_of_order_drop_restores_to_the_outer_point() {
        let guard_a = attach(tagged("a"));
        let guard_b = attach(tagged("b"));

        // Dropping the outer guard first truncates past the inner one.
        drop(guard_a);
        assert_eq!(current_tag(), None);

        // The stale inner guard is a no-op afterwards.
        drop(guard_b);
        assert_eq!(current_tag(), None);
    }

    #[test]
    fn restoration_survives_a_panic_inside_the_scope() {
        let guard = attach(tagged("outer"));
        let result = std::panic::catch_unwind(|| {
            let _inner = attach(tagged("inner"));
            panic!("boom");
        });
        assert!(result.is_err());
        assert_eq!(current_tag().as_deref(), Some("outer"));
        drop(guard);
    }

    #[tokio::test]
    async fn scoped_futures_attach_per_poll() {
        let outer = tagged("outer");
        let inner = tagged("inner");

        outer
            .scope(async move {
                assert_eq!(current_tag().as_deref(), Some("outer"));
                inner
                    .scope(async {
                        assert_eq!(current_tag().as_deref(), Some("inner"));
                        tokio::task::yield_now().await;
                        // Still ambient after resuming from a suspension point.
                        assert_eq!(current_tag().as_deref(), Some("inner"));
                    })
                    .await;
                assert_eq!(current_tag().as_deref(), Some("outer"));
            })
            .await;
    }

    #[tokio::test]
    async fn sibling_scopes_do_not_observe_each_other() {
        let a = tagged("a");
        let b = tagged("b");

        let fut_a = a.scope(async {
            tokio::task::yield_now().await;
            current_tag()
        });
        let fut_b = b.scope(async {
            tokio::task::yield_now().await;
            current_tag()
        });

        let (seen_a, seen_b) = tokio::join!(fut_a, fut_b);
        assert_eq!(seen_a.as_deref(), Some("a"));
        assert_eq!(seen_b.as_deref(), Some("b"));
    }
}

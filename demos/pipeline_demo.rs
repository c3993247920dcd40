use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use flowstack::backends::{AsyncFn, SyncFn};
use flowstack::{Conditional, Context, Delay, Kwargs, Module, ModuleExt, ModuleError, Parallel, Retry, Sequential};

/// Demo showing a small pipeline: normalize -> fan out to two scorers ->
/// pick a branch on the combined score, with a retry wrapper around the
/// whole thing.
async fn run_pipeline_demo() -> anyhow::Result<()> {
    println!("=== flowstack pipeline demo ===\n");

    // A synchronous leaf: runs on the blocking pool, reads the ambient
    // context like any other step.
    let normalize = SyncFn::new("normalize", |args, _kwargs| {
        let text = args
            .first()
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        let ctx = Context::current();
        println!(
            "[normalize] step {} (deadline set: {})",
            ctx.step_id,
            ctx.deadline.is_some()
        );
        Ok(json!(text))
    });

    // Two asynchronous scorers, fanned out in parallel with isolated
    // context snapshots.
    let length_scorer = AsyncFn::new("length_scorer", |args, _kwargs| {
        Box::pin(async move {
            let text = args.first().and_then(Value::as_str).unwrap_or_default().to_string();
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(json!(text.len() as i64))
        }) as futures::future::BoxFuture<'static, Result<Value, ModuleError>>
    });
    let word_scorer = AsyncFn::new("word_scorer", |args, _kwargs| {
        Box::pin(async move {
            let text = args.first().and_then(Value::as_str).unwrap_or_default().to_string();
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok(json!(text.split_whitespace().count() as i64))
        }) as futures::future::BoxFuture<'static, Result<Value, ModuleError>>
    });

    let combine = SyncFn::new("combine", |args, _kwargs| {
        let total: i64 = args.iter().filter_map(Value::as_i64).sum();
        Ok(json!(total))
    });

    let verdict = Conditional::new(
        |args: &[Value]| args.first().and_then(Value::as_i64).unwrap_or(0) > 10,
        Arc::new(SyncFn::new("long_text", |args, _kw| {
            let score = args.first().and_then(Value::as_i64).unwrap_or(0);
            Ok(json!(format!("long text (score {})", score)))
        })),
        Arc::new(SyncFn::new("short_text", |args, _kw| {
            let score = args.first().and_then(Value::as_i64).unwrap_or(0);
            Ok(json!(format!("short text (score {})", score)))
        })),
    );

    let pipeline = Sequential::new(vec![
        Arc::new(normalize) as Arc<dyn Module>,
        Arc::new(Parallel::new(vec![
            Arc::new(length_scorer) as Arc<dyn Module>,
            Arc::new(word_scorer),
        ])),
        Arc::new(combine),
        Arc::new(Delay::new(Duration::from_millis(10))),
        Arc::new(verdict),
    ]);

    // Static configuration: a relative timeout plus a metadata tag, merged
    // with call-time keywords at every invocation.
    let pipeline = Retry::with_defaults(Arc::new(
        pipeline.with_cfg(
            json!({"timeout": 5.0, "tenant": "demo"})
                .as_object()
                .cloned()
                .unwrap_or_default(),
        ),
    ));

    let input = "  Hello, World! This is a test.  ";
    println!("Input: '{}'", input);

    let result = pipeline.invoke(vec![json!(input)], Kwargs::new()).await?;
    println!("\nResult: {}", result);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flowstack=debug".into()),
        )
        .init();

    run_pipeline_demo().await
}

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use serde::Deserialize;
use tokio::time::{Duration, sleep};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ferry_core::{
    BoxError, ExecutorBuilder, ExecutorConfig, InMemoryTaskStorage, TaskContext, TaskHandler, TaskOptions,
};

/// Drive the executor with a batch of demo tasks against in-memory storage.
#[derive(Debug, Parser)]
#[command(name = "ferry", version)]
struct Args {
    /// TOML file with executor settings; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    concurrency: Option<usize>,

    #[arg(long)]
    task_buffer: Option<usize>,

    #[arg(long)]
    task_timeout_ms: Option<u64>,

    /// Number of tasks to submit
    #[arg(long, default_value_t = 10)]
    tasks: usize,

    /// How long each handler invocation sleeps
    #[arg(long, default_value_t = 50)]
    work_ms: u64,

    /// Fail every Nth request (0 = never)
    #[arg(long, default_value_t = 0)]
    fail_every: u32,
}

#[derive(Debug, Deserialize)]
struct HelloPayload {
    name: String,
}

struct HelloHandler {
    work: Duration,
    fail_every: u32,
    seen: AtomicU32,
}

impl HelloHandler {
    fn new(work: Duration, fail_every: u32) -> Self {
        Self {
            work,
            fail_every,
            seen: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl TaskHandler<serde_json::Value, String> for HelloHandler {
    async fn handle(&self, ctx: TaskContext, request: serde_json::Value) -> Result<String, BoxError> {
        let p: HelloPayload = serde_json::from_value(request).map_err(|e| format!("json decode: {e}"))?;

        let n = self.seen.fetch_add(1, Ordering::Relaxed) + 1;
        if self.fail_every > 0 && n % self.fail_every == 0 {
            return Err(format!("intentional failure (request #{n})").into());
        }

        // timeout / shutdown が来たら途中でやめる
        tokio::select! {
            _ = sleep(self.work) => {}
            _ = ctx.cancelled() => return Err("cancelled before finishing".into()),
        }

        Ok(format!("Hello, {}!", p.name))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    // (A) 設定: ファイル → フラグの順に上書き
    let mut config = match &args.config {
        Some(path) => ExecutorConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ExecutorConfig::default(),
    };
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(task_buffer) = args.task_buffer {
        config.task_buffer = task_buffer;
    }
    if let Some(ms) = args.task_timeout_ms {
        config.task_timeout_ms = Some(ms);
    }

    // (B) Storage と Handler を用意して Executor を起動
    let storage = Arc::new(InMemoryTaskStorage::<serde_json::Value, String>::new());
    let handler = Arc::new(HelloHandler::new(Duration::from_millis(args.work_ms), args.fail_every));
    let executor = ExecutorBuilder::<serde_json::Value, String>::new(handler, storage.clone()).config(config).build()?;

    // (C) タスク投入（バッファが詰まったら AdmissionTimeout が返る）
    let mut admitted = Vec::with_capacity(args.tasks);
    let mut rejected = 0usize;
    for i in 0..args.tasks {
        let id = format!("hello-{i}");
        let payload = serde_json::json!({ "name": format!("ferry #{i}") });
        match executor.send_task(id.as_str(), payload, TaskOptions::default()).await {
            Ok(()) => admitted.push(id),
            Err(err) => {
                println!("rejected {id}: {err}");
                rejected += 1;
            }
        }
    }
    info!(admitted = admitted.len(), rejected, "submitted tasks");

    // (D) 完了をポーリングで待つ
    let mut succeeded = 0usize;
    let mut failed = 0usize;
    for id in &admitted {
        let result = loop {
            let result = executor.get_result(id.as_str()).await?;
            if result.is_done() {
                break result;
            }
            sleep(Duration::from_millis(20)).await;
        };
        match (result.response(), result.error()) {
            (_, Some(err)) => {
                failed += 1;
                println!("{id}: failed: {err}");
            }
            (Some(resp), None) => {
                succeeded += 1;
                println!("{id}: {resp} ({:?})", result.elapsed().unwrap_or_default());
            }
            (None, None) => println!("{id}: done without a response"),
        }
    }

    println!(
        "summary: admitted={} rejected={rejected} succeeded={succeeded} failed={failed} stored={}",
        admitted.len(),
        storage.len().await
    );

    // (E) graceful shutdown
    executor.shutdown_and_join().await;
    Ok(())
}

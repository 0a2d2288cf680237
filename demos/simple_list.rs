//! # Example: simple_list
//!
//! A release pipeline with a nested, concurrent test stage.
//!
//! Demonstrates how to:
//! - Share data between tasks through the run [`Context`].
//! - Expand a task into a concurrent nested list with [`Subtasks`].
//! - Skip and gate tasks with predicates.
//! - Add a task while the run is in flight.
//!
//! ## Flow
//! ```text
//! [prepare] ──► [test] ──► unit ┐
//!                          lint ├─ concurrent, shared context
//!                          docs ┘
//!           ──► [publish]   (enabled once tests wrote "tested")
//!           ──► [deploy]    (skipped: dry run)
//!           ──► [cleanup]   (added by prepare)
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example simple_list
//! ```

use std::time::Duration;

use taskline::{Concurrency, Config, Context, Controller, Subtasks, TaskHandle, TaskSpec};
use tracing_subscriber::EnvFilter;

fn step(title: &'static str, ms: u64) -> TaskSpec {
    TaskSpec::new(title, move |ctx: Context, task: TaskHandle| async move {
        task.set_output(format!("{title}: working"));
        tokio::time::sleep(Duration::from_millis(ms)).await;
        ctx.insert(title, true);
        Ok(())
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let list = Controller::new(
        [
            TaskSpec::new("prepare", |ctx: Context, task: TaskHandle| async move {
                ctx.insert("dry-run", true);
                task.add(step("cleanup", 50)).map_err(taskline::TaskError::fail)
            }),
            TaskSpec::new("test", |_, _| async {
                Ok(Subtasks::new(vec![step("unit", 300), step("lint", 100), step("docs", 200)])
                    .concurrency(Concurrency::Unbounded))
            }),
            step("publish", 150).enabled(|ctx: &Context| ctx.contains("unit")),
            step("deploy", 150).skip(|ctx: &Context| {
                ctx.get::<bool>("dry-run")
                    .unwrap_or(false)
                    .then(|| "dry run".to_string())
            }),
        ],
        Config::default().with_renderer("verbose"),
    )?;

    let ctx = list.run().await?;
    println!("context keys: {:?}", ctx.keys());
    Ok(())
}

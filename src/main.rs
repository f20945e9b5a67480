// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context};
use std::env;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use reelforge::config::{load_and_validate_config, RuntimeBuilder};
use reelforge::model::{JobConfig, JobStatus};

const OWNER_ID: &str = "cli";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries the JSON event stream.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 || args.len() > 4 {
        eprintln!("Usage: {} <pipeline.yaml> <prompt> [duration_seconds]", args[0]);
        eprintln!(
            "Example: {} configs/local.yaml \"launch announcement\" 12",
            args[0]
        );
        std::process::exit(2);
    }

    let config_path = &args[1];
    let prompt = &args[2];
    let mut job_config = JobConfig::default();
    if let Some(duration) = args.get(3) {
        job_config.duration_secs = duration
            .parse()
            .with_context(|| format!("duration_seconds must be a whole number, got '{}'", duration))?;
    }

    let config = load_and_validate_config(config_path)
        .with_context(|| format!("Failed to load {}", config_path))?;
    let controller = RuntimeBuilder::from_config(&config)
        .await
        .context("Failed to build pipeline runtime")?;

    let (job_id, mut events) = controller
        .submit_and_subscribe(OWNER_ID, prompt, job_config)
        .await?;
    info!(job_id = %job_id, config = %config_path, "Job submitted");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    println!("{}", serde_json::to_string(&event)?);
                    if event.is_terminal() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Progress output fell behind"),
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                warn!(job_id = %job_id, "Interrupted, cancelling job");
                controller.cancel(job_id).await?;
            }
        }
    }

    let job = controller.wait(job_id).await?;
    println!("{}", serde_json::to_string_pretty(&job)?);

    if job.status != JobStatus::Completed {
        bail!("Job {} ended {}: {}", job.id, job.status, job.current_step);
    }
    Ok(())
}

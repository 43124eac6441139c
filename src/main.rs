use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tracing::{error, info};

mod models;
mod utils;

use crate::models::summary_model::FileSummary;
use crate::utils::conf_helper::{get_config_source, init_config};
use outb_reader::read_with_options;

#[tokio::main]
async fn main() -> Result<()> {
    // === CONFIG ===
    let config = init_config()
        .await
        .map_err(anyhow::Error::msg)
        .context("CRITICAL INIT FAILURE")?;

    tracing_subscriber::fmt()
        .with_max_level(config.level())
        .init();

    match get_config_source() {
        Some(path) => info!("Config loaded from {}", path.display()),
        None => info!("Using default config"),
    }

    let paths: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        bail!("usage: outb-inspect <FILE.outb>...");
    }

    let options = config.read_options();
    let window = config.window();

    // reads share nothing, run them side by side
    let tasks: Vec<_> = paths
        .into_iter()
        .map(|path| {
            tokio::task::spawn_blocking(move || {
                let result = read_with_options(&path, &options);
                (path, result)
            })
        })
        .collect();

    let mut failures = 0;
    for task in tasks {
        let (path, result) = task.await.context("reader task panicked")?;

        match result {
            Ok((table, metadata)) => {
                info!(
                    "{}: {} steps x {} channels (format {})",
                    path.display(),
                    table.n_rows(),
                    table.n_columns() - 1,
                    metadata.format_id
                );

                let table = match window {
                    Some((start, end)) => table.window(start, end),
                    None => table,
                };

                let summary = FileSummary::new(&path, &table, &metadata);
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            Err(e) => {
                error!("Failed to read {}: {}", path.display(), e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{failures} file(s) could not be read");
    }

    Ok(())
}

//! FolderSleuth — folder size viewer with a persistent scan cache.
//!
//! Thin binary entry point. All logic lives in the `foldersleuth-core`
//! and `foldersleuth-cli` crates.

use anyhow::Context;
use clap::Parser;
use foldersleuth_cli::render::{render_json, render_progress, render_text};
use foldersleuth_cli::App;
use foldersleuth_core::FolderCache;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Show the size of every subfolder of FOLDER, reusing cached results.
#[derive(Debug, Parser)]
#[command(name = "foldersleuth", version, about)]
struct Args {
    /// Folder whose immediate subfolders are listed and sized.
    #[arg(default_value = ".")]
    folder: PathBuf,

    /// Cache store file.
    #[arg(long, default_value = "folder_cache.db")]
    db: PathBuf,

    /// Forget cached sizes of the listed subfolders before scanning.
    #[arg(long)]
    invalidate: bool,

    /// Print the final table as JSON.
    #[arg(long)]
    json: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout carries only the table.
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("FolderSleuth starting");

    let cache = Arc::new(
        FolderCache::open(&args.db)
            .with_context(|| format!("opening cache store {}", args.db.display()))?,
    );

    let mut app = App::new(Arc::clone(&cache), &args.folder);
    if args.invalidate {
        app.invalidate_all()?;
    }

    let show_progress = !args.json;
    app.run(|table, event| {
        if !show_progress {
            return;
        }
        if let Some(line) = render_progress(table, event) {
            let mut stderr = std::io::stderr().lock();
            let _ = write!(stderr, "\r\x1b[2K{line}");
            let _ = stderr.flush();
        }
    })?;
    if show_progress {
        eprintln!();
    }

    if args.json {
        println!("{}", render_json(&app.table)?);
    } else {
        print!("{}", render_text(&app.table));
    }

    // The worker must be gone before the store handle is released.
    drop(app);
    cache.close().context("closing cache store")?;
    Ok(())
}

use std::{fs, io::Write, path::PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use searchsync::{
    config,
    processing::{ContentEvent, RawPost, SyncService},
};

/// Replay a Ghost post webhook payload into the search index, bypassing the request gate.
#[derive(Parser)]
#[command(
    name = "sync-post",
    about = "Sync a single post from a webhook payload file"
)]
struct Cli {
    /// Path to a JSON file shaped like `{"post": {"current": {...}}}`.
    #[arg(long)]
    payload: PathBuf,
    /// Print the finalized fragments as JSON instead of writing them.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load()?;

    let content = fs::read_to_string(&cli.payload)
        .with_context(|| format!("failed to read payload at {}", cli.payload.display()))?;
    let event: ContentEvent =
        serde_json::from_str(&content).context("failed to parse webhook payload")?;
    let Some(current) = event.into_current() else {
        bail!("payload has no post.current object");
    };
    let raw: RawPost = serde_json::from_value(serde_json::Value::Object(current))
        .context("post.current is not a valid post")?;
    let title = raw.title.clone().unwrap_or_default();

    let service = SyncService::new(config)?;
    let Some(fragments) = service.prepare(raw)? else {
        println!("Post \"{title}\" is excluded from the index.");
        return Ok(());
    };

    if cli.dry_run {
        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, &fragments)?;
        writeln!(stdout)?;
        return Ok(());
    }

    let summary = service.index(fragments).await?;
    println!(
        "Post \"{title}\" has been added to the index ({} records).",
        summary.records
    );
    Ok(())
}

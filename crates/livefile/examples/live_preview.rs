//! Live preview of a text file.
//!
//! Prints a short summary of the file every time it changes: line, word
//! and byte counts plus the first few lines.
//!
//! # Running
//!
//! ```bash
//! echo 'hello world' > /tmp/notes.txt
//!
//! RUST_LOG=livefile=debug cargo run --example live_preview -- /tmp/notes.txt
//!
//! # In another terminal
//! echo 'hello again' >> /tmp/notes.txt
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use livefile::{LiveFile, ReloadPolicy};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "live_preview")]
#[command(about = "Print a summary of a file whenever it changes", long_about = None)]
struct Args {
    /// File to watch
    path: PathBuf,

    /// Minimum interval between reloads, in milliseconds
    #[arg(short, long, default_value_t = 100)]
    delay_ms: u64,

    /// Run one read at a time instead of letting reads overlap
    #[arg(long)]
    serialized: bool,

    /// Number of lines to include in the preview
    #[arg(short, long, default_value_t = 5)]
    lines: usize,

    /// Stop after this many seconds (runs until interrupted if omitted)
    #[arg(long)]
    duration_secs: Option<u64>,
}

/// Preview settings handed to the renderer on each call.
#[derive(Debug, Clone, Copy)]
struct Preview {
    lines: usize,
}

fn summarize(text: &str, preview: &Preview) -> String {
    let mut out = format!(
        "{} lines, {} words, {} bytes\n",
        text.lines().count(),
        text.split_whitespace().count(),
        text.len()
    );
    for line in text.lines().take(preview.lines) {
        out.push_str("  | ");
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let policy = if args.serialized {
        ReloadPolicy::Serialized
    } else {
        ReloadPolicy::Overlapping
    };
    let preview = Preview { lines: args.lines };

    let live: Arc<LiveFile<Preview, String>> = Arc::new(
        LiveFile::builder(&args.path)
            .watcher_delay(Duration::from_millis(args.delay_ms))
            .policy(policy)
            .renderer(|text: &str, preview: &Preview| Ok(summarize(text, preview)))
            .on_error(|err| {
                eprintln!("{:?}", miette::Report::new(err));
            })
            .start(),
    );

    // The handler needs the live file to render, so bind it after start.
    let weak = Arc::downgrade(&live);
    live.on_reload(move |reload| {
        let Some(live) = weak.upgrade() else { return };
        println!("\n[{}] epoch {}", reload.trigger, reload.epoch);
        match live.render(&preview) {
            Ok(summary) => print!("{summary}"),
            Err(err) => eprintln!("{:?}", miette::Report::new(err)),
        }
    });

    println!("Watching {} (Ctrl+C to exit)", args.path.display());
    if live.epoch() > 0
        && let Ok(summary) = live.render(&preview)
    {
        print!("{summary}");
    }

    let deadline = args
        .duration_secs
        .map(|secs| Instant::now() + Duration::from_secs(secs));
    while deadline.is_none_or(|d| Instant::now() < d) {
        thread::sleep(Duration::from_millis(200));
    }

    live.destroy();
    Ok(())
}

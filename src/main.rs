use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};

use playhead::{
    demo_script, ActionStatus, EngineConfig, FeedItem, Player, RedactionConfig, RenderSnapshot,
    Tape, TapeControl, TapeWriter,
};

#[derive(Parser)]
#[command(name = "playhead", about = "Record, scrub, and replay agent activity timelines")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the built-in scripted agent and follow it live
    Demo {
        /// Delay between scripted actions, in milliseconds
        #[arg(long, default_value_t = 150)]
        delay_ms: u64,
        /// Also record the run to a tape file
        #[arg(long)]
        tape: Option<PathBuf>,
    },
    /// Load a tape and project the views at a timeline position
    Replay {
        tape: PathBuf,
        /// Position to scrub to (defaults to the tape's control line, else the tip)
        #[arg(long)]
        at: Option<u64>,
    },
    /// Copy a tape with secrets redacted, for sharing
    Redact { input: PathBuf, output: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Demo { delay_ms, tape } => demo(delay_ms, tape).await,
        Command::Replay { tape, at } => replay(&tape, at),
        Command::Redact { input, output } => redact(&input, &output),
    }
}

async fn demo(delay_ms: u64, tape_path: Option<PathBuf>) -> Result<()> {
    let config = EngineConfig::default().with_env_overrides();
    let player = Player::new(config);

    let writer = match &tape_path {
        Some(path) => Some(TapeWriter::create(path).context("creating tape")?),
        None => None,
    };

    let mut views = player.subscribe();
    let source = demo_script().with_delay(Duration::from_millis(delay_ms));
    let total = source.len();

    let feed_player = player.clone();
    let mut script = tokio::spawn(async move { source.run(feed_player.as_ref()).await });

    // Follow live: print each feed row once, as it resolves. The loop is
    // bounded by script completion, so a step that never resolves cannot
    // stall the demo.
    let mut printed = 0usize;
    let mut script_done = false;
    while printed < total && !script_done {
        tokio::select! {
            result = &mut script => {
                result?;
                script_done = true;
            }
            result = views.changed() => {
                result?;
                let snap = views.borrow().clone();
                printed += print_resolved_rows(&snap, printed);
            }
        }
    }
    if !script_done {
        script.await?;
    }

    // Rows still unresolved when the script finished print as-is.
    let snap = player.snapshot();
    for item in snap.activity_feed.iter().skip(printed) {
        print_feed_row(item);
    }
    print_views(&snap);

    if let Some(writer) = writer {
        for record in player.log().snapshot() {
            writer.append(&record)?;
        }
        writer.finish(TapeControl {
            position: snap.activity_feed.len() as u64,
            mode: snap.mode,
        })?;
        if let Some(path) = tape_path {
            println!("\nrecorded tape: {}", path.display());
        }
    }
    Ok(())
}

fn replay(path: &PathBuf, at: Option<u64>) -> Result<()> {
    let tape = Tape::read_jsonl_from_path(path).context("reading tape")?;
    let created = Local
        .timestamp_millis_opt(tape.created_at_ms as i64)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".into());
    println!(
        "tape: schema v{}, created {created}, {} records",
        tape.schema_version,
        tape.records.len()
    );

    let log = tape.replay_into_log().context("replaying tape")?;
    let player = Player::over_log(log, EngineConfig::default().with_env_overrides());

    let position = at.or(tape.control.map(|c| c.position));
    if let Some(position) = position {
        player.seek(position);
    }
    print_views(&player.snapshot());
    Ok(())
}

fn redact(input: &PathBuf, output: &PathBuf) -> Result<()> {
    let mut tape = Tape::read_jsonl_from_path(input).context("reading tape")?;
    RedactionConfig::default_shareable().redact_tape(&mut tape);
    tape.write_jsonl_to_path(output).context("writing tape")?;
    println!("redacted tape written to {}", output.display());
    Ok(())
}

fn print_feed_row(item: &FeedItem) {
    println!("{:>3}  {} {}", item.seq, item.glyph, item.label);
    for line in &item.detail {
        println!("        {line}");
    }
}

/// Print feed rows from `printed` onward, stopping at the first row whose
/// scripted step has not resolved yet. Returns how many rows were printed.
fn print_resolved_rows(snap: &RenderSnapshot, printed: usize) -> usize {
    let mut count = 0;
    for item in snap.activity_feed.iter().skip(printed) {
        if item.status == ActionStatus::InProgress {
            break;
        }
        print_feed_row(item);
        count += 1;
    }
    count
}

fn print_views(snap: &RenderSnapshot) {
    println!("\n── activity ({:.0}%, {:?}) ──", snap.progress * 100.0, snap.mode);
    for item in &snap.activity_feed {
        println!("{:>3}  {} {}", item.seq, item.glyph, item.label);
    }
    if snap.unseen > 0 {
        println!("     … {} newer action(s) behind the cursor", snap.unseen);
    }
    if let Some(path) = &snap.active_path {
        println!("\n── {path} ──");
        println!("{}", snap.active_file_content);
    }
    if !snap.terminal_lines.is_empty() {
        println!("── terminal ──");
        for line in &snap.terminal_lines {
            println!("{line}");
        }
    }
}

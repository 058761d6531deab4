//! `jot` — inspect the mention engine from the command line.
//!
//! Reads `jot.toml` (or the path given with `--config`) for contacts, a
//! place gazetteer and journal tunables, optionally layered with `JOT_*`
//! environment variables.
//!
//! # Usage
//!
//! ```
//! jot extract "Lunch with @Alice at @Deli"
//! jot mentions --log log.json "Call @alice tomorrow"
//! jot reconcile --log log.json
//! jot suggest --log log.json "dinner @de"
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use jot_core::{
  classify::{KnownEntities, mentions_in},
  entity::Registries,
  extract::extract,
  message::Message,
  reconcile::reconcile,
  store::PlaceResult,
};
use jot_journal::{Composer, JournalConfig, StaticPlaceSearch};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Inspect jot mention extraction")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "jot.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// List the raw `@` candidates in TEXT with their byte ranges.
  Extract { text: String },

  /// Print the mentions TEXT would carry, as JSON.
  Mentions {
    text: String,

    /// JSON message log whose registries count as known names.
    #[arg(long, value_name = "FILE")]
    log: Option<PathBuf>,
  },

  /// Rebuild the registries from a JSON message log and print them.
  Reconcile {
    #[arg(long, value_name = "FILE")]
    log: PathBuf,
  },

  /// Print the suggestions for INPUT, including place search results.
  Suggest {
    input: String,

    #[arg(long, value_name = "FILE")]
    log: Option<PathBuf>,
  },
}

// ─── Config file ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CliConfig {
  /// Contact display names, standing in for the address book.
  contacts: Vec<String>,
  /// Gazetteer served by place search.
  places:   Vec<PlaceResult>,
  journal:  JournalConfig,
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("JOT").separator("__"))
    .build()
    .context("failed to read config file")?;

  let cfg: CliConfig = settings
    .try_deserialize()
    .context("failed to deserialise CliConfig")?;

  match cli.command {
    Command::Extract { text } => {
      for span in extract(&text) {
        if let Some(range) = span.range().as_range() {
          println!("{}..{}\t{}", range.start, range.end, span.text());
        }
      }
    }

    Command::Mentions { text, log } => {
      let registries = registries_from(log.as_deref())?;
      let known = KnownEntities::from_sources(&cfg.contacts, &registries);
      print_json(&mentions_in(&text, &known))?;
    }

    Command::Reconcile { log } => {
      let log = read_log(&log)?;
      print_json(&reconcile(&log))?;
    }

    Command::Suggest { input, log } => {
      let registries = registries_from(log.as_deref())?;
      let search = StaticPlaceSearch::new(cfg.places);
      let mut composer = Composer::new(Arc::new(search), &cfg.journal);
      composer.update(&input, &cfg.contacts, &registries.places);
      composer.settle().await;
      print_json(&composer.items())?;
    }
  }

  Ok(())
}

/// Read a JSON array of messages, re-validating every mention range.
fn read_log(path: &Path) -> anyhow::Result<Vec<Message>> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading message log {}", path.display()))?;
  let messages: Vec<Message> = serde_json::from_str(&raw)
    .with_context(|| format!("parsing message log {}", path.display()))?;

  let log = messages
    .into_iter()
    .map(|m| {
      let id = m.id;
      Message::from_parts(m.id, m.text, m.timestamp, m.mentions)
        .with_context(|| format!("message {id} is malformed"))
    })
    .collect::<anyhow::Result<Vec<_>>>()?;

  tracing::info!(count = log.len(), "loaded message log");
  Ok(log)
}

fn registries_from(path: Option<&Path>) -> anyhow::Result<Registries> {
  match path {
    Some(path) => Ok(reconcile(&read_log(path)?)),
    None => Ok(Registries::default()),
  }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
  let json =
    serde_json::to_string_pretty(value).context("failed to serialise output")?;
  println!("{json}");
  Ok(())
}

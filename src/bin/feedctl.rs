//! feedctl: drive a lifelog feed against a fixture-seeded in-memory store
//!
//! Each invocation loads the fixture, runs one command and prints the
//! resulting timeline. Useful for checking pin and pagination behavior
//! without a backend.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::info;

use lifelog_feed::{
    FeedClient, FeedConfig, FeedItem, FeedView, MemoryRecordStore, NewRecord, PinContext,
    PinnedRef, RecordKind, Session,
};

#[derive(Parser)]
#[command(name = "feedctl")]
#[command(about = "Inspect and mutate a lifelog feed backed by a JSON fixture")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "feed.toml", env = "FEED_CONFIG")]
    config: PathBuf,

    /// Fixture with records and pins to seed the store with
    #[arg(short, long, env = "FEED_FIXTURE")]
    fixture: Option<PathBuf>,

    /// Owner to act as; omitted means an anonymous session
    #[arg(short, long, env = "FEED_OWNER")]
    owner: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the first pages of a feed
    Show {
        /// Restrict to one record type (note, gym_session, ...)
        #[arg(short, long)]
        kind: Option<String>,

        /// Pin context; defaults to the type's own context or "global"
        #[arg(long)]
        context: Option<String>,

        #[arg(short, long, default_value_t = 1)]
        pages: u32,
    },

    /// Pin or unpin an item
    Pin {
        item_id: String,

        #[arg(short, long)]
        kind: Option<String>,

        #[arg(long)]
        context: Option<String>,
    },

    /// Delete a record
    Delete {
        item_id: String,

        #[arg(short, long)]
        kind: String,
    },

    /// Create a record from a JSON payload
    Create {
        /// `{"title": .., "type": .., "extra_fields": {..}}`
        payload: String,
    },
}

#[derive(Debug, Default, Deserialize)]
struct Fixture {
    #[serde(default)]
    records: Vec<FeedItem>,
    #[serde(default)]
    pins: Vec<PinnedRef>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lifelog_feed=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = FeedConfig::load(&cli.config)?.with_env_overrides()?;
    info!(page_limit = config.page_limit, pin_capacity = config.pin_capacity, "Config loaded");

    let store = Arc::new(MemoryRecordStore::with_pin_capacity(config.pin_capacity));
    if let Some(path) = &cli.fixture {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixture {}", path.display()))?;
        let fixture: Fixture = serde_json::from_str(&content).context("parsing fixture")?;
        info!(records = fixture.records.len(), pins = fixture.pins.len(), "Fixture loaded");
        store.seed_records(fixture.records).await;
        store.seed_pins(fixture.pins).await;
    }

    let session = match cli.owner {
        Some(owner) => Session::for_owner(owner),
        None => Session::anonymous(),
    };
    let client = FeedClient::new(store, session, config);

    match cli.command {
        Command::Show { kind, context, pages } => {
            let mut view = open_view(&client, kind.as_deref(), context.as_deref())?;
            view.open().await?;
            for _ in 1..pages {
                if !view.load_more().await? {
                    break;
                }
            }
            print_view(&view).await;
        }
        Command::Pin { item_id, kind, context } => {
            let mut view = open_view(&client, kind.as_deref(), context.as_deref())?;
            let context = view.key().pinned_context.clone();
            view.open().await?;
            while !view.items().await.iter().any(|e| e.item.id == item_id) {
                if !view.load_more().await? {
                    bail!("item {} not found in feed", item_id);
                }
            }
            let outcome = client.toggle_pin(&item_id, &context).await?;
            println!("{} is now {:?} in {}", outcome.item_id, outcome.state, outcome.context);
            print_view(&view).await;
        }
        Command::Delete { item_id, kind } => {
            let kind = parse_kind(&kind)?;
            let mut view = client.root_feed()?;
            view.open().await?;
            let outcome = client.delete(&item_id, kind).await?;
            println!("delete {}: {:?}", item_id, outcome);
            view.open().await?;
            print_view(&view).await;
        }
        Command::Create { payload } => {
            let record: NewRecord = serde_json::from_str(&payload).context("parsing payload")?;
            let item = client.create(record).await?;
            println!("created {} ({})", item.id, item.kind());
            let mut view = client.root_feed()?;
            view.open().await?;
            print_view(&view).await;
        }
    }

    Ok(())
}

fn parse_kind(value: &str) -> anyhow::Result<RecordKind> {
    RecordKind::parse(value).with_context(|| format!("unknown record type: {}", value))
}

fn open_view(client: &FeedClient, kind: Option<&str>, context: Option<&str>) -> anyhow::Result<FeedView> {
    let kind = kind.map(parse_kind).transpose()?;
    let context = match (context, kind) {
        (Some(name), _) => PinContext::new(name),
        (None, Some(kind)) => kind.pin_context(),
        (None, None) => PinContext::global(),
    };
    Ok(client.feed(kind, context)?)
}

async fn print_view(view: &FeedView) {
    for entry in view.items().await {
        println!(
            "{:<7} {:<12} {} {}  {}",
            entry.feed_context.as_str(),
            entry.item.kind().as_str(),
            entry.item.occurred_at.format("%Y-%m-%d %H:%M"),
            entry.item.id,
            entry.item.title,
        );
    }
    if view.has_more().await {
        println!("... more available");
    }
}

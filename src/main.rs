//! statetree CLI - demo driver for the statetree store
//!
//! Runs small scenarios against a store and prints the resulting tree as
//! JSON, so the observer and middleware behavior can be checked from a shell.

use clap::{Parser, Subcommand};
use statetree::middleware::{Chain, Logger, Middleware};
use statetree::{Action, ActionRef, Observer, StateKind, StateNode, Store, StoreConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "statetree")]
#[command(about = "A hierarchical state store with observers and middleware")]
#[command(version)]
struct Cli {
    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    /// Log every reduce and middleware hop (also STATETREE_LOG_MODE)
    #[arg(long)]
    log_mode: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Increment a counter through the middleware chain
    Counter {
        /// Number of increments to dispatch
        #[arg(short, long, default_value = "1")]
        times: u32,
        /// Initial counter value
        #[arg(short, long, default_value = "0")]
        start: i64,
    },

    /// Look up a node of the demo tree by id
    Lookup {
        /// The node id
        id: String,
    },

    /// Run a search whose result arrives from a background task
    Search {
        /// The search keyword
        keyword: String,
        /// Simulated latency of the search backend
        #[arg(long, default_value = "50")]
        delay_ms: u64,
    },
}

// === Demo state kinds ===

struct Counter;

impl StateKind for Counter {
    const ID: &'static str = "Counter";
    type Model = i64;
}

struct Searching;

impl StateKind for Searching {
    const ID: &'static str = "Searching";
    type Model = String;
}

struct SearchResult;

impl StateKind for SearchResult {
    const ID: &'static str = "SearchResult";
    type Model = Vec<String>;
}

const CATALOG: &[&str] = &[
    "observer",
    "middleware",
    "reducer",
    "state machine",
    "state tree",
    "search index",
];

// === Demo actions ===

struct Increment;

impl Action for Increment {
    fn reduce(&self, mut old: StateNode) -> StateNode {
        if let Some(node) = old.find_mut(Counter::ID) {
            let value = Counter::decode(node).unwrap_or(0);
            if let Err(e) = node.set_model(&(value + 1)) {
                tracing::warn!(error = %e, "could not store counter");
            }
        }
        old
    }

    fn name(&self) -> &str {
        "Increment"
    }
}

/// Moves the tree into the searching state
struct StartSearch {
    keyword: String,
}

impl StartSearch {
    const NAME: &'static str = "StartSearch";
}

impl Action for StartSearch {
    fn reduce(&self, old: StateNode) -> StateNode {
        match Searching::node(&self.keyword) {
            Ok(node) => node,
            Err(e) => {
                tracing::warn!(error = %e, "could not encode search keyword");
                old
            }
        }
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

struct FinishSearch {
    hits: Vec<String>,
}

impl Action for FinishSearch {
    fn reduce(&self, old: StateNode) -> StateNode {
        match SearchResult::node(&self.hits) {
            Ok(node) => node,
            Err(e) => {
                tracing::warn!(error = %e, "could not encode search result");
                old
            }
        }
    }

    fn name(&self) -> &str {
        "FinishSearch"
    }
}

/// Consumes `StartSearch`, reduces it, then answers from a background task
struct SearchBackend {
    delay: Duration,
}

impl Middleware for SearchBackend {
    fn apply(&self, state: StateNode, action: ActionRef, chain: Chain<'_>) {
        if action.name() != StartSearch::NAME {
            chain.next(state, action);
            return;
        }

        let store = chain.store();
        store.reduce(action.as_ref());
        let Some(keyword) = store.lookup_kind::<Searching>() else {
            return;
        };

        let weak = store.downgrade();
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let needle = keyword.to_lowercase();
            let hits = CATALOG
                .iter()
                .filter(|entry| entry.contains(needle.as_str()))
                .map(|entry| entry.to_string())
                .collect();
            match weak.upgrade() {
                Some(store) => {
                    store.reduce(&FinishSearch { hits });
                }
                None => tracing::debug!(%keyword, "store gone before search finished"),
            }
        });
    }

    fn name(&self) -> &str {
        "search-backend"
    }
}

fn demo_tree(config: &StoreConfig) -> anyhow::Result<StateNode> {
    Ok(config
        .initial_root()
        .with_child(Counter::node(&0)?)
        .with_child(
            StateNode::new("Settings")
                .with_child(StateNode::new("Theme").with_payload("dark"))
                .with_child(StateNode::new("Language").with_payload("en")),
        ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = StoreConfig::from_env()?;
    if cli.log_mode {
        config = config.with_log_mode(true);
    }

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else if config.log_mode {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Counter { times, start } => {
            let seed = config.initial_root().with_child(Counter::node(&start)?);
            let store = Store::builder(seed)
                .config(&config)
                .middleware(Logger::default())
                .build();

            let notifications = Arc::new(AtomicUsize::new(0));
            let seen = notifications.clone();
            store.subscribe(Observer::of::<Counter, _>(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            }));

            for _ in 0..times {
                store.dispatch(Increment);
            }

            output(
                &cli.format,
                &serde_json::json!({
                    "value": store.lookup_kind::<Counter>(),
                    "notifications": notifications.load(Ordering::SeqCst),
                    "state": serde_json::to_value(store.state())?
                }),
            );
        }

        Commands::Lookup { id } => {
            let store = Store::builder(demo_tree(&config)?).config(&config).build();
            match store.lookup(&id) {
                Some(node) => {
                    output(&cli.format, &serde_json::to_value(node)?);
                }
                None => {
                    output(
                        &cli.format,
                        &serde_json::json!({
                            "status": "error",
                            "message": format!("State not found: {}", id)
                        }),
                    );
                    std::process::exit(1);
                }
            }
        }

        Commands::Search { keyword, delay_ms } => {
            let delay = Duration::from_millis(delay_ms);
            let store = Store::builder(config.initial_root())
                .config(&config)
                .middleware(Logger::default())
                .middleware(SearchBackend { delay })
                .build();

            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
            store.subscribe(Observer::of::<SearchResult, _>(move |node| {
                let _ = tx.send(node);
            }));

            store.dispatch(StartSearch {
                keyword: keyword.clone(),
            });

            let node = tokio::time::timeout(delay + Duration::from_secs(5), rx.recv())
                .await?
                .ok_or_else(|| anyhow::anyhow!("Search finished without a result"))?;
            let hits = SearchResult::decode(&node).unwrap_or_default();

            output(
                &cli.format,
                &serde_json::json!({
                    "keyword": keyword,
                    "count": hits.len(),
                    "hits": hits,
                    "state": serde_json::to_value(store.state())?
                }),
            );
        }
    }

    Ok(())
}

fn output(format: &OutputFormat, value: &serde_json::Value) {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(value),
        OutputFormat::Text => serde_json::to_string_pretty(value),
    };
    match rendered {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Failed to render output: {}", e),
    }
}

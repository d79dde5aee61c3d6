use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use cli::logging::init_tracing_with_config;
use cli::report::styled_view;
use console::style;
use core_types::EntityKind;
use core_types::config::{AppConfig, LeadingEdge, load_or_create_config};
use core_types::routes::{detail_route, search_route};
use directory_client::DirectoryClient;
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use ui::{Applied, Bounds, FetchOrchestrator, RouteHistory, SearchWidget, WidgetState, render};

/// Debug / scripting CLI for the directory search widget.
#[derive(Parser, Debug)]
#[command(name = "directory-search", version, about = "Directory search debug client")]
struct Cli {
    /// Config file (defaults to $DIRECTORY_SEARCH_CONFIG or ./directory-search.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one aggregated search and print the dropdown.
    Search {
        query: String,
        /// Print the normalized result set as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Simulate typing `text` into the widget one character at a time.
    Type {
        text: String,
        /// Delay between keystrokes.
        #[arg(long, default_value_t = 50)]
        interval_ms: u64,
        /// Override the configured leading-edge policy.
        #[arg(long, value_enum)]
        leading: Option<LeadingArg>,
    },
    /// Print the route a selection or "view all" would navigate to.
    Route {
        #[command(subcommand)]
        target: RouteTarget,
    },
}

#[derive(Subcommand, Debug)]
enum RouteTarget {
    /// Detail page for one entity.
    Detail {
        #[arg(value_enum)]
        kind: KindArg,
        slug: Option<String>,
    },
    /// Full search results page.
    Search { query: String },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum KindArg {
    Organization,
    Investor,
    Person,
}

impl From<KindArg> for EntityKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Organization => EntityKind::Organization,
            KindArg::Investor => EntityKind::Investor,
            KindArg::Person => EntityKind::Person,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LeadingArg {
    FirstOfBurst,
    EveryChange,
}

impl From<LeadingArg> for LeadingEdge {
    fn from(arg: LeadingArg) -> Self {
        match arg {
            LeadingArg::FirstOfBurst => LeadingEdge::FirstOfBurst,
            LeadingArg::EveryChange => LeadingEdge::EveryChange,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Commands::Route { target } = &cli.command {
        println!("{}", resolve_route(target));
        return Ok(());
    }

    let cfg = load_or_create_config(cli.config.as_deref()).context("failed to load config")?;
    let _guard = init_tracing_with_config(&cfg.logging)?;
    debug!(version = cli::VERSION, base_url = %cfg.api.base_url, "starting");

    match cli.command {
        Commands::Search { query, json } => run_search(&cfg, &query, json).await,
        Commands::Type {
            text,
            interval_ms,
            leading,
        } => run_type(&cfg, &text, Duration::from_millis(interval_ms), leading).await,
        Commands::Route { .. } => Ok(()),
    }
}

fn resolve_route(target: &RouteTarget) -> String {
    match target {
        RouteTarget::Detail { kind, slug } => detail_route((*kind).into(), slug.as_deref()),
        RouteTarget::Search { query } => search_route(query),
    }
}

async fn run_search(cfg: &AppConfig, query: &str, json: bool) -> Result<()> {
    if query.is_empty() {
        bail!("query must not be empty");
    }
    let client = DirectoryClient::from_config(&cfg.api);
    let mut orchestrator = FetchOrchestrator::new(Arc::new(client), cfg.search.page_size);

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Searching for \"{query}\""));
    spinner.enable_steady_tick(Duration::from_millis(80));
    let results = orchestrator.search_once(query).await;
    spinner.finish_and_clear();
    info!(query, total = results.total(), "search complete");

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }
    let state = WidgetState {
        query_text: query.to_string(),
        is_open: true,
        is_loading: false,
        last_results: results,
    };
    print!("{}", styled_view(&render(&state)));
    Ok(())
}

async fn run_type(
    cfg: &AppConfig,
    text: &str,
    interval: Duration,
    leading: Option<LeadingArg>,
) -> Result<()> {
    let mut search_cfg = cfg.search.clone();
    if let Some(leading) = leading {
        search_cfg.leading_edge = leading.into();
    }
    let client = Arc::new(DirectoryClient::from_config(&cfg.api));
    let history = Arc::new(RouteHistory::new());
    let mut widget = SearchWidget::mount(client, history, Bounds::default(), &search_cfg);
    widget.focus();

    let mut typed = String::new();
    for ch in text.chars() {
        typed.push(ch);
        widget.input(typed.clone());
        debug!(text = %typed, loading = widget.state().is_loading, "keystroke");

        let pause = tokio::time::sleep(interval);
        tokio::pin!(pause);
        loop {
            tokio::select! {
                _ = &mut pause => break,
                Some(event) = widget.next_event() => report(widget.handle_event(event)),
            }
        }
    }

    let budget = settle_budget(cfg);
    if tokio::time::timeout(budget, widget.settle()).await.is_err() {
        warn!(?budget, "widget did not settle in time");
        println!("{}", style("Timed out waiting for results").red());
    }
    print!("{}", styled_view(&widget.view()));
    widget.unmount();
    Ok(())
}

/// Upper bound on how long a trailing fire plus one dispatch may take.
fn settle_budget(cfg: &AppConfig) -> Duration {
    let attempts = u64::from(cfg.api.retries) + 1;
    let per_lookup = cfg.api.timeout_ms + cfg.api.backoff_ms * u64::from(cfg.api.retries);
    Duration::from_millis(cfg.search.debounce_ms + per_lookup * attempts + 1_000)
}

fn report(applied: Applied) {
    match applied {
        Applied::Dispatched(token) => info!(token = token.value(), "trailing search dispatched"),
        Applied::Fresh(token) => info!(token = token.value(), "results applied"),
        Applied::Stale(token) => debug!(token = token.value(), "stale results dropped"),
        Applied::Ignored => {}
    }
}

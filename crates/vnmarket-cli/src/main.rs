//! Command-line interface for vnmarket
//!
//! # Usage
//!
//! ```bash
//! export VNMARKET_PRICE_API_URL="https://prices.example.vn/api"
//! export VNMARKET_API_URL="https://api.example.vn/api"
//!
//! vnmarket chart VNINDEX --range 3m
//! vnmarket fscore FPT
//! vnmarket login --email lan@example.vn --password secret
//! ```

mod output;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, anyhow};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use vnmarket::api::{PostQuery, PostRef};
use vnmarket::chart::{Broadcaster, ChartOptions, ChartRenderer, HeadlessFactory};
use vnmarket::fscore::FScoreBreakdown;
use vnmarket::host::{self, ChartHost, QueryParams, RenderBranch};
use vnmarket::popup::PremiumPopup;
use vnmarket::{
    AuthClient, FileStore, HostState, KeyValueStore, MarketConfig, MemoryStore, NewsClient,
    PriceApiClient, StockClient, TimeRangeSelection,
};

#[derive(Parser, Debug)]
#[command(name = "vnmarket")]
#[command(about = "Vietnamese stock market data from the terminal", long_about = None)]
struct Cli {
    /// File backing persistent state (session, popup snooze)
    #[arg(long, global = true, default_value = ".vnmarket/store.json")]
    store: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Print raw JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Price chart for a symbol
    Chart {
        symbol: String,
        /// One of 1d, 1w, 1m, 3m, 6m, 1y, all
        #[arg(short, long, default_value = "1m")]
        range: String,
        /// Number of most recent sessions to list
        #[arg(long, default_value_t = 10)]
        bars: usize,
    },
    /// Company profile
    Profile { symbol: String },
    /// Valuation and performance ratios
    Metrics { symbol: String },
    /// Piotroski F-Score breakdown
    Fscore { symbol: String },
    /// Trading recommendation
    Recommend { symbol: String },
    /// List news posts
    News {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        per_page: Option<u32>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Show one news post by id or slug
    Post { post: String },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Premium upsell reminder
    Premium {
        /// Hide the reminder for the configured snooze period
        #[arg(long, conflicts_with = "reset")]
        snooze: bool,
        /// Forget any snooze
        #[arg(long)]
        reset: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    vnmarket_utils::init_tracing_with("warn,vnmarket=info", cli.json_logs);

    let app = vnmarket_utils::Config::from_env();
    let config = MarketConfig::builder().with_env().build()?;
    debug!(environment = %app.environment, price_api = %config.price_api_base, "configured");

    let store: Arc<dyn KeyValueStore> = Arc::new(
        FileStore::open(&cli.store)
            .with_context(|| format!("opening store {}", cli.store.display()))?,
    );

    match cli.command {
        Commands::Chart {
            symbol,
            range,
            bars,
        } => chart(&config, &symbol, &range, bars, cli.json).await,
        Commands::Profile { symbol } => {
            let profile = StockClient::new(&config)?.profile(&symbol).await?;
            emit(cli.json, &profile, || output::profile(&profile))
        }
        Commands::Metrics { symbol } => {
            let metrics = StockClient::new(&config)?.financial_metrics(&symbol).await?;
            emit(cli.json, &metrics, || output::metrics(&metrics))
        }
        Commands::Fscore { symbol } => {
            let report = StockClient::new(&config)?.fscore(&symbol).await?;
            let breakdown = FScoreBreakdown::from_flags(&report.flags);
            emit(cli.json, &report, || output::fscore(&report, &breakdown))
        }
        Commands::Recommend { symbol } => {
            let rec = StockClient::new(&config)?.recommendation(&symbol).await?;
            emit(cli.json, &rec, || output::recommendation(&rec))
        }
        Commands::News {
            page,
            per_page,
            category,
        } => {
            let query = PostQuery {
                page,
                per_page,
                category,
            };
            let posts = NewsClient::new(&config)?.list_posts(&query).await?;
            emit(cli.json, &posts, || output::post_list(&posts))
        }
        Commands::Post { post } => {
            let post = NewsClient::new(&config)?.post(&PostRef::parse(&post)?).await?;
            emit(cli.json, &post, || output::post(&post))
        }
        Commands::Login { email, password } => {
            let session = AuthClient::new(&config, store)?
                .login(&email, &password)
                .await?;
            println!("Signed in as {}", session.user.email);
            Ok(())
        }
        Commands::Register {
            name,
            email,
            password,
        } => {
            let session = AuthClient::new(&config, store)?
                .register(&name, &email, &password)
                .await?;
            println!("Registered {}", session.user.email);
            Ok(())
        }
        Commands::Logout => {
            AuthClient::new(&config, store)?.logout()?;
            println!("Signed out");
            Ok(())
        }
        Commands::Whoami => whoami(&config, store),
        Commands::Premium { snooze, reset } => {
            let popup = premium_popup(&config, store);
            if reset {
                popup.reset()?;
                println!("Premium reminder re-enabled");
            } else if snooze {
                let until = popup.snooze(Utc::now())?;
                println!("Premium reminder hidden until {}", until.with_timezone(&Local));
            } else if popup.should_show(Utc::now()) {
                println!("{}", output::PREMIUM_HINT);
            } else {
                println!("Premium reminder is snoozed");
            }
            Ok(())
        }
    }
}

async fn chart(
    config: &MarketConfig,
    symbol: &str,
    range: &str,
    bars: usize,
    json: bool,
) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let selection = TimeRangeSelection::new(symbol, range, today);
    info!(
        symbol = %selection.symbol,
        start = %selection.start_date,
        end = %selection.end_date,
        "loading chart"
    );

    let source = PriceApiClient::new(config)?;
    let factory = HeadlessFactory::new();
    let renderer = ChartRenderer::new(factory.clone(), ChartOptions::default(), Broadcaster::new());
    let chart = Mutex::new(ChartHost::new(renderer));

    host::load(&chart, &source, QueryParams::from(&selection)).await;

    let mut host = chart
        .into_inner()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let outcome = match (host.state(), host.render_branch()) {
        (HostState::Ready { records }, _) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&**records)?);
            } else {
                println!("{}", output::chart_panes(&selection, &factory.handles()));
                println!("{}", output::latest_bars(records, bars));
            }
            Ok(())
        }
        (_, RenderBranch::Empty { message } | RenderBranch::MissingParameters { message }) => {
            println!("{message}");
            Ok(())
        }
        (_, RenderBranch::Error { message }) => Err(anyhow!(message)),
        (_, branch) => Err(anyhow!("chart did not settle: {branch:?}")),
    };
    host.unmount();
    outcome
}

fn whoami(config: &MarketConfig, store: Arc<dyn KeyValueStore>) -> anyhow::Result<()> {
    let auth = AuthClient::new(config, Arc::clone(&store))?;
    let Some(session) = auth.current_session() else {
        println!("Not signed in");
        return Ok(());
    };

    let user = &session.user;
    println!(
        "{} <{}>{}",
        user.name.as_deref().unwrap_or("-"),
        user.email,
        if user.is_premium { " [premium]" } else { "" }
    );

    if !user.is_premium {
        let popup = premium_popup(config, store);
        if popup.should_show(Utc::now()) {
            println!("\n{}", output::PREMIUM_HINT);
            popup.mark_shown()?;
        }
    }
    Ok(())
}

/// Snooze persists in the file store; "shown this session" lives for one run
fn premium_popup(config: &MarketConfig, store: Arc<dyn KeyValueStore>) -> PremiumPopup {
    PremiumPopup::new(store, Arc::new(MemoryStore::new()), config.popup_snooze)
}

fn emit<T: serde::Serialize>(
    json: bool,
    value: &T,
    table: impl FnOnce() -> String,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", table());
    }
    Ok(())
}

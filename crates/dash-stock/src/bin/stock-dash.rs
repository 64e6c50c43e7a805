//! Stock Analysis Dashboard CLI
//!
//! # Usage
//!
//! ```bash
//! export ANTHROPIC_API_KEY="sk-ant-..."   # optional, or /key in the session
//! cargo run --bin stock-dash -p dash-stock -- --ticker MSFT
//! ```

use anyhow::Context;
use clap::Parser;
use dash_stock::{
    Backend, DashConfig, MarketDataFetcher, NarrativeAnalyzer, Outcome, Session,
    YahooFinanceClient,
};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "stock-dash", version, about = "Stock Analysis Dashboard")]
struct Args {
    /// Ticker loaded at startup
    #[arg(short, long, default_value = "AAPL")]
    ticker: String,

    /// LLM backend: claude or openai
    #[arg(short, long)]
    provider: Option<Backend>,

    /// Model id (defaults to the backend's first model)
    #[arg(short, long)]
    model: Option<String>,

    /// Days of price history to chart
    #[arg(long)]
    history_days: Option<u32>,

    /// Snapshot cache lifetime in seconds
    #[arg(long)]
    cache_ttl_secs: Option<u64>,

    /// Log filter used when RUST_LOG is unset (e.g. "debug")
    #[arg(long)]
    log_level: Option<String>,
}

fn build_config(args: &Args) -> anyhow::Result<DashConfig> {
    let mut builder = DashConfig::builder().with_env_api_keys();

    if let Some(backend) = args.provider {
        builder = builder.default_backend(backend);
    }
    if let Some(days) = args.history_days {
        builder = builder.history_days(days);
    }
    if let Some(secs) = args.cache_ttl_secs {
        builder = builder.cache_ttl(Duration::from_secs(secs));
    }

    Ok(builder.build()?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut app_config = dash_utils::Config::from_env();
    if let Some(level) = &args.log_level {
        app_config = app_config.with_log_filter(level.as_str());
    }
    dash_utils::init_tracing(&app_config);

    let config = build_config(&args).context("invalid configuration")?;
    tracing::debug!(
        backend = %config.default_backend,
        history_days = config.history_days,
        cache_ttl_secs = config.cache_ttl.as_secs(),
        "Starting stock-dash"
    );

    let client = YahooFinanceClient::new(config.request_timeout)
        .context("failed to create Yahoo Finance client")?;
    let fetcher = MarketDataFetcher::new(Arc::new(client), &config);
    let analyzer = NarrativeAnalyzer::new(&config)?;

    let mut session = Session::new(fetcher, analyzer, &config);
    if let Some(model) = &args.model {
        session.set_model(model.as_str());
    }

    println!("{}\n", session.welcome());

    if let Outcome::Output(text) = session.process_input(&args.ticker).await {
        println!("{text}\n");
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{}", session.prompt());
        stdout.flush()?;

        let mut input = String::new();
        match stdin.lock().read_line(&mut input) {
            Ok(0) => {
                // EOF
                println!("\nGoodbye!");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {e}");
                continue;
            }
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        match session.process_input(input).await {
            Outcome::Output(text) => println!("{text}\n"),
            Outcome::Exit => {
                println!("Goodbye!");
                break;
            }
        }
    }

    Ok(())
}

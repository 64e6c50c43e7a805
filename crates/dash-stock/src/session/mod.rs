//! Interactive dashboard session
//!
//! A [`Session`] holds the selected ticker, tab, backend and credentials, and
//! turns each input line into text for the terminal. Nothing it does is fatal:
//! failures become output lines and the session carries on.

pub mod commands;

pub use commands::Command;

use crate::analyzer::{AnalysisError, AnalysisResult, Backend, BackendChoice, NarrativeAnalyzer};
use crate::config::DashConfig;
use crate::fetcher::MarketDataFetcher;
use crate::model::StockSnapshot;
use crate::present::{self, ChartSize, Tab, PAGE_TITLE};
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;
use tracing::{debug, warn};

pub const NO_TICKER_PROMPT: &str = "Enter a ticker symbol to begin analysis.";

/// What the caller should do after a line is processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Print this and read the next line
    Output(String),
    Exit,
}

pub struct Session {
    fetcher: MarketDataFetcher,
    analyzer: NarrativeAnalyzer,
    choice: BackendChoice,
    credentials: HashMap<Backend, String>,
    snapshot: Option<Arc<StockSnapshot>>,
    tab: Tab,
    last_analysis: Option<AnalysisResult>,
    chart_size: ChartSize,
}

impl Session {
    pub fn new(fetcher: MarketDataFetcher, analyzer: NarrativeAnalyzer, config: &DashConfig) -> Self {
        let mut credentials = HashMap::new();
        for backend in [Backend::Claude, Backend::OpenAI] {
            if let Some(key) = config.api_key_for(backend) {
                credentials.insert(backend, key.to_string());
            }
        }

        Self {
            fetcher,
            analyzer,
            choice: BackendChoice::new(config.default_backend),
            credentials,
            snapshot: None,
            tab: Tab::default(),
            last_analysis: None,
            chart_size: ChartSize {
                width: config.chart_width,
                height: config.chart_height,
            },
        }
    }

    /// Override the startup model
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.choice.model = model.into();
    }

    pub fn choice(&self) -> &BackendChoice {
        &self.choice
    }

    pub fn snapshot(&self) -> Option<&Arc<StockSnapshot>> {
        self.snapshot.as_ref()
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    /// Banner shown before the first prompt
    pub fn welcome(&self) -> String {
        format!("{PAGE_TITLE}\n\n{NO_TICKER_PROMPT}\nType /help for commands.")
    }

    /// Input prompt, naming the loaded ticker
    pub fn prompt(&self) -> String {
        match &self.snapshot {
            Some(snapshot) => format!("{}> ", snapshot.ticker),
            None => "> ".to_string(),
        }
    }

    fn credential(&self) -> &str {
        self.credentials
            .get(&self.choice.backend)
            .map_or("", String::as_str)
    }

    /// Process one line of user input
    pub async fn process_input(&mut self, input: &str) -> Outcome {
        match Command::parse(input) {
            Ok(command) => self.execute_command(command).await,
            Err(e) => Outcome::Output(format!("Error: {e}")),
        }
    }

    /// Execute a parsed command
    pub async fn execute_command(&mut self, command: Command) -> Outcome {
        debug!(?command, "Executing command");

        let output = match command {
            Command::Ticker { symbol } => self.load_ticker(&symbol).await,
            Command::Tab { tab } => self.show_tab(tab),
            Command::Provider { backend } => {
                self.choice = BackendChoice::new(backend);
                format!("Provider set to {backend} (model: {})", self.choice.model)
            }
            Command::Model { model } => {
                self.choice.model = model;
                if self.choice.is_known_model() {
                    format!("Model set to {}", self.choice.model)
                } else {
                    format!(
                        "Model set to {} (not in the {} list; it will be sent as-is)",
                        self.choice.model, self.choice.backend
                    )
                }
            }
            Command::Models => self.list_models(),
            Command::Key { credential } => {
                self.credentials.insert(self.choice.backend, credential);
                format!("API key set for {}.", self.choice.backend)
            }
            Command::Analyze => self.analyze().await,
            Command::Status => self.status(),
            Command::Help => Command::help_text().to_string(),
            Command::Exit => return Outcome::Exit,
        };

        Outcome::Output(output)
    }

    async fn load_ticker(&mut self, symbol: &str) -> String {
        match self.fetcher.fetch(symbol).await {
            Ok(snapshot) => {
                let changed = self
                    .snapshot
                    .as_ref()
                    .is_none_or(|current| current.ticker != snapshot.ticker);
                if changed {
                    self.last_analysis = None;
                }

                self.tab = Tab::PriceHistory;
                let output = present::render_dashboard(&snapshot, self.tab, self.chart_size);
                self.snapshot = Some(snapshot);
                output
            }
            Err(e) => {
                warn!(symbol, error = %e, "Could not load ticker");
                self.snapshot = None;
                self.last_analysis = None;
                format!(
                    "{e}\nCould not find stock data for ticker: {}",
                    symbol.trim().to_uppercase()
                )
            }
        }
    }

    fn show_tab(&mut self, tab: Tab) -> String {
        let Some(snapshot) = self.snapshot.clone() else {
            return NO_TICKER_PROMPT.to_string();
        };

        self.tab = tab;
        let mut output = present::render_dashboard(&snapshot, tab, self.chart_size);
        if tab == Tab::Analysis {
            output.push('\n');
            output.push_str(&self.analysis_body(&snapshot));
        }
        output
    }

    fn analysis_body(&self, snapshot: &StockSnapshot) -> String {
        if self.credential().trim().is_empty() {
            return AnalysisError::MissingCredential.to_string();
        }

        match &self.last_analysis {
            Some(result) if result.ticker == snapshot.ticker => render_analysis(result),
            _ => format!(
                "Run /analyze to analyze {} with {} ({}).",
                snapshot.display_name(),
                self.choice.backend,
                self.choice.model
            ),
        }
    }

    async fn analyze(&mut self) -> String {
        let Some(snapshot) = self.snapshot.clone() else {
            return NO_TICKER_PROMPT.to_string();
        };
        self.tab = Tab::Analysis;

        let analysis = self
            .analyzer
            .analyze(self.credential(), &self.choice, &snapshot)
            .await;

        match analysis {
            Ok(result) => {
                let output = render_analysis(&result);
                self.last_analysis = Some(result);
                output
            }
            Err(AnalysisError::MissingCredential) => AnalysisError::MissingCredential.to_string(),
            Err(e) => {
                warn!(error = %e, "Analysis failed");
                format!("Error during analysis: {e}")
            }
        }
    }

    fn list_models(&self) -> String {
        let mut out = format!("{} models:", self.choice.backend);
        for model in self.choice.backend.models() {
            let marker = if *model == self.choice.model { "*" } else { " " };
            let _ = write!(out, "\n {marker} {model}");
        }
        out
    }

    fn status(&self) -> String {
        let ticker = self
            .snapshot
            .as_ref()
            .map_or_else(|| "none".to_string(), |s| s.ticker.to_string());
        let key = if self.credential().trim().is_empty() {
            "not set"
        } else {
            "set"
        };

        format!(
            "Ticker: {ticker}\nTab: {}\nProvider: {}\nModel: {}\nAPI key: {key}",
            self.tab, self.choice.backend, self.choice.model
        )
    }
}

fn render_analysis(result: &AnalysisResult) -> String {
    format!(
        "AI Analysis Results ({} {})\n\n{}",
        result.backend, result.model, result.text
    )
}

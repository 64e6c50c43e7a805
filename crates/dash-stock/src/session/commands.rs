//! Command parsing for the dashboard session

use crate::analyzer::Backend;
use crate::error::{Result, StockError};
use crate::present::Tab;
use std::fmt;

/// Parsed command from user input
#[derive(Clone, PartialEq)]
pub enum Command {
    /// Load a ticker and show its dashboard
    Ticker { symbol: String },
    /// Show one dashboard tab
    Tab { tab: Tab },
    /// Switch LLM backend
    Provider { backend: Backend },
    /// Set the model identifier
    Model { model: String },
    /// List models for the current backend
    Models,
    /// Set the API credential for the current backend
    Key { credential: String },
    /// Run the AI analysis
    Analyze,
    /// Show session state
    Status,
    Help,
    Exit,
}

// Credentials stay out of logs
impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Key { .. } => f.write_str("Key { credential: <redacted> }"),
            Command::Ticker { symbol } => f.debug_struct("Ticker").field("symbol", symbol).finish(),
            Command::Tab { tab } => f.debug_struct("Tab").field("tab", tab).finish(),
            Command::Provider { backend } => {
                f.debug_struct("Provider").field("backend", backend).finish()
            }
            Command::Model { model } => f.debug_struct("Model").field("model", model).finish(),
            Command::Models => f.write_str("Models"),
            Command::Analyze => f.write_str("Analyze"),
            Command::Status => f.write_str("Status"),
            Command::Help => f.write_str("Help"),
            Command::Exit => f.write_str("Exit"),
        }
    }
}

fn required<'a>(args: &[&'a str], usage: &str) -> Result<&'a str> {
    args.first()
        .copied()
        .ok_or_else(|| StockError::CommandError(format!("Usage: {usage}")))
}

impl Command {
    /// Parse a command from user input
    ///
    /// A single bare word is a ticker; everything else must start with `/`.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        if input.is_empty() {
            return Err(StockError::CommandError("Empty input".to_string()));
        }

        let Some(command) = input.strip_prefix('/') else {
            let mut words = input.split_whitespace();
            return match (words.next(), words.next()) {
                (Some(symbol), None) => Ok(Command::Ticker {
                    symbol: symbol.to_uppercase(),
                }),
                _ => Err(StockError::CommandError(
                    "Enter a single ticker symbol or a /command (see /help)".to_string(),
                )),
            };
        };

        let parts: Vec<&str> = command.split_whitespace().collect();
        let Some((cmd, args)) = parts.split_first() else {
            return Err(StockError::CommandError("Empty command".to_string()));
        };
        let cmd = cmd.to_lowercase();

        match cmd.as_str() {
            "ticker" | "t" => Ok(Command::Ticker {
                symbol: required(args, "/ticker <symbol>")?.to_uppercase(),
            }),
            "tab" => {
                let name = required(args, "/tab price|balance|income|cashflow|ai")?;
                let tab = name.parse::<Tab>().map_err(StockError::CommandError)?;
                Ok(Command::Tab { tab })
            }
            "provider" | "p" => {
                let name = required(args, "/provider claude|openai")?;
                let backend = name.parse::<Backend>().map_err(StockError::CommandError)?;
                Ok(Command::Provider { backend })
            }
            "model" | "m" => Ok(Command::Model {
                model: required(args, "/model <model-id>")?.to_string(),
            }),
            "models" => Ok(Command::Models),
            "key" => Ok(Command::Key {
                credential: required(args, "/key <credential>")?.to_string(),
            }),
            "analyze" | "a" => Ok(Command::Analyze),
            "status" | "s" => Ok(Command::Status),
            "help" | "h" | "?" => Ok(Command::Help),
            "exit" | "quit" | "q" => Ok(Command::Exit),
            _ => Err(StockError::CommandError(format!("Unknown command: /{cmd}"))),
        }
    }

    /// Get help text for all commands
    pub fn help_text() -> &'static str {
        r"
Stock Analysis Dashboard Commands
=================================

Market Data:
  <symbol>               Load a ticker (e.g. AAPL)
  /ticker <symbol>       Same as above
  /tab <name>            Show a tab: price, balance, income, cashflow, ai

AI Analysis:
  /provider <name>       Select backend: claude or openai
  /model <id>            Select model id
  /models                List models for the current backend
  /key <credential>      Set the API key for the current backend
  /analyze               Analyze the current ticker

Other:
  /status                Show ticker, backend, model and key status
  /help                  Show help
  /exit                  Exit

Aliases:
  /t = /ticker   /p = /provider   /m = /model   /a = /analyze   /q = /exit
"
    }
}

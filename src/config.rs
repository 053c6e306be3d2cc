//! Startup configuration for the board API connection.
//!
//! Two board identifiers and one API token, supplied via environment
//! variables. Absence of any of them is a startup-time failure; nothing
//! here is defaulted or derived.

use crate::error::{BiError, Result};

pub const DEFAULT_API_URL: &str = "https://api.monday.com/v2";

#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer-style API token for the board service.
    pub api_token: String,
    /// Board holding work orders.
    pub work_board_id: String,
    /// Board holding deals.
    pub deal_board_id: String,
    /// API endpoint. Overridable for tests, defaults to the public endpoint.
    pub api_url: String,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Expects `MONDAY_API_TOKEN`, `WORK_ORDER_BOARD_ID` and `DEAL_BOARD_ID`.
    /// `MONDAY_API_URL` is optional.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_token: required_var("MONDAY_API_TOKEN")?,
            work_board_id: required_var("WORK_ORDER_BOARD_ID")?,
            deal_board_id: required_var("DEAL_BOARD_ID")?,
            api_url: std::env::var("MONDAY_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(BiError::Config(format!(
            "missing required environment variable: {}",
            name
        ))),
    }
}

//! Board API client.
//!
//! Issues one GraphQL query per board against the remote board service and
//! returns the raw item records. A single page of up to [`PAGE_LIMIT`] items
//! is fetched; larger boards are silently truncated. A non-success HTTP
//! status is a hard error carrying the status code and raw body. No retry,
//! no backoff.

use crate::config::Config;
use crate::error::{BiError, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Page-size ceiling for a board fetch. Only the first page is requested.
pub const PAGE_LIMIT: usize = 500;

/// One row-equivalent record from a board: a name plus ordered
/// column/value pairs, as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardItem {
    pub name: String,
    pub column_values: Vec<ColumnValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnValue {
    pub column: ColumnMeta,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub title: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ResponseData>,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    boards: Vec<Board>,
}

#[derive(Debug, Deserialize)]
struct Board {
    items_page: ItemsPage,
}

#[derive(Debug, Deserialize)]
struct ItemsPage {
    items: Vec<BoardItem>,
}

#[derive(Debug)]
pub struct BoardClient {
    http: reqwest::Client,
    api_url: String,
    api_token: String,
}

impl BoardClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_token: config.api_token.clone(),
        }
    }

    /// Fetch the items of one board. First page only, up to [`PAGE_LIMIT`].
    pub async fn fetch_board_items(&self, board_id: &str) -> Result<Vec<BoardItem>> {
        let query = board_items_query(board_id);
        let body = self.run_query(&query).await?;

        let parsed: GraphQlResponse = serde_json::from_str(&body)?;
        let board = parsed
            .data
            .and_then(|d| d.boards.into_iter().next())
            .ok_or_else(|| {
                BiError::Response(format!("board {} missing from response", board_id))
            })?;

        info!(
            "Fetched {} items from board {}",
            board.items_page.items.len(),
            board_id
        );
        Ok(board.items_page.items)
    }

    async fn run_query(&self, query: &str) -> Result<String> {
        let response = self
            .http
            .post(&self.api_url)
            .header("Authorization", &self.api_token)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(BiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

fn board_items_query(board_id: &str) -> String {
    format!(
        r#"
    query {{
      boards(ids: {board_id}) {{
        items_page(limit: {PAGE_LIMIT}) {{
          items {{
            name
            column_values {{
              column {{
                title
              }}
              text
            }}
          }}
        }}
      }}
    }}
    "#
    )
}

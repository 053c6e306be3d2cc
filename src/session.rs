//! Session state: the memoized two-table load and the chat transcript.
//!
//! The two boards are fetched and cleaned once, at session construction; a
//! failed fetch aborts the whole session, and so does an explicit role
//! mapping that does not validate against its freshly built table. Queries
//! reuse the cached tables until an explicit `refresh()` re-fetches both.
//! The transcript is an append-only list with two entries per turn, kept
//! for the session's lifetime only, never persisted.

use crate::board_client::BoardClient;
use crate::columns::RoleMap;
use crate::config::Config;
use crate::error::{BiError, Result};
use crate::router::{route, Answer};
use crate::table::{build_table, clean_table};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// The two cleaned tables, cached for the session.
#[derive(Debug)]
pub struct TableCache {
    client: BoardClient,
    work_board_id: String,
    deal_board_id: String,
    work_roles: RoleMap,
    deal_roles: RoleMap,
    work: DataFrame,
    deals: DataFrame,
}

impl TableCache {
    /// Fetch, build and clean both tables with heuristic-only column roles.
    pub async fn load(config: &Config) -> Result<Self> {
        Self::load_with_roles(config, RoleMap::new(), RoleMap::new()).await
    }

    /// Fetch, build and clean both tables, then validate the explicit role
    /// mappings against them. Any failure here is fatal for session
    /// initialization.
    pub async fn load_with_roles(
        config: &Config,
        work_roles: RoleMap,
        deal_roles: RoleMap,
    ) -> Result<Self> {
        let client = BoardClient::new(config);
        let (work, deals) =
            Self::fetch_tables(&client, &config.work_board_id, &config.deal_board_id).await?;
        validate_roles(&work, &work_roles, &deals, &deal_roles)?;
        Ok(Self {
            client,
            work_board_id: config.work_board_id.clone(),
            deal_board_id: config.deal_board_id.clone(),
            work_roles,
            deal_roles,
            work,
            deals,
        })
    }

    /// Manual cache invalidation: re-fetch both boards, replacing the
    /// cached tables only when the whole reload succeeds and the role
    /// mappings still validate against the new tables.
    pub async fn refresh(&mut self) -> Result<()> {
        let (work, deals) =
            Self::fetch_tables(&self.client, &self.work_board_id, &self.deal_board_id).await?;
        validate_roles(&work, &self.work_roles, &deals, &self.deal_roles)?;
        self.work = work;
        self.deals = deals;
        Ok(())
    }

    async fn fetch_tables(
        client: &BoardClient,
        work_board_id: &str,
        deal_board_id: &str,
    ) -> Result<(DataFrame, DataFrame)> {
        let work_items = client.fetch_board_items(work_board_id).await?;
        let deal_items = client.fetch_board_items(deal_board_id).await?;

        let work = clean_table(build_table(&work_items)?)?;
        let deals = clean_table(build_table(&deal_items)?)?;

        info!(
            "Loaded tables: work {} rows x {} cols, deals {} rows x {} cols",
            work.height(),
            work.width(),
            deals.height(),
            deals.width()
        );
        Ok((work, deals))
    }

    pub fn work(&self) -> &DataFrame {
        &self.work
    }

    pub fn deals(&self) -> &DataFrame {
        &self.deals
    }

    pub fn work_roles(&self) -> &RoleMap {
        &self.work_roles
    }

    pub fn deal_roles(&self) -> &RoleMap {
        &self.deal_roles
    }
}

fn validate_roles(
    work: &DataFrame,
    work_roles: &RoleMap,
    deals: &DataFrame,
    deal_roles: &RoleMap,
) -> Result<()> {
    work_roles
        .validate(work)
        .map_err(|e| BiError::Table(format!("work board: {}", e)))?;
    deal_roles
        .validate(deals)
        .map_err(|e| BiError::Table(format!("deal board: {}", e)))?;
    Ok(())
}

/// One interactive chat session over the cached tables.
#[derive(Debug)]
pub struct ChatSession {
    cache: TableCache,
    transcript: Vec<ChatMessage>,
}

impl ChatSession {
    pub async fn connect(config: &Config) -> Result<Self> {
        Self::connect_with_roles(config, RoleMap::new(), RoleMap::new()).await
    }

    /// Connect with explicit column role mappings for either table.
    pub async fn connect_with_roles(
        config: &Config,
        work_roles: RoleMap,
        deal_roles: RoleMap,
    ) -> Result<Self> {
        let cache = TableCache::load_with_roles(config, work_roles, deal_roles).await?;
        Ok(Self {
            cache,
            transcript: Vec::new(),
        })
    }

    /// Answer one user query. Appends the user entry and the assistant
    /// entry to the transcript, in that order.
    pub fn ask(&mut self, query: &str) -> Answer {
        self.transcript.push(ChatMessage {
            role: Role::User,
            content: query.to_string(),
        });

        let answer = route(
            query,
            self.cache.work(),
            self.cache.deals(),
            self.cache.work_roles(),
            self.cache.deal_roles(),
        );

        self.transcript.push(ChatMessage {
            role: Role::Assistant,
            content: answer.text.clone(),
        });
        answer
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.cache.refresh().await
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }
}

use anyhow::Result;
use boardpulse::chart::render_ascii;
use boardpulse::columns::{ColumnRole, RoleMap};
use boardpulse::{ChatSession, Config};
use clap::Parser;
use std::io::{self, BufRead, Write};
use tracing::info;

#[derive(Parser)]
#[command(name = "boardpulse")]
#[command(about = "Business-intelligence chat agent over project-management boards")]
struct Args {
    /// One-shot question. Without it, an interactive chat loop starts.
    query: Option<String>,

    /// Work-board column to use as the sector, overriding detection.
    #[arg(long, value_name = "COLUMN")]
    work_sector: Option<String>,

    /// Work-board column to use as the month, overriding detection.
    #[arg(long, value_name = "COLUMN")]
    work_month: Option<String>,

    /// Work-board column to use as the value, overriding detection.
    #[arg(long, value_name = "COLUMN")]
    work_value: Option<String>,

    /// Deal-board column to use as the sector, overriding detection.
    #[arg(long, value_name = "COLUMN")]
    deal_sector: Option<String>,

    /// Deal-board column to use as the value, overriding detection.
    #[arg(long, value_name = "COLUMN")]
    deal_value: Option<String>,
}

fn role_map(sector: Option<String>, month: Option<String>, value: Option<String>) -> RoleMap {
    let mut roles = RoleMap::new();
    if let Some(column) = sector {
        roles = roles.with_role(ColumnRole::Sector, column);
    }
    if let Some(column) = month {
        roles = roles.with_role(ColumnRole::Month, column);
    }
    if let Some(column) = value {
        roles = roles.with_role(ColumnRole::Value, column);
    }
    roles
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "boardpulse=info".into()),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    let work_roles = role_map(args.work_sector, args.work_month, args.work_value);
    let deal_roles = role_map(args.deal_sector, None, args.deal_value);

    info!("Loading board data...");
    let mut session = ChatSession::connect_with_roles(&config, work_roles, deal_roles).await?;
    info!("Data loaded successfully");

    if let Some(query) = args.query {
        print_answer(&mut session, &query);
        return Ok(());
    }

    println!("Ask about pipeline, sector exposure, revenue, month, quarter, or leadership update.");
    println!("Commands: refresh, exit");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();

        match query {
            "" => continue,
            "exit" | "quit" => break,
            "refresh" => {
                session.refresh().await?;
                println!("Board data reloaded.");
            }
            _ => print_answer(&mut session, query),
        }
    }

    Ok(())
}

fn print_answer(session: &mut ChatSession, query: &str) {
    let answer = session.ask(query);
    println!("\n{}\n", answer.text);
    if let Some(chart) = &answer.chart {
        println!("{}", render_ascii(chart));
    }
}

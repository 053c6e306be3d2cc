pub mod board_client;
pub mod chart;
pub mod columns;
pub mod config;
pub mod error;
pub mod insights;
pub mod router;
pub mod session;
pub mod table;

pub use config::Config;
pub use error::{BiError, Result};
pub use router::Answer;
pub use session::ChatSession;

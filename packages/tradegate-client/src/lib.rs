//! Tradegate Client - the external-data boundary for the decision engine.
//!
//! - **Client**: async HTTP access to the analysis backend
//! - **Wire**: snake_case/camelCase payload normalization
//! - **Remote**: async orchestrator with per-call timeouts
//!
//! # Example
//!
//! ```rust,no_run
//! use tradegate_client::{ClientConfig, RemoteAnalyzer, TradeGateClient};
//! use tradegate_core::{TradeProposal, TradeSide};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = ClientConfig::from_env();
//! let analyzer = RemoteAnalyzer::new(TradeGateClient::from_config(&config)?)
//!     .with_timeout(config.timeout());
//!
//! let proposal = TradeProposal::new("BTC", TradeSide::Long, 95000.0, 94000.0, 98000.0);
//! let outcome = analyzer.analyze(&proposal).await?;
//! println!("{}", outcome.record.analysis.recommendation);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod remote;
pub mod wire;

pub use client::{AnalysisBackend, TradeGateClient};
pub use config::ClientConfig;
pub use remote::RemoteAnalyzer;
